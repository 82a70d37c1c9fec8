// ── Shared state cell ──
//
// Serialized-writer storage for one controller's `AsyncState`, with an
// ordered change feed and the async update combinators.

mod cell;
mod combinators;

pub use cell::StateCell;
