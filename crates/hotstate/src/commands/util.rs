//! Shared helpers for command handlers.

use serde::Serialize;

use hotstate_core::{AsyncState, Failure, OneTimeEvent, Subscription};

use crate::error::CliError;
use crate::output::{self, Printer};

/// Print every state the subscription yields until `done` accepts one.
///
/// Failures are consumed from their one-time event as they are printed,
/// so each is reported once even if the state is replayed later. Returns
/// the last failure consumed along the way.
pub async fn follow<T>(
    sub: &mut Subscription<AsyncState<T>>,
    printer: &Printer,
    summary: impl Fn(&T) -> String,
    done: impl Fn(&AsyncState<T>) -> bool,
) -> Result<Option<Failure>, CliError>
where
    T: Clone + Send + Sync + Serialize + 'static,
{
    let mut last_failure = None;
    loop {
        let state = sub.recv().await?;
        let failure = state.error.as_ref().and_then(OneTimeEvent::consume);
        output::print_output(&printer.render_state(&state, failure.as_ref(), &summary)?);
        if failure.is_some() {
            last_failure = failure;
        }
        if done(&state) {
            return Ok(last_failure);
        }
    }
}
