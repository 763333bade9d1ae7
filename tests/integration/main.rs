#![forbid(non_ascii_idents, unsafe_code)]

mod client;
mod join;
mod local;
mod selections;
mod tracks;

use std::{future::Future, time::Duration};

use futures::future::{self, Either};

/// Polls `$name` [`Stream`] until finds provided `$pattern`.
///
/// When provided `$pattern` found - executes provided `$body`.
///
/// This macro can be used only in the `async` blocks.
///
/// [`Stream`]: futures::Stream
#[macro_export]
macro_rules! if_let_next {
    ($pattern:pat = $name:ident $body:block ) => {
        loop {
            if let $pattern = $name.select_next_some().await {
                $body;
                break;
            }
        }
    };
}

/// Awaits the provided [`Future`] for at most a second.
///
/// Returns [`None`] if it didn't resolve in time.
pub async fn timeout<F: Future>(fut: F) -> Option<F::Output> {
    let sleep = tokio::time::sleep(Duration::from_secs(1));
    match future::select(Box::pin(fut), Box::pin(sleep)).await {
        Either::Left((output, _)) => Some(output),
        Either::Right(_) => None,
    }
}
