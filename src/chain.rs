//! Generic first-success driver for ordered fallback chains.
//!
//! Both the documentation selector and the speech synthesizer are the same
//! shape: an ordered list of (tag, attempt) pairs tried in order, ending in
//! one tier that cannot fail. The control flow lives here once, so adding
//! or reordering tiers is a data change in the caller, not new logic.

use std::future::Future;
use std::pin::Pin;

use tracing::warn;

use crate::error::BackendError;

/// A lazily-evaluated attempt at one tier.
pub type Attempt<'a, O> = Pin<Box<dyn Future<Output = Result<O, BackendError>> + Send + 'a>>;

/// Box a tier future into an [`Attempt`].
pub fn attempt<'a, O, F>(fut: F) -> Attempt<'a, O>
where
    F: Future<Output = Result<O, BackendError>> + Send + 'a,
{
    Box::pin(fut)
}

/// Outcome of a chain run: which tier produced the output, plus a
/// diagnostic note when the chain degraded all the way down.
pub struct ChainResult<T, O> {
    pub tag: T,
    pub output: O,
    /// Accumulated tier failures. Set only when every fallible tier failed
    /// and the guaranteed tier produced the output.
    pub note: Option<String>,
}

/// Try `tiers` in order and return the first success. When every fallible
/// tier fails (or none is supplied), `guaranteed` produces the output and
/// the collected failures become the diagnostic note.
pub async fn first_success<T, O, G>(
    tiers: Vec<(T, Attempt<'_, O>)>,
    guaranteed_tag: T,
    guaranteed: G,
) -> ChainResult<T, O>
where
    T: std::fmt::Display + Copy,
    G: FnOnce() -> O,
{
    let mut failures: Vec<String> = Vec::new();

    for (tag, fut) in tiers {
        match fut.await {
            Ok(output) => {
                return ChainResult {
                    tag,
                    output,
                    note: None,
                };
            }
            Err(e) => {
                warn!("{tag} tier failed: {e}");
                failures.push(format!("{tag}: {e}"));
            }
        }
    }

    let note = if failures.is_empty() {
        None
    } else {
        Some(failures.join("; "))
    };

    ChainResult {
        tag: guaranteed_tag,
        output: guaranteed(),
        note,
    }
}
