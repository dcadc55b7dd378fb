//! The routine seam: the side-effecting operation a retriever loops.

use std::future::Future;

use async_trait::async_trait;

use crate::error::RoutineError;

/// A zero-argument side-effecting operation executed on each iteration.
///
/// Routines are opaque to the retriever: typically they issue one or more
/// network requests and push the results into observable state owned by the
/// caller. A routine's failure is its own to report (for example by updating
/// an error field the UI renders); the loop continues either way.
#[async_trait]
pub trait Routine: Send + Sync + 'static {
    /// Run one iteration.
    async fn run(&self) -> Result<(), RoutineError>;
}

/// Any `Fn` closure returning a future is a routine.
#[async_trait]
impl<F, Fut> Routine for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), RoutineError>> + Send + 'static,
{
    async fn run(&self) -> Result<(), RoutineError> {
        (self)().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_closure_is_a_routine() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let routine = move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<(), RoutineError>(())
            }
        };

        routine.run().await.unwrap();
        routine.run().await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_routine_failure_is_returned() {
        let routine = || async { Err(RoutineError::request("timed out")) };
        let err = routine.run().await.unwrap_err();
        assert_eq!(err.to_string(), "request failed: timed out");
    }
}
