//! Convenience facade for types that embed a [`Retriever`].

use crate::context::ContextId;
use crate::retriever::{RetrieveOptions, Retriever};
use crate::routine::Routine;

/// Facade for owners that hold a [`Retriever`] as a field.
///
/// Implementors supply the underlying instance; the provided methods keep
/// call sites readable (`self.suspend_retriever()` instead of reaching
/// through the field) and add the conditional suspend/restart variants used
/// around lifecycle callbacks.
pub trait RetrieverWrapper {
    /// The retriever owned by this type.
    fn retriever(&self) -> &Retriever;

    /// Whether an independent one-off operation can start without colliding
    /// with an active loop.
    fn can_retriever_start(&self) -> bool {
        self.retriever().can_start()
    }

    /// Start (or keep, for the same context) the retrieval loop for `ctx`.
    fn retrieve<R: Routine>(&self, ctx: ContextId, routine: R, options: RetrieveOptions) {
        self.retriever().execute(ctx, routine, options);
    }

    /// Whether the loop owned by `ctx` should keep iterating.
    fn continue_to_retrieve(&self, ctx: ContextId) -> bool {
        self.retriever().continue_to_retrieve(ctx)
    }

    /// Pause the active loop without losing ownership.
    fn suspend_retriever(&self) {
        self.retriever().suspend();
    }

    /// Pause the active loop only when `condition` holds.
    fn suspend_retriever_if(&self, condition: bool) {
        if condition {
            self.suspend_retriever();
        }
    }

    /// Resume a suspended loop on its existing cadence.
    fn restart_retriever(&self) {
        self.retriever().restart();
    }

    /// Resume a suspended loop only when `condition` holds.
    fn restart_retriever_if(&self, condition: bool) {
        if condition {
            self.restart_retriever();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::error::RoutineError;

    struct Dashboard {
        retriever: Retriever,
    }

    impl RetrieverWrapper for Dashboard {
        fn retriever(&self) -> &Retriever {
            &self.retriever
        }
    }

    #[tokio::test]
    async fn test_wrapper_delegates_to_retriever() {
        let dashboard = Dashboard {
            retriever: Retriever::detached(),
        };
        assert!(dashboard.can_retriever_start());

        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        dashboard.retrieve(
            ContextId::of::<Dashboard>(),
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), RoutineError>(())
                }
            },
            RetrieveOptions::default().with_refresh_delay(Duration::from_millis(20)),
        );

        assert!(!dashboard.can_retriever_start());
        assert!(dashboard.continue_to_retrieve(ContextId::of::<Dashboard>()));
    }

    #[tokio::test]
    async fn test_conditional_variants_check_the_condition() {
        let dashboard = Dashboard {
            retriever: Retriever::detached(),
        };
        dashboard.retrieve(
            ContextId::of::<Dashboard>(),
            || async { Ok::<(), RoutineError>(()) },
            RetrieveOptions::default().with_refresh_delay(Duration::from_millis(20)),
        );

        dashboard.suspend_retriever_if(false);
        assert!(dashboard.continue_to_retrieve(ContextId::of::<Dashboard>()));

        dashboard.suspend_retriever_if(true);
        assert!(!dashboard.continue_to_retrieve(ContextId::of::<Dashboard>()));

        dashboard.restart_retriever_if(false);
        assert!(!dashboard.continue_to_retrieve(ContextId::of::<Dashboard>()));

        dashboard.restart_retriever_if(true);
        assert!(dashboard.continue_to_retrieve(ContextId::of::<Dashboard>()));
    }
}
