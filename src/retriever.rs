//! Single-flight, context-aware scheduler for recurring refresh routines.
//!
//! The retriever owns the lifecycle of one recurring task at a time: it
//! starts the loop, re-schedules it with a configurable delay, tracks which
//! context currently owns it, parks it across suspend/restart without losing
//! ownership, and tears it down when the context switches or the bounding
//! scope terminates.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::context::ContextId;
use crate::routine::Routine;

/// Delay between iterations when none is configured.
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(1000);

/// Options controlling how [`Retriever::execute`] schedules a routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrieveOptions {
    /// Whether the loop re-schedules itself after each iteration.
    pub repeat: bool,
    /// Delay between successive iterations; meaningful only when repeating.
    pub refresh_delay: Duration,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            repeat: true,
            refresh_delay: DEFAULT_REFRESH_DELAY,
        }
    }
}

impl RetrieveOptions {
    /// Run the routine exactly once.
    pub fn once() -> Self {
        Self {
            repeat: false,
            ..Self::default()
        }
    }

    /// Set the delay between successive iterations.
    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }
}

/// The single active unit of recurring work.
struct RetrieverSession {
    /// Generation id distinguishing this session from any successor.
    id: u64,
    /// Who owns the loop. Set once at creation, never mutated: a context
    /// change always produces a new session.
    owner: ContextId,
    /// Handle that stops the scheduled loop.
    handle: JoinHandle<()>,
    /// Pause gate. `false` parks the loop at the next iteration boundary
    /// without relinquishing ownership.
    refreshing: watch::Sender<bool>,
}

impl RetrieverSession {
    fn is_refreshing(&self) -> bool {
        *self.refreshing.borrow()
    }

    fn teardown(&self) {
        self.handle.abort();
    }
}

/// State shared between the retriever and its spawned loops.
struct Shared {
    /// Single-slot session registry. The only shared mutable resource.
    slot: Mutex<Option<RetrieverSession>>,
    /// Session id generator.
    next_id: AtomicU64,
}

impl Shared {
    /// Lock the session slot. Sections under this guard are short and never
    /// held across an await; a poisoned lock recovers with the inner value.
    fn slot(&self) -> MutexGuard<'_, Option<RetrieverSession>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Decision taken at each iteration boundary of a repeating loop.
enum Boundary {
    /// The session is still current and refreshing: run the next iteration.
    Proceed,
    /// Suspended: park until restarted, keeping the session alive.
    Park,
    /// The session is gone or was superseded: end the loop.
    Stop,
}

/// Single-flight scheduler for a repeating or one-shot refresh routine,
/// bound to an externally supplied cancellable scope.
///
/// At most one session is active per instance. Calling
/// [`execute`](Retriever::execute) for a different context tears the current
/// session down before the new one is registered; calling it again for the
/// same context is a no-op while that session is active.
///
/// Spawns onto the ambient tokio runtime, so `execute` must be called from
/// within one.
pub struct Retriever {
    shared: Arc<Shared>,
    scope: CancellationToken,
}

impl Retriever {
    /// Create a retriever bound to an externally owned cancellation scope.
    ///
    /// When `scope` is cancelled the active session is torn down at its next
    /// suspension point, whether that is the inter-iteration delay or the
    /// parked state.
    pub fn new(scope: CancellationToken) -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(None),
                next_id: AtomicU64::new(0),
            }),
            scope,
        }
    }

    /// Create a retriever with a private scope, for owners that have no
    /// external lifecycle to bind to. Sessions still end when the retriever
    /// is dropped.
    pub fn detached() -> Self {
        Self::new(CancellationToken::new())
    }

    /// Whether a new unit of work can start, i.e. no session is currently
    /// active. A suspended session still counts as active.
    ///
    /// Callers issue independent one-off requests only when this returns
    /// true, to avoid interleaving with a running loop. No side effects.
    pub fn can_start(&self) -> bool {
        self.shared.slot().is_none()
    }

    /// Owner of the active session, if any.
    pub fn active_context(&self) -> Option<ContextId> {
        self.shared.slot().as_ref().map(|session| session.owner)
    }

    /// Whether the loop owned by `ctx` should keep iterating.
    ///
    /// Returns true iff `ctx` owns the active session and the session is
    /// refreshing. When `ctx` differs from the active owner the registered
    /// session is stale for this caller (a context switch happened) and it
    /// is torn down before returning false, so it never produces another
    /// iteration. A suspended session returns false without teardown:
    /// suspension is not ownership loss.
    pub fn continue_to_retrieve(&self, ctx: ContextId) -> bool {
        let mut slot = self.shared.slot();
        match slot.as_ref() {
            None => false,
            Some(session) if session.owner == ctx => session.is_refreshing(),
            Some(stale) => {
                debug!(
                    stale = %stale.owner,
                    requesting = %ctx,
                    "context switched, tearing down stale session"
                );
                stale.teardown();
                *slot = None;
                false
            }
        }
    }

    /// Start the retrieval work for `ctx`.
    ///
    /// An active session owned by a different context is torn down first; the
    /// teardown is ordered before the new session is registered. An active
    /// session owned by the same context makes this call a no-op and the
    /// existing session keeps its original parameters.
    ///
    /// With `options.repeat` the routine runs, waits `options.refresh_delay`,
    /// re-checks ownership and the pause gate, and repeats; otherwise it runs
    /// exactly once and [`can_start`](Retriever::can_start) becomes true again
    /// on completion.
    pub fn execute<R: Routine>(&self, ctx: ContextId, routine: R, options: RetrieveOptions) {
        let mut slot = self.shared.slot();
        if let Some(active) = slot.as_ref() {
            if active.owner == ctx {
                debug!(owner = %ctx, "session already active, ignoring execute");
                return;
            }
            debug!(old = %active.owner, new = %ctx, "superseding session");
            active.teardown();
        }

        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let (refreshing, parked) = watch::channel(true);
        debug!(
            owner = %ctx,
            repeat = options.repeat,
            refresh_delay = ?options.refresh_delay,
            "starting session"
        );
        let handle = tokio::spawn(drive(
            Arc::clone(&self.shared),
            self.scope.clone(),
            id,
            ctx,
            routine,
            options,
            parked,
        ));
        *slot = Some(RetrieverSession {
            id,
            owner: ctx,
            handle,
            refreshing,
        });
    }

    /// Pause the active session without losing ownership.
    ///
    /// The next iteration boundary (after the in-flight routine call
    /// completes, if any) observes the gate and parks instead of
    /// re-scheduling. No-op if no session is active.
    pub fn suspend(&self) {
        if let Some(session) = self.shared.slot().as_ref() {
            debug!(owner = %session.owner, "suspending session");
            session.refreshing.send_replace(false);
        }
    }

    /// Resume a suspended session on its existing cadence.
    ///
    /// The parked loop is released and runs its next iteration immediately;
    /// the session identity is unchanged. No-op if no session is active.
    pub fn restart(&self) {
        if let Some(session) = self.shared.slot().as_ref() {
            debug!(owner = %session.owner, "restarting session");
            session.refreshing.send_replace(true);
        }
    }
}

impl Drop for Retriever {
    fn drop(&mut self) {
        if let Some(session) = self.shared.slot().take() {
            debug!(owner = %session.owner, "retriever dropped, tearing down session");
            session.teardown();
        }
    }
}

/// Drive one session until it completes, is superseded, or the bounding
/// scope terminates.
async fn drive<R: Routine>(
    shared: Arc<Shared>,
    scope: CancellationToken,
    id: u64,
    owner: ContextId,
    routine: R,
    options: RetrieveOptions,
    mut parked: watch::Receiver<bool>,
) {
    tokio::select! {
        _ = scope.cancelled() => {
            debug!(owner = %owner, "bounding scope terminated");
            clear_if_current(&shared, id);
        }
        _ = run_loop(&shared, id, owner, &routine, options, &mut parked) => {}
    }
}

async fn run_loop<R: Routine>(
    shared: &Shared,
    id: u64,
    owner: ContextId,
    routine: &R,
    options: RetrieveOptions,
    parked: &mut watch::Receiver<bool>,
) {
    loop {
        if let Err(error) = routine.run().await {
            // The routine reports its own failures; the loop proceeds to the
            // next scheduling decision regardless of outcome.
            warn!(owner = %owner, %error, "refresh routine failed");
        }

        if !options.repeat {
            debug!(owner = %owner, "one-shot routine completed");
            clear_if_current(shared, id);
            return;
        }

        tokio::time::sleep(options.refresh_delay).await;

        loop {
            match boundary(shared, id) {
                Boundary::Proceed => break,
                Boundary::Stop => return,
                Boundary::Park => {
                    // A closed gate means the session was dropped entirely.
                    if parked.wait_for(|refreshing| *refreshing).await.is_err() {
                        return;
                    }
                    // Re-check: the session may have been superseded while
                    // this loop was parked.
                }
            }
        }
    }
}

/// Scheduling decision for the session `id` at an iteration boundary.
fn boundary(shared: &Shared, id: u64) -> Boundary {
    match shared.slot().as_ref() {
        Some(session) if session.id == id => {
            if session.is_refreshing() {
                Boundary::Proceed
            } else {
                Boundary::Park
            }
        }
        _ => Boundary::Stop,
    }
}

/// Clear the slot iff it still holds the session `id`, so a late completion
/// never clobbers a successor session.
fn clear_if_current(shared: &Shared, id: u64) {
    let mut slot = shared.slot();
    if slot.as_ref().is_some_and(|session| session.id == id) {
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_repeat_with_one_second_delay() {
        let options = RetrieveOptions::default();
        assert!(options.repeat);
        assert_eq!(options.refresh_delay, DEFAULT_REFRESH_DELAY);
    }

    #[test]
    fn test_once_does_not_repeat() {
        assert!(!RetrieveOptions::once().repeat);
    }

    #[test]
    fn test_with_refresh_delay_overrides_default() {
        let options = RetrieveOptions::default().with_refresh_delay(Duration::from_millis(250));
        assert_eq!(options.refresh_delay, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_idle_retriever_state() {
        let retriever = Retriever::detached();
        assert!(retriever.can_start());
        assert!(retriever.active_context().is_none());

        // Suspend/restart with no session are deliberate no-ops.
        retriever.suspend();
        retriever.restart();
        assert!(retriever.can_start());
    }
}
