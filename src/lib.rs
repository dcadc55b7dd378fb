//! Context-aware single-flight scheduler for recurring refresh routines.
//!
//! A [`Retriever`] runs at most one recurring routine at a time on behalf of a
//! stateful owner (typically a screen or view controller). Ownership of the
//! loop is tracked by an opaque [`ContextId`]: when the logical context
//! changes, say the user navigates to a different screen, the stale loop is
//! torn down instead of leaking in the background. [`Retriever::suspend`] and
//! [`Retriever::restart`] pause and resume the loop across short-lived
//! foreground/background transitions without losing ownership of the session.
//!
//! The retriever schedules nothing itself beyond the inter-iteration delay:
//! the routine is an opaque side-effecting operation supplied by the caller,
//! and any failure it reports is logged and ignored; the loop proceeds to the
//! next scheduling decision regardless.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use retriever::{ContextId, RetrieveOptions, Retriever, RoutineError};
//!
//! struct HomeScreen;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let retriever = Retriever::detached();
//! retriever.execute(
//!     ContextId::of::<HomeScreen>(),
//!     || async {
//!         // refresh observable state from the backend
//!         Ok::<(), RoutineError>(())
//!     },
//!     RetrieveOptions::default().with_refresh_delay(Duration::from_secs(5)),
//! );
//! # }
//! ```

pub mod context;
pub mod error;
pub mod retriever;
pub mod routine;
pub mod wrapper;

pub use context::ContextId;
pub use error::RoutineError;
pub use retriever::{DEFAULT_REFRESH_DELAY, RetrieveOptions, Retriever};
pub use routine::Routine;
pub use wrapper::RetrieverWrapper;
