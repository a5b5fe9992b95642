//! Event router: classification, module lookup, plugin gating, execution and
//! reply delivery for every inbound payload.
//!
//! ```text
//! sources ─► FanIn ─► Router::serve ─► dispatch (one task per event)
//!                                        ├─ classify
//!                                        ├─ Registry::resolve
//!                                        ├─ parse ─► control plugins ─► execute
//!                                        └─ ReplySink::send (at most once)
//! ```

pub mod boundary;
pub mod classify;
pub mod error;
pub mod router;

pub use {
    classify::{Classified, IgnoreReason, classify},
    error::{DispatchError, Result},
    router::{Dispatch, Router, Status},
};
