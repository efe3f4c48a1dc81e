//! Flipbook Scheduler Library
//!
//! Cancellation for superseded page renders and the process-wide render
//! runtime that runs the two slots of a spread concurrently.
//!
//! # Example
//!
//! ```
//! use flipbook_scheduler::{runtime, SupersessionRegistry};
//!
//! let slots = SupersessionRegistry::new();
//!
//! let (left, right) = runtime::join(
//!     || {
//!         let token = slots.issue("left");
//!         // ... render ...
//!         slots.complete("left", &token)
//!     },
//!     || {
//!         let token = slots.issue("right");
//!         slots.complete("right", &token)
//!     },
//! );
//!
//! assert!(left && right);
//! ```

mod cancel;
pub mod runtime;

pub use cancel::{CancellationToken, SupersessionRegistry};
pub use runtime::{RuntimeError, RuntimeOptions};
