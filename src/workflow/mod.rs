//! Workflow engine for the annonce / devis / tracking lifecycle
//!
//! This is the one place that knows the transition rules binding the three
//! stores together: who may move which document, from which status, and
//! which cross-entity synchronizations each move implies. The engine itself
//! is pure: it inspects document snapshots and returns a decision; the
//! domain services apply decisions with conditional writes so that a stale
//! snapshot is rejected at write time.

pub mod engine;
mod error;
mod events;

pub use engine::*;
pub use error::{WorkflowError, WorkflowResult};
pub use events::{EventDispatcher, WorkflowEvent};
