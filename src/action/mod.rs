//! Action cards - declarative field schema plus an async operation
//!
//! A screen declares what an operation needs; the runner owns the form
//! values and the Idle/Running/Succeeded/Failed outcome.

pub mod form;
pub mod runner;
pub mod schema;

pub use form::{FormState, FormValues};
pub use runner::{
    operation, render_outcome, ActionRunner, Operation, OperationResult, Outcome, PendingRun,
    RenderedOutcome, RunCompletion, RunTicket,
};
pub use schema::{FieldKind, FieldSpec, Schema, SelectOption};
