//! Delivery Choreographies
//!
//! The three multi-phase workflows that coordinate a vehicle and a cabinet
//! through one delivery, plus the task wrapper that makes cancellation an
//! explicit outcome.

mod orchestrator;
mod workflow;

pub use orchestrator::{DeliveryConfig, DeliveryContext, DeliveryRoute};
pub use workflow::{spawn_workflow, WorkflowHandle};
