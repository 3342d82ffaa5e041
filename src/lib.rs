//! Delivery choreography engine for drone/locker deployments
//!
//! Coordinates two independent hardware channels — a vehicle command
//! channel and a cabinet register channel — through multi-phase delivery
//! workflows: cabinet preparation, flight-plan upload, launch, package
//! hand-off and pickup, return leg, cabinet teardown.
//!
//! Wire protocols are external: the vehicle side delegates to the
//! `mavlink` crate, the cabinet side is a trait a deployment's register
//! library implements. Persistence, REST surfaces and real flight control
//! are out of scope.

pub mod aerial;
pub mod cabinet;
pub mod channel;
pub mod connection;
pub mod delivery;
mod error;

pub use error::{Error, Result};
