//! Aerial Vehicle Control
//!
//! Flight-plan types and the command driver that turns them into outbound
//! protocol messages. The driver is stateless per call; session lifetime
//! and retries are the connection layer's concern.

mod commands;
mod mission;

pub use commands::{AerialCommander, AerialConfig};
pub use mission::{
    decode_degrees, encode_degrees, FlightMode, GeoPoint, Mission, MissionCommand, MissionItem,
    MissionSubmode,
};
