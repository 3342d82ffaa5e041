//! Channel trait abstractions for the two external protocol libraries

use crate::error::Result;
use async_trait::async_trait;
use mavlink::common::MavMessage;

/// One open connection to an aerial vehicle's command channel.
///
/// Implementations wrap an already-framed protocol library; the engine only
/// needs fire-and-forget delivery of a single message with explicit sender
/// identity. Acknowledgments, where a command has one, are separate
/// messages requested through the driver.
#[async_trait]
pub trait CommandChannel: Send + Sync {
    /// Send one outbound message. Either the whole message is handed to the
    /// protocol library or the call fails; nothing is partially sent.
    async fn send(&self, system_id: u8, component_id: u8, message: &MavMessage) -> Result<()>;
}

/// One open connection to a cabinet controller's register bank.
///
/// The slave id is fixed per session and owned by the implementation.
#[async_trait]
pub trait RegisterChannel: Send {
    /// Connect if the session is not currently connected. Called before
    /// every operation so a dropped link recovers lazily.
    async fn ensure_connected(&mut self) -> Result<()>;

    /// Read `count` consecutive registers starting at `address`.
    async fn read_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>>;

    /// Write one register.
    async fn write_register(&mut self, address: u16, value: u16) -> Result<()>;

    /// Close the session. Idempotent; close-time failures are logged by the
    /// implementation, never surfaced.
    async fn close(&mut self);
}
