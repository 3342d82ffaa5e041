//! Command channel backed by the `mavlink` crate
//!
//! Wire framing and dialect encoding live entirely in the protocol library;
//! this wrapper only attaches sender identity and maps I/O failures into
//! the crate taxonomy.

use crate::channel::CommandChannel;
use crate::error::{Error, Result};
use async_trait::async_trait;
use mavlink::common::MavMessage;
use mavlink::{MavConnection, MavHeader};
use tracing::info;

/// A live connection to a vehicle, created by the connection manager.
///
/// Never reused across unrelated vehicles: one session per device per
/// connect call.
pub struct MavlinkCommandChannel {
    connection: Box<dyn MavConnection<MavMessage> + Send + Sync>,
    address: String,
}

impl MavlinkCommandChannel {
    /// Open a single connection attempt to `address` (e.g. "tcpout:host:port").
    /// Retry policy belongs to the connection manager, not here.
    pub fn open(address: &str) -> Result<Self> {
        let connection = mavlink::connect::<MavMessage>(address)
            .map_err(|e| Error::ProtocolSend(e.to_string()))?;
        Ok(Self {
            connection,
            address: address.to_string(),
        })
    }

    /// Close the session. Dropping the handle releases the socket; the
    /// consuming signature makes a double close unrepresentable.
    pub fn close(self) {
        info!("aerial command channel to {} closed", self.address);
    }
}

#[async_trait]
impl CommandChannel for MavlinkCommandChannel {
    async fn send(&self, system_id: u8, component_id: u8, message: &MavMessage) -> Result<()> {
        let header = MavHeader {
            system_id,
            component_id,
            sequence: 0, // assigned by the connection
        };
        self.connection
            .send(&header, message)
            .map(|_| ())
            .map_err(|e| Error::ProtocolSend(e.to_string()))
    }
}
