//! Scripted in-memory devices for development and tests
//!
//! The cabinet simulator plays back per-register read scripts and journals
//! every write, which is what the poller and workflow tests assert against.
//! The vehicle simulator records each outbound message.

use crate::channel::{CommandChannel, RegisterChannel};
use crate::error::Result;
use async_trait::async_trait;
use mavlink::common::MavMessage;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A cabinet controller whose register bank is driven by scripts.
///
/// Reads pop the scripted sequence for that address; once a script drains,
/// reads return the resting value (updated by writes, so a freshly written
/// command echoes back the way real firmware does until the state advances).
#[derive(Default)]
pub struct SimulatedCabinet {
    connected: bool,
    scripts: HashMap<u16, VecDeque<u16>>,
    resting: HashMap<u16, u16>,
    writes: Vec<(u16, u16)>,
    reads: usize,
}

impl SimulatedCabinet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next read results for `address`, consumed in order.
    pub fn script_reads(&mut self, address: u16, values: &[u16]) {
        self.scripts
            .entry(address)
            .or_default()
            .extend(values.iter().copied());
    }

    /// Set the value returned once (and while) no script entry is queued.
    pub fn set_register(&mut self, address: u16, value: u16) {
        self.resting.insert(address, value);
    }

    /// Every write performed so far, in order.
    pub fn writes(&self) -> &[(u16, u16)] {
        &self.writes
    }

    /// Number of reads performed so far.
    pub fn read_count(&self) -> usize {
        self.reads
    }

    /// Whether the session is currently connected.
    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

#[async_trait]
impl RegisterChannel for SimulatedCabinet {
    async fn ensure_connected(&mut self) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    async fn read_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>> {
        let mut values = Vec::with_capacity(count as usize);
        for offset in 0..count {
            let addr = address + offset;
            let value = match self.scripts.get_mut(&addr).and_then(VecDeque::pop_front) {
                Some(scripted) => scripted,
                None => self.resting.get(&addr).copied().unwrap_or(0),
            };
            values.push(value);
        }
        self.reads += 1;
        Ok(values)
    }

    async fn write_register(&mut self, address: u16, value: u16) -> Result<()> {
        self.writes.push((address, value));
        self.resting.insert(address, value);
        Ok(())
    }

    async fn close(&mut self) {
        self.connected = false;
    }
}

/// A vehicle command channel that records every message it is handed.
#[derive(Default)]
pub struct SimulatedVehicle {
    sent: Mutex<Vec<MavMessage>>,
}

impl SimulatedVehicle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every message sent so far, in order.
    pub fn sent(&self) -> Vec<MavMessage> {
        self.sent.lock().expect("sim lock").clone()
    }
}

#[async_trait]
impl CommandChannel for SimulatedVehicle {
    async fn send(&self, _system_id: u8, _component_id: u8, message: &MavMessage) -> Result<()> {
        self.sent.lock().expect("sim lock").push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_reads_then_resting_value() {
        let mut cab = SimulatedCabinet::new();
        cab.script_reads(0x10, &[5, 6]);
        cab.set_register(0x10, 7);

        assert_eq!(cab.read_registers(0x10, 1).await.unwrap(), vec![5]);
        assert_eq!(cab.read_registers(0x10, 1).await.unwrap(), vec![6]);
        assert_eq!(cab.read_registers(0x10, 1).await.unwrap(), vec![7]);
        assert_eq!(cab.read_count(), 3);
    }

    #[tokio::test]
    async fn writes_echo_until_scripted() {
        let mut cab = SimulatedCabinet::new();
        cab.write_register(0x20, 10).await.unwrap();
        assert_eq!(cab.read_registers(0x20, 1).await.unwrap(), vec![10]);
        assert_eq!(cab.writes(), &[(0x20, 10)]);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let mut cab = SimulatedCabinet::new();
        cab.ensure_connected().await.unwrap();
        assert!(cab.is_connected());
        cab.close().await;
        cab.close().await;
        assert!(!cab.is_connected());
    }
}
