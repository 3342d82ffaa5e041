//! Register Poller
//!
//! The one non-trivial algorithm in the register channel: optionally write
//! a command value, then poll the same address until a terminal value
//! appears or the deadline passes. Every cabinet operation is an instance
//! of this with fixed addresses and codes.

use crate::channel::RegisterChannel;
use crate::error::{Error, Result};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// What the poller does with a read value that is neither success nor
/// declared failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingPolicy {
    /// Strict: only the listed values count as "in progress"; anything
    /// else aborts immediately with `OperationFailed`. This is the default
    /// posture — a stuck register must not look like progress forever.
    Only(Vec<u16>),
    /// Tolerant: any non-terminal value keeps the poll alive until the
    /// deadline. Used where the firmware passes through undocumented
    /// intermediate codes.
    AnyOther,
}

/// One write-then-poll unit. A plain parameter record, not itself stateful.
///
/// `success_values` and `failure_values` must be disjoint; a value in both
/// would make the outcome order-dependent.
#[derive(Debug, Clone)]
pub struct RegisterOperation {
    pub address: u16,
    pub write_value: Option<u16>,
    pub success_values: Vec<u16>,
    pub failure_values: Vec<u16>,
    pub pending: PendingPolicy,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl RegisterOperation {
    /// Command-response form: write `command`, accept `done`, and treat
    /// only the command echo as in-progress (strict).
    pub fn command_response(
        address: u16,
        command: u16,
        done: u16,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            address,
            write_value: Some(command),
            success_values: vec![done],
            failure_values: Vec::new(),
            pending: PendingPolicy::Only(vec![command]),
            poll_interval,
            timeout,
        }
    }

    /// Pure wait form: no write, tolerate everything until one of
    /// `success_values` shows up.
    pub fn wait_for(
        address: u16,
        success_values: Vec<u16>,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            address,
            write_value: None,
            success_values,
            failure_values: Vec::new(),
            pending: PendingPolicy::AnyOther,
            poll_interval,
            timeout,
        }
    }

    /// Run the operation against `channel`. Returns the observed terminal
    /// value so callers can distinguish multiple success codes.
    ///
    /// At most `timeout / poll_interval + 1` reads are issued.
    pub async fn execute<R>(&self, channel: &mut R) -> Result<u16>
    where
        R: RegisterChannel + ?Sized,
    {
        debug_assert!(
            self.success_values
                .iter()
                .all(|v| !self.failure_values.contains(v)),
            "success and failure sets must be disjoint"
        );

        channel.ensure_connected().await?;
        if let Some(value) = self.write_value {
            channel.write_register(self.address, value).await?;
        }

        let deadline = Instant::now() + self.timeout;
        loop {
            sleep(self.poll_interval).await;
            let observed = read_one(channel, self.address).await?;

            if self.success_values.contains(&observed) {
                debug!(
                    "register {:#06x} reached terminal value {}",
                    self.address, observed
                );
                return Ok(observed);
            }
            if self.failure_values.contains(&observed) {
                warn!(
                    "register {:#06x} reported failure value {}",
                    self.address, observed
                );
                return Err(Error::OperationFailed {
                    address: self.address,
                    observed,
                });
            }
            if let PendingPolicy::Only(expected) = &self.pending {
                if !expected.contains(&observed) {
                    warn!(
                        "register {:#06x} holds unexpected value {} while waiting",
                        self.address, observed
                    );
                    return Err(Error::OperationFailed {
                        address: self.address,
                        observed,
                    });
                }
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout {
                    address: self.address,
                    waited: self.timeout,
                });
            }
        }
    }
}

/// Read a single register.
pub(crate) async fn read_one<R>(channel: &mut R, address: u16) -> Result<u16>
where
    R: RegisterChannel + ?Sized,
{
    let values = channel.read_registers(address, 1).await?;
    values
        .first()
        .copied()
        .ok_or_else(|| Error::ProtocolSend(format!("empty read at {:#06x}", address)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::sim::SimulatedCabinet;

    const ADDR: u16 = 0x0BB8;

    fn op(pending: PendingPolicy) -> RegisterOperation {
        RegisterOperation {
            address: ADDR,
            write_value: Some(10),
            success_values: vec![11],
            failure_values: vec![99],
            pending,
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn returns_success_value_when_observed_first() {
        let mut cab = SimulatedCabinet::new();
        cab.script_reads(ADDR, &[10, 10, 11]);

        let observed = op(PendingPolicy::Only(vec![10]))
            .execute(&mut cab)
            .await
            .unwrap();
        assert_eq!(observed, 11);
        assert_eq!(cab.writes(), &[(ADDR, 10)]);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_value_aborts_without_further_polling() {
        let mut cab = SimulatedCabinet::new();
        cab.script_reads(ADDR, &[10, 99, 11]);

        let err = op(PendingPolicy::Only(vec![10]))
            .execute(&mut cab)
            .await
            .unwrap_err();
        match err {
            Error::OperationFailed { address, observed } => {
                assert_eq!(address, ADDR);
                assert_eq!(observed, 99);
            }
            other => panic!("expected OperationFailed, got {:?}", other),
        }
        // The scripted success value after the failure was never read.
        assert_eq!(cab.read_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn strict_policy_rejects_undeclared_value() {
        let mut cab = SimulatedCabinet::new();
        cab.script_reads(ADDR, &[10, 37]);

        let err = op(PendingPolicy::Only(vec![10]))
            .execute(&mut cab)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::OperationFailed { observed: 37, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn tolerant_policy_polls_until_deadline() {
        let mut cab = SimulatedCabinet::new();
        cab.set_register(ADDR, 37); // never terminal

        let err = op(PendingPolicy::AnyOther)
            .execute(&mut cab)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { address: ADDR, .. }));
        // 5 s deadline at 1 s cadence: at most timeout/interval + 1 reads.
        assert!(cab.read_count() <= 6, "read {} times", cab.read_count());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_form_performs_no_write() {
        let mut cab = SimulatedCabinet::new();
        cab.script_reads(ADDR, &[5, 121]);

        let observed = RegisterOperation::wait_for(
            ADDR,
            vec![121],
            Duration::from_secs(1),
            Duration::from_secs(10),
        )
        .execute(&mut cab)
        .await
        .unwrap();
        assert_eq!(observed, 121);
        assert!(cab.writes().is_empty());
    }
}
