//! Error taxonomy shared by both control channels and the workflows built
//! on top of them.

use std::time::Duration;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by channel drivers, cabinet operations and delivery
/// workflows.
///
/// Only the connection layer retries; everything above propagates the first
/// failure unchanged, which terminates the enclosing workflow. Compensation
/// (e.g. closing a door that was already opened) is the caller's job.
#[derive(Debug, Error)]
pub enum Error {
    /// All connection attempts to a device were exhausted.
    #[error("connection to {endpoint} failed after {attempts} attempts: {reason}")]
    ConnectionFailed {
        endpoint: String,
        attempts: u32,
        reason: String,
    },

    /// A timed wait was aborted externally (the owning task was cancelled).
    #[error("wait aborted externally")]
    Interrupted,

    /// A register poll reached its deadline without observing a terminal
    /// value.
    #[error("polling register {address:#06x} timed out after {waited:?}")]
    Timeout { address: u16, waited: Duration },

    /// A register reported an explicit failure or anomalous code.
    #[error("register {address:#06x} reported failure value {observed}")]
    OperationFailed { address: u16, observed: u16 },

    /// A precondition register was not in the required state; nothing was
    /// written.
    #[error("operation not allowed, register {address:#06x} holds {observed}")]
    NotAllowed { address: u16, observed: u16 },

    /// The underlying protocol library rejected a send or register exchange.
    #[error("protocol exchange failed: {0}")]
    ProtocolSend(String),

    /// A pickup code component was outside the valid [0, 999] range.
    #[error("pickup code component {0} out of range")]
    InvalidPickupCode(u16),
}

impl Error {
    /// True for outcomes that end a workflow because a device said no,
    /// as opposed to transport-level trouble.
    pub fn is_device_refusal(&self) -> bool {
        matches!(
            self,
            Error::OperationFailed { .. } | Error::NotAllowed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refusals_are_distinguished_from_transport_errors() {
        let refusal = Error::NotAllowed {
            address: 0x0BBB,
            observed: 0,
        };
        let transport = Error::ProtocolSend("socket closed".into());
        assert!(refusal.is_device_refusal());
        assert!(!transport.is_device_refusal());
        assert!(!Error::Interrupted.is_device_refusal());
    }

    #[test]
    fn timeout_display_names_the_register() {
        let err = Error::Timeout {
            address: 0x0BB8,
            waited: Duration::from_secs(10),
        };
        assert!(err.to_string().contains("0x0bb8"));
    }
}
