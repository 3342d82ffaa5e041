//! Connection management for the two device channels
//!
//! One session per logical device per call, no pooling. Connects retry a
//! bounded number of times with a fixed delay; everything above this layer
//! propagates failures instead of retrying.

use crate::channel::MavlinkCommandChannel;
use crate::error::{Error, Result};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Which protocol a device endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolKind {
    /// Mission/command protocol to the flying vehicle.
    AerialCommand,
    /// Polled-register protocol to the cabinet controller.
    CabinetRegister,
}

/// Network identity of one device. Immutable once a session is open.
#[derive(Debug, Clone)]
pub struct DeviceEndpoint {
    pub host: String,
    pub port: u16,
    pub kind: ProtocolKind,
}

impl DeviceEndpoint {
    pub fn new(host: impl Into<String>, port: u16, kind: ProtocolKind) -> Self {
        Self {
            host: host.into(),
            port,
            kind,
        }
    }

    /// "host:port" form used by the protocol libraries.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Retry policy for establishing a session.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Attempts before giving up.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Run `attempt` up to `config.max_attempts` times with the fixed delay in
/// between. The delay is a plain timed wait; aborting the owning task there
/// cancels the connect (surfaced as `Interrupted` by the workflow wrapper).
pub async fn connect_with_retry<T, E, F, Fut>(
    config: &ConnectConfig,
    endpoint: &DeviceEndpoint,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: Display,
{
    let mut last_reason = String::new();
    for tried in 1..=config.max_attempts {
        match attempt().await {
            Ok(session) => {
                info!("connected to {} ({:?})", endpoint.address(), endpoint.kind);
                return Ok(session);
            }
            Err(e) => {
                last_reason = e.to_string();
                warn!(
                    "connect to {} failed (attempt {}/{}): {}",
                    endpoint.address(),
                    tried,
                    config.max_attempts,
                    last_reason
                );
                if tried < config.max_attempts {
                    sleep(config.retry_delay).await;
                }
            }
        }
    }
    Err(Error::ConnectionFailed {
        endpoint: endpoint.address(),
        attempts: config.max_attempts,
        reason: last_reason,
    })
}

/// Open a command channel to the vehicle at `endpoint`, retrying per
/// `config`.
pub async fn connect_aerial(
    endpoint: &DeviceEndpoint,
    config: &ConnectConfig,
) -> Result<MavlinkCommandChannel> {
    let address = format!("tcpout:{}", endpoint.address());
    connect_with_retry(config, endpoint, || {
        let address = address.clone();
        async move { MavlinkCommandChannel::open(&address) }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> DeviceEndpoint {
        DeviceEndpoint::new("10.0.0.9", 502, ProtocolKind::CabinetRegister)
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_late_attempt() {
        let mut remaining_failures = 3u32;
        let result = connect_with_retry(&ConnectConfig::default(), &endpoint(), || {
            let fail = remaining_failures > 0;
            remaining_failures = remaining_failures.saturating_sub(1);
            async move {
                if fail {
                    Err("refused")
                } else {
                    Ok(42u32)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausting_retries_reports_attempt_count() {
        let result: Result<u32> =
            connect_with_retry(&ConnectConfig::default(), &endpoint(), || async {
                Err::<u32, _>("refused")
            })
            .await;
        match result {
            Err(Error::ConnectionFailed { attempts, .. }) => assert_eq!(attempts, 5),
            other => panic!("expected ConnectionFailed, got {:?}", other),
        }
    }

    #[test]
    fn endpoint_address_form() {
        assert_eq!(endpoint().address(), "10.0.0.9:502");
    }
}
