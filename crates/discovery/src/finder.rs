//! Broadcast finder: locates the content host on the LAN.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::DiscoveryError;
use crate::responder::local_ipv4s;

/// Default wait for a reply before resending the probe.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default number of probe attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Locates a [`Responder`](crate::Responder) by UDP broadcast.
///
/// Discovery is bounded: each probe waits `attempt_timeout` for a reply and
/// is retried up to `max_attempts` times before giving up with
/// [`DiscoveryError::NoReply`]. The probe target defaults to the limited
/// broadcast address; overriding it lets tests aim at loopback.
#[derive(Debug, Clone)]
pub struct Finder {
    /// Where probes are sent.
    pub target: IpAddr,
    /// How long each attempt waits for a reply.
    pub attempt_timeout: Duration,
    /// Total probe attempts before giving up.
    pub max_attempts: u32,
}

impl Default for Finder {
    fn default() -> Self {
        Self {
            target: IpAddr::V4(Ipv4Addr::BROADCAST),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl Finder {
    /// A finder probing the limited broadcast address with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// A finder probing a specific address instead of broadcasting.
    pub fn with_target(target: IpAddr) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// Sends probes on `port` and returns the first responder's address.
    ///
    /// The probe payload is this node's own IPv4 address, matching the
    /// discovery wire format; responders ignore the content and reply to
    /// the datagram's return address.
    pub async fn find(&self, port: u16) -> Result<IpAddr, DiscoveryError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .await
            .map_err(DiscoveryError::Bind)?;
        socket.set_broadcast(true)?;

        let own = local_ipv4s()
            .into_iter()
            .next()
            .unwrap_or(Ipv4Addr::LOCALHOST);
        let probe = own.to_string();
        let target = SocketAddr::new(self.target, port);
        let mut buf = [0u8; 512];

        for attempt in 1..=self.max_attempts {
            socket.send_to(probe.as_bytes(), target).await?;
            debug!(attempt, %target, "discovery probe sent");

            match tokio::time::timeout(self.attempt_timeout, socket.recv_from(&mut buf)).await {
                Ok(Ok((n, from))) => {
                    let text =
                        std::str::from_utf8(&buf[..n]).map_err(|e| DiscoveryError::BadReply {
                            from,
                            reason: e.to_string(),
                        })?;
                    let addr: IpAddr =
                        text.trim().parse().map_err(|e: std::net::AddrParseError| {
                            DiscoveryError::BadReply {
                                from,
                                reason: e.to_string(),
                            }
                        })?;
                    info!(host = %addr, %from, "content host located");
                    return Ok(addr);
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    debug!(attempt, "no reply within timeout");
                }
            }
        }

        Err(DiscoveryError::NoReply {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::{Responder, ResponderConfig};

    fn loopback_finder() -> Finder {
        Finder {
            target: IpAddr::V4(Ipv4Addr::LOCALHOST),
            attempt_timeout: Duration::from_millis(500),
            max_attempts: 3,
        }
    }

    #[tokio::test]
    async fn finds_responder_on_loopback() {
        let mut responder = Responder::new(ResponderConfig {
            port: 0,
            advertise: Some(Ipv4Addr::LOCALHOST),
        });
        responder.start().await.unwrap();
        let port = responder.local_addr().unwrap().port();

        let found = loopback_finder().find(port).await.unwrap();
        assert_eq!(found, IpAddr::V4(Ipv4Addr::LOCALHOST));

        responder.stop().await.unwrap();
    }

    #[tokio::test]
    async fn no_responder_times_out() {
        // Bind a throwaway socket to learn a port nothing answers on.
        let silent = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = silent.local_addr().unwrap().port();
        drop(silent);

        let finder = Finder {
            target: IpAddr::V4(Ipv4Addr::LOCALHOST),
            attempt_timeout: Duration::from_millis(50),
            max_attempts: 2,
        };

        let result = finder.find(port).await;
        assert!(matches!(
            result,
            Err(DiscoveryError::NoReply { attempts: 2 })
        ));
    }

    #[tokio::test]
    async fn garbage_reply_is_bad_reply() {
        // A fake responder that answers with a non-address string.
        let fake = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = fake.local_addr().unwrap().port();

        tokio::spawn(async move {
            let mut buf = [0u8; 512];
            let (_, peer) = fake.recv_from(&mut buf).await.unwrap();
            fake.send_to(b"not-an-address", peer).await.unwrap();
        });

        let result = loopback_finder().find(port).await;
        assert!(matches!(result, Err(DiscoveryError::BadReply { .. })));
    }
}
