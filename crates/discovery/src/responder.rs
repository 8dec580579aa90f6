//! Broadcast responder: answers "where is the host" probes.

use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::DiscoveryError;

/// Responder configuration.
#[derive(Debug, Clone)]
pub struct ResponderConfig {
    /// UDP port to listen on (0 = OS-assigned).
    pub port: u16,
    /// Address to advertise in replies. `None` = first non-loopback
    /// interface address.
    pub advertise: Option<Ipv4Addr>,
}

/// Answers discovery probes on the local network.
///
/// Owns its socket and cancellation token; multiple independent instances
/// can coexist and each tears down deterministically.
pub struct Responder {
    config: ResponderConfig,
    active: Option<Active>,
}

struct Active {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    local_addr: SocketAddr,
}

impl Responder {
    /// Creates a responder; call [`start`](Self::start) to begin answering.
    pub fn new(config: ResponderConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    /// Binds the UDP socket and spawns the background answer loop.
    ///
    /// Every datagram received is answered to the sender's return address
    /// with the advertised IPv4 address, UTF-8 encoded. Safe to call
    /// multiple times: an existing listener is stopped before the new one
    /// binds.
    pub async fn start(&mut self) -> Result<(), DiscoveryError> {
        self.stop().await?;

        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, self.config.port))
            .await
            .map_err(DiscoveryError::Bind)?;
        let local_addr = socket.local_addr()?;

        let advertise = match self.config.advertise {
            Some(ip) => ip,
            None => local_ipv4s()
                .into_iter()
                .next()
                .ok_or(DiscoveryError::NoInterface)?,
        };

        let cancel = CancellationToken::new();
        let task = tokio::spawn(answer_loop(socket, advertise, cancel.clone()));

        tracing::info!(%local_addr, %advertise, "discovery responder started");
        self.active = Some(Active {
            cancel,
            task,
            local_addr,
        });
        Ok(())
    }

    /// Stops the answer loop and closes the socket.
    ///
    /// Idempotent: calling with no responder running is a successful no-op.
    pub async fn stop(&mut self) -> Result<(), DiscoveryError> {
        let Some(active) = self.active.take() else {
            return Ok(());
        };

        active.cancel.cancel();
        active
            .task
            .await
            .map_err(|e| DiscoveryError::Io(std::io::Error::other(e)))?;
        tracing::info!("discovery responder stopped");
        Ok(())
    }

    /// Starts the responder and runs until the token is triggered.
    pub async fn run_until(&mut self, cancel: CancellationToken) -> Result<(), DiscoveryError> {
        self.start().await?;
        cancel.cancelled().await;
        self.stop().await
    }

    /// Returns `true` while the answer loop is running.
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// The bound socket address, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.active.as_ref().map(|a| a.local_addr)
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
        }
    }
}

/// Blocks on the socket and answers every probe until cancelled.
///
/// Cancellation interrupts the pending `recv_from` via `select!`; the
/// socket closes when the task returns.
async fn answer_loop(socket: UdpSocket, advertise: Ipv4Addr, cancel: CancellationToken) {
    let reply = advertise.to_string();
    let mut buf = [0u8; 512];

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("responder loop cancelled");
                return;
            }
            result = socket.recv_from(&mut buf) => {
                match result {
                    Ok((n, peer)) => {
                        debug!(%peer, bytes = n, "discovery probe received");
                        if let Err(e) = socket.send_to(reply.as_bytes(), peer).await {
                            warn!(%peer, "failed to answer probe: {e}");
                        }
                    }
                    Err(e) => {
                        warn!("discovery receive failed: {e}");
                        return;
                    }
                }
            }
        }
    }
}

/// Returns local non-loopback IPv4 addresses, excluding link-local
/// (169.254.x.x).
pub fn local_ipv4s() -> Vec<Ipv4Addr> {
    let mut ips = Vec::new();

    let Ok(interfaces) = if_addrs::get_if_addrs() else {
        return ips;
    };

    for iface in interfaces {
        if iface.is_loopback() {
            continue;
        }
        if let std::net::IpAddr::V4(ipv4) = iface.ip() {
            if ipv4.octets()[0] == 127 {
                continue;
            }
            // Skip link-local (169.254.x.x / APIPA)
            if ipv4.octets()[0] == 169 && ipv4.octets()[1] == 254 {
                continue;
            }
            ips.push(ipv4);
        }
    }

    ips
}
