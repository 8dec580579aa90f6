//! UDP broadcast discovery for Worldsync content hosts.
//!
//! One node on the LAN runs a [`Responder`] next to its content host; any
//! peer can locate it with a [`Finder`] without prior configuration.
//!
//! # Wire format
//!
//! A discovery datagram payload is a UTF-8 IPv4 address and nothing else:
//! no port, no version byte. The probe carries the caller's own address,
//! the reply carries the responder's advertised address.

mod finder;
mod responder;

pub use finder::Finder;
pub use responder::{Responder, ResponderConfig, local_ipv4s};

/// Errors for discovery operations.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("failed to bind discovery socket: {0}")]
    Bind(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no responder replied after {attempts} attempt(s)")]
    NoReply { attempts: u32 },

    #[error("unparseable reply from {from}: {reason}")]
    BadReply {
        from: std::net::SocketAddr,
        reason: String,
    },

    #[error("no usable network interface")]
    NoInterface,
}
