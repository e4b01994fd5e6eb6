use std::net::Ipv4Addr;

#[macro_use]
extern crate thiserror;

mod message;
mod registry;
mod socket;

pub mod discovery;
pub mod errors;
pub mod net;
pub mod service;

/// The well-known SSDP UDP port, used for both sending and group membership.
pub const SSDP_PORT: u16 = 1900;

/// The well-known SSDP IPv4 multicast group.
pub const SSDP_V4_IP: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// The wildcard search target, matching every advertised service.
pub const SSDP_ALL: &str = "ssdp:all";

#[cfg(test)]
mod tests;
