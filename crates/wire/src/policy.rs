//! Ports for decisions the wire layer cannot make by itself.

use std::net::{IpAddr, Ipv4Addr};

/// What to do with a question the cache could not answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Synthesize a one-record answer.
    Answer { addr: IpAddr, ttl: u32 },
    /// Pass the query upstream.
    Forward,
    /// Answer nothing at all; the caller sends no reply.
    Drop,
}

/// Hook consulted for questions neither static records nor the cache
/// could satisfy. Used for vendor redirects and block policies.
pub trait PolicyHook {
    fn resolve_unmatched(&self, name: &str, qtype: u16, qclass: u16) -> PolicyDecision;
}

/// Source of local interface addresses, for answering queries about
/// the forwarder's own names.
pub trait AddressSource {
    fn interface_address(&self, interface: &str) -> Option<Ipv4Addr>;
}
