//! Hearth DNS wire layer: the protocol-facing core of the forwarder.
//!
//! Everything here is bounded, synchronous buffer transformation: messages
//! are parsed from untrusted bytes with every access bounds-checked,
//! answered from the record cache where possible, and re-encoded with
//! name compression. The cache itself, vendor redirect policy and
//! interface address discovery are consumed through the ports in
//! [`cache`] and [`policy`].
pub mod answer;
pub mod cache;
pub mod classify;
pub mod encode;
pub mod fingerprint;
pub mod message;
pub mod name;
pub mod policy;
pub mod populate;
pub mod pseudoheader;
pub mod reverse_name;
pub mod soa_scan;

pub use answer::{
    answer_request, check_for_bogus_wildcard, check_for_local_domain, setup_reply, LocalAnswer,
    QueryContext,
};
pub use cache::{InsertSession, RecordHandle, RecordStore};
pub use classify::{extract_request, RequestClass};
pub use fingerprint::questions_crc;
pub use policy::{AddressSource, PolicyDecision, PolicyHook};
pub use populate::extract_addresses;
