//! Hearth DNS domain layer: wire constants, record flags, errors and the
//! read-only forwarder configuration shared by the protocol core.
pub mod config;
pub mod errors;
pub mod flags;
pub mod rr;

pub use config::{
    DoctorRule, ForwarderConfig, ForwarderOptions, InterfaceName, MxSrvRecord, PtrRecord,
    TxtRecord,
};
pub use errors::WireError;
pub use flags::RecordFlags;
