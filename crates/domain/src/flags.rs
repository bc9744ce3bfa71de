use bitflags::bitflags;

bitflags! {
    /// Kind and provenance bits carried by every cache record, and used as
    /// lookup masks. A record is a forward entry (name to address), a
    /// reverse entry (address to name), or a CNAME hop; the remaining bits
    /// qualify where it came from and how it may be served.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
    pub struct RecordFlags: u32 {
        /// Never expires (static host entries).
        const IMMORTAL = 1 << 0;
        /// Synthesized from configuration, not learned upstream.
        const CONFIG   = 1 << 1;
        /// Address-to-name entry.
        const REVERSE  = 1 << 2;
        /// Name-to-address entry.
        const FORWARD  = 1 << 3;
        /// Sourced from a DHCP lease.
        const DHCP     = 1 << 4;
        /// Negative entry: the name is known to have no data.
        const NEG      = 1 << 5;
        /// Sourced from a hosts file.
        const HOSTS    = 1 << 6;
        /// IPv4 address record.
        const IPV4     = 1 << 7;
        /// IPv6 address record.
        const IPV6     = 1 << 8;
        /// Owner name exceeds the usual allowance (NS/SOA queries).
        const BIGNAME  = 1 << 9;
        /// Negative entry with rcode NXDOMAIN rather than NOERROR.
        const NXDOMAIN = 1 << 10;
        /// Alias hop; carries a weak link to its target record.
        const CNAME    = 1 << 11;
        /// Generic query classification, not a cacheable kind.
        const QUERY    = 1 << 12;
        /// Empty-answer classification used when building replies.
        const NOERR    = 1 << 13;
    }
}

impl RecordFlags {
    /// Both address families, the mask used for glue lookups.
    pub const ANY_ADDR: RecordFlags = RecordFlags::IPV4.union(RecordFlags::IPV6);

    /// Locally-configured sources that are authoritative.
    pub const LOCAL_SOURCE: RecordFlags = RecordFlags::HOSTS.union(RecordFlags::DHCP);
}
