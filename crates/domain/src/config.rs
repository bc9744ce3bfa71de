use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Static TXT record served without consulting the cache.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TxtRecord {
    pub name: String,

    #[serde(default = "default_class_in")]
    pub class: u16,

    pub text: String,
}

/// Static MX or SRV record. MX records use only `preference`; SRV records
/// additionally carry `weight` and `port`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MxSrvRecord {
    pub name: String,

    #[serde(default)]
    pub target: Option<String>,

    #[serde(default)]
    pub is_srv: bool,

    #[serde(default)]
    pub preference: u16,

    #[serde(default)]
    pub weight: u16,

    #[serde(default)]
    pub port: u16,
}

/// Static PTR override: serve `target` for reverse queries on `name`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PtrRecord {
    pub name: String,
    pub target: String,
}

/// Maps a DNS name onto the current address of a network interface.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InterfaceName {
    pub name: String,
    pub interface: String,
}

/// Rewrites addresses in upstream replies: any A record inside `network`
/// has its network bits replaced with those of `replace`. Used to undo
/// NAT mangling by broken upstream servers.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DoctorRule {
    pub network: Ipv4Network,
    pub replace: Ipv4Addr,
}

impl DoctorRule {
    pub fn matches(&self, addr: Ipv4Addr) -> bool {
        self.network.contains(addr)
    }

    /// Host bits are kept, network bits come from the replacement.
    pub fn apply(&self, addr: Ipv4Addr) -> Ipv4Addr {
        let mask = u32::from(self.network.mask());
        let rewritten = (u32::from(addr) & !mask) | (u32::from(self.replace) & mask);
        Ipv4Addr::from(rewritten)
    }
}

/// Behaviour switches, mirroring the forwarder's command line options.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ForwarderOptions {
    /// Cache the absence of records, not just their presence.
    #[serde(default = "default_true")]
    pub negative_cache: bool,

    /// Answer reverse queries for RFC1918 space with NXDOMAIN instead of
    /// forwarding them upstream.
    #[serde(default)]
    pub bogus_priv: bool,

    /// Only return hosts-file answers that share a subnet with the client.
    #[serde(default)]
    pub localise_queries: bool,

    /// Answer MX queries for local names with the name itself.
    #[serde(default)]
    pub self_mx: bool,

    /// Answer MX queries for local names with `mx_target`.
    #[serde(default)]
    pub local_mx: bool,

    /// Filter SRV/SOA noise (the Windows 2000 DNS chatter filter).
    #[serde(default)]
    pub filter_windows: bool,
}

impl Default for ForwarderOptions {
    fn default() -> Self {
        Self {
            negative_cache: true,
            bogus_priv: false,
            localise_queries: false,
            self_mx: false,
            local_mx: false,
            filter_windows: false,
        }
    }
}

/// Read-only configuration consulted by the answer synthesizer and the
/// cache populator. Built once at startup; never mutated per-request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ForwarderConfig {
    /// TTL handed out for answers synthesized from local data.
    #[serde(default)]
    pub local_ttl: u32,

    /// Largest EDNS0 UDP payload size we are willing to negotiate.
    #[serde(default = "default_edns_packet_size")]
    pub edns_packet_size: u16,

    /// Fallback MX target when `local_mx` is set.
    #[serde(default)]
    pub mx_target: Option<String>,

    #[serde(default)]
    pub txt_records: Vec<TxtRecord>,

    #[serde(default)]
    pub mx_srv_records: Vec<MxSrvRecord>,

    #[serde(default)]
    pub ptr_records: Vec<PtrRecord>,

    #[serde(default)]
    pub interface_names: Vec<InterfaceName>,

    #[serde(default)]
    pub doctors: Vec<DoctorRule>,

    /// Wildcard addresses some registrars serve for unregistered names;
    /// replies carrying one are rewritten to NXDOMAIN.
    #[serde(default)]
    pub bogus_wildcards: Vec<Ipv4Addr>,

    #[serde(default)]
    pub options: ForwarderOptions,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            local_ttl: 0,
            edns_packet_size: default_edns_packet_size(),
            mx_target: None,
            txt_records: Vec::new(),
            mx_srv_records: Vec::new(),
            ptr_records: Vec::new(),
            interface_names: Vec::new(),
            doctors: Vec::new(),
            bogus_wildcards: Vec::new(),
            options: ForwarderOptions::default(),
        }
    }
}

fn default_class_in() -> u16 {
    crate::rr::class::IN
}

fn default_edns_packet_size() -> u16 {
    1280
}

fn default_true() -> bool {
    true
}
