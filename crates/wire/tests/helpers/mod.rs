//! Shared fixtures: an in-memory record store and raw packet builders.
#![allow(dead_code)] // each test binary uses its own subset

use hearth_dns_domain::RecordFlags;
use hearth_dns_wire::{AddressSource, PolicyDecision, PolicyHook, RecordHandle, RecordStore};
use std::net::{IpAddr, Ipv4Addr};

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    addr: Option<IpAddr>,
    ttd: u64,
    flags: RecordFlags,
    uid: u64,
    cname: Option<(usize, u64)>,
    evicted: bool,
}

/// Vec-backed store, append-only, good enough to exercise every port
/// method including weak CNAME links and insert batches.
#[derive(Default)]
pub struct MemoryCache {
    entries: Vec<Entry>,
    staged_from: Option<usize>,
    next_uid: u64,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Simulates slot reuse: the entry disappears and its uid changes,
    /// so stale CNAME links to it must stop resolving.
    pub fn evict(&mut self, handle: RecordHandle) {
        let e = &mut self.entries[handle.0 as usize];
        e.evicted = true;
        e.uid = self.next_uid;
        self.next_uid += 1;
    }

    fn live(&self, idx: usize, now: u64) -> bool {
        let e = &self.entries[idx];
        if e.evicted {
            return false;
        }
        e.flags.contains(RecordFlags::IMMORTAL) || e.ttd > now
    }

    fn scan<F: Fn(&Entry) -> bool>(
        &self,
        after: Option<RecordHandle>,
        now: u64,
        mask: RecordFlags,
        accept: F,
    ) -> Option<RecordHandle> {
        let start = after.map(|h| h.0 as usize + 1).unwrap_or(0);
        (start..self.entries.len())
            .find(|&i| {
                self.live(i, now)
                    && self.entries[i].flags.intersects(mask)
                    && accept(&self.entries[i])
            })
            .map(|i| RecordHandle(i as u64))
    }
}

impl RecordStore for MemoryCache {
    fn begin_insert(&mut self) {
        self.staged_from = Some(self.entries.len());
    }

    fn commit_insert(&mut self) {
        self.staged_from = None;
    }

    fn abort_insert(&mut self) {
        if let Some(from) = self.staged_from.take() {
            self.entries.truncate(from);
        }
    }

    fn insert(
        &mut self,
        name: &str,
        addr: Option<IpAddr>,
        now: u64,
        ttl: u32,
        flags: RecordFlags,
    ) -> Option<RecordHandle> {
        let uid = self.next_uid;
        self.next_uid += 1;
        self.entries.push(Entry {
            name: name.to_string(),
            addr,
            ttd: now + u64::from(ttl),
            flags,
            uid,
            cname: None,
            evicted: false,
        });
        Some(RecordHandle(self.entries.len() as u64 - 1))
    }

    fn find_by_name(
        &self,
        after: Option<RecordHandle>,
        name: &str,
        now: u64,
        mask: RecordFlags,
    ) -> Option<RecordHandle> {
        self.scan(after, now, mask, |e| e.name.eq_ignore_ascii_case(name))
    }

    fn find_by_addr(
        &self,
        after: Option<RecordHandle>,
        addr: IpAddr,
        now: u64,
        mask: RecordFlags,
    ) -> Option<RecordHandle> {
        self.scan(after, now, mask, |e| e.addr == Some(addr))
    }

    fn name_of(&self, handle: RecordHandle) -> &str {
        &self.entries[handle.0 as usize].name
    }

    fn flags_of(&self, handle: RecordHandle) -> RecordFlags {
        self.entries[handle.0 as usize].flags
    }

    fn time_to_die(&self, handle: RecordHandle) -> u64 {
        self.entries[handle.0 as usize].ttd
    }

    fn uid_of(&self, handle: RecordHandle) -> u64 {
        self.entries[handle.0 as usize].uid
    }

    fn address_of(&self, handle: RecordHandle) -> Option<IpAddr> {
        self.entries[handle.0 as usize].addr
    }

    fn set_cname_target(&mut self, handle: RecordHandle, target: RecordHandle, uid: u64) {
        self.entries[handle.0 as usize].cname = Some((target.0 as usize, uid));
    }

    fn cname_target(&self, handle: RecordHandle) -> Option<RecordHandle> {
        let (idx, uid) = self.entries[handle.0 as usize].cname?;
        let target = self.entries.get(idx)?;
        if target.uid != uid || target.evicted {
            return None;
        }
        Some(RecordHandle(idx as u64))
    }
}

pub fn encode_name(buf: &mut Vec<u8>, name: &str) {
    for label in name.split('.').filter(|l| !l.is_empty()) {
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }
    buf.push(0);
}

/// Encoded-name RDATA for CNAME and PTR records.
pub fn name_rdata(name: &str) -> Vec<u8> {
    let mut out = Vec::new();
    encode_name(&mut out, name);
    out
}

/// Named interfaces with fixed addresses.
pub struct StaticInterfaces(pub Vec<(&'static str, Ipv4Addr)>);

impl AddressSource for StaticInterfaces {
    fn interface_address(&self, interface: &str) -> Option<Ipv4Addr> {
        self.0
            .iter()
            .find(|(name, _)| *name == interface)
            .map(|&(_, addr)| addr)
    }
}

pub fn no_interfaces() -> StaticInterfaces {
    StaticInterfaces(Vec::new())
}

/// Policy hook that always answers the same way.
pub struct FixedPolicy(pub PolicyDecision);

impl PolicyHook for FixedPolicy {
    fn resolve_unmatched(&self, _name: &str, _qtype: u16, _qclass: u16) -> PolicyDecision {
        self.0
    }
}

/// A single-question query packet.
pub fn query(name: &str, qtype: u16) -> Vec<u8> {
    let mut buf = vec![0u8; 12];
    buf[0] = 0xd5;
    buf[1] = 0x21;
    buf[5] = 1; // qdcount
    encode_name(&mut buf, name);
    buf.extend_from_slice(&qtype.to_be_bytes());
    buf.extend_from_slice(&1u16.to_be_bytes());
    buf
}

/// Appends an EDNS0 OPT record advertising `udp_size`, DO bit optional.
pub fn append_opt(buf: &mut Vec<u8>, udp_size: u16, dnssec_ok: bool) {
    buf[11] += 1; // arcount
    buf.push(0); // root owner
    buf.extend_from_slice(&41u16.to_be_bytes());
    buf.extend_from_slice(&udp_size.to_be_bytes());
    buf.extend_from_slice(&[0, 0]); // ext rcode, version
    buf.extend_from_slice(&if dnssec_ok { [0x80, 0] } else { [0, 0] });
    buf.extend_from_slice(&0u16.to_be_bytes()); // rdlen
}

/// Builds upstream responses for the cache populator.
pub struct ResponseBuilder {
    buf: Vec<u8>,
}

impl ResponseBuilder {
    pub fn new(qname: &str, qtype: u16) -> Self {
        let mut buf = query(qname, qtype);
        buf[2] |= 0x80; // qr
        ResponseBuilder { buf }
    }

    pub fn rcode(mut self, rc: u8) -> Self {
        self.buf[3] = (self.buf[3] & 0xf0) | rc;
        self
    }

    pub fn answer(mut self, owner: &str, rrtype: u16, ttl: u32, rdata: &[u8]) -> Self {
        self.buf[7] += 1; // ancount
        self.record(owner, rrtype, ttl, rdata);
        self
    }

    pub fn authority_soa(mut self, ttl: u32, minimum: u32) -> Self {
        self.buf[9] += 1; // nscount
        let mut rdata = vec![0u8, 0]; // root mname, rname
        rdata.extend_from_slice(&[0u8; 16]); // serial..expire
        rdata.extend_from_slice(&minimum.to_be_bytes());
        self.record("", 6, ttl, &rdata);
        self
    }

    pub fn additional(mut self, owner: &str, rrtype: u16, ttl: u32, rdata: &[u8]) -> Self {
        self.buf[11] += 1; // arcount
        self.record(owner, rrtype, ttl, rdata);
        self
    }

    fn record(&mut self, owner: &str, rrtype: u16, ttl: u32, rdata: &[u8]) {
        encode_name(&mut self.buf, owner);
        self.buf.extend_from_slice(&rrtype.to_be_bytes());
        self.buf.extend_from_slice(&1u16.to_be_bytes());
        self.buf.extend_from_slice(&ttl.to_be_bytes());
        self.buf.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        self.buf.extend_from_slice(rdata);
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}
