//! Answering queries from local data: static records, the record store
//! and the policy hook. Answers are written over the tail of the query
//! buffer itself.
//!
//! When the query carries an EDNS0 pseudo-header a probe pass runs
//! first, deciding every question without writing a byte; only once the
//! whole query is known to be answerable does the commit pass overwrite
//! the additional section. Queries with the DO bit set are answered
//! from local data only, since cached records carry no security proof.

use crate::cache::RecordStore;
use crate::encode::{add_resource_record, RdataField};
use crate::message::{header, skip_questions, u16_at, HEADER_SIZE};
use crate::name::extract_name;
use crate::policy::{AddressSource, PolicyDecision, PolicyHook};
use crate::pseudoheader::find_pseudoheader;
use crate::reverse_name::{in_arpa_name_2_addr, ReverseName};
use hearth_dns_domain::rr::{class, opcode, rcode, rrtype};
use hearth_dns_domain::{ForwarderConfig, RecordFlags, WireError};
use ipnetwork::Ipv4Network;
use smallvec::SmallVec;
use std::net::{IpAddr, Ipv4Addr};
use tracing::debug;

/// CNAME hops followed through the store before giving up.
const CNAME_CHAIN_LIMIT: u32 = 5;

/// Outcome of trying to answer a query locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalAnswer {
    /// Fully answered; the buffer now holds a response of this length.
    Answered(usize),
    /// At least one question needs upstream; forward the query untouched.
    Unanswerable,
    /// Policy says this query gets no reply at all.
    Drop,
}

/// Everything the answer path consults besides the packet itself.
pub struct QueryContext<'a> {
    pub config: &'a ForwarderConfig,
    pub cache: &'a dyn RecordStore,
    pub policy: Option<&'a dyn PolicyHook>,
    pub interfaces: &'a dyn AddressSource,
    /// Network the query arrived from, for localised hosts answers.
    pub local_subnet: Option<Ipv4Network>,
    pub now: u64,
}

/// What one pass over the questions produced. The probe pass only cares
/// whether a pass completes; the commit pass's outcome becomes the reply.
struct PassOutcome {
    cursor: usize,
    anscount: u16,
    addncount: u16,
    nxdomain: bool,
    auth: bool,
    trunc: bool,
}

enum PassResult {
    Done(PassOutcome),
    Unanswerable,
    Drop,
}

fn hostname_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn record_ttl(cache: &dyn RecordStore, h: crate::cache::RecordHandle, now: u64, local_ttl: u32) -> u32 {
    let flags = cache.flags_of(h);
    // DHCP addresses may change before the lease runs out
    if flags.intersects(RecordFlags::IMMORTAL | RecordFlags::DHCP) {
        local_ttl
    } else {
        cache.time_to_die(h).saturating_sub(now) as u32
    }
}

fn private_net(addr: Ipv4Addr) -> bool {
    addr.is_private() || addr.is_loopback() || addr.is_link_local()
}

/// Tries to answer every question in `buf` from local data, rewriting
/// the buffer into a response no longer than `limit`.
pub fn answer_request(
    buf: &mut Vec<u8>,
    limit: usize,
    ctx: &QueryContext<'_>,
) -> Result<LocalAnswer, WireError> {
    let scan = find_pseudoheader(buf, true)?;
    let mut sec_reqd = false;

    if let Some(opt) = scan.opt {
        let udpsz = u16_at(buf, opt.udp_size_offset)?;
        let ext_flags = u16_at(buf, opt.udp_size_offset + 4)?;
        sec_reqd = ext_flags & 0x8000 != 0; // DO bit

        // Stop the client negotiating a larger reply than we handle.
        if !scan.is_signed && udpsz > ctx.config.edns_packet_size {
            crate::message::put_u16(buf, opt.udp_size_offset, ctx.config.edns_packet_size);
        }
    }

    if header::qdcount(buf) == 0 || header::opcode(buf) != opcode::QUERY {
        return Ok(LocalAnswer::Unanswerable);
    }

    // Partial answers would already have clobbered the pseudo-header, so
    // its presence forces a write-free probe pass first.
    if scan.opt.is_some() {
        match run_pass(buf, limit, ctx, sec_reqd, false)? {
            PassResult::Done(_) => {}
            PassResult::Unanswerable => return Ok(LocalAnswer::Unanswerable),
            PassResult::Drop => return Ok(LocalAnswer::Drop),
        }
    }

    // If a later question bails out the query is forwarded as received,
    // so any answers already laid over its tail must be discarded.
    let query_len = buf.len();
    let outcome = match run_pass(buf, limit, ctx, sec_reqd, true)? {
        PassResult::Done(outcome) => outcome,
        PassResult::Unanswerable => {
            buf.truncate(query_len);
            return Ok(LocalAnswer::Unanswerable);
        }
        PassResult::Drop => {
            buf.truncate(query_len);
            return Ok(LocalAnswer::Drop);
        }
    };

    header::set_response(buf, true);
    header::set_authoritative(buf, outcome.auth);
    header::set_recursion_available(buf, true);
    header::set_truncated(buf, outcome.trunc);
    header::set_rcode(
        buf,
        if outcome.anscount == 0 && outcome.nxdomain {
            rcode::NXDOMAIN
        } else {
            rcode::NOERROR
        },
    );
    header::set_ancount(buf, outcome.anscount);
    header::set_nscount(buf, 0);
    header::set_arcount(buf, outcome.addncount);

    buf.truncate(outcome.cursor);
    Ok(LocalAnswer::Answered(outcome.cursor))
}

fn run_pass(
    buf: &mut Vec<u8>,
    limit: usize,
    ctx: &QueryContext<'_>,
    sec_reqd: bool,
    commit: bool,
) -> Result<PassResult, WireError> {
    let cfg = ctx.config;
    let cache = ctx.cache;
    let qdcount = header::qdcount(buf);

    let mut cursor = skip_questions(buf)?;
    let mut name = String::new();
    let mut anscount = 0u16;
    let mut nxdomain = false;
    let mut auth = true;
    let mut trunc = false;
    // static MX/SRV targets that need address glue, by config index
    let mut glue: SmallVec<[(usize, usize); 4]> = SmallVec::new();

    let mut p = HEADER_SIZE;
    for _ in 0..qdcount {
        let mut nameoffset = p;
        p = extract_name(buf, p, &mut name)?;
        let qtype = u16_at(buf, p)?;
        let qclass = u16_at(buf, p + 2)?;
        p += 4;

        let mut ans = false;

        if qtype == rrtype::TXT || qtype == rrtype::ANY {
            for txt in &cfg.txt_records {
                if txt.class == qclass && hostname_eq(&name, &txt.name) {
                    ans = true;
                    if commit {
                        debug!(%name, "answering from static TXT record");
                        let text = txt.text.as_bytes();
                        let len = text.len().min(255);
                        let mut blob = Vec::with_capacity(len + 1);
                        blob.push(len as u8);
                        blob.extend_from_slice(&text[..len]);
                        if let Some(rec) = add_resource_record(
                            buf,
                            limit,
                            Some(&mut trunc),
                            nameoffset,
                            cursor,
                            cfg.local_ttl,
                            rrtype::TXT,
                            txt.class,
                            &[RdataField::Blob(&blob)],
                        ) {
                            cursor = rec.cursor;
                            anscount += 1;
                        }
                    }
                }
            }
        }

        if qclass == class::IN {
            if qtype == rrtype::PTR || qtype == rrtype::ANY {
                let rev = in_arpa_name_2_addr(&name);

                let static_ptr = cfg.ptr_records.iter().any(|r| hostname_eq(&name, &r.name));
                let intr_name = match rev {
                    Some(ReverseName::V4(v4)) => cfg.interface_names.iter().find(|i| {
                        ctx.interfaces.interface_address(&i.interface) == Some(v4)
                    }),
                    _ => None,
                };

                if let Some(intr) = intr_name {
                    ans = true;
                    if commit {
                        if let Some(rec) = add_resource_record(
                            buf,
                            limit,
                            Some(&mut trunc),
                            nameoffset,
                            cursor,
                            cfg.local_ttl,
                            rrtype::PTR,
                            class::IN,
                            &[RdataField::Name(&intr.name)],
                        ) {
                            cursor = rec.cursor;
                            anscount += 1;
                        }
                    }
                } else if static_ptr {
                    ans = true;
                    if commit {
                        for r in cfg.ptr_records.iter().filter(|r| hostname_eq(&name, &r.name)) {
                            if let Some(rec) = add_resource_record(
                                buf,
                                limit,
                                Some(&mut trunc),
                                nameoffset,
                                cursor,
                                cfg.local_ttl,
                                rrtype::PTR,
                                class::IN,
                                &[RdataField::Name(&r.target)],
                            ) {
                                cursor = rec.cursor;
                                anscount += 1;
                            }
                        }
                    }
                } else if let Some(rev) = rev {
                    let mask = rev.family();
                    let mut found_any = false;
                    let mut h = cache.find_by_addr(None, rev.ip(), ctx.now, mask);
                    while let Some(cur) = h {
                        found_any = true;
                        let flags = cache.flags_of(cur);

                        // wildcard queries only get hosts or DHCP data
                        if qtype == rrtype::ANY && !flags.intersects(RecordFlags::LOCAL_SOURCE) {
                            h = cache.find_by_addr(Some(cur), rev.ip(), ctx.now, mask);
                            continue;
                        }

                        if flags.contains(RecordFlags::NEG) {
                            ans = true;
                            auth = false;
                            if flags.contains(RecordFlags::NXDOMAIN) {
                                nxdomain = true;
                            }
                        } else if flags.intersects(RecordFlags::LOCAL_SOURCE) || !sec_reqd {
                            ans = true;
                            if !flags.intersects(RecordFlags::LOCAL_SOURCE) {
                                auth = false;
                            }
                            if commit {
                                let ttl = record_ttl(cache, cur, ctx.now, cfg.local_ttl);
                                if let Some(rec) = add_resource_record(
                                    buf,
                                    limit,
                                    Some(&mut trunc),
                                    nameoffset,
                                    cursor,
                                    ttl,
                                    rrtype::PTR,
                                    class::IN,
                                    &[RdataField::Name(cache.name_of(cur))],
                                ) {
                                    cursor = rec.cursor;
                                    anscount += 1;
                                }
                            }
                        }
                        h = cache.find_by_addr(Some(cur), rev.ip(), ctx.now, mask);
                    }

                    if !found_any {
                        if let ReverseName::V4(v4) = rev {
                            if cfg.options.bogus_priv && private_net(v4) {
                                // unknown private space never goes upstream
                                ans = true;
                                nxdomain = true;
                            }
                        }
                    }
                }
            }

            for family in [RecordFlags::IPV4, RecordFlags::IPV6] {
                let rtype = if family == RecordFlags::IPV4 {
                    rrtype::A
                } else {
                    rrtype::AAAA
                };
                if qtype != rtype && qtype != rrtype::ANY {
                    continue;
                }

                // A-for-A: the "name" is already an address literal
                if qtype == rrtype::A {
                    if let Ok(literal) = name.parse::<Ipv4Addr>() {
                        ans = true;
                        if commit {
                            if let Some(rec) = add_resource_record(
                                buf,
                                limit,
                                Some(&mut trunc),
                                nameoffset,
                                cursor,
                                cfg.local_ttl,
                                rrtype::A,
                                class::IN,
                                &[RdataField::Addr4(literal)],
                            ) {
                                cursor = rec.cursor;
                                anscount += 1;
                            }
                        }
                        continue;
                    }
                }

                if qtype == rrtype::A {
                    if let Some(intr) = cfg
                        .interface_names
                        .iter()
                        .find(|i| hostname_eq(&name, &i.name))
                    {
                        ans = true;
                        if commit {
                            if let Some(addr) = ctx.interfaces.interface_address(&intr.interface) {
                                if let Some(rec) = add_resource_record(
                                    buf,
                                    limit,
                                    Some(&mut trunc),
                                    nameoffset,
                                    cursor,
                                    cfg.local_ttl,
                                    rrtype::A,
                                    class::IN,
                                    &[RdataField::Addr4(addr)],
                                ) {
                                    cursor = rec.cursor;
                                    anscount += 1;
                                }
                            }
                        }
                        continue;
                    }
                }

                let mask = family | RecordFlags::CNAME;
                let mut hops = CNAME_CHAIN_LIMIT;
                'restart: loop {
                    let first = cache.find_by_name(None, &name, ctx.now, mask);
                    let Some(first) = first else { break };

                    // A hosts-file address on the querying network means
                    // answers off that network get filtered out.
                    let mut localise = false;
                    if let Some(subnet) = ctx.local_subnet {
                        if cfg.options.localise_queries && family == RecordFlags::IPV4 {
                            let mut probe = Some(first);
                            while let Some(cur) = probe {
                                if cache.flags_of(cur).contains(RecordFlags::HOSTS) {
                                    if let Some(IpAddr::V4(a)) = cache.address_of(cur) {
                                        if subnet.contains(a) {
                                            localise = true;
                                            break;
                                        }
                                    }
                                }
                                probe = cache.find_by_name(Some(cur), &name, ctx.now, mask);
                            }
                        }
                    }

                    let mut h = Some(first);
                    while let Some(cur) = h {
                        let flags = cache.flags_of(cur);

                        if qtype == rrtype::ANY && !flags.intersects(RecordFlags::LOCAL_SOURCE) {
                            break 'restart;
                        }

                        if flags.contains(RecordFlags::CNAME) {
                            // a dead link reads as expired; nothing to say
                            let Some(target) = cache.cname_target(cur) else {
                                break 'restart;
                            };
                            if hops == 0 {
                                break 'restart;
                            }
                            hops -= 1;

                            if commit {
                                let ttl = cache.time_to_die(cur).saturating_sub(ctx.now) as u32;
                                if let Some(rec) = add_resource_record(
                                    buf,
                                    limit,
                                    Some(&mut trunc),
                                    nameoffset,
                                    cursor,
                                    ttl,
                                    rrtype::CNAME,
                                    class::IN,
                                    &[RdataField::Name(cache.name_of(target))],
                                ) {
                                    cursor = rec.cursor;
                                    anscount += 1;
                                    // later answers name the chain target
                                    if let Some(off) = rec.name_offset {
                                        nameoffset = off;
                                    }
                                }
                            }

                            name.clear();
                            name.push_str(cache.name_of(target));
                            continue 'restart;
                        }

                        if flags.contains(RecordFlags::NEG) {
                            ans = true;
                            auth = false;
                            if flags.contains(RecordFlags::NXDOMAIN) {
                                nxdomain = true;
                            }
                        } else if flags.intersects(RecordFlags::LOCAL_SOURCE) || !sec_reqd {
                            let off_net = match cache.address_of(cur) {
                                Some(IpAddr::V4(a)) => ctx
                                    .local_subnet
                                    .map(|subnet| !subnet.contains(a))
                                    .unwrap_or(false),
                                _ => false,
                            };
                            if localise && flags.contains(RecordFlags::HOSTS) && off_net {
                                h = cache.find_by_name(Some(cur), &name, ctx.now, mask);
                                continue;
                            }

                            if !flags.intersects(RecordFlags::LOCAL_SOURCE) {
                                auth = false;
                            }
                            ans = true;
                            if commit {
                                let ttl = record_ttl(cache, cur, ctx.now, cfg.local_ttl);
                                let rdata = match cache.address_of(cur) {
                                    Some(IpAddr::V4(a)) => RdataField::Addr4(a),
                                    Some(IpAddr::V6(a)) => RdataField::Addr6(a),
                                    None => {
                                        h = cache.find_by_name(Some(cur), &name, ctx.now, mask);
                                        continue;
                                    }
                                };
                                if let Some(rec) = add_resource_record(
                                    buf,
                                    limit,
                                    Some(&mut trunc),
                                    nameoffset,
                                    cursor,
                                    ttl,
                                    rtype,
                                    class::IN,
                                    &[rdata],
                                ) {
                                    cursor = rec.cursor;
                                    anscount += 1;
                                }
                            }
                        }
                        h = cache.find_by_name(Some(cur), &name, ctx.now, mask);
                    }
                    break;
                }
            }

            if qtype == rrtype::MX || qtype == rrtype::ANY {
                let mut found = false;
                for (idx, rec) in cfg.mx_srv_records.iter().enumerate() {
                    if !rec.is_srv && hostname_eq(&name, &rec.name) {
                        ans = true;
                        found = true;
                        if commit {
                            let target = rec.target.as_deref().unwrap_or("");
                            if let Some(added) = add_resource_record(
                                buf,
                                limit,
                                Some(&mut trunc),
                                nameoffset,
                                cursor,
                                cfg.local_ttl,
                                rrtype::MX,
                                class::IN,
                                &[RdataField::Short(rec.preference), RdataField::Name(target)],
                            ) {
                                cursor = added.cursor;
                                anscount += 1;
                                if let (true, Some(off)) = (rec.target.is_some(), added.name_offset)
                                {
                                    glue.push((idx, off));
                                }
                            }
                        }
                    }
                }

                if !found
                    && (cfg.options.self_mx || cfg.options.local_mx)
                    && cache
                        .find_by_name(None, &name, ctx.now, RecordFlags::LOCAL_SOURCE)
                        .is_some()
                {
                    ans = true;
                    if commit {
                        let target = if cfg.options.self_mx {
                            name.as_str()
                        } else {
                            cfg.mx_target.as_deref().unwrap_or("")
                        };
                        if let Some(added) = add_resource_record(
                            buf,
                            limit,
                            Some(&mut trunc),
                            nameoffset,
                            cursor,
                            cfg.local_ttl,
                            rrtype::MX,
                            class::IN,
                            &[RdataField::Short(1), RdataField::Name(target)],
                        ) {
                            cursor = added.cursor;
                            anscount += 1;
                        }
                    }
                }
            }

            if qtype == rrtype::SRV || qtype == rrtype::ANY {
                let mut found = false;
                for (idx, rec) in cfg.mx_srv_records.iter().enumerate() {
                    if rec.is_srv && hostname_eq(&name, &rec.name) {
                        ans = true;
                        found = true;
                        if commit {
                            let target = rec.target.as_deref().unwrap_or("");
                            if let Some(added) = add_resource_record(
                                buf,
                                limit,
                                Some(&mut trunc),
                                nameoffset,
                                cursor,
                                cfg.local_ttl,
                                rrtype::SRV,
                                class::IN,
                                &[
                                    RdataField::Short(rec.preference),
                                    RdataField::Short(rec.weight),
                                    RdataField::Short(rec.port),
                                    RdataField::Name(target),
                                ],
                            ) {
                                cursor = added.cursor;
                                anscount += 1;
                                if let (true, Some(off)) = (rec.target.is_some(), added.name_offset)
                                {
                                    glue.push((idx, off));
                                }
                            }
                        }
                    }
                }

                // the Windows chatter filter: empty answer instead of a trip
                // upstream
                if !found
                    && cfg.options.filter_windows
                    && (qtype == rrtype::SRV || (qtype == rrtype::ANY && name.contains('_')))
                {
                    ans = true;
                }
            }

            if qtype == rrtype::MAILB {
                ans = true;
                nxdomain = true;
            }

            if qtype == rrtype::SOA && cfg.options.filter_windows {
                ans = true;
            }
        }

        if !ans {
            let Some(policy) = ctx.policy else {
                return Ok(PassResult::Unanswerable);
            };
            match policy.resolve_unmatched(&name, qtype, qclass) {
                PolicyDecision::Forward => return Ok(PassResult::Unanswerable),
                PolicyDecision::Drop => return Ok(PassResult::Drop),
                PolicyDecision::Answer { addr, ttl } => {
                    debug!(%name, %addr, "policy answer");
                    if commit {
                        let (rtype, rdata) = match addr {
                            IpAddr::V4(a) => (rrtype::A, RdataField::Addr4(a)),
                            IpAddr::V6(a) => (rrtype::AAAA, RdataField::Addr6(a)),
                        };
                        if let Some(rec) = add_resource_record(
                            buf,
                            limit,
                            Some(&mut trunc),
                            nameoffset,
                            cursor,
                            ttl,
                            rtype,
                            class::IN,
                            &[rdata],
                        ) {
                            cursor = rec.cursor;
                            anscount += 1;
                        }
                    }
                }
            }
        }
    }

    // additional section: address glue for MX/SRV targets
    let mut addncount = 0u16;
    for gi in 0..glue.len() {
        let (idx, offset) = glue[gi];
        let target = match cfg.mx_srv_records[idx].target.as_deref() {
            Some(t) => t,
            None => continue,
        };
        // squash duplicate targets
        if glue[..gi].iter().any(|&(prev, _)| {
            cfg.mx_srv_records[prev]
                .target
                .as_deref()
                .is_some_and(|t| hostname_eq(t, target))
        }) {
            continue;
        }

        let mask = RecordFlags::ANY_ADDR;
        let mut h = cache.find_by_name(None, target, ctx.now, mask);
        while let Some(cur) = h {
            let flags = cache.flags_of(cur);
            if !flags.contains(RecordFlags::NEG) {
                let ttl = record_ttl(cache, cur, ctx.now, cfg.local_ttl);
                let (rtype, rdata) = match cache.address_of(cur) {
                    Some(IpAddr::V4(a)) => (rrtype::A, RdataField::Addr4(a)),
                    Some(IpAddr::V6(a)) => (rrtype::AAAA, RdataField::Addr6(a)),
                    None => {
                        h = cache.find_by_name(Some(cur), target, ctx.now, mask);
                        continue;
                    }
                };
                if let Some(rec) = add_resource_record(
                    buf, limit, None, offset, cursor, ttl, rtype, class::IN, &[rdata],
                ) {
                    cursor = rec.cursor;
                    addncount += 1;
                }
            }
            h = cache.find_by_name(Some(cur), target, ctx.now, mask);
        }
    }

    Ok(PassResult::Done(PassOutcome {
        cursor,
        anscount,
        addncount,
        nxdomain,
        auth,
        trunc,
    }))
}

/// Builds a minimal standalone reply in place: an error code, an empty
/// answer, or a single address record, depending on `flags`.
pub fn setup_reply(
    buf: &mut Vec<u8>,
    flags: RecordFlags,
    addr: Option<IpAddr>,
    ttl: u32,
) -> Result<usize, WireError> {
    let mut cursor = skip_questions(buf)?;

    header::set_response(buf, true);
    header::set_authoritative(buf, false);
    header::set_recursion_available(buf, true);
    header::set_truncated(buf, false);
    header::set_ancount(buf, 0);
    header::set_nscount(buf, 0);
    header::set_arcount(buf, 0);

    if flags == RecordFlags::NEG {
        header::set_rcode(buf, rcode::SERVFAIL);
    } else if flags == RecordFlags::NOERR || flags == RecordFlags::QUERY {
        header::set_rcode(buf, rcode::NOERROR);
    } else if flags == RecordFlags::NXDOMAIN {
        header::set_rcode(buf, rcode::NXDOMAIN);
    } else if let (true, Some(IpAddr::V4(a))) = (flags == RecordFlags::IPV4, addr) {
        header::set_rcode(buf, rcode::NOERROR);
        header::set_ancount(buf, 1);
        header::set_authoritative(buf, true);
        if let Some(rec) = add_resource_record(
            buf,
            usize::MAX,
            None,
            HEADER_SIZE,
            cursor,
            ttl,
            rrtype::A,
            class::IN,
            &[RdataField::Addr4(a)],
        ) {
            cursor = rec.cursor;
        }
    } else if let (true, Some(IpAddr::V6(a))) = (flags == RecordFlags::IPV6, addr) {
        header::set_rcode(buf, rcode::NOERROR);
        header::set_ancount(buf, 1);
        header::set_authoritative(buf, true);
        if let Some(rec) = add_resource_record(
            buf,
            usize::MAX,
            None,
            HEADER_SIZE,
            cursor,
            ttl,
            rrtype::AAAA,
            class::IN,
            &[RdataField::Addr6(a)],
        ) {
            cursor = rec.cursor;
        }
    } else {
        header::set_rcode(buf, rcode::REFUSED);
    }

    buf.truncate(cursor);
    Ok(cursor)
}

/// Whether `name` is served from local data: a hosts or DHCP record, or
/// any static record.
pub fn check_for_local_domain(
    name: &str,
    now: u64,
    cfg: &ForwarderConfig,
    cache: &dyn RecordStore,
) -> bool {
    if let Some(h) = cache.find_by_name(None, name, now, RecordFlags::ANY_ADDR) {
        if cache.flags_of(h).intersects(RecordFlags::LOCAL_SOURCE) {
            return true;
        }
    }

    cfg.mx_srv_records.iter().any(|r| hostname_eq(name, &r.name))
        || cfg.txt_records.iter().any(|r| hostname_eq(name, &r.name))
        || cfg.interface_names.iter().any(|r| hostname_eq(name, &r.name))
        || cfg.ptr_records.iter().any(|r| hostname_eq(name, &r.name))
}

/// Detects registrar wildcard addresses in a reply's answer section.
/// A hit is cached as NXDOMAIN (there is no SOA to take a TTL from in
/// the usual way) and the caller munges the reply to match.
pub fn check_for_bogus_wildcard(
    buf: &[u8],
    now: u64,
    cfg: &ForwarderConfig,
    cache: &mut dyn RecordStore,
) -> Result<bool, WireError> {
    if cfg.bogus_wildcards.is_empty() {
        return Ok(false);
    }

    let mut name = String::new();
    let mut p = skip_questions(buf)?;
    for _ in 0..header::ancount(buf) {
        p = extract_name(buf, p, &mut name)?;
        let rrtype_v = u16_at(buf, p)?;
        let class_v = u16_at(buf, p + 2)?;
        let ttl = crate::message::u32_at(buf, p + 4)?;
        let rdlen = u16_at(buf, p + 8)? as usize;
        p += 10;
        if p + rdlen > buf.len() {
            return Err(WireError::OutOfBounds(p + rdlen));
        }

        if class_v == class::IN && rrtype_v == rrtype::A && rdlen >= 4 {
            let octets: [u8; 4] = buf[p..p + 4]
                .try_into()
                .map_err(|_| WireError::OutOfBounds(p))?;
            let addr = Ipv4Addr::from(octets);
            if cfg.bogus_wildcards.contains(&addr) {
                debug!(%name, %addr, "bogus wildcard address in reply");
                cache.begin_insert();
                cache.insert(
                    &name,
                    None,
                    now,
                    ttl,
                    RecordFlags::IPV4
                        | RecordFlags::FORWARD
                        | RecordFlags::NEG
                        | RecordFlags::NXDOMAIN
                        | RecordFlags::CONFIG,
                );
                cache.commit_insert();
                return Ok(true);
            }
        }
        p += rdlen;
    }

    Ok(false)
}
