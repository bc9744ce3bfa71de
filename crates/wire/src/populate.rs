//! Populating the record store from upstream replies.
//!
//! One pass per question: PTR answers have their CNAME chains chased
//! inline, since the store cannot represent reverse CNAMEs; forward
//! answers cache each CNAME hop as its own record, weakly linked to the
//! next. A reply that turns out to be malformed partway through aborts
//! the whole insert batch.
//!
//! Chains created here may end up pointing at nothing, when the store
//! refuses a record or the reply held no usable target. Such dangling
//! links resolve to `None` and read as expired.

use crate::cache::{InsertSession, RecordHandle, RecordStore};
use crate::message::{ensure_header, header, skip_questions, u16_at, u32_at, HEADER_SIZE};
use crate::name::{compare_name, extract_name, NameMatch};
use crate::reverse_name::in_arpa_name_2_addr;
use crate::soa_scan::{doctor_address, find_soa};
use hearth_dns_domain::rr::{class, rcode, rrtype};
use hearth_dns_domain::{ForwarderConfig, RecordFlags, WireError};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::debug;

/// CNAME hops tolerated per question before declaring a loop.
const CNAME_CHAIN_LIMIT: u32 = 5;

/// Fixed fields of one answer record, read at the cursor left by the
/// owner-name comparison.
struct RecordFields {
    rrtype: u16,
    class: u16,
    ttl: u32,
    rdata: usize,
    end: usize,
}

fn read_record_fields(msg: &[u8], at: usize) -> Result<RecordFields, WireError> {
    let fields = RecordFields {
        rrtype: u16_at(msg, at)?,
        class: u16_at(msg, at + 2)?,
        ttl: u32_at(msg, at + 4)?,
        rdata: at + 10,
        end: at + 10 + u16_at(msg, at + 8)? as usize,
    };
    if fields.end > msg.len() {
        return Err(WireError::OutOfBounds(fields.end));
    }
    Ok(fields)
}

/// Caches everything useful from the reply in `buf`.
///
/// Address doctoring happens here too, rewriting A record data in place
/// before it is cached, so `buf` must be the buffer that will be sent
/// on to the client.
pub fn extract_addresses(
    buf: &mut Vec<u8>,
    now: u64,
    cfg: &ForwarderConfig,
    cache: &mut dyn RecordStore,
) -> Result<(), WireError> {
    ensure_header(buf)?;
    let mut session = InsertSession::begin(cache);
    let mut name = String::new();

    // Doctor rules take effect through find_soa's side pass over the
    // additional section, so it cannot be deferred when rules exist.
    let mut soa_ttl: Option<u32> = if cfg.doctors.is_empty() {
        None
    } else {
        Some(find_soa(buf, &cfg.doctors)?)
    };
    let mut soa_ttl_of = |buf: &mut Vec<u8>| -> Result<u32, WireError> {
        match soa_ttl {
            Some(t) => Ok(t),
            None => {
                let t = find_soa(buf, &[])?;
                soa_ttl = Some(t);
                Ok(t)
            }
        }
    };

    let ancount = header::ancount(buf);
    let nxdomain = header::rcode(buf) == rcode::NXDOMAIN;

    let mut p = HEADER_SIZE;
    for _ in 0..header::qdcount(buf) {
        p = extract_name(buf, p, &mut name)?;
        let qtype = u16_at(buf, p)?;
        let qclass = u16_at(buf, p + 2)?;
        p += 4;

        if qclass != class::IN {
            continue;
        }

        let neg_flags = if nxdomain {
            RecordFlags::NXDOMAIN
        } else {
            RecordFlags::empty()
        };

        if qtype == rrtype::PTR {
            // The store cannot represent reverse CNAMEs, so chase them
            // here and cache only the final pointer target.
            let Some(rev) = in_arpa_name_2_addr(&name) else {
                continue;
            };

            let mut found = false;
            let mut cttl = u32::MAX;
            let mut hops = CNAME_CHAIN_LIMIT;

            if !nxdomain {
                'chase: loop {
                    let mut p1 = skip_questions(buf)?;
                    for _ in 0..ancount {
                        let (owner, next) = compare_name(buf, p1, &name)?;
                        let rec = read_record_fields(buf, next)?;

                        // record TTL is the minimum over the whole chain
                        cttl = cttl.min(rec.ttl);

                        if rec.class == class::IN
                            && owner == NameMatch::Equal
                            && (rec.rrtype == rrtype::CNAME || rec.rrtype == rrtype::PTR)
                        {
                            extract_name(buf, rec.rdata, &mut name)?;
                            if rec.rrtype == rrtype::CNAME {
                                if hops == 0 {
                                    return Err(WireError::ChainTooDeep);
                                }
                                hops -= 1;
                                continue 'chase;
                            }
                            session.insert(
                                &name,
                                Some(rev.ip()),
                                now,
                                cttl,
                                rev.family() | RecordFlags::REVERSE,
                            );
                            found = true;
                        }
                        p1 = rec.end;
                    }
                    break;
                }
            }

            if !found && cfg.options.negative_cache {
                let ttl = soa_ttl_of(buf)?;
                if ttl != 0 {
                    debug!(addr = %rev.ip(), ttl, "caching negative reverse entry");
                    session.insert(
                        &name,
                        Some(rev.ip()),
                        now,
                        ttl,
                        rev.family() | RecordFlags::REVERSE | RecordFlags::NEG | neg_flags,
                    );
                }
            }
        } else {
            let family = match qtype {
                rrtype::A => RecordFlags::IPV4,
                rrtype::AAAA => RecordFlags::IPV6,
                _ => continue,
            };

            let mut found = false;
            let mut cttl = u32::MAX;
            let mut hops = CNAME_CHAIN_LIMIT;
            // last CNAME hop, waiting for its target to be cached
            let mut pending_link: Option<RecordHandle> = None;

            if !nxdomain {
                'chase: loop {
                    let mut p1 = skip_questions(buf)?;
                    for _ in 0..ancount {
                        let (owner, next) = compare_name(buf, p1, &name)?;
                        let rec = read_record_fields(buf, next)?;

                        if rec.class == class::IN && owner == NameMatch::Equal {
                            if rec.rrtype == rrtype::CNAME {
                                if hops == 0 {
                                    return Err(WireError::ChainTooDeep);
                                }
                                hops -= 1;

                                let newc = session.insert(
                                    &name,
                                    None,
                                    now,
                                    rec.ttl,
                                    RecordFlags::CNAME | RecordFlags::FORWARD,
                                );
                                if let (Some(from), Some(to)) = (pending_link, newc) {
                                    session.link_cname(from, to);
                                }
                                pending_link = newc;
                                cttl = cttl.min(rec.ttl);

                                extract_name(buf, rec.rdata, &mut name)?;
                                continue 'chase;
                            } else if rec.rrtype == qtype {
                                found = true;
                                let addr = read_address(buf, &rec, qtype, cfg)?;
                                let newc = session.insert(
                                    &name,
                                    Some(addr),
                                    now,
                                    rec.ttl,
                                    family | RecordFlags::FORWARD | neg_flags,
                                );
                                if let (Some(from), Some(to)) = (pending_link, newc) {
                                    session.link_cname(from, to);
                                }
                                pending_link = None;
                            }
                        }
                        p1 = rec.end;
                    }
                    break;
                }
            }

            if !found && cfg.options.negative_cache {
                let ttl = soa_ttl_of(buf)?;
                // no SOA, but a CNAME pointing here can donate its TTL
                if ttl != 0 || pending_link.is_some() {
                    debug!(%name, "caching negative entry");
                    let newc = session.insert(
                        &name,
                        None,
                        now,
                        if ttl != 0 { ttl } else { cttl },
                        RecordFlags::FORWARD | RecordFlags::NEG | family | neg_flags,
                    );
                    if let (Some(from), Some(to)) = (pending_link, newc) {
                        session.link_cname(from, to);
                    }
                }
            }
        }
    }

    session.commit();
    Ok(())
}

/// Reads the address from a terminal A/AAAA record, doctoring A record
/// data in place first.
fn read_address(
    buf: &mut Vec<u8>,
    rec: &RecordFields,
    qtype: u16,
    cfg: &ForwarderConfig,
) -> Result<IpAddr, WireError> {
    if qtype == rrtype::A {
        if !cfg.doctors.is_empty() {
            doctor_address(buf, rec.rdata, &cfg.doctors)?;
        }
        let octets: [u8; 4] = buf
            .get(rec.rdata..rec.rdata + 4)
            .and_then(|b| b.try_into().ok())
            .ok_or(WireError::OutOfBounds(rec.rdata))?;
        Ok(IpAddr::V4(Ipv4Addr::from(octets)))
    } else {
        let octets: [u8; 16] = buf
            .get(rec.rdata..rec.rdata + 16)
            .and_then(|b| b.try_into().ok())
            .ok_or(WireError::OutOfBounds(rec.rdata))?;
        Ok(IpAddr::V6(Ipv6Addr::from(octets)))
    }
}
