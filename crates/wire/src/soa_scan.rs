//! Authority-section SOA scanning for negative-cache TTLs, plus the
//! address doctor that rewrites mangled addresses in upstream replies.

use crate::message::{ensure_header, header, skip_questions, skip_section, u16_at, u32_at};
use crate::name::skip_name;
use hearth_dns_domain::rr::{class, rrtype};
use hearth_dns_domain::{DoctorRule, WireError};
use std::net::Ipv4Addr;
use tracing::debug;

/// Rewrites the A address at `at` through the first matching doctor rule.
/// A rewrite invalidates the sending server's authority claim, so the
/// message's `aa` bit is cleared. Returns whether a rule applied.
pub(crate) fn doctor_address(
    buf: &mut [u8],
    at: usize,
    doctors: &[DoctorRule],
) -> Result<bool, WireError> {
    let raw: [u8; 4] = buf
        .get(at..at + 4)
        .and_then(|b| b.try_into().ok())
        .ok_or(WireError::OutOfBounds(at))?;
    let addr = Ipv4Addr::from(raw);

    for rule in doctors {
        if rule.matches(addr) {
            let rewritten = rule.apply(addr);
            buf[at..at + 4].copy_from_slice(&rewritten.octets());
            header::set_authoritative(buf, false);
            debug!(%addr, %rewritten, "doctored address in reply");
            return Ok(true);
        }
    }
    Ok(false)
}

/// Walks the authority section and returns the smallest TTL implied by
/// any SOA record there: the minimum of each record's own TTL and its
/// embedded minimum-TTL field. Returns 0 when no SOA is present. When
/// doctor rules are given, the same pass rewrites matching A records in
/// the additional section.
pub fn find_soa(buf: &mut [u8], doctors: &[DoctorRule]) -> Result<u32, WireError> {
    ensure_header(buf)?;
    let mut p = skip_questions(buf)?;
    p = skip_section(buf, p, u32::from(header::ancount(buf)))?;

    let mut found_soa = false;
    let mut min_ttl = u32::MAX;

    for _ in 0..header::nscount(buf) {
        p = skip_name(buf, p)?;
        let rrtype_v = u16_at(buf, p)?;
        let class_v = u16_at(buf, p + 2)?;
        let ttl = u32_at(buf, p + 4)?;
        let rdlen = u16_at(buf, p + 8)? as usize;
        p += 10;

        if class_v == class::IN && rrtype_v == rrtype::SOA {
            found_soa = true;
            min_ttl = min_ttl.min(ttl);

            p = skip_name(buf, p)?; // MNAME
            p = skip_name(buf, p)?; // RNAME
            p += 16; // serial, refresh, retry, expire
            min_ttl = min_ttl.min(u32_at(buf, p)?);
            p += 4;
        } else {
            p += rdlen;
        }

        if p > buf.len() {
            return Err(WireError::OutOfBounds(p));
        }
    }

    if !doctors.is_empty() {
        for _ in 0..header::arcount(buf) {
            p = skip_name(buf, p)?;
            let rrtype_v = u16_at(buf, p)?;
            let class_v = u16_at(buf, p + 2)?;
            let rdlen = u16_at(buf, p + 8)? as usize;
            p += 10;

            if class_v == class::IN && rrtype_v == rrtype::A && rdlen >= 4 {
                doctor_address(buf, p, doctors)?;
            }

            p += rdlen;
            if p > buf.len() {
                return Err(WireError::OutOfBounds(p));
            }
        }
    }

    Ok(if found_soa { min_ttl } else { 0 })
}
