//! Locating the EDNS0 OPT pseudo-header and detecting signed messages.

use crate::message::{ensure_header, header, skip_questions, skip_section, u16_at};
use crate::name::skip_name;
use hearth_dns_domain::rr::{class, opcode, rrtype};
use hearth_dns_domain::WireError;

/// Position of an OPT record inside the additional section.
#[derive(Debug, Clone, Copy)]
pub struct OptRecord {
    /// Offset of the record's owner name.
    pub offset: usize,
    /// Total encoded length of the record.
    pub len: usize,
    /// Offset of the 16-bit UDP payload size field (the record's class).
    pub udp_size_offset: usize,
}

/// Result of one pass over the message.
#[derive(Debug, Clone, Copy, Default)]
pub struct PseudoHeaderScan {
    pub opt: Option<OptRecord>,
    /// A signed message (TKEY query, or trailing class-ANY SIG/TSIG)
    /// must be forwarded bit-for-bit: re-encoding breaks the signature.
    pub is_signed: bool,
}

/// Scans for an OPT record in the additional section and, when
/// `check_sign` is set, for the signature markers: a TKEY question under
/// opcode QUERY, or class-ANY SIG/TSIG as the last additional record.
pub fn find_pseudoheader(msg: &[u8], check_sign: bool) -> Result<PseudoHeaderScan, WireError> {
    ensure_header(msg)?;
    let mut scan = PseudoHeaderScan::default();
    let mut p;

    if check_sign && header::opcode(msg) == opcode::QUERY {
        p = crate::message::HEADER_SIZE;
        for _ in 0..header::qdcount(msg) {
            p = skip_name(msg, p)?;
            let qtype = u16_at(msg, p)?;
            let qclass = u16_at(msg, p + 2)?;
            p += 4;
            if qclass == class::IN && qtype == rrtype::TKEY {
                scan.is_signed = true;
            }
        }
        if p > msg.len() {
            return Err(WireError::OutOfBounds(p));
        }
    } else {
        p = skip_questions(msg)?;
    }

    let arcount = header::arcount(msg);
    if arcount == 0 {
        return Ok(scan);
    }

    p = skip_section(
        msg,
        p,
        u32::from(header::ancount(msg)) + u32::from(header::nscount(msg)),
    )?;

    for i in 0..arcount {
        let start = p;
        p = skip_name(msg, p)?;
        let rrtype_v = u16_at(msg, p)?;
        let class_at = p + 2;
        let class_v = u16_at(msg, class_at)?;
        let rdlen = u16_at(msg, p + 8)? as usize;
        p += 10 + rdlen;
        if p > msg.len() {
            return Err(WireError::OutOfBounds(p));
        }

        if rrtype_v == rrtype::OPT {
            scan.opt = Some(OptRecord {
                offset: start,
                len: p - start,
                udp_size_offset: class_at,
            });
        } else if check_sign
            && i == arcount - 1
            && class_v == class::ANY
            && (rrtype_v == rrtype::SIG || rrtype_v == rrtype::TSIG)
        {
            scan.is_signed = true;
        }
    }

    Ok(scan)
}
