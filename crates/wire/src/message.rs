//! Bounds-checked access to a raw DNS message and navigation across its
//! sections. All cursors are indexes into the message buffer; every read
//! is validated against the buffer length before it happens.

use crate::name::skip_name;
use hearth_dns_domain::WireError;

/// Fixed DNS header size: id, flags and the four section counts.
pub const HEADER_SIZE: usize = 12;

pub(crate) fn ensure_header(msg: &[u8]) -> Result<(), WireError> {
    if msg.len() < HEADER_SIZE {
        return Err(WireError::Malformed("message shorter than header"));
    }
    Ok(())
}

pub(crate) fn u8_at(msg: &[u8], at: usize) -> Result<u8, WireError> {
    msg.get(at).copied().ok_or(WireError::OutOfBounds(at))
}

pub(crate) fn u16_at(msg: &[u8], at: usize) -> Result<u16, WireError> {
    match msg.get(at..at + 2) {
        Some(b) => Ok(u16::from_be_bytes([b[0], b[1]])),
        None => Err(WireError::OutOfBounds(at)),
    }
}

pub(crate) fn u32_at(msg: &[u8], at: usize) -> Result<u32, WireError> {
    match msg.get(at..at + 4) {
        Some(b) => Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        None => Err(WireError::OutOfBounds(at)),
    }
}

/// Overwrites bytes at `at`, growing the buffer when writing past its
/// current end. Used when laying answer records over the tail of a query.
pub(crate) fn put_bytes(buf: &mut Vec<u8>, at: usize, bytes: &[u8]) {
    let end = at + bytes.len();
    if buf.len() < end {
        buf.resize(end, 0);
    }
    buf[at..end].copy_from_slice(bytes);
}

pub(crate) fn put_u16(buf: &mut Vec<u8>, at: usize, v: u16) {
    put_bytes(buf, at, &v.to_be_bytes());
}

pub(crate) fn put_u32(buf: &mut Vec<u8>, at: usize, v: u32) {
    put_bytes(buf, at, &v.to_be_bytes());
}

/// Field accessors over the fixed 12-byte header.
///
/// Callers must have validated the buffer with [`ensure_header`] (all
/// public entry points of this crate do so before anything else).
pub mod header {
    use super::{put_u16, HEADER_SIZE};

    pub fn id(msg: &[u8]) -> u16 {
        u16::from_be_bytes([msg[0], msg[1]])
    }

    pub fn set_id(buf: &mut [u8], id: u16) {
        buf[0..2].copy_from_slice(&id.to_be_bytes());
    }

    pub fn qdcount(msg: &[u8]) -> u16 {
        u16::from_be_bytes([msg[4], msg[5]])
    }

    pub fn ancount(msg: &[u8]) -> u16 {
        u16::from_be_bytes([msg[6], msg[7]])
    }

    pub fn nscount(msg: &[u8]) -> u16 {
        u16::from_be_bytes([msg[8], msg[9]])
    }

    pub fn arcount(msg: &[u8]) -> u16 {
        u16::from_be_bytes([msg[10], msg[11]])
    }

    pub fn set_ancount(buf: &mut Vec<u8>, v: u16) {
        put_u16(buf, 6, v);
    }

    pub fn set_nscount(buf: &mut Vec<u8>, v: u16) {
        put_u16(buf, 8, v);
    }

    pub fn set_arcount(buf: &mut Vec<u8>, v: u16) {
        put_u16(buf, 10, v);
    }

    pub fn is_response(msg: &[u8]) -> bool {
        msg[2] & 0x80 != 0
    }

    pub fn set_response(buf: &mut [u8], on: bool) {
        set_bit(buf, 2, 0x80, on);
    }

    pub fn opcode(msg: &[u8]) -> u8 {
        (msg[2] >> 3) & 0x0f
    }

    pub fn authoritative(msg: &[u8]) -> bool {
        msg[2] & 0x04 != 0
    }

    pub fn set_authoritative(buf: &mut [u8], on: bool) {
        set_bit(buf, 2, 0x04, on);
    }

    pub fn truncated(msg: &[u8]) -> bool {
        msg[2] & 0x02 != 0
    }

    pub fn set_truncated(buf: &mut [u8], on: bool) {
        set_bit(buf, 2, 0x02, on);
    }

    pub fn recursion_desired(msg: &[u8]) -> bool {
        msg[2] & 0x01 != 0
    }

    pub fn set_recursion_available(buf: &mut [u8], on: bool) {
        set_bit(buf, 3, 0x80, on);
    }

    pub fn rcode(msg: &[u8]) -> u8 {
        msg[3] & 0x0f
    }

    pub fn set_rcode(buf: &mut [u8], rcode: u8) {
        buf[3] = (buf[3] & 0xf0) | (rcode & 0x0f);
    }

    fn set_bit(buf: &mut [u8], byte: usize, mask: u8, on: bool) {
        if on {
            buf[byte] |= mask;
        } else {
            buf[byte] &= !mask;
        }
    }
}

/// Advances past the question section, returning the cursor where answer
/// records start (and where locally synthesized answers are written).
pub fn skip_questions(msg: &[u8]) -> Result<usize, WireError> {
    ensure_header(msg)?;
    let mut p = HEADER_SIZE;
    for _ in 0..header::qdcount(msg) {
        p = skip_name(msg, p)?;
        p += 4; // type and class
    }
    if p > msg.len() {
        return Err(WireError::OutOfBounds(p));
    }
    Ok(p)
}

/// Advances past `count` resource records starting at `cursor`. The
/// count is wide enough to hold the sum of several section counts.
pub fn skip_section(msg: &[u8], cursor: usize, count: u32) -> Result<usize, WireError> {
    let mut p = cursor;
    for _ in 0..count {
        p = skip_name(msg, p)?;
        p += 8; // type, class, TTL
        let rdlen = u16_at(msg, p)? as usize;
        p += 2 + rdlen;
        if p > msg.len() {
            return Err(WireError::OutOfBounds(p));
        }
    }
    Ok(p)
}

/// Recomputes the true extent of a message and, when the additional
/// section ended up empty, re-appends a previously saved OPT pseudo-header.
/// Returns the new message length.
pub fn resize_packet(
    buf: &mut Vec<u8>,
    pseudoheader: Option<&[u8]>,
) -> Result<usize, WireError> {
    let mut p = skip_questions(buf)?;
    let records = u32::from(header::ancount(buf))
        + u32::from(header::nscount(buf))
        + u32::from(header::arcount(buf));
    p = skip_section(buf, p, records)?;

    if let Some(opt) = pseudoheader {
        if header::arcount(buf) == 0 {
            put_bytes(buf, p, opt);
            header::set_arcount(buf, 1);
            p += opt.len();
        }
    }

    buf.truncate(p);
    Ok(p)
}
