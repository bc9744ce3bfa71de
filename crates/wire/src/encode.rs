//! Appending resource records to an answer under construction.
//!
//! Records synthesized by this engine always name their owner through a
//! compression pointer at an already-emitted name, so the encoder takes a
//! name offset rather than a name. RDATA is described by a closed set of
//! typed fields instead of a format string.

use crate::message::{put_bytes, put_u16, put_u32};
use std::net::{Ipv4Addr, Ipv6Addr};

/// One typed RDATA field, written in order.
#[derive(Debug, Clone, Copy)]
pub enum RdataField<'a> {
    Addr4(Ipv4Addr),
    Addr6(Ipv6Addr),
    Short(u16),
    Long(u32),
    /// A domain name in dotted text form, encoded uncompressed.
    Name(&'a str),
    /// Opaque bytes copied verbatim.
    Blob(&'a [u8]),
}

/// A successfully appended record.
#[derive(Debug, Clone, Copy)]
pub struct AppendedRecord {
    /// Cursor past the record, where the next record starts.
    pub cursor: usize,
    /// Message offset of the first embedded `Name` field, for later
    /// records to reference by compression (MX/SRV glue).
    pub name_offset: Option<usize>,
}

/// Encodes a dotted-text name as uncompressed labels plus terminator,
/// returning the cursor past it.
pub(crate) fn put_name(buf: &mut Vec<u8>, at: usize, name: &str) -> usize {
    let mut p = at;
    for label in name.split('.').filter(|l| !l.is_empty()) {
        let bytes = label.as_bytes();
        debug_assert!(bytes.len() <= 63, "configured label too long");
        put_bytes(buf, p, &[bytes.len() as u8]);
        put_bytes(buf, p + 1, bytes);
        p += 1 + bytes.len();
    }
    put_bytes(buf, p, &[0]);
    p + 1
}

/// Appends one resource record at `cursor`, owner name given as a
/// compression pointer to `name_offset`. The RDATA length field is
/// backpatched once all fields are written.
///
/// Returns `None` without touching the caller's counters when the record
/// would not fit under `limit`; `trunc`, when given, is set so the header
/// can advertise the truncation. A record is also refused outright once
/// `trunc` is already set.
#[allow(clippy::too_many_arguments)]
pub fn add_resource_record(
    buf: &mut Vec<u8>,
    limit: usize,
    mut trunc: Option<&mut bool>,
    name_offset: usize,
    cursor: usize,
    ttl: u32,
    rrtype: u16,
    class: u16,
    rdata: &[RdataField<'_>],
) -> Option<AppendedRecord> {
    if let Some(t) = trunc.as_deref() {
        if *t {
            return None;
        }
    }

    let mut p = cursor;
    put_u16(buf, p, 0xc000 | name_offset as u16);
    put_u16(buf, p + 2, rrtype);
    put_u16(buf, p + 4, class);
    put_u32(buf, p + 6, ttl);
    let rdlen_at = p + 10;
    put_u16(buf, rdlen_at, 0); // placeholder
    p += 12;

    let mut embedded_name = None;
    for field in rdata {
        match *field {
            RdataField::Addr4(a) => {
                put_bytes(buf, p, &a.octets());
                p += 4;
            }
            RdataField::Addr6(a) => {
                put_bytes(buf, p, &a.octets());
                p += 16;
            }
            RdataField::Short(v) => {
                put_u16(buf, p, v);
                p += 2;
            }
            RdataField::Long(v) => {
                put_u32(buf, p, v);
                p += 4;
            }
            RdataField::Name(name) => {
                if embedded_name.is_none() {
                    embedded_name = Some(p);
                }
                p = put_name(buf, p, name);
            }
            RdataField::Blob(bytes) => {
                put_bytes(buf, p, bytes);
                p += bytes.len();
            }
        }
    }

    put_u16(buf, rdlen_at, (p - rdlen_at - 2) as u16);

    if p > limit {
        if let Some(t) = trunc.as_deref_mut() {
            *t = true;
        }
        return None;
    }

    Some(AppendedRecord {
        cursor: p,
        name_offset: embedded_name,
    })
}
