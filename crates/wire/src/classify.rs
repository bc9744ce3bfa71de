//! Quick classification of an incoming query before any cache work.

use crate::message::{ensure_header, header, HEADER_SIZE};
use crate::name::extract_name;
use hearth_dns_domain::rr::{class, opcode, rrtype};
use hearth_dns_domain::RecordFlags;

/// What an incoming request is asking for, reduced to the flags the
/// cache lookup will need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestClass {
    pub flags: RecordFlags,
    pub qtype: u16,
}

/// Classifies a request, extracting the question name into `name`.
/// Returns `None` for anything that is not a plain single-question
/// QUERY; such messages are forwarded untouched.
pub fn extract_request(msg: &[u8], name: &mut String) -> Option<RequestClass> {
    name.clear();
    if ensure_header(msg).is_err()
        || header::qdcount(msg) != 1
        || header::opcode(msg) != opcode::QUERY
    {
        return None;
    }

    let p = extract_name(msg, HEADER_SIZE, name).ok()?;
    let qtype = u16::from_be_bytes([*msg.get(p)?, *msg.get(p + 1)?]);
    let qclass = u16::from_be_bytes([*msg.get(p + 2)?, *msg.get(p + 3)?]);

    let flags = if qclass == class::IN {
        match qtype {
            rrtype::A => RecordFlags::IPV4,
            rrtype::AAAA => RecordFlags::IPV6,
            rrtype::ANY => RecordFlags::IPV4 | RecordFlags::IPV6,
            // NS and SOA answers carry names too big for the plain
            // lookup path
            rrtype::NS | rrtype::SOA => RecordFlags::QUERY | RecordFlags::BIGNAME,
            _ => RecordFlags::QUERY,
        }
    } else {
        RecordFlags::QUERY
    };

    Some(RequestClass { flags, qtype })
}
