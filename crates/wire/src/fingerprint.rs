//! Case-folded checksum of the question section.
//!
//! Used to detect query retransmissions and answers to questions that
//! were never asked, which may be poisoning attempts. The decoded name
//! is checksummed rather than the raw bytes, since replies may compress
//! names differently from the query; case is folded for the same reason.

use crate::message::{header, HEADER_SIZE};
use crate::name::extract_name;

const CRC_POLY: u32 = 0x04c1_1db7;

fn crc_byte(crc: &mut u32, byte: u8) {
    *crc ^= (byte as u32) << 24;
    for _ in 0..8 {
        *crc = if *crc & 0x8000_0000 != 0 {
            (*crc << 1) ^ CRC_POLY
        } else {
            *crc << 1
        };
    }
}

/// CRCs the decoded, case-folded question names plus their type and
/// class bytes. Returns all-ones when there is no usable question
/// section, so a bad packet never matches a pending query. `scratch`
/// is reused between calls to avoid reallocating the name buffer.
pub fn questions_crc(msg: &[u8], scratch: &mut String) -> u32 {
    let mut crc = 0xffff_ffffu32;
    if msg.len() < HEADER_SIZE {
        return crc;
    }

    let mut p = HEADER_SIZE;
    for _ in 0..header::qdcount(msg) {
        match extract_name(msg, p, scratch) {
            Ok(next) => p = next,
            Err(_) => return crc,
        }
        for b in scratch.bytes() {
            crc_byte(&mut crc, b.to_ascii_lowercase());
        }

        let Some(fixed) = msg.get(p..p + 4) else {
            return crc;
        };
        for &b in fixed {
            crc_byte(&mut crc, b);
        }
        p += 4;
    }

    crc
}
