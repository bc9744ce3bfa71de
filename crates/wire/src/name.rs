//! Decoding, comparison and traversal of compressed domain names inside
//! a message buffer.
//!
//! Names are decoded to dotted ASCII text capped at [`MAXDNAME`]. The
//! traversal never trusts the buffer: every byte access is bounds-checked,
//! pointer jumps are counted against a hard cap, and the reserved and
//! unknown extended label types fail cleanly.

use crate::message::u8_at;
use hearth_dns_domain::WireError;
use std::fmt::Write as _;

/// Maximum length of a decoded name in text form.
pub const MAXDNAME: usize = 1025;

/// Compression pointer jumps tolerated before declaring a loop.
const MAX_HOPS: u32 = 255;

/// Outcome of decoding a name in comparison mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    Equal,
    Different,
}

enum Sink<'a> {
    /// Decode labels into dotted text.
    Extract(&'a mut String),
    /// Compare labels, case-folded, against a name already in text form.
    Compare {
        expected: &'a [u8],
        pos: usize,
        matched: bool,
    },
}

fn legal_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// Shared traversal for extract and compare modes. Returns the cursor for
/// the byte following the name: after the terminator when the name was
/// inline, or after the first compression pointer when it jumped.
fn walk(msg: &[u8], cursor: usize, sink: &mut Sink<'_>) -> Result<usize, WireError> {
    let mut p = cursor;
    let mut resume: Option<usize> = None;
    let mut hops = 0u32;

    if let Sink::Extract(out) = sink {
        out.clear();
    }

    loop {
        let len = u8_at(msg, p)?;
        p += 1;
        if len == 0 {
            break;
        }

        match len & 0xc0 {
            0xc0 => {
                let low = u8_at(msg, p)?;
                p += 1;
                let target = ((len as usize & 0x3f) << 8) | low as usize;
                if target >= msg.len() {
                    return Err(WireError::OutOfBounds(target));
                }
                // The message continues after the first jump, not the last.
                if resume.is_none() {
                    resume = Some(p);
                }
                hops += 1;
                if hops > MAX_HOPS {
                    return Err(WireError::Malformed("compression pointer loop"));
                }
                p = target;
            }
            0x80 => return Err(WireError::Malformed("reserved label type")),
            0x40 => {
                // Extended label; only the bitstring variant is understood,
                // and only when extracting text.
                if len & 0x3f != 1 {
                    return Err(WireError::Malformed("unknown extended label type"));
                }
                let out = match sink {
                    Sink::Extract(out) => out,
                    Sink::Compare { .. } => {
                        return Err(WireError::Malformed("bitstring label in comparison"))
                    }
                };
                let count = match u8_at(msg, p)? {
                    0 => 256usize,
                    c => c as usize,
                };
                p += 1;
                let digits = ((count - 1) >> 2) + 1;
                let bytes = ((count - 1) >> 3) + 1;
                if p + bytes > msg.len() {
                    return Err(WireError::OutOfBounds(p + bytes));
                }
                // rendered as \[x<hex>/<bits>]. which is digits + 9 chars
                if out.len() + digits + 9 >= MAXDNAME {
                    return Err(WireError::Malformed("name too long"));
                }
                out.push_str("\\[x");
                for j in 0..digits {
                    let byte = msg[p + j / 2];
                    let digit = if j % 2 == 0 { byte >> 4 } else { byte & 0x0f };
                    out.push(b"0123456789ABCDEF"[digit as usize] as char);
                }
                p += bytes;
                let _ = write!(out, "/{}].", count);
            }
            _ => {
                let l = len as usize;
                if p + l > msg.len() {
                    return Err(WireError::OutOfBounds(p + l));
                }
                match sink {
                    Sink::Extract(out) => {
                        if out.len() + l + 1 >= MAXDNAME {
                            return Err(WireError::Malformed("name too long"));
                        }
                        for &b in &msg[p..p + l] {
                            if !legal_char(b) {
                                return Err(WireError::Malformed("illegal character in label"));
                            }
                            out.push(b as char);
                        }
                        out.push('.');
                    }
                    Sink::Compare {
                        expected,
                        pos,
                        matched,
                    } => {
                        for &b in &msg[p..p + l] {
                            match expected.get(*pos) {
                                None => *matched = false,
                                Some(&c) => {
                                    *pos += 1;
                                    if !c.eq_ignore_ascii_case(&b) {
                                        *matched = false;
                                    }
                                }
                            }
                        }
                        // a label boundary must line up with a dot
                        match expected.get(*pos) {
                            None => {}
                            Some(b'.') => *pos += 1,
                            Some(_) => {
                                *pos += 1;
                                *matched = false;
                            }
                        }
                    }
                }
                p += l;
            }
        }

        if p >= msg.len() {
            return Err(WireError::OutOfBounds(p));
        }
    }

    match sink {
        Sink::Extract(out) => {
            // lose the trailing period
            out.pop();
        }
        Sink::Compare {
            expected,
            pos,
            matched,
        } => {
            if expected.len() > *pos {
                *matched = false;
            }
        }
    }

    Ok(resume.unwrap_or(p))
}

/// Decodes the name at `cursor` into `out` as dotted ASCII text and
/// returns the cursor past the name.
pub fn extract_name(msg: &[u8], cursor: usize, out: &mut String) -> Result<usize, WireError> {
    walk(msg, cursor, &mut Sink::Extract(out))
}

/// Decodes the name at `cursor` while comparing it, case-folded, against
/// `name`; no text is materialized. Returns the match outcome and the
/// cursor past the name.
pub fn compare_name(
    msg: &[u8],
    cursor: usize,
    name: &str,
) -> Result<(NameMatch, usize), WireError> {
    let mut sink = Sink::Compare {
        expected: name.as_bytes(),
        pos: 0,
        matched: true,
    };
    let next = walk(msg, cursor, &mut sink)?;
    let outcome = match sink {
        Sink::Compare { matched: true, .. } => NameMatch::Equal,
        _ => NameMatch::Different,
    };
    Ok((outcome, next))
}

/// Advances the cursor past the name at `cursor` without materializing
/// text. Applies the same bounds and label-type checks as decoding.
pub fn skip_name(msg: &[u8], cursor: usize) -> Result<usize, WireError> {
    let mut p = cursor;
    loop {
        let len = u8_at(msg, p)?;
        match len & 0xc0 {
            0xc0 => {
                // compression pointer ends the name
                if p + 2 > msg.len() {
                    return Err(WireError::OutOfBounds(p + 2));
                }
                return Ok(p + 2);
            }
            0x80 => return Err(WireError::Malformed("reserved label type")),
            0x40 => {
                if len & 0x3f != 1 {
                    return Err(WireError::Malformed("unknown extended label type"));
                }
                let count = u8_at(msg, p + 1)?;
                p += 2;
                p += if count == 0 {
                    32
                } else {
                    ((count as usize - 1) >> 3) + 1
                };
            }
            _ => {
                if len == 0 {
                    return Ok(p + 1);
                }
                p += 1 + len as usize;
            }
        }
    }
}
