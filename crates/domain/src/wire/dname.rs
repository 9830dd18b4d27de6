//! Domain name decoding (RFC 1035 §3.1, §4.1.4).

use super::escape::print_label_char;
use super::window::TextWindow;

/// Compression pointers followed before a name is declared looped.
pub const MAX_COMPRESSION_POINTERS: u32 = 1000;

const POINTER_MASK: u8 = 0xc0;

/// Outcome of decoding one name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnameScan {
    /// Bytes of the input buffer the name occupied. Bytes reached through
    /// compression pointers live in the packet and are not counted.
    pub consumed: usize,
    /// Output bytes produced, including any that did not fit the window.
    pub written: usize,
}

/// Where the next label byte is read from.
#[derive(Debug, Clone, Copy)]
enum Cursor {
    /// Offset into the input buffer.
    Buffer(usize),
    /// Offset into the packet, after at least one pointer jump.
    Packet(usize),
}

/// Decodes a possibly compressed name from `data`, resolving pointers against
/// `packet`.
///
/// Malformed input never fails the call: decoding stops and an `Error...`
/// token is appended to whatever was already rendered, mirroring what
/// presentation-format dumpers print for broken names.
pub fn scan_dname(data: &[u8], packet: Option<&[u8]>, out: &mut TextWindow) -> DnameScan {
    let mut consumed = 0usize;
    let mut written = 0usize;

    let Some(&first) = data.first() else {
        written += out.print("ErrorMissingDname");
        return DnameScan { consumed, written };
    };
    if first == 0 {
        written += out.print(".");
        return DnameScan {
            consumed: 1,
            written,
        };
    }

    let packet = packet.unwrap_or_default();
    let mut cursor = Cursor::Buffer(0);
    let mut pointers = 0u32;

    loop {
        let label_len = match cursor {
            Cursor::Buffer(pos) => data[pos],
            Cursor::Packet(pos) => match packet.get(pos) {
                Some(&b) => b,
                None => {
                    written += out.print("ErrorPartialDname");
                    return DnameScan { consumed, written };
                }
            },
        };
        if label_len == 0 {
            break;
        }

        cursor = match cursor {
            Cursor::Buffer(pos) => {
                consumed += 1;
                Cursor::Buffer(pos + 1)
            }
            Cursor::Packet(pos) => Cursor::Packet(pos + 1),
        };

        if label_len & POINTER_MASK == POINTER_MASK {
            let low = match cursor {
                Cursor::Buffer(pos) => data.get(pos).copied(),
                Cursor::Packet(pos) => packet.get(pos).copied(),
            };
            let Some(low) = low else {
                written += out.print("ErrorPartialDname");
                return DnameScan { consumed, written };
            };
            if let Cursor::Buffer(_) = cursor {
                consumed += 1;
            }

            let target = (usize::from(label_len & !POINTER_MASK) << 8) | usize::from(low);
            if target >= packet.len() {
                written += out.print("ErrorComprPtrOutOfBounds");
                return DnameScan { consumed, written };
            }
            if pointers > MAX_COMPRESSION_POINTERS {
                written += out.print("ErrorComprPtrLooped");
                return DnameScan { consumed, written };
            }
            pointers += 1;
            cursor = Cursor::Packet(target);
            continue;
        } else if label_len & POINTER_MASK != 0 {
            written += out.print(&format!(
                "ErrorLABELTYPE{:x}IsUnknown",
                label_len & POINTER_MASK
            ));
            return DnameScan { consumed, written };
        }

        let label_len = usize::from(label_len);
        match cursor {
            Cursor::Buffer(pos) => {
                let available = data.len() - pos;
                let label = &data[pos..pos + label_len.min(available)];
                for &c in label {
                    written += print_label_char(out, c);
                }
                consumed += label.len();
                if consumed == data.len() {
                    // ran off the end of the buffer before the root label
                    written += out.print("ErrorPartialDname");
                    return DnameScan { consumed, written };
                }
                cursor = Cursor::Buffer(pos + label.len());
            }
            Cursor::Packet(pos) => {
                let available = packet.len().saturating_sub(pos);
                let label = &packet[pos..pos + label_len.min(available)];
                for &c in label {
                    written += print_label_char(out, c);
                }
                cursor = Cursor::Packet(pos + label.len());
            }
        }
        written += out.print(".");
    }

    // the root label itself, when it sits in the input buffer
    if let Cursor::Buffer(_) = cursor {
        consumed += 1;
    }
    if written == 0 {
        written += out.print(".");
    }

    DnameScan { consumed, written }
}
