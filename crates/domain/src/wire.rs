//! Presentation-format rendering of DNS wire data.
//!
//! Rdata returned by the resolver engine is raw wire bytes; these helpers turn
//! it into escaped text the way `dig` and friends print it.

pub mod dname;
pub mod escape;
pub mod window;

pub use dname::{scan_dname, DnameScan, MAX_COMPRESSION_POINTERS};
pub use escape::scan_character_string;
pub use window::{DecodedText, TextWindow};

use crate::RecordType;

/// Output capacity that holds any domain name (253 chars) with room to spare.
pub const HOSTNAME_CAPACITY: usize = 256;

/// Renders `rdata` of the given type into a window of `capacity` bytes.
///
/// Every [`RecordType`] carries a single domain name, so the bytes are always
/// decoded as a name whatever the type.
pub fn rdata_to_text(rdata: &[u8], _record_type: RecordType, capacity: usize) -> DecodedText {
    let mut window = TextWindow::with_capacity(capacity);
    scan_dname(rdata, None, &mut window);
    window.finish()
}

/// Decodes PTR rdata into a hostname such as `one.one.one.one.`.
pub fn rdata_to_hostname(rdata: &[u8], record_type: RecordType) -> String {
    rdata_to_text(rdata, record_type, HOSTNAME_CAPACITY).into_text()
}
