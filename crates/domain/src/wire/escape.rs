use super::window::TextWindow;

/// Label bytes: graphic ASCII passes through except the zone-file specials.
pub(crate) fn print_label_char(out: &mut TextWindow, c: u8) -> usize {
    match c {
        b'.' | b';' | b'(' | b')' | b'\\' => out.print_escaped(c),
        c if c.is_ascii_graphic() => out.print_byte(c),
        c => out.print_decimal_escape(c),
    }
}

/// Character-string bytes: printable ASCII and tab pass through, quotes and
/// backslashes are escaped.
pub(crate) fn print_string_char(out: &mut TextWindow, c: u8) -> usize {
    let printable = c.is_ascii_graphic() || c == b' ' || c == b'\t';
    if !printable {
        return out.print_decimal_escape(c);
    }
    if c == b'"' || c == b'\\' {
        return out.print_escaped(c);
    }
    out.print_byte(c)
}

/// Decodes one length-prefixed character-string as a quoted string.
///
/// Returns `(consumed, written)`, or `None` when `data` is shorter than its
/// length prefix claims; nothing is written in that case.
pub fn scan_character_string(data: &[u8], out: &mut TextWindow) -> Option<(usize, usize)> {
    let (&len, rest) = data.split_first()?;
    let body = rest.get(..len as usize)?;

    let mut written = out.print_byte(b'"');
    for &c in body {
        written += print_string_char(out, c);
    }
    written += out.print_byte(b'"');

    Some((1 + body.len(), written))
}
