/// Bounded output for the wire-to-text decoders.
///
/// Writes past `capacity` are dropped but still counted, so callers can tell
/// how long the full rendering would have been.
#[derive(Debug)]
pub struct TextWindow {
    text: String,
    remaining: usize,
    needed: usize,
}

impl TextWindow {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity.min(1024)),
            remaining: capacity,
            needed: 0,
        }
    }

    /// Appends ASCII text, returning the number of bytes it accounts for.
    pub fn print(&mut self, s: &str) -> usize {
        debug_assert!(s.is_ascii());
        let take = s.len().min(self.remaining);
        self.text.push_str(&s[..take]);
        self.remaining -= take;
        self.needed += s.len();
        s.len()
    }

    pub fn print_byte(&mut self, c: u8) -> usize {
        debug_assert!(c.is_ascii());
        if self.remaining > 0 {
            self.text.push(c as char);
            self.remaining -= 1;
        }
        self.needed += 1;
        1
    }

    /// Appends `\c`.
    pub fn print_escaped(&mut self, c: u8) -> usize {
        self.print_byte(b'\\') + self.print_byte(c)
    }

    /// Appends `\DDD`.
    pub fn print_decimal_escape(&mut self, c: u8) -> usize {
        self.print(&format!("\\{:03}", c))
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    pub fn finish(self) -> DecodedText {
        DecodedText {
            text: self.text,
            needed: self.needed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    text: String,
    needed: usize,
}

impl DecodedText {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length the rendering would have had with unlimited space.
    pub fn needed(&self) -> usize {
        self.needed
    }

    pub fn is_truncated(&self) -> bool {
        self.text.len() < self.needed
    }

    pub fn into_text(self) -> String {
        self.text
    }
}
