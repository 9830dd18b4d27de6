#![allow(dead_code)]

/// Assembles wire-format names and packets for decoder tests.
pub struct WireNameBuilder {
    bytes: Vec<u8>,
}

impl WireNameBuilder {
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Appends every label of a dotted name, without the root label.
    pub fn labels(mut self, name: &str) -> Self {
        for label in name.trim_end_matches('.').split('.').filter(|l| !l.is_empty()) {
            self.bytes.push(label.len() as u8);
            self.bytes.extend_from_slice(label.as_bytes());
        }
        self
    }

    pub fn raw_label(mut self, label: &[u8]) -> Self {
        self.bytes.push(label.len() as u8);
        self.bytes.extend_from_slice(label);
        self
    }

    pub fn pointer(mut self, offset: u16) -> Self {
        self.bytes.push(0xc0 | (offset >> 8) as u8);
        self.bytes.push((offset & 0xff) as u8);
        self
    }

    pub fn root(mut self) -> Self {
        self.bytes.push(0);
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Encodes a dotted name as an uncompressed wire name.
pub fn encode_name(name: &str) -> Vec<u8> {
    WireNameBuilder::new().labels(name).root().build()
}
