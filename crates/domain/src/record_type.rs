use std::fmt;

/// Record types whose rdata is a single domain name.
///
/// The engine asks for PTR. A server may still answer under another of these
/// types (a CNAME for a classless in-addr.arpa delegation, for instance), and
/// all of them decode the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    NS,
    CNAME,
    PTR,
    DNAME,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::NS => "NS",
            RecordType::CNAME => "CNAME",
            RecordType::PTR => "PTR",
            RecordType::DNAME => "DNAME",
        }
    }

    pub fn to_u16(&self) -> u16 {
        match self {
            RecordType::NS => 2,
            RecordType::CNAME => 5,
            RecordType::PTR => 12,
            RecordType::DNAME => 39,
        }
    }

    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            2 => Some(RecordType::NS),
            5 => Some(RecordType::CNAME),
            12 => Some(RecordType::PTR),
            39 => Some(RecordType::DNAME),
            _ => None,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
