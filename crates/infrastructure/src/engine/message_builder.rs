//! DNS Message Builder
//!
//! Constructs query messages in wire format using `hickory-proto`.

use ferrous_rdns_application::ports::EngineError;
use ferrous_rdns_domain::RecordType;
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RecordType as HickoryRecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::str::FromStr;

/// Builds DNS query messages in wire format
pub struct MessageBuilder;

impl MessageBuilder {
    /// Build a recursive IN-class query with the given transaction id.
    ///
    /// The name is treated as fully qualified whether or not it ends in a dot.
    pub fn build_query(name: &str, record_type: RecordType, id: u16) -> Result<Vec<u8>, EngineError> {
        let name = Self::fqdn(name)?;

        let mut query = Query::new();
        query.set_name(name);
        query.set_query_type(HickoryRecordType::from(record_type.to_u16()));
        query.set_query_class(DNSClass::IN);

        let mut message = Message::new(id, MessageType::Query, OpCode::Query);
        message.set_recursion_desired(true);
        message.add_query(query);

        Self::serialize_message(&message)
    }

    pub fn build_ptr_query(name: &str, id: u16) -> Result<Vec<u8>, EngineError> {
        Self::build_query(name, RecordType::PTR, id)
    }

    /// Uncompressed wire form of `hostname`, as a PTR record would carry it.
    pub fn build_ptr_rdata(hostname: &str) -> Result<Vec<u8>, EngineError> {
        let name = Self::fqdn(hostname)?;
        let mut buf = Vec::with_capacity(64);
        let mut encoder = BinEncoder::new(&mut buf);
        name.emit(&mut encoder)
            .map_err(|e| EngineError::Submit(format!("Failed to encode '{}': {}", hostname, e)))?;
        Ok(buf)
    }

    fn fqdn(name: &str) -> Result<Name, EngineError> {
        let fqdn = if name.ends_with('.') {
            name.to_string()
        } else {
            format!("{}.", name)
        };
        Name::from_str(&fqdn)
            .map_err(|e| EngineError::Submit(format!("Invalid domain name '{}': {}", fqdn, e)))
    }

    fn serialize_message(message: &Message) -> Result<Vec<u8>, EngineError> {
        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);

        message.emit(&mut encoder).map_err(|e| {
            EngineError::Submit(format!("Failed to serialize DNS message: {}", e))
        })?;

        Ok(buf)
    }
}
