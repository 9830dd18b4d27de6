use ferrous_rdns_application::ports::EngineError;
use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::{Name, RData};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PtrResponse {
    pub id: u16,

    pub is_response: bool,

    pub rcode: ResponseCode,

    pub truncated: bool,

    /// First question, as sent back by the server.
    pub question: Option<String>,

    /// Type code of that question.
    pub question_type: Option<u16>,

    /// Every PTR target of the answer section in uncompressed wire form.
    pub ptr_rdata: Vec<Vec<u8>>,
}

impl PtrResponse {
    pub fn is_nxdomain(&self) -> bool {
        self.rcode == ResponseCode::NXDomain
    }

    pub fn is_server_error(&self) -> bool {
        matches!(
            self.rcode,
            ResponseCode::ServFail | ResponseCode::Refused | ResponseCode::NotImp
        )
    }
}

pub struct ResponseParser;

impl ResponseParser {
    pub fn parse(response_bytes: &[u8]) -> Result<PtrResponse, EngineError> {
        let message = Message::from_vec(response_bytes)
            .map_err(|e| EngineError::Resolve(format!("Failed to parse DNS response: {}", e)))?;

        let mut ptr_rdata = Vec::new();
        for record in message.answers() {
            if let RData::PTR(ptr) = record.data() {
                ptr_rdata.push(Self::name_to_wire(&ptr.0)?);
            }
        }

        let response = PtrResponse {
            id: message.id(),
            is_response: message.message_type() == MessageType::Response,
            rcode: message.response_code(),
            truncated: message.truncated(),
            question: message.queries().first().map(|q| q.name().to_utf8()),
            question_type: message.queries().first().map(|q| u16::from(q.query_type())),
            ptr_rdata,
        };

        debug!(
            id = response.id,
            rcode = Self::rcode_to_status(response.rcode),
            answers = response.ptr_rdata.len(),
            truncated = response.truncated,
            "DNS response parsed"
        );

        Ok(response)
    }

    fn name_to_wire(name: &Name) -> Result<Vec<u8>, EngineError> {
        let mut buf = Vec::with_capacity(64);
        let mut encoder = BinEncoder::new(&mut buf);
        name.emit(&mut encoder)
            .map_err(|e| EngineError::Resolve(format!("Failed to encode PTR target: {}", e)))?;
        Ok(buf)
    }

    pub fn rcode_to_status(rcode: ResponseCode) -> &'static str {
        match rcode {
            ResponseCode::NoError => "NOERROR",
            ResponseCode::NXDomain => "NXDOMAIN",
            ResponseCode::ServFail => "SERVFAIL",
            ResponseCode::Refused => "REFUSED",
            ResponseCode::NotImp => "NOTIMP",
            ResponseCode::FormErr => "FORMERR",
            _ => "UNKNOWN",
        }
    }
}
