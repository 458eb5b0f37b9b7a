//! DNS health probe.
//!
//! Sends one recursive query over UDP and accepts only a matching reply with
//! `NOERROR` (and, by default, a non-empty answer section).

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RecordType};
use tokio::net::UdpSocket;
use tracing::debug;

use crate::health::probe::{HealthProbe, ProbeError};
use crate::health::ProbeConfigError;

#[derive(Debug, Clone)]
pub struct DnsProbe {
    server: SocketAddr,
    name: Name,
    record_type: RecordType,
    require_answer: bool,
}

impl DnsProbe {
    pub fn new(
        server: SocketAddr,
        query_name: &str,
        record_type: &str,
        require_answer: bool,
    ) -> Result<Self, ProbeConfigError> {
        let name = Name::from_ascii(query_name)
            .map_err(|e| ProbeConfigError(format!("query_name `{}`: {}", query_name, e)))?;
        let record_type = RecordType::from_str(&record_type.to_ascii_uppercase())
            .map_err(|e| ProbeConfigError(format!("record_type `{}`: {}", record_type, e)))?;

        Ok(Self {
            server,
            name,
            record_type,
            require_answer,
        })
    }

    fn build_query(&self, id: u16) -> Result<Vec<u8>, ProbeError> {
        let mut query = Query::new();
        query.set_name(self.name.clone());
        query.set_query_type(self.record_type);
        query.set_query_class(DNSClass::IN);

        let mut message = Message::new();
        message
            .set_id(id)
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(true)
            .add_query(query);

        message
            .to_vec()
            .map_err(|e| ProbeError::Ambiguous(format!("cannot encode query: {}", e)))
    }

    fn evaluate(&self, reply: &Message) -> Result<(), ProbeError> {
        let code = reply.response_code();
        if code != ResponseCode::NoError {
            return Err(ProbeError::Failed(format!(
                "{} {} answered {:?}",
                self.name, self.record_type, code
            )));
        }
        if self.require_answer && reply.answers().is_empty() {
            return Err(ProbeError::Failed(format!(
                "{} {} returned no answers",
                self.name, self.record_type
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl HealthProbe for DnsProbe {
    async fn check(&self) -> Result<(), ProbeError> {
        let local: SocketAddr = if self.server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| ProbeError::Ambiguous(format!("cannot bind query socket: {}", e)))?;
        socket
            .connect(self.server)
            .await
            .map_err(|e| ProbeError::Connect(e.to_string()))?;

        let id: u16 = rand::random();
        let query = self.build_query(id)?;
        socket
            .send(&query)
            .await
            .map_err(|e| ProbeError::Connect(e.to_string()))?;

        let mut buf = [0u8; 4096];
        loop {
            let len = socket
                .recv(&mut buf)
                .await
                .map_err(|e| ProbeError::Connect(e.to_string()))?;
            // Anything unparseable is stray; keep waiting for the real reply
            // until the caller's deadline.
            let reply = match Message::from_vec(&buf[..len]) {
                Ok(reply) => reply,
                Err(e) => {
                    debug!(len, error = %e, "Ignoring malformed DNS datagram");
                    continue;
                }
            };

            if reply.id() != id || reply.message_type() != MessageType::Response {
                debug!(expected = id, got = reply.id(), "Ignoring unrelated DNS datagram");
                continue;
            }
            return self.evaluate(&reply);
        }
    }

    fn describe(&self) -> String {
        format!("dns {} {} {}", self.server, self.name, self.record_type)
    }
}
