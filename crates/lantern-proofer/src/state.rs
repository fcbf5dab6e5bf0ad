//! The data-request store.
//!
//! A proofer never performs I/O itself: it records the requests it needs in
//! creation order, yields, and polls for their presence by content-hash id
//! when re-entered. Deduplication by id is what makes the builders safely
//! re-runnable: issuing the same request twice lands on the same slot.

use serde::{Deserialize, Serialize};

use lantern_core::crypto::sha256;

/// Which upstream a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    BeaconApi,
    EthRpc,
    RestApi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    fn as_byte(self) -> u8 {
        match self {
            HttpMethod::Get => 0,
            HttpMethod::Post => 1,
            HttpMethod::Put => 2,
            HttpMethod::Delete => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Json,
    Ssz,
}

/// Content-hash id of a request: sha256 over method, url and payload.
pub fn request_id(method: HttpMethod, url: &str, payload: &[u8]) -> [u8; 32] {
    let mut buf = Vec::with_capacity(1 + url.len() + payload.len());
    buf.push(method.as_byte());
    buf.extend_from_slice(url.as_bytes());
    buf.extend_from_slice(payload);
    sha256(&buf)
}

/// One upstream request owned by a proofer context. The host fills in
/// `response` or `error`; a request is pending while both are empty.
#[derive(Debug)]
pub struct DataRequest {
    pub id: [u8; 32],
    pub chain_id: u64,
    pub request_type: RequestType,
    pub method: HttpMethod,
    pub encoding: Encoding,
    pub url: Option<String>,
    pub payload: Vec<u8>,
    pub response: Option<Vec<u8>>,
    pub error: Option<String>,
}

impl DataRequest {
    pub fn is_pending(&self) -> bool {
        self.response.is_none() && self.error.is_none()
    }

    /// Flip the request back to pending without changing its id.
    pub fn retry(&mut self) {
        self.response = None;
        self.error = None;
    }

    pub fn set_response(&mut self, bytes: Vec<u8>) {
        self.response = Some(bytes);
        self.error = None;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }
}

/// The ordered, deduplicated set of requests of one proofer context.
#[derive(Debug, Default)]
pub struct State {
    requests: Vec<DataRequest>,
}

impl State {
    pub fn new() -> Self {
        State::default()
    }

    pub fn index_of(&self, id: &[u8; 32]) -> Option<usize> {
        self.requests.iter().position(|r| &r.id == id)
    }

    pub fn at(&self, index: usize) -> &DataRequest {
        &self.requests[index]
    }

    pub fn at_mut(&mut self, index: usize) -> &mut DataRequest {
        &mut self.requests[index]
    }

    /// Requests are inserted in creation order; completion order is up to
    /// the host.
    pub fn add(&mut self, request: DataRequest) {
        debug_assert!(self.index_of(&request.id).is_none());
        self.requests.push(request);
    }

    pub fn pending(&self) -> Option<&DataRequest> {
        self.requests.iter().find(|r| r.is_pending())
    }

    /// The requests the host still has to serve.
    pub fn open_requests(&mut self) -> impl Iterator<Item = &mut DataRequest> {
        self.requests.iter_mut().filter(|r| r.is_pending())
    }

    pub fn requests(&self) -> &[DataRequest] {
        &self.requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: [u8; 32]) -> DataRequest {
        DataRequest {
            id,
            chain_id: 1,
            request_type: RequestType::EthRpc,
            method: HttpMethod::Post,
            encoding: Encoding::Json,
            url: None,
            payload: Vec::new(),
            response: None,
            error: None,
        }
    }

    #[test]
    fn test_request_id_depends_on_every_part() {
        let a = request_id(HttpMethod::Post, "", b"payload");
        assert_ne!(a, request_id(HttpMethod::Get, "", b"payload"));
        assert_ne!(a, request_id(HttpMethod::Post, "url", b"payload"));
        assert_ne!(a, request_id(HttpMethod::Post, "", b"other"));
        assert_eq!(a, request_id(HttpMethod::Post, "", b"payload"));
    }

    #[test]
    fn test_pending_lifecycle() {
        let mut state = State::new();
        state.add(request([1u8; 32]));
        assert!(state.pending().is_some());

        let idx = state.index_of(&[1u8; 32]).unwrap();
        state.at_mut(idx).set_response(b"{}".to_vec());
        assert!(state.pending().is_none());

        // retry makes it pending again under the same id
        state.at_mut(idx).retry();
        assert!(state.pending().is_some());
        assert_eq!(state.at(idx).id, [1u8; 32]);
    }

    #[test]
    fn test_errors_are_sticky() {
        let mut state = State::new();
        state.add(request([2u8; 32]));
        let idx = state.index_of(&[2u8; 32]).unwrap();
        state.at_mut(idx).set_error("boom");
        assert!(state.pending().is_none());
        assert_eq!(state.at(idx).error.as_deref(), Some("boom"));
    }
}
