//! HTTP request/response types and the transport seam.
//!
//! # Design
//! Requests and responses are plain data. `PinboardClient` builds an
//! `HttpRequest` and parses an `HttpResponse`; a `Transport` sits between the
//! two and performs exactly one GET. Transports only report failures below
//! HTTP. Status and body classification happens in `check_response`, so a
//! host that executes requests itself gets the same error semantics.

use std::fmt;

use url::Url;

use crate::error::ApiError;

/// A fully qualified GET request.
///
/// `endpoint` is the API path (e.g. `posts/get`) and is safe to log; `url`
/// carries the auth token and is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub endpoint: String,
    pub url: Url,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            reason: "OK".to_string(),
            body: body.into(),
        }
    }
}

/// Executes one GET request.
pub trait Transport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking transport backed by a `ureq` agent.
///
/// The agent is configured to hand back 4xx/5xx responses as data so that
/// `check_response` decides what counts as a failure.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl Transport for UreqTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut response = self
            .agent
            .get(request.url.as_str())
            .call()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        // `posts/all` without `results` returns the whole account, which can
        // exceed ureq's default 10 MB read limit.
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

/// Classify a response and return its body.
///
/// An empty body or a lone newline is Pinboard's way of saying "nothing
/// here"; it is reported as `NoData` whatever the status. Any other non-2xx
/// status becomes `HttpStatus`.
pub fn check_response(response: HttpResponse) -> Result<Vec<u8>, ApiError> {
    if response.body.is_empty() || response.body == b"\n" {
        return Err(ApiError::NoData);
    }
    if !(200..300).contains(&response.status) {
        return Err(ApiError::HttpStatus {
            status: response.status,
            reason: response.reason,
        });
    }
    Ok(response.body)
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;
    use crate::client::PinboardClient;
    use crate::config::ClientConfig;
    use crate::types::AllOptions;

    fn response(status: u16, reason: &str, body: &[u8]) -> HttpResponse {
        HttpResponse {
            status,
            reason: reason.to_string(),
            body: body.to_vec(),
        }
    }

    #[test]
    fn body_is_returned_unmodified() {
        let body = check_response(response(200, "OK", b"{hello:world}")).unwrap();
        assert_eq!(body, b"{hello:world}");
    }

    #[test]
    fn server_error_carries_status_line() {
        let err = check_response(response(500, "Internal Server Error", b"oops\n")).unwrap_err();
        assert_eq!(err.to_string(), "HTTP 500 Internal Server Error");
    }

    #[test]
    fn unauthorized_is_an_http_error() {
        let err = check_response(response(401, "Unauthorized", b"401 Forbidden")).unwrap_err();
        assert!(matches!(err, ApiError::HttpStatus { status: 401, .. }));
    }

    #[test]
    fn lone_newline_is_no_data_regardless_of_status() {
        for status in [200, 404, 500] {
            let err = check_response(response(status, "", b"\n")).unwrap_err();
            assert!(matches!(err, ApiError::NoData), "status {status}");
        }
    }

    #[test]
    fn empty_body_is_no_data() {
        let err = check_response(HttpResponse::ok(Vec::new())).unwrap_err();
        assert!(matches!(err, ApiError::NoData));
    }

    #[test]
    fn two_newlines_are_data() {
        assert!(check_response(HttpResponse::ok(b"\n\n".to_vec())).is_ok());
    }

    /// Serves `body` once on a local port and returns the base URL.
    fn serve_once(body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            )
            .unwrap();
            stream.write_all(body.as_bytes()).unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn ureq_transport_reads_bodies_past_ten_megabytes() {
        let body = format!("[{}]", " ".repeat(11 * 1024 * 1024));
        let expected_len = body.len();
        let client = PinboardClient::new(ClientConfig::new(&serve_once(body)));
        let request = client
            .build_all_bookmarks("mango:1234", &AllOptions::default())
            .unwrap();

        let response = UreqTransport::new().get(&request).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body.len(), expected_len);
        assert!(client.parse_all_bookmarks(response).unwrap().is_empty());
    }
}
