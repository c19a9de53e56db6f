//! # Network Module
//!
//! This module provides the structured request/response model used at the command server
//! boundary. The transport is plain HTTP/1.1 over TCP: requests are parsed into a
//! [`Request`] (method, path, query parameters) before any dispatch happens, keeping
//! transport concerns out of the command processor.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::BTreeMap;
use std::io::Write;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A parsed inbound request.
///
/// Only the request line is modelled - header fields carry no information the boundary needs,
/// so they are ignored entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The request method.
    pub method: Method,

    /// The request path, without the query string.
    pub path: String,

    /// Query parameters, in key order.
    pub query: BTreeMap<String, String>,
}

/// An outbound response.
///
/// A response knows how to write itself onto any `io::Write`, which is the only coupling the
/// rest of the software has to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status of the response.
    pub status: Status,

    /// MIME type of the body.
    pub content_type: &'static str,

    /// Response body.
    pub body: String,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Request methods understood by the boundary.
///
/// Anything other than `GET` is still parsed, so the router can answer it with a not-found
/// outcome rather than a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Other,
}

/// Response statuses produced by the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
}

/// Possible request parsing errors.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Request is empty")]
    Empty,

    #[error("Malformed request line: {0:?}")]
    MalformedRequestLine(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Request {
    /// Parse a request from the raw request head.
    ///
    /// Only the first line (`METHOD TARGET VERSION`) is interpreted; any following header
    /// lines are ignored.
    pub fn parse(head: &str) -> Result<Self, RequestError> {
        let request_line = match head.lines().next() {
            Some(l) if !l.trim().is_empty() => l,
            _ => return Err(RequestError::Empty),
        };

        let mut parts = request_line.split_whitespace();

        let method = match parts.next() {
            Some("GET") => Method::Get,
            Some(_) => Method::Other,
            None => return Err(RequestError::MalformedRequestLine(request_line.into())),
        };

        let target = match parts.next() {
            Some(t) => t,
            None => return Err(RequestError::MalformedRequestLine(request_line.into())),
        };

        // The version token must be present for this to be a valid request line
        if parts.next().is_none() {
            return Err(RequestError::MalformedRequestLine(request_line.into()));
        }

        // Split the target into path and query string
        let (path, query_str) = match target.split_once('?') {
            Some((p, q)) => (p, q),
            None => (target, ""),
        };

        // Parse the query string into key/value pairs. Keys without a value map to an empty
        // string, and empty pairs (from stray `&`s) are skipped.
        let mut query = BTreeMap::new();
        for pair in query_str.split('&') {
            if pair.is_empty() {
                continue;
            }
            match pair.split_once('=') {
                Some((k, v)) => query.insert(k.to_string(), v.to_string()),
                None => query.insert(pair.to_string(), String::new()),
            };
        }

        Ok(Request {
            method,
            path: path.to_string(),
            query,
        })
    }
}

impl Response {
    /// Build a 200 response carrying an HTML body.
    pub fn ok_html(body: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            content_type: "text/html",
            body: body.into(),
        }
    }

    /// Build a 200 response carrying a JSON body.
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            content_type: "application/json",
            body: body.into(),
        }
    }

    /// Build a 400 client error response.
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self {
            status: Status::BadRequest,
            content_type: "text/plain",
            body: reason.into(),
        }
    }

    /// Build a 404 response.
    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            content_type: "text/plain",
            body: String::from("not found"),
        }
    }

    /// Write this response onto the given writer as an HTTP/1.1 response.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        write!(
            writer,
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status.code(),
            self.status.reason(),
            self.content_type,
            self.body.len()
        )?;
        writer.write_all(self.body.as_bytes())?;
        writer.flush()
    }
}

impl Status {
    /// Numeric status code.
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::NotFound => 404,
        }
    }

    /// Reason phrase for the status line.
    pub fn reason(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::BadRequest => "Bad Request",
            Status::NotFound => "Not Found",
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_plain_request() {
        let req = Request::parse("GET /status HTTP/1.1\r\nHost: rover\r\n\r\n").unwrap();
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.path, "/status");
        assert!(req.query.is_empty());
    }

    #[test]
    fn test_parse_query() {
        let req = Request::parse("GET /cmd?action=start_scan HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(req.path, "/cmd");
        assert_eq!(req.query.get("action").map(String::as_str), Some("start_scan"));

        // Extra parameters are carried but harmless
        let req = Request::parse("GET /cmd?action=stop&t=123 HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(req.query.len(), 2);
        assert_eq!(req.query.get("t").map(String::as_str), Some("123"));

        // Key without a value
        let req = Request::parse("GET /cmd?action HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(req.query.get("action").map(String::as_str), Some(""));
    }

    #[test]
    fn test_parse_non_get() {
        let req = Request::parse("POST /cmd HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(req.method, Method::Other);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Request::parse(""), Err(RequestError::Empty)));
        assert!(matches!(
            Request::parse("GET\r\n"),
            Err(RequestError::MalformedRequestLine(_))
        ));
        assert!(matches!(
            Request::parse("GET /status\r\n"),
            Err(RequestError::MalformedRequestLine(_))
        ));
    }

    #[test]
    fn test_response_write() {
        let mut buf = Vec::new();
        Response::ok_json("{\"active\":false}").write_to(&mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: application/json\r\n"));
        assert!(text.contains("Content-Length: 16\r\n"));
        assert!(text.ends_with("\r\n\r\n{\"active\":false}"));
    }

    #[test]
    fn test_response_statuses() {
        assert_eq!(Response::not_found().status.code(), 404);
        assert_eq!(Response::bad_request("missing action").status.code(), 400);
    }
}
