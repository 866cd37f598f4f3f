//! Request-line parsing for the control endpoint.
//!
//! The static-content server and the WebSocket transport are external
//! collaborators; the only inbound HTTP surface the core cares about is the
//! request line of the discharge endpoint. The parser composes `winnow`
//! combinators over the raw line and stays allocation-free.

use core::fmt;

use winnow::ModalResult;
use winnow::ascii::space1;
use winnow::combinator::alt;
use winnow::error::EmptyError;
use winnow::prelude::*;
use winnow::token::take_while;

/// Methods accepted by the control endpoint.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Method {
    Get,
    Post,
}

/// Parsed request line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RequestLine<'a> {
    pub method: Method,
    pub target: &'a str,
}

/// Operations the core dispatches on.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Endpoint {
    /// `GET|POST /discharge`: run the discharge sequence synchronously.
    Discharge,
    /// Anything else belongs to the static-content collaborator.
    NotFound,
}

/// Error returned for lines that are not well-formed HTTP request lines.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MalformedRequest;

impl fmt::Display for MalformedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("malformed request line")
    }
}

fn method(input: &mut &str) -> ModalResult<Method, EmptyError> {
    alt(("GET".value(Method::Get), "POST".value(Method::Post))).parse_next(input)
}

fn target<'a>(input: &mut &'a str) -> ModalResult<&'a str, EmptyError> {
    take_while(1.., |c: char| !c.is_ascii_whitespace()).parse_next(input)
}

fn http_version(input: &mut &str) -> ModalResult<(), EmptyError> {
    ("HTTP/", take_while(1.., |c: char| c.is_ascii_digit() || c == '.'))
        .void()
        .parse_next(input)
}

fn request_line<'a>(input: &mut &'a str) -> ModalResult<RequestLine<'a>, EmptyError> {
    let method = method(input)?;
    space1(input)?;
    let target = target(input)?;
    space1(input)?;
    http_version(input)?;
    Ok(RequestLine { method, target })
}

/// Parses one request line, tolerating a trailing CRLF.
///
/// # Errors
///
/// Returns [`MalformedRequest`] for anything that is not
/// `GET|POST <target> HTTP/<version>`.
pub fn parse_request_line(line: &str) -> Result<RequestLine<'_>, MalformedRequest> {
    request_line
        .parse(line.trim_end_matches(['\r', '\n']))
        .map_err(|_| MalformedRequest)
}

impl RequestLine<'_> {
    /// Maps the request target onto a core operation.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        if self.target == "/discharge" {
            Endpoint::Discharge
        } else {
            Endpoint::NotFound
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_discharge_request_line() {
        let line = parse_request_line("GET /discharge HTTP/1.1\r\n").unwrap();
        assert_eq!(line.method, Method::Get);
        assert_eq!(line.target, "/discharge");
        assert_eq!(line.endpoint(), Endpoint::Discharge);
    }

    #[test]
    fn post_is_accepted_for_discharge() {
        let line = parse_request_line("POST /discharge HTTP/1.0").unwrap();
        assert_eq!(line.method, Method::Post);
        assert_eq!(line.endpoint(), Endpoint::Discharge);
    }

    #[test]
    fn other_targets_fall_through_to_static_content() {
        let line = parse_request_line("GET /style.css HTTP/1.1").unwrap();
        assert_eq!(line.endpoint(), Endpoint::NotFound);
        assert_eq!(
            parse_request_line("GET / HTTP/1.1").unwrap().endpoint(),
            Endpoint::NotFound
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(parse_request_line(""), Err(MalformedRequest));
        assert_eq!(parse_request_line("PUT /discharge HTTP/1.1"), Err(MalformedRequest));
        assert_eq!(parse_request_line("GET /discharge"), Err(MalformedRequest));
        assert_eq!(parse_request_line("discharge"), Err(MalformedRequest));
    }
}
