//! Just enough HTTP/1.1 for query-string GET requests.
//!
//! Requests are read up to the end of the head; bodies are ignored. Every
//! response is JSON, carries the CORS headers and closes the connection.

use std::fmt;
use std::io::{self, BufRead, Read, Write};

/// Largest request head accepted, request line and headers included.
pub const MAX_HEAD: usize = 8 * 1024;

#[derive(Debug)]
pub enum HttpError {
    /// The peer closed the connection before sending a request line
    Closed,
    /// The head exceeds [`MAX_HEAD`]
    HeadTooLarge,
    /// The request line or a header could not be parsed
    Malformed { reason: &'static str },
    Io(io::Error),
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::Closed => write!(f, "Connection closed before request"),
            HttpError::HeadTooLarge => {
                write!(f, "Request head larger than {MAX_HEAD} bytes")
            }
            HttpError::Malformed { reason } => write!(f, "Malformed request: {reason}"),
            HttpError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HttpError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for HttpError {
    fn from(e: io::Error) -> Self {
        HttpError::Io(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Options,
    Other(String),
}

impl Method {
    fn parse(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            other => Method::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Head => write!(f, "HEAD"),
            Method::Options => write!(f, "OPTIONS"),
            Method::Other(name) => write!(f, "{name}"),
        }
    }
}

/// A parsed request head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Decoded path without the query string
    pub path: String,
    query: Vec<(String, String)>,
}

impl Request {
    /// Read a request head from `reader`, stopping at the blank line.
    pub fn read_from<R: BufRead>(reader: &mut R) -> Result<Request, HttpError> {
        let mut head = String::new();
        loop {
            let remaining = (MAX_HEAD + 1).saturating_sub(head.len());
            if remaining == 0 {
                return Err(HttpError::HeadTooLarge);
            }
            let mut bytes = Vec::new();
            let read = reader
                .by_ref()
                .take(remaining as u64)
                .read_until(b'\n', &mut bytes)?;
            if read == 0 {
                if head.is_empty() {
                    return Err(HttpError::Closed);
                }
                return Err(HttpError::Malformed {
                    reason: "truncated head",
                });
            }
            if head.len() + bytes.len() > MAX_HEAD {
                return Err(HttpError::HeadTooLarge);
            }
            let line = String::from_utf8(bytes).map_err(|_| HttpError::Malformed {
                reason: "head is not valid UTF-8",
            })?;
            if line == "\r\n" || line == "\n" {
                if head.is_empty() {
                    // Tolerate stray blank lines before the request line
                    continue;
                }
                break;
            }
            head.push_str(&line);
        }
        Self::parse_head(&head)
    }

    /// Parse the request line; header lines are checked for shape only.
    pub fn parse_head(head: &str) -> Result<Request, HttpError> {
        let mut lines = head.lines();
        let request_line = lines.next().ok_or(HttpError::Malformed {
            reason: "missing request line",
        })?;
        let mut parts = request_line.split_whitespace();
        let (Some(method), Some(target), Some(version), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(HttpError::Malformed {
                reason: "bad request line",
            });
        };
        if !version.starts_with("HTTP/1.") {
            return Err(HttpError::Malformed {
                reason: "unsupported version",
            });
        }
        if lines.any(|line| !line.trim().is_empty() && !line.contains(':')) {
            return Err(HttpError::Malformed {
                reason: "bad header line",
            });
        }

        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        Ok(Request {
            method: Method::parse(method),
            path: percent_decode(path, false),
            query: parse_query(query),
        })
    }

    /// First value of a query parameter.
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Split and decode an `application/x-www-form-urlencoded` string.
#[must_use]
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(key, true), percent_decode(value, true))
        })
        .collect()
}

/// Decode `%XX` escapes, and `+` as space when `plus_as_space` is set.
/// Malformed escapes are kept as they are.
#[must_use]
pub fn percent_decode(input: &str, plus_as_space: bool) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' if plus_as_space => out.push(b' '),
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .and_then(|pair| std::str::from_utf8(pair).ok())
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok());
                if let Some(byte) = hex {
                    out.push(byte);
                    i += 2;
                } else {
                    out.push(b'%');
                }
            }
            byte => out.push(byte),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[must_use]
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    headers: Vec<(&'static str, String)>,
    pub body: String,
}

impl Response {
    /// A JSON response with the CORS header.
    #[must_use]
    pub fn json(status: u16, body: String) -> Self {
        Response {
            status,
            headers: vec![
                ("Content-Type", "application/json".to_string()),
                ("Access-Control-Allow-Origin", "*".to_string()),
            ],
            body,
        }
    }

    /// Answer to a CORS preflight request.
    #[must_use]
    pub fn preflight() -> Self {
        let mut response = Self::json(204, String::new());
        response.headers.extend([
            ("Access-Control-Allow-Methods", "GET, OPTIONS".to_string()),
            ("Access-Control-Allow-Headers", "*".to_string()),
            ("Access-Control-Max-Age", "86400".to_string()),
        ]);
        response
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Write status line, headers and body. With `include_body` unset only
    /// the head is written, as for a `HEAD` request.
    pub fn write_to<W: Write>(&self, writer: &mut W, include_body: bool) -> io::Result<()> {
        write!(
            writer,
            "HTTP/1.1 {} {}\r\n",
            self.status,
            reason_phrase(self.status)
        )?;
        for (name, value) in &self.headers {
            write!(writer, "{name}: {value}\r\n")?;
        }
        write!(
            writer,
            "Content-Length: {}\r\nConnection: close\r\n\r\n",
            self.body.len()
        )?;
        if include_body {
            writer.write_all(self.body.as_bytes())?;
        }
        writer.flush()
    }
}
