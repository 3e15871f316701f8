//! HTTP front-end for [`MoveService`].
//!
//! Accepted connections are handed to a [`WorkerPool`]; each connection
//! carries exactly one request.

pub mod http;
mod pool;

pub use http::{HttpError, Method, Request, Response, MAX_HEAD};
pub use pool::{Rejected, WorkerPool};

use std::io::{self, BufReader, Read};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{error, info, warn};

use crate::config::ServiceConfig;
use crate::service::{ApiResponse, MoveService, FEN_FIELD, PGN_FIELD};

/// How long a connection may take to deliver its request head.
const READ_TIMEOUT: Duration = Duration::from_secs(10);

const DRAIN_TIMEOUT: Duration = Duration::from_millis(200);
const DRAIN_LIMIT: u64 = 64 * 1024;

/// Accepted connections allowed to wait for a worker, per worker.
pub const QUEUE_PER_WORKER: usize = 16;

/// Time the accept loop spends telling a client the server is busy.
const BUSY_WRITE_TIMEOUT: Duration = Duration::from_millis(200);

/// Stops a running [`Server`] from another thread.
#[derive(Clone, Debug)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    addr: SocketAddr,
}

impl ShutdownHandle {
    /// Ask the accept loop to exit. Returns once the request is delivered,
    /// not once the server has stopped.
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Relaxed);
        // Wake the blocking accept
        let _ = TcpStream::connect(self.addr);
    }

    #[inline]
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

pub struct Server {
    listener: TcpListener,
    service: Arc<MoveService>,
    workers: usize,
    shutdown: ShutdownHandle,
}

impl Server {
    pub fn bind(config: &ServiceConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(config.bind_addr)?;
        let addr = listener.local_addr()?;
        Ok(Server {
            listener,
            service: Arc::new(MoveService::new(config)),
            workers: config.workers,
            shutdown: ShutdownHandle {
                flag: Arc::new(AtomicBool::new(false)),
                addr,
            },
        })
    }

    /// Bound address, with the real port when bound to port 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Accept connections until shut down. Connections still queued when the
    /// loop exits are served before this returns.
    pub fn run(self) -> io::Result<()> {
        let service = Arc::clone(&self.service);
        let pool = WorkerPool::new(
            self.workers,
            self.workers.max(1) * QUEUE_PER_WORKER,
            move |stream: TcpStream| handle_connection(&service, stream),
        )?;
        info!(
            "listening on http://{} with {} workers, queue of {}",
            self.local_addr()?,
            pool.size(),
            pool.capacity()
        );

        for stream in self.listener.incoming() {
            if self.shutdown.is_shutdown() {
                break;
            }
            match stream {
                Ok(stream) => match pool.submit(stream) {
                    Ok(()) => {}
                    Err(Rejected::Full(stream)) => reject_busy(&stream),
                    Err(e @ Rejected::Closed(_)) => error!("dropping connection: {e}"),
                },
                Err(e) => error!("accept failed: {e}"),
            }
        }
        info!("server stopped");
        Ok(())
    }
}

/// Map a request to its response.
#[must_use]
pub fn route(service: &MoveService, request: &Request) -> Response {
    let path = request.path.as_str();
    let known = matches!(path, "/" | "/pgn");
    match &request.method {
        Method::Options => Response::preflight(),
        Method::Get | Method::Head if path == "/" => {
            json(200, &service.handle_fen_query(request.query(FEN_FIELD)))
        }
        Method::Get | Method::Head if path == "/pgn" => {
            json(200, &service.handle_pgn_query(request.query(PGN_FIELD)))
        }
        _ if known => error_response(405, "Method not allowed"),
        _ => error_response(404, "Not found"),
    }
}

fn json(status: u16, body: &ApiResponse) -> Response {
    Response::json(status, body.to_json())
}

fn error_response(status: u16, message: &str) -> Response {
    json(
        status,
        &ApiResponse::Error {
            error: message.to_string(),
            reason: None,
            remedy: None,
        },
    )
}

/// Answer 503 from the accept loop and close, without reading the request.
fn reject_busy(stream: &TcpStream) {
    let peer = stream
        .peer_addr()
        .map_or_else(|_| "unknown".to_string(), |addr| addr.to_string());
    warn!("{peer}: all workers busy, answering 503");
    let mut writer = stream;
    let written = stream
        .set_write_timeout(Some(BUSY_WRITE_TIMEOUT))
        .and_then(|()| busy_response().write_to(&mut writer, true));
    if let Err(e) = written {
        warn!("{peer}: cannot send 503: {e}");
    }
}

fn busy_response() -> Response {
    error_response(503, "Server busy, try again later")
}

/// Read what is left of an oversized request so that closing the socket
/// does not reset the connection before the peer sees the response.
fn discard_pending<R: Read>(stream: &TcpStream, reader: &mut R) {
    if stream.set_read_timeout(Some(DRAIN_TIMEOUT)).is_ok() {
        let _ = io::copy(&mut reader.take(DRAIN_LIMIT), &mut io::sink());
    }
}

fn handle_connection(service: &MoveService, stream: TcpStream) {
    let peer = stream
        .peer_addr()
        .map_or_else(|_| "unknown".to_string(), |addr| addr.to_string());
    if let Err(e) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
        error!("{peer}: cannot set read timeout: {e}");
        return;
    }

    let start = Instant::now();
    let mut reader = BufReader::new(&stream);
    let (response, include_body, line) = match Request::read_from(&mut reader) {
        Ok(request) => {
            let line = format!("{} {}", request.method, request.path);
            let include_body = request.method != Method::Head;
            (route(service, &request), include_body, line)
        }
        Err(HttpError::Closed) => return,
        Err(HttpError::Io(e)) => {
            error!("{peer}: read failed: {e}");
            return;
        }
        Err(e @ HttpError::HeadTooLarge) => {
            warn!("{peer}: {e}");
            discard_pending(&stream, &mut reader);
            (error_response(431, &e.to_string()), true, String::from("-"))
        }
        Err(e @ HttpError::Malformed { .. }) => {
            warn!("{peer}: {e}");
            (error_response(400, &e.to_string()), true, String::from("-"))
        }
    };

    let mut writer = &stream;
    if let Err(e) = response.write_to(&mut writer, include_body) {
        error!("{peer}: write failed: {e}");
        return;
    }
    info!(
        "{peer} \"{line}\" {} in {}ms",
        response.status,
        start.elapsed().as_millis()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> MoveService {
        MoveService::with_limits(Duration::from_millis(20), 2)
    }

    fn request(raw: &str) -> Request {
        Request::parse_head(raw).unwrap()
    }

    #[test]
    fn test_route_missing_fen() {
        let response = route(&service(), &request("GET / HTTP/1.1\r\n"));
        assert_eq!(response.status, 200);
        assert!(response.body.contains("No 'fen' field provided."));
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
    }

    #[test]
    fn test_route_unknown_path() {
        let response = route(&service(), &request("GET /favicon.ico HTTP/1.1\r\n"));
        assert_eq!(response.status, 404);
        assert_eq!(response.body, r#"{"error":"Not found"}"#);
    }

    #[test]
    fn test_route_wrong_method() {
        let response = route(&service(), &request("POST / HTTP/1.1\r\n"));
        assert_eq!(response.status, 405);
    }

    #[test]
    fn test_busy_response() {
        let response = busy_response();
        assert_eq!(response.status, 503);
        assert_eq!(response.body, r#"{"error":"Server busy, try again later"}"#);
        let mut out = Vec::new();
        response.write_to(&mut out, true).unwrap();
        assert!(String::from_utf8(out)
            .unwrap()
            .starts_with("HTTP/1.1 503 Service Unavailable\r\n"));
    }

    #[test]
    fn test_route_preflight() {
        let response = route(&service(), &request("OPTIONS /anything HTTP/1.1\r\n"));
        assert_eq!(response.status, 204);
        assert!(response.body.is_empty());
    }

    #[test]
    fn test_route_white_to_move() {
        let response = route(
            &service(),
            &request("GET /?fen=rnbqkbnr%2Fpppppppp%2F8%2F8%2F8%2F8%2FPPPPPPPP%2FRNBQKBNR+w+KQkq+-+0+1 HTTP/1.1\r\n"),
        );
        assert_eq!(response.status, 200);
        assert!(response.body.contains("The white player is supposed to make a move"));
    }
}
