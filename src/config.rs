//! Service configuration from command-line flags and environment variables.
//!
//! Values are resolved in three layers: built-in defaults, then `CHESS_API_*`
//! environment variables, then command-line flags. [`Cli`] does the parsing;
//! the server only ever sees the resolved [`ServiceConfig`].

use std::net::SocketAddr;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};

use crate::engine::DEFAULT_MAX_DEPTH;

/// Default address the server listens on
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Default time given to the search driver
pub const DEFAULT_THINK_MS: u64 = 2000;

pub const DEFAULT_WORKERS: usize = 4;
pub const MAX_WORKERS: usize = 64;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "chess_move_api")]
#[command(about = "HTTP service answering chess positions with a move for black", long_about = None)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "CHESS_API_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// Search time per request in milliseconds
    #[arg(long, env = "CHESS_API_THINK_MS", default_value_t = DEFAULT_THINK_MS)]
    pub think_ms: u64,

    /// Worker threads, clamped to 1..=64
    #[arg(long, env = "CHESS_API_WORKERS", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Deepest search iteration
    #[arg(long, env = "CHESS_API_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: u32,

    /// Log every search iteration
    #[arg(
        long,
        env = "CHESS_API_DEBUG",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,
    /// Soft deadline handed to the search driver
    pub think_time: Duration,
    /// Number of connection worker threads
    pub workers: usize,
    /// Cap on search iterations per request
    pub max_depth: u32,
    /// Log at debug level
    pub debug: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            think_time: Duration::from_millis(DEFAULT_THINK_MS),
            workers: DEFAULT_WORKERS,
            max_depth: DEFAULT_MAX_DEPTH,
            debug: false,
        }
    }
}

impl From<Cli> for ServiceConfig {
    fn from(cli: Cli) -> Self {
        ServiceConfig {
            bind_addr: cli.bind,
            think_time: Duration::from_millis(cli.think_ms),
            workers: cli.workers.clamp(1, MAX_WORKERS),
            max_depth: cli.max_depth.max(1),
            debug: cli.debug,
        }
    }
}

impl ServiceConfig {
    /// Resolve the configuration of the running process. Exits with usage
    /// on `--help` or on a bad flag.
    #[must_use]
    pub fn from_env_and_args() -> Self {
        Cli::parse().into()
    }
}
