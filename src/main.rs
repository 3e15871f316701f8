use std::process::ExitCode;

use chess_move_api::config::ServiceConfig;
use chess_move_api::{logging, Server};

fn main() -> ExitCode {
    let config = ServiceConfig::from_env_and_args();

    if let Err(e) = logging::init(config.debug) {
        eprintln!("cannot install logger: {e}");
    }

    let server = match Server::bind(&config) {
        Ok(server) => server,
        Err(e) => {
            log::error!("cannot bind {}: {e}", config.bind_addr);
            return ExitCode::FAILURE;
        }
    };

    match server.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("server failed: {e}");
            ExitCode::FAILURE
        }
    }
}
