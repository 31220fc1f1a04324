//! NDJSON request/response loop over stdio, one connection per session.

mod handler;
mod io;
mod protocol;

use std::{
    io::{BufRead, BufReader, BufWriter, Write},
    sync::Arc,
};

use crate::{core::driver::Driver, error::AppResult};

use handler::BridgeHandler;
use io::NdjsonIo;
use protocol::BridgeRequest;

pub fn run(driver: Arc<dyn Driver>, default_dsn: Option<String>, max_rows: usize) -> AppResult<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| crate::error::AppError::Internal(e.to_string()))?;

    let io = NdjsonIo::new(
        BufReader::new(std::io::stdin()),
        BufWriter::new(std::io::stdout()),
    );
    let handler = BridgeHandler::new(driver, default_dsn, max_rows);
    rt.block_on(serve(io, handler)).map(|_| ())
}

async fn serve<R: BufRead, W: Write>(
    mut io: NdjsonIo<R, W>,
    mut handler: BridgeHandler,
) -> AppResult<NdjsonIo<R, W>> {
    loop {
        let Some(line) = io.read_line()? else { break };
        if line.is_empty() {
            continue;
        }

        let req: BridgeRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                io.protocol_error(format!("malformed request: {e}"))?;
                continue;
            }
        };

        let resp = handler.handle(req).await;
        io.write_json_line(&resp)?;
    }

    handler.shutdown().await;
    Ok(io)
}
