use std::io::{BufRead, Write};

use crate::error::{AppError, AppResult};

use super::protocol::{BridgeResponse, PROTOCOL_VERSION};

pub struct NdjsonIo<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> NdjsonIo<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn read_line(&mut self) -> AppResult<Option<String>> {
        let mut line = String::new();
        let n = self.input.read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }
        let line = line.trim_end_matches(&['\r', '\n'][..]).to_string();
        if line.trim().is_empty() {
            return Ok(Some(String::new()));
        }
        Ok(Some(line))
    }

    pub fn write_json_line<T: serde::Serialize>(&mut self, v: &T) -> AppResult<()> {
        serde_json::to_writer(&mut self.output, v)?;
        self.output.write_all(b"\n")?;
        self.output.flush()?;
        Ok(())
    }

    /// Reports a line that could not be parsed as a request. The id is unknown and left empty.
    pub fn protocol_error(&mut self, msg: String) -> AppResult<()> {
        let resp = BridgeResponse::<()>::from_error(
            PROTOCOL_VERSION,
            String::new(),
            &AppError::InvalidRequest(msg),
        );
        self.write_json_line(&resp)
    }

    pub fn into_output(self) -> W {
        self.output
    }
}
