use super::dto::Response;
use crate::error::Result;
use std::io::Write;

/// Writes one JSON document per line.
pub struct ResponseWriter<W: Write> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_response(&mut self, response: &Response) -> Result<()> {
        serde_json::to_writer(&mut self.writer, response)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
