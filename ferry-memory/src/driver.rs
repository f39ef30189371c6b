use crate::{MemoryConnection, MemorySqlWriter};
use ferry_core::{Driver, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryDriver;
impl MemoryDriver {
    pub const fn new() -> Self {
        Self
    }

    /// Open a connection to a fresh, empty database.
    pub fn connect(&self, url: &str) -> Result<MemoryConnection> {
        MemoryConnection::connect(url)
    }
}

impl Driver for MemoryDriver {
    type SqlWriter = MemorySqlWriter;
    const NAME: &'static str = "memory";
    fn sql_writer(&self) -> Self::SqlWriter {
        MemorySqlWriter::default()
    }
}
