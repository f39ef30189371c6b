use ferry_core::SqlWriter;

#[derive(Debug, Default)]
pub struct MemorySqlWriter {}

impl SqlWriter for MemorySqlWriter {}
