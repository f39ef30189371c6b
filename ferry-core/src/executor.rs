use crate::{BulkCopyRequest, Cursor, Result, RowsAffected, SqlWriter};
use std::future::{self, Future};

/// A database provider: its name and its SQL dialect.
pub trait Driver: Send + Sync {
    type SqlWriter: SqlWriter;

    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;
}

/// A live connection able to run statements and bulk loads.
///
/// The asynchronous variants default to their synchronous counterparts, providers with
/// a native asynchronous client override them.
pub trait Executor: Send + Sized {
    type Driver: Driver;
    type Cursor: Cursor + 'static;

    fn driver(&self) -> &Self::Driver;

    /// Run a statement returning rows.
    fn query(&mut self, sql: &str) -> Result<Self::Cursor>;

    fn query_async(&mut self, sql: &str) -> impl Future<Output = Result<Self::Cursor>> + Send {
        future::ready(self.query(sql))
    }

    /// Run a statement returning no rows.
    fn execute(&mut self, sql: &str) -> Result<RowsAffected>;

    fn execute_async(&mut self, sql: &str) -> impl Future<Output = Result<RowsAffected>> + Send {
        future::ready(self.execute(sql))
    }

    /// Native bulk load of every remaining row of `source`, returns the number of rows copied.
    fn bulk_copy<C: Cursor>(&mut self, source: &mut C, request: &BulkCopyRequest) -> Result<u64>;

    fn bulk_copy_async<C: Cursor>(
        &mut self,
        source: &mut C,
        request: &BulkCopyRequest,
    ) -> impl Future<Output = Result<u64>> + Send {
        future::ready(self.bulk_copy(source, request))
    }

    fn close(&mut self) -> Result<()>;
}
