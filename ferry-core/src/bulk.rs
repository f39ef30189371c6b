use crate::{
    BulkCopyOptions, ColumnSchema, CopyFlags, Cursor, Defaults, Driver, EffectiveBulkCopy, Error,
    Executor, FieldSelector, Record, RecordReader, Result, SqlWriter, reconcile,
    stream::Stream,
};
use std::time::Duration;

/// Everything a provider needs to run its native bulk load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkCopyRequest {
    pub table: String,
    /// `(source_column, destination_column)` pairs.
    pub mapping: Vec<(String, String)>,
    /// Zero leaves the batch size to the provider.
    pub batch_size: u32,
    pub timeout: Duration,
    pub streaming: bool,
    pub flags: CopyFlags,
}

/// Moves the rows of a cursor into a table through the provider bulk load.
#[derive(Debug, Default, Clone)]
pub struct BulkTransfer {
    options: EffectiveBulkCopy,
}

impl BulkTransfer {
    pub fn new(options: EffectiveBulkCopy) -> Self {
        Self { options }
    }

    pub fn with_options(options: &BulkCopyOptions, defaults: &Defaults) -> Self {
        Self::new(options.resolve(defaults))
    }

    pub fn options(&self) -> &EffectiveBulkCopy {
        &self.options
    }

    /// Source and destination columns are known to be the same, no probe needed.
    fn positional(&self) -> bool {
        self.options.selector == FieldSelector::Source && !self.options.case_sensitive
    }

    fn source_columns(&self, cursor: &impl Cursor) -> Result<Vec<String>> {
        match &self.options.columns {
            Some(columns) => Ok(columns.clone()),
            None => Ok(cursor.column_names()?.to_vec()),
        }
    }

    fn create_table_sql(
        &self,
        writer: &impl SqlWriter,
        cursor: &impl Cursor,
        table: &str,
        columns: &[String],
    ) -> Result<String> {
        let native = cursor.schema();
        let schema = columns
            .iter()
            .map(|name| {
                if let Some(column) = native
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .find(|v| v.name.eq_ignore_ascii_case(name))
                {
                    return Ok(ColumnSchema {
                        name: name.clone(),
                        ..column.clone()
                    });
                }
                let Some(ordinal) = cursor.ordinal(name) else {
                    return Err(Error::msg(format!(
                        "Column `{name}` does not exist in the source"
                    )));
                };
                Ok(ColumnSchema::new(
                    name.clone(),
                    cursor.column_type(ordinal)?,
                    cursor.column_nullable(ordinal)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        let mut sql = String::new();
        writer.write_create_table(&mut sql, table, &schema, self.options.if_not_exists)?;
        Ok(sql)
    }

    fn probe_sql(&self, writer: &impl SqlWriter, table: &str) -> String {
        let mut sql = String::new();
        writer.write_schema_probe(&mut sql, table);
        sql
    }

    fn mapping(&self, columns: &[String], destination: &[String]) -> Result<Vec<(String, String)>> {
        Ok(reconcile(
            self.options.selector,
            columns,
            destination,
            self.options.case_sensitive,
        )?
        .matched)
    }

    fn request(&self, table: &str, mapping: Vec<(String, String)>) -> BulkCopyRequest {
        BulkCopyRequest {
            table: table.to_string(),
            mapping,
            batch_size: self.options.batch_size,
            timeout: self.options.timeout,
            streaming: self.options.streaming,
            flags: self.options.flags,
        }
    }

    /// Copy every remaining row of `cursor` into `table`, returns the rows copied.
    pub fn transfer<E: Executor>(
        &self,
        executor: &mut E,
        cursor: &mut impl Cursor,
        table: &str,
    ) -> Result<u64> {
        let columns = self.source_columns(cursor)?;
        let writer = executor.driver().sql_writer();
        if self.options.create_table {
            let sql = self.create_table_sql(&writer, cursor, table, &columns)?;
            executor.execute(&sql)?;
        }
        cursor.look_ahead()?;
        if cursor.has_rows() == Some(false) {
            log::debug!("The source is empty, nothing to copy into {table}");
            return Ok(0);
        }
        let mapping = if self.positional() {
            columns.iter().map(|v| (v.clone(), v.clone())).collect()
        } else {
            let mut probe = executor.query(&self.probe_sql(&writer, table))?;
            let destination = probe.column_names()?;
            probe.close()?;
            self.mapping(&columns, &destination)?
        };
        if mapping.is_empty() {
            log::debug!("No column of the source maps into {table}, nothing to copy");
            return Ok(0);
        }
        log::debug!(
            "Bulk copy of {} columns into {table} ({})",
            mapping.len(),
            <E::Driver as Driver>::NAME
        );
        executor
            .bulk_copy(cursor, &self.request(table, mapping))
            .inspect_err(|e| log::error!("{:#}", e))
    }

    /// Asynchronous [`BulkTransfer::transfer`].
    pub async fn transfer_async<E: Executor>(
        &self,
        executor: &mut E,
        cursor: &mut impl Cursor,
        table: &str,
    ) -> Result<u64> {
        let columns = self.source_columns(cursor)?;
        let (create, probe) = {
            let writer = executor.driver().sql_writer();
            let create = if self.options.create_table {
                Some(self.create_table_sql(&writer, cursor, table, &columns)?)
            } else {
                None
            };
            (create, self.probe_sql(&writer, table))
        };
        if let Some(sql) = create {
            executor.execute_async(&sql).await?;
        }
        cursor.look_ahead_async().await?;
        if cursor.has_rows() == Some(false) {
            log::debug!("The source is empty, nothing to copy into {table}");
            return Ok(0);
        }
        let mapping = if self.positional() {
            columns.iter().map(|v| (v.clone(), v.clone())).collect()
        } else {
            let mut probe = executor.query_async(&probe).await?;
            let destination = probe.column_names()?;
            probe.close()?;
            self.mapping(&columns, &destination)?
        };
        if mapping.is_empty() {
            log::debug!("No column of the source maps into {table}, nothing to copy");
            return Ok(0);
        }
        log::debug!(
            "Bulk copy of {} columns into {table} ({})",
            mapping.len(),
            <E::Driver as Driver>::NAME
        );
        executor
            .bulk_copy_async(cursor, &self.request(table, mapping))
            .await
            .inspect_err(|e| log::error!("{:#}", e))
    }
}

/// Bulk load `items` into the table of `T`.
pub fn write_records<E, T, I>(
    executor: &mut E,
    items: I,
    options: &BulkCopyOptions,
    defaults: &Defaults,
) -> Result<u64>
where
    E: Executor,
    T: Record,
    I: IntoIterator<Item = T>,
    I::IntoIter: Send + 'static,
{
    let mut reader = RecordReader::of(items);
    let result = BulkTransfer::with_options(options, defaults).transfer(
        executor,
        &mut reader,
        T::table_name(),
    );
    reader.close()?;
    result
}

/// Bulk load a stream of records into the table of `T`.
pub async fn write_records_async<E, T>(
    executor: &mut E,
    items: impl Stream<Item = T> + Send + 'static,
    options: &BulkCopyOptions,
    defaults: &Defaults,
) -> Result<u64>
where
    E: Executor,
    T: Record,
{
    let mut reader = RecordReader::from_stream(items, T::catalog(Default::default()));
    let result = BulkTransfer::with_options(options, defaults)
        .transfer_async(executor, &mut reader, T::table_name())
        .await;
    reader.close()?;
    result
}
