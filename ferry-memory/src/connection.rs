use crate::{MemoryCursor, MemoryDriver, Statement};
use ferry_core::{
    BulkCopyRequest, ColumnSchema, Context, Cursor, Error, Executor, Result, Row, RowsAffected,
    truncate_long,
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// A request received by a [`MemoryConnection`], in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Query(String),
    Execute(String),
    BulkCopy(BulkCopyRequest),
    Close,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<ColumnSchema>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Default)]
struct Database {
    tables: HashMap<String, Table>,
    calls: Vec<Call>,
}

/// Lookup key of a table: unquoted parts, lowercase.
fn table_key(name: &str) -> String {
    name.split('.')
        .map(|part| {
            part.strip_prefix('[')
                .and_then(|v| v.strip_suffix(']'))
                .unwrap_or(part)
                .to_lowercase()
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Source ordinal and destination index of each mapped column.
struct BulkPlan {
    table: String,
    columns: Vec<ColumnSchema>,
    pairs: Vec<(usize, usize)>,
}

/// Connection to a process local database, clones share the same tables.
#[derive(Debug, Clone)]
pub struct MemoryConnection {
    database: Arc<Mutex<Database>>,
    closed: bool,
}

impl MemoryConnection {
    pub fn connect(url: &str) -> Result<MemoryConnection> {
        let prefix = format!("{}://", <MemoryDriver as ferry_core::Driver>::NAME);
        if !url.starts_with(&prefix) {
            let error = Error::msg(format!(
                "Memory connection url must start with `{prefix}`, found `{url}`"
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(Self {
            database: Default::default(),
            closed: false,
        })
    }

    fn database(&self) -> Result<MutexGuard<'_, Database>> {
        if self.closed {
            return Err(Error::msg("The connection is closed"));
        }
        Ok(self.database.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Every request received so far, by this connection and its clones.
    pub fn calls(&self) -> Vec<Call> {
        self.database
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
            .clone()
    }

    pub fn clear_calls(&self) {
        self.database
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
            .clear();
    }

    /// Copy of the table named `name`, if it exists.
    pub fn table(&self, name: &str) -> Option<Table> {
        self.database
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tables
            .get(&table_key(name))
            .cloned()
    }

    fn run_query(&mut self, sql: &str) -> Result<MemoryCursor> {
        let mut database = self.database()?;
        database.calls.push(Call::Query(sql.to_string()));
        let Statement::Select {
            table,
            columns,
            top,
        } = Statement::parse(sql)?
        else {
            return Err(Error::msg(format!(
                "Query expects a SELECT statement, found `{}`",
                truncate_long!(sql)
            )));
        };
        let Some(table) = database.tables.get(&table_key(&table)) else {
            return Err(Error::msg(format!("Table `{table}` does not exist")));
        };
        let indexes = match columns {
            Some(columns) => columns
                .iter()
                .map(|name| {
                    table
                        .columns
                        .iter()
                        .position(|v| v.name.eq_ignore_ascii_case(name))
                        .ok_or_else(|| Error::msg(format!("Column `{name}` does not exist")))
                })
                .collect::<Result<Vec<_>>>()?,
            None => (0..table.columns.len()).collect(),
        };
        let schema = indexes
            .iter()
            .map(|i| table.columns[*i].clone())
            .collect::<Vec<_>>();
        let limit = top.map(|v| v as usize).unwrap_or(usize::MAX);
        let rows = table
            .rows
            .iter()
            .take(limit)
            .map(|row| indexes.iter().map(|i| row[*i].clone()).collect::<Row>())
            .collect::<Vec<_>>();
        Ok(MemoryCursor::new(schema, rows))
    }

    fn run_execute(&mut self, sql: &str) -> Result<RowsAffected> {
        let mut database = self.database()?;
        database.calls.push(Call::Execute(sql.to_string()));
        match Statement::parse(sql)? {
            Statement::CreateTable {
                table,
                columns,
                if_not_exists,
            } => {
                let key = table_key(&table);
                if database.tables.contains_key(&key) {
                    if if_not_exists {
                        return Ok(Default::default());
                    }
                    return Err(Error::msg(format!("Table `{table}` already exists")));
                }
                log::debug!("Created table {table} with {} columns", columns.len());
                database.tables.insert(
                    key,
                    Table {
                        columns,
                        rows: Vec::new(),
                    },
                );
                Ok(Default::default())
            }
            Statement::DropTable { table, if_exists } => {
                let removed = database.tables.remove(&table_key(&table));
                if removed.is_none() && !if_exists {
                    return Err(Error::msg(format!("Table `{table}` does not exist")));
                }
                Ok(Default::default())
            }
            Statement::Select { .. } => Err(Error::msg(
                "Execute expects a statement returning no rows, use query for SELECT",
            )),
        }
    }

    fn bulk_plan(&mut self, source: &impl Cursor, request: &BulkCopyRequest) -> Result<BulkPlan> {
        let mut database = self.database()?;
        database.calls.push(Call::BulkCopy(request.clone()));
        let Some(table) = database.tables.get(&table_key(&request.table)) else {
            return Err(Error::msg(format!(
                "Table `{}` does not exist",
                request.table
            )));
        };
        let pairs = request
            .mapping
            .iter()
            .map(|(from, to)| {
                let Some(ordinal) = source.ordinal(from) else {
                    return Err(Error::msg(format!(
                        "Column `{from}` does not exist in the source"
                    )));
                };
                let Some(index) = table
                    .columns
                    .iter()
                    .position(|v| v.name.eq_ignore_ascii_case(to))
                else {
                    return Err(Error::msg(format!(
                        "Column `{to}` does not exist in `{}`",
                        request.table
                    )));
                };
                Ok((ordinal, index))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(BulkPlan {
            table: table_key(&request.table),
            columns: table.columns.clone(),
            pairs,
        })
    }

    fn bulk_row(plan: &BulkPlan, source: &impl Cursor) -> Result<Row> {
        let mut row = plan
            .columns
            .iter()
            .map(|v| v.value.as_null())
            .collect::<Row>();
        for (ordinal, index) in &plan.pairs {
            let column = &plan.columns[*index];
            row[*index] = source
                .get_value(*ordinal)?
                .coerce(&column.value)
                .with_context(|| format!("While copying into column `{}`", column.name))?;
        }
        if let Some(column) = plan
            .columns
            .iter()
            .zip(&row)
            .find_map(|(c, v)| (!c.nullable && v.is_null()).then_some(c))
        {
            return Err(Error::msg(format!(
                "Cannot insert null into column `{}`",
                column.name
            )));
        }
        Ok(row)
    }

    fn commit(&self, plan: &BulkPlan, rows: &mut Vec<Row>) -> Result<u64> {
        let count = rows.len();
        if count == 0 {
            return Ok(0);
        }
        let mut database = self.database()?;
        let Some(table) = database.tables.get_mut(&plan.table) else {
            return Err(Error::msg(format!("Table `{}` was dropped", plan.table)));
        };
        table.rows.append(rows);
        log::trace!("Committed {count} rows into {}", plan.table);
        Ok(count as u64)
    }

    fn batch_full(request: &BulkCopyRequest, pending: &[Row]) -> bool {
        request.batch_size > 0 && pending.len() >= request.batch_size as usize
    }
}

impl Executor for MemoryConnection {
    type Driver = MemoryDriver;
    type Cursor = MemoryCursor;

    fn driver(&self) -> &Self::Driver {
        &MemoryDriver
    }

    fn query(&mut self, sql: &str) -> Result<Self::Cursor> {
        self.run_query(sql).inspect_err(|e| log::error!("{:#}", e))
    }

    fn execute(&mut self, sql: &str) -> Result<RowsAffected> {
        self.run_execute(sql).inspect_err(|e| log::error!("{:#}", e))
    }

    /// Rows land in the table one batch at a time, a failure keeps the batches already
    /// committed.
    fn bulk_copy<C: Cursor>(&mut self, source: &mut C, request: &BulkCopyRequest) -> Result<u64> {
        let plan = self.bulk_plan(&*source, request)?;
        let mut pending = Vec::new();
        let mut total = 0;
        while source.read()? {
            pending.push(Self::bulk_row(&plan, &*source)?);
            if Self::batch_full(request, &pending) {
                total += self.commit(&plan, &mut pending)?;
            }
        }
        total += self.commit(&plan, &mut pending)?;
        Ok(total)
    }

    async fn bulk_copy_async<C: Cursor>(
        &mut self,
        source: &mut C,
        request: &BulkCopyRequest,
    ) -> Result<u64> {
        let plan = self.bulk_plan(&*source, request)?;
        let mut pending = Vec::new();
        let mut total = 0;
        while source.read_async().await? {
            pending.push(Self::bulk_row(&plan, &*source)?);
            if Self::batch_full(request, &pending) {
                total += self.commit(&plan, &mut pending)?;
            }
        }
        total += self.commit(&plan, &mut pending)?;
        Ok(total)
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.database()?.calls.push(Call::Close);
            self.closed = true;
        }
        Ok(())
    }
}
