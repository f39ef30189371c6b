use ferry_core::{ColumnSchema, Cursor, MappingError, Result, Row, Value, check_ordinal};
use std::{collections::VecDeque, fmt};

/// Cursor over rows held in memory, returned by [`MemoryConnection`](crate::MemoryConnection)
/// queries and usable on its own as a bulk load source.
pub struct MemoryCursor {
    schema: Box<[ColumnSchema]>,
    rows: VecDeque<Row>,
    current: Option<Row>,
    closed: bool,
}

impl MemoryCursor {
    pub fn new(
        schema: impl Into<Box<[ColumnSchema]>>,
        rows: impl IntoIterator<Item = Row>,
    ) -> Self {
        Self {
            schema: schema.into(),
            rows: rows.into_iter().collect(),
            current: None,
            closed: false,
        }
    }

    /// Nullable columns typed after the first non null cell found in each of them.
    pub fn with_columns<N: Into<String>>(
        names: impl IntoIterator<Item = N>,
        rows: impl IntoIterator<Item = Row>,
    ) -> Self {
        let rows = rows.into_iter().collect::<VecDeque<_>>();
        let schema = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let value = rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .find(|v| !v.is_null())
                    .map(Value::as_null)
                    .unwrap_or_default();
                ColumnSchema::new(name, value, true)
            })
            .collect::<Box<[_]>>();
        Self {
            schema,
            rows,
            current: None,
            closed: false,
        }
    }

    /// Rows not yet reached.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl Cursor for MemoryCursor {
    fn column_count(&self) -> usize {
        self.schema.len()
    }

    fn column_name(&self, ordinal: usize) -> Result<&str> {
        check_ordinal(ordinal, self.schema.len())?;
        Ok(&self.schema[ordinal].name)
    }

    fn column_type(&self, ordinal: usize) -> Result<Value> {
        check_ordinal(ordinal, self.schema.len())?;
        Ok(self.schema[ordinal].value.as_null())
    }

    fn column_nullable(&self, ordinal: usize) -> Result<bool> {
        check_ordinal(ordinal, self.schema.len())?;
        Ok(self.schema[ordinal].nullable)
    }

    fn schema(&self) -> Option<Box<[ColumnSchema]>> {
        Some(self.schema.clone())
    }

    fn has_rows(&self) -> Option<bool> {
        Some(!self.closed && (self.current.is_some() || !self.rows.is_empty()))
    }

    fn read(&mut self) -> Result<bool> {
        if self.closed {
            return Ok(false);
        }
        self.current = self.rows.pop_front();
        Ok(self.current.is_some())
    }

    fn get_value(&self, ordinal: usize) -> Result<Value> {
        if self.closed {
            return Err(MappingError::ReaderClosed.into());
        }
        check_ordinal(ordinal, self.schema.len())?;
        let Some(row) = &self.current else {
            return Err(MappingError::NoCurrentRow.into());
        };
        Ok(row.get(ordinal).cloned().unwrap_or_default())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.rows.clear();
        self.current = None;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl fmt::Debug for MemoryCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCursor")
            .field("schema", &self.schema)
            .field("remaining", &self.rows.len())
            .field("closed", &self.closed)
            .finish()
    }
}
