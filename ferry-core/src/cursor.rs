use crate::{AsValue, MappingError, Result, Row, RowLabeled, RowNames, Value, fold_name};
use rust_decimal::Decimal;
use std::future::{self, Future};
use time::PrimitiveDateTime;
use uuid::Uuid;

/// Column as seen by a projection plan: position in the cursor and its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub ordinal: usize,
    pub name: String,
}

/// Native schema metadata of a column, exposed by cursors that know it.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    pub name: String,
    /// Type prototype.
    pub value: Value,
    pub nullable: bool,
    pub max_length: Option<u32>,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, value: Value, nullable: bool) -> Self {
        let (precision, scale) = match value {
            Value::Decimal(.., precision, scale) if precision > 0 => (Some(precision), Some(scale)),
            _ => (None, None),
        };
        Self {
            name: name.into(),
            value,
            nullable,
            max_length: None,
            precision,
            scale,
        }
    }
}

/// Forward only, row at a time access to a tabular result.
///
/// Provider cursors and [`RecordReader`](crate::RecordReader) implement it alike, so the
/// projection compiler and the bulk coordinator never distinguish between the two.
/// Cell access refers to the row reached by the last successful [`Cursor::read`].
pub trait Cursor: Send {
    fn column_count(&self) -> usize;

    fn column_name(&self, ordinal: usize) -> Result<&str>;

    /// Case insensitive lookup of a column position.
    fn ordinal(&self, name: &str) -> Option<usize> {
        let name = fold_name(name, false);
        (0..self.column_count())
            .find(|i| self.column_name(*i).is_ok_and(|v| fold_name(v, false) == name))
    }

    /// Declared type prototype of the column.
    fn column_type(&self, ordinal: usize) -> Result<Value>;

    fn column_type_name(&self, ordinal: usize) -> Result<&'static str> {
        Ok(self.column_type(ordinal)?.type_name())
    }

    /// Whether the column accepts null, assumed when the provider cannot tell.
    fn column_nullable(&self, ordinal: usize) -> Result<bool> {
        check_ordinal(ordinal, self.column_count())?;
        Ok(true)
    }

    fn columns(&self) -> Result<Vec<ColumnDescriptor>> {
        (0..self.column_count())
            .map(|ordinal| {
                Ok(ColumnDescriptor {
                    ordinal,
                    name: self.column_name(ordinal)?.to_string(),
                })
            })
            .collect()
    }

    fn column_names(&self) -> Result<RowNames> {
        (0..self.column_count())
            .map(|i| self.column_name(i).map(ToString::to_string))
            .collect()
    }

    /// Native schema metadata, `None` when the provider has none.
    fn schema(&self) -> Option<Box<[ColumnSchema]>> {
        None
    }

    /// Whether the cursor is known to produce at least one row, `None` when unknown.
    fn has_rows(&self) -> Option<bool> {
        None
    }

    /// Buffer the next row if that makes [`Cursor::has_rows`] exact, the row is still
    /// returned by the following [`Cursor::read`]. Does nothing by default.
    fn look_ahead(&mut self) -> Result<()> {
        Ok(())
    }

    fn look_ahead_async(&mut self) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.look_ahead())
    }

    /// Advance to the next row, `false` once exhausted or closed.
    fn read(&mut self) -> Result<bool>;

    fn read_async(&mut self) -> impl Future<Output = Result<bool>> + Send {
        future::ready(self.read())
    }

    fn is_null(&self, ordinal: usize) -> Result<bool> {
        Ok(self.get_value(ordinal)?.is_null())
    }

    fn get_value(&self, ordinal: usize) -> Result<Value>;

    fn get<T: AsValue>(&self, ordinal: usize) -> Result<T>
    where
        Self: Sized,
    {
        T::try_from_value(self.get_value(ordinal)?)
    }

    fn get_bool(&self, ordinal: usize) -> Result<bool>
    where
        Self: Sized,
    {
        self.get(ordinal)
    }
    fn get_i16(&self, ordinal: usize) -> Result<i16>
    where
        Self: Sized,
    {
        self.get(ordinal)
    }
    fn get_i32(&self, ordinal: usize) -> Result<i32>
    where
        Self: Sized,
    {
        self.get(ordinal)
    }
    fn get_i64(&self, ordinal: usize) -> Result<i64>
    where
        Self: Sized,
    {
        self.get(ordinal)
    }
    fn get_f32(&self, ordinal: usize) -> Result<f32>
    where
        Self: Sized,
    {
        self.get(ordinal)
    }
    fn get_f64(&self, ordinal: usize) -> Result<f64>
    where
        Self: Sized,
    {
        self.get(ordinal)
    }
    fn get_decimal(&self, ordinal: usize) -> Result<Decimal>
    where
        Self: Sized,
    {
        self.get(ordinal)
    }
    fn get_string(&self, ordinal: usize) -> Result<String>
    where
        Self: Sized,
    {
        self.get(ordinal)
    }
    fn get_uuid(&self, ordinal: usize) -> Result<Uuid>
    where
        Self: Sized,
    {
        self.get(ordinal)
    }
    fn get_timestamp(&self, ordinal: usize) -> Result<PrimitiveDateTime>
    where
        Self: Sized,
    {
        self.get(ordinal)
    }

    /// Copy the current row into `buffer`, returns the number of cells written.
    fn get_values(&self, buffer: &mut [Value]) -> Result<usize> {
        let count = buffer.len().min(self.column_count());
        for (ordinal, slot) in buffer.iter_mut().take(count).enumerate() {
            *slot = self.get_value(ordinal)?;
        }
        Ok(count)
    }

    /// Release the cursor, calling it again has no effect.
    fn close(&mut self) -> Result<()>;

    fn is_closed(&self) -> bool;
}

/// Fresh value array with one slot per column, no mapping involved.
pub fn read_row(cursor: &impl Cursor) -> Result<Row> {
    let mut row: Row = vec![Value::Null; cursor.column_count()].into_boxed_slice();
    cursor.get_values(&mut row)?;
    Ok(row)
}

/// The current row together with the column names.
pub fn read_row_labeled(cursor: &impl Cursor, labels: &RowNames) -> Result<RowLabeled> {
    Ok(RowLabeled::new(labels.clone(), read_row(cursor)?))
}

/// Fail with [`MappingError::ColumnOutOfRange`] unless `ordinal < count`.
pub fn check_ordinal(ordinal: usize, count: usize) -> Result<()> {
    if ordinal >= count {
        return Err(MappingError::ColumnOutOfRange { ordinal, count }.into());
    }
    Ok(())
}
