use crate::{ColumnSchema, Error, Result, Value, separated_by};
use std::fmt::{self, Display, Write};

/// Column type of the dialect, as used by `CREATE TABLE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlType {
    pub name: &'static str,
    pub length: Option<SqlLength>,
    /// Precision and scale.
    pub precision: Option<(u8, u8)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlLength {
    Max,
    Fixed(u32),
}

impl SqlType {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            length: None,
            precision: None,
        }
    }
    pub const fn with_length(mut self, length: SqlLength) -> Self {
        self.length = Some(length);
        self
    }
    pub const fn with_precision(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some((precision, scale));
        self
    }
}

impl Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)?;
        match (self.length, self.precision) {
            (Some(SqlLength::Max), _) => f.write_str("(max)"),
            (Some(SqlLength::Fixed(len)), _) => write!(f, "({len})"),
            (None, Some((precision, scale))) => write!(f, "({precision},{scale})"),
            (None, None) => Ok(()),
        }
    }
}

/// Longest `nvarchar` before switching to `nvarchar(max)`.
pub const NVARCHAR_MAX_LENGTH: u32 = 4000;

/// Dialect printer for the few statements the mapping core issues itself.
pub trait SqlWriter {
    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    /// Quote identifiers ([name]) doubling inner closing brackets.
    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('[');
        self.write_escaped(out, value, ']', "]]");
        out.push(']');
    }

    /// Unicode string literal (N'text') doubling inner quotes.
    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push_str("N'");
        self.write_escaped(out, value, '\'', "''");
        out.push('\'');
    }

    /// Dotted table name, each part quoted unless it already is.
    fn write_table_ref(&self, out: &mut String, table: &str) {
        separated_by(
            out,
            table.split('.'),
            |out, part| {
                if part.starts_with('[') && part.ends_with(']') && part.len() > 1 {
                    out.push_str(part);
                } else {
                    self.write_identifier_quoted(out, part);
                }
            },
            ".",
        );
    }

    /// Static type table for a `Value` prototype, `None` when it has no column type.
    fn column_type(&self, value: &Value) -> Option<SqlType> {
        Some(match value {
            Value::Boolean(..) => SqlType::new("bit"),
            Value::Int8(..) => SqlType::new("smallint"),
            Value::Int16(..) => SqlType::new("smallint"),
            Value::Int32(..) => SqlType::new("int"),
            Value::Int64(..) => SqlType::new("bigint"),
            Value::UInt8(..) => SqlType::new("tinyint"),
            Value::UInt16(..) => SqlType::new("int"),
            Value::UInt32(..) => SqlType::new("bigint"),
            Value::UInt64(..) => SqlType::new("decimal").with_precision(20, 0),
            Value::Float32(..) => SqlType::new("real"),
            Value::Float64(..) => SqlType::new("float"),
            Value::Decimal(.., precision, scale) if *precision > 0 => {
                SqlType::new("decimal").with_precision(*precision, *scale)
            }
            Value::Decimal(..) => SqlType::new("decimal").with_precision(18, 4),
            Value::Varchar(..) => SqlType::new("nvarchar").with_length(SqlLength::Max),
            Value::Blob(..) => SqlType::new("varbinary").with_length(SqlLength::Max),
            Value::Date(..) => SqlType::new("date"),
            Value::Time(..) => SqlType::new("time"),
            Value::Timestamp(..) => SqlType::new("datetime2"),
            Value::TimestampWithTimezone(..) => SqlType::new("datetimeoffset"),
            Value::Uuid(..) => SqlType::new("uniqueidentifier"),
            Value::Null | Value::List(..) => return None,
        })
    }

    /// Column type, narrowed by the native metadata in `column` when present.
    fn schema_column_type(&self, column: &ColumnSchema) -> Option<SqlType> {
        let mut result = self.column_type(&column.value)?;
        if let (Some(precision), Some(scale)) = (column.precision, column.scale) {
            if result.precision.is_some() {
                result.precision = Some((precision, scale));
            }
        }
        if let Some(len) = column.max_length {
            if result.length.is_some()
                && (result.name != "nvarchar" || len <= NVARCHAR_MAX_LENGTH)
            {
                result.length = Some(SqlLength::Fixed(len));
            }
        }
        Some(result)
    }

    fn write_column_type(&self, out: &mut String, column: &ColumnSchema) -> Result<()> {
        let Some(sql_type) = self.schema_column_type(column) else {
            return Err(Error::msg(format!(
                "Column `{}` of type {} has no SQL type",
                column.name,
                column.value.type_name()
            )));
        };
        let _ = write!(out, "{sql_type}");
        Ok(())
    }

    fn write_create_table(
        &self,
        out: &mut String,
        table: &str,
        columns: &[ColumnSchema],
        if_not_exists: bool,
    ) -> Result<()> {
        out.reserve(64 + columns.len() * 48);
        if !out.is_empty() {
            out.push('\n');
        }
        if if_not_exists {
            let mut name = String::with_capacity(table.len() + 4);
            self.write_table_ref(&mut name, table);
            out.push_str("IF OBJECT_ID(");
            self.write_value_string(out, &name);
            out.push_str(", N'U') IS NULL\n");
        }
        out.push_str("CREATE TABLE ");
        self.write_table_ref(out, table);
        out.push_str(" (\n");
        let mut result = Ok(());
        separated_by(
            out,
            columns,
            |out, column| {
                self.write_identifier_quoted(out, &column.name);
                out.push(' ');
                if let Err(e) = self.write_column_type(out, column) {
                    result = Err(e);
                }
                out.push_str(if column.nullable { " NULL" } else { " NOT NULL" });
            },
            ",\n",
        );
        out.push_str("\n);");
        result
    }

    /// Zero row query exposing the column names of `table`.
    fn write_schema_probe(&self, out: &mut String, table: &str) {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("SELECT TOP 0 * FROM ");
        self.write_table_ref(out, table);
        out.push(';');
    }
}
