use ferry_core::{AsValue, ColumnSchema, Error, Result, Value, consume_while, truncate_long};

/// The statements understood by the in memory provider.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select {
        table: String,
        /// `None` for `*`.
        columns: Option<Vec<String>>,
        top: Option<u32>,
    },
    CreateTable {
        table: String,
        columns: Vec<ColumnSchema>,
        if_not_exists: bool,
    },
    DropTable {
        table: String,
        if_exists: bool,
    },
}

impl Statement {
    pub fn parse(sql: &str) -> Result<Statement> {
        let mut input = sql;
        let result = if keyword(&mut input, "SELECT") {
            parse_select(&mut input)?
        } else if keyword(&mut input, "IF") {
            expect_keyword(&mut input, "OBJECT_ID")?;
            expect(&mut input, '(')?;
            string_literal(&mut input)?;
            expect(&mut input, ',')?;
            string_literal(&mut input)?;
            expect(&mut input, ')')?;
            expect_keyword(&mut input, "IS")?;
            expect_keyword(&mut input, "NULL")?;
            expect_keyword(&mut input, "CREATE")?;
            parse_create_table(&mut input, true)?
        } else if keyword(&mut input, "CREATE") {
            parse_create_table(&mut input, false)?
        } else if keyword(&mut input, "DROP") {
            expect_keyword(&mut input, "TABLE")?;
            let if_exists = keyword(&mut input, "IF");
            if if_exists {
                expect_keyword(&mut input, "EXISTS")?;
            }
            Statement::DropTable {
                table: table_name(&mut input)?,
                if_exists,
            }
        } else {
            return Err(unexpected(input, "a statement"));
        };
        punct(&mut input, ';');
        if !input.trim().is_empty() {
            return Err(unexpected(input, "the end of the statement"));
        }
        Ok(result)
    }
}

fn parse_select(input: &mut &str) -> Result<Statement> {
    let top = if keyword(input, "TOP") {
        skip_whitespace(input);
        Some(u32::extract(input)?)
    } else {
        None
    };
    let columns = if punct(input, '*') {
        None
    } else {
        let mut columns = vec![identifier(input)?];
        while punct(input, ',') {
            columns.push(identifier(input)?);
        }
        Some(columns)
    };
    expect_keyword(input, "FROM")?;
    Ok(Statement::Select {
        table: table_name(input)?,
        columns,
        top,
    })
}

fn parse_create_table(input: &mut &str, if_not_exists: bool) -> Result<Statement> {
    expect_keyword(input, "TABLE")?;
    let table = table_name(input)?;
    expect(input, '(')?;
    let mut columns = Vec::new();
    loop {
        let name = identifier(input)?;
        skip_whitespace(input);
        let type_name = consume_while(input, |v| v.is_alphanumeric() || *v == '_');
        let mut arguments = Vec::new();
        if punct(input, '(') {
            loop {
                skip_whitespace(input);
                arguments.push(if keyword(input, "MAX") {
                    None
                } else {
                    Some(u32::extract(input)?)
                });
                if !punct(input, ',') {
                    break;
                }
            }
            expect(input, ')')?;
        }
        let mut column = column_schema(name, type_name, &arguments)?;
        if keyword(input, "NOT") {
            expect_keyword(input, "NULL")?;
            column.nullable = false;
        } else {
            keyword(input, "NULL");
        }
        columns.push(column);
        if punct(input, ')') {
            break;
        }
        expect(input, ',')?;
    }
    Ok(Statement::CreateTable {
        table,
        columns,
        if_not_exists,
    })
}

/// Maps a column type back to its value prototype.
fn column_schema(name: String, type_name: &str, arguments: &[Option<u32>]) -> Result<ColumnSchema> {
    let value = match type_name.to_ascii_lowercase().as_str() {
        "bit" => Value::Boolean(None),
        "tinyint" => Value::UInt8(None),
        "smallint" => Value::Int16(None),
        "int" => Value::Int32(None),
        "bigint" => Value::Int64(None),
        "real" => Value::Float32(None),
        "float" => Value::Float64(None),
        "decimal" | "numeric" => {
            let precision = arguments.first().copied().flatten().unwrap_or(18);
            let scale = arguments.get(1).copied().flatten().unwrap_or(0);
            Value::Decimal(None, precision.min(38) as u8, scale.min(38) as u8)
        }
        "nvarchar" | "varchar" | "nchar" | "char" | "text" | "ntext" => Value::Varchar(None),
        "varbinary" | "binary" => Value::Blob(None),
        "date" => Value::Date(None),
        "time" => Value::Time(None),
        "datetime" | "datetime2" => Value::Timestamp(None),
        "datetimeoffset" => Value::TimestampWithTimezone(None),
        "uniqueidentifier" => Value::Uuid(None),
        _ => {
            return Err(Error::msg(format!(
                "Unknown type `{type_name}` for column `{name}`"
            )));
        }
    };
    let mut result = ColumnSchema::new(name, value, true);
    if matches!(result.value, Value::Varchar(..) | Value::Blob(..)) {
        result.max_length = arguments.first().copied().flatten();
    }
    Ok(result)
}

fn skip_whitespace(input: &mut &str) {
    *input = input.trim_start();
}

fn unexpected(input: &str, expected: &str) -> Error {
    Error::msg(format!(
        "Expected {expected} but found `{}`",
        truncate_long!(input.trim_start())
    ))
}

/// Consume `word` (case insensitive) when it is the next token.
fn keyword(input: &mut &str, word: &str) -> bool {
    skip_whitespace(input);
    let mut value = *input;
    let token = consume_while(&mut value, |v| v.is_alphanumeric() || *v == '_');
    if token.eq_ignore_ascii_case(word) {
        *input = value;
        true
    } else {
        false
    }
}

fn expect_keyword(input: &mut &str, word: &str) -> Result<()> {
    if !keyword(input, word) {
        return Err(unexpected(input, word));
    }
    Ok(())
}

fn punct(input: &mut &str, c: char) -> bool {
    skip_whitespace(input);
    match input.strip_prefix(c) {
        Some(rest) => {
            *input = rest;
            true
        }
        None => false,
    }
}

fn expect(input: &mut &str, c: char) -> Result<()> {
    if !punct(input, c) {
        return Err(unexpected(input, &format!("`{c}`")));
    }
    Ok(())
}

/// Quoted (`[name]`) or bare identifier.
fn identifier(input: &mut &str) -> Result<String> {
    skip_whitespace(input);
    if let Some(rest) = input.strip_prefix('[') {
        let mut result = String::new();
        let mut chars = rest.char_indices();
        while let Some((i, c)) = chars.next() {
            if c == ']' {
                if rest[i + 1..].starts_with(']') {
                    chars.next();
                } else {
                    *input = &rest[i + 1..];
                    return Ok(result);
                }
            }
            result.push(c);
        }
        return Err(unexpected(input, "`]`"));
    }
    let result = consume_while(input, |v| v.is_alphanumeric() || *v == '_');
    if result.is_empty() {
        return Err(unexpected(input, "an identifier"));
    }
    Ok(result.to_string())
}

fn table_name(input: &mut &str) -> Result<String> {
    let mut result = identifier(input)?;
    while input.starts_with('.') {
        *input = &input[1..];
        result.push('.');
        result.push_str(&identifier(input)?);
    }
    Ok(result)
}

/// String literal (`N'text'` or `'text'`).
fn string_literal(input: &mut &str) -> Result<String> {
    skip_whitespace(input);
    let Some(rest) = input
        .strip_prefix("N'")
        .or_else(|| input.strip_prefix('\''))
    else {
        return Err(unexpected(input, "a string"));
    };
    let mut result = String::new();
    let mut chars = rest.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\'' {
            if rest[i + 1..].starts_with('\'') {
                chars.next();
            } else {
                *input = &rest[i + 1..];
                return Ok(result);
            }
        }
        result.push(c);
    }
    Err(unexpected(input, "`'`"))
}
