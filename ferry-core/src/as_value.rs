use crate::{Error, Result, Value, consume_while, truncate_long};
use anyhow::Context;
use atoi::FromRadix10SignedChecked;
use fast_float::parse_partial;
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::{
    any,
    borrow::Cow,
    collections::{LinkedList, VecDeque},
    rc::Rc,
    sync::Arc,
};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::parse_borrowed};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// This is the single conversion path used by projection plans, record readers and
/// `Value::coerce`.
///
/// # Conversion contract
/// - `try_from_value` accepts the canonical variant of the type, the other numeric
///   widths (with range checks) and text, which is parsed through [`AsValue::parse`].
/// - A null value is only accepted by nullable wrappers (`Option<T>`).
/// - `parse` delegates to `extract` and then verifies the whole input was consumed,
///   so `123abc` is rejected as an integer.
///
/// # Examples
/// ```rust
/// use ferry_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The typed null of this type, also used as its type prototype.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
    /// Parse the whole input, delegates to [`AsValue::extract`].
    fn parse(input: impl AsRef<str>) -> Result<Self>
    where
        Self: Sized,
    {
        let mut value = input.as_ref();
        let result = Self::extract(&mut value)?;
        if !value.is_empty() {
            return Err(Error::msg(format!(
                "Value `{}` parsed correctly as {} but it did not consume all the input (remaining: `{}`)",
                truncate_long!(input.as_ref()),
                any::type_name::<Self>(),
                truncate_long!(value),
            )));
        }
        Ok(result)
    }
    /// Parse a prefix of the input, on success the slice is advanced past it.
    ///
    /// Returning an error must leave the slice untouched.
    fn extract(value: &mut &str) -> Result<Self>
    where
        Self: Sized,
    {
        Err(Error::msg(format!(
            "Cannot parse '{value}' as {}",
            any::type_name::<Self>()
        )))
    }
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

fn cannot_convert<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {value:?} to {}",
        any::type_name::<T>()
    ))
}

macro_rules! impl_as_value_integer {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                if let $destination(Some(v)) = value {
                    return Ok(v);
                }
                let wide: i128 = match value {
                    Value::Int8(Some(v)) => v as _,
                    Value::Int16(Some(v)) => v as _,
                    Value::Int32(Some(v)) => v as _,
                    Value::Int64(Some(v)) => v as _,
                    Value::UInt8(Some(v)) => v as _,
                    Value::UInt16(Some(v)) => v as _,
                    Value::UInt32(Some(v)) => v as _,
                    Value::UInt64(Some(v)) => v as _,
                    Value::Boolean(Some(v)) => v as _,
                    Value::Decimal(Some(v), ..) => {
                        let error = Error::msg(format!(
                            "Value {v}: Decimal does not fit into {}",
                            any::type_name::<Self>()
                        ));
                        if !v.is_integer() {
                            return Err(error.context("The value is not a integer"));
                        }
                        v.to_i128().ok_or(error)?
                    }
                    Value::Varchar(Some(ref v)) => return Self::parse(v.trim()),
                    _ => return Err(cannot_convert::<Self>(&value)),
                };
                <$source>::try_from(wide).map_err(|_| {
                    Error::msg(format!(
                        "Value {wide} is out of range for {}",
                        any::type_name::<Self>()
                    ))
                })
            }
            fn extract(input: &mut &str) -> Result<Self> {
                let (parsed, len) = i128::from_radix_10_signed_checked(input.as_bytes());
                if len == 0 {
                    return Err(Error::msg(format!(
                        "Cannot extract {} from `{}`",
                        any::type_name::<Self>(),
                        truncate_long!(input)
                    )));
                }
                let result = parsed
                    .and_then(|v| <$source>::try_from(v).ok())
                    .ok_or_else(|| {
                        Error::msg(format!(
                            "Value {} is out of range for {}",
                            &input[..len],
                            any::type_name::<Self>()
                        ))
                    })?;
                *input = &input[len..];
                Ok(result)
            }
        }
    };
}
impl_as_value_integer!(i8, Value::Int8);
impl_as_value_integer!(i16, Value::Int16);
impl_as_value_integer!(i32, Value::Int32);
impl_as_value_integer!(i64, Value::Int64);
impl_as_value_integer!(u8, Value::UInt8);
impl_as_value_integer!(u16, Value::UInt16);
impl_as_value_integer!(u32, Value::UInt32);
impl_as_value_integer!(u64, Value::UInt64);

macro_rules! impl_as_value {
    ($source:ty, $destination:path, $extract:expr $(, $pat_rest:pat => $expr_rest:expr)* $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self.into()))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v), ..) => Ok(v.into()),
                    $($pat_rest => $expr_rest,)*
                    #[allow(unreachable_patterns)]
                    Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v.trim()),
                    _ => Err(cannot_convert::<Self>(&value)),
                }
            }
            fn extract(value: &mut &str) -> Result<Self> {
                $extract(value)
            }
        }
    };
}
impl_as_value!(
    bool,
    Value::Boolean,
    |input: &mut &str| {
        let mut value = *input;
        let result = consume_while(&mut value, |v| v.is_alphanumeric() || *v == '_');
        let result = match result {
            x if x.eq_ignore_ascii_case("true") || x.eq_ignore_ascii_case("t") || x == "1" => true,
            x if x.eq_ignore_ascii_case("false") || x.eq_ignore_ascii_case("f") || x == "0" => {
                false
            }
            _ => return Err(Error::msg(format!("Cannot parse boolean from '{input}'"))),
        };
        *input = value;
        Ok(result)
    },
    Value::Int8(Some(v)) => Ok(v != 0),
    Value::Int16(Some(v)) => Ok(v != 0),
    Value::Int32(Some(v)) => Ok(v != 0),
    Value::Int64(Some(v)) => Ok(v != 0),
    Value::UInt8(Some(v)) => Ok(v != 0),
    Value::UInt16(Some(v)) => Ok(v != 0),
    Value::UInt32(Some(v)) => Ok(v != 0),
    Value::UInt64(Some(v)) => Ok(v != 0),
);

macro_rules! extract_float {
    ($input:expr) => {{
        let context = || {
            format!(
                "Cannot extract a floating point value from `{}`",
                truncate_long!($input)
            )
        };
        let (num, tail) = parse_partial(*$input).with_context(context)?;
        *$input = &$input[tail..];
        Ok(num)
    }};
}
impl_as_value!(
    f32,
    Value::Float32,
    |input: &mut &str| extract_float!(input),
    Value::Float64(Some(v)) => Ok(v as _),
    Value::Int8(Some(v)) => Ok(v as _),
    Value::Int16(Some(v)) => Ok(v as _),
    Value::UInt8(Some(v)) => Ok(v as _),
    Value::UInt16(Some(v)) => Ok(v as _),
    Value::Decimal(Some(v), ..) => v
        .to_f32()
        .ok_or_else(|| Error::msg(format!("Value {v}: Decimal does not fit into f32"))),
);
impl_as_value!(
    f64,
    Value::Float64,
    |input: &mut &str| extract_float!(input),
    Value::Float32(Some(v)) => Ok(v as _),
    Value::Int8(Some(v)) => Ok(v as _),
    Value::Int16(Some(v)) => Ok(v as _),
    Value::Int32(Some(v)) => Ok(v as _),
    Value::UInt8(Some(v)) => Ok(v as _),
    Value::UInt16(Some(v)) => Ok(v as _),
    Value::UInt32(Some(v)) => Ok(v as _),
    Value::Decimal(Some(v), ..) => v
        .to_f64()
        .ok_or_else(|| Error::msg(format!("Value {v}: Decimal does not fit into f64"))),
);

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(match value {
            Value::Varchar(Some(v)) => v,
            Value::Boolean(Some(v)) => v.to_string(),
            Value::Int8(Some(v)) => v.to_string(),
            Value::Int16(Some(v)) => v.to_string(),
            Value::Int32(Some(v)) => v.to_string(),
            Value::Int64(Some(v)) => v.to_string(),
            Value::UInt8(Some(v)) => v.to_string(),
            Value::UInt16(Some(v)) => v.to_string(),
            Value::UInt32(Some(v)) => v.to_string(),
            Value::UInt64(Some(v)) => v.to_string(),
            Value::Float32(Some(v)) => v.to_string(),
            Value::Float64(Some(v)) => v.to_string(),
            Value::Decimal(Some(v), ..) => v.to_string(),
            Value::Date(Some(v)) => v.to_string(),
            Value::Time(Some(v)) => v.to_string(),
            Value::Timestamp(Some(v)) => v.to_string(),
            Value::TimestampWithTimezone(Some(v)) => v.to_string(),
            Value::Uuid(Some(v)) => v.to_string(),
            _ => return Err(cannot_convert::<Self>(&value)),
        })
    }
    fn extract(input: &mut &str) -> Result<Self> {
        let result = (*input).to_owned();
        *input = "";
        Ok(result)
    }
}

impl AsValue for Box<[u8]> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v),
            Value::List(Some(v), ..) => v
                .into_iter()
                .map(u8::try_from_value)
                .collect::<Result<_>>(),
            Value::Uuid(Some(v)) => Ok(v.as_bytes().as_slice().into()),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
}

impl_as_value!(
    Uuid,
    Value::Uuid,
    |input: &mut &str| {
        let context = || format!("Cannot extract a uuid value from `{}`", truncate_long!(input));
        let candidate = input.get(0..36).ok_or_else(|| Error::msg(context()))?;
        let uuid = Uuid::parse_str(candidate).with_context(context)?;
        *input = &input[36..];
        Ok(uuid)
    },
    Value::Blob(Some(ref v)) => Uuid::from_slice(v).context("A uuid must be 16 bytes long"),
);

macro_rules! parse_time {
    ($value: ident, $($formats:literal),+ $(,)?) => {
        'value: {
            for format in [$($formats,)+] {
                let format = parse_borrowed::<2>(format)?;
                let mut parsed = time::parsing::Parsed::new();
                let remaining = parsed.parse_items($value.as_bytes(), &format);
                if let Ok(remaining) = remaining {
                    let result = parsed.try_into()?;
                    *$value = &$value[($value.len() - remaining.len())..];
                    break 'value Ok(result);
                }
            }
            Err(Error::msg(format!(
                "Cannot extract from `{}` as {}",
                $value,
                any::type_name::<Self>()
            )))
        }
    }
}

impl_as_value!(
    Date,
    Value::Date,
    |v: &mut &str| {
        let result: Date = parse_time!(v, "[year]-[month]-[day]")?;
        Ok(result)
    },
    Value::Timestamp(Some(v)) => Ok(v.date()),
);

impl_as_value!(
    Time,
    Value::Time,
    |v: &mut &str| {
        let result: Time = parse_time!(
            v,
            "[hour]:[minute]:[second].[subsecond]",
            "[hour]:[minute]:[second]",
            "[hour]:[minute]",
        )?;
        Ok(result)
    },
    Value::Timestamp(Some(v)) => Ok(v.time()),
);

impl_as_value!(
    PrimitiveDateTime,
    Value::Timestamp,
    |v: &mut &str| {
        let result: PrimitiveDateTime = parse_time!(
            v,
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]",
            "[year]-[month]-[day]T[hour]:[minute]:[second]",
            "[year]-[month]-[day]T[hour]:[minute]",
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]",
            "[year]-[month]-[day] [hour]:[minute]:[second]",
            "[year]-[month]-[day] [hour]:[minute]",
        )?;
        Ok(result)
    },
    Value::Date(Some(v)) => Ok(v.midnight()),
    Value::TimestampWithTimezone(Some(v)) => Ok(PrimitiveDateTime::new(v.date(), v.time())),
);

impl_as_value!(
    OffsetDateTime,
    Value::TimestampWithTimezone,
    |v: &mut &str| {
        let result: OffsetDateTime = parse_time!(
            v,
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]",
            "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]",
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]",
            "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]",
        )
        .or_else(|_: Error| <PrimitiveDateTime as AsValue>::extract(v).map(|v| v.assume_utc()))?;
        Ok(result)
    },
    Value::Timestamp(Some(v)) => Ok(v.assume_utc()),
);

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None, 0, 0)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self), 0, self.scale() as _)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v), ..) => Ok(v),
            Value::Int8(Some(v)) => Ok(Decimal::from(v)),
            Value::Int16(Some(v)) => Ok(Decimal::from(v)),
            Value::Int32(Some(v)) => Ok(Decimal::from(v)),
            Value::Int64(Some(v)) => Ok(Decimal::from(v)),
            Value::UInt8(Some(v)) => Ok(Decimal::from(v)),
            Value::UInt16(Some(v)) => Ok(Decimal::from(v)),
            Value::UInt32(Some(v)) => Ok(Decimal::from(v)),
            Value::UInt64(Some(v)) => Ok(Decimal::from(v)),
            Value::Float32(Some(v)) => {
                Decimal::from_f32(v).ok_or_else(|| cannot_convert::<Self>(&value))
            }
            Value::Float64(Some(v)) => {
                Decimal::from_f64(v).ok_or_else(|| cannot_convert::<Self>(&value))
            }
            Value::Varchar(Some(ref v)) => Self::parse(v.trim()),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
    fn extract(input: &mut &str) -> Result<Self> {
        let mut value = *input;
        let sign_len = if value.starts_with(['-', '+']) { 1 } else { 0 };
        let digits = value[sign_len..]
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .count();
        if digits == 0 {
            return Err(Error::msg(format!(
                "Cannot extract Decimal from `{}`",
                truncate_long!(input)
            )));
        }
        let literal = &value[..sign_len + digits];
        let result = Decimal::from_str_exact(literal)
            .with_context(|| format!("Cannot extract Decimal from `{literal}`"))?;
        value = &value[literal.len()..];
        *input = value;
        Ok(result)
    }
}

macro_rules! impl_as_value {
    ($source:ident) => {
        impl<T: AsValue> AsValue for $source<T> {
            fn as_empty_value() -> Value {
                Value::List(None, Box::new(T::as_empty_value()))
            }
            fn as_value(self) -> Value {
                Value::List(
                    Some(self.into_iter().map(AsValue::as_value).collect()),
                    Box::new(T::as_empty_value()),
                )
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    Value::List(Some(v), ..) => v
                        .into_iter()
                        .map(<T as AsValue>::try_from_value)
                        .collect::<Result<_>>(),
                    Value::Blob(Some(v)) => v
                        .iter()
                        .map(|v| <T as AsValue>::try_from_value(Value::UInt8(Some(*v))))
                        .collect::<Result<_>>(),
                    _ => Err(cannot_convert::<Self>(&value)),
                }
            }
        }
    };
}
impl_as_value!(Vec);
impl_as_value!(VecDeque);
impl_as_value!(LinkedList);

impl<'a> AsValue for Cow<'a, str> {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.into()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        String::try_from_value(value).map(Into::into)
    }
    fn extract(input: &mut &str) -> Result<Self> {
        <String as AsValue>::extract(input).map(Into::into)
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(if value.is_null() {
            None
        } else {
            Some(<T as AsValue>::try_from_value(value)?)
        })
    }
    fn extract(input: &mut &str) -> Result<Self> {
        let mut value = *input;
        let result = consume_while(&mut value, |v| v.is_alphanumeric() || *v == '_');
        if result.eq_ignore_ascii_case("null") {
            *input = value;
            return Ok(None);
        };
        T::extract(input).map(Some)
    }
}

impl<T: AsValue> AsValue for Box<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        (*self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(Self::new(<T as AsValue>::try_from_value(value)?))
    }
    fn extract(value: &mut &str) -> Result<Self> {
        T::extract(value).map(Self::new)
    }
}

macro_rules! impl_as_value {
    ($source:ident) => {
        impl<T: AsValue + Clone> AsValue for $source<T> {
            fn as_empty_value() -> Value {
                T::as_empty_value()
            }
            fn as_value(self) -> Value {
                $source::unwrap_or_clone(self).as_value()
            }
            fn try_from_value(value: Value) -> Result<Self> {
                Ok($source::new(<T as AsValue>::try_from_value(value)?))
            }
            fn extract(value: &mut &str) -> Result<Self> {
                T::extract(value).map($source::new)
            }
        }
    };
}
impl_as_value!(Arc);
impl_as_value!(Rc);
