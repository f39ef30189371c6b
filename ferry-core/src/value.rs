use crate::{AsValue, Error, Result};
use proc_macro2::TokenStream;
use quote::{ToTokens, TokenStreamExt, quote};
use rust_decimal::Decimal;
use std::{any, mem};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed cell value.
///
/// Every variant except `Null` wraps an `Option`, a `None` payload is a typed null and
/// doubles as the type prototype used by field descriptors and cursor metadata
/// (`Value::Int32(None)` reads as "a nullable `INT` cell" or as "the type `INT`").
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>, /* precision: */ u8, /* scale: */ u8),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    TimestampWithTimezone(Option<OffsetDateTime>),
    Uuid(Option<Uuid>),
    List(Option<Vec<Value>>, /* type: */ Box<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Int8(v) => v.is_none(),
            Value::Int16(v) => v.is_none(),
            Value::Int32(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::UInt8(v) => v.is_none(),
            Value::UInt16(v) => v.is_none(),
            Value::UInt32(v) => v.is_none(),
            Value::UInt64(v) => v.is_none(),
            Value::Float32(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Decimal(v, ..) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
            Value::Blob(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::Time(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::TimestampWithTimezone(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
            Value::List(v, ..) => v.is_none(),
        }
    }

    pub fn same_type(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Decimal(.., l_prec, l_scale), Self::Decimal(.., r_prec, r_scale)) => {
                l_prec == r_prec && l_scale == r_scale
            }
            (Self::List(.., l), Self::List(.., r)) => l.same_type(r),
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }

    /// The same variant with no payload.
    pub fn as_null(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Boolean(..) => Value::Boolean(None),
            Value::Int8(..) => Value::Int8(None),
            Value::Int16(..) => Value::Int16(None),
            Value::Int32(..) => Value::Int32(None),
            Value::Int64(..) => Value::Int64(None),
            Value::UInt8(..) => Value::UInt8(None),
            Value::UInt16(..) => Value::UInt16(None),
            Value::UInt32(..) => Value::UInt32(None),
            Value::UInt64(..) => Value::UInt64(None),
            Value::Float32(..) => Value::Float32(None),
            Value::Float64(..) => Value::Float64(None),
            Value::Decimal(.., precision, scale) => Value::Decimal(None, *precision, *scale),
            Value::Varchar(..) => Value::Varchar(None),
            Value::Blob(..) => Value::Blob(None),
            Value::Date(..) => Value::Date(None),
            Value::Time(..) => Value::Time(None),
            Value::Timestamp(..) => Value::Timestamp(None),
            Value::TimestampWithTimezone(..) => Value::TimestampWithTimezone(None),
            Value::Uuid(..) => Value::Uuid(None),
            Value::List(.., inner) => Value::List(None, inner.clone()),
        }
    }

    /// Name of the Rust type a cell of this kind materializes into.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(..) => any::type_name::<bool>(),
            Value::Int8(..) => any::type_name::<i8>(),
            Value::Int16(..) => any::type_name::<i16>(),
            Value::Int32(..) => any::type_name::<i32>(),
            Value::Int64(..) => any::type_name::<i64>(),
            Value::UInt8(..) => any::type_name::<u8>(),
            Value::UInt16(..) => any::type_name::<u16>(),
            Value::UInt32(..) => any::type_name::<u32>(),
            Value::UInt64(..) => any::type_name::<u64>(),
            Value::Float32(..) => any::type_name::<f32>(),
            Value::Float64(..) => any::type_name::<f64>(),
            Value::Decimal(..) => "rust_decimal::Decimal",
            Value::Varchar(..) => any::type_name::<String>(),
            Value::Blob(..) => "Box<[u8]>",
            Value::Date(..) => "time::Date",
            Value::Time(..) => "time::Time",
            Value::Timestamp(..) => "time::PrimitiveDateTime",
            Value::TimestampWithTimezone(..) => "time::OffsetDateTime",
            Value::Uuid(..) => "uuid::Uuid",
            Value::List(..) => "Vec",
        }
    }

    /// Convert this value into the variant of `target`, the payload of `target` is ignored.
    ///
    /// Nulls become the typed null of the target. Numeric values widen (and narrow when
    /// in range), text is parsed, nested lists are converted element by element.
    pub fn coerce(self, target: &Value) -> Result<Value> {
        if self.is_null() {
            return Ok(target.as_null());
        }
        if self.same_type(target) {
            return Ok(self);
        }
        macro_rules! coerce {
            ($variant:path, $ty:ty) => {
                $variant(Some(<$ty as AsValue>::try_from_value(self)?))
            };
        }
        Ok(match target {
            Value::Null => self,
            Value::Boolean(..) => coerce!(Value::Boolean, bool),
            Value::Int8(..) => coerce!(Value::Int8, i8),
            Value::Int16(..) => coerce!(Value::Int16, i16),
            Value::Int32(..) => coerce!(Value::Int32, i32),
            Value::Int64(..) => coerce!(Value::Int64, i64),
            Value::UInt8(..) => coerce!(Value::UInt8, u8),
            Value::UInt16(..) => coerce!(Value::UInt16, u16),
            Value::UInt32(..) => coerce!(Value::UInt32, u32),
            Value::UInt64(..) => coerce!(Value::UInt64, u64),
            Value::Float32(..) => coerce!(Value::Float32, f32),
            Value::Float64(..) => coerce!(Value::Float64, f64),
            Value::Decimal(.., precision, scale) => {
                Value::Decimal(Some(Decimal::try_from_value(self)?), *precision, *scale)
            }
            Value::Varchar(..) => coerce!(Value::Varchar, String),
            Value::Blob(..) => coerce!(Value::Blob, Box<[u8]>),
            Value::Date(..) => coerce!(Value::Date, Date),
            Value::Time(..) => coerce!(Value::Time, Time),
            Value::Timestamp(..) => coerce!(Value::Timestamp, PrimitiveDateTime),
            Value::TimestampWithTimezone(..) => {
                coerce!(Value::TimestampWithTimezone, OffsetDateTime)
            }
            Value::Uuid(..) => coerce!(Value::Uuid, Uuid),
            Value::List(.., inner) => {
                let items = match self {
                    Value::List(Some(items), ..) => items,
                    Value::Blob(Some(bytes)) => bytes
                        .iter()
                        .map(|v| Value::UInt8(Some(*v)))
                        .collect(),
                    value => {
                        return Err(Error::msg(format!(
                            "Cannot convert {value:?} to a list of {}",
                            inner.type_name()
                        )));
                    }
                };
                Value::List(
                    Some(
                        items
                            .into_iter()
                            .map(|v| v.coerce(inner))
                            .collect::<Result<_>>()?,
                    ),
                    inner.clone(),
                )
            }
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int8(l), Self::Int8(r)) => l == r,
            (Self::Int16(l), Self::Int16(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::UInt8(l), Self::UInt8(r)) => l == r,
            (Self::UInt16(l), Self::UInt16(r)) => l == r,
            (Self::UInt32(l), Self::UInt32(r)) => l == r,
            (Self::UInt64(l), Self::UInt64(r)) => l == r,
            (Self::Float32(l), Self::Float32(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l, l_prec, l_scale), Self::Decimal(r, r_prec, r_scale)) => {
                l == r && l_prec == r_prec && l_scale == r_scale
            }
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::TimestampWithTimezone(l), Self::TimestampWithTimezone(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            (Self::List(l, ..), Self::List(r, ..)) => l == r && self.same_type(other),
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }
}

impl ToTokens for Value {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.append_all(match self {
            Value::Null => quote!(::ferry::Value::Null),
            Value::Boolean(..) => quote!(::ferry::Value::Boolean(None)),
            Value::Int8(..) => quote!(::ferry::Value::Int8(None)),
            Value::Int16(..) => quote!(::ferry::Value::Int16(None)),
            Value::Int32(..) => quote!(::ferry::Value::Int32(None)),
            Value::Int64(..) => quote!(::ferry::Value::Int64(None)),
            Value::UInt8(..) => quote!(::ferry::Value::UInt8(None)),
            Value::UInt16(..) => quote!(::ferry::Value::UInt16(None)),
            Value::UInt32(..) => quote!(::ferry::Value::UInt32(None)),
            Value::UInt64(..) => quote!(::ferry::Value::UInt64(None)),
            Value::Float32(..) => quote!(::ferry::Value::Float32(None)),
            Value::Float64(..) => quote!(::ferry::Value::Float64(None)),
            Value::Decimal(.., precision, scale) => {
                quote!(::ferry::Value::Decimal(None, #precision, #scale))
            }
            Value::Varchar(..) => quote!(::ferry::Value::Varchar(None)),
            Value::Blob(..) => quote!(::ferry::Value::Blob(None)),
            Value::Date(..) => quote!(::ferry::Value::Date(None)),
            Value::Time(..) => quote!(::ferry::Value::Time(None)),
            Value::Timestamp(..) => quote!(::ferry::Value::Timestamp(None)),
            Value::TimestampWithTimezone(..) => {
                quote!(::ferry::Value::TimestampWithTimezone(None))
            }
            Value::Uuid(..) => quote!(::ferry::Value::Uuid(None)),
            Value::List(.., inner) => {
                let inner = inner.as_ref().to_token_stream();
                quote!(::ferry::Value::List(None, Box::new(#inner)))
            }
        });
    }
}
