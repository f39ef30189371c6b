use crate::{Value, matches_path};
use quote::ToTokens;
use std::mem;
use syn::{GenericArgument, PathArguments, Type, TypePath, TypeReference, TypeSlice};

/// Column type derived from a Rust field type at macro expansion time.
#[derive(Clone)]
pub struct TypeDecoded {
    pub value: Value,
    pub nullable: bool,
    /// Collection typed (`Vec<T>` and friends, byte buffers excluded).
    pub sequence: bool,
    /// A type not known to the decoder, its prototype is asked at runtime through `AsValue`.
    pub custom: Option<Type>,
}

impl TypeDecoded {
    fn of(value: Value) -> Self {
        Self {
            value,
            nullable: false,
            sequence: false,
            custom: None,
        }
    }
}

fn first_generic(path: &syn::Path, skip: usize) -> &Type {
    let Some(segment) = path.segments.last() else {
        panic!("Unexpected empty path");
    };
    let PathArguments::AngleBracketed(bracketed) = &segment.arguments else {
        panic!("`{}` must have a generic argument", path.to_token_stream());
    };
    match bracketed.args.iter().nth(skip) {
        Some(GenericArgument::Type(ty)) => ty,
        _ => panic!(
            "`{}` must have a type as generic argument {}",
            path.to_token_stream(),
            skip + 1
        ),
    }
}

fn is_byte(ty: &Type) -> bool {
    matches!(ty, Type::Path(TypePath { path, .. }) if path.is_ident("u8"))
}

pub fn decode_type(ty: &Type) -> TypeDecoded {
    match ty {
        Type::Path(TypePath { path, .. }) => {
            if let Some(ident) = path.get_ident() {
                let value = if ident == "bool" {
                    Some(Value::Boolean(None))
                } else if ident == "i8" {
                    Some(Value::Int8(None))
                } else if ident == "i16" {
                    Some(Value::Int16(None))
                } else if ident == "i32" {
                    Some(Value::Int32(None))
                } else if ident == "i64" {
                    Some(Value::Int64(None))
                } else if ident == "u8" {
                    Some(Value::UInt8(None))
                } else if ident == "u16" {
                    Some(Value::UInt16(None))
                } else if ident == "u32" {
                    Some(Value::UInt32(None))
                } else if ident == "u64" {
                    Some(Value::UInt64(None))
                } else if ident == "isize" {
                    Some(if mem::size_of::<isize>() == mem::size_of::<i32>() {
                        Value::Int32(None)
                    } else {
                        Value::Int64(None)
                    })
                } else if ident == "usize" {
                    Some(if mem::size_of::<usize>() == mem::size_of::<u32>() {
                        Value::UInt32(None)
                    } else {
                        Value::UInt64(None)
                    })
                } else if ident == "f32" {
                    Some(Value::Float32(None))
                } else if ident == "f64" {
                    Some(Value::Float64(None))
                } else if ident == "str" {
                    Some(Value::Varchar(None))
                } else {
                    None
                };
                if let Some(value) = value {
                    return TypeDecoded::of(value);
                }
            }
            if matches_path(path, &["std", "string", "String"]) {
                TypeDecoded::of(Value::Varchar(None))
            } else if matches_path(path, &["rust_decimal", "Decimal"]) {
                TypeDecoded::of(Value::Decimal(None, 0, 0))
            } else if matches_path(path, &["time", "Time"]) {
                TypeDecoded::of(Value::Time(None))
            } else if matches_path(path, &["time", "Date"]) {
                TypeDecoded::of(Value::Date(None))
            } else if matches_path(path, &["time", "PrimitiveDateTime"]) {
                TypeDecoded::of(Value::Timestamp(None))
            } else if matches_path(path, &["time", "OffsetDateTime"]) {
                TypeDecoded::of(Value::TimestampWithTimezone(None))
            } else if matches_path(path, &["uuid", "Uuid"]) {
                TypeDecoded::of(Value::Uuid(None))
            } else if matches_path(path, &["std", "option", "Option"]) {
                TypeDecoded {
                    nullable: true,
                    ..decode_type(first_generic(path, 0))
                }
            } else if matches_path(path, &["std", "borrow", "Cow"]) {
                decode_type(first_generic(path, 1))
            } else if matches_path(path, &["std", "boxed", "Box"])
                || matches_path(path, &["std", "rc", "Rc"])
                || matches_path(path, &["std", "sync", "Arc"])
            {
                decode_type(first_generic(path, 0))
            } else if matches_path(path, &["std", "vec", "Vec"])
                || matches_path(path, &["std", "collections", "VecDeque"])
                || matches_path(path, &["std", "collections", "LinkedList"])
            {
                let elem = first_generic(path, 0);
                if is_byte(elem) && matches_path(path, &["std", "vec", "Vec"]) {
                    return TypeDecoded::of(Value::Blob(None));
                }
                TypeDecoded {
                    sequence: true,
                    ..TypeDecoded::of(Value::List(None, Box::new(decode_type(elem).value)))
                }
            } else {
                TypeDecoded {
                    custom: Some(ty.clone()),
                    ..TypeDecoded::of(Value::Null)
                }
            }
        }
        Type::Slice(TypeSlice { elem, .. }) => {
            if is_byte(elem) {
                TypeDecoded::of(Value::Blob(None))
            } else {
                TypeDecoded {
                    sequence: true,
                    ..TypeDecoded::of(Value::List(None, Box::new(decode_type(elem).value)))
                }
            }
        }
        Type::Reference(TypeReference { elem, .. }) => decode_type(elem),
        Type::Paren(paren) => decode_type(&paren.elem),
        Type::Group(group) => decode_type(&group.elem),
        _ => panic!("Unexpected type `{}`", ty.to_token_stream()),
    }
}
