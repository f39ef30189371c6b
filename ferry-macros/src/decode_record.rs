use crate::decode_field::{FieldMetadata, decode_field};
use convert_case::{Case, Casing};
use ferry_core::{TypeDecoded, decode_type};
use quote::ToTokens;
use syn::{Fields, Ident, ItemStruct, LitStr, Type, parse::ParseBuffer};

/// Member exposed through methods instead of a struct field.
pub(crate) struct AccessorMetadata {
    pub(crate) name: String,
    pub(crate) ty: Type,
    pub(crate) decoded: TypeDecoded,
    pub(crate) getter: Ident,
    pub(crate) setter: Option<Ident>,
    pub(crate) enumeration: bool,
}

pub(crate) struct RecordMetadata {
    pub(crate) table_name: String,
    pub(crate) fields: Vec<FieldMetadata>,
    pub(crate) accessors: Vec<AccessorMetadata>,
}

fn table_name(item: &ItemStruct) -> String {
    let default_table_name = item.ident.to_string().to_case(Case::Snake);
    item.attrs
        .iter()
        .find_map(|attr| {
            if attr.meta.path().is_ident("table_name") {
                let Ok(v) = attr
                    .meta
                    .require_list()
                    .and_then(|v| v.parse_args::<LitStr>())
                else {
                    panic!(
                        "Error while parsing `table_name`, use it like #[table_name(\"{}\")]",
                        &default_table_name
                    );
                };
                return Some(v.value());
            }
            None
        })
        .unwrap_or(default_table_name)
}

fn accessors(item: &ItemStruct) -> Vec<AccessorMetadata> {
    const USAGE: &str = "use it like: `#[ferry(accessor(name = \"column\", getter = method, ty = Type, setter = method))]`";
    let mut result = Vec::new();
    for attr in &item.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("ferry") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `ferry`, {USAGE}");
        };
        let _ = list.parse_nested_meta(|arg| {
            if !arg.path.is_ident("accessor") {
                panic!(
                    "Unknown attribute `{}` inside ferry macro",
                    arg.path.to_token_stream()
                );
            }
            let mut name = None;
            let mut ty = None;
            let mut getter = None;
            let mut setter = None;
            let mut enumeration = false;
            let _ = arg.parse_nested_meta(|arg| {
                if arg.path.is_ident("name") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!("Error while parsing `name`, {USAGE}");
                    };
                    name = Some(v.value());
                } else if arg.path.is_ident("ty") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<Type>) else {
                        panic!("Error while parsing `ty`, {USAGE}");
                    };
                    ty = Some(v);
                } else if arg.path.is_ident("getter") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<Ident>) else {
                        panic!("Error while parsing `getter`, {USAGE}");
                    };
                    getter = Some(v);
                } else if arg.path.is_ident("setter") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<Ident>) else {
                        panic!("Error while parsing `setter`, {USAGE}");
                    };
                    setter = Some(v);
                } else if arg.path.is_ident("enumeration") {
                    enumeration = true;
                } else {
                    panic!(
                        "Unknown attribute `{}` inside accessor, {USAGE}",
                        arg.path.to_token_stream()
                    );
                }
                Ok(())
            });
            let (Some(getter), Some(ty)) = (getter, ty) else {
                panic!("An accessor needs at least `getter` and `ty`, {USAGE}");
            };
            result.push(AccessorMetadata {
                name: name.unwrap_or_else(|| getter.to_string()),
                decoded: decode_type(&ty),
                ty,
                getter,
                setter,
                enumeration,
            });
            Ok(())
        });
    }
    result
}

pub(crate) fn decode_record(item: &ItemStruct) -> RecordMetadata {
    if !item.generics.params.is_empty() {
        panic!("`{}` cannot be a record because it has generic parameters", item.ident);
    }
    let Fields::Named(..) = item.fields else {
        panic!("`{}` must have named fields to be a record", item.ident);
    };
    RecordMetadata {
        table_name: table_name(item),
        fields: item.fields.iter().map(decode_field).collect(),
        accessors: accessors(item),
    }
}
