use ferry_core::{TypeDecoded, decode_type};
use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{Field, Ident, LitStr, Type, parse::ParseBuffer};

pub(crate) struct FieldMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) name: String,
    pub(crate) decoded: TypeDecoded,
    pub(crate) enumeration: bool,
    pub(crate) skip: bool,
}

impl FieldMetadata {
    /// Expression evaluating to the declared type prototype.
    pub(crate) fn value(&self) -> TokenStream {
        type_prototype(&self.decoded)
    }
}

pub(crate) fn type_prototype(decoded: &TypeDecoded) -> TokenStream {
    match &decoded.custom {
        Some(ty) => quote!(<#ty as ::ferry::AsValue>::as_empty_value()),
        None => decoded.value.to_token_stream(),
    }
}

pub(crate) fn decode_field(field: &Field) -> FieldMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Record fields are expected to have a name");
    let mut metadata = FieldMetadata {
        name: ident.to_string(),
        ident,
        ty: field.ty.clone(),
        decoded: decode_type(&field.ty),
        enumeration: false,
        skip: false,
    };
    if metadata.name.starts_with("r#") {
        metadata.name.drain(..2);
    }
    for attr in &field.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("ferry") {
            let Ok(list) = meta.require_list() else {
                panic!("Error while parsing `ferry`, use it like: `#[ferry(attribute = value, ...)]`");
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("name") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!("Error while parsing `name`, use it like: `#[ferry(name = \"my_column\")]`");
                    };
                    metadata.name = v.value();
                } else if arg.path.is_ident("enumeration") {
                    let Err(..) = arg.value() else {
                        // value() is Err for Meta::Path
                        panic!("Error while parsing `enumeration`, use it like: `#[ferry(enumeration)]`");
                    };
                    metadata.enumeration = true;
                } else if arg.path.is_ident("skip") {
                    let Err(..) = arg.value() else {
                        panic!("Error while parsing `skip`, use it like: `#[ferry(skip)]`");
                    };
                    metadata.skip = true;
                } else {
                    panic!(
                        "Unknown attribute `{}` inside ferry macro",
                        arg.path.to_token_stream()
                    );
                }
                Ok(())
            });
        }
    }
    metadata
}
