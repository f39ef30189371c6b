use proc_macro2::TokenStream;
use quote::quote;
use syn::{Fields, ItemEnum, LitStr, parse::ParseBuffer};

fn variant_name(variant: &syn::Variant) -> String {
    let mut name = variant.ident.to_string();
    for attr in &variant.attrs {
        if attr.meta.path().is_ident("ferry") {
            let Ok(list) = attr.meta.require_list() else {
                panic!("Error while parsing `ferry`, use it like: `#[ferry(name = \"Name\")]`");
            };
            let _ = list.parse_nested_meta(|arg| {
                if !arg.path.is_ident("name") {
                    panic!("Only `name` is supported on enum variants");
                }
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `name`, use it like: `#[ferry(name = \"Name\")]`");
                };
                name = v.value();
                Ok(())
            });
        }
    }
    name
}

pub(crate) fn value_enum(item: &ItemEnum) -> TokenStream {
    let name = &item.ident;
    if !item.generics.params.is_empty() {
        panic!("`{name}` cannot derive ValueEnum because it has generic parameters");
    }
    if let Some(v) = item.variants.iter().find(|v| !matches!(v.fields, Fields::Unit)) {
        panic!(
            "`{name}::{}` carries data, ValueEnum supports only fieldless enums",
            v.ident
        );
    }
    let idents = item.variants.iter().map(|v| &v.ident).collect::<Vec<_>>();
    let names = item.variants.iter().map(variant_name).collect::<Vec<_>>();
    quote! {
        impl ::ferry::ValueEnum for #name {
            const NAMES: &'static [&'static str] = &[#(#names),*];

            fn name(&self) -> &'static str {
                match self {
                    #(Self::#idents => #names,)*
                }
            }

            fn discriminant(&self) -> i64 {
                match self {
                    #(Self::#idents => Self::#idents as i64,)*
                }
            }

            fn from_name(name: &str) -> Option<Self> {
                match name {
                    #(#names => Some(Self::#idents),)*
                    _ => None,
                }
            }

            fn from_discriminant(value: i64) -> Option<Self> {
                #(
                    if value == Self::#idents as i64 {
                        return Some(Self::#idents);
                    }
                )*
                None
            }
        }

        impl ::ferry::AsValue for #name {
            fn as_empty_value() -> ::ferry::Value {
                ::ferry::Value::Int32(None)
            }

            fn as_value(self) -> ::ferry::Value {
                ::ferry::Value::Int32(Some(::ferry::ValueEnum::discriminant(&self) as i32))
            }

            fn try_from_value(value: ::ferry::Value) -> ::ferry::Result<Self> {
                ::ferry::enum_from_value(value)
            }

            fn extract(input: &mut &str) -> ::ferry::Result<Self> {
                let mut value = *input;
                let word = ::ferry::consume_while(&mut value, |v| v.is_alphanumeric() || *v == '_');
                let result = ::ferry::enum_from_value(::ferry::Value::Varchar(Some(word.into())))?;
                *input = value;
                Ok(result)
            }
        }
    }
}
