mod construct_fn;
mod decode_field;
mod decode_record;
mod encode_descriptor;
mod value_enum;

use construct_fn::construct_fn;
use decode_record::decode_record;
use encode_descriptor::{encode_accessor_descriptor, encode_field_descriptor};
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemEnum, ItemStruct, parse_macro_input};
use value_enum::value_enum;

#[proc_macro_derive(Record, attributes(table_name, ferry))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemStruct);
    let name = &item.ident;
    let record = decode_record(&item);
    let table_name = &record.table_name;
    let fields = record
        .fields
        .iter()
        .filter(|f| !f.skip)
        .enumerate()
        .map(|(i, f)| encode_field_descriptor(name, f, i));
    let accessors = record
        .accessors
        .iter()
        .map(|a| encode_accessor_descriptor(name, a));
    let construct = construct_fn(&record);
    quote! {
        impl ::ferry::Record for #name {
            fn table_name() -> &'static str {
                #table_name
            }

            fn descriptors() -> &'static [::ferry::FieldDescriptor<Self>] {
                static RESULT: ::std::sync::LazyLock<Box<[::ferry::FieldDescriptor<#name>]>> =
                    ::std::sync::LazyLock::new(|| {
                        vec![#(#fields,)* #(#accessors,)*].into_boxed_slice()
                    });
                &RESULT
            }

            #construct
        }
    }
    .into()
}

#[proc_macro_derive(ValueEnum, attributes(ferry))]
pub fn derive_value_enum(input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemEnum);
    value_enum(&item).into()
}
