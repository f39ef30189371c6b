use crate::{
    decode_field::{FieldMetadata, type_prototype},
    decode_record::AccessorMetadata,
};
use proc_macro2::TokenStream;
use quote::quote;
use syn::Ident;

pub(crate) fn encode_field_descriptor(
    record: &Ident,
    field: &FieldMetadata,
    position: usize,
) -> TokenStream {
    let name = &field.name;
    let ident = &field.ident;
    let ty = &field.ty;
    let value = field.value();
    let nullable = field.decoded.nullable;
    let sequence = field.decoded.sequence;
    let enumeration = field.enumeration;
    quote! {
        ::ferry::FieldDescriptor::<#record>::new(
            #name,
            #value,
            |v: &#record| ::ferry::AsValue::as_value(::std::clone::Clone::clone(&v.#ident)),
        )
        .with_setter(|v: &mut #record, value: ::ferry::Value| {
            v.#ident = <#ty as ::ferry::AsValue>::try_from_value(value)?;
            Ok(())
        })
        .with_nullable(#nullable)
        .with_sequence(#sequence)
        .with_enumeration(#enumeration)
        .with_position(#position)
    }
}

pub(crate) fn encode_accessor_descriptor(
    record: &Ident,
    accessor: &AccessorMetadata,
) -> TokenStream {
    let name = &accessor.name;
    let ty = &accessor.ty;
    let getter = &accessor.getter;
    let value = type_prototype(&accessor.decoded);
    let nullable = accessor.decoded.nullable;
    let sequence = accessor.decoded.sequence;
    let enumeration = accessor.enumeration;
    let setter = accessor.setter.as_ref().map(|setter| {
        quote! {
            .with_setter(|v: &mut #record, value: ::ferry::Value| {
                #record::#setter(v, <#ty as ::ferry::AsValue>::try_from_value(value)?);
                Ok(())
            })
        }
    });
    quote! {
        ::ferry::FieldDescriptor::<#record>::new(
            #name,
            #value,
            |v: &#record| ::ferry::AsValue::as_value(#record::#getter(v)),
        )
        .with_member(::ferry::MemberKind::Accessor)
        #setter
        .with_nullable(#nullable)
        .with_sequence(#sequence)
        .with_enumeration(#enumeration)
    }
}
