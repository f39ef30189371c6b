use crate::decode_record::RecordMetadata;
use proc_macro2::TokenStream;
use quote::quote;

/// Body of `Record::construct`, one positional argument per data member.
pub(crate) fn construct_fn(record: &RecordMetadata) -> TokenStream {
    let arguments = record.fields.iter().filter(|f| !f.skip).map(|f| {
        let ident = &f.ident;
        let ty = &f.ty;
        let name = &f.name;
        quote! {
            let #ident = ::ferry::ArgFactory::<#ty>::take(
                __args__.next().unwrap_or_default(),
            )
            .with_context(|| format!("While constructing the argument `{}`", #name))?;
        }
    });
    let initializers = record.fields.iter().map(|f| {
        let ident = &f.ident;
        if f.skip {
            quote!(#ident: ::std::default::Default::default())
        } else {
            quote!(#ident)
        }
    });
    quote! {
        fn construct(args: ::ferry::Row) -> ::ferry::Result<Self> {
            #[allow(unused_imports)]
            use ::ferry::{ArgFallback as _, Context as _};
            #[allow(unused_mut, unused_variables)]
            let mut __args__ = args.into_vec().into_iter();
            #(#arguments)*
            Ok(Self {
                #(#initializers,)*
            })
        }
    }
}
