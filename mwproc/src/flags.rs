use proc_macro2::{Ident, TokenStream};
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{braced, parse2, Attribute, Expr, Token, Type, Visibility};

/// Wraps `bitflags!` and encodes the set flags as a multi-value parameter.
/// `LOG_INFO` is sent as `loginfo`.
pub fn flags(input: TokenStream) -> syn::Result<TokenStream> {
    let tts = input.clone();
    let FlagsInput { name, flags } = parse2(input)?;
    let checks = flags.iter().map(|Flag { name, .. }| {
        let value = name
            .to_string()
            .chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect::<String>();
        quote! {
            if self.contains(Self::#name) {
                values__.push(::std::string::String::from(#value));
            }
        }
    });
    Ok(quote! {
        ::bitflags::bitflags! {
            #tts
        }
        impl ::wikibot::macro_support::WriteValue for #name {
            fn values(&self) -> ::core::option::Option<::std::vec::Vec<::std::string::String>> {
                let mut values__ = ::std::vec::Vec::new();
                #(#checks)*
                if values__.is_empty() {
                    ::core::option::Option::None
                } else {
                    ::core::option::Option::Some(values__)
                }
            }
        }
    })
}

struct FlagsInput {
    name: Ident,
    flags: Vec<Flag>,
}

impl Parse for FlagsInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        input.call(Attribute::parse_outer)?;
        input.parse::<Visibility>()?;
        input.parse::<Token![struct]>()?;
        let name = input.parse()?;
        input.parse::<Token![:]>()?;
        input.parse::<Type>()?;
        let content;
        braced!(content in input);
        let mut flags = vec![];
        while !content.is_empty() {
            flags.push(content.parse()?);
        }
        Ok(Self { name, flags })
    }
}

struct Flag {
    name: Ident,
}

impl Parse for Flag {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        input.call(Attribute::parse_outer)?;
        input.parse::<Token![const]>()?;
        let name = input.parse()?;
        input.parse::<Token![=]>()?;
        input.parse::<Expr>()?;
        input.parse::<Token![;]>()?;
        Ok(Self { name })
    }
}
