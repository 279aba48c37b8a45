use proc_macro::TokenStream;

mod derive;
mod flags;

synstructure::decl_derive!([Params, attributes(mw)] => derive::derive_params);

#[proc_macro]
pub fn flags(input: TokenStream) -> TokenStream {
    flags::flags(input.into())
        .unwrap_or_else(|t| t.into_compile_error())
        .into()
}
