use proc_macro2::TokenStream as Ts;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::spanned::Spanned;
use syn::{Attribute, Data, Fields, LitStr};
use synstructure::{BindingInfo, Structure, VariantInfo};

#[derive(Default)]
struct Options {
    unnamed: bool,
    prepend_all: Option<String>,
}

impl Options {
    fn parse(&mut self, meta: ParseNestedMeta<'_>) -> syn::Result<()> {
        if meta.path.is_ident("unnamed") {
            self.unnamed = true;
        } else if meta.path.is_ident("prepend_all") {
            self.prepend_all = Some(meta.value()?.parse::<LitStr>()?.value());
        } else {
            return Err(meta.error("invalid options"));
        }
        Ok(())
    }
}

#[derive(Default)]
struct FieldOptions {
    flatten: bool,
    name: Option<String>,
}

impl FieldOptions {
    fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut opts = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("mw")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("flatten") {
                    opts.flatten = true;
                } else if meta.path.is_ident("name") {
                    opts.name = Some(meta.value()?.parse::<LitStr>()?.value());
                } else {
                    return Err(meta.error("invalid field option"));
                }
                Ok(())
            })?;
            if opts.flatten && opts.name.is_some() {
                return Err(syn::Error::new_spanned(
                    attr,
                    "`flatten` and `name` are mutually exclusive",
                ));
            }
        }
        Ok(opts)
    }
}

/// `type_` and `r#type` both become `type`.
fn param_name(b: &BindingInfo<'_>, prefix: Option<&str>) -> syn::Result<String> {
    let ident = b
        .ast()
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new(b.ast().span(), "unnamed field needs `flatten`"))?;
    let mut s = prefix.unwrap_or_default().to_owned();
    s.push_str(
        &ident
            .to_string()
            .trim_start_matches("r#")
            .trim_end_matches('_')
            .to_ascii_lowercase(),
    );
    Ok(s)
}

fn flatten(b: &BindingInfo<'_>, prefix: Option<&str>) -> Ts {
    match prefix {
        Some(p) => quote! {
            ::wikibot::macro_support::WriteParams::write_params(
                #b,
                &mut ::wikibot::macro_support::Prefixed::new(&mut *w, #p),
            );
        },
        None => quote! {
            ::wikibot::macro_support::WriteParams::write_params(#b, &mut *w);
        },
    }
}

fn gen_fields(v: &VariantInfo<'_>, prefix: Option<&str>) -> syn::Result<Ts> {
    match v.ast().fields {
        Fields::Unit => Ok(quote!()),
        Fields::Unnamed(f) if f.unnamed.len() == 1 => Ok(flatten(&v.bindings()[0], prefix)),
        Fields::Unnamed(f) => Err(syn::Error::new_spanned(
            &f.unnamed,
            "too many fields, use newtype or named fields instead",
        )),
        Fields::Named(_) => v
            .bindings()
            .iter()
            .map(|b| {
                let opts = FieldOptions::from_attrs(&b.ast().attrs)?;
                if opts.flatten {
                    return Ok(flatten(b, prefix));
                }
                let name = match opts.name {
                    Some(name) => name,
                    None => param_name(b, prefix)?,
                };
                Ok(quote! {
                    ::wikibot::macro_support::write_value(&mut *w, #name, #b);
                })
            })
            .collect(),
    }
}

fn variant_name(v: &VariantInfo<'_>) -> syn::Result<String> {
    let mut name = None;
    for attr in v.ast().attrs.iter().filter(|a| a.path().is_ident("mw")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse::<LitStr>()?.value());
                Ok(())
            } else {
                Err(meta.error("invalid variant option"))
            }
        })?;
    }
    Ok(name.unwrap_or_else(|| v.ast().ident.to_string().to_ascii_lowercase()))
}

fn write_params_impl(s: &Structure<'_>, prefix: Option<&str>) -> Ts {
    let body = s.each_variant(|v| gen_fields(v, prefix).unwrap_or_else(|e| e.into_compile_error()));
    s.gen_impl(quote! {
        gen impl ::wikibot::macro_support::WriteParams for @Self {
            #[allow(unused_variables)]
            fn write_params<W__: ::wikibot::macro_support::ParamWriter + ?Sized>(&self, w: &mut W__) {
                match *self { #body }
            }
        }
    })
}

fn named_enum_impl(s: &Structure<'_>, prefix: Option<&str>) -> syn::Result<Ts> {
    let extra = s.each_variant(|v| gen_fields(v, prefix).unwrap_or_else(|e| e.into_compile_error()));
    let arms = s
        .variants()
        .iter()
        .map(|v| {
            let ident = v.ast().ident;
            let name = variant_name(v)?;
            Ok(quote!(Self::#ident { .. } => #name,))
        })
        .collect::<syn::Result<Ts>>()?;

    let value = s.gen_impl(quote! {
        gen impl ::wikibot::macro_support::WriteValue for @Self {
            fn values(&self) -> ::core::option::Option<::std::vec::Vec<::std::string::String>> {
                ::core::option::Option::Some(::std::vec![::std::string::String::from(
                    ::wikibot::macro_support::NamedEnum::variant_name(self),
                )])
            }
            #[allow(unused_variables)]
            fn write_extra<W__: ::wikibot::macro_support::ParamWriter + ?Sized>(&self, w: &mut W__) {
                match *self { #extra }
            }
        }
    });
    let named = s.gen_impl(quote! {
        gen impl ::wikibot::macro_support::NamedEnum for @Self {
            fn variant_name(&self) -> &'static str {
                match *self { #arms }
            }
        }
    });
    Ok(quote! { #value #named })
}

pub fn derive_params(s: Structure<'_>) -> syn::Result<Ts> {
    let mut opts = Options::default();
    for attr in s.ast().attrs.iter().filter(|a| a.path().is_ident("mw")) {
        attr.parse_nested_meta(|meta| opts.parse(meta))?;
    }
    let prefix = opts.prepend_all.as_deref();

    match s.ast().data {
        Data::Union(_) => Err(syn::Error::new(s.ast().span(), "unions are not supported")),
        Data::Struct(_) => Ok(write_params_impl(&s, prefix)),
        Data::Enum(_) if opts.unnamed => Ok(write_params_impl(&s, prefix)),
        Data::Enum(_) => named_enum_impl(&s, prefix),
    }
}
