//! `#[derive(Record)]` implementation.
//!
//! Generates `impl Record` with a lazily built descriptor (one `FieldSpec`
//! per field, held in a `OnceLock`) and a `from_fields` constructor.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, DeriveInput, Expr, Ident, Path, Type};

use crate::attrs::{default_crate_path, field_ident, field_key, named_fields, parse_crate_path};

/// How a field obtains its default.
enum FieldDefault {
    None,
    Trait,
    Expr(Expr),
}

struct RecordField {
    ident: Ident,
    key: String,
    ty: Type,
    default: FieldDefault,
}

pub fn derive_record(input: &DeriveInput) -> syn::Result<TokenStream> {
    let krate = parse_struct_attrs(&input.attrs)?;

    let mut fields = Vec::new();
    for field in named_fields(input, "Record")? {
        fields.push(RecordField {
            ident: field_ident(field)?,
            key: field_key(field)?,
            ty: field.ty.clone(),
            default: parse_field_default(&field.attrs)?,
        });
    }

    Ok(generate(input, &krate, &fields))
}

fn parse_struct_attrs(attrs: &[Attribute]) -> syn::Result<Path> {
    let mut krate = default_crate_path();
    for attr in attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("crate") {
                krate = parse_crate_path(&meta)?;
                Ok(())
            } else {
                Err(meta.error("unsupported record attribute"))
            }
        })?;
    }
    Ok(krate)
}

fn parse_field_default(attrs: &[Attribute]) -> syn::Result<FieldDefault> {
    let mut default = FieldDefault::None;
    for attr in attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if !meta.path.is_ident("default") {
                return Err(meta.error("unsupported field attribute, expected `default`"));
            }
            default = if meta.input.peek(syn::Token![=]) {
                FieldDefault::Expr(meta.value()?.parse::<Expr>()?)
            } else {
                FieldDefault::Trait
            };
            Ok(())
        })?;
    }
    Ok(default)
}

fn generate(input: &DeriveInput, krate: &Path, fields: &[RecordField]) -> TokenStream {
    let name = &input.ident;
    let name_str = name.to_string();

    let specs = fields.iter().map(|field| {
        let key = &field.key;
        let ty = &field.ty;
        let default = match &field.default {
            FieldDefault::None => quote! { ::std::option::Option::None },
            FieldDefault::Trait => quote! {
                ::std::option::Option::Some(|| {
                    let value: #ty = ::std::default::Default::default();
                    #krate::Slot::to_value(&value)
                })
            },
            FieldDefault::Expr(expr) => quote! {
                ::std::option::Option::Some(|| {
                    let value: #ty = ::std::convert::Into::into(#expr);
                    #krate::Slot::to_value(&value)
                })
            },
        };
        quote! {
            #krate::FieldSpec {
                name: #key,
                type_label: <#ty as #krate::FromValue>::type_label(),
                coerce: #krate::record::coerce_field::<#ty>,
                default: #default,
            }
        }
    });

    let inits = fields.iter().map(|field| {
        let ident = &field.ident;
        let key = &field.key;
        quote! {
            #ident: #krate::record::take_field(&mut fields, #name_str, #key)?
        }
    });

    quote! {
        impl #krate::Record for #name {
            fn descriptor() -> &'static #krate::RecordDescriptor {
                static DESCRIPTOR: ::std::sync::OnceLock<#krate::RecordDescriptor> =
                    ::std::sync::OnceLock::new();
                DESCRIPTOR.get_or_init(|| #krate::RecordDescriptor {
                    type_name: #name_str,
                    fields: ::std::vec![#(#specs),*],
                })
            }

            #[allow(unused_mut, unused_variables)]
            fn from_fields(mut fields: #krate::Dict) -> #krate::CoerceResult<Self> {
                ::std::result::Result::Ok(Self {
                    #(#inits,)*
                })
            }
        }
    }
}
