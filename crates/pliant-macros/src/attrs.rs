//! Shared helpers for the derive macros.

use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Field, Fields, Ident, LitStr, Path};

/// Default path of the core crate in generated code.
pub fn default_crate_path() -> Path {
    syn::parse_quote!(::pliant_core)
}

/// Parses `crate = "path"`.
pub fn parse_crate_path(meta: &ParseNestedMeta) -> syn::Result<Path> {
    meta.value()?.parse::<LitStr>()?.parse::<Path>()
}

/// The named fields of a non-generic struct.
pub fn named_fields<'a>(input: &'a DeriveInput, derive: &str) -> syn::Result<Vec<&'a Field>> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            format!("{derive} cannot be derived for generic types"),
        ));
    }

    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(fields.named.iter().collect()),
            _ => Err(syn::Error::new(
                input.span(),
                format!("{derive} requires a struct with named fields"),
            )),
        },
        Data::Enum(_) => Err(syn::Error::new(
            input.span(),
            format!("{derive} cannot be derived for enums"),
        )),
        Data::Union(_) => Err(syn::Error::new(
            input.span(),
            format!("{derive} cannot be derived for unions"),
        )),
    }
}

/// The key a field is addressed by, without any `r#` prefix.
pub fn field_key(field: &Field) -> syn::Result<String> {
    field
        .ident
        .as_ref()
        .map(|ident| ident.unraw().to_string())
        .ok_or_else(|| syn::Error::new(field.span(), "expected a named field"))
}

pub fn field_ident(field: &Field) -> syn::Result<Ident> {
    field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new(field.span(), "expected a named field"))
}
