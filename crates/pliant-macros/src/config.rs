//! `#[derive(Config)]` implementation.
//!
//! Generates four impls for the annotated struct:
//!
//! 1. `FromValue` - builds from a dict when the node opts into `default`, fails otherwise
//! 2. `Slot` - dict assignment merges field by field; lifecycle passes recurse
//! 3. `Container` - fixed field set addressed by name
//! 4. `ConfigNode` - field/method tables, finalize hook and method dispatch
//!
//! # Struct-level `#[config(...)]`
//!
//! | Key | Example | Description |
//! |-----|---------|-------------|
//! | `finalize` | `finalize = finish` | Hook called after every child is finalized |
//! | `methods` | `methods(reset, scale)` | Methods exposed to `.name(args)` commands |
//! | `crate` | `crate = "pliant::core"` | Path of the core crate |
//! | `default` | `default` | Node is `Default`; dict literals build it from the defaults |
//!
//! # Field-level `#[config(...)]`
//!
//! | Key | Description |
//! |-----|-------------|
//! | `skip` | Field is invisible to overrides, rendering and lifecycle passes |

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, DeriveInput, Ident, Path};

use crate::attrs::{default_crate_path, field_ident, field_key, named_fields, parse_crate_path};

// ============================================================================
// Attribute structures
// ============================================================================

struct NodeAttrs {
    finalize: Option<Path>,
    from_default: bool,
    methods: Vec<Ident>,
    krate: Path,
}

// ============================================================================
// Entry point
// ============================================================================

pub fn derive_config(input: &DeriveInput) -> syn::Result<TokenStream> {
    let attrs = parse_struct_attrs(&input.attrs)?;
    let fields = named_fields(input, "Config")?;

    let mut keys = Vec::new();
    let mut idents = Vec::new();
    for field in fields {
        if is_skipped(&field.attrs)? {
            continue;
        }
        keys.push(field_key(field)?);
        idents.push(field_ident(field)?);
    }

    Ok(generate(input, &attrs, &keys, &idents))
}

// ============================================================================
// Attribute parsing
// ============================================================================

fn parse_struct_attrs(attrs: &[Attribute]) -> syn::Result<NodeAttrs> {
    let mut result = NodeAttrs {
        finalize: None,
        from_default: false,
        methods: Vec::new(),
        krate: default_crate_path(),
    };

    for attr in attrs {
        if !attr.path().is_ident("config") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("finalize") {
                result.finalize = Some(meta.value()?.parse::<Path>()?);
            } else if meta.path.is_ident("methods") {
                meta.parse_nested_meta(|method| {
                    let ident = method
                        .path
                        .get_ident()
                        .cloned()
                        .ok_or_else(|| method.error("expected a method name"))?;
                    result.methods.push(ident);
                    Ok(())
                })?;
            } else if meta.path.is_ident("default") {
                result.from_default = true;
            } else if meta.path.is_ident("crate") {
                result.krate = parse_crate_path(&meta)?;
            } else if meta.path.is_ident("skip") {
                return Err(meta.error("`skip` applies to fields, not to the struct"));
            } else {
                return Err(meta.error("unsupported config attribute"));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

fn is_skipped(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut skipped = false;
    for attr in attrs {
        if !attr.path().is_ident("config") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skipped = true;
                Ok(())
            } else {
                Err(meta.error("unsupported field attribute, expected `skip`"))
            }
        })?;
    }
    Ok(skipped)
}

// ============================================================================
// Code generation
// ============================================================================

fn generate(
    input: &DeriveInput,
    attrs: &NodeAttrs,
    keys: &[String],
    idents: &[Ident],
) -> TokenStream {
    let name = &input.ident;
    let name_str = name.to_string();
    let krate = &attrs.krate;

    let method_keys: Vec<String> = attrs.methods.iter().map(|m| m.to_string()).collect();
    let method_idents = &attrs.methods;

    let finalize_body = match &attrs.finalize {
        Some(path) => match path.get_ident() {
            Some(ident) => quote! { Self::#ident(self) },
            None => quote! { #path(self) },
        },
        None => quote! { ::std::result::Result::Ok(()) },
    };

    let from_value_body = if attrs.from_default {
        quote! {
            let mut node = <Self as ::std::default::Default>::default();
            #krate::lifecycle::merge_into_node(&mut node, value)?;
            ::std::result::Result::Ok(node)
        }
    } else {
        quote! {
            ::std::result::Result::Err(#krate::CoerceError::new(
                #name_str,
                ::std::format!(
                    "config nodes cannot be built from a {} literal; assign their fields instead",
                    value.kind_name()
                ),
            ))
        }
    };

    quote! {
        impl #krate::FromValue for #name {
            fn type_label() -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed(#name_str)
            }

            fn from_value(value: #krate::Value) -> #krate::CoerceResult<Self> {
                #from_value_body
            }
        }

        impl #krate::Slot for #name {
            fn type_label(&self) -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed(#name_str)
            }

            fn assign(&mut self, value: #krate::Value) -> #krate::CoerceResult<()> {
                #krate::lifecycle::merge_into_node(self, value)
            }

            fn to_value(&self) -> #krate::Value {
                #krate::lifecycle::to_dict(self)
            }

            fn as_container(&self) -> ::std::option::Option<&dyn #krate::Container> {
                ::std::option::Option::Some(self)
            }

            fn as_container_mut(&mut self) -> ::std::option::Option<&mut dyn #krate::Container> {
                ::std::option::Option::Some(self)
            }

            fn enforce_required(
                &self,
                path: &str,
            ) -> ::std::result::Result<(), #krate::RequiredFieldError> {
                #krate::lifecycle::enforce_node(self, path)
            }

            fn finalize_tree(
                &mut self,
                path: &str,
            ) -> ::std::result::Result<(), #krate::LifecycleError> {
                #krate::lifecycle::finalize_node(self, path)
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }

        impl #krate::Container for #name {
            fn kind(&self) -> #krate::ContainerKind {
                #krate::ContainerKind::Node
            }

            fn contains(&self, key: &str) -> bool {
                <Self as #krate::ConfigNode>::field_names(self).contains(&key)
            }

            fn slot(&self, key: &str) -> ::std::option::Option<&dyn #krate::Slot> {
                match key {
                    #( #keys => ::std::option::Option::Some(&self.#idents as &dyn #krate::Slot), )*
                    _ => ::std::option::Option::None,
                }
            }

            fn slot_mut(&mut self, key: &str) -> ::std::option::Option<&mut dyn #krate::Slot> {
                match key {
                    #( #keys => ::std::option::Option::Some(&mut self.#idents as &mut dyn #krate::Slot), )*
                    _ => ::std::option::Option::None,
                }
            }

            fn has_method(&self, name: &str) -> bool {
                <Self as #krate::ConfigNode>::method_names(self).contains(&name)
            }

            fn as_node_mut(&mut self) -> ::std::option::Option<&mut dyn #krate::ConfigNode> {
                ::std::option::Option::Some(self)
            }

            fn key_names(&self) -> ::std::vec::Vec<::std::string::String> {
                <Self as #krate::ConfigNode>::field_names(self)
                    .iter()
                    .map(|key| ::std::string::ToString::to_string(key))
                    .collect()
            }
        }

        impl #krate::ConfigNode for #name {
            fn type_name(&self) -> &'static str {
                #name_str
            }

            fn field_names(&self) -> &'static [&'static str] {
                &[#(#keys),*]
            }

            fn method_names(&self) -> &'static [&'static str] {
                &[#(#method_keys),*]
            }

            fn finalize(&mut self) -> #krate::HookResult {
                #finalize_body
            }

            fn call(&mut self, method: &str, args: #krate::CallArgs) -> #krate::HookResult {
                match method {
                    #( #method_keys => Self::#method_idents(self, args), )*
                    _ => {
                        let _ = args;
                        ::std::result::Result::Err(
                            #krate::CallError::unknown_method(#name_str, method).into(),
                        )
                    }
                }
            }
        }
    }
}
