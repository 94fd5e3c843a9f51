//! Derive macros for tie-core data objects.
//!
//! This crate provides the `#[derive(Bindable)]` macro, which turns a struct
//! with named fields into a `tie_core::Object` whose keys are the field names.
//!
//! # Example
//!
//! ```ignore
//! use tie_core::{Action, Bindable};
//!
//! #[derive(Bindable)]
//! #[bind(rename_all = "camelCase")]
//! struct Profile {
//!     first_name: String,
//!
//!     #[bind(rename = "years")]
//!     age: u32,
//!
//!     #[bind(skip)]
//!     cache_key: u64,
//!
//!     save: Action,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Data, DeriveInput, Error, Fields, Ident, LitStr};

/// Derive macro for implementing the `Bindable` trait.
///
/// # Attributes
///
/// ## Struct-level
///
/// - `#[bind(rename_all = "...")]` - Key casing: `"camelCase"`, `"PascalCase"`,
///   `"kebab-case"` or `"snake_case"` (the default).
///
/// ## Field-level
///
/// - `#[bind(rename = "...")]` - Use a custom key for the field.
/// - `#[bind(skip)]` - Leave the field out of the object.
///
/// Every kept field's type must convert into `tie_core::Value`.
///
/// # Generated Code
///
/// The macro generates:
/// - `Bindable` trait implementation
/// - `From<Name>` for `tie_core::Object` and `tie_core::Value`
#[proc_macro_derive(Bindable, attributes(bind))]
pub fn derive_bindable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_bindable_impl(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_bindable_impl(input: DeriveInput) -> Result<TokenStream2, Error> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "Bindable cannot be derived for generic structs",
        ));
    }

    let struct_attrs = parse_struct_attrs(&input)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(Error::new(
                    name.span(),
                    "Bindable can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                name.span(),
                "Bindable can only be derived for structs",
            ))
        }
    };

    let mut bound_fields = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let attrs = parse_field_attrs(field)?;
        if attrs.skip {
            continue;
        }

        let key = match attrs.rename {
            Some(key) => key,
            None => struct_attrs.rename_all.apply(&unraw(field_name)),
        };
        if key.is_empty() || key.contains('.') {
            return Err(Error::new(
                field_name.span(),
                format!("Key '{}' must be non-empty and must not contain '.'", key),
            ));
        }
        if bound_fields.iter().any(|f: &BoundField| f.key == key) {
            return Err(Error::new(
                field_name.span(),
                format!("Duplicate key '{}'", key),
            ));
        }

        bound_fields.push(BoundField {
            name: field_name.clone(),
            key,
        });
    }

    let keys: Vec<_> = bound_fields.iter().map(|f| f.key.as_str()).collect();
    let inserts: Vec<_> = bound_fields
        .iter()
        .map(|f| {
            let field = &f.name;
            let key = &f.key;
            quote! { .with(#key, self.#field) }
        })
        .collect();

    let expanded = quote! {
        impl ::tie_core::Bindable for #name {
            fn keys() -> &'static [&'static str] {
                &[#(#keys),*]
            }

            fn into_object(self) -> ::tie_core::Object {
                ::tie_core::Object::new()
                    #(#inserts)*
            }
        }

        impl ::core::convert::From<#name> for ::tie_core::Object {
            fn from(value: #name) -> Self {
                ::tie_core::Bindable::into_object(value)
            }
        }

        impl ::core::convert::From<#name> for ::tie_core::Value {
            fn from(value: #name) -> Self {
                ::tie_core::Value::Object(::tie_core::Bindable::into_object(value))
            }
        }
    };

    Ok(expanded)
}

/// A kept field and its object key.
struct BoundField {
    name: Ident,
    key: String,
}

/// Key casing applied to field names.
#[derive(Default, Clone, Copy)]
enum RenameRule {
    #[default]
    Snake,
    Camel,
    Pascal,
    Kebab,
}

impl RenameRule {
    fn parse(value: &LitStr) -> Result<Self, Error> {
        match value.value().as_str() {
            "snake_case" => Ok(Self::Snake),
            "camelCase" => Ok(Self::Camel),
            "PascalCase" => Ok(Self::Pascal),
            "kebab-case" => Ok(Self::Kebab),
            other => Err(Error::new(
                value.span(),
                format!(
                    "unknown rename_all rule '{}', expected 'snake_case', 'camelCase', 'PascalCase' or 'kebab-case'",
                    other
                ),
            )),
        }
    }

    fn apply(self, field: &str) -> String {
        match self {
            Self::Snake => field.to_string(),
            Self::Kebab => field.replace('_', "-"),
            Self::Camel | Self::Pascal => {
                let mut out = String::with_capacity(field.len());
                let mut upper = matches!(self, Self::Pascal);
                for c in field.chars() {
                    if c == '_' {
                        upper = !out.is_empty() || matches!(self, Self::Pascal);
                    } else if upper {
                        out.extend(c.to_uppercase());
                        upper = false;
                    } else {
                        out.push(c);
                    }
                }
                out
            }
        }
    }
}

/// Parsed struct-level bind attributes.
#[derive(Default)]
struct StructAttrs {
    rename_all: RenameRule,
}

/// Parse #[bind(...)] on the struct.
fn parse_struct_attrs(input: &DeriveInput) -> Result<StructAttrs, Error> {
    let mut result = StructAttrs::default();

    for attr in &input.attrs {
        if !attr.path().is_ident("bind") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                let value: LitStr = meta.value()?.parse()?;
                result.rename_all = RenameRule::parse(&value)?;
                Ok(())
            } else {
                Err(meta.error("unknown bind attribute, expected 'rename_all'"))
            }
        })?;
    }

    Ok(result)
}

/// Parsed field attributes.
#[derive(Default)]
struct FieldAttrs {
    rename: Option<String>,
    skip: bool,
}

/// Parse #[bind(...)] on a field.
fn parse_field_attrs(field: &syn::Field) -> Result<FieldAttrs, Error> {
    let mut result = FieldAttrs::default();

    for attr in &field.attrs {
        if !attr.path().is_ident("bind") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                result.rename = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("skip") {
                result.skip = true;
                Ok(())
            } else {
                Err(meta.error("unknown field attribute, expected 'rename' or 'skip'"))
            }
        })?;
    }

    Ok(result)
}

/// Field name without a raw identifier prefix.
fn unraw(ident: &Ident) -> String {
    let name = ident.to_string();
    name.strip_prefix("r#").map(str::to_string).unwrap_or(name)
}
