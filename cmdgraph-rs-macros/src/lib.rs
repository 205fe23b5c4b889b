use std::collections::HashSet;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr};

/// Derives `cmdgraph::provider::Choice` for a unit-only enum.
///
/// # Usage
///
/// ```ignore
/// #[derive(Choice)]
/// #[choice(name = "body type")]
/// enum BodyType {
///     Planet,
///     #[choice(alias = "dwarf")]
///     DwarfPlanet,
/// }
/// ```
///
/// This will generate:
///
/// ```ignore
/// impl cmdgraph::provider::Choice for BodyType {
///     const NAME: &'static str = "body type";
///
///     fn choices() -> &'static [&'static str] {
///         &["planet", "dwarfplanet"]
///     }
///
///     fn from_choice(normalized: &str) -> Option<Self> {
///         match normalized {
///             "planet" => Some(BodyType::Planet),
///             "dwarfplanet" | "dwarf" => Some(BodyType::DwarfPlanet),
///             _ => None,
///         }
///     }
/// }
/// ```
///
/// Names and aliases are normalized the same way user input is: lowercased,
/// with everything but ASCII letters and digits removed.
#[proc_macro_derive(Choice, attributes(choice))]
pub fn derive_choice(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_choice(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_choice(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let enum_name = &input.ident;
    let display_name = match extract_string(&input.attrs, "name")?.as_slice() {
        [] => enum_name.to_string(),
        [name] => name.value(),
        [_, extra, ..] => return Err(syn::Error::new(extra.span(), "duplicate `name`")),
    };

    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            enum_name,
            "Choice can only be derived for enums",
        ));
    };

    let mut seen = HashSet::new();
    let mut primaries = Vec::new();
    let mut match_arms = Vec::new();

    for variant in &data.variants {
        let variant_name = &variant.ident;
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Choice variants cannot carry fields",
            ));
        }

        let primary = normalize(&variant_name.to_string());
        let mut names = vec![primary.clone()];
        for alias in extract_string(&variant.attrs, "alias")? {
            names.push(normalize(&alias.value()));
        }

        for name in &names {
            if name.is_empty() {
                return Err(syn::Error::new_spanned(
                    variant,
                    "choice name has no letters or digits",
                ));
            }
            if !seen.insert(name.clone()) {
                return Err(syn::Error::new_spanned(
                    variant,
                    format!("choice name `{}` is used more than once", name),
                ));
            }
        }

        primaries.push(primary);
        match_arms.push(quote! {
            #(#names)|* => ::core::option::Option::Some(#enum_name::#variant_name),
        });
    }

    Ok(quote! {
        impl ::cmdgraph::provider::Choice for #enum_name {
            const NAME: &'static str = #display_name;

            fn choices() -> &'static [&'static str] {
                &[#(#primaries),*]
            }

            fn from_choice(normalized: &str) -> ::core::option::Option<Self> {
                match normalized {
                    #(#match_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    })
}

/// Collect every `key = "..."` from `#[choice(...)]` attributes.
fn extract_string(attrs: &[syn::Attribute], key: &str) -> syn::Result<Vec<LitStr>> {
    let mut values = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("choice") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident(key) {
                values.push(meta.value()?.parse::<LitStr>()?);
                Ok(())
            } else if meta.path.is_ident("name") || meta.path.is_ident("alias") {
                // Handled by the other lookup; skip its value.
                meta.value()?.parse::<LitStr>()?;
                Ok(())
            } else {
                Err(meta.error("expected `name` or `alias`"))
            }
        })?;
    }
    Ok(values)
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
