//! Derive macros for orbit-rs. Use `#[derive(Component)]` instead of writing `impl Component for T`
//! and listing alias views by hand.

use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{parenthesized, parse_macro_input, DeriveInput, Token, Type};

/// Implements the `Component` trait. Alias views are listed in the `component` attribute:
///
/// ```ignore
/// #[derive(Component)]
/// #[component(aliases(dyn SolarSystemApi))]
/// struct SolarSystemComponent { /* ... */ }
/// ```
///
/// Requires `Component` and `Alias` to be in scope (e.g. `use orbit_rs::{Alias, Component}`).
#[proc_macro_derive(Component, attributes(component))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut aliases: Vec<Type> = Vec::new();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("component")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("aliases") {
                let content;
                parenthesized!(content in meta.input);
                let types = Punctuated::<Type, Token![,]>::parse_terminated(&content)?;
                aliases.extend(types);
                Ok(())
            } else {
                Err(meta.error("expected `aliases(...)`"))
            }
        })?;
    }

    if aliases.is_empty() {
        return Ok(quote! {
            impl #impl_generics Component for #name #ty_generics #where_clause {}
        });
    }

    Ok(quote! {
        impl #impl_generics Component for #name #ty_generics #where_clause {
            fn aliases() -> ::std::vec::Vec<Alias<Self>> {
                ::std::vec![
                    #(
                        Alias::<Self>::of::<#aliases>(
                            |component: ::std::sync::Arc<Self>| -> ::std::sync::Arc<#aliases> { component }
                        )
                    ),*
                ]
            }
        }
    })
}
