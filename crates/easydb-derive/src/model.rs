//! Model derive macro implementation
//!
//! ## Module Structure
//!
//! - `attrs`: Struct and field attribute parsing

mod attrs;

use crate::common::syn_types::is_scalar;
use attrs::{field_attr, get_table_name};
use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, Result};

/// One field that made it into the descriptor.
struct PropertyField {
    ident: syn::Ident,
    name: String,
    ty: syn::Type,
    column: Option<String>,
    key: bool,
    generated: bool,
    ignore: bool,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Model cannot be derived for generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Model can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Model can only be derived for structs",
            ));
        }
    };

    let table_name = get_table_name(&input)?.unwrap_or_else(|| ident.to_string().to_snake_case());
    let type_name = ident.to_string();

    let mut properties = Vec::new();
    for field in fields {
        let attr = field_attr(field)?;
        if attr.skip {
            continue;
        }
        if !attr.scalar && !is_scalar(&field.ty) {
            // Nested models and collections are not column-mapped.
            continue;
        }
        let Some(field_ident) = field.ident.clone() else {
            continue;
        };
        if attr.generated && attr.ignore {
            return Err(syn::Error::new_spanned(
                field,
                "a field cannot be both `generated` and `ignore`",
            ));
        }
        properties.push(PropertyField {
            name: field_ident.unraw().to_string(),
            ident: field_ident,
            ty: field.ty.clone(),
            column: attr.column,
            key: attr.key,
            generated: attr.generated,
            ignore: attr.ignore,
        });
    }

    // Without an explicit key, a field named `id` is the key.
    if !properties.iter().any(|p| p.key) {
        if let Some(id) = properties
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case("id") && !p.ignore)
        {
            id.key = true;
        }
    }

    let descriptors = properties.iter().map(descriptor_tokens);

    let get_arms = properties.iter().map(|p| {
        let name = &p.name;
        let field = &p.ident;
        quote! {
            #name => ::core::option::Option::Some(::easydb::ScalarValue::to_value(&self.#field)),
        }
    });

    let set_arms = properties.iter().map(|p| {
        let name = &p.name;
        let field = &p.ident;
        let ty = &p.ty;
        quote! {
            #name => {
                self.#field = <#ty as ::easydb::FromValue>::from_value(value)?;
            }
        }
    });

    Ok(quote! {
        const _: () = {
            static DESCRIPTOR: ::easydb::ModelDescriptor = ::easydb::ModelDescriptor {
                type_name: #type_name,
                table_name: #table_name,
                properties: &[#(#descriptors),*],
            };

            impl ::easydb::Model for #ident {
                fn descriptor() -> &'static ::easydb::ModelDescriptor {
                    &DESCRIPTOR
                }

                #[allow(unreachable_patterns)]
                fn get_property(&self, name: &str) -> ::core::option::Option<::easydb::Value> {
                    match name {
                        #(#get_arms)*
                        _ => ::core::option::Option::None,
                    }
                }

                #[allow(unreachable_code, unused_variables)]
                fn set_property(
                    &mut self,
                    name: &str,
                    value: ::easydb::Value,
                ) -> ::easydb::DbResult<bool> {
                    match name {
                        #(#set_arms)*
                        _ => return ::core::result::Result::Ok(false),
                    }
                    ::core::result::Result::Ok(true)
                }
            }
        };
    })
}

fn descriptor_tokens(p: &PropertyField) -> TokenStream {
    let name = &p.name;
    let ty = &p.ty;
    let mut tokens = quote! {
        ::easydb::PropertyDescriptor::new(
            #name,
            <#ty as ::easydb::ScalarValue>::KIND,
            <#ty as ::easydb::ScalarValue>::NULLABLE,
        )
    };
    if let Some(column) = &p.column {
        tokens = quote! { #tokens.column(#column) };
    }
    if p.key {
        tokens = quote! { #tokens.key() };
    }
    if p.generated {
        tokens = quote! { #tokens.generated() };
    }
    if p.ignore {
        tokens = quote! { #tokens.ignored() };
    }
    tokens
}
