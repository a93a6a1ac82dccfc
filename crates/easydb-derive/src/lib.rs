//! Derive macros for easydb
//!
//! Provides `#[derive(Model)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod common;
mod model;

/// Derive `Model` for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use easydb::Model;
///
/// #[derive(Debug, Default, Model)]
/// #[easydb(table = "posts")]
/// struct Post {
///     #[easydb(key, generated)]
///     id: i64,
///     title: String,
///     #[easydb(column = "body")]
///     content: Option<String>,
///     #[easydb(ignore)]
///     preview: String,
/// }
/// ```
///
/// # Attributes
///
/// Struct level:
/// - `#[easydb(table = "name")]` - Table name (default: type name in snake_case)
///
/// Field level:
/// - `key` - Primary key (default: a field named `id`)
/// - `generated` - Value produced by the database, never inserted
/// - `ignore` - Kept in the descriptor but never read or written
/// - `skip` - Left out of the descriptor entirely
/// - `scalar` - Map a field whose type implements `ScalarValue` but is not a built-in scalar
/// - `column = "name"` - Column name override
///
/// Fields whose type is not a scalar (nested models, `Vec<T>` other than
/// `Vec<u8>`) are not column-mapped.
#[proc_macro_derive(Model, attributes(easydb))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    model::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
