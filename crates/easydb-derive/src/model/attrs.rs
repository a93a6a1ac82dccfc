//! Attribute parsing for the Model derive macro.
//!
//! Handles struct-level `#[easydb(table = "...")]` and field-level
//! `#[easydb(key, generated, ignore, skip, scalar, column = "...")]`.

use syn::{DeriveInput, Field, Result};

/// Parsed field-level attributes.
#[derive(Default)]
pub(super) struct FieldAttr {
    pub key: bool,
    pub generated: bool,
    pub ignore: bool,
    pub skip: bool,
    /// Treat the field as a scalar even when its type is not recognized.
    pub scalar: bool,
    pub column: Option<String>,
}

impl FieldAttr {
    fn merge(&mut self, other: FieldAttr) {
        self.key |= other.key;
        self.generated |= other.generated;
        self.ignore |= other.ignore;
        self.skip |= other.skip;
        self.scalar |= other.scalar;
        if other.column.is_some() {
            self.column = other.column;
        }
    }
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            match ident.to_string().as_str() {
                "key" | "id" => attr.key = true,
                "generated" => attr.generated = true,
                "ignore" => attr.ignore = true,
                "skip" => attr.skip = true,
                "scalar" => attr.scalar = true,
                "column" => {
                    let _: syn::Token![=] = input.parse()?;
                    let value: syn::LitStr = input.parse()?;
                    if value.value().trim().is_empty() {
                        return Err(syn::Error::new(value.span(), "column name must not be empty"));
                    }
                    attr.column = Some(value.value());
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown easydb field attribute `{other}`"),
                    ));
                }
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        Ok(attr)
    }
}

/// Collect every `#[easydb(...)]` on a field into one [`FieldAttr`].
pub(super) fn field_attr(field: &Field) -> Result<FieldAttr> {
    let mut merged = FieldAttr::default();
    for attr in &field.attrs {
        if attr.path().is_ident("easydb") {
            merged.merge(attr.parse_args::<FieldAttr>()?);
        }
    }
    Ok(merged)
}

/// Extract the table name from `#[easydb(table = "...")]`, if present.
pub(super) fn get_table_name(input: &DeriveInput) -> Result<Option<String>> {
    for attr in &input.attrs {
        if !attr.path().is_ident("easydb") {
            continue;
        }
        let nested = attr.parse_args::<syn::MetaNameValue>()?;
        if !nested.path.is_ident("table") {
            return Err(syn::Error::new_spanned(
                &nested.path,
                "unknown easydb struct attribute, expected `table = \"...\"`",
            ));
        }
        if let syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(lit),
            ..
        }) = &nested.value
        {
            if lit.value().trim().is_empty() {
                return Err(syn::Error::new(lit.span(), "table name must not be empty"));
            }
            return Ok(Some(lit.value()));
        }
        return Err(syn::Error::new_spanned(&nested.value, "table must be a string literal"));
    }
    Ok(None)
}
