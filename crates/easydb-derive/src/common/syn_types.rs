//! Type helper utilities for syn type analysis.

/// Extract the inner type T from Option<T>, or return None if not an Option type.
///
/// Recognizes `Option<T>`, `std::option::Option<T>`, and `core::option::Option<T>`.
pub fn option_inner(ty: &syn::Type) -> Option<&syn::Type> {
    generic_inner(ty, "Option")
}

/// Extract the inner type T from Vec<T>, or return None if not a Vec type.
pub fn vec_inner(ty: &syn::Type) -> Option<&syn::Type> {
    generic_inner(ty, "Vec")
}

fn generic_inner<'a>(ty: &'a syn::Type, wrapper: &str) -> Option<&'a syn::Type> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let seg = type_path.path.segments.last()?;
    if seg.ident != wrapper {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    let syn::GenericArgument::Type(inner) = args.args.first()? else {
        return None;
    };
    Some(inner)
}

fn last_ident(ty: &syn::Type) -> Option<String> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    type_path.path.segments.last().map(|s| s.ident.to_string())
}

/// Whether `ty` is one of the column-mappable scalars (or `Option` of one).
///
/// Matches on the last path segment: `bool`, `i16`, `i32`, `i64`, `f32`, `f64`,
/// `String`, `char`, `Vec<u8>`, `NaiveDate`, `NaiveDateTime`, `DateTime<_>` and `Uuid`.
pub fn is_scalar(ty: &syn::Type) -> bool {
    let ty = option_inner(ty).unwrap_or(ty);
    if let Some(inner) = vec_inner(ty) {
        return last_ident(inner).as_deref() == Some("u8");
    }
    matches!(
        last_ident(ty).as_deref(),
        Some(
            "bool"
                | "i16"
                | "i32"
                | "i64"
                | "f32"
                | "f64"
                | "String"
                | "char"
                | "NaiveDate"
                | "NaiveDateTime"
                | "DateTime"
                | "Uuid"
        )
    )
}
