//! Row → model resolution.

use crate::driver::Row;
use crate::error::DbResult;
use crate::mapping::Table;
use crate::model::{Model, PropertyDescriptor};
use crate::value::Value;

/// Materializes rows into models.
///
/// Each field is matched by column name: first against the table mapping (ignored
/// columns are skipped), then against a property of the same name or column
/// override. Unmatched
/// fields are skipped. `NULL` leaves non-nullable properties at their default;
/// text values are right-trimmed.
pub struct ModelResolver;

impl ModelResolver {
    pub fn resolve<M: Model>(row: &Row, table: Option<&Table>) -> DbResult<M> {
        let mut model = M::default();
        for (column, value) in row.iter() {
            let Some(property) = Self::target_property::<M>(column, table) else {
                tracing::debug!(
                    target: "easydb.mapping",
                    model = M::descriptor().type_name,
                    column,
                    "no property for column, skipped"
                );
                continue;
            };
            Self::assign(&mut model, property, value.clone())?;
        }
        Ok(model)
    }

    pub fn resolve_all<M: Model>(rows: &[Row], table: Option<&Table>) -> DbResult<Vec<M>> {
        rows.iter().map(|row| Self::resolve(row, table)).collect()
    }

    fn target_property<M: Model>(
        column: &str,
        table: Option<&Table>,
    ) -> Option<&'static PropertyDescriptor> {
        if let Some(table) = table {
            if let Some(mapped) = table
                .columns()
                .find(|c| c.column_name.eq_ignore_ascii_case(column))
            {
                return (!mapped.is_ignored).then_some(mapped.property);
            }
            if table
                .column_by_property_name(column)
                .is_some_and(|c| c.is_ignored)
            {
                return None;
            }
        }
        let property = M::descriptor().properties.iter().find(|p| {
            p.name.eq_ignore_ascii_case(column) || p.column_name().eq_ignore_ascii_case(column)
        })?;
        (!property.is_ignored).then_some(property)
    }

    fn assign<M: Model>(model: &mut M, property: &PropertyDescriptor, value: Value) -> DbResult<()> {
        if value.is_null() {
            if property.nullable {
                model.set_property(property.name, Value::Null)?;
            } else {
                tracing::debug!(
                    target: "easydb.mapping",
                    model = M::descriptor().type_name,
                    property = property.name,
                    "null for non-nullable property, default kept"
                );
            }
            return Ok(());
        }
        let value = match value.convert(property.kind)? {
            Value::Text(s) => Value::Text(s.trim_end().to_string()),
            other => other,
        };
        model.set_property(property.name, value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::mapping::ColumnOptions;
    use crate::test_models::Post;

    #[test]
    fn resolves_through_mapping_with_trim_and_conversion() {
        let table = Table::discover::<Post>().unwrap();
        let row = Row::from_pairs([
            ("id", Value::I32(5)),
            ("title", Value::from("hello   ")),
            ("body", Value::from("text ")),
            ("views", Value::from("12")),
            ("author_id", Value::Null),
        ]);
        let post: Post = ModelResolver::resolve(&row, Some(&table)).unwrap();
        assert_eq!(post.id, 5);
        assert_eq!(post.title, "hello");
        assert_eq!(post.content.as_deref(), Some("text"));
        assert_eq!(post.views, 12);
        assert_eq!(post.author_id, None);
    }

    #[test]
    fn null_keeps_default_for_non_nullable() {
        let row = Row::from_pairs([("title", Value::Null), ("views", Value::Null)]);
        let post: Post = ModelResolver::resolve(&row, None).unwrap();
        assert_eq!(post, Post::default());
    }

    #[test]
    fn ignored_and_unknown_columns_are_skipped() {
        let table = Table::discover::<Post>().unwrap();
        let row = Row::from_pairs([
            ("preview", Value::from("should not land")),
            ("rank", Value::I32(3)),
        ]);
        let post: Post = ModelResolver::resolve(&row, Some(&table)).unwrap();
        assert_eq!(post.preview, "");
    }

    #[test]
    fn same_name_fallback_honors_mapping_ignore() {
        let table = Table::new::<Post>("posts")
            .unwrap()
            .set_column_with("summary", "title", ColumnOptions::ignored())
            .unwrap();
        let row = Row::from_pairs([("title", Value::from("x")), ("views", Value::I32(2))]);
        let post: Post = ModelResolver::resolve(&row, Some(&table)).unwrap();
        assert_eq!(post.title, "");
        assert_eq!(post.views, 2);
    }

    #[test]
    fn unmapped_property_is_found_by_column_override() {
        let table = Table::minimal::<Post>().unwrap();
        let row = Row::from_pairs([("id", Value::I64(3)), ("body", Value::from("text"))]);
        let post: Post = ModelResolver::resolve(&row, Some(&table)).unwrap();
        assert_eq!(post.id, 3);
        assert_eq!(post.content.as_deref(), Some("text"));
    }

    #[test]
    fn conversion_failure_is_reported() {
        let row = Row::from_pairs([("views", Value::from("many"))]);
        let err = ModelResolver::resolve::<Post>(&row, None).unwrap_err();
        assert!(matches!(err, DbError::Conversion { .. }));
    }
}
