use super::*;
use crate::error::DbError;
use crate::test_models::{Post, Tag};
use crate::value::ValueKind;

#[test]
fn discover_follows_declaration_order_and_markers() {
    let table = Table::discover::<Post>().unwrap();
    assert_eq!(table.name(), "posts");
    let names: Vec<_> = table.columns().map(|c| c.column_name.as_str()).collect();
    assert_eq!(names, vec!["id", "title", "body", "views", "preview", "author_id"]);

    let id = table.column("id").unwrap();
    assert!(id.is_primary_key());
    assert!(id.is_database_generated);
    assert!(!id.is_writable());

    let body = table.column("body").unwrap();
    assert_eq!(body.property_name(), "content");
    assert_eq!(body.property.kind, ValueKind::Text);
    assert!(body.property.nullable);

    assert!(table.column("preview").unwrap().is_ignored);
    assert_eq!(table.primary_keys().count(), 1);
}

#[test]
fn explicit_registration_validates_property() {
    let err = Table::new::<Post>("posts")
        .unwrap()
        .set_column("x", "not a name")
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidIdentifier(_)));

    let err = Table::new::<Post>("posts")
        .unwrap()
        .set_column("x", "missing")
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidArgument(_)));
}

#[test]
fn duplicate_column_is_rejected() {
    let err = Table::new::<Post>("posts")
        .unwrap()
        .set_column("title", "title")
        .unwrap()
        .set_column("title", "content")
        .unwrap_err();
    assert!(matches!(err, DbError::DuplicateColumn { .. }));
}

#[test]
fn lookup_by_property_name() {
    let table = Table::new::<Post>("blog.posts")
        .unwrap()
        .set_primary_key_column("post_id", "id", ColumnOptions::generated())
        .unwrap()
        .set_column("body", "content")
        .unwrap()
        .set_foreign_key_column("author", "author_id", "authors", "id")
        .unwrap();

    assert_eq!(table.column_by_property_name("id").unwrap().column_name, "post_id");
    assert!(table.contains_property("content"));
    assert!(!table.contains_property("title"));
    let fk = table.column("author").unwrap();
    assert_eq!(
        fk.kind,
        ColumnKind::ForeignKey {
            table_referenced: "authors".into(),
            primary_key_referenced: "id".into()
        }
    );
    assert_eq!(table.foreign_keys().count(), 1);
}

#[test]
fn write_column_sets_exclude_generated_ignored_and_filtered() {
    let table = Table::discover::<Post>().unwrap();
    let insert: Vec<_> = table.insertable_columns().map(|c| c.column_name).collect();
    assert_eq!(insert, vec!["title", "body", "views", "author_id"]);

    let update: Vec<_> = table
        .updatable_columns(&["views"])
        .map(|c| c.column_name)
        .collect();
    assert_eq!(update, vec!["title", "body", "author_id"]);

    assert_eq!(
        table.selectable_columns(),
        vec!["id", "title", "body", "views", "author_id"]
    );
}

#[test]
fn unmapped_properties_fall_back_to_descriptor_columns() {
    let table = Table::new::<Post>("posts")
        .unwrap()
        .set_primary_key_column("post_id", "id", ColumnOptions::generated())
        .unwrap()
        .set_column("title", "content")
        .unwrap();

    let resolved: Vec<_> = table
        .property_columns()
        .into_iter()
        .map(|c| (c.column_name, c.property_name(), c.is_mapped))
        .collect();
    assert_eq!(
        resolved,
        vec![
            ("post_id", "id", true),
            ("title", "content", true),
            ("views", "views", false),
            ("preview", "preview", false),
            ("author_id", "author_id", false),
        ]
    );

    assert_eq!(table.selectable_columns(), vec!["post_id", "title", "views", "author_id"]);
    let insert: Vec<_> = table.insertable_columns().map(|c| c.property_name()).collect();
    assert_eq!(insert, vec!["content", "views", "author_id"]);
    let keys: Vec<_> = table.key_columns().map(|c| c.column_name).collect();
    assert_eq!(keys, vec!["post_id"]);
}

#[test]
fn minimal_table_still_exposes_every_property() {
    let table = Table::minimal::<Post>().unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(
        table.selectable_columns(),
        vec!["id", "title", "body", "views", "author_id"]
    );
    let update: Vec<_> = table.updatable_columns(&[]).map(|c| c.column_name).collect();
    assert_eq!(update, vec!["title", "body", "views", "author_id"]);
}

#[test]
fn container_discovers_lazily() {
    let container = MappingContainer::new(DefaultMappingBehavior::ReflectionDiscovery);
    assert!(!container.contains::<Post>());
    let table = container.get::<Post>().unwrap();
    assert_eq!(table.len(), 6);
    assert!(container.contains::<Post>());
    assert!(container.get_by_table_name("POSTS").is_some());
}

#[test]
fn container_minimal_and_none_behaviors() {
    let minimal = MappingContainer::new(DefaultMappingBehavior::CreateMinimalTableWithPrimaryKeyOnly);
    let table = minimal.get::<Tag>().unwrap();
    let names: Vec<_> = table.columns().map(|c| c.column_name.as_str()).collect();
    assert_eq!(names, vec!["code"]);

    let strict = MappingContainer::new(DefaultMappingBehavior::None);
    assert!(matches!(strict.get::<Tag>(), Err(DbError::NotMapped(_))));

    let table = strict
        .set_table::<Tag>("labels")
        .unwrap()
        .set_primary_key_column("code", "code", ColumnOptions::default())
        .unwrap();
    strict.register(table);
    assert_eq!(strict.get::<Tag>().unwrap().name(), "labels");

    assert!(strict.unregister::<Tag>().is_some());
    assert!(!strict.contains::<Tag>());
}

#[test]
fn intermediate_table_filters_by_target() {
    let join = IntermediateTable::new("posts_tags")
        .unwrap()
        .set_join_column("post_id", "posts", "id")
        .unwrap()
        .set_join_column("tag_code", "tags", "code")
        .unwrap();

    let to_tags: Vec<_> = join.join_columns_for("tags").map(|(c, _)| c).collect();
    assert_eq!(to_tags, vec!["tag_code"]);
    assert_eq!(join.join_column("post_id").unwrap().target_primary_key, "id");

    assert!(matches!(
        join.clone().set_join_column("post_id", "posts", "id"),
        Err(DbError::DuplicateColumn { .. })
    ));

    let container = MappingContainer::default();
    container.set_intermediate_table(join);
    assert!(container.get_intermediate_table("POSTS_TAGS").is_some());
}
