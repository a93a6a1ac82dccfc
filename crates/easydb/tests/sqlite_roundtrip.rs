//! End-to-end tests over the embedded SQLite adapter.
//!
//! Each test uses its own database file under the system temp directory so the
//! `Automatic` strategy (open and close around every statement) keeps data
//! between statements.

#![allow(dead_code)]

use easydb::prelude::*;
use easydb::{ColumnOptions, ConnectionState, MappingContainer};
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Default, Clone, PartialEq, Model)]
#[easydb(table = "articles")]
struct Article {
    #[easydb(key, generated)]
    id: i64,
    title: String,
    #[easydb(column = "body")]
    content: Option<String>,
    views: i32,
    published: bool,
    #[easydb(ignore)]
    summary: String,
    tags: Vec<String>,
}

/// Reader-side shape for a hand-registered mapping.
#[derive(Debug, Default, Model)]
struct Headline {
    article_id: i64,
    text: String,
}

struct TempDb(PathBuf);

impl TempDb {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("easydb-{}.db", uuid::Uuid::new_v4()));
        Self(path)
    }

    fn path(&self) -> String {
        self.0.to_string_lossy().into_owned()
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

async fn setup(file: &TempDb) -> Db {
    let db = Db::new(DbConfig::new("sqlite", file.path()), Arc::new(SqliteDriver)).unwrap();
    db.non_query(
        &Command::new(
            "create table articles (
                id integer primary key autoincrement,
                title text not null,
                body text,
                views integer not null default 0,
                published integer not null default 0
            )",
        )
        .unwrap(),
    )
    .await
    .unwrap();
    db
}

fn article(title: &str, views: i32) -> Article {
    Article {
        title: title.to_string(),
        content: Some(format!("{title} body")),
        views,
        published: views > 10,
        summary: "not stored".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn insert_and_read_back_through_discovered_mapping() {
    let file = TempDb::new();
    let db = setup(&file).await;

    let id = db.insert_model_returning_id(&article("rust in practice   ", 42)).await.unwrap();
    assert_eq!(id, Value::I64(1));
    assert_eq!(db.insert_model(&article("sql basics", 3)).await.unwrap(), 1);

    let found: Option<Article> = db.find_one(Check::op("id", 1).unwrap()).await.unwrap();
    let found = found.unwrap();
    assert_eq!(found.id, 1);
    assert_eq!(found.title, "rust in practice");
    assert_eq!(found.content.as_deref(), Some("rust in practice    body"));
    assert_eq!(found.views, 42);
    assert!(found.published);
    assert_eq!(found.summary, "");
    assert!(found.tags.is_empty());

    // Automatic strategy leaves the connection closed between statements.
    assert_eq!(db.state().await, ConnectionState::Closed);
}

#[tokio::test]
async fn filters_sorting_and_pages() {
    let file = TempDb::new();
    let db = setup(&file).await;
    for (title, views) in [("rust a", 5), ("rust b", 50), ("go c", 70), ("rust d", 90)] {
        db.insert_model(&article(title, views)).await.unwrap();
    }

    let popular: Vec<Article> = db
        .select::<Article>()
        .unwrap()
        .filter(Check::gt("views", 10).unwrap().and(Check::like("title", "rust%").unwrap()))
        .order_by("views desc")
        .fetch_all(&db)
        .await
        .unwrap();
    let titles: Vec<_> = popular.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, ["rust d", "rust b"]);

    let page: Vec<Article> = db
        .select::<Article>()
        .unwrap()
        .order_by("id")
        .page(2, 2)
        .fetch_all(&db)
        .await
        .unwrap();
    let titles: Vec<_> = page.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, ["go c", "rust d"]);

    let between: Vec<Article> = db
        .find(Check::between("views", 40, 80).unwrap())
        .await
        .unwrap();
    assert_eq!(between.len(), 2);

    let drafts: Vec<Article> = db.find(Check::is_null("body").unwrap()).await.unwrap();
    assert!(drafts.is_empty());
}

#[tokio::test]
async fn update_and_delete_models() {
    let file = TempDb::new();
    let db = setup(&file).await;
    db.insert_model(&article("draft", 1)).await.unwrap();

    let mut stored: Article = db.find_one(Check::op("id", 1).unwrap()).await.unwrap().unwrap();
    stored.title = "final".to_string();
    stored.content = None;
    assert_eq!(db.update_model(&stored).await.unwrap(), 1);

    let reread: Article = db.find_one(Check::op("id", 1).unwrap()).await.unwrap().unwrap();
    assert_eq!(reread.title, "final");
    assert_eq!(reread.content, None);

    let missing = Article { id: 99, ..stored.clone() };
    let err = db.update_model_checked(&missing).await.unwrap_err();
    assert!(err.is_concurrency_conflict());

    assert_eq!(db.delete_model(&stored).await.unwrap(), 1);
    let count = db
        .scalar(&Command::new("select count(*) from articles").unwrap())
        .await
        .unwrap();
    assert_eq!(count, Value::I64(0));
}

#[tokio::test]
async fn builder_update_uniquifies_shared_column_parameters() {
    let file = TempDb::new();
    let db = setup(&file).await;
    db.insert_model(&article("a", 5)).await.unwrap();
    db.insert_model(&article("b", 7)).await.unwrap();

    let affected = db
        .update("articles")
        .unwrap()
        .set("views", 100)
        .filter(Check::op("views", 5).unwrap())
        .execute(&db)
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let rows = db
        .query_rows(&Command::new("select title, views from articles order by id").unwrap())
        .await
        .unwrap();
    assert_eq!(rows[0].try_get::<i32>("views").unwrap(), 100);
    assert_eq!(rows[1].try_get::<i32>("views").unwrap(), 7);
}

#[tokio::test]
async fn hand_registered_mapping_reads_renamed_columns() {
    let file = TempDb::new();
    let db = setup(&file).await;
    db.insert_model(&article("mapped", 1)).await.unwrap();

    let table = db
        .mappings()
        .set_table::<Headline>("articles")
        .unwrap()
        .set_primary_key_column("id", "article_id", ColumnOptions::default())
        .unwrap()
        .set_column("title", "text")
        .unwrap();
    db.mappings().register(table);

    let headlines: Vec<Headline> = db.select::<Headline>().unwrap().fetch_all(&db).await.unwrap();
    assert_eq!(headlines.len(), 1);
    assert_eq!(headlines[0].article_id, 1);
    assert_eq!(headlines[0].text, "mapped");
}

#[tokio::test]
async fn execution_errors_propagate_without_subscribers() {
    let file = TempDb::new();
    let db = Db::new(DbConfig::new("sqlite", file.path()), Arc::new(SqliteDriver)).unwrap();

    let err = db
        .query_rows(&Command::new("select * from nowhere").unwrap())
        .await
        .unwrap_err();
    assert!(err.is_execution());
    assert_eq!(err.phase(), Some(Phase::ReadAll));
}

#[tokio::test]
async fn subscribed_channel_absorbs_execution_errors() {
    let file = TempDb::new();
    let db = Db::new(DbConfig::new("sqlite", file.path()), Arc::new(SqliteDriver)).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = db.errors().subscribe(move |event: &ErrorEvent| {
        let text = event.command.as_ref().map(|c| c.text().to_string());
        sink.lock().unwrap().push((event.phase, text));
    });

    let rows: Vec<Article> = db
        .read_all(&Command::new("select * from nowhere").unwrap())
        .await
        .unwrap();
    assert!(rows.is_empty());
    let affected = db
        .non_query(&Command::new("delete from nowhere").unwrap())
        .await
        .unwrap();
    assert_eq!(affected, 0);

    {
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], (Phase::ReadAll, Some("select * from nowhere".to_string())));
        assert_eq!(seen[1].0, Phase::NonQuery);
    }

    // Validation errors never reach the channel.
    assert!(db.update("articles").unwrap().execute(&db).await.is_err());
    assert_eq!(seen.lock().unwrap().len(), 2);

    assert!(db.errors().unsubscribe(id));
    assert!(db.scalar(&Command::new("select x from nowhere").unwrap()).await.is_err());
}

#[tokio::test]
async fn manual_strategy_keeps_the_connection_open() {
    let config = DbConfig::new("sqlite", ":memory:").strategy(ConnectionStrategy::Manual);
    let db = Db::new(config, Arc::new(SqliteDriver)).unwrap();

    // Not opened yet: the driver has no handle.
    assert!(db.non_query(&Command::new("select 1").unwrap()).await.is_err());

    db.open().await.unwrap();
    assert_eq!(db.state().await, ConnectionState::Open);

    db.non_query(&Command::new("create table notes (id integer primary key, text text)").unwrap())
        .await
        .unwrap();
    db.insert_into("notes")
        .unwrap()
        .value("text", "kept")
        .execute(&db)
        .await
        .unwrap();
    let text = db
        .scalar(&Command::new("select text from notes").unwrap())
        .await
        .unwrap();
    assert_eq!(text, Value::Text("kept".into()));
    assert_eq!(db.state().await, ConnectionState::Open);

    db.close().await.unwrap();
    assert_eq!(db.state().await, ConnectionState::Closed);
}

#[tokio::test]
async fn shared_global_mapping_registry() {
    let file = TempDb::new();
    let first = setup(&file).await.with_mappings(MappingContainer::global());
    let second = Db::new(DbConfig::new("sqlite", file.path()), Arc::new(SqliteDriver))
        .unwrap()
        .with_mappings(MappingContainer::global());

    first.insert_model(&article("shared", 1)).await.unwrap();
    let table = first.table::<Article>().unwrap();
    assert!(Arc::ptr_eq(&table, &second.table::<Article>().unwrap()));

    let all: Vec<Article> = second.find(Check::op("title", "shared").unwrap()).await.unwrap();
    assert_eq!(all.len(), 1);
}
