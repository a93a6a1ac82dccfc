//! Basic usage example for easydb
//!
//! Run with: cargo run --example basic -p easydb
//!
//! Uses an in-memory SQLite database with the `Manual` connection strategy so
//! the schema survives between statements. Set `RUST_LOG=easydb=debug` to see
//! the rendered SQL.

use easydb::prelude::*;
use easydb::SqlServerDialect;

#[derive(Debug, Default, Model)]
#[easydb(table = "posts")]
struct Post {
    #[easydb(key, generated)]
    id: i64,
    title: String,
    #[easydb(column = "body")]
    content: Option<String>,
    views: i32,
}

#[tokio::main]
async fn main() -> Result<(), DbError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = DbConfig::new("sqlite", ":memory:").strategy(ConnectionStrategy::Manual);
    let db = Db::new(config, Arc::new(SqliteDriver))?;
    db.open().await?;

    db.non_query(&Command::new(
        "create table posts (
            id integer primary key autoincrement,
            title text not null,
            body text,
            views integer not null default 0
        )",
    )?)
    .await?;

    // ============================================
    // Insert models
    // ============================================
    println!("=== Insert ===");

    for (title, views) in [("Hello easydb", 12), ("Dialects", 140), ("Mappings", 87)] {
        let post = Post {
            title: title.to_string(),
            content: Some(format!("All about {title}")),
            views,
            ..Default::default()
        };
        let id = db.insert_model_returning_id(&post).await?;
        println!("inserted {title:?} as {id:?}");
    }

    // ============================================
    // Query with conditions
    // ============================================
    println!("\n=== Select ===");

    let popular = db
        .select::<Post>()?
        .filter(Check::gt("views", 50)?.and(Check::is_not_null("body")?))
        .order_by("views desc")
        .limit(10);
    println!("sql: {}", popular.to_sql(db.dialect())?);
    for post in popular.fetch_all::<Post>(&db).await? {
        println!("  #{} {} ({} views)", post.id, post.title, post.views);
    }

    // The same statement rendered for another provider.
    println!("sqlserver: {}", popular.to_sql(&SqlServerDialect)?);

    // ============================================
    // Update and delete
    // ============================================
    println!("\n=== Update / Delete ===");

    let updated = db
        .update("posts")?
        .set("views", 0)
        .filter(Check::lt("views", 50)?)
        .execute(&db)
        .await?;
    println!("reset {updated} post(s)");

    if let Some(mut post) = db.find_one::<Post>(Check::op("title", "Dialects")?).await? {
        post.title = "Dialects, revised".to_string();
        db.update_model_checked(&post).await?;
        println!("renamed post #{}", post.id);
        db.delete_model(&post).await?;
    }

    let remaining = db.scalar(&Command::new("select count(*) from posts")?).await?;
    println!("remaining: {remaining:?}");

    // ============================================
    // Error channel
    // ============================================
    println!("\n=== Error channel ===");

    db.errors().subscribe(|event: &ErrorEvent| {
        println!("  [{}] {}", event.phase, event.error);
    });
    let rows = db.query_rows(&Command::new("select * from missing_table")?).await?;
    println!("absorbed failure, got {} rows", rows.len());

    db.close().await?;
    Ok(())
}
