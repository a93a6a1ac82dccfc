use super::{LimitPlacement, QueryService};

/// SQLite: same surface as PostgreSQL (`"quote"`, `limit n`, `returning`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl QueryService for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_chars(&self) -> (char, char) {
        ('"', '"')
    }

    fn limit_placement(&self) -> LimitPlacement {
        LimitPlacement::Trailing
    }
}
