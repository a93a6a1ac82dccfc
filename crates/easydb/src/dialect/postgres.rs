use super::{LimitPlacement, QueryService};

/// PostgreSQL: `"double quote"` quoting, trailing `limit n`, `returning "id"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl QueryService for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_chars(&self) -> (char, char) {
        ('"', '"')
    }

    fn limit_placement(&self) -> LimitPlacement {
        LimitPlacement::Trailing
    }
}
