use super::{LimitPlacement, QueryService};

/// MySQL: `` `backtick` `` quoting, trailing `limit n`, identity via `last_insert_id()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl QueryService for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_chars(&self) -> (char, char) {
        ('`', '`')
    }

    fn limit_placement(&self) -> LimitPlacement {
        LimitPlacement::Trailing
    }

    fn get_identity_return(&self, _column: &str) -> String {
        "; select last_insert_id()".to_string()
    }

    fn get_insert_into(
        &self,
        table: &str,
        columns: &[&str],
        parameters: &[String],
        identity: Option<&str>,
    ) -> String {
        let mut sql = format!(
            "insert into {} ({}) values ({})",
            self.format_table_and_column(table),
            self.get_columns(columns).trim(),
            parameters.join(",")
        );
        if let Some(identity) = identity {
            sql.push_str(&self.get_identity_return(identity));
        }
        sql
    }
}
