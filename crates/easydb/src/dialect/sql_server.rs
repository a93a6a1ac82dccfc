use super::{LimitPlacement, QueryService};

/// SQL Server: `[bracket]` quoting, `select top n`, `output inserted.[id]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl QueryService for SqlServerDialect {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn quote_chars(&self) -> (char, char) {
        ('[', ']')
    }

    fn limit_placement(&self) -> LimitPlacement {
        LimitPlacement::Top
    }

    fn get_identity_return(&self, column: &str) -> String {
        format!(" output inserted.{}", self.format_table_and_column(column))
    }

    // OUTPUT sits between the column list and VALUES.
    fn get_insert_into(
        &self,
        table: &str,
        columns: &[&str],
        parameters: &[String],
        identity: Option<&str>,
    ) -> String {
        let output = identity
            .map(|c| self.get_identity_return(c))
            .unwrap_or_default();
        let table = self.format_table_and_column(table);
        if columns.is_empty() {
            format!("insert into {table}{output} default values")
        } else {
            format!(
                "insert into {table} ({}){output} values ({})",
                self.get_columns(columns).trim_start(),
                parameters.join(",")
            )
        }
    }

    fn get_pagination(&self, offset: u64, fetch: u64) -> String {
        format!(" offset {offset} rows fetch next {fetch} rows only")
    }

    fn pagination_requires_order_by(&self) -> bool {
        true
    }
}
