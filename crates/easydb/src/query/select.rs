use super::Statement;
use crate::command::Command;
use crate::condition::Check;
use crate::container::ConditionAndParameterContainer;
use crate::db::Db;
use crate::dialect::{LimitPlacement, QueryService};
use crate::error::{DbError, DbResult};
use crate::guard::not_empty;
use crate::mapping::Table;
use crate::model::Model;

/// SELECT builder.
#[derive(Debug, Clone)]
pub struct Select {
    table: String,
    columns: Vec<String>,
    filter: Option<Check>,
    order_by: Vec<String>,
    limit: Option<u64>,
    page: Option<(u64, u64)>,
}

impl Select {
    /// Select every column (`*`) from `table`.
    pub fn new(table: &str) -> DbResult<Self> {
        Ok(Self {
            table: not_empty(table, "table name")?.trim().to_string(),
            columns: Vec::new(),
            filter: None,
            order_by: Vec::new(),
            limit: None,
            page: None,
        })
    }

    /// Select the non-ignored property columns of `table`, mapped or not.
    pub fn from_table(table: &Table) -> Self {
        Self {
            table: table.name().to_string(),
            columns: table
                .selectable_columns()
                .into_iter()
                .map(str::to_string)
                .collect(),
            filter: None,
            order_by: Vec::new(),
            limit: None,
            page: None,
        }
    }

    /// Replace the projected columns. An empty list selects `*`.
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Set the WHERE condition; a second call ANDs onto the first.
    pub fn filter(mut self, check: Check) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(check),
            None => check,
        });
        self
    }

    /// Add an order-by entry: `column`, `column asc` or `column desc`.
    pub fn order_by(mut self, entry: &str) -> Self {
        self.order_by.push(entry.to_string());
        self
    }

    /// Limit the number of rows returned.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Pagination helper. `page` is 1-based (clamped to >= 1), `per_page` is
    /// clamped to >= 1; the offset saturates at `u64::MAX`. Overrides [`Self::limit`].
    pub fn page(mut self, page: u64, per_page: u64) -> Self {
        let per_page = per_page.max(1);
        let offset = (page.max(1) - 1).saturating_mul(per_page);
        self.page = Some((offset, per_page));
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn condition(&self) -> Option<&Check> {
        self.filter.as_ref()
    }

    /// Run the query and resolve every row into `M`.
    pub async fn fetch_all<M: Model>(&self, db: &Db) -> DbResult<Vec<M>> {
        let command = self.build(db.dialect())?;
        db.read_all::<M>(&command).await
    }

    /// Run the query and resolve the first row into `M`.
    pub async fn fetch_one<M: Model>(&self, db: &Db) -> DbResult<Option<M>> {
        let command = self.build(db.dialect())?;
        db.read_one::<M>(&command).await
    }
}

impl Statement for Select {
    fn build(&self, dialect: &dyn QueryService) -> DbResult<Command> {
        let container = self
            .filter
            .as_ref()
            .map(|check| ConditionAndParameterContainer::resolve(check, dialect))
            .transpose()?;

        let columns: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        let top = if self.page.is_none() { self.limit } else { None };

        let mut sql = dialect.get_select(top, &columns);
        sql.push_str(&dialect.get_from(&self.table));
        sql.push_str(&dialect.get_where(container.as_ref()));
        sql.push_str(&dialect.get_order_by(&self.order_by)?);

        match (self.page, self.limit) {
            (Some((offset, fetch)), _) => {
                if self.order_by.is_empty() && dialect.pagination_requires_order_by() {
                    return Err(DbError::invalid_sort(format!(
                        "{} pagination requires an order by",
                        dialect.name()
                    )));
                }
                sql.push_str(&dialect.get_pagination(offset, fetch));
            }
            (None, Some(n)) if dialect.limit_placement() == LimitPlacement::Trailing => {
                sql.push_str(&dialect.get_limit(n));
            }
            _ => {}
        }

        let mut command = Command::new(sql)?;
        if let Some(container) = &container {
            command.extend_parameters(container.parameters().into_iter().cloned());
        }
        Ok(command)
    }
}
