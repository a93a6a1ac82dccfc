use super::Statement;
use crate::command::Command;
use crate::condition::Check;
use crate::container::ConditionAndParameterContainer;
use crate::db::Db;
use crate::dialect::QueryService;
use crate::error::{DbError, DbResult};
use crate::guard::not_empty;

/// DELETE builder. Requires a WHERE condition.
#[derive(Debug, Clone)]
pub struct Delete {
    table: String,
    filter: Option<Check>,
}

impl Delete {
    pub fn new(table: &str) -> DbResult<Self> {
        Ok(Self {
            table: not_empty(table, "table name")?.trim().to_string(),
            filter: None,
        })
    }

    /// Set the WHERE condition; a second call ANDs onto the first.
    pub fn filter(mut self, check: Check) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(check),
            None => check,
        });
        self
    }

    /// Run as a non-query; returns the affected row count.
    pub async fn execute(&self, db: &Db) -> DbResult<u64> {
        let command = self.build(db.dialect())?;
        db.non_query(&command).await
    }
}

impl Statement for Delete {
    fn build(&self, dialect: &dyn QueryService) -> DbResult<Command> {
        let Some(filter) = &self.filter else {
            return Err(DbError::invalid_argument(format!(
                "delete from '{}' requires a condition",
                self.table
            )));
        };
        let container = ConditionAndParameterContainer::resolve(filter, dialect)?;

        let mut sql = dialect.get_delete(&self.table);
        sql.push_str(&dialect.get_where(Some(&container)));

        let mut command = Command::new(sql)?;
        command.extend_parameters(container.parameters().into_iter().cloned());
        Ok(command)
    }
}
