use super::Statement;
use crate::command::{Command, Parameter};
use crate::condition::Check;
use crate::container::{ConditionAndParameterContainer, ParameterNamer};
use crate::db::Db;
use crate::dialect::QueryService;
use crate::error::{DbError, DbResult};
use crate::guard::not_empty;
use crate::mapping::Table;
use crate::model::Model;
use crate::value::Value;

/// UPDATE builder. Requires at least one assignment and a WHERE condition.
#[derive(Debug, Clone)]
pub struct Update {
    table: String,
    assignments: Vec<(String, Value)>,
    filter: Option<Check>,
}

impl Update {
    pub fn new(table: &str) -> DbResult<Self> {
        Ok(Self {
            table: not_empty(table, "table name")?.trim().to_string(),
            assignments: Vec::new(),
            filter: None,
        })
    }

    /// Assign the model's writable columns, skipping primary keys and every
    /// column referenced by `filter`.
    pub fn from_model<M: Model>(table: &Table, model: &M, filter: Check) -> Self {
        let excluded = filter.columns();
        let assignments = table
            .updatable_columns(&excluded)
            .map(|column| {
                let value = model
                    .get_property(column.property_name())
                    .unwrap_or_default();
                (column.column_name.to_string(), value)
            })
            .collect();
        Self {
            table: table.name().to_string(),
            assignments,
            filter: Some(filter),
        }
    }

    /// Add one `column = value` assignment.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.assignments.push((column.to_string(), value.into()));
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

    pub fn assignments(&self) -> &[(String, Value)] {
        &self.assignments
    }

    /// Run as a non-query; returns the affected row count.
    pub async fn execute(&self, db: &Db) -> DbResult<u64> {
        let command = self.build(db.dialect())?;
        db.non_query(&command).await
    }
}

impl Statement for Update {
    fn build(&self, dialect: &dyn QueryService) -> DbResult<Command> {
        if self.assignments.is_empty() {
            return Err(DbError::invalid_argument(format!(
                "update of '{}' has no columns to set",
                self.table
            )));
        }
        let Some(filter) = &self.filter else {
            return Err(DbError::invalid_argument(format!(
                "update of '{}' requires a condition",
                self.table
            )));
        };

        let mut namer = ParameterNamer::default();
        let mut parameters = Vec::with_capacity(self.assignments.len());
        for (column, value) in &self.assignments {
            not_empty(column, "column name")?;
            let name = namer.issue(dialect.get_parameter_name(column));
            parameters.push(Parameter::new(name, value.clone()));
        }

        let reserved: Vec<&str> = parameters.iter().map(|p| p.name.as_str()).collect();
        let container = ConditionAndParameterContainer::resolve_with_reserved(filter, dialect, &reserved)?;

        let pairs: Vec<(&str, &str)> = self
            .assignments
            .iter()
            .zip(&parameters)
            .map(|((column, _), p)| (column.as_str(), p.name.as_str()))
            .collect();
        let mut sql = dialect.get_update(&self.table, &pairs);
        sql.push_str(&dialect.get_where(Some(&container)));

        let mut command = Command::new(sql)?;
        command.extend_parameters(parameters);
        command.extend_parameters(container.parameters().into_iter().cloned());
        Ok(command)
    }
}
