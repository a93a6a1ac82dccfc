use super::Statement;
use crate::command::{Command, Parameter};
use crate::container::ParameterNamer;
use crate::db::Db;
use crate::dialect::QueryService;
use crate::error::{DbError, DbResult};
use crate::guard::not_empty;
use crate::mapping::Table;
use crate::model::Model;
use crate::value::Value;

/// INSERT builder.
#[derive(Debug, Clone)]
pub struct Insert {
    table: String,
    values: Vec<(String, Value)>,
    identity: Option<String>,
}

impl Insert {
    pub fn new(table: &str) -> DbResult<Self> {
        Ok(Self {
            table: not_empty(table, "table name")?.trim().to_string(),
            values: Vec::new(),
            identity: None,
        })
    }

    /// Values of the model's non-generated, non-ignored properties, under their
    /// mapped column names (or their own when the table does not map them).
    pub fn from_model<M: Model>(table: &Table, model: &M) -> Self {
        let values = table
            .insertable_columns()
            .map(|column| {
                let value = model
                    .get_property(column.property_name())
                    .unwrap_or_default();
                (column.column_name.to_string(), value)
            })
            .collect();
        Self {
            table: table.name().to_string(),
            values,
            identity: None,
        }
    }

    /// Add one column value.
    pub fn value(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.values.push((column.to_string(), value.into()));
        self
    }

    /// Return the generated value of `column` from the insert.
    pub fn returning_identity(mut self, column: &str) -> Self {
        self.identity = Some(column.to_string());
        self
    }

    pub fn has_identity(&self) -> bool {
        self.identity.is_some()
    }

    pub fn values(&self) -> &[(String, Value)] {
        &self.values
    }

    /// Run as a non-query; returns the affected row count.
    pub async fn execute(&self, db: &Db) -> DbResult<u64> {
        let command = self.build(db.dialect())?;
        db.non_query(&command).await
    }

    /// Run as a scalar; returns the generated identity.
    pub async fn execute_scalar(&self, db: &Db) -> DbResult<Value> {
        if self.identity.is_none() {
            return Err(DbError::invalid_argument(
                "execute_scalar requires returning_identity",
            ));
        }
        let command = self.build(db.dialect())?;
        db.scalar(&command).await
    }

    fn validate(&self) -> DbResult<()> {
        let mut seen = std::collections::HashSet::new();
        for (column, _) in &self.values {
            not_empty(column, "column name")?;
            if !seen.insert(column.to_ascii_lowercase()) {
                return Err(DbError::DuplicateColumn {
                    table: self.table.clone(),
                    column: column.clone(),
                });
            }
        }
        if let Some(identity) = &self.identity {
            not_empty(identity, "identity column")?;
        }
        Ok(())
    }
}

impl Statement for Insert {
    fn build(&self, dialect: &dyn QueryService) -> DbResult<Command> {
        self.validate()?;

        let mut namer = ParameterNamer::default();
        let parameters: Vec<Parameter> = self
            .values
            .iter()
            .map(|(column, value)| {
                Parameter::new(namer.issue(dialect.get_parameter_name(column)), value.clone())
            })
            .collect();

        let columns: Vec<&str> = self.values.iter().map(|(c, _)| c.as_str()).collect();
        let names: Vec<String> = parameters.iter().map(|p| p.name.clone()).collect();
        let sql = dialect.get_insert_into(&self.table, &columns, &names, self.identity.as_deref());

        let mut command = Command::new(sql)?;
        command.extend_parameters(parameters);
        Ok(command)
    }
}
