use crate::condition::Check;
use crate::error::{DbError, DbResult};
use crate::guard::{self, NameChecker};
use crate::query::Select;
use crate::value::Value;
use indexmap::IndexMap;

/// Where a join column points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTarget {
    pub target_primary_key: String,
    pub target_table_name: String,
}

/// A many-to-many join table.
///
/// # Example
///
/// ```ignore
/// let posts_tags = IntermediateTable::new("posts_tags")?
///     .set_join_column("post_id", "posts", "id")?
///     .set_join_column("tag_id", "tags", "id")?;
///
/// // select [tag_id] from [posts_tags] where [post_id]=@post_id
/// let select = posts_tags.select_targets("posts", 7, "tags")?;
/// # Ok::<(), easydb::DbError>(())
/// ```
#[derive(Debug, Clone)]
pub struct IntermediateTable {
    name: String,
    join_columns: IndexMap<String, JoinTarget>,
}

impl IntermediateTable {
    pub fn new(name: &str) -> DbResult<Self> {
        NameChecker::check(guard::not_empty(name, "Intermediate table name")?)?;
        Ok(Self {
            name: name.to_string(),
            join_columns: IndexMap::new(),
        })
    }

    /// Register a join column pointing at `target_table.target_primary_key`.
    pub fn set_join_column(
        mut self,
        column_name: &str,
        target_table_name: &str,
        target_primary_key: &str,
    ) -> DbResult<Self> {
        let column_name = guard::not_empty(column_name, "Join column name")?;
        if self.join_columns.contains_key(column_name) {
            return Err(DbError::DuplicateColumn {
                table: self.name.clone(),
                column: column_name.to_string(),
            });
        }
        self.join_columns.insert(
            column_name.to_string(),
            JoinTarget {
                target_primary_key: guard::not_empty(target_primary_key, "Target primary key")?
                    .to_string(),
                target_table_name: guard::not_empty(target_table_name, "Target table")?
                    .to_string(),
            },
        );
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn join_column(&self, column_name: &str) -> Option<&JoinTarget> {
        self.join_columns.get(column_name)
    }

    pub fn join_columns(&self) -> impl Iterator<Item = (&str, &JoinTarget)> {
        self.join_columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Join columns pointing at `target_table_name`.
    pub fn join_columns_for<'a>(
        &'a self,
        target_table_name: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a JoinTarget)> {
        self.join_columns()
            .filter(move |(_, t)| t.target_table_name.eq_ignore_ascii_case(target_table_name))
    }

    /// Select the join columns pointing at `target_table` for the rows whose
    /// `source_table` join column equals `source_key`.
    pub fn select_targets(
        &self,
        source_table: &str,
        source_key: impl Into<Value>,
        target_table: &str,
    ) -> DbResult<Select> {
        let (source_column, _) = self.join_columns_for(source_table).next().ok_or_else(|| {
            DbError::invalid_argument(format!(
                "{} has no join column for table '{source_table}'",
                self.name
            ))
        })?;
        let targets: Vec<&str> = self.join_columns_for(target_table).map(|(c, _)| c).collect();
        if targets.is_empty() {
            return Err(DbError::invalid_argument(format!(
                "{} has no join column for table '{target_table}'",
                self.name
            )));
        }
        Ok(Select::new(&self.name)?
            .columns(&targets)
            .filter(Check::op(source_column, source_key)?))
    }
}
