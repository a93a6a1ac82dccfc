//! Statement builders.
//!
//! Each builder is a consuming, single-use value. `build` renders it against a
//! dialect into a [`Command`]; the execution helpers render against the `Db`'s
//! dialect and run the command through it.

mod delete;
mod insert;
mod select;
mod update;

pub use delete::Delete;
pub use insert::Insert;
pub use select::Select;
pub use update::Update;

use crate::command::Command;
use crate::dialect::QueryService;
use crate::error::DbResult;

/// Renders a builder into a command.
pub trait Statement {
    fn build(&self, dialect: &dyn QueryService) -> DbResult<Command>;

    /// Rendered SQL text, for debugging.
    fn to_sql(&self, dialect: &dyn QueryService) -> DbResult<String> {
        Ok(self.build(dialect)?.text().to_string())
    }
}
