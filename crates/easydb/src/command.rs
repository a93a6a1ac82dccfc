//! Rendered statements handed to a driver.

use crate::error::{DbError, DbResult};
use crate::value::Value;

/// How the driver should interpret command text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandKind {
    /// Plain SQL text.
    #[default]
    Text,
    /// Name of a stored procedure.
    StoredProcedure,
}

/// A named bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Name including the dialect's sigil (e.g. `@title`).
    pub name: String,
    pub value: Value,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Command text plus its bound parameters, in the order they appear in the text.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    text: String,
    kind: CommandKind,
    parameters: Vec<Parameter>,
}

impl Command {
    /// Create a plain-SQL command. Fails with `InvalidCommandText` on blank text.
    pub fn new(text: impl Into<String>) -> DbResult<Self> {
        Self::with_kind(text, CommandKind::Text)
    }

    pub fn with_kind(text: impl Into<String>, kind: CommandKind) -> DbResult<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(DbError::InvalidCommandText);
        }
        Ok(Self {
            text,
            kind,
            parameters: Vec::new(),
        })
    }

    /// Bind a parameter by name.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.push(Parameter::new(name, value));
        self
    }

    pub fn push_parameter(&mut self, parameter: Parameter) {
        self.parameters.push(parameter);
    }

    pub fn extend_parameters(&mut self, parameters: impl IntoIterator<Item = Parameter>) {
        self.parameters.extend(parameters);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Look up a bound parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}
