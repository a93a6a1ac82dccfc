//! Condition model for WHERE clauses.
//!
//! A [`Check`] is one condition over one column plus an ordered chain of
//! `(Joiner, Check)` entries. `a.and(b).or(c)` keeps `a` as the main condition
//! and renders `a and b or c` in insertion order, with SQL's own precedence.
//! A chained check that carries its own chain renders as a parenthesized
//! group, so `a.and(b.or(c))` renders `a and (b or c)`.
//!
//! # Example
//! ```ignore
//! use easydb::Check;
//!
//! let check = Check::op_with("a", "<", 10)?
//!     .and(Check::op_with("b", ">", 20)?)
//!     .or(Check::between("c", 60, 100)?);
//! # Ok::<(), easydb::DbError>(())
//! ```

use crate::error::{DbError, DbResult};
use crate::guard;
use crate::value::Value;

/// Comparison operators accepted by [`Check::op_with`].
pub const COMPARISON_OPERATORS: &[&str] = &["=", "<>", "!=", "<", "<=", ">", ">="];

/// How a chained condition attaches to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joiner {
    And,
    Or,
}

impl Joiner {
    pub fn as_sql(self) -> &'static str {
        match self {
            Joiner::And => "and",
            Joiner::Or => "or",
        }
    }
}

/// Variant-specific payload of a [`Check`].
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column <operator> value`
    Op { operator: String, value: Value },
    /// `column like pattern`
    Like { pattern: Value },
    /// `column between low and high`
    Between { low: Value, high: Value },
    /// `column is null` / `column is not null`
    IsNull { negated: bool },
}

impl Condition {
    /// Returns `true` for plain comparison conditions.
    pub fn is_comparison(&self) -> bool {
        matches!(self, Condition::Op { .. })
    }
}

/// A condition node with its chained sub-conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    column: String,
    condition: Condition,
    chain: Vec<(Joiner, Check)>,
}

impl Check {
    fn new(column: &str, condition: Condition) -> DbResult<Self> {
        guard::not_empty(column, "Check column")?;
        Ok(Self {
            column: column.to_string(),
            condition,
            chain: Vec::new(),
        })
    }

    /// Equality condition: `column = value`.
    pub fn op(column: &str, value: impl Into<Value>) -> DbResult<Self> {
        Self::op_with(column, "=", value)
    }

    /// Comparison with an explicit operator (`=`, `<>`, `!=`, `<`, `<=`, `>`, `>=`).
    pub fn op_with(column: &str, operator: &str, value: impl Into<Value>) -> DbResult<Self> {
        let operator = guard::not_empty(operator, "Check operator")?.trim();
        if !COMPARISON_OPERATORS.contains(&operator) {
            return Err(DbError::invalid_argument(format!(
                "unsupported comparison operator '{operator}'"
            )));
        }
        Self::new(
            column,
            Condition::Op {
                operator: operator.to_string(),
                value: value.into(),
            },
        )
    }

    /// `column != value`
    pub fn ne(column: &str, value: impl Into<Value>) -> DbResult<Self> {
        Self::op_with(column, "!=", value)
    }

    /// `column > value`
    pub fn gt(column: &str, value: impl Into<Value>) -> DbResult<Self> {
        Self::op_with(column, ">", value)
    }

    /// `column >= value`
    pub fn gte(column: &str, value: impl Into<Value>) -> DbResult<Self> {
        Self::op_with(column, ">=", value)
    }

    /// `column < value`
    pub fn lt(column: &str, value: impl Into<Value>) -> DbResult<Self> {
        Self::op_with(column, "<", value)
    }

    /// `column <= value`
    pub fn lte(column: &str, value: impl Into<Value>) -> DbResult<Self> {
        Self::op_with(column, "<=", value)
    }

    /// `column like pattern`
    pub fn like(column: &str, pattern: impl Into<Value>) -> DbResult<Self> {
        Self::new(
            column,
            Condition::Like {
                pattern: pattern.into(),
            },
        )
    }

    /// `column between low and high`
    pub fn between(column: &str, low: impl Into<Value>, high: impl Into<Value>) -> DbResult<Self> {
        Self::new(
            column,
            Condition::Between {
                low: low.into(),
                high: high.into(),
            },
        )
    }

    /// `column is null`
    pub fn is_null(column: &str) -> DbResult<Self> {
        Self::new(column, Condition::IsNull { negated: false })
    }

    /// `column is not null`
    pub fn is_not_null(column: &str) -> DbResult<Self> {
        Self::new(column, Condition::IsNull { negated: true })
    }

    /// Append `and other` to the chain.
    pub fn and(mut self, other: Check) -> Self {
        self.chain.push((Joiner::And, other));
        self
    }

    /// Append `or other` to the chain.
    pub fn or(mut self, other: Check) -> Self {
        self.chain.push((Joiner::Or, other));
        self
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn chain(&self) -> &[(Joiner, Check)] {
        &self.chain
    }

    /// Returns `true` if this check has chained conditions.
    pub fn has_chain(&self) -> bool {
        !self.chain.is_empty()
    }

    /// Every column referenced by this check and its chain, in SQL order.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = vec![self.column.as_str()];
        for (_, check) in &self.chain {
            out.extend(check.columns());
        }
        out
    }
}
