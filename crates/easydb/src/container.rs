//! Resolution of a [`Check`] tree into rendered fragments and uniquely named parameters.

use crate::command::Parameter;
use crate::condition::{Check, Condition, Joiner};
use crate::dialect::QueryService;
use crate::error::{DbError, DbResult};
use crate::value::Value;
use std::collections::{HashMap, HashSet};

/// Issues parameter names, suffixing the occurrence count on collision
/// (`@a`, `@a2`, `@a3`).
#[derive(Debug, Default)]
pub(crate) struct ParameterNamer {
    counts: HashMap<String, usize>,
    issued: HashSet<String>,
}

impl ParameterNamer {
    pub(crate) fn issue(&mut self, base: String) -> String {
        loop {
            let count = self.counts.entry(base.clone()).or_insert(0);
            *count += 1;
            let candidate = if *count == 1 {
                base.clone()
            } else {
                format!("{base}{count}")
            };
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// One resolved condition node.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionAndParameter {
    pub column_name: String,
    /// SQL fragment, e.g. `[a]<@a`.
    pub fragment: String,
    /// Bound parameters in fragment order: one for comparison and LIKE, two
    /// for BETWEEN, none for IS [NOT] NULL.
    pub parameters: Vec<Parameter>,
    pub is_comparison: bool,
}

impl ConditionAndParameter {
    /// Name of the single bound parameter.
    pub fn parameter_name(&self) -> DbResult<&str> {
        self.single().map(|p| p.name.as_str())
    }

    /// Value of the single bound parameter.
    pub fn value(&self) -> DbResult<&Value> {
        self.single().map(|p| &p.value)
    }

    fn single(&self) -> DbResult<&Parameter> {
        match self.parameters.as_slice() {
            [p] => Ok(p),
            _ => Err(DbError::UnsupportedCondition(format!(
                "condition on '{}' does not bind exactly one value",
                self.column_name
            ))),
        }
    }
}

/// A chained entry: a single condition or a parenthesized group.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedCondition {
    Single(ConditionAndParameter),
    Group(Box<ConditionAndParameterContainer>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainedConditionAndParameter {
    pub joiner: Joiner,
    pub condition: ResolvedCondition,
}

/// The main condition plus its ordered chain, resolved against one dialect.
///
/// Built once per statement; parameter names are unique across the whole tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionAndParameterContainer {
    main: ConditionAndParameter,
    chained: Vec<ChainedConditionAndParameter>,
}

impl ConditionAndParameterContainer {
    /// Resolve `check` with a fresh parameter namespace.
    pub fn resolve(check: &Check, dialect: &dyn QueryService) -> DbResult<Self> {
        Self::resolve_with_reserved(check, dialect, &[])
    }

    /// Resolve `check`, treating `reserved` parameter names as already issued.
    pub fn resolve_with_reserved(
        check: &Check,
        dialect: &dyn QueryService,
        reserved: &[&str],
    ) -> DbResult<Self> {
        let mut namer = ParameterNamer::default();
        for name in reserved {
            namer.issue((*name).to_string());
        }
        Self::resolve_node(check, dialect, &mut namer)
    }

    fn resolve_node(
        check: &Check,
        dialect: &dyn QueryService,
        namer: &mut ParameterNamer,
    ) -> DbResult<Self> {
        let main = resolve_single(check, dialect, namer)?;
        let mut chained = Vec::with_capacity(check.chain().len());
        for (joiner, sub) in check.chain() {
            let condition = if sub.has_chain() {
                ResolvedCondition::Group(Box::new(Self::resolve_node(sub, dialect, namer)?))
            } else {
                ResolvedCondition::Single(resolve_single(sub, dialect, namer)?)
            };
            chained.push(ChainedConditionAndParameter {
                joiner: *joiner,
                condition,
            });
        }
        Ok(Self { main, chained })
    }

    pub fn main(&self) -> &ConditionAndParameter {
        &self.main
    }

    pub fn chained(&self) -> &[ChainedConditionAndParameter] {
        &self.chained
    }

    /// Every bound parameter, in the order it appears in the rendered text.
    pub fn parameters(&self) -> Vec<&Parameter> {
        let mut out: Vec<&Parameter> = self.main.parameters.iter().collect();
        for entry in &self.chained {
            match &entry.condition {
                ResolvedCondition::Single(c) => out.extend(c.parameters.iter()),
                ResolvedCondition::Group(g) => out.extend(g.parameters()),
            }
        }
        out
    }

    /// Render `main joiner next ...` without the leading ` where `.
    pub fn render(&self) -> String {
        let mut sql = self.main.fragment.clone();
        for entry in &self.chained {
            sql.push(' ');
            sql.push_str(entry.joiner.as_sql());
            sql.push(' ');
            match &entry.condition {
                ResolvedCondition::Single(c) => sql.push_str(&c.fragment),
                ResolvedCondition::Group(g) => {
                    sql.push('(');
                    sql.push_str(&g.render());
                    sql.push(')');
                }
            }
        }
        sql
    }
}

fn resolve_single(
    check: &Check,
    dialect: &dyn QueryService,
    namer: &mut ParameterNamer,
) -> DbResult<ConditionAndParameter> {
    let column = check.column();
    let formatted = dialect.format_table_and_column(column);
    let base = dialect.get_parameter_name(column);

    let (fragment, parameters) = match check.condition() {
        Condition::Op { operator, value } => {
            let name = namer.issue(base);
            (
                dialect.get_condition_op(&formatted, operator, &name),
                vec![Parameter::new(name, value.clone())],
            )
        }
        Condition::Like { pattern } => {
            let name = namer.issue(base);
            (
                dialect.get_like(&formatted, &name),
                vec![Parameter::new(name, pattern.clone())],
            )
        }
        Condition::Between { low, high } => {
            let low_name = namer.issue(base.clone());
            let high_name = namer.issue(base);
            (
                dialect.get_between(&formatted, &low_name, &high_name),
                vec![
                    Parameter::new(low_name, low.clone()),
                    Parameter::new(high_name, high.clone()),
                ],
            )
        }
        Condition::IsNull { negated } => (dialect.get_is_null(&formatted, *negated), Vec::new()),
    };

    Ok(ConditionAndParameter {
        column_name: column.to_string(),
        fragment,
        parameters,
        is_comparison: check.condition().is_comparison(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlDialect, SqlServerDialect};

    #[test]
    fn namer_suffixes_occurrence_count() {
        let mut namer = ParameterNamer::default();
        assert_eq!(namer.issue("@a".into()), "@a");
        assert_eq!(namer.issue("@a".into()), "@a2");
        assert_eq!(namer.issue("@a".into()), "@a3");
        assert_eq!(namer.issue("@b".into()), "@b");
    }

    #[test]
    fn namer_skips_names_taken_by_other_columns() {
        let mut namer = ParameterNamer::default();
        assert_eq!(namer.issue("@a2".into()), "@a2");
        assert_eq!(namer.issue("@a".into()), "@a");
        assert_eq!(namer.issue("@a".into()), "@a3");
    }

    #[test]
    fn parameter_name_matches_dialect() {
        let dialect = SqlServerDialect;
        let check = Check::op("Title", "x").unwrap();
        let c = ConditionAndParameterContainer::resolve(&check, &dialect).unwrap();
        assert_eq!(c.main().parameter_name().unwrap(), dialect.get_parameter_name("Title"));
        assert_eq!(c.main().fragment, "[Title]=@title");
        assert!(c.main().is_comparison);
    }

    #[test]
    fn duplicate_column_is_uniquified() {
        let check = Check::op_with("a", "<", 10)
            .unwrap()
            .and(Check::op_with("a", ">", 20).unwrap());
        let c = ConditionAndParameterContainer::resolve(&check, &SqlServerDialect).unwrap();
        assert_eq!(c.render(), "[a]<@a and [a]>@a2");
        let names: Vec<_> = c.parameters().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["@a", "@a2"]);
    }

    #[test]
    fn is_null_binds_nothing() {
        let check = Check::is_null("deleted_at").unwrap();
        let c = ConditionAndParameterContainer::resolve(&check, &MySqlDialect).unwrap();
        assert_eq!(c.main().fragment, "`deleted_at` is null");
        assert!(c.parameters().is_empty());
        assert!(matches!(
            c.main().value(),
            Err(DbError::UnsupportedCondition(_))
        ));
    }

    #[test]
    fn between_binds_two_parameters() {
        let check = Check::between("c", 60, 100).unwrap();
        let c = ConditionAndParameterContainer::resolve(&check, &SqlServerDialect).unwrap();
        assert_eq!(c.main().fragment, "[c] between @c and @c2");
        let values: Vec<_> = c.parameters().iter().map(|p| p.value.clone()).collect();
        assert_eq!(values, vec![Value::I32(60), Value::I32(100)]);
        assert!(c.main().parameter_name().is_err());
    }

    #[test]
    fn reserved_names_push_where_parameters_aside() {
        let check = Check::op("title", "old").unwrap();
        let c = ConditionAndParameterContainer::resolve_with_reserved(
            &check,
            &SqlServerDialect,
            &["@title"],
        )
        .unwrap();
        assert_eq!(c.main().fragment, "[title]=@title2");
    }

    #[test]
    fn nested_chain_renders_as_group() {
        let check = Check::op("a", 1).unwrap().and(
            Check::op("b", 2)
                .unwrap()
                .or(Check::op("a", 3).unwrap()),
        );
        let c = ConditionAndParameterContainer::resolve(&check, &SqlServerDialect).unwrap();
        assert_eq!(c.render(), "[a]=@a and ([b]=@b or [a]=@a2)");
        assert_eq!(c.parameters().len(), 3);
    }
}
