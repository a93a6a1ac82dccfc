use crate::model::PropertyDescriptor;

/// Role of a column within its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    Regular,
    PrimaryKey,
    ForeignKey {
        table_referenced: String,
        primary_key_referenced: String,
    },
}

/// Flags applied when registering a column explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnOptions {
    /// Value is produced by the database; never inserted or updated.
    pub database_generated: bool,
    /// Column is never written and never read into the model.
    pub ignored: bool,
}

impl ColumnOptions {
    pub fn generated() -> Self {
        Self {
            database_generated: true,
            ignored: false,
        }
    }

    pub fn ignored() -> Self {
        Self {
            database_generated: false,
            ignored: true,
        }
    }
}

/// A mapped column.
#[derive(Debug, Clone)]
pub struct Column {
    /// Owning table name.
    pub table_name: String,
    /// Rust type name of the model.
    pub model_type: &'static str,
    /// Column name in the database.
    pub column_name: String,
    /// The model property this column reads into and writes from.
    pub property: &'static PropertyDescriptor,
    pub is_database_generated: bool,
    pub is_ignored: bool,
    pub kind: ColumnKind,
}

impl Column {
    pub fn property_name(&self) -> &'static str {
        self.property.name
    }

    pub fn is_primary_key(&self) -> bool {
        matches!(self.kind, ColumnKind::PrimaryKey)
    }

    pub fn is_foreign_key(&self) -> bool {
        matches!(self.kind, ColumnKind::ForeignKey { .. })
    }

    /// Included in INSERT / UPDATE statements.
    pub fn is_writable(&self) -> bool {
        !self.is_database_generated && !self.is_ignored
    }
}
