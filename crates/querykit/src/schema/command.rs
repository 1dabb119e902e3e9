//! Table-level DDL commands.

use super::column::IndexKind;

/// A primary key, unique constraint or index over one or more columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCommand {
    pub name: String,
    pub columns: Vec<String>,
    /// Index method, e.g. `btree` or `hash`.
    pub algorithm: Option<String>,
}

/// A foreign key constraint.
///
/// Built fluently:
/// ```ignore
/// table.foreign(["user_id"]).references(["id"]).on("users").on_delete("cascade");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub references: Vec<String>,
    pub on: String,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
}

impl ForeignKey {
    pub fn references<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn on(&mut self, table: impl Into<String>) -> &mut Self {
        self.on = table.into();
        self
    }

    pub fn on_delete(&mut self, action: impl Into<String>) -> &mut Self {
        self.on_delete = Some(action.into());
        self
    }

    pub fn on_update(&mut self, action: impl Into<String>) -> &mut Self {
        self.on_update = Some(action.into());
        self
    }

    pub fn cascade_on_delete(&mut self) -> &mut Self {
        self.on_delete("cascade")
    }
}

/// One DDL operation recorded on a blueprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create,
    /// Add the blueprint's columns to an existing table.
    Add,
    Drop,
    DropIfExists,
    DropColumn { columns: Vec<String> },
    RenameColumn { from: String, to: String },
    Rename { to: String },
    Primary(IndexCommand),
    Unique(IndexCommand),
    Index(IndexCommand),
    SpatialIndex(IndexCommand),
    Foreign(ForeignKey),
    DropPrimary { name: String },
    DropUnique { name: String },
    DropIndex { name: String },
    DropSpatialIndex { name: String },
    DropForeign { name: String },
    RenameIndex { from: String, to: String },
    /// Column comment issued as its own statement (Postgres).
    Comment { column: String, comment: String },
}

impl Command {
    pub(crate) fn index(kind: IndexKind, index: IndexCommand) -> Self {
        match kind {
            IndexKind::Primary => Command::Primary(index),
            IndexKind::Unique => Command::Unique(index),
            IndexKind::Index => Command::Index(index),
            IndexKind::SpatialIndex => Command::SpatialIndex(index),
        }
    }
}
