//! Table blueprint: the columns and commands of one DDL change.

use super::column::{ColumnDefinition, ColumnType, IndexKind};
use super::command::{Command, ForeignKey, IndexCommand};
use super::grammar::SchemaGrammar;
use crate::error::QbResult;
use crate::grammar::Dialect;
use tracing::trace;

/// Describes a table to create or alter.
///
/// Column methods return the new [`ColumnDefinition`] so modifiers chain:
///
/// ```ignore
/// let mut table = Blueprint::new("users");
/// table.create();
/// table.increments("id");
/// table.string("email").unique();
/// table.timestamps();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    table: String,
    prefix: String,
    default_string_length: u32,
    columns: Vec<ColumnDefinition>,
    commands: Vec<Command>,
    foreign_keys: Vec<ForeignKey>,
    pub engine: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub temporary: bool,
}

impl Blueprint {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            prefix: String::new(),
            default_string_length: 255,
            columns: Vec::new(),
            commands: Vec::new(),
            foreign_keys: Vec::new(),
            engine: None,
            charset: None,
            collation: None,
            temporary: false,
        }
    }

    /// Table prefix used in generated index names.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Length used by [`Blueprint::string`].
    pub fn with_default_string_length(mut self, length: u32) -> Self {
        self.default_string_length = length;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Whether this blueprint creates its table.
    pub fn creating(&self) -> bool {
        self.commands.iter().any(|c| matches!(c, Command::Create))
    }

    /// Render every statement this blueprint needs, in order.
    pub fn to_sql(&self, grammar: &SchemaGrammar) -> QbResult<Vec<String>> {
        let commands = self.implied_commands(grammar.dialect());
        let mut statements = Vec::new();
        for command in &commands {
            statements.extend(grammar.compile(self, command, &commands)?);
        }
        trace!(
            target: "querykit::grammar",
            table = %self.table,
            statements = statements.len(),
            "compiled blueprint"
        );
        Ok(statements)
    }

    /// Recorded commands plus those implied by the columns, then foreign keys.
    fn implied_commands(&self, dialect: Dialect) -> Vec<Command> {
        let mut commands = self.commands.clone();

        if !self.columns.is_empty() && !self.creating() {
            commands.insert(0, Command::Add);
        }

        for column in &self.columns {
            for (kind, name) in &column.indexes {
                let columns = vec![column.name.clone()];
                let name = name
                    .clone()
                    .unwrap_or_else(|| self.index_name(kind.suffix(), &columns));
                commands.push(Command::index(
                    *kind,
                    IndexCommand {
                        name,
                        columns,
                        algorithm: None,
                    },
                ));
            }
        }

        commands.extend(self.foreign_keys.iter().cloned().map(Command::Foreign));

        if dialect == Dialect::Postgres {
            for column in &self.columns {
                if let Some(comment) = &column.comment {
                    commands.push(Command::Comment {
                        column: column.name.clone(),
                        comment: comment.clone(),
                    });
                }
            }
        }

        commands
    }

    /// Default index name: `prefix + table + "_" + columns + "_" + kind`, lowercased.
    pub fn index_name(&self, kind: &str, columns: &[String]) -> String {
        format!(
            "{}{}_{}_{}",
            self.prefix,
            self.table,
            columns.join("_"),
            kind
        )
        .to_lowercase()
        .replace(['-', '.'], "_")
    }

    // ==================== Table commands ====================

    pub fn create(&mut self) -> &mut Self {
        self.commands.push(Command::Create);
        self
    }

    pub fn drop(&mut self) -> &mut Self {
        self.commands.push(Command::Drop);
        self
    }

    pub fn drop_if_exists(&mut self) -> &mut Self {
        self.commands.push(Command::DropIfExists);
        self
    }

    pub fn rename(&mut self, to: impl Into<String>) -> &mut Self {
        self.commands.push(Command::Rename { to: to.into() });
        self
    }

    pub fn drop_column<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commands.push(Command::DropColumn {
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn rename_column(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.commands.push(Command::RenameColumn {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    // ==================== Indexes ====================

    pub fn primary<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_index(IndexKind::Primary, columns)
    }

    pub fn unique<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_index(IndexKind::Unique, columns)
    }

    pub fn index<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_index(IndexKind::Index, columns)
    }

    /// Index with an explicit name and optional algorithm.
    pub fn index_named<I, S>(
        &mut self,
        name: impl Into<String>,
        columns: I,
        algorithm: Option<&str>,
    ) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        self.commands.push(Command::Index(IndexCommand {
            name: name.into(),
            columns,
            algorithm: algorithm.map(str::to_string),
        }));
        self
    }

    pub fn spatial_index<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_index(IndexKind::SpatialIndex, columns)
    }

    fn add_index<I, S>(&mut self, kind: IndexKind, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let name = self.index_name(kind.suffix(), &columns);
        self.commands.push(Command::index(
            kind,
            IndexCommand {
                name,
                columns,
                algorithm: None,
            },
        ));
        self
    }

    /// Start a foreign key; finish it with `references` and `on`.
    pub fn foreign<I, S>(&mut self, columns: I) -> &mut ForeignKey
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let name = self.index_name("foreign", &columns);
        self.foreign_keys.push(ForeignKey {
            name,
            columns,
            references: Vec::new(),
            on: String::new(),
            on_delete: None,
            on_update: None,
        });
        let last = self.foreign_keys.len() - 1;
        &mut self.foreign_keys[last]
    }

    pub fn drop_primary(&mut self) -> &mut Self {
        let name = format!("{}{}_pkey", self.prefix, self.table);
        self.commands.push(Command::DropPrimary { name });
        self
    }

    pub fn drop_unique(&mut self, name: impl Into<String>) -> &mut Self {
        self.commands.push(Command::DropUnique { name: name.into() });
        self
    }

    pub fn drop_index(&mut self, name: impl Into<String>) -> &mut Self {
        self.commands.push(Command::DropIndex { name: name.into() });
        self
    }

    pub fn drop_spatial_index(&mut self, name: impl Into<String>) -> &mut Self {
        self.commands
            .push(Command::DropSpatialIndex { name: name.into() });
        self
    }

    pub fn drop_foreign(&mut self, name: impl Into<String>) -> &mut Self {
        self.commands.push(Command::DropForeign { name: name.into() });
        self
    }

    pub fn rename_index(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.commands.push(Command::RenameIndex {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    // ==================== Columns ====================

    /// Add a column of any type.
    pub fn add_column(&mut self, name: impl Into<String>, ty: ColumnType) -> &mut ColumnDefinition {
        self.columns.push(ColumnDefinition::new(name, ty));
        let last = self.columns.len() - 1;
        &mut self.columns[last]
    }

    /// Auto-incrementing unsigned integer primary key.
    pub fn increments(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Increments)
            .unsigned()
            .auto_increment()
    }

    pub fn big_increments(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::BigIncrements)
            .unsigned()
            .auto_increment()
    }

    pub fn tiny_integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::TinyInteger)
    }

    pub fn small_integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::SmallInteger)
    }

    pub fn medium_integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::MediumInteger)
    }

    pub fn integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Integer)
    }

    pub fn big_integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::BigInteger)
    }

    pub fn unsigned_integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.integer(name).unsigned()
    }

    pub fn unsigned_big_integer(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.big_integer(name).unsigned()
    }

    pub fn char(&mut self, name: impl Into<String>, length: u32) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Char(length))
    }

    /// VARCHAR with the blueprint's default length.
    pub fn string(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        let length = self.default_string_length;
        self.add_column(name, ColumnType::String(length))
    }

    pub fn string_with_length(&mut self, name: impl Into<String>, length: u32) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::String(length))
    }

    pub fn text(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Text)
    }

    pub fn medium_text(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::MediumText)
    }

    pub fn long_text(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::LongText)
    }

    pub fn boolean(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Boolean)
    }

    pub fn decimal(&mut self, name: impl Into<String>, total: u8, places: u8) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Decimal(total, places))
    }

    pub fn float(&mut self, name: impl Into<String>, total: u8, places: u8) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Float(total, places))
    }

    pub fn double(&mut self, name: impl Into<String>, precision: Option<(u8, u8)>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Double(precision))
    }

    pub fn date(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Date)
    }

    pub fn date_time(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::DateTime)
    }

    pub fn time(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Time)
    }

    pub fn timestamp(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Timestamp)
    }

    pub fn year(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Year)
    }

    pub fn json(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Json)
    }

    pub fn jsonb(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Jsonb)
    }

    pub fn binary(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Binary)
    }

    pub fn uuid(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::Uuid)
    }

    pub fn enumeration<I, S>(&mut self, name: impl Into<String>, allowed: I) -> &mut ColumnDefinition
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed = allowed.into_iter().map(Into::into).collect();
        self.add_column(name, ColumnType::Enum(allowed))
    }

    pub fn ip_address(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::IpAddress)
    }

    pub fn mac_address(&mut self, name: impl Into<String>) -> &mut ColumnDefinition {
        self.add_column(name, ColumnType::MacAddress)
    }

    /// Nullable `created_at` and `updated_at` timestamps.
    pub fn timestamps(&mut self) {
        self.timestamp("created_at").nullable();
        self.timestamp("updated_at").nullable();
    }

    /// Nullable `deleted_at` timestamp.
    pub fn soft_deletes(&mut self) -> &mut ColumnDefinition {
        self.timestamp("deleted_at").nullable()
    }
}
