use super::blueprint::Blueprint;
use super::column::{ColumnDefinition, ColumnType, Modifier};
use super::command::Command;
use super::grammar::{SchemaGrammar, default_value, quoted_list};
use crate::error::QbResult;
use crate::ident;

pub(super) const MODIFIERS: &[Modifier] = &[
    Modifier::Collate,
    Modifier::Increment,
    Modifier::Nullable,
    Modifier::Default,
    Modifier::VirtualAs,
    Modifier::StoredAs,
];

/// Schema searched when the connection names none.
pub(super) const DEFAULT_SCHEMA: &str = "public";

pub(super) const TABLE_EXISTS: &str = "select * from information_schema.tables where table_schema = ? and table_name = ? and table_type = 'BASE TABLE'";

pub(super) const COLUMN_LISTING: &str =
    "select column_name from information_schema.columns where table_schema = ? and table_name = ?";

pub(super) fn compile(
    grammar: &SchemaGrammar,
    blueprint: &Blueprint,
    command: &Command,
) -> QbResult<Vec<String>> {
    let table = grammar.wrap_blueprint(blueprint);
    let sql = match command {
        Command::Create => {
            let create = if blueprint.temporary {
                "create temporary table"
            } else {
                "create table"
            };
            format!(
                "{create} {table} ({})",
                grammar.column_definitions(blueprint).join(", ")
            )
        }
        Command::Add => {
            let columns: Vec<String> = grammar
                .column_definitions(blueprint)
                .into_iter()
                .map(|c| format!("add column {c}"))
                .collect();
            format!("alter table {table} {}", columns.join(", "))
        }
        Command::Drop => format!("drop table {table}"),
        Command::DropIfExists => format!("drop table if exists {table}"),
        Command::DropColumn { columns } => {
            let drops: Vec<String> = columns
                .iter()
                .map(|c| format!("drop column {}", grammar.wrap(c)))
                .collect();
            format!("alter table {table} {}", drops.join(", "))
        }
        Command::RenameColumn { from, to } => format!(
            "alter table {table} rename column {} to {}",
            grammar.wrap(from),
            grammar.wrap(to)
        ),
        Command::Rename { to } => {
            format!("alter table {table} rename to {}", grammar.wrap_table(to))
        }
        Command::Primary(index) => format!(
            "alter table {table} add primary key ({})",
            grammar.column_list(&index.columns)
        ),
        Command::Unique(index) => format!(
            "alter table {table} add constraint {} unique ({})",
            grammar.wrap_segment(&index.name),
            grammar.column_list(&index.columns)
        ),
        Command::Index(index) => {
            let algorithm = index
                .algorithm
                .as_deref()
                .map(|a| format!(" using {a}"))
                .unwrap_or_default();
            format!(
                "create index {} on {table}{algorithm} ({})",
                grammar.wrap_segment(&index.name),
                grammar.column_list(&index.columns)
            )
        }
        Command::SpatialIndex(index) => format!(
            "create index {} on {table} using gist ({})",
            grammar.wrap_segment(&index.name),
            grammar.column_list(&index.columns)
        ),
        Command::Foreign(foreign) => grammar.compile_foreign(blueprint, foreign),
        Command::DropPrimary { .. } => {
            // Postgres names the primary key constraint after the table.
            let name = format!("{}{}_pkey", grammar.table_prefix(), blueprint.table());
            format!(
                "alter table {table} drop constraint {}",
                grammar.wrap_segment(&name)
            )
        }
        Command::DropUnique { name } | Command::DropForeign { name } => format!(
            "alter table {table} drop constraint {}",
            grammar.wrap_segment(name)
        ),
        Command::DropIndex { name } | Command::DropSpatialIndex { name } => {
            format!("drop index {}", grammar.wrap_segment(name))
        }
        Command::RenameIndex { from, to } => format!(
            "alter index {} rename to {}",
            grammar.wrap_segment(from),
            grammar.wrap_segment(to)
        ),
        Command::Comment { column, comment } => format!(
            "comment on column {table}.{} is {}",
            grammar.wrap(column),
            ident::quote_string(comment)
        ),
    };
    Ok(vec![sql])
}

pub(super) fn type_sql(grammar: &SchemaGrammar, column: &ColumnDefinition) -> String {
    let serial = |auto: &str, plain: &str| {
        let ty = if column.auto_increment { auto } else { plain };
        ty.to_string()
    };
    match &column.ty {
        ColumnType::Increments => "serial".to_string(),
        ColumnType::BigIncrements => "bigserial".to_string(),
        ColumnType::Integer | ColumnType::MediumInteger => serial("serial", "integer"),
        ColumnType::BigInteger => serial("bigserial", "bigint"),
        ColumnType::TinyInteger | ColumnType::SmallInteger => serial("smallserial", "smallint"),
        ColumnType::Char(length) => format!("char({length})"),
        ColumnType::String(length) => format!("varchar({length})"),
        ColumnType::Text | ColumnType::MediumText | ColumnType::LongText => "text".to_string(),
        ColumnType::Boolean => "boolean".to_string(),
        ColumnType::Decimal(total, places) => format!("decimal({total}, {places})"),
        ColumnType::Float(..) | ColumnType::Double(_) => "double precision".to_string(),
        ColumnType::Date => "date".to_string(),
        ColumnType::DateTime | ColumnType::Timestamp => {
            let ty = "timestamp(0) without time zone";
            if column.use_current {
                format!("{ty} default CURRENT_TIMESTAMP")
            } else {
                ty.to_string()
            }
        }
        ColumnType::Time => "time(0) without time zone".to_string(),
        ColumnType::Year => "integer".to_string(),
        ColumnType::Json => "json".to_string(),
        ColumnType::Jsonb => "jsonb".to_string(),
        ColumnType::Binary => "bytea".to_string(),
        ColumnType::Uuid => "uuid".to_string(),
        ColumnType::Enum(allowed) => format!(
            "varchar(255) check ({} in ({}))",
            grammar.wrap(&column.name),
            quoted_list(allowed)
        ),
        ColumnType::IpAddress => "inet".to_string(),
        ColumnType::MacAddress => "macaddr".to_string(),
    }
}

pub(super) fn modifier_sql(
    grammar: &SchemaGrammar,
    column: &ColumnDefinition,
    modifier: Modifier,
) -> Option<String> {
    match modifier {
        Modifier::Collate => column
            .collation
            .as_ref()
            .map(|c| format!(" collate {}", grammar.wrap_segment(c))),
        Modifier::Increment => (column.auto_increment && column.ty.is_integer())
            .then(|| " primary key".to_string()),
        Modifier::Nullable => Some(if column.nullable { " null" } else { " not null" }.to_string()),
        Modifier::Default => column
            .default
            .as_ref()
            .map(|d| format!(" default {}", default_value(d))),
        Modifier::VirtualAs => column
            .virtual_as
            .as_ref()
            .map(|e| format!(" generated always as ({e})")),
        Modifier::StoredAs => column
            .stored_as
            .as_ref()
            .map(|e| format!(" generated always as ({e}) stored")),
        Modifier::Unsigned
        | Modifier::Charset
        | Modifier::Comment
        | Modifier::After
        | Modifier::First => None,
    }
}
