use super::blueprint::Blueprint;
use super::column::{ColumnDefinition, ColumnType, Modifier};
use super::command::{Command, IndexCommand};
use super::grammar::{SchemaGrammar, default_value, quoted_list};
use crate::error::QbResult;
use crate::ident;

pub(super) const MODIFIERS: &[Modifier] = &[
    Modifier::Unsigned,
    Modifier::Charset,
    Modifier::Collate,
    Modifier::VirtualAs,
    Modifier::StoredAs,
    Modifier::Nullable,
    Modifier::Default,
    Modifier::Increment,
    Modifier::Comment,
    Modifier::After,
    Modifier::First,
];

pub(super) const TABLE_EXISTS: &str = "select * from information_schema.tables where table_schema = ? and table_name = ? and table_type = 'BASE TABLE'";

pub(super) const COLUMN_LISTING: &str = "select column_name as `column_name` from information_schema.columns where table_schema = ? and table_name = ?";

pub(super) fn compile(
    grammar: &SchemaGrammar,
    blueprint: &Blueprint,
    command: &Command,
) -> QbResult<Vec<String>> {
    let table = grammar.wrap_blueprint(blueprint);
    let sql = match command {
        Command::Create => compile_create(grammar, blueprint),
        Command::Add => {
            let columns: Vec<String> = grammar
                .column_definitions(blueprint)
                .into_iter()
                .map(|c| format!("add {c}"))
                .collect();
            format!("alter table {table} {}", columns.join(", "))
        }
        Command::Drop => format!("drop table {table}"),
        Command::DropIfExists => format!("drop table if exists {table}"),
        Command::DropColumn { columns } => {
            let drops: Vec<String> = columns
                .iter()
                .map(|c| format!("drop {}", grammar.wrap(c)))
                .collect();
            format!("alter table {table} {}", drops.join(", "))
        }
        Command::RenameColumn { from, to } => format!(
            "alter table {table} rename column {} to {}",
            grammar.wrap(from),
            grammar.wrap(to)
        ),
        Command::Rename { to } => format!("rename table {table} to {}", grammar.wrap_table(to)),
        Command::Primary(index) => compile_key(grammar, &table, index, "primary key", false),
        Command::Unique(index) => compile_key(grammar, &table, index, "unique", true),
        Command::Index(index) => compile_key(grammar, &table, index, "index", true),
        Command::SpatialIndex(index) => compile_key(grammar, &table, index, "spatial index", true),
        Command::Foreign(foreign) => grammar.compile_foreign(blueprint, foreign),
        Command::DropPrimary { .. } => format!("alter table {table} drop primary key"),
        Command::DropUnique { name }
        | Command::DropIndex { name }
        | Command::DropSpatialIndex { name } => {
            format!("alter table {table} drop index {}", grammar.wrap_segment(name))
        }
        Command::DropForeign { name } => {
            format!("alter table {table} drop foreign key {}", grammar.wrap_segment(name))
        }
        Command::RenameIndex { from, to } => format!(
            "alter table {table} rename index {} to {}",
            grammar.wrap_segment(from),
            grammar.wrap_segment(to)
        ),
        // Comments are rendered inline by the Comment modifier.
        Command::Comment { .. } => return Ok(Vec::new()),
    };
    Ok(vec![sql])
}

fn compile_create(grammar: &SchemaGrammar, blueprint: &Blueprint) -> String {
    let create = if blueprint.temporary {
        "create temporary table"
    } else {
        "create table"
    };
    let mut sql = format!(
        "{create} {} ({})",
        grammar.wrap_blueprint(blueprint),
        grammar.column_definitions(blueprint).join(", ")
    );
    if let Some(charset) = &blueprint.charset {
        sql.push_str(&format!(" default character set {charset}"));
    }
    if let Some(collation) = &blueprint.collation {
        sql.push_str(&format!(" collate '{collation}'"));
    }
    if let Some(engine) = &blueprint.engine {
        sql.push_str(&format!(" engine = {engine}"));
    }
    sql
}

fn compile_key(
    grammar: &SchemaGrammar,
    table: &str,
    index: &IndexCommand,
    kind: &str,
    named: bool,
) -> String {
    let name = if named {
        grammar.wrap_segment(&index.name)
    } else {
        String::new()
    };
    let algorithm = index
        .algorithm
        .as_deref()
        .map(|a| format!(" using {a}"))
        .unwrap_or_default();
    format!(
        "alter table {table} add {kind} {name}{algorithm}({})",
        grammar.column_list(&index.columns)
    )
}

pub(super) fn type_sql(column: &ColumnDefinition) -> String {
    match &column.ty {
        ColumnType::Increments | ColumnType::Integer => "int".to_string(),
        ColumnType::BigIncrements | ColumnType::BigInteger => "bigint".to_string(),
        ColumnType::TinyInteger => "tinyint".to_string(),
        ColumnType::SmallInteger => "smallint".to_string(),
        ColumnType::MediumInteger => "mediumint".to_string(),
        ColumnType::Char(length) => format!("char({length})"),
        ColumnType::String(length) => format!("varchar({length})"),
        ColumnType::Text => "text".to_string(),
        ColumnType::MediumText => "mediumtext".to_string(),
        ColumnType::LongText => "longtext".to_string(),
        ColumnType::Boolean => "tinyint(1)".to_string(),
        ColumnType::Decimal(total, places) => format!("decimal({total}, {places})"),
        ColumnType::Float(total, places) => format!("double({total}, {places})"),
        ColumnType::Double(Some((total, places))) => format!("double({total}, {places})"),
        ColumnType::Double(None) => "double".to_string(),
        ColumnType::Date => "date".to_string(),
        ColumnType::DateTime => current("datetime", column),
        ColumnType::Time => "time".to_string(),
        ColumnType::Timestamp => current("timestamp", column),
        ColumnType::Year => "year".to_string(),
        ColumnType::Json | ColumnType::Jsonb => "json".to_string(),
        ColumnType::Binary => "blob".to_string(),
        ColumnType::Uuid => "char(36)".to_string(),
        ColumnType::Enum(allowed) => format!("enum({})", quoted_list(allowed)),
        ColumnType::IpAddress => "varchar(45)".to_string(),
        ColumnType::MacAddress => "varchar(17)".to_string(),
    }
}

fn current(ty: &str, column: &ColumnDefinition) -> String {
    if column.use_current {
        format!("{ty} default CURRENT_TIMESTAMP")
    } else {
        ty.to_string()
    }
}

pub(super) fn modifier_sql(
    grammar: &SchemaGrammar,
    column: &ColumnDefinition,
    modifier: Modifier,
) -> Option<String> {
    match modifier {
        Modifier::Unsigned => column.unsigned.then(|| " unsigned".to_string()),
        Modifier::Charset => column
            .charset
            .as_ref()
            .map(|c| format!(" character set {c}")),
        Modifier::Collate => column
            .collation
            .as_ref()
            .map(|c| format!(" collate {}", ident::quote_string(c))),
        Modifier::VirtualAs => column.virtual_as.as_ref().map(|e| format!(" as ({e})")),
        Modifier::StoredAs => column
            .stored_as
            .as_ref()
            .map(|e| format!(" as ({e}) stored")),
        Modifier::Nullable => {
            if column.is_generated() {
                (!column.nullable).then(|| " not null".to_string())
            } else if column.nullable {
                Some(" null".to_string())
            } else {
                Some(" not null".to_string())
            }
        }
        Modifier::Default => column
            .default
            .as_ref()
            .map(|d| format!(" default {}", default_value(d))),
        Modifier::Increment => (column.auto_increment && column.ty.is_integer())
            .then(|| " auto_increment primary key".to_string()),
        Modifier::Comment => column
            .comment
            .as_ref()
            .map(|c| format!(" comment {}", ident::quote_string(c))),
        Modifier::After => column
            .after
            .as_ref()
            .map(|c| format!(" after {}", grammar.wrap(c))),
        Modifier::First => column.first.then(|| " first".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Dialect;

    #[test]
    fn increments_is_unsigned_auto_increment_key() {
        let grammar = SchemaGrammar::new(Dialect::MySql);
        let mut table = Blueprint::new("users");
        let column = table.increments("id").clone();
        assert_eq!(
            grammar.column_sql(&column),
            "`id` int unsigned not null auto_increment primary key"
        );
    }

    #[test]
    fn modifiers_follow_declared_order() {
        let grammar = SchemaGrammar::new(Dialect::MySql);
        let mut table = Blueprint::new("users");
        let column = table
            .string("name")
            .after("id")
            .comment("display name")
            .nullable()
            .charset("utf8mb4")
            .clone();
        assert_eq!(
            grammar.column_sql(&column),
            "`name` varchar(255) character set utf8mb4 null comment 'display name' after `id`"
        );
    }

    #[test]
    fn keys_are_added_with_alter_table() {
        let grammar = SchemaGrammar::new(Dialect::MySql);
        let mut table = Blueprint::new("users");
        table.unique(["email"]).primary(["id"]);
        assert_eq!(
            table.to_sql(&grammar).unwrap(),
            vec![
                "alter table `users` add unique `users_email_unique`(`email`)",
                "alter table `users` add primary key (`id`)"
            ]
        );
    }
}
