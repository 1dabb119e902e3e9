//! SQLite cannot alter constraints on an existing table, so primary and
//! foreign keys are folded into `create table`.

use super::blueprint::Blueprint;
use super::column::{ColumnDefinition, ColumnType, Modifier};
use super::command::Command;
use super::grammar::{SchemaGrammar, default_value, quoted_list};
use crate::error::{QbError, QbResult};
use crate::grammar::Dialect;

pub(super) const MODIFIERS: &[Modifier] = &[Modifier::Nullable, Modifier::Default, Modifier::Increment];

pub(super) const TABLE_EXISTS: &str = "select * from sqlite_master where type = 'table' and name = ?";

pub(super) fn compile(
    grammar: &SchemaGrammar,
    blueprint: &Blueprint,
    command: &Command,
    commands: &[Command],
) -> QbResult<Vec<String>> {
    let table = grammar.wrap_blueprint(blueprint);
    let sql = match command {
        Command::Create => compile_create(grammar, blueprint, commands),
        Command::Add => {
            return Ok(grammar
                .column_definitions(blueprint)
                .into_iter()
                .map(|c| format!("alter table {table} add column {c}"))
                .collect());
        }
        Command::Drop => format!("drop table {table}"),
        Command::DropIfExists => format!("drop table if exists {table}"),
        Command::DropColumn { columns } => {
            return Ok(columns
                .iter()
                .map(|c| format!("alter table {table} drop column {}", grammar.wrap(c)))
                .collect());
        }
        Command::RenameColumn { from, to } => format!(
            "alter table {table} rename column {} to {}",
            grammar.wrap(from),
            grammar.wrap(to)
        ),
        Command::Rename { to } => {
            format!("alter table {table} rename to {}", grammar.wrap_table(to))
        }
        Command::Primary(_) => {
            if blueprint.creating() {
                return Ok(Vec::new());
            }
            return Err(QbError::unsupported(
                Dialect::Sqlite,
                "adding a primary key to an existing table",
            ));
        }
        Command::Unique(index) => format!(
            "create unique index {} on {table} ({})",
            grammar.wrap_segment(&index.name),
            grammar.column_list(&index.columns)
        ),
        Command::Index(index) => format!(
            "create index {} on {table} ({})",
            grammar.wrap_segment(&index.name),
            grammar.column_list(&index.columns)
        ),
        Command::SpatialIndex(_) => {
            return Err(QbError::unsupported(Dialect::Sqlite, "spatial indexes"));
        }
        Command::Foreign(_) => {
            // Inlined by create.
            if blueprint.creating() {
                return Ok(Vec::new());
            }
            return Err(QbError::unsupported(
                Dialect::Sqlite,
                "adding a foreign key to an existing table",
            ));
        }
        Command::DropPrimary { .. } => {
            return Err(QbError::unsupported(Dialect::Sqlite, "dropping a primary key"));
        }
        Command::DropUnique { name } | Command::DropIndex { name } => {
            format!("drop index {}", grammar.wrap_segment(name))
        }
        Command::DropSpatialIndex { .. } => {
            return Err(QbError::unsupported(Dialect::Sqlite, "spatial indexes"));
        }
        Command::DropForeign { .. } => {
            return Err(QbError::unsupported(Dialect::Sqlite, "dropping a foreign key"));
        }
        Command::RenameIndex { .. } => {
            return Err(QbError::unsupported(Dialect::Sqlite, "renaming an index"));
        }
        Command::Comment { .. } => return Ok(Vec::new()),
    };
    Ok(vec![sql])
}

fn compile_create(grammar: &SchemaGrammar, blueprint: &Blueprint, commands: &[Command]) -> String {
    let create = if blueprint.temporary {
        "create temporary table"
    } else {
        "create table"
    };
    let mut body = grammar.column_definitions(blueprint).join(", ");

    for command in commands {
        if let Command::Foreign(foreign) = command {
            body.push_str(&format!(
                ", foreign key({}){}",
                grammar.column_list(&foreign.columns),
                grammar.foreign_reference(foreign)
            ));
        }
    }

    let primary = commands.iter().find_map(|c| match c {
        Command::Primary(index) => Some(index),
        _ => None,
    });
    if let Some(index) = primary {
        body.push_str(&format!(", primary key ({})", grammar.column_list(&index.columns)));
    }

    format!("{create} {} ({body})", grammar.wrap_blueprint(blueprint))
}

pub(super) fn type_sql(grammar: &SchemaGrammar, column: &ColumnDefinition) -> String {
    match &column.ty {
        ColumnType::Increments
        | ColumnType::BigIncrements
        | ColumnType::TinyInteger
        | ColumnType::SmallInteger
        | ColumnType::MediumInteger
        | ColumnType::Integer
        | ColumnType::BigInteger
        | ColumnType::Year => "integer".to_string(),
        ColumnType::Char(_)
        | ColumnType::String(_)
        | ColumnType::Uuid
        | ColumnType::IpAddress
        | ColumnType::MacAddress => "varchar".to_string(),
        ColumnType::Text
        | ColumnType::MediumText
        | ColumnType::LongText
        | ColumnType::Json
        | ColumnType::Jsonb => "text".to_string(),
        ColumnType::Boolean => "tinyint(1)".to_string(),
        ColumnType::Decimal(..) => "numeric".to_string(),
        ColumnType::Float(..) | ColumnType::Double(_) => "float".to_string(),
        ColumnType::Date => "date".to_string(),
        ColumnType::DateTime | ColumnType::Timestamp => {
            if column.use_current {
                "datetime default CURRENT_TIMESTAMP".to_string()
            } else {
                "datetime".to_string()
            }
        }
        ColumnType::Time => "time".to_string(),
        ColumnType::Binary => "blob".to_string(),
        ColumnType::Enum(allowed) => format!(
            "varchar check ({} in ({}))",
            grammar.wrap(&column.name),
            quoted_list(allowed)
        ),
    }
}

pub(super) fn modifier_sql(column: &ColumnDefinition, modifier: Modifier) -> Option<String> {
    match modifier {
        Modifier::Nullable => Some(if column.nullable { " null" } else { " not null" }.to_string()),
        Modifier::Default => column
            .default
            .as_ref()
            .filter(|_| !column.is_generated())
            .map(|d| format!(" default {}", default_value(d))),
        Modifier::Increment => (column.auto_increment && column.ty.is_integer())
            .then(|| " primary key autoincrement".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_inlines_foreign_and_primary_keys() {
        let grammar = SchemaGrammar::new(Dialect::Sqlite);
        let mut table = Blueprint::new("posts");
        table.create();
        table.integer("user_id");
        table.string("slug");
        table.primary(["user_id", "slug"]);
        table
            .foreign(["user_id"])
            .references(["id"])
            .on("users")
            .on_delete("cascade");

        assert_eq!(
            table.to_sql(&grammar).unwrap(),
            vec![
                "create table \"posts\" (\"user_id\" integer not null, \"slug\" varchar not null, \
                 foreign key(\"user_id\") references \"users\" (\"id\") on delete cascade, \
                 primary key (\"user_id\", \"slug\"))"
            ]
        );
    }

    #[test]
    fn adds_one_statement_per_column() {
        let grammar = SchemaGrammar::new(Dialect::Sqlite);
        let mut table = Blueprint::new("users");
        table.string("a").nullable();
        table.integer("b").default(0);
        assert_eq!(
            table.to_sql(&grammar).unwrap(),
            vec![
                "alter table \"users\" add column \"a\" varchar null",
                "alter table \"users\" add column \"b\" integer not null default '0'",
            ]
        );
    }

    #[test]
    fn rejects_unsupported_alterations() {
        let grammar = SchemaGrammar::new(Dialect::Sqlite);

        let mut table = Blueprint::new("users");
        table.spatial_index(["location"]);
        assert!(table.to_sql(&grammar).unwrap_err().is_render());

        let mut table = Blueprint::new("users");
        table.drop_foreign("users_team_id_foreign");
        assert!(table.to_sql(&grammar).unwrap_err().is_render());

        let mut table = Blueprint::new("users");
        table.drop_primary();
        assert!(table.to_sql(&grammar).unwrap_err().is_render());

        let mut table = Blueprint::new("users");
        table.primary(["id"]);
        assert!(table.to_sql(&grammar).unwrap_err().is_render());
    }

    #[test]
    fn foreign_key_on_existing_table_is_rejected() {
        let grammar = SchemaGrammar::new(Dialect::Sqlite);
        let mut table = Blueprint::new("posts");
        table.integer("user_id");
        table.foreign(["user_id"]).references(["id"]).on("users");

        let err = table.to_sql(&grammar).unwrap_err();
        assert!(matches!(err, QbError::Unsupported { dialect: Dialect::Sqlite, .. }));
    }
}
