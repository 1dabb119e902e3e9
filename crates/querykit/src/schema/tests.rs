use super::*;
use crate::expression::raw;
use crate::grammar::Dialect;

fn users_table(grammar: &SchemaGrammar) -> Blueprint {
    let mut table = grammar.blueprint("users");
    table.create();
    table.increments("id");
    table.string("email").unique();
    table.boolean("active").default(true);
    table.timestamps();
    table
}

#[test]
fn creates_table_on_every_dialect() {
    let mysql = SchemaGrammar::new(Dialect::MySql);
    assert_eq!(
        users_table(&mysql).to_sql(&mysql).unwrap(),
        vec![
            "create table `users` (`id` int unsigned not null auto_increment primary key, \
             `email` varchar(255) not null, `active` tinyint(1) not null default '1', \
             `created_at` timestamp null, `updated_at` timestamp null)",
            "alter table `users` add unique `users_email_unique`(`email`)",
        ]
    );

    let postgres = SchemaGrammar::new(Dialect::Postgres);
    assert_eq!(
        users_table(&postgres).to_sql(&postgres).unwrap(),
        vec![
            "create table \"users\" (\"id\" serial primary key not null, \
             \"email\" varchar(255) not null, \"active\" boolean not null default '1', \
             \"created_at\" timestamp(0) without time zone null, \
             \"updated_at\" timestamp(0) without time zone null)",
            "alter table \"users\" add constraint \"users_email_unique\" unique (\"email\")",
        ]
    );

    let sqlite = SchemaGrammar::new(Dialect::Sqlite);
    assert_eq!(
        users_table(&sqlite).to_sql(&sqlite).unwrap(),
        vec![
            "create table \"users\" (\"id\" integer not null primary key autoincrement, \
             \"email\" varchar not null, \"active\" tinyint(1) not null default '1', \
             \"created_at\" datetime null, \"updated_at\" datetime null)",
            "create unique index \"users_email_unique\" on \"users\" (\"email\")",
        ]
    );
}

#[test]
fn add_is_implied_for_new_columns_on_existing_table() {
    let grammar = SchemaGrammar::new(Dialect::MySql);
    let mut table = grammar.blueprint("users");
    table.string("nickname").nullable().after("email");
    table.rename_column("name", "full_name");

    assert_eq!(
        table.to_sql(&grammar).unwrap(),
        vec![
            "alter table `users` add `nickname` varchar(255) null after `email`",
            "alter table `users` rename column `name` to `full_name`",
        ]
    );
}

#[test]
fn index_names_are_prefixed_and_lowercased() {
    let grammar = SchemaGrammar::new(Dialect::Postgres).with_table_prefix("App_");
    let table = grammar.blueprint("Users");
    let name = table.index_name("index", &["first-name".to_string(), "org.id".to_string()]);
    assert_eq!(name, "app_users_first_name_org_id_index");
}

#[test]
fn fluent_index_uses_explicit_name() {
    let grammar = SchemaGrammar::new(Dialect::Postgres);
    let mut table = grammar.blueprint("users");
    table.create();
    table.string("email").index_named("by_email");

    let sql = table.to_sql(&grammar).unwrap();
    assert_eq!(sql[1], "create index \"by_email\" on \"users\" (\"email\")");
}

#[test]
fn foreign_keys_render_as_constraints() {
    let grammar = SchemaGrammar::new(Dialect::MySql).with_table_prefix("app_");
    let mut table = grammar.blueprint("posts");
    table
        .foreign(["user_id"])
        .references(["id"])
        .on("users")
        .cascade_on_delete()
        .on_update("restrict");

    assert_eq!(
        table.to_sql(&grammar).unwrap(),
        vec![
            "alter table `app_posts` add constraint `app_posts_user_id_foreign` \
             foreign key (`user_id`) references `app_users` (`id`) \
             on delete cascade on update restrict"
        ]
    );
}

#[test]
fn foreign_keys_follow_the_columns_they_reference() {
    let grammar = SchemaGrammar::new(Dialect::MySql);
    let mut table = grammar.blueprint("posts");
    table.foreign(["team_id"]).references(["id"]).on("teams");
    table.unsigned_integer("team_id");

    assert_eq!(
        table.to_sql(&grammar).unwrap(),
        vec![
            "alter table `posts` add `team_id` int unsigned not null",
            "alter table `posts` add constraint `posts_team_id_foreign` \
             foreign key (`team_id`) references `teams` (`id`)",
        ]
    );
}

#[test]
fn drops_and_renames() {
    let grammar = SchemaGrammar::new(Dialect::Postgres);

    let mut table = grammar.blueprint("users");
    table.drop_column(["a", "b"]);
    table.drop_index("users_a_index");
    table.rename_index("old_idx", "new_idx");
    assert_eq!(
        table.to_sql(&grammar).unwrap(),
        vec![
            "alter table \"users\" drop column \"a\", drop column \"b\"",
            "drop index \"users_a_index\"",
            "alter index \"old_idx\" rename to \"new_idx\"",
        ]
    );

    let mut table = grammar.blueprint("users");
    table.rename("members");
    assert_eq!(
        table.to_sql(&grammar).unwrap(),
        vec!["alter table \"users\" rename to \"members\""]
    );
}

#[test]
fn defaults_render_raw_expressions_verbatim() {
    let grammar = SchemaGrammar::new(Dialect::Postgres);
    let mut table = grammar.blueprint("events");
    let column = table
        .timestamp("happened_at")
        .default(raw("now()"))
        .clone();
    assert_eq!(
        grammar.column_sql(&column),
        "\"happened_at\" timestamp(0) without time zone not null default now()"
    );

    let column = table.string("state").default("it's").clone();
    assert_eq!(
        grammar.column_sql(&column),
        "\"state\" varchar(255) not null default 'it''s'"
    );
}

#[test]
fn use_current_is_part_of_the_type() {
    let grammar = SchemaGrammar::new(Dialect::MySql);
    let mut table = grammar.blueprint("events");
    let column = table.timestamp("created_at").use_current().clone();
    assert_eq!(
        grammar.column_sql(&column),
        "`created_at` timestamp default CURRENT_TIMESTAMP not null"
    );
}

#[test]
fn enum_columns_use_check_constraints_outside_mysql() {
    let mut table = Blueprint::new("orders");
    let column = table.enumeration("status", ["open", "closed"]).clone();

    assert_eq!(
        SchemaGrammar::new(Dialect::MySql).column_sql(&column),
        "`status` enum('open', 'closed') not null"
    );
    assert_eq!(
        SchemaGrammar::new(Dialect::Postgres).column_sql(&column),
        "\"status\" varchar(255) check (\"status\" in ('open', 'closed')) not null"
    );
}

#[test]
fn default_string_length_comes_from_grammar() {
    let grammar = SchemaGrammar::new(Dialect::MySql).with_default_string_length(191);
    let mut table = grammar.blueprint("users");
    let column = table.string("email").clone();
    assert_eq!(column.ty, ColumnType::String(191));
}

#[test]
fn introspection_queries_bind_prefixed_table() {
    let grammar = SchemaGrammar::new(Dialect::Postgres).with_table_prefix("app_");
    let exists = grammar.compile_table_exists(None, "users");
    assert_eq!(
        exists.bindings,
        vec![crate::value::Value::from("public"), "app_users".into()]
    );

    let sqlite = SchemaGrammar::new(Dialect::Sqlite).with_table_prefix("app_");
    assert_eq!(
        sqlite.compile_column_listing(None, "users").sql,
        "pragma table_info(\"app_users\")"
    );
    assert_eq!(
        sqlite.compile_enable_foreign_key_constraints(),
        "PRAGMA foreign_keys = ON;"
    );
}
