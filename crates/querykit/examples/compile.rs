//! Compile the same queries for every dialect and print the SQL.
//!
//! Run with: cargo run --example compile -p querykit

use querykit::{
    ConnectionConfig, Dialect, Direction, QbResult, QueryBuilder, Record, raw,
};

fn report(dialect: Dialect) -> QbResult<()> {
    let config = ConnectionConfig::new(dialect).with_table_prefix("app_");
    let grammar = config.query_grammar();

    println!("=== {dialect} ===");

    // ============================================
    // SELECT with joins, nested groups and paging
    // ============================================
    let mut q = QueryBuilder::table(grammar.clone(), "users as u");
    q.select(["u.id", "u.email", "meta->locale as locale"])
        .left_join("posts as p", "p.user_id", "=", "u.id")?
        .where_eq("u.active", true)
        .where_nested(|q| {
            q.where_("u.votes", ">", 100)?.or_where_in("u.role", ["admin", "owner"]);
            Ok(())
        })?
        .order_by("u.created_at", Direction::Desc)
        .for_page(3, 20);
    let compiled = q.to_compiled()?;
    println!("{compiled}");
    println!("  bindings: {:?}", compiled.bindings);

    // ============================================
    // UPDATE through a join
    // ============================================
    let mut q = QueryBuilder::table(grammar.clone(), "users");
    q.join("teams", "teams.id", "=", "users.team_id")?
        .where_eq("teams.archived", true);
    let compiled = q.compile_update(
        &Record::new()
            .set("active", false)
            .set("updated_at", raw("CURRENT_TIMESTAMP")),
    )?;
    println!("{compiled}");

    // ============================================
    // Schema
    // ============================================
    let schema = config.schema_grammar();
    let mut table = schema.blueprint("users");
    table.create();
    table.increments("id");
    table.string("email").unique();
    table.json("meta").nullable();
    table.timestamps();
    for sql in table.to_sql(&schema)? {
        println!("{sql}");
    }

    println!();
    Ok(())
}

fn main() -> QbResult<()> {
    for dialect in [Dialect::MySql, Dialect::Postgres, Dialect::Sqlite] {
        report(dialect)?;
    }
    Ok(())
}
