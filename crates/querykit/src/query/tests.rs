use super::*;
use crate::expression::raw;
use crate::grammar::Dialect;
use crate::value::Value;

fn grammar(dialect: Dialect) -> Arc<QueryGrammar> {
    Arc::new(QueryGrammar::new(dialect))
}

fn users() -> QueryBuilder {
    QueryBuilder::table(grammar(Dialect::Postgres), "users")
}

fn posts() -> QueryBuilder {
    QueryBuilder::table(grammar(Dialect::Postgres), "posts")
}

#[test]
fn bindings_follow_clause_order_not_call_order() {
    let mut q = users();
    q.where_("id", "=", 1)
        .unwrap()
        .select_raw("coalesce(name, ?) AS label", [Value::from("y")])
        .order_by_raw("position(kind in ?)", [Value::from("x")]);

    assert_eq!(
        q.to_sql().unwrap(),
        "SELECT coalesce(name, ?) AS label FROM \"users\" WHERE \"id\" = ? ORDER BY position(kind in ?)"
    );
    assert_eq!(
        q.get_bindings(),
        vec![Value::from("y"), Value::Int(1), Value::from("x")]
    );
}

#[test]
fn union_bindings_come_last() {
    let mut second = users();
    second.where_eq("id", 2);

    let mut q = users();
    q.union(second).where_eq("id", 1);
    assert_eq!(q.get_bindings(), vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn raw_order_after_union_carries_its_bindings() {
    let mut second = users();
    second.where_eq("id", 2);

    let mut q = users();
    q.where_eq("id", 1)
        .union(second)
        .order_by_raw("array_position(?, id)", [Value::from("{3,1}")]);

    let compiled = q.to_compiled().unwrap();
    assert!(compiled.sql.ends_with(" ORDER BY array_position(?, id)"));
    assert_eq!(
        compiled.bindings,
        vec![Value::Int(1), Value::Int(2), Value::from("{3,1}")]
    );
}

#[test]
fn select_sub_bindings_land_in_select_bucket() {
    let mut count = posts();
    count
        .select_raw("count(*)", [])
        .where_eq("published", true);

    let mut q = users();
    q.where_eq("id", 5).select_sub(count, "n").unwrap();

    assert_eq!(
        q.to_sql().unwrap(),
        "SELECT (SELECT count(*) FROM \"posts\" WHERE \"published\" = ?) AS \"n\" \
         FROM \"users\" WHERE \"id\" = ?"
    );
    assert_eq!(q.get_bindings(), vec![Value::Int(1), Value::Int(5)]);
}

#[test]
fn from_sub_bindings_precede_wheres() {
    let mut q = QueryBuilder::new(grammar(Dialect::MySql));
    q.from_sub_with("t", |sub| {
        sub.from("users").where_eq("active", true);
        Ok(())
    })
    .unwrap()
    .where_eq("t.id", 3);

    assert_eq!(
        q.to_sql().unwrap(),
        "SELECT * FROM (SELECT * FROM `users` WHERE `active` = ?) AS `t` WHERE `t`.`id` = ?"
    );
    assert_eq!(q.get_bindings(), vec![Value::Int(1), Value::Int(3)]);
}

#[test]
fn select_replaces_columns_and_select_bindings() {
    let mut q = users();
    q.select_raw("?", [Value::Int(9)]).select(["id"]);
    assert_eq!(q.to_sql().unwrap(), "SELECT \"id\" FROM \"users\"");
    assert!(q.get_bindings().is_empty());

    q.add_select(["email"]);
    assert_eq!(q.to_sql().unwrap(), "SELECT \"id\", \"email\" FROM \"users\"");
}

#[test]
fn empty_in_lists_become_constants() {
    let mut q = users();
    q.where_in("id", Vec::<i64>::new());
    assert_eq!(q.to_sql().unwrap(), "SELECT * FROM \"users\" WHERE 0 = 1");
    assert!(q.get_bindings().is_empty());

    let mut q = users();
    q.where_not_in("id", Vec::<i64>::new());
    assert_eq!(q.to_sql().unwrap(), "SELECT * FROM \"users\" WHERE 1 = 1");
}

#[test]
fn in_list_binds_every_value() {
    let mut q = users();
    q.where_in("id", [1, 2, 3]);
    assert_eq!(
        q.to_sql().unwrap(),
        "SELECT * FROM \"users\" WHERE \"id\" IN (?, ?, ?)"
    );
    assert_eq!(q.get_bindings().len(), 3);
}

#[test]
fn nested_groups_parenthesize_and_merge_where_bindings() {
    let mut q = users();
    q.where_eq("a", 1)
        .where_nested(|q| {
            q.where_("b", ">", 2)?
                .or_where_eq("c", 3)
                .select_raw("?", [Value::Int(9)]);
            Ok(())
        })
        .unwrap();

    assert_eq!(
        q.to_sql().unwrap(),
        "SELECT * FROM \"users\" WHERE \"a\" = ? AND (\"b\" > ? OR \"c\" = ?)"
    );
    assert_eq!(
        q.get_bindings(),
        vec![Value::Int(1), Value::Int(2), Value::Int(3)]
    );
}

#[test]
fn empty_nested_group_is_dropped() {
    let mut q = users();
    q.where_nested(|_| Ok(())).unwrap();
    assert_eq!(q.to_sql().unwrap(), "SELECT * FROM \"users\"");
}

#[test]
fn where_pairs_form_a_group() {
    let mut q = users();
    q.or_where_eq("role", "admin")
        .where_pairs([("a", 1), ("b", 2)]);
    assert_eq!(
        q.to_sql().unwrap(),
        "SELECT * FROM \"users\" WHERE \"role\" = ? AND (\"a\" = ? AND \"b\" = ?)"
    );
}

#[test]
fn invalid_operator_is_rejected() {
    let mut q = users();
    let err = q.where_("a", "===", 1).unwrap_err();
    assert!(matches!(err, QbError::InvalidOperator(op) if op == "==="));
}

#[test]
fn null_comparisons_rewrite_or_fail() {
    let mut q = users();
    q.where_("deleted_at", "=", Value::Null)
        .unwrap()
        .where_("banned_at", "<>", Value::Null)
        .unwrap()
        .where_eq("locked_at", None::<i64>);
    assert_eq!(
        q.to_sql().unwrap(),
        "SELECT * FROM \"users\" WHERE \"deleted_at\" IS NULL \
         AND \"banned_at\" IS NOT NULL AND \"locked_at\" IS NULL"
    );
    assert!(q.get_bindings().is_empty());

    let err = users().where_("votes", ">", Value::Null).unwrap_err();
    assert!(matches!(err, QbError::IllegalOperatorAndValue { .. }));
}

#[test]
fn raw_values_are_inlined_not_bound() {
    let mut q = users();
    q.where_("updated_at", "<", raw("now()")).unwrap();
    assert_eq!(
        q.to_sql().unwrap(),
        "SELECT * FROM \"users\" WHERE \"updated_at\" < now()"
    );
    assert!(q.get_bindings().is_empty());
}

#[test]
fn between_and_row_values() {
    let mut q = users();
    q.where_between("votes", 1, 10)
        .where_row_values(["a", "b"], "<", [1, 2])
        .unwrap();
    assert_eq!(
        q.to_sql().unwrap(),
        "SELECT * FROM \"users\" WHERE \"votes\" BETWEEN ? AND ? AND (\"a\", \"b\") < (?, ?)"
    );

    let err = users()
        .where_row_values(["a", "b"], "=", [1])
        .unwrap_err();
    assert!(matches!(
        err,
        QbError::ColumnCountMismatch {
            columns: 2,
            values: 1
        }
    ));
}

#[test]
fn exists_and_in_subqueries() {
    let mut q = users();
    q.where_exists_with(|sub| {
        sub.from("posts")
            .where_column("posts.user_id", "=", "users.id")?;
        Ok(())
    })
    .unwrap();

    let mut voters = posts();
    voters.select(["user_id"]).where_("votes", ">", 10).unwrap();
    q.where_in_sub("id", voters);

    assert_eq!(
        q.to_sql().unwrap(),
        "SELECT * FROM \"users\" WHERE EXISTS (SELECT * FROM \"posts\" \
         WHERE \"posts\".\"user_id\" = \"users\".\"id\") \
         AND \"id\" IN (SELECT \"user_id\" FROM \"posts\" WHERE \"votes\" > ?)"
    );
    assert_eq!(q.get_bindings(), vec![Value::Int(10)]);
}

#[test]
fn where_sub_compares_against_scalar_subquery() {
    let mut latest = posts();
    latest.select_raw("max(created_at)", []);

    let mut q = users();
    q.where_sub("last_login", ">", latest).unwrap();
    assert_eq!(
        q.to_sql().unwrap(),
        "SELECT * FROM \"users\" WHERE \"last_login\" > (SELECT max(created_at) FROM \"posts\")"
    );
}

#[test]
fn join_bindings_precede_where_bindings() {
    let mut q = users();
    q.where_eq("users.name", "bob")
        .join_with("posts", |join| {
            join.on("users.id", "=", "posts.user_id")?
                .where_eq("posts.published", true);
            Ok(())
        })
        .unwrap();

    assert_eq!(
        q.to_sql().unwrap(),
        "SELECT * FROM \"users\" INNER JOIN \"posts\" ON \"users\".\"id\" = \"posts\".\"user_id\" \
         AND \"posts\".\"published\" = ? WHERE \"users\".\"name\" = ?"
    );
    assert_eq!(q.get_bindings(), vec![Value::Int(1), Value::from("bob")]);
}

#[test]
fn left_and_cross_joins() {
    let mut q = users();
    q.left_join("posts", "users.id", "=", "posts.user_id")
        .unwrap()
        .cross_join("tags");
    assert_eq!(
        q.to_sql().unwrap(),
        "SELECT * FROM \"users\" LEFT JOIN \"posts\" ON \"users\".\"id\" = \"posts\".\"user_id\" \
         CROSS JOIN \"tags\""
    );
}

#[test]
fn grouping_and_having() {
    let mut q = users();
    q.select(["kind"])
        .group_by(["kind"])
        .having("total", ">", 3)
        .unwrap()
        .having_raw("count(*) < ?", [Value::Int(100)]);
    assert_eq!(
        q.to_sql().unwrap(),
        "SELECT \"kind\" FROM \"users\" GROUP BY \"kind\" HAVING \"total\" > ? AND count(*) < ?"
    );
    assert_eq!(q.get_bindings(), vec![Value::Int(3), Value::Int(100)]);
}

#[test]
fn negative_limit_is_ignored_and_offset_clamps() {
    let mut q = users();
    q.limit(10).limit(-1).offset(-3);
    assert_eq!(
        q.to_sql().unwrap(),
        "SELECT * FROM \"users\" LIMIT 10 OFFSET 0"
    );
}

#[test]
fn reorder_drops_orders_and_their_bindings() {
    let mut q = users();
    q.order_by_raw("position(? in name)", [Value::from("a")])
        .latest("created_at")
        .reorder()
        .oldest("id");
    assert_eq!(q.to_sql().unwrap(), "SELECT * FROM \"users\" ORDER BY \"id\" ASC");
    assert!(q.get_bindings().is_empty());
}

#[test]
fn when_applies_conditionally() {
    let mut q = users();
    q.when(false, |q| {
        q.where_eq("a", 1);
        Ok(())
    })
    .unwrap()
    .when(true, |q| {
        q.where_eq("b", 2);
        Ok(())
    })
    .unwrap();
    assert_eq!(q.to_sql().unwrap(), "SELECT * FROM \"users\" WHERE \"b\" = ?");
}

#[test]
fn snapshots_are_independent() {
    let mut q = users();
    q.where_eq("a", 1).order_by("id", Direction::Asc);

    let snapshot = q.snapshot_without(&[Component::Orders]);
    q.where_eq("b", 2);

    assert_eq!(
        snapshot.to_sql().unwrap(),
        "SELECT * FROM \"users\" WHERE \"a\" = ?"
    );
    assert_eq!(snapshot.get_bindings(), vec![Value::Int(1)]);

    let stripped = q.without_bindings(&[BindingKind::Where]);
    assert!(stripped.get_bindings().is_empty());
    assert_eq!(q.get_bindings().len(), 2);
}

#[test]
fn aggregate_strips_select_bindings() {
    let mut q = users();
    q.select_raw("? AS tag", [Value::from("t")]).where_eq("a", 1);
    let count = q.aggregate_query("count", ["*"]);
    assert_eq!(
        count.to_sql().unwrap(),
        "SELECT count(*) AS aggregate FROM \"users\" WHERE \"a\" = ?"
    );
    assert_eq!(count.get_bindings(), vec![Value::Int(1)]);
}

#[test]
fn delete_without_wheres_targets_every_row() {
    let mut q = users();
    q.select_raw("?", [Value::Int(1)]);
    let compiled = q.compile_delete().unwrap();
    assert_eq!(compiled.sql, "DELETE FROM \"users\"");
    assert!(compiled.bindings.is_empty());
}

#[test]
fn update_bindings_skip_select_bucket() {
    let mut q = users();
    q.select_raw("?", [Value::Int(7)]).where_eq("id", 1);
    let compiled = q.compile_update(&Record::new().set("votes", 5)).unwrap();
    assert_eq!(
        compiled.sql,
        "UPDATE \"users\" SET \"votes\" = ? WHERE \"id\" = ?"
    );
    assert_eq!(compiled.bindings, vec![Value::Int(5), Value::Int(1)]);
}

#[test]
fn manual_bindings() {
    let mut q = users();
    q.where_raw("a = ? or b = ?", [])
        .add_bindings([Value::Int(1), Value::Int(2)], BindingKind::Where)
        .add_binding("x", BindingKind::Having);
    assert_eq!(
        q.get_bindings(),
        vec![Value::Int(1), Value::Int(2), Value::from("x")]
    );

    q.set_bindings(vec![Value::Int(3)], BindingKind::Where);
    assert_eq!(q.get_bindings(), vec![Value::Int(3), Value::from("x")]);
}

#[test]
fn direction_parses_case_insensitively() {
    assert_eq!("DESC".parse::<Direction>().unwrap(), Direction::Desc);
    assert!(matches!(
        "sideways".parse::<Direction>().unwrap_err(),
        QbError::InvalidDirection(_)
    ));
}

#[test]
fn having_added_before_join_still_binds_after_it() {
    let mut q = users();
    q.having("email", "=", "x")
        .unwrap()
        .join_with("t", |join| {
            join.where_("t.id", "=", "y")?;
            Ok(())
        })
        .unwrap()
        .where_("id", "=", 1)
        .unwrap();

    assert_eq!(
        q.get_bindings(),
        vec![Value::from("y"), Value::Int(1), Value::from("x")]
    );
    let sql = q.to_sql().unwrap();
    assert_eq!(sql.matches('?').count(), 3);
}

#[test]
fn aggregate_over_union_keeps_select_bindings() {
    let mut second = users();
    second.select_raw("total + ? AS total", [Value::Int(2)]);

    let mut q = users();
    q.select_raw("total + ? AS total", [Value::Int(1)])
        .union(second);
    let max = q.aggregate_query("max", ["total"]);

    assert_eq!(
        max.to_sql().unwrap(),
        "SELECT max(\"total\") AS aggregate FROM ((SELECT total + ? AS total FROM \"users\") \
         UNION (SELECT total + ? AS total FROM \"users\")) AS \"temp_table\""
    );
    assert_eq!(max.get_bindings(), vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn joins_inside_a_join_callback_nest() {
    let mut q = users();
    q.join_with("posts", |join| {
        join.on("posts.user_id", "=", "users.id")?;
        join.where_eq("posts.published", true);
        join.join_where("comments", "comments.kind", "=", "spam")?;
        Ok(())
    })
    .unwrap()
    .where_eq("users.id", 7);

    assert_eq!(
        q.to_sql().unwrap(),
        "SELECT * FROM \"users\" INNER JOIN (\"posts\" INNER JOIN \"comments\" \
         ON \"comments\".\"kind\" = ?) ON \"posts\".\"user_id\" = \"users\".\"id\" \
         AND \"posts\".\"published\" = ? WHERE \"users\".\"id\" = ?"
    );
    assert_eq!(
        q.get_bindings(),
        vec![Value::from("spam"), Value::Int(1), Value::Int(7)]
    );
}

#[test]
fn join_callback_drops_bindings_of_unrendered_clauses() {
    let mut q = users();
    q.join_with("posts", |join| {
        join.on("posts.user_id", "=", "users.id")?;
        join.select_raw("?", [Value::Int(9)])
            .order_by_raw("?", [Value::Int(8)]);
        Ok(())
    })
    .unwrap();

    let compiled = q.to_compiled().unwrap();
    assert_eq!(compiled.sql.matches('?').count(), 0);
    assert!(compiled.bindings.is_empty());
}

/// Select sub, join sub, subquery in a join ON, nested groups two deep with
/// a subquery IN, a raw having and a union member that is itself a union.
fn deeply_nested(dialect: Dialect) -> QueryBuilder {
    let g = grammar(dialect);

    let mut score = QueryBuilder::table(Arc::clone(&g), "scores");
    score.select(["points"]).where_eq("scores.bonus", 0);

    let mut latest = QueryBuilder::table(Arc::clone(&g), "posts");
    latest.select(["user_id"]).where_eq("kind", "j");

    let mut archived = QueryBuilder::table(Arc::clone(&g), "archived_users");
    archived.select(["users.id"]).where_eq("id", 3);
    let mut legacy = QueryBuilder::table(Arc::clone(&g), "legacy_users");
    legacy.select(["users.id"]).where_eq("id", 4);
    archived.union(legacy);

    let mut q = QueryBuilder::table(g, "users");
    q.select(["users.id"])
        .select_sub(score, "score")
        .unwrap()
        .join_sub(latest, "p", "p.user_id", "=", "users.id")
        .unwrap()
        .join_with("comments", |join| {
            join.on("comments.user_id", "=", "users.id")?;
            join.where_in_with("comments.post_id", |sub| {
                sub.from("flags").select(["post_id"]).where_eq("level", 5);
                Ok(())
            })?;
            Ok(())
        })
        .unwrap()
        .where_eq("users.tenant", 10)
        .where_nested(|outer| {
            outer.where_eq("role", "admin");
            outer.or_where_nested(|inner| {
                inner.where_in_with("users.id", |sub| {
                    sub.from("teams")
                        .select(["owner_id"])
                        .where_in("tier", [11, 12]);
                    Ok(())
                })?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap()
        .group_by(["users.id"])
        .having_raw("count(*) > ?", [Value::Int(2)])
        .union(archived);
    q
}

#[test]
fn placeholders_line_up_with_bindings_in_every_dialect() {
    let expected = vec![
        Value::Int(0),
        Value::from("j"),
        Value::Int(5),
        Value::Int(10),
        Value::from("admin"),
        Value::Int(11),
        Value::Int(12),
        Value::Int(2),
        Value::Int(3),
        Value::Int(4),
    ];

    for dialect in [Dialect::MySql, Dialect::Postgres, Dialect::Sqlite] {
        let compiled = deeply_nested(dialect).to_compiled().unwrap();
        assert_eq!(
            compiled.sql.matches('?').count(),
            compiled.bindings.len(),
            "{dialect}: {}",
            compiled.sql
        );
        assert_eq!(compiled.bindings, expected, "{dialect}");
    }
}

#[test]
fn writes_bind_only_rendered_clauses_in_every_dialect() {
    for dialect in [Dialect::MySql, Dialect::Postgres, Dialect::Sqlite] {
        let mut q = QueryBuilder::table(grammar(dialect), "users");
        q.where_eq("active", 1)
            .having_raw("count(*) > ?", [Value::Int(4)])
            .order_by_raw("position(kind in ?)", [Value::from("x")]);

        let update = q.compile_update(&Record::new().set("name", "n")).unwrap();
        assert_eq!(
            update.sql.matches('?').count(),
            update.bindings.len(),
            "{dialect}: {}",
            update.sql
        );

        let delete = q.compile_delete().unwrap();
        assert_eq!(
            delete.sql.matches('?').count(),
            delete.bindings.len(),
            "{dialect}: {}",
            delete.sql
        );
    }
}
