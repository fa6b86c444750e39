// Statement construction compared against hand-built Sea-ORM queries
// Exercises the statement builder without a database

mod common;

use common::parent_entity::{Column, Entity};
use querycrate::{
    ColumnMap, CrudError, ListSettings, QuerySpec, StatementBuilder, extract_params,
    filtering::ilike, params_from_pairs,
};
use sea_orm::{
    ColumnTrait, Condition, DbBackend, EntityTrait, QueryFilter, QueryOrder, QueryTrait, Select,
    Value,
};
use serde_json::json;

fn settings() -> ListSettings {
    ListSettings {
        filterable: vec!["first".into(), "rank".into()],
        interval_filterable: vec!["created_at".into(), "rank".into()],
        sortable: vec!["rank".into(), "created_at".into()],
        searchable: vec!["first".into(), "second".into()],
        ..ListSettings::default()
    }
}

fn sql(select: Select<Entity>) -> String {
    select.build(DbBackend::Sqlite).to_string()
}

fn built(pairs: &[(&str, &str)]) -> String {
    let columns = ColumnMap::<Entity>::of_entity();
    let params = params_from_pairs(pairs.iter().copied());
    let extracted = extract_params(&params, &settings(), Some("id")).unwrap();
    sql(StatementBuilder::new(&columns).build(&extracted).unwrap())
}

#[test]
fn test_scalar_filter_matches_equality() {
    assert_eq!(
        built(&[("first", "alpha-one")]),
        sql(Entity::find().filter(Column::First.eq("alpha-one")))
    );
    assert_eq!(
        built(&[("rank", "3")]),
        sql(Entity::find().filter(Column::Rank.eq(3)))
    );
}

#[test]
fn test_repeated_key_matches_membership() {
    assert_eq!(
        built(&[("rank", "1"), ("rank", "2"), ("rank", "5")]),
        sql(Entity::find().filter(Column::Rank.is_in([1, 2, 5])))
    );
}

#[test]
fn test_interval_bounds() {
    let start = "2024-01-01T00:00:03Z";
    let end = "2024-01-01T00:00:07Z";
    let start_at = chrono::DateTime::parse_from_rfc3339(start)
        .unwrap()
        .with_timezone(&chrono::Utc);
    let end_at = chrono::DateTime::parse_from_rfc3339(end)
        .unwrap()
        .with_timezone(&chrono::Utc);

    assert_eq!(
        built(&[("start_created_at", start), ("end_created_at", end)]),
        sql(Entity::find()
            .filter(Column::CreatedAt.gte(start_at))
            .filter(Column::CreatedAt.lt(end_at)))
    );
    assert_eq!(
        built(&[("start_rank", "4")]),
        sql(Entity::find().filter(Column::Rank.gte(4)))
    );
    assert_eq!(
        built(&[("end_rank", "4")]),
        sql(Entity::find().filter(Column::Rank.lt(4)))
    );
}

#[test]
fn test_search_is_disjunctive() {
    let columns = ColumnMap::<Entity>::of_entity();
    let first = *columns.resolve("first").unwrap();
    let second = *columns.resolve("second").unwrap();
    assert_eq!(
        built(&[("search", "seven")]),
        sql(Entity::find().filter(
            Condition::any()
                .add(ilike(first, "seven"))
                .add(ilike(second, "seven"))
        ))
    );

    let params = params_from_pairs([("search", "seven")]);
    let extracted = extract_params(&params, &settings(), Some("id")).unwrap();
    let statement = StatementBuilder::new(&columns)
        .build(&extracted)
        .unwrap()
        .build(DbBackend::Sqlite);
    let where_clause = statement.sql.split_once("WHERE").unwrap().1;
    assert!(where_clause.contains(" OR "), "{where_clause}");
    assert!(!where_clause.contains(" AND "), "{where_clause}");
    let pattern = Value::from("%seven%".to_string());
    let values = statement.values.unwrap().0;
    assert_eq!(values.iter().filter(|v| **v == pattern).count(), 2);
}

#[test]
fn test_predicate_order_is_fixed() {
    let statement = built(&[
        ("sort_rank", "desc"),
        ("search_first", "alp"),
        ("end_rank", "9"),
        ("first", "alpha-seven"),
    ]);
    let filter_at = statement.find("\"first\" = 'alpha-seven'").unwrap();
    let interval_at = statement.find("\"rank\" < 9").unwrap();
    let search_at = statement.find("LIKE UPPER('%alp%')").unwrap();
    let order_at = statement.find("ORDER BY \"parent\".\"rank\" DESC").unwrap();
    assert!(filter_at < interval_at && interval_at < search_at && search_at < order_at);
}

#[test]
fn test_sort_follows_parameter_order() {
    assert_eq!(
        built(&[("sort_created_at", "DESC"), ("sort_rank", "asc")]),
        sql(Entity::find()
            .order_by_desc(Column::CreatedAt)
            .order_by_asc(Column::Rank))
    );
    assert_eq!(
        built(&[("sort_rank", "asc"), ("sort_created_at", "desc")]),
        sql(Entity::find()
            .order_by_asc(Column::Rank)
            .order_by_desc(Column::CreatedAt))
    );
}

#[test]
fn test_parameters_outside_allow_lists_are_ignored() {
    let plain = built(&[("rank", "3")]);
    let noisy = built(&[
        ("rank", "3"),
        ("second", "x"),
        ("sort_first", "sideways"),
        ("start_first", "a"),
        ("search_rank", "1"),
        ("nonsense", "1"),
    ]);
    assert_eq!(plain, noisy);
}

#[test]
fn test_query_spec() {
    let columns = ColumnMap::<Entity>::of_entity();
    let spec = QuerySpec::from_json(&json!({
        "where": {"and": [
            {"col": "rank", "opr": "ge", "value": 2},
            {"col": "first", "opr": "in", "value": ["alpha-one", "alpha-seven"]}
        ]},
        "order_by": [{"col": "rank", "opr": "desc"}],
        "limit": 5
    }))
    .unwrap();
    let expected = Entity::find()
        .filter(
            Condition::all()
                .add(Column::Rank.gte(2))
                .add(Column::First.is_in(["alpha-one", "alpha-seven"])),
        )
        .order_by_desc(Column::Rank);
    let expected = sea_orm::QuerySelect::limit(expected, 5);
    assert_eq!(sql(spec.to_select(&columns, None).unwrap()), sql(expected));
}

#[test]
fn test_query_spec_errors_before_execution() {
    let columns = ColumnMap::<Entity>::of_entity();

    let spec = QuerySpec::from_json(&json!({"where": {"col": "nickname", "opr": "eq", "value": 1}}))
        .unwrap();
    assert!(matches!(
        spec.to_select(&columns, None),
        Err(CrudError::UnknownColumn { .. })
    ));

    let err = QuerySpec::from_json(&json!({"where": {"col": "rank", "opr": "like", "value": 1}}))
        .unwrap_err();
    assert!(matches!(err, CrudError::UnsupportedOperator { ref operator } if operator == "like"));

    let spec = QuerySpec::from_json(&json!({"where": {"or": [
        {"col": "rank", "opr": "eq", "value": 1},
        {"col": "rank", "opr": "eq", "value": 2}
    ]}}))
    .unwrap();
    assert!(matches!(
        spec.to_select(&columns, None),
        Err(CrudError::NotImplemented(_))
    ));

    let err = QuerySpec::from_json(&json!({"order_by": [{"col": "rank", "opr": "up"}]}))
        .unwrap_err();
    assert!(matches!(err, CrudError::InvalidSortDirection { .. }));
}
