//! Filter Compiler Tests
//!
//! Predicates and their arguments:
//! - Client text reaches SQL only as bound arguments
//! - Every placeholder in the output has exactly one argument
//! - A dropped filter leaves the argument list untouched

use antity::filter::{
    BoolOperator, Filter, FilterAnomaly, FilterCategory, FilterCompiler, FilterMap, MatchMode,
    MatchModeRegistry, SqlArgs, MAX_OBJECT_DEPTH,
};
use antity::schema::{Entity, PropertyDescriptor};
use antity::types::TypeRegistry;
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn entity() -> Entity {
    Entity::new(
        "Listing",
        "listings",
        vec![
            PropertyDescriptor::new("name", "string"),
            PropertyDescriptor::new("age", "integer"),
            PropertyDescriptor::new("born", "date"),
            PropertyDescriptor::new("active", "boolean"),
            PropertyDescriptor::new("meta", "object"),
            PropertyDescriptor::new("tags", "array"),
            PropertyDescriptor::new("location", "geometry"),
            PropertyDescriptor::new("variantsJsonAgg", "array"),
            PropertyDescriptor::new("idsArrayAgg", "array"),
        ],
        &TypeRegistry::default(),
    )
    .unwrap()
}

fn filters(value: Value) -> FilterMap {
    serde_json::from_value(value).unwrap()
}

/// Compiles with the standard modes and a fresh argument list.
fn compile(value: Value) -> (Vec<String>, Vec<DroppedReason>, Vec<Value>) {
    let entity = entity();
    let modes = MatchModeRegistry::standard();
    let mut args = SqlArgs::new();
    let out = FilterCompiler::new(&entity, &modes).compile(&filters(value), &mut args);
    let dropped = out
        .dropped
        .into_iter()
        .map(|d| (d.field, d.anomaly))
        .collect();
    (out.fragments, dropped, args.into_values())
}

type DroppedReason = (String, FilterAnomaly);

/// Highest `$n` placeholder in `sql`.
fn highest_placeholder(sql: &str) -> usize {
    let mut highest = 0;
    let mut rest = sql;
    while let Some(at) = rest.find('$') {
        let digits: String = rest[at + 1..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        if let Ok(n) = digits.parse::<usize>() {
            highest = highest.max(n);
        }
        rest = &rest[at + 1..];
    }
    highest
}

// =============================================================================
// Text Tests
// =============================================================================

#[test]
fn test_contains_wraps_and_binds_once() {
    let (fragments, dropped, args) =
        compile(json!({"name": {"value": "abc", "matchMode": "contains"}}));
    assert_eq!(fragments, ["LOWER(\"name\") LIKE $1"]);
    assert!(dropped.is_empty());
    assert_eq!(args, [json!("%abc%")]);
}

#[test]
fn test_text_modes() {
    let (fragments, _, args) = compile(json!({
        "name": [
            {"value": "Ab", "matchMode": "startsWith", "operator": "or"},
            {"value": "yz", "matchMode": "endsWith"},
            {"value": "no", "matchMode": "notContains"},
            {"value": "X", "matchMode": "notEquals"}
        ]
    }));
    assert_eq!(
        fragments,
        ["(LOWER(\"name\") LIKE $1 OR LOWER(\"name\") LIKE $2 OR \
          LOWER(\"name\") NOT LIKE $3 OR LOWER(\"name\") <> $4)"]
    );
    assert_eq!(args, [json!("ab%"), json!("%yz"), json!("%no%"), json!("x")]);
}

/// User wildcards are literals inside the pattern.
#[test]
fn test_like_wildcards_escaped() {
    let (_, _, args) = compile(json!({"name": {"value": "50%_off", "matchMode": "contains"}}));
    assert_eq!(args, [json!("%50\\%\\_off%")]);
}

#[test]
fn test_in_binds_one_array() {
    let (fragments, _, args) = compile(json!({"name": {"value": ["A", "b"], "matchMode": "in"}}));
    assert_eq!(fragments, ["\"name\" = ANY($1)"]);
    assert_eq!(args, [json!(["A", "b"])]);
}

/// Hostile text never leaves the argument list.
#[test]
fn test_injection_stays_bound() {
    let hostile = "x'; DROP TABLE listings; --";
    let (fragments, _, args) = compile(json!({"name": {"value": hostile}}));
    assert!(!fragments[0].contains("DROP"));
    assert_eq!(args, [json!(hostile.to_lowercase())]);
}

// =============================================================================
// Number / Date / Boolean Tests
// =============================================================================

#[test]
fn test_numeric_comparators() {
    let (fragments, _, args) = compile(json!({
        "age": [
            {"value": "18", "matchMode": "gte"},
            {"value": 65, "matchMode": "lt"}
        ]
    }));
    assert_eq!(fragments, ["(\"age\" >= $1 AND \"age\" < $2)"]);
    assert_eq!(args, [json!(18), json!(65)]);
}

#[test]
fn test_open_range() {
    let (fragments, _, args) =
        compile(json!({"age": {"value": [null, 30], "matchMode": "between"}}));
    assert_eq!(fragments, ["\"age\" <= $1"]);
    assert_eq!(args, [json!(30)]);
}

#[test]
fn test_dates() {
    let (fragments, _, args) = compile(json!({
        "born": [
            {"value": "2000-01-01", "matchMode": "after"},
            {"value": "2010-12-31T00:00:00Z", "matchMode": "before"}
        ]
    }));
    assert_eq!(fragments, ["(\"born\" > $1 AND \"born\" < $2)"]);
    assert_eq!(args.len(), 2);

    let (fragments, _, _) = compile(json!({"born": {"value": "2000-01-01"}}));
    assert_eq!(fragments, ["\"born\" = $1"]);

    let (_, dropped, args) = compile(json!({"born": {"value": "someday"}}));
    assert_eq!(dropped[0].1, FilterAnomaly::BadValue("date"));
    assert!(args.is_empty());
}

#[test]
fn test_boolean_from_string() {
    let (fragments, _, args) = compile(json!({"active": {"value": "true"}}));
    assert_eq!(fragments, ["\"active\" = $1"]);
    assert_eq!(args, [json!(true)]);
}

// =============================================================================
// Drop Tests
// =============================================================================

#[test]
fn test_illegal_mode_dropped_without_args() {
    let (fragments, dropped, args) =
        compile(json!({"age": {"value": "abc", "matchMode": "contains"}}));
    assert!(fragments.is_empty());
    assert!(args.is_empty());
    assert_eq!(
        dropped,
        [(
            "age".to_string(),
            FilterAnomaly::IllegalMode {
                mode: MatchMode::Contains,
                category: FilterCategory::Number
            }
        )]
    );
}

/// The rest of the map still compiles around a dropped filter.
#[test]
fn test_drop_is_local() {
    let (fragments, dropped, args) = compile(json!({
        "active": {"value": 3},
        "age": {"value": 7},
        "name": {"value": "ok"}
    }));
    assert_eq!(fragments, ["\"age\" = $1", "LOWER(\"name\") = $2"]);
    assert_eq!(dropped[0].0, "active");
    assert_eq!(args, [json!(7), json!("ok")]);
}

#[test]
fn test_empty_list_dropped() {
    let (fragments, dropped, _) = compile(json!({"age": []}));
    assert!(fragments.is_empty());
    assert_eq!(dropped[0].1, FilterAnomaly::Empty);
}

#[test]
fn test_match_mode_names_are_exact() {
    let (_, dropped, _) = compile(json!({"name": {"value": "x", "matchMode": "Contains"}}));
    assert_eq!(dropped[0].1, FilterAnomaly::UnknownMode("Contains".into()));
}

// =============================================================================
// Structural Tests
// =============================================================================

#[test]
fn test_object_value_addresses_json_keys() {
    let (fragments, _, args) = compile(json!({"meta": {"value": {"color": "Red"}}}));
    assert_eq!(fragments, ["LOWER(\"meta\"->>$1) = $2"]);
    assert_eq!(args, [json!("color"), json!("red")]);
}

#[test]
fn test_object_depth_limit() {
    let mut nested = json!("leaf");
    for _ in 0..=MAX_OBJECT_DEPTH {
        nested = json!({ "k": nested });
    }
    let (fragments, dropped, args) = compile(json!({"meta": {"value": nested}}));
    assert!(fragments.is_empty());
    assert!(matches!(dropped[0].1, FilterAnomaly::BadValue(_)));
    assert!(args.is_empty());
}

/// A null leaf inside an object follows the requested mode.
#[test]
fn test_object_null_leaf() {
    let (fragments, _, args) = compile(json!({
        "meta": {"value": {"a": null}, "matchMode": "notEquals"}
    }));
    assert_eq!(fragments, ["\"meta\"->>$1 IS NOT NULL"]);
    assert_eq!(args, [json!("a")]);

    let (fragments, dropped, args) = compile(json!({
        "meta": {"value": {"a": null}, "matchMode": "contains"}
    }));
    assert!(fragments.is_empty());
    assert_eq!(dropped[0].1, FilterAnomaly::UnsupportedMode(MatchMode::Contains));
    assert!(args.is_empty());
}

#[test]
fn test_json_agg() {
    let (fragments, _, args) = compile(json!({
        "variantsJsonAgg": {"value": "red", "subProps": ["color"]}
    }));
    assert_eq!(
        fragments,
        ["EXISTS (SELECT 1 FROM json_array_elements(\"variantsJsonAgg\"::json) AS p \
          WHERE (LOWER(p->>$1) = $2))"]
    );
    assert_eq!(args, [json!("color"), json!("red")]);

    let (_, dropped, _) = compile(json!({"variantsJsonAgg": {"value": "red"}}));
    assert_eq!(dropped[0].1, FilterAnomaly::MissingSubProps);

    let (_, dropped, _) = compile(json!({
        "variantsJsonAgg": {"value": [1, 2], "subProps": ["size"], "matchMode": "between"}
    }));
    assert!(matches!(dropped[0].1, FilterAnomaly::IllegalMode { .. }));

    let (fragments, _, args) = compile(json!({
        "variantsJsonAgg": {"value": [3], "subProps": ["size"], "matchMode": "notEquals"}
    }));
    assert_eq!(
        fragments,
        ["EXISTS (SELECT 1 FROM json_array_elements(\"variantsJsonAgg\"::json) AS p \
          WHERE (p->>$1 <> $2))"]
    );
    assert_eq!(args, [json!("size"), json!("3")]);

    let (_, dropped, _) = compile(json!({
        "variantsJsonAgg": {"value": [3], "subProps": ["size"], "matchMode": "startsWith"}
    }));
    assert_eq!(dropped[0].1, FilterAnomaly::UnsupportedMode(MatchMode::StartsWith));
}

#[test]
fn test_array_agg_integers_only() {
    let (fragments, _, args) = compile(json!({"idsArrayAgg": {"value": [1, "x", 2]}}));
    assert_eq!(
        fragments,
        ["($1 = ANY(\"idsArrayAgg\") OR $2 = ANY(\"idsArrayAgg\"))"]
    );
    assert_eq!(args, [json!(1), json!(2)]);
}

#[test]
fn test_array_column_keeps_scalars() {
    let (fragments, _, args) = compile(json!({"tags": {"value": ["a", 1]}}));
    assert_eq!(fragments, ["($1 = ANY(\"tags\") OR $2 = ANY(\"tags\"))"]);
    assert_eq!(args, [json!("a"), json!(1)]);
}

#[test]
fn test_geometry_mode_inferred_from_value() {
    let (fragments, _, args) = compile(json!({
        "location": {"value": {"lng": 2.35, "lat": 48.85, "radius": 1000}}
    }));
    assert_eq!(
        fragments,
        ["ST_DWithin(\"location\", ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $3)"]
    );
    assert_eq!(args.len(), 3);

    let (fragments, _, _) = compile(json!({
        "location": {"value": {"bounds": {"minLng": 0, "minLat": 0, "maxLng": 1, "maxLat": 1}}}
    }));
    assert!(fragments[0].starts_with("ST_Contains(ST_MakeEnvelope($1, $2, $3, $4, 4326)"));
}

// =============================================================================
// Argument Threading Tests
// =============================================================================

/// Every placeholder has an argument and every argument a placeholder.
#[test]
fn test_placeholders_match_args() {
    let (fragments, dropped, args) = compile(json!({
        "name": {"value": "x", "matchMode": "startsWith"},
        "age": [{"value": [1, 2], "matchMode": "between"}, {"value": [5, 6], "matchMode": "in"}],
        "meta": {"value": {"a": 1, "b": {"c": "d"}}},
        "variantsJsonAgg": {"value": ["red", 1, "blue", 2], "subProps": ["color", "size"]},
        "location": {"value": {"lng": 1, "lat": 2, "radius": 3}},
        "active": {"value": "maybe"}
    }));
    assert_eq!(dropped.len(), 1);
    let sql = fragments.join(" AND ");
    assert_eq!(highest_placeholder(&sql), args.len());
}

/// Compiling onto a list that already holds arguments continues its numbering.
#[test]
fn test_numbering_continues_from_existing_args() {
    let entity = entity();
    let modes = MatchModeRegistry::standard();
    let mut args = SqlArgs::new();
    args.bind("already");

    let out = FilterCompiler::new(&entity, &modes)
        .compile(&filters(json!({"age": {"value": 3}})), &mut args);
    assert_eq!(out.predicate(BoolOperator::And).unwrap(), "\"age\" = $2");
    assert_eq!(args.len(), 2);
}

#[test]
fn test_compile_is_idempotent() {
    let entity = entity();
    let modes = MatchModeRegistry::standard();
    let compiler = FilterCompiler::new(&entity, &modes);
    let map = filters(json!({
        "name": {"value": "Ann", "matchMode": "contains"},
        "meta": {"value": {"k": "v"}},
        "born": {"value": ["2000-01-01", null], "matchMode": "between"}
    }));

    let mut first = SqlArgs::new();
    let a = compiler.compile(&map, &mut first);
    let mut second = SqlArgs::new();
    let b = compiler.compile(&map, &mut second);
    assert_eq!(a, b);
    assert_eq!(first, second);
}

#[test]
fn test_builder_filters() {
    let entity = entity();
    let modes = MatchModeRegistry::standard();
    let mut map = FilterMap::new();
    map.insert("age".into(), Filter::new(40).mode("lte").into());

    let mut args = SqlArgs::new();
    let out = FilterCompiler::new(&entity, &modes).compile(&map, &mut args);
    assert_eq!(out.fragments, ["\"age\" <= $1"]);
}

// =============================================================================
// Registry Extension Tests
// =============================================================================

#[test]
fn test_extended_mode_registry() {
    let entity = entity();
    let modes = MatchModeRegistry::standard().with_mode(FilterCategory::Number, MatchMode::Before);
    let mut args = SqlArgs::new();
    let out = FilterCompiler::new(&entity, &modes).compile(
        &filters(json!({"age": {"value": 5, "matchMode": "before"}})),
        &mut args,
    );
    assert_eq!(out.fragments, ["\"age\" < $1"]);
}
