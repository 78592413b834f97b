//! Name-keyed dispatch and the node/adventure relationship query.

use modelkit::prelude::*;
use serde_json::json;

fn setup() -> (Executor<MemoryStore>, DispatchTable<MemoryStore>) {
    let registry = Arc::new(modelkit::models::builtin_registry().unwrap());
    let store = MemoryStore::new();
    let table = DispatchTable::standard(&registry).unwrap();
    let executor = Executor::new(Arc::clone(&registry), store.clone())
        .with_evaluator(MemoryFilterEvaluator::new(store, registry));
    (executor, table)
}

fn adventure(name: &str, backend: Option<&str>, state: Option<&str>) -> Record {
    Record::new()
        .with("name", name)
        .with("dsl", json!([]))
        .with("backend", backend)
        .with("backend_state", state)
}

fn names(rows: &[Record]) -> Vec<&str> {
    rows.iter()
        .filter_map(|r| r.get("name").and_then(Value::as_str))
        .collect()
}

#[test]
fn compatible_adventures() {
    let (executor, _) = setup();
    executor
        .create(
            "nodes",
            &Record::new()
                .with("backend", "chef")
                .with("backend_state", "ready"),
        )
        .unwrap();

    for (name, backend, state) in [
        ("exact", Some("chef"), Some("ready")),
        ("any backend", None, Some("ready")),
        ("anything", None, None),
        ("wrong state", Some("chef"), Some("unknown")),
        ("wrong backend", Some("puppet"), None),
    ] {
        executor
            .create("adventures", &adventure(name, backend, state))
            .unwrap();
    }

    let rows = modelkit::adventures_compatible_with_node(&executor, Value::from(1)).unwrap();
    assert_eq!(names(&rows), vec!["exact", "any backend", "anything"]);
    // full records
    assert_eq!(rows[0].len(), executor.get_columns("adventures").unwrap().len());

    let missing = modelkit::adventures_compatible_with_node(&executor, Value::from(99)).unwrap();
    assert!(missing.is_empty());
}

#[test]
fn null_string_is_not_null() {
    let (executor, _) = setup();
    executor
        .create(
            "nodes",
            &Record::new()
                .with("backend", "chef")
                .with("backend_state", "ready"),
        )
        .unwrap();
    executor
        .create("adventures", &adventure("literal", Some("null"), None))
        .unwrap();

    let rows = modelkit::adventures_compatible_with_node(&executor, Value::from(1)).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn dispatch_crud_round_trip() {
    let (executor, table) = setup();

    let created = table
        .call(
            &executor,
            "node_create",
            Call::Fields(Record::new().with("backend", "east")),
        )
        .unwrap()
        .into_record()
        .unwrap();

    let fetched = table
        .call(&executor, "node_get_by_id", Call::Id(Value::from(1)))
        .unwrap();
    assert_eq!(fetched, Reply::Record(Some(created)));

    let updated = table
        .call(
            &executor,
            "node_update_by_id",
            Call::IdFields(Value::from(1), Record::new().with("backend", "west")),
        )
        .unwrap()
        .into_record()
        .unwrap();
    assert_eq!(updated.get("backend"), Some(&Value::from("west")));

    let first = table
        .call(
            &executor,
            "node_get_first_by_filter",
            Call::Filters(Record::new().with("backend", "west")),
        )
        .unwrap();
    assert_eq!(first, Reply::Record(Some(updated)));

    let all = table.call(&executor, "nodes_get_all", Call::None).unwrap();
    assert_eq!(all.into_records().len(), 1);

    let queried = table
        .call(&executor, "nodes_query", Call::Query("backend = 'west'".into()))
        .unwrap();
    assert_eq!(queried.into_records().len(), 1);

    let columns = table.call(&executor, "node_get_columns", Call::None).unwrap();
    assert_eq!(
        columns,
        Reply::Columns(vec!["id", "hostname", "backend", "backend_state"])
    );

    let deleted = table
        .call(&executor, "node_delete_by_id", Call::Id(Value::from(1)))
        .unwrap();
    assert_eq!(deleted, Reply::Deleted(true));
    assert!(
        table
            .call(&executor, "node_delete_by_id", Call::Id(Value::from(1)))
            .unwrap_err()
            .is_not_found()
    );
}

#[test]
fn dispatch_hand_written_operation() {
    let (executor, table) = setup();
    executor
        .create("nodes", &Record::new().with("backend", "chef"))
        .unwrap();
    executor
        .create("adventures", &adventure("any", None, None))
        .unwrap();

    let reply = table
        .call(&executor, "adventures_get_by_node_id", Call::Id(Value::from(1)))
        .unwrap();
    assert_eq!(names(&reply.into_records()), vec!["any"]);
}

#[test]
fn hand_written_operation_survives_generation() {
    let registry = modelkit::models::builtin_registry().unwrap();
    let table = DispatchTable::<MemoryStore>::builder()
        .operation("adventures_get_all", |_, _| Ok(Reply::Records(Vec::new())))
        .builtin_overrides(&registry)
        .build(&registry)
        .unwrap();
    let executor = Executor::new(registry, MemoryStore::new());
    executor
        .create("adventures", &adventure("one", None, None))
        .unwrap();

    let reply = table
        .call(&executor, "adventures_get_all", Call::None)
        .unwrap();
    assert_eq!(reply, Reply::Records(Vec::new()));
    assert_eq!(executor.get_all("adventures").unwrap().len(), 1);
}

#[test]
fn dispatch_errors() {
    let (executor, table) = setup();
    assert!(matches!(
        table.call(&executor, "node_explode", Call::None),
        Err(Error::UnknownOperation(_))
    ));
    assert!(matches!(
        table.call(&executor, "nodes_get_all", Call::Id(Value::from(1))),
        Err(Error::InvalidArguments { .. })
    ));
}
