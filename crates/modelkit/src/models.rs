//! Built-in entity types.
//!
//! | Type         | Notes                                         |
//! |--------------|-----------------------------------------------|
//! | `nodes`      | managed hosts                                 |
//! | `adventures` | runnable workflows, scoped to a backend state |
//! | `tasks`      | work queued for a node; `submitted` is fixed  |
//! | `facts`      | key/value facts about a node                  |
//! | `filters`    | saved filter expressions; `full_expr` derived |

use modelkit_core::{
    EntityDescriptor, EntityRegistry, FieldInfo, Record, Result, SqlType, SynthesizedField, Value,
};

const NODE_FIELDS: &[FieldInfo] = &[
    FieldInfo::id("id"),
    FieldInfo::new("hostname", SqlType::Varchar(64))
        .nullable(true)
        .unique(true),
    FieldInfo::new("backend", SqlType::Varchar(32)).nullable(true),
    FieldInfo::new("backend_state", SqlType::Varchar(32)).nullable(true),
];

pub const NODES: EntityDescriptor = EntityDescriptor::new("nodes", NODE_FIELDS);

const ADVENTURE_FIELDS: &[FieldInfo] = &[
    FieldInfo::id("id"),
    FieldInfo::new("name", SqlType::Varchar(30)).unique(true),
    FieldInfo::new("dsl", SqlType::Json),
    FieldInfo::new("backend", SqlType::Varchar(32)).nullable(true),
    FieldInfo::new("backend_state", SqlType::Varchar(32)).nullable(true),
];

pub const ADVENTURES: EntityDescriptor = EntityDescriptor::new("adventures", ADVENTURE_FIELDS);

const TASK_FIELDS: &[FieldInfo] = &[
    FieldInfo::id("id"),
    FieldInfo::new("action", SqlType::Varchar(40)),
    FieldInfo::new("node_id", SqlType::Integer).foreign_key("nodes.id"),
    FieldInfo::new("payload", SqlType::Json).nullable(true),
    FieldInfo::new("state", SqlType::Varchar(16)).nullable(true),
    FieldInfo::new("result", SqlType::Json).nullable(true),
    FieldInfo::new("submitted", SqlType::Integer).nullable(true),
    FieldInfo::new("completed", SqlType::Integer).nullable(true),
    FieldInfo::new("expires", SqlType::Integer).nullable(true),
];

/// Tasks keep their submission time for life.
pub const TASKS: EntityDescriptor =
    EntityDescriptor::new("tasks", TASK_FIELDS).non_updatable(&["submitted"]);

const FACT_FIELDS: &[FieldInfo] = &[
    FieldInfo::id("id"),
    FieldInfo::new("node_id", SqlType::Integer).foreign_key("nodes.id"),
    FieldInfo::new("key", SqlType::Varchar(64)),
    FieldInfo::new("value", SqlType::JsonEntry).nullable(true),
];

pub const FACTS: EntityDescriptor = EntityDescriptor::new("facts", FACT_FIELDS);

const FILTER_FIELDS: &[FieldInfo] = &[
    FieldInfo::id("id"),
    FieldInfo::new("name", SqlType::Varchar(30)).unique(true),
    FieldInfo::new("filter_type", SqlType::Varchar(30)),
    FieldInfo::new("expr", SqlType::Varchar(255)),
    FieldInfo::new("parent_id", SqlType::Integer)
        .nullable(true)
        .foreign_key("filters.id"),
];

/// `full_expr` is `"<filter_type>: <expr>"`, the form a filter evaluator
/// front end accepts as a self-describing query.
fn full_expr(row: &Record) -> Value {
    let kind = row.get("filter_type").and_then(Value::as_str);
    let expr = row.get("expr").and_then(Value::as_str);
    match (kind, expr) {
        (Some(kind), Some(expr)) => Value::Text(format!("{kind}: {expr}")),
        _ => Value::Null,
    }
}

const FILTER_SYNTHESIZED: &[SynthesizedField] = &[SynthesizedField::new("full_expr", full_expr)];

pub const FILTERS: EntityDescriptor =
    EntityDescriptor::new("filters", FILTER_FIELDS).synthesized(FILTER_SYNTHESIZED);

/// Built-in descriptors in registration order.
pub const BUILTIN: [EntityDescriptor; 5] = [NODES, ADVENTURES, TASKS, FACTS, FILTERS];

/// Registry holding every built-in type.
pub fn builtin_registry() -> Result<EntityRegistry> {
    EntityRegistry::from_descriptors(BUILTIN)
}
