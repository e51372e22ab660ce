//! Recursive leaf transforms over document subtrees.
//!
//! Some configured fields are whole sub-objects; the walker descends to
//! every scalar underneath and applies an async transform to each.

use crate::error::EngineResult;
use crate::path::{get_path, set_path, FieldPath};
use futures::future::try_join_all;
use serde_json::Value;
use std::future::Future;

/// Collects the concrete path of every non-null leaf under `base`
/// (depth-first, stable order). Null leaves are skipped — transforms are
/// never applied to absent values.
pub fn collect_leaves(root: &Value, base: &FieldPath) -> Vec<FieldPath> {
    let mut leaves = Vec::new();
    if let Some(start) = get_path(root, base) {
        collect_into(start, base.clone(), &mut leaves);
    }
    leaves
}

fn collect_into(node: &Value, path: FieldPath, leaves: &mut Vec<FieldPath>) {
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                collect_into(child, path.child(key.clone()), leaves);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                collect_into(child, path.child(index.to_string()), leaves);
            }
        }
        Value::Null => {}
        _ => leaves.push(path),
    }
}

/// Transforms every non-null leaf under `base` in place.
///
/// All leaf transforms are dispatched concurrently and awaited together;
/// the results land on their (disjoint) paths only after the whole join
/// succeeds, so a failed transform publishes nothing.
pub async fn transform_leaves<F, Fut>(
    root: &mut Value,
    base: &FieldPath,
    transform: F,
) -> EngineResult<()>
where
    F: Fn(FieldPath, Value) -> Fut,
    Fut: Future<Output = EngineResult<Value>>,
{
    let leaves = collect_leaves(root, base);

    let mut tasks = Vec::with_capacity(leaves.len());
    for path in &leaves {
        let value = get_path(root, path).cloned().unwrap_or(Value::Null);
        tasks.push(transform(path.clone(), value));
    }
    let transformed = try_join_all(tasks).await?;

    for (path, value) in leaves.iter().zip(transformed) {
        set_path(root, path, value);
    }
    Ok(())
}
