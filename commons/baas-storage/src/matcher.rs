use std::cmp::Ordering;

use baas_models::{CREATED_AT, OBJECT_ID, Object, UPDATED_AT};
use serde_json::{Number, Value};

use crate::error::StorageError;
use crate::traits::{SortKey, StorageResult};

/// Evaluate a where-clause against a stored object.
pub fn matches(where_: &Object, object: &Object) -> StorageResult<bool> {
    for (field, cond) in where_ {
        let ok = match field.as_str() {
            "$or" => {
                let mut any = false;
                for clause in clauses(cond)? {
                    if matches(clause, object)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            "$and" => {
                let mut all = true;
                for clause in clauses(cond)? {
                    if !matches(clause, object)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            _ => match_field(field, object.get(field), cond)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn clauses(cond: &Value) -> StorageResult<Vec<&Object>> {
    let list = cond.as_array().ok_or_else(|| {
        StorageError::InvalidQuery("expected an array of clauses".into())
    })?;
    list.iter()
        .map(|c| {
            c.as_object().ok_or_else(|| {
                StorageError::InvalidQuery("expected a clause object".into())
            })
        })
        .collect()
}

fn operator_object(cond: &Value) -> Option<&Object> {
    cond.as_object()
        .filter(|m| !m.is_empty() && m.keys().all(|k| k.starts_with('$')))
}

fn match_field(
    field: &str,
    value: Option<&Value>,
    cond: &Value,
) -> StorageResult<bool> {
    let Some(ops) = operator_object(cond) else {
        return Ok(value.is_some_and(|v| values_equal(v, cond)));
    };
    for (op, arg) in ops {
        let ok = match op.as_str() {
            "$in" => {
                let list = as_list(op, arg)?;
                value.is_some_and(|v| contains(list, v))
            }
            "$nin" => {
                let list = as_list(op, arg)?;
                !value.is_some_and(|v| contains(list, v))
            }
            "$ne" => !value.is_some_and(|v| values_equal(v, arg)),
            "$exists" => {
                let want = arg.as_bool().ok_or_else(|| {
                    StorageError::InvalidQuery(format!(
                        "$exists on {} expects a boolean",
                        field
                    ))
                })?;
                value.is_some_and(|v| !v.is_null()) == want
            }
            "$gt" => compare(value, arg) == Some(Ordering::Greater),
            "$gte" => matches!(
                compare(value, arg),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            "$lt" => compare(value, arg) == Some(Ordering::Less),
            "$lte" => matches!(
                compare(value, arg),
                Some(Ordering::Less | Ordering::Equal)
            ),
            other => {
                return Err(StorageError::InvalidQuery(format!(
                    "unsupported operator {} on field {}",
                    other, field
                )));
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn as_list<'a>(op: &str, arg: &'a Value) -> StorageResult<&'a [Value]> {
    arg.as_array().map(Vec::as_slice).ok_or_else(|| {
        StorageError::InvalidQuery(format!("{} expects an array", op))
    })
}

fn contains(list: &[Value], value: &Value) -> bool {
    match value {
        Value::Array(items) => items
            .iter()
            .any(|item| list.iter().any(|l| values_equal(l, item))),
        _ => list.iter().any(|l| values_equal(l, value)),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        // scalar equality against an array field is membership
        (Value::Array(items), other) if !other.is_array() => {
            items.iter().any(|item| values_equal(item, other))
        }
        _ => a == b,
    }
}

fn compare(value: Option<&Value>, arg: &Value) -> Option<Ordering> {
    value.and_then(|v| compare_values(v, arg))
}

pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Apply an update payload in place. Keys may be dotted paths into nested
/// objects; values may be `{"__op": "Increment", "amount": n}` or
/// `{"__op": "Delete"}`.
pub fn apply_update(object: &mut Object, update: &Object) -> StorageResult<()> {
    for (key, value) in update {
        if key == OBJECT_ID {
            continue;
        }
        let (parent, leaf) = resolve_path(object, key)?;
        let op = value
            .as_object()
            .and_then(|m| m.get("__op"))
            .and_then(Value::as_str);
        match op {
            Some("Increment") => {
                let amount = value
                    .get("amount")
                    .cloned()
                    .unwrap_or_else(|| Value::from(1));
                let next = add_numbers(parent.get(leaf), &amount)?;
                parent.insert(leaf.to_string(), next);
            }
            Some("Delete") => {
                parent.remove(leaf);
            }
            Some(other) => {
                return Err(StorageError::InvalidUpdate(format!(
                    "unsupported operation {} on {}",
                    other, key
                )));
            }
            None => {
                parent.insert(leaf.to_string(), value.clone());
            }
        }
    }
    Ok(())
}

fn resolve_path<'o, 'k>(
    object: &'o mut Object,
    key: &'k str,
) -> StorageResult<(&'o mut Object, &'k str)> {
    let Some((path, leaf)) = key.rsplit_once('.') else {
        return Ok((object, key));
    };
    let mut current = object;
    for part in path.split('.') {
        current = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Object::new()))
            .as_object_mut()
            .ok_or_else(|| {
                StorageError::InvalidUpdate(format!(
                    "{} is not an object in {}",
                    part, key
                ))
            })?;
    }
    Ok((current, leaf))
}

fn add_numbers(current: Option<&Value>, amount: &Value) -> StorageResult<Value> {
    let base = match current {
        None | Some(Value::Null) => Value::from(0),
        Some(v @ Value::Number(_)) => v.clone(),
        Some(_) => {
            return Err(StorageError::InvalidUpdate(
                "cannot increment a non-numeric field".into(),
            ));
        }
    };
    if let (Some(a), Some(b)) = (base.as_i64(), amount.as_i64()) {
        if let Some(sum) = a.checked_add(b) {
            return Ok(Value::from(sum));
        }
    }
    match (base.as_f64(), amount.as_f64()) {
        (Some(a), Some(b)) => Number::from_f64(a + b)
            .map(Value::Number)
            .ok_or_else(|| {
                StorageError::InvalidUpdate("increment overflowed".into())
            }),
        _ => Err(StorageError::InvalidUpdate(
            "increment amount must be a number".into(),
        )),
    }
}

pub fn sort_objects(objects: &mut [Object], order: &[SortKey]) {
    if order.is_empty() {
        return;
    }
    objects.sort_by(|a, b| {
        for key in order {
            let ord = match (a.get(&key.field), b.get(&key.field)) {
                (Some(x), Some(y)) => {
                    compare_values(x, y).unwrap_or(Ordering::Equal)
                }
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            };
            let ord = if key.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

/// Keep only `keys` plus the bookkeeping fields.
pub fn project(object: &Object, keys: &[String]) -> Object {
    object
        .iter()
        .filter(|(k, _)| {
            k.as_str() == OBJECT_ID
                || k.as_str() == CREATED_AT
                || k.as_str() == UPDATED_AT
                || keys.iter().any(|want| want == *k)
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
