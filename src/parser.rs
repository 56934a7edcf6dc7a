use crate::ir::{Detail, Length, MarkInstance, MarkSheet, Task, TaskSet};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{what} must be a JSON object")]
    NotAnObject { what: &'static str },
    #[error("task `{key}`: missing field `{field}`")]
    MissingField { key: String, field: &'static str },
    #[error("task `{key}`, detail {index}: {reason}")]
    BadDetail {
        key: String,
        index: usize,
        reason: String,
    },
    #[error("marks `{key}`, entry {index}: {reason}")]
    BadMark {
        key: String,
        index: usize,
        reason: String,
    },
    #[error("unknown task key `{0}` in print order")]
    UnknownTask(String),
    #[error("empty print order")]
    EmptyOrder,
}

/// Parses the tasks document: `{ "<key>": { "taskName": .., "solution": [..] } }`.
pub fn parse_tasks(input: &str) -> Result<TaskSet, InputError> {
    let root: Value = serde_json::from_str(input)?;
    let Value::Object(entries) = root else {
        return Err(InputError::NotAnObject {
            what: "tasks document",
        });
    };

    let mut tasks = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        tasks.push(parse_task(key, &value)?);
    }
    Ok(TaskSet { tasks })
}

fn parse_task(key: String, value: &Value) -> Result<Task, InputError> {
    let Value::Object(fields) = value else {
        return Err(InputError::NotAnObject { what: "task" });
    };
    let name = match field(fields, &["taskName", "task_name", "name"]) {
        Some(Value::String(name)) => name.clone(),
        Some(other) => other.to_string(),
        None => {
            return Err(InputError::MissingField {
                key,
                field: "taskName",
            });
        }
    };
    let Some(raw_solution) = field(fields, &["solution"]) else {
        return Err(InputError::MissingField {
            key,
            field: "solution",
        });
    };
    let Value::Array(raw_details) = raw_solution else {
        return Err(InputError::BadDetail {
            key,
            index: 0,
            reason: "solution must be an array".to_string(),
        });
    };

    let mut solution = Vec::with_capacity(raw_details.len());
    for (index, raw) in raw_details.iter().enumerate() {
        let detail = parse_detail(raw).map_err(|reason| InputError::BadDetail {
            key: key.clone(),
            index,
            reason,
        })?;
        solution.push(detail);
    }

    Ok(Task {
        key,
        name,
        solution,
    })
}

fn field<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| fields.get(*name))
}

/// A detail is `[stock, [piece, ..], ..]` or `{ "stock": .., "pieces": [..] }`.
fn parse_detail(raw: &Value) -> Result<Detail, String> {
    let (stock, pieces) = match raw {
        Value::Array(items) => {
            if items.len() < 2 {
                return Err(format!("expected [stock, pieces], found {raw}"));
            }
            (&items[0], &items[1])
        }
        Value::Object(fields) => {
            let stock = field(fields, &["stock", "length"])
                .ok_or_else(|| "missing `stock`".to_string())?;
            let pieces = field(fields, &["pieces", "cuts"])
                .ok_or_else(|| "missing `pieces`".to_string())?;
            (stock, pieces)
        }
        other => return Err(format!("expected an array or object, found {other}")),
    };

    let stock = parse_length(stock)?;
    let Value::Array(raw_pieces) = pieces else {
        return Err(format!("pieces must be an array, found {pieces}"));
    };
    let pieces = raw_pieces
        .iter()
        .map(parse_length)
        .collect::<Result<Vec<_>, _>>()?;

    let used: f64 = pieces.iter().map(Length::value).sum();
    if used > stock.value() + 1e-6 {
        tracing::warn!(
            stock = stock.value(),
            used,
            "pieces are longer than their stock bar"
        );
    }

    Ok(Detail { stock, pieces })
}

fn parse_length(raw: &Value) -> Result<Length, String> {
    let length = Length::from_json(raw).ok_or_else(|| format!("`{raw}` is not a length"))?;
    if !length.value().is_finite() || length.value() <= 0.0 {
        return Err(format!("`{raw}` is not a positive length"));
    }
    Ok(length)
}

/// Parses the marks document: `{ "<task>x<length>": [instance, ..] }`.
///
/// An instance is either a plain string or the array
/// `[prefix, number, p1x, p1y, p1z, p2x, p2y, p2z, grade, profile, size]`.
pub fn parse_marks(input: &str) -> Result<MarkSheet, InputError> {
    let root: Value = serde_json::from_str(input)?;
    let Value::Object(entries) = root else {
        return Err(InputError::NotAnObject {
            what: "marks document",
        });
    };

    let mut sheet = MarkSheet::default();
    for (key, value) in entries {
        let Value::Array(raw_instances) = value else {
            return Err(InputError::BadMark {
                key,
                index: 0,
                reason: "expected an array of marks".to_string(),
            });
        };
        let mut instances = Vec::with_capacity(raw_instances.len());
        for (index, raw) in raw_instances.iter().enumerate() {
            let instance = parse_mark_instance(raw).map_err(|reason| InputError::BadMark {
                key: key.clone(),
                index,
                reason,
            })?;
            instances.push(instance);
        }
        sheet.entries.push((key, instances));
    }
    Ok(sheet)
}

fn parse_mark_instance(raw: &Value) -> Result<MarkInstance, String> {
    match raw {
        Value::String(mark) => Ok(MarkInstance::plain(mark.clone())),
        Value::Array(items) => {
            let prefix = items
                .first()
                .map(value_text)
                .ok_or_else(|| "empty mark record".to_string())?;
            let number = items.get(1).map(value_text).unwrap_or_default();
            let point = |from: usize| -> Option<[f64; 3]> {
                let x = items.get(from)?.as_f64()?;
                let y = items.get(from + 1)?.as_f64()?;
                let z = items.get(from + 2)?.as_f64()?;
                Some([x, y, z])
            };
            // Profile fields are stored as grade, profile, size; keep profile first.
            let profile = [9, 10, 8]
                .iter()
                .filter_map(|idx| items.get(*idx))
                .map(value_text)
                .collect();
            Ok(MarkInstance {
                mark: format!("{prefix}{number}"),
                start: point(2),
                end: point(5),
                profile,
            })
        }
        other => Err(format!("expected a string or array, found {other}")),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Order in which tasks are printed, one task per row of pages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TaskOrder {
    /// Longest total stock first.
    #[default]
    TotalLength,
    /// Numeric keys ascending, other keys after them in text order.
    Key,
    /// Tasks document order.
    Input,
    Explicit(Vec<String>),
}

impl FromStr for TaskOrder {
    type Err = InputError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "total-length" | "length" => Ok(Self::TotalLength),
            "key" => Ok(Self::Key),
            "input" => Ok(Self::Input),
            list => {
                let keys: Vec<String> = list
                    .split(',')
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .map(str::to_string)
                    .collect();
                if keys.is_empty() {
                    return Err(InputError::EmptyOrder);
                }
                Ok(Self::Explicit(keys))
            }
        }
    }
}

pub fn order_tasks<'a>(set: &'a TaskSet, order: &TaskOrder) -> Result<Vec<&'a Task>, InputError> {
    let mut tasks: Vec<&Task> = set.tasks.iter().collect();
    match order {
        TaskOrder::Input => {}
        TaskOrder::TotalLength => {
            // Stable sort keeps document order between equal totals.
            tasks.sort_by(|a, b| {
                b.total_stock()
                    .partial_cmp(&a.total_stock())
                    .unwrap_or(Ordering::Equal)
            });
        }
        TaskOrder::Key => tasks.sort_by(|a, b| compare_keys(&a.key, &b.key)),
        TaskOrder::Explicit(keys) => {
            tasks = keys
                .iter()
                .map(|key| {
                    set.get(key)
                        .ok_or_else(|| InputError::UnknownTask(key.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
        }
    }
    Ok(tasks)
}

fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
