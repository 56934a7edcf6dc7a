use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// A cut or stock length in millimetres.
///
/// The textual form of the JSON number is kept next to the value: mark keys
/// are built from it, so `7800` and `7800.0` stay distinct.
#[derive(Debug, Clone, PartialEq)]
pub struct Length {
    value: f64,
    text: String,
}

impl Length {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            text: format_length(value),
        }
    }

    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => {
                let parsed = number.as_f64()?;
                Some(Self {
                    value: parsed,
                    text: number.to_string(),
                })
            }
            Value::String(raw) => {
                let trimmed = raw.trim();
                let parsed = trimmed.parse::<f64>().ok()?;
                Some(Self {
                    value: parsed,
                    text: trimmed.to_string(),
                })
            }
            _ => None,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn as_f32(&self) -> f32 {
        self.value as f32
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Length {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value)
    }
}

/// Formats a computed length: whole numbers without a fraction, others with
/// at most three decimals.
pub fn format_length(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let fixed = format!("{value:.3}");
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// One stock bar of a solution and the pieces cut from it.
#[derive(Debug, Clone, Serialize)]
pub struct Detail {
    pub stock: Length,
    pub pieces: Vec<Length>,
}

impl Detail {
    pub fn used(&self) -> f64 {
        self.pieces.iter().map(Length::value).sum()
    }

    pub fn waste(&self) -> f64 {
        (self.stock.value() - self.used()).max(0.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub key: String,
    pub name: String,
    pub solution: Vec<Detail>,
}

impl Task {
    pub fn total_stock(&self) -> f64 {
        self.solution.iter().map(|detail| detail.stock.value()).sum()
    }

    pub fn piece_count(&self) -> usize {
        self.solution.iter().map(|detail| detail.pieces.len()).sum()
    }
}

/// Tasks in the order they appear in the tasks document.
#[derive(Debug, Clone, Default)]
pub struct TaskSet {
    pub tasks: Vec<Task>,
}

impl TaskSet {
    pub fn get(&self, key: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkInstance {
    pub mark: String,
    pub start: Option<[f64; 3]>,
    pub end: Option<[f64; 3]>,
    /// Profile description fields, most significant first.
    pub profile: Vec<String>,
}

impl MarkInstance {
    pub fn plain(mark: impl Into<String>) -> Self {
        Self {
            mark: mark.into(),
            start: None,
            end: None,
            profile: Vec::new(),
        }
    }
}

impl From<String> for MarkInstance {
    fn from(mark: String) -> Self {
        Self::plain(mark)
    }
}

impl From<&str> for MarkInstance {
    fn from(mark: &str) -> Self {
        Self::plain(mark)
    }
}

/// The marks document: composite key to marks, both in document order.
#[derive(Debug, Clone, Default)]
pub struct MarkSheet {
    pub entries: Vec<(String, Vec<MarkInstance>)>,
}

impl MarkSheet {
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, marks)| marks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn length_keeps_json_text() {
        let int = Length::from_json(&json!(7800)).unwrap();
        let float = Length::from_json(&json!(7800.0)).unwrap();
        assert_eq!(int.text(), "7800");
        assert_eq!(float.text(), "7800.0");
        assert_eq!(int.value(), float.value());
        assert!(Length::from_json(&json!(null)).is_none());
    }

    #[test]
    fn format_length_trims_fraction() {
        assert_eq!(format_length(1200.0), "1200");
        assert_eq!(format_length(1200.5), "1200.5");
        assert_eq!(format_length(0.125), "0.125");
    }

    #[test]
    fn detail_waste_never_negative() {
        let detail = Detail {
            stock: Length::new(6000.0),
            pieces: vec![Length::new(2500.0), Length::new(2500.5)],
        };
        assert_eq!(detail.used(), 5000.5);
        assert_eq!(detail.waste(), 999.5);
        let over = Detail {
            stock: Length::new(1000.0),
            pieces: vec![Length::new(1200.0)],
        };
        assert_eq!(over.waste(), 0.0);
    }
}
