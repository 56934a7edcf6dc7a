//! Bookkeeping of previously assigned part marks.
//!
//! Marks are stored per composite key `"{task}x{length}"` and handed out from
//! the back of each list, so a key's marks are consumed in reverse input
//! order until the key is exhausted.

use crate::config::MarkConfig;
use crate::ir::{Length, MarkInstance, MarkSheet};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkError {
    #[error("no marks recorded for `{key}`")]
    Missing { key: String },
    #[error("all marks for `{key}` are already used")]
    Exhausted { key: String },
}

#[derive(Debug, Clone, Default)]
pub struct MarkRegistry {
    stacks: BTreeMap<String, Vec<MarkInstance>>,
}

impl MarkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sheet(sheet: &MarkSheet) -> Self {
        let mut registry = Self::new();
        for (key, instances) in &sheet.entries {
            registry.extend(key, instances.iter().cloned());
        }
        registry
    }

    /// Appends marks to a key, after the ones already recorded.
    pub fn extend<M: Into<MarkInstance>>(&mut self, key: &str, marks: impl IntoIterator<Item = M>) {
        self.stacks
            .entry(key.to_string())
            .or_default()
            .extend(marks.into_iter().map(Into::into));
    }

    pub fn key(task: &str, length: &Length) -> String {
        format!("{task}x{}", length.text())
    }

    /// Removes the last remaining mark recorded for `task` and `length`.
    pub fn take(&mut self, task: &str, length: &Length) -> Result<MarkInstance, MarkError> {
        let key = Self::key(task, length);
        let Some(stack) = self.stacks.get_mut(&key) else {
            return Err(MarkError::Missing { key });
        };
        stack.pop().ok_or(MarkError::Exhausted { key })
    }

    /// Reserves one mark per piece of a detail, in solution order.
    ///
    /// Unless `config.strict` is set, a missing or exhausted key reserves an
    /// empty slot which resolves to the placeholder when drawn.
    pub fn reserve_detail(
        &mut self,
        task: &str,
        pieces: &[Length],
        config: &MarkConfig,
    ) -> Result<DetailMarks, MarkError> {
        let mut detail = DetailMarks {
            stacks: HashMap::new(),
            placeholder: config.placeholder.clone(),
            placeholders_used: 0,
        };
        for piece in pieces {
            let slot = match self.take(task, piece) {
                Ok(mark) => Some(mark),
                Err(err) if config.strict => return Err(err),
                Err(err) => {
                    tracing::warn!(task, length = piece.text(), "{err}");
                    None
                }
            };
            detail
                .stacks
                .entry(piece.text().to_string())
                .or_default()
                .push(slot);
        }
        Ok(detail)
    }

    pub fn remaining(&self) -> usize {
        self.stacks.values().map(Vec::len).sum()
    }

    /// Keys that still hold marks, with the count left.
    pub fn unused_keys(&self) -> Vec<(&str, usize)> {
        self.stacks
            .iter()
            .filter(|(_, marks)| !marks.is_empty())
            .map(|(key, marks)| (key.as_str(), marks.len()))
            .collect()
    }
}

/// Marks reserved for one detail, stacked per piece length.
#[derive(Debug, Clone)]
pub struct DetailMarks {
    stacks: HashMap<String, Vec<Option<MarkInstance>>>,
    placeholder: String,
    placeholders_used: usize,
}

impl DetailMarks {
    /// Pops the most recently reserved mark for a piece of `length`.
    pub fn next_for(&mut self, length: &Length) -> MarkInstance {
        let slot = self
            .stacks
            .get_mut(length.text())
            .and_then(|stack| stack.pop())
            .flatten();
        match slot {
            Some(mark) => mark,
            None => {
                self.placeholders_used += 1;
                MarkInstance::plain(self.placeholder.clone())
            }
        }
    }

    pub fn placeholders_used(&self) -> usize {
        self.placeholders_used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn len(value: f64) -> Length {
        Length::new(value)
    }

    fn registry() -> MarkRegistry {
        let mut registry = MarkRegistry::new();
        registry.extend("HEA", ["A1", "A2", "A3"].map(String::from));
        registry.extend("HEAx3000", ["B1", "B2", "B3"].map(String::from));
        registry.extend("HEAx5000", ["C1"].map(String::from));
        registry
    }

    #[test]
    fn take_consumes_in_reverse_until_exhausted() {
        let mut registry = registry();
        assert_eq!(registry.take("HEA", &len(3000.0)).unwrap().mark, "B3");
        assert_eq!(registry.take("HEA", &len(3000.0)).unwrap().mark, "B2");
        assert_eq!(registry.take("HEA", &len(3000.0)).unwrap().mark, "B1");
        assert_eq!(
            registry.take("HEA", &len(3000.0)),
            Err(MarkError::Exhausted {
                key: "HEAx3000".to_string()
            })
        );
        assert_eq!(
            registry.take("IPE", &len(3000.0)),
            Err(MarkError::Missing {
                key: "IPEx3000".to_string()
            })
        );
    }

    #[test]
    fn detail_marks_reverse_equal_lengths() {
        let mut registry = registry();
        let pieces = [len(3000.0), len(5000.0), len(3000.0)];
        let mut marks = registry
            .reserve_detail("HEA", &pieces, &MarkConfig::default())
            .unwrap();
        // Reserved B3 then B2; drawing pops the latest reservation first.
        assert_eq!(marks.next_for(&len(5000.0)).mark, "C1");
        assert_eq!(marks.next_for(&len(3000.0)).mark, "B2");
        assert_eq!(marks.next_for(&len(3000.0)).mark, "B3");
        assert_eq!(marks.placeholders_used(), 0);
        assert_eq!(registry.remaining(), 4);
        assert_eq!(registry.unused_keys(), vec![("HEA", 3), ("HEAx3000", 1)]);
    }

    #[test]
    fn missing_marks_fall_back_to_placeholder() {
        let mut registry = registry();
        let pieces = [len(5000.0), len(5000.0), len(700.0)];
        let mut marks = registry
            .reserve_detail("HEA", &pieces, &MarkConfig::default())
            .unwrap();
        assert_eq!(marks.next_for(&len(5000.0)).mark, "?");
        assert_eq!(marks.next_for(&len(5000.0)).mark, "C1");
        assert_eq!(marks.next_for(&len(700.0)).mark, "?");
        assert_eq!(marks.placeholders_used(), 2);
    }

    #[test]
    fn strict_mode_reports_missing_marks() {
        let mut registry = registry();
        let config = MarkConfig {
            strict: true,
            ..MarkConfig::default()
        };
        let err = registry
            .reserve_detail("HEA", &[len(700.0)], &config)
            .unwrap_err();
        assert_eq!(
            err,
            MarkError::Missing {
                key: "HEAx700".to_string()
            }
        );
    }
}
