//! Wizard state: per-chapter answers plus a monotonically increasing version.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use super::patch::{Patch, PatchError, PatchOperation};
use crate::domain::foundation::Chapter;

/// Kind of building project, read from `basis.projectType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    Nieuwbouw,
    Verbouw,
    Renovatie,
    Aanbouw,
    Onbekend,
}

impl ProjectType {
    /// Parses free-form project type text; anything unrecognised is `Onbekend`.
    pub fn parse_lenient(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        if lower.contains("nieuwbouw") || lower.contains("new_build") || lower.contains("newbuild") {
            ProjectType::Nieuwbouw
        } else if lower.contains("renovatie") || lower.contains("renovation") {
            ProjectType::Renovatie
        } else if lower.contains("aanbouw") || lower.contains("uitbouw") || lower.contains("extension") {
            ProjectType::Aanbouw
        } else if lower.contains("verbouw") || lower.contains("remodel") {
            ProjectType::Verbouw
        } else {
            ProjectType::Onbekend
        }
    }

    /// Construction cost per square metre used for rough estimates (euro).
    pub fn cost_per_m2(&self) -> f64 {
        match self {
            ProjectType::Nieuwbouw => 2_200.0,
            ProjectType::Aanbouw => 2_500.0,
            ProjectType::Renovatie => 1_200.0,
            ProjectType::Verbouw => 1_000.0,
            ProjectType::Onbekend => 1_500.0,
        }
    }
}

/// Accumulated wizard answers keyed by chapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    #[serde(default)]
    pub chapters: BTreeMap<Chapter, Value>,
    /// Incremented on every accepted patch.
    #[serde(default)]
    pub state_version: u64,
}

impl WizardState {
    /// Creates an empty state at version 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a state from loosely-typed JSON.
    ///
    /// Accepts either `{ "chapters": {..}, "stateVersion": n }` or a flat
    /// chapter map. Unknown chapter keys and non-object input are ignored.
    pub fn from_json(value: &Value) -> Self {
        let Some(root) = value.as_object() else {
            tracing::debug!("Ignoring non-object wizard state");
            return Self::default();
        };

        let chapter_map = root
            .get("chapters")
            .and_then(Value::as_object)
            .unwrap_or(root);
        let state_version = root
            .get("stateVersion")
            .and_then(Value::as_u64)
            .unwrap_or(0);

        let mut chapters = BTreeMap::new();
        for (key, data) in chapter_map {
            match key.parse::<Chapter>() {
                Ok(chapter) => {
                    chapters.insert(chapter, data.clone());
                }
                Err(_) if key == "stateVersion" => {}
                Err(e) => tracing::debug!("Skipping wizard state entry: {}", e),
            }
        }

        Self {
            chapters,
            state_version,
        }
    }

    /// Builder-style chapter assignment.
    pub fn with_chapter(mut self, chapter: Chapter, data: Value) -> Self {
        self.chapters.insert(chapter, data);
        self
    }

    /// Returns the raw data of a chapter.
    pub fn chapter(&self, chapter: Chapter) -> Option<&Value> {
        self.chapters.get(&chapter)
    }

    /// Returns a chapter's data or an empty object.
    pub fn chapter_slice(&self, chapter: Chapter) -> Value {
        self.chapter(chapter)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// True when the chapter holds at least one non-empty answer.
    pub fn chapter_has_answers(&self, chapter: Chapter) -> bool {
        self.chapter(chapter).is_some_and(is_present)
    }

    /// Looks up a field by full dotted path, starting with the chapter key
    /// (e.g. `budget.budgetTotaal`). Numeric segments index arrays.
    pub fn field(&self, full_path: &str) -> Option<&Value> {
        let (chapter_key, rest) = match full_path.split_once('.') {
            Some((chapter, rest)) => (chapter, rest),
            None => (full_path, ""),
        };
        let chapter = chapter_key.parse::<Chapter>().ok()?;
        resolve(self.chapter(chapter)?, rest)
    }

    /// True when the field exists and holds a non-empty value.
    pub fn has_value(&self, full_path: &str) -> bool {
        self.field(full_path).is_some_and(is_present)
    }

    /// Reads a field as a number, accepting numeric strings such as "250.000".
    pub fn number(&self, full_path: &str) -> Option<f64> {
        match self.field(full_path)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_lenient_number(s),
            _ => None,
        }
    }

    /// Reads a field as trimmed, non-empty text.
    pub fn text(&self, full_path: &str) -> Option<&str> {
        self.field(full_path)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Project type from `basis.projectType`, `Onbekend` when absent.
    pub fn project_type(&self) -> ProjectType {
        self.text("basis.projectType")
            .map(ProjectType::parse_lenient)
            .unwrap_or(ProjectType::Onbekend)
    }

    /// Sum of `ruimtes.rooms[*].area` (square metres), if any room has one.
    pub fn total_room_area(&self) -> Option<f64> {
        let rooms = self.field("ruimtes.rooms")?.as_array()?;
        let areas: Vec<f64> = rooms
            .iter()
            .filter_map(|room| match room.get("area")? {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => parse_lenient_number(s),
                _ => None,
            })
            .collect();
        if areas.is_empty() {
            None
        } else {
            Some(areas.iter().sum())
        }
    }

    /// Serializable copy used for turn snapshots.
    pub fn snapshot(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Applies a validated patch and bumps the state version.
    ///
    /// The patch is applied to a copy of the chapter first, so a rejected patch
    /// leaves the state untouched.
    pub fn apply_patch(&mut self, patch: &Patch) -> Result<u64, PatchError> {
        let path = patch.delta.path.as_str();
        let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        let (leaf, parents) = segments.split_last().ok_or(PatchError::EmptyPath)?;

        let mut root = match self.chapter(patch.chapter) {
            Some(Value::Null) | None => Value::Object(Map::new()),
            Some(existing) => existing.clone(),
        };

        let mut cursor = &mut root;
        for segment in parents {
            cursor = child_mut(cursor, segment, path)?;
        }
        apply_leaf(
            cursor,
            leaf,
            patch.delta.operation,
            patch.delta.value.clone(),
            path,
        )?;

        self.chapters.insert(patch.chapter, root);
        self.state_version += 1;
        Ok(self.state_version)
    }
}

/// Null, blank strings and empty collections count as "not answered".
pub(crate) fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => map.values().any(is_present),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|s| !s.is_empty())
        .try_fold(root, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

fn child_mut<'a>(
    current: &'a mut Value,
    segment: &str,
    path: &str,
) -> Result<&'a mut Value, PatchError> {
    match current {
        Value::Object(map) => {
            let child = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if child.is_null() {
                *child = Value::Object(Map::new());
            }
            Ok(child)
        }
        Value::Array(items) => {
            let len = items.len();
            segment
                .parse::<usize>()
                .ok()
                .filter(|i| *i < len)
                .and_then(move |i| items.get_mut(i))
                .ok_or_else(|| PatchError::InvalidIndex {
                    path: path.to_string(),
                    segment: segment.to_string(),
                })
        }
        _ => Err(PatchError::NotAContainer {
            path: path.to_string(),
        }),
    }
}

fn apply_leaf(
    container: &mut Value,
    key: &str,
    operation: PatchOperation,
    value: Value,
    path: &str,
) -> Result<(), PatchError> {
    match container {
        Value::Object(map) => {
            let current = map.remove(key);
            let next = combine(current, operation, value, path)?;
            map.insert(key.to_string(), next);
            Ok(())
        }
        Value::Array(items) => {
            let index = key
                .parse::<usize>()
                .ok()
                .filter(|i| *i < items.len())
                .ok_or_else(|| PatchError::InvalidIndex {
                    path: path.to_string(),
                    segment: key.to_string(),
                })?;
            let current = std::mem::take(&mut items[index]);
            items[index] = combine(Some(current), operation, value, path)?;
            Ok(())
        }
        _ => Err(PatchError::NotAContainer {
            path: path.to_string(),
        }),
    }
}

fn combine(
    current: Option<Value>,
    operation: PatchOperation,
    value: Value,
    path: &str,
) -> Result<Value, PatchError> {
    let incompatible = || PatchError::IncompatibleOperation {
        path: path.to_string(),
        operation,
    };

    match (operation, current) {
        (PatchOperation::Set, _) => Ok(value),
        (PatchOperation::Add, None | Some(Value::Null)) => Ok(if value.is_number() {
            value
        } else {
            Value::Array(vec![value])
        }),
        (PatchOperation::Add, Some(Value::Number(existing))) => {
            let int_sum = existing
                .as_i64()
                .zip(value.as_i64())
                .and_then(|(a, b)| a.checked_add(b));
            match int_sum {
                Some(sum) => Ok(json!(sum)),
                None => {
                    let a = existing.as_f64().ok_or_else(incompatible)?;
                    let b = value.as_f64().ok_or_else(incompatible)?;
                    Ok(json!(a + b))
                }
            }
        }
        (PatchOperation::Add, Some(Value::Array(mut items))) => {
            if !items.contains(&value) {
                items.push(value);
            }
            Ok(Value::Array(items))
        }
        (PatchOperation::Append, None | Some(Value::Null)) => Ok(Value::Array(vec![value])),
        (PatchOperation::Append, Some(Value::Array(mut items))) => {
            items.push(value);
            Ok(Value::Array(items))
        }
        (PatchOperation::Append, Some(Value::String(existing))) => match value {
            Value::String(extra) if existing.is_empty() => Ok(Value::String(extra)),
            Value::String(extra) => Ok(Value::String(format!("{existing}\n{extra}"))),
            _ => Err(incompatible()),
        },
        (_, Some(_)) => Err(incompatible()),
    }
}

/// Parses "250000", "250.000", "€ 250.000" or "12,5".
fn parse_lenient_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '€' && *c != '_')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else if is_thousands_grouped(&cleaned) {
        cleaned.replace('.', "")
    } else {
        cleaned
    };
    normalized.parse::<f64>().ok()
}

fn is_thousands_grouped(s: &str) -> bool {
    let mut groups = s.split('.');
    let Some(head) = groups.next() else {
        return false;
    };
    let rest: Vec<&str> = groups.collect();
    !rest.is_empty()
        && (1..=3).contains(&head.len())
        && head.chars().all(|c| c.is_ascii_digit())
        && rest
            .iter()
            .all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}
