// src/entity/case.rs
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::CaseId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CaseStatus {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Closed,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 3] = [CaseStatus::Open, CaseStatus::InProgress, CaseStatus::Closed];

    /// Open and in-progress cases still need attention.
    pub fn is_active(self) -> bool {
        matches!(self, CaseStatus::Open | CaseStatus::InProgress)
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaseStatus::Open => write!(f, "Open"),
            CaseStatus::InProgress => write!(f, "In Progress"),
            CaseStatus::Closed => write!(f, "Closed"),
        }
    }
}

impl std::str::FromStr for CaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "open" => Ok(CaseStatus::Open),
            "in progress" | "inprogress" => Ok(CaseStatus::InProgress),
            "closed" => Ok(CaseStatus::Closed),
            _ => Err(format!("Invalid case status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CasePriority {
    Low,
    Medium,
    High,
}

impl CasePriority {
    pub const ALL: [CasePriority; 3] = [CasePriority::Low, CasePriority::Medium, CasePriority::High];
}

impl std::fmt::Display for CasePriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CasePriority::Low => write!(f, "Low"),
            CasePriority::Medium => write!(f, "Medium"),
            CasePriority::High => write!(f, "High"),
        }
    }
}

impl std::str::FromStr for CasePriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(CasePriority::Low),
            "medium" => Ok(CasePriority::Medium),
            "high" => Ok(CasePriority::High),
            _ => Err(format!("Invalid case priority: {}", s)),
        }
    }
}

/// The free-text fields of a case.
///
/// Every field is optional and unvalidated: whatever the client sends is
/// stored, and absent fields are left out of the JSON representation.
/// Non-string values are kept as their JSON text (`2` becomes `"2"`), and
/// `null` counts as absent. Unknown keys (including `id`) are ignored on input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseFields {
    #[serde(default, deserialize_with = "any_as_text", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "any_as_text", skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "any_as_text", skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, deserialize_with = "any_as_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "any_as_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "any_as_text", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "any_as_text", skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(default, deserialize_with = "any_as_text", skip_serializing_if = "Option::is_none")]
    pub case_number: Option<String>,
}

fn any_as_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    })
}

/// Partial update payload. A `None` field keeps the stored value.
pub type CasePatch = CaseFields;

impl CaseFields {
    /// Shallow merge: every field present in `patch` overwrites `self`.
    pub fn merge(&mut self, patch: CasePatch) {
        fn apply(slot: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *slot = value;
            }
        }

        apply(&mut self.status, patch.status);
        apply(&mut self.priority, patch.priority);
        apply(&mut self.owner, patch.owner);
        apply(&mut self.description, patch.description);
        apply(&mut self.title, patch.title);
        apply(&mut self.date, patch.date);
        apply(&mut self.customer, patch.customer);
        apply(&mut self.case_number, patch.case_number);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    #[serde(flatten)]
    pub fields: CaseFields,
}

impl Case {
    pub fn new(id: CaseId, fields: CaseFields) -> Self {
        Self { id, fields }
    }

    /// Typed status, if the stored text names a known one.
    pub fn status_kind(&self) -> Option<CaseStatus> {
        self.fields.status.as_deref()?.parse().ok()
    }

    pub fn priority_kind(&self) -> Option<CasePriority> {
        self.fields.priority.as_deref()?.parse().ok()
    }

    pub fn is_active(&self) -> bool {
        self.status_kind().is_some_and(CaseStatus::is_active)
    }
}
