//! Aggregate counts over the case list.
//!
//! Status and priority buckets use the canonical label when the stored text
//! names a known value, the trimmed text otherwise, and `Unset` when the
//! field is missing.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::entity::{Case, CasePriority, CaseStatus};

const UNSET: &str = "Unset";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStats {
    pub total: usize,
    /// Open plus in-progress cases.
    pub active: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
}

impl CaseStats {
    pub fn collect(cases: &[Case]) -> Self {
        let mut stats = CaseStats {
            total: cases.len(),
            ..Default::default()
        };

        for status in CaseStatus::ALL {
            stats.by_status.insert(status.to_string(), 0);
        }
        for priority in CasePriority::ALL {
            stats.by_priority.insert(priority.to_string(), 0);
        }

        for case in cases {
            if case.is_active() {
                stats.active += 1;
            }

            let status = match (case.status_kind(), case.fields.status.as_deref()) {
                (Some(kind), _) => kind.to_string(),
                (None, Some(raw)) => raw.trim().to_string(),
                (None, None) => UNSET.to_string(),
            };
            *stats.by_status.entry(status).or_insert(0) += 1;

            let priority = match (case.priority_kind(), case.fields.priority.as_deref()) {
                (Some(kind), _) => kind.to_string(),
                (None, Some(raw)) => raw.trim().to_string(),
                (None, None) => UNSET.to_string(),
            };
            *stats.by_priority.entry(priority).or_insert(0) += 1;
        }

        stats
    }
}
