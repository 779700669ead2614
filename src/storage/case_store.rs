use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::entity::{Case, CaseFields, CaseId, CasePatch};
use crate::error::{CaseError, Result};

/// In-memory case store.
///
/// Records live in an id-ordered map; since ids only ever grow, id order is
/// also insertion order. `next_id` is monotonic, so an id is never handed
/// out twice even after the record holding it is deleted. It becomes `None`
/// once `CaseId::MAX` has been used.
#[derive(Debug, Clone)]
pub struct CaseStore {
    cases: BTreeMap<CaseId, Case>,
    next_id: Option<CaseId>,
}

impl Default for CaseStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CaseStore {
    /// Create an empty store. The first case gets id 1.
    pub fn new() -> Self {
        Self {
            cases: BTreeMap::new(),
            next_id: Some(1),
        }
    }

    /// Create a store holding the given records. Later duplicates of an id replace earlier ones.
    pub fn with_cases(cases: impl IntoIterator<Item = Case>) -> Self {
        let mut store = Self::new();
        for case in cases {
            if store.next_id.is_some_and(|next| case.id >= next) {
                store.next_id = case.id.checked_add(1);
            }
            store.cases.insert(case.id, case);
        }
        store
    }

    /// Create a store pre-loaded with the three demo cases.
    pub fn seeded() -> Self {
        Self::with_cases(seed_cases())
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Snapshot of every case in insertion order.
    pub fn list(&self) -> Vec<Case> {
        self.cases.values().cloned().collect()
    }

    /// Store a new case under the next free id and return it.
    ///
    /// Fails with `IdsExhausted` once `CaseId::MAX` has been assigned.
    pub fn create(&mut self, fields: CaseFields) -> Result<Case> {
        let Some(id) = self.next_id else {
            warn!("case id space exhausted");
            return Err(CaseError::IdsExhausted);
        };
        self.next_id = id.checked_add(1);

        let case = Case::new(id, fields);
        self.cases.insert(id, case.clone());

        info!(id, "case created");
        Ok(case)
    }

    /// Look up a case. Malformed and unknown ids both yield `None`.
    pub fn get(&self, raw_id: &str) -> Option<Case> {
        self.find(raw_id).ok()
    }

    /// Look up a case, telling a malformed id apart from an unknown one.
    pub fn find(&self, raw_id: &str) -> Result<Case> {
        let id = parse_case_id(raw_id)?;
        let found = self.cases.get(&id).cloned();
        debug!(id, found = found.is_some(), "case lookup");
        found.ok_or_else(|| CaseError::NotFound(raw_id.to_string()))
    }

    /// Shallow-merge `patch` onto an existing case. The id is never changed.
    pub fn update(&mut self, raw_id: &str, patch: CasePatch) -> Result<Case> {
        let id = parse_case_id(raw_id)?;
        let case = self
            .cases
            .get_mut(&id)
            .ok_or_else(|| CaseError::NotFound(raw_id.to_string()))?;

        case.fields.merge(patch);

        info!(id, "case updated");
        Ok(case.clone())
    }

    /// Remove a case and return it.
    pub fn remove(&mut self, raw_id: &str) -> Result<Case> {
        let id = parse_case_id(raw_id)?;
        let case = self
            .cases
            .remove(&id)
            .ok_or_else(|| CaseError::NotFound(raw_id.to_string()))?;

        info!(id, remaining = self.cases.len(), "case deleted");
        Ok(case)
    }

    /// Remove a case, reporting only whether anything was removed.
    pub fn delete(&mut self, raw_id: &str) -> bool {
        self.remove(raw_id).is_ok()
    }
}

/// Parse a case id the lenient way browsers send them.
///
/// Leading whitespace is skipped, one optional sign is accepted, and the
/// leading run of ASCII digits is the id, so `"12abc"` is 12. Text without
/// leading digits is `InvalidId`. Zero, negative and out-of-range numbers
/// are well formed but can never match a record, so they are `NotFound`.
pub fn parse_case_id(raw: &str) -> Result<CaseId> {
    let trimmed = raw.trim_start();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_len = unsigned
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits_len == 0 {
        return Err(CaseError::InvalidId(raw.to_string()));
    }

    match unsigned[..digits_len].parse::<CaseId>() {
        Ok(id) if id > 0 && !negative => Ok(id),
        _ => Err(CaseError::NotFound(raw.to_string())),
    }
}

/// The demo records every fresh store starts with.
pub fn seed_cases() -> Vec<Case> {
    #[allow(clippy::too_many_arguments)]
    fn seed(
        id: CaseId,
        status: &str,
        priority: &str,
        owner: &str,
        description: &str,
        title: &str,
        date: &str,
        customer: &str,
        case_number: &str,
    ) -> Case {
        Case::new(
            id,
            CaseFields {
                status: Some(status.to_string()),
                priority: Some(priority.to_string()),
                owner: Some(owner.to_string()),
                description: Some(description.to_string()),
                title: Some(title.to_string()),
                date: Some(date.to_string()),
                customer: Some(customer.to_string()),
                case_number: Some(case_number.to_string()),
            },
        )
    }

    vec![
        seed(
            1,
            "Open",
            "High",
            "Henrik",
            "Initial setup of project A.",
            "Project A Setup",
            "2025-10-25",
            "Tech Innovations",
            "TI-2025-1001",
        ),
        seed(
            2,
            "In Progress",
            "Medium",
            "Thor",
            "Review Q4 customer feedback.",
            "Q4 Feedback Review",
            "2025-10-26",
            "Global Logistics",
            "GL-2025-1002",
        ),
        seed(
            3,
            "Closed",
            "Low",
            "Tobias",
            "Final document submission for client B.",
            "Client B Docs",
            "2025-10-20",
            "Local Business",
            "LB-2025-1003",
        ),
    ]
}
