//! Search module for case filtering, query parsing and sorting.

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::entity::{Case, CasePriority, CaseStatus};

/// Parsed case filter.
///
/// Filters can be given as explicit fields or inside a query string using
/// prefixes:
/// - `status:open` - Filter by status (case-insensitive)
/// - `priority:high` - Filter by priority (case-insensitive)
/// - `owner:Thor` - Filter by owner
/// - `customer:Acme` - Filter by customer (no spaces; use the explicit field otherwise)
/// - `case:TI-2025` - Case number contains this text
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CaseFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub owner: Option<String>,
    pub customer: Option<String>,
    /// Substring the case number must contain.
    pub case_number: Option<String>,
    /// Free words; each must appear in the title, description or case number.
    pub terms: Vec<String>,
}

impl CaseFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if filter has any constraints.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.owner.is_none()
            && self.customer.is_none()
            && self.case_number.is_none()
            && self.terms.is_empty()
    }

    /// Fill every unset field from `other`. Fields already set here win.
    pub fn or(mut self, other: CaseFilter) -> Self {
        self.status = self.status.or(other.status);
        self.priority = self.priority.or(other.priority);
        self.owner = self.owner.or(other.owner);
        self.customer = self.customer.or(other.customer);
        self.case_number = self.case_number.or(other.case_number);
        if self.terms.is_empty() {
            self.terms = other.terms;
        }
        self
    }

    pub fn matches(&self, case: &Case) -> bool {
        let fields = &case.fields;

        if let Some(status) = &self.status {
            if !matches_label(fields.status.as_deref(), status, parse_status) {
                return false;
            }
        }
        if let Some(priority) = &self.priority {
            if !matches_label(fields.priority.as_deref(), priority, parse_priority) {
                return false;
            }
        }
        if let Some(owner) = &self.owner {
            if fields.owner.as_deref().map(str::trim) != Some(owner.trim()) {
                return false;
            }
        }
        if let Some(customer) = &self.customer {
            if fields.customer.as_deref().map(str::trim) != Some(customer.trim()) {
                return false;
            }
        }
        if let Some(needle) = &self.case_number {
            if !fields.case_number.as_deref().unwrap_or("").contains(needle.as_str()) {
                return false;
            }
        }

        self.terms.iter().all(|term| {
            let term = term.to_lowercase();
            [&fields.title, &fields.description, &fields.case_number]
                .into_iter()
                .flatten()
                .any(|text| text.to_lowercase().contains(&term))
        })
    }
}

fn parse_status(s: &str) -> Option<CaseStatus> {
    s.parse().ok()
}

fn parse_priority(s: &str) -> Option<CasePriority> {
    s.parse().ok()
}

/// Compare a stored label against a wanted one. Known labels compare by
/// meaning (`in_progress` == `In Progress`); anything else compares
/// case-insensitively as text.
fn matches_label<T: PartialEq>(stored: Option<&str>, wanted: &str, parse: fn(&str) -> Option<T>) -> bool {
    let Some(stored) = stored else {
        return false;
    };
    match (parse(stored), parse(wanted)) {
        (Some(a), Some(b)) => a == b,
        _ => stored.trim().eq_ignore_ascii_case(wanted.trim()),
    }
}

/// Parse a raw query string into a filter.
///
/// # Examples
///
/// ```ignore
/// let filter = parse_query("status:open owner:Thor feedback");
/// assert_eq!(filter.status, Some("open".to_string()));
/// assert_eq!(filter.terms, vec!["feedback".to_string()]);
/// ```
pub fn parse_query(raw: &str) -> CaseFilter {
    let mut filter = CaseFilter::default();

    for token in raw.split_whitespace() {
        if let Some(value) = token.strip_prefix("status:") {
            filter.status = Some(value.replace('_', " "));
        } else if let Some(value) = token.strip_prefix("priority:") {
            filter.priority = Some(value.to_string());
        } else if let Some(value) = token.strip_prefix("owner:") {
            filter.owner = Some(value.to_string());
        } else if let Some(value) = token.strip_prefix("customer:") {
            filter.customer = Some(value.to_string());
        } else if let Some(value) = token.strip_prefix("case:") {
            filter.case_number = Some(value.to_string());
        } else {
            filter.terms.push(token.to_string());
        }
    }

    filter
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Id,
    Date,
    Priority,
    Status,
    Title,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "id" => Ok(SortKey::Id),
            "date" => Ok(SortKey::Date),
            "priority" => Ok(SortKey::Priority),
            "status" => Ok(SortKey::Status),
            "title" => Ok(SortKey::Title),
            _ => Err(format!("Invalid sort key: {}", s)),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("Invalid sort order: {}", s)),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CaseSort {
    pub key: SortKey,
    pub order: SortOrder,
}

impl CaseSort {
    pub fn new(key: SortKey, order: SortOrder) -> Self {
        Self { key, order }
    }

    /// Stable sort. Records whose sort field is missing or unparseable
    /// always go last, whichever the order.
    pub fn apply(&self, cases: &mut [Case]) {
        let order = self.order;
        match self.key {
            SortKey::Id => cases.sort_by(|a, b| directed(a.id.cmp(&b.id), order)),
            SortKey::Date => {
                cases.sort_by(|a, b| {
                    missing_last(parse_date(&a.fields.date), parse_date(&b.fields.date), order)
                })
            }
            SortKey::Priority => {
                cases.sort_by(|a, b| missing_last(a.priority_kind(), b.priority_kind(), order))
            }
            SortKey::Status => {
                cases.sort_by(|a, b| missing_last(a.status_kind(), b.status_kind(), order))
            }
            SortKey::Title => cases.sort_by(|a, b| {
                missing_last(
                    a.fields.title.as_deref().map(str::to_lowercase),
                    b.fields.title.as_deref().map(str::to_lowercase),
                    order,
                )
            }),
        }
    }
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

fn missing_last<T: Ord>(a: Option<T>, b: Option<T>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => directed(a.cmp(&b), order),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Parse a case date. Supports ISO 8601 dates (YYYY-MM-DD) and full datetimes.
fn parse_date(s: &Option<String>) -> Option<NaiveDate> {
    let s = s.as_deref()?.trim();

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Filter then sort a snapshot of cases.
pub fn search(cases: Vec<Case>, filter: &CaseFilter, sort: CaseSort) -> Vec<Case> {
    let mut found: Vec<Case> = if filter.is_empty() {
        cases
    } else {
        cases.into_iter().filter(|c| filter.matches(c)).collect()
    };
    sort.apply(&mut found);
    found
}
