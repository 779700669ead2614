mod case;

pub use case::{Case, CaseFields, CasePatch, CasePriority, CaseStatus};

/// Store-assigned identifier of a case. Ids start at 1 and are never reused.
pub type CaseId = u64;
