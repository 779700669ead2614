mod case_store;

pub use case_store::{parse_case_id, seed_cases, CaseStore};
