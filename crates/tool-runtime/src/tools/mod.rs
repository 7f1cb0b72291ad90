//! Tools the relay exposes to the model.

pub mod profile_fetch;

pub use profile_fetch::{FetchCandidateProfileTool, FETCH_CANDIDATE_PROFILE};
