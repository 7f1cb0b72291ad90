//! Candidate profile lookup backed by the profile document store.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use mammoth_storage::ProfileStore;

use crate::tool::{Tool, ToolDefinition, ToolError};

pub const FETCH_CANDIDATE_PROFILE: &str = "fetchCandidateProfile";

/// Fetch a candidate's markdown profile by first name.
pub struct FetchCandidateProfileTool {
    store: Arc<ProfileStore>,
}

impl FetchCandidateProfileTool {
    pub fn new(store: Arc<ProfileStore>) -> Self {
        Self { store }
    }

    fn not_found(first_name: &str) -> String {
        format!("Profile for {} not found.", first_name)
    }
}

#[async_trait]
impl Tool for FetchCandidateProfileTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: FETCH_CANDIDATE_PROFILE.to_string(),
            description: "Fetches the markdown profile for a candidate by first name from the profile store."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "firstName": {
                        "type": "string",
                        "description": "The candidate's first name."
                    }
                },
                "required": ["firstName"]
            }),
        }
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let first_name = args
            .get("firstName")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidInput("missing 'firstName' field".to_string()))?;

        // Misses and backend failures both read as "not found" to the model.
        match self.store.fetch(first_name).await {
            Ok(Some(profile)) => {
                debug!(first_name, bytes = profile.len(), "profile fetched");
                Ok(profile)
            }
            Ok(None) => {
                debug!(first_name, "profile missing");
                Ok(Self::not_found(first_name))
            }
            Err(e) => {
                warn!(first_name, error = %e, "profile lookup failed");
                Ok(Self::not_found(first_name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn tool_with(profiles: &[(&str, &str)]) -> FetchCandidateProfileTool {
        let store = ProfileStore::in_memory();
        for (name, text) in profiles {
            store.put(name, text).await.unwrap();
        }
        FetchCandidateProfileTool::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_fetches_lowercased_key() {
        let tool = tool_with(&[("jason", "Jason is great.")]).await;
        let out = tool
            .execute(serde_json::json!({"firstName": "Jason"}))
            .await
            .unwrap();
        assert_eq!(out, "Jason is great.");
    }

    #[tokio::test]
    async fn test_miss_returns_not_found_message() {
        let tool = tool_with(&[]).await;
        let out = tool
            .execute(serde_json::json!({"firstName": "Geoffrey"}))
            .await
            .unwrap();
        assert_eq!(out, "Profile for Geoffrey not found.");
    }

    #[tokio::test]
    async fn test_invalid_key_reads_as_not_found() {
        let tool = tool_with(&[]).await;
        let out = tool
            .execute(serde_json::json!({"firstName": "../secrets"}))
            .await
            .unwrap();
        assert_eq!(out, "Profile for ../secrets not found.");
    }

    #[tokio::test]
    async fn test_missing_argument_is_invalid_input() {
        let tool = tool_with(&[]).await;
        let err = tool.execute(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[test]
    fn test_definition() {
        let tool = FetchCandidateProfileTool::new(Arc::new(ProfileStore::in_memory()));
        let def = tool.definition();
        assert_eq!(def.name, "fetchCandidateProfile");
        assert_eq!(def.parameters["required"][0], "firstName");
    }
}
