use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::gateway::Gateway;
use crate::users::{User, UserRef};

pub const PUSH: &str = "push";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchRestriction {
    pub id: i64,
    pub kind: String,
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub branch_type: Option<String>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub groups: Vec<Value>,
    #[serde(default)]
    pub value: Option<i64>,
}

impl BranchRestriction {
    /// One-line rendering used both for listing and for picking a restriction.
    pub fn summary(&self) -> String {
        let names: Vec<&str> = self.users.iter().map(|u| u.display_name.as_str()).collect();
        format!(
            "{}: {} -> Users: [{}]",
            self.pattern,
            self.kind,
            names.join(", ")
        )
    }

    pub fn matches(&self, pattern: &str, kind: &str) -> bool {
        self.pattern == pattern && self.kind == kind
    }

    /// Payload that keeps this restriction's kind and pattern but replaces
    /// the user list wholesale.
    pub fn with_users(&self, users: Vec<UserRef>) -> RestrictionPayload {
        RestrictionPayload {
            kind: self.kind.clone(),
            pattern: self.pattern.clone(),
            users,
            groups: None,
            value: None,
        }
    }
}

/// Body accepted by the create and update endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestrictionPayload {
    pub kind: String,
    pub pattern: String,
    pub users: Vec<UserRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
}

impl RestrictionPayload {
    /// A `push` restriction on `pattern`; only `users` may push directly.
    pub fn push(pattern: impl Into<String>, users: Vec<UserRef>) -> Self {
        Self {
            kind: PUSH.to_string(),
            pattern: pattern.into(),
            users,
            groups: None,
            value: None,
        }
    }
}

#[derive(Clone)]
pub struct BranchRestrictionApi {
    gateway: Gateway,
}

impl BranchRestrictionApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list_branch_restrictions(
        &self,
        workspace: &str,
        repo_slug: &str,
    ) -> Vec<BranchRestriction> {
        let path = format!("/2.0/repositories/{workspace}/{repo_slug}/branch-restrictions");
        self.gateway.list(&path).await
    }

    pub async fn get_branch_restriction(
        &self,
        workspace: &str,
        repo_slug: &str,
        id: i64,
    ) -> Option<BranchRestriction> {
        let path = format!("/2.0/repositories/{workspace}/{repo_slug}/branch-restrictions/{id}");
        self.gateway.get(&path).await
    }

    pub async fn create_branch_restriction(
        &self,
        workspace: &str,
        repo_slug: &str,
        payload: &RestrictionPayload,
    ) -> Result<Value> {
        let path = format!("/2.0/repositories/{workspace}/{repo_slug}/branch-restrictions");
        self.gateway.post(&path, payload).await
    }

    pub async fn update_branch_restriction(
        &self,
        workspace: &str,
        repo_slug: &str,
        id: i64,
        payload: &RestrictionPayload,
    ) -> Result<Value> {
        let path = format!("/2.0/repositories/{workspace}/{repo_slug}/branch-restrictions/{id}");
        self.gateway.put(&path, payload).await
    }

    pub async fn delete_branch_restriction(
        &self,
        workspace: &str,
        repo_slug: &str,
        id: i64,
    ) -> Option<Value> {
        let path = format!("/2.0/repositories/{workspace}/{repo_slug}/branch-restrictions/{id}");
        self.gateway.delete(&path).await
    }
}
