use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::gateway::Gateway;
use crate::users::{Membership, Permission, PermissionGrant, User};
use crate::workspaces::Workspace;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub workspace: Option<Workspace>,
    pub slug: String,
    #[serde(default = "default_scm")]
    pub scm: String,
    #[serde(default = "default_private")]
    pub is_private: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub project: Option<ProjectRef>,
}

impl Repository {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn project_key(&self) -> Option<&str> {
        self.project.as_ref().map(|p| p.key.as_str())
    }
}

fn default_scm() -> String {
    "git".to_string()
}

fn default_private() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Body of `POST /2.0/repositories/{ws}/{slug}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRepository {
    pub scm: String,
    pub project: ProjectRef,
    pub description: String,
    pub is_private: bool,
}

impl NewRepository {
    /// Private git repository inside `project_key`.
    pub fn git(project_key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            scm: default_scm(),
            project: ProjectRef {
                key: project_key.into(),
                name: None,
            },
            description: description.into(),
            is_private: true,
        }
    }
}

#[derive(Clone)]
pub struct RepositoryApi {
    gateway: Gateway,
}

impl RepositoryApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn create_repository(
        &self,
        workspace: &str,
        repo_slug: &str,
        repository: &NewRepository,
    ) -> Result<Value> {
        let path = format!("/2.0/repositories/{workspace}/{repo_slug}");
        self.gateway.post(&path, repository).await
    }

    pub async fn get_repository(&self, workspace: &str, repo_slug: &str) -> Option<Repository> {
        let path = format!("/2.0/repositories/{workspace}/{repo_slug}");
        self.gateway.get(&path).await
    }

    pub async fn list_repositories(&self, workspace: &str) -> Vec<Repository> {
        let path = format!("/2.0/repositories/{workspace}");
        self.gateway.list(&path).await
    }

    /// Uses the app-password credential; the bearer token is refused here.
    pub async fn add_user_to_repository(
        &self,
        workspace: &str,
        repo_slug: &str,
        user_uuid: &str,
        permission: Permission,
    ) -> Result<Value> {
        let path = format!(
            "/2.0/repositories/{workspace}/{repo_slug}/permissions-config/users/{user_uuid}"
        );
        self.gateway
            .put_with_app_password(&path, &PermissionGrant { permission })
            .await
    }

    pub async fn list_users_in_repository(&self, workspace: &str, repo_slug: &str) -> Vec<User> {
        let path = format!("/2.0/repositories/{workspace}/{repo_slug}/permissions-config/users");
        self.gateway
            .list::<Membership>(&path)
            .await
            .into_iter()
            .map(|m| m.user)
            .collect()
    }

    /// Uses the app-password credential, like [`Self::add_user_to_repository`].
    pub async fn delete_user_in_repository(
        &self,
        workspace: &str,
        repo_slug: &str,
        user_uuid: &str,
    ) -> Option<Value> {
        let path = format!(
            "/2.0/repositories/{workspace}/{repo_slug}/permissions-config/users/{user_uuid}"
        );
        self.gateway.delete_with_app_password(&path).await
    }
}
