use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::gateway::Gateway;
use crate::users::{Membership, Permission, PermissionGrant, User};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub updated_on: Option<String>,
}

impl Project {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// Body of `POST /2.0/workspaces/{ws}/projects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProject {
    pub key: String,
    pub name: String,
    pub description: String,
}

/// Body of `PUT /2.0/workspaces/{ws}/projects/{key}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectUpdate {
    pub name: String,
    pub description: String,
}

#[derive(Clone)]
pub struct ProjectApi {
    gateway: Gateway,
}

impl ProjectApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn create_project(&self, workspace: &str, project: &NewProject) -> Result<Value> {
        let path = format!("/2.0/workspaces/{workspace}/projects");
        self.gateway.post(&path, project).await
    }

    pub async fn get_project(&self, workspace: &str, key: &str) -> Option<Project> {
        let path = format!("/2.0/workspaces/{workspace}/projects/{key}");
        self.gateway.get(&path).await
    }

    pub async fn update_project(
        &self,
        workspace: &str,
        key: &str,
        update: &ProjectUpdate,
    ) -> Result<Value> {
        let path = format!("/2.0/workspaces/{workspace}/projects/{key}");
        self.gateway.put(&path, update).await
    }

    pub async fn list_projects(&self, workspace: &str) -> Vec<Project> {
        let path = format!("/2.0/workspaces/{workspace}/projects");
        self.gateway.list(&path).await
    }

    pub async fn list_users_in_project(&self, workspace: &str, project_key: &str) -> Vec<User> {
        let path =
            format!("/2.0/workspaces/{workspace}/projects/{project_key}/permissions-config/users");
        self.gateway
            .list::<Membership>(&path)
            .await
            .into_iter()
            .map(|m| m.user)
            .collect()
    }

    /// Raw permission entry for one user, as returned by the service.
    pub async fn get_user_from_project(
        &self,
        workspace: &str,
        project_key: &str,
        user_uuid: &str,
    ) -> Option<Value> {
        let path = format!(
            "/2.0/workspaces/{workspace}/projects/{project_key}/permissions-config/users/{user_uuid}"
        );
        self.gateway.get(&path).await
    }

    pub async fn add_user_to_project(
        &self,
        workspace: &str,
        project_key: &str,
        user_uuid: &str,
        permission: Permission,
    ) -> Result<Value> {
        let path = format!(
            "/2.0/workspaces/{workspace}/projects/{project_key}/permissions-config/users/{user_uuid}"
        );
        self.gateway
            .put(&path, &PermissionGrant { permission })
            .await
    }
}
