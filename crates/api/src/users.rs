use serde::{Deserialize, Serialize};

use crate::gateway::Gateway;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
}

impl User {
    pub fn to_ref(&self) -> UserRef {
        UserRef {
            uuid: self.uuid.clone(),
        }
    }
}

/// How a user is referenced inside request bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub uuid: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Admin,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
            Permission::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of the `permissions-config/users/{uuid}` endpoints.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct PermissionGrant {
    pub permission: Permission,
}

/// Workspace memberships and permission listings nest the user one level down.
#[derive(Debug, Deserialize)]
pub(crate) struct Membership {
    pub user: User,
}

#[derive(Clone)]
pub struct UserApi {
    gateway: Gateway,
}

impl UserApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list_users_in_workspace(&self, workspace: &str) -> Vec<User> {
        let path = format!("/2.0/workspaces/{workspace}/members");
        self.gateway
            .list::<Membership>(&path)
            .await
            .into_iter()
            .map(|m| m.user)
            .collect()
    }

    pub async fn get_user(&self, uuid: &str) -> Option<User> {
        let path = format!("/2.0/users/{uuid}");
        self.gateway.get(&path).await
    }
}
