use serde::{Deserialize, Serialize};

use crate::gateway::Gateway;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub slug: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
}

#[derive(Clone)]
pub struct WorkspaceApi {
    gateway: Gateway,
}

impl WorkspaceApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list_workspaces(&self) -> Vec<Workspace> {
        self.gateway.list("/2.0/workspaces").await
    }

    pub async fn get_workspace(&self, workspace: &str) -> Option<Workspace> {
        let path = format!("/2.0/workspaces/{workspace}");
        self.gateway.get(&path).await
    }
}
