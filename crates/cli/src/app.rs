use anyhow::Result;
use bitbucket_admin_api::{Gateway, WorkspaceApi};
use tracing::info;

use crate::managers::{ProjectManager, RepositoryManager};
use crate::prompt::{MenuItem, Session};

pub const BANNER: &str = "Bitbucket CLI - Manage your Bitbucket repositories";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    CreateProject,
    CreateRepository,
    ManageRepository,
}

impl Action {
    pub const ALL: [Self; 3] = [
        Self::CreateProject,
        Self::CreateRepository,
        Self::ManageRepository,
    ];
}

impl MenuItem for Action {
    fn label(&self) -> &'static str {
        match self {
            Self::CreateProject => "Create project",
            Self::CreateRepository => "Create repository",
            Self::ManageRepository => "Manage repository",
        }
    }
}

/// One interactive session: pick a workspace, then one action in it.
pub struct BitbucketCli {
    gateway: Gateway,
}

impl BitbucketCli {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn run(&self, session: &mut Session<'_>) -> Result<()> {
        session.console.line(BANNER)?;

        let workspaces = WorkspaceApi::new(self.gateway.clone())
            .list_workspaces()
            .await;
        if workspaces.is_empty() {
            session
                .console
                .warn("No workspaces are available with these credentials.")?;
            return Ok(());
        }

        let workspace = session
            .choose("Choose your workspace:", &workspaces, |w| w.slug.clone())?
            .slug
            .clone();
        info!(workspace = %workspace, "Workspace selected");

        let action = session.menu("What do you want to do?", &Action::ALL)?;
        info!(workspace = %workspace, action = action.label(), "Action selected");

        match action {
            Action::CreateProject => {
                ProjectManager::new(workspace, &self.gateway)
                    .create_project_handler(session)
                    .await?;
            }
            Action::CreateRepository => {
                RepositoryManager::new(workspace, &self.gateway)
                    .create_repository_handler(session)
                    .await?;
            }
            Action::ManageRepository => {
                RepositoryManager::new(workspace, &self.gateway)
                    .manage_repository_handler(session)
                    .await?;
            }
        }
        Ok(())
    }
}
