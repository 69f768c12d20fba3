use anyhow::{bail, Context, Result};
use bitbucket_admin_api::{
    BranchRestrictionApi, Gateway, NewRepository, Permission, Project, ProjectApi, Repository,
    RepositoryApi, User, UserApi,
};
use serde_json::Value;
use tracing::{info, warn};

use super::Outcome;
use crate::prompt::{MenuItem, Session};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManageOption {
    WithRepoName,
    WithListRepos,
}

impl ManageOption {
    pub const ALL: [Self; 2] = [Self::WithRepoName, Self::WithListRepos];
}

impl MenuItem for ManageOption {
    fn label(&self) -> &'static str {
        match self {
            Self::WithRepoName => "Enter repository name",
            Self::WithListRepos => "List repositories",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManageAction {
    Users,
    BranchRestrictions,
}

impl ManageAction {
    pub const ALL: [Self; 2] = [Self::Users, Self::BranchRestrictions];
}

impl MenuItem for ManageAction {
    fn label(&self) -> &'static str {
        match self {
            Self::Users => "Add or remove users",
            Self::BranchRestrictions => "Manage branch restrictions",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserAction {
    Add,
    Remove,
}

impl UserAction {
    pub const ALL: [Self; 2] = [Self::Add, Self::Remove];
}

impl MenuItem for UserAction {
    fn label(&self) -> &'static str {
        match self {
            Self::Add => "Add user",
            Self::Remove => "Remove user",
        }
    }
}

/// Permissions offered when granting repository access.
pub const GRANTABLE: [Permission; 2] = [Permission::Write, Permission::Read];

/// Creates repositories and manages one repository's members and branch
/// restrictions. `repo_slug`, `project_key` and `description` describe the
/// repository currently being worked on.
pub struct RepositoryManager {
    pub(crate) workspace: String,
    pub repo_slug: String,
    pub project_key: String,
    pub description: String,
    repositories: RepositoryApi,
    projects: ProjectApi,
    pub(crate) users: UserApi,
    pub(crate) restrictions: BranchRestrictionApi,
}

impl RepositoryManager {
    pub fn new(workspace: impl Into<String>, gateway: &Gateway) -> Self {
        Self {
            workspace: workspace.into(),
            repo_slug: String::new(),
            project_key: String::new(),
            description: String::new(),
            repositories: RepositoryApi::new(gateway.clone()),
            projects: ProjectApi::new(gateway.clone()),
            users: UserApi::new(gateway.clone()),
            restrictions: BranchRestrictionApi::new(gateway.clone()),
        }
    }

    pub async fn create_repository_handler(
        &mut self,
        session: &mut Session<'_>,
    ) -> Result<Outcome<Repository>> {
        let projects = self.list_projects().await;
        if projects.is_empty() {
            session.console.warn(format!(
                "No projects found in workspace {}; create a project first.",
                self.workspace
            ))?;
            return Ok(Outcome::Skipped);
        }

        let project = session.choose(
            "Choose which project you want to create a new repository:",
            &projects,
            |p| p.name.clone(),
        )?;
        self.project_key = project.key.clone();
        self.repo_slug = session.input("Enter repository name:")?;
        self.description = session.input("Enter repository description:")?;

        if let Some(existing) = self.check_if_repository_exists().await {
            session.console.record(
                "Repository already exists:",
                &[
                    ("Name", existing.slug.as_str()),
                    ("Project", existing.project_key().unwrap_or(&self.project_key)),
                    ("Description", existing.description()),
                ],
            )?;
            info!(
                workspace = %self.workspace,
                repo = %existing.slug,
                "Reusing existing repository"
            );
            return Ok(Outcome::Reused(existing));
        }

        info!(workspace = %self.workspace, repo = %self.repo_slug, "Creating repository");
        let created = self
            .create_repository()
            .await
            .with_context(|| format!("Failed to create repository {}", self.repo_slug))?;
        session.console.success("Repository created successfully.")?;
        info!("{} - Repository created successfully", self.repo_slug);
        Ok(Outcome::Created(created))
    }

    pub async fn create_repository(&self) -> Result<Value> {
        if self.project_key.is_empty() {
            bail!("No project selected for repository {}", self.repo_slug);
        }
        let repository = NewRepository::git(&self.project_key, &self.description);
        Ok(self
            .repositories
            .create_repository(&self.workspace, &self.repo_slug, &repository)
            .await?)
    }

    /// Look up `repo_slug`; a hit refreshes the description and project key.
    pub async fn get_repository(&mut self) -> Option<Repository> {
        let repository = self
            .repositories
            .get_repository(&self.workspace, &self.repo_slug)
            .await?;
        self.work_on(&repository);
        Some(repository)
    }

    pub async fn check_if_repository_exists(&mut self) -> Option<Repository> {
        self.get_repository().await
    }

    pub async fn list_repositories(&self) -> Vec<Repository> {
        self.repositories.list_repositories(&self.workspace).await
    }

    pub async fn list_projects(&self) -> Vec<Project> {
        self.projects.list_projects(&self.workspace).await
    }

    pub async fn list_users_in_workspace(&self) -> Vec<User> {
        self.users.list_users_in_workspace(&self.workspace).await
    }

    pub async fn list_users_in_repository(&self) -> Vec<User> {
        self.repositories
            .list_users_in_repository(&self.workspace, &self.repo_slug)
            .await
    }

    pub async fn manage_repository_handler(&mut self, session: &mut Session<'_>) -> Result<()> {
        let option = session.menu("How do you want to find the repository?", &ManageOption::ALL)?;
        let selected = match option {
            ManageOption::WithRepoName => {
                self.manage_repo_handler_with_repo_name(session).await?;
                true
            }
            ManageOption::WithListRepos => self.manage_repo_handler_with_list_repos(session).await?,
        };
        if !selected {
            return Ok(());
        }

        info!(workspace = %self.workspace, repo = %self.repo_slug, "Managing repository");
        match session.menu("What do you want to do?", &ManageAction::ALL)? {
            ManageAction::Users => self.add_remove_users_from_repo_handler(session).await,
            ManageAction::BranchRestrictions => self.manage_branch_restrictions(session).await,
        }
    }

    pub async fn manage_repo_handler_with_repo_name(
        &mut self,
        session: &mut Session<'_>,
    ) -> Result<()> {
        self.repo_slug = session.input("Enter repository name:")?;
        if self.check_if_repository_exists().await.is_none() {
            bail!("Repository {} does not exist.", self.repo_slug);
        }
        Ok(())
    }

    /// Returns false when the workspace has no repositories to pick from.
    pub async fn manage_repo_handler_with_list_repos(
        &mut self,
        session: &mut Session<'_>,
    ) -> Result<bool> {
        let repositories = self.list_repositories().await;
        if repositories.is_empty() {
            session.console.warn(format!(
                "No repositories found in workspace {}.",
                self.workspace
            ))?;
            return Ok(false);
        }

        let repository = session.choose("Choose repository:", &repositories, |r| {
            r.slug.clone()
        })?;
        self.work_on(repository);
        Ok(true)
    }

    pub async fn add_remove_users_from_repo_handler(
        &mut self,
        session: &mut Session<'_>,
    ) -> Result<()> {
        match session.menu("Do you want to add or remove a user?", &UserAction::ALL)? {
            UserAction::Add => self.add_user_to_repo(session).await,
            UserAction::Remove => self.remove_user_from_repo(session).await,
        }
    }

    pub async fn add_user_to_repo(&self, session: &mut Session<'_>) -> Result<()> {
        let members = self.list_users_in_workspace().await;
        if members.is_empty() {
            session.console.warn(format!(
                "No members found in workspace {}.",
                self.workspace
            ))?;
            return Ok(());
        }

        let user = session.choose(
            "Choose which user you want to add or remove:",
            &members,
            |u| u.display_name.clone(),
        )?;
        let permission = GRANTABLE[session.choose_index(
            "Choose permission:",
            &GRANTABLE,
            |p| p.to_string(),
        )?];

        self.repositories
            .add_user_to_repository(&self.workspace, &self.repo_slug, &user.uuid, permission)
            .await
            .with_context(|| {
                format!(
                    "Failed to add {} to repository {}",
                    user.display_name, self.repo_slug
                )
            })?;

        session.console.success(format!(
            "Added {} to {} with {permission} permission.",
            user.display_name, self.repo_slug
        ))?;
        info!(
            repo = %self.repo_slug,
            user = %user.uuid,
            permission = %permission,
            "User added to repository"
        );
        Ok(())
    }

    pub async fn remove_user_from_repo(&self, session: &mut Session<'_>) -> Result<()> {
        let members = self.list_users_in_repository().await;
        if members.is_empty() {
            session.console.warn(format!(
                "Repository {} has no users with explicit permissions.",
                self.repo_slug
            ))?;
            return Ok(());
        }

        let user = session.choose(
            "Choose which user you want to add or remove:",
            &members,
            |u| u.display_name.clone(),
        )?;

        let removed = self
            .repositories
            .delete_user_in_repository(&self.workspace, &self.repo_slug, &user.uuid)
            .await;
        if removed.is_some() {
            session.console.success(format!(
                "Removed {} from {}.",
                user.display_name, self.repo_slug
            ))?;
            info!(repo = %self.repo_slug, user = %user.uuid, "User removed from repository");
        } else {
            session.console.warn(format!(
                "{} was not removed from {}.",
                user.display_name, self.repo_slug
            ))?;
            warn!(repo = %self.repo_slug, user = %user.uuid, "User removal failed");
        }
        Ok(())
    }

    /// Make `repository` the one being worked on.
    fn work_on(&mut self, repository: &Repository) {
        self.repo_slug = repository.slug.clone();
        self.description = repository.description().to_string();
        if let Some(key) = repository.project_key() {
            self.project_key = key.to_string();
        }
    }
}
