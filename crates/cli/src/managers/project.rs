use anyhow::{Context, Result};
use bitbucket_admin_api::{Gateway, NewProject, Project, ProjectApi};
use serde_json::Value;
use tracing::info;

use super::{first_match, Outcome};
use crate::prompt::Session;

/// Creates a project in one workspace, reusing an existing one with the same name.
pub struct ProjectManager {
    workspace: String,
    pub project_name: String,
    pub project_key: String,
    pub project_description: String,
    projects: ProjectApi,
}

impl ProjectManager {
    pub fn new(workspace: impl Into<String>, gateway: &Gateway) -> Self {
        Self {
            workspace: workspace.into(),
            project_name: String::new(),
            project_key: String::new(),
            project_description: String::new(),
            projects: ProjectApi::new(gateway.clone()),
        }
    }

    pub async fn create_project_handler(
        &mut self,
        session: &mut Session<'_>,
    ) -> Result<Outcome<Project>> {
        self.project_name = session.input("Enter project name:")?;
        self.project_key = session.input("Enter project key:")?;
        self.project_description = session.input("Enter project description:")?;

        if let Some(existing) = self.check_if_project_exists(session).await? {
            session.console.record(
                "Project already exists:",
                &[
                    ("Name", existing.name.as_str()),
                    ("Key", existing.key.as_str()),
                    ("Description", existing.description()),
                ],
            )?;
            info!(
                workspace = %self.workspace,
                key = %existing.key,
                "Reusing existing project"
            );
            return Ok(Outcome::Reused(existing));
        }

        let created = self.create_project().await.with_context(|| {
            format!(
                "Failed to create project {}/{}",
                self.project_name, self.project_key
            )
        })?;
        session.console.success("Project created successfully.")?;
        info!(
            "{}/{} - Project created successfully",
            self.project_name, self.project_key
        );
        Ok(Outcome::Created(created))
    }

    pub async fn create_project(&self) -> Result<Value> {
        let project = NewProject {
            key: self.project_key.clone(),
            name: self.project_name.clone(),
            description: self.project_description.clone(),
        };
        Ok(self
            .projects
            .create_project(&self.workspace, &project)
            .await?)
    }

    /// Fill name and description from the project stored under `project_key`.
    pub async fn get_project(&mut self) -> Option<Project> {
        let project = self
            .projects
            .get_project(&self.workspace, &self.project_key)
            .await?;
        self.project_name = project.name.clone();
        self.project_description = project.description().to_string();
        Some(project)
    }

    pub async fn list_projects(&self) -> Vec<Project> {
        self.projects.list_projects(&self.workspace).await
    }

    pub async fn check_if_project_exists(
        &self,
        session: &mut Session<'_>,
    ) -> Result<Option<Project>> {
        let projects = self.list_projects().await;
        let existing = first_match(session, &projects, "project", |p| {
            p.name == self.project_name
        })?;
        Ok(existing.cloned())
    }
}
