//! Branch restriction flows for the repository being managed.
//!
//! Only `push` restrictions are created here. The user list of a restriction
//! is always sent whole, so every update re-reads the restriction first and
//! rebuilds the list from what the service returned.

use anyhow::{Context, Result};
use bitbucket_admin_api::branch_restrictions::PUSH;
use bitbucket_admin_api::{BranchRestriction, RestrictionPayload, User, UserRef};
use tracing::{info, warn};

use super::{Outcome, RepositoryManager};
use crate::prompt::{MenuItem, Session};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestrictionAction {
    Create,
    List,
    Update,
}

impl RestrictionAction {
    pub const ALL: [Self; 3] = [Self::Create, Self::List, Self::Update];
}

impl MenuItem for RestrictionAction {
    fn label(&self) -> &'static str {
        match self {
            Self::Create => "Create branch restriction",
            Self::List => "List branch restrictions",
            Self::Update => "Update branch restriction",
        }
    }
}

/// Who may bypass pull requests on a new restriction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BypassMode {
    AllowUser,
    DenyEveryone,
}

impl BypassMode {
    pub const ALL: [Self; 2] = [Self::AllowUser, Self::DenyEveryone];
}

impl MenuItem for BypassMode {
    fn label(&self) -> &'static str {
        match self {
            Self::AllowUser => "Allow specific user to bypass pull request",
            Self::DenyEveryone => "Deny everyone from bypassing pull request",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BypassChange {
    AllowEveryone,
    AllowUser,
    RemoveUser,
    DenyEveryone,
}

impl BypassChange {
    pub const ALL: [Self; 4] = [
        Self::AllowEveryone,
        Self::AllowUser,
        Self::RemoveUser,
        Self::DenyEveryone,
    ];
}

impl MenuItem for BypassChange {
    fn label(&self) -> &'static str {
        match self {
            Self::AllowEveryone => "Allow everyone to bypass pull request",
            Self::AllowUser => "Allow specific user to bypass pull request",
            Self::RemoveUser => "Remove specific user from bypassing pull request",
            Self::DenyEveryone => "Deny everyone from bypassing pull request",
        }
    }
}

/// Current users plus `added` at the end.
pub fn users_with(users: &[User], added: &User) -> Vec<UserRef> {
    users
        .iter()
        .chain(std::iter::once(added))
        .map(User::to_ref)
        .collect()
}

/// Current users without the one at `index`.
pub fn users_without(users: &[User], index: usize) -> Vec<UserRef> {
    users
        .iter()
        .enumerate()
        .filter(|(position, _)| *position != index)
        .map(|(_, user)| user.to_ref())
        .collect()
}

impl RepositoryManager {
    pub async fn manage_branch_restrictions(&self, session: &mut Session<'_>) -> Result<()> {
        match session.menu(
            "What do you want to do with branch restrictions?",
            &RestrictionAction::ALL,
        )? {
            RestrictionAction::Create => self.create_branch_restriction(session).await.map(|_| ()),
            RestrictionAction::List => self.show_branch_restrictions(session).await,
            RestrictionAction::Update => self.update_branch_restriction_handler(session).await,
        }
    }

    pub async fn list_branch_restrictions(&self) -> Vec<BranchRestriction> {
        self.restrictions
            .list_branch_restrictions(&self.workspace, &self.repo_slug)
            .await
    }

    pub async fn check_if_branch_restriction_exists(
        &self,
        pattern: &str,
        kind: &str,
    ) -> Option<BranchRestriction> {
        self.list_branch_restrictions()
            .await
            .into_iter()
            .find(|r| r.matches(pattern, kind))
    }

    pub async fn create_branch_restriction(
        &self,
        session: &mut Session<'_>,
    ) -> Result<Outcome<BranchRestriction>> {
        let pattern = session.input("Enter branch name or pattern:")?;
        let mode = session.menu("Who can bypass pull requests?", &BypassMode::ALL)?;

        let users = match mode {
            BypassMode::DenyEveryone => Vec::new(),
            BypassMode::AllowUser => {
                let Some(user) = self.pick_workspace_member(session).await? else {
                    return Ok(Outcome::Skipped);
                };
                vec![user.to_ref()]
            }
        };

        if let Some(existing) = self.check_if_branch_restriction_exists(&pattern, PUSH).await {
            session.console.warn("Branch restriction already exists.")?;
            info!(repo = %self.repo_slug, pattern = %pattern, "Branch restriction already exists");
            return Ok(Outcome::Reused(existing));
        }

        let payload = RestrictionPayload::push(&pattern, users);
        let created = self
            .restrictions
            .create_branch_restriction(&self.workspace, &self.repo_slug, &payload)
            .await
            .with_context(|| format!("Failed to create branch restriction on {pattern}"))?;
        session.console.success("Branch restriction created successfully.")?;
        info!("{pattern}-{PUSH} - Branch restriction created successfully");
        Ok(Outcome::Created(created))
    }

    pub async fn show_branch_restrictions(&self, session: &mut Session<'_>) -> Result<()> {
        let restrictions = self.list_branch_restrictions().await;
        if restrictions.is_empty() {
            session.console.line(format!(
                "No branch restrictions found for {}.",
                self.repo_slug
            ))?;
            return Ok(());
        }
        for restriction in &restrictions {
            session.console.line(restriction.summary())?;
        }
        Ok(())
    }

    pub async fn update_branch_restriction_handler(
        &self,
        session: &mut Session<'_>,
    ) -> Result<()> {
        let restrictions = self.list_branch_restrictions().await;
        if restrictions.is_empty() {
            session.console.warn(format!(
                "No branch restrictions found for {}.",
                self.repo_slug
            ))?;
            return Ok(());
        }

        let picked = session.choose(
            "Choose which branch restriction you want to update:",
            &restrictions,
            BranchRestriction::summary,
        )?;

        let Some(current) = self
            .restrictions
            .get_branch_restriction(&self.workspace, &self.repo_slug, picked.id)
            .await
        else {
            session.console.warn(format!(
                "Branch restriction {} no longer exists.",
                picked.id
            ))?;
            return Ok(());
        };

        let users = match session.menu("How do you want to change it?", &BypassChange::ALL)? {
            BypassChange::AllowEveryone => {
                return self.delete_branch_restriction(session, &current).await;
            }
            BypassChange::AllowUser => {
                let Some(user) = self.pick_workspace_member(session).await? else {
                    return Ok(());
                };
                users_with(&current.users, &user)
            }
            BypassChange::RemoveUser => {
                if current.users.is_empty() {
                    session
                        .console
                        .warn("No users can bypass this restriction.")?;
                    return Ok(());
                }
                let index = session.choose_index(
                    "Choose which user you want to remove:",
                    &current.users,
                    |u| u.display_name.clone(),
                )?;
                users_without(&current.users, index)
            }
            BypassChange::DenyEveryone => Vec::new(),
        };

        let payload = current.with_users(users);
        self.restrictions
            .update_branch_restriction(&self.workspace, &self.repo_slug, current.id, &payload)
            .await
            .with_context(|| format!("Failed to update branch restriction {}", current.id))?;
        session
            .console
            .success("Branch restriction updated successfully.")?;
        info!(
            repo = %self.repo_slug,
            id = current.id,
            users = payload.users.len(),
            "Branch restriction updated"
        );
        Ok(())
    }

    async fn delete_branch_restriction(
        &self,
        session: &mut Session<'_>,
        restriction: &BranchRestriction,
    ) -> Result<()> {
        let deleted = self
            .restrictions
            .delete_branch_restriction(&self.workspace, &self.repo_slug, restriction.id)
            .await;
        if deleted.is_some() {
            session
                .console
                .success("Branch restriction deleted successfully.")?;
            info!(repo = %self.repo_slug, id = restriction.id, "Branch restriction deleted");
        } else {
            session.console.warn(format!(
                "Branch restriction {} was not deleted.",
                restriction.id
            ))?;
            warn!(repo = %self.repo_slug, id = restriction.id, "Branch restriction delete failed");
        }
        Ok(())
    }

    async fn pick_workspace_member(&self, session: &mut Session<'_>) -> Result<Option<User>> {
        let members = self.list_users_in_workspace().await;
        if members.is_empty() {
            session.console.warn(format!(
                "No members found in workspace {}.",
                self.workspace
            ))?;
            return Ok(None);
        }
        let user = session.choose("Choose user:", &members, |u| u.display_name.clone())?;
        Ok(Some(user.clone()))
    }
}
