pub mod branch_restrictions;
pub mod project;
pub mod repository;

use anyhow::Result;
use serde_json::Value;

use crate::prompt::Session;

pub use project::ProjectManager;
pub use repository::RepositoryManager;

/// How a create flow ended.
#[derive(Debug)]
pub enum Outcome<T> {
    /// A matching resource already existed and was left untouched.
    Reused(T),
    /// The service accepted the create call; holds its response body.
    Created(Value),
    /// Nothing to act on, the operator was told why.
    Skipped,
}

impl<T> Outcome<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, Outcome::Created(_))
    }
}

/// First entry matching `predicate`, warning when several do.
pub(crate) fn first_match<'t, T>(
    session: &mut Session<'_>,
    items: &'t [T],
    what: &str,
    predicate: impl Fn(&T) -> bool,
) -> Result<Option<&'t T>> {
    let mut matches = items.iter().filter(|item| predicate(item));
    let first = matches.next();
    let others = matches.count();
    if first.is_some() && others > 0 {
        session.console.warn(format!(
            "{} {what} entries share that name; using the first one listed",
            others + 1
        ))?;
    }
    Ok(first)
}
