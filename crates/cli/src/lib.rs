//! Interactive Bitbucket Cloud administration: projects, repositories,
//! repository members and branch restrictions.

pub mod app;
pub mod managers;
pub mod prompt;

pub use app::BitbucketCli;
pub use managers::{Outcome, ProjectManager, RepositoryManager};
pub use prompt::{MenuItem, Prompter, Session, TerminalPrompter};
