use serde::{Deserialize, Serialize};

/// Bitbucket list envelope. Only the page that was requested is read; the
/// `next` cursor is surfaced but never followed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResponse<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub pagelen: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
}

impl<T> PagedResponse<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Items on later pages, when the service reports a total.
    pub fn unread(&self) -> Option<u32> {
        self.size
            .map(|size| size.saturating_sub(self.values.len() as u32))
    }
}
