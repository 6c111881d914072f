use std::fmt;

/// What an upsert did for one listing URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpsertOutcome {
    /// First successful scrape of an unseen URL
    Created,

    /// Existing record refreshed in place
    Updated,

    /// Record was inside the freshness window; nothing was fetched
    Fresh,
}

impl UpsertOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Fresh => "fresh",
        }
    }
}

impl fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
