//! Event kinds distinguished by the event importer.

use serde::{Deserialize, Serialize};

/// Kind tag for imported events, uppercase on the wire
/// (`"REHEARSAL"` / `"SERVICE"`), the values the upload form sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Rehearsal,
    Service,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rehearsal => "REHEARSAL",
            Self::Service => "SERVICE",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
