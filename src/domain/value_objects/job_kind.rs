use serde::{Deserialize, Serialize};

/// Kind of asynchronous work a task tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    ProcessDoc,
    DeleteDoc,
    DeleteKb,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::ProcessDoc => "process_doc",
            JobKind::DeleteDoc => "delete_doc",
            JobKind::DeleteKb => "delete_kb",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, String> {
        match s {
            "process_doc" => Ok(JobKind::ProcessDoc),
            "delete_doc" => Ok(JobKind::DeleteDoc),
            "delete_kb" => Ok(JobKind::DeleteKb),
            _ => Err(format!("Invalid job type: {}", s)),
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
