use serde::{Deserialize, Serialize};

/// Hadith identifiers arrive as either strings or integers depending on the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HadithId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for HadithId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HadithId::Number(n) => write!(f, "{n}"),
            HadithId::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Hadith {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<HadithId>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation_link: Option<String>,
}

impl Hadith {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn narrator(&self) -> Option<&str> {
        non_empty(&self.narrator)
    }

    pub fn source(&self) -> Option<&str> {
        non_empty(&self.source)
    }

    pub fn grade(&self) -> Option<&str> {
        non_empty(&self.grade)
    }

    pub fn explanation(&self) -> Option<&str> {
        non_empty(&self.explanation)
    }

    pub fn explanation_link(&self) -> Option<&str> {
        non_empty(&self.explanation_link)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    #[serde(flatten)]
    pub hadith: Hadith,
    pub saved_at_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryEntry {
    pub keyword: String,
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    pub id: String,
    pub hadith: Hadith,
    pub video: VideoSource,
    pub created_at_ms: i64,
}

/// Where a generated video can be previewed and downloaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VideoSource {
    /// A file in the backend's output folder, served by the preview/download routes.
    Local { file_name: String },
    /// A third-party URL used as-is.
    External { url: String },
}

impl VideoSource {
    /// Builds a local locator from a server-reported path such as `videos/abc.mp4`.
    pub fn from_server_path(raw: &str) -> Option<Self> {
        let file_name = raw
            .trim()
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or("")
            .trim();
        if file_name.is_empty() {
            return None;
        }
        Some(VideoSource::Local {
            file_name: file_name.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl JobPhase {
    pub fn from_status(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "completed" => JobPhase::Completed,
            "failed" => JobPhase::Failed,
            "cancelled" | "canceled" => JobPhase::Cancelled,
            _ => JobPhase::InProgress,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, JobPhase::InProgress)
    }
}

/// Last-seen server view of an asynchronous generation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Option<String>,
}

impl JobSnapshot {
    pub fn phase(&self) -> JobPhase {
        JobPhase::from_status(&self.status)
    }

    pub fn progress_percent(&self) -> u8 {
        if !self.progress.is_finite() {
            return 0;
        }
        self.progress.round().clamp(0.0, 100.0) as u8
    }

    pub fn display_message(&self) -> String {
        if self.message.trim().is_empty() {
            format!("{}%", self.progress_percent())
        } else {
            self.message.clone()
        }
    }
}
