//! Backend HTTP contracts and the blocking client that speaks them.

use crate::config::{GenerationOptions, StudioConfig};
use crate::models::{Hadith, JobSnapshot, VideoSource};
use crate::{Result, StudioError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("hadith_studio/", env!("CARGO_PKG_VERSION"));

const FALLBACK_SEARCH: &str = "حدث خطأ في البحث";
const FALLBACK_GENERATE: &str = "حدث خطأ في توليد الفيديو";
const FALLBACK_GENERATE_ASYNC: &str = "حدث خطأ في بدء توليد الفيديو";
const FALLBACK_JOB_STATUS: &str = "تعذر جلب حالة المهمة";
const FALLBACK_CANCEL: &str = "فشل في إلغاء المهمة";
const FALLBACK_KIE: &str = "حدث خطأ في توليد فيديو KIE";
const FALLBACK_AI_STATUS: &str = "تعذر جلب حالة خدمات الذكاء الاصطناعي";
const FALLBACK_STATS: &str = "تعذر جلب الإحصائيات";
const FALLBACK_DOWNLOAD: &str = "تعذر تحميل الفيديو";
const FALLBACK_PROMPT: &str = "فشل في توليد الأمر";

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub hadith: Hadith,
    pub video_type: Option<String>,
    #[serde(flatten)]
    pub options: GenerationOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct KieVideoRequest {
    pub prompt: String,
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptRequest {
    pub hadith_text: String,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiPromptRequest {
    pub description: String,
    pub style: String,
    pub provider: String,
}

/// A background prompt written by one of the server's AI providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPrompt {
    pub prompt: String,
    pub provider: String,
}

/// The backend surface the client depends on.
pub trait StudioApi: Send + Sync {
    fn search(&self, keyword: &str) -> Result<Vec<Hadith>>;

    /// Synchronous generation; returns the server-side video path.
    fn generate(&self, request: &GenerateRequest) -> Result<String>;

    /// Queues a generation job; returns its id.
    fn generate_async(&self, request: &GenerateRequest) -> Result<String>;

    fn job_status(&self, job_id: &str) -> Result<JobSnapshot>;

    fn cancel_job(&self, job_id: &str) -> Result<()>;

    /// Third-party generation; returns the external video URL.
    fn generate_kie_video(&self, request: &KieVideoRequest) -> Result<String>;

    /// Template-based background prompt for a hadith.
    fn generate_prompt(&self, request: &PromptRequest) -> Result<String>;

    fn generate_ai_prompt(&self, request: &AiPromptRequest) -> Result<GeneratedPrompt>;

    fn ai_status(&self) -> Result<BTreeMap<String, bool>>;

    fn stats(&self) -> Result<u64>;

    fn download_video(&self, video: &VideoSource, dst: &Path) -> Result<u64>;

    fn preview_url(&self, video: &VideoSource) -> String {
        relative_video_url("preview", video)
    }

    fn download_url(&self, video: &VideoSource) -> String {
        relative_video_url("download", video)
    }
}

/// Server-relative URL of a local video (`/api/<route>/<file>`); external URLs pass through.
pub fn relative_video_url(route: &str, video: &VideoSource) -> String {
    match video {
        VideoSource::Local { file_name } => format!("/api/{route}/{file_name}"),
        VideoSource::External { url } => url.clone(),
    }
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    hadiths: Vec<Hadith>,
}

#[derive(Debug, Deserialize)]
struct GenerateBody {
    #[serde(default)]
    video_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateAsyncBody {
    #[serde(default)]
    job_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobStatusBody {
    #[serde(default)]
    status: Option<JobSnapshot>,
}

#[derive(Debug, Deserialize)]
struct KieBody {
    #[serde(default)]
    video_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptBody {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    provider: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AiStatusBody {
    #[serde(default)]
    status: BTreeMap<String, bool>,
}

#[derive(Debug, Deserialize)]
struct StatsBody {
    #[serde(default)]
    total_videos: u64,
}

/// Blocking client for the backend, built on `ureq`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base: Url,
    search_agent: ureq::Agent,
    agent: ureq::Agent,
}

impl HttpBackend {
    pub fn new(server_url: &str, search_timeout: Duration) -> Result<Self> {
        let base = Url::parse(server_url.trim())?;
        if base.cannot_be_a_base() {
            return Err(StudioError::Validation(format!(
                "server url cannot be used as a base: {server_url}"
            )));
        }
        Ok(Self {
            base,
            search_agent: build_http_agent(Some(search_timeout)),
            agent: build_http_agent(None),
        })
    }

    pub fn from_config(config: &StudioConfig) -> Result<Self> {
        Self::new(
            &config.server_url,
            Duration::from_secs(config.search_timeout_secs.max(1)),
        )
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                StudioError::Validation(format!("server url cannot be used as a base: {}", self.base))
            })?;
            path.pop_if_empty();
            path.push("api");
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn video_url(&self, route: &str, video: &VideoSource) -> Result<String> {
        match video {
            VideoSource::Local { file_name } => {
                Ok(self.endpoint(&[route, file_name.as_str()])?.to_string())
            }
            VideoSource::External { url } => Ok(url.clone()),
        }
    }

    fn get_json(&self, url: &Url, fallback: &str) -> Result<serde_json::Value> {
        let response = self.agent.get(url.as_str()).call().map_err(map_transport_error)?;
        read_envelope(response, fallback)
    }

    fn post_json<T: Serialize>(
        &self,
        agent: &ureq::Agent,
        url: &Url,
        payload: &T,
        fallback: &str,
    ) -> Result<serde_json::Value> {
        let body = serde_json::to_string(payload)?;
        let response = agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(body.as_str())
            .map_err(map_transport_error)?;
        read_envelope(response, fallback)
    }
}

impl StudioApi for HttpBackend {
    fn search(&self, keyword: &str) -> Result<Vec<Hadith>> {
        let url = self.endpoint(&["search"])?;
        let value = self.post_json(
            &self.search_agent,
            &url,
            &serde_json::json!({ "keyword": keyword }),
            FALLBACK_SEARCH,
        )?;
        let body: SearchBody = serde_json::from_value(value)?;
        Ok(body.hadiths)
    }

    fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let url = self.endpoint(&["generate"])?;
        let value = self.post_json(&self.agent, &url, request, FALLBACK_GENERATE)?;
        let body: GenerateBody = serde_json::from_value(value)?;
        non_empty_field(body.video_path, "فشل في إنشاء الفيديو")
    }

    fn generate_async(&self, request: &GenerateRequest) -> Result<String> {
        let url = self.endpoint(&["generate_async"])?;
        let value = self.post_json(&self.agent, &url, request, FALLBACK_GENERATE_ASYNC)?;
        let body: GenerateAsyncBody = serde_json::from_value(value)?;
        non_empty_field(body.job_id, "فشل في بدء توليد الفيديو")
    }

    fn job_status(&self, job_id: &str) -> Result<JobSnapshot> {
        let url = self.endpoint(&["job_status", job_id])?;
        let value = self.get_json(&url, FALLBACK_JOB_STATUS)?;
        let body: JobStatusBody = serde_json::from_value(value)?;
        body.status.ok_or_else(|| StudioError::Server {
            status: 200,
            message: FALLBACK_JOB_STATUS.to_string(),
        })
    }

    fn cancel_job(&self, job_id: &str) -> Result<()> {
        let url = self.endpoint(&["cancel_job", job_id])?;
        let response = self
            .agent
            .post(url.as_str())
            .send_empty()
            .map_err(map_transport_error)?;
        read_envelope(response, FALLBACK_CANCEL)?;
        Ok(())
    }

    fn generate_kie_video(&self, request: &KieVideoRequest) -> Result<String> {
        let url = self.endpoint(&["generate_kie_video"])?;
        let value = self.post_json(&self.agent, &url, request, FALLBACK_KIE)?;
        let body: KieBody = serde_json::from_value(value)?;
        non_empty_field(body.video_url, "فشل في توليد فيديو KIE")
    }

    fn generate_prompt(&self, request: &PromptRequest) -> Result<String> {
        let url = self.endpoint(&["generate_prompt"])?;
        let value = self.post_json(&self.agent, &url, request, FALLBACK_PROMPT)?;
        let body: PromptBody = serde_json::from_value(value)?;
        non_empty_field(body.prompt, FALLBACK_PROMPT)
    }

    fn generate_ai_prompt(&self, request: &AiPromptRequest) -> Result<GeneratedPrompt> {
        let url = self.endpoint(&["generate_ai_prompt"])?;
        let value = self.post_json(&self.agent, &url, request, FALLBACK_PROMPT)?;
        let body: PromptBody = serde_json::from_value(value)?;
        let prompt = non_empty_field(body.prompt, FALLBACK_PROMPT)?;
        let provider = body
            .provider
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| request.provider.clone());
        Ok(GeneratedPrompt { prompt, provider })
    }

    fn ai_status(&self) -> Result<BTreeMap<String, bool>> {
        let url = self.endpoint(&["ai_status"])?;
        let value = self.get_json(&url, FALLBACK_AI_STATUS)?;
        let body: AiStatusBody = serde_json::from_value(value)?;
        Ok(body.status)
    }

    fn stats(&self) -> Result<u64> {
        let url = self.endpoint(&["stats"])?;
        let value = self.get_json(&url, FALLBACK_STATS)?;
        let body: StatsBody = serde_json::from_value(value)?;
        Ok(body.total_videos)
    }

    fn download_video(&self, video: &VideoSource, dst: &Path) -> Result<u64> {
        let url = self.video_url("download", video)?;
        download_atomic(&self.agent, &url, dst)
    }

    fn preview_url(&self, video: &VideoSource) -> String {
        self.video_url("preview", video)
            .unwrap_or_else(|_| relative_video_url("preview", video))
    }

    fn download_url(&self, video: &VideoSource) -> String {
        self.video_url("download", video)
            .unwrap_or_else(|_| relative_video_url("download", video))
    }
}

fn build_http_agent(timeout: Option<Duration>) -> ureq::Agent {
    let mut config = ureq::Agent::config_builder();
    config = config
        .http_status_as_error(false)
        .timeout_global(timeout)
        .user_agent(USER_AGENT);
    config.build().into()
}

fn map_transport_error(err: ureq::Error) -> StudioError {
    match err {
        ureq::Error::Timeout(_) => StudioError::Timeout,
        ureq::Error::HostNotFound => StudioError::Offline("host not found".to_string()),
        ureq::Error::ConnectionFailed => StudioError::Offline("connection failed".to_string()),
        ureq::Error::Io(e) => match e.kind() {
            std::io::ErrorKind::TimedOut => StudioError::Timeout,
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected => StudioError::Offline(e.to_string()),
            _ => StudioError::Http(e.to_string()),
        },
        other => StudioError::Http(other.to_string()),
    }
}

fn read_envelope(
    mut response: ureq::http::Response<ureq::Body>,
    fallback: &str,
) -> Result<serde_json::Value> {
    let status = response.status().as_u16();
    let raw = response
        .body_mut()
        .read_to_string()
        .map_err(map_transport_error)?;
    decode_envelope(status, &raw, fallback)
}

/// Applies the backend's `{success, error}` convention to a response body.
pub(crate) fn decode_envelope(status: u16, raw: &str, fallback: &str) -> Result<serde_json::Value> {
    let ok_status = (200..300).contains(&status);
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            if ok_status {
                return Err(StudioError::Json(e));
            }
            return Err(StudioError::Server {
                status,
                message: fallback.to_string(),
            });
        }
    };

    let reported_failure = value.get("success").and_then(|v| v.as_bool()) == Some(false);
    if !ok_status || reported_failure {
        let message = value
            .get("error")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
            .to_string();
        return Err(StudioError::Server { status, message });
    }

    Ok(value)
}

fn non_empty_field(value: Option<String>, fallback: &str) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(StudioError::Server {
            status: 200,
            message: fallback.to_string(),
        }),
    }
}

fn download_atomic(agent: &ureq::Agent, url: &str, dst: &Path) -> Result<u64> {
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = dst.with_extension("download");

    let response = agent.get(url).call().map_err(map_transport_error)?;
    let status = response.status().as_u16();
    if status >= 400 {
        return Err(StudioError::Server {
            status,
            message: FALLBACK_DOWNLOAD.to_string(),
        });
    }

    let mut reader = response.into_body().into_reader();
    let mut file = std::fs::File::create(&tmp_path)?;
    let mut total = 0_u64;
    let mut buf = [0u8; 1024 * 64];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(n) => n,
            Err(e) => {
                let _ = std::fs::remove_file(&tmp_path);
                return Err(StudioError::Io(e));
            }
        };
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
        total += n as u64;
    }
    file.flush()?;
    drop(file);

    if dst.exists() {
        std::fs::remove_file(dst)?;
    }
    std::fs::rename(&tmp_path, dst)?;
    Ok(total)
}
