use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hadith_studio::api::{
    AiPromptRequest, GenerateRequest, GeneratedPrompt, KieVideoRequest, PromptRequest, StudioApi,
};
use hadith_studio::cards::GradeClass;
use hadith_studio::config::StudioConfig;
use hadith_studio::generate::GenerationOutcome;
use hadith_studio::models::{Hadith, JobSnapshot, VideoSource};
use hadith_studio::paths::AppPaths;
use hadith_studio::studio::Studio;
use hadith_studio::view::ViewModel;
use hadith_studio::{Result, StudioError};

/// In-memory backend: fixed search results, a sync video and a scripted async job.
struct FakeBackend {
    hadiths: Vec<Hadith>,
    requests: Mutex<Vec<String>>,
    job_statuses: Mutex<VecDeque<JobSnapshot>>,
}

impl FakeBackend {
    fn new(hadiths: Vec<Hadith>) -> Self {
        Self {
            hadiths,
            requests: Mutex::new(Vec::new()),
            job_statuses: Mutex::new(VecDeque::new()),
        }
    }

    fn record(&self, what: &str) {
        self.requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(what.to_string());
    }

    fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

fn job(status: &str, progress: f64, result: Option<&str>) -> JobSnapshot {
    JobSnapshot {
        status: status.to_string(),
        progress,
        message: format!("{status} {progress}"),
        result: result.map(str::to_string),
    }
}

impl StudioApi for FakeBackend {
    fn search(&self, keyword: &str) -> Result<Vec<Hadith>> {
        self.record(&format!("search:{keyword}"));
        Ok(self.hadiths.clone())
    }

    fn generate(&self, request: &GenerateRequest) -> Result<String> {
        self.record(&format!("generate:{}", request.hadith.text));
        if !request.options.custom_prompt.is_empty() {
            self.record(&format!("custom_prompt:{}", request.options.custom_prompt));
        }
        Ok("v1.mp4".to_string())
    }

    fn generate_async(&self, _request: &GenerateRequest) -> Result<String> {
        self.record("generate_async");
        Ok("J1".to_string())
    }

    fn job_status(&self, job_id: &str) -> Result<JobSnapshot> {
        self.record(&format!("job_status:{job_id}"));
        let next = self
            .job_statuses
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front();
        next.ok_or_else(|| StudioError::Offline("script exhausted".to_string()))
    }

    fn cancel_job(&self, job_id: &str) -> Result<()> {
        self.record(&format!("cancel_job:{job_id}"));
        Ok(())
    }

    fn generate_kie_video(&self, _request: &KieVideoRequest) -> Result<String> {
        self.record("generate_kie_video");
        Ok("https://videos.example/kie.mp4".to_string())
    }

    fn generate_prompt(&self, request: &PromptRequest) -> Result<String> {
        self.record(&format!("generate_prompt:{}", request.style));
        Ok(format!("خلفية {} هادئة", request.style))
    }

    fn generate_ai_prompt(&self, request: &AiPromptRequest) -> Result<GeneratedPrompt> {
        self.record(&format!("generate_ai_prompt:{}", request.provider));
        Ok(GeneratedPrompt {
            prompt: format!("مشهد سينمائي: {}", request.description),
            provider: request.provider.clone(),
        })
    }

    fn ai_status(&self) -> Result<BTreeMap<String, bool>> {
        Ok(BTreeMap::new())
    }

    fn stats(&self) -> Result<u64> {
        Ok(0)
    }

    fn download_video(&self, _video: &VideoSource, dst: &Path) -> Result<u64> {
        std::fs::write(dst, b"mp4")?;
        Ok(3)
    }
}

fn open_studio(
    backend: Arc<FakeBackend>,
    poll_interval_ms: u64,
) -> (tempfile::TempDir, Arc<ViewModel>, Studio) {
    let dir = tempfile::tempdir().expect("tempdir");
    let view = Arc::new(ViewModel::new());
    let config = StudioConfig {
        poll_interval_ms,
        ..StudioConfig::default()
    };
    let studio = Studio::with_api(
        AppPaths::new(dir.path().to_path_buf()),
        config,
        backend,
        view.clone(),
    )
    .expect("open studio");
    (dir, view, studio)
}

fn wait_until_idle(studio: &Studio, timeout: Duration) {
    assert!(
        studio.tracker().wait_idle(timeout),
        "job still tracked after {timeout:?}"
    );
}

#[test]
fn search_then_sync_generation_end_to_end() {
    let hadith = Hadith {
        narrator: Some("عبد الله بن مسعود".to_string()),
        source: Some("صحيح البخاري".to_string()),
        grade: Some("صحيح".to_string()),
        ..Hadith::new("إن الصدق يهدي إلى البر")
    };
    let backend = Arc::new(FakeBackend::new(vec![hadith.clone()]));
    let (_dir, view, studio) = open_studio(backend.clone(), 2000);

    let found = studio.search().search("الصدق").expect("search");
    assert_eq!(found.len(), 1);

    let snap = view.snapshot();
    assert!(snap.results_visible);
    let card = &snap.results[0];
    let badge = card.grade.as_ref().expect("grade badge");
    assert_eq!(badge.label, "صحيح");
    assert_eq!(badge.class, GradeClass::Sahih);
    assert!(!card.is_favorite);

    let outcome = studio.generator().generate_result(0).expect("generate");
    let video = VideoSource::Local {
        file_name: "v1.mp4".to_string(),
    };
    assert_eq!(outcome, GenerationOutcome::Ready(video.clone()));

    let snap = view.snapshot();
    let preview = snap.preview.expect("preview");
    assert_eq!(preview.video, video);
    assert_eq!(preview.url, "/api/preview/v1.mp4");
    assert!(!snap.results_visible);

    let history = studio.store().generation_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].hadith, hadith);
    assert_eq!(
        backend.requests(),
        vec![
            "search:الصدق".to_string(),
            "generate:إن الصدق يهدي إلى البر".to_string()
        ]
    );
    assert_eq!(studio.store().search_history()[0].keyword, "الصدق");
}

#[test]
fn async_generation_is_tracked_to_completion() {
    let backend = Arc::new(FakeBackend::new(vec![Hadith::new("الحياء من الإيمان")]));
    backend
        .job_statuses
        .lock()
        .unwrap_or_else(|p| p.into_inner())
        .extend([
            job("queued", 0.0, None),
            job("processing", 45.0, None),
            job("completed", 100.0, Some("videos/abc.mp4")),
            job("completed", 100.0, Some("videos/abc.mp4")),
        ]);
    let (_dir, view, studio) = open_studio(backend.clone(), 50);

    studio.search().search("الحياء").expect("search");
    studio.set_async_mode(true);
    let outcome = studio.generator().generate_result(0).expect("generate");
    assert_eq!(
        outcome,
        GenerationOutcome::Tracking {
            job_id: "J1".to_string()
        }
    );

    wait_until_idle(&studio, Duration::from_secs(10));

    let polls = backend
        .requests()
        .iter()
        .filter(|r| r.starts_with("job_status:"))
        .count();
    assert_eq!(polls, 3);

    let snap = view.snapshot();
    assert_eq!(
        snap.preview.expect("preview").url,
        "/api/preview/abc.mp4"
    );
    assert!(!snap.progress_visible);
    assert_eq!(studio.store().generation_history().len(), 1);

    let log = std::fs::read_to_string(studio.paths().job_log_path("J1")).expect("job log");
    assert!(log.lines().count() >= 4);
}

#[test]
fn kie_generation_downloads_external_video() {
    let backend = Arc::new(FakeBackend::new(vec![Hadith::new("الكلمة الطيبة صدقة")]));
    let (dir, _view, studio) = open_studio(backend.clone(), 2000);

    studio.search().search("الطيبة").expect("search");
    studio.set_kie_mode(true);
    studio.generator().generate_result(0).expect("generate");

    assert_eq!(
        studio.generator().download_target().as_deref(),
        Some("https://videos.example/kie.mp4")
    );
    let saved = studio
        .generator()
        .download(Some(dir.path().join("saved.mp4")))
        .expect("download");
    assert_eq!(std::fs::read(saved).expect("read"), b"mp4");
    assert!(studio.store().generation_history().is_empty());
}

#[test]
fn favorites_survive_and_feed_generation() {
    let backend = Arc::new(FakeBackend::new(vec![
        Hadith::new("أ"),
        Hadith::new("لا يؤمن أحدكم حتى يحب لأخيه ما يحب لنفسه"),
    ]));
    let (_dir, view, studio) = open_studio(backend, 2000);

    studio.search().search("يؤمن").expect("search");
    assert!(studio.search().toggle_favorite(1).expect("toggle"));
    assert!(view.snapshot().results[1].is_favorite);

    studio.generator().new_video();
    studio.generator().generate_from_favorite(0).expect("generate");
    let history = studio.store().generation_history();
    assert_eq!(history.len(), 1);
    assert_eq!(
        history[0].hadith.text,
        "لا يؤمن أحدكم حتى يحب لأخيه ما يحب لنفسه"
    );

    let exported = studio.export(None).expect("export");
    let raw = std::fs::read_to_string(exported).expect("read export");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(value["favorites"].as_array().map(Vec::len), Some(1));
    assert_eq!(value["generationHistory"].as_array().map(Vec::len), Some(1));
}

#[test]
fn async_outcome_is_ready_as_soon_as_tracking_ends() {
    for run in 0..20 {
        let backend = Arc::new(FakeBackend::new(vec![Hadith::new("الدال على الخير كفاعله")]));
        backend
            .job_statuses
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push_back(job("completed", 100.0, Some("videos/abc.mp4")));
        let (_dir, _view, studio) = open_studio(backend, 1);

        studio.search().search("الخير").expect("search");
        studio.set_async_mode(true);
        studio.generator().generate_result(0).expect("generate");
        wait_until_idle(&studio, Duration::from_secs(10));

        assert_eq!(
            studio.generator().download_target().as_deref(),
            Some("/api/download/abc.mp4"),
            "run {run}"
        );
        assert_eq!(studio.store().generation_history().len(), 1, "run {run}");
    }
}

#[test]
fn prompt_then_generate_then_share() {
    let backend = Arc::new(FakeBackend::new(vec![Hadith::new("الراحمون يرحمهم الرحمن")]));
    let (_dir, _view, studio) = open_studio(backend.clone(), 2000);

    studio.search().search("الرحمة").expect("search");
    let prompt = studio.generator().generate_prompt(Some("nature")).expect("prompt");
    assert_eq!(prompt, "خلفية nature هادئة");

    let generated = studio
        .generator()
        .generate_ai_prompt(None, Some("ollama"))
        .expect("ai prompt");
    assert_eq!(generated.prompt, "مشهد سينمائي: الرحمة");

    studio.generator().generate_result(0).expect("generate");
    let link = studio.generator().share_link().expect("share");
    assert_eq!(link.url, "/api/preview/v1.mp4");
    assert_eq!(link.text, "الراحمون يرحمهم الرحمن...");

    assert_eq!(
        backend.requests(),
        vec![
            "search:الرحمة".to_string(),
            "generate_prompt:nature".to_string(),
            "generate_ai_prompt:ollama".to_string(),
            "generate:الراحمون يرحمهم الرحمن".to_string(),
            "custom_prompt:مشهد سينمائي: الرحمة".to_string(),
        ]
    );
}
