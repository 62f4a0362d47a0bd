//! Dispatches a generation request to the strategy picked by the mode selector.

use crate::api::{
    AiPromptRequest, GenerateRequest, GeneratedPrompt, KieVideoRequest, PromptRequest, StudioApi,
};
use crate::config::{GenerationOptions, StudioConfig};
use crate::db::now_ms;
use crate::lock;
use crate::mode::GenerationMode;
use crate::models::{Hadith, VideoSource};
use crate::notify::ToastKind;
use crate::session::Session;
use crate::store::ClientStore;
use crate::tracker::JobTracker;
use crate::view::StudioView;
use crate::{Result, StudioError};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub const SCENE_TEMPLATES: [&str; 5] = [
    "منظر طبيعي هادئ مع ضوء ذهبي ناعم، أجواء روحانية",
    "مسجد جميل في الغروب، إضاءة دافئة، سكينة وهدوء",
    "حديقة خضراء جميلة مع نافورة، أجواء هادئة",
    "شمس مشرقة عبر الغيوم، أضواء ذهبية لطيفة",
    "بحر هادئ عند الفجر، أمواج ناعمة، سلام داخلي",
];

const MSG_PICK_HADITH: &str = "الرجاء اختيار حديث للتوليد";
const MSG_UNEXPECTED: &str = "حدث خطأ غير متوقع، الرجاء المحاولة مرة أخرى";
const MSG_NO_VIDEO: &str = "لا يوجد فيديو للتحميل";
const MSG_NO_VIDEO_PATH: &str = "فشل في إنشاء الفيديو";
const MSG_NO_VIDEO_TO_SHARE: &str = "لا يوجد فيديو للمشاركة";
const MSG_SEARCH_FIRST: &str = "الرجاء البحث عن حديث أولاً";
const MSG_PROMPT_FAILED: &str = "خطأ في توليد الأمر النصي";
const MSG_AI_PROMPT_FAILED: &str = "خطأ في توليد الأمر النصي بالذكاء الاصطناعي";

const DEFAULT_PROMPT_STYLE: &str = "islamic";
const DEFAULT_PROMPT_PROVIDER: &str = "gemini";
const SHARE_TITLE: &str = "فيديو حديث نبوي";
const SHARE_TEXT_CHARS: usize = 100;

/// What a successful `generate` call left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The video is ready and previewed.
    Ready(VideoSource),
    /// An asynchronous job was accepted and is being tracked.
    Tracking { job_id: String },
}

/// What the share action hands to the platform share sheet or clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub title: String,
    pub text: String,
    pub url: String,
}

/// Scene description for third-party generation. The hadith text does not
/// influence the pick.
pub fn build_scene_prompt<R: Rng + ?Sized>(rng: &mut R, duration_secs: u32) -> String {
    let template = SCENE_TEMPLATES[rng.gen_range(0..SCENE_TEMPLATES.len())];
    format!("{template}, HD جودة عالية, حركة لطيفة, {duration_secs} ثوان")
}

pub struct Orchestrator {
    api: Arc<dyn StudioApi>,
    view: Arc<dyn StudioView>,
    store: Arc<ClientStore>,
    session: Arc<Session>,
    tracker: JobTracker,
    config: StudioConfig,
    options: Mutex<GenerationOptions>,
    rng: Mutex<StdRng>,
}

impl Orchestrator {
    pub fn new(
        api: Arc<dyn StudioApi>,
        view: Arc<dyn StudioView>,
        store: Arc<ClientStore>,
        session: Arc<Session>,
        tracker: JobTracker,
        config: StudioConfig,
    ) -> Self {
        let options = Mutex::new(config.options.clone());
        Self {
            api,
            view,
            store,
            session,
            tracker,
            config,
            options,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Makes scene-prompt selection reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn tracker(&self) -> &JobTracker {
        &self.tracker
    }

    pub fn generate(&self, hadith: Option<&Hadith>) -> Result<GenerationOutcome> {
        let Some(hadith) = hadith.filter(|h| h.has_text()) else {
            self.view.notify(ToastKind::Error, MSG_PICK_HADITH);
            return Err(StudioError::Validation(MSG_PICK_HADITH.to_string()));
        };

        self.session.select_hadith(hadith.clone());
        self.view.hide_results();

        let mode = self.session.mode();
        info!("generating in {} mode", mode.as_str());
        match mode {
            GenerationMode::Sync => self.generate_sync(hadith),
            GenerationMode::Async => self.generate_async(hadith),
            GenerationMode::Kie => self.generate_kie(),
        }
    }

    /// Generates from the n-th hadith of the last search.
    pub fn generate_result(&self, index: usize) -> Result<GenerationOutcome> {
        let hadith = self.session.result_at(index);
        self.generate(hadith.as_ref())
    }

    pub fn generate_from_favorite(&self, index: usize) -> Result<GenerationOutcome> {
        let favorite = self.store.favorite_at(index);
        self.generate(favorite.as_ref().map(|f| &f.hadith))
    }

    fn request(&self, hadith: &Hadith) -> GenerateRequest {
        GenerateRequest {
            hadith: hadith.clone(),
            video_type: self.config.video_type.clone(),
            options: lock(&self.options).clone(),
        }
    }

    /// Background prompt sent with the next generation request.
    pub fn custom_prompt(&self) -> String {
        lock(&self.options).custom_prompt.clone()
    }

    pub fn set_custom_prompt(&self, prompt: &str) {
        lock(&self.options).custom_prompt = prompt.trim().to_string();
    }

    /// Asks the server for a template prompt describing the selected hadith
    /// (or the last search keyword) and keeps it for the next generation.
    pub fn generate_prompt(&self, style: Option<&str>) -> Result<String> {
        let hadith_text = self.prompt_source()?;
        let request = PromptRequest {
            hadith_text,
            style: self.prompt_style(style),
        };
        match self.api.generate_prompt(&request) {
            Ok(prompt) => {
                self.set_custom_prompt(&prompt);
                self.view.show_success("تم توليد الأمر النصي بنجاح");
                Ok(prompt)
            }
            Err(e) => Err(self.prompt_failed(MSG_PROMPT_FAILED, e)),
        }
    }

    /// Same as [`Orchestrator::generate_prompt`], written by an AI provider.
    pub fn generate_ai_prompt(
        &self,
        style: Option<&str>,
        provider: Option<&str>,
    ) -> Result<GeneratedPrompt> {
        let description = self.prompt_source()?;
        let provider = provider
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PROMPT_PROVIDER);
        let request = AiPromptRequest {
            description,
            style: self.prompt_style(style),
            provider: provider.to_string(),
        };

        self.view.show_loading("جاري توليد الأمر النصي...");
        let result = self.api.generate_ai_prompt(&request);
        self.view.hide_loading();
        match result {
            Ok(generated) => {
                self.set_custom_prompt(&generated.prompt);
                self.view.show_success(&format!(
                    "تم توليد الأمر بنجاح باستخدام {}",
                    generated.provider
                ));
                Ok(generated)
            }
            Err(e) => Err(self.prompt_failed(MSG_AI_PROMPT_FAILED, e)),
        }
    }

    fn prompt_source(&self) -> Result<String> {
        let text = self
            .session
            .selected_hadith()
            .filter(|h| h.has_text())
            .map(|h| h.text)
            .or_else(|| self.session.last_keyword());
        text.ok_or_else(|| {
            self.view.show_error(MSG_SEARCH_FIRST);
            StudioError::Validation(MSG_SEARCH_FIRST.to_string())
        })
    }

    fn prompt_style(&self, style: Option<&str>) -> String {
        style
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| self.config.video_type.clone())
            .unwrap_or_else(|| DEFAULT_PROMPT_STYLE.to_string())
    }

    /// Server refusals carry their own message; anything else gets `generic`.
    fn prompt_failed(&self, generic: &str, e: StudioError) -> StudioError {
        warn!("prompt generation failed: {e}");
        match &e {
            StudioError::Server { message, .. } => self.view.show_error(message),
            _ => self.view.show_error(generic),
        }
        e
    }

    fn generate_sync(&self, hadith: &Hadith) -> Result<GenerationOutcome> {
        self.view.show_loading("جاري توليد الفيديو...");
        let generated = self.api.generate(&self.request(hadith)).and_then(|path| {
            VideoSource::from_server_path(&path).ok_or_else(|| StudioError::Server {
                status: 200,
                message: MSG_NO_VIDEO_PATH.to_string(),
            })
        });
        let video = match generated {
            Ok(v) => v,
            Err(e) => return Err(self.fail("خطأ في التوليد", e)),
        };

        self.view.hide_loading();
        self.present(&video);
        self.view.notify(ToastKind::Success, "تم إنشاء الفيديو بنجاح");
        if let Err(e) = self.store.append_generation(hadith, &video) {
            warn!("failed to record generation: {e}");
            self.view.notify(ToastKind::Error, MSG_UNEXPECTED);
        }
        Ok(GenerationOutcome::Ready(video))
    }

    fn generate_async(&self, hadith: &Hadith) -> Result<GenerationOutcome> {
        self.view.show_loading("بدء التوليد غير المتزامن...");
        let job_id = match self.api.generate_async(&self.request(hadith)) {
            Ok(id) => id,
            Err(e) => return Err(self.fail("خطأ في التوليد غير المتزامن", e)),
        };

        self.view.hide_loading();
        self.view.show_progress();
        if let Err(e) = self.tracker.start(&job_id) {
            return Err(self.fail("خطأ في التوليد غير المتزامن", e));
        }
        self.view.notify(ToastKind::Success, "تم بدء توليد الفيديو بنجاح");
        Ok(GenerationOutcome::Tracking { job_id })
    }

    fn generate_kie(&self) -> Result<GenerationOutcome> {
        self.view.show_progress();
        self.view.update_progress(10, "بدء توليد فيديو KIE AI...");

        let duration = self.config.kie_duration_secs;
        let prompt = build_scene_prompt(&mut *lock(&self.rng), duration);
        let request = KieVideoRequest { prompt, duration };
        let url = match self.api.generate_kie_video(&request) {
            Ok(url) => url,
            Err(e) => return Err(self.fail("خطأ KIE", e)),
        };

        self.view.update_progress(100, "تم توليد الفيديو بنجاح!");
        self.view.hide_progress();
        let video = VideoSource::External { url };
        self.present(&video);
        self.view.notify(ToastKind::Success, "تم توليد فيديو KIE بنجاح!");
        Ok(GenerationOutcome::Ready(video))
    }

    fn present(&self, video: &VideoSource) {
        self.session.set_active_video(video.clone());
        let url = self.api.preview_url(video);
        self.view.show_preview(video, &url);
    }

    /// Clears indicators, shows the error and hands it back to the caller.
    fn fail(&self, prefix: &str, e: StudioError) -> StudioError {
        warn!("{prefix}: {e}");
        self.view.hide_loading();
        self.view.hide_progress();
        let message = if e.is_remote() {
            format!("{prefix}: {}", e.user_message())
        } else {
            MSG_UNEXPECTED.to_string()
        };
        self.view.show_error(&message);
        e
    }

    /// URL a browser would open to download the active video.
    pub fn download_target(&self) -> Option<String> {
        self.session
            .active_video()
            .map(|v| self.api.download_url(&v))
    }

    /// Saves the active video to `dst`, or under the downloads folder.
    pub fn download(&self, dst: Option<PathBuf>) -> Result<PathBuf> {
        let Some(video) = self.session.active_video() else {
            self.view.notify(ToastKind::Error, MSG_NO_VIDEO);
            return Err(StudioError::Validation(MSG_NO_VIDEO.to_string()));
        };
        let path = match dst {
            Some(p) if p.is_dir() => p.join(download_file_name(&video)),
            Some(p) => p,
            None => self
                .store
                .paths()
                .downloads_dir()
                .join(download_file_name(&video)),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        match self.api.download_video(&video, &path) {
            Ok(bytes) => {
                info!("downloaded {bytes} bytes to {}", path.display());
                self.view.notify(ToastKind::Success, "تم تحميل الفيديو");
                Ok(path)
            }
            Err(e) => {
                self.view.notify(ToastKind::Error, &e.user_message());
                Err(e)
            }
        }
    }

    /// Link and blurb for sharing the active video.
    pub fn share_link(&self) -> Result<ShareLink> {
        let Some(video) = self.session.active_video() else {
            self.view.notify(ToastKind::Error, MSG_NO_VIDEO_TO_SHARE);
            return Err(StudioError::Validation(MSG_NO_VIDEO_TO_SHARE.to_string()));
        };
        let text = match self.session.selected_hadith().filter(|h| h.has_text()) {
            Some(h) => format!(
                "{}...",
                h.text.chars().take(SHARE_TEXT_CHARS).collect::<String>()
            ),
            None => SHARE_TITLE.to_string(),
        };
        Ok(ShareLink {
            title: SHARE_TITLE.to_string(),
            text,
            url: self.api.preview_url(&video),
        })
    }

    /// Back to a blank slate: no selection, no results, no video.
    pub fn new_video(&self) {
        self.session.reset();
        self.view.hide_results();
        self.view.hide_progress();
        self.view.hide_preview();
    }
}

fn download_file_name(video: &VideoSource) -> String {
    let from_url = match video {
        VideoSource::Local { file_name } => Some(file_name.clone()),
        VideoSource::External { url } => url::Url::parse(url).ok().and_then(|u| {
            let last = u
                .path_segments()
                .and_then(|mut s| s.next_back())
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            last
        }),
    };
    from_url.unwrap_or_else(|| format!("hadith-video-{}.mp4", now_ms()))
}
