//! The session context: one place that owns every collaborator.

use crate::api::{HttpBackend, StudioApi};
use crate::config::StudioConfig;
use crate::generate::Orchestrator;
use crate::mode::{GenerationMode, ModeNotice};
use crate::models::FavoriteEntry;
use crate::notify::ToastKind;
use crate::paths::AppPaths;
use crate::search::SearchController;
use crate::session::Session;
use crate::store::ClientStore;
use crate::tracker::JobTracker;
use crate::view::StudioView;
use crate::Result;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Counters shown in the header. `None` means the backend did not answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counters {
    pub total_videos: Option<u64>,
    pub active_providers: Option<usize>,
}

pub struct Studio {
    paths: AppPaths,
    config: StudioConfig,
    api: Arc<dyn StudioApi>,
    view: Arc<dyn StudioView>,
    store: Arc<ClientStore>,
    session: Arc<Session>,
    search: SearchController,
    orchestrator: Orchestrator,
}

impl Studio {
    /// Opens the store under `paths` and talks to the server named in `config`.
    pub fn open(paths: AppPaths, config: StudioConfig, view: Arc<dyn StudioView>) -> Result<Self> {
        let api: Arc<dyn StudioApi> = Arc::new(HttpBackend::from_config(&config)?);
        Self::with_api(paths, config, api, view)
    }

    pub fn with_api(
        paths: AppPaths,
        config: StudioConfig,
        api: Arc<dyn StudioApi>,
        view: Arc<dyn StudioView>,
    ) -> Result<Self> {
        paths.ensure_dirs()?;
        let store = Arc::new(ClientStore::open(paths.clone())?);
        let session = Arc::new(Session::new());
        let tracker = JobTracker::new(
            api.clone(),
            view.clone(),
            store.clone(),
            session.clone(),
            Duration::from_millis(config.poll_interval_ms.max(1)),
        );
        let search = SearchController::new(api.clone(), view.clone(), store.clone(), session.clone());
        let orchestrator = Orchestrator::new(
            api.clone(),
            view.clone(),
            store.clone(),
            session.clone(),
            tracker,
            config.clone(),
        );
        info!("studio ready at {}", paths.base_dir.display());

        Ok(Self {
            paths,
            config,
            api,
            view,
            store,
            session,
            search,
            orchestrator,
        })
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn store(&self) -> &ClientStore {
        &self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn search(&self) -> &SearchController {
        &self.search
    }

    pub fn generator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn tracker(&self) -> &JobTracker {
        self.orchestrator.tracker()
    }

    pub fn set_async_mode(&self, enabled: bool) -> ModeNotice {
        self.announce(self.session.set_async_mode(enabled))
    }

    pub fn set_kie_mode(&self, enabled: bool) -> ModeNotice {
        self.announce(self.session.set_kie_mode(enabled))
    }

    /// Switches to `mode`. Nothing is announced when it was already active.
    pub fn select_mode(&self, mode: GenerationMode) -> Option<ModeNotice> {
        self.session
            .select_mode(mode)
            .map(|notice| self.announce(notice))
    }

    fn announce(&self, notice: ModeNotice) -> ModeNotice {
        self.view.notify(notice.kind, notice.message);
        notice
    }

    /// Stops the tracked job, if any.
    pub fn cancel_generation(&self) -> Result<bool> {
        self.tracker().cancel()
    }

    /// Video count and number of available AI providers. Failures are logged only.
    pub fn refresh_counters(&self) -> Counters {
        let total_videos = match self.api.stats() {
            Ok(n) => Some(n),
            Err(e) => {
                warn!("stats unavailable: {e}");
                None
            }
        };
        let active_providers = match self.api.ai_status() {
            Ok(status) => Some(status.values().filter(|up| **up).count()),
            Err(e) => {
                warn!("ai status unavailable: {e}");
                None
            }
        };
        Counters {
            total_videos,
            active_providers,
        }
    }

    pub fn set_night_mode(&self, enabled: bool) -> Result<()> {
        self.store.set_night_mode(enabled)?;
        self.announce_night_mode(enabled);
        Ok(())
    }

    pub fn toggle_night_mode(&self) -> Result<bool> {
        let enabled = self.store.toggle_night_mode()?;
        self.announce_night_mode(enabled);
        Ok(enabled)
    }

    fn announce_night_mode(&self, enabled: bool) {
        let message = if enabled {
            "تم تفعيل الوضع الليلي"
        } else {
            "تم تفعيل الوضع النهاري"
        };
        self.view.notify(ToastKind::Info, message);
    }

    pub fn remove_favorite(&self, index: usize) -> Result<Option<FavoriteEntry>> {
        let removed = self.store.remove_favorite(index)?;
        if removed.is_some() {
            self.view.notify(ToastKind::Info, "تم حذف الحديث من المفضلة");
        }
        Ok(removed)
    }

    pub fn export(&self, target: Option<PathBuf>) -> Result<PathBuf> {
        let path = self.store.export_to(target)?;
        self.view.notify(ToastKind::Success, "تم تصدير البيانات بنجاح");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        AiPromptRequest, GenerateRequest, GeneratedPrompt, KieVideoRequest, PromptRequest,
    };
    use crate::models::{Hadith, JobSnapshot, VideoSource};
    use crate::view::ViewModel;
    use crate::StudioError;
    use std::collections::BTreeMap;
    use std::path::Path;

    struct StatusOnly {
        up: bool,
    }

    fn unused<T>() -> Result<T> {
        Err(StudioError::Validation("not scripted".to_string()))
    }

    impl StudioApi for StatusOnly {
        fn search(&self, _keyword: &str) -> Result<Vec<Hadith>> {
            unused()
        }

        fn generate(&self, _request: &GenerateRequest) -> Result<String> {
            unused()
        }

        fn generate_async(&self, _request: &GenerateRequest) -> Result<String> {
            unused()
        }

        fn job_status(&self, _job_id: &str) -> Result<JobSnapshot> {
            unused()
        }

        fn cancel_job(&self, _job_id: &str) -> Result<()> {
            unused()
        }

        fn generate_kie_video(&self, _request: &KieVideoRequest) -> Result<String> {
            unused()
        }

        fn generate_prompt(&self, _request: &PromptRequest) -> Result<String> {
            unused()
        }

        fn generate_ai_prompt(&self, _request: &AiPromptRequest) -> Result<GeneratedPrompt> {
            unused()
        }

        fn ai_status(&self) -> Result<BTreeMap<String, bool>> {
            if !self.up {
                return Err(StudioError::Offline("down".to_string()));
            }
            Ok(BTreeMap::from([
                ("openai".to_string(), true),
                ("gemini".to_string(), false),
                ("elevenlabs".to_string(), true),
            ]))
        }

        fn stats(&self) -> Result<u64> {
            if !self.up {
                return Err(StudioError::Timeout);
            }
            Ok(12)
        }

        fn download_video(&self, _video: &VideoSource, _dst: &Path) -> Result<u64> {
            unused()
        }
    }

    fn studio(up: bool) -> (tempfile::TempDir, Arc<ViewModel>, Studio) {
        let dir = tempfile::tempdir().expect("tempdir");
        let view = Arc::new(ViewModel::new());
        let studio = Studio::with_api(
            AppPaths::new(dir.path().to_path_buf()),
            StudioConfig::default(),
            Arc::new(StatusOnly { up }),
            view.clone(),
        )
        .expect("studio");
        (dir, view, studio)
    }

    #[test]
    fn counters_count_available_providers() {
        let (_dir, _view, studio) = studio(true);
        assert_eq!(
            studio.refresh_counters(),
            Counters {
                total_videos: Some(12),
                active_providers: Some(2),
            }
        );
    }

    #[test]
    fn counter_failures_are_silent() {
        let (_dir, view, studio) = studio(false);
        assert_eq!(studio.refresh_counters(), Counters::default());
        assert!(view.toasts().is_empty());
        assert!(view.snapshot().errors.is_empty());
    }

    #[test]
    fn mode_toggles_are_announced() {
        let (_dir, view, studio) = studio(true);
        studio.set_async_mode(true);
        studio.set_kie_mode(true);
        assert_eq!(studio.session().mode(), GenerationMode::Kie);

        let kinds: Vec<ToastKind> = view.toasts().iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![ToastKind::Info, ToastKind::Success]);
    }

    #[test]
    fn selecting_the_current_mode_is_not_announced() {
        let (_dir, view, studio) = studio(true);
        assert_eq!(studio.select_mode(GenerationMode::Sync), None);
        assert!(view.toasts().is_empty());

        assert!(studio.select_mode(GenerationMode::Async).is_some());
        assert!(studio.select_mode(GenerationMode::Async).is_none());
        assert_eq!(view.toasts().len(), 1);
    }

    #[test]
    fn night_mode_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = AppPaths::new(dir.path().to_path_buf());
        {
            let studio = Studio::with_api(
                paths.clone(),
                StudioConfig::default(),
                Arc::new(StatusOnly { up: true }),
                Arc::new(ViewModel::new()),
            )
            .expect("studio");
            assert!(studio.toggle_night_mode().expect("toggle"));
        }
        let studio = Studio::with_api(
            paths,
            StudioConfig::default(),
            Arc::new(StatusOnly { up: true }),
            Arc::new(ViewModel::new()),
        )
        .expect("studio");
        assert!(studio.store().night_mode());
    }

    #[test]
    fn cancel_with_nothing_tracked_is_quiet() {
        let (_dir, view, studio) = studio(true);
        assert!(!studio.cancel_generation().expect("cancel"));
        assert!(view.toasts().is_empty());
    }
}
