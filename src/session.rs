use crate::lock;
use crate::mode::{GenerationMode, ModeNotice, ModeSelector};
use crate::models::{Hadith, VideoSource};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct SessionState {
    modes: ModeSelector,
    results: Vec<Hadith>,
    selected: Option<Hadith>,
    keyword: Option<String>,
    video: Option<VideoSource>,
}

/// Per-user working state: mode toggles, last results, selected hadith and active video.
#[derive(Debug, Default)]
pub struct Session {
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> GenerationMode {
        lock(&self.state).modes.mode()
    }

    pub fn set_async_mode(&self, enabled: bool) -> ModeNotice {
        lock(&self.state).modes.set_async(enabled)
    }

    pub fn set_kie_mode(&self, enabled: bool) -> ModeNotice {
        lock(&self.state).modes.set_kie(enabled)
    }

    pub fn select_mode(&self, mode: GenerationMode) -> Option<ModeNotice> {
        lock(&self.state).modes.select(mode)
    }

    pub fn results(&self) -> Vec<Hadith> {
        lock(&self.state).results.clone()
    }

    pub fn result_at(&self, index: usize) -> Option<Hadith> {
        lock(&self.state).results.get(index).cloned()
    }

    pub fn set_results(&self, results: Vec<Hadith>) {
        lock(&self.state).results = results;
    }

    pub fn selected_hadith(&self) -> Option<Hadith> {
        lock(&self.state).selected.clone()
    }

    pub fn select_hadith(&self, hadith: Hadith) {
        lock(&self.state).selected = Some(hadith);
    }

    /// The last keyword that passed validation.
    pub fn last_keyword(&self) -> Option<String> {
        lock(&self.state).keyword.clone()
    }

    pub fn set_last_keyword(&self, keyword: &str) {
        lock(&self.state).keyword = Some(keyword.to_string());
    }

    pub fn active_video(&self) -> Option<VideoSource> {
        lock(&self.state).video.clone()
    }

    pub fn set_active_video(&self, video: VideoSource) {
        lock(&self.state).video = Some(video);
    }

    /// Drops results, selection, keyword and active video. Mode toggles survive.
    pub fn reset(&self) {
        let mut state = lock(&self.state);
        state.results.clear();
        state.selected = None;
        state.keyword = None;
        state.video = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_keeps_mode_toggles() {
        let session = Session::new();
        session.set_async_mode(true);
        session.set_results(vec![Hadith::new("a")]);
        session.select_hadith(Hadith::new("a"));
        session.set_last_keyword("الصبر");
        session.set_active_video(VideoSource::Local {
            file_name: "v.mp4".to_string(),
        });

        session.reset();
        assert!(session.results().is_empty());
        assert!(session.selected_hadith().is_none());
        assert!(session.last_keyword().is_none());
        assert!(session.active_video().is_none());
        assert_eq!(session.mode(), GenerationMode::Async);
    }
}
