//! The capabilities the engine needs from a front end, plus a headless implementation.

use crate::cards::HadithCard;
use crate::lock;
use crate::models::VideoSource;
use crate::notify::{Toast, ToastBoard, ToastKind};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const INLINE_ERROR_TTL: Duration = Duration::from_millis(5000);
const INLINE_SUCCESS_TTL: Duration = Duration::from_millis(3000);

/// Rendering surface driven by the search controller, orchestrator and tracker.
///
/// Implementations must be thread-safe: the job tracker calls into the view
/// from its polling thread.
pub trait StudioView: Send + Sync {
    fn notify(&self, kind: ToastKind, message: &str);

    /// Inline error banner.
    fn show_error(&self, message: &str);

    /// Inline success banner.
    fn show_success(&self, message: &str);

    fn show_loading(&self, text: &str);
    fn hide_loading(&self);

    fn show_results(&self, cards: &[HadithCard]);
    fn hide_results(&self);

    fn show_progress(&self);
    fn update_progress(&self, percent: u8, message: &str);
    fn hide_progress(&self);
    fn set_cancel_visible(&self, visible: bool);

    fn show_preview(&self, video: &VideoSource, preview_url: &str);
    fn hide_preview(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMessage {
    pub is_error: bool,
    pub text: String,
    pub shown_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewState {
    pub video: VideoSource,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub loading: Option<String>,
    pub results_visible: bool,
    pub results: Vec<HadithCard>,
    pub progress_visible: bool,
    pub progress_percent: u8,
    pub progress_message: String,
    /// Every progress update in arrival order.
    pub progress_log: Vec<(u8, String)>,
    pub cancel_visible: bool,
    pub preview: Option<PreviewState>,
    pub inline: Option<InlineMessage>,
    pub errors: Vec<String>,
}

/// Headless view that records state instead of drawing it.
#[derive(Debug, Default)]
pub struct ViewModel {
    state: Mutex<ViewSnapshot>,
    toasts: ToastBoard,
}

impl ViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        lock(&self.state).clone()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.history()
    }

    pub fn visible_toasts(&self) -> Vec<Toast> {
        self.toasts.visible()
    }

    pub fn dismiss_toast(&self, id: u64) -> bool {
        self.toasts.dismiss(id)
    }

    /// The inline banner if it has not timed out yet.
    pub fn inline_message(&self) -> Option<InlineMessage> {
        let state = lock(&self.state);
        let message = state.inline.clone()?;
        let ttl = if message.is_error {
            INLINE_ERROR_TTL
        } else {
            INLINE_SUCCESS_TTL
        };
        if message.shown_at.elapsed() >= ttl {
            return None;
        }
        Some(message)
    }

    fn set_inline(&self, is_error: bool, text: &str) {
        let mut state = lock(&self.state);
        if is_error {
            state.errors.push(text.to_string());
        }
        state.inline = Some(InlineMessage {
            is_error,
            text: text.to_string(),
            shown_at: Instant::now(),
        });
    }
}

impl StudioView for ViewModel {
    fn notify(&self, kind: ToastKind, message: &str) {
        self.toasts.push(kind, message);
    }

    fn show_error(&self, message: &str) {
        self.set_inline(true, message);
    }

    fn show_success(&self, message: &str) {
        self.set_inline(false, message);
    }

    fn show_loading(&self, text: &str) {
        lock(&self.state).loading = Some(text.to_string());
    }

    fn hide_loading(&self) {
        lock(&self.state).loading = None;
    }

    fn show_results(&self, cards: &[HadithCard]) {
        let mut state = lock(&self.state);
        state.results = cards.to_vec();
        state.results_visible = true;
    }

    fn hide_results(&self) {
        lock(&self.state).results_visible = false;
    }

    fn show_progress(&self) {
        lock(&self.state).progress_visible = true;
    }

    fn update_progress(&self, percent: u8, message: &str) {
        let mut state = lock(&self.state);
        state.progress_percent = percent;
        state.progress_message = message.to_string();
        state.progress_log.push((percent, message.to_string()));
    }

    fn hide_progress(&self) {
        let mut state = lock(&self.state);
        state.progress_visible = false;
        state.cancel_visible = false;
    }

    fn set_cancel_visible(&self, visible: bool) {
        lock(&self.state).cancel_visible = visible;
    }

    fn show_preview(&self, video: &VideoSource, preview_url: &str) {
        let mut state = lock(&self.state);
        state.preview = Some(PreviewState {
            video: video.clone(),
            url: preview_url.to_string(),
        });
    }

    fn hide_preview(&self) {
        lock(&self.state).preview = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hide_progress_also_hides_cancel_control() {
        let view = ViewModel::new();
        view.show_progress();
        view.set_cancel_visible(true);
        view.update_progress(40, "processing");
        view.hide_progress();

        let snapshot = view.snapshot();
        assert!(!snapshot.progress_visible);
        assert!(!snapshot.cancel_visible);
        assert_eq!(snapshot.progress_log, vec![(40, "processing".to_string())]);
    }

    #[test]
    fn inline_banner_keeps_error_history() {
        let view = ViewModel::new();
        view.show_error("first");
        view.show_success("ok");
        let snapshot = view.snapshot();
        assert_eq!(snapshot.errors, vec!["first".to_string()]);
        let inline = view.inline_message().expect("inline");
        assert!(!inline.is_error);
        assert_eq!(inline.text, "ok");
    }
}
