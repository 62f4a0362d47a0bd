use crate::lock;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const TOAST_TTL: Duration = Duration::from_millis(4000);
const MAX_TOASTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastKind {
    pub fn icon(self) -> &'static str {
        match self {
            ToastKind::Success => "✅",
            ToastKind::Error => "❌",
            ToastKind::Warning => "⚠️",
            ToastKind::Info => "ℹ️",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Warning => "warning",
            ToastKind::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub shown_at: Instant,
}

impl Toast {
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.shown_at) >= ttl
    }
}

/// Auto-dismissing notification list.
#[derive(Debug)]
pub struct ToastBoard {
    ttl: Duration,
    state: Mutex<BoardState>,
}

#[derive(Debug, Default)]
struct BoardState {
    next_id: u64,
    toasts: VecDeque<Toast>,
}

impl Default for ToastBoard {
    fn default() -> Self {
        Self::new(TOAST_TTL)
    }
}

impl ToastBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(BoardState::default()),
        }
    }

    pub fn push(&self, kind: ToastKind, message: impl Into<String>) -> u64 {
        self.push_at(kind, message, Instant::now())
    }

    pub fn push_at(&self, kind: ToastKind, message: impl Into<String>, now: Instant) -> u64 {
        let mut state = lock(&self.state);
        state.next_id += 1;
        let id = state.next_id;
        state.toasts.push_back(Toast {
            id,
            kind,
            message: message.into(),
            shown_at: now,
        });
        while state.toasts.len() > MAX_TOASTS {
            state.toasts.pop_front();
        }
        id
    }

    /// Manual close, like the toast's close button.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut state = lock(&self.state);
        let before = state.toasts.len();
        state.toasts.retain(|t| t.id != id);
        state.toasts.len() != before
    }

    /// Toasts still on screen at `now`; expired ones are dropped.
    pub fn visible_at(&self, now: Instant) -> Vec<Toast> {
        let mut state = lock(&self.state);
        let ttl = self.ttl;
        state.toasts.retain(|t| !t.is_expired(now, ttl));
        state.toasts.iter().cloned().collect()
    }

    pub fn visible(&self) -> Vec<Toast> {
        self.visible_at(Instant::now())
    }

    /// Every toast pushed and not yet pruned, regardless of expiry.
    pub fn history(&self) -> Vec<Toast> {
        lock(&self.state).toasts.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toasts_expire_after_ttl() {
        let board = ToastBoard::new(Duration::from_millis(4000));
        let start = Instant::now();
        board.push_at(ToastKind::Info, "first", start);
        board.push_at(ToastKind::Error, "second", start + Duration::from_millis(3000));

        let visible = board.visible_at(start + Duration::from_millis(3500));
        assert_eq!(visible.len(), 2);

        let visible = board.visible_at(start + Duration::from_millis(4500));
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].message, "second");
        assert_eq!(visible[0].kind, ToastKind::Error);
    }

    #[test]
    fn dismiss_removes_only_the_target() {
        let board = ToastBoard::default();
        let a = board.push(ToastKind::Success, "a");
        let b = board.push(ToastKind::Warning, "b");
        assert!(board.dismiss(a));
        assert!(!board.dismiss(a));
        let left = board.history();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, b);
    }
}
