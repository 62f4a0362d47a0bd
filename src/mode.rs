use crate::notify::ToastKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationMode {
    #[default]
    Sync,
    Async,
    Kie,
}

impl GenerationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationMode::Sync => "sync",
            GenerationMode::Async => "async",
            GenerationMode::Kie => "kie",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sync" => Some(GenerationMode::Sync),
            "async" => Some(GenerationMode::Async),
            "kie" => Some(GenerationMode::Kie),
            _ => None,
        }
    }
}

/// Announcement emitted after a toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeNotice {
    pub kind: ToastKind,
    pub message: &'static str,
}

/// Two toggles, at most one on. Both off means synchronous generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeSelector {
    async_enabled: bool,
    kie_enabled: bool,
}

impl ModeSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn async_enabled(&self) -> bool {
        self.async_enabled
    }

    pub fn kie_enabled(&self) -> bool {
        self.kie_enabled
    }

    pub fn mode(&self) -> GenerationMode {
        if self.async_enabled {
            GenerationMode::Async
        } else if self.kie_enabled {
            GenerationMode::Kie
        } else {
            GenerationMode::Sync
        }
    }

    pub fn set_async(&mut self, enabled: bool) -> ModeNotice {
        self.async_enabled = enabled;
        if enabled {
            self.kie_enabled = false;
        }
        ModeNotice {
            kind: ToastKind::Info,
            message: if enabled {
                "تم تفعيل الوضع غير المتزامن"
            } else {
                "تم إيقاف الوضع غير المتزامن"
            },
        }
    }

    pub fn set_kie(&mut self, enabled: bool) -> ModeNotice {
        self.kie_enabled = enabled;
        if enabled {
            self.async_enabled = false;
        }
        if enabled {
            ModeNotice {
                kind: ToastKind::Success,
                message: "تم تفعيل وضع KIE AI",
            }
        } else {
            ModeNotice {
                kind: ToastKind::Info,
                message: "تم إيقاف وضع KIE AI",
            }
        }
    }

    /// Turns on the toggle for `mode` (or both off for sync).
    /// Returns `None` when `mode` is already active.
    pub fn select(&mut self, mode: GenerationMode) -> Option<ModeNotice> {
        if self.mode() == mode {
            return None;
        }
        Some(match mode {
            GenerationMode::Async => self.set_async(true),
            GenerationMode::Kie => self.set_kie(true),
            GenerationMode::Sync if self.kie_enabled => self.set_kie(false),
            GenerationMode::Sync => self.set_async(false),
        })
    }
}
