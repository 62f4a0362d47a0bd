use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("request timed out")]
    Timeout,

    #[error("backend unreachable: {0}")]
    Offline(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("server error (status={status}): {message}")]
    Server { status: u16, message: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl StudioError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            StudioError::Validation(message) => message.clone(),
            StudioError::Timeout => "انتهت مهلة الطلب. الرجاء المحاولة مرة أخرى.".to_string(),
            StudioError::Offline(_) => {
                "لا يوجد اتصال بالخادم. تحقق من اتصالك وحاول مرة أخرى.".to_string()
            }
            StudioError::Http(detail) => detail.clone(),
            StudioError::Server { message, .. } => message.clone(),
            StudioError::Database(_)
            | StudioError::Json(_)
            | StudioError::Io(_)
            | StudioError::Url(_) => "حدث خطأ غير متوقع، الرجاء المحاولة مرة أخرى".to_string(),
        }
    }

    /// Errors coming from the backend or the network, as opposed to local failures.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            StudioError::Timeout
                | StudioError::Offline(_)
                | StudioError::Http(_)
                | StudioError::Server { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;
