use std::path::PathBuf;

use parkwatch_schedule::ScheduleError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Persistence error on {}: {message}", path.display())]
    Persistence { path: PathBuf, message: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

impl CoreError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Persistence {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
