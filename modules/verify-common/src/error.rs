use thiserror::Error;

use crate::types::Modality;

pub type Result<T> = std::result::Result<T, VerifyError>;

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Upload over the modality's size cap. Raised before any model runs.
    #[error("{} file too large. Maximum size: {max_mb}MB", capitalized(.modality))]
    TooLarge { modality: Modality, max_mb: usize },

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl VerifyError {
    pub fn too_large(modality: Modality, max_bytes: usize) -> Self {
        VerifyError::TooLarge {
            modality,
            max_mb: max_bytes / (1024 * 1024),
        }
    }
}

fn capitalized(modality: &Modality) -> &'static str {
    match modality {
        Modality::Text => "Text",
        Modality::Image => "Image",
        Modality::Video => "Video",
        Modality::Audio => "Audio",
    }
}
