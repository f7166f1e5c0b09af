pub mod auth;
pub mod check;
pub mod health;
pub mod trending;

use axum::extract::Multipart;

use verify_common::{Modality, VerifyError};

use crate::error::ApiError;

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "file";

/// Pull the `file` field out of a multipart body. With a cap, reading stops
/// as soon as the running total passes it.
pub async fn read_upload(
    multipart: &mut Multipart,
    cap: Option<(Modality, usize)>,
) -> Result<Vec<u8>, ApiError> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            if let Some((modality, max_bytes)) = cap {
                if bytes.len() + chunk.len() > max_bytes {
                    return Err(VerifyError::too_large(modality, max_bytes).into());
                }
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(bytes);
    }

    Err(ApiError::Unprocessable(
        "Missing multipart field: file".to_string(),
    ))
}
