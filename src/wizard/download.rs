use std::path::{Path, PathBuf};

use tokio::fs;

use crate::models::image::extension_for_mime;
use crate::services::encoder::decode_data_url;

use super::WizardError;

pub const FILE_PREFIX: &str = "virtual-try-on";

/// Writes a result data URL to `<dir>/virtual-try-on-<unix millis>.<ext>`.
pub async fn save_result(data_url: &str, dir: &Path) -> Result<PathBuf, WizardError> {
    let (mime_type, bytes) = decode_data_url(data_url)?;
    let file_name = format!(
        "{}-{}.{}",
        FILE_PREFIX,
        chrono::Utc::now().timestamp_millis(),
        extension_for_mime(&mime_type)
    );
    let path = dir.join(file_name);
    fs::write(&path, &bytes).await?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "Saved try-on result");
    Ok(path)
}
