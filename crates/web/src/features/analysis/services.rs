use std::path::{Path, PathBuf};

use ingest::extractors::FailureAnalyzer;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{WebError, WebResult};
use crate::state::Settings;

pub const SUPPORTED_FORMATS: [&str; 5] = ["mp4", "avi", "mov", "mkv", "webm"];
pub const MAX_DURATION_SECONDS: u32 = 10;
pub const RECOMMENDED_DURATION_SECONDS: u32 = 4;
pub const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Keeps the last path component with only safe characters.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();

    cleaned.trim_start_matches('.').to_string()
}

pub fn check_format(filename: &str) -> WebResult<()> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if SUPPORTED_FORMATS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(WebError::BadRequest(format!(
            "Unsupported video format, expected one of: {}",
            SUPPORTED_FORMATS.join(", ")
        )))
    }
}

/// Writes the upload under a unique name and returns its path.
pub async fn store_upload(upload_dir: &Path, filename: &str, data: &[u8]) -> WebResult<PathBuf> {
    tokio::fs::create_dir_all(upload_dir).await?;

    let path = upload_dir.join(format!("{}_{}", Uuid::new_v4().simple(), filename));
    tokio::fs::write(&path, data).await?;

    tracing::info!("Stored upload {} ({} bytes)", path.display(), data.len());
    Ok(path)
}

/// Checks the format, stores the upload and analyses it. The scratch
/// directory is removed whatever the outcome.
pub async fn analyze_upload(
    analyzer: &FailureAnalyzer,
    settings: &Settings,
    filename: &str,
    data: &[u8],
    use_gemini: bool,
) -> WebResult<Value> {
    check_format(filename)?;

    let path = store_upload(&settings.upload_dir, filename, data).await?;
    let work_dir = settings.work_dir(&format!("failure_{}", Uuid::new_v4().simple()));

    let result = analyzer.analyze(&path, use_gemini, &work_dir).await;

    if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
        tracing::debug!("Could not remove {}: {}", work_dir.display(), e);
    }

    Ok(result?)
}

pub fn parse_flag(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no" | "off")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\clips\\my point.mp4"), "my_point.mp4");
        assert_eq!(sanitize_filename(".hidden.mov"), "hidden.mov");
    }

    #[test]
    fn test_check_format() {
        assert!(check_format("rally.MP4").is_ok());
        assert!(check_format("rally.webm").is_ok());
        assert!(check_format("notes.txt").is_err());
        assert!(check_format("noext").is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(""));
        assert!(!parse_flag("False"));
        assert!(!parse_flag("0"));
    }

    #[tokio::test]
    async fn test_store_upload_prefixes_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_upload(dir.path(), "point.mp4", b"data").await.unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with("_point.mp4"));
        assert_eq!(std::fs::read(&path).unwrap(), b"data");
    }
}
