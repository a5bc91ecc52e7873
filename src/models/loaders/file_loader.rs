use crate::error::{AppError, AppResult, FileError};
use crate::models::document::DocumentFile;
use std::path::Path;
use tokio::fs;

/// 从磁盘读取文档，生成可上传的 `DocumentFile`
pub async fn load_document(path: &Path) -> AppResult<DocumentFile> {
    let display = path.display().to_string();

    if !fs::try_exists(path).await.unwrap_or(false) {
        return Err(AppError::File(FileError::NotFound { path: display }));
    }

    let bytes = fs::read(path)
        .await
        .map_err(|e| AppError::file_read_failed(display.clone(), e))?;

    if bytes.is_empty() {
        return Err(AppError::File(FileError::Empty { path: display }));
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| display.clone());

    tracing::info!("已读取文档: {} ({} 字节)", name, bytes.len());

    Ok(DocumentFile::new(name, guess_content_type(path), bytes))
}

/// 按扩展名推断内容类型
pub fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());

    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a/contract.PDF")), "application/pdf");
        assert_eq!(guess_content_type(Path::new("lease.txt")), "text/plain");
        assert_eq!(guess_content_type(Path::new("scan.jpeg")), "image/jpeg");
        assert_eq!(guess_content_type(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_load_document_reads_bytes_and_name() {
        let path = std::env::temp_dir().join(format!("consent_iq_loader_{}.txt", std::process::id()));
        tokio::fs::write(&path, b"Sample contract text").await.unwrap();

        let file = load_document(&path).await.unwrap();
        assert_eq!(file.bytes(), b"Sample contract text");
        assert_eq!(file.content_type, "text/plain");
        assert!(file.name.starts_with("consent_iq_loader_"));

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_load_document_rejects_missing_and_empty_files() {
        let missing = std::env::temp_dir().join("consent_iq_definitely_missing.pdf");
        let err = load_document(&missing).await.unwrap_err();
        assert!(matches!(err, AppError::File(FileError::NotFound { .. })));

        let empty = std::env::temp_dir().join(format!("consent_iq_empty_{}.txt", std::process::id()));
        tokio::fs::write(&empty, b"").await.unwrap();
        let err = load_document(&empty).await.unwrap_err();
        assert!(matches!(err, AppError::File(FileError::Empty { .. })));
        tokio::fs::remove_file(&empty).await.unwrap();
    }
}
