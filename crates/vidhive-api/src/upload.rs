use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use axum::extract::Multipart;
use rand::Rng;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};

/// At most two files per request (media + thumbnail, or avatar + banner).
pub const MAX_FILES_PER_REQUEST: usize = 2;

/// 10 GiB per file.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024 * 1024;

/// Both the file extension and the declared MIME type must contain one of
/// these tokens. `video/quicktime` is rejected even for `.mov` uploads —
/// clients are expected to declare `video/mov`.
const ALLOWED_TYPES: &[&str] = &["jpeg", "jpg", "png", "gif", "mp4", "mov", "avi", "mkv"];

/// Scratch directory for accepted uploads. Permanent storage is someone
/// else's job; responsibility ends at handing a path to the route handler.
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Upload scratch directory: {}", dir.display());
        Ok(Self { dir })
    }

    /// `{field}-{unix_millis}-{random}{ext}` — no collision within a
    /// process run.
    fn scratch_path(&self, field: &str, ext: &str) -> PathBuf {
        let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
        let name = format!(
            "{}-{}-{}{}",
            field,
            chrono::Utc::now().timestamp_millis(),
            suffix,
            ext
        );
        self.dir.join(name)
    }
}

/// A file accepted by the middleware, persisted to scratch storage.
#[derive(Debug)]
pub struct SavedFile {
    pub field: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Text fields plus accepted files from one multipart request.
#[derive(Debug, Default)]
pub struct FormData {
    pub fields: HashMap<String, String>,
    pub files: Vec<SavedFile>,
}

impl FormData {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn file(&self, field: &str) -> Option<&SavedFile> {
        self.files.iter().find(|f| f.field == field)
    }

    pub fn file_path(&self, field: &str) -> Option<String> {
        self.file(field).map(|f| f.path.to_string_lossy().into_owned())
    }

    /// Remove every saved file. Handlers call this when they reject the
    /// request after the middleware accepted it — nothing may remain in
    /// scratch storage for a failed request.
    pub async fn discard(self) {
        for file in &self.files {
            remove_quietly(&file.path).await;
        }
    }
}

/// Drain a multipart request: store file parts to scratch, collect text
/// parts. Any rejection removes every file already written.
pub async fn collect(store: &UploadStore, mut multipart: Multipart) -> ApiResult<FormData> {
    let mut form = FormData::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                discard_partial(&form).await;
                return Err(ApiError::Validation(format!("malformed multipart body: {e}")));
            }
        };

        let name = field.name().unwrap_or("file").to_string();

        let Some(file_name) = field.file_name().map(str::to_string) else {
            // Text part
            let value = match field.text().await {
                Ok(v) => v,
                Err(e) => {
                    discard_partial(&form).await;
                    return Err(ApiError::Validation(format!("unreadable field '{name}': {e}")));
                }
            };
            form.fields.insert(name, value);
            continue;
        };

        if form.files.len() >= MAX_FILES_PER_REQUEST {
            discard_partial(&form).await;
            return Err(ApiError::Validation(format!(
                "at most {MAX_FILES_PER_REQUEST} files per request"
            )));
        }

        let ext = extension_of(&file_name);
        let mime = field.content_type().unwrap_or("").to_ascii_lowercase();
        if !matches_allowlist(&ext) || !matches_allowlist(&mime) {
            discard_partial(&form).await;
            return Err(ApiError::Validation(
                "only video and image files are allowed".to_string(),
            ));
        }

        let path = store.scratch_path(&name, &ext);
        let size = match write_part(field, &path).await {
            Ok(size) => size,
            Err(e) => {
                remove_quietly(&path).await;
                discard_partial(&form).await;
                return Err(e);
            }
        };

        form.files.push(SavedFile {
            field: name,
            path,
            size,
        });
    }

    Ok(form)
}

async fn write_part(
    mut field: axum::extract::multipart::Field<'_>,
    path: &Path,
) -> ApiResult<u64> {
    let mut file = fs::File::create(path)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;

    let mut written: u64 = 0;
    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                return Err(ApiError::Validation(format!("upload interrupted: {e}")));
            }
        };

        written += chunk.len() as u64;
        if written > MAX_FILE_SIZE {
            warn!("Upload to {} exceeded the size limit", path.display());
            return Err(ApiError::Validation(format!(
                "file exceeds the {MAX_FILE_SIZE} byte limit"
            )));
        }

        file.write_all(&chunk)
            .await
            .map_err(|e| ApiError::Internal(e.into()))?;
    }

    file.flush()
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;
    Ok(written)
}

async fn discard_partial(form: &FormData) {
    for file in &form.files {
        remove_quietly(&file.path).await;
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!("Failed to remove scratch file {}: {}", path.display(), e);
    }
}

/// Lowercased extension including the dot, or empty.
fn extension_of(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(idx) => file_name[idx..].to_ascii_lowercase(),
        None => String::new(),
    }
}

fn matches_allowlist(value: &str) -> bool {
    ALLOWED_TYPES.iter().any(|t| value.contains(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowlist_accepts_media_types() {
        for ok in [".mp4", ".mkv", ".jpeg", ".jpg", ".png", ".gif", ".mov", ".avi"] {
            assert!(matches_allowlist(ok), "{ok} should pass");
        }
        for ok in ["video/mp4", "image/png", "image/jpeg", "video/x-matroska-mkv"] {
            assert!(matches_allowlist(ok), "{ok} should pass");
        }
    }

    #[test]
    fn allowlist_rejects_everything_else() {
        for bad in [".txt", ".exe", ".pdf", "", "text/plain", "application/json"] {
            assert!(!matches_allowlist(bad), "{bad} should be rejected");
        }
        // Correct MIME for .mov does not contain an allowed token
        assert!(!matches_allowlist("video/quicktime"));
    }

    #[test]
    fn extension_is_lowercased_with_dot() {
        assert_eq!(extension_of("Clip.MP4"), ".mp4");
        assert_eq!(extension_of("a.b.mkv"), ".mkv");
        assert_eq!(extension_of("noext"), "");
    }

    #[tokio::test]
    async fn scratch_paths_are_distinct_per_call() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf()).await.unwrap();
        let a = store.scratch_path("videoFile", ".mp4");
        let b = store.scratch_path("videoFile", ".mp4");
        assert_ne!(a, b);
        assert!(a.file_name().unwrap().to_str().unwrap().starts_with("videoFile-"));
    }

    #[tokio::test]
    async fn discard_removes_saved_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("videoFile-1-1.mp4");
        tokio::fs::write(&path, b"data").await.unwrap();

        let form = FormData {
            fields: HashMap::new(),
            files: vec![SavedFile {
                field: "videoFile".into(),
                path: path.clone(),
                size: 4,
            }],
        };
        form.discard().await;
        assert!(!path.exists());
    }
}
