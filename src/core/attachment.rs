//! Turning files into attachment records.
//!
//! Textual files are read as text, images are embedded as `data:` URLs so they
//! can be redisplayed without the original file, and everything else gets a
//! placeholder naming the file. Files over [`MAX_ATTACHMENT_SIZE`] are rejected,
//! whether by their declared size or by what is actually on disk.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::future::join_all;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

use crate::core::state::{Attachment, is_textual_type, new_id};

/// Largest accepted file, in bytes (10 MiB).
pub const MAX_ATTACHMENT_SIZE: u64 = 10 * 1024 * 1024;

/// Type assumed when nothing better is known.
const FALLBACK_TYPE: &str = "application/octet-stream";

/// A file the user picked, before it is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInput {
    /// Where the content lives.
    pub path: PathBuf,

    /// Display name.
    pub name: String,

    /// Size in bytes.
    pub size: u64,

    /// Declared MIME-like type.
    pub mime_type: String,
}

impl FileInput {
    /// Describe a file on disk, inferring its type from the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file's metadata cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self {
            path: path.to_path_buf(),
            mime_type: mime_type_for(path).to_string(),
            name,
            size: metadata.len(),
        })
    }
}

/// Guess a MIME type from a file extension.
#[must_use]
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "xml" => "text/xml",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => FALLBACK_TYPE,
    }
}

/// Why a file did not become an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Over [`MAX_ATTACHMENT_SIZE`].
    TooLarge {
        /// Actual size in bytes.
        size: u64,
    },
    /// The content could not be read.
    Unreadable(String),
}

/// A file that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Display name of the file.
    pub name: String,

    /// Why it was skipped.
    pub reason: RejectReason,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            RejectReason::TooLarge { size } => write!(
                f,
                "File {} is too large ({}). Maximum size: {}",
                self.name,
                format_file_size(*size),
                format_file_size(MAX_ATTACHMENT_SIZE)
            ),
            RejectReason::Unreadable(e) => write!(f, "File {} could not be read: {e}", self.name),
        }
    }
}

/// Result of reading a batch of files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentBatch {
    /// Accepted files, in input order.
    pub attachments: Vec<Attachment>,

    /// Skipped files, in input order.
    pub rejected: Vec<Rejection>,
}

/// Read every file and classify it.
///
/// Files are read concurrently; the batch is returned once all of them are
/// done. Rejections are logged and reported, never raised.
pub async fn read_attachments(files: Vec<FileInput>) -> AttachmentBatch {
    let results = join_all(files.into_iter().map(read_one)).await;

    let mut batch = AttachmentBatch::default();
    for result in results {
        match result {
            Ok(attachment) => batch.attachments.push(attachment),
            Err(rejection) => {
                tracing::warn!(file = %rejection.name, "{rejection}");
                batch.rejected.push(rejection);
            }
        }
    }
    batch
}

async fn read_one(file: FileInput) -> Result<Attachment, Rejection> {
    if file.size > MAX_ATTACHMENT_SIZE {
        return Err(too_large(file.name, file.size));
    }

    let (content, size) = if is_textual_type(&file.mime_type) {
        let bytes = read_bytes(&file).await?;
        let size = bytes.len() as u64;
        (String::from_utf8_lossy(&bytes).into_owned(), size)
    } else if file.mime_type.starts_with("image/") {
        let bytes = read_bytes(&file).await?;
        let size = bytes.len() as u64;
        let url = format!("data:{};base64,{}", file.mime_type, STANDARD.encode(bytes));
        (url, size)
    } else {
        (format!("[File {} - {}]", file.name, file.mime_type), file.size)
    };

    Ok(Attachment {
        id: new_id(),
        name: file.name,
        size,
        mime_type: file.mime_type,
        content,
    })
}

fn too_large(name: String, size: u64) -> Rejection {
    Rejection {
        name,
        reason: RejectReason::TooLarge { size },
    }
}

/// Read at most one byte past the cap, so a file that grew after it was
/// described is still caught.
async fn read_bytes(file: &FileInput) -> Result<Vec<u8>, Rejection> {
    let unreadable = |e: std::io::Error| Rejection {
        name: file.name.clone(),
        reason: RejectReason::Unreadable(e.to_string()),
    };

    let handle = tokio::fs::File::open(&file.path).await.map_err(unreadable)?;
    let mut bytes = Vec::new();
    handle
        .take(MAX_ATTACHMENT_SIZE + 1)
        .read_to_end(&mut bytes)
        .await
        .map_err(unreadable)?;

    if bytes.len() as u64 > MAX_ATTACHMENT_SIZE {
        let size = match tokio::fs::metadata(&file.path).await {
            Ok(metadata) => metadata.len(),
            Err(_) => bytes.len() as u64,
        };
        return Err(too_large(file.name.clone(), size));
    }
    Ok(bytes)
}

/// Attachments picked for the next message but not yet sent.
#[derive(Debug, Clone, Default)]
pub struct PendingAttachments {
    items: Vec<Attachment>,
}

impl PendingAttachments {
    /// Create an empty pending set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append newly read attachments after the ones already picked.
    pub fn add(&mut self, attachments: impl IntoIterator<Item = Attachment>) {
        self.items.extend(attachments);
    }

    /// Drop an attachment by id. Returns it if it was pending.
    pub fn remove(&mut self, id: &str) -> Option<Attachment> {
        let index = self.items.iter().position(|a| a.id == id)?;
        Some(self.items.remove(index))
    }

    /// Pending attachments in pick order.
    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.items.iter()
    }

    /// Number of pending attachments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Hand every pending attachment over for sending, leaving the set empty.
    pub fn take(&mut self) -> Vec<Attachment> {
        std::mem::take(&mut self.items)
    }
}

/// Human-readable size, e.g. `1.5 KB`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn input(path: PathBuf, name: &str, size: u64, mime_type: &str) -> FileInput {
        FileInput {
            path,
            name: name.to_string(),
            size,
            mime_type: mime_type.to_string(),
        }
    }

    #[tokio::test]
    async fn reads_text_files() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        fs::write(&path, "abc").unwrap();

        let batch = read_attachments(vec![input(path, "notes.txt", 3, "text/plain")]).await;
        assert!(batch.rejected.is_empty());
        assert_eq!(batch.attachments.len(), 1);
        assert_eq!(batch.attachments[0].content, "abc");
        assert_eq!(batch.attachments[0].mime_type, "text/plain");
    }

    #[tokio::test]
    async fn reads_json_as_text() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.json");
        fs::write(&path, r#"{"a":1}"#).unwrap();

        let batch = read_attachments(vec![input(path, "data.json", 7, "application/json")]).await;
        assert_eq!(batch.attachments[0].content, r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn encodes_images_as_data_urls() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pixel.png");
        fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let batch = read_attachments(vec![input(path, "pixel.png", 4, "image/png")]).await;
        assert_eq!(batch.attachments[0].content, "data:image/png;base64,iVBORw==");
    }

    #[tokio::test]
    async fn other_types_get_placeholder_without_reading() {
        // The path does not exist: other types must not be read at all
        let batch = read_attachments(vec![input(
            PathBuf::from("/nonexistent/report.pdf"),
            "report.pdf",
            1000,
            "application/pdf",
        )])
        .await;
        assert!(batch.rejected.is_empty());
        assert_eq!(
            batch.attachments[0].content,
            "[File report.pdf - application/pdf]"
        );
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let batch = read_attachments(vec![input(
            PathBuf::from("/nonexistent/huge.txt"),
            "huge.txt",
            11 * 1024 * 1024,
            "text/plain",
        )])
        .await;
        assert!(batch.attachments.is_empty());
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].name, "huge.txt");
        assert!(batch.rejected[0].to_string().contains("huge.txt"));
    }

    #[tokio::test]
    async fn understated_size_is_checked_against_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("big.txt");
        let actual = 11 * 1024 * 1024;
        fs::write(&path, vec![b'a'; actual]).unwrap();

        let batch = read_attachments(vec![input(path, "big.txt", 3, "text/plain")]).await;
        assert!(batch.attachments.is_empty());
        assert_eq!(
            batch.rejected[0].reason,
            RejectReason::TooLarge {
                size: actual as u64
            }
        );
    }

    #[tokio::test]
    async fn recorded_size_comes_from_bytes_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        fs::write(&path, "abcdef").unwrap();

        let batch = read_attachments(vec![input(path, "notes.txt", 2, "text/plain")]).await;
        assert_eq!(batch.attachments[0].size, 6);
        assert_eq!(batch.attachments[0].content, "abcdef");
    }

    #[tokio::test]
    async fn exactly_max_size_is_accepted() {
        let batch = read_attachments(vec![input(
            PathBuf::from("/nonexistent/big.bin"),
            "big.bin",
            MAX_ATTACHMENT_SIZE,
            "application/octet-stream",
        )])
        .await;
        assert_eq!(batch.attachments.len(), 1);
    }

    #[tokio::test]
    async fn unreadable_file_is_rejected() {
        let batch = read_attachments(vec![input(
            PathBuf::from("/nonexistent/missing.txt"),
            "missing.txt",
            10,
            "text/plain",
        )])
        .await;
        assert!(batch.attachments.is_empty());
        assert!(matches!(
            batch.rejected[0].reason,
            RejectReason::Unreadable(_)
        ));
    }

    #[tokio::test]
    async fn preserves_input_order_and_assigns_unique_ids() {
        let temp = TempDir::new().unwrap();
        let mut files = Vec::new();
        for i in 0..5 {
            let path = temp.path().join(format!("f{i}.txt"));
            fs::write(&path, format!("content {i}")).unwrap();
            files.push(input(path, &format!("f{i}.txt"), 9, "text/plain"));
        }
        files.insert(
            2,
            input(PathBuf::from("/x"), "too-big.txt", MAX_ATTACHMENT_SIZE + 1, "text/plain"),
        );

        let batch = read_attachments(files).await;
        let names: Vec<_> = batch.attachments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["f0.txt", "f1.txt", "f2.txt", "f3.txt", "f4.txt"]);
        assert_eq!(batch.rejected.len(), 1);

        let ids: std::collections::HashSet<_> =
            batch.attachments.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids.len(), 5);
    }

    #[tokio::test]
    async fn from_path_infers_type_and_size() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Notes.TXT");
        fs::write(&path, "hello").unwrap();

        let file = FileInput::from_path(&path).await.unwrap();
        assert_eq!(file.name, "Notes.TXT");
        assert_eq!(file.size, 5);
        assert_eq!(file.mime_type, "text/plain");
    }

    #[tokio::test]
    async fn from_path_missing_file_errors() {
        assert!(FileInput::from_path("/nonexistent/nope.txt").await.is_err());
    }

    #[test]
    fn mime_types_from_extension() {
        assert_eq!(mime_type_for(Path::new("a.json")), "application/json");
        assert_eq!(mime_type_for(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("report.pdf")), "application/pdf");
        assert_eq!(mime_type_for(Path::new("Makefile")), FALLBACK_TYPE);
    }

    #[test]
    fn pending_add_remove_take() {
        let mut pending = PendingAttachments::new();
        let make = |id: &str| Attachment {
            id: id.to_string(),
            name: format!("{id}.txt"),
            size: 1,
            mime_type: "text/plain".to_string(),
            content: "x".to_string(),
        };
        pending.add(vec![make("a"), make("b")]);
        pending.add(vec![make("c")]);
        assert_eq!(pending.len(), 3);

        assert_eq!(pending.remove("b").map(|a| a.id), Some("b".to_string()));
        assert!(pending.remove("b").is_none());

        let ids: Vec<_> = pending.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);

        let taken = pending.take();
        assert_eq!(taken.len(), 2);
        assert!(pending.is_empty());
    }

    #[test]
    fn file_sizes() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(MAX_ATTACHMENT_SIZE), "10 MB");
        assert_eq!(format_file_size(1_234_567), "1.18 MB");
    }
}
