//! Validation and de-duplication of the files selected for analysis.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::constants::{MAX_PDF_SIZE, PDF_MIME_TYPE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub path: PathBuf,
}

impl StagedFile {
    pub fn new(
        name: impl Into<String>,
        size: u64,
        mime_type: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
            path: path.into(),
        }
    }

    /// Build an entry from a file on disk. The MIME type is derived from the
    /// extension, matching what a browser file picker reports.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            mime_type: mime_type_for(path).to_string(),
            name,
            size: metadata.len(),
            path: path.to_path_buf(),
        })
    }

    fn same_identity(&self, other: &StagedFile) -> bool {
        self.name == other.name && self.size == other.size
    }
}

pub fn mime_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => PDF_MIME_TYPE,
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    NotPdf { name: String, mime_type: String },
    TooLarge { name: String, size: u64 },
    Unreadable { name: String, message: String },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::NotPdf { name, mime_type } => {
                write!(f, "\"{name}\" is not a PDF ({mime_type}) and will be ignored")
            }
            RejectionReason::TooLarge { name, size } => write!(
                f,
                "\"{name}\" is too large ({}, maximum: {}) and will be ignored",
                format_file_size(*size),
                format_file_size(MAX_PDF_SIZE)
            ),
            RejectionReason::Unreadable { name, message } => {
                write!(f, "\"{name}\" could not be read: {message}")
            }
        }
    }
}

impl std::error::Error for RejectionReason {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Added,
    AlreadyStaged,
}

/// Ordered selection of files waiting to be submitted.
#[derive(Debug, Clone, Default)]
pub struct Staging {
    files: Vec<StagedFile>,
}

impl Staging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, file: StagedFile) -> Result<StageOutcome, RejectionReason> {
        if file.mime_type != PDF_MIME_TYPE {
            return Err(RejectionReason::NotPdf {
                name: file.name,
                mime_type: file.mime_type,
            });
        }
        if file.size > MAX_PDF_SIZE {
            return Err(RejectionReason::TooLarge {
                name: file.name,
                size: file.size,
            });
        }
        if self.files.iter().any(|staged| staged.same_identity(&file)) {
            debug!(name = %file.name, size = file.size, "file already staged");
            return Ok(StageOutcome::AlreadyStaged);
        }
        self.files.push(file);
        Ok(StageOutcome::Added)
    }

    /// Stage every file, collecting rejections instead of stopping at the first.
    pub fn stage_all<I>(&mut self, files: I) -> Vec<RejectionReason>
    where
        I: IntoIterator<Item = StagedFile>,
    {
        files
            .into_iter()
            .filter_map(|file| self.stage(file).err())
            .collect()
    }

    pub fn remove(&mut self, index: usize) -> Option<StagedFile> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn is_dispatch_enabled(&self) -> bool {
        !self.files.is_empty()
    }
}

pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{} KB", (bytes as f64 / 1024.0).round() as u64)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
