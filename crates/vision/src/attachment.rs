//! Attachment classification by file extension.

use std::fmt;

/// Extensions decoded as still images.
pub const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp"];

/// Extensions decoded as video.
pub const VIDEO_EXTENSIONS: [&str; 8] = ["mp4", "avi", "mov", "webm", "mkv", "flv", "wmv", "m4v"];

/// How an attachment is ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    /// A still image.
    Image,
    /// A PDF document, one image per page.
    Pdf,
    /// A video, sampled to frames.
    Video,
    /// Anything else; skipped.
    Unsupported,
}

impl AttachmentKind {
    /// Classify a file by its lower-cased extension.
    pub fn of(filename: &str) -> Self {
        let Some((_, ext)) = filename.rsplit_once('.') else {
            return Self::Unsupported;
        };
        let ext = ext.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Image
        } else if ext == "pdf" {
            Self::Pdf
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Video
        } else {
            Self::Unsupported
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Image => "image",
            Self::Pdf => "pdf",
            Self::Video => "video",
            Self::Unsupported => "unsupported",
        })
    }
}

/// A successfully ingested attachment, listed under the answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// One image.
    Image {
        /// Attachment file name.
        name: String,
    },
    /// A PDF and the number of usable pages.
    Pdf {
        /// Attachment file name.
        name: String,
        /// Usable pages.
        pages: usize,
    },
    /// A video and the number of usable frames.
    Video {
        /// Attachment file name.
        name: String,
        /// Usable frames.
        frames: usize,
    },
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image { name } => write!(f, "Image: {name}"),
            Self::Pdf { name, pages } => write!(f, "PDF: {name} ({pages} pages)"),
            Self::Video { name, frames } => write!(f, "Video: {name} ({frames} frames)"),
        }
    }
}
