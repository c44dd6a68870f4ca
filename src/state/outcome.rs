/// Asset kinds and download outcomes
///
/// This module defines what a discovered link points at and every way a
/// single download attempt can end.
use std::fmt;
use std::path::PathBuf;

/// What a candidate link points at, inferred from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// A document (PDF by default)
    Document,
    /// An archive or other binary bundle (ZIP by default)
    Archive,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Archive => "archive",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of every soft failure the pipeline can absorb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    // ===== Page-level =====
    /// Page could not be rendered within its timeout
    RenderFailure,

    /// Markup could not be structurally scanned
    ParseFailure,

    // ===== Link-level =====
    /// Reference failed normalization or URI validation
    AddressInvalid,

    // ===== Download-level =====
    /// Connection-level failure or timeout during download
    NetworkFailure,

    /// Server answered with a status other than 200
    StatusFailure,

    /// Declared content type is not on the allow-list
    ContentTypeMismatch,

    /// Declared content encoding could not be decoded
    DecompressionFailure,

    /// Server answered 200 with an empty body
    ZeroByteBody,

    /// Destination file could not be created or written
    FilesystemFailure,
}

impl FailureKind {
    /// All failure kinds, in pipeline order
    pub const ALL: [FailureKind; 9] = [
        Self::RenderFailure,
        Self::ParseFailure,
        Self::AddressInvalid,
        Self::NetworkFailure,
        Self::StatusFailure,
        Self::ContentTypeMismatch,
        Self::DecompressionFailure,
        Self::ZeroByteBody,
        Self::FilesystemFailure,
    ];

    /// Stable snake_case name used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RenderFailure => "render_failure",
            Self::ParseFailure => "parse_failure",
            Self::AddressInvalid => "address_invalid",
            Self::NetworkFailure => "network_failure",
            Self::StatusFailure => "status_failure",
            Self::ContentTypeMismatch => "content_type_mismatch",
            Self::DecompressionFailure => "decompression_failure",
            Self::ZeroByteBody => "zero_byte_body",
            Self::FilesystemFailure => "filesystem_failure",
        }
    }

    /// Returns true if the failure happened while downloading an asset
    pub fn is_download_failure(&self) -> bool {
        !matches!(
            self,
            Self::RenderFailure | Self::ParseFailure | Self::AddressInvalid
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single download attempt
#[derive(Debug)]
pub enum DownloadOutcome {
    /// Body passed every gate and was written in full
    Downloaded {
        /// Number of bytes written (after decompression)
        bytes: u64,
        /// Destination file
        path: PathBuf,
    },

    /// Destination already existed; no request was made
    AlreadyPresent {
        /// Existing destination file
        path: PathBuf,
    },

    /// Connection refused, DNS failure, timeout or body read error
    NetworkFailure {
        /// Error description
        error: String,
    },

    /// Non-200 status
    StatusFailure {
        /// The HTTP status code
        status_code: u16,
    },

    /// Content-Type outside the allow-list for the asset kind
    ContentTypeMismatch {
        /// The declared Content-Type (empty when missing)
        content_type: String,
    },

    /// Body could not be decoded per its Content-Encoding
    DecompressionFailure {
        /// The declared Content-Encoding
        encoding: String,
        /// Error description
        error: String,
    },

    /// Successful response without payload
    ZeroByteBody,

    /// Destination could not be created or written
    FilesystemFailure {
        /// Destination that was being written
        path: PathBuf,
        /// Error description
        error: String,
    },
}

impl DownloadOutcome {
    /// Returns the failure classification, if this attempt failed
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Downloaded { .. } | Self::AlreadyPresent { .. } => None,
            Self::NetworkFailure { .. } => Some(FailureKind::NetworkFailure),
            Self::StatusFailure { .. } => Some(FailureKind::StatusFailure),
            Self::ContentTypeMismatch { .. } => Some(FailureKind::ContentTypeMismatch),
            Self::DecompressionFailure { .. } => Some(FailureKind::DecompressionFailure),
            Self::ZeroByteBody => Some(FailureKind::ZeroByteBody),
            Self::FilesystemFailure { .. } => Some(FailureKind::FilesystemFailure),
        }
    }
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Downloaded { bytes, path } => {
                write!(f, "downloaded {} bytes to {}", bytes, path.display())
            }
            Self::AlreadyPresent { path } => write!(f, "already present at {}", path.display()),
            Self::NetworkFailure { error } => write!(f, "network failure: {}", error),
            Self::StatusFailure { status_code } => write!(f, "HTTP status {}", status_code),
            Self::ContentTypeMismatch { content_type } => {
                write!(f, "content type '{}' not allowed", content_type)
            }
            Self::DecompressionFailure { encoding, error } => {
                write!(f, "failed to decode {} body: {}", encoding, error)
            }
            Self::ZeroByteBody => f.write_str("empty body"),
            Self::FilesystemFailure { path, error } => {
                write!(f, "failed to write {}: {}", path.display(), error)
            }
        }
    }
}
