//! Photo evidence validation.
//!
//! Every check-in carries a photo. The validator is the only way to obtain a
//! [`ValidEvidence`], and the record store only accepts [`ValidEvidence`], so
//! an unvalidated upload can never end up referenced by a record.

use bytes::Bytes;
use serde::Serialize;
use strum::IntoStaticStr;
use thiserror::Error;

/// 5 MiB.
pub const DEFAULT_MAX_EVIDENCE_BYTES: usize = 5 * 1024 * 1024;

// ─── Formats ─────────────────────────────────────────────────────────────────

/// The image formats accepted as evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
  Jpeg,
  Png,
}

impl ImageFormat {
  /// Resolve a declared media type. Matching ignores case and parameters;
  /// `image/jpg` is accepted as a common non-standard alias.
  pub fn from_media_type(media_type: &str) -> Option<Self> {
    let essence = media_type
      .split(';')
      .next()
      .unwrap_or_default()
      .trim()
      .to_ascii_lowercase();
    match essence.as_str() {
      "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
      "image/png" => Some(Self::Png),
      _ => None,
    }
  }

  /// Canonical media type, used when serving the evidence back.
  pub fn media_type(&self) -> &'static str {
    match self {
      Self::Jpeg => "image/jpeg",
      Self::Png => "image/png",
    }
  }

  pub fn extension(&self) -> &'static str {
    match self {
      Self::Jpeg => "jpg",
      Self::Png => "png",
    }
  }
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// An uploaded file as received from the caller, not yet trusted.
#[derive(Debug, Clone)]
pub struct Evidence {
  /// The media type declared by the client (e.g. the multipart part's
  /// `Content-Type`).
  pub media_type: String,
  pub file_name:  Option<String>,
  pub bytes:      Bytes,
}

impl Evidence {
  pub fn new(media_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
    Self {
      media_type: media_type.into(),
      file_name:  None,
      bytes:      bytes.into(),
    }
  }
}

/// Why a piece of evidence was refused. Each message is meant for the person
/// submitting the photo.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EvidenceRejection {
  #[error("please select a photo first")]
  Missing,
  #[error("please select a valid image file (JPEG, JPG, or PNG)")]
  UnsupportedFormat,
  #[error("photo exceeds the maximum upload size")]
  TooLarge,
}

impl EvidenceRejection {
  /// Stable machine-readable code, e.g. `"too_large"`.
  pub fn code(&self) -> &'static str { self.into() }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// Evidence that passed [`EvidencePolicy::validate`].
#[derive(Debug, Clone)]
pub struct ValidEvidence {
  format:    ImageFormat,
  file_name: Option<String>,
  bytes:     Bytes,
}

impl ValidEvidence {
  pub fn format(&self) -> ImageFormat { self.format }

  pub fn file_name(&self) -> Option<&str> { self.file_name.as_deref() }

  pub fn bytes(&self) -> &Bytes { &self.bytes }
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Format and size policy for uploaded evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvidencePolicy {
  max_bytes: usize,
}

impl Default for EvidencePolicy {
  fn default() -> Self { Self { max_bytes: DEFAULT_MAX_EVIDENCE_BYTES } }
}

impl EvidencePolicy {
  pub fn new(max_bytes: usize) -> Self { Self { max_bytes } }

  /// Checks presence, then declared format, then size (inclusive limit).
  pub fn validate(
    &self,
    evidence: Option<Evidence>,
  ) -> Result<ValidEvidence, EvidenceRejection> {
    let evidence = match evidence {
      Some(e) if !e.bytes.is_empty() => e,
      _ => return Err(EvidenceRejection::Missing),
    };

    let format = ImageFormat::from_media_type(&evidence.media_type)
      .ok_or(EvidenceRejection::UnsupportedFormat)?;

    if evidence.bytes.len() > self.max_bytes {
      return Err(EvidenceRejection::TooLarge);
    }

    Ok(ValidEvidence {
      format,
      file_name: evidence.file_name,
      bytes: evidence.bytes,
    })
  }
}
