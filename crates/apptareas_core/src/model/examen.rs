//! Exam record model.
//!
//! # Responsibility
//! - Define the record persisted by repositories and edited by the detail form.
//! - Validate write-side invariants before persistence.
//!
//! # Invariants
//! - `id` is empty only for drafts; repositories assign it on create.
//! - `color_index` must address an entry of `COLOR_PALETTE`.
//! - `subject` and `description` are non-blank for persisted records.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Repository-assigned record identifier.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ExamenId = String;

/// Fixed ARGB palette addressed by `Examen::color_index`.
pub const COLOR_PALETTE: [u32; 8] = [
    0xFF00_6B7B,
    0xFFFF_AB91,
    0xFFFF_F59D,
    0xFFC5_E1A5,
    0xFF80_DEEA,
    0xFFB3_9DDB,
    0xFFF4_8FB1,
    0xFFCF_D8DC,
];

/// Display pattern for creation timestamps on record cards (`MM-dd-yyyy hh:mm`,
/// 12-hour clock).
pub const CREATED_AT_LABEL_FORMAT: &str = "%m-%d-%Y %I:%M";

/// Write-side validation failures for exam records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamenValidationError {
    BlankSubject,
    BlankDescription,
    ColorIndexOutOfRange { index: usize, palette_len: usize },
}

impl Display for ExamenValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankSubject => write!(f, "subject is required"),
            Self::BlankDescription => write!(f, "description is required"),
            Self::ColorIndexOutOfRange { index, palette_len } => write!(
                f,
                "color index {index} is out of range for a palette of {palette_len} colors"
            ),
        }
    }
}

impl Error for ExamenValidationError {}

/// One exam entry.
///
/// Field names are serialized with the document schema used by the remote
/// store, so payloads exchanged with it stay compatible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Examen {
    /// Empty until the repository persists the record.
    #[serde(rename = "documentId", default)]
    pub id: ExamenId,
    /// Owner account id, assigned by the repository.
    #[serde(rename = "userId", default)]
    pub user_id: String,
    #[serde(rename = "materia")]
    pub subject: String,
    pub description: String,
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "dia")]
    pub day: String,
    #[serde(rename = "hora")]
    pub time: String,
    #[serde(rename = "colorIndex")]
    pub color_index: usize,
    /// Unix epoch milliseconds, assigned by the repository.
    #[serde(rename = "timestamp", default)]
    pub created_at_ms: i64,
}

impl Examen {
    /// Creates an unsaved draft with the given subject and description.
    ///
    /// Date/day/time are left empty and the first palette color is used.
    pub fn draft(subject: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Returns whether the repository has assigned an id to this record.
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    /// Resolves the tag color, falling back to the first palette entry for
    /// indexes that do not address the palette.
    pub fn color(&self) -> u32 {
        COLOR_PALETTE
            .get(self.color_index)
            .copied()
            .unwrap_or(COLOR_PALETTE[0])
    }

    /// Formats `created_at_ms` for record cards in the local time zone.
    ///
    /// Returns `None` for drafts and out-of-range timestamps.
    pub fn created_at_label(&self) -> Option<String> {
        self.created_at_label_in(&Local)
    }

    /// Formats `created_at_ms` in the given time zone.
    pub fn created_at_label_in<Tz>(&self, tz: &Tz) -> Option<String>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        if self.created_at_ms <= 0 {
            return None;
        }
        let utc = DateTime::<Utc>::from_timestamp_millis(self.created_at_ms)?;
        Some(
            utc.with_timezone(tz)
                .format(CREATED_AT_LABEL_FORMAT)
                .to_string(),
        )
    }

    /// Checks the invariants repositories enforce before writing.
    pub fn validate(&self) -> Result<(), ExamenValidationError> {
        if self.subject.trim().is_empty() {
            return Err(ExamenValidationError::BlankSubject);
        }
        if self.description.trim().is_empty() {
            return Err(ExamenValidationError::BlankDescription);
        }
        if self.color_index >= COLOR_PALETTE.len() {
            return Err(ExamenValidationError::ColorIndexOutOfRange {
                index: self.color_index,
                palette_len: COLOR_PALETTE.len(),
            });
        }
        Ok(())
    }
}
