//! Timeline clip descriptors received by the export endpoints.
//!
//! The editor keeps its clip list in the browser; the server only sees it
//! when exporting. Only `src` matters for export, the placement fields are
//! accepted so the client can post its timeline items unchanged.

use serde::Deserialize;
use url::Url;

use crate::error::CoreError;

/// One clip as posted by the editor timeline.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportClip {
    /// Client-side identifier; opaque to the server.
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    /// Remote URL of the clip's media.
    pub src: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Length in frames (the editor works at 30 fps).
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub row: Option<f64>,
    /// Frame offset on the timeline.
    #[serde(default)]
    pub start: Option<f64>,
}

/// Validate an export clip list.
///
/// The list must be non-empty, every `src` must be an http(s) URL and every
/// `duration` that is present must be a positive frame count.
pub fn validate_clips(clips: &[ExportClip]) -> Result<(), CoreError> {
    if clips.is_empty() {
        return Err(CoreError::Validation("Invalid clips data".into()));
    }
    for (index, clip) in clips.iter().enumerate() {
        validate_source_url(&clip.src)
            .map_err(|msg| CoreError::Validation(format!("Clip {index}: {msg}")))?;
        if let Some(duration) = clip.duration {
            if duration <= 0.0 {
                return Err(CoreError::Validation(format!(
                    "Clip {index}: duration must be a positive frame count"
                )));
            }
        }
    }
    Ok(())
}

/// Check that `src` is an absolute http or https URL with a host.
pub fn validate_source_url(src: &str) -> Result<(), String> {
    let parsed = Url::parse(src).map_err(|e| format!("source '{src}' is not a valid URL: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => {}
        _ => return Err(format!("source '{src}' must be an http(s) URL")),
    }
    if parsed.host().is_none() {
        return Err(format!("source '{src}' has no host"));
    }
    Ok(())
}
