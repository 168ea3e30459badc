//! Catalogue of the external ML processing operations.
//!
//! Each operation is served by its own independently deployed HTTP endpoint.
//! This module only knows which fields each endpoint expects and how they are
//! transported; the HTTP call itself lives in `clipstudio-cloud`.

use std::fmt;

/// Default `volume` sent to the denoise endpoint when the client omits it.
pub const DEFAULT_DENOISE_VOLUME: &str = "50";

/// The processing operations that are delegated to external services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelegateKind {
    AutoRemoval,
    ClickRemoval,
    Denoise,
    Stylize,
    SuperResolution,
    BackgroundChange,
    GifGeneration,
}

impl DelegateKind {
    pub const ALL: [DelegateKind; 7] = [
        DelegateKind::AutoRemoval,
        DelegateKind::ClickRemoval,
        DelegateKind::Denoise,
        DelegateKind::Stylize,
        DelegateKind::SuperResolution,
        DelegateKind::BackgroundChange,
        DelegateKind::GifGeneration,
    ];

    /// Stable snake_case name used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            DelegateKind::AutoRemoval => "auto_removal",
            DelegateKind::ClickRemoval => "click_removal",
            DelegateKind::Denoise => "denoise",
            DelegateKind::Stylize => "stylize",
            DelegateKind::SuperResolution => "superres",
            DelegateKind::BackgroundChange => "bgchange",
            DelegateKind::GifGeneration => "gif_generation",
        }
    }

    /// How the operation's parameters travel to the endpoint.
    pub fn transport(self) -> Transport {
        match self {
            DelegateKind::BackgroundChange => Transport::Query,
            _ => Transport::Form,
        }
    }
}

impl fmt::Display for DelegateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter transport for a delegate POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// `application/x-www-form-urlencoded` request body.
    Form,
    /// URL query string with an empty body.
    Query,
}

/// A fully resolved request to one delegate endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum DelegateRequest {
    AutoRemoval {
        video_url: String,
    },
    ClickRemoval {
        video_url: String,
        x: String,
        y: String,
        frame: String,
    },
    Denoise {
        video_url: String,
        volume: Option<String>,
        generate_subtitles: bool,
    },
    Stylize {
        video_url: String,
        style: i64,
    },
    SuperResolution {
        video_url: String,
    },
    BackgroundChange {
        video_url: String,
        background: i64,
    },
    GifGeneration {
        prompt: String,
    },
}

impl DelegateRequest {
    pub fn kind(&self) -> DelegateKind {
        match self {
            DelegateRequest::AutoRemoval { .. } => DelegateKind::AutoRemoval,
            DelegateRequest::ClickRemoval { .. } => DelegateKind::ClickRemoval,
            DelegateRequest::Denoise { .. } => DelegateKind::Denoise,
            DelegateRequest::Stylize { .. } => DelegateKind::Stylize,
            DelegateRequest::SuperResolution { .. } => DelegateKind::SuperResolution,
            DelegateRequest::BackgroundChange { .. } => DelegateKind::BackgroundChange,
            DelegateRequest::GifGeneration { .. } => DelegateKind::GifGeneration,
        }
    }

    /// Ordered `(name, value)` pairs sent to the endpoint.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            DelegateRequest::AutoRemoval { video_url }
            | DelegateRequest::SuperResolution { video_url } => {
                vec![("video_url", video_url.clone())]
            }
            DelegateRequest::ClickRemoval {
                video_url,
                x,
                y,
                frame,
            } => vec![
                ("video_url", video_url.clone()),
                ("x", x.clone()),
                ("y", y.clone()),
                ("frame", frame.clone()),
            ],
            DelegateRequest::Denoise {
                video_url,
                volume,
                generate_subtitles,
            } => vec![
                ("video_url", video_url.clone()),
                (
                    "volume",
                    volume
                        .clone()
                        .filter(|v| !v.is_empty())
                        .unwrap_or_else(|| DEFAULT_DENOISE_VOLUME.to_string()),
                ),
                ("gen_sub", generate_subtitles.to_string()),
            ],
            DelegateRequest::Stylize { video_url, style } => vec![
                ("video_url", video_url.clone()),
                ("style_num", style.to_string()),
            ],
            DelegateRequest::BackgroundChange {
                video_url,
                background,
            } => vec![
                ("video_url", video_url.clone()),
                ("bg_number", background.to_string()),
            ],
            // The generator expects the prompt as a JSON string literal.
            DelegateRequest::GifGeneration { prompt } => vec![(
                "prompt",
                serde_json::Value::String(prompt.clone()).to_string(),
            )],
        }
    }

    /// The source media URL, if the operation transforms existing media.
    pub fn source_url(&self) -> Option<&str> {
        match self {
            DelegateRequest::AutoRemoval { video_url }
            | DelegateRequest::ClickRemoval { video_url, .. }
            | DelegateRequest::Denoise { video_url, .. }
            | DelegateRequest::Stylize { video_url, .. }
            | DelegateRequest::SuperResolution { video_url }
            | DelegateRequest::BackgroundChange { video_url, .. } => Some(video_url),
            DelegateRequest::GifGeneration { .. } => None,
        }
    }
}

/// Render a loosely typed JSON parameter as the string a form field carries.
///
/// The editor sends coordinates and levels either as numbers or as numeric
/// strings. `null`, empty strings, arrays and objects yield `None`.
pub fn form_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse a loosely typed JSON parameter as an integer id or index.
///
/// Accepts integers, integral floats and numeric strings (`"3"`, `" 3 "`).
pub fn integer_value(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
