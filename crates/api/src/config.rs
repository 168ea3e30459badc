use std::path::PathBuf;
use std::time::Duration;

use clipstudio_cloud::{CloudinaryConfig, DelegateEndpoints};
use clipstudio_core::ffmpeg::EncoderConfig;

use crate::auth::jwt::JwtConfig;

/// Default request body limit for uploads (1 GiB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

/// Host serving the ML endpoints when no per-operation URL is configured.
const DEFAULT_ML_BASE: &str = "http://localhost:8000";

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// Request body limit applied to every route (default: 1 GiB).
    pub max_upload_bytes: usize,
    /// Minimum accepted password length at signup (default: `8`).
    pub password_min_length: usize,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Object store credentials.
    pub cloudinary: CloudinaryConfig,
    /// One URL per ML operation.
    pub delegates: DelegateEndpoints,
    /// Local export pipeline settings.
    pub export: ExportConfig,
}

/// Settings for the local encoder pipeline.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub encoder: EncoderConfig,
    /// Root under which per-request `export-<uuid>` directories are created.
    pub tmp_dir: PathBuf,
    /// Delay between the end of a response body and workspace removal.
    pub cleanup_grace: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                            |
    /// |---------------------------|------------------------------------|
    /// | `HOST`                    | `0.0.0.0`                          |
    /// | `PORT`                    | `3000`                             |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`            |
    /// | `MAX_UPLOAD_BYTES`        | `1073741824`                       |
    /// | `PASSWORD_MIN_LENGTH`     | `8`                                |
    /// | `CLOUDINARY_UPLOAD_URL`   | `https://api.cloudinary.com/v1_1`  |
    /// | `ML_*_URL`                | `http://localhost:8000/<path>`     |
    /// | `FFMPEG_PATH`             | `ffmpeg`                           |
    /// | `ENCODER_TIMEOUT_SECS`    | `300`                              |
    /// | `EXPORT_TMP_DIR`          | OS temp dir                        |
    /// | `EXPORT_CLEANUP_GRACE_MS` | `1000`                             |
    ///
    /// # Panics
    ///
    /// Panics if a required variable (`JWT_SECRET`, `CLOUDINARY_*`
    /// credentials) is missing or a numeric variable does not parse.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_BYTES.to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let password_min_length: usize = std::env::var("PASSWORD_MIN_LENGTH")
            .unwrap_or_else(|_| "8".into())
            .parse()
            .expect("PASSWORD_MIN_LENGTH must be a valid usize");

        let cloudinary = CloudinaryConfig {
            cloud_name: required("CLOUDINARY_CLOUD_NAME"),
            api_key: required("CLOUDINARY_API_KEY"),
            api_secret: required("CLOUDINARY_API_SECRET"),
            upload_url: std::env::var("CLOUDINARY_UPLOAD_URL")
                .unwrap_or_else(|_| "https://api.cloudinary.com/v1_1".into()),
        };

        let defaults = DelegateEndpoints::with_base(DEFAULT_ML_BASE);
        let delegates = DelegateEndpoints {
            auto_removal: env_or("ML_AUTO_REMOVAL_URL", defaults.auto_removal),
            click_removal: env_or("ML_CLICK_REMOVAL_URL", defaults.click_removal),
            denoise: env_or("ML_DENOISE_URL", defaults.denoise),
            stylize: env_or("ML_STYLIZE_URL", defaults.stylize),
            superres: env_or("ML_SUPERRES_URL", defaults.superres),
            bgchange: env_or("ML_BGCHANGE_URL", defaults.bgchange),
            gif_generation: env_or("ML_GIF_URL", defaults.gif_generation),
        };

        let encoder_timeout_secs: u64 = std::env::var("ENCODER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("ENCODER_TIMEOUT_SECS must be a valid u64");

        let cleanup_grace_ms: u64 = std::env::var("EXPORT_CLEANUP_GRACE_MS")
            .unwrap_or_else(|_| "1000".into())
            .parse()
            .expect("EXPORT_CLEANUP_GRACE_MS must be a valid u64");

        let export = ExportConfig {
            encoder: EncoderConfig {
                program: std::env::var("FFMPEG_PATH")
                    .unwrap_or_else(|_| "ffmpeg".into())
                    .into(),
                timeout: Duration::from_secs(encoder_timeout_secs),
            },
            tmp_dir: std::env::var("EXPORT_TMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            cleanup_grace: Duration::from_millis(cleanup_grace_ms),
        };

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            max_upload_bytes,
            password_min_length,
            jwt,
            cloudinary,
            delegates,
            export,
        }
    }
}

fn required(name: &str) -> String {
    let value = std::env::var(name).unwrap_or_else(|_| panic!("{name} must be set"));
    assert!(!value.is_empty(), "{name} must not be empty");
    value
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}
