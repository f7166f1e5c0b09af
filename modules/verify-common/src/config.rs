use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, VerifyError};

const PLACEHOLDER_VALUES: &[&str] = &[
    "your_api_key_here",
    "your_token_here",
    "your_tavily_api_key_here",
];

const DEFAULT_AUDIO_MODELS: &[&str] = &[
    "ehcalabres/wav2vec2-lg-xlsr-en-speech-emotion-recognition",
    "superb/wav2vec2-base-superb-er",
    "facebook/wav2vec2-base-960h",
];

const DEV_JWT_SECRET: &str = "verify-dev-secret";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,

    // Web server
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,

    // Hugging Face
    pub huggingface_token: Option<String>,
    pub hf_inference_url: Option<String>,
    pub hf_hub_url: Option<String>,
    pub text_model: String,
    pub sentiment_model: String,
    pub image_model: String,
    pub audio_models: Vec<String>,
    pub hf_timeout: Duration,

    // Fact checking
    pub tavily_api_key: Option<String>,
    pub tavily_timeout: Duration,

    // WhatsApp relay
    pub whatsapp_phone_number_id: Option<String>,
    pub whatsapp_access_token: Option<String>,
    pub whatsapp_verify_token: String,

    // Auth
    pub jwt_secret: String,

    // Media
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
    pub media_temp_dir: PathBuf,
    pub max_video_bytes: usize,
    pub max_audio_bytes: usize,
    pub max_text_length: usize,

    // Heuristics
    pub rules_path: Option<PathBuf>,
}

/// Which keys are missing, split by whether startup can proceed without them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub missing_required: Vec<&'static str>,
    pub missing_optional: Vec<&'static str>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.missing_required.is_empty()
    }
}

impl Config {
    /// Load configuration from the process environment (after `.env`).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Fails in production when required
    /// keys are missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let secret = |key: &str| get(key).filter(|v| !PLACEHOLDER_VALUES.contains(&v.as_str()));

        let environment = match get("ENVIRONMENT").as_deref() {
            None | Some("development") => Environment::Development,
            Some("production") => Environment::Production,
            Some(other) => {
                return Err(VerifyError::Config(format!(
                    "ENVIRONMENT must be development or production, got {other}"
                )))
            }
        };

        let jwt_secret = secret("JWT_SECRET");

        let config = Self {
            environment,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(get("PORT"), "PORT", 8000)?,
            cors_origins: get("CORS_ORIGINS")
                .unwrap_or_else(|| {
                    "http://localhost:3000,http://localhost:5173,http://localhost:5174".to_string()
                })
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            huggingface_token: secret("HUGGINGFACE_TOKEN"),
            hf_inference_url: get("HF_INFERENCE_URL"),
            hf_hub_url: get("HF_HUB_URL"),
            text_model: get("HF_TEXT_MODEL")
                .unwrap_or_else(|| "hamzab/roberta-fake-news-classification".to_string()),
            sentiment_model: get("HF_SENTIMENT_MODEL").unwrap_or_else(|| {
                "distilbert/distilbert-base-uncased-finetuned-sst-2-english".to_string()
            }),
            image_model: get("HF_IMAGE_MODEL").unwrap_or_else(|| "microsoft/resnet-50".to_string()),
            audio_models: get("HF_AUDIO_MODELS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| DEFAULT_AUDIO_MODELS.iter().map(|s| s.to_string()).collect()),
            hf_timeout: Duration::from_secs(parse_or(get("HF_TIMEOUT_SECS"), "HF_TIMEOUT_SECS", 60)?),
            tavily_api_key: secret("TAVILY_API_KEY"),
            tavily_timeout: Duration::from_secs(parse_or(
                get("TAVILY_TIMEOUT_SECS"),
                "TAVILY_TIMEOUT_SECS",
                10,
            )?),
            whatsapp_phone_number_id: secret("WHATSAPP_PHONE_NUMBER_ID"),
            whatsapp_access_token: secret("WHATSAPP_ACCESS_TOKEN"),
            whatsapp_verify_token: get("WHATSAPP_VERIFY_TOKEN")
                .unwrap_or_else(|| "verify_ai_webhook_token".to_string()),
            jwt_secret: jwt_secret.clone().unwrap_or_else(|| DEV_JWT_SECRET.to_string()),
            ffmpeg_bin: get("FFMPEG_BIN").unwrap_or_else(|| "ffmpeg".to_string()),
            ffprobe_bin: get("FFPROBE_BIN").unwrap_or_else(|| "ffprobe".to_string()),
            media_temp_dir: get("MEDIA_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            max_video_bytes: parse_or::<usize>(get("MAX_VIDEO_MB"), "MAX_VIDEO_MB", 100)? * 1024 * 1024,
            max_audio_bytes: parse_or::<usize>(get("MAX_AUDIO_MB"), "MAX_AUDIO_MB", 20)? * 1024 * 1024,
            max_text_length: parse_or(get("MAX_TEXT_LENGTH"), "MAX_TEXT_LENGTH", 50_000)?,
            rules_path: get("VERIFY_RULES_PATH").map(PathBuf::from),
        };

        let mut report = config.validate();
        if jwt_secret.is_none() {
            if environment == Environment::Production {
                report.missing_required.push("JWT_SECRET");
            } else {
                report.missing_optional.push("JWT_SECRET");
            }
        }

        for key in &report.missing_optional {
            tracing::warn!("{key} not configured - some features may be limited");
        }
        if !report.is_valid() {
            return Err(VerifyError::Config(format!(
                "Cannot start in production with missing required variables: {}",
                report.missing_required.join(", ")
            )));
        }

        Ok(config)
    }

    /// Check which integrations are configured. Keys required in production
    /// are only reported as required there.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        let required = [
            ("TAVILY_API_KEY", self.tavily_api_key.is_some()),
            ("HUGGINGFACE_TOKEN", self.huggingface_token.is_some()),
        ];
        for (key, present) in required {
            if !present {
                if self.environment == Environment::Production {
                    report.missing_required.push(key);
                } else {
                    report.missing_optional.push(key);
                }
            }
        }

        if self.whatsapp_phone_number_id.is_none() {
            report.missing_optional.push("WHATSAPP_PHONE_NUMBER_ID");
        }
        if self.whatsapp_access_token.is_none() {
            report.missing_optional.push("WHATSAPP_ACCESS_TOKEN");
        }

        report
    }

    /// Log which keys are set, showing only a short preview of each secret.
    pub fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let n = val.char_indices().nth(5).map(|(i, _)| i).unwrap_or(val.len());
            format!("{}...({} chars)", &val[..n], val.len())
        }
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) => preview(v),
                None => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded ({}):", self.environment);
        tracing::info!("  HUGGINGFACE_TOKEN: {}", preview_opt(&self.huggingface_token));
        tracing::info!("  TAVILY_API_KEY: {}", preview_opt(&self.tavily_api_key));
        tracing::info!("  WHATSAPP_ACCESS_TOKEN: {}", preview_opt(&self.whatsapp_access_token));
        tracing::info!("  TEXT_MODEL: {}", self.text_model);
        tracing::info!("  IMAGE_MODEL: {}", self.image_model);
        tracing::info!("  AUDIO_MODELS: {}", self.audio_models.join(", "));
        tracing::info!("  MEDIA_TEMP_DIR: {}", self.media_temp_dir.display());
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, key: &str, default: T) -> Result<T> {
    match value {
        Some(v) => v
            .parse()
            .map_err(|_| VerifyError::Config(format!("{key} must be a number, got {v}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn development_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_video_bytes, 100 * 1024 * 1024);
        assert_eq!(config.max_audio_bytes, 20 * 1024 * 1024);
        assert_eq!(config.audio_models.len(), 3);
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
        assert!(config.whatsapp_access_token.is_none());
    }

    #[test]
    fn placeholder_keys_count_as_missing() {
        let config = Config::from_lookup(lookup(&[
            ("TAVILY_API_KEY", "your_tavily_api_key_here"),
            ("HUGGINGFACE_TOKEN", "hf_real"),
        ]))
        .unwrap();
        assert!(config.tavily_api_key.is_none());
        assert_eq!(config.huggingface_token.as_deref(), Some("hf_real"));
        assert!(config.validate().missing_optional.contains(&"TAVILY_API_KEY"));
    }

    #[test]
    fn production_requires_keys() {
        let err = Config::from_lookup(lookup(&[("ENVIRONMENT", "production")])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("TAVILY_API_KEY"));
        assert!(msg.contains("JWT_SECRET"));
    }

    #[test]
    fn production_with_keys_is_valid() {
        let config = Config::from_lookup(lookup(&[
            ("ENVIRONMENT", "production"),
            ("TAVILY_API_KEY", "tvly-abc"),
            ("HUGGINGFACE_TOKEN", "hf_abc"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert!(config.validate().is_valid());
    }

    #[test]
    fn bad_number_is_config_error() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, VerifyError::Config(_)));
    }

    #[test]
    fn list_values_are_split_and_trimmed() {
        let config = Config::from_lookup(lookup(&[
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("HF_AUDIO_MODELS", "org/one , org/two"),
        ]))
        .unwrap();
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.audio_models, vec!["org/one", "org/two"]);
    }
}
