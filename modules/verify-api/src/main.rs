use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use verify_api::jwt::JwtService;
use verify_api::{build_router, AppState};
use verify_common::{Config, VerdictRules};
use verify_detection::{Detector, DetectorSettings, ModelRegistry};
use whatsapp::{WhatsAppOptions, WhatsAppService};

/// `RUST_LOG` wins; otherwise `LOG_LEVEL`, defaulting to info.
fn init_tracing() -> Result<()> {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.to_lowercase()))
        .context("Invalid LOG_LEVEL")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn whatsapp_service(config: &Config) -> Result<Option<WhatsAppService>> {
    match (&config.whatsapp_phone_number_id, &config.whatsapp_access_token) {
        (Some(phone_number_id), Some(access_token)) => {
            let service = WhatsAppService::new(WhatsAppOptions {
                phone_number_id: phone_number_id.clone(),
                access_token: access_token.clone(),
            })?;
            info!("WhatsApp relay enabled");
            Ok(Some(service))
        }
        _ => {
            warn!("WhatsApp credentials not set, relay replies disabled");
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let config = Config::from_env()?;
    config.log_keys();

    let rules = match &config.rules_path {
        Some(path) => {
            info!(path = %path.display(), "Loading verdict rules");
            VerdictRules::load(path)?
        }
        None => VerdictRules::default(),
    };

    let registry = ModelRegistry::load(&config).await?;
    let detector = Detector::new(registry, rules, DetectorSettings::from_config(&config));
    let jwt = JwtService::new(&config.jwt_secret, "verify".to_string());

    let state = Arc::new(
        AppState::new(detector, jwt)
            .with_whatsapp(whatsapp_service(&config)?, &config.whatsapp_verify_token),
    );

    let app = build_router(state, &config.cors_origins);

    let addr = format!("{}:{}", config.host, config.port);
    info!("VeriFy API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
