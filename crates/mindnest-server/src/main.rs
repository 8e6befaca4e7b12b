use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use mindnest_api::ai::AiConfig;
use mindnest_api::error::expose_error_details;
use mindnest_api::mail::Mailer;
use mindnest_api::oauth::GoogleConfig;
use mindnest_api::{AppStateInner, router};

/// Placeholder JWT secrets that MUST NOT be used in production.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mindnest=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let production = env("MINDNEST_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production"));
    let jwt_secret = env("MINDNEST_JWT_SECRET").unwrap_or_else(|| "dev-secret-change-me".into());
    if production && PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
        eprintln!("FATAL: MINDNEST_JWT_SECRET is unset or still a placeholder.");
        eprintln!("       Set it in your .env file and restart.");
        std::process::exit(1);
    }
    if !production && PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
        warn!("Using the development JWT secret; set MINDNEST_JWT_SECRET before deploying");
    }

    let db_path = env("MINDNEST_DB_PATH").unwrap_or_else(|| "mindnest.db".into());
    let host = env("MINDNEST_HOST").unwrap_or_else(|| "0.0.0.0".into());
    let port: u16 = env("MINDNEST_PORT").unwrap_or_else(|| "3000".into()).parse()?;
    let base_url = env("MINDNEST_BASE_URL").unwrap_or_else(|| format!("http://localhost:{port}"));

    expose_error_details(!production);

    // Init database
    let db = mindnest_db::Database::open(&PathBuf::from(&db_path))?;
    if let Some(email) = env("MINDNEST_ADMIN_EMAIL") {
        let email = email.trim().to_lowercase();
        if db.promote_to_admin(&email)? {
            info!("Granted admin rights to {}", email);
        } else {
            warn!("MINDNEST_ADMIN_EMAIL {} does not match any account yet", email);
        }
    }

    let mailer = match (
        env("MINDNEST_SMTP_HOST"),
        env("MINDNEST_SMTP_USER"),
        env("MINDNEST_SMTP_PASS"),
    ) {
        (Some(host), Some(user), Some(pass)) => {
            let from = env("MINDNEST_MAIL_FROM").unwrap_or_else(|| user.clone());
            info!("Sending mail through {}", host);
            Mailer::smtp(&host, &user, &pass, &from)?
        }
        _ => {
            warn!("SMTP is not configured; outgoing mail is written to the log");
            Mailer::Log
        }
    };

    let google = match (
        env("MINDNEST_GOOGLE_CLIENT_ID"),
        env("MINDNEST_GOOGLE_CLIENT_SECRET"),
    ) {
        (Some(client_id), Some(client_secret)) => Some(GoogleConfig::new(
            client_id,
            client_secret,
            env("MINDNEST_GOOGLE_REDIRECT_URL")
                .unwrap_or_else(|| format!("{}/api/auth/google/callback", base_url.trim_end_matches('/'))),
        )),
        _ => None,
    };

    let ai = env("MINDNEST_OPENAI_API_KEY").map(|api_key| AiConfig {
        api_key,
        model: env("MINDNEST_OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.into()),
        base_url: env("MINDNEST_OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.into()),
    });
    if ai.is_none() {
        warn!("MINDNEST_OPENAI_API_KEY is not set; AI conversations will fail");
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    // Shared state
    let state = Arc::new(AppStateInner {
        db,
        jwt_secret,
        production,
        base_url,
        mailer,
        http,
        google,
        ai,
    });

    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("MindNest server listening on {} ({})", addr, if production { "production" } else { "development" });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Non-empty environment variable.
fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
