//! Walk a session through bootstrap, login, an eligibility check and logout.
//!
//! ```text
//! SESSIONWARD_API=https://api.example.com \
//! SESSIONWARD_EMAIL=a@example.com SESSIONWARD_PASSWORD=secret \
//! RUST_LOG=sessionward=debug cargo run --example session_walkthrough
//! ```

use sessionward::{HandshakeConfig, LogSink, SessionConfig, SessionManager};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn leak(value: String) -> &'static str {
    Box::leak(value.into_boxed_str())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let api = leak(
        std::env::var("SESSIONWARD_API").unwrap_or_else(|_| "http://localhost:3001".to_string()),
    );
    let config = SessionConfig {
        app_name: "session-walkthrough/0.1.0",
        api_base_url: api,
        product_origin: "sample-scratcher",
        store_namespace: "sessionward-walkthrough",
        default_daily_quota: 5,
        request_timeout: Duration::from_secs(10),
        handshake: HandshakeConfig::new(
            leak(format!("{}/api/auth/google", api)),
            "http://localhost:3000/auth/callback",
            "http://localhost:3000",
        ),
    };

    let manager = SessionManager::new(config, Arc::new(LogSink))?;
    let snapshot = manager.bootstrap().await;
    println!("restored: {} ({})", snapshot.display_name(), snapshot.quota_label());

    if !snapshot.authenticated {
        let email = std::env::var("SESSIONWARD_EMAIL")?;
        let password = std::env::var("SESSIONWARD_PASSWORD")?;
        let outcome = manager.login(&email, &password).await;
        println!("login: {:?}", outcome);
        if !outcome.is_success() {
            return Ok(());
        }
    }

    let eligibility = manager.check_download_eligibility().await;
    println!("eligibility: {:?}", eligibility);
    if eligibility.is_allowed() {
        println!("track: {:?}", manager.track_download("walkthrough").await);
    }

    let snapshot = manager.snapshot().await;
    println!(
        "{} is {:?}: {}",
        snapshot.display_name(),
        snapshot.tier(),
        snapshot.quota_label()
    );

    manager.logout().await;
    Ok(())
}
