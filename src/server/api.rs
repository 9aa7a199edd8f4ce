use crate::cli::Args;
use crate::gateway::CompletionGateway;
use crate::models::chat::{ ChatRequest, ChatResponse, HealthResponse };
use super::error::ApiError;
use std::error::Error;
use std::net::SocketAddr;
use axum::{
    routing::{ get, post },
    Router,
    extract::{ State, rejection::JsonRejection },
    Json,
};
use chrono::{ SecondsFormat, Utc };
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, warn };

#[derive(Clone)]
pub struct AppState {
    pub gateway: CompletionGateway,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    gateway: CompletionGateway,
    args: &Args,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = resolve_listen_addr(&args.host, args.port).await?;
    let app = router(AppState { gateway });

    if args.enable_tls {
        let (cert_path, key_path) = match (&args.tls_cert_path, &args.tls_key_path) {
            (Some(cert), Some(key)) => (cert, key),
            _ => {
                return Err("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.".into());
            }
        };
        info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);
        if rustls::crypto::ring::default_provider().install_default().is_err() {
            warn!("A rustls crypto provider was already installed; keeping it");
        }
        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            cert_path,
            key_path
        ).await?;

        info!("Server running on https://{}", addr);
        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await?;
    } else {
        let listener = tokio::net::TcpListener::bind(addr).await
            .map_err(|e| format!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e))?;
        info!("Server running on http://{}", addr);
        axum::serve(listener, app.into_make_service()).await?;
    }

    Ok(())
}

/// Accepts hostnames as well as IP literals; the first resolved address wins.
pub async fn resolve_listen_addr(
    host: &str,
    port: u16,
) -> Result<SocketAddr, Box<dyn Error + Send + Sync>> {
    let mut addrs = tokio::net::lookup_host((host, port)).await
        .map_err(|e| format!("Failed to resolve listen host '{}': {}", host, e))?;
    match addrs.next() {
        Some(addr) => Ok(addr),
        None => Err(format!("Listen host '{}' resolved to no addresses", host).into()),
    }
}

async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload?;
    let response = state.gateway.chat(req).await?;
    Ok(Json(response))
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
