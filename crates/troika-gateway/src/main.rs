//! Troika Gateway Server
//!
//! Standalone server binary embedding the troika-rs engine natively: the
//! handler bridge is a Rust value rather than a cross-language callback,
//! which makes this binary both a demonstration of embedding and a
//! self-contained smoke target for the full pipeline.

use std::sync::Arc;

use log::{error, info};
use serde_json::json;
use tokio::signal;

use troika_rs::logs::logger::configure_logger;
use troika_rs::models::method::Method;
use troika_rs::models::response::RenderedResponse;
use troika_rs::server::Server;
use troika_rs::services::bridge::{BridgeError, Handler};
use troika_rs::services::engine::Engine;

/// Native handler: echoes the dispatch inputs back as JSON.
struct EchoHandler;

impl Handler for EchoHandler {
    fn call(
        &self,
        method: Method,
        path: &str,
        params_json: &str,
    ) -> Result<Vec<u8>, BridgeError> {
        let params: serde_json::Value = serde_json::from_str(params_json)
            .map_err(|e| BridgeError::HandlerFailed(e.to_string()))?;
        let envelope = json!({
            "body": json!({
                "method": method.as_str(),
                "path": path,
                "params": params,
            })
            .to_string(),
            "status": 200,
            "headers": {"Content-Type": "application/json"},
        });
        Ok(envelope.to_string().into_bytes())
    }
}

fn register_demo_routes(engine: &Engine) {
    let registrations = [
        engine.register_static(
            Method::Get,
            "/ping",
            RenderedResponse::new(200, "text/plain", b"pong".to_vec()),
        ),
        engine.register_dynamic(Method::Get, "/users/{id}", "echo_user", 60),
        engine.register_dynamic(Method::Get, "/echo/{a}/{b}", "echo_pair", 0),
    ];
    for result in registrations {
        if let Err(err) = result {
            error!("route registration failed: {}", err);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize the logger
    configure_logger();

    info!(
        "Starting troika-gateway v{}",
        env!("CARGO_PKG_VERSION")
    );

    let engine = Arc::new(Engine::new());

    let builtin_count = engine.install_builtin_routes();
    register_demo_routes(&engine);
    if let Err(err) = engine.install_handler(Box::new(EchoHandler)) {
        error!("handler installation failed: {}", err);
        std::process::exit(1);
    }

    info!(
        "Routes ready: {} static ({} built-in), {} dynamic",
        engine.routes().static_len(),
        builtin_count,
        engine.routes().dynamic_len()
    );

    // Get server configuration from environment
    let host = std::env::var("TROIKA_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("TROIKA_PORT")
        .unwrap_or_else(|_| "5900".to_string())
        .parse::<u16>()
        .unwrap_or(5900);

    let server = Server::bind(engine.clone(), &host, port).await?;
    info!("Server started successfully");

    // Graceful shutdown handling
    tokio::select! {
        result = server.serve() => {
            match result {
                Ok(_) => info!("Server stopped gracefully"),
                Err(e) => error!("Server error: {}", e),
            }
        }
        _ = signal::ctrl_c() => {
            info!("Received shutdown signal, stopping server...");
            let stats = engine.stats();
            info!(
                "Final stats: {} requests ({} static, {} cached, {} dynamic, {} not found)",
                stats.total_requests,
                stats.static_hits,
                stats.cached_hits,
                stats.dynamic_hits,
                stats.not_found
            );
        }
    }

    Ok(())
}
