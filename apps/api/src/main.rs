use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::{
    AppointmentContext, BookingService, DispatchConfig, LogNotificationSender, NotificationSender,
    ReminderDispatcher, WebhookNotificationSender,
};
use doctor_cell::InMemoryDoctorCatalog;
use shared_config::AppConfig;
use shared_utils::SystemClock;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic reminders API server");

    let config = AppConfig::from_env();

    let lead_time = chrono::Duration::from_std(config.reminder_lead_time())
        .context("reminder lead time out of range")?;
    let booking = Arc::new(BookingService::new(
        Arc::new(InMemoryDoctorCatalog::seeded()),
        Arc::new(SystemClock),
        lead_time,
    ));

    let sender: Arc<dyn NotificationSender> = match &config.reminder_webhook_url {
        Some(url) => {
            info!("Delivering reminders to webhook {}", url);
            Arc::new(WebhookNotificationSender::new(url.clone()))
        }
        None => {
            info!("No REMINDER_WEBHOOK_URL set, reminders will be logged only");
            Arc::new(LogNotificationSender)
        }
    };

    let dispatcher = Arc::new(ReminderDispatcher::new(
        Arc::clone(&booking),
        sender,
        DispatchConfig::from(&config),
    ));
    let dispatch_handle = Arc::clone(&dispatcher).spawn();

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = Arc::new(AppointmentContext::new(booking, dispatcher));

    // Build the application router
    let app = router::create_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("HTTP server stopped, waiting for reminder dispatch loop");
    dispatch_handle.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
