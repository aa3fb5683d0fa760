use std::sync::Arc;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notification_cell::models::ReminderSettings;
use notification_cell::services::{
    DeliveryWorker, HttpMailer, NotificationStore, ReminderDispatchService,
    SupabaseAppointmentDirectory, SystemClock,
};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic reminder service");

    // Load configuration
    let config = AppConfig::from_env();
    let settings = ReminderSettings::default();

    // Wire up the engine
    let supabase = Arc::new(SupabaseClient::new(&config));
    let store = Arc::new(NotificationStore::new(Arc::clone(&supabase)));
    let directory = Arc::new(SupabaseAppointmentDirectory::new(Arc::clone(&supabase)));
    let mailer = Arc::new(HttpMailer::new(&config).expect("mailer configuration is required"));
    let clock = Arc::new(SystemClock);

    let worker = Arc::new(DeliveryWorker::new(directory, mailer, settings.clone()));
    let dispatcher = Arc::new(ReminderDispatchService::new(store, worker, clock, settings));

    // Run the dispatch loop until a shutdown signal arrives
    let dispatcher_handle = {
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move { dispatcher.start().await })
    };

    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown signal");
    info!("Shutdown signal received");

    dispatcher.shutdown().await;
    let _ = dispatcher_handle.await;

    info!("Clinic reminder service stopped");
}
