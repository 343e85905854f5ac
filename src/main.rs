use actix_web::{web, App, HttpResponse, HttpServer};
use pesabridge::config::Config;
use pesabridge::daraja::{CredentialCache, DarajaClient, DarajaTokenExchanger, StkGateway};
use pesabridge::orders::{HttpOrderNotifier, OrderNotifier};
use pesabridge::transactions::{
    CallbackController, MySqlTransactionStore, PaymentController, PaymentService, Reconciler,
    StatusPoller, TransactionStore,
};
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pesabridge=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");
    config.validate().expect("Configuration validation failed");

    tracing::info!("Starting pesabridge payment bridge");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Daraja endpoint: {}", config.daraja.base_url);

    // Create database connection pool and apply migrations
    let db_pool = config
        .database
        .create_pool()
        .await
        .expect("Failed to create database pool");

    sqlx::migrate!()
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!(
        "Database pool initialized ({} connections)",
        config.database.pool_size
    );

    // Wire services
    let exchanger = DarajaTokenExchanger::new(config.daraja.clone())
        .expect("Failed to build Daraja token exchanger");
    let credentials = Arc::new(CredentialCache::new(Arc::new(exchanger)));
    let gateway: Arc<dyn StkGateway> = Arc::new(
        DarajaClient::new(config.daraja.clone(), credentials)
            .expect("Failed to build Daraja client"),
    );
    let store: Arc<dyn TransactionStore> = Arc::new(MySqlTransactionStore::new(db_pool));
    let orders: Arc<dyn OrderNotifier> = Arc::new(
        HttpOrderNotifier::new(config.orders.clone()).expect("Failed to build order notifier"),
    );

    let reconciler = Reconciler::new(store.clone(), orders.clone());
    let poller = StatusPoller::new(
        gateway.clone(),
        store.clone(),
        reconciler.clone(),
        config.poller.clone(),
    );
    let payment_service = PaymentService::new(gateway, store, orders, poller);

    // Start HTTP server
    let bind_address = config.server.bind_address();
    let server = HttpServer::new(move || {
        let payment_service = payment_service.clone();
        let reconciler = reconciler.clone();

        App::new()
            .wrap(TracingLogger::default())
            .configure(|cfg| PaymentController::configure(cfg, payment_service))
            .configure(|cfg| CallbackController::configure(cfg, reconciler))
            .route("/health", web::get().to(health_check))
    })
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "pesabridge"
    }))
}
