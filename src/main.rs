use pdfbox_core::core::config::Config;
use pdfbox_core::core::middleware::RateLimiter;
use pdfbox_core::core::openapi::ApiDoc;
use pdfbox_core::core::{database, middleware, schema};
use pdfbox_core::features::auth::routes as auth_routes;
use pdfbox_core::features::auth::services::{AuthService, LicenseService, TokenService};
use pdfbox_core::features::auth::AuthGate;
use pdfbox_core::features::boxes::{routes as boxes_routes, services::BoxService};
use pdfbox_core::features::entries::{routes as entries_routes, services::EntryService};
use pdfbox_core::features::files::{routes as files_routes, services::FileService};
use pdfbox_core::features::public::{routes as public_routes, services::PublicService};
use pdfbox_core::modules::storage::LocalStore;
use axum::{middleware::from_fn_with_state, Json, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );

    // Create database connection pool and initialize the schema
    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    schema::initialize(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Schema initialization failed: {}", e))?;

    // Initialize storage
    let storage = Arc::new(LocalStore::new(config.upload.dir.clone()));
    storage
        .ensure_root()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    tracing::info!("Upload directory ready at {}", storage.root().display());

    // Initialize auth services
    let token_service = Arc::new(TokenService::new(&config.auth));
    let license_service = Arc::new(LicenseService::new(pool.clone()));
    license_service
        .seed(&config.licenses.codes)
        .await
        .map_err(|e| anyhow::anyhow!("License seeding failed: {}", e))?;
    let auth_service = Arc::new(AuthService::new(
        pool.clone(),
        Arc::clone(&token_service),
        Arc::clone(&license_service),
    ));
    let auth_gate = Arc::new(AuthGate::new(pool.clone(), Arc::clone(&token_service)));
    tracing::info!("Auth services initialized");

    // Initialize feature services
    let box_service = Arc::new(BoxService::new(
        pool.clone(),
        Arc::clone(&storage),
        config.app.public_base_url.clone(),
    ));
    let entry_service = Arc::new(EntryService::new(
        pool.clone(),
        Arc::clone(&storage),
        config.upload.clone(),
    ));
    let public_service = Arc::new(PublicService::new(pool.clone()));
    let file_service = Arc::new(FileService::new(pool.clone(), Arc::clone(&storage)));
    tracing::info!("Feature services initialized");

    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit.max_requests,
        std::time::Duration::from_millis(config.rate_limit.window_ms),
    ));

    // Build swagger router
    let swagger = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // A multipart body carries every file of a request plus field overhead
    let upload_body_limit =
        config.upload.max_file_size * config.upload.max_files_per_upload + 1024 * 1024;

    // Protected routes (require a valid bearer token)
    let protected = Router::new()
        .merge(auth_routes::protected_routes())
        .merge(boxes_routes::routes(Arc::clone(&box_service)))
        .merge(entries_routes::routes(
            Arc::clone(&entry_service),
            upload_body_limit,
        ))
        .route_layer(from_fn_with_state(
            Arc::clone(&auth_gate),
            middleware::auth_middleware,
        ));

    // Health check endpoint (no auth required)
    let environment = config.app.environment.clone();
    let health_route = Router::new().route(
        "/health",
        axum::routing::get(move || {
            let environment = environment.clone();
            async move {
                Json(serde_json::json!({
                    "status": "OK",
                    "timestamp": chrono::Utc::now(),
                    "environment": environment,
                }))
            }
        }),
    );

    // Public routes; a valid token still attaches an identity for logging
    let public = Router::new()
        .merge(auth_routes::public_routes(auth_service))
        .merge(public_routes::routes(public_service))
        .merge(files_routes::routes(file_service))
        .layer(from_fn_with_state(
            Arc::clone(&auth_gate),
            middleware::optional_auth_middleware,
        ));

    let app = Router::new()
        .merge(swagger)
        .merge(protected)
        .merge(public)
        .merge(health_route)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
        .layer(from_fn_with_state(
            rate_limiter,
            middleware::rate_limit_middleware,
        ));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    socket.set_recv_buffer_size(256 * 1024)?;
    socket.set_send_buffer_size(256 * 1024)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(65535)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));
    tracing::info!(
        "Swagger UI available at {}",
        format!("http://{}/swagger-ui/", addr)
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
