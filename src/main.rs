use actix_files::Files;
use actix_web::{web, App, HttpServer};
use chessroom_server::{health_check, AppError, AppState, Room, Settings, WebSocketServer};
use dotenv::dotenv;
use std::net::TcpListener;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[actix_web::main]
async fn main() -> chessroom_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = Settings::new()?;

    // Initialize logging; RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
    info!(environment = %config.environment, "Configuration loaded successfully");

    let room = Arc::new(Room::new());

    // Relay listener
    let relay_listener = tokio::net::TcpListener::bind(config.relay.address()).await?;
    let relay = Arc::new(WebSocketServer::new(room.clone(), &config.relay));
    info!(
        "Relay ready to accept connections at ws://{}{}",
        config.relay.address(),
        config.relay.path
    );
    let relay_task = tokio::spawn(relay.serve(relay_listener));

    // HTTP listener for assets and health
    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    info!("Serving HTTP at http://{}:{}", config.server.host, config.server.port);

    let state = web::Data::new(AppState::new(config.clone(), room));
    let assets = config.assets.clone();
    let http = HttpServer::new(move || {
        let app = App::new()
            .app_data(state.clone())
            .route("/health", web::get().to(health_check));

        if assets.enabled {
            app.service(Files::new("/", &assets.dir).index_file(assets.index.clone()))
        } else {
            app
        }
    })
    .listen(listener)?
    .workers(config.server.workers as usize)
    .run();

    tokio::select! {
        result = http => result?,
        result = relay_task => {
            result.map_err(|e| AppError::InternalError(format!("relay stopped: {}", e)))?;
        }
    }

    Ok(())
}
