pub mod config;
pub mod error;
pub mod room;
pub mod websocket;

use std::sync::Arc;
use actix_web::{web, HttpResponse};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use room::{Role, Room};
pub use websocket::WebSocketServer;

/// Health check endpoint handler
/// Reports how many connections are live and which seats are taken
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let registry = state.room.registry();

    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "environment": state.config.environment,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "connections": registry.connection_count().await,
        "white": registry.is_occupied(Role::White).await,
        "black": registry.is_occupied(Role::Black).await,
    }))
}

/// State shared by the HTTP workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub room: Arc<Room>,
}

impl AppState {
    pub fn new(config: Settings, room: Arc<Room>) -> Self {
        Self {
            config: Arc::new(config),
            room,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_clone() {
        let config = Settings::new_for_test().expect("Failed to load test config");
        let state = AppState::new(config, Arc::new(Room::new()));

        let cloned = state.clone();

        // Verify Arc references are shared
        assert!(Arc::ptr_eq(&state.config, &cloned.config));
        assert!(Arc::ptr_eq(&state.room, &cloned.room));
    }
}
