pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod models;
pub mod redis_client;
pub mod services;
pub mod storage;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config,
    models::LayoutConfig,
    services::{
        availability::AvailabilityIndex,
        coordinator::BookingCoordinator,
        inventory::SeatInventory,
        notification::{self, NotificationDispatcher},
        payment::{self, PaymentAuthorizer},
    },
    storage::Storage,
};

// Shared state для всего приложения
pub struct AppState {
    pub config: Config,
    pub storage: Storage,
    pub layout: LayoutConfig,
    pub inventory: SeatInventory,
    pub availability: AvailabilityIndex,
    pub coordinator: BookingCoordinator,
}

impl AppState {
    /// Connects the configured backend and wires every service on top of it.
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let layout = crate::config::load_layout(&config.app.layout_file)?;
        let storage = Storage::connect(&config).await?;
        let payment = payment::from_config(&config)?;
        let notifier = notification::from_config(&config)?;

        Ok(Self::assemble(config, storage, layout, payment, notifier))
    }

    pub fn assemble(
        config: Config,
        storage: Storage,
        layout: LayoutConfig,
        payment: Option<Arc<dyn PaymentAuthorizer>>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Arc<Self> {
        let inventory = SeatInventory::new(storage.seats.clone());
        let availability = AvailabilityIndex::new(inventory.clone(), storage.reader.clone());
        let mut coordinator = BookingCoordinator::new(inventory.clone(), storage.bookings.clone(), notifier);
        if let Some(authorizer) = payment {
            coordinator = coordinator.with_payment(authorizer);
        }

        Arc::new(Self {
            config,
            storage,
            layout,
            inventory,
            availability,
            coordinator,
        })
    }
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let backend = state.storage.backend.as_str();
    match state.inventory.count().await {
        Ok(seats) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ok", "seats": seats, "backend": backend })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "unavailable", "backend": backend })),
            )
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Seat Booking API v1.0" }))
        .route("/health", get(health))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
