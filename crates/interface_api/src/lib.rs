//! HTTP API Layer
//!
//! This crate provides the REST API for the settlement core system using
//! Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for purchases, obligations, and bank
//!   imports
//! - **Middleware**: Tracing and request logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! Handlers are generic over the store port, so the same router serves the
//! PostgreSQL adapter in production and the in-memory adapter in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(store, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_bank::BankImportStore;
use domain_settlement::SettlementStore;

use crate::config::ApiConfig;
use crate::handlers::{bank, health, obligations, purchases};
use crate::middleware::request_logging;

/// Application state shared across handlers
pub struct AppState<S> {
    pub store: Arc<S>,
    pub config: ApiConfig,
}

// Manual impl: `S` itself need not be `Clone` behind the `Arc`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
        }
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `store` - Store adapter backing all persistence
/// * `config` - API configuration
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router<S>(store: Arc<S>, config: ApiConfig) -> Router
where
    S: SettlementStore + BankImportStore + 'static,
{
    let state = AppState { store, config };

    // Public routes
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check::<S>));

    // Purchase routes
    let purchase_routes = Router::new()
        .route("/", post(purchases::record_purchase::<S>))
        .route("/:id", get(purchases::get_purchase::<S>));

    // Obligation routes
    let obligation_routes = Router::new()
        .route("/:id/pay", post(obligations::mark_paid::<S>))
        .route("/:id/fail", post(obligations::mark_failed::<S>))
        .route("/:id/refund", post(obligations::mark_refunded::<S>))
        .route("/:id/descriptor", get(obligations::get_descriptor::<S>));

    // Bank import routes
    let bank_routes = Router::new()
        .route("/import", post(bank::import_transaction::<S>))
        .route("/unmatched", get(bank::list_unmatched::<S>))
        .route("/rematch", post(bank::rematch::<S>));

    let api_routes = Router::new()
        .nest("/purchases", purchase_routes)
        .nest("/obligations", obligation_routes)
        .nest("/bank", bank_routes)
        .layer(axum_middleware::from_fn(request_logging));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
