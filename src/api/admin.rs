//! Admin API endpoints.
//!
//! Handlers here carry no business logic: each one maps an HTTP request
//! onto [`StatsService`] or [`AdminService`] and wraps the result in the
//! response envelope. Authorization has already run in the middleware by
//! the time any handler executes.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::api::auth::CurrentAdmin;
use crate::api::types::{AdminInfo, MessageResponse};
use crate::services::{CatalogEntry, DashboardStats, FarmerDetail, FarmerSummary};

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub user: AdminInfo,
}

/// GET /admin/dashboard
/// Global statistics plus the viewing administrator's own info.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<CurrentAdmin>,
) -> Result<Json<ApiResponse<DashboardResponse>>, ApiError> {
    let stats = state.stats().dashboard().await?;
    Ok(Json(ApiResponse::success(DashboardResponse {
        stats,
        user: AdminInfo::from(&admin.0),
    })))
}

/// GET /admin/farmers
/// All farmer accounts with their product and scan totals.
pub async fn list_farmers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<FarmerSummary>>>, ApiError> {
    let roster = state.stats().farmer_roster().await?;
    Ok(Json(ApiResponse::success(roster)))
}

/// GET /admin/products
/// Every product, most recent first, annotated with its owner where known.
pub async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CatalogEntry>>>, ApiError> {
    let catalog = state.stats().product_catalog().await?;
    Ok(Json(ApiResponse::success(catalog)))
}

/// GET /admin/farmers/{username}
pub async fn farmer_detail(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<FarmerDetail>>, ApiError> {
    let detail = state.stats().farmer_detail(&username).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// DELETE /admin/farmers/{username}
/// Cascade: removes the account, its products and their side-files.
pub async fn delete_farmer(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let message = state.admin().delete_farmer(&username).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(message))))
}

/// DELETE /admin/products/{id}
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let message = state.admin().delete_product(&id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(message))))
}

/// POST /admin/farmers/{username}/toggle
/// Flips a farmer between active and inactive.
pub async fn toggle_farmer_status(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let message = state.admin().toggle_farmer_status(&username).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(message))))
}
