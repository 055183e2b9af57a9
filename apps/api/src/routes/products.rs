//! Product endpoints: low-stock report and stock adjustment.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::auth::BusinessContext;
use crate::dto::{ProductView, StockAdjustmentView, StockBody};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct LowStockList {
    pub products: Vec<ProductView>,
    pub count: usize,
}

/// GET /api/products/low-stock
#[tracing::instrument(skip_all, fields(business_id = %ctx.business_id))]
pub async fn low_stock(
    State(state): State<Arc<AppState>>,
    ctx: BusinessContext,
) -> Result<Json<ApiResponse<LowStockList>>, ApiError> {
    let products = state.db.products().list_low_stock(&ctx.business_id).await?;

    Ok(Json(ApiResponse::ok(LowStockList {
        count: products.len(),
        products: products.iter().map(ProductView::from).collect(),
    })))
}

/// PATCH /api/products/{id}/stock: set, add or subtract units.
#[tracing::instrument(skip_all, fields(business_id = %ctx.business_id, id = %id))]
pub async fn adjust_stock(
    State(state): State<Arc<AppState>>,
    ctx: BusinessContext,
    Path(id): Path<String>,
    payload: Result<Json<StockBody>, JsonRejection>,
) -> Result<Json<ApiResponse<StockAdjustmentView>>, ApiError> {
    let Json(body) = payload?;
    let quantity = body.quantity()?;

    let adjustment = state
        .engine
        .adjust_stock(&ctx.business_id, &id, quantity, body.operation)
        .await?;
    let product = state.db.products().get_by_id(&ctx.business_id, &id).await?;

    Ok(Json(ApiResponse::with_message(
        "Product stock updated successfully",
        StockAdjustmentView::new(adjustment, product.as_ref()),
    )))
}
