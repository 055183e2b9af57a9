//! Posting and ledger endpoints.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use stockbook_core::validation::validate_id;
use stockbook_core::{CoreError, Pagination};

use crate::auth::BusinessContext;
use crate::dto::{CreateTransactionBody, ListParams, StatusBody, SummaryParams, SummaryView, TransactionView};
use crate::error::ApiError;
use crate::notify::spawn_notification;
use crate::response::ApiResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TransactionEnvelope {
    pub transaction: TransactionView,
}

#[derive(Debug, Serialize)]
pub struct TransactionPage {
    pub transactions: Vec<TransactionView>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct SummaryEnvelope {
    pub summary: SummaryView,
}

/// POST /api/transactions: post a sale or purchase.
#[tracing::instrument(skip_all, fields(business_id = %ctx.business_id))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    ctx: BusinessContext,
    payload: Result<Json<CreateTransactionBody>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionEnvelope>>), ApiError> {
    let Json(body) = payload?;
    let request = body.into_request()?;

    let details = state.engine.post(&ctx.business_id, request).await?;

    let message = details.transaction.transaction_type.recorded_message();
    let transaction = TransactionView::from_details(&details);
    spawn_notification(state.notifier.clone(), ctx.business_id, details);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(message, TransactionEnvelope { transaction })),
    ))
}

/// GET /api/transactions: filtered, paginated ledger.
#[tracing::instrument(skip_all, fields(business_id = %ctx.business_id))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    ctx: BusinessContext,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ApiResponse<TransactionPage>>, ApiError> {
    let Query(params) = params?;
    let query = params.into_query()?;

    let (transactions, pagination) = state.db.transactions().list(&ctx.business_id, &query).await?;

    Ok(Json(ApiResponse::ok(TransactionPage {
        transactions: transactions.iter().map(TransactionView::from_transaction).collect(),
        pagination,
    })))
}

/// GET /api/transactions/summary: sales vs. purchases.
#[tracing::instrument(skip_all, fields(business_id = %ctx.business_id))]
pub async fn summary(
    State(state): State<Arc<AppState>>,
    ctx: BusinessContext,
    params: Result<Query<SummaryParams>, QueryRejection>,
) -> Result<Json<ApiResponse<SummaryEnvelope>>, ApiError> {
    let Query(params) = params?;
    let (start, end) = params.range()?;

    let summary = state.db.transactions().summary(&ctx.business_id, start, end).await?;

    Ok(Json(ApiResponse::ok(SummaryEnvelope {
        summary: summary.into(),
    })))
}

/// GET /api/transactions/{id}
#[tracing::instrument(skip_all, fields(business_id = %ctx.business_id, id = %id))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    ctx: BusinessContext,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TransactionEnvelope>>, ApiError> {
    validate_id("id", &id)?;

    let details = state
        .db
        .transactions()
        .get_details(&ctx.business_id, &id)
        .await?
        .ok_or_else(|| CoreError::TransactionNotFound(id.clone()))?;

    Ok(Json(ApiResponse::ok(TransactionEnvelope {
        transaction: TransactionView::from_details(&details),
    })))
}

/// PATCH /api/transactions/{id}/status
#[tracing::instrument(skip_all, fields(business_id = %ctx.business_id, id = %id))]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    ctx: BusinessContext,
    Path(id): Path<String>,
    payload: Result<Json<StatusBody>, JsonRejection>,
) -> Result<Json<ApiResponse<TransactionEnvelope>>, ApiError> {
    let Json(body) = payload?;

    let transaction = state
        .engine
        .update_status(&ctx.business_id, &id, body.status)
        .await?;

    Ok(Json(ApiResponse::with_message(
        "Transaction status updated successfully",
        TransactionEnvelope {
            transaction: TransactionView::from_transaction(&transaction),
        },
    )))
}
