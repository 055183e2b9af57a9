//! Contact balance adjustment.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use crate::auth::BusinessContext;
use crate::dto::{BalanceAdjustmentView, BalanceBody};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::AppState;

/// PATCH /api/contacts/{id}/balance: set, add or subtract an amount.
///
/// The balance may go negative (the business owes the contact).
#[tracing::instrument(skip_all, fields(business_id = %ctx.business_id, id = %id))]
pub async fn adjust_balance(
    State(state): State<Arc<AppState>>,
    ctx: BusinessContext,
    Path(id): Path<String>,
    payload: Result<Json<BalanceBody>, JsonRejection>,
) -> Result<Json<ApiResponse<BalanceAdjustmentView>>, ApiError> {
    let Json(body) = payload?;
    let amount = body.amount()?;

    let adjustment = state
        .engine
        .adjust_balance(&ctx.business_id, &id, amount, body.operation)
        .await?;
    let contact = state.db.contacts().get_by_id(&ctx.business_id, &id).await?;

    Ok(Json(ApiResponse::with_message(
        "Contact balance updated successfully",
        BalanceAdjustmentView::new(adjustment, contact.as_ref()),
    )))
}
