// HTTP handlers for discount endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::auth::middleware::AuthenticatedUser;
use crate::discounts::{
    models::{
        ApplyDiscountRequest, AvailableDiscount, AvailableDiscountsRequest, CreateDiscountRequest,
        DiscountListResponse, DiscountPreview, DiscountResponse, ToggleDiscountRequest,
        UpdateDiscountRequest,
    },
    query::DiscountListParams,
    DiscountError,
};

/// Handler for POST /api/discounts
/// Creates a discount for the authenticated admin or lecturer
pub async fn create_discount_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateDiscountRequest>,
) -> Result<(StatusCode, Json<DiscountResponse>), DiscountError> {
    request
        .validate()
        .map_err(|e| DiscountError::ValidationError(e.to_string()))?;

    let discount = state
        .discount_service
        .create(user.user_id, user.role, request)
        .await?;

    Ok((StatusCode::CREATED, Json(discount)))
}

/// Handler for GET /api/discounts
/// Role-scoped listing with filtering, sorting, and pagination
pub async fn list_discounts_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Query(params): Query<DiscountListParams>,
) -> Result<Json<DiscountListResponse>, DiscountError> {
    let response = state
        .discount_service
        .list(user.user_id, user.role, params)
        .await?;

    Ok(Json(response))
}

/// Handler for GET /api/discounts/{id}
pub async fn get_discount_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<DiscountResponse>, DiscountError> {
    let discount = state
        .discount_service
        .get(id, user.user_id, user.role)
        .await?;

    Ok(Json(discount))
}

/// Handler for POST /api/discounts/preview
/// Read-only preview of a code applied to a cart; never commits a redemption
pub async fn preview_discount_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ApplyDiscountRequest>,
) -> Result<Json<DiscountPreview>, DiscountError> {
    request
        .validate()
        .map_err(|e| DiscountError::ValidationError(e.to_string()))?;

    let preview = state
        .discount_service
        .preview(&request.course_ids, &request.code_or_id, user.user_id)
        .await?;

    Ok(Json(preview))
}

/// Handler for POST /api/discounts/available
/// Ranked list of codes that could discount the given cart
pub async fn available_discounts_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Json(request): Json<AvailableDiscountsRequest>,
) -> Result<Json<Vec<AvailableDiscount>>, DiscountError> {
    request
        .validate()
        .map_err(|e| DiscountError::ValidationError(e.to_string()))?;

    let available = state
        .discount_service
        .find_available(&request.course_ids, user.user_id)
        .await?;

    Ok(Json(available))
}

/// Handler for PUT /api/discounts/{id}
pub async fn update_discount_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateDiscountRequest>,
) -> Result<Json<DiscountResponse>, DiscountError> {
    request
        .validate()
        .map_err(|e| DiscountError::ValidationError(e.to_string()))?;

    let discount = state
        .discount_service
        .update(id, user.user_id, user.role, request)
        .await?;

    Ok(Json(discount))
}

/// Handler for POST /api/discounts/{id}/toggle
pub async fn toggle_discount_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<ToggleDiscountRequest>,
) -> Result<Json<DiscountResponse>, DiscountError> {
    let discount = state
        .discount_service
        .toggle(id, user.user_id, user.role, request.active)
        .await?;

    Ok(Json(discount))
}

/// Handler for DELETE /api/discounts/{id}
pub async fn delete_discount_handler(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, DiscountError> {
    state
        .discount_service
        .delete(id, user.user_id, user.role)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
