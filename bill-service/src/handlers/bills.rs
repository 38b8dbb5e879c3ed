use crate::dtos::{BillInput, BillListResponse, BillResponse, ListBillsParams};
use crate::services::BillError;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use service_core::response::ApiResponse;

type BillResult<T> = Result<ApiResponse<T>, BillError>;

pub async fn create_bill(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> BillResult<BillResponse> {
    let Json(body) = payload?;
    let bill = state.bills.create(BillInput::from(body)).await?;
    Ok(ApiResponse::ok(
        BillResponse::from(bill),
        "Bill created successfully",
    ))
}

pub async fn list_bills(
    State(state): State<AppState>,
    Query(params): Query<ListBillsParams>,
) -> BillResult<BillListResponse> {
    let list = state.bills.list(&params).await?;
    Ok(ApiResponse::ok(list, "Bills fetched successfully"))
}

pub async fn get_bill(
    State(state): State<AppState>,
    Path(bill_id): Path<String>,
) -> BillResult<BillResponse> {
    let bill = state.bills.get(&bill_id).await?;
    Ok(ApiResponse::ok(
        BillResponse::from(bill),
        "Bill fetched successfully",
    ))
}

pub async fn update_bill(
    State(state): State<AppState>,
    Path(bill_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> BillResult<BillResponse> {
    let Json(body) = payload?;
    let bill = state.bills.update(&bill_id, BillInput::from(body)).await?;
    Ok(ApiResponse::ok(
        BillResponse::from(bill),
        "Bill updated successfully",
    ))
}

pub async fn delete_bill(
    State(state): State<AppState>,
    Path(bill_id): Path<String>,
) -> BillResult<BillResponse> {
    let bill = state.bills.delete(&bill_id).await?;
    Ok(ApiResponse::ok(
        BillResponse::from(bill),
        "Bill deleted successfully",
    ))
}

pub async fn get_receipt(
    State(state): State<AppState>,
    Path(bill_id): Path<String>,
) -> Result<impl IntoResponse, BillError> {
    let receipt = state.bills.receipt(&bill_id).await?;
    let disposition = format!("inline; filename=\"bill-{}.pdf\"", receipt.bill_id);

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        receipt.pdf,
    ))
}
