//! Contract handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use core_kernel::ContractId;

use crate::auth::AuthenticatedUser;
use crate::dto::contract::{ContractResponse, RenewContractRequest};
use crate::error::ApiError;
use crate::handlers::path_id;
use crate::AppState;

/// Renews one of the caller's contracts
pub async fn renew_contract(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<RenewContractRequest>,
) -> Result<(StatusCode, Json<ContractResponse>), ApiError> {
    let contract_id: ContractId = path_id(id, "contract")?;
    let contract = state.services.contracts.get_contract(contract_id).await?;
    if !caller.may_act_for(contract.buyer_id) {
        return Err(ApiError::Forbidden("Only the buyer can renew this contract".to_string()));
    }

    let renewal = state
        .services
        .contracts
        .renew_contract(contract_id, request.new_end_date)
        .await?;
    Ok((StatusCode::CREATED, Json(ContractResponse::from(&renewal))))
}
