//! Promo code API endpoints

use api_types::promo::{PromoCodeLookup, PromoRejection};
use axum::{
    Json,
    extract::{Path, State},
};

use crate::{ServerError, server::ServerState};

/// Handle requests for checking a promo code without redeeming it
pub async fn get(
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> Result<Json<PromoCodeLookup>, ServerError> {
    let check = state.engine.promo_code_status(&code).await?;

    Ok(Json(PromoCodeLookup {
        valid: check.is_valid(),
        skip_deposit: check.skip_deposit,
        reason: check.rejection.map(|rejection| match rejection {
            engine::PromoRejection::NotFound => PromoRejection::NotFound,
            engine::PromoRejection::Inactive => PromoRejection::Inactive,
            engine::PromoRejection::NotYetValid => PromoRejection::NotYetValid,
            engine::PromoRejection::Expired => PromoRejection::Expired,
            engine::PromoRejection::UsageLimitReached => PromoRejection::UsageLimitReached,
        }),
        valid_until: check.valid_until,
        code: check.code,
    }))
}
