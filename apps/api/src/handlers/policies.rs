use super::*;

use rolegate_core::AppResult;
use rolegate_domain::{RoleLevelPolicy, ScopeRow};

pub async fn save_policy_handler(
    State(state): State<AppState>,
    Path(role): Path<String>,
    Json(payload): Json<SavePolicyRequest>,
) -> ApiResult<Json<PolicyResponse>> {
    let scope_rows = payload
        .scope_rows
        .into_iter()
        .map(|row| ScopeRow::new(row.entity_type, row.entity_id))
        .collect::<AppResult<Vec<_>>>()?;

    let policy = RoleLevelPolicy::new(
        role,
        payload.overlappable,
        payload.number_of_actors,
        payload.territory_type,
        scope_rows,
    )?;

    state.policy_admin_repository.upsert_policy(policy.clone()).await?;
    Ok(Json(PolicyResponse::from(policy)))
}

pub async fn list_policies_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PolicyResponse>>> {
    let policies = state
        .policy_admin_repository
        .list_policies()
        .await?
        .into_iter()
        .map(PolicyResponse::from)
        .collect();

    Ok(Json(policies))
}
