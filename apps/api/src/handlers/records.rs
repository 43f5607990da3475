use super::*;

use rolegate_domain::RecordFilter;

pub async fn list_records_handler(
    State(state): State<AppState>,
    Query(params): Query<RecordListParams>,
) -> ApiResult<Json<Vec<RecordResponse>>> {
    let filter = RecordFilter {
        user: params.user,
        origin_assignment: params.origin.map(AssignmentId::from_uuid),
        entity_type: params.entity_type,
        entity_id: params.entity_id,
        is_role_grant: params.role_grants,
    };

    let records = state
        .record_store
        .find(filter)
        .await?
        .into_iter()
        .map(RecordResponse::from)
        .collect();

    Ok(Json(records))
}
