use super::*;

use rolegate_domain::{LinkFieldDeclaration, ScopeEntityRecord};

pub async fn upsert_entity_handler(
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(String, String)>,
    Json(payload): Json<UpsertEntityRequest>,
) -> ApiResult<StatusCode> {
    let record = ScopeEntityRecord::new(entity_type, entity_id, payload.fields)?;
    state.directory_admin_repository.upsert_entity(record).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn declare_link_fields_handler(
    State(state): State<AppState>,
    Path(entity_type): Path<String>,
    Json(payload): Json<DeclareLinkFieldsRequest>,
) -> ApiResult<StatusCode> {
    let declarations = payload
        .link_fields
        .into_iter()
        .map(|field| LinkFieldDeclaration {
            field_name: field.field_name,
            target_type: field.target_type,
        })
        .collect();

    state
        .directory_admin_repository
        .declare_link_fields(&entity_type, declarations)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
