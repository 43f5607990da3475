use super::*;

const DEFAULT_PAGE_SIZE: usize = 20;

pub async fn lookup_territories_handler(
    State(state): State<AppState>,
    Query(params): Query<TerritoryLookupParams>,
) -> ApiResult<Json<Vec<TerritoryResponse>>> {
    let territories = state
        .territory_lookup_service
        .find_scoped_territories(
            params.role.as_deref(),
            params.q.as_deref(),
            params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            params.offset.unwrap_or(0),
        )
        .await?
        .into_iter()
        .map(TerritoryResponse::from)
        .collect();

    Ok(Json(territories))
}
