use super::*;

pub async fn create_profile_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateProfileRequest>,
) -> ApiResult<(StatusCode, Json<ProfileResponse>)> {
    let profile = state
        .profile_service
        .create(rolegate_application::CreateProfileInput {
            role: payload.role,
            detail_rows: payload
                .detail_rows
                .into_iter()
                .map(ScopeRowInput::from)
                .collect(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ProfileResponse::from(profile))))
}

pub async fn list_profiles_handler(
    State(state): State<AppState>,
    Query(params): Query<ProfileListParams>,
) -> ApiResult<Json<Vec<ProfileResponse>>> {
    let query = ProfileQuery {
        role: params.role,
        state: parse_state(params.state.as_deref())?,
        exclude: None,
    };

    let profiles = state
        .profile_service
        .list(query)
        .await?
        .into_iter()
        .map(ProfileResponse::from)
        .collect();

    Ok(Json(profiles))
}

pub async fn get_profile_handler(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = state.profile_service.get(ProfileId::from_uuid(id)).await?;
    Ok(Json(ProfileResponse::from(profile)))
}

pub async fn validate_profile_handler(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> ApiResult<StatusCode> {
    state
        .profile_service
        .validate_uniqueness(ProfileId::from_uuid(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn activate_profile_handler(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> ApiResult<StatusCode> {
    state
        .profile_service
        .activate(ProfileId::from_uuid(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn retract_profile_handler(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> ApiResult<StatusCode> {
    state
        .profile_service
        .retract(ProfileId::from_uuid(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
