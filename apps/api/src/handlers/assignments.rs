use super::*;

pub async fn create_assignment_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> ApiResult<(StatusCode, Json<AssignmentResponse>)> {
    let assignment = state
        .assignment_service
        .create(rolegate_application::CreateAssignmentInput {
            user: payload.user,
            role: payload.role,
            territory: payload.territory,
            company: payload.company,
            detail_rows: payload
                .detail_rows
                .into_iter()
                .map(ScopeRowInput::from)
                .collect(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(AssignmentResponse::from(assignment))))
}

pub async fn list_assignments_handler(
    State(state): State<AppState>,
    Query(params): Query<AssignmentListParams>,
) -> ApiResult<Json<Vec<AssignmentResponse>>> {
    let query = AssignmentQuery {
        user: params.user,
        role: params.role,
        state: parse_state(params.state.as_deref())?,
        ..AssignmentQuery::default()
    };

    let assignments = state
        .assignment_service
        .list(query)
        .await?
        .into_iter()
        .map(AssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}

pub async fn get_assignment_handler(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> ApiResult<Json<AssignmentResponse>> {
    let assignment = state
        .assignment_service
        .get(AssignmentId::from_uuid(id))
        .await?;

    Ok(Json(AssignmentResponse::from(assignment)))
}

pub async fn validate_assignment_handler(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> ApiResult<StatusCode> {
    state
        .assignment_service
        .validate(AssignmentId::from_uuid(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn activate_assignment_handler(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> ApiResult<StatusCode> {
    state
        .assignment_service
        .activate(AssignmentId::from_uuid(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn retract_assignment_handler(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> ApiResult<StatusCode> {
    state
        .assignment_service
        .retract(AssignmentId::from_uuid(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
