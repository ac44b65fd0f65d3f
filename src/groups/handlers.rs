use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{extractors::Principal, policy, validator::FieldError},
    error::ApiError,
    state::AppState,
};

use super::{
    dto::{CreateGroupRequest, GroupResponse, UpdateGroupRequest},
    repo::Group,
};

pub fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/groups", post(create_group))
        .route("/groups/:id", get(show_group).put(update_group))
}

fn validate_name(name: &str) -> Vec<FieldError> {
    if name.trim().is_empty() {
        vec![FieldError::new("name", "can't be blank")]
    } else {
        Vec::new()
    }
}

/// Membership is a set: order-irrelevant, no duplicates.
fn normalize_members(mut ids: Vec<Uuid>, creator: Uuid) -> Vec<Uuid> {
    ids.push(creator);
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn location_header(group_id: Uuid) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = format!("/api/groups/{}", group_id).parse() {
        headers.insert(axum::http::header::LOCATION, value);
    }
    headers
}

/// Creating a group requires identity, so a missing principal is a plain
/// 403 here rather than the 404 used on resource endpoints.
#[instrument(skip(state, principal, payload))]
pub async fn create_group(
    State(state): State<AppState>,
    principal: Option<Principal>,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<(StatusCode, HeaderMap, Json<GroupResponse>), ApiError> {
    let principal = principal.ok_or(ApiError::Forbidden)?;

    let errors = validate_name(&payload.name);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let member_ids = normalize_members(payload.user_ids, principal.0.id);
    let (group, member_ids) = Group::create(&state.db, payload.name.trim(), &member_ids).await?;

    info!(group_id = %group.id, user_id = %principal.0.id, "group created");
    Ok((
        StatusCode::CREATED,
        location_header(group.id),
        Json(GroupResponse::from_parts(group, member_ids)),
    ))
}

#[instrument(skip(state, principal))]
pub async fn show_group(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupResponse>, ApiError> {
    let (group, member_ids) = Group::find_with_members(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    // Nonexistent and not-a-member produce the same 404.
    if !policy::group_access(principal.0.id, &member_ids).is_permitted() {
        return Err(ApiError::NotFound);
    }

    Ok(Json(GroupResponse::from_parts(group, member_ids)))
}

#[instrument(skip(state, principal, payload))]
pub async fn update_group(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGroupRequest>,
) -> Result<(HeaderMap, Json<GroupResponse>), ApiError> {
    let (_, member_ids) = Group::find_with_members(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if !policy::group_access(principal.0.id, &member_ids).is_permitted() {
        return Err(ApiError::NotFound);
    }

    let errors = validate_name(&payload.name);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let mut new_members = payload.user_ids.unwrap_or(member_ids);
    new_members.sort_unstable();
    new_members.dedup();

    let (group, member_ids) = Group::update(&state.db, id, payload.name.trim(), &new_members).await?;

    info!(group_id = %group.id, user_id = %principal.0.id, "group updated");
    Ok((
        location_header(group.id),
        Json(GroupResponse::from_parts(group, member_ids)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected() {
        for name in ["", "   ", "\t\n"] {
            assert_eq!(
                validate_name(name),
                vec![FieldError::new("name", "can't be blank")],
                "name: {name:?}"
            );
        }
        assert!(validate_name("Yolo Circus").is_empty());
    }

    #[test]
    fn creator_is_always_a_member() {
        let creator = Uuid::new_v4();
        let other = Uuid::new_v4();

        let ids = normalize_members(vec![other], creator);
        assert!(ids.contains(&creator));
        assert!(ids.contains(&other));

        // already listed: no duplicate row
        let ids = normalize_members(vec![creator, other, other], creator);
        assert_eq!(ids.iter().filter(|id| **id == creator).count(), 1);
        assert_eq!(ids.iter().filter(|id| **id == other).count(), 1);
    }
}
