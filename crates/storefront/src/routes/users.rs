//! Account self-service and admin user management.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};

use gamevault_core::UserId;

use crate::db::{RepositoryError, UserRepository};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::user::{AdminUpdateUserRequest, ChangePasswordRequest, UpdateProfileRequest};
use crate::models::{PageQuery, Paginated, User};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Build the users router, mounted at `/api/users`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me).put(update_me))
        .route("/me/password", put(change_password))
        .route("/", get(list))
        .route("/{id}", get(show).put(update).delete(remove))
}

/// The caller's own account.
async fn me(RequireAuth(user): RequireAuth, State(state): State<AppState>) -> Result<Json<User>> {
    let user = AuthService::new(state.pool()).get_user(user.id).await?;
    Ok(Json(user))
}

/// Update the caller's profile.
async fn update_me(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<User>> {
    let changes = request.validate()?;
    let updated = UserRepository::new(state.pool())
        .update_profile(user.id, &changes)
        .await?;
    Ok(Json(updated))
}

/// Change the caller's password.
async fn change_password(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode> {
    AuthService::new(state.pool())
        .change_password(user.id, &request.current_password, &request.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List accounts, oldest first.
async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<User>>> {
    let (users, total) = UserRepository::new(state.pool())
        .list(query.limit(), query.offset())
        .await?;
    Ok(Json(Paginated::new(users, query.page(), query.limit(), total)))
}

/// A single account.
async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<User>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;
    Ok(Json(user))
}

/// Edit any account, including its admin flag.
async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(request): Json<AdminUpdateUserRequest>,
) -> Result<Json<User>> {
    let changes = request.validate()?;
    let updated = UserRepository::new(state.pool())
        .update_profile(id, &changes)
        .await
        .map_err(|e| not_found(e, id))?;

    tracing::info!(
        admin_id = %admin.id,
        user_id = %id,
        is_admin = updated.is_admin,
        "User updated by admin"
    );
    Ok(Json(updated))
}

/// Delete an account together with its cart.
async fn remove(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    if !UserRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::NotFound(format!("User {id} not found")));
    }
    tracing::info!(admin_id = %admin.id, user_id = %id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn not_found(err: RepositoryError, id: UserId) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound(format!("User {id} not found")),
        other => other.into(),
    }
}
