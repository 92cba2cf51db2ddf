use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use deck_core::namespace::{self, ScriptBundle};
use deck_core::tree::{build_tree, TreeNode};

use crate::auth::{require_read, require_write, CurrentUser};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TreeQuery {
    pub path: Option<String>,
}

#[derive(Deserialize)]
pub struct TargetQuery {
    pub path: Option<String>,
    #[serde(rename = "target-path")]
    pub target_path: Option<String>,
}

/// GET /api/organizations/{org_id}/tree?path= — folder tree at `path`
/// (default `/`), rebuilt from the flat record sets on every read.
pub async fn get_tree(
    State(app): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(org_id): Path<String>,
    Query(q): Query<TreeQuery>,
) -> Result<Json<TreeNode>, AppError> {
    require_read(&app, &org_id, &user).await?;
    let path = q.path.as_deref().unwrap_or("/");

    let triggers = app.store.triggers_by_prefix(&org_id, path).await?;
    let shareds = app.store.shareds_by_prefix(&org_id, path).await?;
    Ok(Json(build_tree(path, &triggers, &shareds)))
}

/// DELETE /api/organizations/{org_id}/tree?path= — delete every record under
/// `path`. 204 even when nothing matched.
pub async fn delete_tree(
    State(app): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(org_id): Path<String>,
    Query(q): Query<TreeQuery>,
) -> Result<StatusCode, AppError> {
    require_write(&app, &org_id, &user).await?;
    let path = q
        .path
        .as_deref()
        .ok_or_else(|| AppError::validation("SearchParams \"path\" is required."))?;

    let removed = namespace::delete_path(app.store.as_ref(), &org_id, path).await?;
    tracing::info!(org = %org_id, path, removed, "tree delete");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/organizations/{org_id}/tree/move?path=&target-path=
pub async fn move_tree(
    State(app): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(org_id): Path<String>,
    Query(q): Query<TargetQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_write(&app, &org_id, &user).await?;
    let path = q.path.as_deref().unwrap_or("/");
    let target = q.target_path.as_deref().unwrap_or("/new/");

    let moved = namespace::move_path(app.store.as_ref(), &org_id, path, target).await?;
    tracing::info!(org = %org_id, path, target, moved, "tree move");
    Ok(Json(serde_json::json!({})))
}

/// GET /api/organizations/{org_id}/tree/duplicate?path=&target-path=
pub async fn duplicate_tree(
    State(app): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(org_id): Path<String>,
    Query(q): Query<TargetQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_write(&app, &org_id, &user).await?;
    let path = q.path.as_deref().unwrap_or("/");

    namespace::duplicate_path(app.store.as_ref(), &org_id, path, q.target_path.as_deref())
        .await?;
    Ok(Json(serde_json::json!({})))
}

/// GET /api/organizations/{org_id}/tree/enable?path=
pub async fn enable_tree(
    State(app): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(org_id): Path<String>,
    Query(q): Query<TreeQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    set_enable(app, org_id, user, q, true).await
}

/// GET /api/organizations/{org_id}/tree/disable?path=
pub async fn disable_tree(
    State(app): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(org_id): Path<String>,
    Query(q): Query<TreeQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    set_enable(app, org_id, user, q, false).await
}

async fn set_enable(
    app: AppState,
    org_id: String,
    user: String,
    q: TreeQuery,
    enable: bool,
) -> Result<Json<serde_json::Value>, AppError> {
    require_write(&app, &org_id, &user).await?;
    let path = q.path.as_deref().unwrap_or("/");
    namespace::set_enable_path(app.store.as_ref(), &org_id, path, enable).await?;
    Ok(Json(serde_json::json!({})))
}

/// GET /api/organizations/{org_id}/tree/export?path= — subtree snapshot.
/// Export is write-gated: observed policy, preserved deliberately.
pub async fn export_tree(
    State(app): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(org_id): Path<String>,
    Query(q): Query<TreeQuery>,
) -> Result<Json<ScriptBundle>, AppError> {
    require_write(&app, &org_id, &user).await?;
    let path = q.path.as_deref().unwrap_or("/");
    let bundle = namespace::export_path(app.store.as_ref(), &org_id, path).await?;
    Ok(Json(bundle))
}

#[derive(Deserialize)]
pub struct ImportBody {
    pub slug: String,
    #[serde(flatten)]
    pub bundle: ScriptBundle,
}

/// POST /api/organizations/{org_id}/tree/import — create the bundle under
/// `slug`; the response lists each item's individual outcome.
pub async fn import_tree(
    State(app): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(org_id): Path<String>,
    Json(body): Json<ImportBody>,
) -> Result<Json<Vec<namespace::ImportOutcome>>, AppError> {
    require_write(&app, &org_id, &user).await?;
    let outcomes =
        namespace::import_bundle(app.store.as_ref(), &org_id, &body.slug, &body.bundle).await?;
    Ok(Json(outcomes))
}
