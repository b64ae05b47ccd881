use super::FolderView;
use crate::{AppState, templating::flatten_into};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

async fn render_folder_page(app_state: &AppState, folder_path: &str) -> Response {
    let view: FolderView = match app_state.gallery.render_folder(folder_path).await {
        Ok(view) => view,
        Err(e) if e.is_not_found() => {
            debug!("Folder {:?} not served: {}", folder_path, e);
            return (StatusCode::NOT_FOUND, "Folder not found").into_response();
        }
        Err(e) => {
            error!("Failed to list folder {:?}: {}", folder_path, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error loading folder").into_response();
        }
    };

    let mut globals = liquid::object!({
        "app_name": app_state.gallery.app_title(),
        "contents": view.listing,
        "currentPath": view.current_path.as_str(),
        "current_path_url": view.current_path.encoded(),
    });
    flatten_into(&mut globals, &view.page);

    app_state
        .template_engine
        .render_page("index.html.liquid", globals)
        .await
}

#[axum::debug_handler]
pub async fn home_handler(State(app_state): State<AppState>) -> Response {
    render_folder_page(&app_state, "").await
}

#[axum::debug_handler]
pub async fn folder_handler(
    State(app_state): State<AppState>,
    Path(folder_path): Path<String>,
) -> Response {
    render_folder_page(&app_state, &folder_path).await
}

/// Raw images and sidecar-adjacent files under the content root.
#[axum::debug_handler]
pub async fn content_handler(
    State(app_state): State<AppState>,
    Path(path): Path<String>,
) -> Response {
    app_state.content_files.serve(&path).await
}
