use super::{Comment, CommentForm, store};
use crate::AppState;
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

const MISSING_FIELDS: &str = "Name and comment are required";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ModalQuery {
    title: Option<String>,
    success: Option<String>,
    error: Option<String>,
}

fn modal_url(image_name: &str, title: &str, outcome: (&str, &str)) -> String {
    let encoded: Vec<String> = image_name
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("title", title)
        .append_pair(outcome.0, outcome.1)
        .finish();
    format!("/comments/modal/{}?{}", encoded.join("/"), query)
}

pub async fn list_comments_handler(
    State(app_state): State<AppState>,
    Path(image_name): Path<String>,
) -> Response {
    match app_state
        .db
        .run(move |conn| store::list_comments(conn, &image_name))
        .await
    {
        Ok(comments) => Json(json!({ "comments": comments })).into_response(),
        Err(e) => {
            error!("Failed to load comments: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Error loading comments" })),
            )
                .into_response()
        }
    }
}

pub async fn post_comment_handler(
    State(app_state): State<AppState>,
    Form(form): Form<CommentForm>,
) -> Response {
    let Some(comment) = form.validate() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": MISSING_FIELDS })),
        )
            .into_response();
    };

    match app_state
        .db
        .run(move |conn| store::insert_comment(conn, &comment))
        .await
    {
        Ok(id) => {
            info!("Stored comment {}", id);
            Json(json!({ "success": true })).into_response()
        }
        Err(e) => {
            error!("Error inserting comment: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Error saving comment" })),
            )
                .into_response()
        }
    }
}

pub async fn comments_modal_handler(
    State(app_state): State<AppState>,
    Path(image_name): Path<String>,
    Query(query): Query<ModalQuery>,
) -> Response {
    let image_title = query
        .title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| image_name.clone());

    let lookup_name = image_name.clone();
    let (comments, load_error) = match app_state
        .db
        .run(move |conn| store::list_comments(conn, &lookup_name))
        .await
    {
        Ok(comments) => (comments, None),
        Err(e) => {
            error!("Failed to load comments modal: {}", e);
            (Vec::new(), Some("Error loading comments".to_string()))
        }
    };

    let comments: Vec<liquid::Object> = comments
        .iter()
        .map(|c: &Comment| {
            liquid::object!({
                "author": c.author,
                "comment": c.comment,
                "created": c.created,
                "created_display": c.created_display(),
            })
        })
        .collect();

    let globals = liquid::object!({
        "app_name": app_state.config.app.name,
        "comments": comments,
        "image_name": image_name,
        "image_title": image_title,
        "success": query.success,
        "error": load_error.or(query.error),
    });

    app_state
        .template_engine
        .render_uncached("comments.html.liquid", globals)
        .await
}

/// Form post from the modal; always redirects back to it.
pub async fn add_comment_handler(
    State(app_state): State<AppState>,
    Form(form): Form<CommentForm>,
) -> Response {
    let title = if form.image_title.trim().is_empty() {
        form.image_name.clone()
    } else {
        form.image_title.clone()
    };

    let Some(comment) = form.validate() else {
        return Redirect::to(&modal_url(&form.image_name, &title, ("error", MISSING_FIELDS)))
            .into_response();
    };

    let image_name = comment.image_name.clone();
    let outcome = app_state
        .db
        .run(move |conn| store::insert_comment(conn, &comment))
        .await;

    let target = match outcome {
        Ok(_) => modal_url(&image_name, &title, ("success", "Comment added successfully")),
        Err(e) => {
            error!("Error inserting comment: {}", e);
            modal_url(&image_name, &title, ("error", "Error saving comment"))
        }
    };
    Redirect::to(&target).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modal_url_encodes_segments() {
        assert_eq!(
            modal_url("Roma/San Pietro.jpg", "San Pietro", ("success", "ok")),
            "/comments/modal/Roma/San%20Pietro.jpg?title=San+Pietro&success=ok"
        );
    }
}
