use crate::{
    AppState,
    blog::{BlogPost, PostForm, store},
    request::Notice,
};
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::{error, info};

const REQUIRED_FIELDS: &str = "All required fields must be filled.";

fn back_to_admin(notice: Notice) -> Response {
    Redirect::to(&notice.redirect_target("/admin")).into_response()
}

async fn render_form(
    app_state: &AppState,
    template: &str,
    form: &PostForm,
    id: Option<i64>,
    notice: Option<Notice>,
) -> Response {
    let notice = notice.unwrap_or_default();
    let heading = if id.is_some() { "Edit Post" } else { "Add Post" };
    let globals = liquid::object!({
        "app_name": app_state.config.app.name,
        "page_title": format!("{} - {}", heading, app_state.config.app.name),
        "post": form,
        "post_id": id,
        "notice": notice.notice,
        "level": notice.level,
    });
    app_state.template_engine.render_uncached(template, globals).await
}

pub async fn admin_index_handler(
    State(app_state): State<AppState>,
    Query(notice): Query<Notice>,
) -> Response {
    let (posts, notice) = match app_state.db.run(store::all_posts).await {
        Ok(posts) => (posts, notice),
        Err(e) => {
            error!("Error fetching admin posts: {}", e);
            (Vec::<BlogPost>::new(), Notice::error("Error loading posts. Please try again."))
        }
    };

    let globals = liquid::object!({
        "app_name": app_state.config.app.name,
        "page_title": format!("Admin - {}", app_state.config.app.name),
        "posts": posts,
        "notice": notice.notice,
        "level": notice.level,
    });
    app_state
        .template_engine
        .render_uncached("admin.html.liquid", globals)
        .await
}

pub async fn add_post_form_handler(State(app_state): State<AppState>) -> Response {
    render_form(&app_state, "add_post.html.liquid", &PostForm::default(), None, None).await
}

pub async fn add_post_handler(
    State(app_state): State<AppState>,
    Form(form): Form<PostForm>,
) -> Response {
    let Some(post) = form.validate() else {
        let notice = Notice::error(REQUIRED_FIELDS);
        return render_form(&app_state, "add_post.html.liquid", &form, None, Some(notice)).await;
    };

    match app_state.db.run(move |conn| store::insert_post(conn, &post)).await {
        Ok(id) => {
            info!("Added blog post {}", id);
            back_to_admin(Notice::success("Post added successfully!"))
        }
        Err(e) => {
            error!("Error adding post: {}", e);
            let notice = Notice::error("Error adding post. Please try again.");
            render_form(&app_state, "add_post.html.liquid", &form, None, Some(notice)).await
        }
    }
}

pub async fn edit_post_form_handler(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Response {
    match app_state.db.run(move |conn| store::get_post(conn, id)).await {
        Ok(Some(post)) => {
            let form = PostForm::from_post(&post);
            render_form(&app_state, "edit_post.html.liquid", &form, Some(id), None).await
        }
        Ok(None) => back_to_admin(Notice::error("Post not found.")),
        Err(e) => {
            error!("Error loading post {}: {}", id, e);
            back_to_admin(Notice::error("Error loading post. Please try again."))
        }
    }
}

pub async fn edit_post_handler(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<PostForm>,
) -> Response {
    let Some(post) = form.validate() else {
        let notice = Notice::error(REQUIRED_FIELDS);
        return render_form(&app_state, "edit_post.html.liquid", &form, Some(id), Some(notice))
            .await;
    };

    match app_state
        .db
        .run(move |conn| store::update_post(conn, id, &post))
        .await
    {
        Ok(true) => {
            info!("Updated blog post {}", id);
            back_to_admin(Notice::success("Post updated successfully!"))
        }
        Ok(false) => back_to_admin(Notice::error("Post not found.")),
        Err(e) => {
            error!("Error updating post {}: {}", id, e);
            let notice = Notice::error("Error updating post. Please try again.");
            render_form(&app_state, "edit_post.html.liquid", &form, Some(id), Some(notice)).await
        }
    }
}

pub async fn delete_post_handler(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Response {
    match app_state.db.run(move |conn| store::delete_post(conn, id)).await {
        Ok(true) => {
            info!("Deleted blog post {}", id);
            back_to_admin(Notice::success("Post deleted successfully!"))
        }
        Ok(false) => back_to_admin(Notice::error("Post not found.")),
        Err(e) => {
            error!("Error deleting post {}: {}", id, e);
            back_to_admin(Notice::error("Error deleting post. Please try again."))
        }
    }
}
