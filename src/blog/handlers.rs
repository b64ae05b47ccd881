use super::{
    BlogError, BlogPageMetadata, BlogPost, BlogQuery, Facets, FilterState, Pagination, PostDetail,
    PostFilter, PostSummary, blog_metadata, paginate, post_metadata, store, total_pages,
};
use crate::{
    AppState,
    request::{absolute_url, is_ajax},
    templating::flatten_into,
};
use axum::{
    Json,
    extract::{Path, Query, RawQuery, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error};

const LOAD_ERROR: &str = "Error loading blog posts. Please try again.";

struct ListingPage {
    posts: Vec<BlogPost>,
    total: usize,
    facets: Facets,
}

#[derive(Serialize)]
struct ListingJson<'a> {
    success: bool,
    posts: &'a [PostSummary],
    pagination: &'a Pagination,
    total_posts: usize,
    page: usize,
    total_pages: usize,
    filters: &'a FilterState,
    facets: &'a Facets,
    metadata: &'a BlogPageMetadata,
}

#[derive(Serialize)]
struct PostJson<'a> {
    success: bool,
    #[serde(flatten)]
    post: &'a PostDetail,
    metadata: &'a BlogPageMetadata,
}

fn query_pairs(raw: Option<&str>) -> Vec<(String, String)> {
    raw.map(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .into_owned()
            .collect()
    })
    .unwrap_or_default()
}

fn not_found_json() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "Post not found" })),
    )
        .into_response()
}

pub async fn blog_index_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<BlogQuery>,
    RawQuery(raw): RawQuery,
) -> Response {
    let pairs = query_pairs(raw.as_deref());
    let page = pairs
        .iter()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(1);

    render_listing(&app_state, &headers, &uri, query.into(), page, &pairs).await
}

/// `/blog/<n>` is a listing page; any other segment is a post slug.
pub async fn blog_segment_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Path(segment): Path<String>,
    Query(query): Query<BlogQuery>,
    RawQuery(raw): RawQuery,
) -> Response {
    match segment.parse::<usize>() {
        Ok(page) => {
            let pairs = query_pairs(raw.as_deref());
            render_listing(&app_state, &headers, &uri, query.into(), page, &pairs).await
        }
        Err(_) => render_post_by_slug(&app_state, &headers, segment).await,
    }
}

async fn load_listing(
    app_state: &AppState,
    filter: &PostFilter,
    page: usize,
) -> Result<ListingPage, BlogError> {
    let per_page = app_state.config.blog.posts_per_page.max(1);
    let filter = filter.clone();

    let listing = app_state
        .db
        .run(move |conn| {
            Ok(ListingPage {
                total: store::count_posts(conn, &filter)?,
                posts: store::list_posts(conn, &filter, page, per_page)?,
                facets: store::facets(conn)?,
            })
        })
        .await?;
    Ok(listing)
}

async fn render_listing(
    app_state: &AppState,
    headers: &HeaderMap,
    uri: &Uri,
    filter: PostFilter,
    page: usize,
    query: &[(String, String)],
) -> Response {
    let page = page.max(1);
    let app_title = &app_state.config.app.name;
    let request_url = absolute_url(
        app_state.config.app.base_url.as_deref(),
        headers,
        uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/blog"),
    );
    let ajax = is_ajax(headers);

    let listing = match load_listing(app_state, &filter, page).await {
        Ok(listing) => listing,
        Err(e) => {
            error!("Error fetching blog posts: {}", e);
            let mut metadata = blog_metadata(app_title, &[], &PostFilter::default(), &request_url);
            metadata.page_title = format!("Error - {}", app_title);
            metadata.meta_description = "An error occurred while loading blog posts.".to_string();
            let filters = FilterState::from(&PostFilter::default());

            if ajax {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "error": LOAD_ERROR,
                        "posts": [],
                        "page": 1,
                        "total_pages": 1,
                        "total_posts": 0,
                        "pagination": Pagination::default(),
                        "filters": filters,
                        "facets": Facets::default(),
                        "metadata": metadata,
                    })),
                )
                    .into_response();
            }

            let mut globals = liquid::object!({
                "app_name": app_title,
                "posts": Vec::<PostSummary>::new(),
                "page": 1,
                "total_pages": 1,
                "total_posts": 0,
                "pagination": Pagination::default(),
                "facets": Facets::default(),
                "notice": LOAD_ERROR,
                "level": "error",
            });
            flatten_into(&mut globals, &filters);
            flatten_into(&mut globals, &metadata);
            return app_state
                .template_engine
                .render_uncached("blog.html.liquid", globals)
                .await;
        }
    };

    let per_page = app_state.config.blog.posts_per_page.max(1);
    let pages = total_pages(listing.total, per_page);
    let posts: Vec<PostSummary> = listing.posts.iter().map(BlogPost::summary).collect();
    let pagination = paginate(page, pages, query);
    let filters = FilterState::from(&filter);
    let metadata = blog_metadata(app_title, &posts, &filter, &request_url);

    debug!(
        "Blog page {} of {} ({} posts, filtered: {})",
        page,
        pages,
        listing.total,
        filter.is_filtered()
    );

    if ajax {
        return Json(ListingJson {
            success: true,
            posts: &posts,
            pagination: &pagination,
            total_posts: listing.total,
            page,
            total_pages: pages,
            filters: &filters,
            facets: &listing.facets,
            metadata: &metadata,
        })
        .into_response();
    }

    let mut globals = liquid::object!({
        "app_name": app_title,
        "posts": posts,
        "page": page,
        "total_pages": pages,
        "total_posts": listing.total,
        "pagination": pagination,
        "facets": listing.facets,
    });
    flatten_into(&mut globals, &filters);
    flatten_into(&mut globals, &metadata);

    app_state
        .template_engine
        .render_uncached("blog.html.liquid", globals)
        .await
}

async fn render_post_by_slug(app_state: &AppState, headers: &HeaderMap, slug: String) -> Response {
    let lookup = app_state
        .db
        .run(move |conn| store::get_post_by_slug(conn, &slug))
        .await
        .map_err(BlogError::from)
        .and_then(|post| post.ok_or(BlogError::NotFound));

    let post = match lookup {
        Ok(post) => post.detail(),
        Err(BlogError::NotFound) if is_ajax(headers) => return not_found_json(),
        Err(BlogError::NotFound) => {
            return (StatusCode::NOT_FOUND, "Post not found").into_response();
        }
        Err(e) => {
            error!("Error fetching blog post by slug: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let metadata = post_metadata(&app_state.config.app.name, &post);

    if is_ajax(headers) {
        return Json(PostJson {
            success: true,
            post: &post,
            metadata: &metadata,
        })
        .into_response();
    }

    let mut globals = liquid::object!({
        "app_name": app_state.config.app.name,
        "post": post,
    });
    flatten_into(&mut globals, &metadata);
    app_state
        .template_engine
        .render_page("blog_post.html.liquid", globals)
        .await
}

pub async fn blog_post_detail_handler(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Response {
    match app_state.db.run(move |conn| store::get_post(conn, id)).await {
        Ok(Some(post)) => {
            let post = post.detail();
            let metadata = post_metadata(&app_state.config.app.name, &post);
            Json(PostJson {
                success: true,
                post: &post,
                metadata: &metadata,
            })
            .into_response()
        }
        Ok(None) => not_found_json(),
        Err(e) => {
            error!("Error fetching blog post {}: {}", id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Error loading post" })),
            )
                .into_response()
        }
    }
}

pub async fn blog_filters_handler(State(app_state): State<AppState>) -> Response {
    match app_state.db.run(store::filter_values).await {
        Ok(values) => Json(json!({
            "success": true,
            "categories": values.categories,
            "provinces": values.provinces,
            "cities": values.cities,
            "authors": values.authors,
        }))
        .into_response(),
        Err(e) => {
            error!("Error fetching filter options: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Error loading filters" })),
            )
                .into_response()
        }
    }
}

pub async fn blog_image_handler(
    State(app_state): State<AppState>,
    Path(path): Path<String>,
) -> Response {
    app_state.blog_images.serve(&path).await
}
