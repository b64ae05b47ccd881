mod common;

use axum::http::{StatusCode, header};
use common::{TestSite, admin_auth, basic_auth};
use galleria::blog::store;

fn post_form(title: &str) -> Vec<(&'static str, String)> {
    vec![
        ("title", title.to_string()),
        ("slug", "vesuvio-at-dawn".to_string()),
        ("date", "2024-06-01".to_string()),
        ("author", "Giulia".to_string()),
        ("category", "Nature".to_string()),
        ("province", "Napoli".to_string()),
        ("city", "".to_string()),
        ("image", "".to_string()),
        ("excerpt", "Sunrise over the volcano.".to_string()),
        ("content", "<p>We left at four.</p>".to_string()),
    ]
}

#[tokio::test]
async fn test_admin_requires_credentials() {
    let site = TestSite::new();
    let server = site.server().await;

    let response = server.get("/admin").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.header(header::WWW_AUTHENTICATE),
        r#"Basic realm="admin""#
    );

    let (name, value) = basic_auth("curator", "wrong");
    server
        .get("/admin/add")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    server
        .post("/admin/delete/1")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let (name, value) = admin_auth();
    let response = server.get("/admin").add_header(name, value).await;
    response.assert_status_ok();
    assert!(response.text().contains("No posts yet."));
}

#[tokio::test]
async fn test_add_edit_delete_post() {
    let site = TestSite::new();
    let state = site.state().await;
    let server = axum_test::TestServer::new(galleria::build_router(state.clone())).unwrap();

    let (name, value) = admin_auth();
    let form = server
        .get("/admin/add")
        .add_header(name.clone(), value.clone())
        .await;
    form.assert_status_ok();
    assert!(form.text().contains(r#"action="/admin/add""#));

    let added = server
        .post("/admin/add")
        .add_header(name.clone(), value.clone())
        .form(&post_form("Vesuvio at Dawn"))
        .await;
    added.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(
        added.header(header::LOCATION),
        "/admin?notice=Post+added+successfully%21&level=success"
    );

    let posts = state.db.run(store::all_posts).await.unwrap();
    assert_eq!(posts.len(), 1);
    let id = posts[0].id;
    assert_eq!(posts[0].slug.as_deref(), Some("vesuvio-at-dawn"));
    assert_eq!(posts[0].city, None);

    let index = server
        .get("/admin?notice=Post+added+successfully%21&level=success")
        .add_header(name.clone(), value.clone())
        .await;
    let html = index.text();
    assert!(html.contains("Vesuvio at Dawn"));
    assert!(html.contains("Post added successfully!"));
    assert!(html.contains(&format!("/admin/edit/{}", id)));

    let edit_form = server
        .get(&format!("/admin/edit/{}", id))
        .add_header(name.clone(), value.clone())
        .await;
    edit_form.assert_status_ok();
    let html = edit_form.text();
    assert!(html.contains(r#"value="Vesuvio at Dawn""#));
    assert!(html.contains("&lt;p&gt;We left at four.&lt;/p&gt;"));

    let updated = server
        .post(&format!("/admin/edit/{}", id))
        .add_header(name.clone(), value.clone())
        .form(&post_form("Vesuvio at Sunrise"))
        .await;
    updated.assert_status(StatusCode::SEE_OTHER);
    let post = state
        .db
        .run(move |conn| store::get_post(conn, id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(post.title, "Vesuvio at Sunrise");
    assert!(post.modified_date.is_some());

    let deleted = server
        .post(&format!("/admin/delete/{}", id))
        .add_header(name.clone(), value.clone())
        .await;
    deleted.assert_status(StatusCode::SEE_OTHER);
    assert!(state.db.run(store::all_posts).await.unwrap().is_empty());

    let missing = server
        .get(&format!("/admin/edit/{}", id))
        .add_header(name, value)
        .await;
    missing.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(
        missing.header(header::LOCATION),
        "/admin?notice=Post+not+found.&level=error"
    );
}

#[tokio::test]
async fn test_incomplete_post_is_redisplayed() {
    let site = TestSite::new();
    let state = site.state().await;
    let server = axum_test::TestServer::new(galleria::build_router(state.clone())).unwrap();

    let mut form = post_form("Half written");
    form.retain(|(key, _)| *key != "excerpt");

    let (name, value) = admin_auth();
    let response = server
        .post("/admin/add")
        .add_header(name, value)
        .form(&form)
        .await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("All required fields must be filled."));
    assert!(html.contains(r#"value="Half written""#));
    assert!(state.db.run(store::all_posts).await.unwrap().is_empty());
}
