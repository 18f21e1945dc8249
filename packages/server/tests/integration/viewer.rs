use crate::common::{TestApp, decode_qr, routes};

#[tokio::test]
async fn end_to_end_upload_then_view_pdf() {
    let app = TestApp::spawn().await;
    let alice = app
        .create_authenticated_user("Alice", "alice@example.com")
        .await;
    let me = app.get_as(&alice, routes::ME).await;
    assert_eq!(me.status, 200);

    let uploaded = app
        .upload(
            "alice@example.com",
            "report.pdf",
            b"0123456789".to_vec(),
            "application/pdf",
        )
        .await;
    assert_eq!(uploaded.status, 200, "{}", uploaded.text);
    assert_eq!(uploaded.body["data"]["name"], "report.pdf");
    assert_eq!(uploaded.body["data"]["size"], 10);
    assert!(uploaded.str("/qrCode").starts_with("data:image/png;base64,"));
    let id = uploaded.str("/data/id");
    let url = uploaded.str("/data/url");

    let fetched = app.get(&routes::file(id)).await;
    assert_eq!(fetched.body, uploaded.body["data"]);

    // The QR code leads to the viewer page.
    let viewer_link = decode_qr(uploaded.str("/qrCode"));
    let page = app.client.get(&viewer_link).send().await.unwrap();
    assert_eq!(page.status().as_u16(), 200);
    assert!(
        page.headers()[reqwest::header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );
    let html = page.text().await.unwrap();
    assert!(html.contains(&format!(
        "<iframe src=\"{url}\" title=\"report.pdf\" width=\"100%\" height=\"750px\">"
    )));
}

#[tokio::test]
async fn images_are_shown_inline() {
    let app = TestApp::spawn().await;
    app.register("Alice", "alice@example.com", "pw123").await;
    let uploaded = app
        .upload(
            "alice@example.com",
            "licence.png",
            b"\x89PNG\r\n\x1a\nfakepng".to_vec(),
            "image/png",
        )
        .await;
    let id = uploaded.str("/data/id");

    let res = app.get(&routes::viewer(id)).await;

    assert_eq!(res.status, 200);
    assert!(res.text.contains(&format!(
        "<img src=\"{}\" alt=\"licence.png\" style=\"max-width:100%\">",
        uploaded.str("/data/url")
    )));
    assert!(!res.text.contains("<iframe"));
}

#[tokio::test]
async fn viewer_follows_replaced_content() {
    let app = TestApp::spawn().await;
    app.register("Alice", "alice@example.com", "pw123").await;
    let uploaded = app
        .upload(
            "alice@example.com",
            "licence.png",
            b"\x89PNG\r\n\x1a\nfakepng".to_vec(),
            "image/png",
        )
        .await;
    let id = uploaded.str("/data/id");
    let replaced = app
        .replace(id, "licence.pdf", b"%PDF-1.4\n%".to_vec(), "application/pdf")
        .await;
    assert_eq!(replaced.status, 200, "{}", replaced.text);

    let res = app.get(&routes::viewer(id)).await;

    assert!(res.text.contains(&format!("<iframe src=\"{}\"", replaced.str("/data/url"))));
}

#[tokio::test]
async fn unknown_or_malformed_ids_render_not_found_page() {
    let app = TestApp::spawn().await;

    for id in ["01936f0e-1234-7abc-8000-000000000001", "garbage"] {
        let res = app.get(&routes::viewer(id)).await;
        assert_eq!(res.status, 404);
        assert!(
            res.content_type
                .as_deref()
                .is_some_and(|ct| ct.starts_with("text/html"))
        );
        assert!(res.text.contains("File not found"));
    }
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let app = TestApp::spawn().await;

    let res = app.get("/").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.text, "API is running");

    let res = app.get("/api/nope").await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn objects_outside_uploads_are_not_served() {
    let app = TestApp::spawn().await;

    let res = app.get("/objects/.tmp/anything").await;
    assert_eq!(res.status, 404);

    let res = app.get("/objects/uploads/missing/file.pdf").await;
    assert_eq!(res.status, 404);
}
