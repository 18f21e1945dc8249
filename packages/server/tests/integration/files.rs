use std::sync::Arc;

use reqwest::multipart::Form;
use serde_json::json;

use crate::common::{FailingStore, TestApp, decode_qr, routes};

const PDF_BYTES: &[u8] = b"%PDF-1.4\n%";
const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfakepng";

mod upload {
    use super::*;

    #[tokio::test]
    async fn upload_stores_file_and_binds_qr_code() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com", "pw123").await;

        let res = app
            .upload("alice@example.com", "report.pdf", PDF_BYTES.to_vec(), "application/pdf")
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "File uploaded successfully");
        let id = res.str("/data/id").to_string();
        assert_eq!(res.body["data"]["name"], "report.pdf");
        assert_eq!(res.body["data"]["size"], 10);
        assert_eq!(res.body["data"]["contentType"], "application/pdf");

        let qr = res.str("/qrCode");
        assert!(qr.starts_with("data:image/png;base64,"));
        assert_eq!(res.body["data"]["qrCode"], res.body["qrCode"]);
        assert_eq!(
            decode_qr(qr),
            format!("http://{}/TRADELICENCE/{id}", app.addr)
        );

        let url = res.str("/data/url");
        let fetched = app.client.get(url).send().await.unwrap();
        assert_eq!(fetched.status().as_u16(), 200);
        assert_eq!(fetched.bytes().await.unwrap().as_ref(), PDF_BYTES);
    }

    #[tokio::test]
    async fn two_uploads_of_the_same_file_are_independent() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com", "pw123").await;

        let a = app
            .upload("alice@example.com", "report.pdf", PDF_BYTES.to_vec(), "application/pdf")
            .await;
        let b = app
            .upload("alice@example.com", "report.pdf", PDF_BYTES.to_vec(), "application/pdf")
            .await;

        assert_eq!(a.status, 200);
        assert_eq!(b.status, 200);
        assert_ne!(a.str("/data/id"), b.str("/data/id"));
        assert_ne!(a.str("/data/url"), b.str("/data/url"));
        assert_eq!(app.file_count().await, 2);
        assert_eq!(app.stored_object_count(), 2);
    }

    #[tokio::test]
    async fn missing_file_is_rejected_without_side_effects() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com", "pw123").await;

        let form = Form::new().text("email", "alice@example.com");
        let res = app.upload_form(form).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["message"], "No file uploaded");
        assert_eq!(app.file_count().await, 0);
        assert_eq!(app.stored_object_count(), 0);
    }

    #[tokio::test]
    async fn missing_email_is_rejected() {
        let app = TestApp::spawn().await;

        let form = Form::new().part(
            "file",
            TestApp::file_part("report.pdf", PDF_BYTES.to_vec(), "application/pdf"),
        );
        let res = app.upload_form(form).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.file_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_owner_is_not_found_and_nothing_is_stored() {
        let app = TestApp::spawn().await;

        let res = app
            .upload("ghost@example.com", "report.pdf", PDF_BYTES.to_vec(), "application/pdf")
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
        assert_eq!(app.file_count().await, 0);
        assert_eq!(app.stored_object_count(), 0);
    }

    #[tokio::test]
    async fn unsupported_type_is_rejected() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com", "pw123").await;

        let res = app
            .upload("alice@example.com", "run.sh", b"#!/bin/sh".to_vec(), "text/x-shellscript")
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.file_count().await, 0);
    }

    #[tokio::test]
    async fn generic_content_type_is_guessed_from_filename() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com", "pw123").await;

        let res = app
            .upload(
                "alice@example.com",
                "licence.png",
                PNG_BYTES.to_vec(),
                "application/octet-stream",
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"]["contentType"], "image/png");
    }

    #[tokio::test]
    async fn unsafe_filename_is_rejected() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com", "pw123").await;

        let res = app
            .upload("alice@example.com", ".hidden.pdf", PDF_BYTES.to_vec(), "application/pdf")
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn storage_failure_is_surfaced_and_creates_no_record() {
        let app = TestApp::spawn_with_store(Arc::new(FailingStore)).await;
        app.register("Alice", "alice@example.com", "pw123").await;

        let res = app
            .upload("alice@example.com", "report.pdf", PDF_BYTES.to_vec(), "application/pdf")
            .await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "UPSTREAM_FAILURE");
        assert!(res.str("/message").contains("bucket unreachable"));
        assert_eq!(app.file_count().await, 0);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected_without_side_effects() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com", "pw123").await;

        let mut bytes = PDF_BYTES.to_vec();
        bytes.resize(1024 * 1024 + 1, b'a');
        let res = app
            .upload("alice@example.com", "big.pdf", bytes, "application/pdf")
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.file_count().await, 0);
        assert_eq!(app.stored_object_count(), 0);
    }

    #[tokio::test]
    async fn non_multipart_body_gets_a_json_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::UPLOAD, &json!({"email": "alice@example.com"}))
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(!res.str("/message").is_empty());
    }

    #[tokio::test]
    async fn qr_failure_keeps_the_record_without_a_qr_code() {
        let long_path = format!("/{}", "x".repeat(4000));
        let app = TestApp::spawn_with_public_path(&long_path).await;
        app.register("Alice", "alice@example.com", "pw123").await;

        let res = app
            .upload("alice@example.com", "report.pdf", PDF_BYTES.to_vec(), "application/pdf")
            .await;

        assert_eq!(res.status, 500, "{}", res.text);
        assert_eq!(res.body["code"], "UPSTREAM_FAILURE");
        assert_eq!(app.file_count().await, 1);

        let listed = app.get(routes::FILES).await;
        let id = listed.str("/0/id").to_string();
        let res = app.get(&routes::file(&id)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["qrCode"].is_null());

        let fetched = app.client.get(res.str("/url")).send().await.unwrap();
        assert_eq!(fetched.status().as_u16(), 200);
        assert_eq!(fetched.bytes().await.unwrap().as_ref(), PDF_BYTES);
    }
}

mod retrieval {
    use super::*;

    #[tokio::test]
    async fn get_by_id_returns_the_stored_record() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com", "pw123").await;
        let uploaded = app
            .upload("alice@example.com", "report.pdf", PDF_BYTES.to_vec(), "application/pdf")
            .await;
        let id = uploaded.str("/data/id");

        let res = app.get(&routes::file(id)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body, uploaded.body["data"]);
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids_are_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .get(&routes::file("01936f0e-1234-7abc-8000-000000000001"))
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");

        let res = app.get(&routes::file("not-a-uuid")).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn list_returns_every_file_newest_first() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com", "pw123").await;
        app.register("Bob", "bob@example.com", "pw123").await;
        let first = app
            .upload("alice@example.com", "a.pdf", PDF_BYTES.to_vec(), "application/pdf")
            .await;
        let second = app
            .upload("bob@example.com", "b.png", PNG_BYTES.to_vec(), "image/png")
            .await;

        let res = app.get(routes::FILES).await;

        assert_eq!(res.status, 200);
        let ids: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, [second.str("/data/id"), first.str("/data/id")]);
    }

    #[tokio::test]
    async fn list_is_empty_without_uploads() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::FILES).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body, json!([]));
    }

    #[tokio::test]
    async fn list_by_owner_only_returns_that_owners_files() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com", "pw123").await;
        app.register("Bob", "bob@example.com", "pw123").await;
        let a1 = app
            .upload("alice@example.com", "a1.pdf", PDF_BYTES.to_vec(), "application/pdf")
            .await;
        app.upload("bob@example.com", "b.pdf", PDF_BYTES.to_vec(), "application/pdf")
            .await;
        let a2 = app
            .upload("alice@example.com", "a2.png", PNG_BYTES.to_vec(), "image/png")
            .await;

        let res = app
            .post_json(routes::FILES_BY_OWNER, &json!({"email": "alice@example.com"}))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let names: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["a2.png", "a1.pdf"]);
        let owner = a1.body["data"]["ownerId"].clone();
        assert_eq!(a2.body["data"]["ownerId"], owner);
    }

    #[tokio::test]
    async fn list_by_unknown_owner_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::FILES_BY_OWNER, &json!({"email": "ghost@example.com"}))
            .await;

        assert_eq!(res.status, 404);
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn replacing_content_keeps_id_and_qr_code() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com", "pw123").await;
        let original = app
            .upload("alice@example.com", "report.pdf", PDF_BYTES.to_vec(), "application/pdf")
            .await;
        let id = original.str("/data/id");

        let res = app
            .replace(id, "licence.png", PNG_BYTES.to_vec(), "image/png")
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "File updated successfully");
        assert_eq!(res.str("/data/id"), id);
        assert_eq!(res.body["data"]["name"], "licence.png");
        assert_eq!(res.body["data"]["size"], PNG_BYTES.len());
        assert_eq!(res.body["data"]["contentType"], "image/png");
        assert_ne!(res.str("/data/url"), original.str("/data/url"));
        assert_eq!(res.body["data"]["qrCode"], original.body["qrCode"]);

        let fetched = app.client.get(res.str("/data/url")).send().await.unwrap();
        assert_eq!(fetched.bytes().await.unwrap().as_ref(), PNG_BYTES);

        let stored = app.get(&routes::file(id)).await;
        assert_eq!(stored.body, res.body["data"]);
    }

    #[tokio::test]
    async fn replacing_unknown_file_is_not_found_and_stores_nothing() {
        let app = TestApp::spawn().await;

        let res = app
            .replace(
                "01936f0e-1234-7abc-8000-000000000001",
                "report.pdf",
                PDF_BYTES.to_vec(),
                "application/pdf",
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(app.stored_object_count(), 0);
    }
}

mod deletion {
    use ::common::storage::ObjectKey;

    use super::*;

    async fn upload_as_alice(app: &TestApp) -> String {
        let res = app
            .upload("alice@example.com", "report.pdf", PDF_BYTES.to_vec(), "application/pdf")
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        res.str("/data/id").to_string()
    }

    #[tokio::test]
    async fn owner_can_delete_and_object_is_removed() {
        let app = TestApp::spawn().await;
        let alice = app
            .create_authenticated_user("Alice", "alice@example.com")
            .await;
        let id = upload_as_alice(&app).await;
        assert_eq!(app.stored_object_count(), 1);

        let res = app.delete_as(&alice, &routes::file(&id)).await;

        assert_eq!(res.status, 204, "{}", res.text);
        assert_eq!(app.get(&routes::file(&id)).await.status, 404);
        assert_eq!(app.file_count().await, 0);
        assert_eq!(app.stored_object_count(), 0);
    }

    #[tokio::test]
    async fn other_users_cannot_delete() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com", "pw123").await;
        let bob = app.create_authenticated_user("Bob", "bob@example.com").await;
        let id = upload_as_alice(&app).await;

        let res = app.delete_as(&bob, &routes::file(&id)).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
        assert_eq!(app.file_count().await, 1);
    }

    #[tokio::test]
    async fn admin_can_delete_any_file() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com", "pw123").await;
        let admin = app.admin_client().await;
        let id = upload_as_alice(&app).await;
        let stored = app.get(&routes::file(&id)).await;
        let url = stored.str("/url");
        let key = url
            .split_once("/objects/")
            .map(|(_, key)| ObjectKey::parse(key).unwrap())
            .unwrap();

        let res = app.delete_as(&admin, &routes::file(&id)).await;

        assert_eq!(res.status, 204);
        assert!(!app.store.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn anonymous_delete_is_unauthorized() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com", "pw123").await;
        let id = upload_as_alice(&app).await;

        let res = app.delete_as(&TestApp::new_client(), &routes::file(&id)).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
        assert_eq!(app.file_count().await, 1);
    }
}
