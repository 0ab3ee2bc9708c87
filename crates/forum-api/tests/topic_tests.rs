use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::common::test_app;

// ============================================================================
// Create & detail
// ============================================================================

#[tokio::test]
async fn test_create_topic_returns_location_and_summary() {
    let (client, _) = test_app();

    let response = client
        .post_json(
            "/topicos",
            &json!({
                "title": "Erro ao salvar",
                "message": "A entidade não é persistida",
                "courseId": 1
            }),
        )
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let id = body["id"].as_i64().unwrap();

    assert_eq!(
        response.header("location"),
        Some(format!("/topicos/{id}").as_str())
    );
    assert_eq!(body["title"], "Erro ao salvar");
    assert_eq!(body["message"], "A entidade não é persistida");
    assert_eq!(body["status"], "OPEN");
    assert_eq!(body["courseName"], "Spring Boot");
    assert!(body["creationDate"].is_string());
    assert!(body.get("courseCategory").is_none());
}

#[tokio::test]
async fn test_created_topic_detail_matches_input() {
    let (client, _) = test_app();

    let created = client
        .create_topic("Tag video", "Como usar a tag video?", 2)
        .await;
    let id = created["id"].as_i64().unwrap();

    let response = client.get(&format!("/topicos/{id}")).await;
    response.assert_status(StatusCode::OK);

    let detail: Value = response.json();
    assert_eq!(detail["id"], id);
    assert_eq!(detail["title"], "Tag video");
    assert_eq!(detail["message"], "Como usar a tag video?");
    assert_eq!(detail["courseName"], "HTML 5");
    assert_eq!(detail["courseCategory"], "Front-end");
    assert_eq!(detail["creationDate"], created["creationDate"]);
}

#[tokio::test]
async fn test_get_unknown_topic_is_not_found() {
    let (client, _) = test_app();

    let response = client.get("/topicos/999").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "Topic not found");
    assert_eq!(body["id"], 999);
}

#[tokio::test]
async fn test_get_with_non_numeric_id_is_bad_request() {
    let (client, _) = test_app();

    for response in [
        client.get("/topicos/abc").await,
        client.delete("/topicos/1.5").await,
        client
            .put_json("/topicos/abc", &json!({ "title": "t", "message": "m" }))
            .await,
    ] {
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.header("content-type"), Some("application/json"));
        let body: Value = response.json();
        assert!(body["error"].is_string());
    }
}

// ============================================================================
// Create validation
// ============================================================================

#[tokio::test]
async fn test_create_with_invalid_fields_never_persists() {
    let (client, store) = test_app();

    let invalid_bodies = vec![
        json!({ "title": "", "message": "message", "courseId": 1 }),
        json!({ "title": "title", "message": "", "courseId": 1 }),
        json!({ "title": "title", "message": "message" }),
        json!({ "message": "message", "courseId": 1 }),
        json!({}),
    ];

    for body in invalid_bodies {
        let response = client.post_json("/topicos", &body).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let error: Value = response.json();
        assert_eq!(error["error"], "Validation failed", "body: {body}");
        assert!(!error["fields"].as_array().unwrap().is_empty());
    }

    let empty = client.post_json("/topicos", &json!({})).await;
    let error: Value = empty.json();
    let fields: Vec<&str> = error["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["courseId", "message", "title"]);

    assert_eq!(store.topic_count().await, 0);
}

#[tokio::test]
async fn test_create_with_unknown_course_is_not_found() {
    let (client, store) = test_app();

    let response = client
        .post_json(
            "/topicos",
            &json!({ "title": "Java", "message": "Sem curso", "courseId": 42 }),
        )
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "Course not found");
    assert_eq!(body["id"], 42);
    assert_eq!(store.topic_count().await, 0);
}

#[tokio::test]
async fn test_create_when_store_fails_is_internal_error() {
    let (client, store) = test_app();
    store.fail_writes();

    let response = client
        .post_json(
            "/topicos",
            &json!({ "title": "Lost", "message": "Database is down", "courseId": 1 }),
        )
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body, json!({ "error": "Internal server error" }));
    assert!(response.header("location").is_none());
    assert_eq!(store.topic_count().await, 0);
}

#[tokio::test]
async fn test_create_with_malformed_json_is_bad_request() {
    let (client, _) = test_app();

    let response = client
        .send_raw_json("POST", "/topicos", "{\"title\": ".to_string())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].is_string());
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_defaults_to_five_newest_first() {
    let (client, _) = test_app();
    for i in 1..=7 {
        client
            .create_topic(&format!("Topic {i}"), "message", 1)
            .await;
    }

    let response = client.get("/topicos").await;
    response.assert_status(StatusCode::OK);
    let page: Value = response.json();

    assert_eq!(page["number"], 0);
    assert_eq!(page["size"], 5);
    assert_eq!(page["totalElements"], 7);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["first"], true);
    assert_eq!(page["last"], false);
    assert_eq!(client.list_ids("/topicos").await, vec![7, 6, 5, 4, 3]);
    assert_eq!(client.list_ids("/topicos?page=1").await, vec![2, 1]);
}

#[tokio::test]
async fn test_list_sorting_and_page_size() {
    let (client, _) = test_app();
    client.create_topic("Banana", "message", 1).await;
    client.create_topic("Apple", "message", 1).await;
    client.create_topic("Cherry", "message", 1).await;

    assert_eq!(
        client.list_ids("/topicos?sort=title,asc").await,
        vec![2, 1, 3]
    );
    assert_eq!(client.list_ids("/topicos?sort=title").await, vec![3, 1, 2]);
    assert_eq!(
        client.list_ids("/topicos?sort=id,asc&size=2").await,
        vec![1, 2]
    );
    assert_eq!(
        client.list_ids("/topicos?sort=creationDate,asc&size=2&page=1").await,
        vec![3]
    );
}

#[tokio::test]
async fn test_list_rejects_bad_paging() {
    let (client, _) = test_app();

    for uri in [
        "/topicos?sort=password",
        "/topicos?sort=id,sideways",
        "/topicos?size=0",
        "/topicos?page=-1",
        "/topicos?page=abc",
    ] {
        let response = client.get(uri).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_filtered_listing_is_subset_of_unfiltered() {
    let (client, _) = test_app();
    client.create_topic("Spring 1", "message", 1).await;
    client.create_topic("Html 1", "message", 2).await;
    client.create_topic("Spring 2", "message", 1).await;

    let all = client.list_ids("/topicos?size=100").await;
    let response = client
        .get("/topicos?courseName=Spring%20Boot&size=100")
        .await;
    response.assert_status(StatusCode::OK);
    let page: Value = response.json();
    let filtered = page["content"].as_array().unwrap();

    assert_eq!(filtered.len(), 2);
    assert_eq!(page["totalElements"], 2);
    for topic in filtered {
        assert_eq!(topic["courseName"], "Spring Boot");
        assert!(all.contains(&topic["id"].as_i64().unwrap()));
    }
}

#[tokio::test]
async fn test_course_name_scenario() {
    let (client, _) = test_app();

    let created = client
        .create_topic("Erro ao salvar", "Entity is not persisted", 1)
        .await;
    let id = created["id"].as_i64().unwrap();

    let detail: Value = client.get(&format!("/topicos/{id}")).await.json();
    assert_eq!(detail["courseName"], "Spring Boot");

    assert_eq!(
        client.list_ids("/topicos?courseName=Spring+Boot").await,
        vec![id]
    );

    let response = client.get("/topicos?courseName=Java").await;
    response.assert_status(StatusCode::OK);
    let page: Value = response.json();
    assert!(page["content"].as_array().unwrap().is_empty());
    assert_eq!(page["totalElements"], 0);
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_changes_title_and_message_only() {
    let (client, _) = test_app();
    let created = client.create_topic("Old title", "Old message", 2).await;
    let id = created["id"].as_i64().unwrap();

    let response = client
        .put_json(
            &format!("/topicos/{id}"),
            &json!({ "title": "New title", "message": "New message", "courseId": 1 }),
        )
        .await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["id"], id);
    assert_eq!(body["title"], "New title");
    assert_eq!(body["message"], "New message");
    assert_eq!(body["courseName"], "HTML 5");
    assert_eq!(body["creationDate"], created["creationDate"]);

    let detail: Value = client.get(&format!("/topicos/{id}")).await.json();
    assert_eq!(detail["title"], "New title");
    assert_eq!(detail["courseName"], "HTML 5");
}

#[tokio::test]
async fn test_update_unknown_topic_changes_nothing() {
    let (client, _) = test_app();
    let created = client.create_topic("Stays", "Unchanged", 1).await;

    let response = client
        .put_json(
            "/topicos/999",
            &json!({ "title": "Ghost", "message": "Nobody home" }),
        )
        .await;

    response.assert_status(StatusCode::NOT_FOUND);

    let listing: Value = client.get("/topicos").await.json();
    let content = listing["content"].as_array().unwrap();
    assert_eq!(content.len(), 1);
    assert_eq!(content[0]["id"], created["id"]);
    assert_eq!(content[0]["title"], "Stays");
}

#[tokio::test]
async fn test_update_with_empty_fields_is_rejected() {
    let (client, _) = test_app();
    let created = client.create_topic("Title", "Message", 1).await;
    let id = created["id"].as_i64().unwrap();

    let response = client
        .put_json(
            &format!("/topicos/{id}"),
            &json!({ "title": "", "message": "" }),
        )
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let detail: Value = client.get(&format!("/topicos/{id}")).await.json();
    assert_eq!(detail["title"], "Title");
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_twice() {
    let (client, _) = test_app();
    let created = client.create_topic("Temporary", "To be removed", 1).await;
    let id = created["id"].as_i64().unwrap();
    let uri = format!("/topicos/{id}");

    let first = client.delete(&uri).await;
    first.assert_status(StatusCode::OK);
    assert!(first.body.is_empty());

    client.delete(&uri).await.assert_status(StatusCode::NOT_FOUND);
    client.get(&uri).await.assert_status(StatusCode::NOT_FOUND);
    assert!(client.list_ids("/topicos").await.is_empty());
}
