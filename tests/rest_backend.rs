// Integration tests for RestBackend against a mocked /api/departments API.

use housing_board::backends::{FetchScope, ImageBlob, ImageChange, ListingBackend, RestBackend};
use housing_board::{ListingDraft, ListingError, ListingId};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> RestBackend {
    RestBackend::new(server.uri(), Duration::from_secs(5)).unwrap()
}

fn draft() -> ListingDraft {
    ListingDraft {
        title: "Depto en Recoleta".to_string(),
        location: "Recoleta".to_string(),
        contact: "555-1234".to_string(),
        price: 950.0,
        bedrooms: 2,
        bathrooms: 1.0,
        description: "Cerca del cementerio".to_string(),
        owner_id: None,
    }
}

fn department(id: i64, user: Option<&str>) -> serde_json::Value {
    json!({
        "id": id,
        "title": format!("Depto {}", id),
        "location": "Recoleta",
        "contact": "555-1234",
        "price": 950.0,
        "bedrooms": 2,
        "bathrooms": 1.0,
        "description": "Cerca del cementerio",
        "image": "https://placehold.co/300x200/cccccc/FFFFFF?text=Sin+Imagen",
        "userId": user
    })
}

#[tokio::test]
async fn test_fetch_decodes_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/departments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            department(1, None),
            department(2, Some("u-1"))
        ])))
        .mount(&server)
        .await;

    let records = backend(&server).fetch_listings(&FetchScope::All).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, ListingId::Number(1));
    assert!(records[0].image_url.as_deref().unwrap().starts_with("https://placehold.co"));
}

#[tokio::test]
async fn test_owned_scope_is_filtered_locally() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/departments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            department(1, None),
            department(2, Some("u-1")),
            department(3, Some("u-2"))
        ])))
        .mount(&server)
        .await;

    let records = backend(&server)
        .fetch_listings(&FetchScope::OwnedBy("u-1".to_string()))
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, ListingId::Number(2));
}

#[tokio::test]
async fn test_malformed_record_is_skipped() {
    let server = MockServer::start().await;
    let mut off_shape = department(2, None);
    off_shape["price"] = json!("1200");
    off_shape["createdAt"] = json!({ "seconds": 1700000000, "nanoseconds": 0 });

    Mock::given(method("GET"))
        .and(path("/api/departments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            department(1, None),
            off_shape,
            { "title": "Sin id", "price": 500 },
            department(3, None)
        ])))
        .mount(&server)
        .await;

    let records = backend(&server).fetch_listings(&FetchScope::All).await.unwrap();
    let ids: Vec<ListingId> = records.iter().map(|r| r.id.clone()).collect();
    assert_eq!(
        ids,
        vec![ListingId::Number(1), ListingId::Number(2), ListingId::Number(3)]
    );
    assert_eq!(records[1].price, Some(1200.0));
    assert!(records[1].created_at.is_some());
}

#[tokio::test]
async fn test_server_error_is_transport() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/departments"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = backend(&server).fetch_listings(&FetchScope::All).await;
    match result {
        Err(ListingError::Transport { status, .. }) => assert_eq!(status, Some(503)),
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_transport() {
    let backend = RestBackend::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
    let result = backend.fetch_listings(&FetchScope::All).await;
    assert!(matches!(result, Err(ListingError::Transport { .. })));
}

#[tokio::test]
async fn test_create_sends_multipart_and_decodes_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/departments"))
        .and(body_string_contains("Depto en Recoleta"))
        .and(body_string_contains("filename=\"frente.png\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(department(11, None)))
        .expect(1)
        .mount(&server)
        .await;

    let image = ImageBlob::new("frente.png", vec![137, 80, 78, 71]).with_content_type("image/png");
    let record = backend(&server)
        .create_listing(&draft(), Some(&image))
        .await
        .unwrap();
    assert_eq!(record.id, ListingId::Number(11));
}

#[tokio::test]
async fn test_validation_errors_are_mapped_per_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/departments"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Error de validación",
            "errors": { "price": "El precio debe ser un número positivo." }
        })))
        .mount(&server)
        .await;

    let result = backend(&server).create_listing(&draft(), None).await;
    match result {
        Err(ListingError::Validation(errors)) => {
            assert_eq!(errors.get("price"), Some("El precio debe ser un número positivo."));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_update_keeps_image_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/departments/4"))
        .and(body_string_contains("image_url_unchanged"))
        .respond_with(ResponseTemplate::new(200).set_body_json(department(4, None)))
        .expect(1)
        .mount(&server)
        .await;

    let record = backend(&server)
        .update_listing(&ListingId::Number(4), &draft(), &ImageChange::Keep)
        .await
        .unwrap();
    assert_eq!(record.id, ListingId::Number(4));
}

#[tokio::test]
async fn test_update_missing_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/departments/404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Departamento no encontrado"
        })))
        .mount(&server)
        .await;

    let result = backend(&server)
        .update_listing(&ListingId::Number(404), &draft(), &ImageChange::Remove)
        .await;
    assert!(matches!(result, Err(ListingError::NotFound { .. })));
}

#[tokio::test]
async fn test_delete_forbidden_is_permission() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/departments/abc"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = backend(&server)
        .delete_listing(&ListingId::from("abc"), Some("u-2"))
        .await;
    assert!(matches!(result, Err(ListingError::Permission { .. })));
}

#[tokio::test]
async fn test_delete_ok() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/departments/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Departamento eliminado correctamente"
        })))
        .expect(1)
        .mount(&server)
        .await;

    backend(&server)
        .delete_listing(&ListingId::Number(5), None)
        .await
        .unwrap();
}
