use guarantor_api::routes;
use guarantor_dal::Dal;
use guarantor_kvstore::{Mode, Store};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::test::request;

fn dal() -> Arc<Dal> {
    let store = Store::open_temporary(Mode::ReadWrite).unwrap();
    Arc::new(Dal::new(store, 2))
}

#[tokio::test]
async fn info_reports_the_package_name() {
    let reply = request().method("GET").path("/v1/info").reply(&routes(dal())).await;
    assert_eq!(reply.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(reply.body()).unwrap();
    assert_eq!(body["name"], "guarantor");
}

#[tokio::test]
async fn create_then_get_identity_round_trips() {
    let routes = routes(dal());

    let created = request()
        .method("POST")
        .path("/v1/identity")
        .json(&serde_json::json!({"props": {"name": "bob"}}))
        .reply(&routes)
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body: serde_json::Value = serde_json::from_slice(created.body()).unwrap();
    let address = body["address"].as_str().unwrap().to_owned();

    let fetched = request()
        .method("GET")
        .path(&format!("/v1/identity/{address}"))
        .reply(&routes)
        .await;
    assert_eq!(fetched.status(), StatusCode::OK);
    let fetched: serde_json::Value = serde_json::from_slice(fetched.body()).unwrap();
    assert_eq!(fetched["document"]["props"]["name"], "bob");
}

#[tokio::test]
async fn get_unknown_identity_is_404() {
    let reply = request()
        .method("GET")
        .path("/v1/identity/does-not-exist")
        .reply(&routes(dal()))
        .await;
    assert_eq!(reply.status(), StatusCode::NOT_FOUND);
}
