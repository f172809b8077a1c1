//! A thin `warp`-based HTTP façade over the DAL: `GET /v1/info`, `POST /v1/identity`,
//! `GET /v1/identity/{address}`. No business logic beyond constructing and reading back an
//! `Identity` document — the chat/profile/templating surfaces this system's original prototype
//! exposed are out of scope (§6).
use guarantor::dal::Dal;
use guarantor::docdiff::Identity;
use guarantor_crypto::{Ed25519KeyPair, KeyPair};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

#[derive(Debug)]
struct ApiError(guarantor::GuarantorError);

impl warp::reject::Reject for ApiError {}

fn reject(e: impl Into<guarantor::GuarantorError>) -> Rejection {
    warp::reject::custom(ApiError(e.into()))
}

#[derive(Serialize)]
struct InfoResponse {
    name: &'static str,
    version: &'static str,
}

#[derive(Deserialize)]
struct CreateIdentityRequest {
    #[serde(default)]
    props: serde_json::Value,
}

#[derive(Serialize)]
struct IdentityResponse {
    address: String,
    rev: String,
    document: serde_json::Value,
}

async fn info() -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&InfoResponse {
        name: "guarantor",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

async fn create_identity(dal: Arc<Dal>, body: CreateIdentityRequest) -> Result<impl Reply, Rejection> {
    let key = Ed25519KeyPair::generate();
    let address = key.address().to_string();
    let props = if body.props.is_null() { serde_json::json!({}) } else { body.props };

    if dal
        .find_one(Identity::DOCTYPE, &[("address", &address)])
        .map_err(reject)?
        .is_some()
    {
        return Err(warp::reject::custom(ApiError(guarantor::GuarantorError::Validation(
            format!("identity {address} already exists"),
        ))));
    }

    let mut wrapper = dal
        .create(&key, Identity::DOCTYPE, serde_json::json!({"address": address, "props": props}))
        .map_err(reject)?;
    wrapper.save(&dal).map_err(reject)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&IdentityResponse {
            address,
            rev: wrapper.head_rev().as_str().to_owned(),
            document: wrapper.doc.fields().clone(),
        }),
        StatusCode::CREATED,
    ))
}

async fn get_identity(address: String, dal: Arc<Dal>) -> Result<impl Reply, Rejection> {
    let found = dal
        .find_one(Identity::DOCTYPE, &[("address", &address)])
        .map_err(reject)?;
    match found {
        Some(wrapper) => Ok(warp::reply::with_status(
            warp::reply::json(&IdentityResponse {
                address,
                rev: wrapper.head_rev().as_str().to_owned(),
                document: wrapper.doc.fields().clone(),
            }),
            StatusCode::OK,
        )),
        None => Err(warp::reject::not_found()),
    }
}

fn with_dal(dal: Arc<Dal>) -> impl Filter<Extract = (Arc<Dal>,), Error = Infallible> + Clone {
    warp::any().map(move || dal.clone())
}

/// Builds the full route tree over `dal`.
pub fn routes(dal: Arc<Dal>) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let info_route = warp::path!("v1" / "info").and(warp::get()).and_then(info);

    let create_route = warp::path!("v1" / "identity")
        .and(warp::post())
        .and(with_dal(dal.clone()))
        .and(warp::body::json())
        .and_then(create_identity);

    let get_route = warp::path!("v1" / "identity" / String)
        .and(warp::get())
        .and(with_dal(dal))
        .and_then(get_identity);

    info_route.or(create_route).or(get_route).recover(handle_rejection)
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_owned())
    } else if let Some(ApiError(e)) = err.find() {
        tracing::debug!(error = %e, "request failed");
        (StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR), e.to_string())
    } else {
        (StatusCode::BAD_REQUEST, "bad request".to_owned())
    };
    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({"error": message})),
        status,
    ))
}

/// Serves `routes(dal)` on `addr` until the process is killed.
pub async fn serve(dal: Arc<Dal>, addr: std::net::SocketAddr) {
    warp::serve(routes(dal)).run(addr).await;
}
