//! Sizing API regression tests.
//!
//! Drives the full router over HTTP semantics: request validation, the
//! response envelope, summary vs. detailed bodies, and error status codes.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use sizer_api::build_router;
use sizer_core::policy::ControlPlanePolicy;

fn size_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/size/custom")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn basic_body() -> Value {
    json!({
        "platform": "BareMetal",
        "machineSets": [
            {"name": "worker", "cpu": 32, "memory": 64, "numberOfDisks": 4}
        ],
        "workloads": [
            {
                "name": "app",
                "services": [
                    {"name": "api", "requiredCPU": 10, "requiredMemory": 20, "zones": 1}
                ]
            }
        ]
    })
}

#[tokio::test]
async fn size_custom_returns_summary_envelope() {
    let router = build_router(ControlPlanePolicy::default());

    let resp = router.oneshot(size_request(basic_body())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["nodeCount"], json!(1));
    assert_eq!(body["data"]["zones"], json!(1));
    assert_eq!(body["data"]["totalCPU"], json!(32));
    assert_eq!(body["data"]["totalMemory"], json!(64));
    // Summary responses omit per-node details.
    assert!(body["data"]["nodes"].is_null());
}

#[tokio::test]
async fn detailed_response_includes_nodes_and_zones() {
    let router = build_router(ControlPlanePolicy::default());

    let mut body = basic_body();
    body["detailed"] = json!(true);

    let resp = router.oneshot(size_request(body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["data"]["nodes"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["zoneDetails"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["services"].as_array().unwrap().len(), 1);
    assert!(body["data"]["nodes"][0]["riskLevel"].is_string());
}

#[tokio::test]
async fn missing_platform_is_rejected() {
    let router = build_router(ControlPlanePolicy::default());

    let mut body = basic_body();
    body.as_object_mut().unwrap().remove("platform");

    let resp = router.oneshot(size_request(body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = body_json(resp).await;
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("platform"));
}

#[tokio::test]
async fn empty_workloads_are_rejected() {
    let router = build_router(ControlPlanePolicy::default());

    let mut body = basic_body();
    body["workloads"] = json!([]);

    let resp = router.oneshot(size_request(body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unschedulable_workload_surfaces_as_500_with_message() {
    let router = build_router(ControlPlanePolicy::default());

    let mut body = basic_body();
    body["workloads"][0]["services"][0]["requiredCPU"] = json!(100);

    let resp = router.oneshot(size_request(body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(resp).await;
    assert_eq!(body["success"], json!(false));
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("app"));
    assert!(message.contains("CPU"));
}

#[tokio::test]
async fn dynamic_limits_survive_the_wire_format() {
    let router = build_router(ControlPlanePolicy::default());

    let body = json!({
        "platform": "BareMetal",
        "detailed": true,
        "machineSets": [
            {"name": "worker", "cpu": 16, "memory": 64, "numberOfDisks": 4}
        ],
        "workloads": [
            {
                "name": "app",
                "services": [
                    {
                        "name": "burst",
                        "requiredCPU": 2,
                        "requiredMemory": 8,
                        "minLimitCPU": 4,
                        "maxLimitCPU": 8,
                        "minLimitMemory": 16,
                        "maxLimitMemory": 32,
                        "overCommitMode": "dynamic"
                    }
                ]
            }
        ]
    });

    let resp = router.oneshot(size_request(body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    let node = &body["data"]["nodes"][0];
    assert_eq!(node["limitCPU"], json!({"min": 4.0, "max": 8.0}));
    assert_eq!(node["limitMemory"], json!({"min": 16.0, "max": 32.0}));
    assert_eq!(node["requestedCPU"], json!(2.0));
    assert_eq!(node["riskLevel"], json!("none"));
}

#[tokio::test]
async fn platforms_route_lists_every_platform() {
    let router = build_router(ControlPlanePolicy::default());

    let req = Request::builder()
        .uri("/size/platforms")
        .body(Body::empty())
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    let platforms = body["data"].as_array().unwrap();
    assert_eq!(platforms.len(), 8);
    assert!(platforms.contains(&json!("AWS")));
    assert!(platforms.contains(&json!("IBM-VPC")));
}

#[tokio::test]
async fn instances_route_serves_platform_catalogs() {
    let router = build_router(ControlPlanePolicy::default());

    let req = Request::builder()
        .uri("/size/instances/GCP")
        .body(Body::empty())
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert!(!body["data"].as_array().unwrap().is_empty());
}
