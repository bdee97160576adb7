//! REST API handlers.
//!
//! Each handler validates its request, delegates to the sizing engine, and
//! returns JSON responses in a consistent envelope.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use sizer_core::error::SizingError;
use sizer_core::types::{MachineSet, Platform, WorkloadDescriptor};
use sizer_engine::metrics::ClusterOverCommit;
use sizer_engine::sizing::{size, ClusterSizing};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

fn status_for(err: &SizingError) -> StatusCode {
    match err {
        SizingError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        SizingError::NotSchedulable { .. } | SizingError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

// ── Sizing ─────────────────────────────────────────────────────────

/// Request body for `POST /size/custom`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeRequest {
    pub platform: Option<Platform>,
    #[serde(default)]
    pub machine_sets: Option<Vec<MachineSet>>,
    #[serde(default)]
    pub workloads: Vec<WorkloadDescriptor>,
    #[serde(default)]
    pub detailed: bool,
}

/// Summary-only view of a sizing result, returned unless `detailed` is set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SizingSummary {
    node_count: usize,
    zones: usize,
    #[serde(rename = "totalCPU")]
    total_cpu: u64,
    total_memory: u64,
    over_commit: ClusterOverCommit,
}

impl From<&ClusterSizing> for SizingSummary {
    fn from(sizing: &ClusterSizing) -> Self {
        Self {
            node_count: sizing.node_count,
            zones: sizing.zones,
            total_cpu: sizing.total_cpu,
            total_memory: sizing.total_memory,
            over_commit: sizing.over_commit.clone(),
        }
    }
}

/// POST /size/custom
pub async fn size_custom(
    State(state): State<ApiState>,
    Json(req): Json<SizeRequest>,
) -> impl IntoResponse {
    let Some(platform) = req.platform else {
        return error_response("platform is required", StatusCode::BAD_REQUEST).into_response();
    };
    if req.workloads.is_empty() {
        return error_response("workloads must not be empty", StatusCode::BAD_REQUEST)
            .into_response();
    }

    match size(&req.workloads, platform, req.machine_sets, &state.policy) {
        Ok(sizing) if req.detailed => ApiResponse::ok(sizing).into_response(),
        Ok(sizing) => ApiResponse::ok(SizingSummary::from(&sizing)).into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "sizing request failed");
            error_response(&err.to_string(), status_for(&err)).into_response()
        }
    }
}

// ── Catalog ────────────────────────────────────────────────────────

/// GET /size/platforms
pub async fn list_platforms() -> impl IntoResponse {
    let platforms: Vec<&'static str> = Platform::ALL.iter().map(|p| p.as_str()).collect();
    ApiResponse::ok(platforms)
}

/// GET /size/instances/{platform}
pub async fn platform_instances(Path(platform): Path<String>) -> impl IntoResponse {
    // Unknown names fall back to the AWS catalog.
    let platform = Platform::from(platform);
    match sizer_core::instances_for_platform(platform) {
        Ok(instances) => ApiResponse::ok(instances).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sizer_core::policy::ControlPlanePolicy;
    use sizer_core::types::{OverCommitMode, ServiceDescriptor};
    use std::sync::Arc;

    fn test_state() -> ApiState {
        ApiState {
            policy: Arc::new(ControlPlanePolicy::default()),
        }
    }

    fn test_workload(name: &str, cpu: f64, memory: f64) -> WorkloadDescriptor {
        WorkloadDescriptor {
            name: name.to_string(),
            count: 1,
            uses_machines: Vec::new(),
            services: vec![ServiceDescriptor {
                name: format!("{name}-svc"),
                required_cpu: cpu,
                required_memory: memory,
                limit_cpu: None,
                limit_memory: None,
                min_limit_cpu: None,
                max_limit_cpu: None,
                min_limit_memory: None,
                max_limit_memory: None,
                over_commit_mode: OverCommitMode::None,
                zones: 1,
                runs_with: Vec::new(),
                avoid: Vec::new(),
            }],
            allow_control_plane: None,
            require_control_plane: false,
        }
    }

    fn test_request(workloads: Vec<WorkloadDescriptor>) -> SizeRequest {
        SizeRequest {
            platform: Some(Platform::Aws),
            machine_sets: None,
            workloads,
            detailed: false,
        }
    }

    #[tokio::test]
    async fn size_custom_returns_summary() {
        let req = test_request(vec![test_workload("app", 2.0, 4.0)]);
        let resp = size_custom(State(test_state()), Json(req)).await;
        let resp = resp.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_platform_is_bad_request() {
        let mut req = test_request(vec![test_workload("app", 2.0, 4.0)]);
        req.platform = None;
        let resp = size_custom(State(test_state()), Json(req)).await;
        let resp = resp.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_workloads_is_bad_request() {
        let req = test_request(vec![]);
        let resp = size_custom(State(test_state()), Json(req)).await;
        let resp = resp.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unschedulable_workload_is_internal_error() {
        // The AWS default instance is far too small for 1000 cores.
        let req = test_request(vec![test_workload("huge", 1000.0, 20.0)]);
        let resp = size_custom(State(test_state()), Json(req)).await;
        let resp = resp.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn invalid_reference_is_bad_request() {
        let mut wl = test_workload("app", 2.0, 4.0);
        wl.services[0].runs_with = vec!["ghost".to_string()];
        let req = test_request(vec![wl]);
        let resp = size_custom(State(test_state()), Json(req)).await;
        let resp = resp.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn platforms_route_lists_all() {
        let resp = list_platforms().await;
        let resp = resp.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn instances_route_accepts_any_platform_name() {
        let resp = platform_instances(Path("AZURE".to_string())).await;
        let resp = resp.into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        // Unknown platforms fall back to AWS rather than failing.
        let resp = platform_instances(Path("unknown-cloud".to_string())).await;
        let resp = resp.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
