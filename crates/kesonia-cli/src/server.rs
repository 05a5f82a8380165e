//! HTTP surface.

use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use kesonia_core::{Decision, FinalizeRequest};
use serde::Serialize;
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{ApiError, LoanProcessingError};
use crate::service::LoanService;

pub fn router(service: LoanService) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/process-loan", post(process_loan))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

pub async fn serve(addr: SocketAddr, service: LoanService) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "kesonia listening");
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

// ── Handlers ──

async fn predict(
    State(service): State<LoanService>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Decision>, ApiError> {
    let Json(raw) = body.map_err(|r| ApiError::BadRequest(r.body_text()))?;
    Ok(Json(service.predict(&raw)?))
}

#[derive(Debug, Serialize)]
struct ProcessedLoan {
    success: bool,
    message: &'static str,
    requested_loan: f64,
}

async fn process_loan(
    State(service): State<LoanService>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ProcessedLoan>, LoanProcessingError> {
    let Json(raw) = body.map_err(|r| LoanProcessingError::BadRequest(r.body_text()))?;
    let request: FinalizeRequest = serde_json::from_value(raw)
        .map_err(|e| LoanProcessingError::BadRequest(e.to_string()))?;
    let requested_loan = service.process_loan(&request).await?;
    Ok(Json(ProcessedLoan {
        success: true,
        message: "Loan processed and saved to audit store",
        requested_loan,
    }))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use kesonia_core::AuditStatus;
    use kesonia_sync::{AuditSink, NoopSink};
    use serde_json::json;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    use crate::testing::{ChannelSink, FailingSink, applicant, context};

    fn app(logit: f64, sink: Arc<dyn AuditSink>) -> Router {
        router(LoanService::new(context(logit), sink))
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn predict_approves_and_prices() {
        let (status, body) = post_json(app(3.0, Arc::new(NoopSink)), "/predict", applicant()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["approved"], true);
        assert_eq!(body["approval_probability"], 0.9526);
        assert_eq!(body["loan_amount"], 8102.08);
        assert_eq!(body["interest_rate"], 5.0);
        assert_eq!(body["cluster"], "Prime");
    }

    #[tokio::test]
    async fn rejected_prediction_is_forwarded_to_sink() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (status, body) =
            post_json(app(-3.0, Arc::new(ChannelSink(tx))), "/predict", applicant()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "approved": false, "approval_probability": 0.0474 }));

        let row = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, AuditStatus::Rejected);
        assert_eq!(row.requested_loan, 0.0);
        assert_eq!(row.applicant.name, "Grace");
    }

    #[tokio::test]
    async fn rejected_prediction_survives_sink_failure() {
        let (status, body) = post_json(app(-3.0, Arc::new(FailingSink)), "/predict", applicant()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["approved"], false);
    }

    #[tokio::test]
    async fn approved_prediction_is_not_audited_yet() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let app = app(3.0, Arc::new(ChannelSink(tx)));
        let (status, _) = post_json(app, "/predict", applicant()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn predict_validation_error_is_400() {
        let mut raw = applicant();
        raw.as_object_mut().unwrap().remove("dti_ratio");
        let (status, body) = post_json(app(3.0, Arc::new(NoopSink)), "/predict", raw).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Missing field: dti_ratio" }));
    }

    #[tokio::test]
    async fn predict_malformed_json_is_400() {
        let request = Request::post("/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{ nope"))
            .unwrap();
        let response = app(3.0, Arc::new(NoopSink)).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    fn finalize_body() -> Value {
        let mut body = applicant();
        let obj = body.as_object_mut().unwrap();
        obj.insert("status".into(), json!("Approved"));
        obj.insert("requested_loan".into(), json!(10000));
        obj.insert("available_loan_limit".into(), json!(12000));
        obj.insert("interest_rate".into(), json!(6.5));
        body
    }

    #[tokio::test]
    async fn process_loan_forwards_final_row() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (status, body) =
            post_json(app(3.0, Arc::new(ChannelSink(tx))), "/process-loan", finalize_body()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["requested_loan"].as_f64(), Some(10000.0));

        let row = rx.recv().await.unwrap();
        assert_eq!(row.status, AuditStatus::Approved);
        assert_eq!(row.available_loan_limit, 12000.0);
        assert_eq!(row.interest_rate, 6.5);
        assert_eq!(row.requested_loan, 10000.0);
    }

    #[tokio::test]
    async fn process_loan_accepts_string_typed_echoes() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut body = finalize_body();
        body["age"] = json!("34");
        body["credit_score"] = json!("750");
        let (status, body) =
            post_json(app(3.0, Arc::new(ChannelSink(tx))), "/process-loan", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let row = rx.recv().await.unwrap();
        assert_eq!(row.applicant.age, 34.0);
        assert_eq!(row.applicant.credit_score, 750.0);
    }

    #[tokio::test]
    async fn process_loan_sink_failure_is_500() {
        let (status, body) =
            post_json(app(3.0, Arc::new(FailingSink)), "/process-loan", finalize_body()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({ "success": false, "error": "Failed to save to audit store" })
        );
    }

    #[tokio::test]
    async fn process_loan_requires_requested_loan() {
        let mut body = finalize_body();
        body.as_object_mut().unwrap().remove("requested_loan");
        let (status, body) = post_json(app(3.0, Arc::new(NoopSink)), "/process-loan", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required field: requested_loan");
    }

    #[tokio::test]
    async fn process_loan_rejects_unknown_status() {
        let mut body = finalize_body();
        body["status"] = json!("Rejected");
        let (status, body) = post_json(app(3.0, Arc::new(NoopSink)), "/process-loan", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid status for loan processing");
    }

    #[tokio::test]
    async fn health_reports_version() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let response = app(3.0, Arc::new(NoopSink)).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
