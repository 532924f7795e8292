use crate::infra::{ApiContext, AppState, DEFAULT_PAGE_LIMIT};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use workforce_data::error::AppError;
use workforce_data::ingest::{UploadError, UploadModel, UploadSummary};
use workforce_data::reports::{self, AboveMeanRow, QuarterlyHiresRow};
use workforce_data::store::HiringStore;

/// Hiring endpoints plus the operational surface.
pub(crate) fn with_hiring_routes<S>(context: Arc<ApiContext<S>>) -> Router
where
    S: HiringStore + 'static,
{
    hiring_router(context)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

/// Router for the CSV upload, report, and browse endpoints.
pub(crate) fn hiring_router<S>(context: Arc<ApiContext<S>>) -> Router
where
    S: HiringStore + 'static,
{
    Router::new()
        .route("/upload/csv/:model", post(upload_csv_endpoint::<S>))
        .route(
            "/reports/hires/departments/q/:year",
            get(hires_by_quarter_endpoint::<S>),
        )
        .route(
            "/reports/hires/departments/mean/:year",
            get(above_mean_endpoint::<S>),
        )
        .route("/departments", get(list_departments_endpoint::<S>))
        .route("/departments/:id", get(get_department_endpoint::<S>))
        .route("/jobs", get(list_jobs_endpoint::<S>))
        .route("/jobs/:id", get(get_job_endpoint::<S>))
        .route("/employees", get(list_employees_endpoint::<S>))
        .route("/employees/:id", get(get_employee_endpoint::<S>))
        .with_state(context)
}

pub(crate) async fn upload_csv_endpoint<S>(
    State(context): State<Arc<ApiContext<S>>>,
    Path(model): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<UploadSummary>, AppError>
where
    S: HiringStore + 'static,
{
    let model: UploadModel = model.parse()?;
    let payload = read_csv_field(&mut multipart).await?;
    let summary = context.ingestor.ingest(model, payload.as_ref())?;
    Ok(Json(summary))
}

/// Pull the first file-bearing field out of the multipart body. Fields
/// without a filename are treated as the file only when named `file`.
async fn read_csv_field(multipart: &mut Multipart) -> Result<axum::body::Bytes, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| UploadError::UnreadableUpload(err.to_string()))?
    {
        if field.file_name().is_none() && field.name() != Some("file") {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|err| UploadError::UnreadableUpload(err.to_string()))?;
        return Ok(bytes);
    }

    Err(UploadError::MissingFile.into())
}

pub(crate) async fn hires_by_quarter_endpoint<S>(
    State(context): State<Arc<ApiContext<S>>>,
    Path(year): Path<i32>,
) -> Result<Json<Vec<QuarterlyHiresRow>>, AppError>
where
    S: HiringStore + 'static,
{
    let rows = reports::hires_by_quarter(context.store.as_ref(), year)?;
    Ok(Json(rows))
}

pub(crate) async fn above_mean_endpoint<S>(
    State(context): State<Arc<ApiContext<S>>>,
    Path(year): Path<i32>,
) -> Result<Json<Vec<AboveMeanRow>>, AppError>
where
    S: HiringStore + 'static,
{
    let rows = reports::above_mean_departments(context.store.as_ref(), year)?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageParams {
    #[serde(default)]
    offset: usize,
    limit: Option<usize>,
}

impl PageParams {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT)
    }
}

pub(crate) async fn list_departments_endpoint<S>(
    State(context): State<Arc<ApiContext<S>>>,
    Query(page): Query<PageParams>,
) -> Response
where
    S: HiringStore + 'static,
{
    match context.store.departments(page.offset, page.limit()) {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(crate) async fn get_department_endpoint<S>(
    State(context): State<Arc<ApiContext<S>>>,
    Path(id): Path<i64>,
) -> Response
where
    S: HiringStore + 'static,
{
    match context.store.department(id) {
        Ok(Some(department)) => (StatusCode::OK, Json(department)).into_response(),
        Ok(None) => not_found("department", id),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(crate) async fn list_jobs_endpoint<S>(
    State(context): State<Arc<ApiContext<S>>>,
    Query(page): Query<PageParams>,
) -> Response
where
    S: HiringStore + 'static,
{
    match context.store.jobs(page.offset, page.limit()) {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(crate) async fn get_job_endpoint<S>(
    State(context): State<Arc<ApiContext<S>>>,
    Path(id): Path<i64>,
) -> Response
where
    S: HiringStore + 'static,
{
    match context.store.job(id) {
        Ok(Some(job)) => (StatusCode::OK, Json(job)).into_response(),
        Ok(None) => not_found("job", id),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(crate) async fn list_employees_endpoint<S>(
    State(context): State<Arc<ApiContext<S>>>,
    Query(page): Query<PageParams>,
) -> Response
where
    S: HiringStore + 'static,
{
    match context.store.employees(page.offset, page.limit()) {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(crate) async fn get_employee_endpoint<S>(
    State(context): State<Arc<ApiContext<S>>>,
    Path(id): Path<i64>,
) -> Response
where
    S: HiringStore + 'static,
{
    match context.store.employee(id) {
        Ok(Some(employee)) => (StatusCode::OK, Json(employee)).into_response(),
        Ok(None) => not_found("employee", id),
        Err(err) => AppError::from(err).into_response(),
    }
}

fn not_found(kind: &str, id: i64) -> Response {
    let payload = json!({ "error": format!("{kind} {id} not found") });
    (StatusCode::NOT_FOUND, Json(payload)).into_response()
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use workforce_data::store::InMemoryHiringStore;

    const BOUNDARY: &str = "workforce-test-boundary";

    fn test_app() -> Router {
        let store = Arc::new(InMemoryHiringStore::default());
        hiring_router(Arc::new(ApiContext::new(store)))
    }

    fn multipart_upload(uri: &str, csv: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"upload.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {csv}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request builds")
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        serde_json::from_slice(&bytes).expect("body is json")
    }

    #[tokio::test]
    async fn upload_then_report_roundtrip() {
        let app = test_app();

        for (uri, csv) in [
            ("/upload/csv/departments", "1,Engineering\n"),
            ("/upload/csv/jobs", "1,Engineer\n"),
            (
                "/upload/csv/employees",
                "10,Ana Diaz,2021-01-11T08:00:00Z,1,1\n11,Lee Wong,2021-08-02T08:00:00Z,1,1\n",
            ),
        ] {
            let response = app
                .clone()
                .oneshot(multipart_upload(uri, csv))
                .await
                .expect("request runs");
            assert_eq!(response.status(), StatusCode::OK, "upload to {uri}");
        }

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/reports/hires/departments/q/2021")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("request runs");
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(
            body,
            json!([{
                "department": "Engineering",
                "job": "Engineer",
                "q1": 1,
                "q2": 0,
                "q3": 1,
                "q4": 0
            }])
        );
    }

    #[tokio::test]
    async fn upload_reports_row_failures_without_failing_the_request() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(multipart_upload(
                "/upload/csv/departments",
                "1,Engineering\nbroken-row\n",
            ))
            .await
            .expect("request runs");
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["model"], "departments");
        assert_eq!(body["processed"], 1);
        assert_eq!(body["failures"][0]["row"], 2);
    }

    #[tokio::test]
    async fn unknown_model_is_a_bad_request() {
        let app = test_app();
        let response = app
            .oneshot(multipart_upload("/upload/csv/payroll", "1,x\n"))
            .await
            .expect("request runs");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upload_without_a_file_field_is_a_bad_request() {
        let app = test_app();
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"notes\"\r\n\r\n\
             no file here\r\n\
             --{BOUNDARY}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/upload/csv/departments")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request builds");

        let response = app.oneshot(request).await.expect("request runs");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_csv_payload_is_a_bad_request() {
        let app = test_app();
        let response = app
            .oneshot(multipart_upload("/upload/csv/departments", ""))
            .await
            .expect("request runs");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_positive_year_is_a_bad_request() {
        let app = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/reports/hires/departments/mean/0")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("request runs");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn browse_endpoints_page_and_miss_correctly() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(multipart_upload(
                "/upload/csv/departments",
                "1,Engineering\n2,Sales\n3,Support\n",
            ))
            .await
            .expect("request runs");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/departments?offset=1&limit=1")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("request runs");
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body, json!([{ "id": 2, "name": "Sales" }]));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/departments/99")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("request runs");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
