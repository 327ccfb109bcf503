use axum::response::IntoResponse;

pub async fn metrics() -> impl IntoResponse {
    service_core::observability::get_metrics()
}
