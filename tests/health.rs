use axum_storefront_api::routes::health::health_check;

#[tokio::test]
async fn health_check_reports_service_identity() {
    let response = health_check().await;
    let body = response.0;
    assert_eq!(body.message, "Service is up");
    assert!(body.meta.is_none());

    let data = body.data.expect("health data");
    assert_eq!(data.status, "ok");
    assert_eq!(data.service, "axum-storefront-api");
    assert_eq!(data.version, env!("CARGO_PKG_VERSION"));
}
