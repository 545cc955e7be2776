//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{
    analyze_video, creator_insights, enhance_video, generate_recommendations, generate_thumbnail, get_analysis,
    get_analysis_status, health_check, moderate_content, search_content,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, rate_limit_middleware, request_id, request_logging, security_headers, IpRateLimiter};
use crate::state::AppContext;

/// Create the API router.
pub fn create_router(ctx: AppContext, metrics_handle: Option<PrometheusHandle>) -> Router {
    let rate_limiter = IpRateLimiter::new(ctx.config.rate_limit_rps);

    let feature_routes = Router::new()
        .route("/analyze-video", post(analyze_video))
        .route("/generate-recommendations", post(generate_recommendations))
        .route("/moderate-content", post(moderate_content))
        .route("/generate-thumbnail", post(generate_thumbnail))
        .route("/enhance-video", post(enhance_video))
        .route("/search", post(search_content))
        .route("/creator-insights", post(creator_insights))
        .route("/videos/:video_id/analysis-status", get(get_analysis_status))
        .route("/videos/:video_id/analysis", get(get_analysis))
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware));

    let health_routes = Router::new().route("/health", get(health_check));

    let metrics_routes = match metrics_handle {
        Some(handle) => Router::new().route("/metrics", get(move || async move { handle.render() })),
        None => Router::new(),
    };

    let cors = cors_layer(&ctx.config.cors_origins);
    let max_body_size = ctx.config.max_body_size;

    Router::new()
        .merge(feature_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(middleware::from_fn(request_logging))
                .layer(middleware::from_fn(request_id))
                .layer(middleware::from_fn(security_headers))
                .layer(middleware::from_fn(metrics_middleware)),
        )
        .with_state(ctx)
}
