use axum::body::Body;
use tower::layer::util::{Identity, Stack};
use tower::ServiceBuilder;
use tower_http::limit::ResponseBody as LimitResponseBody;
use tower_http::map_response_body::MapResponseBodyLayer;
use tower_http::trace::HttpMakeClassifier;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Large rosters arrive as one snapshot, so the cap is generous.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub fn stack() -> ServiceBuilder<
    Stack<
        RequestBodyLimitLayer,
        Stack<
            MapResponseBodyLayer<fn(LimitResponseBody<Body>) -> Body>,
            Stack<CorsLayer, Stack<TraceLayer<HttpMakeClassifier>, Identity>>,
        >,
    >,
> {
    // `Cors` requires the inner response body to implement `Default`, which the
    // body limiter's wrapper does not; box it back into `axum::body::Body` so
    // the stack type-checks without reordering the layers.
    ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(MapResponseBodyLayer::new(
            Body::new as fn(LimitResponseBody<Body>) -> Body,
        ))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}
