pub mod error;
pub mod rest_api;
pub mod state;
pub mod validate;

use axum::routing::get;

/// Builds a repository for each request from the shared pool, with the
/// configured query timeout.
#[macro_export]
macro_rules! repository_from_request {
    ($repo:ty) => {
        impl axum::extract::FromRequestParts<$crate::state::AppState> for $repo {
            type Rejection = http::StatusCode;

            fn from_request_parts(
                _parts: &mut http::request::Parts,
                state: &$crate::state::AppState,
            ) -> impl std::future::Future<Output = std::result::Result<Self, Self::Rejection>>
                   + core::marker::Send {
                futures::future::ready(std::result::Result::Ok(
                    <$repo>::new(state.pool().clone()).with_timeout(state.config().query_timeout),
                ))
            }
        }
    };
}

/// All `/v1` routes.
pub fn api_router() -> axum::Router<state::AppState> {
    axum::Router::new()
        .route("/v1/healthcheck", get(rest_api::healthcheck))
        .nest("/v1/movies", rest_api::movie::router())
}

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    #[derive(utoipa::OpenApi)]
    #[openapi(paths(rest_api::healthcheck))]
    struct RootDocs;

    use utoipa::OpenApi as _;
    RootDocs::openapi().nest("/v1/movies", rest_api::movie::api_docs())
}
