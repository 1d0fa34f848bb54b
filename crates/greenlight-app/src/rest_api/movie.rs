use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    response::IntoResponse,
    routing::get,
    Json,
};
use garde::Validate;
use greenlight_dal::movie::{CreateMovie, MovieRepository, UpdateMovie};
use http::{header, HeaderMap, StatusCode};
use serde_json::json;
use tracing::debug;

use crate::{
    error::{ApiError, ApiResult},
    repository_from_request,
    rest_api::{parse_csv, Paging},
    state::AppState,
    validate::Valid,
};

pub const EXPECTED_VERSION_HEADER: &str = "X-Expected-Version";

repository_from_request!(MovieRepository);

#[derive(Debug, Clone, Default, Validate, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[garde(allow_unvalidated)]
pub struct MovieQuery {
    #[garde(length(max = 500))]
    title: Option<String>,
    #[garde(length(max = 1000))]
    genres: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
    #[garde(length(max = 255))]
    sort: Option<String>,
}

impl MovieQuery {
    fn into_parts(self) -> (Option<String>, Option<Vec<String>>, Paging) {
        let genres = self
            .genres
            .as_deref()
            .map(parse_csv)
            .filter(|g| !g.is_empty());
        let paging = Paging {
            page: self.page,
            page_size: self.page_size,
            sort: self.sort,
        };
        (self.title, genres, paging)
    }
}

#[cfg_attr(feature = "openapi",  utoipa::path(get, path = "", tag = "Movie", operation_id = "listMovies",
    params(MovieQuery), responses((status = StatusCode::OK, description = "Movies matching the filters with pagination metadata"))))]
pub async fn list(
    repository: MovieRepository,
    State(state): State<AppState>,
    Valid(Query(query)): Valid<Query<MovieQuery>>,
) -> ApiResult<impl IntoResponse> {
    let (title, genres, paging) = query.into_parts();
    let filters = paging.into_filters(state.config().default_page_size);
    let batch = repository
        .list(title.as_deref(), genres.as_deref(), &filters)
        .await?;
    Ok((
        StatusCode::OK,
        Json(json!({"movies": batch.rows, "metadata": batch.metadata})),
    ))
}

#[cfg_attr(feature = "openapi",  utoipa::path(post, path = "", tag = "Movie", operation_id = "createMovie",
    request_body = CreateMovie,
    responses((status = StatusCode::CREATED, description = "Created movie", body = greenlight_dal::movie::Movie))))]
pub async fn create(
    repository: MovieRepository,
    Valid(Json(payload)): Valid<Json<CreateMovie>>,
) -> ApiResult<impl IntoResponse> {
    let movie = repository.insert(payload).await?;
    let location = format!("/v1/movies/{}", movie.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(json!({"movie": movie})),
    ))
}

#[cfg_attr(feature = "openapi",  utoipa::path(get, path = "/{id}", tag = "Movie", operation_id = "getMovie",
    params(("id" = i64, Path, description = "Movie id")),
    responses((status = StatusCode::OK, description = "Get one", body = greenlight_dal::movie::Movie))))]
pub async fn get_movie(
    id: Result<Path<i64>, PathRejection>,
    repository: MovieRepository,
) -> ApiResult<impl IntoResponse> {
    let Path(id) = id?;
    let movie = repository.get(id).await?;

    Ok((StatusCode::OK, Json(json!({"movie": movie}))))
}

#[cfg_attr(feature = "openapi",  utoipa::path(patch, path = "/{id}", tag = "Movie", operation_id = "updateMovie",
    params(("id" = i64, Path, description = "Movie id")),
    request_body = UpdateMovie,
    responses((status = StatusCode::OK, description = "Updated movie", body = greenlight_dal::movie::Movie))))]
pub async fn update(
    id: Result<Path<i64>, PathRejection>,
    repository: MovieRepository,
    headers: HeaderMap,
    payload: Result<Json<UpdateMovie>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let mut movie = repository.get(id).await?;

    if let Some(expected) = headers.get(EXPECTED_VERSION_HEADER) {
        let expected = expected.to_str().unwrap_or_default();
        if expected != movie.version.to_string() {
            debug!(
                "Movie {id} is at version {}, client expected {expected}",
                movie.version
            );
            return Err(ApiError::EditConflict);
        }
    }

    payload.apply_to(&mut movie);
    let movie = repository.update(movie).await?;

    Ok((StatusCode::OK, Json(json!({"movie": movie}))))
}

#[cfg_attr(feature = "openapi",  utoipa::path(delete, path = "/{id}", tag = "Movie", operation_id = "deleteMovie",
    params(("id" = i64, Path, description = "Movie id")),
    responses((status = StatusCode::OK, description = "Deleted successfully"))))]
pub async fn delete(
    id: Result<Path<i64>, PathRejection>,
    repository: MovieRepository,
) -> ApiResult<impl IntoResponse> {
    let Path(id) = id?;
    repository.delete(id).await?;

    Ok((
        StatusCode::OK,
        Json(json!({"message": "movie successfully deleted"})),
    ))
}

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(paths(list, create, get_movie, update, delete))]
struct ModuleDocs;

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    ModuleDocs::openapi()
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(list).post(create))
        .route(
            "/{id}",
            get(get_movie).patch(update).delete(delete),
        )
}
