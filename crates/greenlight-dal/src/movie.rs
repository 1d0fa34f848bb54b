use std::time::Duration;

use futures::TryStreamExt as _;
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow as _, Pool, Row as _, types::Json};
use tracing::debug;

use crate::{
    Batch, ChosenRow, DEFAULT_QUERY_TIMEOUT, Error, Filters, ValidationErrors, calculate_metadata,
    error::Result, runtime::Runtime, search::TitleMatch, with_timeout,
};

pub const MAX_TITLE_BYTES: usize = 500;
pub const MIN_YEAR: i32 = 1888;
pub const MAX_GENRES: usize = 5;

fn validate_title(title: &str, _ctx: &()) -> garde::Result {
    if title.is_empty() {
        Err(garde::Error::new("must be provided"))
    } else if title.len() > MAX_TITLE_BYTES {
        Err(garde::Error::new("must not be more than 500 bytes long"))
    } else {
        Ok(())
    }
}

fn validate_year(year: &i32, _ctx: &()) -> garde::Result {
    let current_year = time::OffsetDateTime::now_utc().year();
    if *year == 0 {
        Err(garde::Error::new("must be provided"))
    } else if *year < MIN_YEAR {
        Err(garde::Error::new("must be greater than 1888"))
    } else if *year > current_year {
        Err(garde::Error::new("must not be in the future"))
    } else {
        Ok(())
    }
}

fn validate_runtime(runtime: &Runtime, _ctx: &()) -> garde::Result {
    match runtime.minutes() {
        0 => Err(garde::Error::new("must be provided")),
        m if m < 0 => Err(garde::Error::new("must be a positive integer")),
        _ => Ok(()),
    }
}

fn validate_genres(genres: &[String], _ctx: &()) -> garde::Result {
    if genres.is_empty() {
        return Err(garde::Error::new("must contain at least 1 genre"));
    }
    if genres.len() > MAX_GENRES {
        return Err(garde::Error::new("must not contain more than 5 genres"));
    }
    let has_duplicates = genres
        .iter()
        .enumerate()
        .any(|(i, genre)| genres[..i].contains(genre));
    if has_duplicates {
        return Err(garde::Error::new("must not contain duplicate values"));
    }
    Ok(())
}

fn validate_genres_provided(genres: &Option<Vec<String>>, ctx: &()) -> garde::Result {
    match genres {
        Some(genres) => validate_genres(genres, ctx),
        None => Err(garde::Error::new("must be provided")),
    }
}

/// Client settable fields of a new movie, missing fields deserialize as empty
/// and are reported by validation.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct CreateMovie {
    #[garde(custom(validate_title))]
    pub title: String,
    #[garde(custom(validate_year))]
    pub year: i32,
    #[garde(custom(validate_runtime))]
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "102 mins"))]
    pub runtime: Runtime,
    /// Absent and empty are reported differently.
    #[garde(custom(validate_genres_provided))]
    pub genres: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, sqlx::FromRow, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[garde(allow_unvalidated)]
pub struct Movie {
    pub id: i64,
    #[serde(skip_serializing, default = "unix_epoch")]
    #[cfg_attr(feature = "openapi", schema(ignore))]
    pub created_at: time::PrimitiveDateTime,
    #[garde(custom(validate_title))]
    pub title: String,
    #[garde(custom(validate_year))]
    pub year: i32,
    #[garde(custom(validate_runtime))]
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "102 mins"))]
    pub runtime: Runtime,
    #[garde(custom(validate_genres))]
    #[sqlx(json)]
    pub genres: Vec<String>,
    pub version: i64,
}

fn unix_epoch() -> time::PrimitiveDateTime {
    time::PrimitiveDateTime::new(
        time::OffsetDateTime::UNIX_EPOCH.date(),
        time::OffsetDateTime::UNIX_EPOCH.time(),
    )
}

impl Movie {
    /// All field violations of this record, empty when valid.
    pub fn violations(&self) -> ValidationErrors {
        match self.validate() {
            Ok(()) => ValidationErrors::default(),
            Err(report) => report.into(),
        }
    }
}

/// Partial update, absent fields keep the stored value.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateMovie {
    pub title: Option<String>,
    pub year: Option<i32>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, example = "102 mins"))]
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
}

impl UpdateMovie {
    pub fn apply_to(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(year) = self.year {
            movie.year = year;
        }
        if let Some(runtime) = self.runtime {
            movie.runtime = runtime;
        }
        if let Some(genres) = self.genres {
            movie.genres = genres;
        }
    }
}

const SELECT_COLUMNS: &str = "id, created_at, title, year, runtime, genres, version";

// ?1 - FTS5 match expression or NULL, ?2 - JSON array of required genres or NULL
const LIST_FILTER: &str = "(?1 IS NULL OR id IN (SELECT rowid FROM movies_fts WHERE movies_fts MATCH ?1)) \
AND (?2 IS NULL OR NOT EXISTS (SELECT 1 FROM json_each(?2) AS wanted \
WHERE wanted.value NOT IN (SELECT value FROM json_each(movies.genres))))";

pub type MovieRepository = MovieRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct MovieRepositoryImpl<E> {
    executor: E,
    timeout: Duration,
}

impl<'c, E> MovieRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn insert(&self, payload: CreateMovie) -> Result<Movie> {
        payload.validate()?;
        let genres = payload.genres.unwrap_or_default();
        let (id, created_at, version): (i64, time::PrimitiveDateTime, i64) = with_timeout(
            self.timeout,
            sqlx::query_as::<_, (i64, time::PrimitiveDateTime, i64)>(
                "INSERT INTO movies (title, year, runtime, genres) VALUES (?, ?, ?, ?) \
                RETURNING id, created_at, version",
            )
            .bind(&payload.title)
            .bind(payload.year)
            .bind(payload.runtime)
            .bind(Json(&genres))
            .fetch_one(&self.executor),
        )
        .await?;

        Ok(Movie {
            id,
            created_at,
            title: payload.title,
            year: payload.year,
            runtime: payload.runtime,
            genres,
            version,
        })
    }

    pub async fn get(&self, id: i64) -> Result<Movie> {
        if id < 1 {
            debug!("Movie id {id} is out of range");
            return Err(Error::RecordNotFound("Movie".to_string()));
        }
        let sql = format!("SELECT {SELECT_COLUMNS} FROM movies WHERE id = ?");
        let record = with_timeout(
            self.timeout,
            sqlx::query_as::<_, Movie>(&sql)
                .bind(id)
                .fetch_optional(&self.executor),
        )
        .await?;

        record.ok_or_else(|| Error::RecordNotFound("Movie".to_string()))
    }

    /// Stores the movie if its version is still current and bumps the version.
    pub async fn update(&self, movie: Movie) -> Result<Movie> {
        movie.validate()?;
        let new_version: Option<i64> = with_timeout(
            self.timeout,
            sqlx::query_scalar::<_, i64>(
                "UPDATE movies SET title = ?, year = ?, runtime = ?, genres = ?, version = version + 1 \
                WHERE id = ? AND version = ? RETURNING version",
            )
            .bind(&movie.title)
            .bind(movie.year)
            .bind(movie.runtime)
            .bind(Json(&movie.genres))
            .bind(movie.id)
            .bind(movie.version)
            .fetch_optional(&self.executor),
        )
        .await?;

        match new_version {
            Some(version) => Ok(Movie { version, ..movie }),
            None => {
                debug!(
                    "Update of movie {} at version {} matched no row",
                    movie.id, movie.version
                );
                Err(Error::EditConflict {
                    id: movie.id,
                    version: movie.version,
                })
            }
        }
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if id < 1 {
            debug!("Movie id {id} is out of range");
            return Err(Error::RecordNotFound("Movie".to_string()));
        }
        let res = with_timeout(
            self.timeout,
            sqlx::query("DELETE FROM movies WHERE id = ?")
                .bind(id)
                .execute(&self.executor),
        )
        .await?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound("Movie".to_string()))
        } else {
            Ok(())
        }
    }

    /// Filtered, sorted and paginated listing.
    ///
    /// Empty or missing `title` and missing `genres` put no constraint on the rows.
    /// The total in metadata counts all rows matching the filters, not just the page.
    pub async fn list(
        &self,
        title: Option<&str>,
        genres: Option<&[String]>,
        filters: &Filters,
    ) -> Result<Batch<Movie>> {
        let order = filters.sort_order()?;
        let title_match = TitleMatch::new(title);
        if title_match == TitleMatch::Nothing {
            debug!("Title search {title:?} has no searchable terms");
            return Ok(Batch::empty());
        }
        let match_expr = title_match.expression();

        let sql = format!(
            "SELECT count(*) OVER () AS total, {SELECT_COLUMNS} FROM movies WHERE {LIST_FILTER} \
            ORDER BY {order}, id ASC LIMIT ?3 OFFSET ?4"
        );
        let rows = with_timeout(
            self.timeout,
            sqlx::query(&sql)
                .bind(match_expr)
                .bind(genres.map(Json))
                .bind(filters.limit())
                .bind(filters.offset())
                .fetch(&self.executor)
                .try_collect::<Vec<ChosenRow>>(),
        )
        .await?;

        let mut total: i64 = 0;
        let mut movies = Vec::with_capacity(rows.len());
        for row in rows {
            total = row.try_get("total")?;
            movies.push(Movie::from_row(&row)?);
        }

        if movies.is_empty() && filters.page > 1 {
            // window count is only available when the page has rows
            let sql = format!("SELECT count(*) FROM movies WHERE {LIST_FILTER}");
            total = with_timeout(
                self.timeout,
                sqlx::query_scalar::<_, i64>(&sql)
                    .bind(match_expr)
                    .bind(genres.map(Json))
                    .fetch_one(&self.executor),
            )
            .await?;
        }

        let total = u64::try_from(total).unwrap_or_default();
        Ok(Batch {
            rows: movies,
            metadata: calculate_metadata(total, filters.page, filters.page_size),
        })
    }
}
