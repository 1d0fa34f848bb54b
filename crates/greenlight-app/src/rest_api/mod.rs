pub mod movie;

use axum::{extract::State, response::IntoResponse, Json};
use greenlight_dal::Filters;
use http::StatusCode;
use serde_json::json;

use crate::state::AppState;

/// Listing query parameters as they come from the URL.
///
/// Page bounds and the sort value are checked by [`Filters`] validation.
#[derive(Debug, Clone, Default)]
pub struct Paging {
    pub(crate) page: Option<u32>,
    pub(crate) page_size: Option<u32>,
    pub(crate) sort: Option<String>,
}

impl Paging {
    pub fn into_filters(self, default_page_size: u32) -> Filters {
        let defaults = Filters::default();
        Filters {
            page: self.page.unwrap_or(defaults.page),
            page_size: self.page_size.unwrap_or(default_page_size),
            sort: self
                .sort
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.sort),
        }
    }
}

/// Splits a comma separated list, blank items are dropped.
pub(crate) fn parse_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg_attr(feature = "openapi",  utoipa::path(get, path = "/v1/healthcheck", tag = "Health", operation_id = "healthcheck",
    responses((status = StatusCode::OK, description = "Service status"))))]
pub async fn healthcheck(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "available",
            "system_info": {
                "environment": state.config().environment,
                "version": env!("CARGO_PKG_VERSION"),
            }
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging_defaults() {
        let filters = Paging::default().into_filters(50);
        assert_eq!(filters.page, 1);
        assert_eq!(filters.page_size, 50);
        assert_eq!(filters.sort, "id");

        let paging = Paging {
            page: Some(3),
            page_size: Some(10),
            sort: Some(" -title ".to_string()),
        };
        let filters = paging.into_filters(50);
        assert_eq!(filters, Filters::new(3, 10).with_sort("-title"));
    }

    #[test]
    fn test_parse_csv() {
        assert_eq!(parse_csv("drama, comedy,,"), vec!["drama", "comedy"]);
        assert!(parse_csv("").is_empty());
        assert!(parse_csv(" , ").is_empty());
    }
}
