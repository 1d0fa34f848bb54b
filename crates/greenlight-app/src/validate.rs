use axum::extract::{FromRequest, FromRequestParts, Request};
use garde::Validate;
use http::request::Parts;
use std::ops::{Deref, DerefMut};

use crate::error::ApiError;
use crate::state::AppState;

/// Extractor wrapper, runs `garde` validation on the extracted value.
///
/// Rejections of the inner extractor and validation failures are both
/// reported as [`ApiError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Valid<E>(pub E);

impl<E> Deref for Valid<E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<E> DerefMut for Valid<E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<E> Valid<E> {
    pub fn into_inner(self) -> E {
        self.0
    }
}

impl<Extractor, T> FromRequest<AppState> for Valid<Extractor>
where
    T: Validate<Context = ()>,
    Extractor: Deref<Target = T> + FromRequest<AppState>,
    ApiError: From<<Extractor as FromRequest<AppState>>::Rejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let inner = Extractor::from_request(req, state).await?;
        inner.deref().validate().map_err(|report| ApiError::ValidationFailed(report.into()))?;
        Ok(Valid(inner))
    }
}

impl<Extractor, T> FromRequestParts<AppState> for Valid<Extractor>
where
    T: Validate<Context = ()>,
    Extractor: Deref<Target = T> + FromRequestParts<AppState>,
    ApiError: From<<Extractor as FromRequestParts<AppState>>::Rejection>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let inner = Extractor::from_request_parts(parts, state).await?;
        inner.deref().validate().map_err(|report| ApiError::ValidationFailed(report.into()))?;
        Ok(Valid(inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_deref_and_into_inner() {
        let mut v = Valid(String::from("movie"));
        assert_eq!(v.deref(), "movie");
        v.deref_mut().push_str("s");
        assert_eq!(v.into_inner(), "movies");
    }
}
