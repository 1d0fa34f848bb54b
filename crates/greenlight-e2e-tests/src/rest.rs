use anyhow::Result;
use greenlight_dal::movie::Movie;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Debug, Deserialize)]
struct MovieEnvelope {
    movie: Movie,
}

pub fn movies_url(base_url: &Url) -> Url {
    base_url.join("v1/movies").unwrap()
}

pub async fn create_movie(
    client: &reqwest::Client,
    base_url: &Url,
    title: &str,
    year: i32,
    runtime: i32,
    genres: &[&str],
) -> Result<Movie> {
    let payload = json!({
        "title": title,
        "year": year,
        "runtime": format!("{runtime} mins"),
        "genres": genres,
    });

    let response = client
        .post(movies_url(base_url))
        .json(&payload)
        .send()
        .await?;
    info!("Create response: {:#?}", response);
    assert_eq!(response.status().as_u16(), 201);

    let envelope: MovieEnvelope = response.json().await?;
    Ok(envelope.movie)
}

pub async fn get_movie(client: &reqwest::Client, base_url: &Url, id: i64) -> Result<Movie> {
    let url = crate::extend_url(&movies_url(base_url), id);
    let response = client.get(url).send().await?.error_for_status()?;
    let envelope: MovieEnvelope = response.json().await?;
    Ok(envelope.movie)
}
