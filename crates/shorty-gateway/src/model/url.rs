use serde::{Deserialize, Serialize};
use shorty_core::ShortLink;

#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub original: String,
    pub short_url: String,
    pub short_code: String,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub count: usize,
    pub urls: Vec<ShortLink>,
}
