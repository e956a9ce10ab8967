use axum::response::Html;

const INDEX_PAGE: &str = include_str!("../../pages/index.html");

pub async fn home_handler() -> Html<&'static str> {
    Html(INDEX_PAGE)
}
