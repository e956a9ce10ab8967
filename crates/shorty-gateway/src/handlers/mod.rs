mod health;
mod home;
mod url;

pub use health::health_handler;
pub use home::home_handler;
pub use url::{list_handler, redirect_handler, shorten_handler, stats_handler};
