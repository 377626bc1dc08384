pub mod adapters;
pub mod common;
pub mod health;
pub mod routes;
pub mod watches;

pub use adapters::get_adapters;
pub use health::health;
pub use routes::post_routes;
pub use watches::{delete_watch, get_watch, post_watch, refresh_watch};
