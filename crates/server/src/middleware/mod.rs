pub mod auth;
pub mod model_loaders;

pub use auth::require_admin;
pub use model_loaders::{load_media_middleware, load_story_middleware};
