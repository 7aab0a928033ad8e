mod app;
mod path;

pub use app::{TestApp, TestRequest, TestResponse};
pub use path::{resolve_path, tokenize_path, PathToken};
