mod admin;
pub(crate) mod blogs;
mod gateway;
mod objects;
pub(crate) mod officers;

pub use admin::{health, invoke};
pub use gateway::dispatch_http;
pub use objects::serve_object;
