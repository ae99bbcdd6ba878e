mod compose;
pub mod dispatch;
pub mod handlers;
mod links;
pub mod response;
mod routes;

pub use dispatch::{Dispatcher, InboundRequest, Route, Unroutable};
pub use links::LinkSigner;
pub use response::{ApiError, Envelope};
pub use routes::create_router;
