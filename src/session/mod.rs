pub mod models;
pub mod service;

pub use models::{Principal, SESSION_COLLECTION, SessionRecord};
pub use service::SessionService;
