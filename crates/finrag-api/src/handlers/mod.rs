mod ask;
mod documents;
mod health;

pub use ask::{analytics, ask, status};
pub use documents::upload_document;
pub use health::health_check;
