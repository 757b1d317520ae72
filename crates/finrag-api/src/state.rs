use finrag_retrieval::session::DocumentSession;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<DocumentSession>,
}

impl AppState {
    pub fn new(session: Arc<DocumentSession>) -> Self {
        Self { session }
    }
}
