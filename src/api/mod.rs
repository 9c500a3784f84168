pub mod envelope;
pub mod handlers;
pub mod operation;
pub mod routes;

pub use envelope::Envelope;
pub use operation::{dispatch, Operation, PresignRequest};
pub use routes::*;

use crate::context::AppContext;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub context: Arc<AppContext>,
}

impl AppState {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }
}
