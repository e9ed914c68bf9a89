use std::sync::Arc;

use crate::db::{AccountStore, UserStore};
use crate::services::auth::AuthHandler;

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub users: Arc<dyn UserStore>,
    pub auth: AuthHandler,
}
