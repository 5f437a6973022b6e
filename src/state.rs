use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;

/// The mutex serializes booking actions against the single SQLite
/// connection; each action still wraps its check-then-write in an
/// immediate transaction.
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
}
