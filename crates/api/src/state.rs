use std::sync::Arc;

use yamdb_core::confirmation::ConfirmationCodeGenerator;
use yamdb_mail::Mailer;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind `Arc` or is already a handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: yamdb_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Outbound email transport (SMTP, log, or in-memory in tests).
    pub mailer: Arc<dyn Mailer>,
    /// Confirmation-code generator, configured once at startup.
    pub codes: Arc<ConfirmationCodeGenerator>,
}
