use crate::gateway::{ApiRequest, Gateway, GatewayError, Method};
use crate::models::{BackupResult, DatabaseStats};

pub fn database_stats(gateway: &Gateway) -> Result<DatabaseStats, GatewayError> {
    gateway.fetch(&ApiRequest::new(Method::Get, &["api", "admin", "database", "stats"]))
}

pub fn backup(gateway: &Gateway) -> Result<BackupResult, GatewayError> {
    gateway.fetch(&ApiRequest::new(Method::Get, &["api", "admin", "database", "backup"]))
}
