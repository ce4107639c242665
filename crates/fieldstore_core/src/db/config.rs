//! Connection settings.

use super::schema::DomainTable;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings applied when a [`super::Connection`] creates or opens a file.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Period between flush requests raised by the scheduler.
    pub flush_interval: Duration,
    /// Whether the flush scheduler runs while the connection is open.
    pub auto_flush: bool,
    pub busy_timeout: Duration,
    /// Domain tables created, after the marker table, for new databases.
    pub tables: Vec<Arc<dyn DomainTable>>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            auto_flush: true,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            tables: Vec::new(),
        }
    }
}

impl ConnectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    pub fn auto_flush(mut self, enabled: bool) -> Self {
        self.auto_flush = enabled;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn table(mut self, table: Arc<dyn DomainTable>) -> Self {
        self.tables.push(table);
        self
    }
}

impl Debug for ConnectionConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let tables = self
            .tables
            .iter()
            .map(|table| table.name())
            .collect::<Vec<_>>();
        f.debug_struct("ConnectionConfig")
            .field("flush_interval", &self.flush_interval)
            .field("auto_flush", &self.auto_flush)
            .field("busy_timeout", &self.busy_timeout)
            .field("tables", &tables)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::ConnectionConfig;
    use crate::db::InfoTable;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn defaults_match_documented_values() {
        let config = ConnectionConfig::default();
        assert_eq!(config.flush_interval, Duration::from_secs(30));
        assert!(config.auto_flush);
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
        assert!(config.tables.is_empty());
    }

    #[test]
    fn builder_overrides_and_debug_lists_tables() {
        let config = ConnectionConfig::new()
            .flush_interval(Duration::from_millis(50))
            .auto_flush(false)
            .table(Arc::new(InfoTable));
        assert_eq!(config.flush_interval, Duration::from_millis(50));
        assert!(!config.auto_flush);
        assert!(format!("{config:?}").contains("INFOTABLE_V1"));
    }
}
