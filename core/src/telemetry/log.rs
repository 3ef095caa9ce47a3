use log::{debug, info};

/// Logger tagged with the component that owns it.
pub struct LogManager {
    scope: &'static str,
}

impl LogManager {
    pub fn new() -> Self {
        Self::scoped("rashtra")
    }

    pub fn scoped(scope: &'static str) -> Self {
        Self { scope }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.scope, message);
    }

    pub fn debug(&self, message: &str) {
        debug!("[{}] {}", self.scope, message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
