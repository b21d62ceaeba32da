//! Event delivery to the application layer

use anyhow::Result;
use serde_json::Value;

/// Sink for named JSON events, implemented by the host application's UI bridge.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: &str, payload: Value) -> Result<()>;
}
