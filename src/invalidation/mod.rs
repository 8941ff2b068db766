use std::sync::Arc;
use tokio::sync::RwLock;

/// Named tags emitted after a successful store mutation so read-side caches
/// can refresh. The delivery mechanism is whatever sinks are registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationTag {
    Members,
    Events,
    Submissions,
}

impl InvalidationTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidationTag::Members => "db:members",
            InvalidationTag::Events => "db:events",
            InvalidationTag::Submissions => "db:submissions",
        }
    }
}

pub trait InvalidationSink: Send + Sync {
    fn name(&self) -> &str;
    fn invalidate(&self, tag: InvalidationTag);
}

pub struct InvalidationManager {
    sinks: RwLock<Vec<Arc<dyn InvalidationSink>>>,
}

impl InvalidationManager {
    pub fn new() -> Self {
        Self {
            sinks: RwLock::new(Vec::new()),
        }
    }

    pub async fn register(&self, sink: Arc<dyn InvalidationSink>) {
        let mut sinks = self.sinks.write().await;
        tracing::info!("Registered invalidation sink: {}", sink.name());
        sinks.push(sink);
    }

    pub async fn notify(&self, tags: &[InvalidationTag]) {
        let sinks = self.sinks.read().await;

        for sink in sinks.iter() {
            for tag in tags {
                sink.invalidate(*tag);
            }
        }
    }
}

impl Default for InvalidationManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Default sink: records invalidations in the log stream.
pub struct LogSink;

impl InvalidationSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn invalidate(&self, tag: InvalidationTag) {
        tracing::debug!("Cache invalidation: {}", tag.as_str());
    }
}
