use std::sync::Arc;

use crate::{
    core::{Config, Engine},
    subscribers::Subscribe,
};

/// Builder for constructing an [`Engine`] with optional subscribers.
pub struct EngineBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl EngineBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (activations, completions, rejected
    /// transitions, etc.) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds a single subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the engine and spawns its driver and fan-out tasks.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> Arc<Engine> {
        Arc::new(Engine::spawn(self.cfg, self.subscribers))
    }
}
