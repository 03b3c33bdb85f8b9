//! Shared application state.

use std::sync::Arc;

use irori_shared::time::Clock;

use crate::ai::AiProvider;
use crate::broadcast::Broadcaster;
use crate::metrics::Metrics;
use crate::rate_limit::RateLimitConfig;
use crate::registry::Registry;

pub struct AppState {
    /// Who is online right now.
    pub registry: Arc<Registry>,
    /// Fan-out engine over the registry.
    pub broadcaster: Broadcaster,
    /// Process-wide counters.
    pub metrics: Arc<Metrics>,
    /// Chat rate-limit policy applied to every session.
    pub chat_limit: RateLimitConfig,
    /// Outbound question answering.
    pub ai: Arc<dyn AiProvider>,
    /// AI requests allowed per user per minute.
    pub ai_rate_limit: u32,
    /// Timestamp source; swapped for a fixed clock in tests.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        chat_limit: RateLimitConfig,
        ai: Arc<dyn AiProvider>,
        ai_rate_limit: u32,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let registry = Arc::new(Registry::new());
        let metrics = Arc::new(Metrics::new());
        let broadcaster = Broadcaster::new(registry.clone(), metrics.clone());
        Self {
            registry,
            broadcaster,
            metrics,
            chat_limit,
            ai,
            ai_rate_limit,
            clock,
        }
    }
}
