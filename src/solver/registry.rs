//! Strategy registry: app mode → request strategy.
//!
//! Built once at startup and immutable afterwards. Lookup of a mode with no
//! registered strategy falls back to the first registration.

use super::{LeetcodeStrategy, LiveInterviewStrategy, SolveStrategy, SolverClient};
use crate::mode::AppMode;
use std::sync::Arc;

#[derive(Clone)]
pub struct StrategyRegistry {
    /// Registration order; index 0 is the fallback.
    entries: Vec<Arc<dyn SolveStrategy>>,
}

impl StrategyRegistry {
    /// Start a registry whose fallback is `first`.
    pub fn new(first: Arc<dyn SolveStrategy>) -> Self {
        Self {
            entries: vec![first],
        }
    }

    /// The built-in strategies, LIVE_INTERVIEW first.
    pub fn with_defaults(client: SolverClient) -> Self {
        Self::new(Arc::new(LiveInterviewStrategy::new(client.clone())))
            .register(Arc::new(LeetcodeStrategy::new(client)))
    }

    /// Add a strategy. Re-registering a mode replaces the earlier strategy
    /// in place, keeping its position.
    pub fn register(mut self, strategy: Arc<dyn SolveStrategy>) -> Self {
        let mode = strategy.mode();
        match self.entries.iter().position(|s| s.mode() == mode) {
            Some(idx) => self.entries[idx] = strategy,
            None => self.entries.push(strategy),
        }
        self
    }

    pub fn modes(&self) -> Vec<AppMode> {
        self.entries.iter().map(|s| s.mode()).collect()
    }

    pub fn resolve(&self, mode: AppMode) -> Arc<dyn SolveStrategy> {
        if let Some(strategy) = self.entries.iter().find(|s| s.mode() == mode) {
            return Arc::clone(strategy);
        }
        let fallback = &self.entries[0];
        log::warn!(
            "[SOLVER] No strategy registered for {}, falling back to {}",
            mode,
            fallback.mode()
        );
        Arc::clone(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client() -> SolverClient {
        SolverClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn defaults_cover_every_mode() {
        let registry = StrategyRegistry::with_defaults(client());
        assert_eq!(registry.modes(), vec![AppMode::LiveInterview, AppMode::LeetcodeSolver]);
        for mode in AppMode::ALL {
            assert_eq!(registry.resolve(mode).mode(), mode);
        }
    }

    #[test]
    fn unregistered_mode_falls_back_to_first_registration() {
        let registry = StrategyRegistry::new(Arc::new(LiveInterviewStrategy::new(client())));
        assert_eq!(
            registry.resolve(AppMode::LeetcodeSolver).mode(),
            AppMode::LiveInterview
        );
    }

    #[test]
    fn fallback_follows_registration_order() {
        let registry = StrategyRegistry::new(Arc::new(LeetcodeStrategy::new(client())));
        assert_eq!(
            registry.resolve(AppMode::LiveInterview).mode(),
            AppMode::LeetcodeSolver
        );
    }

    #[test]
    fn reregistering_replaces_in_place() {
        let registry = StrategyRegistry::with_defaults(client())
            .register(Arc::new(LiveInterviewStrategy::new(client())));
        assert_eq!(registry.modes(), vec![AppMode::LiveInterview, AppMode::LeetcodeSolver]);
    }
}
