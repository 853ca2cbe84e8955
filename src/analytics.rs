//! Analytics collaborator
//!
//! The engine notifies a sink exactly once per fresh, tracked assignment.
//! Notification is fire-and-forget: sinks return nothing and the engine
//! never waits on them.

/// Receiver of first-time assignment events.
pub trait AnalyticsSink {
    /// A visitor was freshly assigned `variant_id` of `experiment_id`.
    fn track_experiment(&mut self, experiment_id: &str, variant_id: &str);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl AnalyticsSink for NoopSink {
    fn track_experiment(&mut self, _experiment_id: &str, _variant_id: &str) {}
}

/// Sink that emits an `info` event on the `trueno_ab::analytics` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn track_experiment(&mut self, experiment_id: &str, variant_id: &str) {
        tracing::info!(
            target: "trueno_ab::analytics",
            experiment_id,
            variant_id,
            "experiment assignment"
        );
    }
}

impl<F> AnalyticsSink for F
where
    F: FnMut(&str, &str),
{
    fn track_experiment(&mut self, experiment_id: &str, variant_id: &str) {
        self(experiment_id, variant_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_sink() {
        let mut events = Vec::new();
        {
            let mut sink = |e: &str, v: &str| events.push((e.to_string(), v.to_string()));
            sink.track_experiment("hero", "B");
        }
        assert_eq!(events, vec![("hero".to_string(), "B".to_string())]);
    }

    #[test]
    fn test_builtin_sinks_accept_events() {
        NoopSink.track_experiment("hero", "A");
        TracingSink.track_experiment("hero", "A");
    }
}
