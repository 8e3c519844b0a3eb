//! Run-once or periodic driving of the [`CycleOrchestrator`].

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::cycle::CycleOrchestrator;
use crate::factory::ClientFactory;

/// Run cycles until `shutdown` resolves.
///
/// With no interval exactly one cycle runs. Otherwise a cycle starts on every
/// tick; a cycle that overruns the interval delays the next tick instead of
/// bunching them up. A cycle in progress is always allowed to finish.
/// Returns the number of cycles run.
pub async fn run_service<F, S>(
    orchestrator: &CycleOrchestrator<F>,
    interval: Option<Duration>,
    shutdown: S,
) -> u64
where
    F: ClientFactory,
    S: Future<Output = ()>,
{
    let Some(interval) = interval else {
        orchestrator.run_cycle().await;
        return 1;
    };

    tracing::info!(interval_secs = interval.as_secs(), "Starting periodic collection");
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut cycles = 0u64;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                orchestrator.run_cycle().await;
                cycles += 1;
            }
            _ = &mut shutdown => {
                tracing::info!(cycles, "Stopping collection");
                break;
            }
        }
    }
    cycles
}

/// Wait for CTRL+C, or SIGTERM on unix.
///
/// If a handler cannot be installed that signal is logged and ignored; the
/// other one still works.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Cannot listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received CTRL+C"); }
        _ = terminate => { tracing::info!("Received SIGTERM"); }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use rmqmon_config::{AppConfig, RabbitMqServer};
    use rmqmon_rabbitmq::{ClientError, ClientResult, ManagementApi};

    /// Counts cycles by counting client creations; every source fails.
    #[derive(Default)]
    struct CountingFactory {
        calls: Mutex<usize>,
    }

    impl ClientFactory for CountingFactory {
        fn create(&self, _: &RabbitMqServer) -> ClientResult<Arc<dyn ManagementApi>> {
            *self.calls.lock() += 1;
            Err(ClientError::InvalidEndpoint("test".into()))
        }
    }

    fn orchestrator() -> CycleOrchestrator<CountingFactory> {
        CycleOrchestrator::new(AppConfig::example(), CountingFactory::default())
    }

    #[tokio::test]
    async fn test_run_once_without_interval() {
        let orchestrator = orchestrator();
        let cycles = run_service(&orchestrator, None, std::future::pending()).await;
        assert_eq!(cycles, 1);
        assert_eq!(*orchestrator.factory().calls.lock(), 1);
    }

    #[tokio::test]
    async fn test_periodic_until_shutdown() {
        let orchestrator = orchestrator();
        // Ticks at 0ms, 40ms, 80ms; shutdown at 100ms.
        let shutdown = tokio::time::sleep(Duration::from_millis(100));
        let cycles = run_service(&orchestrator, Some(Duration::from_millis(40)), shutdown).await;
        assert!((2..=3).contains(&cycles), "ran {} cycles", cycles);
        assert_eq!(*orchestrator.factory().calls.lock() as u64, cycles);
    }

    #[tokio::test]
    async fn test_immediate_shutdown() {
        let orchestrator = orchestrator();
        let cycles = run_service(&orchestrator, Some(Duration::from_secs(3600)), async {}).await;
        assert!(cycles <= 1);
    }
}
