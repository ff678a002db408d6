use tabletop_engine::{LoopConfig, Session, TabletopContext};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::scenario::{self, ScenarioError};
use super::session::TabletopSession;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) context: TabletopContext,
    pub(crate) session: Box<dyn Session>,
}

pub(crate) fn build_app() -> Result<AppWiring, ScenarioError> {
    init_tracing();
    info!("=== Tabletop Startup ===");

    let mut scenario = scenario::load_configured_scenario()?;
    let config = std::mem::take(&mut scenario.loop_config);
    let context = scenario::build_context(scenario, config.fallback_recompute_interval)?;

    Ok(AppWiring {
        config,
        context,
        session: Box::new(TabletopSession::new()),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
