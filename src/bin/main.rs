use std::error::Error;
use std::process::exit;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{error, info};
use warm_handoff::cli::Cli;
use warm_handoff::config::AgentConfig;
use warm_handoff::control_plane::ServiceLocator;
use warm_handoff::credentials::ambient::AmbientTokenProvider;
use warm_handoff::event::ApplicationEvent;
use warm_handoff::event::channel::{EventPublisher, pub_sub};
use warm_handoff::handoff::WarmHandoff;
use warm_handoff::handoff::orchestrator::{ShutdownOrchestrator, ShutdownOutcome};
use warm_handoff::handoff::self_call::SelfCaller;
use warm_handoff::http::client::HttpClientReqwest;
use warm_handoff::http::config::HttpConfig;
use warm_handoff::instrumentation::try_init_tracing;
use warm_handoff::metadata::MetadataClient;
use warm_handoff::server::runner::Runner;

fn main() {
    let cli = Cli::init();

    if let Err(e) = _main(cli) {
        error!("the warm hand-off agent exited with an error: {}", e);
        exit(1);
    }
}

// The actual main function, separated so errors propagate with `?` and get
// logged once, in string format.
fn _main(cli: Cli) -> Result<(), Box<dyn Error>> {
    try_init_tracing()?;

    let mut config = AgentConfig::from_env()?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let (application_event_publisher, application_event_consumer) = pub_sub();
    create_shutdown_signal_handler(application_event_publisher)?;

    let http_client = Arc::new(HttpClientReqwest::try_new(HttpConfig::default())?);
    let metadata = MetadataClient::new(http_client.clone(), config.metadata_endpoint.clone());
    let mut locator = ServiceLocator::new(
        http_client.clone(),
        AmbientTokenProvider::new(metadata.clone()),
    );
    if let Some(endpoint) = config.control_plane_endpoint.clone() {
        locator = locator.with_endpoint(endpoint);
    }
    let handoff = WarmHandoff::new(
        metadata,
        locator,
        SelfCaller::new(http_client, config.self_call),
    );

    let runtime = Arc::new(Runtime::new()?);
    let started_server = Runner::new(config.server.clone(), runtime).start()?;

    // Blocks until a termination signal leads to a completed hand-off. The
    // exit policy lives here, not in the orchestrator.
    let orchestrator = ShutdownOrchestrator::new(handoff, application_event_consumer);
    match orchestrator.run() {
        ShutdownOutcome::HandoffCompleted => {
            info!("warm hand-off done, shutting down");
        }
        ShutdownOutcome::ChannelClosed => {
            drop(started_server);
            return Err("the termination signal channel closed unexpectedly".into());
        }
    }

    drop(started_server);
    info!("exiting gracefully");
    Ok(())
}

fn create_shutdown_signal_handler(
    publisher: EventPublisher<ApplicationEvent>,
) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        info!("received termination signal");
        let _ = publisher
            .publish(ApplicationEvent::StopRequested)
            .inspect_err(|e| error!("could not publish the stop request: {}", e));
    })
}
