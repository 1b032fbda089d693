use super::{DEFAULT_WORKERS, RequestServerError, ServerConfig, handler};
use crate::event::cancellation::CancellationMessage;
use crate::event::channel::EventConsumer;
use crate::utils::thread_context::{NotStartedThreadContext, StartedThreadContext};
use actix_web::{App, HttpServer, dev::ServerHandle, web};
use std::sync::Arc;
use std::sync::mpsc::{RecvTimeoutError, Sender};
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, error, info};

const STARTUP_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_SERVER_THREAD_NAME: &str = "request_server";

/// Holds what is needed to bind the listener and start serving, and is
/// responsible for starting it on its own OS thread.
pub struct Runner {
    config: ServerConfig,
    runtime: Arc<Runtime>,
}

/// Owns the server thread; the listener is stopped gracefully on drop.
pub struct StartedRequestServer {
    thread_context: Option<StartedThreadContext>,
}

impl Runner {
    pub fn new(config: ServerConfig, runtime: Arc<Runtime>) -> Self {
        Self { config, runtime }
    }

    /// Starts the server thread and blocks until the listener is bound or the
    /// startup handshake fails.
    pub fn start(self) -> Result<StartedRequestServer, RequestServerError> {
        let (startup_publisher, startup_consumer) = std::sync::mpsc::channel();

        let callback = move |stop_consumer: EventConsumer<CancellationMessage>| {
            self.spawn_server(stop_consumer, startup_publisher)
        };
        let thread_context =
            NotStartedThreadContext::new(REQUEST_SERVER_THREAD_NAME, callback).start();

        let startup_result = startup_consumer
            .recv_timeout(STARTUP_TIMEOUT)
            .map_err(|err| match err {
                RecvTimeoutError::Timeout => RequestServerError::StartupTimeout(STARTUP_TIMEOUT),
                RecvTimeoutError::Disconnected => RequestServerError::StartupChannelClosed,
            })?;
        startup_result.map_err(RequestServerError::BindError)?;
        info!("request server started");

        Ok(StartedRequestServer {
            thread_context: Some(thread_context),
        })
    }

    fn spawn_server(
        self,
        stop_consumer: EventConsumer<CancellationMessage>,
        startup_publisher: Sender<Result<(), String>>,
    ) {
        let Runner { config, runtime } = self;

        // Channel to share the server handle with this thread, so the server
        // can be stopped once a cancellation arrives.
        let (handle_publisher, handle_consumer) = std::sync::mpsc::channel();

        let server_join = runtime.spawn(run_server(config, handle_publisher, startup_publisher));

        // Dormant until the process shuts down.
        let _ = stop_consumer.as_ref().recv();

        // The server could have failed to bind; the channel is closed then.
        if let Ok(server_handle) = handle_consumer.recv() {
            debug!("stopping the request server");
            runtime.block_on(server_handle.stop(true));
        }
        let _ = runtime.block_on(server_join);
        debug!("request server stopped");
    }
}

async fn run_server(
    config: ServerConfig,
    handle_publisher: Sender<ServerHandle>,
    startup_publisher: Sender<Result<(), String>>,
) -> std::io::Result<()> {
    info!(
        "starting request server at http://{}:{}",
        config.host, config.port
    );

    let server = match HttpServer::new(|| {
        App::new().service(web::resource("/").to(handler::hello))
    })
    .bind((config.host.as_str(), config.port))
    {
        Ok(server) => server,
        Err(err) => {
            let _ = startup_publisher.send(Err(err.to_string()));
            return Err(err);
        }
    };

    let server = server.workers(DEFAULT_WORKERS).run();

    let _ = handle_publisher.send(server.handle());
    let _ = startup_publisher.send(Ok(()));

    server.await
}

impl Drop for StartedRequestServer {
    fn drop(&mut self) {
        let Some(thread_context) = self.thread_context.take() else {
            return;
        };
        info!("waiting for the request server to stop gracefully");
        if let Err(err) = thread_context.stop_blocking() {
            error!(error_msg = %err, "stopping the request server");
        }
    }
}
