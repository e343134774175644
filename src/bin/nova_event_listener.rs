//! Listens to nova notifications and registers new instances into a context
//! broker.
//!
//! Usage:
//!
//! ```text
//! nova_event_listener [--config <path>] [--broker-url <url>] [--log-level <level>]
//! ```
//!
//! Notifications are read from standard input, one JSON message per line, so
//! the listener can be fed by any bus consumer. Messages wrapped in an oslo
//! messaging envelope are unwrapped. The listener stops at end of input or on
//! interrupt, then grants in-flight registrations `shutdown_grace_secs` to
//! finish. The process exits without waiting for the pending standard input
//! read.

use clap::Parser;
use mockable::DefaultClock;
use nova_registrar::config::{ConfigOverrides, RegistrarConfig, RegistrarSettings};
use nova_registrar::observability::{LogFormat, init_logging};
use nova_registrar::registration::{
    adapters::{JsonLinesEventBus, ReqwestRegistryTransport, TokioRetryTimer, TokioTaskScheduler},
    services::{DeliveryClient, ListenerLoop, RegistrationTask},
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "nova_event_listener",
    version,
    about = "OpenStack Nova event listener registering instances into a context broker"
)]
struct Cli {
    /// YAML configuration file.
    #[arg(short = 'c', long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Context broker URL.
    #[arg(short = 'b', long, value_name = "URL")]
    broker_url: Option<String>,

    /// Logging level or filter directive.
    #[arg(short = 'l', long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Logging output format.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let overrides = ConfigOverrides {
        broker_url: cli.broker_url,
        log_level: cli.log_level,
        log_format: cli.log_format,
    };
    let settings = RegistrarConfig::load_with(cli.config.as_deref(), &overrides)?.validate()?;
    init_logging(&settings.log.level, settings.log.format);

    let runtime = Builder::new_multi_thread().enable_all().build()?;
    let result = runtime.block_on(run(settings));
    // A pending stdin read holds a blocking thread that never returns on its
    // own, so the runtime must not wait for it.
    runtime.shutdown_background();
    result
}

async fn run(settings: RegistrarSettings) -> Result<(), BoxError> {
    let RegistrarSettings {
        broker_url,
        profile,
        policy,
        retry_server_errors,
        topic,
        request_timeout,
        shutdown_grace,
        ..
    } = settings;
    info!(%broker_url, %topic, "context broker URL");

    let transport = Arc::new(ReqwestRegistryTransport::new(request_timeout)?);
    let delivery =
        DeliveryClient::new(transport, broker_url).with_server_error_retries(retry_server_errors);
    let task = Arc::new(RegistrationTask::new(
        delivery,
        Arc::new(profile),
        policy,
        Arc::new(TokioRetryTimer),
        Arc::new(DefaultClock),
    ));
    let scheduler = Arc::new(TokioTaskScheduler::new());
    let bus = Arc::new(JsonLinesEventBus::new(BufReader::new(tokio::io::stdin())));
    let listener = ListenerLoop::new(bus, Arc::clone(&scheduler), task, topic);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping listener");
            interrupt.cancel();
        }
    });

    let outcome = listener.run(cancel).await;
    let drained = scheduler.shutdown(shutdown_grace).await;
    let summary = outcome?;
    info!(
        exit = ?summary.exit,
        received = summary.stats.received,
        scheduled = summary.stats.scheduled,
        deletions = summary.stats.deletions,
        ignored = summary.stats.ignored,
        malformed = summary.stats.malformed,
        drained,
        "listener finished"
    );
    Ok(())
}
