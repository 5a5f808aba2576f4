//! Log output of the sync engine.
//!
//! Events are written as JSON lines, either bunyan formatted on stdout or in the Google Cloud
//! logging layout. `log` records from dependencies end up in the same subscriber.
//!
//! # Usage
//! ```no_run
//! use coin_sync::telemetry::{Telemetry, TracingSettings};
//!
//! fn main() -> anyhow::Result<()> {
//!     let subscriber = Telemetry::init("coin-sync".into(), &TracingSettings::default());
//!     Telemetry::init_subscriber(subscriber)?;
//!
//!     // ...
//!     Ok(())
//! }
//! ```

use anyhow::Context;
use serde::Deserialize;
use tracing::{subscriber::set_global_default, Subscriber};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_stackdriver::Stackdriver;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

pub struct Telemetry;

impl Telemetry {
    /// Subscriber for `name` filtered by `RUST_LOG`, falling back to `tracing_settings.spec`.
    ///
    /// `gclogs` switches the output from bunyan lines to the Cloud Logging layout.
    pub fn init(name: String, tracing_settings: &TracingSettings) -> impl Subscriber + Sync + Send {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&tracing_settings.spec));

        let (bunyan, cloud_logging) = if tracing_settings.gclogs {
            (None, Some(Stackdriver::layer()))
        } else {
            (Some(BunyanFormattingLayer::new(name, std::io::stdout)), None)
        };

        // span fields are copied onto every event of the span
        Registry::default()
            .with(env_filter)
            .with(JsonStorageLayer)
            .with(bunyan)
            .with(cloud_logging)
    }

    /// Installs `subscriber` process wide and forwards `log` records to it. Fails on a second call.
    pub fn init_subscriber(subscriber: impl Subscriber + Sync + Send) -> anyhow::Result<()> {
        LogTracer::init().context("log records are already forwarded")?;
        set_global_default(subscriber).context("a global tracing subscriber is already installed")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct TracingSettings {
    #[serde(default = "default_spec")]
    pub spec: String,

    #[serde(default)]
    pub gclogs: bool,
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self {
            spec: default_spec(),
            gclogs: false,
        }
    }
}

fn default_spec() -> String {
    "info".into()
}
