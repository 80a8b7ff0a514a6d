// Module declarations for the application's core components
pub mod channels;       // Inter-component communication channels
pub mod config;         // Configuration management
pub mod datalog_writer; // Raw and decoded cycle logging
pub mod error;          // Error handling and types
pub mod hoymiles;       // Statistics decoding engine and inverter tasks
pub mod options;        // Command line options parsing
pub mod prelude;        // Common imports and types
pub mod replay;         // Capture files and record encoding
pub mod scheduler;      // Midnight and unreachable housekeeping

// Get the package version from Cargo.toml
pub const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::prelude::*;
use crate::datalog_writer::DatalogWriter;
use crate::hoymiles::inverter::{ChannelData, Inverter};
use crate::replay::{Cycle, Fragment};
use crate::scheduler::Scheduler;
use std::collections::BTreeMap;
use std::io::Write;

/// Sets up env_logger with the bridge's line format. Safe to call more
/// than once, later calls are ignored.
pub fn init_logging(level: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .write_style(env_logger::WriteStyle::Never)
        .try_init();
}

/// Reception tasks for all enabled inverters, sharing one set of channels.
pub struct Components {
    pub channels: Channels,
    pub inverters: Vec<Inverter>,
    pub datalog_writer: Option<DatalogWriter>,
}

impl Components {
    pub fn new(config: &ConfigWrapper, channels: Channels) -> Result<Self> {
        let datalog_writer = config
            .datalog_file()
            .map(|path| DatalogWriter::new(&path))
            .transpose()?;

        let inverters = config
            .enabled_inverters()
            .iter()
            .map(|inverter| Inverter::new(inverter, channels.clone(), datalog_writer.clone()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            channels,
            inverters,
            datalog_writer,
        })
    }

    /// Spawns one task per inverter. Receivers are subscribed before
    /// returning, so messages sent afterwards are seen by every task.
    pub fn spawn(&self) -> Vec<tokio::task::JoinHandle<()>> {
        self.inverters
            .iter()
            .map(|inverter| {
                let inverter = inverter.clone();
                let receiver = self.channels.to_inverter.subscribe();
                tokio::spawn(async move {
                    if let Err(e) = inverter.run(receiver).await {
                        error!("Inverter task failed: {}", e);
                    }
                })
            })
            .collect()
    }

    pub fn stop(&self) {
        let _ = self.channels.to_inverter.send(ChannelData::Shutdown);
    }

    pub fn live_data(&self) -> BTreeMap<String, LiveData> {
        self.inverters
            .iter()
            .map(|inverter| (inverter.serial().to_string(), LiveData::snapshot(&inverter.statistics())))
            .collect()
    }

    pub fn statistics(&self) -> Vec<(config::Inverter, Statistics)> {
        self.inverters
            .iter()
            .map(|inverter| (inverter.config().clone(), inverter.statistics()))
            .collect()
    }
}

async fn join(handles: Vec<tokio::task::JoinHandle<()>>) {
    for handle in futures::future::join_all(handles).await {
        if let Err(e) = handle {
            error!("Error waiting for inverter task: {}", e);
        }
    }
}

/// Feeds recorded cycles through the reception tasks and returns the
/// resulting live data per serial.
pub async fn replay_cycles(config: &ConfigWrapper, cycles: &[Cycle]) -> Result<BTreeMap<String, LiveData>> {
    let components = Components::new(config, Channels::new())?;
    let mut from_inverter = components.channels.from_inverter.subscribe();
    let handles = components.spawn();

    for cycle in cycles {
        if !components.inverters.iter().any(|i| i.serial() == cycle.serial) {
            warn!("skipping cycle for unknown inverter {}", cycle.serial);
            continue;
        }
        for message in cycle.messages() {
            components.channels.to_inverter.send(message)?;
        }
        // one cycle in flight at a time keeps the channel from lagging
        loop {
            match from_inverter.recv().await {
                Ok(ChannelData::Updated(serial)) if serial == cycle.serial => break,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => (),
                Err(broadcast::error::RecvError::Closed) => bail!("inverter tasks stopped"),
            }
        }
    }

    components.stop();
    join(handles).await;

    Ok(components.live_data())
}

/// Record and fragments for the given values, laid out for the configured
/// inverter with `serial`.
pub fn encode(config: &ConfigWrapper, serial: Serial, values: &[replay::FieldValue]) -> Result<Vec<Fragment>> {
    let inverter = config
        .inverter_with_serial(serial)
        .ok_or_else(|| anyhow!("no inverter with serial {} configured", serial))?;
    let model = inverter
        .model()
        .ok_or_else(|| anyhow!("unknown model for inverter {}", serial))?;

    let record = replay::encode_record(model, values)?;
    Ok(replay::fragments_for(&record))
}

/// Long running mode: capture lines from stdin drive the reception tasks,
/// housekeeping runs alongside until ctrl-c or end of input.
pub async fn app(config: ConfigWrapper) -> Result<()> {
    info!("hoymiles-stats {} starting", CARGO_PKG_VERSION);

    let channels = Channels::new();
    let components = Components::new(&config, channels.clone())?;
    info!("{} inverters configured", components.inverters.len());
    let handles = components.spawn();

    let scheduler = Scheduler::new(config.clone(), channels.clone(), components.statistics());
    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = scheduler.start().await {
            error!("Scheduler task failed: {}", e);
        }
    });

    let mut from_inverter = channels.from_inverter.subscribe();
    let observer = tokio::spawn(async move {
        loop {
            match from_inverter.recv().await {
                Ok(ChannelData::Updated(serial)) => debug!("inverter {} updated", serial),
                Ok(ChannelData::RxFailure(serial, err)) => warn!("inverter {} rx failure: {}", serial, err),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => (),
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    tokio::select! {
        result = read_stdin(&channels) => {
            if let Err(e) = result {
                error!("reading input: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
    }

    components.stop();
    join(handles).await;
    if let Err(e) = scheduler_handle.await {
        error!("Error waiting for scheduler task: {}", e);
    }
    observer.abort();

    println!("{}", serde_json::to_string_pretty(&components.live_data())?);
    info!("Shutdown complete");
    Ok(())
}

async fn read_stdin(channels: &Channels) -> Result<()> {
    use tokio::io::AsyncBufReadExt;

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let cycles = match replay::parse_capture(&line) {
            Ok(cycles) => cycles,
            Err(e) => {
                warn!("ignoring input: {}", e);
                continue;
            }
        };
        for message in cycles.iter().flat_map(|c| c.messages()) {
            channels.to_inverter.send(message)?;
        }
    }
    Ok(())
}
