// Periodic metric samplers: each one re-reads a source file every tick and
// pushes one formatted status line into its own bounded channel.

mod battery;
mod cpu;
mod memory;

pub use battery::BatteryMetric;
pub use cpu::{CpuCounters, CpuMetric};
pub use memory::MemoryMetric;

use std::io::SeekFrom;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, instrument};

/// Sampling period.
pub const TICK: Duration = Duration::from_secs(1);

/// Outbound queue size per sampler; a full queue blocks the sampler.
pub const CHANNEL_CAPACITY: usize = 8;

pub type SamplerResult = Result<(), SamplerError>;

#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot seek {path}: {source}")]
    Seek {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("sampler task failed: {0}")]
    Task(String),
}

/// Parsing and formatting for one kind of source file.
/// Implementors keep whatever state they need between ticks.
pub trait Metric: Send + 'static {
    const NAME: &'static str;

    /// Turn the full contents of the source into one status line.
    fn sample(&mut self, raw: &str) -> String;
}

/// Where a sampler reads from and how an unopenable source is treated.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub path: PathBuf,
    /// Required sources are fatal when missing; optional ones disable the sampler.
    pub required: bool,
    pub interval: Duration,
}

impl SamplerConfig {
    pub fn new(path: impl Into<PathBuf>, required: bool) -> Self {
        Self {
            path: path.into(),
            required,
            interval: TICK,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Bounded channel carrying one sampler's status lines.
pub fn channel() -> (mpsc::Sender<String>, mpsc::Receiver<String>) {
    mpsc::channel(CHANNEL_CAPACITY)
}

/// Runs a sampler until its receiver goes away or an I/O error occurs.
///
/// The source is opened once. An optional source that cannot be opened ends the
/// sampler quietly with `Ok(())`; a required one returns [`SamplerError::Open`].
/// Every tick the file is rewound, read in full, formatted and sent. Seek and read
/// failures are always errors.
#[instrument(skip_all, fields(metric = M::NAME, path = %config.path.display()))]
pub async fn run<M: Metric>(
    mut metric: M,
    config: SamplerConfig,
    tx: mpsc::Sender<String>,
) -> SamplerResult {
    let SamplerConfig {
        path,
        required,
        interval,
    } = config;

    let mut file = match File::open(&path).await {
        Ok(file) => file,
        Err(e) if !required => {
            info!(error = %e, "optional source unavailable; sampler disabled");
            return Ok(());
        }
        Err(source) => return Err(SamplerError::Open { path, source }),
    };

    let mut tick = interval_at(Instant::now() + interval, interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut raw = Vec::new();

    loop {
        tick.tick().await;

        if let Err(source) = file.seek(SeekFrom::Start(0)).await {
            return Err(SamplerError::Seek { path, source });
        }
        raw.clear();
        if let Err(source) = file.read_to_end(&mut raw).await {
            return Err(SamplerError::Read { path, source });
        }

        let text = metric.sample(&String::from_utf8_lossy(&raw));
        if tx.send(text).await.is_err() {
            debug!("receiver dropped; sampler stopping");
            return Ok(());
        }
    }
}

/// Waits on every sampler task and returns the first failure.
/// Samplers that finish cleanly (a disabled battery) are dropped from the set;
/// if all of them finish cleanly this never resolves.
pub async fn supervise(mut samplers: JoinSet<SamplerResult>) -> SamplerError {
    while let Some(joined) = samplers.join_next().await {
        match joined {
            Ok(Ok(())) => debug!(remaining = samplers.len(), "sampler finished"),
            Ok(Err(e)) => return e,
            Err(e) => return SamplerError::Task(e.to_string()),
        }
    }
    std::future::pending().await
}
