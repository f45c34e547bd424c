use anyhow::Result;
use csm::config::{AppConfig, SourceConfig};
use csm::display::X11Display;
use csm::event_loop::EventLoop;
use csm::item::{Canvas, Item};
use csm::models::{FONT_SIZE, Font};
use csm::sampler::{
    self, BatteryMetric, CpuMetric, MemoryMetric, Metric, SamplerConfig, SamplerResult,
};
use csm::surface::Surface;
use csm::typesetter::CosmicTypesetter;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

/// Starts a sampler task for `metric` and returns the item that displays it.
fn attach<M: Metric>(
    samplers: &mut JoinSet<SamplerResult>,
    metric: M,
    source: &SourceConfig,
    offset: i32,
    font: &Arc<Font>,
) -> Item {
    let (tx, rx) = sampler::channel();
    let config = SamplerConfig::new(source.path.clone(), source.required);
    samplers.spawn(sampler::run(metric, config, tx));
    Item::new(M::NAME, rx, offset, font.clone())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = AppConfig::load()?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        width = app_config.window.width,
        height = app_config.window.height,
        font = %app_config.font.path.display(),
        "starting"
    );

    let mut typesetter = CosmicTypesetter::new();
    let typeface = typesetter.load_typeface(&app_config.font.path)?;
    let font = Arc::new(Font::from_rgba(app_config.font.color, FONT_SIZE, typeface));

    let surface = Surface::new(app_config.window.width, app_config.window.height)
        .ok_or_else(|| anyhow::anyhow!("cannot allocate backing surface"))?;
    let (display, events) = X11Display::open(&app_config.window)?;

    let sources = &app_config.sources;
    let [battery_row, cpu_row, memory_row] = AppConfig::row_offsets();
    let mut samplers = JoinSet::new();
    let items = vec![
        attach(
            &mut samplers,
            BatteryMetric::default(),
            &sources.battery,
            battery_row,
            &font,
        ),
        attach(&mut samplers, CpuMetric::default(), &sources.cpu, cpu_row, &font),
        attach(&mut samplers, MemoryMetric, &sources.memory, memory_row, &font),
    ];

    let event_loop = EventLoop::new(items, Canvas::new(surface, display, typesetter), events);

    tokio::select! {
        terminated = event_loop.run() => {
            tracing::info!(pings = terminated.stats.pings, "window closed");
        }
        e = sampler::supervise(samplers) => {
            tracing::error!(error = %e, "sampler failed");
            return Err(e.into());
        }
    }

    Ok(())
}
