use anyhow::{Context, Result};
use log::{debug, info};
use vista_config::VistaConfig;
use vista_scene::Stage;

mod page;
use page::ProfilePage;

/// Command-line overrides for the headless run.
#[derive(Debug, Default)]
struct Options {
    frames: Option<u32>,
    frame_ms: Option<f64>,
    scroll_step: Option<f32>,
    config: Option<String>,
}

impl Options {
    fn from_args() -> Result<Self> {
        let mut options = Self::default();
        for arg in std::env::args().skip(1) {
            if let Some(v) = arg.strip_prefix("--frames=") {
                options.frames = Some(v.parse().with_context(|| format!("invalid --frames value '{v}'"))?);
            } else if let Some(v) = arg.strip_prefix("--frame-ms=") {
                options.frame_ms = Some(v.parse().with_context(|| format!("invalid --frame-ms value '{v}'"))?);
            } else if let Some(v) = arg.strip_prefix("--scroll-step=") {
                options.scroll_step = Some(v.parse().with_context(|| format!("invalid --scroll-step value '{v}'"))?);
            } else if let Some(v) = arg.strip_prefix("--config=") {
                options.config = Some(v.to_string());
            } else {
                log::warn!("ignoring unknown argument: {arg}");
            }
        }
        Ok(options)
    }
}

fn load_config(options: &Options) -> Result<VistaConfig> {
    let mut config = match &options.config {
        Some(path) => VistaConfig::load_from_file(path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None => VistaConfig::load_or_default(),
    };
    config.merge_with_env();

    if let Some(frames) = options.frames {
        config.demo.frames = frames;
    }
    if let Some(frame_ms) = options.frame_ms {
        config.demo.frame_ms = frame_ms;
    }
    if let Some(step) = options.scroll_step {
        config.demo.scroll_step = step;
    }
    Ok(config)
}

/// Tracks what has already been logged so each change is reported once.
#[derive(Default)]
struct Observed {
    revealed: Vec<&'static str>,
    bars_filled: bool,
    counters_logged_at: Option<f64>,
    counters_done: bool,
    headline_done: bool,
}

fn report(page: &ProfilePage, observed: &mut Observed, now: f64) {
    for (id, reveal) in &page.reveals {
        if reveal.is_revealed() && !observed.revealed.contains(id) {
            info!("t={now:>7.1}ms  {id} revealed ({})", reveal.class_name());
            observed.revealed.push(id);
        }
    }

    if page.bars.is_filled() && !observed.bars_filled {
        observed.bars_filled = true;
        let widths: Vec<String> = (0..page.bars.len())
            .filter_map(|i| page.bars.css_width(i))
            .collect();
        info!(
            "t={now:>7.1}ms  skill bars filled [{}] ({})",
            widths.join(", "),
            page.bars.transition().css()
        );
    }

    if page.counters.is_started() && !observed.counters_done {
        let due = observed
            .counters_logged_at
            .is_none_or(|last| now - last >= 250.0);
        if page.counters.is_complete() {
            observed.counters_done = true;
            info!("t={now:>7.1}ms  counters settled: {}", page.counter_labels().join(" | "));
        } else if due {
            observed.counters_logged_at = Some(now);
            info!("t={now:>7.1}ms  counters: {}", page.counter_labels().join(" | "));
        }
    }

    if page.headline.is_complete() && !observed.headline_done {
        observed.headline_done = true;
        info!("t={now:>7.1}ms  headline typed: {}", page.headline.displayed());
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = Options::from_args()?;
    let config = load_config(&options)?;
    debug!("config: {config:?}");

    let stage = Stage::from_config(&config);
    let mut page = ProfilePage::mount(
        &stage,
        config.demo.viewport_width,
        config.demo.viewport_height,
    );
    info!(
        "mounted {} sections, content height {}px, viewport {}x{}",
        page::SECTIONS.len(),
        page.layout().content_height(),
        config.demo.viewport_width,
        config.demo.viewport_height
    );
    if let Some(region) = page.region("achievements") {
        debug!("achievements section is region {}", region.0);
    }

    let mut observed = Observed::default();
    let mut now = 0.0;
    let mut frames_run = 0;
    for frame in 0..config.demo.frames {
        now = f64::from(frame) * config.demo.frame_ms;
        if frame > 0 {
            page.layout_mut().scroll_by(config.demo.scroll_step);
        }
        stage.frame(now, page.layout());
        report(&page, &mut observed, now);
        frames_run += 1;

        if page.at_bottom() && !stage.needs_frame() {
            break;
        }
    }

    info!(
        "ran {frames_run} frames to t={now:.1}ms; scroll_y={} revealed {}/{} sections",
        page.layout().scroll_y(),
        observed.revealed.len(),
        page.reveals.len()
    );
    if stage.needs_frame() {
        info!(
            "stopped with work pending ({} tasks, next timer {:?})",
            stage.scheduler().active_count(),
            stage.next_timer_due()
        );
    }

    page.teardown();
    Ok(())
}
