use colored::Colorize;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

/// Installs a colored stdout logger. `RUST_LOG` overrides the default `info` level.
pub fn setup_logger() -> Result<(), fern::InitError> {
    let colors = ColoredLevelConfig::new()
        .trace(Color::BrightBlack)
        .debug(Color::White)
        .info(Color::Green)
        .warn(Color::Yellow)
        .error(Color::Red);

    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}[{}] {} {}",
                chrono::Local::now().format("[%H:%M:%S]").to_string().dimmed(),
                colors.color(record.level()),
                record.target().cyan(),
                message
            ))
        })
        .level(LevelFilter::Warn)
        .level_for("chain_aggregator", level)
        .chain(std::io::stdout())
        .apply()?;

    Ok(())
}
