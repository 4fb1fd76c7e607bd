mod app;
mod assets;
mod config;
mod core;
mod skin;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Everything passes the builder; the runtime cap below does the filtering.
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .try_init();
    // Warn until standskin.ini has been read.
    log::set_max_level(log::LevelFilter::Warn);

    config::load();
    log::set_max_level(config::get().log_level.as_level_filter());
    app::run()
}
