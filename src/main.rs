mod app;
mod config;
mod error;
mod file_utils;
mod image_cache;
mod image_loader;
mod services;
mod settings;
mod startup;
mod state;
mod ui;

use services::SystemTrash;
use ui::ConsolePresenter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(debug_assertions)]
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .init();
    #[cfg(not(debug_assertions))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let data_dir = file_utils::app_data_dir();
    std::fs::create_dir_all(&data_dir)?;
    log::info!("Data directory: {}", data_dir.display());

    let options = startup::startup_options_from_args();
    let timer_position = settings::SettingsStore::in_dir(&data_dir).load().timer_position;
    let (app, receiver) =
        app::Slideshow::new(&data_dir, ConsolePresenter::new(timer_position), SystemTrash);
    let mut app = app.with_folder_watch(options.watch);

    startup::configure_startup_opening(&mut app, options);
    app.run(receiver);

    Ok(())
}
