mod events;
mod gui;
mod sys;

use anyhow::Context;
use arc_knob::settings;
use clap::Parser;
use gui::app::AppModel;
use relm4::prelude::*;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Settings file to read instead of the per-user one
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the default settings file and exit
    #[arg(long)]
    write_config: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => settings::get_config_path()?,
    };

    if args.write_config {
        if !settings::write_default_config(&config_path)
            .with_context(|| format!("Failed to write {}", config_path.display()))?
        {
            log::info!("{} already exists", config_path.display());
        }
        println!("{}", config_path.display());
        return Ok(());
    }
    let settings = settings::load_config_from(&config_path).unwrap_or_else(|e| {
        log::warn!("Using default knob settings: {}", e);
        settings::parse_settings(settings::DEFAULT_CONFIG).unwrap_or_default()
    });

    let (tx, rx) = async_channel::bounded(32);

    sys::runtime::start_background_services(tx, config_path.clone());

    let app = RelmApp::new("org.arc-knob.demo").with_args(Vec::new());
    app.run::<AppModel>((settings, config_path, rx));

    Ok(())
}
