use std::fs::File;

use dioxus::prelude::*;
use framegrid::ui::app::App;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

fn init_logging() {
    let level = std::env::var("FRAMEGRID_LOG")
        .ok()
        .and_then(|raw| raw.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    let config = ConfigBuilder::new()
        .add_filter_allow_str("framegrid")
        .build();

    let result = File::create("framegrid.log")
        .map_err(|err| err.to_string())
        .and_then(|file| WriteLogger::init(level, config, file).map_err(|err| err.to_string()));
    if let Err(err) = result {
        eprintln!("logging disabled: {err}");
    }
}

fn main() {
    init_logging();
    log::info!("starting framegrid");

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new().with_window(
                dioxus::desktop::WindowBuilder::new()
                    .with_title("FrameGrid")
                    .with_inner_size(dioxus::desktop::LogicalSize::new(1200.0, 800.0)),
            ),
        )
        .launch(App);
}
