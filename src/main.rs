mod app;
mod ui;

use std::path::PathBuf;

use app::ComponentReviewApp;
use clap::Parser;
use compview::config::ReviewConfig;
use eframe::egui;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
struct Args {
    /// tedana results folder to open on start
    #[arg(value_name = "FOLDER")]
    folder: Option<PathBuf>,

    /// Path to config JSON
    #[arg(long, default_value = "compview.json")]
    config: PathBuf,
}

fn main() -> eframe::Result {
    env_logger::init();
    let args = Args::parse();
    let config = ReviewConfig::load_or_default(&args.config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "compview – ICA component review",
        options,
        Box::new(move |cc| {
            // Install image loaders so egui can render png/svg figures.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            let mut app = ComponentReviewApp::new(config);
            if let Some(folder) = &args.folder {
                app.open_folder(folder);
            }
            Ok(Box::new(app))
        }),
    )
}
