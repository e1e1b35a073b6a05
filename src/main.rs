use std::path::PathBuf;

use clap::Parser;
use log::error;

use simlens::app::SimLensApp;
use simlens::report::SessionSource;
use simlens::settings::ViewSettings;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Similarity graph payload (JSON).
    #[arg(long, required_unless_present = "comparison")]
    graph: Option<PathBuf>,
    /// Pairwise comparison payload (JSON).
    #[arg(long)]
    comparison: Option<PathBuf>,
    /// View settings (TOML).
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Initial similarity cutoff, 0 to 10.
    #[arg(long)]
    cutoff: Option<f32>,
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();
    simlens::logging::init();

    let settings = match ViewSettings::load(args.settings.as_deref()) {
        Ok(settings) => settings.with_cutoff(args.cutoff),
        Err(err) => {
            error!("{err:#}");
            std::process::exit(2);
        }
    };

    let source = SessionSource {
        graph: args.graph,
        comparison: args.comparison,
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "simlens",
        options,
        Box::new(move |cc| Ok(Box::new(SimLensApp::new(cc, source, settings)))),
    )
}
