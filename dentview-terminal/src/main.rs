/// dentview terminal viewer
///
/// Shows STL models as animated parts in the terminal. Files are assigned to
/// the configured parts in order; without files a cube stands in for each part.
/// Controls:
///   - Left drag: orbit
///   - Middle drag: pan
///   - Wheel: zoom
///   - Q/ESC: Quit
use clap::Parser;
use dentview_core::{TriangleMesh, ViewerConfig};
use dentview_terminal::TerminalApp;
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dentview-terminal")]
#[command(about = "Orbit and animate dental STL models in the terminal")]
struct Cli {
    /// Viewer configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// STL files, one per configured part
    stl: Vec<PathBuf>,
}

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ViewerConfig::load(path)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("{}: {e}", path.display())))?,
        None => ViewerConfig::default(),
    };
    let parts = config.parts.len();

    let mut app = TerminalApp::new(config)?;

    if cli.stl.is_empty() {
        for slot in 0..parts {
            app.set_mesh(slot, TriangleMesh::cube(4.0));
        }
        app.fit_camera();
    }

    for (slot, path) in cli.stl.iter().enumerate() {
        let bytes = std::fs::read(path).map_err(|e| {
            io::Error::new(e.kind(), format!("Failed to read STL file {}: {e}", path.display()))
        })?;
        log::info!("loading {} into part {slot}", path.display());
        app.load(slot, bytes)?;
    }

    app.run()
}
