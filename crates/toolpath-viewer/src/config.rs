use clap::Parser;
use std::path::PathBuf;

/// `toolpath_viewer` - Interactive 3D viewer for CNC toolpaths.
///
/// Opens a JSON toolpath (`[[x, y, z], ...]`) and draws it as a line strip
/// that can be orbited, panned and zoomed, with height and travel sliders to
/// replay machining progress. Further files can be dropped onto the window.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Toolpath file to open at startup, relative to `--root`.
    pub file: Option<String>,

    /// Directory the data source resolves toolpath paths against.
    #[arg(long, env = "TOOLPATH_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Initial window width in logical pixels.
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Initial window height in logical pixels.
    #[arg(long, default_value_t = 720)]
    pub height: u32,
}
