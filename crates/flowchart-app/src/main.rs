//! Demo entry point.
//!
//! Usage: `flowchart-demo [--shortcuts] [CONFIG.json]`

use std::path::PathBuf;
use std::process::ExitCode;

use flowchart_app::{ShortcutRegistry, load_or_default, run_demo};

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting flowchart demo");

    let mut config_path: Option<PathBuf> = None;
    for arg in std::env::args().skip(1) {
        if arg == "--shortcuts" {
            ShortcutRegistry::print_all();
        } else {
            config_path = Some(PathBuf::from(arg));
        }
    }

    let report = match load_or_default(config_path.as_deref()).and_then(run_demo) {
        Ok(report) => report,
        Err(err) => {
            log::error!("Demo failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "{} nodes, {} edges, {} frames painted ({} draw calls in the last one)",
        report.node_count, report.edge_count, report.frames_painted, report.last_frame_commands
    );
    for line in &report.status_lines {
        println!("  {line}");
    }
    println!("events: {}", report.events.join(", "));
    ExitCode::SUCCESS
}
