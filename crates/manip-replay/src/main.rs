//! Headless gizmo replay entry point
//!
//! Usage: `manip-replay [script.ron]`. Without an argument the bundled
//! translate demo runs. The JSON report goes to stdout.

mod runner;
mod script;

use runner::Replay;
use script::{ReplayError, ReplayScript};

const DEMO_SCRIPT: &str = include_str!("../../../demos/translate.ron");

fn run() -> Result<(), ReplayError> {
    let script = match std::env::args().nth(1) {
        Some(path) => ReplayScript::load(path)?,
        None => {
            tracing::info!("No script given, running the bundled demo");
            ReplayScript::from_ron_str(DEMO_SCRIPT)?
        }
    };

    let report = Replay::run(&script)?;
    tracing::info!(
        frames = report.frames.len(),
        undo_depth = report.undo_depth,
        "Replay finished"
    );
    println!("{}", report.to_json()?);
    Ok(())
}

fn main() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "manip_replay=debug,manip_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run() {
        tracing::error!("Replay failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_script_runs() {
        let script = ReplayScript::from_ron_str(DEMO_SCRIPT).unwrap();
        let report = Replay::run(&script).unwrap();
        assert_eq!(report.frames.len(), script.steps.len());
        assert!(report.frames.iter().any(|f| f.outcome == "Committed"));
    }
}
