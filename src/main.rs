//! Render the default Julia set to `julia.png`.

use std::process::ExitCode;

use julia_render::pipeline::{self, RenderConfig, RenderError};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RenderConfig::default();
    match pollster::block_on(pipeline::render_to_file(config)) {
        Ok(summary) => {
            match serde_json::to_string(&summary) {
                Ok(json) => log::info!("Render summary: {}", json),
                Err(e) => log::warn!("Could not serialize render summary: {}", e),
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{} failed: {}", err.category(), err);
            eprintln!("Error: {:#}", report(err));
            ExitCode::FAILURE
        }
    }
}

fn report(err: RenderError) -> anyhow::Error {
    let stage = err.category();
    anyhow::Error::new(err).context(format!("julia render aborted during {}", stage))
}
