use anyhow::Result;
use renderer::{FailurePolicy, RendererConfig, RendererSpec};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

const DEFAULT_LOG_FILTER: &str = "warn,triquad=info,renderer=info,shadersource=info,\
naga=error,wgpu=error,wgpu_core=error,wgpu_hal=error,winit=error";

pub fn run(args: Cli) -> Result<()> {
    initialise_tracing();

    let config = renderer_config(args);
    tracing::info!(
        width = config.spec.width,
        height = config.spec.height,
        vertex = %config.spec.vertex,
        fragment = %config.spec.fragment,
        policy = ?config.policy,
        "starting triquad"
    );
    renderer::run(config)
}

fn initialise_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn renderer_config(args: Cli) -> RendererConfig {
    let policy = if args.strict {
        FailurePolicy::Abort
    } else {
        FailurePolicy::Proceed
    };
    RendererConfig {
        spec: RendererSpec::new(args.width, args.height, args.vertex, args.fragment),
        title: args.title,
        policy,
    }
}
