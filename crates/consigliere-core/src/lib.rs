pub mod cli;
pub mod commands;
pub mod config;
pub mod deck;
pub mod feeds;
pub mod layout;
pub mod mode;
pub mod relay;
pub mod render;
pub mod session;
pub mod store;
pub mod ticker;
pub mod timer;
pub mod widgets;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let pre = cli::preprocess_args(&raw_args)?;
    let cli = cli::GlobalCli::parse_from(pre.cleaned_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        "starting consigliere"
    );
    let override_keys: Vec<&str> = pre.rc_overrides.iter().map(|(k, _)| k.as_str()).collect();
    debug!(?override_keys, "preprocessed rc overrides");

    let mut cfg = config::Config::load(cli.config.as_deref())?;
    cfg.apply_overrides(
        pre.rc_overrides
            .into_iter()
            .chain(cli.rc_overrides.into_iter().map(|kv| (kv.key, kv.value))),
    );

    let data_dir = config::resolve_data_dir(&cfg, cli.data.as_deref())
        .context("failed to resolve data directory")?;

    let store = store::SessionStore::open(&data_dir)
        .with_context(|| format!("failed to open session store at {}", data_dir.display()))?;

    let renderer = render::Renderer::new(&cfg)?;

    commands::dispatch(&store, &cfg, &renderer, cli.command)?;

    info!("done");
    Ok(())
}
