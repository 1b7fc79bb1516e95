//! sitevars - site variables, JSON-LD and editorial cleanup for built static sites.

mod apply;
mod cli;
mod config;
mod fetch;
mod jsonld;
mod logger;
mod page;
mod pipeline;
mod serve;
mod vars;

use anyhow::{Context, Result};
use apply::apply_site;
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use fetch::fetcher_for;
use pipeline::{Pipeline, page_url_for};
use serve::serve_site;
use std::{fs, path::Path};
use vars::{ConfigMap, load_configuration};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SiteConfig::load(&cli)?;

    match &cli.command {
        Commands::Apply { dry_run } => apply_site(&config, *dry_run).map(|_| ()),
        Commands::Vars { page } => {
            let vars = page_vars(&config, page)?;
            println!("{}", serde_json::to_string_pretty(&vars)?);
            Ok(())
        }
        Commands::Serve { .. } => serve_site(&config),
    }
}

/// Resolved variables of one page, as the pipeline sees them.
fn page_vars(config: &SiteConfig, page: &Path) -> Result<ConfigMap> {
    let path = config.site.root.join(page);
    let html = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;

    let fetcher = fetcher_for(config)?;
    let pipeline = Pipeline::new(config, fetcher.as_ref())?;
    let remote = load_configuration(fetcher.as_ref(), &pipeline.origin, &config.fetch.variables)
        .context("failed to load site variables")?;
    let url = page_url_for(&path, &config.site.root, &pipeline.origin)?;

    Ok(pipeline.initialize(&html, &url, &remote)?.vars)
}
