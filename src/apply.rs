//! `sitevars apply`: rewrite every page of the built site in place.

use crate::{
    config::SiteConfig,
    fetch::fetcher_for,
    jsonld::JsonLdOutcome,
    log,
    logger::Progress,
    pipeline::{Pipeline, page_url_for},
    vars::{ConfigMap, load_configuration},
};
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Extensions treated as HTML pages.
const PAGE_EXTENSIONS: &[&str] = &["html", "htm"];

/// Counters reported after a run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub pages: usize,
    pub changed: usize,
    pub json_ld_failed: usize,
    pub failed: usize,
    /// Pages that received structured data, per `data-role`
    pub injected: BTreeMap<String, usize>,
}

/// Collect all HTML pages below `root`, sorted.
pub fn collect_pages(root: &Path) -> Vec<PathBuf> {
    let mut pages: Vec<_> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| PAGE_EXTENSIONS.iter().any(|p| ext.eq_ignore_ascii_case(p)))
        })
        .map(walkdir::DirEntry::into_path)
        .collect();
    pages.sort();
    pages
}

/// Process every page of the site.
///
/// The site variables are fetched once; each page starts from its own copy.
/// Failing to load them aborts the run before any page is touched.
pub fn apply_site(config: &SiteConfig, dry_run: bool) -> Result<ApplySummary> {
    let root = &config.site.root;
    if !root.is_dir() {
        bail!("site directory `{}` does not exist", root.display());
    }

    let fetcher = fetcher_for(config)?;
    let pipeline = Pipeline::new(config, fetcher.as_ref())?;
    let remote = load_configuration(fetcher.as_ref(), &pipeline.origin, &config.fetch.variables)
        .context("failed to load site variables")?;
    log!("config"; "loaded {} variables", remote.len());

    let pages = collect_pages(root);

    let progress = Progress::new("pages", pages.len());
    let results: Vec<_> = pages
        .par_iter()
        .map(|path| {
            let result = process_file(path, root, &pipeline, &remote, dry_run);
            progress.inc();
            result
        })
        .collect();
    progress.finish();

    let mut summary = ApplySummary {
        pages: pages.len(),
        ..ApplySummary::default()
    };
    for result in results {
        match result {
            Ok(page) => {
                summary.changed += usize::from(page.changed);
                match page.json_ld {
                    Some(JsonLdOutcome::Injected { role }) => {
                        *summary.injected.entry(role).or_default() += 1;
                    }
                    Some(JsonLdOutcome::Failed(_)) => summary.json_ld_failed += 1,
                    Some(JsonLdOutcome::Skipped) | None => {}
                }
            }
            Err(err) => {
                log!("error"; "{err:#}");
                summary.failed += 1;
            }
        }
    }

    if !summary.injected.is_empty() {
        let roles = summary
            .injected
            .iter()
            .map(|(role, count)| format!("{role} ({count})"))
            .collect::<Vec<_>>()
            .join(", ");
        log!("json-ld"; "structured data: {roles}");
    }
    let verb = if dry_run { "would rewrite" } else { "rewrote" };
    log!(
        "apply";
        "{verb} {}/{} pages ({} without structured data, {} failed)",
        summary.changed,
        summary.pages,
        summary.json_ld_failed,
        summary.failed
    );

    if summary.failed > 0 {
        bail!("{} pages could not be processed", summary.failed);
    }
    Ok(summary)
}

struct FileOutcome {
    changed: bool,
    json_ld: Option<JsonLdOutcome>,
}

fn process_file(
    path: &Path,
    root: &Path,
    pipeline: &Pipeline<'_>,
    remote: &ConfigMap,
    dry_run: bool,
) -> Result<FileOutcome> {
    let html = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let url = page_url_for(path, root, &pipeline.origin)?;
    let processed = pipeline.initialize(&html, &url, remote)?;

    let changed = processed.changed(&html);
    if changed && !dry_run {
        fs::write(path, &processed.html)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(FileOutcome {
        changed,
        json_ld: processed.json_ld,
    })
}
