//! Processing of one HTML document.
//!
//! ```text
//! scan_page ─► fresh ConfigMap ◄─ remote rows
//!                   │
//!                   ├─ collect_facts (page + system)
//!                   │
//!                   └─ <main>? ─► comment blocks, JSON-LD, byline, chat mount,
//!                                 editorial meta ─► PageEdits ─► apply_edits
//! ```

use crate::{
    config::SiteConfig,
    fetch::Fetch,
    jsonld::{JsonLdOutcome, inject_json_ld},
    logger::alert,
    page::{PageEdits, apply_edits, cleanup, decorate, scan_page},
    vars::{ConfigMap, PageContext, collect_facts, system::SystemInfo},
};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::path::Path;
use url::Url;

/// Result of processing one page.
#[derive(Debug)]
pub struct Processed {
    /// Rewritten document (the input unchanged when there was nothing to do)
    pub html: Vec<u8>,
    /// The page's final variables
    pub vars: ConfigMap,
    /// `None` for pages without `<main>`
    pub json_ld: Option<JsonLdOutcome>,
}

impl Processed {
    pub fn changed(&self, original: &[u8]) -> bool {
        self.html != original
    }
}

/// Shared, read-only inputs of a processing run.
pub struct Pipeline<'a> {
    pub config: &'a SiteConfig,
    pub fetcher: &'a dyn Fetch,
    pub system: SystemInfo,
    pub origin: Url,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a SiteConfig, fetcher: &'a dyn Fetch) -> Result<Self> {
        Ok(Self {
            config,
            fetcher,
            system: SystemInfo::detect(&config.facts),
            origin: config.origin()?,
        })
    }

    /// Process `html` served at `page_url`, starting from `remote` variables.
    pub fn initialize(
        &self,
        html: &[u8],
        page_url: &Url,
        remote: &ConfigMap,
    ) -> Result<Processed> {
        self.initialize_at(html, page_url, remote, self.system.now())
    }

    /// [`Pipeline::initialize`] with an explicit clock reading.
    pub fn initialize_at(
        &self,
        html: &[u8],
        page_url: &Url,
        remote: &ConfigMap,
        now: NaiveDateTime,
    ) -> Result<Processed> {
        let scan = scan_page(html).with_context(|| format!("failed to parse {page_url}"))?;

        let mut vars = remote.clone();
        let facts = collect_facts(
            &scan,
            page_url,
            now,
            &self.system,
            &self.config.facts,
            &vars,
        );
        vars.merge(facts);
        let ctx = PageContext::new(self.origin.clone(), page_url.clone(), vars);

        if !scan.has_main {
            return Ok(Processed {
                html: html.to_vec(),
                vars: ctx.vars,
                json_ld: None,
            });
        }

        let page = &self.config.page;
        let mut edits = PageEdits::default();
        cleanup::remove_comment_blocks(&mut edits);
        let json_ld = inject_json_ld(&scan, &ctx, self.fetcher, self.config, &mut edits);
        if let JsonLdOutcome::Failed(err) = &json_ld {
            alert(&format!(
                "Error processing JSON-LD metadata for {page_url}: {err}"
            ));
        }

        if scan.has_h1 {
            if page.byline
                && let Some(byline) = decorate::byline(&ctx.vars)
            {
                edits.append_to_first_h1(byline);
            }
            if page.chatbot {
                edits.append_to_first_h1(decorate::chat_mount());
            }
        }
        cleanup::remove_editorial_meta(&mut edits, &page.editorial_meta);

        let html =
            apply_edits(html, &edits).with_context(|| format!("failed to rewrite {page_url}"))?;
        Ok(Processed {
            html,
            vars: ctx.vars,
            json_ld: Some(json_ld),
        })
    }
}

/// Public URL of the page stored at `path` below the site `root`.
///
/// `blog/index.html` is served as `{origin}/blog/index.html`.
pub fn page_url_for(path: &Path, root: &Path, origin: &Url) -> Result<Url> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let encoded = relative
        .components()
        .map(|c| urlencoding::encode(&c.as_os_str().to_string_lossy()).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    origin
        .join(&format!("/{encoded}"))
        .with_context(|| format!("cannot map {} to a URL", path.display()))
}
