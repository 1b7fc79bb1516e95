//! Preview server: the built site with every HTML page processed on request.
//!
//! Built on `tiny_http`:
//!
//! - Static files are served as they are on disk
//! - HTML pages go through the full pipeline for each request, with the site
//!   variables fetched again so edits to `variables.json` show up on reload
//! - Directories resolve to their `index.html`
//! - Graceful shutdown on Ctrl+C
//!
//! ```text
//! GET /blog/ ──► {root}/blog/index.html ──► load_configuration ──► initialize ──► 200
//!                                                  │
//!                                                  └── error ──► 502
//! ```

use crate::{
    config::SiteConfig,
    fetch::fetcher_for,
    log,
    pipeline::{Pipeline, page_url_for},
    vars::load_configuration,
};
use anyhow::{Context, Result, anyhow};
use std::{
    fs,
    io::Cursor,
    net::{IpAddr, SocketAddr},
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Serve `[site.root]` until Ctrl+C is received.
pub fn serve_site(config: &SiteConfig) -> Result<()> {
    let interface: IpAddr = config
        .serve
        .interface
        .parse()
        .with_context(|| format!("invalid interface `{}`", config.serve.interface))?;

    let fetcher = fetcher_for(config)?;
    let pipeline = Pipeline::new(config, fetcher.as_ref())?;

    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{} ({})", addr, config.site.root.display());

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &pipeline) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Request Handling
// ============================================================================

/// What to send back for one request.
#[derive(Debug)]
enum Reply {
    Ok {
        body: Vec<u8>,
        content_type: &'static str,
    },
    NotFound,
    Error {
        status: u16,
        message: String,
    },
}

fn handle_request(request: Request, pipeline: &Pipeline<'_>) -> Result<()> {
    let reply = resolve(request.url(), pipeline);
    match reply {
        Reply::Ok { body, content_type } => {
            let response =
                Response::from_data(body).with_header(content_type_header(content_type)?);
            request.respond(response)?;
        }
        Reply::NotFound => {
            let response = Response::new(
                StatusCode(404),
                vec![content_type_header("text/plain")?],
                Cursor::new("404 Not Found"),
                Some(13),
                None,
            );
            request.respond(response)?;
        }
        Reply::Error { status, message } => {
            log!("serve"; "{message}");
            let response = Response::from_string(message)
                .with_status_code(StatusCode(status))
                .with_header(content_type_header("text/plain; charset=utf-8")?);
            request.respond(response)?;
        }
    }
    Ok(())
}

/// Resolve a request URL to a reply.
///
/// Request resolution order:
/// 1. Exact file match → serve file (HTML processed)
/// 2. Directory with index.html → serve index.html (processed)
/// 3. Nothing found → 404
fn resolve(request_url: &str, pipeline: &Pipeline<'_>) -> Reply {
    let root = &pipeline.config.site.root;
    let Some(path) = local_path(root, request_url) else {
        return Reply::NotFound;
    };

    let path = if path.is_dir() {
        path.join("index.html")
    } else {
        path
    };
    if !path.is_file() {
        return Reply::NotFound;
    }

    let content_type = guess_content_type(&path);
    let result = if is_html(&path) {
        render_page(&path, pipeline)
    } else {
        fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))
    };

    match result {
        Ok(body) => Reply::Ok { body, content_type },
        Err(err) => Reply::Error {
            status: 502,
            message: format!("{err:#}"),
        },
    }
}

/// Run one page through the pipeline with freshly fetched variables.
fn render_page(path: &Path, pipeline: &Pipeline<'_>) -> Result<Vec<u8>> {
    let config = pipeline.config;
    let html = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let remote = load_configuration(pipeline.fetcher, &pipeline.origin, &config.fetch.variables)
        .context("failed to load site variables")?;
    let url = page_url_for(path, &config.site.root, &pipeline.origin)?;
    Ok(pipeline.initialize(&html, &url, &remote)?.html)
}

/// Map a request URL to a path below `root`.
///
/// Query strings are ignored; paths that would leave `root` yield `None`.
fn local_path(root: &Path, request_url: &str) -> Option<PathBuf> {
    let path = request_url.split(['?', '#']).next().unwrap_or_default();
    let decoded = urlencoding::decode(path).ok()?;
    let relative = Path::new(decoded.trim_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(root.join(relative))
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
}

fn content_type_header(value: &str) -> Result<Header> {
    Header::from_bytes("Content-Type", value).map_err(|()| anyhow!("invalid header `{value}`"))
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        // Web content
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json" | "jsonld") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        // Documents
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",

        _ => "application/octet-stream",
    }
}
