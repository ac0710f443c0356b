use anyhow::{Context, Result};
use axum::{
    Router,
    extract::State,
    http::{StatusCode, Uri, header},
    response::{
        Html, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use docsite_kit_core::parse_site_toml;
use docsite_kit_generator::generate_site;
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use std::{net::SocketAddr, path::PathBuf};
use tokio::sync::broadcast;
use tower_http::services::ServeDir;

#[derive(Clone)]
struct AppState {
    site_path: PathBuf,
    reload_tx: broadcast::Sender<()>,
}

/// Start preview server with hot reload for local development.
///
/// This command:
/// - Validates and loads site.toml
/// - Regenerates pages on every request so edits show up immediately
/// - Serves static image assets
/// - Watches for file changes and triggers hot reload
///
/// # Arguments
///
/// * `path` - Path to site directory containing site.toml
/// * `port` - Port to serve on (default: 8080)
pub async fn run(path: PathBuf, port: u16) -> Result<()> {
    println!("📚 Starting preview server...");
    println!("   Site: {}", path.display());

    // Validate site directory exists
    if !path.exists() {
        anyhow::bail!(
            "Site directory does not exist: {}\nRun 'docsite-kit init {}' first",
            path.display(),
            path.display()
        );
    }

    // Load and validate site.toml
    let site_toml_path = path.join("site.toml");
    if !site_toml_path.exists() {
        anyhow::bail!(
            "site.toml not found in {}\nRun 'docsite-kit init {}' first",
            path.display(),
            path.display()
        );
    }

    let site = parse_site_toml(&site_toml_path).context("Failed to parse site.toml")?;

    println!("   ✓ Loaded: {}", site.meta.title);
    println!("   ✓ Tagline: {}", site.meta.tagline);
    println!("   ✓ Sections: {}", site.sections.len());

    // Create broadcast channel for reload events
    let (reload_tx, _) = broadcast::channel::<()>(100);

    let state = AppState {
        site_path: path.clone(),
        reload_tx: reload_tx.clone(),
    };

    // Build router
    let app = Router::new()
        .route("/_reload", get(sse_handler))
        .nest_service("/img", ServeDir::new(path.join("static/img")))
        .fallback(get(page_handler))
        .with_state(state);

    // Start file watcher
    let watcher_path = path.clone();
    let watcher_tx = reload_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = watch_files(watcher_path, watcher_tx).await {
            eprintln!("File watcher error: {}", e);
        }
    });

    // Start server
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("\n🚀 Preview ready at: http://localhost:{}", port);
    println!("   Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to port")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Watch for file changes and trigger reload
async fn watch_files(path: PathBuf, reload_tx: broadcast::Sender<()>) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut watcher =
        notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        })?;

    // Watch site directory recursively
    watcher.watch(&path, RecursiveMode::Recursive)?;

    while let Some(event) = rx.recv().await {
        match event.kind {
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => {
                // Filter out temporary files and hidden files
                if event.paths.iter().any(|p| {
                    let filename = p.file_name().unwrap_or_default().to_string_lossy();
                    !filename.starts_with('.') && !filename.ends_with('~')
                }) {
                    println!("   📝 File changed, reloading...");
                    let _ = reload_tx.send(());
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// SSE endpoint for hot reload
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let mut rx = state.reload_tx.subscribe();

    let stream = async_stream::stream! {
        loop {
            if rx.recv().await.is_ok() {
                yield Ok(Event::default().data("reload"));
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

const RELOAD_SCRIPT: &str = r#"<script>
    // Hot reload via Server-Sent Events
    const eventSource = new EventSource('/_reload');
    eventSource.onmessage = () => {
        console.log('Reloading...');
        location.reload();
    };
    eventSource.onerror = () => {
        console.log('Preview server disconnected');
        eventSource.close();
    };
</script>"#;

/// Every non-asset request regenerates the site and serves the matching
/// page, so what you see is always current.
async fn page_handler(State(state): State<AppState>, uri: Uri) -> Response {
    let site_toml_path = state.site_path.join("site.toml");
    let site = match parse_site_toml(&site_toml_path) {
        Ok(s) => s,
        Err(e) => return error_page("Configuration Error", &e.to_string()),
    };

    let generated = match generate_site(&state.site_path, &site) {
        Ok(g) => g,
        Err(e) => return error_page("Generation Error", &e.to_string()),
    };

    let request_path = uri.path();

    // Generated assets (currently the stylesheet)
    let asset_key = request_path.trim_start_matches('/');
    if let Some((_, data)) = generated.assets.iter().find(|(p, _)| p == asset_key) {
        let content_type = if asset_key.ends_with(".css") {
            "text/css"
        } else {
            "application/octet-stream"
        };
        return ([(header::CONTENT_TYPE, content_type)], data.clone()).into_response();
    }

    let route = normalize_route(request_path);
    match generated.pages.iter().find(|(r, _)| r == &route) {
        Some((_, html)) => {
            // Inject the hot-reload listener just before </body>
            let html = html.replace("</body>", &format!("{}\n</body>", RELOAD_SCRIPT));
            Html(html).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            error_page("Not Found", &format!("No page at route '{}'", route)),
        )
            .into_response(),
    }
}

fn error_page(title: &str, detail: &str) -> Response {
    Html(format!(
        r#"<!DOCTYPE html>
<html><head><title>{}</title></head><body>
<h1>{}</h1>
<pre>{}</pre>
</body></html>"#,
        title, title, detail
    ))
    .into_response()
}

/// "/docs/intro/" and "/docs/intro/index.html" both resolve to "/docs/intro"
fn normalize_route(path: &str) -> String {
    let path = path.strip_suffix("/index.html").unwrap_or(path);
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_route() {
        assert_eq!(normalize_route("/"), "/");
        assert_eq!(normalize_route("/index.html"), "/");
        assert_eq!(normalize_route("/docs/intro"), "/docs/intro");
        assert_eq!(normalize_route("/docs/intro/"), "/docs/intro");
        assert_eq!(normalize_route("/docs/intro/index.html"), "/docs/intro");
    }
}
