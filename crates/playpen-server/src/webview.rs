//! Preview rendering.
//!
//! `PreviewRenderer` is the session's outlet: partial updates per document
//! role, plus an explicit full rebuild. The default implementation keeps the
//! latest browser-ready parts, assembles them into one ephemeral HTML
//! document (manifest dependencies resolved to CDN URLs), and posts it into
//! the host's sandboxed panel. Auto-run downstream of the session is the
//! renderer's call: updates tagged `run_immediately` rebuild right away,
//! everything else waits for the next explicit rebuild.

use std::sync::Arc;

use async_trait::async_trait;
use playpen_workspace::Manifest;
use tokio::sync::Mutex;
use tracing::debug;

use crate::host::PreviewPanel;

#[async_trait]
pub trait PreviewRenderer: Send + Sync {
    async fn update_html(&self, content: &str, run_immediately: bool);
    async fn update_java_script(&self, content: &str, run_immediately: bool);
    async fn update_css(&self, content: &str, run_immediately: bool);
    async fn update_manifest(&self, content: &str, run_immediately: bool);

    /// Rebuild and repost the full document. The session awaits this once
    /// before considering the playground ready.
    async fn rebuild_webview(&self);
}

#[derive(Default)]
struct Parts {
    html: String,
    css: String,
    java_script: String,
    manifest: String,
}

/// Default renderer over the host's preview panel.
pub struct PlaygroundWebview {
    panel: Arc<dyn PreviewPanel>,
    parts: Mutex<Parts>,
}

impl PlaygroundWebview {
    #[must_use]
    pub fn new(panel: Arc<dyn PreviewPanel>) -> Self {
        Self {
            panel,
            parts: Mutex::new(Parts::default()),
        }
    }

    async fn rebuild(&self) {
        if self.panel.is_disposed() {
            debug!("preview panel is gone; skipping rebuild");
            return;
        }
        let document = {
            let parts = self.parts.lock().await;
            assemble_document(&parts)
        };
        self.panel.post_document(&document).await;
    }
}

#[async_trait]
impl PreviewRenderer for PlaygroundWebview {
    async fn update_html(&self, content: &str, run_immediately: bool) {
        self.parts.lock().await.html = content.to_string();
        if run_immediately {
            self.rebuild().await;
        }
    }

    async fn update_java_script(&self, content: &str, run_immediately: bool) {
        self.parts.lock().await.java_script = content.to_string();
        if run_immediately {
            self.rebuild().await;
        }
    }

    async fn update_css(&self, content: &str, run_immediately: bool) {
        self.parts.lock().await.css = content.to_string();
        if run_immediately {
            self.rebuild().await;
        }
    }

    async fn update_manifest(&self, content: &str, run_immediately: bool) {
        self.parts.lock().await.manifest = content.to_string();
        if run_immediately {
            self.rebuild().await;
        }
    }

    async fn rebuild_webview(&self) {
        self.rebuild().await;
    }
}

/// Resolve a manifest dependency entry to something a `src`/`href`
/// attribute can load: explicit URLs pass through, bare package names go to
/// the CDN.
fn dependency_url(entry: &str) -> String {
    if entry.starts_with("http://") || entry.starts_with("https://") || entry.starts_with("//") {
        entry.to_string()
    } else {
        format!("https://unpkg.com/{entry}")
    }
}

fn assemble_document(parts: &Parts) -> String {
    let manifest = if parts.manifest.is_empty() {
        Manifest::default()
    } else {
        Manifest::parse(&parts.manifest).unwrap_or_default()
    };

    let mut head = String::new();
    for style in &manifest.styles {
        head.push_str(&format!(
            "    <link rel=\"stylesheet\" href=\"{}\">\n",
            dependency_url(style)
        ));
    }
    for script in &manifest.scripts {
        head.push_str(&format!(
            "    <script src=\"{}\"></script>\n",
            dependency_url(script)
        ));
    }

    format!(
        "<!DOCTYPE html>\n<html>\n  <head>\n{head}    <style>\n{css}\n    </style>\n  </head>\n  <body>\n{html}\n    <script>\n{js}\n    </script>\n  </body>\n</html>\n",
        head = head,
        css = parts.css,
        html = parts.html,
        js = parts.java_script,
    )
}
