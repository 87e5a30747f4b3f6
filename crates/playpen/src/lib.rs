//! playpen — a gist-backed live playground engine.
//!
//! Turns a snippet's documents (markup, stylesheet, script, manifest) into
//! a live, auto-refreshing preview: live edits are classified by role,
//! transformed into browser-ready content, and pushed into a sandboxed
//! preview surface behind a debounced, cancelable refresh protocol.
//!
//! The engine is host-agnostic: the editor it runs inside implements the
//! [`HostEditor`] collaborator traits, and snippet storage sits behind
//! [`GistStore`]. Open a playground through the [`SessionManager`], which
//! owns the at-most-one active [`Session`].
//!
//! ```no_run
//! # use std::sync::Arc;
//! # async fn open(host: Arc<dyn playpen::HostEditor>, store: Arc<dyn playpen::GistStore>) -> anyhow::Result<()> {
//! let manager = playpen::SessionManager::new(host, store);
//! let settings = playpen::Settings::default();
//! let session = manager.open_playground("0123abcd", settings).await?;
//! assert!(session.is_open().await);
//! # Ok(())
//! # }
//! ```

pub use playpen_conf::{
    AutoRun, ConfigError, MarkupLanguage, ScriptLanguage, Settings, StylesheetLanguage,
};
pub use playpen_server::{
    init_tracing, Console, ConsoleLayer, DocumentEvent, EditorHandle, HostEditor, HostError,
    OpenEditors, OpenOptions, PlaygroundWebview, PreviewPanel, PreviewRenderer, RendererFactory,
    Session, SessionManager,
};
pub use playpen_source::{
    classify, is_framework_authoring, DocumentRole, DocumentUri, EditorLayout, FileKind,
    ViewColumn, FRAMEWORK_RUNTIME_SCRIPTS, PLAYGROUND_MANIFEST,
};
pub use playpen_transform::{
    compile_script, compile_stylesheet, render_markup, transform_for_role, ScriptMode,
    TransformError,
};
pub use playpen_workspace::{
    resolve_manifest_content, scaffold_file_set, FileSet, GistFile, GistStore, InMemoryStore,
    Manifest, ManifestResolution, StorageError,
};
