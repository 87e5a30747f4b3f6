//! Host editor collaborator surface.
//!
//! The playground engine never talks to a concrete editor; everything it
//! needs from the host goes through these traits. Implementations move
//! bytes and windows around and carry no pipeline logic.

use std::sync::Arc;

use async_trait::async_trait;
use playpen_source::{DocumentUri, EditorLayout, ViewColumn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("host editor error: {0}")]
    Backend(String),
}

/// Options for opening a document into an editor slot.
#[derive(Clone, Copy, Debug)]
pub struct OpenOptions {
    pub preview: bool,
    pub view_column: ViewColumn,
    pub preserve_focus: bool,
}

/// Handle to a text editor the host opened for us.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorHandle {
    pub uri: DocumentUri,
}

/// The hosting editor's window/document API.
#[async_trait]
pub trait HostEditor: Send + Sync {
    async fn open_document(
        &self,
        uri: &DocumentUri,
        options: OpenOptions,
    ) -> Result<EditorHandle, HostError>;

    async fn close_all_editors(&self) -> Result<(), HostError>;

    async fn set_layout(&self, layout: EditorLayout) -> Result<(), HostError>;

    fn create_output_channel(&self, name: &str) -> Arc<dyn Console>;

    async fn create_preview_panel(
        &self,
        id: &str,
        title: &str,
        column: ViewColumn,
    ) -> Result<Arc<dyn PreviewPanel>, HostError>;

    /// Notification-level error report, for failures the console alone
    /// should not swallow (storage write failures in particular).
    async fn show_error_message(&self, message: &str);

    /// Restore whatever panel/command context preceded the playground.
    async fn restore_context(&self);
}

/// The playground's output console, owned by the session.
pub trait Console: Send + Sync {
    fn append_line(&self, line: &str);
    fn show(&self);
    fn dispose(&self);
}

/// The sandboxed surface the assembled preview document is pushed into.
/// Scripts are enabled; everything else about the surface belongs to the
/// host.
#[async_trait]
pub trait PreviewPanel: Send + Sync {
    async fn post_document(&self, html: &str);
    fn is_disposed(&self) -> bool;
    fn dispose(&self);
}

/// A live-document event delivered by the host's change/save subscriptions.
#[derive(Clone, Debug)]
pub enum DocumentEvent {
    Changed { uri: DocumentUri, text: String },
    Saved { uri: DocumentUri },
}

impl DocumentEvent {
    #[must_use]
    pub fn uri(&self) -> &DocumentUri {
        match self {
            Self::Changed { uri, .. } | Self::Saved { uri } => uri,
        }
    }
}
