mod debounce;
mod host;
mod logging;
mod session;
mod webview;

pub use debounce::Debouncer;
pub use host::Console;
pub use host::DocumentEvent;
pub use host::EditorHandle;
pub use host::HostEditor;
pub use host::HostError;
pub use host::OpenOptions;
pub use host::PreviewPanel;
pub use logging::init_tracing;
pub use logging::ConsoleLayer;
pub use session::OpenEditors;
pub use session::RendererFactory;
pub use session::Session;
pub use session::SessionManager;
pub use webview::PlaygroundWebview;
pub use webview::PreviewRenderer;
