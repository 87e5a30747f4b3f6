mod kind;
mod layout;
mod uri;

pub use kind::classify;
pub use kind::is_framework_authoring;
pub use kind::DocumentRole;
pub use kind::FileKind;
pub use kind::FRAMEWORK_RUNTIME_SCRIPTS;
pub use kind::PLAYGROUND_MANIFEST;
pub use layout::EditorLayout;
pub use layout::ViewColumn;
pub use uri::DocumentUri;
pub use uri::UriError;
