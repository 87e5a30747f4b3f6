//! Content transformers for playground documents.
//!
//! Each transformer takes one document's text plus its file name and hands
//! back browser-ready content: scripts are transpiled when their dialect
//! calls for it, indentation-based markup renders to HTML, and nested
//! stylesheets flatten to CSS. Files already in their base form pass
//! through untouched.

mod error;
mod jsx;
mod markup;
mod script;
mod stylesheet;
mod typescript;

pub use error::TransformError;
pub use script::compile_script;
pub use script::ScriptMode;

use playpen_source::DocumentRole;

/// Render markup to literal HTML. `.pug` sources are rendered; `.html`
/// passes through unchanged.
pub fn render_markup(source: &str, file_name: &str) -> Result<String, TransformError> {
    if has_extension(file_name, ".pug") {
        markup::render(source)
    } else {
        Ok(source.to_string())
    }
}

/// Compile a stylesheet to flat CSS. `.scss` sources are compiled
/// synchronously; `.css` passes through unchanged.
pub fn compile_stylesheet(source: &str, file_name: &str) -> Result<String, TransformError> {
    if has_extension(file_name, ".scss") {
        stylesheet::compile(source)
    } else {
        Ok(source.to_string())
    }
}

/// Transform a document according to its role. The manifest's `scripts`
/// entries steer script compilation; other roles ignore them.
pub fn transform_for_role(
    role: DocumentRole,
    source: &str,
    file_name: &str,
    manifest_scripts: &[String],
) -> Result<String, TransformError> {
    match role {
        DocumentRole::Markup => render_markup(source, file_name),
        DocumentRole::Script => compile_script(source, file_name, manifest_scripts),
        DocumentRole::Stylesheet => compile_stylesheet(source, file_name),
        DocumentRole::Manifest | DocumentRole::Unrelated => Ok(source.to_string()),
    }
}

fn has_extension(file_name: &str, extension: &str) -> bool {
    file_name.len() > extension.len()
        && file_name
            .to_ascii_lowercase()
            .ends_with(&extension.to_ascii_lowercase())
}
