use playpen_conf::Settings;
use playpen_source::PLAYGROUND_MANIFEST;

use crate::files::FileSet;
use crate::manifest::Manifest;

/// Build the initial file set for a new playground from the configured
/// languages: a manifest, a script file, and optional markup/stylesheet
/// files named by each language's extension.
#[must_use]
pub fn scaffold_file_set(settings: &Settings) -> FileSet {
    let mut files = FileSet::new();

    files.insert(PLAYGROUND_MANIFEST, Manifest::default().to_pretty_json());
    files.insert(format!("script{}", settings.script_language.extension()), "");

    if settings.include_markup {
        files.insert(format!("index{}", settings.markup_language.extension()), "");
    }
    if settings.include_stylesheet {
        files.insert(
            format!("style{}", settings.stylesheet_language.extension()),
            "",
        );
    }

    files
}
