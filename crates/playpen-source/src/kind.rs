use crate::uri::DocumentUri;

/// Well-known manifest file name within a playground's file set.
pub const PLAYGROUND_MANIFEST: &str = "playground.json";

/// Runtime packages a playground needs once framework-authoring syntax is in
/// play. Order matters: the runtime must load before the DOM renderer.
pub const FRAMEWORK_RUNTIME_SCRIPTS: &[&str] = &["react", "react-dom"];

const MARKUP_EXTENSIONS: &[&str] = &[".html", ".pug"];
const STYLESHEET_EXTENSIONS: &[&str] = &[".css", ".scss"];
const SCRIPT_EXTENSIONS: &[&str] = &[".js", ".jsx", ".ts", ".tsx", ".babel"];

/// Script extensions that imply component-authoring syntax and therefore a
/// framework runtime dependency pair.
const FRAMEWORK_AUTHORING_EXTENSIONS: &[&str] = &[".jsx", ".ts", ".tsx", ".babel"];

/// The kind of file a playground name maps to, by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileKind {
    Markup,
    Script,
    Stylesheet,
    Manifest,
}

impl FileKind {
    /// Classify a bare file name. Manifest wins over extension; comparisons
    /// are case-insensitive on the full extension including the leading dot.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case(PLAYGROUND_MANIFEST) {
            return Some(Self::Manifest);
        }

        let ext = extension_of(name)?;
        if matches_any(&ext, MARKUP_EXTENSIONS) {
            Some(Self::Markup)
        } else if matches_any(&ext, STYLESHEET_EXTENSIONS) {
            Some(Self::Stylesheet)
        } else if matches_any(&ext, SCRIPT_EXTENSIONS) {
            Some(Self::Script)
        } else {
            None
        }
    }
}

/// The classified purpose of a live document relative to the active playground.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentRole {
    Markup,
    Script,
    Stylesheet,
    Manifest,
    Unrelated,
}

impl From<FileKind> for DocumentRole {
    fn from(kind: FileKind) -> Self {
        match kind {
            FileKind::Markup => Self::Markup,
            FileKind::Script => Self::Script,
            FileKind::Stylesheet => Self::Stylesheet,
            FileKind::Manifest => Self::Manifest,
        }
    }
}

/// Determine the role of `uri` relative to the playground backed by
/// `active_gist_id`. A document from any other snippet is `Unrelated`
/// regardless of its name.
#[must_use]
pub fn classify(uri: &DocumentUri, active_gist_id: &str) -> DocumentRole {
    if uri.gist_id() != active_gist_id {
        return DocumentRole::Unrelated;
    }

    FileKind::from_file_name(uri.file_name())
        .map_or(DocumentRole::Unrelated, DocumentRole::from)
}

/// True for script extensions that require the framework runtime pair.
#[must_use]
pub fn is_framework_authoring(name: &str) -> bool {
    extension_of(name).is_some_and(|ext| matches_any(&ext, FRAMEWORK_AUTHORING_EXTENSIONS))
}

fn extension_of(name: &str) -> Option<String> {
    let dot = name.rfind('.')?;
    // A leading dot is a hidden file, not an extension.
    if dot == 0 {
        return None;
    }
    Some(name[dot..].to_ascii_lowercase())
}

fn matches_any(ext: &str, set: &[&str]) -> bool {
    set.iter().any(|candidate| ext.eq_ignore_ascii_case(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup_extensions() {
        assert_eq!(FileKind::from_file_name("index.html"), Some(FileKind::Markup));
        assert_eq!(FileKind::from_file_name("index.PUG"), Some(FileKind::Markup));
    }

    #[test]
    fn test_stylesheet_extensions() {
        assert_eq!(FileKind::from_file_name("style.css"), Some(FileKind::Stylesheet));
        assert_eq!(FileKind::from_file_name("style.scss"), Some(FileKind::Stylesheet));
    }

    #[test]
    fn test_script_extensions() {
        for name in ["app.js", "app.jsx", "app.ts", "app.tsx", "app.babel"] {
            assert_eq!(FileKind::from_file_name(name), Some(FileKind::Script), "{name}");
        }
    }

    #[test]
    fn test_manifest_beats_extension() {
        assert_eq!(
            FileKind::from_file_name("playground.json"),
            Some(FileKind::Manifest)
        );
        assert_eq!(
            FileKind::from_file_name("PLAYGROUND.JSON"),
            Some(FileKind::Manifest)
        );
        // Other json files are not playground files at all.
        assert_eq!(FileKind::from_file_name("data.json"), None);
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(FileKind::from_file_name("readme.md"), None);
        assert_eq!(FileKind::from_file_name("Makefile"), None);
        assert_eq!(FileKind::from_file_name(".gitignore"), None);
    }

    #[test]
    fn test_framework_authoring() {
        assert!(is_framework_authoring("app.jsx"));
        assert!(is_framework_authoring("app.ts"));
        assert!(is_framework_authoring("app.TSX"));
        assert!(is_framework_authoring("app.babel"));
        assert!(!is_framework_authoring("app.js"));
        assert!(!is_framework_authoring("index.html"));
    }

    #[test]
    fn test_classify_foreign_gist_is_always_unrelated() {
        for name in ["index.html", "app.tsx", "style.scss", "playground.json"] {
            let uri = DocumentUri::new("other", name).unwrap();
            assert_eq!(classify(&uri, "active"), DocumentRole::Unrelated, "{name}");
        }
    }

    #[test]
    fn test_classify_matching_gist_by_extension() {
        let cases = [
            ("index.html", DocumentRole::Markup),
            ("app.tsx", DocumentRole::Script),
            ("style.scss", DocumentRole::Stylesheet),
            ("playground.json", DocumentRole::Manifest),
            ("notes.txt", DocumentRole::Unrelated),
        ];
        for (name, expected) in cases {
            let uri = DocumentUri::new("active", name).unwrap();
            assert_eq!(classify(&uri, "active"), expected, "{name}");
        }
    }
}
