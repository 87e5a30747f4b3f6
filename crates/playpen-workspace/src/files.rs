use std::collections::BTreeMap;

use playpen_source::{is_framework_authoring, FileKind, PLAYGROUND_MANIFEST};

/// One file within a snippet's file set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GistFile {
    pub content: String,
}

impl GistFile {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// The in-memory file set of one playground's backing snippet, keyed by
/// file name. The playground reads and occasionally mutates it; mutations
/// must also be pushed back through the storage collaborator by the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileSet {
    files: BTreeMap<String, GistFile>,
}

impl FileSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.files.insert(name.into(), GistFile::new(content));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&GistFile> {
        self.files.get(name)
    }

    #[must_use]
    pub fn content(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(|file| file.content.as_str())
    }

    pub fn set_content(&mut self, name: &str, content: impl Into<String>) {
        if let Some(file) = self.files.get_mut(name) {
            file.content = content.into();
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn remove(&mut self, name: &str) -> Option<GistFile> {
        self.files.remove(name)
    }

    /// Migrate a record under a new key, dropping the old one. Used when a
    /// live editor renames its document.
    pub fn rename(&mut self, old_name: &str, new_name: impl Into<String>) -> bool {
        match self.files.remove(old_name) {
            Some(file) => {
                self.files.insert(new_name.into(), file);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GistFile)> {
        self.files.iter().map(|(name, file)| (name.as_str(), file))
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    /// The manifest file's raw text, if the set carries one.
    #[must_use]
    pub fn manifest_text(&self) -> Option<&str> {
        self.files
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(PLAYGROUND_MANIFEST))
            .map(|(_, file)| file.content.as_str())
    }

    #[must_use]
    pub fn manifest_name(&self) -> Option<&str> {
        self.files
            .keys()
            .find(|name| name.eq_ignore_ascii_case(PLAYGROUND_MANIFEST))
            .map(String::as_str)
    }

    /// The first file of the given kind, in name order.
    #[must_use]
    pub fn first_of_kind(&self, kind: FileKind) -> Option<&str> {
        self.files
            .keys()
            .find(|name| FileKind::from_file_name(name) == Some(kind))
            .map(String::as_str)
    }

    /// The editor kinds present in this set, in fixed markup, script,
    /// stylesheet order. Drives layout selection.
    #[must_use]
    pub fn present_kinds(&self) -> Vec<FileKind> {
        [FileKind::Markup, FileKind::Script, FileKind::Stylesheet]
            .into_iter()
            .filter(|kind| self.first_of_kind(*kind).is_some())
            .collect()
    }

    /// True when any file carries a framework-authoring extension, which
    /// obligates the manifest to declare the framework runtime pair.
    #[must_use]
    pub fn has_framework_authoring_file(&self) -> bool {
        self.files.keys().any(|name| is_framework_authoring(name))
    }
}

impl FromIterator<(String, String)> for FileSet {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (name, content) in iter {
            set.insert(name, content);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileSet {
        let mut files = FileSet::new();
        files.insert("index.html", "<h1>hi</h1>");
        files.insert("app.tsx", "export {};");
        files.insert("style.scss", ".a { color: red; }");
        files.insert("playground.json", "{\"scripts\":[],\"styles\":[]}");
        files
    }

    #[test]
    fn test_present_kinds_in_fixed_order() {
        assert_eq!(
            sample().present_kinds(),
            vec![FileKind::Markup, FileKind::Script, FileKind::Stylesheet]
        );
    }

    #[test]
    fn test_first_of_kind() {
        let files = sample();
        assert_eq!(files.first_of_kind(FileKind::Script), Some("app.tsx"));
        assert_eq!(files.first_of_kind(FileKind::Markup), Some("index.html"));
    }

    #[test]
    fn test_manifest_lookup_is_case_insensitive() {
        let mut files = FileSet::new();
        files.insert("PLAYGROUND.json", "{}");
        assert_eq!(files.manifest_text(), Some("{}"));
        assert_eq!(files.manifest_name(), Some("PLAYGROUND.json"));
    }

    #[test]
    fn test_rename_migrates_record() {
        let mut files = sample();
        assert!(files.rename("app.tsx", "main.tsx"));
        assert!(!files.contains("app.tsx"));
        assert_eq!(files.content("main.tsx"), Some("export {};"));
        assert!(!files.rename("gone.js", "still-gone.js"));
    }

    #[test]
    fn test_framework_authoring_detection() {
        assert!(sample().has_framework_authoring_file());

        let mut plain = FileSet::new();
        plain.insert("script.js", "");
        plain.insert("index.html", "");
        assert!(!plain.has_framework_authoring_file());
    }
}
