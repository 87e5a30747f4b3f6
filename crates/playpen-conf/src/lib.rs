use std::path::Path;

use config::{Config, ConfigError as ExternalConfigError, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration build/deserialize error")]
    Config(#[from] ExternalConfigError),
}

/// Script flavor for the playground's script editor.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ScriptLanguage {
    #[default]
    Javascript,
    Typescript,
    Babel,
    Javascriptreact,
    Typescriptreact,
}

impl ScriptLanguage {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Javascript => ".js",
            Self::Typescript => ".ts",
            Self::Babel => ".babel",
            Self::Javascriptreact => ".jsx",
            Self::Typescriptreact => ".tsx",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StylesheetLanguage {
    #[default]
    Css,
    Scss,
}

impl StylesheetLanguage {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Css => ".css",
            Self::Scss => ".scss",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MarkupLanguage {
    #[default]
    Html,
    Pug,
}

impl MarkupLanguage {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Html => ".html",
            Self::Pug => ".pug",
        }
    }
}

/// When the preview surface re-runs the assembled document.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AutoRun {
    #[default]
    OnEdit,
    OnSave,
    /// Updates are pushed but the surface only refreshes on explicit rebuild.
    Never,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub script_language: ScriptLanguage,
    pub include_stylesheet: bool,
    pub stylesheet_language: StylesheetLanguage,
    pub include_markup: bool,
    pub markup_language: MarkupLanguage,
    pub show_console: bool,
    pub auto_run: AutoRun,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            script_language: ScriptLanguage::default(),
            include_stylesheet: true,
            stylesheet_language: StylesheetLanguage::default(),
            include_markup: true,
            markup_language: MarkupLanguage::default(),
            show_console: false,
            auto_run: AutoRun::default(),
        }
    }
}

impl Settings {
    pub fn new(project_root: &Path) -> Result<Self, ConfigError> {
        let user_config_file = ProjectDirs::from("com.github", "playpen", "playpen")
            .map(|proj_dirs| proj_dirs.config_dir().join("playpen.toml"));

        Self::load_from_paths(project_root, user_config_file.as_deref())
    }

    fn load_from_paths(
        project_root: &Path,
        user_config_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = user_config_path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        builder = builder.add_source(
            File::from(project_root.join(".playpen.toml"))
                .format(FileFormat::Toml)
                .required(false),
        );

        builder = builder.add_source(
            File::from(project_root.join("playpen.toml"))
                .format(FileFormat::Toml)
                .required(false),
        );

        let config = builder.build()?;
        let settings = config.try_deserialize()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    mod defaults {
        use super::*;

        #[test]
        fn test_load_no_files() {
            let dir = tempdir().unwrap();
            let settings = Settings::load_from_paths(dir.path(), None).unwrap();
            assert_eq!(settings, Settings::default());
            assert_eq!(settings.auto_run, AutoRun::OnEdit);
            assert!(settings.include_markup);
            assert!(settings.include_stylesheet);
            assert!(!settings.show_console);
        }
    }

    mod project_files {
        use super::*;

        #[test]
        fn test_load_playpen_toml_only() {
            let dir = tempdir().unwrap();
            fs::write(
                dir.path().join("playpen.toml"),
                "script_language = \"typescriptreact\"\nauto_run = \"onSave\"\n",
            )
            .unwrap();
            let settings = Settings::load_from_paths(dir.path(), None).unwrap();
            assert_eq!(settings.script_language, ScriptLanguage::Typescriptreact);
            assert_eq!(settings.auto_run, AutoRun::OnSave);
            // Untouched fields keep their defaults.
            assert_eq!(settings.markup_language, MarkupLanguage::Html);
        }

        #[test]
        fn test_load_dot_playpen_toml_only() {
            let dir = tempdir().unwrap();
            fs::write(
                dir.path().join(".playpen.toml"),
                "stylesheet_language = \"scss\"\nshow_console = true\n",
            )
            .unwrap();
            let settings = Settings::load_from_paths(dir.path(), None).unwrap();
            assert_eq!(settings.stylesheet_language, StylesheetLanguage::Scss);
            assert!(settings.show_console);
        }
    }

    mod priority {
        use super::*;

        #[test]
        fn test_playpen_overrides_dot_playpen() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join(".playpen.toml"), "markup_language = \"html\"").unwrap();
            fs::write(dir.path().join("playpen.toml"), "markup_language = \"pug\"").unwrap();
            let settings = Settings::load_from_paths(dir.path(), None).unwrap();
            assert_eq!(settings.markup_language, MarkupLanguage::Pug);
        }

        #[test]
        fn test_project_overrides_user() {
            let user_dir = tempdir().unwrap();
            let project_dir = tempdir().unwrap();
            let user_conf_path = user_dir.path().join("playpen.toml");
            fs::write(&user_conf_path, "auto_run = \"never\"").unwrap();
            fs::write(project_dir.path().join("playpen.toml"), "auto_run = \"onEdit\"").unwrap();

            let settings =
                Settings::load_from_paths(project_dir.path(), Some(&user_conf_path)).unwrap();
            assert_eq!(settings.auto_run, AutoRun::OnEdit);
        }
    }

    mod extensions {
        use super::*;

        #[test]
        fn test_language_extensions() {
            assert_eq!(ScriptLanguage::Javascript.extension(), ".js");
            assert_eq!(ScriptLanguage::Typescriptreact.extension(), ".tsx");
            assert_eq!(StylesheetLanguage::Scss.extension(), ".scss");
            assert_eq!(MarkupLanguage::Pug.extension(), ".pug");
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn test_invalid_enum_value() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join("playpen.toml"), "auto_run = \"always\"").unwrap();
            let result = Settings::load_from_paths(dir.path(), None);
            assert!(matches!(result.unwrap_err(), ConfigError::Config(_)));
        }
    }
}
