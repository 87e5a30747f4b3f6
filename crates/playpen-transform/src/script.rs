//! Script compilation mode selection.

use playpen_source::FRAMEWORK_RUNTIME_SCRIPTS;

use crate::error::TransformError;
use crate::jsx;
use crate::typescript;

/// How a script document gets compiled, chosen from its extension and the
/// manifest's declared dependencies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptMode {
    /// Plain JavaScript: the identity transform.
    PassThrough,
    /// Type syntax is erased; no element rewriting (`.ts`, which still
    /// permits angle-bracket casts that would collide with element syntax).
    Standard,
    /// Element rewriting plus type erasure (`.jsx`, `.tsx`, `.babel`, or any
    /// script once the manifest pulls in the framework runtime).
    JsxAware,
}

impl ScriptMode {
    #[must_use]
    pub fn select(file_name: &str, manifest_scripts: &[String]) -> Self {
        let lower = file_name.to_ascii_lowercase();
        let runtime_declared = manifest_scripts
            .iter()
            .any(|entry| entry.as_str() == FRAMEWORK_RUNTIME_SCRIPTS[0]);

        if lower.ends_with(".jsx") || lower.ends_with(".tsx") || lower.ends_with(".babel") {
            Self::JsxAware
        } else if lower.ends_with(".ts") {
            Self::Standard
        } else if runtime_declared {
            Self::JsxAware
        } else {
            Self::PassThrough
        }
    }
}

/// Compile a script document to browser-ready JavaScript.
pub fn compile_script(
    source: &str,
    file_name: &str,
    manifest_scripts: &[String],
) -> Result<String, TransformError> {
    match ScriptMode::select(file_name, manifest_scripts) {
        ScriptMode::PassThrough => Ok(source.to_string()),
        ScriptMode::Standard => typescript::strip(source),
        ScriptMode::JsxAware => typescript::strip(&jsx::transform(source)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_js_is_identity() {
        let src = "const answer = 6 * 7;\nconsole.log(answer);";
        assert_eq!(compile_script(src, "script.js", &[]).unwrap(), src);
    }

    #[test]
    fn test_mode_selection() {
        assert_eq!(ScriptMode::select("a.js", &[]), ScriptMode::PassThrough);
        assert_eq!(ScriptMode::select("a.ts", &[]), ScriptMode::Standard);
        assert_eq!(ScriptMode::select("a.tsx", &[]), ScriptMode::JsxAware);
        assert_eq!(ScriptMode::select("a.jsx", &[]), ScriptMode::JsxAware);
        assert_eq!(ScriptMode::select("a.babel", &[]), ScriptMode::JsxAware);
    }

    #[test]
    fn test_manifest_runtime_enables_element_rewriting() {
        let manifest = vec!["react".to_string(), "react-dom".to_string()];
        assert_eq!(ScriptMode::select("a.js", &manifest), ScriptMode::JsxAware);

        let js = compile_script("const el = <p>hi</p>;", "a.js", &manifest).unwrap();
        assert_eq!(js, "const el = React.createElement(\"p\", null, \"hi\");");
    }

    #[test]
    fn test_tsx_combines_both_passes() {
        let js = compile_script(
            "const el: any = <p id={n as string}>hi</p>;",
            "app.tsx",
            &[],
        )
        .unwrap();
        assert_eq!(
            js,
            "const el = React.createElement(\"p\", {\"id\": n}, \"hi\");"
        );
    }

    #[test]
    fn test_ts_strips_without_element_rewriting() {
        let js = compile_script("const n: number = 1;", "app.ts", &[]).unwrap();
        assert_eq!(js, "const n = 1;");
    }

    #[test]
    fn test_decorators_survive_every_mode() {
        let src = "@observer\nclass Store {}";
        assert_eq!(compile_script(src, "a.js", &[]).unwrap(), src);
        assert_eq!(compile_script(src, "a.ts", &[]).unwrap(), src);
        assert_eq!(compile_script(src, "a.tsx", &[]).unwrap(), src);
    }
}
