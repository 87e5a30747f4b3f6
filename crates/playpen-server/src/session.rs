//! Playground session lifecycle.
//!
//! A [`Session`] owns one live playground: the opened editors, the preview
//! surface, the output console and the debounced change subscription. The
//! [`SessionManager`] guarantees at most one session exists at a time;
//! opening a new playground fully closes the previous one first.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use playpen_conf::{AutoRun, Settings};
use playpen_source::{classify, DocumentRole, DocumentUri, EditorLayout, FileKind};
use playpen_transform::{
    compile_script, compile_stylesheet, render_markup, TransformError,
};
use playpen_workspace::{resolve_manifest_content, FileSet, GistStore, Manifest};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::debounce::Debouncer;
use crate::host::{
    Console, DocumentEvent, EditorHandle, HostEditor, OpenOptions, PreviewPanel,
};
use crate::webview::{PlaygroundWebview, PreviewRenderer};

/// Quiet window for coalescing rapid-fire document changes.
const DEBOUNCE_QUIET: Duration = Duration::from_millis(100);

const PREVIEW_PANEL_ID: &str = "playpen.preview";
const CONSOLE_NAME: &str = "Playground";

/// Builds the renderer once the preview panel exists. The default factory
/// produces a [`PlaygroundWebview`]; tests substitute recording doubles.
pub type RendererFactory =
    Box<dyn FnOnce(Arc<dyn PreviewPanel>) -> Arc<dyn PreviewRenderer> + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionState {
    Opening,
    Open,
    Closed,
}

/// Editor handles per role, explicit rather than threaded through closures.
#[derive(Debug, Default)]
pub struct OpenEditors {
    pub markup: Option<EditorHandle>,
    pub script: Option<EditorHandle>,
    pub stylesheet: Option<EditorHandle>,
}

struct Live {
    state: SessionState,
    files: FileSet,
    editors: OpenEditors,
    /// Script file name as last observed; a change arriving for the script
    /// role under a different name is a rename.
    last_script_file: Option<String>,
}

struct SessionInner {
    gist_id: String,
    settings: Settings,
    host: Arc<dyn HostEditor>,
    store: Arc<dyn GistStore>,
    renderer: Arc<dyn PreviewRenderer>,
    console: Arc<dyn Console>,
    live: Mutex<Live>,
}

pub struct Session {
    inner: Arc<SessionInner>,
    debouncer: Debouncer<DocumentEvent>,
}

/// Dispatch order for roles changing within the same debounce window.
fn dispatch_rank(role: DocumentRole) -> u8 {
    match role {
        DocumentRole::Markup => 0,
        DocumentRole::Script => 1,
        DocumentRole::Manifest => 2,
        DocumentRole::Stylesheet => 3,
        DocumentRole::Unrelated => 4,
    }
}

impl Session {
    pub(crate) async fn open(
        gist_id: &str,
        settings: Settings,
        host: Arc<dyn HostEditor>,
        store: Arc<dyn GistStore>,
        renderer_factory: RendererFactory,
    ) -> Result<Arc<Self>> {
        info!(gist = gist_id, "opening playground");

        let mut files = store
            .list_files(gist_id)
            .await
            .with_context(|| format!("failed to load snippet '{gist_id}'"))?;

        let layout = EditorLayout::for_present_kinds(&files.present_kinds());
        host.close_all_editors()
            .await
            .context("failed to close pre-playground editors")?;
        host.set_layout(layout)
            .await
            .context("failed to apply playground layout")?;

        let mut editors = OpenEditors::default();
        let mut slot = 0usize;
        for kind in EditorLayout::editor_order() {
            let Some(name) = files.first_of_kind(kind).map(ToString::to_string) else {
                continue;
            };
            let uri = DocumentUri::new(gist_id, &name)?;
            let handle = host
                .open_document(
                    &uri,
                    OpenOptions {
                        preview: false,
                        view_column: layout.editor_column(slot),
                        preserve_focus: true,
                    },
                )
                .await
                .with_context(|| format!("failed to open editor for '{name}'"))?;
            match kind {
                FileKind::Markup => editors.markup = Some(handle),
                FileKind::Script => editors.script = Some(handle),
                FileKind::Stylesheet => editors.stylesheet = Some(handle),
                FileKind::Manifest => {}
            }
            slot += 1;
        }
        let last_script_file = files.first_of_kind(FileKind::Script).map(ToString::to_string);

        let panel = host
            .create_preview_panel(
                PREVIEW_PANEL_ID,
                &format!("Playground: {gist_id}"),
                layout.preview_column(slot),
            )
            .await
            .context("failed to create the preview panel")?;
        let console = host.create_output_channel(CONSOLE_NAME);
        if settings.show_console {
            console.show();
        }
        let renderer = renderer_factory(panel);

        let inner = Arc::new(SessionInner {
            gist_id: gist_id.to_string(),
            settings,
            host,
            store,
            renderer,
            console,
            live: Mutex::new(Live {
                state: SessionState::Opening,
                files: FileSet::new(),
                editors,
                last_script_file,
            }),
        });

        // Initial full render: manifest, then HTML, CSS and script, then one
        // explicit rebuild the playground is "ready" after.
        let resolution =
            resolve_manifest_content(&mut files, inner.store.as_ref(), gist_id).await;
        if let Some(error) = resolution.write_error {
            inner
                .host
                .show_error_message(&format!("Failed to save manifest update: {error}"))
                .await;
        }
        inner.renderer.update_manifest(&resolution.content, false).await;

        if let Some(name) = files.first_of_kind(FileKind::Markup).map(ToString::to_string) {
            let text = files.content(&name).unwrap_or_default().to_string();
            match render_markup(&text, &name) {
                Ok(html) => inner.renderer.update_html(&html, false).await,
                Err(error) => inner.report_transform_error(&error),
            }
        }

        if let Some(name) = files
            .first_of_kind(FileKind::Stylesheet)
            .map(ToString::to_string)
        {
            let text = files.content(&name).unwrap_or_default().to_string();
            match compile_stylesheet(&text, &name) {
                Ok(css) => inner.renderer.update_css(&css, false).await,
                Err(error) => inner.report_transform_error(&error),
            }
        }

        if let Some(name) = files.first_of_kind(FileKind::Script).map(ToString::to_string) {
            let text = files.content(&name).unwrap_or_default().to_string();
            let scripts = Manifest::parse(&resolution.content)
                .map(|manifest| manifest.scripts)
                .unwrap_or_default();
            match compile_script(&text, &name, &scripts) {
                Ok(js) => inner.renderer.update_java_script(&js, false).await,
                Err(error) => inner.report_transform_error(&error),
            }
        }

        inner.renderer.rebuild_webview().await;

        {
            let mut live = inner.live.lock().await;
            live.files = files;
            live.state = SessionState::Open;
        }

        let handler_inner = Arc::clone(&inner);
        let key_gist = gist_id.to_string();
        let debouncer = Debouncer::new(
            DEBOUNCE_QUIET,
            move |event: &DocumentEvent| dispatch_rank(classify(event.uri(), &key_gist)),
            move |mut batch: Vec<DocumentEvent>| {
                let inner = Arc::clone(&handler_inner);
                async move {
                    batch.sort_by_key(|event| dispatch_rank(classify(event.uri(), &inner.gist_id)));
                    for event in batch {
                        inner.handle_change(event).await;
                    }
                }
            },
        );

        info!(gist = gist_id, "playground ready");
        Ok(Arc::new(Self { inner, debouncer }))
    }

    #[must_use]
    pub fn gist_id(&self) -> &str {
        &self.inner.gist_id
    }

    pub async fn is_open(&self) -> bool {
        self.inner.live.lock().await.state == SessionState::Open
    }

    /// Feed a host change event into the debounced pipeline. Rapid-fire
    /// events coalesce; only the state after the last event in a quiet
    /// window is rendered.
    pub fn notify_document_changed(&self, uri: DocumentUri, text: String) {
        self.debouncer.call(DocumentEvent::Changed { uri, text });
    }

    /// Host save event. Only meaningful under the on-save auto-run policy.
    pub async fn notify_document_saved(&self, uri: &DocumentUri) {
        self.inner.handle_saved(uri).await;
    }

    /// Tear the playground down. Idempotent; pending debounced work is
    /// cancelled and never renders.
    pub async fn close(&self) {
        {
            let mut live = self.inner.live.lock().await;
            if live.state == SessionState::Closed {
                debug!("close on a closed session is a no-op");
                return;
            }
            live.state = SessionState::Closed;
            live.editors = OpenEditors::default();
        }

        info!(gist = %self.inner.gist_id, "closing playground");
        self.debouncer.dispose();
        self.inner.console.dispose();
        if let Err(error) = self.inner.host.close_all_editors().await {
            warn!(%error, "failed to close playground editors");
        }
        self.inner.host.restore_context().await;
    }
}

impl SessionInner {
    async fn handle_change(&self, event: DocumentEvent) {
        let DocumentEvent::Changed { uri, text } = event else {
            return;
        };

        let mut live = self.live.lock().await;
        if live.state != SessionState::Open {
            debug!("change arrived after close; ignoring");
            return;
        }

        let role = classify(&uri, &self.gist_id);
        let run = self.settings.auto_run == AutoRun::OnEdit;
        let name = uri.file_name().to_string();

        match role {
            DocumentRole::Unrelated => {}
            DocumentRole::Manifest => {
                live.files.set_content(&name, text.as_str());
                self.renderer.update_manifest(&text, run).await;
            }
            DocumentRole::Markup => {
                live.files.set_content(&name, text.as_str());
                match render_markup(&text, &name) {
                    Ok(html) => self.renderer.update_html(&html, run).await,
                    Err(error) => self.report_transform_error(&error),
                }
            }
            DocumentRole::Stylesheet => {
                live.files.set_content(&name, text.as_str());
                match compile_stylesheet(&text, &name) {
                    Ok(css) => self.renderer.update_css(&css, run).await,
                    Err(error) => self.report_transform_error(&error),
                }
            }
            DocumentRole::Script => {
                let renamed = live.last_script_file.as_deref().is_some_and(|last| {
                    last != name && live.files.contains(last) && !live.files.contains(&name)
                });
                if renamed {
                    if let Some(old) = live.last_script_file.clone() {
                        live.files.rename(&old, name.clone());
                        if let Some(script) = live.editors.script.as_mut() {
                            script.uri = uri.clone();
                        }
                        info!(from = %old, to = %name, "script file renamed; refreshing manifest");
                        let resolution =
                            resolve_manifest_content(&mut live.files, self.store.as_ref(), &self.gist_id)
                                .await;
                        if let Some(error) = resolution.write_error {
                            self.host
                                .show_error_message(&format!(
                                    "Failed to save manifest update: {error}"
                                ))
                                .await;
                        }
                        self.renderer.update_manifest(&resolution.content, run).await;
                    }
                }

                live.files.set_content(&name, text.as_str());
                live.last_script_file = Some(name.clone());

                let scripts = manifest_scripts(&live.files);
                match compile_script(&text, &name, &scripts) {
                    Ok(js) => self.renderer.update_java_script(&js, run).await,
                    Err(error) => self.report_transform_error(&error),
                }
            }
        }
    }

    async fn handle_saved(&self, uri: &DocumentUri) {
        if self.settings.auto_run != AutoRun::OnSave {
            return;
        }
        {
            let live = self.live.lock().await;
            if live.state != SessionState::Open {
                return;
            }
        }
        if classify(uri, &self.gist_id) == DocumentRole::Unrelated {
            return;
        }
        self.renderer.rebuild_webview().await;
    }

    fn report_transform_error(&self, error: &TransformError) {
        warn!(%error, "transform failed; keeping previous preview content");
        self.console.append_line(&format!("[error] {error}"));
    }
}

fn manifest_scripts(files: &FileSet) -> Vec<String> {
    files
        .manifest_text()
        .and_then(|text| Manifest::parse(text).ok())
        .map(|manifest| manifest.scripts)
        .unwrap_or_default()
}

/// Owns the at-most-one active session. Opening a playground while another
/// is open closes the previous one completely before the new one installs
/// itself.
pub struct SessionManager {
    host: Arc<dyn HostEditor>,
    store: Arc<dyn GistStore>,
    active: Mutex<Option<Arc<Session>>>,
}

impl SessionManager {
    #[must_use]
    pub fn new(host: Arc<dyn HostEditor>, store: Arc<dyn GistStore>) -> Self {
        Self {
            host,
            store,
            active: Mutex::new(None),
        }
    }

    pub async fn open_playground(
        &self,
        gist_id: &str,
        settings: Settings,
    ) -> Result<Arc<Session>> {
        self.open_playground_with(
            gist_id,
            settings,
            Box::new(|panel| Arc::new(PlaygroundWebview::new(panel)) as Arc<dyn PreviewRenderer>),
        )
        .await
    }

    /// Open with a caller-supplied renderer; hosts with their own preview
    /// plumbing (and tests) hook in here.
    pub async fn open_playground_with(
        &self,
        gist_id: &str,
        settings: Settings,
        renderer_factory: RendererFactory,
    ) -> Result<Arc<Session>> {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            previous.close().await;
        }

        match Session::open(
            gist_id,
            settings,
            Arc::clone(&self.host),
            Arc::clone(&self.store),
            renderer_factory,
        )
        .await
        {
            Ok(session) => {
                *active = Some(Arc::clone(&session));
                Ok(session)
            }
            Err(error) => {
                self.host
                    .show_error_message(&format!("Failed to open playground: {error:#}"))
                    .await;
                Err(error)
            }
        }
    }

    pub async fn active(&self) -> Option<Arc<Session>> {
        self.active.lock().await.clone()
    }

    /// Close and clear the active session, if any. Safe to call when none
    /// is open.
    pub async fn close_active(&self) {
        if let Some(session) = self.active.lock().await.take() {
            session.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use playpen_source::ViewColumn;
    use playpen_workspace::InMemoryStore;

    use super::*;
    use crate::host::HostError;

    #[derive(Default)]
    struct RecordingConsole {
        lines: StdMutex<Vec<String>>,
        disposed: AtomicBool,
    }

    impl Console for RecordingConsole {
        fn append_line(&self, line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }

        fn show(&self) {}

        fn dispose(&self) {
            self.disposed.store(true, Ordering::SeqCst);
        }
    }

    struct NullPanel;

    #[async_trait]
    impl PreviewPanel for NullPanel {
        async fn post_document(&self, _html: &str) {}

        fn is_disposed(&self) -> bool {
            false
        }

        fn dispose(&self) {}
    }

    #[derive(Default)]
    struct RecordingHost {
        opened: StdMutex<Vec<(String, u8)>>,
        layouts: StdMutex<Vec<EditorLayout>>,
        panel_columns: StdMutex<Vec<u8>>,
        errors: StdMutex<Vec<String>>,
        close_all_calls: AtomicUsize,
        restore_calls: AtomicUsize,
        console: Arc<RecordingConsole>,
    }

    #[async_trait]
    impl HostEditor for RecordingHost {
        async fn open_document(
            &self,
            uri: &DocumentUri,
            options: OpenOptions,
        ) -> Result<EditorHandle, HostError> {
            self.opened
                .lock()
                .unwrap()
                .push((uri.file_name().to_string(), options.view_column.0));
            Ok(EditorHandle { uri: uri.clone() })
        }

        async fn close_all_editors(&self) -> Result<(), HostError> {
            self.close_all_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn set_layout(&self, layout: EditorLayout) -> Result<(), HostError> {
            self.layouts.lock().unwrap().push(layout);
            Ok(())
        }

        fn create_output_channel(&self, _name: &str) -> Arc<dyn Console> {
            Arc::clone(&self.console) as Arc<dyn Console>
        }

        async fn create_preview_panel(
            &self,
            _id: &str,
            _title: &str,
            column: ViewColumn,
        ) -> Result<Arc<dyn PreviewPanel>, HostError> {
            self.panel_columns.lock().unwrap().push(column.0);
            Ok(Arc::new(NullPanel) as Arc<dyn PreviewPanel>)
        }

        async fn show_error_message(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }

        async fn restore_context(&self) {
            self.restore_calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum RenderCall {
        Manifest(String, bool),
        Html(String, bool),
        Css(String, bool),
        Js(String, bool),
        Rebuild,
    }

    #[derive(Default)]
    struct RecordingRenderer {
        calls: StdMutex<Vec<RenderCall>>,
    }

    impl RecordingRenderer {
        fn calls(&self) -> Vec<RenderCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PreviewRenderer for RecordingRenderer {
        async fn update_html(&self, content: &str, run_immediately: bool) {
            self.calls
                .lock()
                .unwrap()
                .push(RenderCall::Html(content.to_string(), run_immediately));
        }

        async fn update_java_script(&self, content: &str, run_immediately: bool) {
            self.calls
                .lock()
                .unwrap()
                .push(RenderCall::Js(content.to_string(), run_immediately));
        }

        async fn update_css(&self, content: &str, run_immediately: bool) {
            self.calls
                .lock()
                .unwrap()
                .push(RenderCall::Css(content.to_string(), run_immediately));
        }

        async fn update_manifest(&self, content: &str, run_immediately: bool) {
            self.calls
                .lock()
                .unwrap()
                .push(RenderCall::Manifest(content.to_string(), run_immediately));
        }

        async fn rebuild_webview(&self) {
            self.calls.lock().unwrap().push(RenderCall::Rebuild);
        }
    }

    const GIST: &str = "g1";
    const MANIFEST_EMPTY: &str = "{\"scripts\":[],\"styles\":[]}";

    struct Fixture {
        manager: SessionManager,
        host: Arc<RecordingHost>,
        store: Arc<InMemoryStore>,
        renderer: Arc<RecordingRenderer>,
    }

    fn fixture(seed: &[(&str, &str)]) -> Fixture {
        let host = Arc::new(RecordingHost::default());
        let store = Arc::new(InMemoryStore::new());
        let files: FileSet = seed
            .iter()
            .map(|(name, content)| ((*name).to_string(), (*content).to_string()))
            .collect();
        store.seed(GIST, &files);

        let manager = SessionManager::new(
            Arc::clone(&host) as Arc<dyn HostEditor>,
            Arc::clone(&store) as Arc<dyn GistStore>,
        );
        Fixture {
            manager,
            host,
            store,
            renderer: Arc::new(RecordingRenderer::default()),
        }
    }

    async fn open(fixture: &Fixture, settings: Settings) -> Arc<Session> {
        let renderer = Arc::clone(&fixture.renderer);
        fixture
            .manager
            .open_playground_with(
                GIST,
                settings,
                Box::new(move |_panel| renderer as Arc<dyn PreviewRenderer>),
            )
            .await
            .unwrap()
    }

    fn uri(name: &str) -> DocumentUri {
        DocumentUri::new(GIST, name).unwrap()
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_grid_layout_and_initial_render_order() {
        let fx = fixture(&[
            ("index.html", "<h1>hi</h1>"),
            ("script.js", "console.log(1);"),
            ("style.css", "h1 { color: red; }"),
            ("playground.json", MANIFEST_EMPTY),
        ]);
        open(&fx, Settings::default()).await;

        assert_eq!(*fx.host.layouts.lock().unwrap(), vec![EditorLayout::Grid]);
        assert_eq!(
            *fx.host.opened.lock().unwrap(),
            vec![
                ("index.html".to_string(), 1),
                ("script.js".to_string(), 2),
                ("style.css".to_string(), 3),
            ]
        );
        assert_eq!(*fx.host.panel_columns.lock().unwrap(), vec![4]);

        assert_eq!(
            fx.renderer.calls(),
            vec![
                RenderCall::Manifest(MANIFEST_EMPTY.to_string(), false),
                RenderCall::Html("<h1>hi</h1>".to_string(), false),
                RenderCall::Css("h1 { color: red; }".to_string(), false),
                RenderCall::Js("console.log(1);".to_string(), false),
                RenderCall::Rebuild,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_layout_scales_with_present_kinds() {
        let fx = fixture(&[("index.html", ""), ("script.js", "")]);
        open(&fx, Settings::default()).await;
        assert_eq!(*fx.host.layouts.lock().unwrap(), vec![EditorLayout::Split]);
        assert_eq!(*fx.host.panel_columns.lock().unwrap(), vec![3]);

        let fx = fixture(&[("script.js", "")]);
        open(&fx, Settings::default()).await;
        assert_eq!(*fx.host.layouts.lock().unwrap(), vec![EditorLayout::Single]);
        assert_eq!(
            *fx.host.opened.lock().unwrap(),
            vec![("script.js".to_string(), 1)]
        );
        assert_eq!(*fx.host.panel_columns.lock().unwrap(), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_burst_coalesces_to_one_render() {
        let fx = fixture(&[("index.html", "<p>v0</p>")]);
        let session = open(&fx, Settings::default()).await;
        let baseline = fx.renderer.calls().len();

        for n in 1..=5 {
            session.notify_document_changed(uri("index.html"), format!("<p>v{n}</p>"));
        }
        settle().await;

        let calls = fx.renderer.calls()[baseline..].to_vec();
        assert_eq!(calls, vec![RenderCall::Html("<p>v5</p>".to_string(), true)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_roles_in_one_window_fire_in_dispatch_order() {
        let fx = fixture(&[
            ("index.html", ""),
            ("script.js", ""),
            ("style.css", ""),
        ]);
        let session = open(&fx, Settings::default()).await;
        let baseline = fx.renderer.calls().len();

        // Arrival order is stylesheet, script, markup; dispatch order is not.
        session.notify_document_changed(uri("style.css"), ".a { color: red; }".to_string());
        session.notify_document_changed(uri("script.js"), "let x = 1;".to_string());
        session.notify_document_changed(uri("index.html"), "<p>new</p>".to_string());
        settle().await;

        let calls = fx.renderer.calls()[baseline..].to_vec();
        assert_eq!(
            calls,
            vec![
                RenderCall::Html("<p>new</p>".to_string(), true),
                RenderCall::Js("let x = 1;".to_string(), true),
                RenderCall::Css(".a { color: red; }".to_string(), true),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_script_rename_refreshes_manifest_first() {
        let fx = fixture(&[
            ("index.html", ""),
            ("script.js", "console.log(1);"),
            ("playground.json", MANIFEST_EMPTY),
        ]);
        let session = open(&fx, Settings::default()).await;
        let baseline = fx.renderer.calls().len();

        session.notify_document_changed(uri("app.tsx"), "const x: number = 1;".to_string());
        settle().await;

        let calls = fx.renderer.calls()[baseline..].to_vec();
        assert_eq!(calls.len(), 2);

        let RenderCall::Manifest(manifest_text, true) = &calls[0] else {
            panic!("expected a manifest update first, got {calls:?}");
        };
        let manifest = Manifest::parse(manifest_text).unwrap();
        assert_eq!(manifest.scripts, vec!["react", "react-dom"]);
        assert_eq!(calls[1], RenderCall::Js("const x = 1;".to_string(), true));

        // The correction was pushed through to storage.
        assert_eq!(
            fx.store.file_content(GIST, "playground.json").await.unwrap(),
            *manifest_text
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_transform_error_hits_console_and_session_survives() {
        let fx = fixture(&[("style.scss", ".a { color: red; }")]);
        let session = open(&fx, Settings::default()).await;
        let baseline = fx.renderer.calls().len();

        session.notify_document_changed(uri("style.scss"), ".a { color: $missing; }".to_string());
        settle().await;

        assert_eq!(fx.renderer.calls().len(), baseline);
        let lines = fx.host.console.lines.lock().unwrap().clone();
        assert!(lines.iter().any(|line| line.contains("stylesheet error")));

        // Later edits still render.
        session.notify_document_changed(uri("style.scss"), ".a { .b { color: red; } }".to_string());
        settle().await;
        assert_eq!(
            fx.renderer.calls()[baseline..].to_vec(),
            vec![RenderCall::Css(".a .b {\n  color: red;\n}\n".to_string(), true)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrelated_documents_are_ignored() {
        let fx = fixture(&[("index.html", "")]);
        let session = open(&fx, Settings::default()).await;
        let baseline = fx.renderer.calls().len();

        let foreign = DocumentUri::new("other-gist", "index.html").unwrap();
        session.notify_document_changed(foreign, "<p>not ours</p>".to_string());
        session.notify_document_changed(uri("notes.txt"), "plain text".to_string());
        settle().await;

        assert_eq!(fx.renderer.calls().len(), baseline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_save_policy() {
        let settings = Settings {
            auto_run: AutoRun::OnSave,
            ..Settings::default()
        };
        let fx = fixture(&[("index.html", "")]);
        let session = open(&fx, settings).await;
        let baseline = fx.renderer.calls().len();

        // Edits still update parts, but without the run-immediately tag.
        session.notify_document_changed(uri("index.html"), "<p>draft</p>".to_string());
        settle().await;
        assert_eq!(
            fx.renderer.calls()[baseline..].to_vec(),
            vec![RenderCall::Html("<p>draft</p>".to_string(), false)]
        );

        // Saving a playground document requests a full rebuild.
        session.notify_document_saved(&uri("index.html")).await;
        assert_eq!(fx.renderer.calls().last(), Some(&RenderCall::Rebuild));

        // Saves of unrelated documents do not.
        let count = fx.renderer.calls().len();
        let foreign = DocumentUri::new("other-gist", "index.html").unwrap();
        session.notify_document_saved(&foreign).await;
        assert_eq!(fx.renderer.calls().len(), count);
    }

    #[tokio::test(start_paused = true)]
    async fn test_saves_are_inert_under_on_edit_policy() {
        let fx = fixture(&[("index.html", "")]);
        let session = open(&fx, Settings::default()).await;
        let baseline = fx.renderer.calls().len();

        session.notify_document_saved(&uri("index.html")).await;
        assert_eq!(fx.renderer.calls().len(), baseline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_pending_debounce_and_is_idempotent() {
        let fx = fixture(&[("index.html", "")]);
        let session = open(&fx, Settings::default()).await;
        let baseline = fx.renderer.calls().len();

        session.notify_document_changed(uri("index.html"), "<p>never</p>".to_string());
        session.close().await;
        settle().await;

        assert_eq!(fx.renderer.calls().len(), baseline);
        assert!(!session.is_open().await);
        assert!(fx.host.console.disposed.load(Ordering::SeqCst));
        assert_eq!(fx.host.restore_calls.load(Ordering::SeqCst), 1);

        // A second close is a no-op.
        session.close().await;
        assert_eq!(fx.host.restore_calls.load(Ordering::SeqCst), 1);

        // Change events arriving after close never render.
        session.notify_document_changed(uri("index.html"), "<p>still never</p>".to_string());
        settle().await;
        assert_eq!(fx.renderer.calls().len(), baseline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_opening_a_playground_closes_the_previous_one() {
        let fx = fixture(&[("index.html", "")]);
        let mut second_files = FileSet::new();
        second_files.insert("script.js", "1;");
        fx.store.seed("g2", &second_files);

        let first = open(&fx, Settings::default()).await;
        let second = fx
            .manager
            .open_playground_with(
                "g2",
                Settings::default(),
                Box::new(|_panel| {
                    Arc::new(RecordingRenderer::default()) as Arc<dyn PreviewRenderer>
                }),
            )
            .await
            .unwrap();

        assert!(!first.is_open().await);
        assert!(second.is_open().await);
        assert_eq!(
            fx.manager.active().await.map(|s| s.gist_id().to_string()),
            Some("g2".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_snippet_surfaces_a_notification() {
        let fx = fixture(&[("index.html", "")]);
        let result = fx
            .manager
            .open_playground_with(
                "missing",
                Settings::default(),
                Box::new(|_panel| {
                    Arc::new(RecordingRenderer::default()) as Arc<dyn PreviewRenderer>
                }),
            )
            .await;

        assert!(result.is_err());
        assert!(!fx.host.errors.lock().unwrap().is_empty());
        assert!(fx.manager.active().await.is_none());
    }
}
