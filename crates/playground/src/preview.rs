//! Preview composition
//!
//! The three buffers are pasted verbatim into one HTML document. User code
//! is not sanitized: the document is only ever shown inside a sandbox that
//! allows scripts and nothing else.

use crate::buffers::Buffers;
use crate::debounce::Debouncer;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

/// Sandbox tokens for the preview frame: scripts run, nothing else is allowed.
pub const SANDBOX_POLICY: &str = "allow-scripts";

/// Default quiet period before the preview is rebuilt.
pub const DEFAULT_PREVIEW_DELAY: Duration = Duration::from_millis(250);

/// Build the preview document from the three buffers.
pub fn compose_document(buffers: &Buffers) -> String {
    format!(
        "<html>\n  <body>{}</body>\n  <style>{}</style>\n  <script>{}</script>\n</html>\n",
        buffers.html, buffers.css, buffers.js
    )
}

/// Escape text for use inside a double-quoted HTML attribute.
pub fn escape_attribute(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// A page that shows `document` in a sandboxed, full-size inline frame.
pub fn host_page(document: &str) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>\n",
            "<html>\n",
            "<head>\n",
            "  <meta charset=\"utf-8\">\n",
            "  <title>codepencil preview</title>\n",
            "  <style>html, body, iframe {{ margin: 0; width: 100%; height: 100%; border: 0; }}</style>\n",
            "</head>\n",
            "<body>\n",
            "  <iframe title=\"output\" sandbox=\"{}\" srcdoc=\"{}\"></iframe>\n",
            "</body>\n",
            "</html>\n"
        ),
        SANDBOX_POLICY,
        escape_attribute(document)
    )
}

/// Errors from handing a document to a rendering surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("failed to write preview page {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Somewhere a composed document gets shown.
pub trait RenderSurface {
    fn present(&mut self, document: &str) -> Result<(), SurfaceError>;
}

/// Writes a sandboxed host page to disk for a browser to open.
#[derive(Debug, Clone)]
pub struct SandboxedFile {
    path: PathBuf,
}

impl SandboxedFile {
    /// File name used inside the data directory.
    pub const FILE_NAME: &'static str = "preview.html";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The standard preview page inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RenderSurface for SandboxedFile {
    fn present(&mut self, document: &str) -> Result<(), SurfaceError> {
        let io_err = |source| SurfaceError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(host_page(document).as_bytes())
            .map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        debug!("Preview page written to {}", self.path.display());
        Ok(())
    }
}

/// Keeps every presented document in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    pub documents: Vec<String>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&str> {
        self.documents.last().map(String::as_str)
    }
}

impl RenderSurface for MemorySurface {
    fn present(&mut self, document: &str) -> Result<(), SurfaceError> {
        self.documents.push(document.to_string());
        Ok(())
    }
}

/// Rebuilds the preview document once edits go quiet.
#[derive(Debug)]
pub struct Compositor {
    debounce: Debouncer<()>,
    document: String,
    renders: usize,
}

impl Compositor {
    pub fn new(delay: Duration) -> Self {
        Self {
            debounce: Debouncer::new(delay),
            document: String::new(),
            renders: 0,
        }
    }

    /// Note that the buffers changed; restarts the quiet period.
    pub fn schedule(&mut self, now: Instant) {
        self.debounce.submit((), now);
    }

    pub fn is_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    /// Rebuild the document if the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant, buffers: &Buffers) -> Option<&str> {
        self.debounce.poll(now)?;
        Some(self.render(buffers))
    }

    /// Rebuild the document immediately, dropping any pending rebuild.
    pub fn render(&mut self, buffers: &Buffers) -> &str {
        self.debounce.cancel();
        self.document = compose_document(buffers);
        self.renders += 1;
        &self.document
    }

    /// Drop a pending rebuild. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.debounce.cancel().is_some()
    }

    /// The last document built (empty before the first build).
    pub fn document(&self) -> &str {
        &self.document
    }

    /// How many times the document has been built.
    pub fn render_count(&self) -> usize {
        self.renders
    }
}

/// Block-level tags that start a new line in the text outline.
const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "br",
    "dd",
    "div",
    "dl",
    "dt",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tr",
    "ul",
];

/// Tags whose content is never visible text.
const HIDDEN_TAGS: &[&str] = &["script", "style", "template", "head", "title"];

/// A rough text rendering of some markup, one entry per visual line.
///
/// Tags are stripped, block-level elements break lines, whitespace runs
/// collapse and the common entities are decoded. Good enough to see that
/// the preview reflects the markup in a terminal; the real rendering is
/// the sandboxed page.
pub fn text_outline(markup: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut rest = markup;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("<!--") {
            rest = after.find("-->").map(|i| &after[i + 3..]).unwrap_or("");
            continue;
        }

        if rest.starts_with('<')
            && let Some(end) = rest.find('>')
        {
            let tag = &rest[1..end];
            rest = &rest[end + 1..];

            let name = tag_name(tag);
            if is_one_of(&name, BLOCK_TAGS) {
                flush_line(&mut current, &mut lines);
            }
            if !tag.starts_with('/') && is_one_of(&name, HIDDEN_TAGS) {
                rest = skip_element(rest, &name);
            }
            continue;
        }

        let text_end = rest.find('<').filter(|&i| i > 0).unwrap_or(rest.len());
        push_text(&mut current, &decode_entities(&rest[..text_end]));
        rest = &rest[text_end..];
    }

    flush_line(&mut current, &mut lines);
    lines
}

fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

fn is_one_of(name: &str, tags: &[&str]) -> bool {
    tags.contains(&name)
}

/// Skip past the closing tag of `name` (case-insensitive), or to the end.
fn skip_element<'a>(rest: &'a str, name: &str) -> &'a str {
    let closing = format!("</{}", name);
    let lower = rest.to_ascii_lowercase();
    match lower.find(&closing) {
        Some(i) => {
            let after = &rest[i..];
            after.find('>').map(|j| &after[j + 1..]).unwrap_or("")
        }
        None => "",
    }
}

fn push_text(current: &mut String, text: &str) {
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !current.is_empty() && !current.ends_with(' ') {
                current.push(' ');
            }
        } else {
            current.push(ch);
        }
    }
}

fn flush_line(current: &mut String, lines: &mut Vec<String>) {
    let line = current.trim_end();
    if !line.is_empty() {
        lines.push(line.to_string());
    }
    current.clear();
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffers(html: &str, css: &str, js: &str) -> Buffers {
        Buffers {
            html: html.to_string(),
            css: css.to_string(),
            js: js.to_string(),
        }
    }

    #[test]
    fn test_compose_embeds_buffers_verbatim() {
        let doc = compose_document(&buffers(
            "<h1>Hi</h1>",
            "h1 { color: red; }",
            "console.log('</script>')",
        ));
        assert!(doc.contains("<body><h1>Hi</h1></body>"));
        assert!(doc.contains("<style>h1 { color: red; }</style>"));
        assert!(doc.contains("<script>console.log('</script>')</script>"));
        assert!(doc.starts_with("<html>"));
    }

    #[test]
    fn test_compose_empty_buffers() {
        let doc = compose_document(&Buffers::default());
        assert!(doc.contains("<body></body>"));
        assert!(doc.contains("<style></style>"));
        assert!(doc.contains("<script></script>"));
    }

    #[test]
    fn test_escape_attribute() {
        assert_eq!(
            escape_attribute(r#"<a href="x">&</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;"
        );
        assert_eq!(escape_attribute("plain 'text'"), "plain 'text'");
    }

    #[test]
    fn test_host_page_is_sandboxed() {
        let page = host_page("<body>\"quoted\"</body>");
        assert!(page.contains(r#"sandbox="allow-scripts""#));
        assert!(page.contains("srcdoc=\"&lt;body&gt;&quot;quoted&quot;&lt;/body&gt;\""));
        assert!(!page.contains("allow-same-origin"));
        assert!(!page.contains("allow-popups"));
        assert!(!page.contains("allow-forms"));
        assert!(!page.contains("allow-top-navigation"));
    }

    #[test]
    fn test_sandboxed_file_writes_host_page() {
        let dir = tempfile::tempdir().unwrap();
        let mut surface = SandboxedFile::in_dir(dir.path().join("nested"));
        surface.present("<html><body>x</body></html>").unwrap();

        let written = fs::read_to_string(surface.path()).unwrap();
        assert_eq!(written, host_page("<html><body>x</body></html>"));
    }

    #[test]
    fn test_compositor_coalesces_edits() {
        let start = Instant::now();
        let mut compositor = Compositor::new(DEFAULT_PREVIEW_DELAY);
        let mut state = buffers("", "", "");

        for (i, ch) in "<b>ok</b>".chars().enumerate() {
            state.html.push(ch);
            compositor.schedule(start + Duration::from_millis(i as u64 * 50));
        }
        let last = start + Duration::from_millis(8 * 50);

        assert!(compositor.poll(last, &state).is_none());
        let doc = compositor
            .poll(last + DEFAULT_PREVIEW_DELAY, &state)
            .map(str::to_string);
        assert_eq!(doc, Some(compose_document(&state)));
        assert_eq!(compositor.render_count(), 1);
        assert!(compositor.poll(last + DEFAULT_PREVIEW_DELAY * 2, &state).is_none());
    }

    #[test]
    fn test_compositor_cancel() {
        let start = Instant::now();
        let mut compositor = Compositor::new(DEFAULT_PREVIEW_DELAY);
        compositor.schedule(start);
        assert!(compositor.cancel());
        assert!(compositor.poll(start + DEFAULT_PREVIEW_DELAY, &Buffers::default()).is_none());
        assert_eq!(compositor.document(), "");
        assert_eq!(compositor.render_count(), 0);
    }

    #[test]
    fn test_text_outline_blocks_and_inline() {
        let lines = text_outline("<h1>Hi</h1><p>Hello <b>bold</b>\n   world</p>tail");
        assert_eq!(lines, vec!["Hi", "Hello bold world", "tail"]);
    }

    #[test]
    fn test_text_outline_skips_hidden_content() {
        let lines = text_outline(
            "<p>a</p><script>if (1 < 2) { x = '<p>no</p>' }</script><STYLE>p{}</STYLE><!-- c -->b",
        );
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn test_text_outline_entities_and_stray_brackets() {
        assert_eq!(text_outline("1 &lt; 2 &amp;&amp; 3 > 2"), vec!["1 < 2 && 3 > 2"]);
        assert_eq!(text_outline("a < b"), vec!["a < b"]);
        assert!(text_outline("").is_empty());
    }
}
