/// Converts markdown text to HTML.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, text: &str) -> String;
}

/// GitHub-flavoured markdown through comrak. Raw HTML in the input is dropped.
#[cfg(feature = "markdown")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ComrakRenderer;

#[cfg(feature = "markdown")]
impl MarkdownRenderer for ComrakRenderer {
    fn render(&self, text: &str) -> String {
        let mut options = comrak::Options::default();
        options.extension.table = true;
        options.extension.strikethrough = true;
        options.extension.autolink = true;
        options.extension.tasklist = true;
        comrak::markdown_to_html(text, &options)
    }
}

/// The renderer compiled into this build, if any.
pub fn default_renderer() -> Option<std::sync::Arc<dyn MarkdownRenderer>> {
    #[cfg(feature = "markdown")]
    {
        Some(std::sync::Arc::new(ComrakRenderer))
    }
    #[cfg(not(feature = "markdown"))]
    {
        None
    }
}

#[cfg(all(test, feature = "markdown"))]
mod tests {
    use super::*;

    #[test]
    fn renders_headings_and_tables() {
        let html = ComrakRenderer.render("# Title\n\n| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<table>"));
    }

    #[test]
    fn drops_raw_html() {
        let html = ComrakRenderer.render("<script>alert(1)</script>\n\ntext");
        assert!(!html.contains("<script>"));
        assert!(html.contains("<p>text</p>"));
    }

    #[test]
    fn default_renderer_is_comrak() {
        let renderer = default_renderer().expect("markdown feature is enabled");
        assert_eq!(renderer.render("*hi*").trim(), "<p><em>hi</em></p>");
    }
}
