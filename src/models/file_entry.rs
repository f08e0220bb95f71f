use std::fs::{self, Metadata};
use std::ops::Deref;
use std::sync::OnceLock;

use crate::core::errors::{Error, Result};
use crate::models::entry::EntryInfo;
use crate::services::markdown::MarkdownRenderer;

/// A regular file.
#[derive(Debug, Clone)]
pub struct File {
    info: EntryInfo,
    size: u64,
    ext: Option<String>,
    mimetype: OnceLock<Option<String>>,
}

impl File {
    pub(crate) fn new(info: EntryInfo, metadata: &Metadata) -> Self {
        let ext = extension_of(info.name());
        Self {
            info,
            size: metadata.len(),
            ext,
            mimetype: OnceLock::new(),
        }
    }

    /// Size in bytes at classification time.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Lowercased suffix after the final dot.
    pub fn ext(&self) -> Option<&str> {
        self.ext.as_deref()
    }

    /// Guessed from the name, computed once per instance.
    pub fn mimetype(&self) -> Option<&str> {
        self.mimetype
            .get_or_init(|| {
                mime_guess::from_path(self.info.name())
                    .first_raw()
                    .map(str::to_string)
            })
            .as_deref()
    }

    pub fn is_markdown(&self) -> bool {
        matches!(self.ext(), Some("md" | "markdown"))
    }

    /// Reads the whole file. The handle is closed before returning.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(fs::read(self.info.abspath())?)
    }

    pub fn read_text(&self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(|source| Error::Decode {
            path: self.info.abspath().to_path_buf(),
            source,
        })
    }

    /// Renders the content as markup.
    ///
    /// Markdown files go through `renderer` when one is available; everything
    /// else, and markdown without a renderer, is escaped into a `<pre>` block.
    pub fn to_html(&self, renderer: Option<&dyn MarkdownRenderer>) -> Result<String> {
        let text = self.read_text()?;
        if self.is_markdown() {
            if let Some(renderer) = renderer {
                return Ok(renderer.render(&text));
            }
            tracing::debug!(file = %self.info.name(), "no markdown renderer, using <pre>");
        }
        Ok(format!("<pre>{}</pre>", escape_html(&text)))
    }
}

impl Deref for File {
    type Target = EntryInfo;

    fn deref(&self) -> &EntryInfo {
        &self.info
    }
}

fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry::classify;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Shouting;

    impl MarkdownRenderer for Shouting {
        fn render(&self, text: &str) -> String {
            format!("<p>{}</p>", text.trim().to_uppercase())
        }
    }

    fn file_at(dir: &TempDir, name: &str, content: &[u8]) -> Result<File> {
        fs::write(dir.path().join(name), content)?;
        let root: Arc<Path> = Arc::from(dir.path());
        Ok(classify(name, &root, None)?
            .into_file()
            .expect("fixture is a regular file"))
    }

    #[test]
    fn extension_is_lowercased_final_suffix() {
        assert_eq!(extension_of("photo.PNG").as_deref(), Some("png"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of(".bashrc").as_deref(), Some("bashrc"));
        assert_eq!(extension_of("Makefile"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn size_and_mimetype_come_from_the_file() -> Result<()> {
        let dir = TempDir::new()?;
        let file = file_at(&dir, "logo.png", &[0u8; 120])?;

        assert_eq!(file.size(), 120);
        assert_eq!(file.ext(), Some("png"));
        assert_eq!(file.mimetype(), Some("image/png"));
        assert_eq!(file.mimetype(), Some("image/png"));

        let unknown = file_at(&dir, "blob.zzzunknown", b"?")?;
        assert_eq!(unknown.mimetype(), None);
        Ok(())
    }

    #[test]
    fn plain_text_is_escaped_into_pre() -> Result<()> {
        let dir = TempDir::new()?;
        let file = file_at(&dir, "notes.txt", b"a < b & \"c\"")?;

        assert_eq!(
            file.to_html(None)?,
            "<pre>a &lt; b &amp; &quot;c&quot;</pre>"
        );
        Ok(())
    }

    #[test]
    fn markdown_uses_renderer_when_available() -> Result<()> {
        let dir = TempDir::new()?;
        let md = file_at(&dir, "README.md", b"hello")?;
        let long = file_at(&dir, "GUIDE.Markdown", b"guide")?;

        assert_eq!(md.to_html(Some(&Shouting))?, "<p>HELLO</p>");
        assert_eq!(long.to_html(Some(&Shouting))?, "<p>GUIDE</p>");
        assert_eq!(md.to_html(None)?, "<pre>hello</pre>");
        Ok(())
    }

    #[test]
    fn non_utf8_content_is_a_decode_error() -> Result<()> {
        let dir = TempDir::new()?;
        let file = file_at(&dir, "binary.dat", &[0xff, 0xfe, 0x00])?;

        let err = file.to_html(None).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        Ok(())
    }

    #[test]
    fn content_is_reread_on_every_call() -> Result<()> {
        let dir = TempDir::new()?;
        let file = file_at(&dir, "log.txt", b"first")?;

        assert_eq!(file.read_text()?, "first");
        fs::write(dir.path().join("log.txt"), "second")?;
        assert_eq!(file.read_text()?, "second");
        Ok(())
    }
}
