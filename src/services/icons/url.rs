/// Turns an icon identifier into a URL the client can fetch.
pub trait IconUrlResolver: Send + Sync {
    fn icon_url(&self, icon: &str) -> String;
}

/// Joins icon names onto a base path, like a relative URL reference.
///
/// Absolute paths and full URLs are returned unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconBase {
    base: String,
}

impl IconBase {
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        if !base.ends_with('/') {
            base.push('/');
        }
        Self { base }
    }

    pub fn base(&self) -> &str {
        &self.base
    }
}

impl Default for IconBase {
    fn default() -> Self {
        Self::new("/__icons__/")
    }
}

impl IconUrlResolver for IconBase {
    fn icon_url(&self, icon: &str) -> String {
        if icon.starts_with('/') || icon.contains("://") {
            icon.to_string()
        } else {
            format!("{}{}", self.base, icon)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_relative_names_onto_base() {
        let base = IconBase::new("/static/icons");
        assert_eq!(base.base(), "/static/icons/");
        assert_eq!(base.icon_url("folder.png"), "/static/icons/folder.png");
    }

    #[test]
    fn keeps_absolute_references() {
        let base = IconBase::default();
        assert_eq!(base.icon_url("/src/favicon.ico"), "/src/favicon.ico");
        assert_eq!(
            base.icon_url("https://cdn.example.com/x.png"),
            "https://cdn.example.com/x.png"
        );
        assert_eq!(base.icon_url("server.png"), "/__icons__/server.png");
    }
}
