//! The three editor buffers and the languages they hold.

/// Which buffer a panel edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    Html,
    Css,
    Javascript,
}

impl Language {
    /// Left-to-right panel order.
    pub const ALL: [Language; 3] = [Language::Html, Language::Css, Language::Javascript];

    /// Key of the persisted entry (before namespacing).
    pub fn store_key(self) -> &'static str {
        match self {
            Language::Html => "html",
            Language::Css => "css",
            Language::Javascript => "js",
        }
    }

    /// Short label for panel titles.
    pub fn label(self) -> &'static str {
        match self {
            Language::Html => "HTML",
            Language::Css => "CSS",
            Language::Javascript => "JS",
        }
    }

    /// Language identifier the panel is bound to.
    pub fn id(self) -> &'static str {
        match self {
            Language::Html => "html",
            Language::Css => "css",
            Language::Javascript => "javascript",
        }
    }

    /// Column index, 0 for the leftmost panel.
    pub fn index(self) -> usize {
        match self {
            Language::Html => 0,
            Language::Css => 1,
            Language::Javascript => 2,
        }
    }

    /// Next panel to the right, wrapping around.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous panel to the left, wrapping around.
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Markup, styles and script, in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffers {
    pub html: String,
    pub css: String,
    pub js: String,
}

impl Buffers {
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::Html => &self.html,
            Language::Css => &self.css,
            Language::Javascript => &self.js,
        }
    }

    pub fn get_mut(&mut self, language: Language) -> &mut String {
        match language {
            Language::Html => &mut self.html,
            Language::Css => &mut self.css,
            Language::Javascript => &mut self.js,
        }
    }

    /// Replace a buffer. Absent content becomes the empty string.
    ///
    /// Returns whether the buffer changed.
    pub fn set(&mut self, language: Language, content: Option<String>) -> bool {
        let content = content.unwrap_or_default();
        let slot = self.get_mut(language);
        if *slot == content {
            return false;
        }
        *slot = content;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_cycle() {
        assert_eq!(Language::Html.next(), Language::Css);
        assert_eq!(Language::Javascript.next(), Language::Html);
        assert_eq!(Language::Html.prev(), Language::Javascript);
    }

    #[test]
    fn test_store_keys() {
        let keys: Vec<&str> = Language::ALL.iter().map(|l| l.store_key()).collect();
        assert_eq!(keys, ["html", "css", "js"]);
    }

    #[test]
    fn test_set_normalizes_absent_content() {
        let mut buffers = Buffers {
            css: "p {}".to_string(),
            ..Default::default()
        };
        assert!(buffers.set(Language::Css, None));
        assert_eq!(buffers.css, "");
        assert!(!buffers.set(Language::Css, Some(String::new())));
    }
}
