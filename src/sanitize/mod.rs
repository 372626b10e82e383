//! Output sanitization for user-supplied strings.

/// Strips markup that must never reach a banner consumer.
#[derive(Debug)]
pub struct HtmlSanitizer {
    cleaner: ammonia::Builder<'static>,
}

impl HtmlSanitizer {
    pub fn new() -> Self {
        let mut cleaner = ammonia::Builder::default();
        cleaner
            .strip_comments(true)
            .link_rel(Some("noopener noreferrer"))
            .rm_tags(&["img", "iframe", "object", "embed"]);
        Self { cleaner }
    }

    pub fn clean(&self, input: &str) -> String {
        self.cleaner.clean(input).to_string()
    }
}

impl Default for HtmlSanitizer {
    fn default() -> Self {
        Self::new()
    }
}
