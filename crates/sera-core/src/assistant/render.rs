//! Markdown to HTML rendering for model replies.

use pulldown_cmark::{Options, Parser, html};

/// Render Markdown model output as HTML.
///
/// Tables and strikethrough are enabled to match the GitHub-flavoured
/// Markdown chat frontends usually expect.
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(text, options);
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
