//! Rewrites Slack's inline `<...>` tokens (mentions, links) into HTML.

use html_escape::{encode_double_quoted_attribute, encode_quoted_attribute, encode_text};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::users::UserDirectory;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").expect("valid regex"));

/// Escapes everything outside tokens and renders the tokens it understands.
///
/// Known user ids are swapped for display names before tokens are scanned,
/// so `<@U123>` arrives here as `<@alice>`.
pub fn rewrite(text: &str, users: &UserDirectory) -> String {
    let text = users.substitute_ids(text);

    let mut output = String::with_capacity(text.len());
    let mut start = 0;
    for token in TOKEN_RE.find_iter(&text) {
        output.push_str(&escape(&text[start..token.start()]));
        render_token(token.as_str(), &mut output);
        start = token.end();
    }
    output.push_str(&escape(&text[start..]));
    output
}

fn render_token(token: &str, output: &mut String) {
    let inner = &token[1..token.len() - 1];
    let segments: Vec<&str> = inner.split('|').collect();

    match segments.as_slice() {
        [target] if target.starts_with('@') => {
            output.push_str(&format!(
                "<span class=\"username\">{}</span>",
                encode_text(target)
            ));
        }
        [target] if target.starts_with("http") => {
            output.push_str(&link(target, target));
        }
        [description, target] if target.starts_with("http") => {
            output.push_str(&link(target, description));
        }
        [_, _] => debug!(token, "dropping labelled token without http target"),
        _ => output.push_str(&escape(token)),
    }
}

fn link(href: &str, label: &str) -> String {
    format!(
        "<a href=\"{}\">{}</a>",
        encode_double_quoted_attribute(href),
        escape(label)
    )
}

fn escape(text: &str) -> String {
    encode_quoted_attribute(text).into_owned()
}
