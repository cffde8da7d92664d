//! Inline shortcode expansion.
//!
//! Each rule turns `[tag]text[/tag]` into an HTML block. Rules use distinct
//! tags, so the order in which they run does not change the result. The
//! produced blocks are padded with blank lines so the Markdown pass treats
//! them as raw HTML and keeps formatting the text around them.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::render::escape_html;

struct Rule {
    pattern: Regex,
    template: fn(&str) -> String,
}

fn speech(side: &str, icon: &str, text: &str) -> String {
    format!(
        "<div class=\"chat chat-{side}\"><div class=\"chat-icon\">{icon}</div><div class=\"chat-bubble\">{text}</div></div>"
    )
}

fn callout(kind: &str, label: &str, text: &str) -> String {
    format!("<div class=\"box box-{kind}\"><span class=\"box-label\">{label}</span><p>{text}</p></div>")
}

fn rule(tag: &str, template: fn(&str) -> String) -> Rule {
    let pattern = format!(r"(?s)\[{tag}\](.*?)\[/{tag}\]", tag = regex::escape(tag));
    Rule {
        pattern: Regex::new(&pattern).expect("shortcode pattern is a valid regex"),
        template,
    }
}

fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            rule("left", |text| speech("left", "🙋", text)),
            rule("right", |text| speech("right", "👨‍🏫", text)),
            rule("point", |text| callout("point", "POINT", text)),
            rule("merit", |text| callout("merit", "メリット", text)),
            rule("demerit", |text| callout("demerit", "デメリット", text)),
        ]
    })
}

/// Replaces every known shortcode in `markdown` with its HTML fragment.
/// Unknown or unterminated markers are left untouched.
pub fn expand(markdown: &str) -> String {
    rules().iter().fold(markdown.to_string(), |text, rule| {
        rule.pattern
            .replace_all(&text, |caps: &Captures| {
                let inner = escape_html(caps[1].trim()).replace('\n', "<br>");
                format!("\n\n{}\n\n", (rule.template)(&inner))
            })
            .into_owned()
    })
}
