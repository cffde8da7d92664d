//! Page templates and the small helpers they need.

use pulldown_cmark::{html, Options, Parser};
use scraper::{Html, Selector};

use crate::affiliate::DISCLAIMER_HTML;

pub const TOPIC_META: &str = "gaia:topic";

const ARTICLE_STYLE: &str = "body { font-family: 'Helvetica Neue', Arial, sans-serif; line-height: 1.6; max-width: 800px; margin: 0 auto; padding: 20px; color: #333; }
h1 { color: #2c3e50; }
h2 { color: #34495e; border-bottom: 2px solid #ecf0f1; padding-bottom: 10px; margin-top: 30px; }
a { color: #3498db; text-decoration: none; }
.product-card { display: flex; gap: 16px; border: 1px solid #ddd; border-radius: 8px; padding: 16px; margin: 24px 0; }
.btn { display: inline-block; padding: 8px 16px; border-radius: 4px; color: #fff; margin-right: 8px; }
.btn-amazon { background: #ff9900; }
.btn-rakuten { background: #bf0000; }
.chat { display: flex; gap: 12px; margin: 16px 0; }
.chat-right { flex-direction: row-reverse; }
.chat-bubble { background: #f4f6f8; border-radius: 12px; padding: 10px 14px; }
.box { border-left: 4px solid #3498db; background: #f7fbff; padding: 8px 16px; margin: 16px 0; }
.box-merit { border-color: #27ae60; }
.box-demerit { border-color: #c0392b; }
.affiliate-disclaimer { font-size: 0.8em; color: #777; }
.footer { margin-top: 40px; font-size: 0.9em; color: #7f8c8d; text-align: center; }";

const INDEX_STYLE: &str = "body { font-family: 'Helvetica Neue', Arial, sans-serif; line-height: 1.6; max-width: 800px; margin: 0 auto; padding: 20px; }
h1 { border-bottom: 2px solid #eee; padding-bottom: 10px; }
ul { list-style-type: none; padding: 0; }
li { margin: 10px 0; padding: 10px; background: #f9f9f9; border-radius: 4px; }
a { text-decoration: none; color: #333; font-weight: bold; display: block; }
.date { color: #999; font-size: 0.85em; font-weight: normal; margin-right: 8px; }";

/// Escapes text for use in HTML or XML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

pub struct ArticlePage<'a> {
    pub title: &'a str,
    pub topic: &'a str,
    pub canonical_url: &'a str,
    pub site_name: &'a str,
    pub locale: &'a str,
    pub body_html: &'a str,
    pub year: i32,
}

impl ArticlePage<'_> {
    pub fn render(&self) -> String {
        let title = escape_html(self.title);
        let description = escape_html(&format!("{}に関する詳細記事です。", self.title));
        let site_name = escape_html(self.site_name);
        format!(
            r#"<!DOCTYPE html>
<html lang="ja">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<meta name="description" content="{description}">
<meta name="{topic_meta}" content="{topic}">
<meta property="og:title" content="{title}">
<meta property="og:type" content="article">
<meta property="og:url" content="{url}">
<meta property="og:description" content="{description}">
<meta property="og:site_name" content="{site_name}">
<meta property="og:locale" content="{locale}">
<link rel="canonical" href="{url}">
<style>
{style}
</style>
</head>
<body>
<div class="container">
<div class="nav"><a href="index.html">← Top Page</a></div>
<h1>{title}</h1>
{body}
{disclaimer}
<div class="footer">
<p>&copy; {year} {site_name}. All rights reserved.</p>
</div>
</div>
</body>
</html>
"#,
            title = title,
            description = description,
            topic_meta = TOPIC_META,
            topic = escape_html(self.topic),
            url = escape_html(self.canonical_url),
            site_name = site_name,
            locale = escape_html(self.locale),
            style = ARTICLE_STYLE,
            body = self.body_html,
            disclaimer = DISCLAIMER_HTML,
            year = self.year,
        )
    }
}

/// One row of the site index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub filename: String,
    pub title: String,
    pub date: Option<chrono::NaiveDate>,
}

impl IndexEntry {
    pub fn display_date(&self) -> String {
        self.date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "日付不明".to_string())
    }
}

pub fn index_page(site_name: &str, entries: &[IndexEntry]) -> String {
    let items = entries
        .iter()
        .map(|entry| {
            format!(
                "<li><a href=\"{}\"><span class=\"date\">{}</span>{}</a></li>",
                escape_html(&entry.filename),
                entry.display_date(),
                escape_html(&entry.title)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let site_name = escape_html(site_name);

    format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{site_name}</title>
<style>
{style}
</style>
</head>
<body>
<h1>{site_name} - Latest Articles</h1>
<ul>
{items}
</ul>
</body>
</html>
"#,
        site_name = site_name,
        style = INDEX_STYLE,
        items = items,
    )
}

pub fn sitemap(index_url: &str, page_urls: &[(String, Option<chrono::NaiveDate>)]) -> String {
    let newest = page_urls.iter().filter_map(|(_, date)| *date).max();
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    xml.push_str(&sitemap_url(index_url, newest, "1.0"));
    for (url, date) in page_urls {
        xml.push_str(&sitemap_url(url, *date, "0.8"));
    }
    xml.push_str("</urlset>\n");
    xml
}

fn sitemap_url(url: &str, lastmod: Option<chrono::NaiveDate>, priority: &str) -> String {
    let lastmod = lastmod
        .map(|d| format!("    <lastmod>{}</lastmod>\n", d.format("%Y-%m-%d")))
        .unwrap_or_default();
    format!(
        "  <url>\n    <loc>{}</loc>\n{}    <priority>{}</priority>\n  </url>\n",
        escape_html(url),
        lastmod,
        priority
    )
}

/// Text of the page's `<title>` element.
pub fn page_title(document: &str) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    Html::parse_document(document)
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Topic recorded in the page's topic meta tag.
pub fn page_topic(document: &str) -> Option<String> {
    let selector = Selector::parse(&format!("meta[name=\"{}\"]", TOPIC_META)).ok()?;
    Html::parse_document(document)
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|topic| topic.trim().to_string())
}
