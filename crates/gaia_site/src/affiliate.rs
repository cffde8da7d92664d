use gaia_core::{AffiliateSettings, LinkStyle};

use crate::render::escape_html;

/// Compliance notice appended to every published page.
pub const DISCLAIMER_HTML: &str =
    "<p class=\"affiliate-disclaimer\">*本記事はアフィリエイト・プロモーションを含みます。*</p>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retailer {
    Amazon,
    Rakuten,
}

impl Retailer {
    pub fn label(&self) -> &'static str {
        match self {
            Retailer::Amazon => "Amazon",
            Retailer::Rakuten => "楽天",
        }
    }

    fn css_class(&self) -> &'static str {
        match self {
            Retailer::Amazon => "btn-amazon",
            Retailer::Rakuten => "btn-rakuten",
        }
    }
}

/// Builds the outbound retailer search links for a topic.
#[derive(Debug, Clone)]
pub struct AffiliateInjector {
    amazon_tag: String,
    rakuten_id: String,
    style: LinkStyle,
}

impl AffiliateInjector {
    pub fn new(settings: &AffiliateSettings) -> Self {
        Self {
            amazon_tag: settings.amazon_tag.clone(),
            rakuten_id: settings.rakuten_id.clone(),
            style: settings.style,
        }
    }

    pub fn search_link(&self, keyword: &str, retailer: Retailer) -> String {
        let keyword = urlencoding::encode(keyword.trim());
        match retailer {
            Retailer::Amazon => format!(
                "https://www.amazon.co.jp/s?k={}&tag={}",
                keyword,
                urlencoding::encode(&self.amazon_tag)
            ),
            Retailer::Rakuten => format!(
                "https://search.rakuten.co.jp/search/mall/{}/?afid={}",
                keyword,
                urlencoding::encode(&self.rakuten_id)
            ),
        }
    }

    /// Monetization block for a topic in the configured presentation.
    /// The result is Markdown (the card is a raw HTML block inside it).
    pub fn render(&self, keyword: &str) -> String {
        match self.style {
            LinkStyle::Card => self.product_card(keyword),
            LinkStyle::List => self.link_list(keyword),
        }
    }

    pub fn product_card(&self, keyword: &str) -> String {
        let name = escape_html(keyword.trim());
        let buttons = [Retailer::Amazon, Retailer::Rakuten]
            .iter()
            .map(|retailer| {
                format!(
                    "<a href=\"{}\" class=\"btn {}\" target=\"_blank\" rel=\"sponsored noopener\">{}で探す</a>",
                    escape_html(&self.search_link(keyword, *retailer)),
                    retailer.css_class(),
                    retailer.label()
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "<div class=\"product-card\">\n\
<div class=\"product-img\">📦</div>\n\
<div class=\"product-info\">\n\
<div class=\"product-title\">{} (検索結果)</div>\n\
<div class=\"product-btn-group\">\n{}\n</div>\n\
</div>\n\
</div>",
            name, buttons
        )
    }

    pub fn link_list(&self, keyword: &str) -> String {
        format!(
            "## 価格をチェックする\n\n- [{}で見る]({})\n- [{}で見る]({})",
            Retailer::Amazon.label(),
            self.search_link(keyword, Retailer::Amazon),
            Retailer::Rakuten.label(),
            self.search_link(keyword, Retailer::Rakuten)
        )
    }
}
