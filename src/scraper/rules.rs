//! Host-specific extraction rules
//!
//! A rule maps a host substring to CSS selectors for the listing body and,
//! optionally, its title and company. Adding a board means adding a row.

use crate::config::HostRuleEntry;
use crate::scraper::{ScrapeError, ScrapedPage};
use scraper::{ElementRef, Html, Selector};

/// Built-in rows: (host substring, body, title, company)
const DEFAULT_RULES: &[(&str, &str, Option<&str>, Option<&str>)] = &[
    (
        "wanted.co.kr",
        "[class*='JobDescription'], section[class*='JobContent']",
        Some("h1"),
        Some("[class*='JobHeader'] a[data-company-name], [class*='companyName']"),
    ),
    (
        "saramin.co.kr",
        ".user_content, .wrap_jv_cont",
        Some(".tit_job"),
        Some(".company_name, .corp_name a"),
    ),
    (
        "jobkorea.co.kr",
        ".artReadDetail, section.section-content",
        Some(".sumTit, h3.hd_3"),
        Some(".coName, .co-name"),
    ),
];

/// Elements whose text never belongs to the listing
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// A compiled host rule
#[derive(Debug, Clone)]
pub struct HostRule {
    pub host: String,
    body: Selector,
    title: Option<Selector>,
    company: Option<Selector>,
}

impl HostRule {
    pub fn new(
        host: &str,
        body: &str,
        title: Option<&str>,
        company: Option<&str>,
    ) -> Result<Self, ScrapeError> {
        Ok(Self {
            host: host.to_lowercase(),
            body: parse_selector(body)?,
            title: title.map(parse_selector).transpose()?,
            company: company.map(parse_selector).transpose()?,
        })
    }

    fn from_entry(entry: &HostRuleEntry) -> Result<Self, ScrapeError> {
        Self::new(
            &entry.host,
            &entry.body,
            entry.title.as_deref(),
            entry.company.as_deref(),
        )
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::InvalidSelector(format!("{selector}: {e:?}")))
}

/// Ordered lookup table of host rules; the first matching row wins
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<HostRule>,
}

impl RuleTable {
    /// The built-in table
    pub fn builtin() -> Result<Self, ScrapeError> {
        Self::with_overrides(&[])
    }

    /// Built-in rows plus configured ones
    ///
    /// Configured rows come first; a configured row with the same host as a
    /// built-in row replaces it.
    pub fn with_overrides(entries: &[HostRuleEntry]) -> Result<Self, ScrapeError> {
        let mut rules = entries
            .iter()
            .map(HostRule::from_entry)
            .collect::<Result<Vec<_>, _>>()?;

        for (host, body, title, company) in DEFAULT_RULES {
            if rules.iter().any(|rule| rule.host == *host) {
                continue;
            }
            rules.push(HostRule::new(host, body, *title, *company)?);
        }

        Ok(Self { rules })
    }

    /// Finds the rule whose host substring occurs in `host`
    pub fn find(&self, host: &str) -> Option<&HostRule> {
        let host = host.to_lowercase();
        self.rules.iter().find(|rule| host.contains(&rule.host))
    }

    /// Extracts listing text and metadata from an HTML document
    ///
    /// Without a matching rule, or when the rule's body selector matches
    /// nothing, the full page text is used.
    pub fn extract(&self, html: &str, host: &str) -> ScrapedPage {
        let document = Html::parse_document(html);
        let rule = self.find(host);

        let ruled_text = rule
            .map(|rule| select_text(&document, &rule.body))
            .filter(|text| !text.is_empty());
        let text = ruled_text.unwrap_or_else(|| full_page_text(&document));

        let title = rule
            .and_then(|rule| rule.title.as_ref())
            .map(|selector| select_first_text(&document, selector))
            .filter(|title| !title.is_empty())
            .or_else(|| meta_title(&document));

        let company = rule
            .and_then(|rule| rule.company.as_ref())
            .map(|selector| select_first_text(&document, selector))
            .filter(|company| !company.is_empty());

        ScrapedPage {
            text,
            title,
            company,
        }
    }
}

/// Collapses runs of whitespace into single spaces and trims
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child) = ElementRef::wrap(child) {
            if !SKIPPED_TAGS.contains(&child.value().name()) {
                collect_text(child, out);
            }
        }
    }
}

fn select_text(document: &Html, selector: &Selector) -> String {
    let mut raw = String::new();
    for element in document.select(selector) {
        collect_text(element, &mut raw);
    }
    collapse_whitespace(&raw)
}

fn select_first_text(document: &Html, selector: &Selector) -> String {
    let mut raw = String::new();
    if let Some(element) = document.select(selector).next() {
        collect_text(element, &mut raw);
    }
    collapse_whitespace(&raw)
}

fn full_page_text(document: &Html) -> String {
    match Selector::parse("body") {
        Ok(body) => {
            let text = select_text(document, &body);
            if text.is_empty() {
                let mut raw = String::new();
                collect_text(document.root_element(), &mut raw);
                collapse_whitespace(&raw)
            } else {
                text
            }
        }
        Err(_) => String::new(),
    }
}

fn meta_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("meta[property='og:title']").ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(collapse_whitespace)
        .filter(|title| !title.is_empty())
}
