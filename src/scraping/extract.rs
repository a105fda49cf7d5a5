use scraper::{ElementRef, Selector};
use url::Url;

use crate::error::AdapterCause;

pub fn selector(css: &str) -> Result<Selector, AdapterCause> {
    Selector::parse(css).map_err(|e| AdapterCause::Selector(format!("{}: {:?}", css, e)))
}

/// Element text with runs of whitespace collapsed to single spaces.
pub fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(text_of)
        .filter(|s| !s.is_empty())
}

pub fn first_attr<'a>(
    element: ElementRef<'a>,
    selector: &Selector,
    attr: &str,
) -> Option<&'a str> {
    element
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Absolute hrefs pass through; relative ones are joined onto the page URL.
pub fn resolve_href(page_url: &str, href: &str) -> Option<String> {
    match Url::parse(href) {
        Ok(absolute) => Some(absolute.to_string()),
        Err(_) => Url::parse(page_url)
            .and_then(|base| base.join(href))
            .map(|u| u.to_string())
            .ok(),
    }
}

pub fn mentions_remote(text: &str) -> bool {
    text.to_lowercase().contains("remote")
}
