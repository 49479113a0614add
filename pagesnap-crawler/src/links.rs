//! Link discovery.
//!
//! The renderer evaluates [`SNAPSHOT_SCRIPT`] inside the page. The script only
//! walks the DOM, descending into open shadow roots, and hands back plain data:
//! the page address plus every anchor and every shadow host in document order.
//! All filtering happens here, in [`LinkFilter::apply`], so the whole predicate
//! pipeline is a pure function of the snapshot and [`FilterOptions`].

use crate::config::FilterOptions;
use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Evaluated in the page context. Elements are listed the way
/// `querySelectorAll('*')` returns them; shadow children are nested under
/// their host. Only anchors and shadow hosts are serialized.
pub const SNAPSHOT_SCRIPT: &str = r#"
(() => {
    const describe = (elements) => Array.from(elements)
        .filter((el) => el.localName === 'a' || el.shadowRoot)
        .map((el) => ({
            localName: el.localName,
            href: typeof el.href === 'string' ? el.href : null,
            rawHref: el.getAttribute('href'),
            shadowRoot: el.shadowRoot ? describe(el.shadowRoot.querySelectorAll('*')) : null,
        }));

    return {
        location: location.href,
        elements: describe(document.querySelectorAll('*')),
    };
})()
"#;

/// One element as seen by the snapshot script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub local_name: String,
    /// Resolved absolute target (`el.href`)
    #[serde(default)]
    pub href: Option<String>,
    /// The `href` attribute exactly as written in the markup
    #[serde(default)]
    pub raw_href: Option<String>,
    #[serde(default)]
    pub shadow_root: Option<Vec<Element>>,
}

impl Element {
    pub fn anchor(raw_href: &str, href: &str) -> Self {
        Self {
            local_name: "a".to_string(),
            href: Some(href.to_string()),
            raw_href: Some(raw_href.to_string()),
            shadow_root: None,
        }
    }

    pub fn shadow_host(local_name: &str, children: Vec<Element>) -> Self {
        Self {
            local_name: local_name.to_string(),
            href: None,
            raw_href: None,
            shadow_root: Some(children),
        }
    }
}

/// Everything link discovery needs to know about a loaded page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub location: String,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl PageSnapshot {
    pub fn new(location: impl Into<String>, elements: Vec<Element>) -> Self {
        Self {
            location: location.into(),
            elements,
        }
    }

    /// Flatten the element tree. A level's elements come first, then the
    /// shadow children of each host in order, recursively.
    pub fn all_elements(&self) -> Vec<&Element> {
        let mut all = Vec::new();
        collect(&self.elements, &mut all);
        all
    }
}

fn collect<'a>(elements: &'a [Element], all: &mut Vec<&'a Element>) {
    all.extend(elements.iter());
    for element in elements {
        if let Some(shadow) = &element.shadow_root {
            collect(shadow, all);
        }
    }
}

/// Compiled link filter. Built once per crawl, so an invalid pattern fails
/// before any page is loaded.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    options: FilterOptions,
    pattern: Option<Regex>,
}

impl LinkFilter {
    pub fn new(options: FilterOptions) -> Result<Self> {
        let pattern = options.pattern.as_deref().map(Regex::new).transpose()?;
        Ok(Self { options, pattern })
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Candidate outbound URLs of a page, in document order. Duplicates are
    /// kept; the frontier deals with them.
    pub fn apply(&self, snapshot: &PageSnapshot) -> Vec<String> {
        let page_origin = Url::parse(&snapshot.location).ok().map(|u| u.origin());

        snapshot
            .all_elements()
            .into_iter()
            .filter_map(|element| Link::from_element(element, &snapshot.location))
            .filter(|link| !self.options.same_origin || is_same_origin(link, page_origin.as_ref()))
            .filter(|link| !self.options.https_only || link.url.scheme() == "https")
            .filter(|link| !self.options.relative_only || is_relative_reference(link.raw))
            .filter(|link| {
                self.pattern
                    .as_ref()
                    .is_none_or(|pattern| pattern.is_match(link.href))
            })
            .map(|link| link.href.to_string())
            .collect()
    }
}

struct Link<'a> {
    href: &'a str,
    raw: Option<&'a str>,
    url: Url,
}

impl<'a> Link<'a> {
    /// Anchors with a resolvable absolute target that is neither the page
    /// itself nor a `mailto:` address.
    fn from_element(element: &'a Element, location: &str) -> Option<Self> {
        if element.local_name != "a" {
            return None;
        }
        let href = element.href.as_deref().filter(|h| !h.is_empty())?;
        if href == location || href.starts_with("mailto:") {
            return None;
        }
        let url = Url::parse(href).ok()?;
        Some(Self {
            href,
            raw: element.raw_href.as_deref(),
            url,
        })
    }
}

fn is_same_origin(link: &Link<'_>, page_origin: Option<&url::Origin>) -> bool {
    // Opaque origins never compare equal, matching the browser
    page_origin.is_some_and(|origin| link.url.origin() == *origin)
}

/// A syntactically relative reference: no `://` past the first character and
/// not protocol-relative. Checked on the raw attribute text.
pub fn is_relative_reference(raw: Option<&str>) -> bool {
    match raw {
        Some(raw) => raw.find("://").is_none_or(|idx| idx < 1) && !raw.starts_with("//"),
        None => false,
    }
}
