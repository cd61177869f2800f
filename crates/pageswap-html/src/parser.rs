//! Page extraction
//!
//! Parses a fetched page with html5ever's RcDom and pulls out the pieces a
//! content swap needs: the title, the main content region and the header
//! navigation links.

use crate::{HtmlError, ParsedPage};
use html5ever::parse_document;
use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

const HTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// HTML page parser
pub struct PageParser;

impl PageParser {
    /// Create a new page parser
    pub fn new() -> Self {
        Self
    }

    /// Parse a full HTML document
    pub fn parse(&self, html: &str) -> Result<ParsedPage, HtmlError> {
        let dom = parse_document(RcDom::default(), Default::default()).one(html);

        let mut extractor = Extractor::default();
        extractor.visit(&dom.document, Scope::default());

        let region = extractor.main.or(extractor.role_main);
        let content = match region {
            Some(handle) => Some(inner_html(&handle)?),
            None => {
                tracing::debug!("Parsed page has no main content region");
                None
            }
        };

        Ok(ParsedPage {
            title: extractor.title,
            content,
            nav_links: extractor.nav_links,
        })
    }
}

impl Default for PageParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Ancestor context while walking the tree
#[derive(Debug, Clone, Copy, Default)]
struct Scope {
    in_header: bool,
    in_nav: bool,
}

#[derive(Default)]
struct Extractor {
    title: Option<String>,
    main: Option<Handle>,
    role_main: Option<Handle>,
    nav_links: Vec<String>,
}

impl Extractor {
    fn visit(&mut self, handle: &Handle, scope: Scope) {
        let mut scope = scope;

        if let NodeData::Element { name, attrs, .. } = &handle.data {
            // SVG <title> and friends are not page metadata
            if &*name.ns == HTML_NS {
                let attrs = attrs.borrow();
                let attr = |key: &str| {
                    attrs.iter()
                        .find(|a| a.name.local.as_ref() == key)
                        .map(|a| a.value.to_string())
                };

                match name.local.as_ref() {
                    "title" if self.title.is_none() => {
                        self.title = Some(collapse_whitespace(&text_content(handle)));
                    }
                    "main" if self.main.is_none() => {
                        self.main = Some(handle.clone());
                    }
                    "header" => scope.in_header = true,
                    "nav" => scope.in_nav = true,
                    "a" if scope.in_header && scope.in_nav => {
                        if let Some(href) = attr("href") {
                            self.nav_links.push(href);
                        }
                    }
                    _ => {}
                }

                if self.role_main.is_none() && attr("role").as_deref() == Some("main") {
                    self.role_main = Some(handle.clone());
                }
            }
        }

        for child in handle.children.borrow().iter() {
            self.visit(child, scope);
        }
    }
}

/// Concatenated text of all descendant text nodes
fn text_content(handle: &Handle) -> String {
    let mut out = String::new();
    collect_text(handle, &mut out);
    out
}

fn collect_text(handle: &Handle, out: &mut String) {
    if let NodeData::Text { contents } = &handle.data {
        out.push_str(&contents.borrow());
    }
    for child in handle.children.borrow().iter() {
        collect_text(child, out);
    }
}

/// Collapse runs of ASCII whitespace and trim, as `document.title` does
pub fn collapse_whitespace(text: &str) -> String {
    text.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}

/// Serialize the children of a node
fn inner_html(handle: &Handle) -> Result<String, HtmlError> {
    let mut out = Vec::new();
    let node: SerializableHandle = handle.clone().into();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..Default::default()
    };
    serialize(&mut out, &node, opts).map_err(HtmlError::Serialize)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}
