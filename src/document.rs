//! Thin query layer over `scraper`.
//!
//! Everything above this module talks to [`Document`] and [`Node`] only, so the
//! HTML engine can be swapped without touching the parsers. Lookups never fail:
//! an element that is not there is `None`, and its text is the empty string.

use scraper::{ElementRef, Html, Selector};

/// A parsed HTML page.
pub struct Document {
    html: Html,
}

/// A borrowed element of a [`Document`].
#[derive(Clone, Copy)]
pub struct Node<'a> {
    element: ElementRef<'a>,
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    pub fn select(&self, css: &str) -> Vec<Node<'_>> {
        match selector(css) {
            Some(sel) => self.html.select(&sel).map(Node::from).collect(),
            None => Vec::new(),
        }
    }

    pub fn first(&self, css: &str) -> Option<Node<'_>> {
        let sel = selector(css)?;
        self.html.select(&sel).next().map(Node::from)
    }

    pub fn by_id(&self, id: &str) -> Option<Node<'_>> {
        self.first(&format!("[id=\"{}\"]", id))
    }

    /// Value attribute of the first `<input>` with the given `name`.
    pub fn input_value(&self, name: &str) -> Option<String> {
        self.first(&format!("input[name=\"{}\"]", name))
            .and_then(|node| node.attr("value").map(str::to_string))
    }

    /// Trimmed text of the element with the given id, or `""`.
    pub fn text_of(&self, id: &str) -> String {
        self.by_id(id).map(|node| node.text()).unwrap_or_default()
    }

    /// Attribute of the element with the given id, or `""`.
    pub fn attr_of(&self, id: &str, attr: &str) -> String {
        self.by_id(id)
            .and_then(|node| node.attr(attr).map(str::to_string))
            .unwrap_or_default()
    }
}

impl<'a> From<ElementRef<'a>> for Node<'a> {
    fn from(element: ElementRef<'a>) -> Self {
        Self { element }
    }
}

impl<'a> Node<'a> {
    pub fn tag(&self) -> &'a str {
        self.element.value().name()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.element.value().classes().any(|c| c == class)
    }

    /// Concatenated, trimmed text content of the element and its descendants.
    pub fn text(&self) -> String {
        self.element.text().collect::<String>().trim().to_string()
    }

    pub fn children(&self) -> Vec<Node<'a>> {
        self.element
            .children()
            .filter_map(ElementRef::wrap)
            .map(Node::from)
            .collect()
    }

    pub fn children_by_tag(&self, tag: &str) -> Vec<Node<'a>> {
        self.children()
            .into_iter()
            .filter(|child| child.tag() == tag)
            .collect()
    }

    pub fn select(&self, css: &str) -> Vec<Node<'a>> {
        match selector(css) {
            Some(sel) => self.element.select(&sel).map(Node::from).collect(),
            None => Vec::new(),
        }
    }

    pub fn first(&self, css: &str) -> Option<Node<'a>> {
        let sel = selector(css)?;
        self.element.select(&sel).next().map(Node::from)
    }

    /// First descendant whose `attr` contains `needle`.
    pub fn find_by_attr_contains(&self, attr: &str, needle: &str) -> Option<Node<'a>> {
        self.first(&format!("[{}*=\"{}\"]", attr, needle))
    }

    /// Text of the first nested `tag` element, if the cell renders one.
    pub fn nested_text(&self, tag: &str) -> Option<String> {
        self.first(tag).map(|node| node.text())
    }

    /// Rows of a `<table>`, including those wrapped in `thead`/`tbody`/`tfoot`.
    ///
    /// Rows of tables nested inside cells are not included.
    pub fn rows(&self) -> Vec<Node<'a>> {
        let mut rows = Vec::new();
        for child in self.children() {
            match child.tag() {
                "tr" => rows.push(child),
                "thead" | "tbody" | "tfoot" => rows.extend(child.children_by_tag("tr")),
                _ => {}
            }
        }
        rows
    }

    /// Data cells (`td`) of a row; header cells (`th`) are not counted.
    pub fn cells(&self) -> Vec<Node<'a>> {
        self.children_by_tag("td")
    }
}
