//! In-memory document tree that exports are captured from.
//!
//! Pages are parsed once with `scraper` and flattened into an arena of nodes
//! addressed by [`NodeId`]. The arena is what the rest of the pipeline treats
//! as the "live" UI: the visibility toggler mutates inline `display` values on
//! it and the capture engine lays out a snapshot of it.

use crate::Theme;
use scraper::{ElementRef, Html};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Class on the root element that switches the page to the dark theme
pub const DARK_THEME_CLASS: &str = "dark";

/// Shared handle to a live document.
///
/// Clones refer to the same tree and the same export flag, so every
/// exporter built over one page sees the others' exports.
#[derive(Debug, Clone)]
pub struct SharedDocument {
    tree: Arc<RwLock<Document>>,
    exporting: Arc<AtomicBool>,
}

impl SharedDocument {
    pub fn new(document: Document) -> Self {
        Self {
            tree: Arc::new(RwLock::new(document)),
            exporting: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Acquire a read guard, recovering the data if a writer panicked
    pub fn read(&self) -> RwLockReadGuard<'_, Document> {
        self.tree.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire a write guard, recovering the data if a writer panicked
    pub fn write(&self) -> RwLockWriteGuard<'_, Document> {
        self.tree.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// True while an export holds this document
    pub fn is_exporting(&self) -> bool {
        self.exporting.load(Ordering::SeqCst)
    }

    pub(crate) fn export_flag(&self) -> &AtomicBool {
        &self.exporting
    }
}

pub fn read_document(doc: &SharedDocument) -> RwLockReadGuard<'_, Document> {
    doc.read()
}

pub fn write_document(doc: &SharedDocument) -> RwLockWriteGuard<'_, Document> {
    doc.write()
}

/// Stable identity of a node inside one [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Inline `style` declarations, kept in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    pub fn parse(css: &str) -> Self {
        let declarations = css
            .split(';')
            .filter_map(|decl| {
                let (name, value) = decl.split_once(':')?;
                let name = name.trim().to_ascii_lowercase();
                let value = value.trim().to_string();
                if name.is_empty() {
                    None
                } else {
                    Some((name, value))
                }
            })
            .collect();
        Self { declarations }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set or remove a property. `None` removes every declaration of `name`.
    pub fn set(&mut self, name: &str, value: Option<&str>) {
        match value {
            Some(v) => {
                if let Some(slot) = self.declarations.iter_mut().rev().find(|(n, _)| n == name) {
                    slot.1 = v.to_string();
                } else {
                    self.declarations.push((name.to_string(), v.to_string()));
                }
            }
            None => self.declarations.retain(|(n, _)| n != name),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn to_css(&self) -> String {
        self.declarations
            .iter()
            .map(|(n, v)| format!("{}: {}", n, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub style: InlineStyle,
    /// Remaining attributes (everything but `id`, `class` and `style`)
    pub attrs: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeEntry {
    data: NodeData,
    children: Vec<NodeId>,
}

/// Arena-backed document tree
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeEntry>,
    root: NodeId,
    display_mutations: u64,
}

impl Document {
    /// Parse an HTML page. Parsing is lenient; malformed markup still yields a tree.
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = Document {
            nodes: Vec::new(),
            root: NodeId(0),
            display_mutations: 0,
        };
        doc.root = doc.import_element(parsed.root_element());
        log::debug!("parsed document with {} nodes", doc.nodes.len());
        doc
    }

    fn import_element(&mut self, el: ElementRef<'_>) -> NodeId {
        let value = el.value();
        let data = ElementData {
            tag: value.name().to_ascii_lowercase(),
            id: value.attr("id").map(|s| s.to_string()),
            classes: value.classes().map(|c| c.to_string()).collect(),
            style: value.attr("style").map(InlineStyle::parse).unwrap_or_default(),
            attrs: value
                .attrs()
                .filter(|(k, _)| !matches!(*k, "id" | "class" | "style"))
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        let id = self.push(NodeData::Element(data));

        for child in el.children() {
            if let Some(child_el) = ElementRef::wrap(child) {
                let child_id = self.import_element(child_el);
                self.nodes[id.0].children.push(child_id);
            } else if let Some(text) = child.value().as_text() {
                let text: &str = text;
                if !text.trim().is_empty() {
                    let child_id = self.push(NodeData::Text(text.to_string()));
                    self.nodes[id.0].children.push(child_id);
                }
            }
        }
        id
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeEntry {
            data,
            children: Vec::new(),
        });
        id
    }

    /// Wrap the document for shared mutation
    pub fn into_shared(self) -> SharedDocument {
        SharedDocument::new(self)
    }

    /// The `<html>` element
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0).map(|n| &n.data)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.data) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Resolve an element by its `id` attribute (first match in document order)
    pub fn element_by_id(&self, element_id: &str) -> Option<NodeId> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .find(|id| {
                self.element(*id)
                    .and_then(|el| el.id.as_deref())
                    .map_or(false, |v| v == element_id)
            })
    }

    /// All descendants of `id` in document order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id)
            .map_or(false, |el| el.classes.iter().any(|c| c == class))
    }

    /// Inline `display` value, `None` when unset
    pub fn display(&self, id: NodeId) -> Option<String> {
        self.element(id)
            .and_then(|el| el.style.get("display"))
            .map(|s| s.to_string())
    }

    /// Set (or with `None`, clear) the inline `display` of an element.
    /// Every call counts as one visibility mutation.
    pub fn set_display(&mut self, id: NodeId, value: Option<&str>) {
        if let Some(el) = self.element_mut(id) {
            el.style.set("display", value);
            self.display_mutations += 1;
        }
    }

    /// Number of `set_display` calls applied so far
    pub fn display_mutations(&self) -> u64 {
        self.display_mutations
    }

    /// Whether the node's own inline display hides it
    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.display(id)
            .map_or(false, |d| d.trim().eq_ignore_ascii_case("none"))
    }

    /// Theme derived from the root element's class list
    pub fn theme(&self) -> Theme {
        if self.has_class(self.root, DARK_THEME_CLASS) {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        let root = self.root;
        if let Some(el) = self.element_mut(root) {
            el.classes.retain(|c| c != DARK_THEME_CLASS);
            if theme == Theme::Dark {
                el.classes.push(DARK_THEME_CLASS.to_string());
            }
        }
    }

    /// Concatenated text of the subtree, whitespace-collapsed
    pub fn text_content(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        if let Some(NodeData::Text(t)) = self.data(id) {
            parts.push(t.as_str());
        }
        for d in self.descendants(id) {
            if let Some(NodeData::Text(t)) = self.data(d) {
                parts.push(t.as_str());
            }
        }
        parts
            .iter()
            .flat_map(|p| p.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html class="dark"><head><title>T</title></head><body>
        <div id="report-content">
          <h1>Overview</h1>
          <div class="no-print" style="display: flex; color: red">Buttons</div>
          <p class="note">Cash flow is healthy</p>
        </div>
    </body></html>"#;

    #[test]
    fn parse_resolves_ids_and_classes() {
        let doc = Document::parse(PAGE);
        let target = doc.element_by_id("report-content").expect("target");
        assert_eq!(doc.element(target).unwrap().tag, "div");
        let excluded: Vec<_> = doc
            .descendants(target)
            .into_iter()
            .filter(|id| doc.has_class(*id, "no-print"))
            .collect();
        assert_eq!(excluded.len(), 1);
        assert!(doc.element_by_id("missing").is_none());
    }

    #[test]
    fn shared_handles_see_one_tree_and_flag() {
        let shared = Document::parse(PAGE).into_shared();
        let other = shared.clone();
        let target = shared.read().element_by_id("report-content").unwrap();
        other.write().set_display(target, Some("none"));
        assert!(shared.read().is_hidden(target));

        assert!(!shared.is_exporting());
        other.export_flag().store(true, Ordering::SeqCst);
        assert!(shared.is_exporting());
    }

    #[test]
    fn display_roundtrips_and_counts_mutations() {
        let mut doc = Document::parse(PAGE);
        let target = doc.element_by_id("report-content").unwrap();
        let node = doc
            .descendants(target)
            .into_iter()
            .find(|id| doc.has_class(*id, "no-print"))
            .unwrap();
        assert_eq!(doc.display(node).as_deref(), Some("flex"));
        doc.set_display(node, Some("none"));
        assert!(doc.is_hidden(node));
        doc.set_display(node, Some("flex"));
        assert_eq!(doc.display(node).as_deref(), Some("flex"));
        assert_eq!(doc.display_mutations(), 2);
        // unrelated declarations survive
        assert_eq!(doc.element(node).unwrap().style.get("color"), Some("red"));
    }

    #[test]
    fn clearing_display_removes_the_declaration() {
        let mut doc = Document::parse(r#"<div id="a">x</div>"#);
        let a = doc.element_by_id("a").unwrap();
        assert_eq!(doc.display(a), None);
        doc.set_display(a, Some("none"));
        doc.set_display(a, None);
        assert_eq!(doc.display(a), None);
        assert!(doc.element(a).unwrap().style.is_empty());
    }

    #[test]
    fn theme_reads_root_class() {
        let mut doc = Document::parse(PAGE);
        assert_eq!(doc.theme(), Theme::Dark);
        doc.set_theme(Theme::Light);
        assert_eq!(doc.theme(), Theme::Light);
        assert_eq!(Document::parse("<p>x</p>").theme(), Theme::Light);
    }

    #[test]
    fn text_content_collapses_whitespace() {
        let doc = Document::parse(PAGE);
        let target = doc.element_by_id("report-content").unwrap();
        let text = doc.text_content(target);
        assert!(text.starts_with("Overview Buttons Cash flow"));
    }
}
