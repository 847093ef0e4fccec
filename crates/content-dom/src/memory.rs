//! In-memory document implementing the document port

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::errors::DomError;
use crate::fixture::{DocumentFixture, ElementFixture};
use crate::model::{ComputedStyle, LayoutBox, NodeId, Position, Size, Viewport};
use crate::path::PathExpr;
use crate::ports::Document;
use crate::selector::SelectorList;

#[derive(Debug, Clone)]
pub(crate) struct ElementNode {
    pub(crate) tag: String,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) text: String,
    pub(crate) style: ComputedStyle,
    pub(crate) layout: Option<LayoutBox>,
    pub(crate) stalls_layout: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) detached: bool,
}

/// Element arena shared by selector and path evaluation.
#[derive(Debug, Default)]
pub(crate) struct Tree {
    nodes: Vec<ElementNode>,
    root: Option<NodeId>,
}

impl Tree {
    pub(crate) fn element(&self, node: NodeId) -> Option<&ElementNode> {
        self.nodes.get(node.0).filter(|el| !el.detached)
    }

    fn element_mut(&mut self, node: NodeId) -> Result<&mut ElementNode, DomError> {
        self.nodes
            .get_mut(node.0)
            .filter(|el| !el.detached)
            .ok_or(DomError::UnknownNode(node.0))
    }

    fn require(&self, node: NodeId) -> Result<&ElementNode, DomError> {
        self.element(node).ok_or(DomError::UnknownNode(node.0))
    }

    pub(crate) fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?
            .attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.element(node)?.parent
    }

    pub(crate) fn children(&self, node: NodeId) -> &[NodeId] {
        self.element(node)
            .map(|el| el.children.as_slice())
            .unwrap_or(&[])
    }

    /// Children of a node, or the root element for the document node.
    pub(crate) fn children_of(&self, node: Option<NodeId>) -> Vec<NodeId> {
        match node {
            Some(node) => self.children(node).to_vec(),
            None => self.root.into_iter().collect(),
        }
    }

    /// Descendants in document order, excluding the node itself.
    pub(crate) fn descendants_of(&self, node: Option<NodeId>) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children_of(node).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    pub(crate) fn document_order(&self) -> Vec<NodeId> {
        self.descendants_of(None)
    }

    pub(crate) fn element_index(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|child| *child == node)
    }

    pub(crate) fn previous_siblings(&self, node: NodeId) -> Vec<NodeId> {
        match (self.parent(node), self.element_index(node)) {
            (Some(parent), Some(index)) => self.children(parent)[..index].to_vec(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let Some(el) = self.element(node) {
            out.push_str(&el.text);
            for child in &el.children {
                out.push_str(&self.text_content(*child));
            }
        }
        out
    }

    fn rendered_text(&self, node: NodeId) -> String {
        let Some(el) = self.element(node) else {
            return String::new();
        };
        if el.style.is_display_none() {
            return String::new();
        }
        let mut out = el.text.clone();
        for child in &el.children {
            out.push_str(&self.rendered_text(*child));
        }
        out
    }

    fn is_rendered(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            match self.element(id) {
                Some(el) if el.style.is_display_none() => return false,
                Some(el) => current = el.parent,
                None => return false,
            }
        }
        true
    }

    fn offset_parent(&self, node: NodeId) -> Option<NodeId> {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if self.element(id).is_some_and(|el| el.layout.is_some()) {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }

    /// Document-relative rectangle `(top, left, width, height)`.
    fn document_rect(&self, node: NodeId) -> Option<(f64, f64, f64, f64)> {
        let layout = self.element(node)?.layout?;
        let (mut top, mut left) = (layout.top, layout.left);
        let mut current = self.offset_parent(node);
        while let Some(id) = current {
            if let Some(parent_box) = self.element(id).and_then(|el| el.layout) {
                top += parent_box.top;
                left += parent_box.left;
            }
            current = self.offset_parent(id);
        }
        Some((top, left, layout.width, layout.height))
    }

    fn document_extent(&self) -> (f64, f64) {
        self.document_order()
            .into_iter()
            .filter_map(|node| self.document_rect(node))
            .fold((0.0f64, 0.0f64), |(w, h), (top, left, width, height)| {
                (w.max(left + width), h.max(top + height))
            })
    }

    fn insert(&mut self, parent: Option<NodeId>, fixture: &ElementFixture) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ElementNode {
            tag: fixture.tag.to_ascii_lowercase(),
            attrs: fixture
                .attrs
                .iter()
                .map(|(key, value)| (key.to_ascii_lowercase(), value.clone()))
                .collect(),
            text: fixture.text.clone(),
            style: fixture.style.clone(),
            layout: fixture.layout,
            stalls_layout: fixture.stalls_layout,
            parent,
            children: Vec::new(),
            detached: false,
        });
        for child in &fixture.children {
            let child_id = self.insert(Some(id), child);
            self.nodes[id.0].children.push(child_id);
        }
        id
    }

    fn detach(&mut self, node: NodeId) {
        let children = self.children(node).to_vec();
        for child in children {
            self.detach(child);
        }
        if let Some(el) = self.nodes.get_mut(node.0) {
            el.detached = true;
        }
    }
}

/// Deterministic in-memory document.
///
/// Layout is declared, not computed: each element may carry a box relative
/// to its offset parent (the nearest ancestor that has a box).
pub struct MemoryDocument {
    tree: RwLock<Tree>,
    viewport: RwLock<Viewport>,
    scroll_calls: AtomicUsize,
}

impl MemoryDocument {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            tree: RwLock::new(Tree::default()),
            viewport: RwLock::new(viewport),
            scroll_calls: AtomicUsize::new(0),
        }
    }

    pub fn from_fixture(fixture: &DocumentFixture) -> Self {
        let document = Self::new(fixture.viewport);
        document.set_root(&fixture.root);
        document
    }

    /// Replace the whole tree with a new root element.
    pub fn set_root(&self, root: &ElementFixture) -> NodeId {
        let mut tree = self.tree.write();
        *tree = Tree::default();
        let id = tree.insert(None, root);
        tree.root = Some(id);
        id
    }

    pub fn append_child(&self, parent: NodeId, child: &ElementFixture) -> Result<NodeId, DomError> {
        let mut tree = self.tree.write();
        tree.require(parent)?;
        let id = tree.insert(Some(parent), child);
        tree.element_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Detach a subtree, as a host re-render would.
    pub fn remove(&self, node: NodeId) -> Result<(), DomError> {
        let mut tree = self.tree.write();
        let parent = tree.require(node)?.parent;
        if let Some(parent) = parent {
            tree.element_mut(parent)?.children.retain(|child| *child != node);
        } else {
            tree.root = None;
        }
        tree.detach(node);
        Ok(())
    }

    pub fn set_style(&self, node: NodeId, style: ComputedStyle) -> Result<(), DomError> {
        self.tree.write().element_mut(node)?.style = style;
        Ok(())
    }

    pub fn set_layout(&self, node: NodeId, layout: Option<LayoutBox>) -> Result<(), DomError> {
        self.tree.write().element_mut(node)?.layout = layout;
        Ok(())
    }

    pub fn set_text(&self, node: NodeId, text: impl Into<String>) -> Result<(), DomError> {
        self.tree.write().element_mut(node)?.text = text.into();
        Ok(())
    }

    /// Number of `scroll_to` calls so far.
    pub fn scroll_calls(&self) -> usize {
        self.scroll_calls.load(Ordering::SeqCst)
    }

    fn intersection_ratio(&self, tree: &Tree, node: NodeId) -> f64 {
        if !tree.is_rendered(node) {
            return 0.0;
        }
        let Some((top, left, width, height)) = tree.document_rect(node) else {
            return 0.0;
        };
        if width <= 0.0 || height <= 0.0 {
            return 0.0;
        }

        let viewport = *self.viewport.read();
        let (view_top, view_left) = (viewport.scroll_y, viewport.scroll_x);
        let (view_bottom, view_right) = (view_top + viewport.height, view_left + viewport.width);

        if top >= view_top
            && left >= view_left
            && top + height <= view_bottom
            && left + width <= view_right
        {
            return 1.0;
        }

        let overlap_h = ((top + height).min(view_bottom) - top.max(view_top)).max(0.0);
        let overlap_w = ((left + width).min(view_right) - left.max(view_left)).max(0.0);
        (overlap_h * overlap_w) / (height * width)
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

#[async_trait]
impl Document for MemoryDocument {
    fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let list = SelectorList::parse(selector)?;
        let tree = self.tree.read();
        let matches: Vec<NodeId> = tree
            .document_order()
            .into_iter()
            .filter(|node| list.matches(&tree, *node))
            .collect();
        trace!(selector, count = matches.len(), "structural query");
        Ok(matches)
    }

    fn evaluate_path(&self, expression: &str) -> Result<Vec<NodeId>, DomError> {
        let expr = PathExpr::parse(expression)?;
        let tree = self.tree.read();
        let matches = expr.evaluate(&tree);
        trace!(expression, count = matches.len(), "path query");
        Ok(matches)
    }

    fn document_element(&self) -> Option<NodeId> {
        self.tree.read().root
    }

    fn inner_text(&self, node: NodeId) -> Result<String, DomError> {
        let tree = self.tree.read();
        tree.require(node)?;
        Ok(tree.rendered_text(node).trim().to_string())
    }

    fn offset_size(&self, node: NodeId) -> Result<Size, DomError> {
        let tree = self.tree.read();
        if !tree.is_rendered(node) {
            tree.require(node)?;
            return Ok(Size::default());
        }
        Ok(tree.require(node)?.layout.map(|b| b.size()).unwrap_or_default())
    }

    fn offset_position(&self, node: NodeId) -> Result<Position, DomError> {
        let tree = self.tree.read();
        Ok(tree
            .require(node)?
            .layout
            .map(|b| b.position())
            .unwrap_or_default())
    }

    fn offset_parent(&self, node: NodeId) -> Result<Option<NodeId>, DomError> {
        let tree = self.tree.read();
        tree.require(node)?;
        Ok(tree.offset_parent(node))
    }

    fn computed_style(&self, node: NodeId) -> Result<ComputedStyle, DomError> {
        Ok(self.tree.read().require(node)?.style.clone())
    }

    fn has_attribute(&self, node: NodeId, name: &str) -> Result<bool, DomError> {
        let tree = self.tree.read();
        tree.require(node)?;
        Ok(tree.attr(node, name).is_some())
    }

    fn get_attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, DomError> {
        let tree = self.tree.read();
        tree.require(node)?;
        Ok(tree.attr(node, name).map(str::to_string))
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let mut tree = self.tree.write();
        let el = tree.element_mut(node)?;
        let name = name.to_ascii_lowercase();
        match el.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => el.attrs.push((name, value.to_string())),
        }
        Ok(())
    }

    fn remove_attribute(&self, node: NodeId, name: &str) -> Result<(), DomError> {
        let mut tree = self.tree.write();
        let el = tree.element_mut(node)?;
        el.attrs.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        Ok(())
    }

    fn viewport(&self) -> Viewport {
        *self.viewport.read()
    }

    fn scroll_to(&self, x: f64, y: f64) {
        self.scroll_calls.fetch_add(1, Ordering::SeqCst);
        let (extent_w, extent_h) = self.tree.read().document_extent();
        let mut viewport = self.viewport.write();
        let max_x = (extent_w - viewport.width).max(0.0);
        let max_y = (extent_h - viewport.height).max(0.0);
        viewport.scroll_x = x.clamp(0.0, max_x);
        viewport.scroll_y = y.clamp(0.0, max_y);
        debug!(
            scroll_x = viewport.scroll_x,
            scroll_y = viewport.scroll_y,
            "viewport scrolled"
        );
    }

    async fn observe_intersection(&self, node: NodeId) -> Result<f64, DomError> {
        let observed = {
            let tree = self.tree.read();
            let el = tree.require(node)?;
            if el.stalls_layout {
                None
            } else {
                Some(self.intersection_ratio(&tree, node))
            }
        };

        match observed {
            Some(ratio) => Ok(ratio),
            None => {
                debug!(node = node.0, "element never lays out; observation pending");
                futures::future::pending::<Result<f64, DomError>>().await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_document() -> MemoryDocument {
        let root = ElementFixture::new("html").child(
            ElementFixture::new("body")
                .layout(LayoutBox::new(0.0, 0.0, 1280.0, 3000.0))
                .child(ElementFixture::new("ul").attr("id", "list").children(
                    (0..3).map(|i| {
                        ElementFixture::new("li")
                            .attr("class", "item")
                            .text(format!("Item {i}"))
                            .layout(LayoutBox::new(100.0 * i as f64, 0.0, 200.0, 40.0))
                    }),
                )),
        );
        MemoryDocument::from_fixture(&DocumentFixture::new(Viewport::default(), root))
    }

    #[test]
    fn test_structural_query_in_document_order() {
        let doc = list_document();
        let items = doc.query_selector_all("ul > li.item").unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(doc.inner_text(items[0]).unwrap(), "Item 0");
        assert_eq!(doc.query_selector_all("li:last-child").unwrap(), vec![items[2]]);
        assert_eq!(doc.query_selector_all("li + li").unwrap(), items[1..].to_vec());
    }

    #[test]
    fn test_path_query_positions() {
        let doc = list_document();
        let items = doc.query_selector_all("li").unwrap();
        assert_eq!(doc.evaluate_path("//li[2]").unwrap(), vec![items[1]]);
        assert_eq!(doc.evaluate_path("(//li)[last()]").unwrap(), vec![items[2]]);
        assert_eq!(
            doc.evaluate_path("//ul[@id='list']/li[contains(text(),'1')]")
                .unwrap(),
            vec![items[1]]
        );
        assert_eq!(doc.evaluate_path("/html/body/ul/li").unwrap(), items);
    }

    #[test]
    fn test_attribute_roundtrip_is_case_insensitive() {
        let doc = list_document();
        let list = doc.query_selector_all("#list").unwrap()[0];
        doc.set_attribute(list, "Data-Flag", "").unwrap();
        assert!(doc.has_attribute(list, "data-flag").unwrap());
        assert_eq!(doc.get_attribute(list, "DATA-FLAG").unwrap(), Some(String::new()));
        doc.remove_attribute(list, "data-flag").unwrap();
        assert_eq!(doc.get_attribute(list, "data-flag").unwrap(), None);
    }

    #[test]
    fn test_offset_parent_chain() {
        let doc = list_document();
        let items = doc.query_selector_all("li").unwrap();
        let body = doc.query_selector_all("body").unwrap()[0];
        // `ul` has no box, so the body is the offset parent.
        assert_eq!(doc.offset_parent(items[1]).unwrap(), Some(body));
        assert_eq!(doc.offset_parent(body).unwrap(), None);
    }

    #[test]
    fn test_scroll_is_clamped_to_document() {
        let doc = list_document();
        doc.scroll_to(0.0, -50.0);
        assert_eq!(doc.viewport().scroll_y, 0.0);
        doc.scroll_to(0.0, 10_000.0);
        assert_eq!(doc.viewport().scroll_y, 3000.0 - 720.0);
        assert_eq!(doc.scroll_calls(), 2);
    }

    #[test]
    fn test_removed_nodes_are_unknown() {
        let doc = list_document();
        let first = doc.query_selector_all("li").unwrap()[0];
        doc.remove(first).unwrap();
        assert_eq!(doc.query_selector_all("li").unwrap().len(), 2);
        assert_eq!(doc.inner_text(first), Err(DomError::UnknownNode(first.0)));
    }

    #[tokio::test]
    async fn test_intersection_ratio_partial() {
        let doc = list_document();
        let items = doc.query_selector_all("li").unwrap();
        assert_eq!(doc.observe_intersection(items[0]).await.unwrap(), 1.0);

        // Scroll so the first item is half out of view.
        doc.scroll_to(0.0, 20.0);
        let ratio = doc.observe_intersection(items[0]).await.unwrap();
        assert!((ratio - 0.5).abs() < 1e-9);
    }
}
