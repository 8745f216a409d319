use crate::types::{Attribute, DomError, NodeId, NodeKind};
use tools::text::clamp_to_char_boundary;

#[derive(Debug, Clone)]
struct NodeRecord {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Mutable arena DOM.
///
/// Every node ever created stays in the arena; removing a node only detaches it.
/// Structural operations validate their inputs and report [`DomError`] instead of
/// corrupting parent/child links.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeRecord>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeRecord {
                kind: NodeKind::Fragment,
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
        }
    }

    /// Parses `html` as a fragment whose nodes become children of [`Document::root`].
    pub fn parse(html: &str) -> Self {
        let mut doc = Self::new();
        let root = doc.root;
        crate::builder::build_into(&mut doc, root, &crate::tokenize(html));
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn record(&self, id: NodeId) -> &NodeRecord {
        &self.nodes[id.index()]
    }

    fn record_mut(&mut self, id: NodeId) -> &mut NodeRecord {
        &mut self.nodes[id.index()]
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeRecord {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeKind::Element {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
        })
    }

    pub fn create_element_with(&mut self, name: &str, attributes: Vec<Attribute>) -> NodeId {
        self.push(NodeKind::Element {
            name: name.to_ascii_lowercase(),
            attributes,
        })
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text { text: text.into() })
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Comment { text: text.into() })
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.push(NodeKind::Fragment)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.record(id).kind
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Text { .. })
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Element { .. })
    }

    pub fn allows_children(&self, id: NodeId) -> bool {
        self.kind(id).allows_children()
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag_name(id).is_some_and(|name| name.eq_ignore_ascii_case(tag))
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Text { text } | NodeKind::Comment { text } => Some(text),
            _ => None,
        }
    }

    /// Byte length of a text node; zero for anything else.
    pub fn text_len(&self, id: NodeId) -> usize {
        match self.kind(id) {
            NodeKind::Text { text } => text.len(),
            _ => 0,
        }
    }

    fn text_mut(&mut self, id: NodeId) -> Result<&mut String, DomError> {
        match &mut self.record_mut(id).kind {
            NodeKind::Text { text } | NodeKind::Comment { text } => Ok(text),
            _ => Err(DomError::WrongNodeKind(id)),
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        let text = self.text_mut(id)?;
        text.clear();
        text.push_str(value);
        Ok(())
    }

    pub fn insert_text(&mut self, id: NodeId, offset: usize, value: &str) -> Result<(), DomError> {
        let text = self.text_mut(id)?;
        if offset > text.len() || !text.is_char_boundary(offset) {
            return Err(DomError::OffsetOutOfBounds { node: id, offset });
        }
        text.insert_str(offset, value);
        Ok(())
    }

    pub fn delete_text(&mut self, id: NodeId, start: usize, end: usize) -> Result<(), DomError> {
        let text = self.text_mut(id)?;
        if start > end || end > text.len() {
            return Err(DomError::OffsetOutOfBounds { node: id, offset: end });
        }
        if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            return Err(DomError::OffsetOutOfBounds { node: id, offset: start });
        }
        text.replace_range(start..end, "");
        Ok(())
    }

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match self.kind(id) {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attributes(id)
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Sets an attribute, keeping its position when it already exists.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let NodeKind::Element { attributes, .. } = &mut self.record_mut(id).kind else {
            return Err(DomError::WrongNodeKind(id));
        };
        match attributes.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, existing)) => *existing = Some(value.to_string()),
            None => attributes.push((name.to_ascii_lowercase(), Some(value.to_string()))),
        }
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> bool {
        let NodeKind::Element { attributes, .. } = &mut self.record_mut(id).kind else {
            return false;
        };
        let before = attributes.len();
        attributes.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        attributes.len() != before
    }

    pub fn classes(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.attr(id, "class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).any(|c| c == class)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<(), DomError> {
        if self.has_class(id, class) {
            return Ok(());
        }
        let value = match self.attr(id, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attr(id, "class", &value)
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<(), DomError> {
        if !self.has_class(id, class) {
            return Ok(());
        }
        let value = self
            .classes(id)
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        if value.is_empty() {
            self.remove_attr(id, "class");
            Ok(())
        } else {
            self.set_attr(id, "class", &value)
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.record(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.record(id).children
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.record(id).children.len()
    }

    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.record(id).children.get(index).copied()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.record(id).children.first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.record(id).children.last().copied()
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_of(id)?;
        self.child_at(parent, index + 1)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_of(id)?;
        index.checked_sub(1).and_then(|i| self.child_at(parent, i))
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// True when `node` is `ancestor` or lies below it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Nodes below `id` in document order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let index = self.child_count(parent);
        self.insert_child(parent, index, child)
    }

    /// Inserts `child` at `index` under `parent`, detaching it from any previous parent first.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), DomError> {
        if parent == child || self.contains(child, parent) {
            return Err(DomError::CycleDetected { parent, child });
        }
        if !self.allows_children(parent) {
            return Err(DomError::InvalidParent(parent));
        }
        let mut index = index;
        let mut available = self.child_count(parent);
        if self.parent(child) == Some(parent) {
            available -= 1;
            if self.index_of(child).is_some_and(|current| current < index) {
                index -= 1;
            }
        }
        if index > available {
            return Err(DomError::OffsetOutOfBounds {
                node: parent,
                offset: index,
            });
        }
        self.detach(child);
        self.record_mut(parent).children.insert(index, child);
        self.record_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Inserts `child` as the previous sibling of `reference`.
    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent = self.parent(reference).ok_or(DomError::Detached(reference))?;
        if child == reference {
            return Ok(());
        }
        self.detach(child);
        let index = self
            .index_of(reference)
            .ok_or(DomError::InvalidSibling {
                parent,
                before: reference,
            })?;
        self.insert_child(parent, index, child)
    }

    /// Inserts `child` as the next sibling of `reference`.
    pub fn insert_after(&mut self, reference: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent = self.parent(reference).ok_or(DomError::Detached(reference))?;
        if child == reference {
            return Ok(());
        }
        self.detach(child);
        let index = self
            .index_of(reference)
            .ok_or(DomError::InvalidSibling {
                parent,
                before: reference,
            })?;
        self.insert_child(parent, index + 1, child)
    }

    /// Detaches `id` (and its subtree) from its parent. The node stays usable.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.record_mut(id).parent.take() {
            self.record_mut(parent).children.retain(|c| *c != id);
        }
    }

    /// Replaces `id` by its children.
    pub fn unwrap(&mut self, id: NodeId) -> Result<(), DomError> {
        let parent = self.parent(id).ok_or(DomError::Detached(id))?;
        let index = self.index_of(id).ok_or(DomError::Detached(id))?;
        let children = std::mem::take(&mut self.record_mut(id).children);
        for (offset, child) in children.iter().enumerate() {
            self.record_mut(*child).parent = None;
            self.insert_child(parent, index + offset, *child)?;
        }
        self.detach(id);
        Ok(())
    }

    /// Puts `wrapper` where `node` is and moves `node` inside it.
    pub fn wrap(&mut self, node: NodeId, wrapper: NodeId) -> Result<(), DomError> {
        self.insert_before(node, wrapper)?;
        self.append_child(wrapper, node)
    }

    /// Appends every child of `from` to `to`, in order.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) -> Result<(), DomError> {
        let children = self.children(from).to_vec();
        for child in children {
            self.append_child(to, child)?;
        }
        Ok(())
    }

    /// Splits a text node at byte `offset`; the tail becomes a new next sibling.
    ///
    /// Offsets inside a multi-byte character are clamped to the preceding boundary.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId, DomError> {
        let tail = {
            let NodeKind::Text { text } = &mut self.record_mut(id).kind else {
                return Err(DomError::WrongNodeKind(id));
            };
            let at = clamp_to_char_boundary(text, offset);
            text.split_off(at)
        };
        let new = self.create_text(tail);
        if self.parent(id).is_some() {
            self.insert_after(id, new)?;
        }
        Ok(new)
    }

    /// Copies the node itself (name, attributes or text) without children.
    pub fn shallow_clone(&mut self, id: NodeId) -> NodeId {
        let kind = self.kind(id).clone();
        self.push(kind)
    }

    /// Detached copy of the whole subtree.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let copy = self.shallow_clone(id);
        let children = self.children(id).to_vec();
        for child in children {
            let child_copy = self.deep_clone(child);
            self.record_mut(child_copy).parent = Some(copy);
            self.record_mut(copy).children.push(child_copy);
        }
        copy
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Text { text } => out.push_str(text),
            NodeKind::Comment { .. } => {}
            _ => {
                for child in self.children(id) {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Merges adjacent text nodes and drops empty ones throughout the subtree.
    pub fn normalize(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        let mut previous_text: Option<NodeId> = None;
        for child in children {
            if self.is_text(child) {
                if self.text_len(child) == 0 {
                    self.detach(child);
                    continue;
                }
                if let Some(prev) = previous_text {
                    let tail = self.text(child).unwrap_or_default().to_string();
                    if let NodeKind::Text { text } = &mut self.record_mut(prev).kind {
                        text.push_str(&tail);
                    }
                    self.detach(child);
                    continue;
                }
                previous_text = Some(child);
            } else {
                previous_text = None;
                self.normalize(child);
            }
        }
    }

    /// Parses `html` into detached top-level nodes owned by this document.
    pub fn parse_fragment(&mut self, html: &str) -> Vec<NodeId> {
        let holder = self.create_fragment();
        crate::builder::build_into(self, holder, &crate::tokenize(html));
        let nodes = self.children(holder).to_vec();
        for node in &nodes {
            self.detach(*node);
        }
        nodes
    }

    pub fn set_inner_html(&mut self, id: NodeId, html: &str) -> Result<(), DomError> {
        if !self.allows_children(id) {
            return Err(DomError::InvalidParent(id));
        }
        for child in self.children(id).to_vec() {
            self.detach(child);
        }
        for node in self.parse_fragment(html) {
            self.append_child(id, node)?;
        }
        Ok(())
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}
