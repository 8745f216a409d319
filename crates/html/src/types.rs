use std::fmt;

/// Handle to a node stored in a [`crate::Document`] arena.
///
/// Ids are only meaningful for the document that created them. Detached nodes keep
/// their id; nothing is ever freed while the document lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub type Attribute = (String, Option<String>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Doctype(String),
    StartTag {
        name: String,
        attributes: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag(String),
    Comment(String),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Fragment,
    Element {
        name: String,
        attributes: Vec<Attribute>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

impl NodeKind {
    pub fn allows_children(&self) -> bool {
        matches!(self, NodeKind::Fragment | NodeKind::Element { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    WrongNodeKind(NodeId),
    InvalidParent(NodeId),
    InvalidSibling { parent: NodeId, before: NodeId },
    CycleDetected { parent: NodeId, child: NodeId },
    Detached(NodeId),
    OffsetOutOfBounds { node: NodeId, offset: usize },
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::WrongNodeKind(id) => write!(f, "node {id} has the wrong kind"),
            DomError::InvalidParent(id) => write!(f, "node {id} cannot have children"),
            DomError::InvalidSibling { parent, before } => {
                write!(f, "node {before} is not a child of {parent}")
            }
            DomError::CycleDetected { parent, child } => {
                write!(f, "inserting {child} under {parent} would create a cycle")
            }
            DomError::Detached(id) => write!(f, "node {id} is not attached"),
            DomError::OffsetOutOfBounds { node, offset } => {
                write!(f, "offset {offset} is out of bounds for {node}")
            }
        }
    }
}

impl std::error::Error for DomError {}
