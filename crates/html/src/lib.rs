pub mod outline;
pub mod traverse;

mod builder;
mod document;
mod entities;
mod serialize;
mod tokenizer;
mod types;

pub use crate::document::{Ancestors, Document};
pub use crate::entities::{decode_entities, escape_attribute, escape_text};
pub use crate::tokenizer::tokenize;
pub use crate::traverse::Gap;
pub use crate::types::{Attribute, DomError, NodeId, NodeKind, Token};
