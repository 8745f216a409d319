use crate::document::Document;
use crate::types::{NodeId, NodeKind};

const INDENT_STEP: &str = "  ";
const PREVIEW_CHARS: usize = 40;

/// One line per node, indented by depth, for at most `cap` nodes.
///
/// Elements show their `class` attribute plus any attribute listed in `highlight`,
/// which makes change markup readable at a glance.
pub fn outline(doc: &Document, root: NodeId, highlight: &[&str], cap: usize) -> Vec<String> {
    struct IndentGuard<'a> {
        indent: &'a mut String,
        step: usize,
    }

    impl Drop for IndentGuard<'_> {
        fn drop(&mut self) {
            let new_len = self.indent.len() - self.step;
            self.indent.truncate(new_len);
        }
    }

    fn push_preview(out: &mut String, s: &str) {
        for (i, ch) in s.chars().enumerate() {
            if i == PREVIEW_CHARS {
                out.push('…');
                break;
            }
            out.push(match ch {
                '\n' => ' ',
                '\u{00A0}' => '·',
                other => other,
            });
        }
    }

    struct Walk<'a> {
        doc: &'a Document,
        highlight: &'a [&'a str],
        out: Vec<String>,
        left: usize,
    }

    impl Walk<'_> {
        fn node(&mut self, id: NodeId, indent: &mut String) {
            if self.left == 0 {
                return;
            }
            self.left -= 1;
            let mut line = String::with_capacity(indent.len() + 64);
            line.push_str(indent);
            let doc = self.doc;
            match doc.kind(id) {
                NodeKind::Fragment => line.push_str("#fragment"),
                NodeKind::Element { name, .. } => {
                    line.push('<');
                    line.push_str(name);
                    for key in std::iter::once(&"class").chain(self.highlight.iter()) {
                        if let Some(value) = doc.attr(id, key) {
                            line.push(' ');
                            line.push_str(key);
                            line.push_str("=\"");
                            line.push_str(value);
                            line.push('"');
                        }
                    }
                    line.push('>');
                }
                NodeKind::Text { text } => {
                    line.push('"');
                    push_preview(&mut line, text);
                    line.push('"');
                }
                NodeKind::Comment { text } => {
                    line.push_str("<!-- ");
                    push_preview(&mut line, text);
                    line.push_str(" -->");
                }
            }
            self.out.push(line);
            indent.push_str(INDENT_STEP);
            let mut guard = IndentGuard {
                indent,
                step: INDENT_STEP.len(),
            };
            let doc = self.doc;
            for child in doc.children(id) {
                self.node(*child, &mut *guard.indent);
            }
        }
    }

    let mut walk = Walk {
        doc,
        highlight,
        out: Vec::new(),
        left: cap,
    };
    let mut indent = String::new();
    walk.node(root, &mut indent);
    walk.out
}
