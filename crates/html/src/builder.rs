use crate::document::Document;
use crate::types::{NodeId, Token};

/// Builds the nodes described by `tokens` under `parent`.
///
/// Unmatched end tags are ignored. An end tag closes the nearest open element with
/// the same name and everything opened after it. Doctypes carry no meaning inside a
/// fragment and are dropped. Adjacent text tokens collapse into one text node.
pub(crate) fn build_into(doc: &mut Document, parent: NodeId, tokens: &[Token]) {
    let mut open_elements: Vec<NodeId> = Vec::new();

    for token in tokens {
        let current = open_elements.last().copied().unwrap_or(parent);
        match token {
            Token::Doctype(_) => {}
            Token::Comment(text) => {
                let node = doc.create_comment(text.as_str());
                append(doc, current, node);
            }
            Token::Text(text) => {
                if text.is_empty() {
                    continue;
                }
                let last_text = doc.last_child(current).filter(|last| doc.is_text(*last));
                if let Some(last) = last_text {
                    let offset = doc.text_len(last);
                    if doc.insert_text(last, offset, text).is_ok() {
                        continue;
                    }
                }
                let node = doc.create_text(text.as_str());
                append(doc, current, node);
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                if name.is_empty() {
                    continue;
                }
                let node = doc.create_element_with(name, attributes.clone());
                append(doc, current, node);
                if !self_closing {
                    open_elements.push(node);
                }
            }
            Token::EndTag(name) => {
                let matched = open_elements
                    .iter()
                    .rposition(|open| doc.is_tag(*open, name));
                if let Some(index) = matched {
                    open_elements.truncate(index);
                }
            }
        }
    }
}

fn append(doc: &mut Document, parent: NodeId, node: NodeId) {
    if let Err(err) = doc.append_child(parent, node) {
        log::warn!(target: "html.builder", "dropping node {node}: {err}");
    }
}

#[cfg(test)]
mod tests {
    use crate::Document;

    #[test]
    fn build_nests_inline_change_markup() {
        let doc = Document::parse(
            r#"<p>a <em>left<span class="ins" data-cid="1">ist</span></em> paragraph</p>"#,
        );
        let p = doc.first_child(doc.root()).unwrap();
        assert_eq!(doc.child_count(p), 3);
        let em = doc.children(p)[1];
        let span = doc.last_child(em).unwrap();
        assert_eq!(doc.attr(span, "data-cid"), Some("1"));
        assert_eq!(doc.text_content(span), "ist");
    }

    #[test]
    fn build_ignores_unmatched_end_tags() {
        let doc = Document::parse("<p>a</span>b</p><p>c</p>");
        assert_eq!(doc.inner_html(doc.root()), "<p>ab</p><p>c</p>");
    }

    #[test]
    fn build_closes_intermediate_elements() {
        let doc = Document::parse("<div><p>a<b>b</div>c");
        assert_eq!(doc.inner_html(doc.root()), "<div><p>a<b>b</b></p></div>c");
    }

    #[test]
    fn build_handles_deep_nesting() {
        let depth = 2_000;
        let html = format!("{}x{}", "<span>".repeat(depth), "</span>".repeat(depth));
        let doc = Document::parse(&html);
        let mut current = doc.root();
        let mut seen = 0;
        while let Some(child) = doc.first_child(current) {
            if doc.is_text(child) {
                break;
            }
            seen += 1;
            current = child;
        }
        assert_eq!(seen, depth);
    }
}
