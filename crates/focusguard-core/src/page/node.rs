//! Element trees handed to [`Page::append_to_body`](super::Page::append_to_body).

use serde::{Deserialize, Serialize};

/// A detached element with optional id, classes, attributes, text and
/// children. Text is escaped when rendered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Node {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Depth-first search for an element id, including `self`.
    pub fn find(&self, id: &str) -> Option<&Node> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// Number of elements in this subtree carrying `id`.
    pub fn count_id(&self, id: &str) -> usize {
        let own = usize::from(self.id.as_deref() == Some(id));
        own + self.children.iter().map(|c| c.count_id(id)).sum::<usize>()
    }

    /// Concatenated text of this subtree.
    pub fn text_content(&self) -> String {
        let mut out = self.text.clone().unwrap_or_default();
        for child in &self.children {
            out.push_str(&child.text_content());
        }
        out
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        if let Some(id) = &self.id {
            push_attr(out, "id", id);
        }
        if !self.classes.is_empty() {
            push_attr(out, "class", &self.classes.join(" "));
        }
        for (name, value) in &self.attrs {
            push_attr(out, name, value);
        }
        out.push('>');
        if let Some(text) = &self.text {
            // <style> bodies are raw text
            if self.tag == "style" {
                out.push_str(text);
            } else {
                out.push_str(&escape(text));
            }
        }
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape(value));
    out.push('"');
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_html_with_escaping() {
        let node = Node::new("div")
            .with_id("outer")
            .with_class("a")
            .with_class("b")
            .with_child(Node::new("span").with_text("1 < 2 & \"x\""));
        assert_eq!(
            node.to_html(),
            r#"<div id="outer" class="a b"><span>1 &lt; 2 &amp; &quot;x&quot;</span></div>"#
        );
    }

    #[test]
    fn find_reaches_nested_ids() {
        let mut node = Node::new("div")
            .with_child(Node::new("p").with_child(Node::new("span").with_id("deep")));
        assert!(node.find("deep").is_some());
        node.find_mut("deep").unwrap().text = Some("3".into());
        assert_eq!(node.text_content(), "3");
        assert!(node.find("missing").is_none());
    }

    #[test]
    fn style_text_is_not_escaped() {
        let node = Node::new("style").with_text("body > * { display: none; }");
        assert_eq!(node.to_html(), "<style>body > * { display: none; }</style>");
    }
}
