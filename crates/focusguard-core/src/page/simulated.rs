//! In-memory document used by tests and the CLI simulator.

use super::{Node, Page, ReadyState};

/// A document with a location, a head of `<style>` elements and an
/// optional body holding element trees.
///
/// `replace_location` models a hard navigation: the address changes, the
/// old document's head and body are discarded and the target is appended
/// to [`redirects`](Self::redirects).
#[derive(Debug, Clone)]
pub struct SimulatedPage {
    href: String,
    ready_state: ReadyState,
    styles: Vec<(String, String)>,
    body: Option<Vec<Node>>,
    history: Vec<String>,
    redirects: Vec<String>,
}

impl SimulatedPage {
    /// A fully loaded document at `href`.
    pub fn new(href: impl Into<String>) -> Self {
        let href = href.into();
        Self {
            history: vec![href.clone()],
            href,
            ready_state: ReadyState::Complete,
            styles: Vec::new(),
            body: Some(Vec::new()),
            redirects: Vec::new(),
        }
    }

    /// A document that has just started parsing: no body yet.
    pub fn loading(href: impl Into<String>) -> Self {
        Self {
            ready_state: ReadyState::Loading,
            body: None,
            ..Self::new(href)
        }
    }

    /// Body element parsed; the document may still be loading.
    pub fn attach_body(&mut self) {
        if self.body.is_none() {
            self.body = Some(Vec::new());
        }
    }

    /// Parsing finished (the point where `DOMContentLoaded` fires).
    pub fn finish_loading(&mut self) {
        self.attach_body();
        self.ready_state = ReadyState::Interactive;
    }

    pub fn set_ready_state(&mut self, state: ReadyState) {
        self.ready_state = state;
    }

    /// Effect of `history.pushState` with a new address.
    pub fn push_state(&mut self, href: impl Into<String>) {
        self.href = href.into();
        self.history.push(self.href.clone());
    }

    /// Effect of `history.replaceState` with a new address.
    pub fn replace_state(&mut self, href: impl Into<String>) {
        self.href = href.into();
        if let Some(last) = self.history.last_mut() {
            *last = self.href.clone();
        }
    }

    /// Effect of the back button. Returns false at the start of history.
    pub fn go_back(&mut self) -> bool {
        if self.history.len() < 2 {
            return false;
        }
        self.history.pop();
        if let Some(prev) = self.history.last() {
            self.href = prev.clone();
        }
        true
    }

    /// Site script adding an element to the body, e.g. after it rendered
    /// the new route.
    pub fn site_append(&mut self, node: Node) {
        self.append_to_body(node);
    }

    pub fn style(&self, id: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|(sid, _)| sid == id)
            .map(|(_, css)| css.as_str())
    }

    pub fn element(&self, id: &str) -> Option<&Node> {
        self.body.as_ref()?.iter().find_map(|n| n.find(id))
    }

    /// How many elements carry `id`; more than one means a marker leaked.
    pub fn count_id(&self, id: &str) -> usize {
        let in_head = self.styles.iter().filter(|(sid, _)| sid == id).count();
        let in_body = self
            .body
            .as_ref()
            .map(|b| b.iter().map(|n| n.count_id(id)).sum())
            .unwrap_or(0);
        in_head + in_body
    }

    pub fn body_children(&self) -> &[Node] {
        self.body.as_deref().unwrap_or(&[])
    }

    /// Addresses passed to `replace_location`, oldest first.
    pub fn redirects(&self) -> &[String] {
        &self.redirects
    }

    /// Addresses in the session history, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl Page for SimulatedPage {
    fn href(&self) -> String {
        self.href.clone()
    }

    fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    fn has_body(&self) -> bool {
        self.body.is_some()
    }

    fn contains(&self, id: &str) -> bool {
        self.count_id(id) > 0
    }

    fn inject_style(&mut self, id: &str, css: &str) {
        self.styles.push((id.to_string(), css.to_string()));
    }

    fn append_to_body(&mut self, node: Node) -> bool {
        match self.body.as_mut() {
            Some(body) => {
                body.push(node);
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, id: &str) -> bool {
        if let Some(pos) = self.styles.iter().position(|(sid, _)| sid == id) {
            self.styles.remove(pos);
            return true;
        }
        let Some(body) = self.body.as_mut() else {
            return false;
        };
        if let Some(pos) = body.iter().position(|n| n.id.as_deref() == Some(id)) {
            body.remove(pos);
            return true;
        }
        body.iter_mut().any(|n| remove_descendant(n, id))
    }

    fn set_text(&mut self, id: &str, text: &str) -> bool {
        match self.body.as_mut().and_then(|b| b.iter_mut().find_map(|n| n.find_mut(id))) {
            Some(node) => {
                node.text = Some(text.to_string());
                true
            }
            None => false,
        }
    }

    fn toggle_class(&mut self, id: &str, class: &str, on: bool) -> bool {
        match self.body.as_mut().and_then(|b| b.iter_mut().find_map(|n| n.find_mut(id))) {
            Some(node) => {
                node.classes.retain(|c| c != class);
                if on {
                    node.classes.push(class.to_string());
                }
                true
            }
            None => false,
        }
    }

    fn replace_location(&mut self, url: &str) {
        self.redirects.push(url.to_string());
        self.href = url.to_string();
        if let Some(last) = self.history.last_mut() {
            *last = url.to_string();
        }
        self.styles.clear();
        self.body = Some(Vec::new());
        self.ready_state = ReadyState::Complete;
    }
}

fn remove_descendant(node: &mut Node, id: &str) -> bool {
    if let Some(pos) = node.children.iter().position(|c| c.id.as_deref() == Some(id)) {
        node.children.remove(pos);
        return true;
    }
    node.children.iter_mut().any(|c| remove_descendant(c, id))
}
