//! Document boundary.
//!
//! The core never touches a real DOM. A host (a browser binding, or the
//! [`SimulatedPage`] used by tests and the CLI) implements [`Page`], and
//! element ids act as the only state shared between calls.

mod node;
mod simulated;

pub use node::Node;
pub use simulated::SimulatedPage;

use serde::{Deserialize, Serialize};

/// `document.readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

/// Operations the core needs from the active document.
pub trait Page {
    /// Full address of the active document.
    fn href(&self) -> String;
    fn ready_state(&self) -> ReadyState;
    fn has_body(&self) -> bool;
    /// Whether an element with this id exists anywhere in the document.
    fn contains(&self, id: &str) -> bool;
    /// Add a `<style id=..>` to head, or to the root element when head does
    /// not exist yet.
    fn inject_style(&mut self, id: &str, css: &str);
    /// Returns false when there is no body to append to.
    fn append_to_body(&mut self, node: Node) -> bool;
    /// Returns false when nothing had this id.
    fn remove(&mut self, id: &str) -> bool;
    /// Returns false when the element is missing.
    fn set_text(&mut self, id: &str, text: &str) -> bool;
    /// Returns false when the element is missing.
    fn toggle_class(&mut self, id: &str, class: &str, on: bool) -> bool;
    /// Navigate without leaving a history entry behind.
    fn replace_location(&mut self, url: &str);
}
