//! Markup and styles for the warning overlay.

use indoc::indoc;

use crate::page::Node;

const CSS: &str = indoc! {"
    @keyframes focusguard-fade-in {
      from { opacity: 0; transform: scale(0.95); }
      to { opacity: 1; transform: scale(1); }
    }

    @keyframes focusguard-breathe {
      0%, 100% { transform: scale(1); }
      50% { transform: scale(1.05); }
    }

    .focusguard-overlay {
      position: fixed;
      inset: 0;
      background: linear-gradient(135deg, rgba(15, 23, 42, 0.95) 0%, rgba(30, 41, 59, 0.95) 100%);
      backdrop-filter: blur(12px);
      display: flex;
      justify-content: center;
      align-items: center;
      z-index: 9999;
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
      animation: focusguard-fade-in 0.3s ease-out;
    }

    .focusguard-card {
      background: linear-gradient(135deg, #ffffff 0%, #f8fafc 100%);
      padding: 48px 56px;
      border-radius: 24px;
      text-align: center;
      max-width: 480px;
      box-shadow: 0 20px 60px rgba(0, 0, 0, 0.3);
      position: relative;
      overflow: hidden;
    }

    .focusguard-accent {
      position: absolute;
      top: 0;
      left: 0;
      right: 0;
      height: 4px;
      background: linear-gradient(90deg, #3b82f6, #8b5cf6, #ec4899, #3b82f6);
    }

    .focusguard-icon {
      font-size: 64px;
      margin-bottom: 24px;
      animation: focusguard-breathe 2s ease-in-out infinite;
    }

    .focusguard-title {
      color: #dc2626;
      font-size: 28px;
      font-weight: 700;
      margin: 0 0 16px 0;
    }

    .focusguard-message {
      color: #475569;
      font-size: 16px;
      line-height: 1.6;
      margin: 0 0 32px 0;
    }

    .focusguard-countdown-container {
      background: linear-gradient(135deg, #f1f5f9 0%, #e2e8f0 100%);
      padding: 20px 28px;
      border-radius: 16px;
      display: inline-block;
    }

    .focusguard-countdown-text {
      color: #64748b;
      font-size: 14px;
      margin: 0;
    }

    .focusguard-countdown-number {
      color: #0c54fc;
      font-weight: 700;
      font-size: 18px;
      display: inline-block;
      min-width: 12px;
    }
"};

/// Build the overlay element. The countdown number lives in a span with
/// `countdown_id` so ticks can update it in place.
pub fn overlay_node(overlay_id: &str, countdown_id: &str, remaining: u32) -> Node {
    let countdown = Node::new("p")
        .with_class("focusguard-countdown-text")
        .with_child(Node::new("span").with_text("Redirecting in "))
        .with_child(
            Node::new("span")
                .with_id(countdown_id)
                .with_class("focusguard-countdown-number")
                .with_text(remaining.to_string()),
        )
        .with_child(Node::new("span").with_text(" seconds..."));

    let card = Node::new("div")
        .with_class("focusguard-card")
        .with_child(Node::new("div").with_class("focusguard-accent"))
        .with_child(Node::new("div").with_class("focusguard-icon").with_text("\u{26a0}\u{fe0f}"))
        .with_child(
            Node::new("h2")
                .with_class("focusguard-title")
                .with_text("YouTube Shorts Blocked"),
        )
        .with_child(
            Node::new("p")
                .with_class("focusguard-message")
                .with_text("You're being redirected away from YouTube Shorts to help you stay focused."),
        )
        .with_child(
            Node::new("div")
                .with_class("focusguard-countdown-container")
                .with_child(countdown),
        );

    Node::new("div")
        .with_id(overlay_id)
        .with_child(Node::new("style").with_text(CSS))
        .with_child(Node::new("div").with_class("focusguard-overlay").with_child(card))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_starts_at_remaining() {
        let node = overlay_node("warn", "count", 3);
        assert_eq!(node.id.as_deref(), Some("warn"));
        let count = node.find("count").unwrap();
        assert_eq!(count.text.as_deref(), Some("3"));
        assert!(node.text_content().contains("Redirecting in 3 seconds..."));
    }

    #[test]
    fn ids_appear_once() {
        let node = overlay_node("warn", "count", 3);
        assert_eq!(node.count_id("warn"), 1);
        assert_eq!(node.count_id("count"), 1);
    }
}
