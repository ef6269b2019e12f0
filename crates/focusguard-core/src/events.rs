use serde::{Deserialize, Serialize};

use crate::timers::{Fired, TimerId, TimerKind};

/// Runtime message from the background context to a tab.
///
/// Serialized as `{"action":"toggleStatsPanel"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Message {
    ToggleStatsPanel,
}

/// Everything the host can deliver to the content script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    DomContentLoaded,
    /// A child or subtree mutation under body.
    DomMutated,
    /// The page called `history.pushState`; the new address is already live.
    HistoryPushed,
    /// The page called `history.replaceState`; the new address is already live.
    HistoryReplaced,
    /// Back/forward navigation.
    PopState,
    Timer { id: TimerId, kind: TimerKind },
    Message { message: Message },
    PanelCloseClicked,
    PanelToggleClicked,
}

impl From<Fired> for HostEvent {
    fn from(fired: Fired) -> Self {
        HostEvent::Timer {
            id: fired.id,
            kind: fired.kind,
        }
    }
}

impl From<Message> for HostEvent {
    fn from(message: Message) -> Self {
        HostEvent::Message { message }
    }
}

/// Every observable change the content script makes produces an Event.
/// The simulator prints them as a timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    Initialized {
        enabled: bool,
    },
    /// Blocking stylesheet injected before the document finished parsing.
    EarlyBlock {
        href: String,
    },
    NavigationDetected {
        href: String,
        signal: crate::navigation::NavigationSignal,
    },
    BlockApplied {
        href: String,
    },
    BlockRemoved {
        href: String,
    },
    BlockRecorded {
        today: u64,
        total: u64,
    },
    /// Recording failed; see logs.
    BlockNotRecorded,
    OverlayShown {
        remaining: u32,
    },
    /// Overlay postponed until a body exists.
    OverlayDeferred,
    CountdownTick {
        remaining: u32,
    },
    OverlayRemoved,
    Redirected {
        url: String,
        reason: RedirectReason,
    },
    PanelOpened,
    PanelClosing,
    PanelClosed,
    EnabledChanged {
        enabled: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectReason {
    Countdown,
    Fallback,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_wire_format() {
        let value = serde_json::to_value(Message::ToggleStatsPanel).unwrap();
        assert_eq!(value, json!({"action": "toggleStatsPanel"}));

        let parsed: Message = serde_json::from_value(json!({"action": "toggleStatsPanel"})).unwrap();
        assert_eq!(parsed, Message::ToggleStatsPanel);
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(serde_json::from_value::<Message>(json!({"action": "openOptions"})).is_err());
    }

    #[test]
    fn events_are_tagged_by_type() {
        let value = serde_json::to_value(Event::Redirected {
            url: "https://www.youtube.com/".into(),
            reason: RedirectReason::Fallback,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"type": "Redirected", "url": "https://www.youtube.com/", "reason": "fallback"})
        );
    }
}
