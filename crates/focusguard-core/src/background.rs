//! Background context: the toolbar icon handler.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::MessageError;
use crate::events::Message;

/// Delivery of runtime messages to the content script of a tab.
#[allow(async_fn_in_trait)]
pub trait TabMessenger {
    async fn send_message(&self, tab_id: u32, message: Message) -> Result<(), MessageError>;
}

/// The toolbar icon was clicked in `tab_id`: ask that tab to toggle its
/// stats panel. A tab without a content script yet is not an error.
pub async fn on_action_clicked<M: TabMessenger>(messenger: &M, tab_id: u32) {
    match messenger.send_message(tab_id, Message::ToggleStatsPanel).await {
        Ok(()) => debug!(tab_id, "toggleStatsPanel sent"),
        Err(e) => info!(tab_id, error = %e, "content script not ready"),
    }
}

/// In-process messenger with one channel per registered tab.
#[derive(Debug, Default)]
pub struct ChannelMessenger {
    tabs: HashMap<u32, mpsc::UnboundedSender<Message>>,
}

impl ChannelMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tab and return the receiving end its content script
    /// listens on. Registering the same tab again replaces the old channel.
    pub fn connect(&mut self, tab_id: u32) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.tabs.insert(tab_id, tx);
        rx
    }

    pub fn disconnect(&mut self, tab_id: u32) {
        self.tabs.remove(&tab_id);
    }
}

impl TabMessenger for ChannelMessenger {
    async fn send_message(&self, tab_id: u32, message: Message) -> Result<(), MessageError> {
        let tx = self.tabs.get(&tab_id).ok_or(MessageError::NoReceiver(tab_id))?;
        tx.send(message).map_err(|_| MessageError::NoReceiver(tab_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn click_reaches_the_tab() {
        let mut messenger = ChannelMessenger::new();
        let mut rx = messenger.connect(7);

        on_action_clicked(&messenger, 7).await;
        assert_eq!(rx.recv().await, Some(Message::ToggleStatsPanel));
    }

    #[tokio::test]
    async fn unknown_tab_is_swallowed() {
        let messenger = ChannelMessenger::new();
        on_action_clicked(&messenger, 3).await;
        assert!(matches!(
            messenger.send_message(3, Message::ToggleStatsPanel).await,
            Err(MessageError::NoReceiver(3))
        ));
    }

    #[tokio::test]
    async fn closed_receiver_is_an_error() {
        let mut messenger = ChannelMessenger::new();
        drop(messenger.connect(1));
        assert!(messenger.send_message(1, Message::ToggleStatsPanel).await.is_err());

        messenger.connect(1);
        messenger.disconnect(1);
        assert!(messenger.send_message(1, Message::ToggleStatsPanel).await.is_err());
    }
}
