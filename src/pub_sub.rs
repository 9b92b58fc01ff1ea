use std::collections::HashMap;

use tokio::sync::mpsc::UnboundedSender;

use crate::glob::GlobPattern;

/// Notifications delivered to a client handle, once per triggering event.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Connect,
    Ready,
    Subscribe { channel: String, count: usize },
    Unsubscribe { channel: String, count: usize },
    PSubscribe { pattern: String, count: usize },
    PUnsubscribe { pattern: String, count: usize },
    Message { channel: String, message: String },
    PMessage {
        pattern: String,
        channel: String,
        message: String,
    },
}

#[derive(Debug)]
struct Subscriber {
    sender: UnboundedSender<ClientEvent>,
    channels: Vec<String>,
    patterns: Vec<GlobPattern>,
}

impl Subscriber {
    fn count(&self) -> usize {
        self.channels.len() + self.patterns.len()
    }
}

/// Channel and pattern subscriptions, keyed by client id.
///
/// Channels live in their own namespace and never touch the key space.
#[derive(Debug, Default)]
pub struct PubSub {
    subscribers: HashMap<u64, Subscriber>,
}

impl PubSub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscription_count(&self, client_id: u64) -> usize {
        self.subscribers
            .get(&client_id)
            .map_or(0, Subscriber::count)
    }

    pub fn is_subscribed(&self, client_id: u64) -> bool {
        self.subscription_count(client_id) > 0
    }

    fn subscriber(
        &mut self,
        client_id: u64,
        sender: &UnboundedSender<ClientEvent>,
    ) -> &mut Subscriber {
        self.subscribers
            .entry(client_id)
            .or_insert_with(|| Subscriber {
                sender: sender.clone(),
                channels: Vec::new(),
                patterns: Vec::new(),
            })
    }

    fn drop_if_idle(&mut self, client_id: u64) {
        if self.subscription_count(client_id) == 0 {
            self.subscribers.remove(&client_id);
        }
    }

    /// Returns the client's subscription count afterwards.
    pub fn subscribe(
        &mut self,
        client_id: u64,
        sender: &UnboundedSender<ClientEvent>,
        channel: &str,
    ) -> usize {
        let subscriber = self.subscriber(client_id, sender);

        if !subscriber.channels.iter().any(|c| c == channel) {
            subscriber.channels.push(channel.to_string());
        }

        subscriber.count()
    }

    pub fn psubscribe(
        &mut self,
        client_id: u64,
        sender: &UnboundedSender<ClientEvent>,
        pattern: &str,
    ) -> usize {
        let subscriber = self.subscriber(client_id, sender);

        if !subscriber.patterns.iter().any(|p| p.as_str() == pattern) {
            subscriber.patterns.push(GlobPattern::new(pattern));
        }

        subscriber.count()
    }

    pub fn unsubscribe(&mut self, client_id: u64, channel: &str) -> usize {
        if let Some(subscriber) = self.subscribers.get_mut(&client_id) {
            subscriber.channels.retain(|c| c != channel);
        }

        let count = self.subscription_count(client_id);
        self.drop_if_idle(client_id);

        count
    }

    pub fn punsubscribe(&mut self, client_id: u64, pattern: &str) -> usize {
        if let Some(subscriber) = self.subscribers.get_mut(&client_id) {
            subscriber.patterns.retain(|p| p.as_str() != pattern);
        }

        let count = self.subscription_count(client_id);
        self.drop_if_idle(client_id);

        count
    }

    pub fn channels(&self, client_id: u64) -> Vec<String> {
        self.subscribers
            .get(&client_id)
            .map(|subscriber| subscriber.channels.clone())
            .unwrap_or_default()
    }

    pub fn patterns(&self, client_id: u64) -> Vec<String> {
        self.subscribers
            .get(&client_id)
            .map(|subscriber| {
                subscriber
                    .patterns
                    .iter()
                    .map(|p| p.as_str().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn remove_client(&mut self, client_id: u64) {
        self.subscribers.remove(&client_id);
    }

    /// Delivers `message` and returns how many notifications were sent.
    pub fn publish(&self, channel: &str, message: &str) -> usize {
        let mut receivers = 0;

        for subscriber in self.subscribers.values() {
            if subscriber.channels.iter().any(|c| c == channel) {
                let event = ClientEvent::Message {
                    channel: channel.to_string(),
                    message: message.to_string(),
                };
                if subscriber.sender.send(event).is_ok() {
                    receivers += 1;
                }
            }

            for pattern in subscriber.patterns.iter().filter(|p| p.is_match(channel)) {
                let event = ClientEvent::PMessage {
                    pattern: pattern.as_str().to_string(),
                    channel: channel.to_string(),
                    message: message.to_string(),
                };
                if subscriber.sender.send(event).is_ok() {
                    receivers += 1;
                }
            }
        }

        tracing::debug!(channel, receivers, "published message");
        receivers
    }
}
