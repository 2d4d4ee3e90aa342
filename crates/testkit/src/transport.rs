use demoreel_core::NetMessage;
use demoreel_net::Transport;
use std::collections::VecDeque;
use std::io;

/// A [`Transport`] that replays a fixed queue of receive results.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    queue: VecDeque<io::Result<NetMessage>>,
    polls: usize,
}

impl ScriptedTransport {
    /// Queue `messages` for delivery in order.
    pub fn new(messages: impl IntoIterator<Item = NetMessage>) -> Self {
        Self {
            queue: messages.into_iter().map(Ok).collect(),
            polls: 0,
        }
    }

    /// Append a message.
    pub fn push(&mut self, message: NetMessage) {
        self.queue.push_back(Ok(message));
    }

    /// Append a receive failure.
    pub fn push_error(&mut self, error: io::Error) {
        self.queue.push_back(Err(error));
    }

    /// Results not yet consumed.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Number of `try_recv` calls so far.
    pub fn polls(&self) -> usize {
        self.polls
    }
}

impl Transport for ScriptedTransport {
    fn try_recv(&mut self) -> io::Result<Option<NetMessage>> {
        self.polls += 1;
        self.queue.pop_front().transpose()
    }
}
