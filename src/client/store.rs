use std::sync::Arc;
use std::sync::atomic::{ AtomicUsize, Ordering };
use log::debug;
use tokio::sync::watch;

use super::{ ChatBackend, ClientError };
use crate::models::chat::PromptMessage;
use crate::models::conversation::{ ConversationView, Message };

/// Sole owner of the client-side conversation.
///
/// State lives in a watch channel and is only changed through `send_modify`,
/// so overlapping sends each see a consistent list and every change wakes
/// subscribers. Overlapping sends are not serialized: each goes out on its
/// own and its reply is appended whenever it resolves.
pub struct ConversationStore {
    backend: Arc<dyn ChatBackend>,
    state: watch::Sender<ConversationView>,
    // Touched only inside `send_modify` closures.
    in_flight: AtomicUsize,
}

impl ConversationStore {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        let (state, _) = watch::channel(ConversationView::default());
        Self { backend, state, in_flight: AtomicUsize::new(0) }
    }

    pub fn snapshot(&self) -> ConversationView {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationView> {
        self.state.subscribe()
    }

    pub async fn send_message(&self, text: &str) -> Result<(), ClientError> {
        let content = text.trim();
        if content.is_empty() {
            return Err(ClientError::EmptyInput);
        }

        let mut history: Vec<PromptMessage> = Vec::new();
        self.state.send_modify(|view| {
            history = view.messages.iter().map(Message::to_prompt).collect();
            view.messages.push(Message::user(content));
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            view.is_loading = true;
            view.error = None;
        });
        debug!("Sending message with {} prior messages", history.len());

        // Settles the send even if this future is dropped or the backend panics.
        let mut pending = PendingSend { store: self, reply: None };
        match self.backend.send_message(content, &history).await {
            Ok(response) => {
                pending.reply = Some(Ok(Message::assistant(response.message)));
                Ok(())
            }
            Err(e) => {
                pending.reply = Some(Err(e.to_string()));
                Err(e)
            }
        }
    }

    pub fn clear(&self) {
        self.state.send_modify(|view| {
            view.messages.clear();
            view.error = None;
        });
    }
}

/// One outstanding send. Dropping it applies the reply, if any, and
/// releases its share of the loading state.
struct PendingSend<'a> {
    store: &'a ConversationStore,
    reply: Option<Result<Message, String>>,
}

impl Drop for PendingSend<'_> {
    fn drop(&mut self) {
        let reply = self.reply.take();
        let in_flight = &self.store.in_flight;
        self.store.state.send_modify(|view| {
            match reply {
                Some(Ok(message)) => view.messages.push(message),
                Some(Err(error)) => view.error = Some(error),
                None => {}
            }
            let remaining = in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
            view.is_loading = remaining > 0;
        });
    }
}
