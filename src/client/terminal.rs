use std::error::Error;
use std::sync::Arc;
use chrono::Local;
use log::{ info, warn };
use tokio::io::{ AsyncBufReadExt, BufReader };

use super::store::ConversationStore;
use super::ChatApi;
use crate::models::conversation::{ ConversationView, Message, Role };

const WELCOME: &str = "Welcome to ChatPad\nStart a conversation by typing a message below";
const HELP: &str = "Commands: /clear, /health, /quit";

/// Turns successive store snapshots into the lines that changed since the last one.
#[derive(Debug, Default)]
pub struct Renderer {
    shown: usize,
    first_id: Option<String>,
    loading: bool,
    error: Option<String>,
}

impl Renderer {
    pub fn update(&mut self, view: &ConversationView) -> Vec<String> {
        let mut lines = Vec::new();

        let first_id = view.messages.first().map(|m| m.id.clone());
        // Snapshots coalesce, so a clear may arrive already followed by new turns.
        if self.shown > 0 && (view.messages.len() < self.shown || first_id != self.first_id) {
            lines.push("Conversation cleared.".to_string());
            self.shown = 0;
        }
        self.first_id = first_id;
        for message in &view.messages[self.shown..] {
            lines.push(format_message(message));
        }
        self.shown = view.messages.len();

        if view.is_loading && !self.loading {
            lines.push("Thinking...".to_string());
        }
        self.loading = view.is_loading;

        if view.error != self.error {
            if let Some(err) = &view.error {
                lines.push(format!("Error: {}", err));
            }
            self.error = view.error.clone();
        }

        lines
    }
}

pub fn format_message(message: &Message) -> String {
    let who = match message.role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    };
    let at = message.timestamp.with_timezone(&Local).format("%H:%M:%S");
    format!("[{}] {}: {}", at, who, message.content)
}

/// Line-oriented chat over stdin/stdout. Input stays live while replies are pending.
pub struct TerminalChat {
    api: ChatApi,
    store: Arc<ConversationStore>,
}

impl TerminalChat {
    pub fn new(api: ChatApi) -> Self {
        let store = Arc::new(ConversationStore::new(Arc::new(api.clone())));
        Self { api, store }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        println!("{}\n{}\n", WELCOME, HELP);

        let mut rx = self.store.subscribe();
        let render_task = tokio::spawn(async move {
            let mut renderer = Renderer::default();
            while rx.changed().await.is_ok() {
                let view = rx.borrow_and_update().clone();
                for line in renderer.update(&view) {
                    println!("{}", line);
                }
            }
        });

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let input = line.trim();
            match input {
                "" => continue,
                "/quit" | "/exit" => break,
                "/clear" => self.store.clear(),
                "/health" => match self.api.health_check().await {
                    Ok(health) => println!("Server status: {} at {}", health.status, health.timestamp),
                    Err(e) => println!("Health check failed: {}", e),
                },
                _ => {
                    let store = Arc::clone(&self.store);
                    let text = input.to_string();
                    tokio::spawn(async move {
                        if let Err(e) = store.send_message(&text).await {
                            warn!("Error sending message: {}", e);
                        }
                    });
                }
            }
        }

        info!("Leaving chat");
        render_task.abort();
        Ok(())
    }
}
