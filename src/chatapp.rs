use std::sync::{Arc, Mutex};

use eframe::egui;
use poll_promise::Promise;
use tokio::runtime::Runtime;
use tracing::info;

use crate::chatbot::Chatbot;
use crate::config::Config;
use crate::message::Role;

const WELCOME_TEXT: &str = "Welcome to Groq Chat! You can start chatting now.";

/// One rendered line of the conversation. Kept separate from the chatbot's
/// transcript: error replies show up here as ordinary assistant text but are
/// rolled out of the transcript itself.
pub struct ChatEntry {
    pub role: Role,
    pub content: String,
}

impl ChatEntry {
    fn notice(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

pub struct ChatApp {
    pub chatbot: Arc<Mutex<Chatbot>>,
    pub model: String,
    pub input: String,
    pub entries: Vec<ChatEntry>,
    pub pending_reply: Option<Promise<String>>,
}

impl ChatApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: Config) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let chatbot = Chatbot::new(&config);
        let mut entries = Vec::new();
        if chatbot.is_ready() {
            info!("chat client ready, model {}", config.model);
            entries.push(ChatEntry::notice(WELCOME_TEXT));
        } else {
            entries.push(ChatEntry::notice(
                "Failed to initialize the Groq client. Is the API key valid?",
            ));
        }

        Self {
            chatbot: Arc::new(Mutex::new(chatbot)),
            model: config.model,
            input: String::new(),
            entries,
            pending_reply: None,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.pending_reply.is_some()
    }

    /// Kicks off one user turn: append the message to the view, then run the
    /// blocking send on a worker thread so the UI keeps painting. Re-entry is
    /// ignored while a reply is pending.
    pub fn send_message(&mut self) {
        if self.input.trim().is_empty() || self.pending_reply.is_some() {
            return;
        }

        let prompt = std::mem::take(&mut self.input);
        self.entries.push(ChatEntry::user(prompt.clone()));

        let chatbot = Arc::clone(&self.chatbot);
        self.pending_reply = Some(Promise::spawn_thread("chat_reply".to_string(), move || {
            let rt = Runtime::new().expect("failed to create Tokio runtime");
            rt.block_on(async move { chatbot.lock().unwrap().send(&prompt).await })
        }));
    }

    /// Polled every frame: when the worker thread resolves, its text (reply
    /// or error description, the UI does not care which) becomes the next
    /// assistant entry and input unlocks again.
    pub fn poll_pending_reply(&mut self, ctx: &egui::Context) {
        if let Some(promise) = &self.pending_reply {
            if let Some(reply) = promise.ready() {
                self.entries.push(ChatEntry::assistant(reply.clone()));
                self.pending_reply = None;
                ctx.request_repaint();
            }
        }
    }

    pub fn clear_chat(&mut self) {
        if self.pending_reply.is_some() {
            return;
        }
        self.chatbot.lock().unwrap().reset();
        self.entries.clear();
        self.entries.push(ChatEntry::notice(WELCOME_TEXT));
        self.input.clear();
    }
}
