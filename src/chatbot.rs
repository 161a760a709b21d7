use tracing::error;

use crate::config::Config;
use crate::groqclient::{CompletionApi, CompletionError, GroqClient};
use crate::message::Message;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const UNINITIALIZED_ERROR: &str = "Error: Groq client is not initialized.";

/// A single growing conversation and the logic to turn each user message
/// into a completion request.
///
/// The transcript always starts with the system prompt and then alternates
/// user/assistant entries. A failed turn is popped back off so the model
/// never sees it on later calls. Callers must not overlap `send` calls; the
/// UI serializes them by allowing one in-flight request at a time.
pub struct Chatbot<A = GroqClient> {
    api: Option<A>,
    model: String,
    history: Vec<Message>,
}

impl Chatbot<GroqClient> {
    /// Builds the chatbot against the real Groq backend. A failed backend
    /// construction leaves the chatbot usable but permanently errored:
    /// every `send` returns [`UNINITIALIZED_ERROR`].
    pub fn new(config: &Config) -> Self {
        let api = match GroqClient::new(config) {
            Ok(client) => Some(client),
            Err(err) => {
                error!("failed to initialize Groq client: {err}");
                None
            }
        };
        Self::with_api(api, config.model.clone())
    }
}

impl<A: CompletionApi> Chatbot<A> {
    pub fn with_api(api: Option<A>, model: String) -> Self {
        Self {
            api,
            model,
            history: vec![Message::system(SYSTEM_PROMPT)],
        }
    }

    pub fn is_ready(&self) -> bool {
        self.api.is_some()
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Drops everything but the seed system message.
    pub fn reset(&mut self) {
        self.history.truncate(1);
    }

    /// Sends one user turn and returns the text to display: the assistant
    /// reply on success, a human-readable error description otherwise.
    /// Failures never propagate past this method.
    pub async fn send(&mut self, text: &str) -> String {
        let Some(api) = &self.api else {
            return UNINITIALIZED_ERROR.to_string();
        };

        self.history.push(Message::user(text));

        match api.complete(&self.history, &self.model).await {
            Ok(reply) => {
                self.history.push(Message::assistant(reply.clone()));
                reply
            }
            Err(err) => {
                // Roll the failed turn back so it is not replayed later.
                self.history.pop();
                error!("completion failed: {err}");
                describe_failure(&err)
            }
        }
    }
}

fn describe_failure(err: &CompletionError) -> String {
    match err {
        CompletionError::Auth(detail) => format!(
            "Authentication Error: Invalid API key. Please check your key.\nDetails: {detail}"
        ),
        CompletionError::Connection(detail) => format!(
            "Connection Error: Could not connect to the API. Please check your network.\nDetails: {detail}"
        ),
        CompletionError::Other(detail) => format!("An unexpected error occurred: {detail}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::message::Role;

    /// Scripted stand-in for the remote service. Pops one prepared outcome
    /// per call and records the transcript it was handed.
    struct StubApi {
        script: Mutex<VecDeque<Result<String, CompletionError>>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl StubApi {
        fn scripted(outcomes: Vec<Result<String, CompletionError>>) -> Self {
            Self {
                script: Mutex::new(outcomes.into()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionApi for StubApi {
        async fn complete(
            &self,
            messages: &[Message],
            _model: &str,
        ) -> Result<String, CompletionError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .expect("stub called more times than scripted")
        }
    }

    fn chatbot_with(outcomes: Vec<Result<String, CompletionError>>) -> Chatbot<StubApi> {
        Chatbot::with_api(Some(StubApi::scripted(outcomes)), "test-model".to_string())
    }

    fn roles(chatbot: &Chatbot<StubApi>) -> Vec<Role> {
        chatbot.history().iter().map(|m| m.role).collect()
    }

    #[tokio::test]
    async fn successful_send_appends_user_and_assistant_turns() {
        let mut chatbot = chatbot_with(vec![Ok("Hi there!".to_string())]);

        let reply = chatbot.send("Hello").await;

        assert_eq!(reply, "Hi there!");
        assert_eq!(chatbot.history().len(), 3);
        assert_eq!(chatbot.history()[0].content, SYSTEM_PROMPT);
        assert_eq!(chatbot.history()[1].role, Role::User);
        assert_eq!(chatbot.history()[1].content, "Hello");
        assert_eq!(chatbot.history()[2].role, Role::Assistant);
        assert_eq!(chatbot.history()[2].content, "Hi there!");
    }

    #[tokio::test]
    async fn two_successful_sends_alternate_roles() {
        let mut chatbot = chatbot_with(vec![
            Ok("first".to_string()),
            Ok("second".to_string()),
        ]);

        chatbot.send("one").await;
        chatbot.send("two").await;

        assert_eq!(chatbot.history().len(), 5);
        assert_eq!(
            roles(&chatbot),
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant,
            ]
        );
    }

    #[tokio::test]
    async fn transcript_grows_by_two_per_successful_send() {
        let replies = (0..4).map(|i| Ok(format!("reply {i}"))).collect();
        let mut chatbot = chatbot_with(replies);

        for i in 0..4 {
            chatbot.send(&format!("message {i}")).await;
            assert_eq!(chatbot.history().len(), 1 + 2 * (i + 1));
        }
    }

    #[tokio::test]
    async fn each_call_receives_the_full_accumulated_transcript() {
        let mut chatbot = chatbot_with(vec![
            Ok("first".to_string()),
            Ok("second".to_string()),
        ]);

        chatbot.send("one").await;
        chatbot.send("two").await;

        let api = chatbot.api.as_ref().unwrap();
        let seen = api.seen.lock().unwrap();
        assert_eq!(seen[0].len(), 2);
        assert_eq!(seen[1].len(), 4);
        assert_eq!(seen[1][2].content, "first");
    }

    #[tokio::test]
    async fn auth_failure_rolls_back_and_names_the_category() {
        let mut chatbot = chatbot_with(vec![Err(CompletionError::Auth(
            "401 unauthorized".to_string(),
        ))]);

        let reply = chatbot.send("Hello").await;

        assert!(reply.contains("Authentication Error"));
        assert!(!reply.contains("Connection Error"));
        assert_eq!(chatbot.history().len(), 1);
    }

    #[tokio::test]
    async fn connection_failure_rolls_back_and_names_the_category() {
        let mut chatbot = chatbot_with(vec![Err(CompletionError::Connection(
            "connection refused".to_string(),
        ))]);

        let reply = chatbot.send("Hello").await;

        assert!(reply.contains("Connection Error"));
        assert!(!reply.contains("Authentication Error"));
        assert_eq!(chatbot.history().len(), 1);
    }

    #[tokio::test]
    async fn unclassified_failure_rolls_back() {
        let mut chatbot = chatbot_with(vec![Err(CompletionError::Other(
            "500 internal server error".to_string(),
        ))]);

        let reply = chatbot.send("Hello").await;

        assert!(reply.contains("An unexpected error occurred"));
        assert_eq!(chatbot.history().len(), 1);
    }

    #[tokio::test]
    async fn failed_turn_is_not_replayed_on_the_next_call() {
        let mut chatbot = chatbot_with(vec![
            Err(CompletionError::Connection("offline".to_string())),
            Ok("welcome back".to_string()),
        ]);

        chatbot.send("lost turn").await;
        chatbot.send("second try").await;

        let api = chatbot.api.as_ref().unwrap();
        let seen = api.seen.lock().unwrap();
        // The second request holds only the seed and the new user message.
        assert_eq!(seen[1].len(), 2);
        assert_eq!(seen[1][1].content, "second try");
    }

    #[tokio::test]
    async fn uninitialized_client_returns_fixed_error_without_mutation() {
        let mut chatbot: Chatbot<StubApi> = Chatbot::with_api(None, "test-model".to_string());

        let reply = chatbot.send("Hello").await;

        assert_eq!(reply, UNINITIALIZED_ERROR);
        assert_eq!(chatbot.history().len(), 1);
        assert_eq!(chatbot.history()[0].role, Role::System);
        assert!(!chatbot.is_ready());
    }

    #[tokio::test]
    async fn reset_keeps_only_the_seed_message() {
        let mut chatbot = chatbot_with(vec![Ok("Hi there!".to_string())]);

        chatbot.send("Hello").await;
        chatbot.reset();

        assert_eq!(chatbot.history().len(), 1);
        assert_eq!(chatbot.history()[0].role, Role::System);
    }
}
