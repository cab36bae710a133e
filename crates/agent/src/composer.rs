use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use crate::llm::{LlmClient, LlmError};
use crate::prompts::{self, Channel};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("content prompt must not be empty")]
    EmptyInstruction,
    #[error("Error generating email: {0}")]
    Email(LlmError),
    #[error("Error generating message: {0}")]
    Message(LlmError),
    #[error("Failed to generate message content")]
    NoContent,
}

/// Turns a caller instruction into channel-ready text via the configured model.
#[derive(Clone)]
pub struct MessageComposer {
    llm: Arc<dyn LlmClient>,
}

impl MessageComposer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    pub async fn compose_email(&self, instruction: &str, formal: bool) -> Result<String, ComposeError> {
        self.compose(Channel::Email { formal }, instruction).await.map_err(|err| match err {
            ComposeError::Message(inner) => ComposeError::Email(inner),
            other => other,
        })
    }

    pub async fn compose_slack(&self, instruction: &str) -> Result<String, ComposeError> {
        self.compose(Channel::Slack, instruction).await
    }

    /// LinkedIn text is trimmed; a blank model reply counts as a failure.
    pub async fn compose_linkedin(&self, instruction: &str) -> Result<String, ComposeError> {
        let text = self.compose(Channel::LinkedIn, instruction).await?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            error!(event_name = "composer.empty_output", channel = "linkedin", "model returned blank text");
            return Err(ComposeError::NoContent);
        }
        Ok(trimmed.to_string())
    }

    pub async fn compose_whatsapp(&self, instruction: &str) -> Result<String, ComposeError> {
        self.compose(Channel::WhatsApp, instruction).await
    }

    async fn compose(&self, channel: Channel, instruction: &str) -> Result<String, ComposeError> {
        if instruction.trim().is_empty() {
            return Err(ComposeError::EmptyInstruction);
        }

        let prompt = prompts::render(channel, instruction);
        match self.llm.complete(&prompt).await {
            Ok(text) => {
                info!(
                    event_name = "composer.generated",
                    channel = %channel,
                    chars = text.chars().count(),
                    "generated message content"
                );
                Ok(text)
            }
            Err(err) => {
                error!(event_name = "composer.failed", channel = %channel, error = %err, "generation failed");
                Err(ComposeError::Message(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::{ComposeError, MessageComposer};
    use crate::llm::{LlmClient, LlmError};

    struct ScriptedLlm {
        reply: Result<String, LlmError>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn replying(reply: Result<String, LlmError>) -> Arc<Self> {
            Arc::new(Self { reply, prompts: Mutex::new(Vec::new()) })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().expect("prompt log lock").clone()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().expect("prompt log lock").push(prompt.to_string());
            self.reply.clone()
        }

        async fn list_models(&self) -> Result<Vec<String>, LlmError> {
            Ok(vec!["models/test".to_string()])
        }
    }

    #[tokio::test]
    async fn email_uses_requested_tone() {
        let llm = ScriptedLlm::replying(Ok("Dear team,\n\nSee you Friday.".to_string()));
        let composer = MessageComposer::new(llm.clone());

        let text = composer.compose_email("Remind the team about Friday", false).await.expect("composes");

        assert_eq!(text, "Dear team,\n\nSee you Friday.");
        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("friendly and conversational"));
        assert!(prompts[0].contains("Remind the team about Friday"));
    }

    #[tokio::test]
    async fn blank_instruction_never_reaches_the_model() {
        let llm = ScriptedLlm::replying(Ok("unused".to_string()));
        let composer = MessageComposer::new(llm.clone());

        let error = composer.compose_slack("   ").await.expect_err("blank instruction rejected");

        assert_eq!(error, ComposeError::EmptyInstruction);
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn failures_are_labelled_per_channel() {
        let failing = ScriptedLlm::replying(Err(LlmError::Api { status: 400, body: "API key not valid".into() }));
        let composer = MessageComposer::new(failing);

        let email = composer.compose_email("Hi", true).await.expect_err("email fails");
        assert!(email.to_string().starts_with("Error generating email: "));
        assert!(email.to_string().contains("API key not valid"));

        let slack = composer.compose_slack("Hi").await.expect_err("slack fails");
        assert!(slack.to_string().starts_with("Error generating message: "));
    }

    #[tokio::test]
    async fn linkedin_output_is_trimmed_and_must_not_be_blank() {
        let composer = MessageComposer::new(ScriptedLlm::replying(Ok("  Hi Sam, let's connect.\n".to_string())));
        assert_eq!(composer.compose_linkedin("Connect with Sam").await.as_deref(), Ok("Hi Sam, let's connect."));

        let blank = MessageComposer::new(ScriptedLlm::replying(Ok(" \n ".to_string())));
        let error = blank.compose_linkedin("Connect with Sam").await.expect_err("blank output fails");
        assert_eq!(error.to_string(), "Failed to generate message content");
    }
}
