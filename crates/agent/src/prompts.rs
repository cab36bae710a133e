//! Channel-specific instruction templates wrapped around the caller's prompt.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Email { formal: bool },
    Slack,
    LinkedIn,
    WhatsApp,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email { .. } => "email",
            Self::Slack => "slack",
            Self::LinkedIn => "linkedin",
            Self::WhatsApp => "whatsapp",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn email_tone(formal: bool) -> &'static str {
    if formal {
        "formal and professional"
    } else {
        "friendly and conversational"
    }
}

pub fn render(channel: Channel, instruction: &str) -> String {
    match channel {
        Channel::Email { formal } => {
            let tone = email_tone(formal);
            format!(
                "Create a {tone} email message based on this instruction:\n\
                 \"{instruction}\"\n\n\
                 The email should be:\n\
                 - Clear and concise\n\
                 - {tone} in tone\n\
                 - Include appropriate greeting and sign-off\n\
                 - Include any important details mentioned in the instruction\n\
                 - Well-structured with paragraphs as needed\n\n\
                 Return only the email body text, nothing else."
            )
        }
        Channel::Slack => format!(
            "Create a professional and friendly Slack message based on this instruction:\n\
             \"{instruction}\"\n\n\
             The message should be:\n\
             - Clear and concise\n\
             - Professional but conversational in tone\n\
             - Include any important details mentioned in the instruction\n\
             - Formatted appropriately for Slack (can include emojis if suitable)\n\n\
             Return only the message text, nothing else."
        ),
        Channel::LinkedIn => format!(
            "Create a professional LinkedIn message based on the following prompt:\n\n\
             {instruction}\n\n\
             The message should be:\n\
             1. Professional and appropriate for LinkedIn\n\
             2. Concise (under 300 characters for connection requests, under 1000 for messages)\n\
             3. Personalized and engaging\n\
             4. Free of hashtags unless specifically requested\n\
             5. Include a clear call to action when appropriate\n\n\
             Message:"
        ),
        Channel::WhatsApp => format!(
            "Create a professional WhatsApp message based on this instruction:\n\
             \"{instruction}\"\n\n\
             The message should be:\n\
             - Clear and concise\n\
             - Professional in tone\n\
             - Well-structured with paragraphs as needed\n\
             - Appropriate for WhatsApp (not too formal, but still professional)\n\
             - Include any important details mentioned in the instruction\n\n\
             Return only the message text, nothing else."
        ),
    }
}
