//! crates/vet_chatbot_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any storage or wire format; the
//! service's adapters own serialization.

use uuid::Uuid;

/// The speaker of one conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// The lowercase name used by both the persisted store and the
    /// completion wire format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parses the lowercase role name back into a `Role`.
    pub fn parse(name: &str) -> Option<Role> {
        match name {
            "system" => Some(Role::System),
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// One turn in a conversation.
///
/// Ordering is append-only and significant: the sequence is replayed in
/// original order on every completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A transcript stored under its session identifier.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub session_id: Uuid,
    pub messages: Vec<Message>,
}

/// How many characters of the first user message make up a sidebar title.
const TITLE_CHARS: usize = 30;

impl Conversation {
    /// The sidebar label for this conversation: the first user message cut
    /// to `TITLE_CHARS` characters with a trailing ellipsis, or a label
    /// derived from the identifier when no user message exists.
    pub fn title(&self) -> String {
        match self.messages.iter().find(|m| m.role == Role::User) {
            Some(first_user) => {
                let head: String = first_user.content.chars().take(TITLE_CHARS).collect();
                format!("{}...", head)
            }
            None => {
                let id = self.session_id.to_string();
                format!("Conversation {}", &id[..8])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(messages: Vec<Message>) -> Conversation {
        Conversation {
            session_id: Uuid::new_v4(),
            messages,
        }
    }

    #[test]
    fn title_truncates_long_first_user_message() {
        let convo = conversation(vec![Message::user(
            "My dog has been scratching his left ear since Tuesday morning",
        )]);
        assert_eq!(convo.title(), "My dog has been scratching his...");
    }

    #[test]
    fn title_keeps_short_messages_whole() {
        let convo = conversation(vec![Message::user("Fluffy vomited")]);
        assert_eq!(convo.title(), "Fluffy vomited...");
    }

    #[test]
    fn title_counts_characters_not_bytes() {
        // 31 two-byte characters; a byte-based cut would split one in half.
        let content: String = std::iter::repeat('é').take(31).collect();
        let convo = conversation(vec![Message::user(content)]);
        let expected: String = std::iter::repeat('é').take(30).collect();
        assert_eq!(convo.title(), format!("{}...", expected));
    }

    #[test]
    fn title_skips_leading_assistant_messages() {
        let convo = conversation(vec![
            Message::assistant("Bonjour !"),
            Message::user("Question about cat food"),
        ]);
        assert_eq!(convo.title(), "Question about cat food...");
    }

    #[test]
    fn title_falls_back_to_identifier() {
        let convo = conversation(vec![Message::assistant("Bonjour !")]);
        let id = convo.session_id.to_string();
        assert_eq!(convo.title(), format!("Conversation {}", &id[..8]));
    }

    #[test]
    fn role_names_round_trip() {
        for role in [Role::System, Role::User, Role::Assistant] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("moderator"), None);
    }
}
