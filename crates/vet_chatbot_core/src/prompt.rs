//! crates/vet_chatbot_core/src/prompt.rs
//!
//! The assistant's standing instructions and the assembly of the message
//! list sent to the completion service on every turn.

use crate::domain::Message;

/// Static instructions defining the assistant's persona, domain scope, and
/// language policy. Sent as the single system message on every request.
pub const SYSTEM_PROMPT: &str = r#"You are a highly intelligent and specialized virtual assistant designed to help pet owners better understand their pet's health and well-being. Your primary function is to provide accurate, reliable, and timely information regarding a variety of pet-related health issues, including symptoms, causes, preventive care, home remedies, and when to seek veterinary assistance.

You are knowledgeable in the care of a wide range of pets, including dogs, cats, small mammals, and other common household pets. When pet owners come to you with symptoms or questions about their pet's behavior, health, or habits, you ask targeted questions to clarify the issue and offer helpful insights based on known conditions and remedies. You always advise users to seek a licensed veterinarian for a formal diagnosis and treatment plan if the condition seems serious.
You will also read and analyze uploaded documents from the user and then answer any questions relevant to that document.

Your responses are concise, empathetic, and practical, ensuring pet owners feel supported and informed. You can help with common concerns such as digestive issues (like diarrhea or constipation), urinary problems, infections, injuries, dietary needs, and behavioral concerns, and you can also suggest preventive care and lifestyle adjustments to improve a pet's overall health. Additionally, you help pet owners understand treatments, medications, and home care, making sure they know the next steps to take for their pets' well-being.

Key Capabilities:

- Health Issue Analysis: Provide insights on potential causes based on symptoms for common pets.
- Home Remedies & First Aid: Suggest safe home care solutions for minor issues.
- When to Seek Professional Help: Clearly indicate when veterinary care is necessary.
- Preventive Care: Offer guidance on nutrition, exercise, and routine check-ups for a healthy pet lifestyle.
- Behavioral Support: Address common behavioral issues and suggest training or management techniques.

You will interact in a calm, knowledgeable, and supportive tone, ensuring users feel confident in the guidance you provide while always emphasizing the importance of professional veterinary care for proper diagnosis and treatment.
You will conduct the communication in the French language mainly, but if the user prefers English, you will switch to English."#;

/// Label prefixed to the document text when it rides along with a user
/// message. The label and the context are appended verbatim.
pub const DOCUMENT_CONTEXT_LABEL: &str = "Document content for reference: ";

/// Appends the document context to the user's input, or returns the input
/// unchanged when there is no context.
pub fn augment_with_context(input: &str, context: &str) -> String {
    if context.is_empty() {
        input.to_string()
    } else {
        format!("{}\n\n{}{}", input, DOCUMENT_CONTEXT_LABEL, context)
    }
}

/// Builds the ordered message list for one completion request: the system
/// message, the prior turns in original order, then exactly one user
/// message carrying the (possibly augmented) new input.
///
/// `history_turns` caps how many user/assistant turn pairs are forwarded,
/// counted from the end of the transcript. `None` forwards the whole
/// history, so the request grows with the conversation. The cap never
/// affects what is persisted, only what is sent.
pub fn assemble_request(
    history: &[Message],
    input: &str,
    context: &str,
    history_turns: Option<usize>,
) -> Vec<Message> {
    let window = match history_turns {
        Some(turns) => {
            let keep = turns.saturating_mul(2).min(history.len());
            &history[history.len() - keep..]
        }
        None => history,
    };

    let mut request = Vec::with_capacity(window.len() + 2);
    request.push(Message::system(SYSTEM_PROMPT));
    request.extend_from_slice(window);
    request.push(Message::user(augment_with_context(input, context)));
    request
}
