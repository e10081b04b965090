//! Context assembly for the generative model.
//!
//! Builds the bounded, ordered dialogue for one chat turn: a synthetic
//! persona-priming exchange followed by the most recent transcript window.
//! The model has no system-instruction channel here, so the instruction
//! rides in a `user` turn and a scripted `model` acknowledgement primes the
//! persona before any real history.

use ll_domain::dialogue::DialogueTurn;
use ll_domain::model::{Diagnosis, Message, Sender};

/// Build the dialogue for one generation call.
///
/// Pure function of persisted state: `[instruction, acknowledgement]`
/// followed by at most `history_limit` transcript messages in chronological
/// order (the oldest beyond the window fall out — accepted tradeoff, the
/// priming pair restates the diagnosis and advice). Output is therefore
/// never longer than `history_limit + 2` turns.
pub fn build_dialogue(
    assistant_name: &str,
    diagnosis: &Diagnosis,
    messages: &[Message],
    history_limit: usize,
) -> Vec<DialogueTurn> {
    let mut turns = Vec::with_capacity(history_limit + 2);

    turns.push(DialogueTurn::user(persona_instruction(
        assistant_name,
        diagnosis,
    )));
    turns.push(DialogueTurn::model(persona_acknowledgement(
        assistant_name,
        diagnosis,
    )));

    let start = messages.len().saturating_sub(history_limit);
    for message in &messages[start..] {
        let turn = match message.sender {
            Sender::User => DialogueTurn::user(message.content.clone()),
            Sender::Assistant => DialogueTurn::model(message.content.clone()),
        };
        turns.push(turn);
    }

    turns
}

fn persona_instruction(assistant_name: &str, diagnosis: &Diagnosis) -> String {
    format!(
        "You are {name}, a helpful assistant focused on plant health. The user is \
         asking about a crop diagnosed with {disease}. Provide advice, answer \
         questions about symptoms, treatment, and prevention related specifically \
         to {disease}. Keep responses concise and practical for a farmer or \
         gardener. The initial advice given was: \"{advice}\". Use the provided \
         chat history for context, and decline to answer user messages that are \
         not related to agriculture or plant health at all.",
        name = assistant_name,
        disease = diagnosis.disease,
        advice = diagnosis.advice,
    )
}

fn persona_acknowledgement(assistant_name: &str, diagnosis: &Diagnosis) -> String {
    format!(
        "Understood. I will act as {name} and provide information about \
         {disease}, considering the initial advice was \"{advice}\". How can I help?",
        name = assistant_name,
        disease = diagnosis.disease,
        advice = diagnosis.advice,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ll_domain::dialogue::DialogueRole;

    fn diagnosis() -> Diagnosis {
        Diagnosis {
            id: "d1".into(),
            user_id: "farmer-1".into(),
            image_url: "https://example.com/leaf.jpg".into(),
            crop_type: None,
            disease: "rice_brownSpot".into(),
            confidence: 0.91,
            advice: "Apply fungicide X weekly".into(),
            submitted_at: Utc::now(),
        }
    }

    fn message(sender: Sender, content: &str) -> Message {
        Message {
            id: uuid_like(content),
            sender,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    fn uuid_like(seed: &str) -> String {
        format!("id-{seed}")
    }

    #[test]
    fn priming_pair_comes_first() {
        let messages = vec![
            message(Sender::Assistant, "greeting"),
            message(Sender::User, "question"),
        ];
        let turns = build_dialogue("LeafLyzer", &diagnosis(), &messages, 10);

        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].role, DialogueRole::User);
        assert!(turns[0].text.contains("LeafLyzer"));
        assert!(turns[0].text.contains("rice_brownSpot"));
        assert!(turns[0].text.contains("Apply fungicide X weekly"));
        assert_eq!(turns[1].role, DialogueRole::Model);
        assert!(turns[1].text.starts_with("Understood."));
        assert_eq!(turns[2].text, "greeting");
        assert_eq!(turns[3].text, "question");
    }

    #[test]
    fn sender_maps_to_model_vocabulary() {
        let messages = vec![
            message(Sender::User, "from the user"),
            message(Sender::Assistant, "from the assistant"),
        ];
        let turns = build_dialogue("LeafLyzer", &diagnosis(), &messages, 10);
        assert_eq!(turns[2].role, DialogueRole::User);
        assert_eq!(turns[3].role, DialogueRole::Model);
    }

    #[test]
    fn long_transcript_is_bounded_to_window_plus_priming() {
        let messages: Vec<Message> = (0..15)
            .map(|i| message(Sender::User, &format!("msg {i}")))
            .collect();
        let turns = build_dialogue("LeafLyzer", &diagnosis(), &messages, 10);

        // 10 transcript turns + 2 priming turns.
        assert_eq!(turns.len(), 12);
        // Window keeps the most recent messages, chronological order.
        assert_eq!(turns[2].text, "msg 5");
        assert_eq!(turns[11].text, "msg 14");
    }

    #[test]
    fn empty_transcript_still_primes() {
        let turns = build_dialogue("LeafLyzer", &diagnosis(), &[], 10);
        assert_eq!(turns.len(), 2);
    }
}
