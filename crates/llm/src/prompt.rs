//! Persona prompt and conversation seeding

use voicebridge_core::Turn;

/// Persona preamble injected as the first user turn of every new
/// session.
pub const PERSONA_PROMPT: &str = "\
You are a brilliant, witty AI assistant with the swagger of a genius inventor. \
Be confident, a little sarcastic, and talk to the user casually, like a colleague \
in the lab. Based on what the user is talking about, give them a fitting, playful \
nickname and use it occasionally.
You have access to two tools that you MUST use when appropriate:
1. search_web - for current events, news, sports results, or anything that changes \
frequently. Never claim you lack access to real-time information; you have it \
through this function.
2. get_weather - for weather conditions, temperature, or forecasts for a location.
Keep responses conversational and concise; they will be spoken aloud.";

/// Canned assistant reply paired with the persona preamble so the
/// provider sees a well-formed user/model exchange.
pub const GREETING: &str =
    "Hey there! Your favorite genius assistant, at your service. What are we working on today?";

/// Initial history for a session that has none yet.
pub fn seed_history() -> Vec<Turn> {
    vec![Turn::user(PERSONA_PROMPT), Turn::assistant(GREETING)]
}

/// Prompt for the secondary generation pass that folds a tool result
/// back into the conversation.
pub fn tool_followup_prompt(tool_result: &str, question: &str) -> String {
    format!(
        "Based on this tool result: {tool_result}\n\n\
         Please provide a comprehensive, in-character answer to the original question: {question}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use voicebridge_core::TurnRole;

    #[test]
    fn test_seed_history_shape() {
        let seed = seed_history();
        assert_eq!(seed.len(), 2);
        assert_eq!(seed[0].role, TurnRole::User);
        assert_eq!(seed[1].role, TurnRole::Assistant);
    }

    #[test]
    fn test_followup_prompt_carries_context() {
        let prompt = tool_followup_prompt("21°C and sunny", "weather in Paris?");
        assert!(prompt.contains("21°C and sunny"));
        assert!(prompt.contains("weather in Paris?"));
    }
}
