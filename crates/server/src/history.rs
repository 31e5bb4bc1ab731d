//! Parses a client-supplied transcript into ordered (role, text) history
//! messages, per the `^(User|Assistant):\s*(.*)$` line convention. Grounded
//! on the teacher's line-oriented transcript parsing in
//! `text_processing::transcript`, narrowed to the one regex the gateway
//! needs.

use once_cell::sync::Lazy;
use regex::Regex;
use voice_gateway_model::Role;

use crate::state_machine::HistoryMessage;

static HISTORY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(User|Assistant):\s*(.*)$").expect("valid regex"));

/// Parses a multi-line transcript, skipping blank lines and any line that
/// doesn't match the `Role: text` convention. Order is preserved.
pub fn parse_history(transcript: &str) -> Vec<HistoryMessage> {
    transcript
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let captures = HISTORY_LINE.captures(line)?;
            let role = match captures.get(1)?.as_str().to_ascii_lowercase().as_str() {
                "user" => Role::User,
                "assistant" => Role::Assistant,
                _ => return None,
            };
            let text = captures.get(2)?.as_str().to_string();
            Some(HistoryMessage { role, text })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_alternating_roles_in_order() {
        let transcript = "User: hello there\nAssistant: hi, how can I help?\nUser: add a task";
        let messages = parse_history(transcript);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].text, "hello there");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[2].text, "add a task");
    }

    #[test]
    fn is_case_insensitive_on_role_label() {
        let messages = parse_history("user: hi\nASSISTANT: hello");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[test]
    fn skips_blank_and_unrecognized_lines() {
        let messages = parse_history("User: hi\n\nsystem noise\nAssistant: hello");
        assert_eq!(messages.len(), 2);
    }
}
