//! Console output formatter for chat sessions

use chrono::NaiveDateTime;
use colored::Colorize;
use empathy_domain::{ConversationId, Greeting, HistoryEntry, Message, Role, User};

const AI_MARK: &str = "✳";

/// Formats chat state for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Globally enable or disable ANSI colors.
    pub fn set_color(enabled: bool) {
        colored::control::set_override(enabled);
    }

    /// Greeting shown above an empty conversation, e.g. `✳ Good Morning, Ann.`
    pub fn greeting(user: &User, hour: u32) -> String {
        format!(
            "{} {}, {}.",
            AI_MARK.yellow(),
            Greeting::for_hour(hour),
            user.display_name().bold()
        )
    }

    /// One chat turn. User turns carry the avatar initial.
    pub fn message(message: &Message, initial: char) -> String {
        match message.role {
            Role::User => format!(
                "{} {}",
                format!("({})", initial).cyan().bold(),
                Self::indent_tail(&message.content, "    ")
            ),
            Role::Ai => format!(
                "{} {}",
                AI_MARK.yellow(),
                Self::indent_tail(&message.content, "  ")
            ),
        }
    }

    /// Whole transcript, one blank line between turns
    pub fn transcript(messages: &[Message], initial: char) -> String {
        messages
            .iter()
            .map(|m| Self::message(m, initial))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Numbered history list; the active conversation is marked with `*`.
    pub fn history(entries: &[HistoryEntry], active: Option<&ConversationId>) -> String {
        if entries.is_empty() {
            return format!("{}", "No conversations yet.".dimmed());
        }

        let mut output = format!("{}\n", "Conversations:".cyan().bold());
        for (i, entry) in entries.iter().enumerate() {
            let is_active = active == Some(&entry.id);
            let marker = if is_active { "*" } else { " " };
            let title = if is_active {
                entry.title.bold().to_string()
            } else {
                entry.title.clone()
            };
            output.push_str(&format!("{} {:>3}. {}", marker.green(), i + 1, title));
            if let Some(ts) = entry.timestamp.as_deref() {
                output.push_str(&format!("  {}", Self::timestamp(ts).dimmed()));
            }
            output.push('\n');
        }
        output
    }

    /// Profile line for `/whoami`
    pub fn whoami(user: &User) -> String {
        format!(
            "{} {} <{}>",
            format!("({})", user.initial()).cyan().bold(),
            user.display_name(),
            user.username
        )
    }

    pub fn error(message: &str) -> String {
        format!("{} {}", "Error:".red().bold(), message)
    }

    pub fn notice(message: &str) -> String {
        format!("{}", message.dimmed())
    }

    /// Command help for the current session state
    pub fn help(signed_in: bool) -> String {
        let commands: &[(&str, &str)] = if signed_in {
            &[
                ("<text>", "Send a message"),
                ("/new", "Start a new conversation"),
                ("/history", "List past conversations"),
                ("/open <n|id>", "Open a past conversation"),
                ("/whoami", "Show the signed-in user"),
                ("/logout", "Sign out"),
                ("/help", "Show this help"),
                ("/quit", "Exit"),
            ]
        } else {
            &[
                ("/login [email]", "Sign in"),
                ("/signup", "Create an account"),
                ("/help", "Show this help"),
                ("/quit", "Exit"),
            ]
        };

        let mut output = format!("{}\n", "Commands:".cyan().bold());
        for (name, description) in commands {
            output.push_str(&format!("  {:<16} {}\n", name, description));
        }
        output
    }

    /// Short display form of a server timestamp; the raw text when it does
    /// not parse.
    fn timestamp(raw: &str) -> String {
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|dt| dt.format("%b %d, %H:%M").to_string())
            .unwrap_or_else(|| raw.to_string())
    }

    fn indent_tail(text: &str, prefix: &str) -> String {
        let mut lines = text.lines();
        let Some(first) = lines.next() else {
            return String::new();
        };
        lines.fold(first.to_string(), |mut acc, line| {
            acc.push('\n');
            acc.push_str(prefix);
            acc.push_str(line);
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, title: &str, ts: Option<&str>) -> HistoryEntry {
        HistoryEntry {
            id: ConversationId::new(id).unwrap(),
            title: title.to_string(),
            timestamp: ts.map(str::to_string),
        }
    }

    #[test]
    fn test_greeting_uses_hour_and_name() {
        let user = User::new("Ann", "a@x.com");
        let text = ConsoleFormatter::greeting(&user, 9);
        assert!(text.contains("Good Morning"));
        assert!(text.contains("Ann"));

        let text = ConsoleFormatter::greeting(&User::new("", "a@x.com"), 20);
        assert!(text.contains("Good Evening"));
        assert!(text.contains("friend"));
    }

    #[test]
    fn test_transcript_keeps_order() {
        let messages = vec![Message::user("hello"), Message::ai("hi there")];
        let text = ConsoleFormatter::transcript(&messages, 'A');
        let hello = text.find("hello").unwrap();
        let reply = text.find("hi there").unwrap();
        assert!(hello < reply);
        assert!(text.contains("(A)"));
    }

    #[test]
    fn test_multiline_message_is_indented() {
        let text = ConsoleFormatter::message(&Message::ai("one\ntwo"), 'A');
        assert!(text.contains("one\n  two"));
    }

    #[test]
    fn test_history_marks_active_entry() {
        let entries = vec![
            entry("c2", "Newest", Some("2024-05-02T10:30:00")),
            entry("c1", "Older", None),
        ];
        let active = ConversationId::new("c1").unwrap();
        let text = ConsoleFormatter::history(&entries, Some(&active));

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("1.") && lines[1].contains("Newest"));
        assert!(lines[1].contains("May 02, 10:30"));
        assert!(lines[2].contains('*') && lines[2].contains("Older"));
        assert!(!lines[1].contains('*'));
    }

    #[test]
    fn test_empty_history() {
        assert!(ConsoleFormatter::history(&[], None).contains("No conversations yet"));
    }

    #[test]
    fn test_timestamp_fallback() {
        assert_eq!(ConsoleFormatter::timestamp("yesterday"), "yesterday");
        assert_eq!(
            ConsoleFormatter::timestamp("2024-01-05T08:00:00.123456"),
            "Jan 05, 08:00"
        );
    }

    #[test]
    fn test_help_depends_on_session() {
        assert!(ConsoleFormatter::help(false).contains("/login"));
        assert!(!ConsoleFormatter::help(false).contains("/logout"));
        assert!(ConsoleFormatter::help(true).contains("/open"));
    }
}
