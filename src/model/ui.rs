//! UI state - presentation constants and focus handling

use std::time::Duration;

/// A suggested question on the landing screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplePrompt {
    pub short: &'static str,
    pub full: &'static str,
}

pub const SAMPLE_PROMPTS: [SamplePrompt; 3] = [
    SamplePrompt {
        short: "Clients with multiple transactions (May 2024-2025)",
        full: "Show all clients who have more than one transaction created between May 1, 2025, and May 30, 2024. Include the client name and the total number of transactions, sorted in descending order by the transaction count",
    },
    SamplePrompt {
        short: "High-value transactions (Oct 2024 - today)",
        full: "Show all transactions created between October 15 2024 and today where the purchase price is at least 2 million and the signing count is 5 or more. Include client name, user name, transaction ID, purchase price, and signing count. Order by client name and user name.",
    },
    SamplePrompt {
        short: "Top 10 agents from Main Branch 25.07",
        full: "Show the top 10 agents from the office named \"Main Branch 25.07\" based on the number of transactions. Include the office name, user_key, agent full name, and total transactions, sorted by total transactions in descending order.",
    },
];

pub const LOADING_MESSAGES: [&str; 5] = [
    "Analyzing your request...",
    "Searching contacts...",
    "Searching transactions...",
    "Querying database...",
    "Compiling results...",
];

const LOADING_MESSAGE_INTERVAL: Duration = Duration::from_millis(1500);

pub const DISCLAIMER_TITLE: &str = "Please review all information.";
pub const DISCLAIMER_BODY: &str = "As you may know, AI can make mistakes, and as the Agent, you must review and confirm all information provided by your assistant.";

/// Loading message for the time spent waiting
pub fn loading_message(elapsed: Duration) -> &'static str {
    let step = (elapsed.as_millis() / LOADING_MESSAGE_INTERVAL.as_millis()) as usize;
    LOADING_MESSAGES[step % LOADING_MESSAGES.len()]
}

/// Which part of the chat screen receives keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Transcript,
    Grid,
}

impl Focus {
    /// Next focus target; the grid is skipped when there is none
    pub fn next(self, has_grid: bool) -> Focus {
        match self {
            Focus::Input => Focus::Transcript,
            Focus::Transcript if has_grid => Focus::Grid,
            Focus::Transcript | Focus::Grid => Focus::Input,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Focus::Input => "Prompt",
            Focus::Transcript => "Chat",
            Focus::Grid => "Table",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_message_cycles() {
        assert_eq!(loading_message(Duration::ZERO), "Analyzing your request...");
        assert_eq!(loading_message(Duration::from_millis(1499)), "Analyzing your request...");
        assert_eq!(loading_message(Duration::from_millis(1500)), "Searching contacts...");
        assert_eq!(loading_message(Duration::from_millis(7500)), "Analyzing your request...");
    }

    #[test]
    fn test_focus_cycle() {
        assert_eq!(Focus::Input.next(true), Focus::Transcript);
        assert_eq!(Focus::Transcript.next(true), Focus::Grid);
        assert_eq!(Focus::Grid.next(true), Focus::Input);
        assert_eq!(Focus::Transcript.next(false), Focus::Input);
    }
}
