//! Keyword tables for intent detection. All entries are lowercase and matched
//! as substrings of the lowercased input unless stated otherwise.

use std::sync::LazyLock;

use regex::Regex;

pub const CONFIRMATION: &[&str] = &[
    "yes",
    "sure",
    "please do",
    "go ahead",
    "of course",
    "that's right",
    "correct",
    "affirmative",
];

pub const DECLINING: &[&str] = &[
    "no",
    "not now",
    "later",
    "don't",
    "cancel",
    "stop",
    "negative",
    "decline",
];

/// Unambiguous requests to create a reminder right away.
pub const CLEAR_INTENT: &[&str] = &["remind me to", "set a reminder to", "add to my reminders to"];

/// Questions about reminders, answered without creating one.
pub const INQUIRY: &[&str] = &[
    "can we set a reminder",
    "is it possible to set",
    "how do i set",
    "can you set reminders",
    "let's set a reminder",
    "i need a reminder",
    "can you remind me something",
    "can you set a reminder for",
];

/// Requests that need a reminder but say too little to create one.
pub const VAGUE: &[&str] = &[
    "let's set a reminder",
    "i need a reminder",
    "can you remind me something",
    "can you set a reminder for",
];

/// Filler stripped from reminder text to leave only what to be reminded of.
pub static REMOVAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:could you|can you|can we|let's|remind me to|set a reminder to|add to my reminders to|remind me|set a reminder|add to my reminders|please|I need a reminder to|I have a|I need to|set a reminder for|set a reminder called|on the|at|every day)\b",
    )
    .expect("removal pattern is valid")
});

/// Task triggers, matched against the lowercased input.
pub static TASK: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        r"\badd (?:to my tasks|to my to-do list)\b",
        r"\bcreate (?:a task|a to-do)\b",
        r"\bmake (?:a task|a to-do)\b",
        r"\bset (?:a task|a to-do)\b",
    ]
    .map(|p| Regex::new(p).expect("task pattern is valid"))
});

/// Whether any phrase occurs in `input` (case-insensitive).
pub fn contains_any(input: &str, phrases: &[&str]) -> bool {
    let lower = input.to_lowercase();
    phrases.iter().any(|p| lower.contains(p))
}

/// How a reply to a yes/no question reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Unclear,
}

/// Classify a reply. Confirmation wins when both tables match.
pub fn classify_answer(input: &str) -> Answer {
    if contains_any(input, CONFIRMATION) {
        Answer::Yes
    } else if contains_any(input, DECLINING) {
        Answer::No
    } else {
        Answer::Unclear
    }
}
