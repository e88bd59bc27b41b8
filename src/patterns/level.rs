use regex::Regex;
use std::sync::LazyLock;

use crate::models::LogLevel;

/// Alias table in priority order. Earlier rows win when several match.
pub const LEVEL_ALIASES: [(LogLevel, &[&str]); 5] = [
    (LogLevel::Debug, &["DEBUG", "TRACE"]),
    (LogLevel::Info, &["INFO", "INFORMATION"]),
    (LogLevel::Warning, &["WARNING", "WARN"]),
    (LogLevel::Error, &["ERROR", "ERR", "FATAL"]),
    (LogLevel::Critical, &["CRITICAL", "CRIT", "FATAL"]),
];

static LEVEL_TABLE: LazyLock<Vec<(Regex, LogLevel)>> = LazyLock::new(|| {
    LEVEL_ALIASES
        .iter()
        .map(|(level, aliases)| {
            let pattern = format!(r"(?i)\b(?:{})\b", aliases.join("|"));
            (Regex::new(&pattern).expect("level alias pattern"), *level)
        })
        .collect()
});

// Longer aliases first so the alternation never stops at a prefix
static LEADING_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<open>[\[(<])?(?P<token>DEBUG|TRACE|INFORMATION|INFO|WARNING|WARN|ERROR|ERR|FATAL|CRITICAL|CRIT)\b(?P<close>[\])>])?(?P<colon>:)?",
    )
    .expect("leading level marker pattern")
});

static ERROR_KEYWORDS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"error",
        r"exception",
        r"failed",
        r"timeout",
        r"connection.*refused",
        r"file.*not.*found",
    ]
    .iter()
    .map(|pattern| Regex::new(&format!("(?i){pattern}")).expect("error keyword pattern"))
    .collect()
});

/// A level token written as the level field at the head of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelMarker {
    pub level: LogLevel,
    /// Byte length of the marker including brackets and a trailing colon
    pub len: usize,
}

/// Canonical level inference from raw text
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelClassifier;

impl LevelClassifier {
    pub fn new() -> Self {
        Self
    }

    /// First level, in priority order, with an alias anywhere in the text
    pub fn detect(&self, text: &str) -> Option<LogLevel> {
        LEVEL_TABLE
            .iter()
            .find(|(regex, _)| regex.is_match(text))
            .map(|(_, level)| *level)
    }

    /// Total form of [`detect`](Self::detect): INFO when nothing matches
    pub fn classify(&self, text: &str) -> LogLevel {
        self.detect(text).unwrap_or(LogLevel::Info)
    }

    /// Level token at the very start of `text`, if it is written as a level field.
    ///
    /// A token counts when it is bracketed, followed by a colon, or all upper case.
    /// `Error connecting to db` is prose; `ERROR connecting`, `[error]` and `error:` are fields.
    pub fn leading_marker(&self, text: &str) -> Option<LevelMarker> {
        let caps = LEADING_MARKER.captures(text)?;
        let token = caps.name("token")?.as_str();
        let bracketed = caps.name("open").is_some() && caps.name("close").is_some();
        let colon = caps.name("colon").is_some();
        let upper = token.chars().all(|c| c.is_ascii_uppercase());

        if caps.name("open").is_some() && !bracketed {
            return None;
        }
        if !(bracketed || colon || upper) {
            return None;
        }

        let level = LogLevel::from_alias(token)?;
        let len = caps.get(0).map(|m| m.end())?;
        Some(LevelMarker { level, len })
    }
}

/// Fixed set of error keyword patterns, case-insensitive
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorKeywords;

impl ErrorKeywords {
    pub fn matches(text: &str) -> bool {
        ERROR_KEYWORDS.iter().any(|regex| regex.is_match(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[quickcheck]
    fn prop_classify_is_total(text: String) -> bool {
        let classifier = LevelClassifier::new();
        let level = classifier.classify(&text);
        LogLevel::ALL.contains(&level)
            && (classifier.detect(&text).is_some() || level == LogLevel::Info)
    }

    #[test]
    fn test_classify_defaults_to_info() {
        let classifier = LevelClassifier::new();
        assert_eq!(classifier.classify("nothing to see here"), LogLevel::Info);
        assert_eq!(classifier.classify(""), LogLevel::Info);
    }

    #[test]
    fn test_classify_word_boundaries() {
        let classifier = LevelClassifier::new();
        assert_eq!(classifier.classify("server ERROR: disk"), LogLevel::Error);
        assert_eq!(classifier.classify("warn: low memory"), LogLevel::Warning);
        assert_eq!(classifier.classify("CRIT kernel panic"), LogLevel::Critical);
        // "errors" and "informational" are not aliases
        assert_eq!(classifier.detect("three errors seen"), None);
        assert_eq!(classifier.detect("informational"), None);
    }

    #[test]
    fn test_classify_priority_order() {
        let classifier = LevelClassifier::new();
        // DEBUG outranks ERROR in priority order
        assert_eq!(classifier.classify("ERROR while DEBUG enabled"), LogLevel::Debug);
        // FATAL sits in both ERROR and CRITICAL; ERROR comes first
        assert_eq!(classifier.classify("FATAL crash"), LogLevel::Error);
    }

    #[test]
    fn test_leading_marker() {
        let classifier = LevelClassifier::new();

        let marker = classifier.leading_marker("[ERROR] disk full").unwrap();
        assert_eq!(marker.level, LogLevel::Error);
        assert_eq!(marker.len, "[ERROR]".len());

        let marker = classifier.leading_marker("warning: low disk").unwrap();
        assert_eq!(marker.level, LogLevel::Warning);
        assert_eq!(marker.len, "warning:".len());

        let marker = classifier.leading_marker("INFO service started").unwrap();
        assert_eq!(marker.level, LogLevel::Info);

        assert!(classifier.leading_marker("Error connecting to db").is_none());
        assert!(classifier.leading_marker("[ERROR disk").is_none());
        assert!(classifier.leading_marker("ERRORS everywhere").is_none());
        assert!(classifier.leading_marker("user logged in").is_none());
    }

    #[test]
    fn test_error_keywords() {
        assert!(ErrorKeywords::matches("Connection was refused by peer"));
        assert!(ErrorKeywords::matches("config FILE is not found"));
        assert!(ErrorKeywords::matches("request Timeout"));
        assert!(ErrorKeywords::matches("NullPointerException"));
        assert!(ErrorKeywords::matches("login failed"));
        assert!(!ErrorKeywords::matches("user logged in"));
    }
}
