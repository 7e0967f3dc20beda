use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ── Status ──

/// Lifecycle state of a todo. Serialized with the labels shown to users.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Status {
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Paused")]
    Paused,
    #[serde(rename = "Done")]
    Done,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToDo => write!(f, "To Do"),
            Self::InProgress => write!(f, "In Progress"),
            Self::Paused => write!(f, "Paused"),
            Self::Done => write!(f, "Done"),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    /// Accepts both the display labels and the short filter names used by
    /// `fleck list` (`todo`, `running`, `paused`, `done`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "to do" | "todo" => Ok(Self::ToDo),
            "in progress" | "running" | "in_progress" => Ok(Self::InProgress),
            "paused" => Ok(Self::Paused),
            "done" => Ok(Self::Done),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

// ── Valid transitions ──

const VALID_TRANSITIONS: &[(Status, &[Status])] = &[
    (Status::ToDo, &[Status::InProgress]),
    (Status::InProgress, &[Status::Paused, Status::Done]),
    (Status::Paused, &[Status::InProgress]),
    // Done is terminal
];

pub fn is_valid_transition(from: Status, to: Status) -> bool {
    VALID_TRANSITIONS
        .iter()
        .any(|(f, targets)| *f == from && targets.contains(&to))
}

// ── Priority ──

/// Todo priority. `None` is persisted as JSON `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    High,
    Medium,
    Low,
    #[default]
    None,
}

impl Priority {
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            Self::High => Some("high"),
            Self::Medium => Some("medium"),
            Self::Low => Some("low"),
            Self::None => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or("none"))
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            "none" | "" => Ok(Self::None),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_str() {
            Some(s) => serializer.serialize_str(s),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(Priority::None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_edges() {
        assert!(is_valid_transition(Status::ToDo, Status::InProgress));
        assert!(is_valid_transition(Status::InProgress, Status::Paused));
        assert!(is_valid_transition(Status::Paused, Status::InProgress));
        assert!(is_valid_transition(Status::InProgress, Status::Done));
    }

    #[test]
    fn rejected_edges() {
        assert!(!is_valid_transition(Status::ToDo, Status::Paused));
        assert!(!is_valid_transition(Status::ToDo, Status::Done));
        assert!(!is_valid_transition(Status::Paused, Status::Done));
        assert!(!is_valid_transition(Status::Done, Status::InProgress));
        assert!(!is_valid_transition(Status::Done, Status::Paused));
        assert!(!is_valid_transition(Status::InProgress, Status::InProgress));
    }

    #[test]
    fn status_serializes_with_labels() {
        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
        let back: Status = serde_json::from_str("\"To Do\"").unwrap();
        assert_eq!(back, Status::ToDo);
    }

    #[test]
    fn status_parses_filter_names() {
        assert_eq!("running".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!("todo".parse::<Status>().unwrap(), Status::ToDo);
        assert!("later".parse::<Status>().is_err());
    }

    #[test]
    fn priority_none_is_null() {
        assert_eq!(serde_json::to_string(&Priority::None).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
        let p: Priority = serde_json::from_str("null").unwrap();
        assert_eq!(p, Priority::None);
        let p: Priority = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(p, Priority::Medium);
    }
}
