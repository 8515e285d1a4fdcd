//! Inline event lists given with `--events`
//!
//! Grammar (comma separated):
//! - `failed`
//! - `succeeded` or `succeeded:TYPE`
//! - `help:CODE` or `help:CODE:MESSAGE`
//! - `error:CODE` or `error:CODE:MESSAGE`
//! - `packed:ERROR_CODE:FAILED:HELP_CODE` (`FAILED` is `0`/`1`)

use crate::config::EventConfig;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventSpecError {
    #[error("Empty event at position {0}")]
    Empty(usize),

    #[error("Unknown event kind '{0}'")]
    UnknownKind(String),

    #[error("Event '{event}' is missing its {field}")]
    MissingField { event: String, field: &'static str },

    #[error("Invalid number '{value}' in event '{event}'")]
    InvalidNumber { event: String, value: String },
}

/// Parse a comma separated event list
pub fn parse_event_list(spec: &str) -> Result<Vec<EventConfig>, EventSpecError> {
    spec.split(',')
        .enumerate()
        .map(|(position, item)| {
            let item = item.trim();
            if item.is_empty() {
                return Err(EventSpecError::Empty(position));
            }
            parse_event(item)
        })
        .collect()
}

/// Parse a single event
pub fn parse_event(item: &str) -> Result<EventConfig, EventSpecError> {
    let mut parts = item.splitn(2, ':');
    let kind = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
    let rest = parts.next();

    match kind.as_str() {
        "failed" => Ok(EventConfig::Failed),
        "succeeded" | "success" => {
            let authentication_type = match rest {
                Some(value) => number(item, value)?,
                None => 0,
            };
            Ok(EventConfig::Succeeded { authentication_type })
        }
        "help" | "error" => {
            let rest = rest.ok_or_else(|| missing(item, "code"))?;
            let mut fields = rest.splitn(2, ':');
            let code = number(item, fields.next().unwrap_or_default())?;
            let message = fields.next().map(str::to_string);
            if kind == "help" {
                Ok(EventConfig::Help { code, message })
            } else {
                Ok(EventConfig::Error { code, message })
            }
        }
        "packed" => {
            let rest = rest.ok_or_else(|| missing(item, "error code"))?;
            let fields: Vec<&str> = rest.split(':').collect();
            if fields.len() != 3 {
                return Err(missing(item, "error code, failed flag and help code"));
            }
            Ok(EventConfig::Packed {
                error_code: number(item, fields[0])?,
                failed: number(item, fields[1])? != 0,
                help_code: number(item, fields[2])?,
            })
        }
        other => Err(EventSpecError::UnknownKind(other.to_string())),
    }
}

fn number(event: &str, value: &str) -> Result<i32, EventSpecError> {
    value.trim().parse().map_err(|_| EventSpecError::InvalidNumber {
        event: event.to_string(),
        value: value.to_string(),
    })
}

fn missing(event: &str, field: &'static str) -> EventSpecError {
    EventSpecError::MissingField { event: event.to_string(), field }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_documented_example() {
        let events = parse_event_list("failed,help:10:center finger,error:7:lockout,succeeded").unwrap();
        assert_eq!(
            events,
            vec![
                EventConfig::Failed,
                EventConfig::Help { code: 10, message: Some("center finger".into()) },
                EventConfig::Error { code: 7, message: Some("lockout".into()) },
                EventConfig::Succeeded { authentication_type: 0 },
            ]
        );
    }

    #[test]
    fn test_message_may_contain_colons() {
        let event = parse_event("error:5:canceled: by user").unwrap();
        assert_eq!(
            event,
            EventConfig::Error { code: 5, message: Some("canceled: by user".into()) }
        );
    }

    #[test]
    fn test_optional_parts() {
        assert_eq!(
            parse_event("help:3").unwrap(),
            EventConfig::Help { code: 3, message: None }
        );
        assert_eq!(
            parse_event("succeeded:2").unwrap(),
            EventConfig::Succeeded { authentication_type: 2 }
        );
        assert_eq!(
            parse_event("packed:0:1:0").unwrap(),
            EventConfig::Packed { error_code: 0, failed: true, help_code: 0 }
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse_event_list("failed,,succeeded"),
            Err(EventSpecError::Empty(1))
        );
        assert_eq!(
            parse_event("wiggle"),
            Err(EventSpecError::UnknownKind("wiggle".into()))
        );
        assert!(matches!(
            parse_event("error"),
            Err(EventSpecError::MissingField { .. })
        ));
        assert!(matches!(
            parse_event("help:ten"),
            Err(EventSpecError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_event("packed:0:1"),
            Err(EventSpecError::MissingField { .. })
        ));
    }
}
