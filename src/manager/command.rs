//! # The textual command grammar.
//!
//! One command per line, case-sensitive:
//!
//! ```text
//! RESUME-ALL              resume every source service (indegree zero)
//! STOP-ALL                stop every sink service (no dependencies)
//! RESUME-SERVICE <id>     resume the named service
//! STOP-SERVICE <id>       stop the named service
//! EXIT                    stop everything, join everything, terminate
//! ```
//!
//! The `START-ALL` / `START-SERVICE` spellings are accepted as synonyms of
//! the `RESUME-*` forms. Anything else is rejected as malformed.

use crate::error::ControlError;

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Resume every source service.
    ResumeAll,
    /// Stop every sink service.
    StopAll,
    /// Resume the named service.
    ResumeService(String),
    /// Stop the named service.
    StopService(String),
    /// Stop everything, join everything, terminate the dispatcher.
    Exit,
}

impl Command {
    /// Parses one command line.
    pub fn parse(line: &str) -> Result<Command, ControlError> {
        let malformed = || ControlError::MalformedCommand {
            input: line.to_string(),
        };

        let mut tokens = line.split_whitespace();
        let verb = tokens.next().ok_or_else(malformed)?;

        let command = match verb {
            "RESUME-ALL" | "START-ALL" => Command::ResumeAll,
            "STOP-ALL" => Command::StopAll,
            "RESUME-SERVICE" | "START-SERVICE" => {
                Command::ResumeService(tokens.next().ok_or_else(malformed)?.to_string())
            }
            "STOP-SERVICE" => {
                Command::StopService(tokens.next().ok_or_else(malformed)?.to_string())
            }
            "EXIT" => Command::Exit,
            _ => return Err(malformed()),
        };

        if tokens.next().is_some() {
            return Err(malformed());
        }
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_grammar() {
        assert_eq!(Command::parse("RESUME-ALL").unwrap(), Command::ResumeAll);
        assert_eq!(Command::parse("STOP-ALL").unwrap(), Command::StopAll);
        assert_eq!(
            Command::parse("RESUME-SERVICE b").unwrap(),
            Command::ResumeService("b".into())
        );
        assert_eq!(
            Command::parse("STOP-SERVICE a").unwrap(),
            Command::StopService("a".into())
        );
        assert_eq!(Command::parse("EXIT").unwrap(), Command::Exit);
    }

    #[test]
    fn accepts_start_synonyms() {
        assert_eq!(Command::parse("START-ALL").unwrap(), Command::ResumeAll);
        assert_eq!(
            Command::parse("START-SERVICE d").unwrap(),
            Command::ResumeService("d".into())
        );
    }

    #[test]
    fn is_case_sensitive() {
        assert!(Command::parse("resume-all").is_err());
        assert!(Command::parse("Exit").is_err());
    }

    #[test]
    fn rejects_missing_and_trailing_arguments() {
        assert!(Command::parse("RESUME-SERVICE").is_err());
        assert!(Command::parse("STOP-SERVICE a b").is_err());
        assert!(Command::parse("EXIT now").is_err());
        assert!(Command::parse("").is_err());
        assert!(Command::parse("DANCE").is_err());
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        assert_eq!(
            Command::parse("  STOP-SERVICE   a  ").unwrap(),
            Command::StopService("a".into())
        );
    }
}
