//! Line commands read by the `shell-runtime` binary.

use std::fmt;
use std::str::FromStr;

/// One console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `nav <path>`
    Navigate(String),
    /// `login <user> <pass>`
    Login {
        /// Username
        username: String,
        /// Password
        password: String,
    },
    /// `logout`
    Logout,
    /// `status`
    Status,
    /// `metrics`
    Metrics,
    /// `help`
    Help,
    /// `quit` / `exit`
    Quit,
}

/// Rejected command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError(pub String);

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for CommandError {}

impl Command {
    /// Usage text.
    pub const HELP: &'static str =
        "commands: nav <path> | login <user> <pass> | logout | status | metrics | help | quit";
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(CommandError("empty command".into()));
        };
        let args: Vec<&str> = words.collect();
        match (verb, args.as_slice()) {
            ("nav" | "go", [path]) => Ok(Self::Navigate((*path).to_string())),
            ("login", [username, password]) => Ok(Self::Login {
                username: (*username).to_string(),
                password: (*password).to_string(),
            }),
            ("logout", []) => Ok(Self::Logout),
            ("status", []) => Ok(Self::Status),
            ("metrics", []) => Ok(Self::Metrics),
            ("help", []) => Ok(Self::Help),
            ("quit" | "exit", []) => Ok(Self::Quit),
            ("nav" | "go" | "login" | "logout" | "status" | "metrics" | "help" | "quit" | "exit", _) => {
                Err(CommandError(format!("wrong arguments for '{verb}'; {}", Self::HELP)))
            }
            _ => Err(CommandError(format!("unknown command '{verb}'; {}", Self::HELP))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "nav /order-system/list".parse::<Command>().unwrap(),
            Command::Navigate("/order-system/list".into())
        );
        assert_eq!(
            "  login alice secret ".parse::<Command>().unwrap(),
            Command::Login {
                username: "alice".into(),
                password: "secret".into()
            }
        );
        assert_eq!("exit".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert!("".parse::<Command>().is_err());
        assert!("login alice".parse::<Command>().unwrap_err().0.contains("wrong arguments"));
        assert!("dance".parse::<Command>().unwrap_err().0.contains("unknown command"));
    }
}
