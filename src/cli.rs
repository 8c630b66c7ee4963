use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser};

use crate::config::DetailLevel;

/// Ask a Gemini model a quick CLI question.
#[derive(Debug, Parser)]
#[command(name = "helpp", version)]
#[command(after_help = "NOTE: -d flags stack, so `-d -d` is the same as `-dd`; at most three are accepted.")]
pub struct Cli {
    /// Ask for more detail: -d (3-5 lines), -dd (7-10 lines), -ddd (model defaults).
    #[arg(
        short = 'd',
        action = ArgAction::Count,
        value_parser = clap::value_parser!(u8).range(..=3)
    )]
    pub details: u8,

    /// The question to ask. Words are joined with single spaces.
    #[arg(
        value_name = "QUESTION",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub question: Vec<String>,
}

impl Cli {
    pub fn detail_level(&self) -> DetailLevel {
        DetailLevel::from_count(self.details)
    }

    pub fn prompt(&self) -> Option<String> {
        if self.question.is_empty() {
            None
        } else {
            Some(self.question.join(" "))
        }
    }

    /// Prints clap's usage error to stderr and exits with a non-zero status.
    pub fn exit_missing_question() -> ! {
        Self::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "the following required arguments were not provided:\n  <QUESTION>...",
            )
            .exit()
    }
}
