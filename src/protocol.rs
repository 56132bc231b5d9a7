//! Command tokens and responses for RefVault
//!
//! A command token has the shape `VERB=key[,value]`. Verbs are matched
//! case-insensitively; anything unrecognized parses to [`Verb::Unknown`]
//! and is ignored by the executor rather than rejected.

use nom::{
    bytes::complete::take_while,
    character::complete::char,
    combinator::{all_consuming, opt, rest},
    sequence::{pair, preceded},
    IResult,
};

/// Verbs understood by the interpreter, in the order they are advertised
pub const VERBS: [&str; 6] = ["PUT", "DELETE", "PUTREF", "GET", "GETREF", "QUIT"];

/// Operation kind of a parsed command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Put,
    Delete,
    PutRef,
    Get,
    GetRef,
    Quit,
    Unknown,
}

impl Verb {
    /// Match a verb name, ignoring ASCII case
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "put" => Verb::Put,
            "delete" => Verb::Delete,
            "putref" => Verb::PutRef,
            "get" => Verb::Get,
            "getref" => Verb::GetRef,
            "quit" => Verb::Quit,
            _ => Verb::Unknown,
        }
    }
}

/// A command token after parsing: verb, key and value.
///
/// `value` is empty when the token carried no second argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub verb: Verb,
    pub key: String,
    pub value: String,
}

impl Command {
    pub fn new(verb: Verb, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            verb,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(Verb::Put, key, value)
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self::new(Verb::Delete, key, "")
    }

    pub fn put_ref(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(Verb::PutRef, key, value)
    }

    pub fn get(key: impl Into<String>) -> Self {
        Self::new(Verb::Get, key, "")
    }

    pub fn get_ref(key: impl Into<String>) -> Self {
        Self::new(Verb::GetRef, key, "")
    }

    pub fn quit() -> Self {
        Self::new(Verb::Quit, "", "")
    }

    pub fn noop() -> Self {
        Self::new(Verb::Unknown, "", "")
    }
}

/// Result of executing one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Applied, nothing to report
    Ok,
    /// A resolved entry, printed as `key = value`
    Entry { key: String, value: String },
    /// GET or GETREF found nothing
    NoRecordForKey,
    /// PUTREF could not resolve its target
    NoRecordForReferenceKey,
    /// QUIT was applied and the session committed
    Quit,
}

impl Response {
    /// The output line for this response, if it prints one
    pub fn to_line(&self) -> Option<String> {
        match self {
            Response::Entry { key, value } => Some(format!("{} = {}", key, value)),
            Response::NoRecordForKey => Some("No record for key".to_string()),
            Response::NoRecordForReferenceKey => Some("No record for reference key".to_string()),
            Response::Ok | Response::Quit => None,
        }
    }

    /// Serialize the response for writing to the output stream
    pub fn to_bytes(&self) -> Vec<u8> {
        match self.to_line() {
            Some(line) => format!("{}\n", line).into_bytes(),
            None => Vec::new(),
        }
    }
}

/// Split an input line into command tokens.
///
/// Tokens are separated by spaces only; a trailing line ending is dropped
/// and runs of spaces produce no empty tokens.
pub fn tokenize(line: &str) -> impl Iterator<Item = &str> {
    line.trim_end_matches(|c: char| c == '\n' || c == '\r')
        .split(' ')
        .filter(|token| !token.is_empty())
}

/// Parse a single command token.
///
/// Never rejects input: malformed tokens come back as [`Command::noop`].
pub fn parse_command(token: &str) -> Command {
    let (name, args) = match token_parser(token) {
        Ok((_, parts)) => parts,
        Err(_) => return Command::noop(),
    };
    let verb = Verb::from_name(name);

    if verb == Verb::Quit {
        return Command::quit();
    }

    let args = match args {
        Some(args) if verb != Verb::Unknown => args,
        _ => return Command::noop(),
    };

    // Stray '=' characters inside the argument list are dropped.
    let args = args.replace('=', "");
    let mut parts = args.split(',');
    let key = parts.next().unwrap_or("");
    let value = parts.next().unwrap_or("");

    if key.is_empty() {
        return Command::noop();
    }

    Command::new(verb, key, value)
}

/// Token structure: verb name, then an optional `=`-prefixed argument list
fn token_parser(input: &str) -> IResult<&str, (&str, Option<&str>)> {
    all_consuming(pair(
        take_while(|c: char| c != '='),
        opt(preceded(char('='), rest)),
    ))(input)
}
