//! Argument scanning.
//!
//! Raw input is split into whitespace-delimited tokens. Declared flags
//! (`-x`, one ASCII letter) are pulled out first, wherever they appear. The
//! positional tokens that remain are consumed strictly left to right through
//! a [`CommandArgs`] cursor.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use crate::error::{
    AlreadyPresentFlag, CommandError, FlagError, MissingArgument, MissingFlagValue, ParseError,
};
use crate::namespace::Namespace;

/// Split a command line into tokens.
pub fn split(arguments: &str) -> Vec<String> {
    arguments.split_whitespace().map(str::to_string).collect()
}

/// Flag letter of `token` if it has the form `-x`.
pub fn flag_letter(token: &str) -> Option<char> {
    let mut chars = token.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('-'), Some(letter), None) if letter.is_ascii_alphabetic() => Some(letter),
        _ => None,
    }
}

// ============================================================================
// Flags
// ============================================================================

/// Flags extracted from a token list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    switches: HashSet<char>,
    values: HashMap<char, String>,
}

impl FlagSet {
    /// Extract the declared flags from `tokens`.
    ///
    /// Returns the flags and the positional tokens in their original order.
    /// A `-x` token whose letter is not declared stays positional.
    pub fn split(
        tokens: Vec<String>,
        value_flags: &HashSet<char>,
        switches: &HashSet<char>,
    ) -> Result<(FlagSet, Vec<String>), FlagError> {
        let mut flags = FlagSet::default();
        let mut positional = Vec::with_capacity(tokens.len());
        let mut tokens = tokens.into_iter();

        while let Some(token) = tokens.next() {
            match flag_letter(&token) {
                Some(letter) if value_flags.contains(&letter) => {
                    if flags.values.contains_key(&letter) {
                        return Err(AlreadyPresentFlag { flag: letter }.into());
                    }
                    let value = tokens.next().ok_or(MissingFlagValue { flag: letter })?;
                    flags.values.insert(letter, value);
                }
                Some(letter) if switches.contains(&letter) => {
                    flags.switches.insert(letter);
                }
                _ => positional.push(token),
            }
        }

        Ok((flags, positional))
    }

    pub fn is_set(&self, switch: char) -> bool {
        self.switches.contains(&switch)
    }

    pub fn value(&self, flag: char) -> Option<&str> {
        self.values.get(&flag).map(String::as_str)
    }
}

// ============================================================================
// Positional cursor
// ============================================================================

/// Cursor over positional tokens, handed to providers.
///
/// `consumed()` and `remaining()` always partition the original tokens.
#[derive(Debug)]
pub struct CommandArgs<'a> {
    tokens: Vec<String>,
    position: usize,
    namespace: &'a Namespace,
}

impl<'a> CommandArgs<'a> {
    pub fn new(tokens: Vec<String>, namespace: &'a Namespace) -> Self {
        Self {
            tokens,
            position: 0,
            namespace,
        }
    }

    pub fn namespace(&self) -> &'a Namespace {
        self.namespace
    }

    pub fn has_next(&self) -> bool {
        self.position < self.tokens.len()
    }

    pub fn peek(&self) -> Option<&str> {
        self.tokens.get(self.position).map(String::as_str)
    }

    /// Consume the next token.
    pub fn next(&mut self) -> Result<String, CommandError> {
        let token = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or(MissingArgument { parameter: None })?;
        self.position += 1;
        Ok(token)
    }

    /// Consume the next token and parse it with [`FromStr`].
    ///
    /// A token that fails to parse is still consumed.
    pub fn next_parsed<T>(&mut self, expected: &str) -> Result<T, CommandError>
    where
        T: FromStr,
    {
        let token = self.next()?;
        token.parse::<T>().map_err(|_| {
            let message = format!("Expected '{}' to be {}", token, expected);
            ParseError::invalid(token.clone(), message).into()
        })
    }

    /// Consume every remaining token.
    pub fn take_remaining(&mut self) -> Vec<String> {
        let rest = self.tokens[self.position..].to_vec();
        self.position = self.tokens.len();
        rest
    }

    pub fn consumed(&self) -> &[String] {
        &self.tokens[..self.position]
    }

    pub fn remaining(&self) -> &[String] {
        &self.tokens[self.position..]
    }

    pub fn position(&self) -> usize {
        self.position
    }
}
