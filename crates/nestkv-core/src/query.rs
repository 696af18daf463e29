//! Query text parser.
//!
//! Grammar (one line, no nesting):
//!
//! ```text
//! query   = command "(" [ arg *( "," arg ) ] ")"
//! command = text          ; trimmed, must not be empty
//! arg     = text          ; trimmed, must not be empty
//! ```
//!
//! `text` is any run of characters other than `(`, `)` and `,`, so commas
//! inside argument values are not supported. Only whitespace may follow the
//! closing parenthesis.

use tracing::trace;

use crate::error::{StoreError, StoreResult};

/// A syntactically valid query. The command is not yet checked against the
/// command table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub command: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Text(&'a str),
    Open,
    Close,
    Comma,
}

impl Token<'_> {
    fn describe(&self) -> &'static str {
        match self {
            Token::Text(_) => "text",
            Token::Open => "'('",
            Token::Close => "')'",
            Token::Comma => "','",
        }
    }
}

/// Parser position in the grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseState {
    ExpectCommand,
    ExpectOpenParen,
    /// At the start of an argument (after `(` or `,`)
    ExpectArgs,
    /// After an argument's text: expects `,` or `)`
    ExpectCloseParen,
    Done,
    Error(String),
}

fn lex(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        let punct = match c {
            '(' => Token::Open,
            ')' => Token::Close,
            ',' => Token::Comma,
            _ => continue,
        };
        if i > start {
            tokens.push(Token::Text(&text[start..i]));
        }
        tokens.push(punct);
        start = i + c.len_utf8();
    }
    if start < text.len() {
        tokens.push(Token::Text(&text[start..]));
    }
    tokens
}

struct Parser<'a> {
    state: ParseState,
    command: &'a str,
    args: Vec<String>,
    pending: &'a str,
}

impl<'a> Parser<'a> {
    fn new() -> Self {
        Self {
            state: ParseState::ExpectCommand,
            command: "",
            args: Vec::new(),
            pending: "",
        }
    }

    fn step(&mut self, token: Token<'a>) {
        let next = match (self.state.clone(), token) {
            (ParseState::Error(_), _) => return,

            (ParseState::ExpectCommand, Token::Text(t)) if t.trim().is_empty() => {
                ParseState::ExpectCommand
            }
            (ParseState::ExpectCommand, Token::Text(t)) => {
                self.command = t.trim();
                ParseState::ExpectOpenParen
            }
            (ParseState::ExpectCommand, Token::Open) => {
                ParseState::Error("missing command name".into())
            }
            (ParseState::ExpectCommand, t) => {
                ParseState::Error(format!("unexpected {} before '('", t.describe()))
            }

            (ParseState::ExpectOpenParen, Token::Open) => ParseState::ExpectArgs,
            (ParseState::ExpectOpenParen, _) => ParseState::Error("missing '('".into()),

            (ParseState::ExpectArgs, Token::Text(t)) => {
                self.pending = t;
                ParseState::ExpectCloseParen
            }
            (ParseState::ExpectArgs, Token::Close) if self.args.is_empty() => ParseState::Done,
            (ParseState::ExpectArgs, Token::Close | Token::Comma) => {
                ParseState::Error("empty argument".into())
            }
            (ParseState::ExpectArgs, Token::Open) => {
                ParseState::Error("nested '(' is not supported".into())
            }

            (ParseState::ExpectCloseParen, Token::Comma) => self.push_arg(ParseState::ExpectArgs),
            (ParseState::ExpectCloseParen, Token::Close) => self.push_arg(ParseState::Done),
            (ParseState::ExpectCloseParen, t) => {
                ParseState::Error(format!("unexpected {} in arguments", t.describe()))
            }

            (ParseState::Done, Token::Text(t)) if t.trim().is_empty() => ParseState::Done,
            (ParseState::Done, _) => ParseState::Error("trailing input after ')'".into()),
        };
        trace!(token = ?token, from = ?self.state, to = ?next, "query parse step");
        self.state = next;
    }

    fn push_arg(&mut self, next: ParseState) -> ParseState {
        let arg = self.pending.trim();
        if arg.is_empty() {
            return ParseState::Error("empty argument".into());
        }
        self.args.push(arg.to_string());
        next
    }

    fn finish(self) -> StoreResult<ParsedQuery> {
        match self.state {
            ParseState::Done => Ok(ParsedQuery {
                command: self.command.to_string(),
                args: self.args,
            }),
            ParseState::ExpectCommand => Err(StoreError::invalid_query("empty query")),
            ParseState::ExpectOpenParen => Err(StoreError::invalid_query("missing '('")),
            ParseState::ExpectArgs | ParseState::ExpectCloseParen => {
                Err(StoreError::invalid_query("missing ')'"))
            }
            ParseState::Error(reason) => Err(StoreError::InvalidQuery(reason)),
        }
    }
}

/// Parse one query line into a command name and trimmed arguments.
pub fn parse(text: &str) -> StoreResult<ParsedQuery> {
    let mut parser = Parser::new();
    for token in lex(text) {
        parser.step(token);
    }
    parser.finish()
}
