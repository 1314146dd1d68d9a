use regex::Regex;

/// A lexical token of the FCS query surface syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Not,
    And,
    Or,
    Prox,
    /// Bare word or double-quoted phrase; quotes are already stripped.
    Term(String),
    /// Any other single byte, e.g. `(` and `)`.
    Literal(u8),
}

/// Scans the input left to right, skipping ASCII whitespace between tokens.
///
/// Rules are tried in order, first match wins:
/// 1. the keywords `NOT`, `AND`, `OR`, `PROX` as literal prefixes,
/// 2. a double-quoted string (quotes stripped),
/// 3. a maximal run of characters that are neither whitespace nor parentheses,
/// 4. otherwise the next single byte stands for itself.
pub struct Lexer<'a> {
    input: &'a str,
    rules: Vec<(Regex, fn(&str) -> Token)>,
}

fn is_space(c: u8) -> bool {
    c == b' ' || c == b'\t' || c == b'\n'
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let rules: Vec<(Regex, fn(&str) -> Token)> = vec![
            (Regex::new(r"^NOT").unwrap(), |_| Token::Not),
            (Regex::new(r"^AND").unwrap(), |_| Token::And),
            (Regex::new(r"^OR").unwrap(), |_| Token::Or),
            (Regex::new(r"^PROX").unwrap(), |_| Token::Prox),
            (Regex::new(r#"^"[^"]*""#).unwrap(), |s| {
                Token::Term(s.trim_matches('"').to_string())
            }),
            (Regex::new(r"^[^\s()]+").unwrap(), |s| {
                Token::Term(s.to_string())
            }),
        ];
        Self { input, rules }
    }

    /// Next token, or `None` once the input is exhausted.
    pub fn next_token(&mut self) -> Option<Token> {
        while !self.input.is_empty() && is_space(self.input.as_bytes()[0]) {
            self.input = &self.input[1..];
        }
        if self.input.is_empty() {
            return None;
        }

        for (regex, build) in &self.rules {
            if let Some(m) = regex.find(self.input) {
                let text = m.as_str();
                self.input = &self.input[text.len()..];
                return Some(build(text));
            }
        }

        // Not covered by any rule: the next character stands for itself,
        // represented by its leading byte.
        let ch = self.input.chars().next()?;
        let byte = self.input.as_bytes()[0];
        self.input = &self.input[ch.len_utf8()..];
        Some(Token::Literal(byte))
    }

    /// Drain the remaining input into a token list.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }
}
