use super::ast::QueryNode;
use super::lexer::{Lexer, Token};

use thiserror::Error;

/// The translator refuses to build an AST when parsing fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected {0} in query")]
    UnexpectedToken(String),
    #[error("unexpected end of query")]
    UnexpectedEnd,
}

/// LALR(1) parser for the FCS query grammar:
///
/// ```text
/// start := node
/// node  := TERM
///        | '(' node ')'
///        | NOT node
///        | node AND  node
///        | node OR   node
///        | node PROX node
/// ```
///
/// The parse table below is the generated LALR(1) automaton for this grammar,
/// encoded directly: 15 states over the terminals
/// `$end AND OR PROX ')' '(' NOT TERM` plus the `node`/`start` nonterminals.
/// The table fixes all binary operators at one precedence level with left
/// associativity, makes `NOT` bind tighter than any binary operator, and lets
/// parentheses override both.
pub fn parse(input: &str) -> Result<QueryNode, ParseError> {
    Parser::new(input).run()
}

/// Parse action: error, shift, reduce or accept.
#[derive(Clone, Copy)]
enum Action {
    E,
    S(u8),
    R(u8),
    A,
}

use Action::{A, E, R, S};

// Terminal columns: 0 $end, 1 AND, 2 OR, 3 PROX, 4 ')', 5 '(', 6 NOT, 7 TERM.
#[rustfmt::skip]
const ACTION: [[Action; 8]; 15] = [
    /*  0 */ [E,    E,    E,    E,    E,    S(4), S(5), S(3)],
    /*  1 */ [A,    E,    E,    E,    E,    E,    E,    E   ],
    /*  2 */ [R(1), S(7), S(8), S(9), E,    E,    E,    E   ],
    /*  3 */ [R(2), R(2), R(2), R(2), R(2), E,    E,    E   ],
    /*  4 */ [E,    E,    E,    E,    E,    S(4), S(5), S(3)],
    /*  5 */ [E,    E,    E,    E,    E,    S(4), S(5), S(3)],
    /*  6 */ [R(4), R(4), R(4), R(4), R(4), E,    E,    E   ],
    /*  7 */ [E,    E,    E,    E,    E,    S(4), S(5), S(3)],
    /*  8 */ [E,    E,    E,    E,    E,    S(4), S(5), S(3)],
    /*  9 */ [E,    E,    E,    E,    E,    S(4), S(5), S(3)],
    /* 10 */ [R(7), R(7), R(7), R(7), R(7), E,    E,    E   ],
    /* 11 */ [R(6), R(6), R(6), R(6), R(6), E,    E,    E   ],
    /* 12 */ [R(5), R(5), R(5), R(5), R(5), E,    E,    E   ],
    /* 13 */ [E,    S(7), S(8), S(9), S(14), E,   E,    E   ],
    /* 14 */ [R(3), R(3), R(3), R(3), R(3), E,    E,    E   ],
];

// Goto columns: 0 node, 1 start. Zero entries are unreachable.
#[rustfmt::skip]
const GOTO: [[u8; 2]; 15] = [
    [2, 1], [0, 0], [0, 0], [0, 0], [13, 0],
    [6, 0], [0, 0], [12, 0], [11, 0], [10, 0],
    [0, 0], [0, 0], [0, 0], [0, 0], [0, 0],
];

/// (popped symbols, goto column) per reduction rule.
const RULES: [(usize, usize); 8] = [
    (0, 0), // unused
    (1, 1), // start := node
    (1, 0), // node := TERM
    (3, 0), // node := '(' node ')'
    (2, 0), // node := NOT node
    (3, 0), // node := node AND node
    (3, 0), // node := node OR node
    (3, 0), // node := node PROX node
];

enum StackValue {
    Shifted(Token),
    Node(QueryNode),
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    states: Vec<u8>,
    values: Vec<StackValue>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lexer: Lexer::new(input),
            states: vec![0],
            values: Vec::new(),
        }
    }

    fn run(mut self) -> Result<QueryNode, ParseError> {
        let mut lookahead = self.lexer.next_token();
        loop {
            let state = *self.states.last().unwrap() as usize;
            let Some(col) = column(lookahead.as_ref()) else {
                return Err(reject(&lookahead));
            };
            match ACTION[state][col] {
                S(next) => {
                    self.states.push(next);
                    self.values.push(StackValue::Shifted(
                        lookahead.take().ok_or(ParseError::UnexpectedEnd)?,
                    ));
                    lookahead = self.lexer.next_token();
                }
                R(rule) => self.reduce(rule as usize)?,
                A => {
                    return match self.values.pop() {
                        Some(StackValue::Node(node)) => Ok(node),
                        _ => Err(ParseError::UnexpectedEnd),
                    };
                }
                E => return Err(reject(&lookahead)),
            }
        }
    }

    fn reduce(&mut self, rule: usize) -> Result<(), ParseError> {
        let (count, goto_col) = RULES[rule];
        let at = self.values.len() - count;
        let mut popped: Vec<StackValue> = self.values.split_off(at);
        self.states.truncate(self.states.len() - count);

        let node = match rule {
            1 => take_node(popped.pop())?,
            2 => match popped.pop() {
                Some(StackValue::Shifted(Token::Term(text))) => QueryNode::Term(text),
                _ => return Err(ParseError::UnexpectedEnd),
            },
            3 => QueryNode::Paren(Box::new(take_node(popped.drain(..).nth(1))?)),
            4 => QueryNode::Not(Box::new(take_node(popped.pop())?)),
            5 | 6 | 7 => {
                let right = take_node(popped.pop())?;
                popped.pop();
                let left = take_node(popped.pop())?;
                match rule {
                    5 => QueryNode::And(Box::new(left), Box::new(right)),
                    6 => QueryNode::Or(Box::new(left), Box::new(right)),
                    _ => QueryNode::Prox(Box::new(left), Box::new(right)),
                }
            }
            _ => return Err(ParseError::UnexpectedEnd),
        };

        let base = *self.states.last().unwrap() as usize;
        self.states.push(GOTO[base][goto_col]);
        self.values.push(StackValue::Node(node));
        Ok(())
    }
}

fn take_node(value: Option<StackValue>) -> Result<QueryNode, ParseError> {
    match value {
        Some(StackValue::Node(node)) => Ok(node),
        _ => Err(ParseError::UnexpectedEnd),
    }
}

fn column(token: Option<&Token>) -> Option<usize> {
    match token {
        None => Some(0),
        Some(Token::And) => Some(1),
        Some(Token::Or) => Some(2),
        Some(Token::Prox) => Some(3),
        Some(Token::Literal(b')')) => Some(4),
        Some(Token::Literal(b'(')) => Some(5),
        Some(Token::Not) => Some(6),
        Some(Token::Term(_)) => Some(7),
        Some(Token::Literal(_)) => None,
    }
}

fn reject(token: &Option<Token>) -> ParseError {
    match token {
        None => ParseError::UnexpectedEnd,
        Some(Token::Term(text)) => ParseError::UnexpectedToken(format!("term \"{}\"", text)),
        Some(Token::Literal(b)) => ParseError::UnexpectedToken(format!("'{}'", char::from(*b))),
        Some(other) => ParseError::UnexpectedToken(format!("{:?}", other)),
    }
}
