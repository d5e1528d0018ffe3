//! # Delimited Text Grammar
//!
//! Splits the textual form of collections and regular arrays into literal
//! tokens; the literals themselves are decoded by each kind's
//! `Item::parse_literal`.
//!
//! ## Grammar
//!
//! ```text
//! collection := ε | item ("," item)*
//! regular    := shape? list
//! shape      := "<" extent ("," extent)* ">"
//! list       := "[" (value ("," value)*)? "]"
//! value      := list | item
//! item       := quoted | bare
//! quoted     := '"' (char | '\"' | '\\')* '"'
//! bare       := any characters up to the next ',' '[' ']' (trimmed)
//! ```
//!
//! Whitespace around items, brackets and delimiters is ignored. Quoted items
//! keep their content exactly, which is how Text values with leading spaces,
//! commas or brackets survive a round trip.
//!
//! Without a shape prefix the extents are read off the first element at
//! each nesting level and every other list must match them. A zero extent
//! hides every deeper axis, so formatters emit the prefix whenever the
//! array holds no items.

use crate::config::{
    CLOSE_BRACKET, ESCAPE, ITEM_DELIMITER, MAX_RANK, OPEN_BRACKET, QUOTE, SHAPE_CLOSE,
    SHAPE_OPEN,
};
use crate::error::CodecError;
use eyre::{bail, ensure, Result};
use smallvec::SmallVec;
use std::fmt::Write;

/// One literal as it appeared in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub quoted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(Token),
    List(Vec<Node>),
}

/// A parsed regular array literal: optional explicit shape plus nesting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedText {
    pub shape: Option<SmallVec<[usize; 4]>>,
    pub root: Node,
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.bump() {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => bail!(CodecError::parse(format!(
                "expected '{}' at position {}, found '{}'",
                expected,
                self.pos - ch.len_utf8(),
                ch
            ))),
            None => bail!(CodecError::parse(format!(
                "expected '{}' at end of input",
                expected
            ))),
        }
    }

    fn token(&mut self, stops: &[char]) -> Result<Token> {
        self.skip_whitespace();
        if self.peek() == Some(QUOTE) {
            return self.quoted();
        }

        let start = self.pos;
        while let Some(ch) = self.peek() {
            if stops.contains(&ch) {
                break;
            }
            ensure!(
                ch != QUOTE,
                CodecError::parse(format!("unexpected quote at position {}", self.pos))
            );
            self.bump();
        }
        let text = self.src[start..self.pos].trim();
        ensure!(
            !text.is_empty(),
            CodecError::parse(format!("empty item at position {}", start))
        );
        Ok(Token {
            text: text.to_string(),
            quoted: false,
        })
    }

    fn quoted(&mut self) -> Result<Token> {
        let start = self.pos;
        self.expect(QUOTE)?;
        let mut text = String::new();
        loop {
            match self.bump() {
                Some(ESCAPE) => match self.bump() {
                    Some(ch) => text.push(ch),
                    None => break,
                },
                Some(QUOTE) => {
                    return Ok(Token { text, quoted: true });
                }
                Some(ch) => text.push(ch),
                None => break,
            }
        }
        bail!(CodecError::parse(format!(
            "unterminated quoted item starting at position {}",
            start
        )))
    }

    fn shape(&mut self) -> Result<SmallVec<[usize; 4]>> {
        self.expect(SHAPE_OPEN)?;
        let mut dims = SmallVec::new();
        loop {
            let token = self.token(&[ITEM_DELIMITER, SHAPE_CLOSE])?;
            let extent = token.text.parse::<usize>().map_err(|_| {
                eyre::Report::new(CodecError::parse(format!(
                    "invalid extent '{}' in shape prefix",
                    token.text
                )))
            })?;
            dims.push(extent);
            self.skip_whitespace();
            match self.peek() {
                Some(ITEM_DELIMITER) => {
                    self.bump();
                }
                _ => break,
            }
        }
        self.expect(SHAPE_CLOSE)?;
        Ok(dims)
    }

    fn value(&mut self, depth: usize) -> Result<Node> {
        self.skip_whitespace();
        if self.peek() == Some(OPEN_BRACKET) {
            self.list(depth)
        } else {
            Ok(Node::Leaf(self.token(&[
                ITEM_DELIMITER,
                OPEN_BRACKET,
                CLOSE_BRACKET,
            ])?))
        }
    }

    fn list(&mut self, depth: usize) -> Result<Node> {
        ensure!(
            depth < MAX_RANK,
            CodecError::parse(format!("nesting deeper than {} levels", MAX_RANK))
        );
        self.expect(OPEN_BRACKET)?;
        let mut children = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(CLOSE_BRACKET) {
            self.bump();
            return Ok(Node::List(children));
        }
        loop {
            children.push(self.value(depth + 1)?);
            self.skip_whitespace();
            match self.bump() {
                Some(ITEM_DELIMITER) => {}
                Some(CLOSE_BRACKET) => return Ok(Node::List(children)),
                Some(ch) => bail!(CodecError::parse(format!(
                    "unexpected '{}' at position {}",
                    ch,
                    self.pos - ch.len_utf8()
                ))),
                None => bail!(CodecError::parse("unterminated list")),
            }
        }
    }
}

/// Splits a collection literal into its items.
pub fn split_items(text: &str) -> Result<Vec<Token>> {
    let mut scanner = Scanner::new(text);
    let mut tokens = Vec::new();
    scanner.skip_whitespace();
    if scanner.at_end() {
        return Ok(tokens);
    }
    loop {
        tokens.push(scanner.token(&[ITEM_DELIMITER])?);
        scanner.skip_whitespace();
        match scanner.bump() {
            None => return Ok(tokens),
            Some(ITEM_DELIMITER) => {}
            Some(ch) => bail!(CodecError::parse(format!(
                "unexpected '{}' after item at position {}",
                ch,
                scanner.pos - ch.len_utf8()
            ))),
        }
    }
}

pub fn parse_nested(text: &str) -> Result<NestedText> {
    let mut scanner = Scanner::new(text);
    scanner.skip_whitespace();
    let shape = if scanner.peek() == Some(SHAPE_OPEN) {
        Some(scanner.shape()?)
    } else {
        None
    };
    scanner.skip_whitespace();
    let root = scanner.list(0)?;
    scanner.skip_whitespace();
    ensure!(
        scanner.at_end(),
        CodecError::parse(format!("trailing input at position {}", scanner.pos))
    );
    Ok(NestedText { shape, root })
}

/// Reads extents off the first element of each nesting level.
pub fn infer_shape(root: &Node) -> SmallVec<[usize; 4]> {
    let mut dims = SmallVec::new();
    let mut node = root;
    while let Node::List(children) = node {
        dims.push(children.len());
        match children.first() {
            Some(first) => node = first,
            None => break,
        }
    }
    dims
}

/// Checks `root` is a rectangular nesting of shape `dims` and returns its
/// leaves in row-major order.
pub fn flatten(root: &Node, dims: &[usize]) -> Result<Vec<Token>> {
    fn walk(node: &Node, dims: &[usize], depth: usize, out: &mut Vec<Token>) -> Result<()> {
        match (node, dims.get(depth)) {
            (Node::List(children), Some(&extent)) => {
                ensure!(
                    children.len() == extent,
                    CodecError::parse(format!(
                        "axis {} has {} items, expected {}",
                        depth,
                        children.len(),
                        extent
                    ))
                );
                for child in children {
                    walk(child, dims, depth + 1, out)?;
                }
                Ok(())
            }
            (Node::Leaf(token), None) => {
                out.push(token.clone());
                Ok(())
            }
            (Node::Leaf(token), Some(_)) => bail!(CodecError::parse(format!(
                "item '{}' found at depth {}, expected a list",
                token.text, depth
            ))),
            (Node::List(_), None) => bail!(CodecError::parse(format!(
                "list nested deeper than rank {}",
                dims.len()
            ))),
        }
    }

    let mut out = Vec::new();
    walk(root, dims, 0, &mut out)?;
    Ok(out)
}

pub fn write_shape(out: &mut String, dims: &[usize]) {
    out.push(SHAPE_OPEN);
    for (i, d) in dims.iter().enumerate() {
        if i > 0 {
            out.push(ITEM_DELIMITER);
        }
        let _ = write!(out, "{}", d);
    }
    out.push(SHAPE_CLOSE);
}

/// Writes `items` as nested lists of shape `dims`.
pub fn write_nested<T>(
    out: &mut String,
    dims: &[usize],
    items: &[T],
    write_item: &mut impl FnMut(&T, &mut String),
) {
    out.push(OPEN_BRACKET);
    match dims {
        [] | [_] => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(ITEM_DELIMITER);
                }
                write_item(item, out);
            }
        }
        [extent, rest @ ..] => {
            let inner: usize = if rest.contains(&0) {
                0
            } else {
                rest.iter().product()
            };
            for i in 0..*extent {
                if i > 0 {
                    out.push(ITEM_DELIMITER);
                }
                let chunk = items.get(i * inner..(i + 1) * inner).unwrap_or(&[]);
                write_nested(out, rest, chunk, write_item);
            }
        }
    }
    out.push(CLOSE_BRACKET);
}
