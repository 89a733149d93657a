//! A small HTML-ish parser and serializer.
//!
//! Supports elements, quoted, unquoted and boolean attributes, text,
//! comments (dropped), doctypes (dropped) and void elements. Children of a
//! `<template>` go to its content fragment. Stray end tags are ignored and
//! unclosed elements are closed at the end of input.

use std::rc::Weak;

use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case, take_till, take_until, take_while, take_while1};
use nom::character::complete::{char, multispace0, multispace1, satisfy};
use nom::combinator::{map, opt, recognize};
use nom::multi::many0;
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use nom::IResult;

use crate::document::DocumentInner;
use crate::error::DomError;
use crate::node::{Node, NodeKind};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

#[derive(Debug, PartialEq)]
enum Token<'input> {
    Open {
        name: &'input str,
        attributes: Vec<(&'input str, Option<&'input str>)>,
        self_closing: bool,
    },
    Close(&'input str),
    Text(&'input str),
    Ignored,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')
}

fn tag_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(satisfy(|c| c.is_ascii_alphabetic()), take_while(is_name_char)))(input)
}

fn attribute_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '"' | '\''))(input)
}

fn attribute_value(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_till(|c: char| c == '"'), char('"')),
        delimited(char('\''), take_till(|c: char| c == '\''), char('\'')),
        take_while1(|c: char| !c.is_whitespace() && c != '>'),
    ))(input)
}

fn attribute(input: &str) -> IResult<&str, (&str, Option<&str>)> {
    pair(
        attribute_name,
        opt(preceded(
            tuple((multispace0, char('='), multispace0)),
            attribute_value,
        )),
    )(input)
}

fn parse_open(input: &str) -> IResult<&str, Token<'_>> {
    map(
        tuple((
            preceded(char('<'), tag_name),
            many0(preceded(multispace1, attribute)),
            multispace0,
            opt(char('/')),
            char('>'),
        )),
        |(name, attributes, _, slash, _)| Token::Open {
            name,
            attributes,
            self_closing: slash.is_some(),
        },
    )(input)
}

fn parse_close(input: &str) -> IResult<&str, Token<'_>> {
    map(
        delimited(tag("</"), tag_name, pair(multispace0, char('>'))),
        Token::Close,
    )(input)
}

fn parse_comment(input: &str) -> IResult<&str, Token<'_>> {
    map(
        delimited(tag("<!--"), take_until("-->"), tag("-->")),
        |_| Token::Ignored,
    )(input)
}

fn parse_doctype(input: &str) -> IResult<&str, Token<'_>> {
    map(
        terminated(preceded(tag_no_case("<!doctype"), take_till(|c: char| c == '>')), char('>')),
        |_| Token::Ignored,
    )(input)
}

fn parse_text(input: &str) -> IResult<&str, Token<'_>> {
    map(take_while1(|c: char| c != '<'), Token::Text)(input)
}

fn parse_token(input: &str) -> IResult<&str, Token<'_>> {
    alt((parse_comment, parse_doctype, parse_close, parse_open, parse_text))(input)
}

fn next_token(source: &str, position: usize) -> Result<(Token<'_>, usize), DomError> {
    let current = &source[position..];
    if let Ok((remaining, token)) = parse_token(current) {
        return Ok((token, source.len() - remaining.len()));
    }
    if current.starts_with("<!--") {
        return Err(DomError::Markup {
            offset: position,
            message: "unterminated comment".to_string(),
        });
    }
    if current[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(DomError::Markup {
            offset: position,
            message: "malformed start tag".to_string(),
        });
    }
    // A lone '<' is text.
    Ok((Token::Text(&current[..1]), position + 1))
}

fn container_of(node: &Node) -> Node {
    node.template_content().unwrap_or_else(|| node.clone())
}

/// Parses `source` into a detached fragment. Elements are not upgraded.
pub(crate) fn parse_fragment(
    document: Weak<DocumentInner>,
    source: &str,
) -> Result<Node, DomError> {
    let fragment = Node::create(NodeKind::Fragment, document.clone());
    let mut stack = vec![fragment.clone()];
    let mut position = 0;

    while position < source.len() {
        let (token, next) = next_token(source, position)?;
        position = next;
        let parent = container_of(stack.last().expect("fragment stays at the bottom"));
        match token {
            Token::Open {
                name,
                attributes,
                self_closing,
            } => {
                let name = name.to_ascii_lowercase();
                let element = Node::create(NodeKind::Element(name.clone()), document.clone());
                for (attribute, value) in attributes {
                    element.set_attribute(attribute, value.map(decode_entities).unwrap_or_default());
                }
                parent.push_child_unchecked(&element);
                if !self_closing && !is_void_element(&name) {
                    stack.push(element);
                }
            }
            Token::Close(name) => {
                let name = name.to_ascii_lowercase();
                if let Some(index) = stack
                    .iter()
                    .rposition(|open| open.local_name() == Some(name.as_str()))
                {
                    if index > 0 {
                        stack.truncate(index);
                    }
                }
            }
            Token::Text(text) => {
                let node = Node::create(NodeKind::Text, document.clone());
                node.set_text_unchecked(&decode_entities(text));
                parent.push_child_unchecked(&node);
            }
            Token::Ignored => {}
        }
    }
    Ok(fragment)
}

pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub(crate) fn serialize(node: &Node, out: &mut String) {
    match node.kind() {
        NodeKind::Text => out.push_str(&escape(&node.text_content())),
        NodeKind::Element(name) => {
            out.push('<');
            out.push_str(name);
            for (attribute, value) in node.attributes() {
                out.push(' ');
                out.push_str(&attribute);
                out.push_str("=\"");
                out.push_str(&escape(&value));
                out.push('"');
            }
            out.push('>');
            if is_void_element(name) {
                return;
            }
            for child in container_of(node).children() {
                serialize(&child, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        NodeKind::Document | NodeKind::Fragment | NodeKind::ShadowRoot(_) => {
            for child in node.children() {
                serialize(&child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_tag_with_mixed_attributes() {
        let (rest, token) = parse_open(r#"<a href="/x" data-id=7 hidden>tail"#).unwrap();
        assert_eq!(rest, "tail");
        assert_eq!(
            token,
            Token::Open {
                name: "a",
                attributes: vec![("href", Some("/x")), ("data-id", Some("7")), ("hidden", None)],
                self_closing: false,
            }
        );
    }

    #[test]
    fn self_closing_tag() {
        let (_, token) = parse_open("<br/>").unwrap();
        assert!(matches!(token, Token::Open { name: "br", self_closing: true, .. }));
    }

    #[test]
    fn comments_and_doctypes_are_ignored() {
        assert_eq!(parse_token("<!-- hi -->x").unwrap(), ("x", Token::Ignored));
        assert_eq!(parse_token("<!DOCTYPE html>x").unwrap(), ("x", Token::Ignored));
    }

    #[test]
    fn entities_round_trip_through_escape() {
        let raw = r#"<b class="x">Tom & 'Jerry'</b>"#;
        assert_eq!(decode_entities(&escape(raw)), raw);
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn unterminated_comment_reports_offset() {
        let err = parse_fragment(Weak::new(), "ab<!-- open").unwrap_err();
        assert_eq!(
            err,
            DomError::Markup {
                offset: 2,
                message: "unterminated comment".to_string()
            }
        );
    }
}
