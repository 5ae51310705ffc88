//! Minimal CSS-like selectors over the document tree
//!
//! Supported syntax: type (`g`), universal (`*`), id (`#logo`), class
//! (`.icon`), attribute presence (`[fill]`) and equality (`[fill="none"]`),
//! descendant (`svg g`) and child (`svg > g`) combinators, and comma-separated
//! selector lists.

use super::Node;
use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

/// Error parsing a selector string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid selector '{selector}': {message}")]
pub struct SelectorError {
    pub selector: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrMatch {
    Exists(String),
    Equals(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    /// `None` for the universal selector
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

impl Compound {
    fn matches(&self, node: Node<'_>) -> bool {
        if !node.is_element() {
            return false;
        }
        if let Some(tag) = &self.tag {
            if node.name() != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if node.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let classes: Vec<&str> = node.attr("class").unwrap_or("").split_whitespace().collect();
            if !self.classes.iter().all(|c| classes.contains(&c.as_str())) {
                return false;
            }
        }
        self.attrs.iter().all(|m| match m {
            AttrMatch::Exists(name) => node.has_attr(name),
            AttrMatch::Equals(name, value) => node.attr(name) == Some(value.as_str()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    /// Relation to the previous step; ignored for the first step
    combinator: Combinator,
    compound: Compound,
}

/// A parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    chains: Vec<Vec<Step>>,
}

impl Selector {
    pub fn parse(selector: &str) -> Result<Self, SelectorError> {
        let error = |message: &str| SelectorError {
            selector: selector.to_string(),
            message: message.to_string(),
        };

        let mut chains = Vec::new();
        for part in selector.split(',') {
            chains.push(parse_chain(part).map_err(|m| error(&m))?);
        }

        Ok(Self {
            source: selector.to_string(),
            chains,
        })
    }

    /// The selector text this was parsed from
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check whether an element matches any selector in the list
    pub fn matches(&self, node: Node<'_>) -> bool {
        self.chains
            .iter()
            .any(|chain| matches_chain(chain, chain.len() - 1, node))
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn matches_chain(chain: &[Step], idx: usize, node: Node<'_>) -> bool {
    let step = &chain[idx];
    if !step.compound.matches(node) {
        return false;
    }
    if idx == 0 {
        return true;
    }

    match step.combinator {
        Combinator::Child => node
            .parent()
            .is_some_and(|parent| matches_chain(chain, idx - 1, parent)),
        Combinator::Descendant => node
            .ancestors()
            .any(|ancestor| matches_chain(chain, idx - 1, ancestor)),
    }
}

fn parse_chain(input: &str) -> Result<Vec<Step>, String> {
    let mut chars = input.trim().chars().peekable();
    let mut steps = Vec::new();
    let mut pending = Combinator::Descendant;

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.peek() {
            None => break,
            Some('>') => {
                if steps.is_empty() || pending == Combinator::Child {
                    return Err("unexpected '>'".to_string());
                }
                chars.next();
                pending = Combinator::Child;
                continue;
            }
            Some(_) => {}
        }

        let compound = parse_compound(&mut chars)?;
        steps.push(Step {
            combinator: pending,
            compound,
        });
        pending = Combinator::Descendant;
    }

    if steps.is_empty() {
        return Err("empty selector".to_string());
    }
    if pending == Combinator::Child {
        return Err("dangling '>'".to_string());
    }
    Ok(steps)
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | ':')
}

fn read_name(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if !is_name_char(c) {
            break;
        }
        name.push(c);
        chars.next();
    }
    name
}

fn parse_compound(chars: &mut Peekable<Chars<'_>>) -> Result<Compound, String> {
    let mut compound = Compound::default();
    let mut empty = true;

    if chars.peek() == Some(&'*') {
        chars.next();
        empty = false;
    } else {
        let tag = read_name(chars);
        if !tag.is_empty() {
            compound.tag = Some(tag);
            empty = false;
        }
    }

    while let Some(&c) = chars.peek() {
        match c {
            '#' => {
                chars.next();
                let id = read_name(chars);
                if id.is_empty() {
                    return Err("expected id after '#'".to_string());
                }
                compound.id = Some(id);
            }
            '.' => {
                chars.next();
                let class = read_name(chars);
                if class.is_empty() {
                    return Err("expected class after '.'".to_string());
                }
                compound.classes.push(class);
            }
            '[' => {
                chars.next();
                compound.attrs.push(parse_attr(chars)?);
            }
            c if c.is_whitespace() || c == '>' => break,
            c => return Err(format!("unexpected character '{}'", c)),
        }
        empty = false;
    }

    if empty {
        return Err("expected a selector".to_string());
    }
    Ok(compound)
}

fn parse_attr(chars: &mut Peekable<Chars<'_>>) -> Result<AttrMatch, String> {
    let name = read_name(chars);
    if name.is_empty() {
        return Err("expected attribute name".to_string());
    }

    match chars.next() {
        Some(']') => Ok(AttrMatch::Exists(name)),
        Some('=') => {
            let value = match chars.peek() {
                Some(&quote @ ('"' | '\'')) => {
                    chars.next();
                    let value: String = chars.by_ref().take_while(|&c| c != quote).collect();
                    if chars.next() != Some(']') {
                        return Err("expected ']'".to_string());
                    }
                    value
                }
                _ => {
                    let mut value = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(c) => value.push(c),
                            None => return Err("expected ']'".to_string()),
                        }
                    }
                    value.trim().to_string()
                }
            };
            Ok(AttrMatch::Equals(name, value))
        }
        _ => Err("expected ']' or '='".to_string()),
    }
}
