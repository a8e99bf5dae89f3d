//! Path expressions such as `season[1]`, `$.items[*].name` or `$[0]`.
//!
//! `$` optionally marks the root. Segments are separated by `.` and each
//! may be followed by any number of `[n]` or `[*]` element selectors.

use std::fmt;
use std::str::FromStr;

use crate::adapters::node_resolver::{
    ContainerElementNodeResolver, ElementIndex, IdentityNodeResolver, NodeResolver,
    PropertyNameNodeResolver,
};
use crate::domain::error::{GenerationError, GenerationResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionSegment {
    Property(String),
    Element(ElementIndex),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArbitraryExpression {
    expression: String,
    segments: Vec<ExpressionSegment>,
}

impl ArbitraryExpression {
    pub fn parse(expression: &str) -> GenerationResult<Self> {
        let trimmed = expression.trim();
        let (body, rooted) = match trimmed.strip_prefix('$') {
            Some(body) => (body, true),
            None => (trimmed, false),
        };
        if !rooted && body.is_empty() {
            return Err(GenerationError::invalid_expression(expression, "empty expression"));
        }

        let mut segments = Vec::new();
        let mut rest = body;
        let mut first = true;
        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('[') {
                let close = after
                    .find(']')
                    .ok_or_else(|| GenerationError::invalid_expression(expression, "unclosed '['"))?;
                segments.push(ExpressionSegment::Element(parse_index(expression, &after[..close])?));
                rest = &after[close + 1..];
            } else {
                if !first || rooted {
                    rest = rest.strip_prefix('.').ok_or_else(|| {
                        GenerationError::invalid_expression(
                            expression,
                            format!("expected '.' before '{}'", rest),
                        )
                    })?;
                }
                let end = rest.find(|c: char| c == '.' || c == '[').unwrap_or(rest.len());
                segments.push(ExpressionSegment::Property(parse_name(expression, &rest[..end])?));
                rest = &rest[end..];
            }
            first = false;
        }

        Ok(Self {
            expression: trimmed.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[ExpressionSegment] {
        &self.segments
    }

    /// Builds the nested resolver chain addressed by this expression.
    pub fn to_node_resolver(&self) -> Box<dyn NodeResolver> {
        self.segments
            .iter()
            .fold(IdentityNodeResolver.boxed(), |inner, segment| match segment {
                ExpressionSegment::Property(name) => {
                    PropertyNameNodeResolver::new(inner, name.clone()).boxed()
                }
                ExpressionSegment::Element(index) => {
                    ContainerElementNodeResolver::new(inner, *index).boxed()
                }
            })
    }
}

fn parse_name(expression: &str, name: &str) -> GenerationResult<String> {
    if name.is_empty() {
        return Err(GenerationError::invalid_expression(expression, "empty property name"));
    }
    if name.chars().any(|c| c.is_whitespace() || matches!(c, '$' | ']' | '*')) {
        return Err(GenerationError::invalid_expression(
            expression,
            format!("invalid property name '{}'", name),
        ));
    }
    Ok(name.to_string())
}

fn parse_index(expression: &str, raw: &str) -> GenerationResult<ElementIndex> {
    match raw.trim() {
        "*" => Ok(ElementIndex::All),
        digits => digits
            .parse::<usize>()
            .map(ElementIndex::At)
            .map_err(|_| GenerationError::invalid_expression(expression, format!("invalid index '{}'", raw))),
    }
}

impl FromStr for ArbitraryExpression {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ArbitraryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}
