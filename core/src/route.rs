//! Route templates and their resolution into concrete request paths.
//!
//! # Design
//! A template such as `/user/{user_id}/attack` is split into literal text and
//! named placeholders. Every placeholder must be bound exactly once and every
//! bound parameter must be used, so a malformed path is rejected when the
//! `Route` is built rather than when the server answers 404.
//!
//! Parameter values are percent-encoded with everything outside the RFC 3986
//! unreserved set escaped, `/` included, so a value can never leak into a
//! neighbouring path segment.

use std::fmt::Display;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{ApiError, Result};
use crate::http::HttpMethod;

/// Bytes left untouched when encoding a parameter value.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// One API call: a method plus a fully resolved path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    method: HttpMethod,
    path: String,
}

impl Route {
    /// Route for a template without placeholders.
    pub fn new(method: HttpMethod, template: &str) -> Result<Self> {
        Self::builder(method, template).build()
    }

    pub fn builder(method: HttpMethod, template: &str) -> RouteBuilder {
        RouteBuilder {
            method,
            template: template.to_string(),
            params: Vec::new(),
        }
    }

    pub fn get(template: &str) -> RouteBuilder {
        Self::builder(HttpMethod::Get, template)
    }

    pub fn post(template: &str) -> RouteBuilder {
        Self::builder(HttpMethod::Post, template)
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Collects parameters for a template and resolves them into a `Route`.
#[derive(Debug, Clone)]
pub struct RouteBuilder {
    method: HttpMethod,
    template: String,
    params: Vec<(String, String)>,
}

impl RouteBuilder {
    /// Bind `name` to the `Display` form of `value`.
    pub fn param(mut self, name: &str, value: impl Display) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }

    pub fn build(self) -> Result<Route> {
        for (i, (name, _)) in self.params.iter().enumerate() {
            if self.params[..i].iter().any(|(earlier, _)| earlier == name) {
                return Err(ApiError::DuplicateParameter(name.clone()));
            }
        }

        let segments = parse_template(&self.template)?;
        let mut used = vec![false; self.params.len()];
        let mut path = String::with_capacity(self.template.len());

        for segment in segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Placeholder(name) => {
                    let index = self
                        .params
                        .iter()
                        .position(|(key, _)| key == name)
                        .ok_or_else(|| ApiError::MissingParameter(name.to_string()))?;
                    used[index] = true;
                    path.extend(utf8_percent_encode(&self.params[index].1, PATH_SEGMENT));
                }
            }
        }

        if let Some(index) = used.iter().position(|u| !u) {
            return Err(ApiError::UnusedParameter(self.params[index].0.clone()));
        }

        Ok(Route {
            method: self.method,
            path,
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

/// Split a template into literal runs and `{name}` placeholders.
fn parse_template(template: &str) -> Result<Vec<Segment<'_>>> {
    let invalid = || ApiError::InvalidTemplate(template.to_string());
    let mut segments = Vec::new();
    let mut rest = template;

    while !rest.is_empty() {
        match rest.find(['{', '}']) {
            None => {
                segments.push(Segment::Literal(rest));
                break;
            }
            Some(start) if rest.as_bytes()[start] == b'}' => return Err(invalid()),
            Some(start) => {
                if start > 0 {
                    segments.push(Segment::Literal(&rest[..start]));
                }
                let after = &rest[start + 1..];
                let end = after.find(['{', '}']).ok_or_else(invalid)?;
                if after.as_bytes()[end] == b'{' {
                    return Err(invalid());
                }
                let name = &after[..end];
                if name.is_empty() {
                    return Err(invalid());
                }
                segments.push(Segment::Placeholder(name));
                rest = &after[end + 1..];
            }
        }
    }

    Ok(segments)
}
