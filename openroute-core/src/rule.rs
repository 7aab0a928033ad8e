use std::fmt;

use crate::error::RegistrationError;

/// One segment of a URL rule.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param { name: String, converter: Converter },
}

/// Placeholder converter, as in `<int:bid>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    String,
    Int,
    Float,
    /// Matches the rest of the path, slashes included.
    Path,
    Uuid,
}

impl Converter {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Converter::String),
            "int" => Some(Converter::Int),
            "float" => Some(Converter::Float),
            "path" => Some(Converter::Path),
            "uuid" => Some(Converter::Uuid),
            _ => None,
        }
    }
}

/// A parsed URL rule such as `/book/<int:bid>` or `/book/{bid}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    source: String,
    segments: Vec<Segment>,
}

impl RouteRule {
    pub fn parse(rule: &str) -> Result<Self, RegistrationError> {
        let invalid = |reason: &str| RegistrationError::InvalidRule {
            rule: rule.to_string(),
            reason: reason.to_string(),
        };

        if !rule.starts_with('/') {
            return Err(invalid("rule must start with '/'"));
        }

        let mut segments = Vec::new();
        let parts: Vec<&str> = rule[1..].split('/').collect();
        let last = parts.len() - 1;
        for (i, part) in parts.iter().enumerate() {
            let inner = part
                .strip_prefix('<')
                .and_then(|p| p.strip_suffix('>'))
                .or_else(|| part.strip_prefix('{').and_then(|p| p.strip_suffix('}')));

            let Some(inner) = inner else {
                if part.contains(['<', '>', '{', '}']) {
                    return Err(invalid("placeholders must span a whole segment"));
                }
                segments.push(Segment::Literal(part.to_string()));
                continue;
            };

            let (converter, name) = match inner.split_once(':') {
                Some((conv, name)) => (
                    Converter::parse(conv)
                        .ok_or_else(|| invalid(&format!("unknown converter `{conv}`")))?,
                    name,
                ),
                None => match inner.strip_prefix('*') {
                    Some(name) => (Converter::Path, name),
                    None => (Converter::String, inner),
                },
            };

            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid(&format!("invalid placeholder name `{name}`")));
            }
            if converter == Converter::Path && i != last {
                return Err(invalid("a path placeholder must be the last segment"));
            }
            if segments
                .iter()
                .any(|s| matches!(s, Segment::Param { name: n, .. } if n == name))
            {
                return Err(invalid(&format!("placeholder `{name}` appears twice")));
            }
            segments.push(Segment::Param {
                name: name.to_string(),
                converter,
            });
        }

        Ok(Self {
            source: rule.to_string(),
            segments,
        })
    }

    /// The rule as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Placeholder names in order of appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param { name, .. } => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    pub fn converter(&self, name: &str) -> Option<Converter> {
        self.segments.iter().find_map(|s| match s {
            Segment::Param { name: n, converter } if n == name => Some(*converter),
            _ => None,
        })
    }

    /// Path in OpenAPI syntax: `/book/{bid}`.
    pub fn openapi_path(&self) -> String {
        self.render(|name, _| format!("{{{name}}}"))
    }

    /// Path in router syntax: `/book/{bid}`, `/files/{*rest}`.
    pub fn axum_path(&self) -> String {
        self.render(|name, converter| match converter {
            Converter::Path => format!("{{*{name}}}"),
            _ => format!("{{{name}}}"),
        })
    }

    /// Key used to detect conflicting registrations; placeholder names do not
    /// distinguish two rules.
    pub(crate) fn conflict_key(&self) -> String {
        self.render(|_, converter| match converter {
            Converter::Path => "{*}".to_string(),
            _ => "{}".to_string(),
        })
    }

    /// This rule mounted under `prefix` (`/api` + `/book` = `/api/book`).
    pub fn prefixed(&self, prefix: &str) -> Result<Self, RegistrationError> {
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return Ok(self.clone());
        }
        let prefix = if prefix.starts_with('/') {
            prefix.to_string()
        } else {
            format!("/{prefix}")
        };
        Self::parse(&format!("{prefix}{}", self.source))
    }

    fn render(&self, param: impl Fn(&str, Converter) -> String) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Param { name, converter } => out.push_str(&param(name, *converter)),
            }
        }
        out
    }
}

impl fmt::Display for RouteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
