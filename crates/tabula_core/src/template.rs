//! Brace templates: `"{GO} {name:30} p={p_fdr:8.2e}\n"`.
//!
//! A template is literal text interleaved with `{field}`, `{field:spec}` or
//! `{field!conv:spec}` tokens. `{{` and `}}` produce literal braces. Field
//! formats (`"{:.1f}"`) use an empty or `0` field name to stand for the value
//! being formatted.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::error::{Result, TabulaError};
use crate::format::{FormatError, FormatSpec};
use crate::record::Record;
use crate::value::Value;

/// Matches escaped braces or a single field token; group 1 is the token body.
static FIELD_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{|\}\}|\{([^{}]*)\}").expect("field token pattern is valid")
});

/// `:N.M<type>}` precision specs, reduced to `:N}` for header text.
static PRECISION_SPEC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":(\d+)\.[^}\s]*\}").expect("precision pattern is valid"));

/// `:0N}` zero-padded specs, reduced to `:N}` for header text.
static ZERO_PAD_SPEC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":0+(\d+)\}").expect("zero-pad pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// `!s`: plain text of the value.
    Str,
    /// `!r` / `!a`: quoted text for strings.
    Repr,
}

impl Conversion {
    fn apply(self, value: &Value) -> Value {
        match (self, value) {
            (Conversion::Repr, Value::Str(s)) => {
                Value::Str(format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")))
            }
            _ => Value::Str(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field {
        name: String,
        conversion: Option<Conversion>,
        spec: FormatSpec,
    },
}

/// A parsed brace template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

fn parse_field(body: &str) -> std::result::Result<Segment, FormatError> {
    let (head, spec) = match body.split_once(':') {
        Some((head, spec)) => (head, spec),
        None => (body, ""),
    };
    let (name, conversion) = match head.split_once('!') {
        Some((name, "s")) => (name, Some(Conversion::Str)),
        Some((name, "r" | "a")) => (name, Some(Conversion::Repr)),
        Some((_, other)) => return Err(FormatError::UnknownConversion(other.to_string())),
        None => (head, None),
    };
    Ok(Segment::Field {
        name: name.to_string(),
        conversion,
        spec: FormatSpec::parse(spec)?,
    })
}

fn is_positional(name: &str) -> bool {
    name.chars().all(|c| c.is_ascii_digit())
}

impl Template {
    pub fn parse(source: &str) -> std::result::Result<Self, FormatError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((idx, c)) = chars.next() {
            match c {
                '{' if chars.peek().map(|(_, n)| *n) == Some('{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek().map(|(_, n)| *n) == Some('}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(FormatError::UnbalancedBrace('}')),
                '{' => {
                    let rest = &source[idx + 1..];
                    let close = rest.find('}').ok_or(FormatError::UnbalancedBrace('{'))?;
                    let body = &rest[..close];
                    if body.contains('{') {
                        return Err(FormatError::UnbalancedBrace('{'));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(parse_field(body)?);
                    // Skip the field body and its closing brace.
                    for _ in 0..=body.chars().count() {
                        chars.next();
                    }
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Field names in order of appearance, duplicates kept.
    pub fn field_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Field { name, .. } if !name.is_empty() => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    fn render_with<F>(&self, mut lookup: F) -> std::result::Result<String, FormatError>
    where
        F: FnMut(&str) -> std::result::Result<Value, FormatError>,
    {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field {
                    name,
                    conversion,
                    spec,
                } => {
                    let value = lookup(name)?;
                    let value = match conversion {
                        Some(conv) => conv.apply(&value),
                        None => value,
                    };
                    out.push_str(&spec.apply(&value)?);
                }
            }
        }
        Ok(out)
    }

    /// Fill named fields from a record.
    pub fn render(&self, record: &Record) -> std::result::Result<String, FormatError> {
        self.render_with(|name| {
            if is_positional(name) {
                return Err(FormatError::PositionalField(name.to_string()));
            }
            record
                .get(name)
                .cloned()
                .ok_or_else(|| FormatError::MissingField(name.to_string()))
        })
    }

    /// Fill `{}` / `{0}` fields with a single value.
    pub fn render_value(&self, value: &Value) -> std::result::Result<String, FormatError> {
        self.render_with(|name| match name {
            "" | "0" => Ok(value.clone()),
            other => Err(FormatError::MissingField(other.to_string())),
        })
    }
}

/// Field names referenced by `template`, in order, duplicates kept.
///
/// Any `:spec` or `!conversion` suffix is stripped; `{{`/`}}` escapes and
/// empty `{}` fields are skipped.
pub fn extract_field_names(template: &str) -> Vec<String> {
    FIELD_TOKEN
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|body| {
            let body = body.as_str();
            let end = body.find([':', '!']).unwrap_or(body.len());
            body[..end].to_string()
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// Fail unless every field in `template` is one of `expected`.
///
/// The error report lists each template field and marks the missing ones.
pub fn validate_template_fields<S: AsRef<str>>(expected: &[S], template: &str) -> Result<()> {
    let known: HashSet<&str> = expected.iter().map(AsRef::as_ref).collect();
    let fields = extract_field_names(template);
    if fields.iter().all(|f| known.contains(f.as_str())) {
        return Ok(());
    }
    let mut report = vec![format!("CANNOT PRINT USING: \"{}\"", template.trim_end())];
    for field in &fields {
        let mark = if known.contains(field.as_str()) { "" } else { "ERROR-->" };
        report.push(format!("  {mark:8} {field}"));
    }
    Err(TabulaError::TemplateFieldMismatch {
        template: template.to_string(),
        report: report.join("\n"),
    })
}

/// Rewrite numeric width specs so that a field name can fill the slot.
///
/// Only `:N.M…}` and `:0N}` are rewritten (to `:N}`); other specs are kept.
pub fn header_template(template: &str) -> String {
    let rewritten = PRECISION_SPEC.replace_all(template, ":${1}}");
    ZERO_PAD_SPEC.replace_all(&rewritten, ":${1}}").into_owned()
}

/// The header line for a text template: each field shows its own name.
///
/// Specs that still reject text after [`header_template`] are an error.
pub fn template_header(template: &str) -> Result<String> {
    let header = Template::parse(&header_template(template))?;
    let line = header.render_with(|name| {
        if is_positional(name) {
            return Err(FormatError::PositionalField(name.to_string()));
        }
        Ok(Value::Str(name.to_string()))
    })?;
    Ok(line)
}
