//! Format spec mini-language for template fields.
//!
//! A spec is the part after the colon in `{field:spec}`:
//!
//! ```text
//! [[fill]align][sign][#][0][width][grouping][.precision][type]
//! ```
//!
//! - align: `<` left, `>` right, `^` center, `=` pad after the sign
//! - sign: `+`, `-`, or a space
//! - grouping: `,` or `_` thousands separator
//! - type: `s` for text; `d n x X o b c` for integers;
//!   `e E f F g G %` for floats (integers are promoted)
//!
//! Numbers align right by default, text aligns left.

use crate::value::{float_to_string, Value};

/// A value could not be rendered with the requested spec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("Invalid format specifier '{0}'")]
    InvalidSpec(String),

    #[error("Unknown format code '{code}' for value of kind '{kind}'")]
    UnknownCode { code: char, kind: &'static str },

    #[error("Precision not allowed in integer format specifier")]
    PrecisionNotAllowed,

    #[error("Sign not allowed in string format specifier")]
    SignNotAllowed,

    #[error("'=' alignment not allowed in string format specifier")]
    AlignNotAllowed,

    #[error("Grouping '{0}' not allowed in string format specifier")]
    GroupingNotAllowed(char),

    #[error("Format spec '{0}' not supported for null values")]
    NullSpec(String),

    #[error("Code point {0} out of range for format code 'c'")]
    CharOutOfRange(i64),

    #[error("Single '{0}' encountered in format string")]
    UnbalancedBrace(char),

    #[error("Missing field '{0}' in format arguments")]
    MissingField(String),

    #[error("Positional field '{{{0}}}' used where named fields are required")]
    PositionalField(String),

    #[error("Unknown conversion specifier '{0}'")]
    UnknownConversion(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
    AfterSign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sign {
    /// Only negative numbers carry a sign.
    #[default]
    Minus,
    Plus,
    Space,
}

/// A parsed format spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    raw: String,
    pub fill: Option<char>,
    pub align: Option<Align>,
    pub sign: Option<Sign>,
    pub alternate: bool,
    pub zero: bool,
    pub width: Option<usize>,
    pub grouping: Option<char>,
    pub precision: Option<usize>,
    pub kind: Option<char>,
}

fn align_of(c: char) -> Option<Align> {
    match c {
        '<' => Some(Align::Left),
        '>' => Some(Align::Right),
        '^' => Some(Align::Center),
        '=' => Some(Align::AfterSign),
        _ => None,
    }
}

fn read_digits(chars: &[char], i: &mut usize) -> Option<usize> {
    let start = *i;
    while *i < chars.len() && chars[*i].is_ascii_digit() {
        *i += 1;
    }
    if *i == start {
        return None;
    }
    chars[start..*i].iter().collect::<String>().parse().ok()
}

impl FormatSpec {
    pub fn parse(spec: &str) -> Result<Self, FormatError> {
        let chars: Vec<char> = spec.chars().collect();
        let invalid = || FormatError::InvalidSpec(spec.to_string());
        let mut parsed = FormatSpec {
            raw: spec.to_string(),
            fill: None,
            align: None,
            sign: None,
            alternate: false,
            zero: false,
            width: None,
            grouping: None,
            precision: None,
            kind: None,
        };
        let mut i = 0;

        if chars.len() >= 2 && align_of(chars[1]).is_some() {
            parsed.fill = Some(chars[0]);
            parsed.align = align_of(chars[1]);
            i = 2;
        } else if let Some(align) = chars.first().and_then(|c| align_of(*c)) {
            parsed.align = Some(align);
            i = 1;
        }

        if let Some(c) = chars.get(i) {
            parsed.sign = match c {
                '+' => Some(Sign::Plus),
                '-' => Some(Sign::Minus),
                ' ' => Some(Sign::Space),
                _ => None,
            };
            if parsed.sign.is_some() {
                i += 1;
            }
        }
        if chars.get(i) == Some(&'#') {
            parsed.alternate = true;
            i += 1;
        }
        if chars.get(i) == Some(&'0') {
            parsed.zero = true;
            i += 1;
        }
        parsed.width = read_digits(&chars, &mut i);
        if let Some(c @ (',' | '_')) = chars.get(i) {
            parsed.grouping = Some(*c);
            i += 1;
        }
        if chars.get(i) == Some(&'.') {
            i += 1;
            parsed.precision = Some(read_digits(&chars, &mut i).ok_or_else(invalid)?);
        }
        if let Some(c) = chars.get(i) {
            parsed.kind = Some(*c);
            i += 1;
        }
        if i != chars.len() {
            return Err(invalid());
        }
        Ok(parsed)
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Render `value` according to this spec.
    pub fn apply(&self, value: &Value) -> Result<String, FormatError> {
        match value {
            Value::Null if self.is_empty() => Ok(String::new()),
            Value::Null => Err(FormatError::NullSpec(self.raw.clone())),
            Value::Str(s) => self.apply_str(s),
            Value::Bool(b) => match self.kind {
                None | Some('s') => self.apply_str(&b.to_string()),
                _ => self.apply_int(i64::from(*b), value.kind()),
            },
            Value::Int(i) => self.apply_int(*i, value.kind()),
            Value::Float(x) => self.apply_float(*x, value.kind()),
        }
    }

    fn apply_str(&self, s: &str) -> Result<String, FormatError> {
        match self.kind {
            None | Some('s') => {}
            Some(code) => return Err(FormatError::UnknownCode { code, kind: "str" }),
        }
        if self.sign.is_some() {
            return Err(FormatError::SignNotAllowed);
        }
        if self.align == Some(Align::AfterSign) {
            return Err(FormatError::AlignNotAllowed);
        }
        if let Some(g) = self.grouping {
            return Err(FormatError::GroupingNotAllowed(g));
        }
        let body: String = match self.precision {
            Some(p) => s.chars().take(p).collect(),
            None => s.to_string(),
        };
        let fill = self.fill.unwrap_or(if self.zero { '0' } else { ' ' });
        Ok(pad("", &body, fill, self.align.unwrap_or(Align::Left), self.width))
    }

    fn apply_int(&self, i: i64, kind: &'static str) -> Result<String, FormatError> {
        let code = self.kind.unwrap_or('d');
        let magnitude = i.unsigned_abs();
        let (prefix, digits) = match code {
            'd' | 'n' => ("", magnitude.to_string()),
            'x' => ("0x", format!("{magnitude:x}")),
            'X' => ("0X", format!("{magnitude:X}")),
            'o' => ("0o", format!("{magnitude:o}")),
            'b' => ("0b", format!("{magnitude:b}")),
            'c' => {
                let ch = u32::try_from(i)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or(FormatError::CharOutOfRange(i))?;
                if self.sign.is_some() {
                    return Err(FormatError::SignNotAllowed);
                }
                let fill = self.fill.unwrap_or(' ');
                let align = self.align.unwrap_or(Align::Left);
                return Ok(pad("", &ch.to_string(), fill, align, self.width));
            }
            'e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%' => return self.apply_float(i as f64, kind),
            code => return Err(FormatError::UnknownCode { code, kind }),
        };
        if self.precision.is_some() {
            return Err(FormatError::PrecisionNotAllowed);
        }
        let mut lead = self.sign_text(i < 0).to_string();
        if self.alternate {
            lead.push_str(prefix);
        }
        let group_size = if matches!(code, 'd' | 'n') { 3 } else { 4 };
        let digits = match self.grouping {
            Some(sep) => self.grouped(&lead, &digits, "", sep, group_size),
            None => digits,
        };
        Ok(self.pad_number(&lead, &digits))
    }

    fn apply_float(&self, x: f64, kind: &'static str) -> Result<String, FormatError> {
        let upper = matches!(self.kind, Some('E' | 'F' | 'G'));
        let negative = x.is_sign_negative() && !x.is_nan();
        let magnitude = x.abs();
        let lead = self.sign_text(negative);

        let body = if !magnitude.is_finite() {
            let text = if magnitude.is_nan() { "nan" } else { "inf" };
            let text = if upper { text.to_uppercase() } else { text.to_string() };
            if self.kind == Some('%') { format!("{text}%") } else { text }
        } else {
            let body = match self.kind {
                None => match self.precision {
                    None => float_to_string(magnitude),
                    Some(p) => format_general(magnitude, p, self.alternate, false, true),
                },
                Some('f' | 'F') => format!("{:.*}", self.precision.unwrap_or(6), magnitude),
                Some(c @ ('e' | 'E')) => format_exp(magnitude, self.precision.unwrap_or(6), c == 'E'),
                Some(c @ ('g' | 'G' | 'n')) => format_general(
                    magnitude,
                    self.precision.unwrap_or(6),
                    self.alternate,
                    c == 'G',
                    false,
                ),
                Some('%') => format!("{:.*}%", self.precision.unwrap_or(6), magnitude * 100.0),
                Some(code) => return Err(FormatError::UnknownCode { code, kind }),
            };
            match self.grouping {
                Some(sep) => {
                    let end = body.find(|c: char| !c.is_ascii_digit()).unwrap_or(body.len());
                    self.grouped(lead, &body[..end], &body[end..], sep, 3)
                }
                None => body,
            }
        };
        Ok(self.pad_number(lead, &body))
    }

    fn sign_text(&self, negative: bool) -> &'static str {
        match (negative, self.sign.unwrap_or_default()) {
            (true, _) => "-",
            (false, Sign::Plus) => "+",
            (false, Sign::Space) => " ",
            (false, Sign::Minus) => "",
        }
    }

    /// Group `digits`, followed by `rest`. A bare `0` flag pads with
    /// grouped zeros, so the separators run through the padding.
    fn grouped(&self, lead: &str, digits: &str, rest: &str, sep: char, size: usize) -> String {
        let mut digits = digits.to_string();
        let mut body = group_digits(&digits, sep, size);
        if self.zero && self.fill.is_none() && self.align.is_none() {
            let fixed = lead.chars().count() + rest.chars().count();
            let target = self.width.unwrap_or(0).saturating_sub(fixed);
            while body.chars().count() < target {
                digits.insert(0, '0');
                body = group_digits(&digits, sep, size);
            }
        }
        format!("{body}{rest}")
    }

    /// The `0` flag supplies the fill and the alignment only where they
    /// are not given explicitly.
    fn pad_number(&self, lead: &str, body: &str) -> String {
        let fill = self.fill.unwrap_or(if self.zero { '0' } else { ' ' });
        let align = self
            .align
            .unwrap_or(if self.zero { Align::AfterSign } else { Align::Right });
        pad(lead, body, fill, align, self.width)
    }
}

fn pad(lead: &str, body: &str, fill: char, align: Align, width: Option<usize>) -> String {
    let len = lead.chars().count() + body.chars().count();
    let total = width.unwrap_or(0).saturating_sub(len);
    let fills = |n: usize| std::iter::repeat_n(fill, n).collect::<String>();
    match align {
        Align::Left => format!("{lead}{body}{}", fills(total)),
        Align::Right => format!("{}{lead}{body}", fills(total)),
        Align::Center => {
            let left = total / 2;
            format!("{}{lead}{body}{}", fills(left), fills(total - left))
        }
        Align::AfterSign => format!("{lead}{}{body}", fills(total)),
    }
}

fn group_digits(digits: &str, sep: char, size: usize) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(chars.len() + chars.len() / size);
    for (idx, c) in chars.iter().enumerate() {
        if idx > 0 && (chars.len() - idx) % size == 0 {
            out.push(sep);
        }
        out.push(*c);
    }
    out
}

/// Scientific notation with a signed, at least two digit exponent.
fn format_exp(x: f64, precision: usize, upper: bool) -> String {
    let raw = format!("{:.*e}", precision, x);
    let (mantissa, exp) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let marker = if upper { 'E' } else { 'e' };
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}{marker}{sign}{:02}", exp.abs())
}

fn decimal_exponent(x: f64, precision: usize) -> i32 {
    if x == 0.0 {
        return 0;
    }
    let raw = format!("{:.*e}", precision, x);
    raw.split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0)
}

/// General format: fixed or scientific depending on magnitude, trailing
/// zeros removed unless `alternate`.
///
/// With `dot_zero` (a precision and no type code) fixed output keeps at
/// least one decimal, and values that would print as a whole number of
/// `precision` digits switch to scientific form instead.
fn format_general(
    x: f64,
    precision: usize,
    alternate: bool,
    upper: bool,
    dot_zero: bool,
) -> String {
    let p = precision.max(1);
    let exp = decimal_exponent(x, p - 1);
    let fixed_below = if dot_zero { p as i32 - 1 } else { p as i32 };
    let text = if (-4..fixed_below).contains(&exp) {
        format!("{:.*}", (p as i32 - 1 - exp) as usize, x)
    } else {
        format_exp(x, p - 1, upper)
    };
    if alternate {
        return text;
    }
    let (mantissa, tail) = match text.find(['e', 'E']) {
        Some(pos) => text.split_at(pos),
        None => (text.as_str(), ""),
    };
    let mantissa = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    if dot_zero && tail.is_empty() {
        return format!("{mantissa}.0");
    }
    format!("{mantissa}{tail}")
}

/// Parse `spec` and render `value` with it.
pub fn format_value(value: &Value, spec: &str) -> Result<String, FormatError> {
    FormatSpec::parse(spec)?.apply(value)
}
