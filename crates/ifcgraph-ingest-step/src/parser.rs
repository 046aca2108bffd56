//! STEP physical file parser
//!
//! Parses ISO 10303-21 exchange files as written by IFC authoring tools.
//! The header section is read generically; the data section yields one
//! [`StepEntity`] per instance record, in file order.

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit1, multispace0, one_of},
    combinator::{map, map_res, opt, recognize, value},
    multi::{many1, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use ifcgraph_model::GraphError;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

// ============================================================================
// STEP Data Types
// ============================================================================

/// A complete STEP file
#[derive(Debug, Clone)]
pub struct StepFile {
    pub header: StepHeader,
    pub entities: Vec<StepEntity>,
}

/// STEP file header section
#[derive(Debug, Clone, Default)]
pub struct StepHeader {
    pub file_description: Vec<String>,
    pub file_name: Option<String>,
    pub file_schema: Vec<String>,
}

/// A STEP entity instance
#[derive(Debug, Clone, PartialEq)]
pub struct StepEntity {
    pub id: u64,
    /// Type keyword as written in the file (usually upper case).
    pub keyword: String,
    pub args: Vec<StepValue>,
}

/// STEP attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    /// `$`
    Null,
    /// `*`
    Derived,
    Bool(bool),
    Enum(String),
    Int(i64),
    Real(f64),
    Str(String),
    /// `"0123ABC"` hex-encoded binary, kept as written.
    Binary(String),
    Ref(u64),
    List(Vec<StepValue>),
    /// Inline typed primitive, e.g. `IFCLABEL('x')`.
    Typed(String, Box<StepValue>),
}

impl StepValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StepValue::Str(s) => Some(s),
            StepValue::Typed(_, inner) => inner.as_str(),
            _ => None,
        }
    }

    /// Every instance reference held by this value, including inside lists.
    pub fn references(&self, out: &mut Vec<u64>) {
        match self {
            StepValue::Ref(id) => out.push(*id),
            StepValue::List(items) => items.iter().for_each(|v| v.references(out)),
            _ => {}
        }
    }

    pub fn refers_to(&self, id: u64) -> bool {
        match self {
            StepValue::Ref(r) => *r == id,
            StepValue::List(items) => items.iter().any(|v| v.refers_to(id)),
            _ => false,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum StepParseError {
    #[error("missing ISO-10303-21 preamble")]
    MissingPreamble,
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
}

impl StepParseError {
    pub fn line(&self) -> usize {
        match self {
            StepParseError::MissingPreamble => 1,
            StepParseError::Syntax { line, .. } => *line,
        }
    }
}

impl From<StepParseError> for GraphError {
    fn from(err: StepParseError) -> Self {
        GraphError::Parse {
            line: err.line(),
            message: err.to_string(),
        }
    }
}

pub const PREAMBLE: &str = "ISO-10303-21;";

// ============================================================================
// Entry point
// ============================================================================

/// Parse a complete STEP file.
pub fn parse_step(text: &str) -> Result<StepFile, StepParseError> {
    let clean = strip_comments(text);
    let full = clean.as_str();

    let rest = full.trim_start_matches('\u{feff}').trim_start();
    let rest = rest
        .strip_prefix(PREAMBLE)
        .ok_or(StepParseError::MissingPreamble)?;

    let mut header = StepHeader::default();
    let mut entities = Vec::new();
    let mut input = rest;

    loop {
        input = input.trim_start();
        if input.is_empty() || input.starts_with("END-ISO-10303-21") {
            break;
        }
        if let Some(after) = input.strip_prefix("HEADER;") {
            input = parse_header_section(full, after, &mut header)?;
        } else if let Some(after) = input.strip_prefix("DATA;") {
            input = parse_data_section(full, after, &mut entities)?;
        } else {
            return Err(syntax_error(full, input, "expected HEADER; or DATA; section"));
        }
    }

    Ok(StepFile { header, entities })
}

fn parse_header_section<'a>(
    full: &str,
    mut input: &'a str,
    header: &mut StepHeader,
) -> Result<&'a str, StepParseError> {
    loop {
        input = input.trim_start();
        if let Some(after) = input.strip_prefix("ENDSEC;") {
            return Ok(after);
        }
        let (rest, (keyword, args)) = header_record(input)
            .map_err(|_| syntax_error(full, input, "malformed header record"))?;
        match keyword {
            "FILE_DESCRIPTION" => header.file_description = string_list(args.first()),
            "FILE_NAME" => header.file_name = args.first().and_then(|v| v.as_str()).map(String::from),
            "FILE_SCHEMA" => header.file_schema = string_list(args.first()),
            _ => {}
        }
        input = rest;
    }
}

fn parse_data_section<'a>(
    full: &str,
    mut input: &'a str,
    entities: &mut Vec<StepEntity>,
) -> Result<&'a str, StepParseError> {
    loop {
        input = input.trim_start();
        if let Some(after) = input.strip_prefix("ENDSEC;") {
            return Ok(after);
        }
        if input.is_empty() {
            return Err(syntax_error(full, input, "unterminated DATA section"));
        }
        let (rest, entity) =
            parse_entity(input).map_err(|_| syntax_error(full, input, "malformed entity instance"))?;
        entities.push(entity);
        input = rest;
    }
}

fn syntax_error(full: &str, at: &str, message: &str) -> StepParseError {
    let offset = full.len().saturating_sub(at.len());
    let line = full[..offset].matches('\n').count() + 1;
    StepParseError::Syntax {
        line,
        message: message.to_string(),
    }
}

fn string_list(value: Option<&StepValue>) -> Vec<String> {
    match value {
        Some(StepValue::List(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        Some(StepValue::Str(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Blank out `/* ... */` comments outside quoted strings, keeping line breaks
/// so error lines stay accurate.
fn strip_comments(text: &str) -> String {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    let re = TOKEN.get_or_init(|| {
        Regex::new(r"(?s)'(?:[^']|'')*'|/\*.*?\*/").expect("valid comment regex")
    });
    re.replace_all(text, |caps: &regex::Captures| {
        let token = &caps[0];
        if token.starts_with('\'') {
            return token.to_string();
        }
        token
            .chars()
            .map(|c| if c == '\n' { '\n' } else { ' ' })
            .collect::<String>()
    })
    .into_owned()
}

// ============================================================================
// Records
// ============================================================================

fn header_record(input: &str) -> IResult<&str, (&str, Vec<StepValue>)> {
    terminated(
        pair(terminated(parse_keyword, multispace0), parse_arg_list),
        pair(multispace0, char(';')),
    )(input)
}

/// `#12 = IFCWALL(...);` or the complex form `#12 = (A(...) B(...));`
fn parse_entity(input: &str) -> IResult<&str, StepEntity> {
    let (input, id) = preceded(char('#'), map_res(digit1, str::parse::<u64>))(input)?;
    let (input, _) = tuple((multispace0, char('='), multispace0))(input)?;
    let (input, (keyword, args)) = alt((simple_record, complex_record))(input)?;
    let (input, _) = pair(multispace0, char(';'))(input)?;
    Ok((input, StepEntity { id, keyword, args }))
}

fn simple_record(input: &str) -> IResult<&str, (String, Vec<StepValue>)> {
    map(
        pair(terminated(parse_keyword, multispace0), parse_arg_list),
        |(k, args)| (k.to_string(), args),
    )(input)
}

/// Complex instances concatenate the partial records' arguments; the first
/// partial keyword names the instance.
fn complex_record(input: &str) -> IResult<&str, (String, Vec<StepValue>)> {
    let (input, parts) = delimited(
        char('('),
        many1(delimited(multispace0, simple_record, multispace0)),
        char(')'),
    )(input)?;
    let keyword = parts.first().map(|(k, _)| k.clone()).unwrap_or_default();
    let args = parts.into_iter().flat_map(|(_, a)| a).collect();
    Ok((input, (keyword, args)))
}

fn parse_keyword(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
    ))(input)
}

fn parse_arg_list(input: &str) -> IResult<&str, Vec<StepValue>> {
    delimited(
        pair(char('('), multispace0),
        separated_list0(tuple((multispace0, char(','), multispace0)), parse_value),
        pair(multispace0, char(')')),
    )(input)
}

// ============================================================================
// Values
// ============================================================================

fn parse_value(input: &str) -> IResult<&str, StepValue> {
    alt((
        value(StepValue::Null, char('$')),
        value(StepValue::Derived, char('*')),
        map(preceded(char('#'), map_res(digit1, str::parse::<u64>)), StepValue::Ref),
        map(parse_step_string, StepValue::Str),
        map(parse_binary, StepValue::Binary),
        parse_enum,
        map(parse_arg_list, StepValue::List),
        parse_typed,
        parse_number,
    ))(input)
}

/// `'text'` with `''` as an escaped quote and `\X\`, `\X2\` encodings.
fn parse_step_string(input: &str) -> IResult<&str, String> {
    let (input, _) = char('\'')(input)?;
    let mut raw = String::new();
    let mut chars = input.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\'' {
            if matches!(chars.peek(), Some((_, '\''))) {
                chars.next();
                raw.push('\'');
                continue;
            }
            return Ok((&input[i + 1..], decode_step_string(&raw)));
        }
        raw.push(c);
    }
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

fn parse_binary(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('"'), take_while(|c: char| c.is_ascii_hexdigit()), char('"')),
        String::from,
    )(input)
}

/// `.T.`, `.F.`, `.U.` and named enumerations.
fn parse_enum(input: &str) -> IResult<&str, StepValue> {
    map(
        delimited(
            char('.'),
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            char('.'),
        ),
        |name: &str| match name {
            "T" => StepValue::Bool(true),
            "F" => StepValue::Bool(false),
            "U" => StepValue::Null,
            other => StepValue::Enum(other.to_string()),
        },
    )(input)
}

fn parse_typed(input: &str) -> IResult<&str, StepValue> {
    let (input, keyword) = terminated(parse_keyword, multispace0)(input)?;
    let (input, inner) = delimited(
        pair(char('('), multispace0),
        parse_value,
        pair(multispace0, char(')')),
    )(input)?;
    Ok((input, StepValue::Typed(keyword.to_string(), Box::new(inner))))
}

fn parse_number(input: &str) -> IResult<&str, StepValue> {
    let (rest, text) = recognize(tuple((
        opt(one_of("+-")),
        digit1,
        opt(pair(char('.'), opt(digit1))),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)?;

    let is_real = text.contains(|c: char| matches!(c, '.' | 'e' | 'E'));
    let parsed = if is_real {
        text.parse::<f64>().ok().map(StepValue::Real)
    } else {
        text.parse::<i64>().ok().map(StepValue::Int)
    };
    match parsed {
        Some(v) => Ok((rest, v)),
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        ))),
    }
}

/// Decode the control directives IFC exporters use for non-ASCII text:
/// `\X\hh` (ISO 8859-1 byte), `\X2\hhhh...\X0\` (UTF-16) and
/// `\X4\hhhhhhhh...\X0\` (UTF-32). `\S\c` is passed through unchanged.
fn decode_step_string(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix("\\X2\\") {
            let end = after.find("\\X0\\").unwrap_or(after.len());
            let units: Vec<u16> = after[..end]
                .as_bytes()
                .chunks(4)
                .filter_map(|c| std::str::from_utf8(c).ok())
                .filter_map(|h| u16::from_str_radix(h, 16).ok())
                .collect();
            out.push_str(&String::from_utf16_lossy(&units));
            rest = after.get(end + 4..).unwrap_or("");
        } else if let Some(after) = tail.strip_prefix("\\X4\\") {
            let end = after.find("\\X0\\").unwrap_or(after.len());
            after[..end]
                .as_bytes()
                .chunks(8)
                .filter_map(|c| std::str::from_utf8(c).ok())
                .filter_map(|h| u32::from_str_radix(h, 16).ok())
                .filter_map(char::from_u32)
                .for_each(|c| out.push(c));
            rest = after.get(end + 4..).unwrap_or("");
        } else if let Some(after) = tail.strip_prefix("\\X\\") {
            match after.get(..2).and_then(|h| u8::from_str_radix(h, 16).ok()) {
                Some(byte) => {
                    out.push(byte as char);
                    rest = &after[2..];
                }
                None => {
                    out.push_str("\\X\\");
                    rest = after;
                }
            }
        } else {
            out.push('\\');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

// ============================================================================
// Tests
// ============================================================================
