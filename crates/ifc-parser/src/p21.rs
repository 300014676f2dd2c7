//! Part 21 (ISO 10303-21) grammar.

use std::borrow::Cow;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alpha1, char, digit0, digit1, multispace0, one_of},
    combinator::{map, map_res, opt, recognize, value},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use ifc_core::{FileMetadata, InstanceData, ParseError, RawValue, RecordMap, RefId};

use crate::StepFile;

/// Parse a whole physical file.
pub fn parse_step(source: &str) -> Result<StepFile, ParseError> {
    let stripped = strip_comments(source);
    let text: &str = &stripped;

    let rest = expect_keyword(text, text, "ISO-10303-21;")?;
    let rest = section(rest, "HEADER;", "HEADER")?;
    let (rest, metadata) = parse_header(text, rest)?;
    let rest = section(rest, "DATA;", "DATA")?;
    let (_, records) = parse_data(text, rest)?;

    Ok(StepFile { metadata, records })
}

/// Replace `/* ... */` comments outside strings with spaces, keeping byte
/// offsets and line breaks intact.
fn strip_comments(source: &str) -> Cow<'_, str> {
    if !source.contains("/*") {
        return Cow::Borrowed(source);
    }
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut in_string = false;
    let mut in_comment = false;

    while let Some(c) = chars.next() {
        if in_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                out.push_str("  ");
                in_comment = false;
            } else if c == '\n' {
                out.push('\n');
            } else {
                out.extend(std::iter::repeat(' ').take(c.len_utf8()));
            }
            continue;
        }
        if c == '\'' {
            in_string = !in_string;
        } else if !in_string && c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            out.push_str("  ");
            in_comment = true;
            continue;
        }
        out.push(c);
    }
    Cow::Owned(out)
}

fn location(source: &str, remaining: &str) -> (u32, u32) {
    let offset = source.len().saturating_sub(remaining.len());
    let consumed = &source[..offset];
    let line = consumed.matches('\n').count() as u32 + 1;
    let column = consumed
        .rsplit('\n')
        .next()
        .map(|l| l.chars().count())
        .unwrap_or(0) as u32
        + 1;
    (line, column)
}

fn syntax_at(source: &str, remaining: &str, message: impl Into<String>) -> ParseError {
    let (line, column) = location(source, remaining);
    ParseError::Syntax {
        message: message.into(),
        line,
        column,
    }
}

fn syntax_error(source: &str, err: nom::Err<nom::error::Error<&str>>, message: &str) -> ParseError {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            syntax_at(source, e.input, format!("{} ({:?})", message, e.code))
        }
        nom::Err::Incomplete(_) => syntax_at(source, "", message),
    }
}

fn expect_keyword<'a>(source: &str, input: &'a str, keyword: &str) -> Result<&'a str, ParseError> {
    let trimmed = input.trim_start();
    trimmed
        .strip_prefix(keyword)
        .ok_or_else(|| syntax_at(source, trimmed, format!("expected {}", keyword)))
}

fn section<'a>(input: &'a str, keyword: &str, name: &'static str) -> Result<&'a str, ParseError> {
    input
        .trim_start()
        .strip_prefix(keyword)
        .ok_or(ParseError::MissingSection { section: name })
}

/// Parse a STEP entity ID (#123). Ids must fit in an `i64`.
fn entity_id(input: &str) -> IResult<&str, u64> {
    preceded(
        char('#'),
        map_res(map_res(digit1, str::parse::<i64>), u64::try_from),
    )(input)
}

/// Parse an integer or real. Reals always carry a '.' or an exponent.
fn number(input: &str) -> IResult<&str, RawValue> {
    let (rest, text) = recognize(tuple((
        opt(one_of("+-")),
        digit1,
        opt(pair(char('.'), digit0)), // "0." is a valid real
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)?;

    let parsed = if text.contains(|c| matches!(c, '.' | 'e' | 'E')) {
        text.parse().map(RawValue::Real).ok()
    } else {
        text.parse().map(RawValue::Integer).ok()
    };
    match parsed {
        Some(v) => Ok((rest, v)),
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Float,
        ))),
    }
}

/// Parse a string literal; `''` is an escaped quote.
fn string_literal(input: &str) -> IResult<&str, String> {
    let (body, _) = char('\'')(input)?;
    let mut raw = String::new();
    let mut chars = body.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '\'' {
            raw.push(c);
            continue;
        }
        if matches!(chars.peek(), Some((_, '\''))) {
            raw.push('\'');
            chars.next();
        } else {
            return Ok((&body[i + 1..], decode_step_string(&raw)));
        }
    }

    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

/// Decode STEP control directives: `\X2\HHHH...\X0\`, `\X4\HHHHHHHH...\X0\`,
/// `\X\HH`, `\S\c`, `\\` and code page switches `\PA\`.
pub(crate) fn decode_step_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if let Some(tail) = rest.strip_prefix("\\X2\\") {
            let end = tail.find("\\X0\\").unwrap_or(tail.len());
            let units: Vec<u16> = hex_groups(&tail[..end], 4)
                .filter_map(|h| u16::from_str_radix(h, 16).ok())
                .collect();
            out.extend(
                char::decode_utf16(units).map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER)),
            );
            rest = tail.get(end + 4..).unwrap_or("");
        } else if let Some(tail) = rest.strip_prefix("\\X4\\") {
            let end = tail.find("\\X0\\").unwrap_or(tail.len());
            out.extend(
                hex_groups(&tail[..end], 8)
                    .filter_map(|h| u32::from_str_radix(h, 16).ok())
                    .map(|code| char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)),
            );
            rest = tail.get(end + 4..).unwrap_or("");
        } else if let Some(tail) = rest.strip_prefix("\\X\\") {
            match tail.get(..2).and_then(|h| u8::from_str_radix(h, 16).ok()) {
                Some(byte) => {
                    out.push(char::from(byte));
                    rest = &tail[2..];
                }
                None => {
                    out.push_str("\\X\\");
                    rest = tail;
                }
            }
        } else if let Some(tail) = rest.strip_prefix("\\S\\") {
            let mut tail_chars = tail.chars();
            match tail_chars.next() {
                Some(c) => {
                    out.push(char::from_u32(c as u32 + 128).unwrap_or(c));
                    rest = tail_chars.as_str();
                }
                None => {
                    out.push_str("\\S\\");
                    rest = tail;
                }
            }
        } else if let Some(tail) = rest.strip_prefix("\\\\") {
            out.push('\\');
            rest = tail;
        } else if rest.starts_with("\\P") && rest.get(3..4) == Some("\\") {
            rest = &rest[4..];
        } else {
            out.push('\\');
            rest = &rest[1..];
        }
    }

    out.push_str(rest);
    out
}

fn hex_groups(hex: &str, width: usize) -> impl Iterator<Item = &str> {
    (0..hex.len() / width).filter_map(move |i| hex.get(i * width..(i + 1) * width))
}

/// Parse an enumeration value; `.T.` and `.F.` are booleans.
fn enumeration(input: &str) -> IResult<&str, RawValue> {
    map(
        delimited(
            char('.'),
            take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            char('.'),
        ),
        |item: &str| match item {
            "T" => RawValue::Boolean(true),
            "F" => RawValue::Boolean(false),
            other => RawValue::Enum(other.to_string()),
        },
    )(input)
}

fn type_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alpha1,
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

/// Parenthesized, comma separated parameters.
fn param_list(input: &str) -> IResult<&str, Vec<RawValue>> {
    delimited(
        pair(char('('), multispace0),
        separated_list0(tuple((multispace0, char(','), multispace0)), raw_value),
        pair(multispace0, char(')')),
    )(input)
}

/// Typed parameter `TYPE_NAME(values)`, kept as an inline instance.
fn typed_parameter(input: &str) -> IResult<&str, RawValue> {
    let (input, name) = type_name(input)?;
    let (input, _) = multispace0(input)?;
    let (input, params) = param_list(input)?;
    Ok((
        input,
        RawValue::Nested(Box::new(InstanceData::inline(name.to_ascii_uppercase(), params))),
    ))
}

/// Parse a single parameter value.
fn raw_value(input: &str) -> IResult<&str, RawValue> {
    let (input, _) = multispace0(input)?;

    alt((
        value(RawValue::Null, char('$')),
        value(RawValue::Derived, char('*')),
        map(entity_id, |id| RawValue::Ref(RefId(id))),
        enumeration,
        map(string_literal, RawValue::String),
        typed_parameter,
        number,
        map(param_list, RawValue::List),
    ))(input)
}

/// `TYPE_NAME ( params )` without the trailing semicolon.
fn simple_record(input: &str) -> IResult<&str, (&str, Vec<RawValue>)> {
    let (input, _) = multispace0(input)?;
    let (input, name) = type_name(input)?;
    let (input, _) = multispace0(input)?;
    let (input, params) = param_list(input)?;
    Ok((input, (name, params)))
}

fn record_end(input: &str) -> IResult<&str, char> {
    preceded(multispace0, char(';'))(input)
}

/// `#id =`
fn instance_head(input: &str) -> IResult<&str, u64> {
    terminated(
        preceded(multispace0, entity_id),
        tuple((multispace0, tag("="), multispace0)),
    )(input)
}

fn parse_header<'a>(source: &str, input: &'a str) -> Result<(&'a str, FileMetadata), ParseError> {
    let mut metadata = FileMetadata::default();
    let mut rest = input;

    loop {
        let trimmed = rest.trim_start();
        if let Some(after) = trimmed.strip_prefix("ENDSEC;") {
            return Ok((after, metadata));
        }
        if trimmed.is_empty() {
            return Err(ParseError::MissingSection { section: "ENDSEC" });
        }

        let (after, (name, params)) = terminated(simple_record, record_end)(trimmed)
            .map_err(|e| syntax_error(source, e, "malformed header entity"))?;
        apply_header_entity(&mut metadata, name, &params);
        rest = after;
    }
}

fn apply_header_entity(metadata: &mut FileMetadata, name: &str, params: &[RawValue]) {
    let text = |index: usize| params.get(index).map(raw_text).unwrap_or_default();
    let texts = |index: usize| params.get(index).map(raw_texts).unwrap_or_default();

    match name.to_ascii_uppercase().as_str() {
        "FILE_DESCRIPTION" => metadata.description = texts(0),
        "FILE_NAME" => {
            metadata.file_name = text(0);
            metadata.timestamp = text(1);
            metadata.authors = texts(2);
            metadata.organizations = texts(3);
            metadata.originating_system = text(5);
        }
        "FILE_SCHEMA" => metadata.schemas = texts(0),
        _ => {}
    }
}

fn raw_text(value: &RawValue) -> String {
    match value {
        RawValue::String(s) => s.clone(),
        _ => String::new(),
    }
}

fn raw_texts(value: &RawValue) -> Vec<String> {
    match value {
        RawValue::List(items) => items.iter().map(raw_text).collect(),
        RawValue::String(s) => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn parse_data<'a>(source: &str, input: &'a str) -> Result<(&'a str, RecordMap), ParseError> {
    let mut records = RecordMap::new();
    let mut rest = input;

    loop {
        let trimmed = rest.trim_start();
        if let Some(after) = trimmed.strip_prefix("ENDSEC;") {
            return Ok((after, records));
        }
        if trimmed.is_empty() {
            return Err(ParseError::MissingSection { section: "ENDSEC" });
        }

        let (body, id) = instance_head(trimmed)
            .map_err(|e| syntax_error(source, e, "expected instance '#id ='"))?;
        if body.starts_with('(') {
            return Err(ParseError::ComplexInstance { id });
        }
        let (after, (name, params)) = terminated(simple_record, record_end)(body)
            .map_err(|e| syntax_error(source, e, "malformed instance"))?;

        if records.contains_key(&id) {
            return Err(ParseError::DuplicateId { id });
        }
        records.insert(id, InstanceData::new(id, name, params));
        rest = after;
    }
}
