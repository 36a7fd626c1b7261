//! Typed literal values
//!
//! A literal carries its original lexical form, a datatype tag and the parsed
//! value. Parsing normalises: `"1.0"^^xsd:decimal` and `"1.00"^^xsd:decimal`
//! share a canonical form and therefore intern to the same id. Comparison
//! works on parsed values; incomparable datatype combinations yield `None`
//! rather than an error.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

use crate::vocab;

/// Datatype tag of a literal
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Datatype {
    /// `xsd:string` or an untyped literal
    Text,
    /// `xsd:integer`, `xsd:int`, `xsd:long`
    Integer,
    /// `xsd:decimal`
    Decimal,
    /// `xsd:double`, `xsd:float`
    Double,
    /// `xsd:boolean`
    Boolean,
    /// `xsd:dateTime`
    DateTime,
    /// `xsd:duration`
    Duration,
    /// Any other datatype IRI, treated as an opaque string
    Other(Arc<str>),
}

impl Datatype {
    /// Map a datatype IRI to its tag
    pub fn from_iri(iri: &str) -> Self {
        match iri {
            vocab::XSD_STRING => Datatype::Text,
            vocab::XSD_INTEGER | vocab::XSD_INT | vocab::XSD_LONG => Datatype::Integer,
            vocab::XSD_DECIMAL => Datatype::Decimal,
            vocab::XSD_DOUBLE | vocab::XSD_FLOAT => Datatype::Double,
            vocab::XSD_BOOLEAN => Datatype::Boolean,
            vocab::XSD_DATE_TIME => Datatype::DateTime,
            vocab::XSD_DURATION => Datatype::Duration,
            other => Datatype::Other(Arc::from(other)),
        }
    }

    /// The datatype IRI this tag denotes
    pub fn iri(&self) -> &str {
        match self {
            Datatype::Text => vocab::XSD_STRING,
            Datatype::Integer => vocab::XSD_INTEGER,
            Datatype::Decimal => vocab::XSD_DECIMAL,
            Datatype::Double => vocab::XSD_DOUBLE,
            Datatype::Boolean => vocab::XSD_BOOLEAN,
            Datatype::DateTime => vocab::XSD_DATE_TIME,
            Datatype::Duration => vocab::XSD_DURATION,
            Datatype::Other(iri) => iri,
        }
    }

    /// Whether this tag is one of the numeric datatypes
    pub fn is_numeric(&self) -> bool {
        matches!(self, Datatype::Integer | Datatype::Decimal | Datatype::Double)
    }
}

/// Parsed value of a literal
#[derive(Clone, Debug, PartialEq)]
pub enum LiteralValue {
    /// The lexical form itself is the value
    Text,
    /// Exact integer
    Integer(i64),
    /// Decimal or floating point magnitude
    Number(f64),
    /// Boolean
    Boolean(bool),
    /// Point in time with offset
    DateTime(DateTime<FixedOffset>),
    /// ISO-8601 duration reduced to months plus seconds
    Duration { months: i64, seconds: f64 },
    /// Unknown datatype, kept as an opaque string
    Opaque,
}

/// An RDF-style typed literal
#[derive(Clone, Debug)]
pub struct Literal {
    lexical: String,
    datatype: Datatype,
    value: LiteralValue,
    canonical: String,
}

impl Literal {
    /// Parse a lexical form under the given datatype IRI
    ///
    /// Never fails: a lexical form that does not parse under a known datatype
    /// degrades to an opaque value, mirroring the treatment of unknown
    /// datatypes.
    pub fn parse(lexical: impl Into<String>, datatype_iri: &str) -> Self {
        let lexical = lexical.into();
        let datatype = Datatype::from_iri(datatype_iri);
        let value = parse_value(&lexical, &datatype);
        let canonical = canonical_form(&lexical, &value);
        Literal {
            lexical,
            datatype,
            value,
            canonical,
        }
    }

    /// A plain string literal
    pub fn string(lexical: impl Into<String>) -> Self {
        Self::parse(lexical, vocab::XSD_STRING)
    }

    /// An `xsd:integer` literal
    pub fn integer(n: i64) -> Self {
        Self::parse(n.to_string(), vocab::XSD_INTEGER)
    }

    /// An `xsd:double` literal
    pub fn double(x: f64) -> Self {
        Self::parse(x.to_string(), vocab::XSD_DOUBLE)
    }

    /// An `xsd:boolean` literal
    pub fn boolean(b: bool) -> Self {
        Self::parse(b.to_string(), vocab::XSD_BOOLEAN)
    }

    /// The original lexical form
    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    /// The datatype tag
    pub fn datatype(&self) -> &Datatype {
        &self.datatype
    }

    /// The parsed value
    pub fn value(&self) -> &LiteralValue {
        &self.value
    }

    /// Canonical form used for interning; normalises spelling variants
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// The value as a float, if numeric
    pub fn as_number(&self) -> Option<f64> {
        match self.value {
            LiteralValue::Integer(n) => Some(n as f64),
            LiteralValue::Number(x) => Some(x),
            _ => None,
        }
    }

    /// The value as an exact integer, if integral
    pub fn as_integer(&self) -> Option<i64> {
        match self.value {
            LiteralValue::Integer(n) => Some(n),
            _ => None,
        }
    }

    /// The value as a string, for text-like literals
    pub fn as_text(&self) -> Option<&str> {
        match self.value {
            LiteralValue::Text | LiteralValue::Opaque => Some(&self.lexical),
            _ => None,
        }
    }
}

/// Compare two literals by parsed value
///
/// Numeric datatypes compare by magnitude across tags; dateTime and duration
/// by canonical value; text lexicographically. Everything else, including
/// opaque literals under different datatype IRIs, is incomparable.
pub fn cmp_literals(a: &Literal, b: &Literal) -> Option<Ordering> {
    use LiteralValue::*;
    match (&a.value, &b.value) {
        (Integer(x), Integer(y)) => Some(x.cmp(y)),
        (Integer(x), Number(y)) => (*x as f64).partial_cmp(y),
        (Number(x), Integer(y)) => x.partial_cmp(&(*y as f64)),
        (Number(x), Number(y)) => x.partial_cmp(y),
        (Boolean(x), Boolean(y)) => Some(x.cmp(y)),
        (DateTime(x), DateTime(y)) => Some(x.cmp(y)),
        (
            Duration { months: mx, seconds: sx },
            Duration { months: my, seconds: sy },
        ) => match mx.cmp(my) {
            Ordering::Equal => sx.partial_cmp(sy),
            other => Some(other),
        },
        (Text, Text) => Some(a.lexical.cmp(&b.lexical)),
        (Opaque, Opaque) if a.datatype == b.datatype => Some(a.lexical.cmp(&b.lexical)),
        _ => None,
    }
}

fn parse_value(lexical: &str, datatype: &Datatype) -> LiteralValue {
    match datatype {
        Datatype::Text => LiteralValue::Text,
        Datatype::Integer => match lexical.trim().parse::<i64>() {
            Ok(n) => LiteralValue::Integer(n),
            Err(_) => LiteralValue::Opaque,
        },
        Datatype::Decimal | Datatype::Double => match lexical.trim().parse::<f64>() {
            Ok(x) => {
                // Integral decimals collapse onto the integer value space
                if x.fract() == 0.0 && x.abs() < i64::MAX as f64 {
                    LiteralValue::Integer(x as i64)
                } else {
                    LiteralValue::Number(x)
                }
            }
            Err(_) => LiteralValue::Opaque,
        },
        Datatype::Boolean => match lexical.trim() {
            "true" | "1" => LiteralValue::Boolean(true),
            "false" | "0" => LiteralValue::Boolean(false),
            _ => LiteralValue::Opaque,
        },
        Datatype::DateTime => parse_date_time(lexical.trim())
            .map(LiteralValue::DateTime)
            .unwrap_or(LiteralValue::Opaque),
        Datatype::Duration => parse_duration(lexical.trim()).unwrap_or(LiteralValue::Opaque),
        Datatype::Other(_) => LiteralValue::Opaque,
    }
}

fn parse_date_time(text: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt);
    }
    // No timezone: interpret as UTC
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
}

/// Parse an ISO-8601 duration (`PnYnMnDTnHnMnS`) into months plus seconds
fn parse_duration(text: &str) -> Option<LiteralValue> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let rest = rest.strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => (d, t),
        None => (rest, ""),
    };

    let mut months: i64 = 0;
    let mut seconds: f64 = 0.0;
    let mut seen = false;

    let mut number = String::new();
    for ch in date_part.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            number.push(ch);
        } else {
            let n: f64 = number.parse().ok()?;
            number.clear();
            seen = true;
            match ch {
                'Y' => months += (n as i64) * 12,
                'M' => months += n as i64,
                'D' => seconds += n * 86_400.0,
                'W' => seconds += n * 604_800.0,
                _ => return None,
            }
        }
    }
    for ch in time_part.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            number.push(ch);
        } else {
            let n: f64 = number.parse().ok()?;
            number.clear();
            seen = true;
            match ch {
                'H' => seconds += n * 3_600.0,
                'M' => seconds += n * 60.0,
                'S' => seconds += n,
                _ => return None,
            }
        }
    }
    if !seen || !number.is_empty() {
        return None;
    }
    if negative {
        months = -months;
        seconds = -seconds;
    }
    Some(LiteralValue::Duration { months, seconds })
}

fn canonical_form(lexical: &str, value: &LiteralValue) -> String {
    match value {
        LiteralValue::Text | LiteralValue::Opaque => lexical.to_string(),
        LiteralValue::Integer(n) => n.to_string(),
        LiteralValue::Number(x) => x.to_string(),
        LiteralValue::Boolean(b) => b.to_string(),
        LiteralValue::DateTime(dt) => dt.to_rfc3339(),
        LiteralValue::Duration { months, seconds } => format!("P{}M{}S", months, seconds),
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.datatype {
            Datatype::Text => write!(f, "\"{}\"", self.lexical),
            _ => write!(f, "\"{}\"^^<{}>", self.lexical, self.datatype.iri()),
        }
    }
}
