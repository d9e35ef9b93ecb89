//! printf-style rendering of log templates.
//!
//! Native modules describe their messages with C format strings. Instead of variadic
//! argument lists the arguments are materialised up front as a slice of [`LogArg`], which
//! can be rendered any number of times. The supported syntax is
//! `%[flags][width][.precision][length]conversion` with
//!
//! - flags `-`, `0`, `+`, space and `#`
//! - width and precision given as digits or `*` (taken from the next integer argument)
//! - length modifiers `h`, `l`, `ll`, `z`, `j`, `t`, `L` (accepted and ignored)
//! - conversions `d i u x X o f F e E g G s c p %`
//!
//! A conversion without a matching argument is written out verbatim.

use std::fmt::{self, Write};

/// A single materialised argument of a log template.
#[derive(Debug, Clone, PartialEq)]
pub enum LogArg {
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Char(char),
    Ptr(usize),
}

impl From<i32> for LogArg {
    fn from(value: i32) -> Self {
        LogArg::Int(value.into())
    }
}

impl From<i64> for LogArg {
    fn from(value: i64) -> Self {
        LogArg::Int(value)
    }
}

impl From<u32> for LogArg {
    fn from(value: u32) -> Self {
        LogArg::UInt(value.into())
    }
}

impl From<u64> for LogArg {
    fn from(value: u64) -> Self {
        LogArg::UInt(value)
    }
}

impl From<usize> for LogArg {
    fn from(value: usize) -> Self {
        LogArg::UInt(value as u64)
    }
}

impl From<f64> for LogArg {
    fn from(value: f64) -> Self {
        LogArg::Float(value)
    }
}

impl From<f32> for LogArg {
    fn from(value: f32) -> Self {
        LogArg::Float(value.into())
    }
}

impl From<bool> for LogArg {
    fn from(value: bool) -> Self {
        LogArg::Int(value.into())
    }
}

impl From<char> for LogArg {
    fn from(value: char) -> Self {
        LogArg::Char(value)
    }
}

impl From<&str> for LogArg {
    fn from(value: &str) -> Self {
        LogArg::Str(value.to_string())
    }
}

impl From<String> for LogArg {
    fn from(value: String) -> Self {
        LogArg::Str(value)
    }
}

impl LogArg {
    fn as_i64(&self) -> Option<i64> {
        match self {
            LogArg::Int(v) => Some(*v),
            LogArg::UInt(v) => Some(*v as i64),
            LogArg::Char(c) => Some(*c as i64),
            LogArg::Ptr(p) => Some(*p as i64),
            LogArg::Float(_) | LogArg::Str(_) => None,
        }
    }

    fn as_u64(&self) -> Option<u64> {
        match self {
            LogArg::Int(v) => Some(*v as u64),
            LogArg::UInt(v) => Some(*v),
            LogArg::Char(c) => Some(*c as u64),
            LogArg::Ptr(p) => Some(*p as u64),
            LogArg::Float(_) | LogArg::Str(_) => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            LogArg::Float(v) => Some(*v),
            LogArg::Int(v) => Some(*v as f64),
            LogArg::UInt(v) => Some(*v as f64),
            LogArg::Char(_) | LogArg::Str(_) | LogArg::Ptr(_) => None,
        }
    }
}

/// Build a `Vec<LogArg>` from heterogeneous values.
///
/// ```
/// use fmi_import_core::log_args;
/// let args = log_args![1, 2.5, "text"];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! log_args {
    ($($arg:expr),* $(,)?) => {
        vec![$($crate::logging::LogArg::from($arg)),*]
    };
}

#[derive(Debug, Default, Clone, Copy)]
struct Spec {
    left: bool,
    zero: bool,
    plus: bool,
    space: bool,
    alternate: bool,
    width: usize,
    precision: Option<usize>,
}

/// Render `template` with `args` into `out`.
pub fn format_template(out: &mut dyn Write, template: &str, args: &[LogArg]) -> fmt::Result {
    let bytes = template.as_bytes();
    let mut next_arg = 0;
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        out.write_str(&template[literal_start..i])?;
        let spec_start = i;
        i += 1;

        let mut spec = Spec::default();
        while i < bytes.len() {
            match bytes[i] {
                b'-' => spec.left = true,
                b'0' => spec.zero = true,
                b'+' => spec.plus = true,
                b' ' => spec.space = true,
                b'#' => spec.alternate = true,
                _ => break,
            }
            i += 1;
        }

        if i < bytes.len() && bytes[i] == b'*' {
            i += 1;
            if let Some(width) = args.get(next_arg).and_then(LogArg::as_i64) {
                if width < 0 {
                    spec.left = true;
                }
                spec.width = width.unsigned_abs() as usize;
            }
            next_arg += 1;
        } else {
            let (width, end) = parse_number(bytes, i);
            spec.width = width;
            i = end;
        }

        if i < bytes.len() && bytes[i] == b'.' {
            i += 1;
            if i < bytes.len() && bytes[i] == b'*' {
                i += 1;
                spec.precision = args
                    .get(next_arg)
                    .and_then(LogArg::as_i64)
                    .and_then(|p| usize::try_from(p).ok());
                next_arg += 1;
            } else {
                let (precision, end) = parse_number(bytes, i);
                spec.precision = Some(precision);
                i = end;
            }
        }

        while i < bytes.len() && matches!(bytes[i], b'h' | b'l' | b'z' | b'j' | b't' | b'L') {
            i += 1;
        }

        let Some(&conversion) = bytes.get(i) else {
            // Dangling specification at the end of the template.
            out.write_str(&template[spec_start..])?;
            literal_start = bytes.len();
            break;
        };
        if !conversion.is_ascii() {
            out.write_str(&template[spec_start..i])?;
            literal_start = i;
            continue;
        }
        i += 1;
        literal_start = i;

        if conversion == b'%' {
            out.write_char('%')?;
            continue;
        }

        let rendered = args
            .get(next_arg)
            .and_then(|arg| render_conversion(conversion, &spec, arg));
        match rendered {
            Some(text) => {
                next_arg += 1;
                out.write_str(&text)?;
            }
            None => {
                if args.get(next_arg).is_some() && is_conversion(conversion) {
                    next_arg += 1;
                }
                out.write_str(&template[spec_start..i])?;
            }
        }
    }

    if literal_start < bytes.len() {
        out.write_str(&template[literal_start..])?;
    }
    Ok(())
}

/// Render `template` with `args` into a new string.
pub fn format_to_string(template: &str, args: &[LogArg]) -> String {
    let mut out = String::with_capacity(template.len());
    // Writing into a String cannot fail.
    let _ = format_template(&mut out, template, args);
    out
}

fn is_conversion(conversion: u8) -> bool {
    matches!(
        conversion,
        b'd' | b'i' | b'u' | b'x' | b'X' | b'o' | b'f' | b'F' | b'e' | b'E' | b'g' | b'G' | b's' | b'c' | b'p'
    )
}

fn parse_number(bytes: &[u8], mut i: usize) -> (usize, usize) {
    let mut value: usize = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        value = value.saturating_mul(10).saturating_add((bytes[i] - b'0') as usize);
        i += 1;
    }
    (value, i)
}

fn render_conversion(conversion: u8, spec: &Spec, arg: &LogArg) -> Option<String> {
    let text = match conversion {
        b'd' | b'i' => {
            let value = arg.as_i64()?;
            let digits = apply_int_precision(value.unsigned_abs().to_string(), spec.precision);
            let sign = sign_prefix(value < 0, spec);
            return Some(pad_numeric(sign, &digits, spec, spec.precision.is_none()));
        }
        b'u' | b'x' | b'X' | b'o' => {
            let value = arg.as_u64()?;
            let (digits, prefix) = match conversion {
                b'u' => (value.to_string(), ""),
                b'x' => (format!("{value:x}"), if spec.alternate && value != 0 { "0x" } else { "" }),
                b'X' => (format!("{value:X}"), if spec.alternate && value != 0 { "0X" } else { "" }),
                _ => (format!("{value:o}"), if spec.alternate && value != 0 { "0" } else { "" }),
            };
            let digits = apply_int_precision(digits, spec.precision);
            return Some(pad_numeric(prefix, &digits, spec, spec.precision.is_none()));
        }
        b'f' | b'F' | b'e' | b'E' | b'g' | b'G' => {
            let value = arg.as_f64()?;
            let sign = sign_prefix(value.is_sign_negative() && !value.is_nan(), spec);
            let body = format_float(value.abs(), conversion, spec);
            return Some(pad_numeric(sign, &body, spec, value.is_finite()));
        }
        b's' => {
            let text = match arg {
                LogArg::Str(s) => s.clone(),
                LogArg::Char(c) => c.to_string(),
                LogArg::Int(v) => v.to_string(),
                LogArg::UInt(v) => v.to_string(),
                LogArg::Float(v) => v.to_string(),
                LogArg::Ptr(_) => return None,
            };
            match spec.precision {
                Some(precision) => text.chars().take(precision).collect(),
                None => text,
            }
        }
        b'c' => match arg {
            LogArg::Char(c) => c.to_string(),
            other => char::from_u32(other.as_u64()? as u32)?.to_string(),
        },
        b'p' => match arg {
            LogArg::Ptr(p) => format!("{p:#x}"),
            other => format!("{:#x}", other.as_u64()?),
        },
        _ => return None,
    };
    Some(pad(&text, spec.width, spec.left))
}

fn sign_prefix(negative: bool, spec: &Spec) -> &'static str {
    if negative {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    }
}

fn apply_int_precision(digits: String, precision: Option<usize>) -> String {
    match precision {
        Some(0) if digits == "0" => String::new(),
        Some(precision) if digits.len() < precision => {
            format!("{}{}", "0".repeat(precision - digits.len()), digits)
        }
        _ => digits,
    }
}

fn pad(text: &str, width: usize, left: bool) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let fill = " ".repeat(width - len);
    if left {
        format!("{text}{fill}")
    } else {
        format!("{fill}{text}")
    }
}

/// Pad a number, placing zero padding between the sign/prefix and the digits.
fn pad_numeric(prefix: &str, digits: &str, spec: &Spec, zero_allowed: bool) -> String {
    let len = prefix.len() + digits.len();
    if spec.zero && !spec.left && zero_allowed && len < spec.width {
        return format!("{prefix}{}{digits}", "0".repeat(spec.width - len));
    }
    pad(&format!("{prefix}{digits}"), spec.width, spec.left)
}

/// Format a non-negative float the way C does for `f`, `e` and `g` conversions.
fn format_float(value: f64, conversion: u8, spec: &Spec) -> String {
    let upper = conversion.is_ascii_uppercase();
    if !value.is_finite() {
        let text = if value.is_nan() { "nan" } else { "inf" };
        return if upper { text.to_uppercase() } else { text.to_string() };
    }

    let precision = spec.precision.unwrap_or(6);
    let text = match conversion {
        b'f' | b'F' => {
            let text = format!("{value:.precision$}");
            if spec.alternate && precision == 0 {
                format!("{text}.")
            } else {
                text
            }
        }
        b'e' | b'E' => format_exponential(value, precision, spec.alternate),
        _ => {
            let precision = precision.max(1);
            let exponent = decimal_exponent(value, precision - 1);
            let text = if exponent < -4 || exponent >= precision as i32 {
                format_exponential(value, precision - 1, spec.alternate)
            } else {
                let decimals = (precision as i32 - 1 - exponent) as usize;
                format!("{value:.decimals$}")
            };
            if spec.alternate {
                text
            } else {
                strip_trailing_zeros(&text)
            }
        }
    };
    if upper {
        text.to_uppercase()
    } else {
        text
    }
}

/// Exponent of `value` once rounded to `precision` decimals in scientific notation.
fn decimal_exponent(value: f64, precision: usize) -> i32 {
    let text = format!("{value:.precision$e}");
    text.split_once('e')
        .and_then(|(_, exponent)| exponent.parse().ok())
        .unwrap_or(0)
}

/// Scientific notation with a signed, at least two digit exponent ("1.500000e+02").
fn format_exponential(value: f64, precision: usize, alternate: bool) -> String {
    let text = format!("{value:.precision$e}");
    let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    let dot = if alternate && precision == 0 { "." } else { "" };
    format!("{mantissa}{dot}e{sign}{:02}", exponent.unsigned_abs())
}

fn strip_trailing_zeros(text: &str) -> String {
    let (mantissa, exponent) = match text.find('e') {
        Some(position) => text.split_at(position),
        None => (text, ""),
    };
    let mantissa = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    format!("{mantissa}{exponent}")
}
