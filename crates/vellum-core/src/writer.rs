//! Token-emitting JSON writer.
//!
//! [`JsonWriter`] writes structural tokens into any caller-supplied
//! [`fmt::Write`], inserting commas and colons from a small frame stack so
//! callers never manage separators. An optional pretty mode indents nested
//! containers by two spaces, mirroring the compact/pretty split the rest of
//! the crate exposes.

use std::fmt;

use crate::error::Result;

#[derive(Debug, Clone, Copy)]
enum Frame {
    Object { entries: usize },
    Array { items: usize },
}

/// Streaming JSON emitter over an abstract text writer.
pub struct JsonWriter<'a> {
    out: &'a mut dyn fmt::Write,
    pretty: bool,
    frames: Vec<Frame>,
}

impl<'a> JsonWriter<'a> {
    pub fn new(out: &'a mut dyn fmt::Write) -> Self {
        Self {
            out,
            pretty: false,
            frames: Vec::new(),
        }
    }

    pub fn pretty(out: &'a mut dyn fmt::Write) -> Self {
        Self {
            out,
            pretty: true,
            frames: Vec::new(),
        }
    }

    pub fn begin_object(&mut self) -> Result<()> {
        self.before_value()?;
        self.out.write_char('{')?;
        self.frames.push(Frame::Object { entries: 0 });
        Ok(())
    }

    pub fn end_object(&mut self) -> Result<()> {
        let had_entries = matches!(self.frames.pop(), Some(Frame::Object { entries }) if entries > 0);
        if self.pretty && had_entries {
            self.newline_indent()?;
        }
        self.out.write_char('}')?;
        Ok(())
    }

    pub fn begin_array(&mut self) -> Result<()> {
        self.before_value()?;
        self.out.write_char('[')?;
        self.frames.push(Frame::Array { items: 0 });
        Ok(())
    }

    pub fn end_array(&mut self) -> Result<()> {
        let had_items = matches!(self.frames.pop(), Some(Frame::Array { items }) if items > 0);
        if self.pretty && had_items {
            self.newline_indent()?;
        }
        self.out.write_char(']')?;
        Ok(())
    }

    /// Emit a property name and its separating colon.
    pub fn property_name(&mut self, name: &str) -> Result<()> {
        if let Some(Frame::Object { entries }) = self.frames.last_mut() {
            if *entries > 0 {
                self.out.write_char(',')?;
            }
            *entries += 1;
        }
        if self.pretty {
            self.newline_indent()?;
        }
        write_escaped(self.out, name)?;
        self.out.write_str(if self.pretty { ": " } else { ":" })?;
        Ok(())
    }

    pub fn write_null(&mut self) -> Result<()> {
        self.before_value()?;
        self.out.write_str("null")?;
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.before_value()?;
        self.out.write_str(if value { "true" } else { "false" })?;
        Ok(())
    }

    pub fn write_int(&mut self, value: i64) -> Result<()> {
        self.before_value()?;
        write!(self.out, "{value}")?;
        Ok(())
    }

    pub fn write_uint(&mut self, value: u64) -> Result<()> {
        self.before_value()?;
        write!(self.out, "{value}")?;
        Ok(())
    }

    /// Emit a double. Integral finite values keep a trailing `.0` so they
    /// re-parse as `Double` rather than `Int`; non-finite values have no
    /// JSON representation and are written as `null`.
    pub fn write_double(&mut self, value: f64) -> Result<()> {
        self.before_value()?;
        if !value.is_finite() {
            self.out.write_str("null")?;
        } else if value == value.trunc() {
            // Display never emits an exponent, so without the forced
            // fraction an integral double would re-parse as an integer.
            write!(self.out, "{value:.1}")?;
        } else {
            write!(self.out, "{value}")?;
        }
        Ok(())
    }

    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.before_value()?;
        write_escaped(self.out, value)?;
        Ok(())
    }

    /// Comma/indent bookkeeping for a value in array (or root) position.
    /// Values following a property name were already separated by
    /// [`Self::property_name`].
    fn before_value(&mut self) -> Result<()> {
        if let Some(Frame::Array { items }) = self.frames.last_mut() {
            if *items > 0 {
                self.out.write_char(',')?;
            }
            *items += 1;
            if self.pretty {
                self.newline_indent()?;
            }
        }
        Ok(())
    }

    fn newline_indent(&mut self) -> Result<()> {
        self.out.write_char('\n')?;
        for _ in 0..self.frames.len() {
            self.out.write_str("  ")?;
        }
        Ok(())
    }
}

/// Write a string literal with standard JSON escaping. Control characters
/// without a short escape use the `\u00XX` form.
fn write_escaped(out: &mut dyn fmt::Write, value: &str) -> Result<()> {
    out.write_char('"')?;
    for ch in value.chars() {
        match ch {
            '"' => out.write_str("\\\"")?,
            '\\' => out.write_str("\\\\")?,
            '\n' => out.write_str("\\n")?,
            '\r' => out.write_str("\\r")?,
            '\t' => out.write_str("\\t")?,
            '\x08' => out.write_str("\\b")?,
            '\x0c' => out.write_str("\\f")?,
            c if (c as u32) < 0x20 => write!(out, "\\u{:04x}", c as u32)?,
            c => out.write_char(c)?,
        }
    }
    out.write_char('"')?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_object() {
        let mut buf = String::new();
        let mut w = JsonWriter::new(&mut buf);
        w.begin_object().unwrap();
        w.property_name("a").unwrap();
        w.write_int(1).unwrap();
        w.property_name("b").unwrap();
        w.begin_array().unwrap();
        w.write_bool(true).unwrap();
        w.write_null().unwrap();
        w.end_array().unwrap();
        w.end_object().unwrap();
        assert_eq!(buf, r#"{"a":1,"b":[true,null]}"#);
    }

    #[test]
    fn pretty_object() {
        let mut buf = String::new();
        let mut w = JsonWriter::pretty(&mut buf);
        w.begin_object().unwrap();
        w.property_name("a").unwrap();
        w.write_int(1).unwrap();
        w.end_object().unwrap();
        assert_eq!(buf, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn integral_double_keeps_fraction() {
        let mut buf = String::new();
        let mut w = JsonWriter::new(&mut buf);
        w.write_double(17.0).unwrap();
        assert_eq!(buf, "17.0");
    }

    #[test]
    fn control_characters_escaped() {
        let mut buf = String::new();
        let mut w = JsonWriter::new(&mut buf);
        w.write_string("a\tb\x01").unwrap();
        assert_eq!(buf, "\"a\\tb\\u0001\"");
    }
}
