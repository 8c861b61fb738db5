//! Direct-to-writer serialization.
//!
//! [`StreamSerializer`] borrows a [`Mapper`] (sharing its metadata cache,
//! registries, and configuration) and a destination writer, emitting JSON
//! text with no intermediate `String` buffering. Repeated calls append
//! successive documents separated by a newline.

use std::fmt;

use crate::error::Result;
use crate::mapper::Mapper;
use crate::reflect::JsonType;
use crate::writer::JsonWriter;

pub struct StreamSerializer<'a> {
    mapper: &'a Mapper,
    out: &'a mut dyn fmt::Write,
    pretty: bool,
    documents: usize,
}

impl<'a> StreamSerializer<'a> {
    /// Compact output.
    pub fn new(mapper: &'a Mapper, out: &'a mut dyn fmt::Write) -> Self {
        Self {
            mapper,
            out,
            pretty: false,
            documents: 0,
        }
    }

    /// Pretty-printed output.
    pub fn pretty(mapper: &'a Mapper, out: &'a mut dyn fmt::Write) -> Self {
        Self {
            mapper,
            out,
            pretty: true,
            documents: 0,
        }
    }

    /// Write one value as a complete JSON document.
    pub fn serialize<T: JsonType>(&mut self, value: &T) -> Result<()> {
        if self.documents > 0 {
            self.out.write_char('\n')?;
        }
        let mut writer = if self.pretty {
            JsonWriter::pretty(&mut *self.out)
        } else {
            JsonWriter::new(&mut *self.out)
        };
        self.mapper.serialize_to(value, &mut writer)?;
        self.documents += 1;
        Ok(())
    }

    /// Documents written so far.
    pub fn count(&self) -> usize {
        self.documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_documents_with_separator() {
        let mapper = Mapper::new();
        let mut out = String::new();
        let mut stream = StreamSerializer::new(&mapper, &mut out);
        stream.serialize(&1i32).unwrap();
        stream.serialize(&vec![true, false]).unwrap();
        assert_eq!(stream.count(), 2);
        assert_eq!(out, "1\n[true,false]");
    }
}
