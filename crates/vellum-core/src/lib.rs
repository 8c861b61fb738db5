//! vellum-core: a hand-written JSON engine.
//!
//! The crate parses and produces JSON text without code generation or an
//! external serialization framework. Three layers build on each other:
//!
//! - a finite-state [`Lexer`](lexer::Lexer) and a grammar-enforcing
//!   [`JsonReader`] producing tagged structural tokens,
//! - [`JsonValue`], a mutable dynamically-typed document tree with cached
//!   serialization,
//! - [`Mapper`], which moves JSON into and out of ordinary Rust types
//!   through per-type descriptors built once and cached by `TypeId`.
//!
//! Two convenience extensions beyond standard JSON are accepted by default
//! and can be switched off: `//` and `/* */` comments, and single-quoted
//! strings.
//!
//! ```
//! use vellum_core::{json_record, Mapper};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Server {
//!     host: String,
//!     port: u16,
//!     tags: Vec<String>,
//! }
//! json_record!(Server { host, port, tags });
//!
//! let mapper = Mapper::new();
//! let server: Server = mapper
//!     .to_object(r#"{"host": "localhost", "port": 8080, "tags": ["a"]}"#)
//!     .unwrap();
//! assert_eq!(server.port, 8080);
//! assert_eq!(
//!     mapper.to_json(&server).unwrap(),
//!     r#"{"host":"localhost","port":8080,"tags":["a"]}"#
//! );
//! ```

pub mod error;
pub mod lexer;
pub mod mapper;
pub mod metadata;
pub mod reader;
pub mod reflect;
pub mod stream;
pub mod value;
pub mod writer;

pub use error::{JsonError, Result};
pub use lexer::{Lexer, LexerConfig, Token};
pub use mapper::{Mapper, MapperConfig};
pub use reader::{JsonReader, JsonToken, DEFAULT_MAX_DEPTH};
pub use reflect::{Bytes, JsonType};
pub use stream::StreamSerializer;
pub use value::{JsonKind, JsonValue};
pub use writer::JsonWriter;

/// Parse JSON text into a [`JsonValue`] with the default configuration.
pub fn to_dynamic(text: &str) -> Result<JsonValue> {
    Mapper::new().to_dynamic(text)
}
