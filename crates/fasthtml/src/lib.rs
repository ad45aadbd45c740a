//! A streaming HTML parser with browser-grade error recovery.
//!
//! The parser follows the HTML parsing specification: a tokenizer that
//! turns bytes into tags, text, comments, and DOCTYPE declarations, and
//! a tree constructor that assembles those tokens into a [`Document`],
//! repairing misnested and unclosed markup the way a browser would.
//! Input arrives in chunks of any size and the resulting tree does not
//! depend on where the chunks were split.
//!
//! ```
//! use fasthtml::{parse_document, ParseOptions};
//!
//! let (document, errors) =
//!     parse_document(b"<!DOCTYPE html><p>Hello <b>world</b>", ParseOptions::default())?;
//! assert!(errors.is_empty());
//! # Ok::<(), fasthtml::ParserError>(())
//! ```
//!
//! @see https://html.spec.whatwg.org/#parsing

mod doctype;
mod dom;
mod errors;
mod macros;
mod quirks_mode;
mod session;
mod str_fns;
mod tag_name;
mod tokenizer;
mod tree_builder;

pub use doctype::DoctypeInfo;
pub use dom::{
    Attribute, Descendants, Document, DoctypeData, ElementData, Namespace, NodeId, NodeKind,
};
pub use errors::{ParseError, ParseErrorKind, ParserError, SourcePosition};
pub use quirks_mode::QuirksMode;
pub use session::{parse_document, parse_fragment, ParseOptions, ParseSession};
pub use tag_name::TagName;
