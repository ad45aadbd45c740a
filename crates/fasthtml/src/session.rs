//! The public parsing interface.
//!
//! A [`ParseSession`] owns one in-progress parse. Callers feed it input
//! in as many chunks as they like and then collect the finished
//! [`Document`] together with the diagnostics, each mapped to a line
//! and column in the source. The one-shot [`parse_document`] and
//! [`parse_fragment`] helpers cover the common case of already having
//! the whole input in hand.

use crate::dom::Document;
use crate::errors::{ParseError, ParserError, SourcePosition};
use crate::quirks_mode::QuirksMode;
use crate::tag_name::TagName;
use crate::tree_builder::TreeBuilder;

/// Knobs for a parse.
///
/// The defaults parse a complete document the way a scripting-disabled
/// browser would.
#[derive(Debug, Default, Clone)]
pub struct ParseOptions {
    /// Forces the document compatibility mode, overriding whatever the
    /// DOCTYPE declaration (or its absence) would indicate.
    pub quirks_mode_override: Option<QuirksMode>,

    /// Whether to parse as if scripting were enabled. This changes how
    /// `noscript` elements are treated: with scripting on, their
    /// contents are opaque text.
    pub scripting_enabled: bool,

    /// Parse the input as the contents of the given element rather
    /// than as a full document.
    pub fragment_context: Option<TagName>,
}

/// One in-progress parse.
pub struct ParseSession {
    builder: TreeBuilder,
}

impl ParseSession {
    pub fn new(options: ParseOptions) -> Result<Self, ParserError> {
        let builder = match options.fragment_context {
            Some(context) => TreeBuilder::new_fragment(
                options.scripting_enabled,
                options.quirks_mode_override,
                context,
            )?,
            None => TreeBuilder::new(options.scripting_enabled, options.quirks_mode_override),
        };
        Ok(Self { builder })
    }

    /// Appends a chunk of input bytes and advances the parse as far as
    /// they allow. A token split across a chunk boundary simply waits
    /// for the next chunk; the resulting tree is byte-for-byte the same
    /// no matter how the input is divided.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), ParserError> {
        self.builder.extend(chunk)
    }

    /// Declares the input complete and returns the finished document
    /// along with every diagnostic noticed during the parse, in source
    /// order.
    pub fn finish(self) -> Result<(Document, Vec<ParseError>), ParserError> {
        let finished = self.builder.finish()?;
        log::debug!(
            "parsed {} bytes with {} diagnostics",
            finished.input.len(),
            finished.errors.len()
        );
        let errors = positioned_errors(&finished.input, finished.errors);
        Ok((finished.document, errors))
    }
}

/// Parses a complete HTML document.
pub fn parse_document(
    html: &[u8],
    options: ParseOptions,
) -> Result<(Document, Vec<ParseError>), ParserError> {
    let mut session = ParseSession::new(ParseOptions {
        fragment_context: None,
        ..options
    })?;
    session.feed(html)?;
    session.finish()
}

/// Parses HTML as the contents of the given context element, the way
/// setting `innerHTML` on such an element would.
pub fn parse_fragment(
    html: &[u8],
    context: TagName,
    options: ParseOptions,
) -> Result<(Document, Vec<ParseError>), ParserError> {
    let mut session = ParseSession::new(ParseOptions {
        fragment_context: Some(context),
        ..options
    })?;
    session.feed(html)?;
    session.finish()
}

/// Maps raw byte offsets onto 1-based line and column numbers in a
/// single pass over the input. Tree-construction diagnostics point at
/// the token that triggered them, which can sit earlier in the input
/// than a tokenizer diagnostic reported before it, so the offsets are
/// sorted first.
fn positioned_errors(
    input: &[u8],
    mut raw: Vec<(crate::errors::ParseErrorKind, usize)>,
) -> Vec<ParseError> {
    raw.sort_by_key(|&(_, offset)| offset);

    let mut errors = Vec::with_capacity(raw.len());
    let mut line = 1usize;
    let mut line_starts_at = 0usize;
    let mut cursor = 0usize;

    for (kind, offset) in raw {
        let offset = offset.min(input.len());
        while cursor < offset {
            if b'\n' == input[cursor] {
                line += 1;
                line_starts_at = cursor + 1;
            }
            cursor += 1;
        }
        errors.push(ParseError {
            kind,
            at: SourcePosition {
                offset,
                line,
                column: offset - line_starts_at + 1,
            },
        });
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ParseErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn one_shot_parse_builds_a_document() {
        let (document, errors) =
            parse_document(b"<!DOCTYPE html><p>hi</p>", ParseOptions::default()).unwrap();
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        assert_eq!(
            document.tree_representation(),
            "| <!DOCTYPE html>\n\
             | <html>\n\
             |   <head>\n\
             |   <body>\n\
             |     <p>\n\
             |       \"hi\"\n"
        );
    }

    #[test]
    fn diagnostics_carry_line_and_column() {
        let html = b"<!DOCTYPE html>\n<div>\n</span>";
        let (_, errors) = parse_document(html, ParseOptions::default()).unwrap();
        let stray = errors
            .iter()
            .find(|error| ParseErrorKind::StrayEndTag == error.kind)
            .unwrap();
        assert_eq!(3, stray.at.line);
        assert_eq!(1, stray.at.column);
    }

    #[test]
    fn diagnostics_arrive_in_source_order() {
        let html = b"<div></span><div></span>";
        let (_, errors) = parse_document(html, ParseOptions::default()).unwrap();
        let offsets: Vec<usize> = errors.iter().map(|error| error.at.offset).collect();
        let mut sorted = offsets.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, offsets);
    }

    #[test]
    fn quirks_override_beats_the_doctype() {
        let options = ParseOptions {
            quirks_mode_override: Some(QuirksMode::Quirks),
            ..ParseOptions::default()
        };
        let (document, _) = parse_document(b"<!DOCTYPE html><p>hi", options).unwrap();
        assert_eq!(QuirksMode::Quirks, document.quirks_mode());
    }

    #[test]
    fn fragment_parse_skips_document_scaffolding() {
        let (document, _) =
            parse_fragment(b"<li>one<li>two", TagName::UL, ParseOptions::default()).unwrap();
        assert_eq!(
            document.tree_representation(),
            "| <html>\n\
             |   <li>\n\
             |     \"one\"\n\
             |   <li>\n\
             |     \"two\"\n"
        );
    }

    #[test]
    fn scripting_makes_noscript_opaque() {
        let options = ParseOptions {
            scripting_enabled: true,
            ..ParseOptions::default()
        };
        let (document, _) =
            parse_document(b"<!DOCTYPE html><noscript><b>x</b></noscript>", options).unwrap();
        assert_eq!(
            document.tree_representation(),
            "| <!DOCTYPE html>\n\
             | <html>\n\
             |   <head>\n\
             |     <noscript>\n\
             |       \"<b>x</b>\"\n\
             |   <body>\n"
        );
    }

    #[test]
    fn feeding_in_chunks_matches_one_shot() {
        let html: &[u8] = b"<!DOCTYPE html><table><tr><td>cell</td></tr></table>";

        let (whole, _) = parse_document(html, ParseOptions::default()).unwrap();

        let mut session = ParseSession::new(ParseOptions::default()).unwrap();
        for chunk in html.chunks(5) {
            session.feed(chunk).unwrap();
        }
        let (chunked, _) = session.finish().unwrap();

        assert_eq!(whole.tree_representation(), chunked.tree_representation());
    }
}
