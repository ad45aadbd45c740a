use crate::dom::{Attribute, Namespace};
use crate::doctype::DoctypeInfo;
use crate::errors::ParseErrorKind;
use crate::macros::{strcspn, strspn};
use crate::str_fns::{strpos, stripos, substr};
use crate::tag_name::TagName;

use entities::{decode, decode_html_ref, HtmlContext};
use rustc_hash::FxHashSet;

/// Determines how the bytes after a start tag are scanned.
///
/// The tree constructor switches the model after seeing tags whose
/// contents are not parsed as markup, such as SCRIPT, STYLE, TITLE,
/// TEXTAREA, and PLAINTEXT. The tokenizer returns to `Data` once the
/// closing tag sequence is found so that the closer itself can be
/// parsed as a normal tag token.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContentModel {
    #[default]
    Data,

    /// Character references are decoded, but no tags match inside.
    /// Applies to TITLE and TEXTAREA contents.
    Rcdata,

    /// Neither character references nor tags: IFRAME, NOEMBED,
    /// NOFRAMES, STYLE, XMP, and NOSCRIPT when scripting is enabled.
    Rawtext,

    /// Like RAWTEXT but with the escaping rules that allow a script
    /// to contain the string "</script>" inside a comment-like span.
    ScriptData,

    /// Everything until the end of the document is text.
    Plaintext,
}

#[derive(Default, PartialEq, Debug, Clone, Copy)]
pub(crate) enum ParserState {
    #[default]
    Ready,
    Complete,
    IncompleteInput,
    MatchedTag,
    TextNode,
    CDATANode,
    Comment,
    Doctype,
    PresumptuousTag,
}

/// The kind of token last matched by the tokenizer.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum TokenType {
    Tag,
    Text,
    CdataSection,
    Comment,
    Doctype,
    PresumptuousTag,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) enum CommentType {
    /// An abruptly-closed HTML comment.
    ///
    /// Example:
    /// ```text
    ///
    ///     <!-->
    ///     <!--->
    /// ```
    AbruptlyClosedComment,

    /// A comment which would be parsed as a CDATA node,
    /// were HTML to allow CDATA nodes outside of foreign content.
    ///
    /// Example:
    /// ```text
    ///
    ///     <![CDATA[This is a CDATA node.]]>
    /// ```
    CdataLookalike,

    /// Normative HTML comment syntax.
    ///
    /// Example:
    /// ```text
    ///
    ///     <!-- this is a comment -->
    /// ```
    HtmlComment,

    /// Invalid HTML input which parses as a comment, a so-called
    /// "bogus comment."
    ///
    /// Example:
    /// ```text
    ///
    ///     <?nothing special>
    ///     <!{nothing special}>
    ///     </%funky>
    /// ```
    InvalidHtml,
}

#[derive(PartialEq, Clone, Copy)]
pub(crate) enum TextNodeClassification {
    Generic,
    NullSequence,
    Whitespace,
}

#[derive(PartialEq)]
enum ScriptState {
    Unescaped,
    Escaped,
    DoubleEscaped,
}

/// Result of scanning a RAWTEXT, RCDATA, or script data region.
enum RegionScan {
    /// Text was found before the closing tag sequence.
    Text,

    /// The region closed immediately; no text token to report.
    Empty,

    /// The closing sequence lies beyond the end of the buffer.
    Incomplete,
}

struct AttributeToken {
    /// The byte offset where the attribute name starts.
    start: usize,

    /// The byte length of the name.
    name_length: usize,

    /// The byte offset where the attribute value starts.
    value_starts_at: usize,

    /// The byte length of the attribute value.
    value_length: usize,

    /// Whether the attribute is a boolean attribute with value `true`.
    is_true: bool,
}

/// A streaming scanner producing one token span at a time.
///
/// The tokenizer holds the full run of input bytes received so far and
/// tracks the current token through byte offsets into that buffer. No
/// text is copied until an accessor asks for it. When a token would
/// extend past the end of the buffered input the tokenizer rewinds to
/// the token boundary and reports `IncompleteInput`; a later call to
/// `extend()` resumes parsing from that boundary.
pub(crate) struct Tokenizer {
    html_bytes: Vec<u8>,
    bytes_already_parsed: usize,

    /// Set once the caller signals that no further input will arrive.
    /// Truncated constructs then resolve with recovery rules instead
    /// of pausing for more bytes.
    input_finished: bool,

    parser_state: ParserState,
    content_model: ContentModel,

    /// The tag whose end tag terminates the current RCDATA or RAWTEXT
    /// region. Unused in the other content models.
    region_closer: Option<TagName>,

    parsing_namespace: Namespace,

    token_starts_at: Option<usize>,
    token_length: Option<usize>,
    tag_name_starts_at: Option<usize>,
    tag_name_length: Option<usize>,
    text_starts_at: Option<usize>,
    text_length: Option<usize>,
    is_closing_tag: Option<bool>,
    attributes: Vec<AttributeToken>,
    saw_closer_attributes: bool,
    comment_type: Option<CommentType>,
    text_node_classification: TextNodeClassification,

    /// Whether the current text region should not be decoded, because
    /// it came from a RAWTEXT, script data, or PLAINTEXT region.
    text_is_raw: bool,

    /// After a PRE, LISTING, or TEXTAREA opener, a newline immediately
    /// following the tag is ignored as an authoring convenience.
    skip_newline_at: Option<usize>,

    /// Syntax errors found while scanning, as (kind, byte offset)
    /// pairs. Drained by the parse session, which resolves offsets
    /// into line and column positions once parsing ends.
    errors: Vec<(ParseErrorKind, usize)>,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            html_bytes: Vec::new(),
            bytes_already_parsed: 0,
            input_finished: false,
            parser_state: ParserState::default(),
            content_model: ContentModel::default(),
            region_closer: None,
            parsing_namespace: Namespace::Html,
            token_starts_at: None,
            token_length: None,
            tag_name_starts_at: None,
            tag_name_length: None,
            text_starts_at: None,
            text_length: None,
            is_closing_tag: None,
            attributes: Vec::new(),
            saw_closer_attributes: false,
            comment_type: None,
            text_node_classification: TextNodeClassification::Generic,
            text_is_raw: false,
            skip_newline_at: None,
            errors: Vec::new(),
        }
    }

    /// Appends another run of input bytes and resumes if the tokenizer
    /// had paused at the end of the previous run.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.html_bytes.extend_from_slice(chunk);
        if ParserState::IncompleteInput == self.parser_state {
            self.parser_state = ParserState::Ready;
        }
    }

    /// Signals that no further input will arrive. Constructs that were
    /// waiting for more bytes now resolve with end-of-file recovery.
    pub fn finish_input(&mut self) {
        self.input_finished = true;
        if ParserState::IncompleteInput == self.parser_state {
            self.parser_state = ParserState::Ready;
        }
    }

    pub fn is_paused(&self) -> bool {
        ParserState::IncompleteInput == self.parser_state
    }

    pub fn is_complete(&self) -> bool {
        ParserState::Complete == self.parser_state
    }

    /// Finds the next token in the buffered input.
    ///
    /// @return bool Whether a token was matched.
    pub fn next_token(&mut self) -> bool {
        let was_at = self.bytes_already_parsed;
        let errors_mark = self.errors.len();
        self.after_token();

        if ParserState::Complete == self.parser_state
            || ParserState::IncompleteInput == self.parser_state
        {
            return false;
        }

        /*
         * The next step in the parsing loop determines the parsing state;
         * clear it so that state doesn't linger from the previous step.
         */
        self.parser_state = ParserState::Ready;

        if self.bytes_already_parsed >= self.html_bytes.len() {
            self.parser_state = if self.input_finished {
                ParserState::Complete
            } else {
                ParserState::IncompleteInput
            };
            return false;
        }

        match self.content_model {
            ContentModel::Data => {}

            ContentModel::Plaintext => return self.parse_plaintext(was_at),

            ContentModel::Rcdata | ContentModel::Rawtext | ContentModel::ScriptData => {
                let decodes = ContentModel::Rcdata == self.content_model;
                self.text_is_raw = !decodes;
                let outcome = if ContentModel::ScriptData == self.content_model {
                    self.scan_script_data()
                } else {
                    self.scan_rawtext_region()
                };

                match outcome {
                    RegionScan::Text => {
                        self.content_model = ContentModel::Data;
                        self.region_closer = None;
                        return true;
                    }

                    RegionScan::Empty => {
                        // Fall through and parse the closing tag as a normal token.
                        self.content_model = ContentModel::Data;
                        self.region_closer = None;
                        self.text_is_raw = false;
                    }

                    RegionScan::Incomplete => {
                        if !self.input_finished {
                            self.parser_state = ParserState::IncompleteInput;
                            self.bytes_already_parsed = was_at;
                            self.errors.truncate(errors_mark);
                            return false;
                        }

                        /*
                         * The region never closes. Everything left in the
                         * document is its text; the unclosed element itself
                         * is reported when the tree constructor handles the
                         * end of the document.
                         */
                        self.content_model = ContentModel::Data;
                        self.region_closer = None;
                        let doc_length = self.html_bytes.len();
                        if was_at >= doc_length {
                            self.parser_state = ParserState::Complete;
                            return false;
                        }
                        self.parser_state = ParserState::TextNode;
                        self.token_starts_at = Some(was_at);
                        self.token_length = Some(doc_length - was_at);
                        self.text_starts_at = Some(was_at);
                        self.text_length = Some(doc_length - was_at);
                        self.bytes_already_parsed = doc_length;
                        self.classify_matched_text();
                        return true;
                    }
                }
            }
        }

        // Find the next tag if it exists.
        if !self.parse_next_tag() {
            if self.parser_state == ParserState::IncompleteInput {
                self.bytes_already_parsed = was_at;
                self.errors.truncate(errors_mark);
            }
            return false;
        }

        if ParserState::TextNode == self.parser_state {
            self.classify_matched_text();
        }

        /*
         * The remainder of this function handles tag tokens and their
         * attributes. Any other token kind is complete at this point.
         */
        if ParserState::MatchedTag != self.parser_state {
            return true;
        }

        // Parse all of its attributes.
        while self.parse_next_attribute() {}

        // Ensure that the tag closes before the end of the document.
        if ParserState::IncompleteInput == self.parser_state
            || self.bytes_already_parsed >= self.html_bytes.len()
        {
            return self.bail_or_drop_tag(was_at, errors_mark);
        }

        let tag_ends_at = match strpos(&self.html_bytes, b">", self.bytes_already_parsed) {
            Some(at) => at,
            None => return self.bail_or_drop_tag(was_at, errors_mark),
        };

        self.parser_state = ParserState::MatchedTag;
        self.bytes_already_parsed = tag_ends_at + 1;
        let token_starts_at = self.token_starts_at.unwrap_or(was_at);
        self.token_length = Some(self.bytes_already_parsed - token_starts_at);

        if self.is_closing_tag.unwrap_or(false) {
            if self.saw_closer_attributes {
                self.record_error(ParseErrorKind::EndTagWithAttributes, token_starts_at);
            }
            if self.has_self_closing_flag() {
                self.record_error(ParseErrorKind::EndTagWithTrailingSolidus, token_starts_at);
            }
            return true;
        }

        if self.attributes.len() > 1 {
            self.check_duplicate_attributes(token_starts_at);
        }

        /*
         * For LISTING, PRE, and TEXTAREA, the first linefeed of an
         * immediately-following text node is ignored as an authoring
         * convenience. The first-letter pre-check avoids comparing
         * tag names for the overwhelming majority of tags.
         */
        if Namespace::Html == self.parsing_namespace
            && matches!(
                self.html_bytes[self.tag_name_starts_at.unwrap_or(token_starts_at)],
                b'l' | b'L' | b'p' | b'P' | b't' | b'T'
            )
        {
            if let Some(tag) = self.get_tag() {
                if matches!(tag, TagName::LISTING | TagName::PRE | TagName::TEXTAREA) {
                    self.skip_newline_at = Some(self.bytes_already_parsed);
                }
            }
        }

        true
    }

    /// Clears per-token state once a token has been consumed.
    fn after_token(&mut self) {
        self.token_starts_at = None;
        self.token_length = None;
        self.tag_name_starts_at = None;
        self.tag_name_length = None;
        self.text_starts_at = None;
        self.text_length = None;
        self.is_closing_tag = None;
        self.attributes.clear();
        self.saw_closer_attributes = false;
        self.comment_type = None;
        self.text_node_classification = TextNodeClassification::Generic;
        self.text_is_raw = false;
    }

    /// Resolves a tag that was cut off by the end of the buffer:
    /// pause for more input, or drop the tag entirely at end of file.
    fn bail_or_drop_tag(&mut self, was_at: usize, errors_mark: usize) -> bool {
        if !self.input_finished {
            self.parser_state = ParserState::IncompleteInput;
            self.bytes_already_parsed = was_at;
            self.errors.truncate(errors_mark);
            return false;
        }

        /*
         * > This is an eof-in-tag parse error. Emit an end-of-file token.
         *
         * The truncated tag produces no token at all.
         */
        self.record_error(ParseErrorKind::EofInTag, self.token_starts_at.unwrap_or(was_at));
        self.parser_state = ParserState::Complete;
        self.bytes_already_parsed = self.html_bytes.len();
        false
    }

    /// Consumes the remainder of the document as text. PLAINTEXT has no
    /// closing sequence, so nothing can be reported until input ends.
    fn parse_plaintext(&mut self, was_at: usize) -> bool {
        if !self.input_finished {
            self.parser_state = ParserState::IncompleteInput;
            self.bytes_already_parsed = was_at;
            return false;
        }

        let doc_length = self.html_bytes.len();
        self.parser_state = ParserState::TextNode;
        self.token_starts_at = Some(was_at);
        self.token_length = Some(doc_length - was_at);
        self.text_starts_at = Some(was_at);
        self.text_length = Some(doc_length - was_at);
        self.bytes_already_parsed = doc_length;
        self.text_is_raw = true;
        self.classify_matched_text();
        true
    }

    fn parse_next_tag(&mut self) -> bool {
        let doc_length = self.html_bytes.len();
        let was_at = self.bytes_already_parsed;
        let mut at = was_at;

        while at < doc_length {
            at = match strpos(&self.html_bytes, b"<", at) {
                Some(next_at) => next_at,
                None => break,
            };

            if at > was_at {
                /*
                 * A "<" normally starts a new HTML tag or syntax token, but in cases where the
                 * following character can't produce a valid token, the "<" is instead treated
                 * as plaintext and the parser should skip over it. This avoids a problem when
                 * following earlier practices of typing emoji with text, e.g. "<3". This
                 * should be a heart, not a tag. It's supposed to be rendered, not hidden.
                 *
                 * At this point the parser checks if this is one of those cases and if it is
                 * will continue searching for the next "<" in search of a token boundary.
                 *
                 * @see https://html.spec.whatwg.org/#tag-open-state
                 */
                if at + 1 < doc_length
                    && !matches!(
                        self.html_bytes[at + 1],
                        b'!' | b'/' | b'?' | b'a'..=b'z' | b'A'..=b'Z'
                    )
                {
                    at += 1;
                    continue;
                }

                /*
                 * A trailing "<" at the very end of the buffer may yet grow into
                 * a token once more input arrives; don't emit the text before it
                 * until that is settled.
                 */
                if at + 1 >= doc_length && !self.input_finished {
                    self.parser_state = ParserState::IncompleteInput;
                    return false;
                }

                self.parser_state = ParserState::TextNode;
                self.token_starts_at = Some(was_at);
                self.token_length = Some(at - was_at);
                self.text_starts_at = Some(was_at);
                self.text_length = Some(at - was_at);
                self.bytes_already_parsed = at;
                return true;
            }

            self.token_starts_at = Some(at);

            if at + 1 < doc_length && b'/' == self.html_bytes[at + 1] {
                self.is_closing_tag = Some(true);
                at += 1;
            } else {
                self.is_closing_tag = Some(false);
            }

            /*
             * HTML tag names must start with [a-zA-Z] otherwise they are not tags.
             * For example, "<3" is rendered as text, not a tag opener. If at least
             * one letter follows the "<" then _it is_ a tag, but if the following
             * character is anything else it _is not a tag_.
             *
             * It's not uncommon to find non-tags starting with `<` in an HTML
             * document, so it's good for performance to make this pre-check before
             * continuing to attempt to parse a tag name.
             *
             * Reference:
             * * https://html.spec.whatwg.org/multipage/parsing.html#data-state
             * * https://html.spec.whatwg.org/multipage/parsing.html#tag-open-state
             */
            let tag_name_prefix_length =
                strspn!(self.html_bytes, b'a'..=b'z' | b'A'..=b'Z', at + 1);

            if tag_name_prefix_length > 0 {
                at += 1;
                self.parser_state = ParserState::MatchedTag;
                self.tag_name_starts_at = Some(at);
                self.tag_name_length = Some(
                    tag_name_prefix_length
                        + strcspn!(
                            self.html_bytes,
                            b' ' | b'\t' | 0x0c | b'\r' | b'\n' | b'/' | b'>',
                            at + tag_name_prefix_length
                        ),
                );
                self.bytes_already_parsed = at + self.tag_name_length.unwrap_or(0);
                return true;
            }

            /*
             * Abort if no tag is found before the end of
             * the document. There is nothing left to parse.
             */
            if at + 1 >= doc_length {
                if !self.input_finished {
                    self.parser_state = ParserState::IncompleteInput;
                    return false;
                }

                /*
                 * > This is an eof-before-tag-name parse error. Emit a U+003C
                 * > LESS-THAN SIGN character token and an end-of-file token.
                 */
                self.record_error(ParseErrorKind::EofBeforeTagName, at);
                self.parser_state = ParserState::TextNode;
                self.token_starts_at = Some(was_at);
                self.token_length = Some(doc_length - was_at);
                self.text_starts_at = Some(was_at);
                self.text_length = Some(doc_length - was_at);
                self.bytes_already_parsed = doc_length;
                return true;
            }

            /*
             * `<!` transitions to markup declaration open state
             * https://html.spec.whatwg.org/multipage/parsing.html#markup-declaration-open-state
             */
            if !self.is_closing_tag.unwrap_or(false) && b'!' == self.html_bytes[at + 1] {
                /*
                 * `<!--` transitions to a comment state – apply further comment rules.
                 * https://html.spec.whatwg.org/multipage/parsing.html#tag-open-state
                 */
                if at + 4 <= doc_length && &self.html_bytes[at + 2..at + 4] == b"--" {
                    return self.parse_comment(at);
                }
                if at + 4 > doc_length && !self.input_finished {
                    self.parser_state = ParserState::IncompleteInput;
                    return false;
                }

                /*
                 * `<!DOCTYPE` transitions to DOCTYPE state – skip to the nearest >
                 * These are ASCII-case-insensitive.
                 * https://html.spec.whatwg.org/multipage/parsing.html#tag-open-state
                 */
                if doc_length > at + 8
                    && matches!(&self.html_bytes[at + 2], b'D' | b'd')
                    && matches!(&self.html_bytes[at + 3], b'O' | b'o')
                    && matches!(&self.html_bytes[at + 4], b'C' | b'c')
                    && matches!(&self.html_bytes[at + 5], b'T' | b't')
                    && matches!(&self.html_bytes[at + 6], b'Y' | b'y')
                    && matches!(&self.html_bytes[at + 7], b'P' | b'p')
                    && matches!(&self.html_bytes[at + 8], b'E' | b'e')
                {
                    let closer_at = match strpos(&self.html_bytes, b">", at + 9) {
                        Some(closer_at) => closer_at,
                        None => {
                            if !self.input_finished {
                                self.parser_state = ParserState::IncompleteInput;
                                return false;
                            }

                            // > This is an eof-in-doctype parse error.
                            self.record_error(ParseErrorKind::EofInDoctype, at);
                            self.parser_state = ParserState::Doctype;
                            self.token_length = Some(doc_length - at);
                            self.text_starts_at = Some(at + 9);
                            self.text_length = Some(doc_length - (at + 9));
                            self.bytes_already_parsed = doc_length;
                            return true;
                        }
                    };

                    self.parser_state = ParserState::Doctype;
                    self.token_length = Some(closer_at + 1 - at);
                    self.text_starts_at = Some(at + 9);
                    self.text_length = Some(closer_at - (at + 9));
                    self.bytes_already_parsed = closer_at + 1;
                    return true;
                }

                if doc_length > at + 8
                    && Namespace::Html != self.parsing_namespace
                    && &self.html_bytes[at + 2..=at + 8] == b"[CDATA["
                {
                    let closer_at = match strpos(&self.html_bytes, b"]]>", at + 9) {
                        Some(closer_at) => closer_at,
                        None => {
                            if !self.input_finished {
                                self.parser_state = ParserState::IncompleteInput;
                                return false;
                            }

                            // > This is an eof-in-cdata parse error.
                            self.record_error(ParseErrorKind::EofInText, at);
                            self.parser_state = ParserState::CDATANode;
                            self.token_length = Some(doc_length - at);
                            self.text_starts_at = Some(at + 9);
                            self.text_length = Some(doc_length - (at + 9));
                            self.bytes_already_parsed = doc_length;
                            return true;
                        }
                    };

                    self.parser_state = ParserState::CDATANode;
                    self.text_starts_at = Some(at + 9);
                    self.text_length = Some(closer_at - (at + 9));
                    self.token_length = Some(closer_at + 3 - at);
                    self.bytes_already_parsed = closer_at + 3;
                    return true;
                }

                /*
                 * Anything else here is an incorrectly-opened comment and transitions
                 * to the bogus comment state - skip to the nearest >. If no closer is
                 * found then the HTML was truncated inside the markup declaration.
                 */
                if doc_length <= at + 9 && !self.input_finished {
                    // Could still become a DOCTYPE or CDATA section.
                    self.parser_state = ParserState::IncompleteInput;
                    return false;
                }

                return self.parse_bogus_comment(at, at + 2, true);
            }

            /*
             * </> is a missing end tag name, which is ignored.
             *
             * This was also known as the "presumptuous empty tag"
             * in early discussions as it was proposed to close
             * the nearest previous opening tag.
             *
             * See https://html.spec.whatwg.org/#parse-error-missing-end-tag-name
             */
            if b'>' == self.html_bytes[at + 1] {
                // `<>` is interpreted as plaintext.
                if !self.is_closing_tag.unwrap_or(false) {
                    at += 1;
                    continue;
                }

                self.parser_state = ParserState::PresumptuousTag;
                self.token_length = Some(at + 2 - self.token_starts_at.unwrap_or(at));
                self.bytes_already_parsed = at + 2;
                return true;
            }

            /*
             * `<?` transitions to a bogus comment state – skip to the nearest >
             * See https://html.spec.whatwg.org/multipage/parsing.html#tag-open-state
             */
            if !self.is_closing_tag.unwrap_or(false) && b'?' == self.html_bytes[at + 1] {
                self.record_error(
                    ParseErrorKind::UnexpectedQuestionMarkInsteadOfTagName,
                    at,
                );
                return self.parse_bogus_comment(at, at + 1, false);
            }

            /*
             * If a non-alpha starts the tag name in a tag closer it's a comment.
             * Find the first `>`, which closes the comment.
             *
             * See https://html.spec.whatwg.org/#parse-error-invalid-first-character-of-tag-name
             */
            if self.is_closing_tag.unwrap_or(false) {
                // `at` has already advanced past the solidus.
                return self.parse_bogus_comment(at - 1, at + 1, false);
            }

            at += 1;
        }

        /*
         * No remaining "<" in the buffer: everything left is a #text node,
         * but only if the document is complete. Otherwise a tag could still
         * arrive in a later run of input.
         */
        if !self.input_finished {
            self.parser_state = ParserState::IncompleteInput;
            return false;
        }

        self.parser_state = ParserState::TextNode;
        self.token_starts_at = Some(was_at);
        self.token_length = Some(doc_length - was_at);
        self.text_starts_at = Some(was_at);
        self.text_length = Some(doc_length - was_at);
        self.bytes_already_parsed = doc_length;

        true
    }

    /// Parses a normative comment opened with `<!--` at the given offset.
    fn parse_comment(&mut self, at: usize) -> bool {
        let doc_length = self.html_bytes.len();
        let mut closer_at = at + 4;

        // If it's not possible to close the comment then there is nothing more to scan.
        if doc_length <= closer_at {
            return self.comment_cut_short(at);
        }

        // Abruptly-closed empty comments are a sequence of dashes followed by `>`.
        let span_of_dashes = strspn!(self.html_bytes, b'-', closer_at);
        if closer_at + span_of_dashes < doc_length
            && b'>' == self.html_bytes[closer_at + span_of_dashes]
        {
            self.parser_state = ParserState::Comment;
            self.comment_type = Some(CommentType::AbruptlyClosedComment);
            self.token_length = Some(closer_at + span_of_dashes + 1 - at);

            // Only provide text if the token is long enough to contain it.
            if span_of_dashes >= 2 {
                self.comment_type = Some(CommentType::HtmlComment);
                self.text_starts_at = Some(at + 4);
                self.text_length = Some(span_of_dashes - 2);
            } else {
                self.record_error(ParseErrorKind::AbruptClosingOfComment, at);
            }

            self.bytes_already_parsed = closer_at + span_of_dashes + 1;
            return true;
        }

        /*
         * Comments may be closed by either a --> or an invalid --!>.
         * The first occurrence closes the comment.
         *
         * See https://html.spec.whatwg.org/#parse-error-incorrectly-closed-comment
         */
        loop {
            closer_at = match strpos(&self.html_bytes, b"--", closer_at) {
                Some(found) => found,
                None => return self.comment_cut_short(at),
            };

            if closer_at + 2 < doc_length && b'>' == self.html_bytes[closer_at + 2] {
                return self.finish_comment(at, closer_at, 3);
            }

            if closer_at + 3 < doc_length
                && b'!' == self.html_bytes[closer_at + 2]
                && b'>' == self.html_bytes[closer_at + 3]
            {
                return self.finish_comment(at, closer_at, 4);
            }

            if closer_at + 3 >= doc_length {
                return self.comment_cut_short(at);
            }

            closer_at += 1;
        }
    }

    fn finish_comment(&mut self, at: usize, closer_at: usize, closer_length: usize) -> bool {
        self.parser_state = ParserState::Comment;
        self.comment_type = Some(CommentType::HtmlComment);
        self.token_length = Some(closer_at + closer_length - at);
        self.text_starts_at = Some(at + 4);
        self.text_length = Some(closer_at - (at + 4));
        self.bytes_already_parsed = closer_at + closer_length;

        // Comment text containing a nested "<!--" is a parse error.
        let text = substr(&self.html_bytes, at + 4, closer_at - (at + 4));
        if let Some(nested) = strpos(text, b"<!--", 0) {
            self.record_error(ParseErrorKind::NestedComment, at + 4 + nested);
        }

        true
    }

    /// A comment ran past the end of the buffer: pause, or at end of
    /// file emit the truncated comment with everything left as its text.
    fn comment_cut_short(&mut self, at: usize) -> bool {
        if !self.input_finished {
            self.parser_state = ParserState::IncompleteInput;
            return false;
        }

        // > This is an eof-in-comment parse error.
        let doc_length = self.html_bytes.len();
        let text_from = (at + 4).min(doc_length);
        self.record_error(ParseErrorKind::EofInComment, at);
        self.parser_state = ParserState::Comment;
        self.comment_type = Some(CommentType::HtmlComment);
        self.token_length = Some(doc_length - at);
        self.text_starts_at = Some(text_from);
        self.text_length = Some(doc_length - text_from);
        self.bytes_already_parsed = doc_length;
        true
    }

    /// Parses a bogus comment: `<?`, `<!` with no recognized keyword, or
    /// `</` with a non-alpha first character. The token spans to the
    /// nearest `>` and its text starts at `text_from`.
    fn parse_bogus_comment(&mut self, at: usize, text_from: usize, check_cdata: bool) -> bool {
        let doc_length = self.html_bytes.len();

        let closer_at = match strpos(&self.html_bytes, b">", text_from) {
            Some(closer_at) => closer_at,
            None => {
                if !self.input_finished {
                    self.parser_state = ParserState::IncompleteInput;
                    return false;
                }

                // At end of file the bogus comment consumes everything left.
                self.parser_state = ParserState::Comment;
                self.comment_type = Some(CommentType::InvalidHtml);
                self.token_length = Some(doc_length - at);
                self.text_starts_at = Some(text_from);
                self.text_length = Some(doc_length - text_from);
                self.bytes_already_parsed = doc_length;
                return true;
            }
        };

        self.parser_state = ParserState::Comment;
        self.comment_type = Some(CommentType::InvalidHtml);
        self.token_length = Some(closer_at + 1 - at);
        self.text_starts_at = Some(text_from);
        self.text_length = Some(closer_at - text_from);
        self.bytes_already_parsed = closer_at + 1;

        /*
         * Identify nodes that would be CDATA if HTML had CDATA sections.
         *
         * This section must occur after identifying the bogus comment end
         * because in an HTML parser it will span to the nearest `>`, even
         * if there's no `]]>` as would be required in an XML document. It
         * is therefore not possible to parse a CDATA section containing
         * a `>` in the HTML syntax.
         */
        if check_cdata
            && self.token_length.unwrap_or(0) >= 10
            && &self.html_bytes[at + 2..at + 9] == b"[CDATA["
            && b']' == self.html_bytes[closer_at - 1]
            && b']' == self.html_bytes[closer_at - 2]
        {
            self.record_error(ParseErrorKind::CdataInHtmlContent, at);
            self.comment_type = Some(CommentType::CdataLookalike);
            self.text_starts_at = Some(at + 9);
            self.text_length = Some(closer_at - 2 - (at + 9));
        }

        true
    }

    fn parse_next_attribute(&mut self) -> bool {
        let doc_length = self.html_bytes.len();

        // Skip whitespace and slashes.
        let skipped_from = self.bytes_already_parsed;
        self.bytes_already_parsed += strspn!(
            &self.html_bytes,
            b' ' | b'\t' | 0x0c | b'\r' | b'\n' | b'/',
            self.bytes_already_parsed
        );
        if self.bytes_already_parsed >= doc_length {
            self.parser_state = ParserState::IncompleteInput;
            return false;
        }

        /*
         * A solidus which does not immediately precede the closing ">"
         * is ignored, but reported.
         *
         * See https://html.spec.whatwg.org/#parse-error-unexpected-solidus-in-tag
         */
        if self.bytes_already_parsed > skipped_from
            && b'/' == self.html_bytes[self.bytes_already_parsed - 1]
            && b'>' != self.html_bytes[self.bytes_already_parsed]
        {
            self.record_error(ParseErrorKind::UnexpectedSolidusInTag, self.bytes_already_parsed - 1);
        }

        /*
         * Treat the equal sign as a part of the attribute
         * name if it is the first encountered byte.
         *
         * @see https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-name-state
         */
        let starts_with_equal = b'=' == self.html_bytes[self.bytes_already_parsed];
        let start_shift = if starts_with_equal { 1 } else { 0 };
        let name_length = start_shift
            + strcspn!(
                self.html_bytes,
                b'=' | b'/' | b'>' | b' ' | b'\t' | 0x0c | b'\r' | b'\n',
                self.bytes_already_parsed + start_shift
            );

        // No attribute, just tag closer.
        if 0 == name_length || self.bytes_already_parsed + name_length >= doc_length {
            return false;
        }

        let attribute_start = self.bytes_already_parsed;
        self.bytes_already_parsed += name_length;
        if self.bytes_already_parsed >= doc_length {
            self.parser_state = ParserState::IncompleteInput;
            return false;
        }

        self.skip_whitespace();
        if self.bytes_already_parsed >= doc_length {
            self.parser_state = ParserState::IncompleteInput;
            return false;
        }

        let has_value = b'=' == self.html_bytes[self.bytes_already_parsed];
        let (value_start, value_length, attribute_end) = if has_value {
            self.bytes_already_parsed += 1;
            self.skip_whitespace();
            if self.bytes_already_parsed >= doc_length {
                self.parser_state = ParserState::IncompleteInput;
                return false;
            }

            match self.html_bytes[self.bytes_already_parsed] {
                quote @ (b'\'' | b'"') => {
                    let value_start = self.bytes_already_parsed + 1;
                    let end_quote_at =
                        strpos(&self.html_bytes, &[quote], value_start).unwrap_or(doc_length);
                    let value_length = end_quote_at - value_start;
                    let attribute_end = end_quote_at + 1;
                    self.bytes_already_parsed = attribute_end;
                    (value_start, value_length, attribute_end)
                }

                _ => {
                    let value_start = self.bytes_already_parsed;
                    let value_length = strcspn!(
                        self.html_bytes,
                        b'>' | b' ' | b'\t' | 0x0c | b'\r' | b'\n',
                        value_start
                    );
                    let attribute_end = value_start + value_length;
                    self.bytes_already_parsed = attribute_end;
                    (value_start, value_length, attribute_end)
                }
            }
        } else {
            (self.bytes_already_parsed, 0, attribute_start + name_length)
        };

        if attribute_end >= doc_length {
            self.parser_state = ParserState::IncompleteInput;
            return false;
        }

        /*
         * > When the user agent leaves the attribute name state (and
         * > before emitting the tag token, if appropriate) ... if the
         * > tag is an end tag, it is an end-tag-with-attributes error.
         *
         * Attributes on tag closers are parsed to find the span of the
         * closer but are never retained.
         */
        if self.is_closing_tag.unwrap_or(false) {
            self.saw_closer_attributes = true;
            return true;
        }

        self.attributes.push(AttributeToken {
            start: attribute_start,
            name_length,
            value_starts_at: value_start,
            value_length,
            is_true: !has_value,
        });

        true
    }

    /// Move the internal cursor past any immediate successive whitespace.
    fn skip_whitespace(&mut self) {
        self.bytes_already_parsed += strspn!(
            &self.html_bytes,
            b' ' | b'\t' | b'\x0C' | b'\r' | b'\n',
            self.bytes_already_parsed
        );
    }

    /// Scans an RCDATA or RAWTEXT region, looking for the end tag which
    /// terminates it. The cursor stops at the first byte of the closing
    /// tag so that the closer parses as a normal tag token afterwards.
    ///
    /// @see https://html.spec.whatwg.org/multipage/parsing.html#rcdata-state
    /// @see https://html.spec.whatwg.org/#generic-raw-text-element-parsing-algorithm
    fn scan_rawtext_region(&mut self) -> RegionScan {
        let doc_length = self.html_bytes.len();
        let region_starts_at = self.bytes_already_parsed;

        let closer = match &self.region_closer {
            Some(tag) => tag,
            None => return RegionScan::Empty,
        };
        let mut needle = Vec::with_capacity(2 + closer.as_bytes().len());
        needle.extend_from_slice(b"</");
        needle.extend_from_slice(closer.as_bytes());

        let mut at = region_starts_at;
        while at + needle.len() < doc_length {
            let candidate = match stripos(&self.html_bytes, &needle, at) {
                Some(found) => found,
                None => return RegionScan::Incomplete,
            };

            /*
             * Ensure that the tag name terminates to avoid matching on
             * substrings of a longer tag name. For example, the sequence
             * "</textarearug" should not match for "</textarea" even
             * though "textarea" is found within the text.
             */
            let after_name = candidate + needle.len();
            if after_name >= doc_length {
                return RegionScan::Incomplete;
            }
            if !matches!(
                self.html_bytes[after_name],
                b' ' | b'\t' | b'\r' | b'\n' | 0x0c | b'/' | b'>'
            ) {
                at = after_name;
                continue;
            }

            if candidate == region_starts_at {
                return RegionScan::Empty;
            }

            self.parser_state = ParserState::TextNode;
            self.token_starts_at = Some(region_starts_at);
            self.token_length = Some(candidate - region_starts_at);
            self.text_starts_at = Some(region_starts_at);
            self.text_length = Some(candidate - region_starts_at);
            self.bytes_already_parsed = candidate;
            self.classify_matched_text();
            return RegionScan::Text;
        }

        RegionScan::Incomplete
    }

    /// Scans script data, honoring the escaping rules which allow the
    /// text "</script>" to appear inside comment-like spans within a
    /// script without terminating the element.
    ///
    /// @see https://html.spec.whatwg.org/multipage/parsing.html#script-data-state
    fn scan_script_data(&mut self) -> RegionScan {
        let mut state = ScriptState::Unescaped;
        let doc_length = self.html_bytes.len();
        let region_starts_at = self.bytes_already_parsed;
        let mut at = region_starts_at;

        while at < doc_length {
            at += strcspn!(self.html_bytes, b'-' | b'<', at);

            /*
             * For all script states a "-->" transitions
             * back into the normal unescaped script mode,
             * even if that's the current state.
             */
            if at + 2 < doc_length
                && self.html_bytes[at] == b'-'
                && self.html_bytes[at + 1] == b'-'
                && self.html_bytes[at + 2] == b'>'
            {
                at += 3;
                state = ScriptState::Unescaped;
                continue;
            }

            if at + 1 >= doc_length {
                if self.input_finished && ScriptState::Unescaped != state {
                    self.record_error(ParseErrorKind::EofInText, at.min(doc_length - 1));
                }
                return RegionScan::Incomplete;
            }

            /*
             * Everything of interest past here starts with "<".
             * Check this character and advance position regardless.
             */
            at += 1;
            if self.html_bytes[at - 1] != b'<' {
                continue;
            }

            /*
             * Unlike with "-->", the "<!--" only transitions
             * into the escaped mode if not already there.
             *
             * Inside the escaped modes it will be ignored; and
             * should never break out of the double-escaped
             * mode and back into the escaped mode.
             */
            if at + 2 < doc_length
                && self.html_bytes[at] == b'!'
                && self.html_bytes[at + 1] == b'-'
                && self.html_bytes[at + 2] == b'-'
            {
                at += 3;
                if state == ScriptState::Unescaped {
                    state = ScriptState::Escaped;
                }
                continue;
            }

            let is_closing = if self.html_bytes[at] == b'/' {
                let closer_potentially_starts_at = at - 1;
                at += 1;
                Some(closer_potentially_starts_at)
            } else {
                None
            };

            /*
             * At this point the only remaining state-changes occur with the
             * <script> and </script> tags; unless one of these appears next,
             * proceed scanning to the next potential token in the text.
             */
            if !(at + 6 < doc_length
                && self.html_bytes[at..at + 6].eq_ignore_ascii_case(b"script"))
            {
                at += 1;
                continue;
            }

            /*
             * Ensure that the script tag terminates to avoid matching on
             * substrings of a non-match. For example, the sequence
             * "<script123" should not end a script region even though
             * "<script" is found within the text.
             */
            at += 6;
            if !matches!(
                self.html_bytes[at],
                b' ' | b'\t' | b'\r' | b'\n' | 0x0c | b'/' | b'>'
            ) {
                at += 1;
                continue;
            }

            if state == ScriptState::Escaped && is_closing.is_none() {
                state = ScriptState::DoubleEscaped;
                continue;
            }

            if state == ScriptState::DoubleEscaped && is_closing.is_some() {
                state = ScriptState::Escaped;
                continue;
            }

            if let Some(closer_starts_at) = is_closing {
                if closer_starts_at == region_starts_at {
                    return RegionScan::Empty;
                }

                self.parser_state = ParserState::TextNode;
                self.token_starts_at = Some(region_starts_at);
                self.token_length = Some(closer_starts_at - region_starts_at);
                self.text_starts_at = Some(region_starts_at);
                self.text_length = Some(closer_starts_at - region_starts_at);
                self.bytes_already_parsed = closer_starts_at;
                self.classify_matched_text();
                return RegionScan::Text;
            }

            at += 1;
        }

        RegionScan::Incomplete
    }

    /// Records the syntax errors which can be detected from the text
    /// span alone: NULL bytes and ambiguous ampersands.
    fn classify_matched_text(&mut self) {
        let (at, length) = match (self.text_starts_at, self.text_length) {
            (Some(at), Some(length)) => (at, length),
            _ => return,
        };
        let text = &self.html_bytes[at..at + length];

        if let Some(null_at) = memchr::memchr(b'\0', text) {
            self.errors
                .push((ParseErrorKind::NullCharacterInText, at + null_at));
        }

        if self.text_is_raw {
            return;
        }

        /*
         * > If the characters consumed were not a match for a named
         * > character reference, and the last character is a semicolon,
         * > this is an unknown-named-character-reference... otherwise
         * > an ambiguous-ampersand.
         */
        let mut search_from = 0;
        while let Some(amp_at) = memchr::memchr(b'&', &text[search_from..]) {
            let amp_at = search_from + amp_at;
            let name_length = strspn!(text, b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9', amp_at + 1);
            if name_length > 0
                && amp_at + 1 + name_length < text.len()
                && b';' == text[amp_at + 1 + name_length]
                && decode_html_ref(&HtmlContext::BodyText, text, amp_at).is_none()
            {
                self.errors
                    .push((ParseErrorKind::AmbiguousAmpersand, at + amp_at));
            }
            search_from = amp_at + 1;
        }
    }

    fn check_duplicate_attributes(&mut self, token_starts_at: usize) {
        let mut seen: FxHashSet<Vec<u8>> = FxHashSet::default();
        let mut reported = false;
        for token in &self.attributes {
            let name = substr(&self.html_bytes, token.start, token.name_length)
                .to_ascii_lowercase();
            if !seen.insert(name) && !reported {
                self.errors
                    .push((ParseErrorKind::DuplicateAttribute, token_starts_at));
                reported = true;
            }
        }
    }

    fn record_error(&mut self, kind: ParseErrorKind, at: usize) {
        self.errors.push((kind, at));
    }

    pub fn take_errors(&mut self) -> Vec<(ParseErrorKind, usize)> {
        std::mem::take(&mut self.errors)
    }

    pub fn record_tree_error(&mut self, kind: ParseErrorKind) {
        let at = self.token_starts_at.unwrap_or(self.bytes_already_parsed);
        self.errors.push((kind, at));
    }

    /// Byte offset where the current token begins.
    pub fn token_starts_at(&self) -> usize {
        self.token_starts_at.unwrap_or(self.bytes_already_parsed)
    }

    pub fn input(&self) -> &[u8] {
        &self.html_bytes
    }

    /// Releases the accumulated input once parsing is over, so that
    /// diagnostics can be mapped back to line and column numbers
    /// without copying the document a second time.
    pub fn into_input(self) -> Vec<u8> {
        self.html_bytes
    }

    pub fn set_content_model(&mut self, model: ContentModel, closer: Option<TagName>) {
        self.content_model = model;
        self.region_closer = closer;
    }

    pub fn set_parsing_namespace(&mut self, namespace: Namespace) {
        self.parsing_namespace = namespace;
    }

    pub fn token_type(&self) -> Option<TokenType> {
        match self.parser_state {
            ParserState::MatchedTag => Some(TokenType::Tag),
            ParserState::Doctype => Some(TokenType::Doctype),
            ParserState::TextNode => Some(TokenType::Text),
            ParserState::CDATANode => Some(TokenType::CdataSection),
            ParserState::Comment => Some(TokenType::Comment),
            ParserState::PresumptuousTag => Some(TokenType::PresumptuousTag),

            ParserState::Ready | ParserState::Complete | ParserState::IncompleteInput => None,
        }
    }

    pub fn get_tag(&self) -> Option<TagName> {
        if let (Some(at), Some(length)) = (self.tag_name_starts_at, self.tag_name_length) {
            Some(TagName::from_bytes(substr(&self.html_bytes, at, length)))
        } else {
            None
        }
    }

    /// Indicates if the current tag token is a tag closer.
    pub fn is_tag_closer(&self) -> bool {
        self.parser_state == ParserState::MatchedTag && self.is_closing_tag.unwrap_or(false)
    }

    /// Indicates if the currently matched tag contains the self-closing flag.
    ///
    /// No HTML elements ought to have the self-closing flag and for those, the
    /// self-closing flag will be ignored. For void elements this is benign
    /// because they "self close" automatically. For foreign elements the
    /// self-closing flag determines if they self-close or not.
    pub fn has_self_closing_flag(&self) -> bool {
        if self.parser_state != ParserState::MatchedTag {
            return false;
        }

        match (self.token_starts_at, self.token_length) {
            /*
             * The self-closing flag is the solidus at the _end_ of the tag, not the beginning.
             *
             * Example:
             *
             *     <figure />
             *             ^ this appears one character before the end of the closing ">".
             */
            (Some(at), Some(length)) if length >= 3 => {
                b'/' == self.html_bytes[at + length - 2]
            }
            _ => false,
        }
    }

    /// Returns the attributes of the currently matched start tag with
    /// names lowercased and values decoded.
    ///
    /// When the same attribute name appears more than once on a tag,
    /// the value seen last wins; the attribute keeps the position of
    /// its first appearance.
    pub fn get_attributes(&self) -> Vec<Attribute> {
        let mut out: Vec<Attribute> = Vec::with_capacity(self.attributes.len());
        let mut by_name: rustc_hash::FxHashMap<Box<[u8]>, usize> =
            rustc_hash::FxHashMap::default();

        for token in &self.attributes {
            let name = substr(&self.html_bytes, token.start, token.name_length)
                .to_ascii_lowercase()
                .into_boxed_slice();

            let value = if token.is_true {
                None
            } else {
                let raw = substr(&self.html_bytes, token.value_starts_at, token.value_length);
                Some(decode(&HtmlContext::Attribute, raw))
            };

            match by_name.get(&name) {
                Some(&index) => out[index].value = value,
                None => {
                    by_name.insert(name.clone(), out.len());
                    out.push(Attribute { name, value });
                }
            }
        }

        out
    }

    /// Returns the text for the current text, comment, or CDATA token.
    ///
    /// Newlines are normalized and character references are decoded in
    /// contexts where decoding applies. A newline immediately following
    /// a PRE, LISTING, or TEXTAREA opener is removed.
    pub fn get_text(&self) -> String {
        let (at, length) = match (self.text_starts_at, self.text_length) {
            (Some(at), Some(length)) => (at, length),
            _ => return String::new(),
        };

        let mut raw = &self.html_bytes[at..at + length];

        if Some(at) == self.skip_newline_at {
            if raw.starts_with(b"\r\n") {
                raw = &raw[2..];
            } else if raw.starts_with(b"\n") || raw.starts_with(b"\r") {
                raw = &raw[1..];
            }
        }

        let decoded: std::borrow::Cow<[u8]> = if self.text_is_raw
            || ParserState::Comment == self.parser_state
            || ParserState::CDATANode == self.parser_state
        {
            std::borrow::Cow::Borrowed(raw)
        } else {
            std::borrow::Cow::Owned(decode(&HtmlContext::BodyText, raw).into_vec())
        };

        normalize_newlines(&decoded)
    }

    pub fn text_node_classification(&self) -> TextNodeClassification {
        self.text_node_classification
    }

    /// Splits the matched text node so that NULL byte sequences and
    /// leading whitespace become distinct nodes.
    ///
    /// Once anything that's neither a NULL byte nor whitespace is
    /// encountered, the remainder of the text node is left intact as
    /// generic text. The tree constructor uses this to apply distinct
    /// rules for different kinds of text, such as detecting and
    /// skipping inter-element whitespace.
    ///
    /// @return bool Whether the text node was subdivided.
    pub fn subdivide_text_appropriately(&mut self) -> bool {
        if self.parser_state != ParserState::TextNode {
            return false;
        }

        let (text_starts_at, text_length) = match (self.text_starts_at, self.text_length) {
            (Some(at), Some(length)) => (at, length),
            _ => return false,
        };

        self.text_node_classification = TextNodeClassification::Generic;

        /*
         * NULL bytes are treated categorically different than numeric character
         * references whose number is zero. `&#x00;` is not the same as `"\x00"`.
         */
        let leading_nulls =
            strspn!(&self.html_bytes, b'\x00', text_starts_at, text_length);
        if leading_nulls > 0 {
            self.token_length = Some(leading_nulls);
            self.text_length = Some(leading_nulls);
            self.bytes_already_parsed = text_starts_at + leading_nulls;
            self.text_node_classification = TextNodeClassification::NullSequence;
            return true;
        }

        let leading_ws = strspn!(
            &self.html_bytes,
            b' ' | b'\t' | 0x0c | b'\r' | b'\n',
            text_starts_at,
            text_length
        );
        if leading_ws > 0 {
            self.token_length = Some(leading_ws);
            self.text_length = Some(leading_ws);
            self.bytes_already_parsed = text_starts_at + leading_ws;
            self.text_node_classification = TextNodeClassification::Whitespace;
            return true;
        }

        false
    }

    pub fn comment_type(&self) -> Option<CommentType> {
        self.comment_type
    }

    /// Parses the current DOCTYPE token and computes the compatibility
    /// mode the document should use.
    pub fn get_doctype_info(&self) -> Option<DoctypeInfo> {
        if ParserState::Doctype != self.parser_state {
            return None;
        }

        let (at, length) = match (self.token_starts_at, self.token_length) {
            (Some(at), Some(length)) => (at, length),
            _ => return None,
        };
        let token = &self.html_bytes[at..at + length];

        if token.ends_with(b">") {
            DoctypeInfo::from_doctype_token(token)
        } else {
            // A DOCTYPE truncated at end of file still determines a mode.
            let mut terminated = Vec::with_capacity(token.len() + 1);
            terminated.extend_from_slice(token);
            terminated.push(b'>');
            DoctypeInfo::from_doctype_token(&terminated)
        }
    }
}

/// Replaces \r\n pairs and lone \r with \n, converting to a string.
/// Invalid UTF-8 sequences become U+FFFD.
fn normalize_newlines(bytes: &[u8]) -> String {
    if memchr::memchr(b'\r', bytes).is_none() {
        return String::from_utf8_lossy(bytes).into_owned();
    }

    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if b'\r' == bytes[i] {
            out.push(b'\n');
            if i + 1 < bytes.len() && b'\n' == bytes[i + 1] {
                i += 1;
            }
        } else {
            out.push(bytes[i]);
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod test {
    use super::*;

    fn loaded(html: &[u8]) -> Tokenizer {
        let mut tokenizer = Tokenizer::new();
        tokenizer.extend(html);
        tokenizer.finish_input();
        tokenizer
    }

    #[test]
    fn test_basic_token_sequence() {
        let mut t = loaded(b"<p>Hello world!</p>");
        assert!(t.next_token());
        assert_eq!(t.token_type(), Some(TokenType::Tag));
        assert_eq!(t.get_tag(), Some(TagName::P));
        assert!(!t.is_tag_closer());
        assert!(t.next_token());
        assert_eq!(t.token_type(), Some(TokenType::Text));
        assert_eq!(t.get_text(), "Hello world!");
        assert!(t.next_token());
        assert_eq!(t.get_tag(), Some(TagName::P));
        assert!(t.is_tag_closer());
        assert!(!t.next_token());
    }

    #[test]
    fn test_pauses_at_end_of_chunk_and_resumes() {
        let mut t = Tokenizer::new();
        t.extend(b"<div cla");
        assert!(!t.next_token());
        assert!(t.is_paused());

        t.extend(b"ss=\"post\">done");
        assert!(t.next_token());
        assert_eq!(t.get_tag(), Some(TagName::DIV));
        let attributes = t.get_attributes();
        assert_eq!(attributes.len(), 1);
        assert_eq!(&*attributes[0].name, b"class");
        assert_eq!(attributes[0].value.as_deref(), Some(b"post".as_slice()));

        // Trailing text is held until the input is complete.
        assert!(!t.next_token());
        t.finish_input();
        assert!(t.next_token());
        assert_eq!(t.get_text(), "done");
    }

    #[test]
    fn test_heart_is_not_a_tag() {
        let mut t = loaded(b"I <3 HTML");
        assert!(t.next_token());
        assert_eq!(t.token_type(), Some(TokenType::Text));
        assert_eq!(t.get_text(), "I <3 HTML");
    }

    #[test]
    fn test_comment_closers() {
        let mut t = loaded(b"<!-- a --><!-- b --!><!--->");
        assert!(t.next_token());
        assert_eq!(t.comment_type(), Some(CommentType::HtmlComment));
        assert_eq!(t.get_text(), " a ");
        assert!(t.next_token());
        assert_eq!(t.get_text(), " b ");
        assert!(t.next_token());
        assert_eq!(t.comment_type(), Some(CommentType::AbruptlyClosedComment));
        assert_eq!(t.get_text(), "");
    }

    #[test]
    fn test_bogus_comment_from_question_mark() {
        let mut t = loaded(b"<?xml version=\"1.0\"?>");
        assert!(t.next_token());
        assert_eq!(t.token_type(), Some(TokenType::Comment));
        assert_eq!(t.comment_type(), Some(CommentType::InvalidHtml));
        assert!(t
            .take_errors()
            .iter()
            .any(|(kind, _)| *kind == ParseErrorKind::UnexpectedQuestionMarkInsteadOfTagName));
    }

    #[test]
    fn test_duplicate_attributes_last_value_wins() {
        let mut t = loaded(b"<img src=a.png src=b.png>");
        assert!(t.next_token());
        let attributes = t.get_attributes();
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes[0].value.as_deref(), Some(b"b.png".as_slice()));
        assert!(t
            .take_errors()
            .iter()
            .any(|(kind, _)| *kind == ParseErrorKind::DuplicateAttribute));
    }

    #[test]
    fn test_script_data_escaping() {
        let html = b"<script>if (a<!--<script>-->b) {}</script>";
        let mut t = loaded(html);
        assert!(t.next_token());
        assert_eq!(t.get_tag(), Some(TagName::SCRIPT));
        t.set_content_model(ContentModel::ScriptData, Some(TagName::SCRIPT));
        assert!(t.next_token());
        assert_eq!(t.token_type(), Some(TokenType::Text));
        assert_eq!(t.get_text(), "if (a<!--<script>-->b) {}");
        assert!(t.next_token());
        assert_eq!(t.get_tag(), Some(TagName::SCRIPT));
        assert!(t.is_tag_closer());
    }

    #[test]
    fn test_rcdata_region_decodes_and_ignores_lookalike_tags() {
        let mut t = loaded(b"<title>an &amp; a <b>bold</b> plan</title>");
        assert!(t.next_token());
        t.set_content_model(ContentModel::Rcdata, Some(TagName::TITLE));
        assert!(t.next_token());
        assert_eq!(t.get_text(), "an & a <b>bold</b> plan");
        assert!(t.next_token());
        assert_eq!(t.get_tag(), Some(TagName::TITLE));
        assert!(t.is_tag_closer());
    }

    #[test]
    fn test_rawtext_region_does_not_decode() {
        let mut t = loaded(b"<style>a &gt; b</style>");
        assert!(t.next_token());
        t.set_content_model(ContentModel::Rawtext, Some(TagName::STYLE));
        assert!(t.next_token());
        assert_eq!(t.get_text(), "a &gt; b");
    }

    #[test]
    fn test_textarea_skips_leading_newline() {
        let mut t = loaded(b"<textarea>\nfirst line</textarea>");
        assert!(t.next_token());
        t.set_content_model(ContentModel::Rcdata, Some(TagName::TEXTAREA));
        assert!(t.next_token());
        assert_eq!(t.get_text(), "first line");
    }

    #[test]
    fn test_unclosed_tag_at_eof_is_dropped() {
        let mut t = loaded(b"before<div class=\"uncl");
        assert!(t.next_token());
        assert_eq!(t.get_text(), "before");
        assert!(!t.next_token());
        assert!(t
            .take_errors()
            .iter()
            .any(|(kind, _)| *kind == ParseErrorKind::EofInTag));
    }

    #[test]
    fn test_unclosed_comment_at_eof_keeps_text() {
        let mut t = loaded(b"<!-- never closed");
        assert!(t.next_token());
        assert_eq!(t.token_type(), Some(TokenType::Comment));
        assert_eq!(t.get_text(), " never closed");
    }

    #[test]
    fn test_presumptuous_tag() {
        let mut t = loaded(b"</><p>");
        assert!(t.next_token());
        assert_eq!(t.token_type(), Some(TokenType::PresumptuousTag));
        assert!(t.next_token());
        assert_eq!(t.get_tag(), Some(TagName::P));
    }

    #[test]
    fn test_subdivides_whitespace_prefix() {
        let mut t = loaded(b"  \t\n<p>");
        assert!(t.next_token());
        assert!(t.subdivide_text_appropriately());
        assert!(matches!(
            t.text_node_classification(),
            TextNodeClassification::Whitespace
        ));
        assert_eq!(t.get_text(), "  \t\n");
        assert!(t.next_token());
        assert_eq!(t.get_tag(), Some(TagName::P));
    }

    #[test]
    fn test_crlf_normalized_within_and_across_chunks() {
        let mut t = Tokenizer::new();
        t.extend(b"a\r");
        assert!(!t.next_token());
        t.extend(b"\nb");
        t.finish_input();
        assert!(t.next_token());
        assert_eq!(t.get_text(), "a\nb");
    }

    #[test]
    fn test_self_closing_flag() {
        let mut t = loaded(b"<svg viewBox=\"0 0 5 5\" /><p/>");
        assert!(t.next_token());
        assert_eq!(t.get_tag(), Some(TagName::SVG));
        assert!(t.has_self_closing_flag());
        assert!(t.next_token());
        assert_eq!(t.get_tag(), Some(TagName::P));
        assert!(t.has_self_closing_flag());
    }
}
