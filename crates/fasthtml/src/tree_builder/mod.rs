//! HTML tree construction.
//!
//! Consumes the token stream produced by the [`Tokenizer`] and builds a
//! [`Document`] from it, following the rules in the HTML parsing
//! specification: insertion modes, the stack of open elements, the list
//! of active formatting elements, foster parenting, and the adoption
//! agency algorithm. Malformed markup never aborts the parse; it is
//! repaired the way a browser would repair it and reported through the
//! diagnostics channel.
//!
//! @see https://html.spec.whatwg.org/#tree-construction

pub(crate) mod active_formatting;
pub(crate) mod insertion_mode;
pub(crate) mod open_elements;

use crate::dom::{Attribute, DoctypeData, Document, Namespace, NodeId};
use crate::errors::{ParseErrorKind, ParserError};
use crate::quirks_mode::QuirksMode;
use crate::tag_name::TagName;
use crate::tokenizer::{ContentModel, TextNodeClassification, TokenType, Tokenizer};

use active_formatting::{ActiveFormattingElements, FormattingEntry};
use insertion_mode::InsertionMode;
use open_elements::{IntegrationPoint, OpenElement, StackOfOpenElements};

/// Ceiling on the total number of node clones the misnesting-repair
/// algorithms may create over the life of one parse. Documents written
/// to explode the active formatting list can otherwise force quadratic
/// work; exhausting the budget aborts with a fatal error rather than
/// stalling the caller.
const WORK_BUDGET: usize = 1 << 20;

/// Whether the tree builder should consume another token from the
/// tokenizer or re-dispatch the one it is already holding. Several
/// insertion modes change state and then reprocess the current token
/// under the new rules.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum NodeToProcess {
    ProcessNextNode,
    ReprocessCurrentNode,
}

/// The dispatch shape of the current token: a start tag, an end tag,
/// or one of the non-tag token types.
#[derive(Debug, PartialEq, Eq)]
enum Op {
    TagPush(TagName),
    TagPop(TagName),
    Token(TokenType),
}

/// How a run of the adoption agency algorithm ended.
enum AdoptionResult {
    Handled,
    /// > If there is no such element, then return and instead act as
    /// > described in the "any other end tag" entry above.
    AnyOtherEndTag,
}

/// Everything a finished parse hands back: the tree, the diagnostics
/// (as raw byte offsets), and the accumulated input bytes for mapping
/// those offsets to line and column numbers.
pub(crate) struct FinishedParse {
    pub document: Document,
    pub errors: Vec<(ParseErrorKind, usize)>,
    pub input: Vec<u8>,
}

/// Builds a [`Document`] from a stream of HTML bytes.
///
/// The builder owns its tokenizer. Feeding bytes with [`Self::extend`]
/// drives tree construction as far as the input allows; the tokenizer
/// pauses at a chunk boundary that splits a token and resumes when more
/// bytes arrive. [`Self::finish`] declares the input complete, runs the
/// end-of-file rules, and hands the tree back.
pub(crate) struct TreeBuilder {
    tokenizer: Tokenizer,
    document: Document,

    insertion_mode: InsertionMode,
    original_insertion_mode: InsertionMode,
    /// > the stack of template insertion modes
    template_insertion_modes: Vec<InsertionMode>,

    open_elements: StackOfOpenElements,
    active_formatting_elements: ActiveFormattingElements,

    /// > Initially, the head element pointer and the form element
    /// > pointer are both null.
    head_element: Option<NodeId>,
    form_element: Option<NodeId>,

    frameset_ok: bool,
    foster_parenting: bool,

    /// The context element of a fragment parse, if this is one. It is
    /// not in the tree; it stands in for the missing ancestors when
    /// dispatching and when resetting the insertion mode.
    context: Option<OpenElement>,

    scripting_enabled: bool,
    quirks_mode_override: Option<QuirksMode>,

    work_budget: usize,
    /// Non-zero while a token is being handled; nested requests for the
    /// next token then unwind to `pump()` rather than recurse.
    dispatch_depth: usize,
    last_error: Option<ParserError>,
}

impl TreeBuilder {
    pub fn new(scripting_enabled: bool, quirks_mode_override: Option<QuirksMode>) -> Self {
        let mut document = Document::new();
        if let Some(mode) = quirks_mode_override {
            document.set_quirks_mode(mode);
        }

        Self {
            tokenizer: Tokenizer::new(),
            document,
            insertion_mode: InsertionMode::INITIAL,
            original_insertion_mode: InsertionMode::IN_BODY,
            template_insertion_modes: Vec::new(),
            open_elements: StackOfOpenElements::new(),
            active_formatting_elements: ActiveFormattingElements::new(),
            head_element: None,
            form_element: None,
            frameset_ok: true,
            foster_parenting: false,
            context: None,
            scripting_enabled,
            quirks_mode_override,
            work_budget: WORK_BUDGET,
            dispatch_depth: 0,
            last_error: None,
        }
    }

    /// Sets up a fragment parse with the given context element, as if
    /// the input were the contents of that element.
    ///
    /// > Create a new HTML parser, and associate it with the just
    /// > created Document node. ... Create a root html element node.
    ///
    /// @see https://html.spec.whatwg.org/#html-fragment-parsing-algorithm
    pub fn new_fragment(
        scripting_enabled: bool,
        quirks_mode_override: Option<QuirksMode>,
        context: TagName,
    ) -> Result<Self, ParserError> {
        if context.is_void() {
            return Err(ParserError::InvalidFragmentContext);
        }

        let mut builder = Self::new(scripting_enabled, quirks_mode_override);

        let root = builder.document.root();
        let html = builder
            .document
            .create_element(TagName::HTML, Namespace::Html, Vec::new());
        builder.document.append_child(root, html);
        builder.open_elements.push(OpenElement {
            node: html,
            tag: TagName::HTML,
            namespace: Namespace::Html,
            integration_point: None,
        });

        /* > If the node is a template element, push "in template" onto
         * > the stack of template insertion modes so that it is the new
         * > current template insertion mode.
         */
        if TagName::TEMPLATE == context {
            builder.template_insertion_modes.push(InsertionMode::IN_TEMPLATE);
        }

        /* > Set the state of the HTML parser's tokenization stage as
         * > follows, switching on the context element.
         */
        match &context {
            TagName::TITLE | TagName::TEXTAREA => {
                builder
                    .tokenizer
                    .set_content_model(ContentModel::Rcdata, Some(context.clone()));
            }
            TagName::STYLE
            | TagName::XMP
            | TagName::IFRAME
            | TagName::NOEMBED
            | TagName::NOFRAMES => {
                builder
                    .tokenizer
                    .set_content_model(ContentModel::Rawtext, Some(context.clone()));
            }
            TagName::NOSCRIPT if scripting_enabled => {
                builder
                    .tokenizer
                    .set_content_model(ContentModel::Rawtext, Some(context.clone()));
            }
            TagName::SCRIPT => {
                builder
                    .tokenizer
                    .set_content_model(ContentModel::ScriptData, Some(context.clone()));
            }
            TagName::PLAINTEXT => {
                builder.tokenizer.set_content_model(ContentModel::Plaintext, None);
            }
            _ => {}
        }

        builder.context = Some(OpenElement {
            node: html,
            tag: context,
            namespace: Namespace::Html,
            integration_point: None,
        });
        builder.reset_insertion_mode_appropriately();

        Ok(builder)
    }

    /// Appends a chunk of input and builds as much of the tree as the
    /// bytes allow.
    pub fn extend(&mut self, chunk: &[u8]) -> Result<(), ParserError> {
        self.tokenizer.extend(chunk);
        self.pump()
    }

    /// Declares the input complete, drains the remaining tokens, runs
    /// the end-of-file rules, and returns the finished tree.
    pub fn finish(mut self) -> Result<FinishedParse, ParserError> {
        self.tokenizer.finish_input();
        self.pump()?;
        self.finish_eof();

        let errors = self.tokenizer.take_errors();
        Ok(FinishedParse {
            document: self.document,
            errors,
            input: self.tokenizer.into_input(),
        })
    }

    fn pump(&mut self) -> Result<(), ParserError> {
        while self.step(NodeToProcess::ProcessNextNode) {}
        match self.last_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Processes one token: pulls it from the tokenizer (or keeps the
    /// current one for reprocessing) and dispatches it to the rules for
    /// the current insertion mode, or to the foreign content rules.
    ///
    /// @see https://html.spec.whatwg.org/#tree-construction-dispatcher
    fn step(&mut self, node_to_process: NodeToProcess) -> bool {
        if self.last_error.is_some() {
            return false;
        }

        if NodeToProcess::ProcessNextNode == node_to_process {
            /*
             * A handler that ignores its token asks for the next one by
             * calling back into step(). Unwinding to pump() instead of
             * recursing keeps the call stack flat across arbitrarily
             * long runs of ignored markup.
             */
            if self.dispatch_depth > 0 {
                return true;
            }

            loop {
                if !self.tokenizer.next_token() {
                    return false;
                }
                // An empty `</>` end tag produces no node and changes no state.
                if Some(TokenType::PresumptuousTag) == self.tokenizer.token_type() {
                    continue;
                }
                break;
            }

            /*
             * Maximal text tokens span whole character runs. Most modes
             * want a leading null or whitespace sequence peeled off into
             * its own token; the "in table" family instead operates on
             * the whole run, mirroring the pending table character
             * tokens list.
             */
            if Some(TokenType::Text) == self.tokenizer.token_type() && !self.defers_to_table_text()
            {
                self.tokenizer.subdivide_text_appropriately();
            }
        }

        self.dispatch_depth += 1;
        let handled = if self.parse_in_current_insertion_mode() {
            self.step_in_current_insertion_mode()
        } else {
            self.step_in_foreign_content()
        };
        self.dispatch_depth -= 1;
        handled
    }

    fn step_in_current_insertion_mode(&mut self) -> bool {
        match self.insertion_mode {
            InsertionMode::INITIAL => self.step_initial(),
            InsertionMode::BEFORE_HTML => self.step_before_html(),
            InsertionMode::BEFORE_HEAD => self.step_before_head(),
            InsertionMode::IN_HEAD => self.step_in_head(),
            InsertionMode::IN_HEAD_NOSCRIPT => self.step_in_head_noscript(),
            InsertionMode::AFTER_HEAD => self.step_after_head(),
            InsertionMode::IN_BODY => self.step_in_body(),
            InsertionMode::TEXT => self.step_text(),
            InsertionMode::IN_TABLE => self.step_in_table(),
            InsertionMode::IN_TABLE_TEXT => self.step_in_table_text(),
            InsertionMode::IN_CAPTION => self.step_in_caption(),
            InsertionMode::IN_COLUMN_GROUP => self.step_in_column_group(),
            InsertionMode::IN_TABLE_BODY => self.step_in_table_body(),
            InsertionMode::IN_ROW => self.step_in_row(),
            InsertionMode::IN_CELL => self.step_in_cell(),
            InsertionMode::IN_SELECT => self.step_in_select(),
            InsertionMode::IN_SELECT_IN_TABLE => self.step_in_select_in_table(),
            InsertionMode::IN_TEMPLATE => self.step_in_template(),
            InsertionMode::AFTER_BODY => self.step_after_body(),
            InsertionMode::IN_FRAMESET => self.step_in_frameset(),
            InsertionMode::AFTER_FRAMESET => self.step_after_frameset(),
            InsertionMode::AFTER_AFTER_BODY => self.step_after_after_body(),
            InsertionMode::AFTER_AFTER_FRAMESET => self.step_after_after_frameset(),
        }
    }

    fn make_op(&self) -> Option<Op> {
        match self.tokenizer.token_type() {
            Some(TokenType::Tag) => {
                let tag = self.tokenizer.get_tag()?;
                if self.tokenizer.is_tag_closer() {
                    Some(Op::TagPop(tag))
                } else {
                    Some(Op::TagPush(tag))
                }
            }
            Some(token_type) => Some(Op::Token(token_type)),
            None => None,
        }
    }

    /// > If the stack of open elements is empty ... process the token
    /// > according to the rules given in the section corresponding to
    /// > the current insertion mode in HTML content.
    fn parse_in_current_insertion_mode(&self) -> bool {
        let Some(adjusted) = self.adjusted_current_node() else {
            return true;
        };
        if Namespace::Html == adjusted.namespace {
            return true;
        }

        let token_type = self.tokenizer.token_type();
        let is_text = Some(TokenType::Text) == token_type;
        let is_start_tag =
            Some(TokenType::Tag) == token_type && !self.tokenizer.is_tag_closer();
        let tag = self.tokenizer.get_tag();

        /* > If the adjusted current node is a MathML text integration
         * > point and the token is a start tag whose tag name is
         * > neither "mglyph" nor "malignmark"; ... or a character token
         */
        if Some(IntegrationPoint::MathMl) == adjusted.integration_point
            && ((is_start_tag && !matches!(tag, Some(TagName::MGLYPH | TagName::MALIGNMARK)))
                || is_text)
        {
            return true;
        }

        /* > If the adjusted current node is an annotation-xml element
         * > in the MathML namespace and the token is a start tag whose
         * > tag name is "svg"
         */
        if Namespace::MathMl == adjusted.namespace
            && TagName::ANNOTATION_XML == adjusted.tag
            && is_start_tag
            && Some(TagName::SVG) == tag
        {
            return true;
        }

        /* > If the adjusted current node is an HTML integration point
         * > and the token is a start tag ... or a character token
         */
        Some(IntegrationPoint::Html) == adjusted.integration_point && (is_start_tag || is_text)
    }

    /// > The adjusted current node is the context element if the parser
    /// > was created as part of the HTML fragment parsing algorithm and
    /// > the stack of open elements has only one element in it;
    /// > otherwise, the adjusted current node is the current node.
    fn adjusted_current_node(&self) -> Option<&OpenElement> {
        if self.open_elements.count() == 1 {
            if let Some(context) = &self.context {
                return Some(context);
            }
        }
        self.open_elements.current_node()
    }

    /// Whether the current text token belongs to the pending table
    /// character handling and must not be subdivided.
    fn defers_to_table_text(&self) -> bool {
        matches!(
            self.insertion_mode,
            InsertionMode::IN_TABLE | InsertionMode::IN_TABLE_BODY | InsertionMode::IN_ROW
        ) && self
            .open_elements
            .current_node()
            .map(|entry| {
                Namespace::Html == entry.namespace
                    && matches!(
                        entry.tag,
                        TagName::TABLE
                            | TagName::TBODY
                            | TagName::TFOOT
                            | TagName::THEAD
                            | TagName::TR
                    )
            })
            .unwrap_or(false)
    }

    /*
     * Insertion modes.
     */

    /// @see https://html.spec.whatwg.org/#the-initial-insertion-mode
    fn step_initial(&mut self) -> bool {
        match self.make_op() {
            Some(Op::Token(TokenType::Text))
                if TextNodeClassification::Whitespace == self.tokenizer.text_node_classification() =>
            {
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::Token(TokenType::Comment)) => {
                self.append_comment_to_document();
                true
            }

            Some(Op::Token(TokenType::Doctype)) => {
                if let Some(info) = self.tokenizer.get_doctype_info() {
                    let data = DoctypeData {
                        name: info
                            .name
                            .as_deref()
                            .map(|name| String::from_utf8_lossy(name).into_owned()),
                        public_id: info
                            .public_identifier
                            .as_deref()
                            .map(|id| String::from_utf8_lossy(id).into_owned()),
                        system_id: info
                            .system_identifier
                            .as_deref()
                            .map(|id| String::from_utf8_lossy(id).into_owned()),
                    };
                    let doctype = self.document.create_doctype(data);
                    let root = self.document.root();
                    self.document.append_child(root, doctype);
                    self.set_compatibility_mode(info.indicated_compatibility_mode);
                }
                self.insertion_mode = InsertionMode::BEFORE_HTML;
                true
            }

            Some(Op::TagPush(_)) | Some(Op::TagPop(_)) => {
                self.record_error(ParseErrorKind::ExpectedDoctypeButGotTag);
                self.set_compatibility_mode(QuirksMode::Quirks);
                self.insertion_mode = InsertionMode::BEFORE_HTML;
                self.step(NodeToProcess::ReprocessCurrentNode)
            }

            _ => {
                self.record_error(ParseErrorKind::MissingDoctype);
                self.set_compatibility_mode(QuirksMode::Quirks);
                self.insertion_mode = InsertionMode::BEFORE_HTML;
                self.step(NodeToProcess::ReprocessCurrentNode)
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#the-before-html-insertion-mode
    fn step_before_html(&mut self) -> bool {
        match self.make_op() {
            Some(Op::Token(TokenType::Doctype)) => {
                self.record_error(ParseErrorKind::MisplacedDoctype);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::Token(TokenType::Comment)) => {
                self.append_comment_to_document();
                true
            }

            Some(Op::Token(TokenType::Text))
                if TextNodeClassification::Whitespace == self.tokenizer.text_node_classification() =>
            {
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPush(TagName::HTML)) => {
                let attributes = self.tokenizer.get_attributes();
                let root = self.document.root();
                let node = self
                    .document
                    .create_element(TagName::HTML, Namespace::Html, attributes);
                self.document.append_child(root, node);
                self.push_open(OpenElement {
                    node,
                    tag: TagName::HTML,
                    namespace: Namespace::Html,
                    integration_point: None,
                });
                self.insertion_mode = InsertionMode::BEFORE_HEAD;
                true
            }

            /* > Any other end tag: parse error. Ignore the token. */
            Some(Op::TagPop(tag))
                if !matches!(
                    tag,
                    TagName::HEAD | TagName::BODY | TagName::HTML | TagName::BR
                ) =>
            {
                self.record_error(ParseErrorKind::StrayEndTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            _ => {
                self.synthesize_html_element();
                self.insertion_mode = InsertionMode::BEFORE_HEAD;
                self.step(NodeToProcess::ReprocessCurrentNode)
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#the-before-head-insertion-mode
    fn step_before_head(&mut self) -> bool {
        match self.make_op() {
            Some(Op::Token(TokenType::Text))
                if TextNodeClassification::Whitespace == self.tokenizer.text_node_classification() =>
            {
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::Token(TokenType::Comment)) => {
                self.insert_comment_at_appropriate_place();
                true
            }

            Some(Op::Token(TokenType::Doctype)) => {
                self.record_error(ParseErrorKind::MisplacedDoctype);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPush(TagName::HTML)) => self.step_in_body(),

            Some(Op::TagPush(TagName::HEAD)) => {
                let node = self.insert_html_element(TagName::HEAD, self.tokenizer.get_attributes());
                self.head_element = Some(node);
                self.insertion_mode = InsertionMode::IN_HEAD;
                true
            }

            Some(Op::TagPop(tag))
                if !matches!(
                    tag,
                    TagName::HEAD | TagName::BODY | TagName::HTML | TagName::BR
                ) =>
            {
                self.record_error(ParseErrorKind::StrayEndTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            _ => {
                let node = self.insert_html_element(TagName::HEAD, Vec::new());
                self.head_element = Some(node);
                self.insertion_mode = InsertionMode::IN_HEAD;
                self.step(NodeToProcess::ReprocessCurrentNode)
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-inhead
    fn step_in_head(&mut self) -> bool {
        match self.make_op() {
            Some(Op::Token(TokenType::Text))
                if TextNodeClassification::Whitespace == self.tokenizer.text_node_classification() =>
            {
                /* > Insert the character. */
                let text = self.tokenizer.get_text();
                self.insert_text_run(&text);
                true
            }

            Some(Op::Token(TokenType::Comment)) => {
                self.insert_comment_at_appropriate_place();
                true
            }

            Some(Op::Token(TokenType::Doctype)) => {
                self.record_error(ParseErrorKind::MisplacedDoctype);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPush(TagName::HTML)) => self.step_in_body(),

            Some(Op::TagPush(
                tag @ (TagName::BASE
                | TagName::BASEFONT
                | TagName::BGSOUND
                | TagName::LINK
                | TagName::META),
            )) => {
                self.insert_html_element_no_push(tag, self.tokenizer.get_attributes());
                true
            }

            Some(Op::TagPush(TagName::TITLE)) => {
                /* > Follow the generic RCDATA element parsing algorithm. */
                self.parse_generic_text(TagName::TITLE, ContentModel::Rcdata);
                true
            }

            Some(Op::TagPush(TagName::NOSCRIPT)) if self.scripting_enabled => {
                self.parse_generic_text(TagName::NOSCRIPT, ContentModel::Rawtext);
                true
            }

            Some(Op::TagPush(TagName::NOSCRIPT)) => {
                self.insert_html_element(TagName::NOSCRIPT, self.tokenizer.get_attributes());
                self.insertion_mode = InsertionMode::IN_HEAD_NOSCRIPT;
                true
            }

            Some(Op::TagPush(tag @ (TagName::NOFRAMES | TagName::STYLE))) => {
                self.parse_generic_text(tag, ContentModel::Rawtext);
                true
            }

            Some(Op::TagPush(TagName::SCRIPT)) => {
                self.parse_generic_text(TagName::SCRIPT, ContentModel::ScriptData);
                true
            }

            Some(Op::TagPop(TagName::HEAD)) => {
                self.pop();
                self.insertion_mode = InsertionMode::AFTER_HEAD;
                true
            }

            Some(Op::TagPush(TagName::TEMPLATE)) => {
                self.insert_html_element(TagName::TEMPLATE, self.tokenizer.get_attributes());
                self.active_formatting_elements.insert_marker();
                self.frameset_ok = false;
                self.insertion_mode = InsertionMode::IN_TEMPLATE;
                self.template_insertion_modes.push(InsertionMode::IN_TEMPLATE);
                true
            }

            Some(Op::TagPop(TagName::TEMPLATE)) => self.closed_template(),

            Some(Op::TagPush(TagName::HEAD)) => {
                self.record_error(ParseErrorKind::StrayStartTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPop(tag))
                if !matches!(tag, TagName::BODY | TagName::HTML | TagName::BR) =>
            {
                self.record_error(ParseErrorKind::StrayEndTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            _ => {
                self.pop();
                self.insertion_mode = InsertionMode::AFTER_HEAD;
                self.step(NodeToProcess::ReprocessCurrentNode)
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-inheadnoscript
    fn step_in_head_noscript(&mut self) -> bool {
        match self.make_op() {
            Some(Op::Token(TokenType::Doctype)) => {
                self.record_error(ParseErrorKind::MisplacedDoctype);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPush(TagName::HTML)) => self.step_in_body(),

            Some(Op::TagPop(TagName::NOSCRIPT)) => {
                self.pop();
                self.insertion_mode = InsertionMode::IN_HEAD;
                true
            }

            Some(Op::Token(TokenType::Text))
                if TextNodeClassification::Whitespace == self.tokenizer.text_node_classification() =>
            {
                self.step_in_head()
            }

            Some(Op::Token(TokenType::Comment))
            | Some(Op::TagPush(
                TagName::BASEFONT
                | TagName::BGSOUND
                | TagName::LINK
                | TagName::META
                | TagName::NOFRAMES
                | TagName::STYLE,
            )) => self.step_in_head(),

            Some(Op::TagPush(TagName::HEAD | TagName::NOSCRIPT)) => {
                self.record_error(ParseErrorKind::StrayStartTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPop(tag)) if TagName::BR != tag => {
                self.record_error(ParseErrorKind::StrayEndTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            _ => {
                self.record_error(ParseErrorKind::MisnestedTag);
                self.pop();
                self.insertion_mode = InsertionMode::IN_HEAD;
                self.step(NodeToProcess::ReprocessCurrentNode)
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#the-after-head-insertion-mode
    fn step_after_head(&mut self) -> bool {
        match self.make_op() {
            Some(Op::Token(TokenType::Text))
                if TextNodeClassification::Whitespace == self.tokenizer.text_node_classification() =>
            {
                let text = self.tokenizer.get_text();
                self.insert_text_run(&text);
                true
            }

            Some(Op::Token(TokenType::Comment)) => {
                self.insert_comment_at_appropriate_place();
                true
            }

            Some(Op::Token(TokenType::Doctype)) => {
                self.record_error(ParseErrorKind::MisplacedDoctype);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPush(TagName::HTML)) => self.step_in_body(),

            Some(Op::TagPush(TagName::BODY)) => {
                self.insert_html_element(TagName::BODY, self.tokenizer.get_attributes());
                self.frameset_ok = false;
                self.insertion_mode = InsertionMode::IN_BODY;
                true
            }

            Some(Op::TagPush(TagName::FRAMESET)) => {
                self.insert_html_element(TagName::FRAMESET, self.tokenizer.get_attributes());
                self.insertion_mode = InsertionMode::IN_FRAMESET;
                true
            }

            /* > Parse error. Push the node pointed to by the head
             * > element pointer onto the stack of open elements.
             * > Process the token using the rules for the "in head"
             * > insertion mode. Remove the node pointed to by the head
             * > element pointer from the stack of open elements. (It
             * > might not be the current node at this point.)
             */
            Some(Op::TagPush(
                TagName::BASE
                | TagName::BASEFONT
                | TagName::BGSOUND
                | TagName::LINK
                | TagName::META
                | TagName::NOFRAMES
                | TagName::SCRIPT
                | TagName::STYLE
                | TagName::TEMPLATE
                | TagName::TITLE,
            )) => {
                self.record_error(ParseErrorKind::StrayStartTag);
                let Some(head) = self.head_element else {
                    return self.step(NodeToProcess::ProcessNextNode);
                };
                self.push_open(OpenElement {
                    node: head,
                    tag: TagName::HEAD,
                    namespace: Namespace::Html,
                    integration_point: None,
                });
                let result = self.step_in_head();
                self.remove_node_from_stack(head);
                result
            }

            Some(Op::TagPop(TagName::TEMPLATE)) => self.step_in_head(),

            Some(Op::TagPush(TagName::HEAD)) => {
                self.record_error(ParseErrorKind::StrayStartTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPop(tag))
                if !matches!(tag, TagName::BODY | TagName::HTML | TagName::BR) =>
            {
                self.record_error(ParseErrorKind::StrayEndTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            _ => {
                self.insert_html_element(TagName::BODY, Vec::new());
                self.insertion_mode = InsertionMode::IN_BODY;
                self.step(NodeToProcess::ReprocessCurrentNode)
            }
        }
    }

    /// The main mode: most of a document's content is handled here.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-inbody
    fn step_in_body(&mut self) -> bool {
        match self.make_op() {
            Some(Op::Token(TokenType::Text)) => {
                match self.tokenizer.text_node_classification() {
                    // The tokenizer already reported the null characters.
                    TextNodeClassification::NullSequence => {
                        self.step(NodeToProcess::ProcessNextNode)
                    }

                    TextNodeClassification::Whitespace => {
                        self.reconstruct_active_formatting_elements();
                        let text = self.tokenizer.get_text();
                        self.insert_text_run(&text);
                        true
                    }

                    TextNodeClassification::Generic => {
                        self.reconstruct_active_formatting_elements();
                        self.frameset_ok = false;
                        let text = self.tokenizer.get_text();
                        if text.contains('\0') {
                            self.insert_text_run(&text.replace('\0', ""));
                        } else {
                            self.insert_text_run(&text);
                        }
                        true
                    }
                }
            }

            Some(Op::Token(TokenType::Comment)) => {
                self.insert_comment_at_appropriate_place();
                true
            }

            Some(Op::Token(TokenType::Doctype)) => {
                self.record_error(ParseErrorKind::MisplacedDoctype);
                self.step(NodeToProcess::ProcessNextNode)
            }

            /* > Parse error. If there is a template element on the
             * > stack of open elements, then ignore the token.
             * > Otherwise, for each attribute on the token, check to
             * > see if the attribute is already present on the top
             * > element of the stack of open elements.
             */
            Some(Op::TagPush(TagName::HTML)) => {
                self.record_error(ParseErrorKind::StrayStartTag);
                if self.open_elements.contains(&TagName::TEMPLATE) {
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                let attributes = self.tokenizer.get_attributes();
                if let Some(node) = self.open_elements.at(0).map(|entry| entry.node) {
                    self.merge_attributes_into(node, attributes);
                }
                true
            }

            Some(Op::TagPush(
                TagName::BASE
                | TagName::BASEFONT
                | TagName::BGSOUND
                | TagName::LINK
                | TagName::META
                | TagName::NOFRAMES
                | TagName::SCRIPT
                | TagName::STYLE
                | TagName::TEMPLATE
                | TagName::TITLE,
            ))
            | Some(Op::TagPop(TagName::TEMPLATE)) => self.step_in_head(),

            Some(Op::TagPush(TagName::BODY)) => {
                self.record_error(ParseErrorKind::StrayStartTag);
                let body = self
                    .open_elements
                    .at(1)
                    .filter(|entry| {
                        TagName::BODY == entry.tag && Namespace::Html == entry.namespace
                    })
                    .map(|entry| entry.node);
                match body {
                    Some(node) if !self.open_elements.contains(&TagName::TEMPLATE) => {
                        self.frameset_ok = false;
                        let attributes = self.tokenizer.get_attributes();
                        self.merge_attributes_into(node, attributes);
                        true
                    }
                    _ => self.step(NodeToProcess::ProcessNextNode),
                }
            }

            Some(Op::TagPush(TagName::FRAMESET)) => {
                self.record_error(ParseErrorKind::StrayStartTag);
                let body = self
                    .open_elements
                    .at(1)
                    .filter(|entry| {
                        TagName::BODY == entry.tag && Namespace::Html == entry.namespace
                    })
                    .map(|entry| entry.node);
                let Some(body) = body else {
                    return self.step(NodeToProcess::ProcessNextNode);
                };
                if !self.frameset_ok {
                    return self.step(NodeToProcess::ProcessNextNode);
                }

                /* > Remove the second element on the stack of open
                 * > elements from its parent node, if it has one. Pop
                 * > all the nodes from the bottom of the stack of open
                 * > elements, from the current node up to, but not
                 * > including, the root html element.
                 */
                self.document.detach(body);
                while self.open_elements.count() > 1 {
                    self.pop();
                }
                self.insert_html_element(TagName::FRAMESET, self.tokenizer.get_attributes());
                self.insertion_mode = InsertionMode::IN_FRAMESET;
                true
            }

            Some(Op::TagPush(
                tag @ (TagName::ADDRESS
                | TagName::ARTICLE
                | TagName::ASIDE
                | TagName::BLOCKQUOTE
                | TagName::CENTER
                | TagName::DETAILS
                | TagName::DIALOG
                | TagName::DIR
                | TagName::DIV
                | TagName::DL
                | TagName::FIELDSET
                | TagName::FIGCAPTION
                | TagName::FIGURE
                | TagName::FOOTER
                | TagName::HEADER
                | TagName::HGROUP
                | TagName::MAIN
                | TagName::MENU
                | TagName::NAV
                | TagName::OL
                | TagName::P
                | TagName::SEARCH
                | TagName::SECTION
                | TagName::SUMMARY
                | TagName::UL),
            )) => {
                if self.open_elements.has_p_in_button_scope() {
                    self.close_a_p_element();
                }
                self.insert_html_element(tag, self.tokenizer.get_attributes());
                true
            }

            Some(Op::TagPush(
                tag @ (TagName::H1
                | TagName::H2
                | TagName::H3
                | TagName::H4
                | TagName::H5
                | TagName::H6),
            )) => {
                if self.open_elements.has_p_in_button_scope() {
                    self.close_a_p_element();
                }
                /* > If the current node is an HTML element whose tag
                 * > name is one of "h1" through "h6", then this is a
                 * > parse error; pop the current node off the stack.
                 */
                let current_is_heading = self
                    .open_elements
                    .current_node()
                    .map(|entry| Namespace::Html == entry.namespace && entry.tag.is_heading())
                    .unwrap_or(false);
                if current_is_heading {
                    self.record_error(ParseErrorKind::MisnestedTag);
                    self.pop();
                }
                self.insert_html_element(tag, self.tokenizer.get_attributes());
                true
            }

            Some(Op::TagPush(tag @ (TagName::PRE | TagName::LISTING))) => {
                if self.open_elements.has_p_in_button_scope() {
                    self.close_a_p_element();
                }
                // The tokenizer skips a newline directly after the tag.
                self.insert_html_element(tag, self.tokenizer.get_attributes());
                self.frameset_ok = false;
                true
            }

            Some(Op::TagPush(TagName::FORM)) => {
                let template_on_stack = self.open_elements.contains(&TagName::TEMPLATE);
                if self.form_element.is_some() && !template_on_stack {
                    self.record_error(ParseErrorKind::StrayStartTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                if self.open_elements.has_p_in_button_scope() {
                    self.close_a_p_element();
                }
                let node = self.insert_html_element(TagName::FORM, self.tokenizer.get_attributes());
                if !template_on_stack {
                    self.form_element = Some(node);
                }
                true
            }

            Some(Op::TagPush(TagName::LI)) => {
                self.frameset_ok = false;

                /* > Initialize node to be the current node (the
                 * > bottommost node of the stack). Loop: If node is an
                 * > li element, then run these substeps ...
                 */
                for index in (0..self.open_elements.count()).rev() {
                    let Some(entry) = self.open_elements.at(index) else {
                        break;
                    };
                    if Namespace::Html == entry.namespace && TagName::LI == entry.tag {
                        self.generate_implied_end_tags(Some(&TagName::LI));
                        if !self.open_elements.current_node_is(&TagName::LI) {
                            self.record_error(ParseErrorKind::MisnestedTag);
                        }
                        self.pop_until(&TagName::LI);
                        break;
                    }
                    /* > If node is in the special category, but is not
                     * > an address, div, or p element, then jump to the
                     * > step labeled done below.
                     */
                    if Namespace::Html == entry.namespace
                        && entry.tag.is_special()
                        && !matches!(entry.tag, TagName::ADDRESS | TagName::DIV | TagName::P)
                    {
                        break;
                    }
                }

                if self.open_elements.has_p_in_button_scope() {
                    self.close_a_p_element();
                }
                self.insert_html_element(TagName::LI, self.tokenizer.get_attributes());
                true
            }

            Some(Op::TagPush(tag @ (TagName::DD | TagName::DT))) => {
                self.frameset_ok = false;

                for index in (0..self.open_elements.count()).rev() {
                    let Some(entry) = self.open_elements.at(index) else {
                        break;
                    };
                    if Namespace::Html == entry.namespace
                        && matches!(entry.tag, TagName::DD | TagName::DT)
                    {
                        let found = entry.tag.clone();
                        self.generate_implied_end_tags(Some(&found));
                        if !self.open_elements.current_node_is(&found) {
                            self.record_error(ParseErrorKind::MisnestedTag);
                        }
                        self.pop_until(&found);
                        break;
                    }
                    if Namespace::Html == entry.namespace
                        && entry.tag.is_special()
                        && !matches!(entry.tag, TagName::ADDRESS | TagName::DIV | TagName::P)
                    {
                        break;
                    }
                }

                if self.open_elements.has_p_in_button_scope() {
                    self.close_a_p_element();
                }
                self.insert_html_element(tag, self.tokenizer.get_attributes());
                true
            }

            Some(Op::TagPush(TagName::PLAINTEXT)) => {
                if self.open_elements.has_p_in_button_scope() {
                    self.close_a_p_element();
                }
                self.insert_html_element(TagName::PLAINTEXT, self.tokenizer.get_attributes());
                /* > Once a start tag with the tag name "plaintext" has
                 * > been seen, that will be the last token ever seen
                 * > other than character tokens (and the end-of-file
                 * > token), because there is no way to switch out of
                 * > the PLAINTEXT state.
                 */
                self.tokenizer.set_content_model(ContentModel::Plaintext, None);
                true
            }

            Some(Op::TagPush(TagName::BUTTON)) => {
                if self.open_elements.has_element_in_scope(&TagName::BUTTON) {
                    self.record_error(ParseErrorKind::MisnestedTag);
                    self.generate_implied_end_tags(None);
                    self.pop_until(&TagName::BUTTON);
                }
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(TagName::BUTTON, self.tokenizer.get_attributes());
                self.frameset_ok = false;
                true
            }

            Some(Op::TagPop(TagName::BODY)) => {
                if !self.open_elements.has_element_in_scope(&TagName::BODY) {
                    self.record_error(ParseErrorKind::StrayEndTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.report_still_open_elements();
                self.insertion_mode = InsertionMode::AFTER_BODY;
                true
            }

            Some(Op::TagPop(TagName::HTML)) => {
                if !self.open_elements.has_element_in_scope(&TagName::BODY) {
                    self.record_error(ParseErrorKind::StrayEndTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.report_still_open_elements();
                self.insertion_mode = InsertionMode::AFTER_BODY;
                self.step(NodeToProcess::ReprocessCurrentNode)
            }

            Some(Op::TagPop(
                tag @ (TagName::ADDRESS
                | TagName::ARTICLE
                | TagName::ASIDE
                | TagName::BLOCKQUOTE
                | TagName::BUTTON
                | TagName::CENTER
                | TagName::DETAILS
                | TagName::DIALOG
                | TagName::DIR
                | TagName::DIV
                | TagName::DL
                | TagName::FIELDSET
                | TagName::FIGCAPTION
                | TagName::FIGURE
                | TagName::FOOTER
                | TagName::HEADER
                | TagName::HGROUP
                | TagName::LISTING
                | TagName::MAIN
                | TagName::MENU
                | TagName::NAV
                | TagName::OL
                | TagName::PRE
                | TagName::SEARCH
                | TagName::SECTION
                | TagName::SUMMARY
                | TagName::UL),
            )) => {
                if !self.open_elements.has_element_in_scope(&tag) {
                    self.record_error(ParseErrorKind::StrayEndTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.generate_implied_end_tags(None);
                if !self.open_elements.current_node_is(&tag) {
                    self.record_error(ParseErrorKind::MisnestedTag);
                }
                self.pop_until(&tag);
                true
            }

            Some(Op::TagPop(TagName::FORM)) => {
                if !self.open_elements.contains(&TagName::TEMPLATE) {
                    /* > Let node be the element that the form element
                     * > pointer is set to, or null if it is not set to
                     * > an element. Set the form element pointer to
                     * > null.
                     */
                    let node = self.form_element.take();
                    let node = node.filter(|&node| self.open_elements.has_node_in_scope(node));
                    let Some(node) = node else {
                        self.record_error(ParseErrorKind::StrayEndTag);
                        return self.step(NodeToProcess::ProcessNextNode);
                    };
                    self.generate_implied_end_tags(None);
                    if self.open_elements.current_node().map(|entry| entry.node) != Some(node) {
                        self.record_error(ParseErrorKind::MisnestedTag);
                    }
                    self.remove_node_from_stack(node);
                    true
                } else {
                    if !self.open_elements.has_element_in_scope(&TagName::FORM) {
                        self.record_error(ParseErrorKind::StrayEndTag);
                        return self.step(NodeToProcess::ProcessNextNode);
                    }
                    self.generate_implied_end_tags(None);
                    if !self.open_elements.current_node_is(&TagName::FORM) {
                        self.record_error(ParseErrorKind::MisnestedTag);
                    }
                    self.pop_until(&TagName::FORM);
                    true
                }
            }

            /* > If the stack of open elements does not have a p
             * > element in button scope, then this is a parse error;
             * > insert an HTML element for a "p" start tag token with
             * > no attributes.
             */
            Some(Op::TagPop(TagName::P)) => {
                if !self.open_elements.has_p_in_button_scope() {
                    self.record_error(ParseErrorKind::StrayEndTag);
                    self.insert_html_element(TagName::P, Vec::new());
                }
                self.close_a_p_element();
                true
            }

            Some(Op::TagPop(TagName::LI)) => {
                if !self.open_elements.has_element_in_list_item_scope(&TagName::LI) {
                    self.record_error(ParseErrorKind::StrayEndTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.generate_implied_end_tags(Some(&TagName::LI));
                if !self.open_elements.current_node_is(&TagName::LI) {
                    self.record_error(ParseErrorKind::MisnestedTag);
                }
                self.pop_until(&TagName::LI);
                true
            }

            Some(Op::TagPop(tag @ (TagName::DD | TagName::DT))) => {
                if !self.open_elements.has_element_in_scope(&tag) {
                    self.record_error(ParseErrorKind::StrayEndTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.generate_implied_end_tags(Some(&tag));
                if !self.open_elements.current_node_is(&tag) {
                    self.record_error(ParseErrorKind::MisnestedTag);
                }
                self.pop_until(&tag);
                true
            }

            Some(Op::TagPop(
                tag @ (TagName::H1
                | TagName::H2
                | TagName::H3
                | TagName::H4
                | TagName::H5
                | TagName::H6),
            )) => {
                if !self.open_elements.has_any_h1_to_h6_element_in_scope() {
                    self.record_error(ParseErrorKind::StrayEndTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.generate_implied_end_tags(None);
                if !self.open_elements.current_node_is(&tag) {
                    self.record_error(ParseErrorKind::MisnestedTag);
                }
                /* > Pop elements from the stack of open elements until
                 * > an HTML element whose tag name is one of "h1",
                 * > "h2", "h3", "h4", "h5", or "h6" has been popped.
                 */
                while let Some(popped) = self.pop() {
                    if Namespace::Html == popped.namespace && popped.tag.is_heading() {
                        break;
                    }
                }
                true
            }

            /* > If the list of active formatting elements contains an
             * > a element between the end of the list and the last
             * > marker on the list ... this is a parse error; run the
             * > adoption agency algorithm for the token, then remove
             * > that element from the list of active formatting
             * > elements and the stack of open elements.
             */
            Some(Op::TagPush(TagName::A)) => {
                if let Some(index) = self
                    .active_formatting_elements
                    .find_after_last_marker(&TagName::A)
                {
                    self.record_error(ParseErrorKind::MisnestedTag);
                    let node = self
                        .active_formatting_elements
                        .at(index)
                        .and_then(|entry| entry.node());
                    let _ = self.run_adoption_agency_algorithm(&TagName::A);
                    if let Some(node) = node {
                        self.active_formatting_elements.remove_node(node);
                        self.remove_node_from_stack(node);
                    }
                }

                self.reconstruct_active_formatting_elements();
                let attributes = self.tokenizer.get_attributes();
                let node = self.insert_html_element(TagName::A, attributes.clone());
                self.active_formatting_elements.push(node, TagName::A, attributes);
                true
            }

            Some(Op::TagPush(
                tag @ (TagName::B
                | TagName::BIG
                | TagName::CODE
                | TagName::EM
                | TagName::FONT
                | TagName::I
                | TagName::S
                | TagName::SMALL
                | TagName::STRIKE
                | TagName::STRONG
                | TagName::TT
                | TagName::U),
            )) => {
                self.reconstruct_active_formatting_elements();
                let attributes = self.tokenizer.get_attributes();
                let node = self.insert_html_element(tag.clone(), attributes.clone());
                self.active_formatting_elements.push(node, tag, attributes);
                true
            }

            Some(Op::TagPush(TagName::NOBR)) => {
                self.reconstruct_active_formatting_elements();
                if self.open_elements.has_element_in_scope(&TagName::NOBR) {
                    self.record_error(ParseErrorKind::MisnestedTag);
                    let _ = self.run_adoption_agency_algorithm(&TagName::NOBR);
                    self.reconstruct_active_formatting_elements();
                }
                let attributes = self.tokenizer.get_attributes();
                let node = self.insert_html_element(TagName::NOBR, attributes.clone());
                self.active_formatting_elements.push(node, TagName::NOBR, attributes);
                true
            }

            Some(Op::TagPop(tag)) if tag.is_formatting() => {
                match self.run_adoption_agency_algorithm(&tag) {
                    AdoptionResult::Handled => true,
                    AdoptionResult::AnyOtherEndTag => self.any_other_end_tag(&tag),
                }
            }

            Some(Op::TagPush(tag @ (TagName::APPLET | TagName::MARQUEE | TagName::OBJECT))) => {
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(tag, self.tokenizer.get_attributes());
                self.active_formatting_elements.insert_marker();
                self.frameset_ok = false;
                true
            }

            Some(Op::TagPop(tag @ (TagName::APPLET | TagName::MARQUEE | TagName::OBJECT))) => {
                if !self.open_elements.has_element_in_scope(&tag) {
                    self.record_error(ParseErrorKind::StrayEndTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.generate_implied_end_tags(None);
                if !self.open_elements.current_node_is(&tag) {
                    self.record_error(ParseErrorKind::MisnestedTag);
                }
                self.pop_until(&tag);
                self.active_formatting_elements.clear_up_to_last_marker();
                true
            }

            Some(Op::TagPush(TagName::TABLE)) => {
                /* > If the Document is not set to quirks mode, and the
                 * > stack of open elements has a p element in button
                 * > scope, then close a p element.
                 */
                if QuirksMode::Quirks != self.document.quirks_mode()
                    && self.open_elements.has_p_in_button_scope()
                {
                    self.close_a_p_element();
                }
                self.insert_html_element(TagName::TABLE, self.tokenizer.get_attributes());
                self.frameset_ok = false;
                self.insertion_mode = InsertionMode::IN_TABLE;
                true
            }

            /* > Parse error. Drop the attributes from the token, and
             * > act as described in the next entry; i.e. act as if
             * > this was a "br" start tag token with no attributes.
             */
            Some(Op::TagPop(TagName::BR)) => {
                self.record_error(ParseErrorKind::StrayEndTag);
                self.reconstruct_active_formatting_elements();
                self.insert_html_element_no_push(TagName::BR, Vec::new());
                self.frameset_ok = false;
                true
            }

            Some(Op::TagPush(
                tag @ (TagName::AREA
                | TagName::BR
                | TagName::EMBED
                | TagName::IMG
                | TagName::KEYGEN
                | TagName::WBR),
            )) => {
                self.reconstruct_active_formatting_elements();
                self.insert_html_element_no_push(tag, self.tokenizer.get_attributes());
                self.frameset_ok = false;
                true
            }

            Some(Op::TagPush(TagName::INPUT)) => {
                let attributes = self.tokenizer.get_attributes();
                /* > If the token does not have an attribute with the
                 * > name "type", or if it does, but that attribute's
                 * > value is not an ASCII case-insensitive match for
                 * > the string "hidden", then: set the frameset-ok
                 * > flag to "not ok".
                 */
                let hidden = attributes.iter().any(|attribute| {
                    *b"type" == *attribute.name
                        && attribute
                            .value
                            .as_deref()
                            .map(|value| value.eq_ignore_ascii_case(b"hidden"))
                            .unwrap_or(false)
                });
                self.reconstruct_active_formatting_elements();
                self.insert_html_element_no_push(TagName::INPUT, attributes);
                if !hidden {
                    self.frameset_ok = false;
                }
                true
            }

            Some(Op::TagPush(tag @ (TagName::PARAM | TagName::SOURCE | TagName::TRACK))) => {
                self.insert_html_element_no_push(tag, self.tokenizer.get_attributes());
                true
            }

            Some(Op::TagPush(TagName::HR)) => {
                if self.open_elements.has_p_in_button_scope() {
                    self.close_a_p_element();
                }
                self.insert_html_element_no_push(TagName::HR, self.tokenizer.get_attributes());
                self.frameset_ok = false;
                true
            }

            /* > Parse error. Change the token's tag name to "img" and
             * > reprocess it. (Don't ask.)
             */
            Some(Op::TagPush(TagName::IMAGE)) => {
                self.record_error(ParseErrorKind::StrayStartTag);
                self.reconstruct_active_formatting_elements();
                self.insert_html_element_no_push(TagName::IMG, self.tokenizer.get_attributes());
                self.frameset_ok = false;
                true
            }

            Some(Op::TagPush(TagName::TEXTAREA)) => {
                // The tokenizer skips a newline directly after the tag.
                self.frameset_ok = false;
                self.parse_generic_text(TagName::TEXTAREA, ContentModel::Rcdata);
                true
            }

            Some(Op::TagPush(TagName::XMP)) => {
                if self.open_elements.has_p_in_button_scope() {
                    self.close_a_p_element();
                }
                self.reconstruct_active_formatting_elements();
                self.frameset_ok = false;
                self.parse_generic_text(TagName::XMP, ContentModel::Rawtext);
                true
            }

            Some(Op::TagPush(TagName::IFRAME)) => {
                self.frameset_ok = false;
                self.parse_generic_text(TagName::IFRAME, ContentModel::Rawtext);
                true
            }

            Some(Op::TagPush(TagName::NOEMBED)) => {
                self.parse_generic_text(TagName::NOEMBED, ContentModel::Rawtext);
                true
            }

            Some(Op::TagPush(TagName::NOSCRIPT)) if self.scripting_enabled => {
                self.parse_generic_text(TagName::NOSCRIPT, ContentModel::Rawtext);
                true
            }

            Some(Op::TagPush(TagName::SELECT)) => {
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(TagName::SELECT, self.tokenizer.get_attributes());
                self.frameset_ok = false;
                self.insertion_mode = match self.insertion_mode {
                    InsertionMode::IN_TABLE
                    | InsertionMode::IN_CAPTION
                    | InsertionMode::IN_TABLE_BODY
                    | InsertionMode::IN_ROW
                    | InsertionMode::IN_CELL => InsertionMode::IN_SELECT_IN_TABLE,
                    _ => InsertionMode::IN_SELECT,
                };
                true
            }

            Some(Op::TagPush(tag @ (TagName::OPTGROUP | TagName::OPTION))) => {
                if self.open_elements.current_node_is(&TagName::OPTION) {
                    self.pop();
                }
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(tag, self.tokenizer.get_attributes());
                true
            }

            Some(Op::TagPush(tag @ (TagName::RB | TagName::RTC))) => {
                if self.open_elements.has_element_in_scope(&TagName::RUBY) {
                    self.generate_implied_end_tags(None);
                    if !self.open_elements.current_node_is(&TagName::RUBY) {
                        self.record_error(ParseErrorKind::MisnestedTag);
                    }
                }
                self.insert_html_element(tag, self.tokenizer.get_attributes());
                true
            }

            Some(Op::TagPush(tag @ (TagName::RP | TagName::RT))) => {
                if self.open_elements.has_element_in_scope(&TagName::RUBY) {
                    self.generate_implied_end_tags(Some(&TagName::RTC));
                    let current_is_base = self.open_elements.current_node_is(&TagName::RUBY)
                        || self.open_elements.current_node_is(&TagName::RTC);
                    if !current_is_base {
                        self.record_error(ParseErrorKind::MisnestedTag);
                    }
                }
                self.insert_html_element(tag, self.tokenizer.get_attributes());
                true
            }

            Some(Op::TagPush(TagName::MATH)) => {
                self.reconstruct_active_formatting_elements();
                let mut attributes = self.tokenizer.get_attributes();
                adjust_mathml_attributes(&mut attributes);
                self.insert_foreign_element(TagName::MATH, Namespace::MathMl, attributes);
                if self.tokenizer.has_self_closing_flag() {
                    self.pop();
                }
                true
            }

            Some(Op::TagPush(TagName::SVG)) => {
                self.reconstruct_active_formatting_elements();
                let mut attributes = self.tokenizer.get_attributes();
                adjust_svg_attributes(&mut attributes);
                self.insert_foreign_element(TagName::SVG, Namespace::Svg, attributes);
                if self.tokenizer.has_self_closing_flag() {
                    self.pop();
                }
                true
            }

            Some(Op::TagPush(
                TagName::CAPTION
                | TagName::COL
                | TagName::COLGROUP
                | TagName::FRAME
                | TagName::HEAD
                | TagName::TBODY
                | TagName::TD
                | TagName::TFOOT
                | TagName::TH
                | TagName::THEAD
                | TagName::TR,
            )) => {
                self.record_error(ParseErrorKind::StrayStartTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPush(tag)) => {
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(tag, self.tokenizer.get_attributes());
                true
            }

            Some(Op::TagPop(tag)) => self.any_other_end_tag(&tag),

            Some(Op::Token(_)) => self.step(NodeToProcess::ProcessNextNode),

            None => false,
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-incdata
    fn step_text(&mut self) -> bool {
        match self.make_op() {
            Some(Op::Token(TokenType::Text)) => {
                let text = self.tokenizer.get_text();
                if text.contains('\0') {
                    self.insert_text_run(&text.replace('\0', "\u{FFFD}"));
                } else {
                    self.insert_text_run(&text);
                }
                true
            }

            /*
             * The only tag the tokenizer can produce while a text
             * region is open is the region's own closing tag. Script
             * contents are never executed; parsing only builds the
             * tree.
             */
            Some(Op::TagPop(_)) => {
                self.pop();
                self.insertion_mode = self.original_insertion_mode;
                true
            }

            _ => {
                self.pop();
                self.insertion_mode = self.original_insertion_mode;
                self.step(NodeToProcess::ReprocessCurrentNode)
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-intable
    fn step_in_table(&mut self) -> bool {
        match self.make_op() {
            Some(Op::Token(TokenType::Text)) if self.defers_to_table_text() => {
                self.original_insertion_mode = self.insertion_mode;
                self.insertion_mode = InsertionMode::IN_TABLE_TEXT;
                self.step(NodeToProcess::ReprocessCurrentNode)
            }

            Some(Op::Token(TokenType::Comment)) => {
                self.insert_comment_at_appropriate_place();
                true
            }

            Some(Op::Token(TokenType::Doctype)) => {
                self.record_error(ParseErrorKind::MisplacedDoctype);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPush(TagName::CAPTION)) => {
                self.clear_stack_to_table_context();
                self.active_formatting_elements.insert_marker();
                self.insert_html_element(TagName::CAPTION, self.tokenizer.get_attributes());
                self.insertion_mode = InsertionMode::IN_CAPTION;
                true
            }

            Some(Op::TagPush(TagName::COLGROUP)) => {
                self.clear_stack_to_table_context();
                self.insert_html_element(TagName::COLGROUP, self.tokenizer.get_attributes());
                self.insertion_mode = InsertionMode::IN_COLUMN_GROUP;
                true
            }

            /* > Clear the stack back to a table context. Insert an
             * > HTML element for a "colgroup" start tag token with no
             * > attributes, then switch the insertion mode to "in
             * > column group". Reprocess the current token.
             */
            Some(Op::TagPush(TagName::COL)) => {
                self.clear_stack_to_table_context();
                self.insert_html_element(TagName::COLGROUP, Vec::new());
                self.insertion_mode = InsertionMode::IN_COLUMN_GROUP;
                self.step(NodeToProcess::ReprocessCurrentNode)
            }

            Some(Op::TagPush(tag @ (TagName::TBODY | TagName::TFOOT | TagName::THEAD))) => {
                self.clear_stack_to_table_context();
                self.insert_html_element(tag, self.tokenizer.get_attributes());
                self.insertion_mode = InsertionMode::IN_TABLE_BODY;
                true
            }

            Some(Op::TagPush(TagName::TD | TagName::TH | TagName::TR)) => {
                self.clear_stack_to_table_context();
                self.insert_html_element(TagName::TBODY, Vec::new());
                self.insertion_mode = InsertionMode::IN_TABLE_BODY;
                self.step(NodeToProcess::ReprocessCurrentNode)
            }

            Some(Op::TagPush(TagName::TABLE)) => {
                self.record_error(ParseErrorKind::MisnestedTag);
                if !self.open_elements.has_element_in_table_scope(&TagName::TABLE) {
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.pop_until(&TagName::TABLE);
                self.reset_insertion_mode_appropriately();
                self.step(NodeToProcess::ReprocessCurrentNode)
            }

            Some(Op::TagPop(TagName::TABLE)) => {
                if !self.open_elements.has_element_in_table_scope(&TagName::TABLE) {
                    self.record_error(ParseErrorKind::StrayEndTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.pop_until(&TagName::TABLE);
                self.reset_insertion_mode_appropriately();
                true
            }

            Some(Op::TagPop(
                TagName::BODY
                | TagName::CAPTION
                | TagName::COL
                | TagName::COLGROUP
                | TagName::HTML
                | TagName::TBODY
                | TagName::TD
                | TagName::TFOOT
                | TagName::TH
                | TagName::THEAD
                | TagName::TR,
            )) => {
                self.record_error(ParseErrorKind::StrayEndTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPush(TagName::STYLE | TagName::SCRIPT | TagName::TEMPLATE))
            | Some(Op::TagPop(TagName::TEMPLATE)) => self.step_in_head(),

            Some(Op::TagPush(TagName::INPUT)) => {
                let attributes = self.tokenizer.get_attributes();
                let hidden = attributes.iter().any(|attribute| {
                    *b"type" == *attribute.name
                        && attribute
                            .value
                            .as_deref()
                            .map(|value| value.eq_ignore_ascii_case(b"hidden"))
                            .unwrap_or(false)
                });
                if !hidden {
                    return self.foster_parented_in_body();
                }
                self.record_error(ParseErrorKind::MisnestedTag);
                self.insert_html_element_no_push(TagName::INPUT, attributes);
                true
            }

            /* > Parse error. If there is a template element on the
             * > stack of open elements, or if the form element pointer
             * > is not null, ignore the token. Otherwise: insert an
             * > HTML element for the token, and set the form element
             * > pointer to point to the element created. Pop that form
             * > element off the stack of open elements.
             */
            Some(Op::TagPush(TagName::FORM)) => {
                self.record_error(ParseErrorKind::MisnestedTag);
                if self.open_elements.contains(&TagName::TEMPLATE) || self.form_element.is_some() {
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                let node = self.insert_html_element(TagName::FORM, self.tokenizer.get_attributes());
                self.form_element = Some(node);
                self.pop();
                true
            }

            /* > Parse error. Enable foster parenting, process the
             * > token using the rules for the "in body" insertion
             * > mode, and then disable foster parenting.
             */
            _ => {
                self.record_error(ParseErrorKind::MisnestedTag);
                self.foster_parented_in_body()
            }
        }
    }

    /// Handles a whole run of table text at once. Because text tokens
    /// are maximal runs, one token carries what the specification
    /// accumulates in the pending table character tokens list.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-intabletext
    fn step_in_table_text(&mut self) -> bool {
        match self.make_op() {
            Some(Op::Token(TokenType::Text)) => {
                let text = self.tokenizer.get_text().replace('\0', "");
                if text.is_empty() {
                    self.insertion_mode = self.original_insertion_mode;
                    return self.step(NodeToProcess::ProcessNextNode);
                }

                let all_whitespace = text
                    .bytes()
                    .all(|byte| matches!(byte, b'\t' | b'\n' | b'\x0c' | b'\r' | b' '));
                if all_whitespace {
                    self.insert_text_run(&text);
                } else {
                    /* > If any of the tokens in the pending table
                     * > character tokens list are character tokens that
                     * > are not ASCII whitespace, then this is a parse
                     * > error: reprocess the character tokens ... using
                     * > the rules given in the "anything else" entry in
                     * > the "in table" insertion mode.
                     */
                    self.record_error(ParseErrorKind::MisnestedTag);
                    self.foster_parenting = true;
                    self.reconstruct_active_formatting_elements();
                    self.insert_text_run(&text);
                    self.foster_parenting = false;
                    self.frameset_ok = false;
                }

                self.insertion_mode = self.original_insertion_mode;
                true
            }

            _ => {
                self.insertion_mode = self.original_insertion_mode;
                self.step(NodeToProcess::ReprocessCurrentNode)
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-incaption
    fn step_in_caption(&mut self) -> bool {
        match self.make_op() {
            Some(Op::TagPop(TagName::CAPTION)) => {
                self.close_caption();
                true
            }

            Some(Op::TagPush(
                TagName::CAPTION
                | TagName::COL
                | TagName::COLGROUP
                | TagName::TBODY
                | TagName::TD
                | TagName::TFOOT
                | TagName::TH
                | TagName::THEAD
                | TagName::TR,
            ))
            | Some(Op::TagPop(TagName::TABLE)) => {
                if !self.close_caption() {
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.step(NodeToProcess::ReprocessCurrentNode)
            }

            Some(Op::TagPop(
                TagName::BODY
                | TagName::COL
                | TagName::COLGROUP
                | TagName::HTML
                | TagName::TBODY
                | TagName::TD
                | TagName::TFOOT
                | TagName::TH
                | TagName::THEAD
                | TagName::TR,
            )) => {
                self.record_error(ParseErrorKind::StrayEndTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            _ => self.step_in_body(),
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-incolgroup
    fn step_in_column_group(&mut self) -> bool {
        match self.make_op() {
            Some(Op::Token(TokenType::Text))
                if TextNodeClassification::Whitespace == self.tokenizer.text_node_classification() =>
            {
                let text = self.tokenizer.get_text();
                self.insert_text_run(&text);
                true
            }

            Some(Op::Token(TokenType::Comment)) => {
                self.insert_comment_at_appropriate_place();
                true
            }

            Some(Op::Token(TokenType::Doctype)) => {
                self.record_error(ParseErrorKind::MisplacedDoctype);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPush(TagName::HTML)) => self.step_in_body(),

            Some(Op::TagPush(TagName::COL)) => {
                self.insert_html_element_no_push(TagName::COL, self.tokenizer.get_attributes());
                true
            }

            Some(Op::TagPop(TagName::COLGROUP)) => {
                if !self.open_elements.current_node_is(&TagName::COLGROUP) {
                    self.record_error(ParseErrorKind::StrayEndTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.pop();
                self.insertion_mode = InsertionMode::IN_TABLE;
                true
            }

            Some(Op::TagPop(TagName::COL)) => {
                self.record_error(ParseErrorKind::StrayEndTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPush(TagName::TEMPLATE)) | Some(Op::TagPop(TagName::TEMPLATE)) => {
                self.step_in_head()
            }

            _ => {
                if !self.open_elements.current_node_is(&TagName::COLGROUP) {
                    self.record_error(ParseErrorKind::MisnestedTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.pop();
                self.insertion_mode = InsertionMode::IN_TABLE;
                self.step(NodeToProcess::ReprocessCurrentNode)
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-intbody
    fn step_in_table_body(&mut self) -> bool {
        match self.make_op() {
            Some(Op::TagPush(TagName::TR)) => {
                self.clear_stack_to_table_body_context();
                self.insert_html_element(TagName::TR, self.tokenizer.get_attributes());
                self.insertion_mode = InsertionMode::IN_ROW;
                true
            }

            Some(Op::TagPush(TagName::TH | TagName::TD)) => {
                self.record_error(ParseErrorKind::MisnestedTag);
                self.clear_stack_to_table_body_context();
                self.insert_html_element(TagName::TR, Vec::new());
                self.insertion_mode = InsertionMode::IN_ROW;
                self.step(NodeToProcess::ReprocessCurrentNode)
            }

            Some(Op::TagPop(tag @ (TagName::TBODY | TagName::TFOOT | TagName::THEAD))) => {
                if !self.open_elements.has_element_in_table_scope(&tag) {
                    self.record_error(ParseErrorKind::StrayEndTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.clear_stack_to_table_body_context();
                self.pop();
                self.insertion_mode = InsertionMode::IN_TABLE;
                true
            }

            Some(Op::TagPush(
                TagName::CAPTION
                | TagName::COL
                | TagName::COLGROUP
                | TagName::TBODY
                | TagName::TFOOT
                | TagName::THEAD,
            ))
            | Some(Op::TagPop(TagName::TABLE)) => {
                let in_scope = self.open_elements.has_element_in_table_scope(&TagName::TBODY)
                    || self.open_elements.has_element_in_table_scope(&TagName::THEAD)
                    || self.open_elements.has_element_in_table_scope(&TagName::TFOOT);
                if !in_scope {
                    self.record_error(ParseErrorKind::StrayEndTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.clear_stack_to_table_body_context();
                self.pop();
                self.insertion_mode = InsertionMode::IN_TABLE;
                self.step(NodeToProcess::ReprocessCurrentNode)
            }

            Some(Op::TagPop(
                TagName::BODY
                | TagName::CAPTION
                | TagName::COL
                | TagName::COLGROUP
                | TagName::HTML
                | TagName::TD
                | TagName::TH
                | TagName::TR,
            )) => {
                self.record_error(ParseErrorKind::StrayEndTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            _ => self.step_in_table(),
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-intr
    fn step_in_row(&mut self) -> bool {
        match self.make_op() {
            Some(Op::TagPush(tag @ (TagName::TH | TagName::TD))) => {
                self.clear_stack_to_table_row_context();
                self.insert_html_element(tag, self.tokenizer.get_attributes());
                self.insertion_mode = InsertionMode::IN_CELL;
                self.active_formatting_elements.insert_marker();
                true
            }

            Some(Op::TagPop(TagName::TR)) => {
                if !self.open_elements.has_element_in_table_scope(&TagName::TR) {
                    self.record_error(ParseErrorKind::StrayEndTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.clear_stack_to_table_row_context();
                self.pop();
                self.insertion_mode = InsertionMode::IN_TABLE_BODY;
                true
            }

            Some(Op::TagPush(
                TagName::CAPTION
                | TagName::COL
                | TagName::COLGROUP
                | TagName::TBODY
                | TagName::TFOOT
                | TagName::THEAD
                | TagName::TR,
            ))
            | Some(Op::TagPop(TagName::TABLE)) => {
                if !self.open_elements.has_element_in_table_scope(&TagName::TR) {
                    self.record_error(ParseErrorKind::StrayEndTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.clear_stack_to_table_row_context();
                self.pop();
                self.insertion_mode = InsertionMode::IN_TABLE_BODY;
                self.step(NodeToProcess::ReprocessCurrentNode)
            }

            Some(Op::TagPop(tag @ (TagName::TBODY | TagName::TFOOT | TagName::THEAD))) => {
                if !self.open_elements.has_element_in_table_scope(&tag) {
                    self.record_error(ParseErrorKind::StrayEndTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                if !self.open_elements.has_element_in_table_scope(&TagName::TR) {
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.clear_stack_to_table_row_context();
                self.pop();
                self.insertion_mode = InsertionMode::IN_TABLE_BODY;
                self.step(NodeToProcess::ReprocessCurrentNode)
            }

            Some(Op::TagPop(
                TagName::BODY
                | TagName::CAPTION
                | TagName::COL
                | TagName::COLGROUP
                | TagName::HTML
                | TagName::TD
                | TagName::TH,
            )) => {
                self.record_error(ParseErrorKind::StrayEndTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            _ => self.step_in_table(),
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-intd
    fn step_in_cell(&mut self) -> bool {
        match self.make_op() {
            Some(Op::TagPop(tag @ (TagName::TD | TagName::TH))) => {
                if !self.open_elements.has_element_in_table_scope(&tag) {
                    self.record_error(ParseErrorKind::StrayEndTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.generate_implied_end_tags(None);
                if !self.open_elements.current_node_is(&tag) {
                    self.record_error(ParseErrorKind::MisnestedTag);
                }
                self.pop_until(&tag);
                self.active_formatting_elements.clear_up_to_last_marker();
                self.insertion_mode = InsertionMode::IN_ROW;
                true
            }

            Some(Op::TagPush(
                TagName::CAPTION
                | TagName::COL
                | TagName::COLGROUP
                | TagName::TBODY
                | TagName::TD
                | TagName::TFOOT
                | TagName::TH
                | TagName::THEAD
                | TagName::TR,
            )) => {
                let has_cell = self.open_elements.has_element_in_table_scope(&TagName::TD)
                    || self.open_elements.has_element_in_table_scope(&TagName::TH);
                if !has_cell {
                    self.record_error(ParseErrorKind::StrayStartTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.close_cell();
                self.step(NodeToProcess::ReprocessCurrentNode)
            }

            Some(Op::TagPop(
                TagName::BODY | TagName::CAPTION | TagName::COL | TagName::COLGROUP | TagName::HTML,
            )) => {
                self.record_error(ParseErrorKind::StrayEndTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPop(
                tag @ (TagName::TABLE | TagName::TBODY | TagName::TFOOT | TagName::THEAD | TagName::TR),
            )) => {
                if !self.open_elements.has_element_in_table_scope(&tag) {
                    self.record_error(ParseErrorKind::StrayEndTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.close_cell();
                self.step(NodeToProcess::ReprocessCurrentNode)
            }

            _ => self.step_in_body(),
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-inselect
    fn step_in_select(&mut self) -> bool {
        match self.make_op() {
            Some(Op::Token(TokenType::Text)) => {
                if TextNodeClassification::NullSequence == self.tokenizer.text_node_classification()
                {
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                let text = self.tokenizer.get_text();
                if text.contains('\0') {
                    self.insert_text_run(&text.replace('\0', ""));
                } else {
                    self.insert_text_run(&text);
                }
                true
            }

            Some(Op::Token(TokenType::Comment)) => {
                self.insert_comment_at_appropriate_place();
                true
            }

            Some(Op::Token(TokenType::Doctype)) => {
                self.record_error(ParseErrorKind::MisplacedDoctype);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPush(TagName::HTML)) => self.step_in_body(),

            Some(Op::TagPush(TagName::OPTION)) => {
                if self.open_elements.current_node_is(&TagName::OPTION) {
                    self.pop();
                }
                self.insert_html_element(TagName::OPTION, self.tokenizer.get_attributes());
                true
            }

            Some(Op::TagPush(TagName::OPTGROUP)) => {
                if self.open_elements.current_node_is(&TagName::OPTION) {
                    self.pop();
                }
                if self.open_elements.current_node_is(&TagName::OPTGROUP) {
                    self.pop();
                }
                self.insert_html_element(TagName::OPTGROUP, self.tokenizer.get_attributes());
                true
            }

            Some(Op::TagPush(TagName::HR)) => {
                if self.open_elements.current_node_is(&TagName::OPTION) {
                    self.pop();
                }
                if self.open_elements.current_node_is(&TagName::OPTGROUP) {
                    self.pop();
                }
                self.insert_html_element_no_push(TagName::HR, self.tokenizer.get_attributes());
                true
            }

            /* > First, if the current node is an option element, and
             * > the node immediately before it in the stack of open
             * > elements is an optgroup element, then pop the current
             * > node from the stack of open elements.
             */
            Some(Op::TagPop(TagName::OPTGROUP)) => {
                if self.open_elements.current_node_is(&TagName::OPTION) {
                    let count = self.open_elements.count();
                    let below_is_optgroup = count >= 2
                        && self
                            .open_elements
                            .at(count - 2)
                            .map(|entry| TagName::OPTGROUP == entry.tag)
                            .unwrap_or(false);
                    if below_is_optgroup {
                        self.pop();
                    }
                }
                if self.open_elements.current_node_is(&TagName::OPTGROUP) {
                    self.pop();
                } else {
                    self.record_error(ParseErrorKind::StrayEndTag);
                }
                true
            }

            Some(Op::TagPop(TagName::OPTION)) => {
                if self.open_elements.current_node_is(&TagName::OPTION) {
                    self.pop();
                } else {
                    self.record_error(ParseErrorKind::StrayEndTag);
                }
                true
            }

            Some(Op::TagPop(TagName::SELECT)) => {
                if !self.open_elements.has_element_in_select_scope(&TagName::SELECT) {
                    self.record_error(ParseErrorKind::StrayEndTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.pop_until(&TagName::SELECT);
                self.reset_insertion_mode_appropriately();
                true
            }

            Some(Op::TagPush(TagName::SELECT)) => {
                self.record_error(ParseErrorKind::MisnestedTag);
                if !self.open_elements.has_element_in_select_scope(&TagName::SELECT) {
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.pop_until(&TagName::SELECT);
                self.reset_insertion_mode_appropriately();
                true
            }

            Some(Op::TagPush(TagName::INPUT | TagName::KEYGEN | TagName::TEXTAREA)) => {
                self.record_error(ParseErrorKind::MisnestedTag);
                if !self.open_elements.has_element_in_select_scope(&TagName::SELECT) {
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.pop_until(&TagName::SELECT);
                self.reset_insertion_mode_appropriately();
                self.step(NodeToProcess::ReprocessCurrentNode)
            }

            Some(Op::TagPush(TagName::SCRIPT | TagName::TEMPLATE))
            | Some(Op::TagPop(TagName::TEMPLATE)) => self.step_in_head(),

            Some(Op::TagPush(_)) => {
                self.record_error(ParseErrorKind::StrayStartTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPop(_)) => {
                self.record_error(ParseErrorKind::StrayEndTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::Token(_)) => self.step(NodeToProcess::ProcessNextNode),

            None => false,
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-inselectintable
    fn step_in_select_in_table(&mut self) -> bool {
        match self.make_op() {
            Some(Op::TagPush(
                TagName::CAPTION
                | TagName::TABLE
                | TagName::TBODY
                | TagName::TFOOT
                | TagName::THEAD
                | TagName::TR
                | TagName::TD
                | TagName::TH,
            )) => {
                self.record_error(ParseErrorKind::MisnestedTag);
                self.pop_until(&TagName::SELECT);
                self.reset_insertion_mode_appropriately();
                self.step(NodeToProcess::ReprocessCurrentNode)
            }

            Some(Op::TagPop(
                tag @ (TagName::CAPTION
                | TagName::TABLE
                | TagName::TBODY
                | TagName::TFOOT
                | TagName::THEAD
                | TagName::TR
                | TagName::TD
                | TagName::TH),
            )) => {
                self.record_error(ParseErrorKind::StrayEndTag);
                if !self.open_elements.has_element_in_table_scope(&tag) {
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.pop_until(&TagName::SELECT);
                self.reset_insertion_mode_appropriately();
                self.step(NodeToProcess::ReprocessCurrentNode)
            }

            _ => self.step_in_select(),
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-intemplate
    fn step_in_template(&mut self) -> bool {
        match self.make_op() {
            Some(Op::Token(TokenType::Text))
            | Some(Op::Token(TokenType::Comment))
            | Some(Op::Token(TokenType::Doctype)) => self.step_in_body(),

            Some(Op::TagPush(
                TagName::BASE
                | TagName::BASEFONT
                | TagName::BGSOUND
                | TagName::LINK
                | TagName::META
                | TagName::NOFRAMES
                | TagName::SCRIPT
                | TagName::STYLE
                | TagName::TEMPLATE
                | TagName::TITLE,
            ))
            | Some(Op::TagPop(TagName::TEMPLATE)) => self.step_in_head(),

            Some(Op::TagPush(
                TagName::CAPTION | TagName::COLGROUP | TagName::TBODY | TagName::TFOOT | TagName::THEAD,
            )) => self.retarget_template(InsertionMode::IN_TABLE),

            Some(Op::TagPush(TagName::COL)) => {
                self.retarget_template(InsertionMode::IN_COLUMN_GROUP)
            }

            Some(Op::TagPush(TagName::TR)) => self.retarget_template(InsertionMode::IN_TABLE_BODY),

            Some(Op::TagPush(TagName::TD | TagName::TH)) => {
                self.retarget_template(InsertionMode::IN_ROW)
            }

            Some(Op::TagPush(_)) => self.retarget_template(InsertionMode::IN_BODY),

            Some(Op::TagPop(_)) => {
                self.record_error(ParseErrorKind::StrayEndTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            _ => false,
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-afterbody
    fn step_after_body(&mut self) -> bool {
        match self.make_op() {
            Some(Op::Token(TokenType::Text))
                if TextNodeClassification::Whitespace == self.tokenizer.text_node_classification() =>
            {
                self.step_in_body()
            }

            /* > Insert a comment as the last child of the first
             * > element in the stack of open elements (the html
             * > element).
             */
            Some(Op::Token(TokenType::Comment)) => {
                self.append_comment_to_html_root();
                true
            }

            Some(Op::Token(TokenType::Doctype)) => {
                self.record_error(ParseErrorKind::MisplacedDoctype);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPush(TagName::HTML)) => self.step_in_body(),

            Some(Op::TagPop(TagName::HTML)) => {
                if self.context.is_some() {
                    self.record_error(ParseErrorKind::StrayEndTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.insertion_mode = InsertionMode::AFTER_AFTER_BODY;
                true
            }

            _ => {
                self.record_error(ParseErrorKind::MisnestedTag);
                self.insertion_mode = InsertionMode::IN_BODY;
                self.step(NodeToProcess::ReprocessCurrentNode)
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-inframeset
    fn step_in_frameset(&mut self) -> bool {
        match self.make_op() {
            Some(Op::Token(TokenType::Text)) => {
                if TextNodeClassification::Whitespace == self.tokenizer.text_node_classification() {
                    let text = self.tokenizer.get_text();
                    self.insert_text_run(&text);
                    return true;
                }
                self.record_error(ParseErrorKind::MisnestedTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::Token(TokenType::Comment)) => {
                self.insert_comment_at_appropriate_place();
                true
            }

            Some(Op::Token(TokenType::Doctype)) => {
                self.record_error(ParseErrorKind::MisplacedDoctype);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPush(TagName::HTML)) => self.step_in_body(),

            Some(Op::TagPush(TagName::FRAMESET)) => {
                self.insert_html_element(TagName::FRAMESET, self.tokenizer.get_attributes());
                true
            }

            Some(Op::TagPop(TagName::FRAMESET)) => {
                /* > If the current node is the root html element, then
                 * > this is a parse error; ignore the token. (fragment
                 * > case)
                 */
                if self.open_elements.count() <= 1 {
                    self.record_error(ParseErrorKind::StrayEndTag);
                    return self.step(NodeToProcess::ProcessNextNode);
                }
                self.pop();
                if self.context.is_none()
                    && !self.open_elements.current_node_is(&TagName::FRAMESET)
                {
                    self.insertion_mode = InsertionMode::AFTER_FRAMESET;
                }
                true
            }

            Some(Op::TagPush(TagName::FRAME)) => {
                self.insert_html_element_no_push(TagName::FRAME, self.tokenizer.get_attributes());
                true
            }

            Some(Op::TagPush(TagName::NOFRAMES)) => self.step_in_head(),

            Some(Op::TagPush(_)) => {
                self.record_error(ParseErrorKind::StrayStartTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPop(_)) => {
                self.record_error(ParseErrorKind::StrayEndTag);
                self.step(NodeToProcess::ProcessNextNode)
            }

            _ => self.step(NodeToProcess::ProcessNextNode),
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-afterframeset
    fn step_after_frameset(&mut self) -> bool {
        match self.make_op() {
            Some(Op::Token(TokenType::Text))
                if TextNodeClassification::Whitespace == self.tokenizer.text_node_classification() =>
            {
                let text = self.tokenizer.get_text();
                self.insert_text_run(&text);
                true
            }

            Some(Op::Token(TokenType::Comment)) => {
                self.insert_comment_at_appropriate_place();
                true
            }

            Some(Op::Token(TokenType::Doctype)) => {
                self.record_error(ParseErrorKind::MisplacedDoctype);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPush(TagName::HTML)) => self.step_in_body(),

            Some(Op::TagPop(TagName::HTML)) => {
                self.insertion_mode = InsertionMode::AFTER_AFTER_FRAMESET;
                true
            }

            Some(Op::TagPush(TagName::NOFRAMES)) => self.step_in_head(),

            _ => {
                self.record_error(ParseErrorKind::StrayEndTag);
                self.step(NodeToProcess::ProcessNextNode)
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#the-after-after-body-insertion-mode
    fn step_after_after_body(&mut self) -> bool {
        match self.make_op() {
            Some(Op::Token(TokenType::Comment)) => {
                self.append_comment_to_document();
                true
            }

            Some(Op::Token(TokenType::Doctype)) | Some(Op::TagPush(TagName::HTML)) => {
                self.step_in_body()
            }

            Some(Op::Token(TokenType::Text))
                if TextNodeClassification::Whitespace == self.tokenizer.text_node_classification() =>
            {
                self.step_in_body()
            }

            _ => {
                self.record_error(ParseErrorKind::MisnestedTag);
                self.insertion_mode = InsertionMode::IN_BODY;
                self.step(NodeToProcess::ReprocessCurrentNode)
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#the-after-after-frameset-insertion-mode
    fn step_after_after_frameset(&mut self) -> bool {
        match self.make_op() {
            Some(Op::Token(TokenType::Comment)) => {
                self.append_comment_to_document();
                true
            }

            Some(Op::Token(TokenType::Doctype)) | Some(Op::TagPush(TagName::HTML)) => {
                self.step_in_body()
            }

            Some(Op::Token(TokenType::Text))
                if TextNodeClassification::Whitespace == self.tokenizer.text_node_classification() =>
            {
                self.step_in_body()
            }

            Some(Op::TagPush(TagName::NOFRAMES)) => self.step_in_head(),

            _ => {
                self.record_error(ParseErrorKind::StrayEndTag);
                self.step(NodeToProcess::ProcessNextNode)
            }
        }
    }

    /// @see https://html.spec.whatwg.org/#parsing-main-inforeign
    fn step_in_foreign_content(&mut self) -> bool {
        match self.make_op() {
            Some(Op::Token(TokenType::Text)) => {
                /* > Any character token that is not U+0000 NULL or
                 * > ASCII whitespace: set the frameset-ok flag to "not
                 * > ok".
                 */
                if TextNodeClassification::Whitespace != self.tokenizer.text_node_classification() {
                    self.frameset_ok = false;
                }
                let text = self.tokenizer.get_text();
                if text.contains('\0') {
                    self.insert_text_run(&text.replace('\0', "\u{FFFD}"));
                } else {
                    self.insert_text_run(&text);
                }
                true
            }

            Some(Op::Token(TokenType::CdataSection)) => {
                let text = self.tokenizer.get_text();
                self.insert_text_run(&text);
                true
            }

            Some(Op::Token(TokenType::Comment)) => {
                self.insert_comment_at_appropriate_place();
                true
            }

            Some(Op::Token(TokenType::Doctype)) => {
                self.record_error(ParseErrorKind::MisplacedDoctype);
                self.step(NodeToProcess::ProcessNextNode)
            }

            Some(Op::TagPop(TagName::BR | TagName::P)) => self.break_out_of_foreign_content(),

            Some(Op::TagPush(tag)) => {
                let attributes = self.tokenizer.get_attributes();

                /* > A start tag whose tag name is one of: "b", "big",
                 * > "blockquote", "body", "br", "center", "code",
                 * > "dd", "div", "dl", "dt", "em", "embed", "h1",
                 * > "h2", "h3", "h4", "h5", "h6", "head", "hr", "i",
                 * > "img", "li", "listing", "menu", "meta", "nobr",
                 * > "ol", "p", "pre", "ruby", "s", "small", "span",
                 * > "strong", "strike", "sub", "sup", "table", "tt",
                 * > "u", "ul", "var", ... or "font", if the token has
                 * > any attributes named "color", "face", or "size"
                 */
                let breaks_out = matches!(
                    tag,
                    TagName::B
                        | TagName::BIG
                        | TagName::BLOCKQUOTE
                        | TagName::BODY
                        | TagName::BR
                        | TagName::CENTER
                        | TagName::CODE
                        | TagName::DD
                        | TagName::DIV
                        | TagName::DL
                        | TagName::DT
                        | TagName::EM
                        | TagName::EMBED
                        | TagName::H1
                        | TagName::H2
                        | TagName::H3
                        | TagName::H4
                        | TagName::H5
                        | TagName::H6
                        | TagName::HEAD
                        | TagName::HR
                        | TagName::I
                        | TagName::IMG
                        | TagName::LI
                        | TagName::LISTING
                        | TagName::MENU
                        | TagName::META
                        | TagName::NOBR
                        | TagName::OL
                        | TagName::P
                        | TagName::PRE
                        | TagName::RUBY
                        | TagName::S
                        | TagName::SMALL
                        | TagName::SPAN
                        | TagName::STRONG
                        | TagName::STRIKE
                        | TagName::SUB
                        | TagName::SUP
                        | TagName::TABLE
                        | TagName::TT
                        | TagName::U
                        | TagName::UL
                        | TagName::VAR
                ) || (TagName::FONT == tag
                    && attributes.iter().any(|attribute| {
                        matches!(&*attribute.name, b"color" | b"face" | b"size")
                    }));

                if breaks_out {
                    return self.break_out_of_foreign_content();
                }

                let namespace = self
                    .adjusted_current_node()
                    .map(|entry| entry.namespace)
                    .unwrap_or(Namespace::Html);
                let mut attributes = attributes;
                match namespace {
                    Namespace::MathMl => adjust_mathml_attributes(&mut attributes),
                    Namespace::Svg => adjust_svg_attributes(&mut attributes),
                    Namespace::Html => {}
                }
                self.insert_foreign_element(tag, namespace, attributes);
                if self.tokenizer.has_self_closing_flag() {
                    self.pop();
                }
                true
            }

            Some(Op::TagPop(tag)) => {
                if !self
                    .open_elements
                    .current_node()
                    .map(|entry| entry.tag == tag)
                    .unwrap_or(false)
                {
                    self.record_error(ParseErrorKind::MisnestedTag);
                }

                let mut index = self.open_elements.count().saturating_sub(1);
                loop {
                    /* > If node is the topmost element in the stack of
                     * > open elements, then return. (fragment case)
                     */
                    if index == 0 {
                        return self.step(NodeToProcess::ProcessNextNode);
                    }

                    if self
                        .open_elements
                        .at(index)
                        .map(|entry| entry.tag == tag)
                        .unwrap_or(false)
                    {
                        while self.open_elements.count() > index {
                            self.pop();
                        }
                        return true;
                    }

                    index -= 1;
                    /* > If node is an HTML element, process the token
                     * > according to the rules given in the section
                     * > corresponding to the current insertion mode in
                     * > HTML content.
                     */
                    if self
                        .open_elements
                        .at(index)
                        .map(|entry| Namespace::Html == entry.namespace)
                        .unwrap_or(true)
                    {
                        return self.step_in_current_insertion_mode();
                    }
                }
            }

            _ => false,
        }
    }

    /// > Parse error. While the current node is not a MathML text
    /// > integration point, an HTML integration point, or an element
    /// > in the HTML namespace, pop elements from the stack of open
    /// > elements. Then, reprocess the token.
    fn break_out_of_foreign_content(&mut self) -> bool {
        self.record_error(ParseErrorKind::MisnestedTag);
        while let Some(current) = self.open_elements.current_node() {
            if Namespace::Html == current.namespace || current.integration_point.is_some() {
                break;
            }
            self.pop();
        }
        self.step(NodeToProcess::ReprocessCurrentNode)
    }

    /*
     * Element insertion.
     */

    /// Finds the parent (and optional following sibling) where a new
    /// node belongs, honoring foster parenting when it is enabled and
    /// the target is a table element.
    ///
    /// @see https://html.spec.whatwg.org/#appropriate-place-for-inserting-a-node
    fn appropriate_place(&self, override_index: Option<usize>) -> (NodeId, Option<NodeId>) {
        let target_index = override_index.unwrap_or_else(|| self.open_elements.count().saturating_sub(1));
        let Some(target) = self.open_elements.at(target_index) else {
            return (self.document.root(), None);
        };

        if self.foster_parenting
            && Namespace::Html == target.namespace
            && matches!(
                target.tag,
                TagName::TABLE | TagName::TBODY | TagName::TFOOT | TagName::THEAD | TagName::TR
            )
        {
            let mut last_template = None;
            let mut last_table = None;
            for index in 0..self.open_elements.count() {
                let Some(entry) = self.open_elements.at(index) else {
                    continue;
                };
                if Namespace::Html != entry.namespace {
                    continue;
                }
                match entry.tag {
                    TagName::TEMPLATE => last_template = Some((index, entry.node)),
                    TagName::TABLE => last_table = Some((index, entry.node)),
                    _ => {}
                }
            }

            return match (last_template, last_table) {
                /* > If there is a last template and either there is no
                 * > last table, or there is one, but last template is
                 * > lower (more recently added) than last table ...
                 * > let adjusted insertion location be inside last
                 * > template's template contents.
                 */
                (Some((_, template)), None) => (template, None),
                (Some((template_index, template)), Some((table_index, _)))
                    if template_index > table_index =>
                {
                    (template, None)
                }

                (_, None) => (
                    self.open_elements
                        .at(0)
                        .map(|entry| entry.node)
                        .unwrap_or_else(|| self.document.root()),
                    None,
                ),

                /* > If last table has a parent node, then let adjusted
                 * > insertion location be inside last table's parent
                 * > node, immediately before last table.
                 */
                (_, Some((table_index, table))) => match self.document.parent(table) {
                    Some(parent) => (parent, Some(table)),
                    None => (
                        self.open_elements
                            .at(table_index.saturating_sub(1))
                            .map(|entry| entry.node)
                            .unwrap_or_else(|| self.document.root()),
                        None,
                    ),
                },
            };
        }

        (target.node, None)
    }

    fn insert_node_at_appropriate_place(&mut self, node: NodeId) {
        if self.open_elements.count() == 0 {
            let root = self.document.root();
            self.document.append_child(root, node);
            return;
        }
        let (parent, before) = self.appropriate_place(None);
        match before {
            Some(reference) => self.document.insert_before(parent, reference, node),
            None => self.document.append_child(parent, node),
        }
    }

    fn insert_html_element(&mut self, tag: TagName, attributes: Vec<Attribute>) -> NodeId {
        self.insert_foreign_element(tag, Namespace::Html, attributes)
    }

    /// Inserts a node for an element that can never have contents, so
    /// it never joins the stack of open elements.
    fn insert_html_element_no_push(&mut self, tag: TagName, attributes: Vec<Attribute>) -> NodeId {
        let node = self.document.create_element(tag, Namespace::Html, attributes);
        self.insert_node_at_appropriate_place(node);
        node
    }

    fn insert_foreign_element(
        &mut self,
        tag: TagName,
        namespace: Namespace,
        attributes: Vec<Attribute>,
    ) -> NodeId {
        let integration_point = integration_point_for(namespace, &tag, &attributes);
        let node = self.document.create_element(tag.clone(), namespace, attributes);
        self.insert_node_at_appropriate_place(node);
        self.push_open(OpenElement {
            node,
            tag,
            namespace,
            integration_point,
        });
        node
    }

    fn insert_text_run(&mut self, text: &str) {
        if text.is_empty() || self.open_elements.count() == 0 {
            return;
        }
        let (parent, before) = self.appropriate_place(None);
        self.document.insert_text(parent, before, text);
    }

    fn insert_comment_at_appropriate_place(&mut self) {
        let text = self.tokenizer.get_text();
        let node = self.document.create_comment(text);
        if self.open_elements.count() == 0 {
            let root = self.document.root();
            self.document.append_child(root, node);
            return;
        }
        let (parent, before) = self.appropriate_place(None);
        match before {
            Some(reference) => self.document.insert_before(parent, reference, node),
            None => self.document.append_child(parent, node),
        }
    }

    fn append_comment_to_document(&mut self) {
        let text = self.tokenizer.get_text();
        let node = self.document.create_comment(text);
        let root = self.document.root();
        self.document.append_child(root, node);
    }

    fn append_comment_to_html_root(&mut self) {
        let text = self.tokenizer.get_text();
        let node = self.document.create_comment(text);
        match self.open_elements.at(0).map(|entry| entry.node) {
            Some(html) => self.document.append_child(html, node),
            None => {
                let root = self.document.root();
                self.document.append_child(root, node);
            }
        }
    }

    fn synthesize_html_element(&mut self) {
        let root = self.document.root();
        let node = self
            .document
            .create_element(TagName::HTML, Namespace::Html, Vec::new());
        self.document.append_child(root, node);
        self.push_open(OpenElement {
            node,
            tag: TagName::HTML,
            namespace: Namespace::Html,
            integration_point: None,
        });
    }

    /// Opens a text region: inserts the element, tells the tokenizer
    /// to treat everything up to the matching closer as text, and
    /// parks the current mode until that closer arrives.
    fn parse_generic_text(&mut self, tag: TagName, model: ContentModel) {
        let attributes = self.tokenizer.get_attributes();
        let closer = tag.clone();
        self.insert_html_element(tag, attributes);
        self.tokenizer.set_content_model(model, Some(closer));
        self.original_insertion_mode = self.insertion_mode;
        self.insertion_mode = InsertionMode::TEXT;
    }

    fn merge_attributes_into(&mut self, node: NodeId, attributes: Vec<Attribute>) {
        let Some(element) = self.document.element_mut(node) else {
            return;
        };
        for attribute in attributes {
            let already_present = element
                .attributes
                .iter()
                .any(|existing| existing.name == attribute.name);
            if !already_present {
                element.attributes.push(attribute);
            }
        }
    }

    /*
     * Stack maintenance.
     */

    fn push_open(&mut self, element: OpenElement) {
        self.open_elements.push(element);
        self.sync_tokenizer_namespace();
    }

    fn pop(&mut self) -> Option<OpenElement> {
        let popped = self.open_elements.pop();
        self.sync_tokenizer_namespace();
        popped
    }

    /// The tokenizer needs to know whether it is inside foreign
    /// content, because CDATA sections only exist there.
    fn sync_tokenizer_namespace(&mut self) {
        let namespace = self
            .adjusted_current_node()
            .map(|entry| entry.namespace)
            .unwrap_or(Namespace::Html);
        self.tokenizer.set_parsing_namespace(namespace);
    }

    fn pop_until(&mut self, tag: &TagName) {
        while let Some(popped) = self.pop() {
            if Namespace::Html == popped.namespace && popped.tag == *tag {
                return;
            }
        }
    }

    fn remove_node_from_stack(&mut self, node: NodeId) {
        if let Some(index) = self.open_elements.index_of(node) {
            self.open_elements.remove_at(index);
            self.sync_tokenizer_namespace();
        }
    }

    /// @see https://html.spec.whatwg.org/#generate-implied-end-tags
    fn generate_implied_end_tags(&mut self, except: Option<&TagName>) {
        loop {
            let should_pop = self
                .open_elements
                .current_node()
                .map(|entry| {
                    Namespace::Html == entry.namespace
                        && Some(&entry.tag) != except
                        && matches!(
                            entry.tag,
                            TagName::DD
                                | TagName::DT
                                | TagName::LI
                                | TagName::OPTGROUP
                                | TagName::OPTION
                                | TagName::P
                                | TagName::RB
                                | TagName::RP
                                | TagName::RT
                                | TagName::RTC
                        )
                })
                .unwrap_or(false);
            if !should_pop {
                return;
            }
            self.pop();
        }
    }

    /// @see https://html.spec.whatwg.org/#generate-all-implied-end-tags-thoroughly
    fn generate_implied_end_tags_thoroughly(&mut self) {
        loop {
            let should_pop = self
                .open_elements
                .current_node()
                .map(|entry| {
                    Namespace::Html == entry.namespace
                        && matches!(
                            entry.tag,
                            TagName::CAPTION
                                | TagName::COLGROUP
                                | TagName::DD
                                | TagName::DT
                                | TagName::LI
                                | TagName::OPTGROUP
                                | TagName::OPTION
                                | TagName::P
                                | TagName::RB
                                | TagName::RP
                                | TagName::RT
                                | TagName::RTC
                                | TagName::TBODY
                                | TagName::TD
                                | TagName::TFOOT
                                | TagName::TH
                                | TagName::THEAD
                                | TagName::TR
                        )
                })
                .unwrap_or(false);
            if !should_pop {
                return;
            }
            self.pop();
        }
    }

    /// @see https://html.spec.whatwg.org/#close-a-p-element
    fn close_a_p_element(&mut self) {
        self.generate_implied_end_tags(Some(&TagName::P));
        if !self.open_elements.current_node_is(&TagName::P) {
            self.record_error(ParseErrorKind::MisnestedTag);
        }
        self.pop_until(&TagName::P);
    }

    /// @see https://html.spec.whatwg.org/#close-the-cell
    fn close_cell(&mut self) {
        self.generate_implied_end_tags(None);
        let current_is_cell = self.open_elements.current_node_is(&TagName::TD)
            || self.open_elements.current_node_is(&TagName::TH);
        if !current_is_cell {
            self.record_error(ParseErrorKind::MisnestedTag);
        }
        while let Some(popped) = self.pop() {
            if Namespace::Html == popped.namespace
                && matches!(popped.tag, TagName::TD | TagName::TH)
            {
                break;
            }
        }
        self.active_formatting_elements.clear_up_to_last_marker();
        self.insertion_mode = InsertionMode::IN_ROW;
    }

    fn close_caption(&mut self) -> bool {
        if !self.open_elements.has_element_in_table_scope(&TagName::CAPTION) {
            self.record_error(ParseErrorKind::StrayEndTag);
            return false;
        }
        self.generate_implied_end_tags(None);
        if !self.open_elements.current_node_is(&TagName::CAPTION) {
            self.record_error(ParseErrorKind::MisnestedTag);
        }
        self.pop_until(&TagName::CAPTION);
        self.active_formatting_elements.clear_up_to_last_marker();
        self.insertion_mode = InsertionMode::IN_TABLE;
        true
    }

    /// Shared handling for a `</template>` end tag.
    fn closed_template(&mut self) -> bool {
        if !self.open_elements.contains(&TagName::TEMPLATE) {
            self.record_error(ParseErrorKind::StrayEndTag);
            return self.step(NodeToProcess::ProcessNextNode);
        }
        self.generate_implied_end_tags_thoroughly();
        if !self.open_elements.current_node_is(&TagName::TEMPLATE) {
            self.record_error(ParseErrorKind::MisnestedTag);
        }
        self.pop_until(&TagName::TEMPLATE);
        self.active_formatting_elements.clear_up_to_last_marker();
        self.template_insertion_modes.pop();
        self.reset_insertion_mode_appropriately();
        true
    }

    /// > Pop the current template insertion mode off the stack of
    /// > template insertion modes. Push the given mode onto the stack
    /// > ... switch the insertion mode, and reprocess the token.
    fn retarget_template(&mut self, mode: InsertionMode) -> bool {
        self.template_insertion_modes.pop();
        self.template_insertion_modes.push(mode);
        self.insertion_mode = mode;
        self.step(NodeToProcess::ReprocessCurrentNode)
    }

    /// > Clear the stack back to a table context: pop elements from
    /// > the stack of open elements until a table, template, or html
    /// > element has been popped from the stack. (Seen from below, it
    /// > is the current node that must become one of those.)
    fn clear_stack_to_table_context(&mut self) {
        while let Some(current) = self.open_elements.current_node() {
            if Namespace::Html == current.namespace
                && matches!(current.tag, TagName::TABLE | TagName::TEMPLATE | TagName::HTML)
            {
                return;
            }
            self.pop();
        }
    }

    fn clear_stack_to_table_body_context(&mut self) {
        while let Some(current) = self.open_elements.current_node() {
            if Namespace::Html == current.namespace
                && matches!(
                    current.tag,
                    TagName::TBODY
                        | TagName::TFOOT
                        | TagName::THEAD
                        | TagName::TEMPLATE
                        | TagName::HTML
                )
            {
                return;
            }
            self.pop();
        }
    }

    fn clear_stack_to_table_row_context(&mut self) {
        while let Some(current) = self.open_elements.current_node() {
            if Namespace::Html == current.namespace
                && matches!(current.tag, TagName::TR | TagName::TEMPLATE | TagName::HTML)
            {
                return;
            }
            self.pop();
        }
    }

    /// @see https://html.spec.whatwg.org/#reset-the-insertion-mode-appropriately
    fn reset_insertion_mode_appropriately(&mut self) {
        let count = self.open_elements.count();
        for index in (0..count).rev() {
            let last = index == 0;
            let entry = if last {
                match &self.context {
                    Some(context) => context.clone(),
                    None => match self.open_elements.at(index) {
                        Some(entry) => entry.clone(),
                        None => break,
                    },
                }
            } else {
                match self.open_elements.at(index) {
                    Some(entry) => entry.clone(),
                    None => break,
                }
            };

            if Namespace::Html != entry.namespace {
                if last {
                    break;
                }
                continue;
            }

            match entry.tag {
                TagName::SELECT => {
                    /* > If last is true, jump to the step below labeled
                     * > done. Let ancestor be node. ... If ancestor is a
                     * > template node, jump to the step below labeled
                     * > done. If ancestor is a table node, switch the
                     * > insertion mode to "in select in table" and
                     * > return.
                     */
                    if !last {
                        for ancestor_index in (0..index).rev() {
                            let Some(ancestor) = self.open_elements.at(ancestor_index) else {
                                break;
                            };
                            if Namespace::Html != ancestor.namespace {
                                continue;
                            }
                            if TagName::TEMPLATE == ancestor.tag {
                                break;
                            }
                            if TagName::TABLE == ancestor.tag {
                                self.insertion_mode = InsertionMode::IN_SELECT_IN_TABLE;
                                return;
                            }
                        }
                    }
                    self.insertion_mode = InsertionMode::IN_SELECT;
                    return;
                }
                TagName::TD | TagName::TH if !last => {
                    self.insertion_mode = InsertionMode::IN_CELL;
                    return;
                }
                TagName::TR => {
                    self.insertion_mode = InsertionMode::IN_ROW;
                    return;
                }
                TagName::TBODY | TagName::THEAD | TagName::TFOOT => {
                    self.insertion_mode = InsertionMode::IN_TABLE_BODY;
                    return;
                }
                TagName::CAPTION => {
                    self.insertion_mode = InsertionMode::IN_CAPTION;
                    return;
                }
                TagName::COLGROUP => {
                    self.insertion_mode = InsertionMode::IN_COLUMN_GROUP;
                    return;
                }
                TagName::TABLE => {
                    self.insertion_mode = InsertionMode::IN_TABLE;
                    return;
                }
                TagName::TEMPLATE => {
                    if let Some(&mode) = self.template_insertion_modes.last() {
                        self.insertion_mode = mode;
                        return;
                    }
                }
                TagName::HEAD if !last => {
                    self.insertion_mode = InsertionMode::IN_HEAD;
                    return;
                }
                TagName::BODY => {
                    self.insertion_mode = InsertionMode::IN_BODY;
                    return;
                }
                TagName::FRAMESET => {
                    self.insertion_mode = InsertionMode::IN_FRAMESET;
                    return;
                }
                TagName::HTML => {
                    self.insertion_mode = match self.head_element {
                        None => InsertionMode::BEFORE_HEAD,
                        Some(_) => InsertionMode::AFTER_HEAD,
                    };
                    return;
                }
                _ => {}
            }

            if last {
                break;
            }
        }

        self.insertion_mode = InsertionMode::IN_BODY;
    }

    /*
     * Misnesting repair.
     */

    /// @see https://html.spec.whatwg.org/#reconstruct-the-active-formatting-elements
    fn reconstruct_active_formatting_elements(&mut self) {
        let count = self.active_formatting_elements.count();
        if count == 0 {
            return;
        }

        /* > If the last (most recently added) entry in the list of
         * > active formatting elements is a marker, or if it is an
         * > element that is in the stack of open elements, then there
         * > is nothing to reconstruct; stop this algorithm.
         */
        match self.active_formatting_elements.last() {
            None | Some(FormattingEntry::Marker) => return,
            Some(FormattingEntry::Element { node, .. }) => {
                if self.open_elements.contains_node(*node) {
                    return;
                }
            }
        }

        /* > Rewind: ... let entry be the entry one earlier than entry
         * > in the list. ... If entry is neither a marker nor an
         * > element that is also in the stack of open elements, go to
         * > the step labeled rewind.
         */
        let mut entry_index = count - 1;
        while entry_index > 0 {
            let stop = match self.active_formatting_elements.at(entry_index - 1) {
                None | Some(FormattingEntry::Marker) => true,
                Some(FormattingEntry::Element { node, .. }) => {
                    self.open_elements.contains_node(*node)
                }
            };
            if stop {
                break;
            }
            entry_index -= 1;
        }

        /* > Create: insert an HTML element for the token for which the
         * > element entry was created, to obtain new element. Replace
         * > the entry for entry in the list with an entry for new
         * > element. ... Advance.
         */
        for index in entry_index..count {
            if !self.spend_budget() {
                return;
            }
            let (tag, attributes) = match self.active_formatting_elements.at(index) {
                Some(FormattingEntry::Element { tag, attributes, .. }) => {
                    (tag.clone(), attributes.clone())
                }
                _ => continue,
            };
            let node = self
                .document
                .create_element(tag.clone(), Namespace::Html, attributes.clone());
            self.insert_node_at_appropriate_place(node);
            self.push_open(OpenElement {
                node,
                tag: tag.clone(),
                namespace: Namespace::Html,
                integration_point: None,
            });
            self.active_formatting_elements
                .replace_at(index, FormattingEntry::Element { node, tag, attributes });
        }
    }

    /// The adoption agency algorithm, which repairs misnested
    /// formatting elements such as `<b>1<i>2</b>3</i>` by cloning the
    /// formatting elements around the content they should wrap.
    ///
    /// @see https://html.spec.whatwg.org/#adoption-agency-algorithm
    fn run_adoption_agency_algorithm(&mut self, subject: &TagName) -> AdoptionResult {
        /* > If the current node is an HTML element whose tag name is
         * > subject, and the current node is not in the list of active
         * > formatting elements, then pop the current node off the
         * > stack of open elements and return.
         */
        if let Some(current) = self.open_elements.current_node() {
            if Namespace::Html == current.namespace
                && current.tag == *subject
                && !self.active_formatting_elements.contains_node(current.node)
            {
                self.pop();
                return AdoptionResult::Handled;
            }
        }

        /* > Let outer loop counter be 0. While outer loop counter is
         * > less than 8 ...
         */
        for _outer in 0..8 {
            if !self.spend_budget() {
                return AdoptionResult::Handled;
            }

            /* > Let formatting element be the last element in the list
             * > of active formatting elements that is between the end
             * > of the list and the last marker in the list, if any,
             * > and has the tag name subject.
             */
            let Some(mut formatting_index) = self
                .active_formatting_elements
                .find_after_last_marker(subject)
            else {
                return AdoptionResult::AnyOtherEndTag;
            };
            let (formatting_node, formatting_tag, formatting_attributes) =
                match self.active_formatting_elements.at(formatting_index) {
                    Some(FormattingEntry::Element {
                        node,
                        tag,
                        attributes,
                    }) => (*node, tag.clone(), attributes.clone()),
                    _ => return AdoptionResult::Handled,
                };

            /* > If formatting element is not in the stack of open
             * > elements, then this is a parse error; remove the
             * > element from the list, and return.
             */
            let Some(stack_index) = self.open_elements.index_of(formatting_node) else {
                self.record_error(ParseErrorKind::MisnestedTag);
                self.active_formatting_elements.remove_at(formatting_index);
                return AdoptionResult::Handled;
            };

            /* > If formatting element is in the stack of open elements,
             * > but the element is not in scope, then this is a parse
             * > error; return.
             */
            if !self.open_elements.has_node_in_scope(formatting_node) {
                self.record_error(ParseErrorKind::MisnestedTag);
                return AdoptionResult::Handled;
            }

            /* > If formatting element is not the current node, this is
             * > a parse error. (But do not return.)
             */
            if stack_index != self.open_elements.count() - 1 {
                self.record_error(ParseErrorKind::MisnestedTag);
            }

            /* > Let furthest block be the topmost node in the stack of
             * > open elements that is lower in the stack than
             * > formatting element, and is an element in the special
             * > category. There might not be one.
             */
            let furthest_index = (stack_index + 1..self.open_elements.count()).find(|&index| {
                self.open_elements
                    .at(index)
                    .map(|entry| entry.tag.is_special())
                    .unwrap_or(false)
            });

            /* > If there is no furthest block, then the UA must first
             * > pop all the nodes from the bottom of the stack of open
             * > elements, from the current node up to and including
             * > formatting element, then remove formatting element
             * > from the list of active formatting elements, and
             * > finally return.
             */
            let Some(furthest_index) = furthest_index else {
                while self.open_elements.count() > stack_index {
                    self.pop();
                }
                self.active_formatting_elements.remove_at(formatting_index);
                return AdoptionResult::Handled;
            };
            let furthest_block = match self.open_elements.at(furthest_index) {
                Some(entry) => entry.node,
                None => return AdoptionResult::Handled,
            };

            /* > Let common ancestor be the element immediately above
             * > formatting element in the stack of open elements.
             */
            let common_ancestor = self
                .open_elements
                .at(stack_index.saturating_sub(1))
                .map(|entry| entry.node);

            /* > Let a bookmark note the position of formatting element
             * > in the list of active formatting elements relative to
             * > the elements on either side of it in the list.
             */
            let mut bookmark = formatting_index;

            let mut node_index = furthest_index;
            let mut last_node = furthest_block;

            /* > Let inner loop counter be 0. While true: increment
             * > inner loop counter by 1 ...
             */
            let mut inner = 0;
            loop {
                inner += 1;
                if !self.spend_budget() {
                    return AdoptionResult::Handled;
                }

                node_index -= 1;
                let node_entry = match self.open_elements.at(node_index) {
                    Some(entry) => entry.clone(),
                    None => break,
                };

                /* > If node is formatting element, then break. */
                if node_entry.node == formatting_node {
                    break;
                }

                let mut node_formatting_index =
                    self.active_formatting_elements.index_of_node(node_entry.node);

                /* > If inner loop counter is greater than 3 and node is
                 * > in the list of active formatting elements, then
                 * > remove node from the list.
                 */
                if inner > 3 {
                    if let Some(index) = node_formatting_index {
                        self.active_formatting_elements.remove_at(index);
                        if index < bookmark {
                            bookmark -= 1;
                        }
                        if index < formatting_index {
                            formatting_index -= 1;
                        }
                        node_formatting_index = None;
                    }
                }

                /* > If node is not in the list of active formatting
                 * > elements, then remove node from the stack of open
                 * > elements and continue.
                 */
                let Some(node_formatting_index) = node_formatting_index else {
                    self.open_elements.remove_at(node_index);
                    continue;
                };

                /* > Create an element for the token for which the
                 * > element node was created ... replace the entry for
                 * > node in the list of active formatting elements with
                 * > an entry for the new element, replace the entry for
                 * > node in the stack of open elements with an entry
                 * > for the new element, and let node be the new
                 * > element.
                 */
                let attributes = match self.active_formatting_elements.at(node_formatting_index) {
                    Some(FormattingEntry::Element { attributes, .. }) => attributes.clone(),
                    _ => Vec::new(),
                };
                let clone = self.document.create_element(
                    node_entry.tag.clone(),
                    node_entry.namespace,
                    attributes.clone(),
                );
                self.active_formatting_elements.replace_at(
                    node_formatting_index,
                    FormattingEntry::Element {
                        node: clone,
                        tag: node_entry.tag.clone(),
                        attributes,
                    },
                );
                self.open_elements.replace_at(
                    node_index,
                    OpenElement {
                        node: clone,
                        tag: node_entry.tag.clone(),
                        namespace: node_entry.namespace,
                        integration_point: node_entry.integration_point,
                    },
                );

                /* > If last node is furthest block, then move the
                 * > aforementioned bookmark to be immediately after the
                 * > new element in the list of active formatting
                 * > elements.
                 */
                if last_node == furthest_block {
                    bookmark = node_formatting_index + 1;
                }

                /* > Append last node to node. */
                self.document.append_child(clone, last_node);
                last_node = clone;
            }

            /* > Insert whatever last node ended up being in the
             * > previous step at the appropriate place for inserting a
             * > node, but using common ancestor as the override target.
             */
            self.document.detach(last_node);
            let ancestor_index = common_ancestor.and_then(|node| self.open_elements.index_of(node));
            let (parent, before) = self.appropriate_place(ancestor_index);
            match before {
                Some(reference) => self.document.insert_before(parent, reference, last_node),
                None => self.document.append_child(parent, last_node),
            }

            /* > Create an element for the token for which formatting
             * > element was created ... take all of the child nodes of
             * > furthest block and append them to the element created
             * > in the last step, then append that new element to
             * > furthest block.
             */
            let new_formatting = self.document.create_element(
                formatting_tag.clone(),
                Namespace::Html,
                formatting_attributes.clone(),
            );
            self.document.move_children(furthest_block, new_formatting);
            self.document.append_child(furthest_block, new_formatting);

            /* > Remove formatting element from the list of active
             * > formatting elements, and insert the new element into
             * > the list ... at the position of the aforementioned
             * > bookmark.
             */
            self.active_formatting_elements.remove_at(formatting_index);
            if formatting_index < bookmark {
                bookmark -= 1;
            }
            let bookmark = bookmark.min(self.active_formatting_elements.count());
            self.active_formatting_elements.insert_at(
                bookmark,
                FormattingEntry::Element {
                    node: new_formatting,
                    tag: formatting_tag.clone(),
                    attributes: formatting_attributes,
                },
            );

            /* > Remove formatting element from the stack of open
             * > elements, and insert the new element into the stack of
             * > open elements immediately below the position of
             * > furthest block in that stack.
             */
            if let Some(index) = self.open_elements.index_of(formatting_node) {
                self.open_elements.remove_at(index);
            }
            if let Some(index) = self.open_elements.index_of(furthest_block) {
                self.open_elements.insert_at(
                    index + 1,
                    OpenElement {
                        node: new_formatting,
                        tag: formatting_tag,
                        namespace: Namespace::Html,
                        integration_point: None,
                    },
                );
            }
            self.sync_tokenizer_namespace();
        }

        AdoptionResult::Handled
    }

    /// > Any other end tag: run these steps: initialize node to be the
    /// > current node. Loop through the stack of open elements.
    fn any_other_end_tag(&mut self, tag: &TagName) -> bool {
        for index in (0..self.open_elements.count()).rev() {
            let Some(entry) = self.open_elements.at(index) else {
                break;
            };

            if Namespace::Html == entry.namespace && entry.tag == *tag {
                self.generate_implied_end_tags(Some(tag));
                if index != self.open_elements.count() - 1 {
                    self.record_error(ParseErrorKind::MisnestedTag);
                }
                while self.open_elements.count() > index {
                    self.pop();
                }
                return true;
            }

            /* > Otherwise, if node is in the special category, then
             * > this is a parse error; ignore the token, and return.
             */
            if Namespace::Html == entry.namespace && entry.tag.is_special() {
                self.record_error(ParseErrorKind::StrayEndTag);
                return self.step(NodeToProcess::ProcessNextNode);
            }
        }
        self.step(NodeToProcess::ProcessNextNode)
    }

    fn foster_parented_in_body(&mut self) -> bool {
        self.foster_parenting = true;
        let result = self.step_in_body();
        self.foster_parenting = false;
        result
    }

    /*
     * End of input.
     */

    /// Runs the end-of-file rules for whichever insertion mode the
    /// parse stopped in, synthesizing the implied document structure
    /// and reporting elements left open.
    fn finish_eof(&mut self) {
        loop {
            match self.insertion_mode {
                InsertionMode::INITIAL => {
                    self.record_error(ParseErrorKind::MissingDoctype);
                    self.set_compatibility_mode(QuirksMode::Quirks);
                    self.insertion_mode = InsertionMode::BEFORE_HTML;
                }

                InsertionMode::BEFORE_HTML => {
                    self.synthesize_html_element();
                    self.insertion_mode = InsertionMode::BEFORE_HEAD;
                }

                InsertionMode::BEFORE_HEAD => {
                    let node = self.insert_html_element(TagName::HEAD, Vec::new());
                    self.head_element = Some(node);
                    self.insertion_mode = InsertionMode::IN_HEAD;
                }

                InsertionMode::IN_HEAD => {
                    self.pop();
                    self.insertion_mode = InsertionMode::AFTER_HEAD;
                }

                InsertionMode::IN_HEAD_NOSCRIPT => {
                    self.record_error(ParseErrorKind::UnclosedElementAtEof);
                    self.pop();
                    self.insertion_mode = InsertionMode::IN_HEAD;
                }

                InsertionMode::AFTER_HEAD => {
                    self.insert_html_element(TagName::BODY, Vec::new());
                    self.insertion_mode = InsertionMode::IN_BODY;
                }

                /* > Parse error. ... Pop the current node off the stack
                 * > of open elements. Switch the insertion mode to the
                 * > original insertion mode and reprocess the token.
                 */
                InsertionMode::TEXT => {
                    self.record_error(ParseErrorKind::UnclosedElementAtEof);
                    self.pop();
                    self.insertion_mode = self.original_insertion_mode;
                }

                InsertionMode::IN_TABLE_TEXT => {
                    self.insertion_mode = self.original_insertion_mode;
                }

                InsertionMode::IN_TEMPLATE => {
                    if !self.pop_abandoned_template() {
                        break;
                    }
                }

                _ => {
                    /* > If the stack of template insertion modes is not
                     * > empty, then process the token using the rules
                     * > for the "in template" insertion mode.
                     */
                    if !self.template_insertion_modes.is_empty() {
                        if !self.pop_abandoned_template() {
                            break;
                        }
                        continue;
                    }
                    break;
                }
            }
        }

        /* > If there is a node in the stack of open elements that is
         * > not either a dd element, a dt element, an li element, ...
         * > then this is a parse error.
         */
        self.report_still_open_elements();
    }

    /// > If there is no template element on the stack of open
    /// > elements, then stop parsing. (fragment case) Otherwise, this
    /// > is a parse error. Pop elements from the stack of open
    /// > elements until a template element has been popped ...
    fn pop_abandoned_template(&mut self) -> bool {
        if !self.open_elements.contains(&TagName::TEMPLATE) {
            return false;
        }
        self.record_error(ParseErrorKind::UnclosedElementAtEof);
        self.pop_until(&TagName::TEMPLATE);
        self.active_formatting_elements.clear_up_to_last_marker();
        self.template_insertion_modes.pop();
        self.reset_insertion_mode_appropriately();
        true
    }

    fn report_still_open_elements(&mut self) {
        let all_benign = self.open_elements.walk_up().all(|entry| {
            Namespace::Html == entry.namespace
                && matches!(
                    entry.tag,
                    TagName::DD
                        | TagName::DT
                        | TagName::LI
                        | TagName::OPTGROUP
                        | TagName::OPTION
                        | TagName::P
                        | TagName::RB
                        | TagName::RP
                        | TagName::RT
                        | TagName::RTC
                        | TagName::TBODY
                        | TagName::TD
                        | TagName::TFOOT
                        | TagName::TH
                        | TagName::THEAD
                        | TagName::TR
                        | TagName::BODY
                        | TagName::HTML
                )
        });
        if !all_benign {
            self.record_error(ParseErrorKind::UnclosedElementAtEof);
        }
    }

    /*
     * Bookkeeping.
     */

    fn record_error(&mut self, kind: ParseErrorKind) {
        log::trace!("recovered from {kind:?} in {:?}", self.insertion_mode);
        self.tokenizer.record_tree_error(kind);
    }

    fn set_compatibility_mode(&mut self, mode: QuirksMode) {
        if self.quirks_mode_override.is_none() {
            self.document.set_quirks_mode(mode);
        }
    }

    fn spend_budget(&mut self) -> bool {
        if self.work_budget == 0 {
            log::warn!("tree construction work budget exhausted, aborting");
            self.last_error = Some(ParserError::BudgetExceeded);
            return false;
        }
        self.work_budget -= 1;
        true
    }
}

/// Determines whether a freshly inserted foreign element re-opens the
/// door to HTML parsing rules for its contents.
fn integration_point_for(
    namespace: Namespace,
    tag: &TagName,
    attributes: &[Attribute],
) -> Option<IntegrationPoint> {
    match (namespace, tag) {
        (
            Namespace::MathMl,
            TagName::MI | TagName::MO | TagName::MN | TagName::MS | TagName::MTEXT,
        ) => Some(IntegrationPoint::MathMl),

        /* > An annotation-xml element in the MathML namespace whose
         * > start tag token had an attribute with the name "encoding"
         * > whose value was an ASCII case-insensitive match for the
         * > string "text/html" [or] "application/xhtml+xml"
         */
        (Namespace::MathMl, TagName::ANNOTATION_XML) => attributes
            .iter()
            .find(|attribute| *b"encoding" == *attribute.name)
            .and_then(|attribute| attribute.value.as_deref())
            .and_then(|value| {
                (value.eq_ignore_ascii_case(b"text/html")
                    || value.eq_ignore_ascii_case(b"application/xhtml+xml"))
                .then_some(IntegrationPoint::Html)
            }),

        (Namespace::Svg, TagName::FOREIGNOBJECT | TagName::DESC | TagName::TITLE) => {
            Some(IntegrationPoint::Html)
        }

        _ => None,
    }
}

/// @see https://html.spec.whatwg.org/#adjust-mathml-attributes
fn adjust_mathml_attributes(attributes: &mut [Attribute]) {
    for attribute in attributes {
        if *b"definitionurl" == *attribute.name {
            attribute.name = b"definitionURL".to_vec().into_boxed_slice();
        }
    }
}

/// The lowercased attribute names which SVG wants back in camelCase.
///
/// @see https://html.spec.whatwg.org/#adjust-svg-attributes
const ADJUSTED_SVG_ATTRIBUTES: &[(&[u8], &[u8])] = &[
    (b"attributename", b"attributeName"),
    (b"attributetype", b"attributeType"),
    (b"basefrequency", b"baseFrequency"),
    (b"baseprofile", b"baseProfile"),
    (b"calcmode", b"calcMode"),
    (b"clippathunits", b"clipPathUnits"),
    (b"diffuseconstant", b"diffuseConstant"),
    (b"edgemode", b"edgeMode"),
    (b"filterunits", b"filterUnits"),
    (b"glyphref", b"glyphRef"),
    (b"gradienttransform", b"gradientTransform"),
    (b"gradientunits", b"gradientUnits"),
    (b"kernelmatrix", b"kernelMatrix"),
    (b"kernelunitlength", b"kernelUnitLength"),
    (b"keypoints", b"keyPoints"),
    (b"keysplines", b"keySplines"),
    (b"keytimes", b"keyTimes"),
    (b"lengthadjust", b"lengthAdjust"),
    (b"limitingconeangle", b"limitingConeAngle"),
    (b"markerheight", b"markerHeight"),
    (b"markerunits", b"markerUnits"),
    (b"markerwidth", b"markerWidth"),
    (b"maskcontentunits", b"maskContentUnits"),
    (b"maskunits", b"maskUnits"),
    (b"numoctaves", b"numOctaves"),
    (b"pathlength", b"pathLength"),
    (b"patterncontentunits", b"patternContentUnits"),
    (b"patterntransform", b"patternTransform"),
    (b"patternunits", b"patternUnits"),
    (b"pointsatx", b"pointsAtX"),
    (b"pointsaty", b"pointsAtY"),
    (b"pointsatz", b"pointsAtZ"),
    (b"preservealpha", b"preserveAlpha"),
    (b"preserveaspectratio", b"preserveAspectRatio"),
    (b"primitiveunits", b"primitiveUnits"),
    (b"refx", b"refX"),
    (b"refy", b"refY"),
    (b"repeatcount", b"repeatCount"),
    (b"repeatdur", b"repeatDur"),
    (b"requiredextensions", b"requiredExtensions"),
    (b"requiredfeatures", b"requiredFeatures"),
    (b"specularconstant", b"specularConstant"),
    (b"specularexponent", b"specularExponent"),
    (b"spreadmethod", b"spreadMethod"),
    (b"startoffset", b"startOffset"),
    (b"stddeviation", b"stdDeviation"),
    (b"stitchtiles", b"stitchTiles"),
    (b"surfacescale", b"surfaceScale"),
    (b"systemlanguage", b"systemLanguage"),
    (b"tablevalues", b"tableValues"),
    (b"targetx", b"targetX"),
    (b"targety", b"targetY"),
    (b"textlength", b"textLength"),
    (b"viewbox", b"viewBox"),
    (b"viewtarget", b"viewTarget"),
    (b"xchannelselector", b"xChannelSelector"),
    (b"ychannelselector", b"yChannelSelector"),
    (b"zoomandpan", b"zoomAndPan"),
];

fn adjust_svg_attributes(attributes: &mut [Attribute]) {
    for attribute in attributes {
        let adjusted = ADJUSTED_SVG_ATTRIBUTES
            .iter()
            .find(|(lowercase, _)| *lowercase == &attribute.name[..])
            .map(|(_, camel_case)| *camel_case);
        if let Some(camel_case) = adjusted {
            attribute.name = camel_case.to_vec().into_boxed_slice();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(html: &str) -> (Document, Vec<(ParseErrorKind, usize)>) {
        let mut builder = TreeBuilder::new(false, None);
        builder.extend(html.as_bytes()).unwrap();
        let finished = builder.finish().unwrap();
        (finished.document, finished.errors)
    }

    fn tree_of(html: &str) -> String {
        parse(html).0.tree_representation()
    }

    #[test]
    fn builds_implied_document_structure() {
        assert_eq!(
            tree_of("<!DOCTYPE html><p>One<p>Two"),
            "| <!DOCTYPE html>\n\
             | <html>\n\
             |   <head>\n\
             |   <body>\n\
             |     <p>\n\
             |       \"One\"\n\
             |     <p>\n\
             |       \"Two\"\n"
        );
    }

    #[test]
    fn no_doctype_means_quirks_mode() {
        let (document, errors) = parse("<p>hi");
        assert_eq!(QuirksMode::Quirks, document.quirks_mode());
        assert!(errors
            .iter()
            .any(|(kind, _)| ParseErrorKind::ExpectedDoctypeButGotTag == *kind));
    }

    #[test]
    fn modern_doctype_means_no_quirks() {
        let (document, _) = parse("<!DOCTYPE html><p>hi");
        assert_eq!(QuirksMode::NoQuirks, document.quirks_mode());
    }

    #[test]
    fn adoption_agency_repairs_misnested_formatting() {
        assert_eq!(
            tree_of("<!DOCTYPE html><b>1<i>2</b>3</i>"),
            "| <!DOCTYPE html>\n\
             | <html>\n\
             |   <head>\n\
             |   <body>\n\
             |     <b>\n\
             |       \"1\"\n\
             |       <i>\n\
             |         \"2\"\n\
             |     <i>\n\
             |       \"3\"\n"
        );
    }

    #[test]
    fn table_text_is_foster_parented() {
        assert_eq!(
            tree_of("<!DOCTYPE html><table>A<td>B</td></table>"),
            "| <!DOCTYPE html>\n\
             | <html>\n\
             |   <head>\n\
             |   <body>\n\
             |     \"A\"\n\
             |     <table>\n\
             |       <tbody>\n\
             |         <tr>\n\
             |           <td>\n\
             |             \"B\"\n"
        );
    }

    #[test]
    fn whitespace_stays_inside_the_table() {
        assert_eq!(
            tree_of("<!DOCTYPE html><table>  </table>"),
            "| <!DOCTYPE html>\n\
             | <html>\n\
             |   <head>\n\
             |   <body>\n\
             |     <table>\n\
             |       \"  \"\n"
        );
    }

    #[test]
    fn list_items_imply_their_own_end_tags() {
        assert_eq!(
            tree_of("<!DOCTYPE html><ul><li>a<li>b</ul>"),
            "| <!DOCTYPE html>\n\
             | <html>\n\
             |   <head>\n\
             |   <body>\n\
             |     <ul>\n\
             |       <li>\n\
             |         \"a\"\n\
             |       <li>\n\
             |         \"b\"\n"
        );
    }

    #[test]
    fn select_pops_option_before_the_next_option() {
        assert_eq!(
            tree_of("<!DOCTYPE html><select><option>a<option>b</select>"),
            "| <!DOCTYPE html>\n\
             | <html>\n\
             |   <head>\n\
             |   <body>\n\
             |     <select>\n\
             |       <option>\n\
             |         \"a\"\n\
             |       <option>\n\
             |         \"b\"\n"
        );
    }

    #[test]
    fn template_contents_accept_table_parts() {
        assert_eq!(
            tree_of("<!DOCTYPE html><template><td>cell</td></template>"),
            "| <!DOCTYPE html>\n\
             | <html>\n\
             |   <head>\n\
             |     <template>\n\
             |       <td>\n\
             |         \"cell\"\n\
             |   <body>\n"
        );
    }

    #[test]
    fn frameset_replaces_an_empty_body() {
        assert_eq!(
            tree_of("<!DOCTYPE html><frameset><frame></frameset><noframes>x</noframes>"),
            "| <!DOCTYPE html>\n\
             | <html>\n\
             |   <head>\n\
             |   <frameset>\n\
             |     <frame>\n\
             |   <noframes>\n\
             |     \"x\"\n"
        );
    }

    #[test]
    fn svg_subtree_keeps_its_namespace() {
        assert_eq!(
            tree_of("<!DOCTYPE html><svg><g fill=\"red\"><title>t</title></g></svg>text"),
            "| <!DOCTYPE html>\n\
             | <html>\n\
             |   <head>\n\
             |   <body>\n\
             |     <svg svg>\n\
             |       <svg g>\n\
             |         fill=\"red\"\n\
             |         <svg title>\n\
             |           \"t\"\n\
             |     \"text\"\n"
        );
    }

    #[test]
    fn svg_attributes_regain_camel_case() {
        let tree = tree_of("<!DOCTYPE html><svg viewbox=\"0 0 10 10\"></svg>");
        assert!(tree.contains("viewBox=\"0 0 10 10\""), "got: {tree}");
    }

    #[test]
    fn svg_tag_names_regain_camel_case() {
        assert_eq!(
            tree_of(
                "<!DOCTYPE html><svg><clippath></clippath>\
                 <lineargradient></lineargradient>\
                 <foreignObject><p>html again</p></foreignObject></svg>"
            ),
            "| <!DOCTYPE html>\n\
             | <html>\n\
             |   <head>\n\
             |   <body>\n\
             |     <svg svg>\n\
             |       <svg clipPath>\n\
             |       <svg linearGradient>\n\
             |       <svg foreignObject>\n\
             |         <p>\n\
             |           \"html again\"\n"
        );
    }

    #[test]
    fn foreign_breakout_returns_to_html_rules() {
        assert_eq!(
            tree_of("<!DOCTYPE html><svg><p>back</p>"),
            "| <!DOCTYPE html>\n\
             | <html>\n\
             |   <head>\n\
             |   <body>\n\
             |     <svg svg>\n\
             |     <p>\n\
             |       \"back\"\n"
        );
    }

    #[test]
    fn rawtext_region_keeps_markup_as_text() {
        assert_eq!(
            tree_of("<!DOCTYPE html><style>a < b { color: red }</style>"),
            "| <!DOCTYPE html>\n\
             | <html>\n\
             |   <head>\n\
             |     <style>\n\
             |       \"a < b { color: red }\"\n\
             |   <body>\n"
        );
    }

    #[test]
    fn body_end_tag_leaves_room_for_trailing_comment() {
        assert_eq!(
            tree_of("<!DOCTYPE html><body>x</body><!-- done -->"),
            "| <!DOCTYPE html>\n\
             | <html>\n\
             |   <head>\n\
             |   <body>\n\
             |     \"x\"\n\
             |   <!--  done  -->\n"
        );
    }

    #[test]
    fn stray_end_tag_is_reported_and_ignored() {
        let (document, errors) = parse("<!DOCTYPE html><div>a</span></div>");
        assert!(errors
            .iter()
            .any(|(kind, _)| ParseErrorKind::StrayEndTag == *kind));
        assert_eq!(
            document.tree_representation(),
            "| <!DOCTYPE html>\n\
             | <html>\n\
             |   <head>\n\
             |   <body>\n\
             |     <div>\n\
             |       \"a\"\n"
        );
    }

    #[test]
    fn long_runs_of_ignored_tokens_stay_on_a_flat_stack() {
        let expected = "| <!DOCTYPE html>\n\
             | <html>\n\
             |   <head>\n\
             |   <body>\n\
             |     <p>\n\
             |       \"x\"\n";

        // Empty end tags are dropped before dispatch.
        let mut html = String::from("<!DOCTYPE html><p>x");
        for _ in 0..400_000 {
            html.push_str("</>");
        }
        assert_eq!(parse(&html).0.tree_representation(), expected);

        // Stray end tags are ignored by their insertion-mode handler.
        let mut html = String::from("<!DOCTYPE html><p>x");
        for _ in 0..200_000 {
            html.push_str("</span>");
        }
        assert_eq!(parse(&html).0.tree_representation(), expected);
    }

    #[test]
    fn unclosed_elements_are_reported_at_eof() {
        let (_, errors) = parse("<!DOCTYPE html><div><span>");
        assert!(errors
            .iter()
            .any(|(kind, _)| ParseErrorKind::UnclosedElementAtEof == *kind));
    }

    #[test]
    fn fragment_parse_rejects_void_context() {
        assert_eq!(
            Some(ParserError::InvalidFragmentContext),
            TreeBuilder::new_fragment(false, None, TagName::BR).err()
        );
    }

    #[test]
    fn fragment_parse_in_table_body_context() {
        let mut builder = TreeBuilder::new_fragment(false, None, TagName::TBODY).unwrap();
        builder.extend(b"<tr><td>x</td></tr>").unwrap();
        let finished = builder.finish().unwrap();
        assert_eq!(
            finished.document.tree_representation(),
            "| <html>\n\
             |   <tr>\n\
             |     <td>\n\
             |       \"x\"\n"
        );
    }

    #[test]
    fn streaming_chunks_match_whole_input() {
        let html = "<!DOCTYPE html><p class=\"a\">Hello <b>world</b></p><!-- done -->";

        let whole = tree_of(html);

        let mut builder = TreeBuilder::new(false, None);
        for chunk in html.as_bytes().chunks(3) {
            builder.extend(chunk).unwrap();
        }
        let chunked = builder.finish().unwrap().document.tree_representation();

        assert_eq!(whole, chunked);
    }
}
