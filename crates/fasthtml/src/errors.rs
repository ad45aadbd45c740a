/// A fatal condition that stops a parse.
///
/// Malformed markup is never fatal: it is recovered from and reported
/// through the [`ParseError`] diagnostics channel instead. These
/// errors come from misuse of the API or from documents which exhaust
/// the recovery budget.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParserError {
    /// A pathological document exhausted the tree-construction budget.
    BudgetExceeded,
    /// A fragment parse was requested with a context element that
    /// cannot have contents.
    InvalidFragmentContext,
}
impl std::error::Error for ParserError {}
impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.into())
    }
}
impl From<ParserError> for &'static str {
    fn from(error: ParserError) -> Self {
        match error {
            ParserError::BudgetExceeded => "budget-exceeded",
            ParserError::InvalidFragmentContext => "invalid-fragment-context",
        }
    }
}
impl From<&ParserError> for &'static str {
    fn from(error: &ParserError) -> Self {
        (*error).into()
    }
}

/// A non-fatal markup error noticed while parsing.
///
/// Parsing always continues past these: the recovered tree reflects
/// what a browser would have built from the same bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    AbruptClosingOfComment,
    AbruptDoctype,
    AmbiguousAmpersand,
    CdataInHtmlContent,
    DuplicateAttribute,
    EndTagWithAttributes,
    EndTagWithTrailingSolidus,
    EofInComment,
    EofInDoctype,
    EofInTag,
    EofInText,
    EofBeforeTagName,
    ExpectedDoctypeButGotTag,
    MisnestedTag,
    MisplacedDoctype,
    MissingDoctype,
    NestedComment,
    NullCharacterInText,
    StrayEndTag,
    StrayStartTag,
    UnexpectedCharacterEncodingDeclaration,
    UnexpectedQuestionMarkInsteadOfTagName,
    UnexpectedSolidusInTag,
    UnclosedElementAtEof,
}
impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.into())
    }
}
impl From<ParseErrorKind> for &'static str {
    fn from(kind: ParseErrorKind) -> Self {
        use ParseErrorKind as K;
        match kind {
            K::AbruptClosingOfComment => "abrupt-closing-of-comment",
            K::AbruptDoctype => "abrupt-doctype",
            K::AmbiguousAmpersand => "ambiguous-ampersand",
            K::CdataInHtmlContent => "cdata-in-html-content",
            K::DuplicateAttribute => "duplicate-attribute",
            K::EndTagWithAttributes => "end-tag-with-attributes",
            K::EndTagWithTrailingSolidus => "end-tag-with-trailing-solidus",
            K::EofInComment => "eof-in-comment",
            K::EofInDoctype => "eof-in-doctype",
            K::EofInTag => "eof-in-tag",
            K::EofInText => "eof-in-text",
            K::EofBeforeTagName => "eof-before-tag-name",
            K::ExpectedDoctypeButGotTag => "expected-doctype-but-got-tag",
            K::MisnestedTag => "misnested-tag",
            K::MisplacedDoctype => "misplaced-doctype",
            K::MissingDoctype => "missing-doctype",
            K::NestedComment => "nested-comment",
            K::NullCharacterInText => "null-character-in-text",
            K::StrayEndTag => "stray-end-tag",
            K::StrayStartTag => "stray-start-tag",
            K::UnexpectedCharacterEncodingDeclaration => {
                "unexpected-character-encoding-declaration"
            }
            K::UnexpectedQuestionMarkInsteadOfTagName => {
                "unexpected-question-mark-instead-of-tag-name"
            }
            K::UnexpectedSolidusInTag => "unexpected-solidus-in-tag",
            K::UnclosedElementAtEof => "unclosed-element-at-eof",
        }
    }
}
impl From<&ParseErrorKind> for &'static str {
    fn from(kind: &ParseErrorKind) -> Self {
        (*kind).into()
    }
}

/// Where in the source a diagnostic was noticed.
///
/// `line` and `column` are 1-based; `offset` is the byte offset into
/// the full input stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourcePosition {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub at: SourcePosition,
}
impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}:{}", self.kind, self.at.line, self.at.column)
    }
}
