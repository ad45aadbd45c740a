use std::fmt::{self, Display, Formatter};

/// An HTML element name.
///
/// Known names parse to their own variant so that tree-construction
/// dispatch compiles to jump tables. Anything else, including custom
/// elements and most foreign element names, is carried in `Custom`
/// with the bytes uppercased to the canonical comparable form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagName {
    A,
    ADDRESS,
    APPLET,
    AREA,
    ARTICLE,
    ASIDE,
    B,
    BASE,
    BASEFONT,
    BGSOUND,
    BIG,
    BLOCKQUOTE,
    BODY,
    BR,
    BUTTON,
    CAPTION,
    CENTER,
    CODE,
    COL,
    COLGROUP,
    DD,
    DETAILS,
    DIALOG,
    DIR,
    DIV,
    DL,
    DT,
    EM,
    EMBED,
    FIELDSET,
    FIGCAPTION,
    FIGURE,
    FONT,
    FOOTER,
    FORM,
    FRAME,
    FRAMESET,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    HEAD,
    HEADER,
    HGROUP,
    HR,
    HTML,
    I,
    IFRAME,
    IMAGE,
    IMG,
    INPUT,
    KEYGEN,
    LI,
    LINK,
    LISTING,
    MAIN,
    MARQUEE,
    MENU,
    META,
    NAV,
    NOBR,
    NOEMBED,
    NOFRAMES,
    NOSCRIPT,
    OBJECT,
    OL,
    OPTGROUP,
    OPTION,
    P,
    PARAM,
    PLAINTEXT,
    PRE,
    RB,
    RP,
    RT,
    RTC,
    RUBY,
    S,
    SCRIPT,
    SEARCH,
    SECTION,
    SELECT,
    SMALL,
    SOURCE,
    SPAN,
    STRIKE,
    STRONG,
    STYLE,
    SUB,
    SUMMARY,
    SUP,
    TABLE,
    TBODY,
    TD,
    TEMPLATE,
    TEXTAREA,
    TFOOT,
    TH,
    THEAD,
    TITLE,
    TR,
    TRACK,
    TT,
    U,
    UL,
    VAR,
    WBR,
    XMP,

    // Foreign element names with tree-construction significance.
    ANNOTATION_XML,
    DESC,
    FOREIGNOBJECT,
    MALIGNMARK,
    MATH,
    MGLYPH,
    MI,
    MN,
    MO,
    MS,
    MTEXT,
    SVG,

    /// Any other name, uppercased.
    Custom(Box<[u8]>),
}

impl TagName {
    pub fn from_bytes(name: &[u8]) -> Self {
        let mut upper = name.to_vec();
        upper.make_ascii_uppercase();

        match upper.as_slice() {
            b"A" => Self::A,
            b"ADDRESS" => Self::ADDRESS,
            b"APPLET" => Self::APPLET,
            b"AREA" => Self::AREA,
            b"ARTICLE" => Self::ARTICLE,
            b"ASIDE" => Self::ASIDE,
            b"B" => Self::B,
            b"BASE" => Self::BASE,
            b"BASEFONT" => Self::BASEFONT,
            b"BGSOUND" => Self::BGSOUND,
            b"BIG" => Self::BIG,
            b"BLOCKQUOTE" => Self::BLOCKQUOTE,
            b"BODY" => Self::BODY,
            b"BR" => Self::BR,
            b"BUTTON" => Self::BUTTON,
            b"CAPTION" => Self::CAPTION,
            b"CENTER" => Self::CENTER,
            b"CODE" => Self::CODE,
            b"COL" => Self::COL,
            b"COLGROUP" => Self::COLGROUP,
            b"DD" => Self::DD,
            b"DETAILS" => Self::DETAILS,
            b"DIALOG" => Self::DIALOG,
            b"DIR" => Self::DIR,
            b"DIV" => Self::DIV,
            b"DL" => Self::DL,
            b"DT" => Self::DT,
            b"EM" => Self::EM,
            b"EMBED" => Self::EMBED,
            b"FIELDSET" => Self::FIELDSET,
            b"FIGCAPTION" => Self::FIGCAPTION,
            b"FIGURE" => Self::FIGURE,
            b"FONT" => Self::FONT,
            b"FOOTER" => Self::FOOTER,
            b"FORM" => Self::FORM,
            b"FRAME" => Self::FRAME,
            b"FRAMESET" => Self::FRAMESET,
            b"H1" => Self::H1,
            b"H2" => Self::H2,
            b"H3" => Self::H3,
            b"H4" => Self::H4,
            b"H5" => Self::H5,
            b"H6" => Self::H6,
            b"HEAD" => Self::HEAD,
            b"HEADER" => Self::HEADER,
            b"HGROUP" => Self::HGROUP,
            b"HR" => Self::HR,
            b"HTML" => Self::HTML,
            b"I" => Self::I,
            b"IFRAME" => Self::IFRAME,
            b"IMAGE" => Self::IMAGE,
            b"IMG" => Self::IMG,
            b"INPUT" => Self::INPUT,
            b"KEYGEN" => Self::KEYGEN,
            b"LI" => Self::LI,
            b"LINK" => Self::LINK,
            b"LISTING" => Self::LISTING,
            b"MAIN" => Self::MAIN,
            b"MARQUEE" => Self::MARQUEE,
            b"MENU" => Self::MENU,
            b"META" => Self::META,
            b"NAV" => Self::NAV,
            b"NOBR" => Self::NOBR,
            b"NOEMBED" => Self::NOEMBED,
            b"NOFRAMES" => Self::NOFRAMES,
            b"NOSCRIPT" => Self::NOSCRIPT,
            b"OBJECT" => Self::OBJECT,
            b"OL" => Self::OL,
            b"OPTGROUP" => Self::OPTGROUP,
            b"OPTION" => Self::OPTION,
            b"P" => Self::P,
            b"PARAM" => Self::PARAM,
            b"PLAINTEXT" => Self::PLAINTEXT,
            b"PRE" => Self::PRE,
            b"RB" => Self::RB,
            b"RP" => Self::RP,
            b"RT" => Self::RT,
            b"RTC" => Self::RTC,
            b"RUBY" => Self::RUBY,
            b"S" => Self::S,
            b"SCRIPT" => Self::SCRIPT,
            b"SEARCH" => Self::SEARCH,
            b"SECTION" => Self::SECTION,
            b"SELECT" => Self::SELECT,
            b"SMALL" => Self::SMALL,
            b"SOURCE" => Self::SOURCE,
            b"SPAN" => Self::SPAN,
            b"STRIKE" => Self::STRIKE,
            b"STRONG" => Self::STRONG,
            b"STYLE" => Self::STYLE,
            b"SUB" => Self::SUB,
            b"SUMMARY" => Self::SUMMARY,
            b"SUP" => Self::SUP,
            b"TABLE" => Self::TABLE,
            b"TBODY" => Self::TBODY,
            b"TD" => Self::TD,
            b"TEMPLATE" => Self::TEMPLATE,
            b"TEXTAREA" => Self::TEXTAREA,
            b"TFOOT" => Self::TFOOT,
            b"TH" => Self::TH,
            b"THEAD" => Self::THEAD,
            b"TITLE" => Self::TITLE,
            b"TR" => Self::TR,
            b"TRACK" => Self::TRACK,
            b"TT" => Self::TT,
            b"U" => Self::U,
            b"UL" => Self::UL,
            b"VAR" => Self::VAR,
            b"WBR" => Self::WBR,
            b"XMP" => Self::XMP,

            b"ANNOTATION-XML" => Self::ANNOTATION_XML,
            b"DESC" => Self::DESC,
            b"FOREIGNOBJECT" => Self::FOREIGNOBJECT,
            b"MALIGNMARK" => Self::MALIGNMARK,
            b"MATH" => Self::MATH,
            b"MGLYPH" => Self::MGLYPH,
            b"MI" => Self::MI,
            b"MN" => Self::MN,
            b"MO" => Self::MO,
            b"MS" => Self::MS,
            b"MTEXT" => Self::MTEXT,
            b"SVG" => Self::SVG,

            _ => Self::Custom(upper.into_boxed_slice()),
        }
    }

    /// The canonical, uppercased name bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::A => b"A",
            Self::ADDRESS => b"ADDRESS",
            Self::APPLET => b"APPLET",
            Self::AREA => b"AREA",
            Self::ARTICLE => b"ARTICLE",
            Self::ASIDE => b"ASIDE",
            Self::B => b"B",
            Self::BASE => b"BASE",
            Self::BASEFONT => b"BASEFONT",
            Self::BGSOUND => b"BGSOUND",
            Self::BIG => b"BIG",
            Self::BLOCKQUOTE => b"BLOCKQUOTE",
            Self::BODY => b"BODY",
            Self::BR => b"BR",
            Self::BUTTON => b"BUTTON",
            Self::CAPTION => b"CAPTION",
            Self::CENTER => b"CENTER",
            Self::CODE => b"CODE",
            Self::COL => b"COL",
            Self::COLGROUP => b"COLGROUP",
            Self::DD => b"DD",
            Self::DETAILS => b"DETAILS",
            Self::DIALOG => b"DIALOG",
            Self::DIR => b"DIR",
            Self::DIV => b"DIV",
            Self::DL => b"DL",
            Self::DT => b"DT",
            Self::EM => b"EM",
            Self::EMBED => b"EMBED",
            Self::FIELDSET => b"FIELDSET",
            Self::FIGCAPTION => b"FIGCAPTION",
            Self::FIGURE => b"FIGURE",
            Self::FONT => b"FONT",
            Self::FOOTER => b"FOOTER",
            Self::FORM => b"FORM",
            Self::FRAME => b"FRAME",
            Self::FRAMESET => b"FRAMESET",
            Self::H1 => b"H1",
            Self::H2 => b"H2",
            Self::H3 => b"H3",
            Self::H4 => b"H4",
            Self::H5 => b"H5",
            Self::H6 => b"H6",
            Self::HEAD => b"HEAD",
            Self::HEADER => b"HEADER",
            Self::HGROUP => b"HGROUP",
            Self::HR => b"HR",
            Self::HTML => b"HTML",
            Self::I => b"I",
            Self::IFRAME => b"IFRAME",
            Self::IMAGE => b"IMAGE",
            Self::IMG => b"IMG",
            Self::INPUT => b"INPUT",
            Self::KEYGEN => b"KEYGEN",
            Self::LI => b"LI",
            Self::LINK => b"LINK",
            Self::LISTING => b"LISTING",
            Self::MAIN => b"MAIN",
            Self::MARQUEE => b"MARQUEE",
            Self::MENU => b"MENU",
            Self::META => b"META",
            Self::NAV => b"NAV",
            Self::NOBR => b"NOBR",
            Self::NOEMBED => b"NOEMBED",
            Self::NOFRAMES => b"NOFRAMES",
            Self::NOSCRIPT => b"NOSCRIPT",
            Self::OBJECT => b"OBJECT",
            Self::OL => b"OL",
            Self::OPTGROUP => b"OPTGROUP",
            Self::OPTION => b"OPTION",
            Self::P => b"P",
            Self::PARAM => b"PARAM",
            Self::PLAINTEXT => b"PLAINTEXT",
            Self::PRE => b"PRE",
            Self::RB => b"RB",
            Self::RP => b"RP",
            Self::RT => b"RT",
            Self::RTC => b"RTC",
            Self::RUBY => b"RUBY",
            Self::S => b"S",
            Self::SCRIPT => b"SCRIPT",
            Self::SEARCH => b"SEARCH",
            Self::SECTION => b"SECTION",
            Self::SELECT => b"SELECT",
            Self::SMALL => b"SMALL",
            Self::SOURCE => b"SOURCE",
            Self::SPAN => b"SPAN",
            Self::STRIKE => b"STRIKE",
            Self::STRONG => b"STRONG",
            Self::STYLE => b"STYLE",
            Self::SUB => b"SUB",
            Self::SUMMARY => b"SUMMARY",
            Self::SUP => b"SUP",
            Self::TABLE => b"TABLE",
            Self::TBODY => b"TBODY",
            Self::TD => b"TD",
            Self::TEMPLATE => b"TEMPLATE",
            Self::TEXTAREA => b"TEXTAREA",
            Self::TFOOT => b"TFOOT",
            Self::TH => b"TH",
            Self::THEAD => b"THEAD",
            Self::TITLE => b"TITLE",
            Self::TR => b"TR",
            Self::TRACK => b"TRACK",
            Self::TT => b"TT",
            Self::U => b"U",
            Self::UL => b"UL",
            Self::VAR => b"VAR",
            Self::WBR => b"WBR",
            Self::XMP => b"XMP",

            Self::ANNOTATION_XML => b"ANNOTATION-XML",
            Self::DESC => b"DESC",
            Self::FOREIGNOBJECT => b"FOREIGNOBJECT",
            Self::MALIGNMARK => b"MALIGNMARK",
            Self::MATH => b"MATH",
            Self::MGLYPH => b"MGLYPH",
            Self::MI => b"MI",
            Self::MN => b"MN",
            Self::MO => b"MO",
            Self::MS => b"MS",
            Self::MTEXT => b"MTEXT",
            Self::SVG => b"SVG",

            Self::Custom(name) => name,
        }
    }

    /// Void elements never have contents and never take a closing tag.
    ///
    /// > A void element is an element whose content model never allows
    /// > it to have contents under any circumstances. Void elements
    /// > can have attributes.
    pub fn is_void(&self) -> bool {
        matches!(
            self,
            Self::AREA
                | Self::BASE
                | Self::BASEFONT
                | Self::BGSOUND
                | Self::BR
                | Self::COL
                | Self::EMBED
                | Self::FRAME
                | Self::HR
                | Self::IMG
                | Self::INPUT
                | Self::KEYGEN
                | Self::LINK
                | Self::META
                | Self::PARAM
                | Self::SOURCE
                | Self::TRACK
                | Self::WBR
        )
    }

    /// Whether an element of this name is in the "special" category
    /// when found in the HTML namespace.
    pub fn is_special(&self) -> bool {
        matches!(
            self,
            Self::ADDRESS
                | Self::APPLET
                | Self::AREA
                | Self::ARTICLE
                | Self::ASIDE
                | Self::BASE
                | Self::BASEFONT
                | Self::BGSOUND
                | Self::BLOCKQUOTE
                | Self::BODY
                | Self::BR
                | Self::BUTTON
                | Self::CAPTION
                | Self::CENTER
                | Self::COL
                | Self::COLGROUP
                | Self::DD
                | Self::DETAILS
                | Self::DIR
                | Self::DIV
                | Self::DL
                | Self::DT
                | Self::EMBED
                | Self::FIELDSET
                | Self::FIGCAPTION
                | Self::FIGURE
                | Self::FOOTER
                | Self::FORM
                | Self::FRAME
                | Self::FRAMESET
                | Self::H1
                | Self::H2
                | Self::H3
                | Self::H4
                | Self::H5
                | Self::H6
                | Self::HEAD
                | Self::HEADER
                | Self::HGROUP
                | Self::HR
                | Self::HTML
                | Self::IFRAME
                | Self::IMG
                | Self::INPUT
                | Self::KEYGEN
                | Self::LI
                | Self::LINK
                | Self::LISTING
                | Self::MAIN
                | Self::MARQUEE
                | Self::MENU
                | Self::META
                | Self::NAV
                | Self::NOEMBED
                | Self::NOFRAMES
                | Self::NOSCRIPT
                | Self::OBJECT
                | Self::OL
                | Self::P
                | Self::PARAM
                | Self::PLAINTEXT
                | Self::PRE
                | Self::SCRIPT
                | Self::SEARCH
                | Self::SECTION
                | Self::SELECT
                | Self::SOURCE
                | Self::STYLE
                | Self::SUMMARY
                | Self::TABLE
                | Self::TBODY
                | Self::TD
                | Self::TEMPLATE
                | Self::TEXTAREA
                | Self::TFOOT
                | Self::TH
                | Self::THEAD
                | Self::TITLE
                | Self::TR
                | Self::TRACK
                | Self::UL
                | Self::WBR
                | Self::XMP
        )
    }

    /// Formatting elements participate in the list of active
    /// formatting elements and the adoption agency algorithm.
    pub fn is_formatting(&self) -> bool {
        matches!(
            self,
            Self::A
                | Self::B
                | Self::BIG
                | Self::CODE
                | Self::EM
                | Self::FONT
                | Self::I
                | Self::NOBR
                | Self::S
                | Self::SMALL
                | Self::STRIKE
                | Self::STRONG
                | Self::TT
                | Self::U
        )
    }

    pub fn is_heading(&self) -> bool {
        matches!(
            self,
            Self::H1 | Self::H2 | Self::H3 | Self::H4 | Self::H5 | Self::H6
        )
    }
}

impl Display for TagName {
    /// Writes the conventional lowercase form of the name.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for &byte in self.as_bytes() {
            f.write_str((byte.to_ascii_lowercase() as char).encode_utf8(&mut [0u8; 4]))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!(TagName::from_bytes(b"div"), TagName::DIV);
        assert_eq!(TagName::from_bytes(b"DiV"), TagName::DIV);
        assert_eq!(TagName::from_bytes(b"annotation-XML"), TagName::ANNOTATION_XML);
    }

    #[test]
    fn unknown_names_become_custom() {
        let name = TagName::from_bytes(b"x-widget");
        assert_eq!(name, TagName::Custom(b"X-WIDGET".as_slice().into()));
        assert_eq!(name.to_string(), "x-widget");
    }

    #[test]
    fn display_is_lowercase() {
        assert_eq!(TagName::BLOCKQUOTE.to_string(), "blockquote");
        assert_eq!(TagName::ANNOTATION_XML.to_string(), "annotation-xml");
    }
}
