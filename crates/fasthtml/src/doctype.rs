use crate::macros::{strcspn, strspn};
use crate::quirks_mode::QuirksMode;

/// A parsed DOCTYPE declaration.
///
/// A DOCTYPE comprises four properties: a name, a public identifier, a
/// system identifier, and an indication of which document compatibility
/// mode it would imply if the parser hadn't already determined one from
/// other information.
///
/// All HTML documents should start with the standard HTML5 DOCTYPE,
/// `<!DOCTYPE html>`, which indicates "no-quirks" mode. Legacy public
/// and system identifiers select "quirks" or "limited-quirks" modes
/// instead.
///
/// @see https://html.spec.whatwg.org/#the-doctype
#[derive(Debug)]
pub struct DoctypeInfo {
    /// Name of the DOCTYPE: should be "html" for HTML documents.
    /// ```text
    ///
    ///     <!DOCTYPE html>
    ///               ╰──┴── name is "html".
    /// ```
    pub name: Option<Box<[u8]>>,

    /// Public identifier of the DOCTYPE, if one was present.
    /// ```text
    ///
    ///     <!DOCTYPE html PUBLIC "public id goes here in quotes">
    ///               │  │         ╰─── public identifier ─────╯
    ///               ╰──┴── name is "html".
    /// ```
    pub public_identifier: Option<Box<[u8]>>,

    /// System identifier of the DOCTYPE, if one was present.
    /// ```text
    ///
    ///     <!DOCTYPE html PUBLIC "public id goes here in quotes" "system id goes here in quotes">
    ///               │  │         ╰─── public identifier ─────╯   ╰──── system identifier ────╯
    ///               ╰──┴── name is "html".
    /// ```
    pub system_identifier: Option<Box<[u8]>>,

    /// Which document compatibility mode this DOCTYPE indicates.
    ///
    /// An appropriate DOCTYPE is one encountered in the "initial"
    /// insertion mode, before the HTML element has been opened and
    /// before finding any other DOCTYPE declaration tokens.
    ///
    /// @see https://html.spec.whatwg.org/#the-initial-insertion-mode
    pub indicated_compatibility_mode: QuirksMode,
}

impl DoctypeInfo {
    /// > DOCTYPE tokens have a name, a public identifier, a system identifier,
    /// > and a force-quirks flag. When a DOCTYPE token is created, its name,
    /// > public identifier, and system identifier must be marked as missing
    /// > (which is a distinct state from the empty string), and the
    /// > force-quirks flag must be set to off (its other state is on).
    fn new(
        name: Option<Box<[u8]>>,
        public_identifier: Option<Box<[u8]>>,
        system_identifier: Option<Box<[u8]>>,
        force_quirks_flag: bool,
    ) -> Self {
        let mode = Self::compatibility_mode(
            &name,
            &public_identifier,
            &system_identifier,
            force_quirks_flag,
        );
        Self {
            name,
            public_identifier,
            system_identifier,
            indicated_compatibility_mode: mode,
        }
    }

    /*
     * > If the DOCTYPE token matches one of the conditions in the following
     * > list, then set the Document to quirks mode:
     */
    fn compatibility_mode(
        name: &Option<Box<[u8]>>,
        public_identifier: &Option<Box<[u8]>>,
        system_identifier: &Option<Box<[u8]>>,
        force_quirks_flag: bool,
    ) -> QuirksMode {
        /*
         * > The force-quirks flag is set to on.
         */
        if force_quirks_flag {
            return QuirksMode::Quirks;
        }

        let name_is_html = name.as_ref().map(|n| n.as_ref() == b"html").unwrap_or(false);

        /*
         * Normative documents will contain the literal `<!DOCTYPE html>` with no
         * public or system identifiers; short-circuit to avoid extra parsing.
         */
        if name_is_html && public_identifier.is_none() && system_identifier.is_none() {
            return QuirksMode::NoQuirks;
        }

        /*
         * > The name is not "html".
         *
         * The tokenizer reports the name in lower case even if provided in
         * the document in upper case; no conversion is required here.
         */
        if !name_is_html {
            return QuirksMode::Quirks;
        }

        /*
         * > set...the public identifier...to...the empty string if the public
         * > identifier was missing. ... The system identifier and public
         * > identifier strings must be compared...in an ASCII
         * > case-insensitive manner.
         *
         * > A system identifier whose value is the empty string is not
         * > considered missing for the purposes of the conditions above.
         */
        let system_identifier_is_missing = system_identifier.is_none();
        let public_id = match public_identifier {
            Some(s) => s.to_ascii_lowercase(),
            None => vec![],
        };
        let system_id = match system_identifier {
            Some(s) => s.to_ascii_lowercase(),
            None => vec![],
        };

        /*
         * > The public identifier is set to…
         */
        if *b"-//w3o//dtd w3 html strict 3.0//en//" == *public_id
            || *b"-/w3c/dtd html 4.0 transitional/en" == *public_id
            || *b"html" == *public_id
        {
            return QuirksMode::Quirks;
        }

        /*
         * > The system identifier is set to…
         */
        if *b"http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd" == *system_id {
            return QuirksMode::Quirks;
        }

        /*
         * > The public identifier starts with…
         */
        if !public_id.is_empty() {
            const QUIRKY_PUBLIC_ID_PREFIXES: &[&[u8]] = &[
                b"+//silmaril//dtd html pro v0r11 19970101//",
                b"-//as//dtd html 3.0 aswedit + extensions//",
                b"-//advasoft ltd//dtd html 3.0 aswedit + extensions//",
                b"-//ietf//dtd html 2.0 level 1//",
                b"-//ietf//dtd html 2.0 level 2//",
                b"-//ietf//dtd html 2.0 strict level 1//",
                b"-//ietf//dtd html 2.0 strict level 2//",
                b"-//ietf//dtd html 2.0 strict//",
                b"-//ietf//dtd html 2.0//",
                b"-//ietf//dtd html 2.1e//",
                b"-//ietf//dtd html 3.0//",
                b"-//ietf//dtd html 3.2 final//",
                b"-//ietf//dtd html 3.2//",
                b"-//ietf//dtd html 3//",
                b"-//ietf//dtd html level 0//",
                b"-//ietf//dtd html level 1//",
                b"-//ietf//dtd html level 2//",
                b"-//ietf//dtd html level 3//",
                b"-//ietf//dtd html strict level 0//",
                b"-//ietf//dtd html strict level 1//",
                b"-//ietf//dtd html strict level 2//",
                b"-//ietf//dtd html strict level 3//",
                b"-//ietf//dtd html strict//",
                b"-//ietf//dtd html//",
                b"-//metrius//dtd metrius presentational//",
                b"-//microsoft//dtd internet explorer 2.0 html strict//",
                b"-//microsoft//dtd internet explorer 2.0 html//",
                b"-//microsoft//dtd internet explorer 2.0 tables//",
                b"-//microsoft//dtd internet explorer 3.0 html strict//",
                b"-//microsoft//dtd internet explorer 3.0 html//",
                b"-//microsoft//dtd internet explorer 3.0 tables//",
                b"-//netscape comm. corp.//dtd html//",
                b"-//netscape comm. corp.//dtd strict html//",
                b"-//o'reilly and associates//dtd html 2.0//",
                b"-//o'reilly and associates//dtd html extended 1.0//",
                b"-//o'reilly and associates//dtd html extended relaxed 1.0//",
                b"-//sq//dtd html 2.0 hotmetal + extensions//",
                b"-//softquad software//dtd hotmetal pro 6.0::19990601::extensions to html 4.0//",
                b"-//softquad//dtd hotmetal pro 4.0::19971010::extensions to html 4.0//",
                b"-//spyglass//dtd html 2.0 extended//",
                b"-//sun microsystems corp.//dtd hotjava html//",
                b"-//sun microsystems corp.//dtd hotjava strict html//",
                b"-//w3c//dtd html 3 1995-03-24//",
                b"-//w3c//dtd html 3.2 draft//",
                b"-//w3c//dtd html 3.2 final//",
                b"-//w3c//dtd html 3.2//",
                b"-//w3c//dtd html 3.2s draft//",
                b"-//w3c//dtd html 4.0 frameset//",
                b"-//w3c//dtd html 4.0 transitional//",
                b"-//w3c//dtd html experimental 19960712//",
                b"-//w3c//dtd html experimental 970421//",
                b"-//w3c//dtd w3 html//",
                b"-//w3o//dtd w3 html 3.0//",
                b"-//webtechs//dtd mozilla html 2.0//",
                b"-//webtechs//dtd mozilla html//",
            ];

            if QUIRKY_PUBLIC_ID_PREFIXES
                .iter()
                .any(|prefix| public_id.starts_with(prefix))
            {
                return QuirksMode::Quirks;
            }

            /*
             * > The system identifier is missing and the public identifier starts with…
             */
            if system_identifier_is_missing
                && (public_id.starts_with(b"-//w3c//dtd html 4.01 frameset//")
                    || public_id.starts_with(b"-//w3c//dtd html 4.01 transitional//"))
            {
                return QuirksMode::Quirks;
            }

            /*
             * > Otherwise, if the DOCTYPE token matches one of the conditions in
             * > the following list, then set the Document to limited-quirks mode.
             */

            /*
             * > The public identifier starts with…
             */
            if public_id.starts_with(b"-//w3c//dtd xhtml 1.0 frameset//")
                || public_id.starts_with(b"-//w3c//dtd xhtml 1.0 transitional//")
            {
                return QuirksMode::LimitedQuirks;
            }

            /*
             * > The system identifier is not missing and the public identifier starts with…
             */
            if !system_identifier_is_missing
                && (public_id.starts_with(b"-//w3c//dtd html 4.01 frameset//")
                    || public_id.starts_with(b"-//w3c//dtd html 4.01 transitional//"))
            {
                return QuirksMode::LimitedQuirks;
            }
        }

        QuirksMode::NoQuirks
    }

    /// Parses a raw DOCTYPE declaration token, e.g. `<!DOCTYPE html>`.
    ///
    /// The input must be the complete token, from `<!DOCTYPE` through
    /// its closing `>`. Returns `None` when the bytes do not form a
    /// DOCTYPE declaration. Malformed declarations still parse, and
    /// indicate "quirks" mode as a browser would.
    ///
    /// This parser combines the rules found in the HTML specification
    /// for the DOCTYPE related tokenizer states.
    ///
    /// @see https://html.spec.whatwg.org/#doctype-state
    pub fn from_doctype_token(doctype_html: &[u8]) -> Option<Self> {
        let mut doctype_name = None;
        let mut doctype_public_id = None;
        let mut doctype_system_id = None;

        /*
         * - A valid DOCTYPE token is at least `<!DOCTYPE>`.
         * - It must start with an ASCII case-insensitive match for `<!DOCTYPE`.
         * - The only occurrence of `>` must be the final byte.
         */
        if doctype_html.len() < 10 || !doctype_html[0..9].eq_ignore_ascii_case(b"<!DOCTYPE") {
            return None;
        }

        let mut at: usize = 9;
        if b'>' != doctype_html[doctype_html.len() - 1]
            || (strcspn!(doctype_html, b'>', at) + at) < doctype_html.len() - 1
        {
            return None;
        }

        /*
         * Perform newline and NULL-byte normalization before parsing the
         * declaration contents.
         *
         * @see https://infra.spec.whatwg.org/#normalize-newlines
         */
        let mut normalized: Vec<u8> = Vec::with_capacity(doctype_html.len());
        let mut bytes = doctype_html.iter().peekable();
        while let Some(&c) = bytes.next() {
            match c {
                b'\r' => {
                    if bytes.peek() == Some(&&b'\n') {
                        bytes.next();
                    }
                    normalized.push(b'\n');
                }
                b'\0' => normalized.extend_from_slice("\u{FFFD}".as_bytes()),
                _ => normalized.push(c),
            }
        }
        let doctype_html = normalized.as_slice();
        let end = doctype_html.len() - 1;

        /*
         * The declaration contents sit between the current position and
         * the closing ">".
         *
         *     "<!DOCTYPE...declaration...>"
         *               ╰─ $at           ╰─ $end
         */

        /*
         * "Before DOCTYPE name state": skip whitespace.
         *
         * @see https://html.spec.whatwg.org/#before-doctype-name-state
         */
        at += strspn!(doctype_html, b' ' | b'\t' | b'\n' | 0x0c | b'\r', at);

        if at >= end {
            return Some(Self::new(
                doctype_name,
                doctype_public_id,
                doctype_system_id,
                true,
            ));
        }

        let name_length = strcspn!(
            doctype_html,
            b' ' | b'\t' | b'\n' | 0x0c | b'\r',
            at,
            end - at
        );
        doctype_name = Some(
            doctype_html[at..at + name_length]
                .to_ascii_lowercase()
                .into(),
        );

        at += name_length;
        at += strspn!(
            doctype_html,
            b' ' | b'\t' | b'\n' | 0x0c | b'\r',
            at,
            end - at
        );
        if at >= end {
            return Some(Self::new(
                doctype_name,
                doctype_public_id,
                doctype_system_id,
                false,
            ));
        }

        /*
         * "After DOCTYPE name state"
         *
         * Find a case-insensitive match for "PUBLIC" or "SYSTEM" here.
         * Anything else sets force-quirks and enters the bogus DOCTYPE
         * state, which skips the remainder of the token.
         *
         * @see https://html.spec.whatwg.org/#after-doctype-name-state
         */
        if at + 6 >= end {
            return Some(Self::new(
                doctype_name,
                doctype_public_id,
                doctype_system_id,
                true,
            ));
        }

        let parse_public_id = if doctype_html[at..at + 6].eq_ignore_ascii_case(b"PUBLIC") {
            true
        } else if doctype_html[at..at + 6].eq_ignore_ascii_case(b"SYSTEM") {
            false
        } else {
            /*
             * > Otherwise, this is an invalid-character-sequence-after-doctype-name
             * > parse error. Set the current DOCTYPE token's force-quirks flag to
             * > on. Reconsume in the bogus DOCTYPE state.
             */
            return Some(Self::new(
                doctype_name,
                doctype_public_id,
                doctype_system_id,
                true,
            ));
        };

        at += 6;
        at += strspn!(
            doctype_html,
            b' ' | b'\t' | b'\n' | 0x0c | b'\r',
            at,
            end - at
        );
        if at >= end {
            return Some(Self::new(
                doctype_name,
                doctype_public_id,
                doctype_system_id,
                true,
            ));
        }

        if parse_public_id {
            /*
             * The parser enters "DOCTYPE public identifier (double-quoted) state"
             * or "DOCTYPE public identifier (single-quoted) state" by finding one
             * of the valid quotes. Anything else forces quirks mode and ignores
             * the rest of the contents.
             *
             * @see https://html.spec.whatwg.org/#doctype-public-identifier-(double-quoted)-state
             */
            let closer_quote = doctype_html[at];

            if b'"' != closer_quote && b'\'' != closer_quote {
                return Some(Self::new(
                    doctype_name,
                    doctype_public_id,
                    doctype_system_id,
                    true,
                ));
            }

            at += 1;
            let identifier_length = strcspn!(doctype_html, x if x == closer_quote, at, end - at);
            doctype_public_id = Some(doctype_html[at..at + identifier_length].into());

            at += identifier_length;
            if at >= end || closer_quote != doctype_html[at] {
                return Some(Self::new(
                    doctype_name,
                    doctype_public_id,
                    doctype_system_id,
                    true,
                ));
            }

            at += 1;

            /*
             * "Between DOCTYPE public and system identifiers state"
             *
             * @see https://html.spec.whatwg.org/#between-doctype-public-and-system-identifiers-state
             */
            at += strspn!(
                doctype_html,
                b' ' | b'\t' | b'\n' | 0x0c | b'\r',
                at,
                end - at
            );
            if at >= end {
                return Some(Self::new(
                    doctype_name,
                    doctype_public_id,
                    doctype_system_id,
                    false,
                ));
            }
        }

        /*
         * The parser enters "DOCTYPE system identifier (double-quoted) state"
         * or "DOCTYPE system identifier (single-quoted) state" by finding one
         * of the valid quotes. Anything else forces quirks mode and ignores
         * the rest of the contents.
         *
         * @see https://html.spec.whatwg.org/#doctype-system-identifier-(double-quoted)-state
         */
        let closer_quote = doctype_html[at];

        if b'"' != closer_quote && b'\'' != closer_quote {
            return Some(Self::new(
                doctype_name,
                doctype_public_id,
                doctype_system_id,
                true,
            ));
        }

        at += 1;
        let identifier_length = strcspn!(doctype_html, x if x == closer_quote, at, end - at);
        doctype_system_id = Some(doctype_html[at..at + identifier_length].into());

        at += identifier_length;
        if at >= end || closer_quote != doctype_html[at] {
            return Some(Self::new(
                doctype_name,
                doctype_public_id,
                doctype_system_id,
                true,
            ));
        }

        Some(Self::new(
            doctype_name,
            doctype_public_id,
            doctype_system_id,
            false,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! test_doctype_info {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (a,b,c,d,e): (&str, QuirksMode,Option<&str>,Option<&str>,Option<&str>) = $value;
                let doctype = DoctypeInfo::from_doctype_token(a.as_bytes());
                assert!(
                    doctype.is_some(),
                    "Should have parsed the following doctype declaration: {:?}",
                    String::from_utf8_lossy(a.as_bytes())
                );
                let doctype = doctype.unwrap();

                assert_eq!(
                    b,
                    doctype.indicated_compatibility_mode,
                    "Failed to infer the expected document compatibility mode for {:?}",
                    String::from_utf8_lossy(a.as_bytes())
                );

                assert_eq!(
                    c.map(|val| val.as_bytes().into()),
                    doctype.name,
                    "Failed to parse the expected DOCTYPE name for {:?}",
                    String::from_utf8_lossy(a.as_bytes())
                );

                assert_eq!(
                    d.map(|val| val.as_bytes().into()),
                    doctype.public_identifier,
                    "Failed to parse the expected DOCTYPE public identifier for {:?}",
                    String::from_utf8_lossy(a.as_bytes())
                );

                assert_eq!(
                    e.map(|val| val.as_bytes().into()),
                    doctype.system_identifier,
                    "Failed to parse the expected DOCTYPE system identifier for {:?}",
                    String::from_utf8_lossy(a.as_bytes())
                );
            }
        )*
        }
    }

    test_doctype_info! {
        missing_doctype_name:                                  ( "<!DOCTYPE>",                                                                                              QuirksMode::NoQuirks,      None,                                                                    None,                                     None ),
        html5_doctype:                                         ( "<!DOCTYPE html>",                                                                                         QuirksMode::NoQuirks,      Some("html"),                                                            None,                                     None ),
        html5_doctype_no_whitespace_before_name:               ( "<!DOCTYPEhtml>",                                                                                          QuirksMode::NoQuirks,      Some("html"),                                                            None,                                     None ),
        xhtml_doctype:                                         ( r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd">"#,           QuirksMode::NoQuirks,      Some("html"),                                                            Some("-//W3C//DTD HTML 4.01//EN"),        Some("http://www.w3.org/TR/html4/strict.dtd") ),
        svg_doctype:                                           ( r#"<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">"#,   QuirksMode::Quirks,        Some("svg"),                                                             Some("-//W3C//DTD SVG 1.1//EN"),          Some("http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd") ),
        mathml_doctype:                                        ( r#"<!DOCTYPE math PUBLIC "-//W3C//DTD MathML 2.0//EN" "http://www.w3.org/Math/DTD/mathml2/mathml2.dtd">"#, QuirksMode::Quirks,        Some("math"),                                                            Some("-//W3C//DTD MathML 2.0//EN"),       Some("http://www.w3.org/Math/DTD/mathml2/mathml2.dtd") ),
        doctype_with_null_byte_replacement:                    ( "<!DOCTYPE null-\0 PUBLIC '\0' '\0\0'>",                                                                   QuirksMode::Quirks,        Some("null-\u{FFFD}"),                                                   Some("\u{FFFD}"),                         Some("\u{FFFD}\u{FFFD}") ),
        uppercase_doctype:                                     ( "<!DOCTYPE UPPERCASE>",                                                                                    QuirksMode::Quirks,        Some("uppercase"),                                                       None,                                     None ),
        lowercase_doctype:                                     ( "<!doctype lowercase>",                                                                                    QuirksMode::Quirks,        Some("lowercase"),                                                       None,                                     None ),
        doctype_with_whitespace:                               ( "<!DOCTYPE\n\thtml\x0c\rPUBLIC\r\n''\t''>",                                                                QuirksMode::NoQuirks,      Some("html"),                                                            Some(""),                                 Some("") ),
        doctype_trailing_characters:                           ( "<!DOCTYPE html PUBLIC '' '' Anything (except closing angle bracket) is just fine here !!!>",              QuirksMode::NoQuirks,      Some("html"),                                                            Some(""),                                 Some("") ),
        an_ugly_no_quirks_doctype:                             ( "<!dOcTyPehtml\tPublIC\"pub-id\"'sysid'>",                                                                 QuirksMode::NoQuirks,      Some("html"),                                                            Some("pub-id"),                           Some("sysid") ),
        missing_public_id:                                     ( "<!DOCTYPE html PUBLIC>",                                                                                  QuirksMode::Quirks,        Some("html"),                                                            None,                                     None ),
        missing_system_id:                                     ( "<!DOCTYPE html SYSTEM>",                                                                                  QuirksMode::Quirks,        Some("html"),                                                            None,                                     None ),
        missing_close_quote_public_id:                         ( "<!DOCTYPE html PUBLIC 'xyz>",                                                                             QuirksMode::Quirks,        Some("html"),                                                            Some("xyz"),                              None ),
        missing_close_quote_system_id:                         ( r#"<!DOCTYPE html SYSTEM "xyz>"#,                                                                          QuirksMode::Quirks,        Some("html"),                                                            None,                                     Some("xyz") ),
        missing_close_quote_system_id_with_public:             ( "<!DOCTYPE html PUBLIC 'abc' 'xyz>",                                                                       QuirksMode::Quirks,        Some("html"),                                                            Some("abc"),                              Some("xyz") ),
        bogus_characters_instead_of_system_or_public:          ( "<!DOCTYPE html FOOBAR>",                                                                                  QuirksMode::Quirks,        Some("html"),                                                            None,                                     None ),
        bogus_characters_instead_of_public_quote:              ( "<!DOCTYPE html PUBLIC x ''''>",                                                                           QuirksMode::Quirks,        Some("html"),                                                            None,                                     None ),
        bogus_characters_instead_of_system_quote:              ( "<!DOCTYPE html SYSTEM x ''>",                                                                             QuirksMode::Quirks,        Some("html"),                                                            None,                                     None ),
        bogus_characters_instead_of_system_quote_after_public: ( "<!DOCTYPE html PUBLIC ''x''>",                                                                            QuirksMode::Quirks,        Some("html"),                                                            Some(""),                                 None ),
        special_quirks_mode_if_system_unset:                   ( r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01 Frameset//">"#,                                            QuirksMode::Quirks,        Some("html"),                                                            Some("-//W3C//DTD HTML 4.01 Frameset//"), None ),
        special_limited_quirks_mode_if_system_set:             ( r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01 Frameset//" "">"#,                                         QuirksMode::LimitedQuirks, Some("html"),                                                            Some("-//W3C//DTD HTML 4.01 Frameset//"), Some("") ),
    }

    #[test]
    fn test_invalid_inputs() {
        let test_cases = vec![
            b"".as_slice(),
            b"<div>".as_slice(),
            b"x<!DOCTYPE>".as_slice(),
            b"<!DOCTYPE>x".as_slice(),
            b"<!DOCTYPE".as_slice(),
            b"<!DOCTYPE html PUBLIC \">\">".as_slice(),
        ];

        for html in test_cases {
            assert!(
                DoctypeInfo::from_doctype_token(html).is_none(),
                "Should return None for invalid input: {:?}",
                String::from_utf8_lossy(html)
            );
        }
    }
}
