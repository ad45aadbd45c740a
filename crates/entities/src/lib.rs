use std::collections::BTreeMap;

use lazy_static::lazy_static;

/// U+FFFD REPLACEMENT CHARACTER
const UNICODE_REPLACEMENT_CHAR: &[u8] = b"\xEF\xBF\xBD";

/// Where in a document a span of text was found.
///
/// The rules for character references differ between attribute values
/// and markup text: references in attribute values are subject to the
/// ambiguous-ampersand rule, where an unterminated reference followed
/// by an alphanumeric or "=" must be left alone.
#[derive(Debug, PartialEq)]
pub enum HtmlContext {
    Attribute,
    BodyText,
}

/// Decodes all character references in a span of HTML text.
///
/// Text outside of any reference is copied through unchanged. Invalid
/// references remain as their literal source bytes.
pub fn decode(ctx: &HtmlContext, input: &[u8]) -> Box<[u8]> {
    let mut decoded: Vec<u8> = Vec::new();
    let end = input.len();
    let mut at = 0;
    let mut was_at = 0;

    while at < end {
        let next_character_reference_at = if let Some(pos) = memchr::memchr(b'&', &input[at..]) {
            at + pos
        } else {
            break;
        };

        if let Some((character_reference, token_len)) =
            decode_html_ref(ctx, input, next_character_reference_at)
        {
            // Ambiguous ampersand checking applies inside attribute values.
            if *ctx == HtmlContext::Attribute {
                let lacks_semicolon =
                    input[next_character_reference_at + token_len - 1] != b';';

                // Ambiguous references are not terminated by a semicolon _and_ have
                // trailing characters that are alphanumeric or "=".
                if lacks_semicolon
                    && (end > next_character_reference_at + token_len
                        && (input[next_character_reference_at + token_len].is_ascii_alphanumeric()
                            || input[next_character_reference_at + token_len] == b'='))
                {
                    at = next_character_reference_at + 1;
                    continue;
                }
            }

            at = next_character_reference_at;
            decoded.extend_from_slice(&input[was_at..at]);
            decoded.extend_from_slice(character_reference.as_ref());
            at += token_len;
            was_at = at;
            continue;
        }

        at = next_character_reference_at + 1;
    }

    if was_at < end {
        decoded.extend_from_slice(&input[was_at..]);
    }

    decoded.into_boxed_slice()
}

/// Decodes a single character reference starting at the given offset.
///
/// Returns the replacement bytes and the length of the matched span,
/// or `None` when the bytes at the offset do not form a reference.
pub fn decode_html_ref(
    _ctx: &HtmlContext,
    input: &[u8],
    offset: usize,
) -> Option<(Box<[u8]>, usize)> {
    if input.len() < offset + 3 {
        return None;
    }

    if input[offset] != b'&' {
        return None;
    }

    if input[offset + 1] == b'#' {
        return decode_numeric_character_reference(input, offset);
    }

    let prefix = [input[offset + 1], input[offset + 2]];
    let candidates = NAMED_CHARACTER_REFERENCES.get(&prefix)?;
    candidates
        .iter()
        .find_map(|(suffix, replacement)| -> Option<(Box<[u8]>, usize)> {
            let len = suffix.len();
            if offset + 3 + len > input.len() {
                None
            } else if &input[offset + 3..offset + 3 + len] == *suffix {
                Some((replacement.as_bytes().into(), 3 + len))
            } else {
                None
            }
        })
}

fn decode_numeric_character_reference(input: &[u8], offset: usize) -> Option<(Box<[u8]>, usize)> {
    /// Numeric references in the C1 controls range are interpreted as
    /// Windows-1252 bytes, per the HTML5 tokenizer.
    static CP1252_REPLACEMENTS: [u32; 32] = [
        0x20AC, // 0x80 -> EURO SIGN (€).
        0x81,   // 0x81 -> (no change).
        0x201A, // 0x82 -> SINGLE LOW-9 QUOTATION MARK (‚).
        0x0192, // 0x83 -> LATIN SMALL LETTER F WITH HOOK (ƒ).
        0x201E, // 0x84 -> DOUBLE LOW-9 QUOTATION MARK („).
        0x2026, // 0x85 -> HORIZONTAL ELLIPSIS (…).
        0x2020, // 0x86 -> DAGGER (†).
        0x2021, // 0x87 -> DOUBLE DAGGER (‡).
        0x02C6, // 0x88 -> MODIFIER LETTER CIRCUMFLEX ACCENT (ˆ).
        0x2030, // 0x89 -> PER MILLE SIGN (‰).
        0x0160, // 0x8A -> LATIN CAPITAL LETTER S WITH CARON (Š).
        0x2039, // 0x8B -> SINGLE LEFT-POINTING ANGLE QUOTATION MARK (‹).
        0x0152, // 0x8C -> LATIN CAPITAL LIGATURE OE (Œ).
        0x8D,   // 0x8D -> (no change).
        0x017D, // 0x8E -> LATIN CAPITAL LETTER Z WITH CARON (Ž).
        0x8F,   // 0x8F -> (no change).
        0x90,   // 0x90 -> (no change).
        0x2018, // 0x91 -> LEFT SINGLE QUOTATION MARK (‘).
        0x2019, // 0x92 -> RIGHT SINGLE QUOTATION MARK (’).
        0x201C, // 0x93 -> LEFT DOUBLE QUOTATION MARK (“).
        0x201D, // 0x94 -> RIGHT DOUBLE QUOTATION MARK (”).
        0x2022, // 0x95 -> BULLET (•).
        0x2013, // 0x96 -> EN DASH (–).
        0x2014, // 0x97 -> EM DASH (—).
        0x02DC, // 0x98 -> SMALL TILDE (˜).
        0x2122, // 0x99 -> TRADE MARK SIGN (™).
        0x0161, // 0x9A -> LATIN SMALL LETTER S WITH CARON (š).
        0x203A, // 0x9B -> SINGLE RIGHT-POINTING ANGLE QUOTATION MARK (›).
        0x0153, // 0x9C -> LATIN SMALL LIGATURE OE (œ).
        0x9D,   // 0x9D -> (no change).
        0x017E, // 0x9E -> LATIN SMALL LETTER Z WITH CARON (ž).
        0x0178, // 0x9F -> LATIN CAPITAL LETTER Y WITH DIAERESIS (Ÿ).
    ];

    fn hex_value(byte: u8) -> Option<u32> {
        match byte {
            b'0'..=b'9' => Some((byte - b'0') as u32),
            b'a'..=b'f' => Some((byte - b'a' + 10) as u32),
            b'A'..=b'F' => Some((byte - b'A' + 10) as u32),
            _ => None,
        }
    }

    let end = input.len();
    let mut at = offset;

    if end < offset + 3 {
        return None;
    }

    if input[at] != b'&' || input[at + 1] != b'#' {
        return None;
    }

    at += 2;

    let is_hex = b'X' == (input[at] & 0xDF);
    if is_hex {
        at += 1;
    }

    let zeros_at = at;

    // Skip past all the zeros: in most cases there will be none.
    while at < end && b'0' == input[at] {
        at += 1;
    }
    let zero_count = at - zeros_at;

    let digits_at = at;
    if is_hex {
        while at < end && hex_value(input[at]).is_some() {
            at += 1;
        }
    } else {
        while at < end && input[at].is_ascii_digit() {
            at += 1;
        }
    }
    let digit_count = at - digits_at;
    let after_digits = at;

    let has_trailing_semicolon = (after_digits < end) && b';' == input[at];
    let end_of_span = if has_trailing_semicolon {
        after_digits + 1
    } else {
        after_digits
    };
    let matched_byte_length = end_of_span - offset;

    // `&#` or `&#x` without digits returns into plaintext.
    if zero_count == 0 && digit_count == 0 {
        return None;
    }

    // Whereas `&#` and only zeros is invalid.
    if digit_count == 0 {
        return Some((UNICODE_REPLACEMENT_CHAR.into(), matched_byte_length));
    }

    // If there are too many digits then it's not worth parsing: the
    // code point is beyond the Unicode range and therefore invalid.
    if digit_count > if is_hex { 6 } else { 7 } {
        return Some((UNICODE_REPLACEMENT_CHAR.into(), matched_byte_length));
    }

    let mut code_point = 0u32;
    at = digits_at;
    for _ in 0..digit_count {
        if is_hex {
            code_point = (code_point << 4) + hex_value(input[at]).unwrap_or(0);
        } else {
            code_point = code_point * 10 + (input[at] - b'0') as u32;
        }
        at += 1;
    }

    if (0x80..=0x9F).contains(&code_point) {
        code_point = CP1252_REPLACEMENTS[(code_point - 0x80) as usize];
    }

    // Surrogate halves cannot be represented in a document.
    if (0xD800..=0xDFFF).contains(&code_point) {
        return Some((UNICODE_REPLACEMENT_CHAR.into(), matched_byte_length));
    }

    Some((code_point_to_utf8_bytes(code_point), matched_byte_length))
}

fn code_point_to_utf8_bytes(code_point: u32) -> Box<[u8]> {
    let mut slice = [0u8; 4];
    char::from_u32(code_point).map_or(UNICODE_REPLACEMENT_CHAR.into(), |c| {
        c.encode_utf8(&mut slice);
        slice[..c.len_utf8()].into()
    })
}

type SuffixTable = &'static [(&'static [u8], &'static str)];

macro_rules! refs {
    ( $map:ident: $( $prefix:literal => [ $( ($suffix:literal, $value:literal) ),+ $(,)? ] );+ $(;)? ) => {
        $( $map.insert(*$prefix, &[ $( ($suffix as &'static [u8], $value) ),+ ] as SuffixTable); )+
    };
}

lazy_static! {
    /// Named character references, grouped by the two bytes following
    /// the ampersand. Suffix candidates are ordered longest-first so
    /// that the semicolon-terminated form wins over the bare legacy
    /// form, and longer names win over their prefixes.
    ///
    /// The table carries the full set of legacy references, which may
    /// appear without a terminating semicolon, plus the common
    /// semicolon-only names. References absent from the table are left
    /// in the text as literal bytes.
    static ref NAMED_CHARACTER_REFERENCES: BTreeMap<[u8; 2], SuffixTable> = {
        let mut map: BTreeMap<[u8; 2], SuffixTable> = BTreeMap::new();
        refs! { map:
            b"AE" => [(b"lig;", "\u{C6}"), (b"lig", "\u{C6}")];
            b"AM" => [(b"P;", "&"), (b"P", "&")];
            b"Aa" => [(b"cute;", "\u{C1}"), (b"cute", "\u{C1}")];
            b"Ac" => [(b"irc;", "\u{C2}"), (b"irc", "\u{C2}")];
            b"Ag" => [(b"rave;", "\u{C0}"), (b"rave", "\u{C0}")];
            b"Al" => [(b"pha;", "\u{391}")];
            b"Ar" => [(b"ing;", "\u{C5}"), (b"ing", "\u{C5}")];
            b"At" => [(b"ilde;", "\u{C3}"), (b"ilde", "\u{C3}")];
            b"Au" => [(b"ml;", "\u{C4}"), (b"ml", "\u{C4}")];
            b"Be" => [(b"ta;", "\u{392}")];
            b"CO" => [(b"PY;", "\u{A9}"), (b"PY", "\u{A9}")];
            b"Cc" => [(b"edil;", "\u{C7}"), (b"edil", "\u{C7}")];
            b"Ch" => [(b"i;", "\u{3A7}")];
            b"Da" => [(b"gger;", "\u{2021}")];
            b"De" => [(b"lta;", "\u{394}")];
            b"ET" => [(b"H;", "\u{D0}"), (b"H", "\u{D0}")];
            b"Ea" => [(b"cute;", "\u{C9}"), (b"cute", "\u{C9}")];
            b"Ec" => [(b"irc;", "\u{CA}"), (b"irc", "\u{CA}")];
            b"Eg" => [(b"rave;", "\u{C8}"), (b"rave", "\u{C8}")];
            b"Ep" => [(b"silon;", "\u{395}")];
            b"Et" => [(b"a;", "\u{397}")];
            b"Eu" => [(b"ml;", "\u{CB}"), (b"ml", "\u{CB}")];
            b"GT" => [(b";", ">"), (b"", ">")];
            b"Ga" => [(b"mma;", "\u{393}")];
            b"Ia" => [(b"cute;", "\u{CD}"), (b"cute", "\u{CD}")];
            b"Ic" => [(b"irc;", "\u{CE}"), (b"irc", "\u{CE}")];
            b"Ig" => [(b"rave;", "\u{CC}"), (b"rave", "\u{CC}")];
            b"Io" => [(b"ta;", "\u{399}")];
            b"Iu" => [(b"ml;", "\u{CF}"), (b"ml", "\u{CF}")];
            b"Ka" => [(b"ppa;", "\u{39A}")];
            b"LT" => [(b";", "<"), (b"", "<")];
            b"La" => [(b"mbda;", "\u{39B}")];
            b"Mu" => [(b";", "\u{39C}")];
            b"Nt" => [(b"ilde;", "\u{D1}"), (b"ilde", "\u{D1}")];
            b"Nu" => [(b";", "\u{39D}")];
            b"OE" => [(b"lig;", "\u{152}")];
            b"Oa" => [(b"cute;", "\u{D3}"), (b"cute", "\u{D3}")];
            b"Oc" => [(b"irc;", "\u{D4}"), (b"irc", "\u{D4}")];
            b"Og" => [(b"rave;", "\u{D2}"), (b"rave", "\u{D2}")];
            b"Om" => [(b"icron;", "\u{39F}"), (b"ega;", "\u{3A9}")];
            b"Os" => [(b"lash;", "\u{D8}"), (b"lash", "\u{D8}")];
            b"Ot" => [(b"ilde;", "\u{D5}"), (b"ilde", "\u{D5}")];
            b"Ou" => [(b"ml;", "\u{D6}"), (b"ml", "\u{D6}")];
            b"Ph" => [(b"i;", "\u{3A6}")];
            b"Pi" => [(b";", "\u{3A0}")];
            b"Ps" => [(b"i;", "\u{3A8}")];
            b"QU" => [(b"OT;", "\""), (b"OT", "\"")];
            b"RE" => [(b"G;", "\u{AE}"), (b"G", "\u{AE}")];
            b"Rh" => [(b"o;", "\u{3A1}")];
            b"Sc" => [(b"aron;", "\u{160}")];
            b"Si" => [(b"gma;", "\u{3A3}")];
            b"TH" => [(b"ORN;", "\u{DE}"), (b"ORN", "\u{DE}")];
            b"Ta" => [(b"u;", "\u{3A4}")];
            b"Th" => [(b"eta;", "\u{398}")];
            b"Ua" => [(b"cute;", "\u{DA}"), (b"cute", "\u{DA}")];
            b"Uc" => [(b"irc;", "\u{DB}"), (b"irc", "\u{DB}")];
            b"Ug" => [(b"rave;", "\u{D9}"), (b"rave", "\u{D9}")];
            b"Up" => [(b"silon;", "\u{3A5}")];
            b"Uu" => [(b"ml;", "\u{DC}"), (b"ml", "\u{DC}")];
            b"Xi" => [(b";", "\u{39E}")];
            b"Ya" => [(b"cute;", "\u{DD}"), (b"cute", "\u{DD}")];
            b"Yu" => [(b"ml;", "\u{178}")];
            b"Ze" => [(b"ta;", "\u{396}")];
            b"aa" => [(b"cute;", "\u{E1}"), (b"cute", "\u{E1}")];
            b"ac" => [(b"irc;", "\u{E2}"), (b"ute;", "\u{B4}"), (b"irc", "\u{E2}"), (b"ute", "\u{B4}")];
            b"ae" => [(b"lig;", "\u{E6}"), (b"lig", "\u{E6}")];
            b"ag" => [(b"rave;", "\u{E0}"), (b"rave", "\u{E0}")];
            b"al" => [(b"pha;", "\u{3B1}")];
            b"am" => [(b"p;", "&"), (b"p", "&")];
            b"an" => [(b"d;", "\u{2227}")];
            b"ap" => [(b"os;", "'")];
            b"ar" => [(b"ing;", "\u{E5}"), (b"ing", "\u{E5}")];
            b"as" => [(b"ymp;", "\u{2248}")];
            b"at" => [(b"ilde;", "\u{E3}"), (b"ilde", "\u{E3}")];
            b"au" => [(b"ml;", "\u{E4}"), (b"ml", "\u{E4}")];
            b"bd" => [(b"quo;", "\u{201E}")];
            b"be" => [(b"ta;", "\u{3B2}")];
            b"br" => [(b"vbar;", "\u{A6}"), (b"vbar", "\u{A6}")];
            b"bu" => [(b"ll;", "\u{2022}")];
            b"ca" => [(b"p;", "\u{2229}")];
            b"cc" => [(b"edil;", "\u{E7}"), (b"edil", "\u{E7}")];
            b"ce" => [(b"dil;", "\u{B8}"), (b"nt;", "\u{A2}"), (b"dil", "\u{B8}"), (b"nt", "\u{A2}")];
            b"ch" => [(b"i;", "\u{3C7}")];
            b"ci" => [(b"rc;", "\u{2C6}")];
            b"cl" => [(b"ubs;", "\u{2663}")];
            b"co" => [(b"py;", "\u{A9}"), (b"py", "\u{A9}")];
            b"cu" => [(b"rren;", "\u{A4}"), (b"rren", "\u{A4}"), (b"p;", "\u{222A}")];
            b"da" => [(b"gger;", "\u{2020}"), (b"rr;", "\u{2193}")];
            b"de" => [(b"lta;", "\u{3B4}"), (b"g;", "\u{B0}"), (b"g", "\u{B0}")];
            b"di" => [(b"vide;", "\u{F7}"), (b"vide", "\u{F7}"), (b"ams;", "\u{2666}")];
            b"ea" => [(b"cute;", "\u{E9}"), (b"cute", "\u{E9}")];
            b"ec" => [(b"irc;", "\u{EA}"), (b"irc", "\u{EA}")];
            b"eg" => [(b"rave;", "\u{E8}"), (b"rave", "\u{E8}")];
            b"em" => [(b"pty;", "\u{2205}"), (b"sp;", "\u{2003}")];
            b"en" => [(b"sp;", "\u{2002}")];
            b"ep" => [(b"silon;", "\u{3B5}")];
            b"eq" => [(b"uiv;", "\u{2261}")];
            b"et" => [(b"a;", "\u{3B7}"), (b"h;", "\u{F0}"), (b"h", "\u{F0}")];
            b"eu" => [(b"ml;", "\u{EB}"), (b"ro;", "\u{20AC}"), (b"ml", "\u{EB}")];
            b"ex" => [(b"ist;", "\u{2203}")];
            b"fn" => [(b"of;", "\u{192}")];
            b"fo" => [(b"rall;", "\u{2200}")];
            b"fr" => [
                (b"ac12;", "\u{BD}"), (b"ac14;", "\u{BC}"), (b"ac34;", "\u{BE}"),
                (b"ac12", "\u{BD}"), (b"ac14", "\u{BC}"), (b"ac34", "\u{BE}"),
                (b"asl;", "\u{2044}"),
            ];
            b"ga" => [(b"mma;", "\u{3B3}")];
            b"ge" => [(b";", "\u{2265}")];
            b"gt" => [(b";", ">"), (b"", ">")];
            b"ha" => [(b"rr;", "\u{2194}")];
            b"he" => [(b"llip;", "\u{2026}"), (b"arts;", "\u{2665}")];
            b"ia" => [(b"cute;", "\u{ED}"), (b"cute", "\u{ED}")];
            b"ic" => [(b"irc;", "\u{EE}"), (b"irc", "\u{EE}")];
            b"ie" => [(b"xcl;", "\u{A1}"), (b"xcl", "\u{A1}")];
            b"ig" => [(b"rave;", "\u{EC}"), (b"rave", "\u{EC}")];
            b"in" => [(b"fin;", "\u{221E}"), (b"t;", "\u{222B}")];
            b"io" => [(b"ta;", "\u{3B9}")];
            b"iq" => [(b"uest;", "\u{BF}"), (b"uest", "\u{BF}")];
            b"is" => [(b"in;", "\u{2208}")];
            b"iu" => [(b"ml;", "\u{EF}"), (b"ml", "\u{EF}")];
            b"ka" => [(b"ppa;", "\u{3BA}")];
            b"la" => [
                (b"mbda;", "\u{3BB}"), (b"quo;", "\u{AB}"), (b"quo", "\u{AB}"),
                (b"ng;", "\u{27E8}"), (b"rr;", "\u{2190}"),
            ];
            b"lc" => [(b"eil;", "\u{2308}")];
            b"ld" => [(b"quo;", "\u{201C}")];
            b"le" => [(b";", "\u{2264}")];
            b"lf" => [(b"loor;", "\u{230A}")];
            b"lo" => [(b"wast;", "\u{2217}"), (b"z;", "\u{25CA}")];
            b"lr" => [(b"m;", "\u{200E}")];
            b"ls" => [(b"aquo;", "\u{2039}"), (b"quo;", "\u{2018}")];
            b"lt" => [(b";", "<"), (b"", "<")];
            b"ma" => [(b"cr;", "\u{AF}"), (b"cr", "\u{AF}")];
            b"md" => [(b"ash;", "\u{2014}")];
            b"mi" => [
                (b"ddot;", "\u{B7}"), (b"ddot", "\u{B7}"), (b"cro;", "\u{B5}"),
                (b"nus;", "\u{2212}"), (b"cro", "\u{B5}"),
            ];
            b"mu" => [(b";", "\u{3BC}")];
            b"na" => [(b"bla;", "\u{2207}")];
            b"nb" => [(b"sp;", "\u{A0}"), (b"sp", "\u{A0}")];
            b"nd" => [(b"ash;", "\u{2013}")];
            b"ne" => [(b";", "\u{2260}")];
            b"ni" => [(b";", "\u{220B}")];
            b"no" => [(b"tin;", "\u{2209}"), (b"t;", "\u{AC}"), (b"t", "\u{AC}")];
            b"nt" => [(b"ilde;", "\u{F1}"), (b"ilde", "\u{F1}")];
            b"nu" => [(b";", "\u{3BD}")];
            b"oa" => [(b"cute;", "\u{F3}"), (b"cute", "\u{F3}")];
            b"oc" => [(b"irc;", "\u{F4}"), (b"irc", "\u{F4}")];
            b"oe" => [(b"lig;", "\u{153}")];
            b"og" => [(b"rave;", "\u{F2}"), (b"rave", "\u{F2}")];
            b"ol" => [(b"ine;", "\u{203E}")];
            b"om" => [(b"icron;", "\u{3BF}"), (b"ega;", "\u{3C9}")];
            b"op" => [(b"lus;", "\u{2295}")];
            b"or" => [(b"df;", "\u{AA}"), (b"dm;", "\u{BA}"), (b"df", "\u{AA}"), (b"dm", "\u{BA}"), (b";", "\u{2228}")];
            b"os" => [(b"lash;", "\u{F8}"), (b"lash", "\u{F8}")];
            b"ot" => [(b"imes;", "\u{2297}"), (b"ilde;", "\u{F5}"), (b"ilde", "\u{F5}")];
            b"ou" => [(b"ml;", "\u{F6}"), (b"ml", "\u{F6}")];
            b"pa" => [(b"ra;", "\u{B6}"), (b"rt;", "\u{2202}"), (b"ra", "\u{B6}")];
            b"pe" => [(b"rmil;", "\u{2030}"), (b"rp;", "\u{22A5}")];
            b"ph" => [(b"i;", "\u{3C6}")];
            b"pi" => [(b";", "\u{3C0}")];
            b"pl" => [(b"usmn;", "\u{B1}"), (b"usmn", "\u{B1}")];
            b"po" => [(b"und;", "\u{A3}"), (b"und", "\u{A3}")];
            b"pr" => [(b"ime;", "\u{2032}"), (b"od;", "\u{220F}"), (b"op;", "\u{221D}")];
            b"ps" => [(b"i;", "\u{3C8}")];
            b"qu" => [(b"ot;", "\""), (b"ot", "\"")];
            b"ra" => [
                (b"dic;", "\u{221A}"), (b"quo;", "\u{BB}"), (b"quo", "\u{BB}"),
                (b"ng;", "\u{27E9}"), (b"rr;", "\u{2192}"),
            ];
            b"rc" => [(b"eil;", "\u{2309}")];
            b"rd" => [(b"quo;", "\u{201D}")];
            b"re" => [(b"g;", "\u{AE}"), (b"g", "\u{AE}")];
            b"rf" => [(b"loor;", "\u{230B}")];
            b"rh" => [(b"o;", "\u{3C1}")];
            b"rl" => [(b"m;", "\u{200F}")];
            b"rs" => [(b"aquo;", "\u{203A}"), (b"quo;", "\u{2019}")];
            b"sb" => [(b"quo;", "\u{201A}")];
            b"sc" => [(b"aron;", "\u{161}")];
            b"sd" => [(b"ot;", "\u{22C5}")];
            b"se" => [(b"ct;", "\u{A7}"), (b"ct", "\u{A7}")];
            b"sh" => [(b"y;", "\u{AD}"), (b"y", "\u{AD}")];
            b"si" => [(b"gmaf;", "\u{3C2}"), (b"gma;", "\u{3C3}"), (b"m;", "\u{223C}")];
            b"sp" => [(b"ades;", "\u{2660}")];
            b"su" => [
                (b"be;", "\u{2286}"), (b"pe;", "\u{2287}"),
                (b"p1;", "\u{B9}"), (b"p2;", "\u{B2}"), (b"p3;", "\u{B3}"),
                (b"p1", "\u{B9}"), (b"p2", "\u{B2}"), (b"p3", "\u{B3}"),
                (b"b;", "\u{2282}"), (b"m;", "\u{2211}"), (b"p;", "\u{2283}"),
            ];
            b"sz" => [(b"lig;", "\u{DF}"), (b"lig", "\u{DF}")];
            b"ta" => [(b"u;", "\u{3C4}")];
            b"th" => [
                (b"insp;", "\u{2009}"), (b"ere4;", "\u{2234}"), (b"eta;", "\u{3B8}"),
                (b"orn;", "\u{FE}"), (b"orn", "\u{FE}"),
            ];
            b"ti" => [(b"lde;", "\u{2DC}"), (b"mes;", "\u{D7}"), (b"mes", "\u{D7}")];
            b"tr" => [(b"ade;", "\u{2122}")];
            b"ua" => [(b"cute;", "\u{FA}"), (b"cute", "\u{FA}"), (b"rr;", "\u{2191}")];
            b"uc" => [(b"irc;", "\u{FB}"), (b"irc", "\u{FB}")];
            b"ug" => [(b"rave;", "\u{F9}"), (b"rave", "\u{F9}")];
            b"um" => [(b"l;", "\u{A8}"), (b"l", "\u{A8}")];
            b"up" => [(b"silon;", "\u{3C5}")];
            b"uu" => [(b"ml;", "\u{FC}"), (b"ml", "\u{FC}")];
            b"xi" => [(b";", "\u{3BE}")];
            b"ya" => [(b"cute;", "\u{FD}"), (b"cute", "\u{FD}")];
            b"ye" => [(b"n;", "\u{A5}"), (b"n", "\u{A5}")];
            b"yu" => [(b"ml;", "\u{FF}"), (b"ml", "\u{FF}")];
            b"ze" => [(b"ta;", "\u{3B6}")];
            b"zw" => [(b"nj;", "\u{200C}"), (b"j;", "\u{200D}")];
        }
        map
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_out_of_range_numeric_hex_entity() {
        let input = b"&#xFFFFFF;";
        let decoded = decode(&HtmlContext::BodyText, input);
        let decoded = String::from_utf8(decoded.to_vec()).unwrap();
        assert_eq!(decoded, "\u{FFFD}");
    }

    #[test]
    fn decode_ref_out_of_range_numeric_hex_entity() {
        let input = b"&#xFFFFFF;";
        let (decoded, token_len) = decode_html_ref(&HtmlContext::BodyText, input, 0).unwrap();
        let decoded = String::from_utf8(decoded.to_vec()).unwrap();
        assert_eq!(decoded, "\u{FFFD}");
        assert_eq!(token_len, 10);
    }

    #[test]
    fn decode_uppercase_legacy_reference() {
        let input = b"&LT";
        let (decoded, len) = decode_html_ref(&HtmlContext::BodyText, input, 0).unwrap();
        assert_eq!(decoded, b"<".as_slice().into());
        assert_eq!(len, 3);
    }

    #[test]
    fn decode_aelig_reference() {
        let (decoded, token_len) = decode_html_ref(&HtmlContext::BodyText, b"&AElig;", 0).unwrap();
        let decoded = String::from_utf8_lossy(&decoded);
        assert_eq!(decoded, "Æ");
        assert_eq!(token_len, 7);
    }

    #[test]
    fn test_named_references() {
        // Common named references.
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&amp;", 0),
            Some((b"&".as_slice().into(), 5))
        );
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&lt;", 0),
            Some((b"<".as_slice().into(), 4))
        );
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&gt;", 0),
            Some((b">".as_slice().into(), 4))
        );
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&quot;", 0),
            Some((b"\"".as_slice().into(), 6))
        );

        // Case sensitivity.
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&LT;", 0),
            Some((b"<".as_slice().into(), 4))
        );

        // With and without trailing semicolon.
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&nbsp", 0),
            Some((b"\xC2\xA0".as_slice().into(), 5))
        );
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&nbsp;", 0),
            Some((b"\xC2\xA0".as_slice().into(), 6))
        );
    }

    #[test]
    fn test_numeric_decimal_references() {
        // ASCII range.
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&#65;", 0),
            Some((b"A".as_slice().into(), 5))
        );

        // Multi-byte UTF-8.
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&#8364;", 0),
            Some((b"\xE2\x82\xAC".as_slice().into(), 7)) // Euro sign.
        );

        // Without semicolon.
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&#65", 0),
            Some((b"A".as_slice().into(), 4))
        );

        // With leading zeros.
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&#0065;", 0),
            Some((b"A".as_slice().into(), 7))
        );
    }

    #[test]
    fn test_numeric_hex_references() {
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&#x41;", 0),
            Some((b"A".as_slice().into(), 6))
        );
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&#X41;", 0),
            Some((b"A".as_slice().into(), 6))
        );
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&#x20AC;", 0),
            Some((b"\xE2\x82\xAC".as_slice().into(), 8)) // Euro sign.
        );
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&#x41", 0),
            Some((b"A".as_slice().into(), 5))
        );
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&#x0041;", 0),
            Some((b"A".as_slice().into(), 8))
        );
    }

    #[test]
    fn test_cp1252_replacements() {
        // 0x80 -> EURO SIGN.
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&#128;", 0),
            Some((b"\xE2\x82\xAC".as_slice().into(), 6))
        );

        // 0x82 -> SINGLE LOW-9 QUOTATION MARK.
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&#130;", 0),
            Some((b"\xE2\x80\x9A".as_slice().into(), 6))
        );
    }

    #[test]
    fn test_invalid_references() {
        // Surrogate halves.
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&#xD800;", 0),
            Some((UNICODE_REPLACEMENT_CHAR.into(), 8))
        );

        // Just "&#" without digits.
        assert_eq!(decode_html_ref(&HtmlContext::BodyText, b"&#;", 0), None);

        // "&#" with only zeros.
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&#0;", 0),
            Some((UNICODE_REPLACEMENT_CHAR.into(), 4))
        );

        // Too many digits for hex.
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&#x1234567;", 0),
            Some((UNICODE_REPLACEMENT_CHAR.into(), 11))
        );

        // Too many digits for decimal.
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, b"&#12345678;", 0),
            Some((UNICODE_REPLACEMENT_CHAR.into(), 11))
        );
    }

    #[test]
    fn test_reference_with_offset() {
        let input = b"text&amp;more";
        assert_eq!(
            decode_html_ref(&HtmlContext::BodyText, input, 4),
            Some((b"&".as_slice().into(), 5))
        );

        // Offset too large.
        assert_eq!(decode_html_ref(&HtmlContext::BodyText, input, 10), None);
    }

    #[test]
    fn test_non_reference_input() {
        // No & character.
        assert_eq!(decode_html_ref(&HtmlContext::BodyText, b"text", 0), None);

        // Input too short.
        assert_eq!(decode_html_ref(&HtmlContext::BodyText, b"&", 0), None);
        assert_eq!(decode_html_ref(&HtmlContext::BodyText, b"&;", 0), None);
        assert_eq!(decode_html_ref(&HtmlContext::BodyText, b"&A;", 0), None);
        assert_eq!(decode_html_ref(&HtmlContext::BodyText, b"&AE;", 0), None);
    }

    #[test]
    fn test_prefix_match_consumes_longest_name() {
        // "&notanentity;" matches the legacy "not" without a semicolon.
        let (decoded, token_len) =
            decode_html_ref(&HtmlContext::BodyText, b"&notanentity;", 0).unwrap();
        let decoded =
            String::from_utf8(decoded.to_vec()).expect("decoded string must be valid utf-8 bytes.");
        assert_eq!(decoded, "¬");
        assert_eq!(token_len, 4);

        // But "&notin;" wins over the shorter "not".
        let (decoded, token_len) =
            decode_html_ref(&HtmlContext::BodyText, b"&notin;", 0).unwrap();
        let decoded = String::from_utf8_lossy(&decoded);
        assert_eq!(decoded, "∉");
        assert_eq!(token_len, 7);
    }

    #[test]
    fn test_ambiguous_ampersand_in_attribute() {
        // "&ampz" decodes in markup text but remains an ambiguous
        // ampersand inside an attribute value.
        let decoded = decode(&HtmlContext::BodyText, b"&ampz");
        assert_eq!(decoded.as_ref(), b"&z");

        let decoded = decode(&HtmlContext::Attribute, b"&ampz");
        assert_eq!(decoded.as_ref(), b"&ampz");

        // A terminating semicolon is never ambiguous.
        let decoded = decode(&HtmlContext::Attribute, b"&amp;z");
        assert_eq!(decoded.as_ref(), b"&z");

        // Non-alphanumeric trailing bytes are not ambiguous either.
        let decoded = decode(&HtmlContext::Attribute, b"&amp z");
        assert_eq!(decoded.as_ref(), b"& z");
    }

    #[test]
    fn test_decode_mixed_text() {
        let input = b"Simultaneously testing numeric (&#0038;) and named (&amp;) references";

        let (decoded, token_len) = decode_html_ref(&HtmlContext::BodyText, input, 32).unwrap();
        assert_eq!(String::from_utf8_lossy(&decoded), "&");
        assert_eq!(token_len, 7);

        let (decoded, token_len) = decode_html_ref(&HtmlContext::BodyText, input, 52).unwrap();
        assert_eq!(String::from_utf8_lossy(&decoded), "&");
        assert_eq!(token_len, 5);

        let decoded = decode(&HtmlContext::BodyText, input);
        assert_eq!(
            String::from_utf8_lossy(&decoded),
            "Simultaneously testing numeric (&) and named (&) references"
        );

        // Reference with no name decodes to nothing.
        assert_eq!(decode_html_ref(&HtmlContext::BodyText, b"&;", 0), None);
    }
}
