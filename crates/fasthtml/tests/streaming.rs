//! Chunked input must never change the result.
//!
//! The parser pauses mid-token when a chunk boundary splits one and
//! resumes when more bytes arrive, so the tree and the diagnostics have
//! to come out byte-for-byte identical no matter how the input is
//! divided. These properties drive randomly assembled documents through
//! randomly placed chunk boundaries to look for splits that leak into
//! the output.

use fasthtml::{parse_document, ParseOptions, ParseSession};
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

/// A randomly assembled, deliberately messy document: valid markup,
/// misnesting, unclosed tags, comments, entities, and foreign content
/// all mixed together so that chunk boundaries land inside interesting
/// tokens.
#[derive(Debug, Clone)]
struct MessyHtml(String);

impl Arbitrary for MessyHtml {
    fn arbitrary(g: &mut Gen) -> Self {
        const PIECES: &[&str] = &[
            "<!DOCTYPE html>",
            "<p>",
            "</p>",
            "<div class=\"x y\">",
            "</div>",
            "<b>",
            "</b>",
            "<i>",
            "</i>",
            "plain text",
            "a &amp; b",
            "&notin;",
            "&notit;",
            "<!-- a comment -->",
            "<!-->",
            "<table>",
            "<tr><td>cell",
            "</table>",
            "<ul><li>one<li>two",
            "</ul>",
            "<template>",
            "</template>",
            "<svg><g/>",
            "</svg>",
            "<math><mi>x</mi>",
            "</math>",
            "<select><option>opt",
            "</select>",
            "<style>p::before { content: '<'; }</style>",
            "<textarea>&lt;raw&gt;",
            "</textarea>",
            "<img src=unquoted alt='single'>",
            "< not a tag",
            "</>",
            "<?bogus>",
            "\r\nline\rbreaks\n",
        ];

        let count = usize::arbitrary(g) % 24;
        let mut html = String::new();
        for _ in 0..count {
            html.push_str(g.choose(PIECES).unwrap_or(&""));
        }
        MessyHtml(html)
    }
}

fn parse_whole(html: &[u8]) -> (String, Vec<String>) {
    let (document, errors) = parse_document(html, ParseOptions::default()).unwrap();
    (
        document.tree_representation(),
        errors.iter().map(|error| error.to_string()).collect(),
    )
}

fn parse_chunked(html: &[u8], boundaries: &[usize]) -> (String, Vec<String>) {
    let mut session = ParseSession::new(ParseOptions::default()).unwrap();
    let mut fed = 0;
    for &boundary in boundaries {
        let upto = boundary.min(html.len());
        if upto > fed {
            session.feed(&html[fed..upto]).unwrap();
            fed = upto;
        }
    }
    session.feed(&html[fed..]).unwrap();
    let (document, errors) = session.finish().unwrap();
    (
        document.tree_representation(),
        errors.iter().map(|error| error.to_string()).collect(),
    )
}

#[quickcheck]
fn chunk_boundaries_do_not_change_the_tree(input: MessyHtml, mut boundaries: Vec<usize>) -> bool {
    let html = input.0.as_bytes();
    for boundary in boundaries.iter_mut() {
        *boundary %= html.len().max(1);
    }
    boundaries.sort_unstable();

    parse_whole(html) == parse_chunked(html, &boundaries)
}

#[quickcheck]
fn byte_at_a_time_matches_one_shot(input: MessyHtml) -> bool {
    let html = input.0.as_bytes();

    let mut session = ParseSession::new(ParseOptions::default()).unwrap();
    for byte in html {
        session.feed(std::slice::from_ref(byte)).unwrap();
    }
    let (document, errors) = session.finish().unwrap();

    let chunked = (
        document.tree_representation(),
        errors
            .iter()
            .map(|error| error.to_string())
            .collect::<Vec<_>>(),
    );

    parse_whole(html) == chunked
}

/// A split in the middle of a multi-byte sequence must not corrupt the
/// decoded text.
#[test]
fn utf8_sequences_survive_chunk_splits() {
    let html = "<!DOCTYPE html><p>héllo wörld \u{1F600}</p>".as_bytes();
    let whole = parse_whole(html);
    for split in 1..html.len() {
        assert_eq!(
            whole,
            parse_chunked(html, &[split]),
            "diverged when split at byte {split}"
        );
    }
}

#[test]
fn split_inside_a_character_reference() {
    let html = b"<!DOCTYPE html><p>a &amp; b</p>";
    let whole = parse_whole(html);
    for split in 18..26 {
        assert_eq!(whole, parse_chunked(html, &[split]));
    }
}

/// However broken the input, parsing terminates and the parent and
/// child links of the resulting tree agree with each other.
#[quickcheck]
fn every_input_builds_a_consistent_tree(html: MessyHtml) -> bool {
    let Ok((document, _)) = parse_document(html.0.as_bytes(), ParseOptions::default()) else {
        return false;
    };

    let root = document.root();
    if document.parent(root).is_some() {
        return false;
    }
    for node in document.descendants(root) {
        let Some(parent) = document.parent(node) else {
            return false;
        };
        if !document.children(parent).contains(&node) {
            return false;
        }
    }
    true
}
