use std::sync::OnceLock;

use fasthtml::{parse_document, ParseOptions, ParseSession};

fn main() {
    divan::main();
}

/// Builds a representative document once: headings, paragraphs with
/// formatting and entities, tables, lists, and the odd piece of broken
/// markup, repeated until the input is a few hundred kilobytes.
fn input() -> &'static [u8] {
    static INPUT: OnceLock<Vec<u8>> = OnceLock::new();
    INPUT
        .get_or_init(|| {
            let mut html = String::from("<!DOCTYPE html><html><head><title>bench</title></head><body>");
            for i in 0..2_000 {
                html.push_str(&format!(
                    "<h2 id=\"s{i}\">Section {i}</h2>\
                     <p>Some <b>bold</b> and <i>italic &amp; nested</i> text.</p>\
                     <ul><li>one<li>two<li>three</ul>\
                     <table><tr><td>a</td><td>b</td></tr></table>\
                     <p>an <b>unclosed paragraph with <i>misnesting</b></i>"
                ));
            }
            html.push_str("</body></html>");
            html.into_bytes()
        })
        .as_slice()
}

#[divan::bench(skip_ext_time = true)]
fn bench_full_document(bencher: divan::Bencher) {
    bencher.bench(|| {
        parse_document(input(), ParseOptions::default()).expect("input must parse")
    });
}

#[divan::bench(skip_ext_time = true)]
fn bench_chunked_feed(bencher: divan::Bencher) {
    bencher.bench(|| {
        let mut session = ParseSession::new(ParseOptions::default()).expect("options are valid");
        for chunk in input().chunks(4096) {
            session.feed(chunk).expect("input must parse");
        }
        session.finish().expect("input must parse")
    });
}
