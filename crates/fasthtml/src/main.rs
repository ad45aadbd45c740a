use std::fs;
use std::io::Read;

use fasthtml::{parse_document, NodeKind, ParseOptions};

/// Parses the document named on the command line (or standard input)
/// and prints a summary of what was built.
pub fn main() {
    let html = match std::env::args().nth(1) {
        Some(path) => fs::read(&path).expect("could not read the input file"),
        None => {
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .expect("could not read standard input");
            bytes
        }
    };

    let (document, errors) = match parse_document(&html, ParseOptions::default()) {
        Ok(parsed) => parsed,
        Err(error) => {
            eprintln!("parse aborted: {error}");
            std::process::exit(1);
        }
    };

    let mut elements = 0u32;
    let mut text_bytes = 0usize;
    let mut comments = 0u32;
    for node in document.descendants(document.root()) {
        match document.kind(node) {
            NodeKind::Element(_) => elements += 1,
            NodeKind::Text(text) => text_bytes += text.len(),
            NodeKind::Comment(_) => comments += 1,
            _ => {}
        }
    }

    println!("Parsed {} bytes of input.", html.len());
    println!("Built {elements} elements, {comments} comments, {text_bytes} bytes of text.");
    println!("Document compatibility mode: {:?}.", document.quirks_mode());

    if errors.is_empty() {
        println!("No markup problems found.");
    } else {
        println!("Recovered from {} markup problems:", errors.len());
        for error in &errors {
            println!("  {error}");
        }
    }
}
