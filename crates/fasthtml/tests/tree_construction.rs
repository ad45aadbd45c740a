//! End-to-end tree construction checks.
//!
//! Each case parses a document and compares the whole tree against the
//! expected shape, rendered in the conventional test format: one node
//! per line, two spaces of indent per depth, attributes sorted by name.

use fasthtml::{parse_document, parse_fragment, ParseErrorKind, ParseOptions, QuirksMode, TagName};
use pretty_assertions::assert_eq;

fn tree_of(html: &str) -> String {
    let (document, _) = parse_document(html.as_bytes(), ParseOptions::default()).unwrap();
    document.tree_representation()
}

#[test]
fn head_and_body_are_partitioned() {
    assert_eq!(
        tree_of("<!DOCTYPE html><title>T</title><meta charset=utf-8><p>x"),
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |     <title>\n\
         |       \"T\"\n\
         |     <meta>\n\
         |       charset=\"utf-8\"\n\
         |   <body>\n\
         |     <p>\n\
         |       \"x\"\n"
    );
}

#[test]
fn legacy_doctype_keeps_its_identifiers() {
    assert_eq!(
        tree_of(
            "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 4.01//EN\" \
             \"http://www.w3.org/TR/html4/strict.dtd\"><p>x"
        ),
        "| <!DOCTYPE html \"-//W3C//DTD HTML 4.01//EN\" \"http://www.w3.org/TR/html4/strict.dtd\">\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <p>\n\
         |       \"x\"\n"
    );
}

#[test]
fn xhtml_transitional_doctype_indicates_limited_quirks() {
    let html = "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Transitional//EN\" \
                \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd\">";
    let (document, _) = parse_document(html.as_bytes(), ParseOptions::default()).unwrap();
    assert_eq!(QuirksMode::LimitedQuirks, document.quirks_mode());
}

/// The text after the misnested end tag must end up outside the
/// formatting element: that is the whole point of the repair.
#[test]
fn misnested_bold_does_not_leak_past_its_end_tag() {
    assert_eq!(
        tree_of("<!DOCTYPE html><b>1<p>2</b>3</p>"),
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <b>\n\
         |       \"1\"\n\
         |     <p>\n\
         |       <b>\n\
         |         \"2\"\n\
         |       \"3\"\n"
    );
}

#[test]
fn nested_anchor_is_split_around_the_block() {
    assert_eq!(
        tree_of("<!DOCTYPE html><a href=\"a\">x<div>y<a href=\"c\">z"),
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <a>\n\
         |       href=\"a\"\n\
         |       \"x\"\n\
         |     <div>\n\
         |       <a>\n\
         |         href=\"a\"\n\
         |         \"y\"\n\
         |       <a>\n\
         |         href=\"c\"\n\
         |         \"z\"\n"
    );
}

#[test]
fn table_sections_assemble_in_order() {
    assert_eq!(
        tree_of(
            "<!DOCTYPE html><table><caption>c</caption><colgroup><col></colgroup>\
             <tr><td>x</td></tr></table>"
        ),
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <table>\n\
         |       <caption>\n\
         |         \"c\"\n\
         |       <colgroup>\n\
         |         <col>\n\
         |       <tbody>\n\
         |         <tr>\n\
         |           <td>\n\
         |             \"x\"\n"
    );
}

#[test]
fn element_misplaced_in_table_is_foster_parented() {
    assert_eq!(
        tree_of("<!DOCTYPE html><table><div>oops</div><tr><td>x</td></tr></table>"),
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <div>\n\
         |       \"oops\"\n\
         |     <table>\n\
         |       <tbody>\n\
         |         <tr>\n\
         |           <td>\n\
         |             \"x\"\n"
    );
}

#[test]
fn annotation_xml_reopens_html_parsing() {
    assert_eq!(
        tree_of(
            "<!DOCTYPE html><math><annotation-xml encoding=\"text/html\">\
             <p>x</p></annotation-xml></math>"
        ),
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <math math>\n\
         |       <math annotation-xml>\n\
         |         encoding=\"text/html\"\n\
         |         <p>\n\
         |           \"x\"\n"
    );
}

#[test]
fn cdata_is_text_inside_foreign_content() {
    assert_eq!(
        tree_of("<!DOCTYPE html><svg><![CDATA[x < y]]></svg>"),
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <svg svg>\n\
         |       \"x < y\"\n"
    );
}

#[test]
fn template_resets_the_mode_when_it_closes() {
    assert_eq!(
        tree_of("<!DOCTYPE html><p>one<template><p>two</template><p>three"),
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <p>\n\
         |       \"one\"\n\
         |       <template>\n\
         |         <p>\n\
         |           \"two\"\n\
         |     <p>\n\
         |       \"three\"\n"
    );
}

#[test]
fn character_references_are_decoded() {
    assert_eq!(
        tree_of("<!DOCTYPE html><p>a &amp; b &copy;"),
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <p>\n\
         |       \"a & b \u{a9}\"\n"
    );
}

#[test]
fn unclosed_rawtext_region_is_diagnosed() {
    let html = b"<!DOCTYPE html><style>p { color";
    let (document, errors) = parse_document(html, ParseOptions::default()).unwrap();
    assert!(errors
        .iter()
        .any(|error| ParseErrorKind::EofInText == error.kind));
    assert_eq!(
        document.tree_representation(),
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |     <style>\n\
         |       \"p { color\"\n\
         |   <body>\n"
    );
}

#[test]
fn fragment_parse_in_a_table_row() {
    let (document, _) = parse_fragment(
        b"<td>a</td><td>b</td>",
        TagName::TR,
        ParseOptions::default(),
    )
    .unwrap();
    assert_eq!(
        document.tree_representation(),
        "| <html>\n\
         |   <td>\n\
         |     \"a\"\n\
         |   <td>\n\
         |     \"b\"\n"
    );
}

#[test]
fn stray_table_parts_outside_a_table_are_dropped() {
    let (document, errors) =
        parse_document(b"<!DOCTYPE html><td>x</td><p>y", ParseOptions::default()).unwrap();
    assert!(errors
        .iter()
        .any(|error| ParseErrorKind::StrayStartTag == error.kind));
    assert_eq!(
        document.tree_representation(),
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     \"x\"\n\
         |     <p>\n\
         |       \"y\"\n"
    );
}
