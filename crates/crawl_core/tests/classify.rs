use crawl_core::{classify, ContentKind};

#[test]
fn upper_case_pdf_suffix_is_pdf() {
    assert_eq!(classify("https://x.thws.de/file.PDF", None), ContentKind::Pdf);
}

#[test]
fn ics_suffix_ignores_query() {
    assert_eq!(classify("https://x.thws.de/cal.ics?x=1", None), ContentKind::Ical);
}

#[test]
fn plain_page_with_html_header_is_html() {
    assert_eq!(
        classify("https://x.thws.de/page", Some("text/html")),
        ContentKind::Html
    );
}

#[test]
fn declared_types_win_without_suffix() {
    assert_eq!(
        classify("https://x.thws.de/download?id=4", Some("application/pdf")),
        ContentKind::Pdf
    );
    assert_eq!(
        classify("https://x.thws.de/export", Some("Text/Calendar; charset=utf-8")),
        ContentKind::Ical
    );
}

#[test]
fn pdf_takes_precedence_over_calendar() {
    assert_eq!(
        classify("https://x.thws.de/cal.ics", Some("application/pdf")),
        ContentKind::Pdf
    );
}

#[test]
fn unknown_defaults_to_html() {
    assert_eq!(classify("https://x.thws.de/", None), ContentKind::Html);
    assert_eq!(classify("not a url", Some("image/png")), ContentKind::Html);
}

#[test]
fn kinds_serialize_lowercase() {
    assert_eq!(ContentKind::Ical.to_string(), "ical");
    assert_eq!(ContentKind::Pdf.as_str(), "pdf");
}
