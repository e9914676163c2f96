use scraper::ElementRef;
use unicode_normalization::UnicodeNormalization;

/// Normalize Unicode text to NFC and collapse every whitespace run
/// (including non-breaking spaces from HTML) into a single space.
pub fn clean_text(input: &str) -> String {
    let nfc: String = input.nfc().collect();
    nfc.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// All text beneath an element, text nodes joined by spaces.
pub fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// All text beneath an element with `" | "` between non-empty text nodes,
/// so regex scans can tell where one cell's text ends.
pub fn delimited_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(clean_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}
