//! Turning model output into text fit for a speech engine.
//!
//! Models asked for plain spoken prose still emit headings, bullet markers,
//! emphasis, links and citation markers now and then, especially with web
//! search enabled. The speech model reads everything verbatim, so those
//! artifacts are removed before text leaves the pipeline.

use std::sync::LazyLock;

use regex::Regex;

/// Counts whitespace-separated words.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

struct Patterns {
    heading: Regex,
    heading_marker: Regex,
    rule: Regex,
    list_marker: Regex,
    wrapped_link: Regex,
    link: Regex,
    citation: Regex,
    lenticular: Regex,
    source: Regex,
    url: Regex,
    emphasis: Regex,
    whitespace: Regex,
    space_before_punct: Regex,
}

impl Patterns {
    fn compile() -> Option<Self> {
        Some(Self {
            heading: Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+(?:[^\s.!?]+[ \t]*){0,8}$").ok()?,
            heading_marker: Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+").ok()?,
            rule: Regex::new(r"(?m)^[ \t]*(?:[-*_][ \t]*){3,}$").ok()?,
            list_marker: Regex::new(r"(?m)^[ \t]*(?:[-*+•]|\d{1,2}[.)])[ \t]+").ok()?,
            wrapped_link: Regex::new(r"\(\[[^\[\]]*\]\([^)]*\)\)").ok()?,
            link: Regex::new(r"\[([^\[\]]*)\]\([^)]*\)").ok()?,
            citation: Regex::new(r"\[\d[\d,\- ]*\]").ok()?,
            lenticular: Regex::new(r"【[^】]*】").ok()?,
            source: Regex::new(r"(?i)\(sources?\b[^)]*\)").ok()?,
            url: Regex::new(
                r#"\((?:https?://|www\.)[^\s()<>"]*\)|<(?:https?://|www\.)[^\s<>"]*>|(?:https?://|www\.)[^\s<>"]*[^\s<>".,;:!?)\]]"#,
            )
            .ok()?,
            emphasis: Regex::new(r"\*+|`+|__").ok()?,
            whitespace: Regex::new(r"\s+").ok()?,
            space_before_punct: Regex::new(r" +([,.;:!?])").ok()?,
        })
    }
}

static PATTERNS: LazyLock<Option<Patterns>> = LazyLock::new(Patterns::compile);

/// Strips markdown and citation artifacts and collapses whitespace.
///
/// Removes short heading lines, horizontal rules, list markers, emphasis
/// markers, inline code ticks, bare URLs and citation markers (`[1]`, `【…】`,
/// `(source: …)`, parenthesized links). Markdown links keep their text, and a
/// heading marker in front of a full sentence goes while the sentence stays.
/// Punctuation following a URL is kept. Paragraph breaks become single spaces.
#[must_use]
pub fn sanitize_for_speech(text: &str) -> String {
    let Some(p) = PATTERNS.as_ref() else {
        return text.split_whitespace().collect::<Vec<_>>().join(" ");
    };

    let text = p.heading.replace_all(text, "");
    let text = p.heading_marker.replace_all(&text, "");
    let text = p.rule.replace_all(&text, "");
    let text = p.list_marker.replace_all(&text, "");
    let text = p.wrapped_link.replace_all(&text, "");
    let text = p.link.replace_all(&text, "$1");
    let text = p.citation.replace_all(&text, "");
    let text = p.lenticular.replace_all(&text, "");
    let text = p.source.replace_all(&text, "");
    let text = p.url.replace_all(&text, "");
    let text = p.emphasis.replace_all(&text, "");
    let text = p.whitespace.replace_all(&text, " ");
    let text = p.space_before_punct.replace_all(&text, "$1");
    text.trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_prose_is_unchanged() {
        let text = "Welcome to Paris. The city is lovely, isn't it?";
        assert_eq!(sanitize_for_speech(text), text);
    }

    #[test]
    fn drops_headings_and_rules() {
        let text = "## Architecture\nThe Louvre is vast.\n---\nIt was a palace.";
        assert_eq!(
            sanitize_for_speech(text),
            "The Louvre is vast. It was a palace."
        );
    }

    #[test]
    fn strips_list_markers() {
        let text = "- First stop.\n* Second stop.\n2. Third stop.\n3) Fourth stop.";
        assert_eq!(
            sanitize_for_speech(text),
            "First stop. Second stop. Third stop. Fourth stop."
        );
    }

    #[test]
    fn strips_emphasis() {
        assert_eq!(
            sanitize_for_speech("The **Eiffel Tower** is *iconic* and __tall__."),
            "The Eiffel Tower is iconic and tall."
        );
    }

    #[test]
    fn keeps_link_text() {
        assert_eq!(
            sanitize_for_speech("Visit the [Musée d'Orsay](https://www.musee-orsay.fr) today."),
            "Visit the Musée d'Orsay today."
        );
    }

    #[test]
    fn drops_parenthesized_link_citations() {
        assert_eq!(
            sanitize_for_speech("Built in 1889 ([wikipedia.org](https://en.wikipedia.org/wiki/Eiffel_Tower))."),
            "Built in 1889."
        );
    }

    #[test]
    fn drops_citation_markers() {
        assert_eq!(
            sanitize_for_speech("Opened in 1793 [1]. Rebuilt later [2, 3]【4:0†source】."),
            "Opened in 1793. Rebuilt later."
        );
        assert_eq!(
            sanitize_for_speech("Crêpes are popular (source: Paris Tourism)."),
            "Crêpes are popular."
        );
    }

    #[test]
    fn drops_bare_urls() {
        assert_eq!(
            sanitize_for_speech("See https://example.com for more or www.example.org too."),
            "See for more or too."
        );
    }

    #[test]
    fn keeps_non_citation_brackets() {
        assert_eq!(sanitize_for_speech("A [quiet] corner."), "A [quiet] corner.");
    }

    #[test]
    fn keeps_lines_starting_with_numbers_or_hash() {
        assert_eq!(
            sanitize_for_speech("The tower was finished in\n1889. It drew crowds."),
            "The tower was finished in 1889. It drew crowds."
        );
        assert_eq!(
            sanitize_for_speech("Paris is famous.\n#1 on every list is the Louvre, a former palace."),
            "Paris is famous. #1 on every list is the Louvre, a former palace."
        );
    }

    #[test]
    fn heading_marker_before_sentence_keeps_sentence() {
        assert_eq!(
            sanitize_for_speech("# The Marais grew up around royal squares and mansions.\nWalk on."),
            "The Marais grew up around royal squares and mansions. Walk on."
        );
    }

    #[test]
    fn url_keeps_sentence_punctuation() {
        assert_eq!(
            sanitize_for_speech("Tickets are sold at www.louvre.fr. Next, walk north."),
            "Tickets are sold at. Next, walk north."
        );
        assert_eq!(
            sanitize_for_speech("Book ahead (https://www.louvre.fr/en), then walk north."),
            "Book ahead, then walk north."
        );
    }

    #[test]
    fn collapses_whitespace_and_paragraphs() {
        assert_eq!(
            sanitize_for_speech("  First   paragraph.\n\n\nSecond\tparagraph.  "),
            "First paragraph. Second paragraph."
        );
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(sanitize_for_speech(""), "");
        assert_eq!(sanitize_for_speech("# Only a heading"), "");
    }

    #[test]
    fn counts_words() {
        assert_eq!(word_count("one two  three\nfour"), 4);
        assert_eq!(word_count("   "), 0);
    }
}
