use ammonia::Builder;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static NON_SLUG_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static REPEATED_HYPHENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

pub const FALLBACK_SLUG: &str = "berita";
pub const EXCERPT_LENGTH: usize = 160;

/// Derives a URL slug from a title: lowercase, drop anything outside
/// `[a-z0-9]`/whitespace/hyphen, whitespace to hyphens, collapse and trim hyphens.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let kept = NON_SLUG_CHARS.replace_all(&lowered, "");
    let hyphenated = WHITESPACE.replace_all(kept.trim(), "-");
    let collapsed = REPEATED_HYPHENS.replace_all(&hyphenated, "-");
    let slug = collapsed.trim_matches('-').to_string();
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Converts stored Markdown into HTML limited to a safe tag set.
/// Scripts, event handlers and unknown tags are removed.
pub fn render_markdown(markdown_input: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown_input, options);
    let mut unsafe_html = String::new();
    html::push_html(&mut unsafe_html, parser);

    let safe_tags: HashSet<&str> = [
        "h1", "h2", "h3", "h4", "h5", "h6", "b", "strong", "i", "em", "p", "br", "a", "ul", "ol", "li",
        "blockquote", "code", "pre", "hr", "img", "table", "thead", "tbody", "tr", "th", "td", "del",
    ]
    .into_iter()
    .collect();
    let generic_attributes: HashSet<&str> = ["src", "href", "alt", "title"].into_iter().collect();

    Builder::new()
        .tags(safe_tags)
        .generic_attributes(generic_attributes)
        .link_rel(Some("nofollow noopener"))
        .clean(&unsafe_html)
        .to_string()
}

/// Strips all HTML tags from input (for titles/excerpts).
pub fn strip_all_html(input: &str) -> String {
    Builder::new().tags(HashSet::new()).clean(input).to_string()
}

/// First `EXCERPT_LENGTH` characters of the plain text, with an ellipsis when cut.
pub fn excerpt_from(content: &str) -> String {
    let plain = strip_all_html(&render_markdown(content));
    let normalized = WHITESPACE.replace_all(plain.trim(), " ");
    if normalized.chars().count() <= EXCERPT_LENGTH {
        return normalized.into_owned();
    }
    let cut: String = normalized.chars().take(EXCERPT_LENGTH).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_normalizes_titles() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Rapat   Orang Tua -- 2024!! "), "rapat-orang-tua-2024");
        assert_eq!(slugify("PPDB: Gelombang #2"), "ppdb-gelombang-2");
        assert_eq!(slugify("---"), FALLBACK_SLUG);
        assert_eq!(slugify("Ñoño"), "oo");
    }

    #[test]
    fn markdown_rendering_drops_scripts() {
        let html = render_markdown("**Tebal** <script>alert(1)</script>");
        assert!(html.contains("<strong>Tebal</strong>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn strip_all_html_keeps_text() {
        assert_eq!(strip_all_html("<b>Judul</b> berita"), "Judul berita");
    }

    #[test]
    fn excerpt_is_truncated_on_char_boundary() {
        let long = "é".repeat(200);
        let excerpt = excerpt_from(&long);
        assert!(excerpt.ends_with("..."));
        assert_eq!(excerpt.chars().count(), EXCERPT_LENGTH + 3);
        assert_eq!(excerpt_from("Singkat saja"), "Singkat saja");
    }
}
