//! Brand signal extraction from fetched source bodies.
//!
//! Pulls titles, headings, and meta descriptions out of HTML with CSS
//! selectors, derives positioning snippets and frequency-ranked key
//! terms, and merges signals across sources with hard caps.

use contentforge_shared::BrandSignals;
use scraper::{Html, Selector};

/// Cap on the normalized plain-text content stored per source.
const CONTENT_CAP_BYTES: usize = 20_000;

/// Everyday words excluded from key-term ranking.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "you", "your", "from", "are", "our", "but",
    "not", "have", "has", "was", "were", "will", "can", "how", "what", "why", "when", "who",
    "their", "they", "them", "into", "about", "more", "less",
];

/// Extract brand signals from one HTML (or plain-text) body.
pub fn extract_signals(body: &str) -> BrandSignals {
    let doc = Html::parse_document(body);

    let title_sel = Selector::parse("title").expect("static selector");
    let heading_sel = Selector::parse("h1, h2").expect("static selector");
    let desc_sel = Selector::parse(r#"meta[name="description"]"#).expect("static selector");

    let titles: Vec<String> = doc
        .select(&title_sel)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .take(5)
        .collect();

    let headings: Vec<String> = doc
        .select(&heading_sel)
        .map(element_text)
        .filter(|h| !h.is_empty())
        .take(20)
        .collect();

    let descriptions: Vec<String> = doc
        .select(&desc_sel)
        .filter_map(|el| el.value().attr("content"))
        .map(|c| collapse_whitespace(c))
        .filter(|d| !d.is_empty())
        .take(5)
        .collect();

    let mut positioning_snippets: Vec<String> = Vec::new();
    positioning_snippets.extend(headings.iter().take(5).cloned());
    positioning_snippets.extend(descriptions.iter().take(3).cloned());
    positioning_snippets.truncate(10);

    let key_terms = rank_key_terms(&normalize_text(body), 25);

    BrandSignals {
        titles,
        headings,
        descriptions,
        positioning_snippets,
        key_terms,
    }
}

/// Normalize a fetched body to capped plain text (tags stripped,
/// whitespace collapsed).
pub fn normalize_text(body: &str) -> String {
    let doc = Html::parse_document(body);
    let root_sel = Selector::parse("html").expect("static selector");

    let text = match doc.select(&root_sel).next() {
        Some(root) => root.text().collect::<Vec<_>>().join(" "),
        None => body.to_string(),
    };

    let mut collapsed = collapse_whitespace(&text);
    if collapsed.len() > CONTENT_CAP_BYTES {
        let mut cut = CONTENT_CAP_BYTES;
        while !collapsed.is_char_boundary(cut) {
            cut -= 1;
        }
        collapsed.truncate(cut);
    }
    collapsed
}

/// Merge per-source signals, deduplicating and capping each list.
pub fn merge_signals(all: impl IntoIterator<Item = BrandSignals>) -> BrandSignals {
    let mut merged = BrandSignals::default();

    for signals in all {
        extend_unique(&mut merged.titles, signals.titles);
        extend_unique(&mut merged.headings, signals.headings);
        extend_unique(&mut merged.descriptions, signals.descriptions);
        extend_unique(&mut merged.positioning_snippets, signals.positioning_snippets);
        extend_unique(&mut merged.key_terms, signals.key_terms);
    }

    merged.titles.truncate(10);
    merged.headings.truncate(50);
    merged.descriptions.truncate(10);
    merged.positioning_snippets.truncate(25);
    merged.key_terms.truncate(50);
    merged
}

fn extend_unique(dest: &mut Vec<String>, src: Vec<String>) {
    for item in src {
        if !dest.contains(&item) {
            dest.push(item);
        }
    }
}

fn element_text(el: scraper::ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Frequency-rank word tokens, stopwords excluded, ties broken
/// alphabetically for determinism.
fn rank_key_terms(text: &str, limit: usize) -> Vec<String> {
    let token_re = regex::Regex::new(r"[A-Za-z][A-Za-z\-']{2,}").expect("static regex");
    let mut freq: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

    for token in token_re.find_iter(&text.to_lowercase()) {
        let tok = token.as_str();
        if STOPWORDS.contains(&tok) {
            continue;
        }
        *freq.entry(tok.to_string()).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, usize)> = freq.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(k, _)| k).collect()
}
