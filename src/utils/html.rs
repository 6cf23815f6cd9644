use std::collections::HashSet;

/// Decoding entities can expose markup that was hidden behind them
/// (`&lt;b&gt;`), so cleaning repeats until nothing changes.
const MAX_PASSES: usize = 4;

/// Strips all markup from user-supplied free text (captions, bios, comment
/// bodies) before it is stored.
///
/// `<script>` and `<style>` are dropped together with their content; any
/// other tag is removed and its text kept. The result is plain text, not
/// HTML: `&` and `<` are stored as typed, and escaping is left to whoever
/// renders it.
pub fn clean_text(input: &str) -> String {
    let mut builder = ammonia::Builder::empty();
    builder.clean_content_tags(HashSet::from(["script", "style"]));

    let mut current = input.to_string();
    for _ in 0..MAX_PASSES {
        let next = unescape(&builder.clean(&current).to_string());
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Reverses the escaping ammonia applies to text nodes.
fn unescape(html: &str) -> String {
    html.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}
