// src/utils/html.rs

/// Strips unsafe markup from admin-entered question text.
///
/// Whitelist based: harmless formatting tags survive, `<script>` (with its
/// content), `<iframe>` and event-handler attributes are removed.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
