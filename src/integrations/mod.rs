//! HTTP clients for the external services the pipeline writes to.

pub mod discord;
pub mod notion;
pub mod supabase;

pub use discord::DiscordNotifier;
pub use notion::NotionSink;
pub use supabase::SupabaseQueue;

/// Cut `text` to at most `max` characters, on a char boundary.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
