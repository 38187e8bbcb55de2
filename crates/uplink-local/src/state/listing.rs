//! Directory-style listing over sorted keys.
//!
//! Keys are walked in order. Those at or before the cursor, or outside the
//! prefix, are skipped. In non-recursive mode everything below the next `/`
//! after the prefix collapses into a single prefix entry.

/// Listing delimiter.
pub const DELIMITER: char = '/';

/// One listing result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEntry<T> {
    /// A concrete entry.
    Item(T),
    /// A synthetic prefix ending with the delimiter.
    Prefix(String),
}

/// List `(key, value)` pairs sorted by key.
pub fn list_sorted<'a, T: 'a, I>(
    items: I,
    prefix: &str,
    cursor: &str,
    recursive: bool,
) -> Vec<ListEntry<&'a T>>
where
    I: IntoIterator<Item = (&'a str, &'a T)>,
{
    let mut entries = Vec::new();
    let mut last_prefix: Option<String> = None;

    for (key, value) in items {
        if !key.starts_with(prefix) {
            continue;
        }

        if !recursive {
            let after_prefix = &key[prefix.len()..];
            if let Some(pos) = after_prefix.find(DELIMITER) {
                let common = format!("{prefix}{}{DELIMITER}", &after_prefix[..pos]);
                if common.as_str() <= cursor || last_prefix.as_deref() == Some(common.as_str()) {
                    continue;
                }
                last_prefix = Some(common.clone());
                entries.push(ListEntry::Prefix(common));
                continue;
            }
        }

        if !cursor.is_empty() && key <= cursor {
            continue;
        }
        entries.push(ListEntry::Item(value));
    }

    entries
}
