//! Splitting encoded text into record tags and ordering them.
//!
//! The builder creates records back to front so that the ring, walked from
//! the header, yields chunk 0 first. The walker may enter the ring anywhere,
//! so it rotates what it saw around the header's position.

use std::cmp::Ordering;

/// Slices `text` into consecutive pieces of at most `tag_size` characters.
///
/// Empty text yields no pieces. A `tag_size` of 0 is treated as 1.
pub fn split(text: &str, tag_size: usize) -> Vec<&str> {
    let tag_size = tag_size.max(1);
    let mut chunks = Vec::with_capacity(text.len().div_ceil(tag_size));
    let mut rest = text;
    while !rest.is_empty() {
        let end = rest
            .char_indices()
            .nth(tag_size)
            .map_or(rest.len(), |(i, _)| i);
        let (head, tail) = rest.split_at(end);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

/// Order in which chunk records are created: last chunk first.
pub fn creation_order<T>(mut chunks: Vec<T>) -> Vec<T> {
    chunks.reverse();
    chunks
}

/// Recovers chunk order from a walk whose header sat at `header`.
///
/// Items walked after the header come first, then the items walked before
/// it. The header itself is dropped.
pub fn reconstruction_order<T>(walked: Vec<T>, header: usize) -> Vec<T> {
    let mut after = Vec::with_capacity(walked.len());
    let mut before = Vec::new();
    for (i, item) in walked.into_iter().enumerate() {
        match i.cmp(&header) {
            Ordering::Less => before.push(item),
            Ordering::Greater => after.push(item),
            Ordering::Equal => {}
        }
    }
    after.extend(before);
    after
}
