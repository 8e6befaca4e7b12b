use std::collections::HashMap;

/// Word characters for boundary checks: ASCII alphanumerics and `_`.
pub(crate) fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Counts whole-word occurrences of `word` in `text`. `word` must be
/// lower-case ASCII and `text` already lower-cased.
pub(crate) fn count_word(text: &str, word: &str) -> usize {
    let bytes = text.as_bytes();
    text.match_indices(word)
        .filter(|(start, _)| {
            let end = start + word.len();
            let before = *start == 0 || !is_word_byte(bytes[start - 1]);
            let after = end == bytes.len() || !is_word_byte(bytes[end]);
            before && after
        })
        .count()
}

/// Counter that remembers first-seen order, so ties rank by which key
/// showed up first.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    counts: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl Tally {
    pub(crate) fn add(&mut self, key: &str, n: usize) {
        match self.index.get(key) {
            Some(&slot) => self.counts[slot].1 += n,
            None => {
                self.index.insert(key.to_string(), self.counts.len());
                self.counts.push((key.to_string(), n));
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(key, n)| (key.as_str(), *n))
    }

    /// Keys by descending count, at most `limit` of them.
    pub(crate) fn top(&self, limit: usize) -> Vec<String> {
        let mut ranked: Vec<_> = self.counts.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.into_iter().take(limit).map(|(key, _)| key.clone()).collect()
    }

    /// First key to reach the strictly highest count.
    pub(crate) fn leader(&self) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for (key, n) in self.iter() {
            if best.is_none_or(|(_, top)| n > top) {
                best = Some((key, n));
            }
        }
        best.map(|(key, _)| key)
    }
}
