//! Keyword set used to classify history records.

/// Immutable, ordered set of lowercase match terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    terms: Vec<String>,
}

impl KeywordSet {
    /// Build from raw lines: trimmed, lowercased, blank lines dropped,
    /// duplicates removed keeping the first occurrence.
    #[must_use]
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut terms: Vec<String> = Vec::new();
        for line in lines {
            let term = line.as_ref().trim().to_lowercase();
            if !term.is_empty() && !terms.contains(&term) {
                terms.push(term);
            }
        }
        Self { terms }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Terms contained in `title` or `url`, case-insensitively, in set order.
    #[must_use]
    pub fn matches(&self, title: &str, url: &str) -> Vec<String> {
        let title = title.to_lowercase();
        let url = url.to_lowercase();
        self.terms
            .iter()
            .filter(|kw| title.contains(kw.as_str()) || url.contains(kw.as_str()))
            .cloned()
            .collect()
    }
}
