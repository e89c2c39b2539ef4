use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static CUI_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^C\d{7}$").expect("CUI pattern is valid"));

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;\s]+").expect("separator pattern is valid"));

/// Turns free-text CUI fields from annotation tools into code sets.
pub struct CuiNormalizer {
    /// Tokens that did not look like a CUI, in the order they were seen
    rejected: Vec<String>,
}

impl CuiNormalizer {
    pub fn new() -> Self {
        Self {
            rejected: Vec::new(),
        }
    }

    /// Normalize one raw field value: split on commas/semicolons/whitespace,
    /// uppercase, and keep only well-formed `C0000000` codes
    pub fn normalize(&mut self, raw: &str) -> BTreeSet<String> {
        let mut cuis = BTreeSet::new();

        for token in SEPARATORS.split(raw.trim()) {
            if token.is_empty() {
                continue;
            }
            let code = token.to_uppercase();
            if CUI_PATTERN.is_match(&code) {
                cuis.insert(code);
            } else {
                tracing::warn!(token, "Ignoring malformed CUI");
                self.rejected.push(token.to_string());
            }
        }

        cuis
    }

    /// Normalize several field values into one set
    pub fn normalize_all<'a>(
        &mut self,
        raw: impl IntoIterator<Item = &'a str>,
    ) -> BTreeSet<String> {
        raw.into_iter().flat_map(|value| self.normalize(value)).collect()
    }

    pub fn get_rejected(&self) -> &[String] {
        &self.rejected
    }
}

impl Default for CuiNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Trim a free-text label and collapse internal whitespace
pub fn normalize_label(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
