//! Raw dictionary entries

use serde::Serialize;

/// One sense of an entry with its English glosses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SenseGroup {
    pub glosses: Vec<String>,
}

/// A dictionary entry as scanned from one `<entry>` element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Kanji written forms (`k_ele/keb`), in document order
    pub written_forms: Vec<String>,
    /// Kana readings (`r_ele/reb`), in document order
    pub readings: Vec<String>,
    pub senses: Vec<SenseGroup>,
}

impl Entry {
    /// First reading, or empty
    pub fn first_reading(&self) -> &str {
        self.readings.first().map(String::as_str).unwrap_or("")
    }

    /// First gloss of the first sense, or empty
    pub fn first_meaning(&self) -> &str {
        self.senses
            .first()
            .and_then(|s| s.glosses.first())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.written_forms.is_empty() && self.readings.is_empty() && self.senses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_fields() {
        let entry = Entry {
            written_forms: vec!["木林".to_string()],
            readings: vec!["もくりん".to_string(), "きばやし".to_string()],
            senses: vec![
                SenseGroup {
                    glosses: vec!["grove".to_string(), "thicket".to_string()],
                },
                SenseGroup {
                    glosses: vec!["copse".to_string()],
                },
            ],
        };
        assert_eq!(entry.first_reading(), "もくりん");
        assert_eq!(entry.first_meaning(), "grove");
    }

    #[test]
    fn test_missing_fields_are_empty() {
        let entry = Entry {
            senses: vec![SenseGroup::default()],
            ..Default::default()
        };
        assert_eq!(entry.first_reading(), "");
        assert_eq!(entry.first_meaning(), "");
        assert!(!entry.is_empty());
        assert!(Entry::default().is_empty());
    }
}
