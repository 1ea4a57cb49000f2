//! Entity reference resolution
//!
//! JMdict declares several hundred general entities in its DOCTYPE internal
//! subset (`<!ENTITY n "noun (common) (futsuumeishi)">`) and references them
//! as `&n;`. The table collects those declarations so text can be unescaped
//! without a validating parser.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// Why a text node could not be unescaped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityError {
    /// `&` without a closing `;`
    Unterminated,
    /// `&#...;` that is not a valid code point
    InvalidCharRef(String),
}

impl fmt::Display for EntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unterminated => write!(f, "unterminated entity reference"),
            Self::InvalidCharRef(r) => write!(f, "invalid character reference &{};", r),
        }
    }
}

impl std::error::Error for EntityError {}

/// General entities known to the reader
#[derive(Debug, Clone, Default)]
pub struct EntityTable {
    declared: HashMap<String, String>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    pub fn declare(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.declared.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        predefined(name).or_else(|| self.declared.get(name).map(String::as_str))
    }

    /// Collect `<!ENTITY name "value">` declarations from a DOCTYPE body.
    ///
    /// Parameter entities (`<!ENTITY % ...>`) and external entities are
    /// ignored. Returns the number of declarations added.
    pub fn declare_from_doctype(&mut self, doctype: &str) -> usize {
        let mut added = 0;
        let mut rest = doctype;

        while let Some(start) = rest.find("<!ENTITY") {
            rest = &rest[start + "<!ENTITY".len()..];
            let body = rest.trim_start();
            if body.starts_with('%') {
                continue;
            }

            let name_end = body
                .find(|c: char| c.is_whitespace())
                .unwrap_or(body.len());
            let name = &body[..name_end];
            let after_name = body[name_end..].trim_start();

            let Some(quote) = after_name.chars().next().filter(|c| *c == '"' || *c == '\'')
            else {
                continue;
            };
            let value_start = &after_name[1..];
            let Some(value_end) = value_start.find(quote) else {
                break;
            };

            if !name.is_empty() {
                self.declare(name, &value_start[..value_end]);
                added += 1;
            }
            rest = &value_start[value_end..];
        }

        added
    }

    /// Replace entity and character references in `raw`.
    ///
    /// Unknown named references are kept literally (`&name;`).
    pub fn unescape<'a>(&self, raw: &'a str) -> Result<Cow<'a, str>, EntityError> {
        if !raw.contains('&') {
            return Ok(Cow::Borrowed(raw));
        }

        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;

        while let Some(amp) = rest.find('&') {
            out.push_str(&rest[..amp]);
            let tail = &rest[amp + 1..];
            let semi = tail.find(';').ok_or(EntityError::Unterminated)?;
            let reference = &tail[..semi];

            if let Some(code) = reference.strip_prefix('#') {
                out.push(char_ref(code)?);
            } else if let Some(value) = self.get(reference) {
                out.push_str(value);
            } else {
                out.push('&');
                out.push_str(reference);
                out.push(';');
            }

            rest = &tail[semi + 1..];
        }
        out.push_str(rest);

        Ok(Cow::Owned(out))
    }
}

fn predefined(name: &str) -> Option<&'static str> {
    match name {
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "quot" => Some("\""),
        "apos" => Some("'"),
        _ => None,
    }
}

fn char_ref(code: &str) -> Result<char, EntityError> {
    let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => code.parse::<u32>(),
    };
    value
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| EntityError::InvalidCharRef(format!("#{}", code)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_borrowed() {
        let table = EntityTable::new();
        assert!(matches!(table.unescape("grove"), Ok(Cow::Borrowed("grove"))));
    }

    #[test]
    fn test_predefined_and_numeric_refs() {
        let table = EntityTable::new();
        assert_eq!(table.unescape("a &amp; b").unwrap(), "a & b");
        assert_eq!(table.unescape("&#26408;&#x6797;").unwrap(), "木林");
        assert_eq!(
            table.unescape("&#xZZ;"),
            Err(EntityError::InvalidCharRef("#xZZ".to_string()))
        );
        assert_eq!(table.unescape("broken &amp"), Err(EntityError::Unterminated));
    }

    #[test]
    fn test_unknown_refs_kept_literally() {
        let table = EntityTable::new();
        assert_eq!(table.unescape("&uk; word").unwrap(), "&uk; word");
    }

    #[test]
    fn test_doctype_declarations() {
        let doctype = r#"JMdict [
<!ELEMENT JMdict (entry*)>
<!ENTITY % param "ignored">
<!ENTITY n "noun (common) (futsuumeishi)">
<!ENTITY uk 'word usually written using kana alone'>
]"#;
        let mut table = EntityTable::new();
        assert_eq!(table.declare_from_doctype(doctype), 2);
        assert_eq!(table.get("n"), Some("noun (common) (futsuumeishi)"));
        assert_eq!(table.get("param"), None);
        assert_eq!(
            table.unescape("&uk;").unwrap(),
            "word usually written using kana alone"
        );
    }
}
