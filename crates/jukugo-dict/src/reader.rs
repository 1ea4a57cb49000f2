//! Streaming entry reader

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;

use crate::entities::EntityTable;
use crate::entry::{Entry, SenseGroup};
use crate::error::{DictError, DictResult};

/// Consecutive syntax errors tolerated before the scan gives up
const MAX_CONSECUTIVE_ERRORS: usize = 64;

/// Counters describing a scan so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// Entries yielded
    pub entries: usize,
    /// Sub-elements (`k_ele`, `r_ele`, `sense`) dropped as malformed
    pub skipped_elements: usize,
    /// Entries dropped because nothing in them was usable
    pub skipped_entries: usize,
    /// Recoverable XML syntax errors
    pub syntax_errors: usize,
}

/// Owned view of the parser events the scanner cares about
enum Token {
    Start(Vec<u8>),
    End(Vec<u8>),
    Text(Option<String>),
    DocType(String),
    Eof,
    Other,
}

/// Child texts of one sub-element, as (element name, text) pairs
type ElementTexts = Vec<(Vec<u8>, String)>;

/// Where scanning of a sub-element stopped
enum Boundary {
    /// Its own end tag
    Element,
    /// `</entry>` arrived first
    EntryEnd,
    /// A new `<entry>` started inside it
    EntryStart,
    Eof,
}

/// Lazy reader over dictionary entries.
///
/// Only the entry currently being scanned is held in memory. The iterator
/// yields `Err` at most once, for an unrecoverable failure, and is fused
/// afterwards.
pub struct DictionaryReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    entities: EntityTable,
    stats: ParseStats,
    consecutive_errors: usize,
    last_error_position: Option<u64>,
    /// An `<entry>` start tag was consumed while scanning the previous entry
    pending_entry: bool,
    done: bool,
}

impl DictionaryReader<BufReader<File>> {
    /// Open a dictionary file. Fails before any entry is produced if the file
    /// cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> DictResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DictError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Opened dictionary at {:?}", path);
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> DictionaryReader<R> {
    pub fn from_reader(inner: R) -> Self {
        let mut reader = Reader::from_reader(inner);
        let config = reader.config_mut();
        config.trim_text(true);
        config.check_end_names = false;
        config.expand_empty_elements = true;

        Self {
            reader,
            buf: Vec::new(),
            entities: EntityTable::new(),
            stats: ParseStats::default(),
            consecutive_errors: 0,
            last_error_position: None,
            pending_entry: false,
            done: false,
        }
    }

    pub fn stats(&self) -> ParseStats {
        self.stats
    }

    pub fn entities(&self) -> &EntityTable {
        &self.entities
    }

    fn next_token(&mut self) -> Result<Token, quick_xml::Error> {
        self.buf.clear();
        let token = match self.reader.read_event_into(&mut self.buf)? {
            Event::Start(e) => Token::Start(e.local_name().as_ref().to_vec()),
            Event::End(e) => Token::End(e.local_name().as_ref().to_vec()),
            Event::Text(t) => Token::Text(
                std::str::from_utf8(&t)
                    .ok()
                    .and_then(|raw| self.entities.unescape(raw).ok())
                    .map(|text| text.into_owned()),
            ),
            Event::CData(c) => Token::Text(std::str::from_utf8(&c).ok().map(str::to_owned)),
            Event::DocType(d) => Token::DocType(String::from_utf8_lossy(&d).into_owned()),
            Event::Eof => Token::Eof,
            _ => Token::Other,
        };
        self.consecutive_errors = 0;
        Ok(token)
    }

    /// Decide whether a parser error can be skipped.
    ///
    /// I/O failures are fatal. Syntax errors are counted and skipped unless
    /// the reader stops making progress or keeps failing.
    fn recover(&mut self, err: quick_xml::Error) -> DictResult<()> {
        if let quick_xml::Error::Io(io) = err {
            return Err(DictError::Io(io));
        }

        let position = self.reader.buffer_position() as u64;
        self.stats.syntax_errors += 1;
        self.consecutive_errors += 1;

        let stalled = self.last_error_position == Some(position);
        self.last_error_position = Some(position);

        if stalled || self.consecutive_errors > MAX_CONSECUTIVE_ERRORS {
            return Err(DictError::Malformed {
                position,
                message: err.to_string(),
            });
        }

        tracing::warn!("Skipping malformed XML at byte {}: {}", position, err);
        Ok(())
    }

    fn bad_tag(&mut self, name: &[u8]) {
        self.stats.syntax_errors += 1;
        tracing::warn!(
            "Skipping malformed tag <{}> at byte {}",
            String::from_utf8_lossy(name),
            self.reader.buffer_position()
        );
    }

    /// Read the texts of one sub-element whose start tag `element` was just
    /// consumed.
    ///
    /// Scanning stops at the element's own end tag, or earlier at an `entry`
    /// boundary or end of input. The texts are `None` if anything inside
    /// could not be decoded, a tag was malformed or a child was left open.
    fn read_element(&mut self, element: &[u8]) -> DictResult<(Option<ElementTexts>, Boundary)> {
        let mut texts = Vec::new();
        let mut open: Vec<Vec<u8>> = Vec::new();
        let mut malformed = false;

        let boundary = loop {
            match self.next_token() {
                Ok(Token::Start(name)) if name.as_slice() == b"entry" => {
                    malformed = true;
                    break Boundary::EntryStart;
                }
                Ok(Token::Start(name)) => {
                    if is_xml_name(&name) {
                        open.push(name);
                    } else {
                        self.bad_tag(&name);
                        malformed = true;
                    }
                }
                Ok(Token::End(name)) if name.as_slice() == element => {
                    malformed |= !open.is_empty();
                    break Boundary::Element;
                }
                Ok(Token::End(name)) if name.as_slice() == b"entry" => {
                    malformed = true;
                    break Boundary::EntryEnd;
                }
                Ok(Token::End(name)) => match open.iter().rposition(|n| *n == name) {
                    Some(i) => {
                        malformed |= i + 1 != open.len();
                        open.truncate(i);
                    }
                    None => malformed = true,
                },
                Ok(Token::Text(Some(text))) => {
                    if let Some(name) = open.last() {
                        texts.push((name.clone(), text));
                    }
                }
                Ok(Token::Text(None)) => malformed = true,
                Ok(Token::Eof) => {
                    malformed = true;
                    break Boundary::Eof;
                }
                Ok(Token::DocType(_)) | Ok(Token::Other) => {}
                Err(e) => {
                    self.recover(e)?;
                    malformed = true;
                }
            }
        };

        Ok((if malformed { None } else { Some(texts) }, boundary))
    }

    /// Scan one `<entry>` whose start tag was just consumed.
    ///
    /// An entry left unterminated ends where the next `<entry>` starts.
    fn read_entry(&mut self) -> DictResult<Option<Entry>> {
        let mut entry = Entry::default();

        loop {
            match self.next_token() {
                Ok(Token::Start(name)) => {
                    let field: &[u8] = match name.as_slice() {
                        b"k_ele" => b"keb",
                        b"r_ele" => b"reb",
                        b"sense" => b"gloss",
                        b"entry" => {
                            self.pending_entry = true;
                            break;
                        }
                        other => {
                            if !is_xml_name(other) {
                                self.bad_tag(other);
                            }
                            continue;
                        }
                    };

                    let (texts, boundary) = self.read_element(&name)?;
                    match texts {
                        Some(texts) => {
                            let mut values = texts
                                .into_iter()
                                .filter(|(child, _)| child.as_slice() == field)
                                .map(|(_, text)| text);

                            match name.as_slice() {
                                b"k_ele" => match values.next() {
                                    Some(keb) => entry.written_forms.push(keb),
                                    None => self.stats.skipped_elements += 1,
                                },
                                b"r_ele" => match values.next() {
                                    Some(reb) => entry.readings.push(reb),
                                    None => self.stats.skipped_elements += 1,
                                },
                                _ => entry.senses.push(SenseGroup {
                                    glosses: values.collect(),
                                }),
                            }
                        }
                        None => {
                            self.stats.skipped_elements += 1;
                            tracing::debug!(
                                "Skipped malformed <{}> element",
                                String::from_utf8_lossy(&name)
                            );
                        }
                    }

                    match boundary {
                        Boundary::Element => {}
                        Boundary::EntryEnd | Boundary::Eof => break,
                        Boundary::EntryStart => {
                            self.pending_entry = true;
                            break;
                        }
                    }
                }
                Ok(Token::End(name)) if name.as_slice() == b"entry" => break,
                Ok(Token::Eof) => break,
                Ok(_) => {}
                Err(e) => self.recover(e)?,
            }
        }

        if entry.is_empty() {
            self.stats.skipped_entries += 1;
            return Ok(None);
        }
        Ok(Some(entry))
    }
}

/// Whether `name` can be an XML element name
fn is_xml_name(name: &[u8]) -> bool {
    let Ok(name) = std::str::from_utf8(name) else {
        return false;
    };
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.' | '\u{B7}'))
}

impl<R: BufRead> Iterator for DictionaryReader<R> {
    type Item = DictResult<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let result = if std::mem::take(&mut self.pending_entry) {
                self.read_entry()
            } else {
                match self.next_token() {
                    Ok(Token::Start(name)) if name.as_slice() == b"entry" => self.read_entry(),
                    Ok(Token::DocType(body)) => {
                        let declared = self.entities.declare_from_doctype(&body);
                        tracing::debug!("Registered {} entity declarations", declared);
                        Ok(None)
                    }
                    Ok(Token::Eof) => {
                        self.done = true;
                        tracing::debug!("Dictionary scan finished: {:?}", self.stats);
                        Ok(None)
                    }
                    Ok(_) => Ok(None),
                    Err(e) => self.recover(e).map(|_| None),
                }
            };

            match result {
                Ok(Some(entry)) => {
                    self.stats.entries += 1;
                    return Some(Ok(entry));
                }
                Ok(None) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

impl<R: BufRead> std::iter::FusedIterator for DictionaryReader<R> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(xml: &str) -> (Vec<Entry>, ParseStats) {
        let mut reader = DictionaryReader::from_reader(xml.as_bytes());
        let entries = reader.by_ref().collect::<DictResult<Vec<_>>>().unwrap();
        (entries, reader.stats())
    }

    #[test]
    fn test_reads_fields_in_order() {
        let xml = r#"<JMdict>
<entry>
<ent_seq>1000001</ent_seq>
<k_ele><keb>木林</keb><ke_pri>news1</ke_pri></k_ele>
<k_ele><keb>木森</keb></k_ele>
<r_ele><reb>もくりん</reb></r_ele>
<sense><pos>noun</pos><gloss>grove</gloss><gloss>thicket</gloss></sense>
<sense><gloss>copse</gloss></sense>
</entry>
</JMdict>"#;
        let (entries, stats) = read_all(xml);
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.written_forms, vec!["木林", "木森"]);
        assert_eq!(entry.readings, vec!["もくりん"]);
        assert_eq!(entry.senses.len(), 2);
        assert_eq!(entry.senses[0].glosses, vec!["grove", "thicket"]);
        assert_eq!(entry.first_meaning(), "grove");
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.skipped_elements, 0);
    }

    #[test]
    fn test_doctype_entities_resolve() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE JMdict [
<!ENTITY grv "grove of trees">
]>
<JMdict>
<entry><k_ele><keb>木林</keb></k_ele><sense><gloss>&grv;</gloss></sense></entry>
</JMdict>"#;
        let (entries, _) = read_all(xml);
        assert_eq!(entries[0].first_meaning(), "grove of trees");
    }

    #[test]
    fn test_malformed_sub_element_is_skipped() {
        let xml = r#"<JMdict>
<entry>
<k_ele><keb>木林</keb></k_ele>
<sense><gloss>bad &#xFFFFFFFF; ref</gloss></sense>
<sense><gloss>grove</gloss></sense>
</entry>
<entry><k_ele><keb>山川</keb></k_ele></entry>
</JMdict>"#;
        let (entries, stats) = read_all(xml);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].senses.len(), 1);
        assert_eq!(entries[0].first_meaning(), "grove");
        assert_eq!(stats.skipped_elements, 1);
    }

    #[test]
    fn test_empty_entry_is_skipped() {
        let xml = "<JMdict><entry><ent_seq>1</ent_seq></entry><entry><r_ele><reb>き</reb></r_ele></entry></JMdict>";
        let (entries, stats) = read_all(xml);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].written_forms.is_empty());
        assert_eq!(stats.skipped_entries, 1);
    }

    #[test]
    fn test_empty_input_ends_normally() {
        let (entries, stats) = read_all("");
        assert!(entries.is_empty());
        assert_eq!(stats, ParseStats::default());
    }

    #[test]
    fn test_missing_file_fails_on_open() {
        let result = DictionaryReader::open("/definitely/not/here/JMdict_e");
        assert!(matches!(result, Err(DictError::Open { .. })));
    }
}
