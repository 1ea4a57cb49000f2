//! File-backed reader tests

use std::io::Write;

use jukugo_dict::{DictError, DictionaryReader};

const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE JMdict [
<!ELEMENT JMdict (entry*)>
<!ENTITY n "noun (common) (futsuumeishi)">
]>
<JMdict>
<entry>
<ent_seq>1</ent_seq>
<k_ele><keb>木林</keb></k_ele>
<r_ele><reb>もくりん</reb></r_ele>
<sense><pos>&n;</pos><gloss>grove</gloss></sense>
</entry>
<entry>
<ent_seq>2</ent_seq>
<k_ele><keb>山川</keb></k_ele>
<r_ele><reb>さんせん</reb></r_ele>
<sense><gloss>mountains and rivers</gloss></sense>
</entry>
<entry>
<ent_seq>3</ent_seq>
<r_ele><reb>すし</reb></r_ele>
<sense><gloss>sushi</gloss></sense>
</entry>
</JMdict>
"#;

#[test]
fn test_streams_entries_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SAMPLE.as_bytes()).unwrap();

    let mut reader = DictionaryReader::open(file.path()).unwrap();

    let first = reader.next().unwrap().unwrap();
    assert_eq!(first.written_forms, vec!["木林"]);
    assert_eq!(first.first_reading(), "もくりん");
    assert_eq!(reader.stats().entries, 1);

    let rest: Vec<_> = reader.by_ref().map(|e| e.unwrap()).collect();
    assert_eq!(rest.len(), 2);
    assert_eq!(rest[0].first_meaning(), "mountains and rivers");
    assert!(rest[1].written_forms.is_empty());

    // Exhausted and fused
    assert!(reader.next().is_none());
    assert_eq!(reader.stats().entries, 3);
    assert_eq!(reader.entities().get("n"), Some("noun (common) (futsuumeishi)"));
}

#[test]
fn test_open_failure_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("JMdict_e");

    match DictionaryReader::open(&missing) {
        Err(DictError::Open { path, .. }) => assert_eq!(path, missing),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("missing file opened"),
    }
}

fn forms_and_stats(xml: &str) -> (Vec<Vec<String>>, jukugo_dict::ParseStats) {
    let mut reader = DictionaryReader::from_reader(xml.as_bytes());
    let forms = reader
        .by_ref()
        .map(|e| e.unwrap().written_forms)
        .collect();
    (forms, reader.stats())
}

#[test]
fn test_stray_angle_bracket_only_costs_its_element() {
    let xml = "<JMdict>\
<entry><k_ele><keb>木<林</keb></k_ele><r_ele><reb>a</reb></r_ele></entry>\
<entry><k_ele><keb>山川</keb></k_ele></entry>\
<entry><k_ele><keb>森林</keb></k_ele></entry>\
</JMdict>";
    let (forms, stats) = forms_and_stats(xml);

    assert_eq!(forms.len(), 3);
    assert!(forms[0].is_empty());
    assert_eq!(forms[1], vec!["山川"]);
    assert_eq!(forms[2], vec!["森林"]);
    assert_eq!(stats.entries, 3);
    assert_eq!(stats.skipped_elements, 1);
    assert_eq!(stats.syntax_errors, 1);
}

#[test]
fn test_unterminated_entry_ends_at_next_entry() {
    let xml = "<JMdict>\
<entry><k_ele><keb>木林</keb></k_ele>\
<entry><k_ele><keb>山川</keb></k_ele></entry>\
<entry><k_ele><keb>森林</keb>\
<entry><k_ele><keb>林木</keb></k_ele></entry>\
</JMdict>";
    let (forms, stats) = forms_and_stats(xml);

    // The cut-off 森林 element is dropped along with its now-empty entry
    assert_eq!(forms, vec![vec!["木林"], vec!["山川"], vec!["林木"]]);
    assert_eq!(stats.skipped_elements, 1);
    assert_eq!(stats.skipped_entries, 1);
}
