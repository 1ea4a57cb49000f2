//! CLI integration tests for jukugo
//!
//! Runs the binary end-to-end against a throwaway config file and data directory.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

const DICTIONARY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE JMdict [
<!ENTITY n "noun (common) (futsuumeishi)">
]>
<JMdict>
<entry><k_ele><keb>木林</keb></k_ele><r_ele><reb>もくりん</reb></r_ele><sense><pos>&n;</pos><gloss>grove</gloss></sense></entry>
<entry><k_ele><keb>林木</keb></k_ele><r_ele><reb>りんぼく</reb></r_ele><sense><gloss>forest trees</gloss></sense></entry>
<entry><k_ele><keb>木森</keb></k_ele><r_ele><reb>きもり</reb></r_ele><sense><gloss>unrelated</gloss></sense></entry>
</JMdict>
"#;

const LEVELS: &str = "# glyph\tlevel\n木\tN5\n林\tN5\n森\tN4\n";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("JMdict_e.xml"), DICTIONARY).unwrap();
        std::fs::write(dir.path().join("levels.tsv"), LEVELS).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    #[allow(deprecated)]
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("jukugo").unwrap();
        cmd.env("JUKUGO_CONFIG", self.path("config.toml"));
        cmd.env("JUKUGO_DATA_DIR", self.path("data"));
        cmd.env_remove("JUKUGO_DICTIONARY");
        cmd.env_remove("JUKUGO_LEVELS");
        cmd.env_remove("JUKUGO_ALLOW_WIPE");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    fn import_n5(&self) {
        self.cmd()
            .args(["import", "N5", "--dictionary"])
            .arg(self.path("JMdict_e.xml"))
            .arg("--levels")
            .arg(self.path("levels.tsv"))
            .assert()
            .success()
            .stdout(predicate::str::contains("Imported level N5"));
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(args)
            .args(["--format", "json"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).unwrap()
    }
}

#[test]
fn test_import_then_list_compounds() {
    let ws = Workspace::new();
    ws.import_n5();

    let entries = ws.json(&["compounds", "林"]);
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["word"], "木林");
    assert_eq!(entries[0]["position"], 1);
    assert_eq!(entries[1]["word"], "林木");
    assert_eq!(entries[1]["co_characters"][0]["character"], "木");

    ws.cmd()
        .args(["compounds", "木"])
        .assert()
        .success()
        .stdout(predicate::str::contains("もくりん"))
        .stdout(predicate::str::contains("木森").not());
}

#[test]
fn test_reimport_is_idempotent() {
    let ws = Workspace::new();
    ws.import_n5();
    let first = ws.json(&["stats"]);
    ws.import_n5();
    let second = ws.json(&["stats"]);

    assert_eq!(first, second);
    assert_eq!(second[0]["characters"], 2);
    assert_eq!(second[0]["words"], 2);
    assert_eq!(second[0]["forms"], 4);
}

#[test]
fn test_validate() {
    let ws = Workspace::new();
    ws.import_n5();

    ws.cmd()
        .args(["validate", "木", "林木", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid: 木 is at position 1 of 林木"))
        .stdout(predicate::str::contains("forest trees"));

    let validation = ws.json(&["validate", "木", "林木", "0"]);
    assert_eq!(validation["valid"], false);
}

#[test]
fn test_malformed_character_fails_but_kana_is_empty() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["compounds", "木林"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid input"));

    ws.cmd()
        .args(["compounds", "き"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No compounds found for き"));

    ws.cmd()
        .args(["validate", "木", "木林山川海", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("invalid:"));
}

#[test]
fn test_random_draws_from_level() {
    let ws = Workspace::new();
    ws.import_n5();

    let challenge = ws.json(&["random", "N5", "-n", "1"]);
    let picked = challenge["character"]["glyph"].as_str().unwrap().to_string();
    assert!(picked == "木" || picked == "林");
    let distractors = challenge["distractors"].as_array().unwrap();
    assert_eq!(distractors.len(), 1);
    assert_ne!(distractors[0]["glyph"], picked.as_str());

    ws.cmd()
        .args(["random", "N1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No characters imported at level N1"));
}

#[test]
fn test_missing_dictionary_leaves_graph_empty() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["import", "N5", "--dictionary"])
        .arg(ws.path("missing.xml"))
        .arg("--levels")
        .arg(ws.path("levels.tsv"))
        .assert()
        .failure();

    let stats = ws.json(&["stats"]);
    assert_eq!(stats[0]["characters"], 0);
}

#[test]
fn test_import_uses_configured_paths() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["import", "N5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No dictionary given"));

    ws.cmd()
        .args(["config", "set", "dictionary_path"])
        .arg(ws.path("JMdict_e.xml"))
        .assert()
        .success();
    ws.cmd()
        .args(["config", "set", "levels_path"])
        .arg(ws.path("levels.tsv"))
        .assert()
        .success();

    ws.cmd().args(["import", "n5"]).assert().success();
    assert_eq!(ws.json(&["stats"])[0]["words"], 2);
}

#[test]
fn test_wipe_requires_opt_in_and_confirmation() {
    let ws = Workspace::new();
    ws.import_n5();

    ws.cmd()
        .args(["wipe", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Wiping is disabled"));

    ws.cmd()
        .args(["config", "set", "allow_wipe", "true"])
        .assert()
        .success();

    ws.cmd()
        .arg("wipe")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
    assert_eq!(ws.json(&["stats"])[0]["words"], 2);

    ws.cmd()
        .args(["wipe", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wiped 2 characters, 2 words and 4 edges"));
    assert_eq!(ws.json(&["stats"])[0]["characters"], 0);
}

#[test]
fn test_config_commands() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));

    ws.cmd().args(["config", "init"]).assert().success();
    ws.cmd()
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    ws.cmd()
        .args(["config", "get", "distractors"])
        .assert()
        .success()
        .stdout("3\n");

    ws.cmd()
        .args(["config", "get", "colour"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));

    // Environment overrides show up in the effective value but are not saved
    ws.cmd()
        .env("JUKUGO_ALLOW_WIPE", "1")
        .args(["config", "get", "allow_wipe"])
        .assert()
        .success()
        .stdout("true\n");
    ws.cmd()
        .env("JUKUGO_ALLOW_WIPE", "1")
        .args(["config", "set", "distractors", "5"])
        .assert()
        .success();
    let saved = std::fs::read_to_string(ws.path("config.toml")).unwrap();
    assert!(saved.contains("allow_wipe = false"));
    assert!(saved.contains("distractors = 5"));
}

#[test]
fn test_completions() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("jukugo"));
}
