use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_tally"))
}

/// Isolated home for one test: config, data and artifact dirs under a tempdir.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create tempdir"),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write_config(&self, contents: &str) -> PathBuf {
        let path = self.path().join("config.toml");
        std::fs::write(&path, contents).expect("write config");
        path
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(bin());
        cmd.env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env("XDG_DATA_HOME", self.path().join("data"))
            .env("TALLY_DB", self.path().join("tally.db"))
            .env("TALLY_CHANNEL", "c1")
            .env("TALLY_USER_ID", "42")
            .env("TALLY_USER", "tester")
            .env_remove("TALLY_CONFIG")
            .env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command().args(args).output().expect("run tally")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "stdout: {}\nstderr: {}",
        stdout(output),
        stderr(output)
    );
}

fn json(output: &Output) -> Value {
    assert_success(output);
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn test_tracker_add_remove_get() {
    let sandbox = Sandbox::new();

    let added = sandbox.run(&["tracker", "add", "Arrows", "50"]);
    assert_success(&added);
    assert!(stdout(&added).contains("arrows from 0 to 50"));

    let removed = sandbox.run(&["tracker", "remove", "arrows", "50"]);
    assert_success(&removed);
    let text = stdout(&removed);
    assert!(text.contains("from 50 to 0"));
    assert!(text.contains("Removed the item"));

    let got = sandbox.run(&["--json", "tracker", "get", "arrows"]);
    assert_eq!(json(&got)["quantity"], 0);
}

#[test]
fn test_tracker_remove_missing_is_not_found() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["tracker", "remove", "rope", "1"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("not found"));
}

#[test]
fn test_non_integer_quantity_rejected() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["tracker", "add", "rope", "1.5"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("whole number"));
}

#[test]
fn test_rename_merges_quantities() {
    let sandbox = Sandbox::new();
    assert_success(&sandbox.run(&["tracker", "add", "arrow", "10"]));
    assert_success(&sandbox.run(&["tracker", "add", "arrows", "5"]));

    let renamed = sandbox.run(&["--json", "tracker", "rename", "arrow", "arrows"]);
    let value = json(&renamed);
    assert_eq!(value["outcome"]["kind"], "merged");
    assert_eq!(value["outcome"]["total"], 15);

    let list = json(&sandbox.run(&["--json", "tracker", "list"]));
    assert_eq!(list["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(list["total_quantity"], 15);
}

#[test]
fn test_search_falls_back_to_similar_names() {
    let sandbox = Sandbox::new();
    assert_success(&sandbox.run(&["tracker", "add", "longsword", "1"]));
    assert_success(&sandbox.run(&["tracker", "add", "shield", "1"]));

    let output = sandbox.run(&["tracker", "search", "longswrod"]);
    assert_success(&output);
    let text = stdout(&output);
    assert!(text.contains("Did you mean"));
    assert!(text.contains("longsword"));
    assert!(!text.contains("shield"));
}

#[test]
fn test_clear_requires_manage_channels() {
    let sandbox = Sandbox::new();
    assert_success(&sandbox.run(&["tracker", "add", "rope", "1"]));

    let denied = sandbox.run(&["tracker", "clear"]);
    assert_eq!(denied.status.code(), Some(5));
    assert!(stderr(&denied).contains("MANAGE_CHANNELS"));

    let cleared = sandbox.run(&["--manage-channels", "tracker", "clear"]);
    assert_success(&cleared);
    assert!(stdout(&cleared).contains("1 entries removed"));
}

#[test]
fn test_channels_are_isolated() {
    let sandbox = Sandbox::new();
    assert_success(&sandbox.run(&["tracker", "add", "rope", "3"]));

    let other = sandbox.run(&["--channel", "c2", "--json", "tracker", "get", "rope"]);
    assert_eq!(json(&other)["quantity"], 0);
}

#[test]
fn test_dnd_deposit_convert_and_balance() {
    let sandbox = Sandbox::new();
    assert_success(&sandbox.run(&["bank", "dnd", "deposit", "gp", "200"]));

    let converted = sandbox.run(&["bank", "dnd", "convert", "gold", "silver", "100"]);
    assert_success(&converted);
    let text = stdout(&converted);
    assert!(text.contains("Converted 100 gold -> 1000 silver"));
    assert!(text.contains("Fee: 10%"));

    let balance = json(&sandbox.run(&["--json", "bank", "dnd", "balance"]));
    let coins = balance["coins"].as_array().expect("coins array");
    assert_eq!(coins.len(), 2);
    assert_eq!(coins[0]["currency"], "gold");
    assert_eq!(coins[0]["amount"], 90);
    assert_eq!(coins[1]["currency"], "silver");
    assert_eq!(coins[1]["amount"], 1000);
}

#[test]
fn test_convert_same_currency_rejected() {
    let sandbox = Sandbox::new();
    assert_success(&sandbox.run(&["bank", "dnd", "deposit", "gold", "50"]));
    let output = sandbox.run(&["bank", "dnd", "convert", "gold", "gp", "10"]);
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_withdraw_too_much_leaves_balance() {
    let sandbox = Sandbox::new();
    assert_success(&sandbox.run(&["bank", "dnd", "deposit", "copper", "5"]));

    let output = sandbox.run(&["bank", "dnd", "withdraw", "cp", "6"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("available 5"));

    let audit = json(&sandbox.run(&["--json", "bank", "dnd", "audit"]));
    assert_eq!(audit.as_array().map(Vec::len), Some(1));
}

#[test]
fn test_non_integral_conversion_suggests_amounts() {
    let sandbox = Sandbox::new();
    assert_success(&sandbox.run(&["bank", "dnd", "deposit", "silver", "100"]));
    let output = sandbox.run(&["bank", "dnd", "convert", "silver", "gold", "25"]);
    assert_eq!(output.status.code(), Some(4));
    let err = stderr(&output);
    assert!(err.contains("20 silver -> 2 gold"));
    assert!(err.contains("30 silver -> 3 gold"));
}

#[test]
fn test_set_fee_changes_schedule() {
    let sandbox = Sandbox::new();
    let denied = sandbox.run(&["bank", "dnd", "setfee", "0.2"]);
    assert_eq!(denied.status.code(), Some(5));

    assert_success(&sandbox.run(&["--manage-channels", "bank", "dnd", "setfee", "0.2"]));
    let fees = sandbox.run(&["bank", "dnd", "fees"]);
    assert_success(&fees);
    let text = stdout(&fees);
    assert!(text.contains("Current Fee Rate: 20%"));
    assert!(!text.contains("(default)"));
}

#[test]
fn test_decimal_bank_rounds_and_formats() {
    let sandbox = Sandbox::new();
    let deposit = sandbox.run(&["bank", "decimal", "deposit", "12.345"]);
    assert_success(&deposit);
    assert!(stdout(&deposit).contains("Balance: $12.35"));

    assert_success(&sandbox.run(&[
        "--manage-channels",
        "bank",
        "decimal",
        "setformat",
        "--prefix",
        "",
        "--suffix",
        "credits",
    ]));
    let balance = sandbox.run(&["bank", "decimal", "balance"]);
    assert_success(&balance);
    assert_eq!(stdout(&balance).trim(), "Balance: 12.35 credits");
}

#[test]
fn test_decimal_audit_shows_currency_amounts() {
    let sandbox = Sandbox::new();
    assert_success(&sandbox.run(&["bank", "decimal", "deposit", "12.35"]));

    let audit = json(&sandbox.run(&["--json", "bank", "decimal", "audit"]));
    assert_eq!(audit[0]["details"]["new_amount"], "12.35");

    let text = sandbox.run(&["bank", "decimal", "audit"]);
    assert_success(&text);
    assert!(stdout(&text).contains("new_amount=$12.35"));
    assert!(!stdout(&text).contains("1235"));
}

#[test]
fn test_roll_reports_each_die() {
    let sandbox = Sandbox::new();
    let value = json(&sandbox.run(&["--json", "roll", "3d6"]));
    let results = value["results"].as_array().expect("results");
    assert_eq!(results.len(), 3);
    let total: u64 = results.iter().filter_map(Value::as_u64).sum();
    assert_eq!(value["total"], total);

    let invalid = sandbox.run(&["roll", "0d6"]);
    assert_eq!(invalid.status.code(), Some(4));
}

#[test]
fn test_oversized_listing_becomes_artifact() {
    let sandbox = Sandbox::new();
    let artifacts = sandbox.path().join("artifacts");
    let config = sandbox.write_config("[limits]\nmessage_limit = 20\n");
    for name in ["rope", "torch", "rations"] {
        assert_success(&sandbox.run(&["tracker", "add", name, "2"]));
    }

    let output = sandbox.run(&[
        "--config",
        config.to_str().expect("utf8 path"),
        "--artifact-dir",
        artifacts.to_str().expect("utf8 path"),
        "tracker",
        "list",
    ]);
    assert_success(&output);
    assert!(stdout(&output).contains("3 items, 6 total"));

    let written = std::fs::read_to_string(artifacts.join("tracker-c1.json")).expect("artifact");
    let value: Value = serde_json::from_str(&written).expect("artifact json");
    assert_eq!(value["torch"], 2);
}

#[test]
fn test_audit_shows_mutations_oldest_first() {
    let sandbox = Sandbox::new();
    assert_success(&sandbox.run(&["tracker", "add", "rope", "1"]));
    assert_success(&sandbox.run(&["tracker", "remove", "rope", "1"]));

    let output = sandbox.run(&["tracker", "audit"]);
    assert_success(&output);
    let text = stdout(&output);
    let add = text.find("tester add").expect("add record");
    let remove = text.find("tester remove_all").expect("remove_all record");
    assert!(add < remove);
}

#[test]
fn test_lookup_exact_and_suggestions() {
    let sandbox = Sandbox::new();
    let items = sandbox.path().join("items.json");
    std::fs::write(
        &items,
        r#"[{"name": "Bag of Holding", "description": "Roomy."}, {"name": "Rope of Climbing"}]"#,
    )
    .expect("write items");
    let config = sandbox.write_config(&format!(
        "[reference]\nitems = \"{}\"\n",
        items.to_string_lossy()
    ));
    let config = config.to_str().expect("utf8 path");

    let exact = sandbox.run(&["--config", config, "lookup", "item", "bag of holding"]);
    assert_success(&exact);
    assert!(stdout(&exact).contains("Roomy."));

    let fuzzy = sandbox.run(&["--config", config, "lookup", "item", "bag of holdin"]);
    assert_success(&fuzzy);
    assert!(stdout(&fuzzy).contains("Bag of Holding"));

    let missing = sandbox.run(&["--config", config, "lookup", "item", "zzzzzz"]);
    assert_eq!(missing.status.code(), Some(3));

    let unconfigured = sandbox.run(&["--config", config, "lookup", "monster", "goblin"]);
    assert_eq!(unconfigured.status.code(), Some(4));
}

#[test]
fn test_ingredient_lookup_caps_suggestions() {
    let sandbox = Sandbox::new();
    let ingredients = sandbox.path().join("alchemy.json");
    let mut records: Vec<Value> = ["a", "b", "c", "d", "e", "f", "g"]
        .iter()
        .map(|suffix| serde_json::json!({ "name": format!("Salt {suffix}") }))
        .collect();
    records.push(serde_json::json!({ "name": "Fine Salt", "description": "A potent catalyst." }));
    std::fs::write(
        &ingredients,
        serde_json::json!({ "ingredients": records }).to_string(),
    )
    .expect("write ingredients");
    let config = sandbox.write_config(&format!(
        "[reference]\ningredients = \"{}\"\n",
        ingredients.to_string_lossy()
    ));
    let config = config.to_str().expect("utf8 path");

    let exact = sandbox.run(&["--config", config, "lookup", "ingredient", "FINE SALT"]);
    assert_success(&exact);
    assert!(stdout(&exact).contains("A potent catalyst."));

    let fuzzy = json(&sandbox.run(&["--config", config, "--json", "lookup", "ingredient", "salt"]));
    assert_eq!(fuzzy["kind"], "ingredient");
    assert_eq!(fuzzy["suggestions"].as_array().map(Vec::len), Some(5));
}

#[test]
fn test_roll_rejects_notation_with_quantity() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["roll", "3d6", "--quantity", "5"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("cannot be used with"));
}
