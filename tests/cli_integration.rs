//! Integration tests for the `larder` CLI.
//!
//! Each test creates a temp directory, runs `larder` as a subprocess, and
//! checks stdout, stderr and/or the files it leaves behind.

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run `larder` with the given args in `dir`, returning (stdout, stderr, success).
fn run(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_larder"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run larder");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `larder` expecting success, return stdout.
fn run_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run(dir, args);
    if !success {
        panic!("larder {:?} failed:\nstdout: {}\nstderr: {}", args, stdout, stderr);
    }
    stdout
}

/// Run `larder` expecting failure, return stderr.
fn run_err(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run(dir, args);
    if success {
        panic!("larder {:?} should have failed:\nstdout: {}", args, stdout);
    }
    stderr
}

/// The id printed as the `n`th word of an "Added ..." line.
fn id_at(stdout: &str, n: usize) -> String {
    stdout
        .lines()
        .next()
        .and_then(|l| l.split_whitespace().nth(n))
        .unwrap_or_else(|| panic!("no id in {:?}", stdout))
        .to_string()
}

fn init(tmp: &TempDir) {
    run_ok(tmp.path(), &["init"]);
}

fn add_category(dir: &Path, name: &str) -> String {
    id_at(&run_ok(dir, &["category", "add", name]), 2)
}

fn add_food(dir: &Path, name: &str, to: &str, extra: &[&str]) -> String {
    let mut args = vec!["add", name, "--to", to];
    args.extend_from_slice(extra);
    id_at(&run_ok(dir, &args), 1)
}

fn catalog_json(dir: &Path) -> serde_json::Value {
    let text = fs::read_to_string(dir.join("larder/data.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn commands_outside_data_dir_fail() {
    let tmp = TempDir::new().unwrap();
    let stderr = run_err(tmp.path(), &["list"]);
    assert!(stderr.contains("larder init"), "{}", stderr);
}

#[test]
fn init_creates_data_dir_once() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    assert!(tmp.path().join("larder/larder.toml").exists());
    assert!(tmp.path().join("larder/data.json").exists());
    assert_eq!(run_ok(tmp.path(), &["list"]).trim(), "no foods");
    assert!(run_err(tmp.path(), &["init"]).contains("already exists"));
}

#[test]
fn add_and_list_tree() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    let dir = tmp.path();
    let fruit = add_category(dir, "Fruit");
    let berries = id_at(&run_ok(dir, &["subgroup", "add", &fruit, "Berries"]), 2);
    let sweet = id_at(&run_ok(dir, &["tag", "add", "sweet"]), 2);

    let container = format!("subgroup:{}", berries);
    let id = add_food(dir, "Blueberry", &container, &["--tag", &sweet, "--fiber", "2.4"]);

    let out = run_ok(dir, &["list"]);
    assert!(out.contains("Fruit  (category:"), "{}", out);
    assert!(out.contains("  Berries  (subgroup:"), "{}", out);
    assert!(out.contains(&format!("    {}  Blueberry  #sweet", id)), "{}", out);

    let doc = catalog_json(dir);
    let food = &doc["categories"][0]["subgroups"][0]["foods"][0];
    assert_eq!(food["name"], "Blueberry");
    assert_eq!(food["nutrition"]["fiber"], 2.4);
    assert!(food["nutrition"]["protein"].is_null());
    assert_eq!(food["tagIds"][0].to_string(), sweet);
}

#[test]
fn list_filters_by_tags() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    let dir = tmp.path();
    let a = id_at(&run_ok(dir, &["tag", "add", "A"]), 2);
    let b = id_at(&run_ok(dir, &["tag", "add", "B"]), 2);
    add_food(dir, "Both", "loose", &["--tag", &a, "--tag", &b]);
    add_food(dir, "OnlyA", "loose", &["--tag", &a]);
    add_food(dir, "None", "loose", &[]);

    let names = |args: &[&str]| -> Vec<String> {
        let out = run_ok(dir, args);
        let foods: serde_json::Value = serde_json::from_str(&out).unwrap();
        foods
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(names(&["list", "--json", "--tag", &a, "--tag", &b]), vec!["Both"]);
    assert_eq!(names(&["list", "--json", "--tag", &a, "--tag", &b, "--any"]), vec!["Both", "OnlyA"]);
    assert_eq!(names(&["list", "--json"]), vec!["Both", "OnlyA", "None"]);
}

#[test]
fn validation_error_leaves_catalog_alone() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    let dir = tmp.path();
    let fruit = add_category(dir, "Fruit");
    let long = "a".repeat(101);
    let stderr = run_err(dir, &["add", &long, "--to", &format!("category:{}", fruit)]);
    assert!(stderr.contains("Food name is too long (max 100 characters)"), "{}", stderr);
    assert_eq!(catalog_json(dir)["categories"][0]["foods"].as_array().unwrap().len(), 0);

    let stderr = run_err(dir, &["add", "Ghost", "--tag", "12345"]);
    assert!(stderr.contains("Unknown tag id 12345"), "{}", stderr);
}

#[test]
fn mv_across_categories_reports_transition() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    let dir = tmp.path();
    let fruit = add_category(dir, "Fruit");
    let veg = add_category(dir, "Veg");
    let tomato = add_food(dir, "Tomato", &format!("category:{}", fruit), &[]);

    let out = run_ok(dir, &["mv", &tomato, "--to", &format!("category:{}", veg)]);
    assert_eq!(out.trim(), "Moved Tomato from Fruit to Veg");

    let doc = catalog_json(dir);
    assert_eq!(doc["categories"][0]["foods"].as_array().unwrap().len(), 0);
    assert_eq!(doc["categories"][1]["foods"][0]["name"], "Tomato");
}

#[test]
fn reorder_within_category() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    let dir = tmp.path();
    let fruit = add_category(dir, "Fruit");
    let c = format!("category:{}", fruit);
    for name in ["A", "B", "C"] {
        add_food(dir, name, &c, &[]);
    }
    run_ok(dir, &["reorder", &c, "0", "2"]);
    let doc = catalog_json(dir);
    let names: Vec<&str> = doc["categories"][0]["foods"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["B", "C", "A"]);

    assert!(run_err(dir, &["reorder", &c, "0", "9"]).contains("out of range"));
    assert_eq!(run_ok(dir, &["reorder", &c, "1", "1"]).trim(), "No change");
}

#[test]
fn rm_deletes_several_and_logs_recovery() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    let dir = tmp.path();
    let a = add_food(dir, "Apple", "loose", &[]);
    let b = add_food(dir, "Bread", "loose", &[]);
    add_food(dir, "Cheese", "loose", &[]);

    let out = run_ok(dir, &["rm", &a, &b, "999"]);
    assert!(out.contains("Deleted") && out.contains("Apple") && out.contains("Bread"), "{}", out);
    assert_eq!(catalog_json(dir)["foods"].as_array().unwrap().len(), 1);
    assert!(run_err(dir, &["show", &a]).contains("not found"));

    let log = run_ok(dir, &["recovery"]);
    assert!(log.contains(&format!("food {} deleted", a)), "{}", log);
    assert!(log.contains("Bread"), "{}", log);
}

#[test]
fn tag_rm_cascades_into_foods() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    let dir = tmp.path();
    let fruit = add_category(dir, "Fruit");
    let tag = id_at(&run_ok(dir, &["tag", "add", "sweet"]), 2);
    add_food(dir, "Fig", &format!("category:{}", fruit), &["--tag", &tag]);
    add_food(dir, "Date", "loose", &["--tag", &tag]);

    let out = run_ok(dir, &["tag", "rm", &tag]);
    assert!(out.contains("removed from 2 foods"), "{}", out);
    let doc = catalog_json(dir);
    assert!(doc["tags"].as_array().unwrap().is_empty());
    assert!(doc["foods"][0]["tagIds"].as_array().unwrap().is_empty());
    assert!(doc["categories"][0]["foods"][0]["tagIds"].as_array().unwrap().is_empty());
}

#[test]
fn subgroup_rm_promotes_foods() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    let dir = tmp.path();
    let fruit = add_category(dir, "Fruit");
    let sub = id_at(&run_ok(dir, &["subgroup", "add", &fruit, "Citrus"]), 2);
    add_food(dir, "Lime", &format!("subgroup:{}", sub), &[]);

    let out = run_ok(dir, &["subgroup", "rm", &sub]);
    assert!(out.contains("1 foods moved"), "{}", out);
    let doc = catalog_json(dir);
    assert_eq!(doc["categories"][0]["foods"][0]["name"], "Lime");
    assert!(doc["categories"][0]["subgroups"].as_array().unwrap().is_empty());
}

#[test]
fn image_is_copied_and_removed_with_food() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    let dir = tmp.path();
    fs::write(dir.join("pic.PNG"), b"not really a png").unwrap();
    let id = add_food(dir, "Kiwi", "loose", &["--image", "pic.PNG"]);

    let url = catalog_json(dir)["foods"][0]["imageUrl"].as_str().unwrap().to_string();
    assert!(url.starts_with("images/food_") && url.ends_with(".png"), "{}", url);
    assert!(dir.join("larder").join(&url).exists());

    run_ok(dir, &["rm", &id]);
    assert!(!dir.join("larder").join(&url).exists());

    fs::write(dir.join("notes.txt"), b"x").unwrap();
    assert!(run_err(dir, &["add", "Bad", "--image", "notes.txt"]).contains("unsupported image format"));
}

#[test]
fn backup_and_restore() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    let dir = tmp.path();
    add_food(dir, "Keep", "loose", &[]);
    run_ok(dir, &["backup", "create"]);
    add_food(dir, "Later", "loose", &[]);

    let list = run_ok(dir, &["backup", "list"]);
    assert!(list.contains("backup_"), "{}", list);

    run_ok(dir, &["backup", "restore", "1"]);
    let doc = catalog_json(dir);
    let names: Vec<&str> = doc["foods"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Keep"]);
}

#[test]
fn dir_flag_targets_another_directory() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    let elsewhere = TempDir::new().unwrap();
    let path = tmp.path().to_str().unwrap();
    run_ok(elsewhere.path(), &["-C", path, "category", "add", "Grains"]);
    let out = run_ok(elsewhere.path(), &["-C", path, "list"]);
    assert!(out.contains("Grains"), "{}", out);
}

#[test]
fn search_finds_notes() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    let dir = tmp.path();
    add_food(dir, "Oats", "loose", &["--notes", "soak overnight"]);
    add_food(dir, "Rice", "loose", &[]);
    let out = run_ok(dir, &["search", "overnight"]);
    assert!(out.contains("Oats") && out.contains("(notes)"), "{}", out);
    assert!(!out.contains("Rice"));
}

#[test]
fn rm_with_repeated_id_deletes_once() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    let dir = tmp.path();
    let apple = add_food(dir, "Apple", "loose", &[]);
    add_food(dir, "Pear", "loose", &[]);

    let out = run_ok(dir, &["rm", &apple, &apple]);
    assert_eq!(out.matches("Deleted").count(), 1, "{}", out);
    let doc = catalog_json(dir);
    let names: Vec<&str> = doc["foods"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Pear"]);
}

#[test]
fn non_finite_nutrition_is_rejected() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    let dir = tmp.path();
    let stderr = run_err(dir, &["add", "Pear", "--protein", "NaN"]);
    assert!(stderr.contains("protein must be a finite number"), "{}", stderr);
    assert!(catalog_json(dir)["foods"].as_array().unwrap().is_empty());

    let pear = add_food(dir, "Pear", "loose", &["--protein", "1.5"]);
    let stderr = run_err(dir, &["edit", &pear, "--sodium", "inf"]);
    assert!(stderr.contains("sodium must be a finite number"), "{}", stderr);
    assert_eq!(catalog_json(dir)["foods"][0]["nutrition"]["protein"], 1.5);
}
