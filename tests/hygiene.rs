//! Hygiene: enforces coding standards at test time
//!
//! Scans the engine, wire model, relay server and CLI sources for patterns that
//! crash the process or silently drop errors. Every budget is zero; test
//! files (`*_test.rs`) are exempt.

use std::fs;
use std::path::{Path, PathBuf};

const ROOTS: &[&str] = &["src", "frames/src", "server/src", "cli/src"];

// Panics: these crash the process.
const MAX_UNWRAP: usize = 0;
const MAX_EXPECT: usize = 0;
const MAX_PANIC: usize = 0;
const MAX_UNREACHABLE: usize = 0;
const MAX_TODO: usize = 0;
const MAX_UNIMPLEMENTED: usize = 0;

// Silent loss: discards errors without inspecting.
const MAX_SILENT_DISCARD: usize = 0;
const MAX_DOT_OK: usize = 0;

// Style / structure.
const MAX_ALLOW_DEAD_CODE: usize = 0;

struct SourceFile {
    path: String,
    content: String,
}

fn source_files() -> Vec<SourceFile> {
    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let mut files = Vec::new();
    for root in ROOTS {
        collect_rs_files(&manifest.join(root), &mut files);
    }
    assert!(!files.is_empty(), "no production sources found under {ROOTS:?}");
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
            continue;
        }
        let path_str = path.to_string_lossy().to_string();
        if !path_str.ends_with(".rs") || path_str.ends_with("_test.rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { path: path_str, content });
        }
    }
}

/// Assert that `pattern` appears on at most `max` lines across all sources.
fn enforce(pattern: &str, max: usize) {
    let hits: Vec<(String, usize)> = source_files()
        .into_iter()
        .filter_map(|file| {
            let count = file.content.lines().filter(|line| line.contains(pattern)).count();
            (count > 0).then_some((file.path, count))
        })
        .collect();
    let count: usize = hits.iter().map(|(_, c)| c).sum();
    let listing = hits
        .iter()
        .map(|(path, c)| format!("  {path}: {c}"))
        .collect::<Vec<_>>()
        .join("\n");
    assert!(count <= max, "`{pattern}` budget exceeded: found {count}, max {max}.\n{listing}");
}

#[test]
fn unwrap_budget() {
    enforce(".unwrap()", MAX_UNWRAP);
}

#[test]
fn expect_budget() {
    enforce(".expect(", MAX_EXPECT);
}

#[test]
fn panic_budget() {
    enforce("panic!(", MAX_PANIC);
}

#[test]
fn unreachable_budget() {
    enforce("unreachable!(", MAX_UNREACHABLE);
}

#[test]
fn todo_budget() {
    enforce("todo!(", MAX_TODO);
}

#[test]
fn unimplemented_budget() {
    enforce("unimplemented!(", MAX_UNIMPLEMENTED);
}

#[test]
fn silent_discard_budget() {
    enforce("let _ =", MAX_SILENT_DISCARD);
}

#[test]
fn dot_ok_budget() {
    enforce(".ok()", MAX_DOT_OK);
}

#[test]
fn allow_dead_code_budget() {
    enforce("#[allow(dead_code)]", MAX_ALLOW_DEAD_CODE);
}
