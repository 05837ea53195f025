use std::{collections::BTreeMap, path::Path, sync::LazyLock};

use regex::Regex;
use snafu::{ResultExt, ensure};

use crate::error::*;

/// One `id: 'name'` entry of an exported `names` dict, single or double quoted.
static NAME_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\d+)\s*:\s*(?:'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)")"#)
        .expect("name entry pattern is valid")
});

/// Ordered id→name mapping of the detector's classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Reads one label per line, verbatim apart from the line ending; empty lines are skipped.
    ///
    /// A line holding only a space is the label `" "`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GlyphError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).context(LabelReadSnafu {
            path: path.to_string_lossy(),
        })?;

        let names: Vec<String> = content
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();

        ensure!(
            !names.is_empty(),
            LabelParseSnafu {
                message: format!("{} contains no labels", path.display()),
            }
        );

        Ok(Self { names })
    }

    /// Parses the `names` metadata an exported YOLO model carries, e.g. `{0: 'A', 1: 'B'}`.
    ///
    /// Ids must cover `0..n` without gaps.
    pub fn from_names_metadata(raw: &str) -> Result<Self, GlyphError> {
        let mut entries = BTreeMap::new();
        for capture in NAME_ENTRY.captures_iter(raw) {
            let id: usize = capture[1].parse().map_err(|_| {
                LabelParseSnafu {
                    message: format!("class id `{}` out of range", &capture[1]),
                }
                .build()
            })?;
            let name = capture
                .get(2)
                .or_else(|| capture.get(3))
                .map(|m| unescape(m.as_str()))
                .unwrap_or_default();
            entries.insert(id, name);
        }

        ensure!(
            !entries.is_empty(),
            LabelParseSnafu {
                message: format!("no entries in names metadata `{raw}`"),
            }
        );

        let mut names = Vec::with_capacity(entries.len());
        for (expected, (id, name)) in entries.into_iter().enumerate() {
            ensure!(
                id == expected,
                LabelParseSnafu {
                    message: format!("class id {expected} missing from names metadata"),
                }
            );
            names.push(name);
        }

        Ok(Self { names })
    }

    pub fn get(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}
