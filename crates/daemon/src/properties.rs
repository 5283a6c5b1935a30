// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reader for each installed application's `info.properties` file: a flat
//! `key=value` per line format carrying metadata the config tree doesn't,
//! most importantly the install hash returned by `get_hash` (§4.4).

use std::collections::HashMap;
use std::path::Path;

pub const MD5_KEY: &str = "app.md5";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Properties(HashMap<String, String>);

impl Properties {
    pub fn parse(contents: &str) -> Self {
        let mut map = HashMap::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                map.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn md5(&self) -> Option<&str> {
        self.get(MD5_KEY)
    }
}

/// Reads and parses `<install_dir>/<app_name>/info.properties`. Returns an
/// empty [`Properties`] (not an error) if the file is missing, matching the
/// original's treatment of a freshly-installed app with no recorded hash
/// yet.
pub fn read_properties(install_dir: &Path, app_name: &str) -> std::io::Result<Properties> {
    let path = install_dir.join(app_name).join("info.properties");
    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(Properties::parse(&contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Properties::default()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "properties_tests.rs"]
mod tests;
