//! The date-to-images catalog consumed by the slideshow page.
//!
//! The catalog is stored as a JSON object (date keys in display order, each mapped to an array of
//! image paths). The browser-facing script is always rendered from that data, never edited in
//! place. A script written by hand before the data file existed can be imported once with
//! [`parse_script`].

use super::{store::replace_file, DateBucket, Error};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const SCRIPT_HEADER: &str = "// This file contains all image locations for the gallery slideshow\n\
                             // Organized by date for easy reference\n\n";

lazy_static::lazy_static! {
    static ref SCRIPT_ENTRY_RE: regex::Regex = regex::Regex::new(
        r#"["']([0-9]{4}-[0-9]{2}-[0-9]{2})["']\s*:\s*\[([^\]]*)\]"#
    )
    .unwrap();
    static ref SCRIPT_STRING_RE: regex::Regex = regex::Regex::new(
        r#""((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)'"#
    )
    .unwrap();
}

/// What an upload does to a date that already has a catalog entry.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CatalogPolicy {
    /// The entry becomes exactly the new upload's paths.
    Replace,
    /// New paths are added after the existing ones.
    Append,
}

impl Default for CatalogPolicy {
    fn default() -> Self {
        Self::Replace
    }
}

impl FromStr for CatalogPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(Self::Replace),
            "append" => Ok(Self::Append),
            other => Err(format!("Invalid catalog policy: {}", other)),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: IndexMap<DateBucket, Vec<String>>,
}

impl Catalog {
    pub fn get(&self, date: &DateBucket) -> Option<&[String]> {
        self.entries.get(date).map(Vec::as_slice)
    }

    pub fn dates(&self) -> impl Iterator<Item = &DateBucket> + '_ {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Set the entry for a date according to the policy, returning the resulting paths.
    ///
    /// Dates not yet in the catalog are placed first.
    pub fn upsert(
        &mut self,
        date: &DateBucket,
        paths: Vec<String>,
        policy: CatalogPolicy,
    ) -> &[String] {
        if self.entries.contains_key(date) {
            if let Some(existing) = self.entries.get_mut(date) {
                match policy {
                    CatalogPolicy::Replace => *existing = paths,
                    CatalogPolicy::Append => {
                        for path in paths {
                            if !existing.contains(&path) {
                                existing.push(path);
                            }
                        }
                    }
                }
            }
        } else {
            let mut entries = IndexMap::with_capacity(self.entries.len() + 1);
            entries.insert(date.clone(), paths);
            entries.extend(self.entries.drain(..));
            self.entries = entries;
        }

        self.get(date).unwrap_or_default()
    }

    /// Combine with entries read back from an edited script.
    ///
    /// The edited entries come first, in script order, and win for dates present in both. Dates
    /// only known here are kept after them.
    pub fn merge_edited(self, edited: Catalog) -> Catalog {
        let mut entries = edited.entries;

        for (date, paths) in self.entries {
            entries.entry(date).or_insert(paths);
        }

        Catalog { entries }
    }

    /// Render the browser script assigning the mapping to `variable`.
    pub fn render_script(&self, variable: &str) -> String {
        let mut output = String::from(SCRIPT_HEADER);
        output.push_str(&format!("const {} = {{\n", variable));

        let entries = self
            .entries
            .iter()
            .map(|(date, paths)| {
                if paths.is_empty() {
                    format!("  \"{}\": []", date)
                } else {
                    let paths = paths
                        .iter()
                        .map(|path| format!("    {}", serde_json::Value::from(path.as_str())))
                        .collect::<Vec<_>>()
                        .join(",\n");

                    format!("  \"{}\": [\n{}\n  ]", date, paths)
                }
            })
            .collect::<Vec<_>>();

        if !entries.is_empty() {
            output.push_str(&entries.join(",\n"));
            output.push('\n');
        }

        output.push_str("};\n");
        output
    }
}

/// Read the entries of a legacy catalog script.
///
/// Each `"YYYY-MM-DD": [ ... ]` entry is picked up in file order; a date listed twice keeps its
/// first position and its last value, as a browser would evaluate it.
pub fn parse_script(input: &str) -> Catalog {
    let mut entries = IndexMap::new();

    for captures in SCRIPT_ENTRY_RE.captures_iter(input) {
        let date = captures
            .get(1)
            .and_then(|value| value.as_str().parse::<DateBucket>().ok());
        let body = captures.get(2).map(|value| value.as_str()).unwrap_or_default();

        if let Some(date) = date {
            let paths = SCRIPT_STRING_RE
                .captures_iter(body)
                .filter_map(|string| {
                    string
                        .get(1)
                        .map(|value| unescape_double_quoted(value.as_str()))
                        .or_else(|| string.get(2).map(|value| value.as_str().replace("\\'", "'")))
                })
                .collect();

            entries.insert(date, paths);
        }
    }

    Catalog { entries }
}

fn unescape_double_quoted(value: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{}\"", value)).unwrap_or_else(|_| value.to_string())
}

/// The catalog's data file and the script rendered from it.
#[derive(Clone, Debug)]
pub struct CatalogFile {
    data: PathBuf,
    script: PathBuf,
    variable: String,
}

impl CatalogFile {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>, S: Into<String>>(
        data: P,
        script: Q,
        variable: S,
    ) -> Self {
        Self {
            data: data.as_ref().to_path_buf(),
            script: script.as_ref().to_path_buf(),
            variable: variable.into(),
        }
    }

    pub fn data_path(&self) -> &Path {
        &self.data
    }

    pub fn script_path(&self) -> &Path {
        &self.script
    }

    /// Load the catalog, falling back to a legacy script and then to an empty catalog.
    pub fn load(&self) -> Result<Catalog, Error> {
        match self.read_data()? {
            Some(catalog) => Ok(catalog),
            None => self.load_script(),
        }
    }

    /// Load the catalog for an update, keeping entries edited by hand in the script since it was
    /// last rendered.
    pub fn load_current(&self) -> Result<Catalog, Error> {
        let catalog = match self.read_data()? {
            Some(catalog) => catalog,
            None => return self.load_script(),
        };

        let script = match std::fs::read_to_string(&self.script) {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(catalog),
            Err(error) => return Err(Error::read(&self.script)(error)),
        };

        if script == catalog.render_script(&self.variable) {
            Ok(catalog)
        } else {
            log::warn!(
                "{} was edited since it was last rendered; keeping its entries",
                self.script.display()
            );

            Ok(catalog.merge_edited(parse_script(&script)))
        }
    }

    fn read_data(&self) -> Result<Option<Catalog>, Error> {
        match std::fs::read(&self.data) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| Error::CatalogData {
                    path: self.data.clone().into_boxed_path(),
                    source,
                }),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(Error::read(&self.data)(error)),
        }
    }

    fn load_script(&self) -> Result<Catalog, Error> {
        match std::fs::read_to_string(&self.script) {
            Ok(contents) => {
                let catalog = parse_script(&contents);
                log::info!(
                    "Imported {} catalog entries from {}",
                    catalog.len(),
                    self.script.display()
                );
                Ok(catalog)
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Catalog::default()),
            Err(error) => Err(Error::read(&self.script)(error)),
        }
    }

    /// Write the data file and re-render the script.
    pub fn save(&self, catalog: &Catalog) -> Result<(), Error> {
        let mut data = serde_json::to_string_pretty(catalog).map_err(|source| Error::CatalogData {
            path: self.data.clone().into_boxed_path(),
            source,
        })?;
        data.push('\n');

        replace_file(&self.data, data.as_bytes())?;
        self.write_script(catalog)
    }

    pub fn write_script(&self, catalog: &Catalog) -> Result<(), Error> {
        replace_file(&self.script, catalog.render_script(&self.variable).as_bytes())
    }

    pub fn upsert(
        &self,
        date: &DateBucket,
        paths: Vec<String>,
        policy: CatalogPolicy,
    ) -> Result<Vec<String>, Error> {
        let mut catalog = self.load_current()?;
        let paths = catalog.upsert(date, paths, policy).to_vec();
        self.save(&catalog)?;

        Ok(paths)
    }

    /// Rebuild the data file from the current script, discarding the old data.
    pub fn import_script(&self) -> Result<Catalog, Error> {
        let contents = std::fs::read_to_string(&self.script).map_err(Error::read(&self.script))?;
        let catalog = parse_script(&contents);
        self.save(&catalog)?;

        Ok(catalog)
    }
}
