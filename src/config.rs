/*
    Reportann (clinical report annotation transcoder)

    Licensed under the GNU General Public License v3
*/

//! The [`Config`] struct unifies all configuration of this crate in a single
//! place. It is passed to (or associated with) most higher-level components.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AnnError;
use crate::file::open_file_reader;

pub trait Configurable: Sized {
    /// Obtain the configuration
    fn config(&self) -> &Config;

    /// Obtain the configuration mutably
    fn config_mut(&mut self) -> &mut Config;

    /// Builder pattern to associate a configuration
    fn with_config(mut self, config: Config) -> Self {
        self.set_config(config);
        self
    }

    /// Setter to associate a configuration
    fn set_config(&mut self, config: Config) -> &mut Self;
}

/// Maps the abstract record fields this crate needs (grouping key, patient,
/// date, title, annotated text) onto the arbitrary column names of the
/// originating spreadsheet. Corpora differ in their column naming, so this is
/// configuration rather than a constant.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ColumnMap {
    /// The column whose value groups multi-line reports that must be flushed together
    pub record_group: String,
    pub patient: String,
    pub date: String,
    pub title: String,
    /// The column holding the inline-annotated text
    pub annotated: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            record_group: "seq".to_string(),
            patient: "patient".to_string(),
            date: "date".to_string(),
            title: "title".to_string(),
            annotated: "ann".to_string(),
        }
    }
}

/// This holds the configuration. It is not limited to configuring a single
/// component, but unifies all in a single configuration.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    /// Debug mode
    pub(crate) debug: bool,

    /// The working directory
    pub(crate) workdir: Option<PathBuf>,

    /// Column mapping for the document store records
    pub(crate) columns: ColumnMap,

    /// The top-level JSON key under which the document store keeps its records
    pub(crate) container_key: String,

    /// The key under which raw (markup-stripped) text is merged back into a record
    pub(crate) raw_text_key: String,

    /// The key under which relations are merged back into a record
    pub(crate) relations_key: String,

    /// Default batch size for count-based chunking
    pub(crate) chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            workdir: None,
            columns: ColumnMap::default(),
            container_key: "reports".to_string(),
            raw_text_key: "raw_text".to_string(),
            relations_key: "rels".to_string(),
            chunk_size: 200,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable debug mode. In debug mode, verbose output will be printed to standard error output
    pub fn with_debug(mut self, value: bool) -> Self {
        self.debug = value;
        self
    }

    /// Is debug mode enabled or not?
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Set the working directory
    pub fn with_workdir(mut self, value: impl Into<PathBuf>) -> Self {
        self.workdir = Some(value.into());
        self
    }

    /// Return the working directory, if set
    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_ref().map(|x| x.as_path())
    }

    /// Set the column mapping for document store records
    pub fn with_columns(mut self, value: ColumnMap) -> Self {
        self.columns = value;
        self
    }

    /// The column mapping for document store records
    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    /// Set the top-level JSON key under which the document store keeps its records
    pub fn with_container_key(mut self, value: impl Into<String>) -> Self {
        self.container_key = value.into();
        self
    }

    /// The top-level JSON key under which the document store keeps its records
    pub fn container_key(&self) -> &str {
        &self.container_key
    }

    /// The key under which raw (markup-stripped) text is merged back into a record
    pub fn raw_text_key(&self) -> &str {
        &self.raw_text_key
    }

    /// The key under which relations are merged back into a record
    pub fn relations_key(&self) -> &str {
        &self.relations_key
    }

    /// Set the default batch size for count-based chunking
    pub fn with_chunk_size(mut self, value: usize) -> Self {
        self.chunk_size = value;
        self
    }

    /// The default batch size for count-based chunking
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Loads configuration from a JSON file
    pub fn from_file(filename: &str) -> Result<Self, AnnError> {
        let reader = open_file_reader(filename, &Config::default())?;
        let deserializer = &mut serde_json::Deserializer::from_reader(reader);
        let result: Result<Self, _> = serde_path_to_error::deserialize(deserializer);
        result
            .map_err(|e| AnnError::JsonError(e, filename.to_string(), "Reading config from file"))
    }
}
