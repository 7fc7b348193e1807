/*
    Reportann (clinical report annotation transcoder)

    Licensed under the GNU General Public License v3
*/

//! This module contains some common helper functions for dealing with file I/O

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::AnnError;
use crate::types::debug;

/// Get a file for reading or writing, this resolves relative files more intelligently
pub(crate) fn get_filepath(filename: &str, workdir: Option<&Path>) -> Result<PathBuf, AnnError> {
    let path = if let Some(stripped) = filename.strip_prefix("file://") {
        PathBuf::from(stripped)
    } else {
        PathBuf::from(filename)
    };
    if path.is_absolute() {
        Ok(path)
    } else {
        //check whether we can find one in our workdir first
        if let Some(workdir) = workdir {
            let path = workdir.join(&path);
            if path.is_file() {
                //should also work with symlinks
                return Ok(path);
            }
        }

        //final fallback is simply relative to the current working directory
        // we don't test for existence here
        Ok(path)
    }
}

/// Auxiliary function to help open files
pub(crate) fn open_file(filename: &str, config: &Config) -> Result<File, AnnError> {
    let found_filename = get_filepath(filename, config.workdir())?;
    debug(config, || format!("open_file: {:?}", found_filename));
    File::open(found_filename.as_path()).map_err(|e| {
        AnnError::IOError(
            e,
            found_filename.to_string_lossy().into_owned(),
            "Opening file for reading failed",
        )
    })
}

/// Auxiliary function to help create files
pub(crate) fn create_file(filename: &str, config: &Config) -> Result<File, AnnError> {
    let found_filename = get_filepath(filename, config.workdir())?;
    debug(config, || format!("create_file: {:?}", found_filename));
    File::create(found_filename.as_path()).map_err(|e| {
        AnnError::IOError(
            e,
            found_filename.to_string_lossy().into_owned(),
            "Opening file for writing failed",
        )
    })
}

pub(crate) fn open_file_reader(
    filename: &str,
    config: &Config,
) -> Result<BufReader<File>, AnnError> {
    Ok(BufReader::new(open_file(filename, config)?))
}

pub(crate) fn open_file_writer(
    filename: &str,
    config: &Config,
) -> Result<BufWriter<File>, AnnError> {
    Ok(BufWriter::new(create_file(filename, config)?))
}

/// Reads an entire file to a string
pub(crate) fn read_to_string(filename: &str, config: &Config) -> Result<String, AnnError> {
    let found_filename = get_filepath(filename, config.workdir())?;
    debug(config, || format!("read_to_string: {:?}", found_filename));
    std::fs::read_to_string(found_filename.as_path()).map_err(|e| {
        AnnError::IOError(
            e,
            found_filename.to_string_lossy().into_owned(),
            "Reading file failed",
        )
    })
}
