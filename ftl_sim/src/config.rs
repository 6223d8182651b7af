//! TOML configuration loading.
//!
//! Grounded on the configuration keys read by `Ftl::init_ftl_user` in the original
//! implementation (`SSD_SIZE`, `PACKAGE_SIZE`, `DIE_SIZE`, `PLANE_SIZE`, `BLOCK_SIZE`,
//! `OVERPROVISIONING`) and `Ssd`'s `BLOCK_ERASES`, loaded here via `serde`+`toml` in the style
//! used for structured config elsewhere in the example pack.

use std::fs;
use std::path::Path;

use ftl_core::Geometry;
use serde::Deserialize;
use snafu::{ResultExt, Snafu};

/// Errors produced while loading or validating a configuration file.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[snafu(display("could not read config file {}: {source}", path.display()))]
    Read {
        /// The path that could not be read.
        path: std::path::PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file was not well-formed TOML, or was missing required fields.
    #[snafu(display("could not parse config file {}: {source}", path.display()))]
    Parse {
        /// The path that failed to parse.
        path: std::path::PathBuf,
        /// The underlying TOML error.
        source: toml::de::Error,
    },

    /// The geometry described by the configuration failed validation.
    #[snafu(display("invalid geometry in config file {}: {source}", path.display()))]
    Geometry {
        /// The path whose geometry was invalid.
        path: std::path::PathBuf,
        /// The underlying geometry error.
        source: ftl_core::InvalidGeometry,
    },
}

/// The raw, on-disk shape of a configuration file, deserialized directly.
#[derive(Debug, Deserialize)]
struct RawConfig {
    ssd_size: u32,
    package_size: u32,
    die_size: u32,
    plane_size: u32,
    block_size: u32,
    overprovisioning: u32,
    #[serde(default = "default_block_erases")]
    block_erases: u64,
}

fn default_block_erases() -> u64 {
    100_000
}

/// A validated configuration: a flash geometry plus the device model's erase budget.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// The flash geometry to build the FTL over.
    pub geometry: Geometry,
    /// The number of erases each block may tolerate before the device model rejects further
    /// erases to it.
    pub block_erases: u64,
}

/// Load and validate a configuration file at `path`.
///
/// # Errors
/// [`ConfigError::Read`] if the file cannot be read, [`ConfigError::Parse`] if it is not
/// well-formed TOML matching the expected shape, or [`ConfigError::Geometry`] if the described
/// geometry is invalid.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path).context(ReadSnafu { path })?;
    let raw: RawConfig = toml::from_str(&text).context(ParseSnafu { path })?;

    let geometry = Geometry {
        ssd_size: raw.ssd_size,
        package_size: raw.package_size,
        die_size: raw.die_size,
        plane_size: raw.plane_size,
        block_size: raw.block_size,
        overprovisioning: raw.overprovisioning,
    };
    geometry.derive().context(GeometrySnafu { path })?;

    Ok(Config {
        geometry,
        block_erases: raw.block_erases,
    })
}
