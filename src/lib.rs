pub mod actions;
pub mod builder;
pub mod config;
pub mod error;
pub mod host;
pub mod paths;
pub mod raster;

pub use builder::{BuildSettings, CoverBuilder, CoverReport};
pub use error::CoverError;

use std::path::{Path, PathBuf};

/// Procura o diretório de configuração em vários locais possíveis.
pub fn find_config_dir(exe_dir: &Path) -> PathBuf {
    let candidates = [
        exe_dir.join("config"),
        // For target/release/ layout: go up two levels to project root
        exe_dir.join("../../config"),
    ];

    for path in &candidates {
        if path.is_dir() {
            return path.clone();
        }
    }

    PathBuf::from("config")
}
