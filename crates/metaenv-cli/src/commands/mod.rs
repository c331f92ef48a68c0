pub mod prefixes;
pub mod transform;
pub mod version;

use metaenv_core::{EnvPrefix, MetaEnvOptions};
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

/// Build plugin options from the config file and `--env-prefix` flags.
///
/// Flags replace whatever `envPrefix` the file sets.
pub fn load_options(cwd: &Path, env_prefix: &[String], config: Option<&Path>) -> Result<MetaEnvOptions> {
    let mut options = match config {
        Some(path) => MetaEnvOptions::load(&resolve(cwd, path)).into_diagnostic()?,
        None => MetaEnvOptions::default(),
    };

    match env_prefix {
        [] => {}
        [one] => options.env_prefix = Some(EnvPrefix::One(one.clone())),
        many => options.env_prefix = Some(EnvPrefix::Many(many.to_vec())),
    }

    tracing::debug!(?options, "resolved plugin options");
    Ok(options)
}

/// Resolve `path` against `cwd` unless it is already absolute.
pub fn resolve(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
