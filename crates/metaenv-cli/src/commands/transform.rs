//! `metaenv transform` command implementation.

use metaenv_core::{transform, Error, MetaEnvOptions, TransformOutput, TransformSpec};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Schema version of the JSON reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Exit code when at least one file failed.
const EXIT_ERROR: i32 = 1;

/// Transform command action.
#[derive(Debug, Clone)]
pub struct TransformAction {
    pub cwd: PathBuf,
    pub files: Vec<PathBuf>,
    pub options: MetaEnvOptions,
    pub out_dir: Option<PathBuf>,
    pub sourcemap: bool,
    pub json: bool,
}

#[derive(Serialize)]
struct TransformReportJson {
    schema_version: u32,
    ok: bool,
    prefixes: Vec<String>,
    files: Vec<FileResultJson>,
}

#[derive(Serialize)]
struct FileResultJson {
    path: String,
    ok: bool,
    replacements: ReplacementsJson,
    /// Where the output was written (with `--out-dir`).
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    /// Transformed code (without `--out-dir`).
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorJson>,
}

#[derive(Serialize, Default)]
struct ReplacementsJson {
    properties: usize,
    objects: usize,
}

#[derive(Serialize)]
struct ErrorJson {
    code: String,
    message: String,
}

impl From<Error> for ErrorJson {
    fn from(err: Error) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

pub fn run(action: &TransformAction) -> Result<()> {
    if action.out_dir.is_none() && action.files.len() > 1 && !action.json {
        return Err(miette::miette!(
            "--out-dir is required when transforming more than one file"
        ));
    }

    let out_paths = output_paths(action)?;
    let mut results = Vec::with_capacity(action.files.len());

    for (file, out_path) in action.files.iter().zip(out_paths) {
        let result = transform_file(action, file, out_path);

        if !action.json {
            // Outside JSON mode the first failure ends the run
            let (output, written) =
                result.map_err(|err| miette::miette!("{}: {}", err.code(), err))?;
            match written {
                Some(path) => tracing::info!(
                    file = %file.display(),
                    output = %path.display(),
                    replacements = output.stats.total(),
                    "transformed"
                ),
                None => print!("{}", output.code),
            }
            continue;
        }

        results.push(match result {
            Ok((output, written)) => FileResultJson {
                path: file.display().to_string(),
                ok: true,
                replacements: ReplacementsJson {
                    properties: output.stats.properties,
                    objects: output.stats.objects,
                },
                code: written.is_none().then(|| output.code.clone()),
                output: written.map(|p| p.display().to_string()),
                error: None,
            },
            Err(err) => FileResultJson {
                path: file.display().to_string(),
                ok: false,
                replacements: ReplacementsJson::default(),
                output: None,
                code: None,
                error: Some(err.into()),
            },
        });
    }

    if action.json {
        let ok = results.iter().all(|r| r.ok);
        let report = TransformReportJson {
            schema_version: SCHEMA_VERSION,
            ok,
            prefixes: action.options.prefixes(),
            files: results,
        };
        println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);

        if !ok {
            std::process::exit(EXIT_ERROR);
        }
    }

    Ok(())
}

/// Where each input lands under `--out-dir`, keeping its path relative to
/// `cwd`. Fails when two inputs would be written to the same place.
fn output_paths(action: &TransformAction) -> Result<Vec<Option<PathBuf>>> {
    let Some(out_dir) = &action.out_dir else {
        return Ok(vec![None; action.files.len()]);
    };

    let out_dir = super::resolve(&action.cwd, out_dir);
    let mut seen: HashMap<PathBuf, &Path> = HashMap::new();
    let mut paths = Vec::with_capacity(action.files.len());

    for file in &action.files {
        let out_path = output_path(&action.cwd, &out_dir, file);
        if let Some(previous) = seen.insert(out_path.clone(), file) {
            return Err(miette::miette!(
                "{} and {} would both be written to {}",
                previous.display(),
                file.display(),
                out_path.display()
            ));
        }
        paths.push(Some(out_path));
    }

    Ok(paths)
}

/// `file` relative to `cwd`, rebuilt under `out_dir`. Root, `.` and `..`
/// components are dropped so the result never leaves `out_dir`.
fn output_path(cwd: &Path, out_dir: &Path, file: &Path) -> PathBuf {
    let path = super::resolve(cwd, file);
    let relative = path.strip_prefix(cwd).unwrap_or(&path);

    let mut out_path = out_dir.to_path_buf();
    out_path.extend(relative.components().filter_map(|component| match component {
        Component::Normal(part) => Some(part),
        _ => None,
    }));
    out_path
}

/// Transform one file and write it to `out_path` when one is given.
fn transform_file(
    action: &TransformAction,
    file: &Path,
    out_path: Option<PathBuf>,
) -> std::result::Result<(TransformOutput, Option<PathBuf>), Error> {
    let path = super::resolve(&action.cwd, file);
    let source = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;

    let spec = TransformSpec::new(file.display().to_string())
        .with_sourcemap(action.sourcemap && out_path.is_some());
    let output = transform(&source, &spec, &action.options)?;

    let Some(out_path) = out_path else {
        return Ok((output, None));
    };

    write_output(&out_path, &output)?;
    Ok((output, Some(out_path)))
}

fn write_output(out_path: &Path, output: &TransformOutput) -> std::result::Result<(), Error> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let mut code = output.code.clone();
    if let Some(map) = &output.source_map {
        let mut map_name = out_path.as_os_str().to_owned();
        map_name.push(".map");
        let map_path = PathBuf::from(map_name);

        if let Some(name) = map_path.file_name() {
            code.push_str(&format!("//# sourceMappingURL={}\n", name.to_string_lossy()));
        }
        std::fs::write(&map_path, map).map_err(|e| Error::io(&map_path, e))?;
    }

    std::fs::write(out_path, code).map_err(|e| Error::io(out_path, e))
}
