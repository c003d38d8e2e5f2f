//! Repo-local architectural lint for the console's hexagonal boundaries.
//!
//! The console crate splits into `domain` (request pipeline plus ports),
//! `inbound` (the command-line surface) and `outbound` (HTTP transport and
//! credential storage). This crate parses every source file under
//! `console/src/{domain,inbound,outbound}` and:
//!
//! - forbids `domain` code from depending on adapter modules (`inbound`,
//!   `outbound`) or on transport, filesystem, CLI and configuration crates
//! - forbids `inbound` code from importing `outbound` modules or the HTTP
//!   client directly
//! - forbids `outbound` code from importing `inbound` modules or the CLI
//!   parser
//!
//! Run it with `cargo run -p architecture-lint`.

use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use syn::visit::Visit;

/// Crate name under which integration code may refer to the console library.
const CONSOLE_CRATE: &str = "chatbot_console";

const LAYER_DIRS: [&str; 3] = ["domain", "inbound", "outbound"];

/// A single boundary violation discovered by the linter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File path relative to `console/src`.
    pub file: PathBuf,
    /// Human-readable description of the violated rule.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.message)
    }
}

/// Failure modes returned by the architecture lint.
#[derive(Debug)]
pub enum ArchitectureLintError {
    /// Directory traversal or reading failed.
    Io(io::Error),
    /// A file could not be parsed or placed in a layer.
    Parse {
        /// Offending file.
        file: PathBuf,
        /// Parser complaint.
        message: String,
    },
    /// One or more boundary violations were found.
    Violations(Vec<Violation>),
}

impl fmt::Display for ArchitectureLintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error while linting architecture: {err}"),
            Self::Parse { file, message } => write!(
                f,
                "Failed to parse Rust source while linting architecture ({}): {message}",
                file.display()
            ),
            Self::Violations(violations) => {
                writeln!(f, "Architecture boundary violations:")?;
                for violation in violations {
                    writeln!(f, "- {violation}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ArchitectureLintError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse { .. } | Self::Violations(_) => None,
        }
    }
}

impl From<io::Error> for ArchitectureLintError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Lint the console crate sources on disk.
///
/// `console_dir` must be the `console/` directory at the repository root.
///
/// # Errors
///
/// Returns [`ArchitectureLintError::Violations`] listing every boundary
/// breach, or an I/O or parse error when the sources cannot be read.
pub fn lint_console_sources(console_dir: &Path) -> Result<(), ArchitectureLintError> {
    let sources = collect_lint_sources(&console_dir.join("src"))?;
    lint_sources(&sources)
}

/// Lint the provided Rust sources. Intended for unit and behaviour tests.
///
/// # Errors
///
/// Same as [`lint_console_sources`], minus the I/O failures.
pub fn lint_sources(sources: &[LintSource]) -> Result<(), ArchitectureLintError> {
    let mut violations = Vec::new();

    for source in sources {
        let layer = Layer::infer_from_path(&source.file).ok_or_else(|| {
            ArchitectureLintError::Parse {
                file: source.file.clone(),
                message: "unable to infer module layer from file path".to_owned(),
            }
        })?;
        let parsed =
            syn::parse_file(&source.contents).map_err(|err| ArchitectureLintError::Parse {
                file: source.file.clone(),
                message: err.to_string(),
            })?;
        violations.extend(check_file(&source.file, layer, &parsed));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ArchitectureLintError::Violations(violations))
    }
}

/// A Rust source file to be linted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSource {
    /// Path relative to `console/src`.
    pub file: PathBuf,
    /// File contents.
    pub contents: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    Domain,
    Inbound,
    Outbound,
}

impl Layer {
    fn infer_from_path(relative_path: &Path) -> Option<Self> {
        let first = relative_path
            .components()
            .next()?
            .as_os_str()
            .to_string_lossy();
        match first.as_ref() {
            "domain" => Some(Self::Domain),
            "inbound" => Some(Self::Inbound),
            "outbound" => Some(Self::Outbound),
            _ => None,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }

    fn forbidden_modules(self) -> BTreeSet<&'static str> {
        match self {
            Self::Domain => BTreeSet::from(["inbound", "outbound"]),
            Self::Inbound => BTreeSet::from(["outbound"]),
            Self::Outbound => BTreeSet::from(["inbound"]),
        }
    }

    fn forbidden_crates(self) -> BTreeSet<&'static str> {
        match self {
            Self::Domain => BTreeSet::from([
                "cap_std",
                "clap",
                "color_eyre",
                "ortho_config",
                "reqwest",
                "tracing_subscriber",
            ]),
            Self::Inbound => BTreeSet::from(["reqwest"]),
            Self::Outbound => BTreeSet::from(["clap", "color_eyre"]),
        }
    }
}

fn check_file(file: &Path, layer: Layer, parsed: &syn::File) -> Vec<Violation> {
    let forbidden_modules = layer.forbidden_modules();
    let forbidden_crates = layer.forbidden_crates();

    let mut collector = PathCollector::default();
    collector.visit_file(parsed);

    let mut messages = BTreeSet::new();
    for segments in &collector.paths {
        if let Some(root) = internal_module_root(segments).and_then(|root| {
            forbidden_modules.get(root).copied()
        }) {
            messages.insert(format!(
                "{} module must not depend on crate::{root}",
                layer.name()
            ));
        }
        if let Some(root) = external_crate_root(segments).and_then(|root| {
            forbidden_crates.get(root).copied()
        }) {
            messages.insert(format!(
                "{} module must not depend on external crate `{root}`",
                layer.name()
            ));
        }
    }

    messages
        .into_iter()
        .map(|message| Violation {
            file: file.to_path_buf(),
            message,
        })
        .collect()
}

fn is_relative_segment(segment: &str) -> bool {
    matches!(segment, "crate" | "self" | "super")
}

fn internal_module_root(segments: &[String]) -> Option<&str> {
    let first = segments.first()?.as_str();
    if LAYER_DIRS.contains(&first) {
        return Some(first);
    }
    let start = if is_relative_segment(first) {
        segments
            .iter()
            .position(|segment| !is_relative_segment(segment))?
    } else if first == CONSOLE_CRATE {
        1
    } else {
        return None;
    };
    segments.get(start).map(String::as_str)
}

fn external_crate_root(segments: &[String]) -> Option<&str> {
    let root = segments.first()?.as_str();
    if is_relative_segment(root) || root == CONSOLE_CRATE {
        return None;
    }
    Some(root)
}

#[derive(Default)]
struct PathCollector {
    paths: BTreeSet<Vec<String>>,
}

impl PathCollector {
    fn record_path(&mut self, path: &syn::Path) {
        let segments = path
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect::<Vec<_>>();
        if !segments.is_empty() {
            self.paths.insert(segments);
        }
    }

    fn record_use_tree(&mut self, tree: &syn::UseTree, prefix: Vec<String>) {
        let leaf = |mut segments: Vec<String>, last: String| {
            segments.push(last);
            segments
        };
        match tree {
            syn::UseTree::Path(path) => {
                self.record_use_tree(&path.tree, leaf(prefix, path.ident.to_string()));
            }
            syn::UseTree::Name(name) => {
                self.paths.insert(leaf(prefix, name.ident.to_string()));
            }
            syn::UseTree::Rename(rename) => {
                self.paths.insert(leaf(prefix, rename.ident.to_string()));
            }
            syn::UseTree::Glob(_) => {
                self.paths.insert(leaf(prefix, "*".to_owned()));
            }
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.record_use_tree(item, prefix.clone());
                }
            }
        }
    }
}

impl<'ast> Visit<'ast> for PathCollector {
    fn visit_path(&mut self, node: &'ast syn::Path) {
        self.record_path(node);
        syn::visit::visit_path(self, node);
    }

    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        self.record_use_tree(&node.tree, Vec::new());
    }
}

fn collect_lint_sources(src_dir: &Path) -> Result<Vec<LintSource>, ArchitectureLintError> {
    let root = Dir::open_ambient_dir(src_dir, ambient_authority())?;
    let mut sources = Vec::new();
    for layer_dir in LAYER_DIRS {
        let dir = match root.open_dir(layer_dir) {
            Ok(dir) => dir,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => return Err(err.into()),
        };
        collect_sources_under(&dir, Path::new(layer_dir), &mut sources)?;
    }
    sources.sort_by(|left, right| left.file.cmp(&right.file));
    Ok(sources)
}

fn collect_sources_under(
    dir: &Dir,
    relative: &Path,
    sources: &mut Vec<LintSource>,
) -> Result<(), ArchitectureLintError> {
    for entry in dir.entries()? {
        let entry = entry?;
        let name = entry.file_name();
        let path = relative.join(&name);
        if entry.file_type()?.is_dir() {
            collect_sources_under(&entry.open_dir()?, &path, sources)?;
            continue;
        }
        if Path::new(&name).extension().and_then(|ext| ext.to_str()) != Some("rs") {
            continue;
        }
        let contents = dir.read_to_string(Path::new(&name))?;
        sources.push(LintSource {
            file: path,
            contents,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests;
