use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::ImportError;
use crate::model::{SourceBook, SourceReference};
use crate::util::sha256_file;

const TRANSLATIONS_DIR: &str = "translations";
const REFERENCES_DIR: &str = "cross-references";
const README_FILE: &str = "README.md";

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(#{1,6})\s+(.+?)(?:\s+#+)?\s*$").expect("heading regex is valid")
});
static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{0,3}(```|~~~)").expect("fence regex is valid"));
static LICENSE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(license|licence|copyright)").expect("license heading regex is valid")
});

#[derive(Debug, Clone)]
pub struct LoadedTranslation {
    pub code: String,
    pub category: String,
    pub title: String,
    pub license: String,
    pub books: Vec<SourceBook>,
    pub sha256: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoadedReferences {
    pub source: String,
    pub records: Vec<SourceReference>,
    pub sha256: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadmeMetadata {
    pub title: String,
    pub license: String,
}

/// On-disk layout of the JSON sources:
/// `translations/<category>/<code>/<code>.json` with a `README.md` beside it,
/// and `cross-references/*.json`.
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
}

impl SourceTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn categories(&self) -> Result<Vec<String>, ImportError> {
        let translations_root = self.root.join(TRANSLATIONS_DIR);
        if !translations_root.is_dir() {
            return Err(ImportError::not_found(
                "translations directory",
                translations_root.display().to_string(),
            ));
        }

        list_dir_names(&translations_root, |path| path.is_dir())
    }

    pub fn translations(&self, category: &str) -> Result<Vec<String>, ImportError> {
        let category_dir = self.root.join(TRANSLATIONS_DIR).join(category);
        if !category_dir.is_dir() {
            return Err(ImportError::not_found("category", category));
        }

        list_dir_names(&category_dir, |path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|code| path.join(format!("{code}.json")).is_file())
        })
    }

    pub fn translation_path(&self, category: &str, code: &str) -> PathBuf {
        self.root
            .join(TRANSLATIONS_DIR)
            .join(category)
            .join(code)
            .join(format!("{code}.json"))
    }

    pub fn load_translation(
        &self,
        category: &str,
        code: &str,
    ) -> Result<LoadedTranslation, ImportError> {
        let json_path = self.translation_path(category, code);
        if !json_path.is_file() {
            return Err(ImportError::not_found(
                "translation",
                format!("{category}/{code}"),
            ));
        }

        let books: Vec<SourceBook> = read_json(&json_path)?;

        let readme_path = json_path.with_file_name(README_FILE);
        let metadata = match fs::read_to_string(&readme_path) {
            Ok(text) => parse_readme(&text, code),
            Err(err) => {
                warn!(
                    path = %readme_path.display(),
                    error = %err,
                    "readme unavailable, falling back to translation code"
                );
                ReadmeMetadata {
                    title: code.to_string(),
                    license: String::new(),
                }
            }
        };

        Ok(LoadedTranslation {
            code: code.to_string(),
            category: category.to_string(),
            title: metadata.title,
            license: metadata.license,
            books,
            sha256: source_hash(&json_path),
        })
    }

    pub fn reference_files(&self) -> Result<Vec<PathBuf>, ImportError> {
        let references_root = self.root.join(REFERENCES_DIR);
        if !references_root.is_dir() {
            return Err(ImportError::not_found(
                "cross-references directory",
                references_root.display().to_string(),
            ));
        }

        let mut files = Vec::new();
        let entries = fs::read_dir(&references_root)
            .map_err(|err| ImportError::io(&references_root, err))?;
        for entry in entries {
            let path = entry.map_err(|err| ImportError::io(&references_root, err))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();

        Ok(files)
    }
}

pub fn load_references(path: &Path) -> Result<LoadedReferences, ImportError> {
    if !path.is_file() {
        return Err(ImportError::not_found(
            "reference file",
            path.display().to_string(),
        ));
    }

    let source = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(ToOwned::to_owned)
        .ok_or_else(|| ImportError::not_found("reference file name", path.display().to_string()))?;
    let records: Vec<SourceReference> = read_json(path)?;

    Ok(LoadedReferences {
        source,
        records,
        sha256: source_hash(path),
    })
}

/// Title is the first H1; license is the body under the first heading that
/// starts with "license" or "copyright". Lines inside code fences are never
/// headings.
pub fn parse_readme(text: &str, fallback_title: &str) -> ReadmeMetadata {
    let mut title = None;
    let mut license_lines: Option<Vec<&str>> = None;
    let mut license_done = false;
    let mut in_fence = false;

    for line in text.lines() {
        let fence = FENCE.is_match(line);
        if fence {
            in_fence = !in_fence;
        }
        let heading = if fence || in_fence {
            None
        } else {
            HEADING.captures(line.trim_end())
        };

        if let Some(caps) = heading {
            let level = caps[1].len();
            let heading_text = caps[2].trim();

            if level == 1 && title.is_none() {
                title = Some(heading_text.to_string());
            }

            if license_lines.is_some() {
                license_done = true;
            } else if LICENSE_HEADING.is_match(heading_text) {
                license_lines = Some(Vec::new());
            }
            continue;
        }

        if license_done {
            continue;
        }
        if let Some(lines) = license_lines.as_mut() {
            lines.push(line);
        }
    }

    ReadmeMetadata {
        title: title.unwrap_or_else(|| fallback_title.to_string()),
        license: license_lines
            .map(|lines| lines.join("\n").trim().to_string())
            .unwrap_or_default(),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ImportError> {
    let raw = fs::read(path).map_err(|err| ImportError::io(path, err))?;
    serde_json::from_slice(&raw).map_err(|source| ImportError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn source_hash(path: &Path) -> Option<String> {
    match sha256_file(path) {
        Ok(hash) => Some(hash),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to hash source file");
            None
        }
    }
}

fn list_dir_names<F>(dir: &Path, keep: F) -> Result<Vec<String>, ImportError>
where
    F: Fn(&Path) -> bool,
{
    let mut names = Vec::new();
    let entries = fs::read_dir(dir).map_err(|err| ImportError::io(dir, err))?;
    for entry in entries {
        let path = entry.map_err(|err| ImportError::io(dir, err))?.path();
        if !keep(&path) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
            names.push(name.to_string());
        }
    }
    names.sort();

    Ok(names)
}
