//! Package Validator - Protective, Read-Only
//!
//! Checks a generated package for structural completeness and, on request,
//! expected-output closure. Manifest-declared image names are vetted
//! against path traversal before any filesystem probe: `../evil.png` must
//! be rejected without ever touching the resolved path.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::package::{
    CATEGORIES, MANIFEST_FILE, PRODUCT_META_FILE, PROMPT_FILES, QC_CHECKLIST_FILE, TEXT_FILES,
};

/// Parse a JSON file that must exist and hold a top-level object.
fn read_json_object(path: &Path) -> Result<Map<String, Value>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::validation(format!(
                "Missing required file: {}",
                path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };
    let value: Value = serde_json::from_str(&raw)
        .map_err(|e| Error::validation(format!("Invalid JSON in {}: {e}", path.display())))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(Error::validation(format!(
            "Invalid JSON in {}: expected an object",
            path.display()
        ))),
    }
}

/// Reject anything but a plain basename: no separators, not absolute, no
/// `.`/`..` segments, resolves to itself.
fn check_expected_filename(fname: &str) -> Result<()> {
    if fname.contains('/') || fname.contains('\\') {
        return Err(Error::validation(format!(
            "Invalid expected filename (must not contain path separators): {fname}"
        )));
    }
    if fname.is_empty() || fname == "." || fname == ".." {
        return Err(Error::validation(format!("Invalid expected filename: {fname}")));
    }
    let path = Path::new(fname);
    let is_plain_basename = !path.is_absolute()
        && path.file_name().map_or(false, |name| name == fname);
    if !is_plain_basename {
        return Err(Error::validation(format!(
            "Invalid expected filename (must be a basename): {fname}"
        )));
    }
    Ok(())
}

/// Validate one package directory.
///
/// Always checks manifest parseability and the fixed required-file set
/// (missing files are aggregated into one error). With `require_images`,
/// additionally requires every manifest-declared expected output to exist
/// under its category directory.
pub fn validate_package(package_dir: &Path, require_images: bool) -> Result<()> {
    let manifest_path = package_dir.join(MANIFEST_FILE);
    let manifest = read_json_object(&manifest_path)?;

    let prompts_dir = package_dir.join("prompts");
    let texts_dir = package_dir.join("texts");
    let meta_dir = package_dir.join("meta");

    let mut required = vec![manifest_path];
    required.extend(PROMPT_FILES.iter().map(|name| prompts_dir.join(name)));
    required.extend(TEXT_FILES.iter().map(|name| texts_dir.join(name)));
    required.push(meta_dir.join(QC_CHECKLIST_FILE));
    required.push(meta_dir.join(PRODUCT_META_FILE));

    let missing: Vec<String> = required
        .iter()
        .filter(|path| !path.is_file())
        .map(|path| path.display().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::validation(format!(
            "Missing required files:\n- {}",
            missing.join("\n- ")
        )));
    }

    if !require_images {
        return Ok(());
    }

    let Some(Value::Object(expected_outputs)) = manifest.get("expected_outputs") else {
        return Err(Error::validation(
            "manifest.json missing 'expected_outputs' object",
        ));
    };

    for category in CATEGORIES {
        let Some(Value::Array(files)) = expected_outputs.get(category) else {
            return Err(Error::validation(format!(
                "manifest.json expected_outputs.{category} must be a list"
            )));
        };

        let category_dir = package_dir.join(category);
        if !category_dir.is_dir() {
            return Err(Error::validation(format!(
                "Missing expected category folder: {}",
                category_dir.display()
            )));
        }
        for fname in files {
            let Value::String(fname) = fname else {
                return Err(Error::validation(format!(
                    "manifest.json expected_outputs.{category} contains non-string"
                )));
            };
            check_expected_filename(fname)?;
            if !category_dir.join(fname).exists() {
                return Err(Error::validation(format!(
                    "Missing expected image: {}",
                    category_dir.join(fname).display()
                )));
            }
        }
    }
    Ok(())
}

/// Immediate subdirectories of `out_root` holding a manifest, sorted.
/// Finding none is an error: an empty root has nothing to vouch for.
pub fn discover_packages(out_root: &Path) -> Result<Vec<PathBuf>> {
    let mut packages = Vec::new();
    for entry in fs::read_dir(out_root)? {
        let path = entry?.path();
        if path.is_dir() && path.join(MANIFEST_FILE).is_file() {
            packages.push(path);
        }
    }
    packages.sort();

    if packages.is_empty() {
        return Err(Error::validation(format!(
            "No product manifests found under: {}",
            out_root.display()
        )));
    }
    Ok(packages)
}
