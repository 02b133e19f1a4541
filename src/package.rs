//! Package Generator - Single Entry Point
//!
//! `generate_package` turns one validated record into an on-disk package:
//! fixed subdirectories, overlay text sources, seven prompt sheets, and the
//! JSON manifests. Derivation is deterministic — the only clock dependency
//! is the generation timestamp — and every file lands via atomic rename.
//!
//! CRITICAL: all identifier/collision checks run before the first write.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::fsio::{write_json_atomic, write_text_atomic};
use crate::policy::safe_id;
use crate::record::{ProductRecord, Units};
use crate::MANIFEST_VERSION;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const QC_CHECKLIST_FILE: &str = "qc_checklist.json";
pub const PRODUCT_META_FILE: &str = "product.json";
pub const PERSONALIZATION_TEXT_FILE: &str = "personalization_text.txt";

/// Image categories, in expected-output order.
pub const CATEGORIES: [&str; 3] = ["showcase", "spec", "howto"];

/// Subdirectories of every package.
pub const PACKAGE_DIRS: [&str; 7] =
    ["showcase", "spec", "howto", "source", "prompts", "texts", "meta"];

/// Prompt sheets written under `prompts/`, in generation order.
pub const PROMPT_FILES: [&str; 7] = [
    "showcase_01_clean_main.txt",
    "showcase_02_lifestyle_A.txt",
    "showcase_03_lifestyle_B.txt",
    "spec_01_dimensions_background.txt",
    "spec_02_specs_background.txt",
    "howto_01_steps_background.txt",
    "howto_02_tips_background.txt",
];

/// Overlay text sources written under `texts/`.
pub const TEXT_FILES: [&str; 4] =
    ["spec_01.txt", "spec_02.txt", "howto_01.txt", "howto_02.txt"];

/// Fail-fast rejection criteria for downstream review. Informational only;
/// nothing in this crate enforces them.
pub const QC_FAIL_FAST: [&str; 5] = [
    "Product changed (shape/structure/color/ratio).",
    "Background too similar to supplier image (duplicate suspicion).",
    "Any visible text is not English (except immutable brand trademark).",
    "Specs values/units/meaning changed.",
    "How-to meaning changed (steps/tips no longer match the source).",
];

pub const QC_REJECT_TAGS: [&str; 7] = [
    "product_changed",
    "background_too_similar",
    "text_not_english",
    "spec_value_error",
    "howto_meaning_changed",
    "personalization_rule_violation",
    "low_realism",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub generated_at_utc: String,
    pub batch_id: Option<String>,
    pub product: ProductSummary,
    pub expected_outputs: ExpectedOutputs,
    pub paths: PackagePaths,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    pub product_id: String,
    pub safe_product_id: String,
    pub product_name_en: String,
    pub style_pack: String,
    pub output_set: String,
}

/// Image basenames the downstream pipeline must eventually produce,
/// pattern `{safe_product_id}_{category}_{NN}[_{safe_batch_id}].png`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectedOutputs {
    pub showcase: Vec<String>,
    pub spec: Vec<String>,
    pub howto: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagePaths {
    pub showcase_dir: String,
    pub spec_dir: String,
    pub howto_dir: String,
    pub source_dir: String,
    pub prompts_dir: String,
    pub texts_dir: String,
    pub meta_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QcChecklist {
    pub fail_fast: Vec<String>,
    pub reject_tags: Vec<String>,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductMeta {
    pub generated_at_utc: String,
    pub product_id: String,
    pub style_pack: String,
    pub units: Units,
    pub dimensions: MetaDimensions,
    pub has_personalization_text: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaDimensions {
    pub l: Option<String>,
    pub w: Option<String>,
    pub h: Option<String>,
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Normalize an optional batch id: trimmed, spaces to underscores, and
/// already safe apart from spaces — anything else is rejected.
fn normalize_batch_id(batch_id: Option<&str>) -> Result<Option<String>> {
    let Some(batch_id) = batch_id else {
        return Ok(None);
    };
    let raw = batch_id.trim().replace(' ', "_");
    let safe = safe_id(batch_id);
    if safe.is_empty() {
        return Err(Error::validation("batch_id cannot be empty after normalization"));
    }
    if safe != raw {
        return Err(Error::validation(
            "batch_id contains unsafe characters; allowed: letters, numbers, '-' and '_'",
        ));
    }
    Ok(Some(safe))
}

/// Read `product.product_id` out of a pre-existing manifest, if any.
///
/// A manifest that exists but lacks a well-formed id string is an error:
/// the collision check cannot vouch for a package it cannot identify.
fn existing_manifest_product_id(product_dir: &Path) -> Result<Option<String>> {
    let manifest_path = product_dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(&manifest_path)?;
    let data: Value = serde_json::from_str(&raw).map_err(|e| {
        Error::validation(format!("Invalid JSON in existing {}: {e}", manifest_path.display()))
    })?;

    let Value::Object(data) = data else {
        return Err(Error::validation(format!(
            "Invalid existing {}: expected JSON object",
            manifest_path.display()
        )));
    };
    let Some(Value::Object(product)) = data.get("product") else {
        return Err(Error::validation(format!(
            "Invalid existing {}: missing 'product' object",
            manifest_path.display()
        )));
    };
    match product.get("product_id") {
        Some(Value::String(pid)) => Ok(Some(pid.clone())),
        _ => Err(Error::validation(format!(
            "Invalid existing {}: missing 'product.product_id' string",
            manifest_path.display()
        ))),
    }
}

fn push_lines(lines: &mut Vec<String>, fixed: &[&str]) {
    lines.extend(fixed.iter().map(|s| s.to_string()));
}

/// The NON-NEGOTIABLES preamble shared by all seven prompts.
fn global_constraints(record: &ProductRecord) -> Vec<String> {
    let mut lines = vec![
        "NON-NEGOTIABLES:".to_string(),
        "- Product Lock: product must be 100% identical to supplier product (shape/structure/color/ratio)."
            .to_string(),
        "- Background must be clearly different from supplier images (no duplication).".to_string(),
        "- Final images must contain only English text; do not invent text.".to_string(),
        "- Keep realism, correct materials, and believable shadows.".to_string(),
        String::new(),
        format!("Style pack: {}", record.style_pack),
    ];
    if let Some(keywords) = &record.must_have_keywords {
        lines.push(format!("Must-have keywords (manager): {keywords}"));
    }
    if let Some(avoid) = &record.must_avoid_elements {
        lines.push(format!("Must-avoid elements (manager): {avoid}"));
    }
    if let Some(notes) = &record.manager_notes {
        lines.push(format!("Manager notes (may be EN/RU): {notes}"));
    }
    lines
}

const SPEC_SHOT_COMMON: [&str; 5] = [
    "TYPE: Specs image background + product (text will be template-rendered).",
    "- Do NOT render any text inside the image.",
    "- Reserve a clean info bar area (~30% of canvas) at the bottom or side.",
    "- Keep safe margins >= 120px.",
    "- Ensure the info area has enough contrast for later text overlay.",
];

const HOWTO_SHOT_COMMON: [&str; 5] = [
    "TYPE: How-to image background + product (text will be template-rendered).",
    "- Do NOT render any text inside the image.",
    "- Reserve a clean info area (~30% of canvas) for steps/tips.",
    "- Keep safe margins >= 120px.",
    "- Ensure the info area has enough contrast for later text overlay.",
];

fn shot_prompt(global: &[String], shot: &[&str]) -> String {
    let mut lines = global.to_vec();
    lines.push(String::new());
    push_lines(&mut lines, shot);
    lines.join("\n")
}

/// Overlay-background prompt: shared shot block plus the text-source
/// pointer the later rendering step consumes.
fn overlay_prompt(global: &[String], shot: &[&str], text_source: &str, content: &str) -> String {
    let mut lines = global.to_vec();
    lines.push(String::new());
    push_lines(&mut lines, shot);
    lines.push(String::new());
    lines.push(format!("TEXT SOURCE (for later overlay): texts/{text_source}"));
    lines.push(format!("CONTENT: {content}"));
    lines.join("\n")
}

fn expected_outputs(prefix: &str, batch_suffix: &str) -> ExpectedOutputs {
    let name =
        |category: &str, nn: usize| format!("{prefix}_{category}_{nn:02}{batch_suffix}.png");
    ExpectedOutputs {
        showcase: (1..=3).map(|nn| name("showcase", nn)).collect(),
        spec: (1..=2).map(|nn| name("spec", nn)).collect(),
        howto: (1..=2).map(|nn| name("howto", nn)).collect(),
    }
}

/// Generate the on-disk package for one record under `out_root`.
///
/// Returns the package directory. Side effects are confined to that
/// subtree. Callers running generations in parallel must serialize per
/// normalized product id: the collision check is read-then-write, not a
/// lock.
pub fn generate_package(
    record: &ProductRecord,
    out_root: &Path,
    batch_id: Option<&str>,
) -> Result<PathBuf> {
    if out_root.exists() && !out_root.is_dir() {
        return Err(Error::validation(format!(
            "Output root must be a directory: {}",
            out_root.display()
        )));
    }

    let safe_product_id = safe_id(&record.product_id);
    if safe_product_id.is_empty() {
        return Err(Error::validation(format!(
            "product_id '{}' cannot be converted to a safe folder name.",
            record.product_id
        )));
    }
    if safe_product_id != record.product_id {
        return Err(Error::validation(
            "product_id contains unsafe characters; allowed: letters, numbers, '-' and '_'",
        ));
    }

    let safe_batch_id = normalize_batch_id(batch_id)?;

    let product_dir = out_root.join(&safe_product_id);
    if let Some(existing) = existing_manifest_product_id(&product_dir)? {
        if existing != record.product_id {
            return Err(Error::validation(format!(
                "product_id collision after normalization: existing '{existing}' vs new '{}' map to '{safe_product_id}'",
                record.product_id
            )));
        }
    }

    for dir in PACKAGE_DIRS {
        fs::create_dir_all(product_dir.join(dir))?;
    }
    let prompts_dir = product_dir.join("prompts");
    let texts_dir = product_dir.join("texts");
    let meta_dir = product_dir.join("meta");

    // Overlay text sources (English-only; template-rendered onto the
    // generated backgrounds later).
    let mut spec_01 = vec![record.product_name_en.clone()];
    if let Some(dims) = record.dimensions_line() {
        spec_01.push(dims);
    }
    spec_01.extend(record.specs.iter().map(|s| format!("- {s}")));

    let mut spec_02 = vec!["Key Specs".to_string(), String::new()];
    spec_02.extend(record.specs.iter().map(|s| format!("- {s}")));

    let mut howto_01 = vec![record.howto_title.clone(), String::new()];
    howto_01.extend(
        record
            .steps
            .iter()
            .enumerate()
            .map(|(i, s)| format!("Step {}: {s}", i + 1)),
    );

    let mut howto_02 = vec!["Tips".to_string(), String::new()];
    if record.tips.is_empty() {
        howto_02.push("- (Optional) Add 2-4 short English tips.".to_string());
    } else {
        howto_02.extend(record.tips.iter().map(|t| format!("- {t}")));
    }

    let text_bodies = [
        spec_01.join("\n"),
        spec_02.join("\n"),
        howto_01.join("\n"),
        howto_02.join("\n"),
    ];
    for (name, body) in TEXT_FILES.iter().zip(text_bodies.iter()) {
        write_text_atomic(&texts_dir.join(name), body)?;
    }

    if let Some(text) = &record.personalization_text_en {
        if !text.is_empty() {
            write_text_atomic(&texts_dir.join(PERSONALIZATION_TEXT_FILE), text)?;
        }
    }

    // Prompt sheets.
    let global = global_constraints(record);
    let prompt_bodies = [
        shot_prompt(
            &global,
            &[
                "SHOT TYPE: Clean main e-commerce image (1:1).",
                "- Simple, clean background suitable for marketplaces.",
                "- Product centered, uncluttered, soft shadow.",
                "- No extra props that could alter perception of the product.",
            ],
        ),
        shot_prompt(
            &global,
            &[
                "SHOT TYPE: Lifestyle scene (variation A).",
                "- Clearly different background and composition vs supplier images.",
                "- Keep product identity locked.",
                "- Add context props appropriate to the category, but do not occlude key product parts.",
            ],
        ),
        shot_prompt(
            &global,
            &[
                "SHOT TYPE: Lifestyle scene (variation B).",
                "- Different scene/lighting/composition vs variation A.",
                "- Keep product identity locked.",
            ],
        ),
        overlay_prompt(&global, &SPEC_SHOT_COMMON, "spec_01.txt", "dimensions/structure emphasis."),
        overlay_prompt(&global, &SPEC_SHOT_COMMON, "spec_02.txt", "key specs list emphasis."),
        overlay_prompt(&global, &HOWTO_SHOT_COMMON, "howto_01.txt", "steps/instructions."),
        overlay_prompt(&global, &HOWTO_SHOT_COMMON, "howto_02.txt", "tips/notice."),
    ];
    for (name, body) in PROMPT_FILES.iter().zip(prompt_bodies.iter()) {
        write_text_atomic(&prompts_dir.join(name), body)?;
    }

    // Manifests.
    let batch_suffix = safe_batch_id
        .as_deref()
        .map(|b| format!("_{b}"))
        .unwrap_or_default();
    let manifest = Manifest {
        version: MANIFEST_VERSION.to_string(),
        generated_at_utc: now_utc_iso(),
        batch_id: safe_batch_id,
        product: ProductSummary {
            product_id: record.product_id.clone(),
            safe_product_id: safe_product_id.clone(),
            product_name_en: record.product_name_en.clone(),
            style_pack: record.style_pack.clone(),
            output_set: record.output_set.clone(),
        },
        expected_outputs: expected_outputs(&safe_product_id, &batch_suffix),
        paths: PackagePaths {
            showcase_dir: "showcase".to_string(),
            spec_dir: "spec".to_string(),
            howto_dir: "howto".to_string(),
            source_dir: "source".to_string(),
            prompts_dir: "prompts".to_string(),
            texts_dir: "texts".to_string(),
            meta_dir: "meta".to_string(),
        },
    };
    write_json_atomic(&product_dir.join(MANIFEST_FILE), &manifest)?;

    let qc = QcChecklist {
        fail_fast: QC_FAIL_FAST.iter().map(|s| s.to_string()).collect(),
        reject_tags: QC_REJECT_TAGS.iter().map(|s| s.to_string()).collect(),
        notes: "If any fail_fast item fails, reject immediately.".to_string(),
    };
    write_json_atomic(&meta_dir.join(QC_CHECKLIST_FILE), &qc)?;

    let product_meta = ProductMeta {
        generated_at_utc: now_utc_iso(),
        product_id: record.product_id.clone(),
        style_pack: record.style_pack.clone(),
        units: record.units,
        dimensions: MetaDimensions {
            l: record.dimensions_l.clone(),
            w: record.dimensions_w.clone(),
            h: record.dimensions_h.clone(),
        },
        has_personalization_text: record
            .personalization_text_en
            .as_deref()
            .is_some_and(|t| !t.is_empty()),
    };
    write_json_atomic(&meta_dir.join(PRODUCT_META_FILE), &product_meta)?;

    Ok(product_dir)
}
