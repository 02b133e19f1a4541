//! Product Sheet Reader - CSV Rows to Validated Records
//!
//! Reads a UTF-8 (BOM-tolerant) CSV with a header row and parses each data
//! row into a [`ProductRecord`], applying the identifier and text policies
//! field by field. Any row-level validation failure carries the 1-based
//! input line number (the first data row is line 2, counting the header).

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::policy::{optional_text, require_english_text, safe_id};
use crate::record::{ProductRecord, Units, DEFAULT_OUTPUT_SET, DEFAULT_STYLE_PACK};

/// Cell lookup for one data row. Short rows leave trailing columns absent,
/// extra cells beyond the header are ignored.
fn row_cells<'a>(
    headers: &'a csv::StringRecord,
    fields: &'a csv::StringRecord,
) -> HashMap<&'a str, &'a str> {
    headers.iter().zip(fields.iter()).collect()
}

/// Collect up to `max_items` numbered `<prefix>_N` columns in order,
/// dropping blanks.
fn pick_list(prefix: &str, row: &HashMap<&str, &str>, max_items: usize) -> Vec<String> {
    let mut items = Vec::new();
    for i in 1..=max_items {
        let key = format!("{prefix}_{i}");
        if let Some(value) = row.get(key.as_str()) {
            let value = value.trim();
            if !value.is_empty() {
                items.push(value.to_string());
            }
        }
    }
    items
}

fn parse_row(row: &HashMap<&str, &str>) -> Result<ProductRecord> {
    let product_id = row.get("product_id").copied().unwrap_or("").trim().to_string();
    if product_id.is_empty() {
        return Err(Error::validation("Missing required field: product_id"));
    }
    if safe_id(&product_id) != product_id {
        return Err(Error::validation(
            "product_id contains unsafe characters; allowed: letters, numbers, '-' and '_'",
        ));
    }

    let product_name_en =
        require_english_text("product_name_en", row.get("product_name_en").copied().unwrap_or(""))?;

    let style_pack = {
        let raw = row.get("style_pack").copied().unwrap_or("").trim();
        if raw.is_empty() {
            DEFAULT_STYLE_PACK.to_string()
        } else {
            raw.to_string()
        }
    };

    let output_set = {
        let raw = row.get("output_set").copied().unwrap_or("").trim().to_lowercase();
        if raw.is_empty() {
            DEFAULT_OUTPUT_SET.to_string()
        } else {
            raw
        }
    };
    if output_set != DEFAULT_OUTPUT_SET {
        return Err(Error::validation(format!(
            "Unsupported output_set '{output_set}' (supported: minimum)"
        )));
    }

    let units = {
        let raw = row.get("units").copied().unwrap_or("").trim().to_lowercase();
        let token = if raw.is_empty() { "cm".to_string() } else { raw };
        Units::parse(&token)
            .ok_or_else(|| Error::validation("units must be 'cm' or 'in'"))?
    };

    let dimensions_l = optional_text(row.get("dimensions_l").copied());
    let dimensions_w = optional_text(row.get("dimensions_w").copied());
    let dimensions_h = optional_text(row.get("dimensions_h").copied());

    let specs_raw = pick_list("spec", row, 8);
    let mut specs = Vec::with_capacity(specs_raw.len());
    for (i, s) in specs_raw.iter().enumerate() {
        specs.push(require_english_text(&format!("spec_{}", i + 1), s)?);
    }
    if specs.len() < 3 {
        return Err(Error::validation("Need at least 3 specs (spec_1..spec_8)."));
    }

    // Empty-string cells fall back to the default title; a whitespace-only
    // cell does not, and fails the English check instead.
    let howto_title = {
        let raw = row.get("howto_title").copied().unwrap_or("");
        let source = if raw.is_empty() { "How to Use" } else { raw };
        require_english_text("howto_title", source)?
    };

    let steps_raw = pick_list("step", row, 6);
    let mut steps = Vec::with_capacity(steps_raw.len());
    for (i, s) in steps_raw.iter().enumerate() {
        steps.push(require_english_text(&format!("step_{}", i + 1), s)?);
    }
    if steps.len() < 3 {
        return Err(Error::validation("Need at least 3 steps (step_1..step_6)."));
    }

    let tips_raw = pick_list("tip", row, 4);
    let mut tips = Vec::with_capacity(tips_raw.len());
    for (i, t) in tips_raw.iter().enumerate() {
        tips.push(require_english_text(&format!("tip_{}", i + 1), t)?);
    }

    let manager_notes = optional_text(row.get("manager_notes").copied());
    let must_have_keywords = optional_text(row.get("must_have_keywords").copied());
    let must_avoid_elements = optional_text(row.get("must_avoid_elements").copied());

    let personalization_text_en =
        match optional_text(row.get("personalization_text_en").copied()) {
            Some(text) => Some(require_english_text("personalization_text_en", &text)?),
            None => None,
        };

    Ok(ProductRecord {
        product_id,
        product_name_en,
        style_pack,
        output_set,
        units,
        dimensions_l,
        dimensions_w,
        dimensions_h,
        specs,
        howto_title,
        steps,
        tips,
        manager_notes,
        must_have_keywords,
        must_avoid_elements,
        personalization_text_en,
    })
}

fn annotate_line(err: Error, line: usize) -> Error {
    match err {
        Error::Validation(message) => {
            Error::Validation(format!("CSV line {line}: {message}"))
        }
        other => other,
    }
}

/// Read and validate every product row of a sheet.
pub fn read_product_sheet(path: &Path) -> Result<Vec<ProductRecord>> {
    if !path.exists() {
        return Err(Error::validation(format!(
            "Input CSV not found: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)?;
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(raw.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.is_empty() || (headers.len() == 1 && headers[0].trim().is_empty()) {
        return Err(Error::validation("CSV has no header row."));
    }

    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let line = index + 2;
        let fields = result?;
        let cells = row_cells(&headers, &fields);
        let record = parse_row(&cells).map_err(|e| annotate_line(e, line))?;
        records.push(record);
    }

    if records.is_empty() {
        return Err(Error::validation("CSV has no product rows."));
    }
    Ok(records)
}

/// Batch-level duplicate check, run by callers before generation starts.
pub fn ensure_unique_product_ids(records: &[ProductRecord]) -> Result<()> {
    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(record.product_id.as_str()) {
            return Err(Error::validation(format!(
                "Duplicate product_id in CSV: '{}'",
                record.product_id
            )));
        }
    }
    Ok(())
}
