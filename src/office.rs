use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// Read the first worksheet of an `.xlsx` workbook into rows of cell text.
///
/// Every row is treated as data (no header). Missing cells become empty
/// strings so column positions are preserved.
pub fn extract_rows_from_xlsx(p: &Path) -> Result<Vec<Vec<String>>, String> {
    let file = File::open(p).map_err(|e| format!("Open .xlsx failed: {e}"))?;
    let mut zip = ZipArchive::new(file).map_err(|e| format!("Open .xlsx zip failed: {e}"))?;

    let shared = match read_entry(&mut zip, "xl/sharedStrings.xml") {
        Ok(xml) => parse_shared_strings(&xml)?,
        Err(_) => Vec::new(),
    };

    let sheet_name = first_sheet_name(&mut zip).ok_or_else(|| "Missing worksheet".to_string())?;
    let sheet = read_entry(&mut zip, &sheet_name)?;
    parse_sheet_xml(&sheet, &shared)
}

// ---- Internal helpers ----

fn read_entry(zip: &mut ZipArchive<File>, name: &str) -> Result<String, String> {
    let mut entry = zip.by_name(name).map_err(|_| format!("Missing {name}"))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| format!("Read {name} failed: {e}"))?;
    Ok(xml)
}

fn first_sheet_name(zip: &mut ZipArchive<File>) -> Option<String> {
    if zip.by_name("xl/worksheets/sheet1.xml").is_ok() {
        return Some("xl/worksheets/sheet1.xml".to_string());
    }
    let mut sheets: Vec<String> = zip
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/") && n.ends_with(".xml"))
        .map(String::from)
        .collect();
    sheets.sort();
    sheets.into_iter().next()
}

fn parse_shared_strings(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut phonetic_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"si" => current.clear(),
                b"t" => in_text = true,
                name if is_phonetic(name) => phonetic_depth += 1,
                _ => {}
            },
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"si" => out.push(std::mem::take(&mut current)),
                b"t" => in_text = false,
                name if is_phonetic(name) => phonetic_depth = phonetic_depth.saturating_sub(1),
                _ => {}
            },
            Ok(Event::Empty(e)) if local_name(e.name().as_ref()) == b"si" => {
                out.push(String::new());
            }
            Ok(Event::Text(t)) if in_text && phonetic_depth == 0 => {
                current.push_str(&t.unescape().map_err(|e| e.to_string())?);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("Parse sharedStrings.xml failed: {e}")),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

/// Cell being assembled while walking `<c>` children.
#[derive(Default)]
struct PendingCell {
    column: Option<usize>,
    kind: String,
    value: String,
}

fn parse_sheet_xml(xml: &str, shared: &[String]) -> Result<Vec<Vec<String>>, String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell: Option<PendingCell> = None;
    let mut in_value = false;
    let mut phonetic_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"row" => row.clear(),
                b"c" => cell = Some(start_cell(&e)?),
                b"v" | b"t" => in_value = cell.is_some(),
                name if is_phonetic(name) => phonetic_depth += 1,
                _ => {}
            },
            Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"row" => rows.push(Vec::new()),
                b"c" => place(&mut row, start_cell(&e)?, shared)?,
                _ => {}
            },
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"row" => rows.push(std::mem::take(&mut row)),
                b"c" => {
                    if let Some(c) = cell.take() {
                        place(&mut row, c, shared)?;
                    }
                }
                b"v" | b"t" => in_value = false,
                name if is_phonetic(name) => phonetic_depth = phonetic_depth.saturating_sub(1),
                _ => {}
            },
            Ok(Event::Text(t)) if in_value && phonetic_depth == 0 => {
                if let Some(c) = cell.as_mut() {
                    c.value.push_str(&t.unescape().map_err(|e| e.to_string())?);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("Parse worksheet XML failed: {e}")),
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}

/// Phonetic reading runs (`rPh`) and their settings (`phoneticPr`) are not
/// part of the cell text.
fn is_phonetic(name: &[u8]) -> bool {
    matches!(name, b"rPh" | b"phoneticPr")
}

fn start_cell(e: &BytesStart) -> Result<PendingCell, String> {
    let mut cell = PendingCell::default();
    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        match local_name(attr.key.as_ref()) {
            b"r" => cell.column = column_index(&value)?,
            b"t" => cell.kind = value.into_owned(),
            _ => {}
        }
    }
    Ok(cell)
}

fn place(row: &mut Vec<String>, cell: PendingCell, shared: &[String]) -> Result<(), String> {
    let text = match cell.kind.as_str() {
        "s" => cell
            .value
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| shared.get(i).cloned())
            .unwrap_or_default(),
        _ => cell.value,
    };
    let column = cell.column.unwrap_or(row.len());
    if column >= MAX_COLUMNS {
        return Err(OUT_OF_RANGE.to_string());
    }
    if row.len() <= column {
        row.resize(column + 1, String::new());
    }
    row[column] = text;
    Ok(())
}

/// Columns in a worksheet, `A` through `XFD`.
const MAX_COLUMNS: usize = 16_384;
const OUT_OF_RANGE: &str = "Cell reference out of range";

/// "C12" -> 2. `Ok(None)` when the reference has no column letters.
fn column_index(reference: &str) -> Result<Option<usize>, String> {
    let letters = reference
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .map(|b| b.to_ascii_uppercase());
    let mut n = 0usize;
    let mut seen = false;
    for b in letters {
        seen = true;
        n = n
            .checked_mul(26)
            .and_then(|n| n.checked_add(usize::from(b - b'A' + 1)))
            .filter(|&n| n <= MAX_COLUMNS)
            .ok_or_else(|| OUT_OF_RANGE.to_string())?;
    }
    Ok(seen.then(|| n - 1))
}

fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().rposition(|&b| b == b':') {
        Some(i) => &name[i + 1..],
        None => name,
    }
}
