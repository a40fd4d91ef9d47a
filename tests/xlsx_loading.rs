use std::fs::File;
use std::io::Write;
use std::path::Path;

use assert_cmd::prelude::*;
use tempfile::tempdir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use cooccurrence_network::{
    HeuristicAnalyzer, LoaderStrategy, NetworkConfig, StemMode, extract_rows_from_xlsx,
    load_table, run, strategies_for,
};

/// Minimal XLSX: shared strings plus one worksheet. Only the entries the
/// reader needs are written.
fn write_minimal_xlsx(target: &Path, shared: &[&str], sheet_rows: &str) {
    let file = File::create(target).expect("create xlsx file");
    let mut zip = ZipWriter::new(file);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let items: String = shared
        .iter()
        .map(|s| format!("<si><t>{s}</t></si>"))
        .collect();
    let shared_xml = format!(
        r##"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{n}" uniqueCount="{n}">{items}</sst>"##,
        n = shared.len()
    );
    zip.start_file("xl/sharedStrings.xml", deflated)
        .expect("start sharedStrings.xml");
    zip.write_all(shared_xml.as_bytes())
        .expect("write sharedStrings.xml");

    let sheet_xml = format!(
        r##"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>{sheet_rows}</sheetData>
</worksheet>"##
    );
    zip.start_file("xl/worksheets/sheet1.xml", deflated)
        .expect("start sheet1.xml");
    zip.write_all(sheet_xml.as_bytes()).expect("write sheet1.xml");
    zip.finish().expect("finish xlsx zip");
}

#[test]
fn xlsx_rows_keep_column_positions() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("survey.xlsx");
    write_minimal_xlsx(
        &path,
        &["comment", "tea &amp; cake"],
        r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1"><v>7</v></c></row>
           <row r="2"><c r="B2" t="s"><v>1</v></c></row>
           <row r="3"><c r="A3" t="inlineStr"><is><t>inline text</t></is></c></row>"#,
    );

    let rows = extract_rows_from_xlsx(&path).expect("xlsx rows");
    assert_eq!(
        rows,
        vec![
            vec!["comment".to_string(), "7".to_string()],
            vec![String::new(), "tea & cake".to_string()],
            vec!["inline text".to_string()],
        ]
    );
}

#[test]
fn xlsx_is_tried_before_csv() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("book.xlsx");
    write_minimal_xlsx(&path, &["rose tulip"], r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>"#);

    let strategies = strategies_for(&path, &["utf-8".to_string()]).unwrap();
    assert!(matches!(strategies[0], LoaderStrategy::Xlsx));

    let table = load_table(&path, &strategies).unwrap();
    assert_eq!(table.source_format, "xlsx");
    assert_eq!(table.texts(0).unwrap(), vec!["rose tulip"]);
}

#[test]
fn broken_xlsx_fails_to_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.xlsx");
    std::fs::write(&path, b"not a zip").unwrap();
    assert!(extract_rows_from_xlsx(&path).is_err());
}

#[test]
fn out_of_range_cell_reference_skips_only_that_workbook() {
    let dir = tempdir().unwrap();
    let broken = dir.path().join("a_wide.xlsx");
    write_minimal_xlsx(
        &broken,
        &["rose tulip"],
        r#"<row r="1"><c r="ZZZZZZ1" t="s"><v>0</v></c></row>"#,
    );
    let err = extract_rows_from_xlsx(&broken).unwrap_err();
    assert!(err.contains("out of range"));

    std::fs::write(dir.path().join("b_ok.csv"), "sun moon\nsun moon\nsun moon\n").unwrap();
    let config = NetworkConfig {
        source_dir: dir.path().to_path_buf(),
        output_dir: dir.path().join("out"),
        image_size: 400,
        ..NetworkConfig::default()
    };
    let report = run(&config, &HeuristicAnalyzer::new(StemMode::Off)).unwrap();
    assert_eq!(report.outcomes.len(), 2);
    assert!(report.outcomes[1].1.is_rendered());
    assert!(dir.path().join("out/network_b_ok.svg").exists());
}

#[test]
fn phonetic_readings_are_dropped_from_workbook_cells() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("yomi.xlsx");
    let file = File::create(&path).unwrap();
    let mut zip = ZipWriter::new(file);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file("xl/sharedStrings.xml", deflated).unwrap();
    zip.write_all(
        r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><si><t>猫/NOUN 犬/NOUN</t><rPh sb="0" eb="1"><t>ネコ</t></rPh><phoneticPr fontId="1"/></si></sst>"#
            .as_bytes(),
    )
    .unwrap();
    zip.start_file("xl/worksheets/sheet1.xml", deflated).unwrap();
    zip.write_all(
        r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c></row></sheetData></worksheet>"#
            .as_bytes(),
    )
    .unwrap();
    zip.finish().unwrap();

    let rows = extract_rows_from_xlsx(&path).unwrap();
    assert_eq!(rows, vec![vec!["猫/NOUN 犬/NOUN".to_string()]]);
}

#[test]
fn xlsx_workbook_renders_network() {
    let dir = tempdir().unwrap();
    write_minimal_xlsx(
        &dir.path().join("garden.xlsx"),
        &["rose tulip", "tulip rose daisy", "daisy rose tulip"],
        r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>
           <row r="2"><c r="A2" t="s"><v>1</v></c></row>
           <row r="3"><c r="A3" t="s"><v>2</v></c></row>"#,
    );

    let config = NetworkConfig {
        source_dir: dir.path().to_path_buf(),
        output_dir: dir.path().join("out"),
        image_size: 400,
        ..NetworkConfig::default()
    };
    let report = run(&config, &HeuristicAnalyzer::new(StemMode::Off)).unwrap();
    let (_, summary) = report.rendered().next().expect("rendered");
    assert_eq!((summary.nodes, summary.edges), (2, 1));
    assert!(dir.path().join("out/network_garden.svg").exists());
}

#[test]
fn cli_reads_xlsx() {
    let dir = tempdir().unwrap();
    write_minimal_xlsx(
        &dir.path().join("w.xlsx"),
        &["wind cloud"],
        r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>
           <row r="2"><c r="A2" t="s"><v>0</v></c></row>"#,
    );
    let out = dir.path().join("out");

    let mut cmd = assert_cmd::Command::cargo_bin("cooccurrence_network").unwrap();
    cmd.current_dir(dir.path())
        .args([
            dir.path().to_string_lossy().as_ref(),
            "--output-dir",
            out.to_string_lossy().as_ref(),
            "--min-cooccurrence",
            "2",
            "--no-stem",
        ])
        .assert()
        .success();
    assert!(out.join("network_w.svg").exists());
}
