//! Per-document state machine and the batch runner.
//!
//! A document moves through `Loaded -> Tokenized -> Counted -> Graphed ->
//! Rendered`. Any stage may end it early with a [`SkipReason`]; the run then
//! continues with the next document.

use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::analyzer::LinguisticAnalyzer;
use crate::config::NetworkConfig;
use crate::cooccurrence::{count_pairs, token_sets};
use crate::error::{NetworkError, Result};
use crate::export::export_edges;
use crate::graph::build_graph;
use crate::layout::spring_layout;
use crate::loader::{load_table, strategies_for};
use crate::render::{RenderOptions, render_network};

/// File extensions picked up from the source directory.
pub const SOURCE_EXTENSIONS: &[&str] = &["csv", "xlsx"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Loaded,
    Tokenized,
    Counted,
    Graphed,
    Rendered,
}

/// Why a document produced no image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// No loader strategy could read the file
    LoadFailed(String),
    /// The text column does not exist
    ColumnMissing(String),
    /// The text column has no non-blank cells
    NoText,
    /// No sentence kept two or more whitelisted words
    NoSentences,
    NoPairs,
    /// No pair reached the minimum co-occurrence
    EmptyGraph { min_cooccurrence: u32 },
    /// Rendering, export or an unexpected panic
    Failed(String),
}

impl SkipReason {
    /// Expected outcomes of ordinary data, as opposed to failures.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            SkipReason::NoText
                | SkipReason::NoSentences
                | SkipReason::NoPairs
                | SkipReason::EmptyGraph { .. }
        )
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::LoadFailed(e) => write!(f, "could not be loaded: {e}"),
            SkipReason::ColumnMissing(e) => write!(f, "{e}"),
            SkipReason::NoText => f.write_str("no eligible text found"),
            SkipReason::NoSentences => {
                f.write_str("no sentence contains two or more target words")
            }
            SkipReason::NoPairs => f.write_str("no co-occurring word pairs found"),
            SkipReason::EmptyGraph { min_cooccurrence } => write!(
                f,
                "no pair co-occurs at least {min_cooccurrence} times, no network drawn"
            ),
            SkipReason::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

/// What a rendered document produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkSummary {
    pub image: PathBuf,
    pub edge_table: Option<PathBuf>,
    pub sentences: usize,
    pub pairs: usize,
    pub nodes: usize,
    pub edges: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DocumentOutcome {
    Rendered(NetworkSummary),
    Skipped {
        /// Last stage the document completed, `None` if loading failed
        stage: Option<Stage>,
        reason: SkipReason,
    },
}

impl DocumentOutcome {
    fn skipped(stage: Option<Stage>, reason: SkipReason) -> Self {
        DocumentOutcome::Skipped { stage, reason }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, DocumentOutcome::Rendered(_))
    }

    /// Last stage reached.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            DocumentOutcome::Rendered(_) => Some(Stage::Rendered),
            DocumentOutcome::Skipped { stage, .. } => *stage,
        }
    }
}

/// Outcome of every document, in processing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<(PathBuf, DocumentOutcome)>,
}

impl RunReport {
    pub fn rendered(&self) -> impl Iterator<Item = (&Path, &NetworkSummary)> + '_ {
        self.outcomes.iter().filter_map(|(p, o)| match o {
            DocumentOutcome::Rendered(summary) => Some((p.as_path(), summary)),
            DocumentOutcome::Skipped { .. } => None,
        })
    }

    /// Documents that were skipped because something went wrong, with the message.
    pub fn failed_files(&self) -> Vec<(String, String)> {
        self.outcomes
            .iter()
            .filter_map(|(p, o)| match o {
                DocumentOutcome::Skipped { reason, .. } if !reason.is_informational() => {
                    Some((p.display().to_string(), reason.to_string()))
                }
                _ => None,
            })
            .collect()
    }

    /// Human-readable run summary.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for (path, outcome) in &self.outcomes {
            let line = match outcome {
                DocumentOutcome::Rendered(s) => format!(
                    "{}: {} nodes, {} edges -> {}",
                    path.display(),
                    s.nodes,
                    s.edges,
                    s.image.display()
                ),
                DocumentOutcome::Skipped { reason, .. } => {
                    format!("{}: skipped ({reason})", path.display())
                }
            };
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&format!(
            "Finished: {} of {} files rendered",
            self.rendered().count(),
            self.outcomes.len()
        ));
        out
    }
}

/// Print failed files to stderr.
pub fn print_failed_files(failed: &[(String, String)]) {
    eprintln!("\nFailed files:");
    for (file, reason) in failed {
        eprintln!("  {file}: {reason}");
    }
}

/// Source files directly inside `dir`, sorted by file name.
pub fn collect_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| SOURCE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        })
        .collect()
}

/// Image path for a source file: `<output_dir>/network_<stem>.svg`.
pub fn output_image_path(config: &NetworkConfig, source: &Path) -> PathBuf {
    config
        .output_dir
        .join(format!("network_{}.svg", file_stem(source)))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// Run one document through every stage. Never panics and never returns an
/// error: problems become [`DocumentOutcome::Skipped`].
pub fn process_document(
    path: &Path,
    config: &NetworkConfig,
    analyzer: &dyn LinguisticAnalyzer,
) -> DocumentOutcome {
    info!("--- Analyzing {} ---", path.display());
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| run_stages(path, config, analyzer)))
        .unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            DocumentOutcome::skipped(None, SkipReason::Failed(message))
        });

    match &outcome {
        DocumentOutcome::Rendered(summary) => {
            info!("Saved network: {}", summary.image.display())
        }
        DocumentOutcome::Skipped { reason, .. } if reason.is_informational() => {
            info!("{}: {reason}, skipping", path.display())
        }
        DocumentOutcome::Skipped {
            reason: reason @ SkipReason::Failed(_),
            ..
        } => error!("{}: {reason}, skipping", path.display()),
        DocumentOutcome::Skipped { reason, .. } => {
            warn!("{}: {reason}, skipping", path.display())
        }
    }
    outcome
}

fn run_stages(
    path: &Path,
    config: &NetworkConfig,
    analyzer: &dyn LinguisticAnalyzer,
) -> DocumentOutcome {
    let strategies = match strategies_for(path, &config.encodings) {
        Ok(s) => s,
        Err(e) => return DocumentOutcome::skipped(None, SkipReason::LoadFailed(e.to_string())),
    };
    let table = match load_table(path, &strategies) {
        Ok(t) => t,
        Err(e) => return DocumentOutcome::skipped(None, SkipReason::LoadFailed(e.to_string())),
    };
    info!("Loaded {} as {}", path.display(), table.source_format);
    let stage = Some(Stage::Loaded);

    if table.rows.is_empty() {
        return DocumentOutcome::skipped(stage, SkipReason::NoText);
    }
    let texts = match table.texts(config.column_index) {
        Ok(t) => t,
        Err(e) => return DocumentOutcome::skipped(stage, SkipReason::ColumnMissing(e.to_string())),
    };
    if texts.is_empty() {
        return DocumentOutcome::skipped(stage, SkipReason::NoText);
    }

    let sentences: Vec<_> = texts.iter().flat_map(|t| analyzer.analyze(t)).collect();
    let sets = token_sets(&sentences, &config.pos_whitelist);
    let stage = Some(Stage::Tokenized);
    if sets.is_empty() {
        return DocumentOutcome::skipped(stage, SkipReason::NoSentences);
    }

    let counts = count_pairs(&sets);
    let stage = Some(Stage::Counted);
    if counts.is_empty() {
        return DocumentOutcome::skipped(stage, SkipReason::NoPairs);
    }

    let Some(graph) = build_graph(&counts, config.min_cooccurrence) else {
        return DocumentOutcome::skipped(
            stage,
            SkipReason::EmptyGraph {
                min_cooccurrence: config.min_cooccurrence,
            },
        );
    };
    let stage = Some(Stage::Graphed);

    let positions = spring_layout(&graph, &config.layout);
    let attrs = graph.visual_attributes(config.node_size_scale, config.edge_width_scale);
    let image = output_image_path(config, path);
    let title = format!(
        "Co-occurrence network: {}",
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    );
    let options = RenderOptions::new(title, config.image_size);
    if let Err(e) = fs::create_dir_all(&config.output_dir) {
        return DocumentOutcome::skipped(stage, SkipReason::Failed(e.to_string()));
    }
    if let Err(e) = render_network(&graph, &positions, &attrs, &options, &image) {
        return DocumentOutcome::skipped(stage, SkipReason::Failed(e.to_string()));
    }

    let edge_table = match config.export_format {
        Some(format) => {
            let stem = format!("network_{}", file_stem(path));
            match export_edges(&graph.edge_records(), &config.output_dir, &stem, format) {
                Ok(p) => Some(p),
                Err(e) => return DocumentOutcome::skipped(stage, SkipReason::Failed(e.to_string())),
            }
        }
        None => None,
    };

    DocumentOutcome::Rendered(NetworkSummary {
        image,
        edge_table,
        sentences: sets.len(),
        pairs: counts.len(),
        nodes: graph.node_count(),
        edges: graph.edge_count(),
    })
}

/// Process every source file in `config.source_dir`, one at a time.
///
/// Fails only when the configuration is invalid or no source file exists.
/// Per-document problems end up in the report.
pub fn run(config: &NetworkConfig, analyzer: &dyn LinguisticAnalyzer) -> Result<RunReport> {
    config.validate()?;
    let files = collect_files(&config.source_dir);
    if files.is_empty() {
        return Err(NetworkError::NoSourceFiles(config.source_dir.clone()));
    }

    let mut report = RunReport::default();
    for file in files {
        let outcome = process_document(&file, config, analyzer);
        report.outcomes.push((file, outcome));
    }
    info!("--- All files processed ---");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{PosTag, Sentence, TaggedAnalyzer, Token};

    struct PanickingAnalyzer;

    impl LinguisticAnalyzer for PanickingAnalyzer {
        fn analyze(&self, _text: &str) -> Vec<Sentence> {
            panic!("analyzer exploded")
        }
    }

    /// Every word is a noun, one sentence per text.
    struct WordsAnalyzer;

    impl LinguisticAnalyzer for WordsAnalyzer {
        fn analyze(&self, text: &str) -> Vec<Sentence> {
            vec![Sentence {
                tokens: text
                    .split_whitespace()
                    .map(|w| Token::new(w, w, PosTag::Noun))
                    .collect(),
            }]
        }
    }

    fn config_in(dir: &Path, min: u32) -> NetworkConfig {
        NetworkConfig {
            source_dir: dir.to_path_buf(),
            output_dir: dir.join("out"),
            min_cooccurrence: min,
            image_size: 400,
            ..NetworkConfig::default()
        }
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let p = dir.join(name);
        fs::write(&p, content).unwrap();
        p
    }

    #[test]
    fn test_three_identical_sentences_render_at_threshold_three() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "ab.csv", "a b\na b\na b\n");
        let config = config_in(dir.path(), 3);

        match process_document(&file, &config, &WordsAnalyzer) {
            DocumentOutcome::Rendered(s) => {
                assert_eq!((s.nodes, s.edges, s.pairs, s.sentences), (2, 1, 1, 3));
                assert!(s.image.ends_with("network_ab.svg"));
                assert!(s.image.exists());
                assert!(s.edge_table.is_none());
            }
            other => panic!("expected render, got {other:?}"),
        }

        let config = config_in(dir.path(), 4);
        assert_eq!(
            process_document(&file, &config, &WordsAnalyzer),
            DocumentOutcome::Skipped {
                stage: Some(Stage::Counted),
                reason: SkipReason::EmptyGraph {
                    min_cooccurrence: 4
                },
            }
        );
    }

    #[test]
    fn test_empty_text_column_is_informational_skip() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "blank.csv", ",x\n\"\",y\n  ,z\n");
        let outcome = process_document(&file, &config_in(dir.path(), 1), &WordsAnalyzer);
        assert_eq!(
            outcome,
            DocumentOutcome::Skipped {
                stage: Some(Stage::Loaded),
                reason: SkipReason::NoText
            }
        );
    }

    #[test]
    fn test_missing_column_and_no_sentences() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "one.csv", "cat dog\n");
        let config = NetworkConfig {
            column_index: 5,
            ..config_in(dir.path(), 1)
        };
        match process_document(&file, &config, &WordsAnalyzer) {
            DocumentOutcome::Skipped {
                reason: SkipReason::ColumnMissing(msg),
                ..
            } => assert!(msg.contains("column 5")),
            other => panic!("expected missing column, got {other:?}"),
        }

        let file = write(dir.path(), "single.csv", "cat\ndog\n");
        match process_document(&file, &config_in(dir.path(), 1), &WordsAnalyzer) {
            DocumentOutcome::Skipped { stage, reason } => {
                assert_eq!(stage, Some(Stage::Tokenized));
                assert_eq!(reason, SkipReason::NoSentences);
            }
            other => panic!("expected skip, got {other:?}"),
        }
    }

    #[test]
    fn test_panic_is_contained_at_document_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "p.csv", "a b\n");
        match process_document(&file, &config_in(dir.path(), 1), &PanickingAnalyzer) {
            DocumentOutcome::Skipped {
                reason: SkipReason::Failed(msg),
                ..
            } => assert!(msg.contains("analyzer exploded")),
            other => panic!("expected failure skip, got {other:?}"),
        }
    }

    #[test]
    fn test_run_collects_outcomes_in_name_order_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b_empty.csv", "\n\n");
        write(
            dir.path(),
            "a_tagged.csv",
            "猫/NOUN 犬/NOUN 。/PUNCT 猫/NOUN 犬/NOUN\n猫/NOUN 犬/NOUN 走る/VERB\n",
        );
        write(dir.path(), "notes.txt", "ignored");
        fs::write(dir.path().join("c_binary.csv"), [0xFFu8, 0xFE, 0x00, 0x81]).unwrap();

        let config = NetworkConfig {
            export_format: Some(crate::export::ExportFormat::Json),
            ..config_in(dir.path(), 3)
        };
        let report = run(&config, &TaggedAnalyzer).unwrap();
        let names: Vec<String> = report
            .outcomes
            .iter()
            .map(|(p, _)| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a_tagged.csv", "b_empty.csv", "c_binary.csv"]);

        assert!(report.outcomes[0].1.is_rendered());
        assert_eq!(report.outcomes[0].1.stage(), Some(Stage::Rendered));
        let (_, summary) = report.rendered().next().unwrap();
        assert_eq!(summary.nodes, 2);
        assert!(summary.edge_table.as_ref().unwrap().exists());

        assert!(matches!(
            report.outcomes[1].1,
            DocumentOutcome::Skipped {
                reason: SkipReason::NoText,
                ..
            }
        ));
        assert!(matches!(
            report.outcomes[2].1,
            DocumentOutcome::Skipped {
                reason: SkipReason::LoadFailed(_),
                stage: None
            }
        ));
        assert_eq!(report.failed_files().len(), 1);
        assert!(report.summary().ends_with("Finished: 1 of 3 files rendered"));
    }

    #[test]
    fn test_run_without_sources_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), 3);
        assert!(matches!(
            run(&config, &TaggedAnalyzer),
            Err(NetworkError::NoSourceFiles(_))
        ));
        assert!(!config.output_dir.exists());
    }
}
