#![forbid(unsafe_code)]
//! # Co-occurrence Network CLI
//!
//! Command-line interface for the `cooccurrence_network` crate. Scans a
//! directory for `.csv` and `.xlsx` files, builds one word co-occurrence
//! network per file from a text column, and saves it as an SVG image.
//!
//! ## Example
//! ```bash
//! cargo run --release -- path/to/data --column 0 --min-cooccurrence 3 --output-dir networks
//! ```
//!
//! Set `RUST_LOG=debug` to see every loader attempt. See `--help` for all options.

use clap::{Parser, ValueEnum};
use cooccurrence_network::{
    ExportFormat, HeuristicAnalyzer, LayoutParams, LinguisticAnalyzer, NetworkConfig, PosTag,
    StemLang, StemMode, TaggedAnalyzer, print_failed_files, run,
};
use env_logger::Env;
use log::error;
use std::path::PathBuf;
use std::process;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AnalyzerKind {
    /// Built-in rule-based tagging for space-delimited text only
    Heuristic,
    /// Text already tagged as `lemma/TAG` tokens
    Tagged,
}

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Directory containing the source files
    #[arg(default_value = ".")]
    source_dir: PathBuf,

    /// Zero-based index of the text column
    #[arg(long, default_value_t = 0)]
    column: usize,

    /// Directory for the network images (created if absent)
    #[arg(long, default_value = "output_networks")]
    output_dir: PathBuf,

    /// Part-of-speech tags to keep (UD names, repeatable)
    #[arg(long = "pos", value_delimiter = ',', default_values_t = PosTag::default_whitelist())]
    pos: Vec<PosTag>,

    /// Minimum number of sentences a word pair must share to be drawn
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    min_cooccurrence: u32,

    /// Seed for the spring layout
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Node size per unit of weighted degree
    #[arg(long, default_value_t = 100.0)]
    node_size_scale: f64,

    /// Edge width per unit of weight
    #[arg(long, default_value_t = 0.5)]
    edge_width_scale: f64,

    /// Optimal node distance for the spring layout
    #[arg(long, default_value_t = 0.8)]
    layout_k: f64,

    /// Spring layout iterations
    #[arg(long, default_value_t = 50)]
    layout_iterations: usize,

    /// Image width and height in pixels
    #[arg(long, default_value_t = 1200)]
    image_size: u32,

    /// CSV encodings tried in order
    #[arg(long, value_delimiter = ',', default_value = "utf-8,cp932,shift_jis")]
    encodings: Vec<String>,

    /// Also write the edge list in this format (txt, csv, tsv, json)
    #[arg(long)]
    export_format: Option<ExportFormat>,

    /// How text is split into tagged words. Text without spaces between words
    /// (Japanese, Chinese) needs `tagged` input from an external tagger
    #[arg(long, value_enum, default_value_t = AnalyzerKind::Heuristic)]
    analyzer: AnalyzerKind,

    /// Optional file with extra words to ignore (.txt, one word per line)
    #[arg(long)]
    stopwords: Option<PathBuf>,

    /// Force stemming in this language instead of detecting it
    #[arg(long, value_enum)]
    stem_lang: Option<StemLang>,

    /// Disable stemming (lowercase only)
    #[arg(long, default_value_t = false, conflicts_with = "stem_lang")]
    no_stem: bool,
}

impl Cli {
    fn config(&self) -> NetworkConfig {
        NetworkConfig {
            source_dir: self.source_dir.clone(),
            column_index: self.column,
            output_dir: self.output_dir.clone(),
            pos_whitelist: self.pos.clone(),
            min_cooccurrence: self.min_cooccurrence,
            layout: LayoutParams {
                k: self.layout_k,
                iterations: self.layout_iterations,
                seed: self.seed,
            },
            node_size_scale: self.node_size_scale,
            edge_width_scale: self.edge_width_scale,
            image_size: self.image_size,
            encodings: self.encodings.clone(),
            export_format: self.export_format,
        }
    }

    fn analyzer(&self) -> cooccurrence_network::Result<Box<dyn LinguisticAnalyzer>> {
        match self.analyzer {
            AnalyzerKind::Tagged => Ok(Box::new(TaggedAnalyzer)),
            AnalyzerKind::Heuristic => {
                let stem_mode = match (self.no_stem, self.stem_lang) {
                    (true, _) => StemMode::Off,
                    (false, Some(lang)) => StemMode::Force(lang),
                    (false, None) => StemMode::Auto,
                };
                let mut analyzer = HeuristicAnalyzer::new(stem_mode);
                if let Some(path) = &self.stopwords {
                    let words = HeuristicAnalyzer::load_function_words(path)?;
                    analyzer = analyzer.with_function_words(words);
                }
                Ok(Box::new(analyzer))
            }
        }
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let analyzer = match cli.analyzer() {
        Ok(a) => a,
        Err(e) => {
            error!("Error loading stopwords: {}", e);
            process::exit(1);
        }
    };

    match run(&cli.config(), analyzer.as_ref()) {
        Ok(report) => {
            println!("{}", report.summary());
            let failed = report.failed_files();
            if !failed.is_empty() {
                print_failed_files(&failed);
                process::exit(1);
            }
        }
        Err(e) => {
            error!("Error: {}", e);
            process::exit(1);
        }
    }
}
