//! # cooccurrence_network
//!
//! Builds word co-occurrence networks from tabular text and draws them.
//!
//! For every `.csv` / `.xlsx` file in a directory, one text column is read,
//! split into sentences and tagged by a [`LinguisticAnalyzer`]. Each sentence
//! contributes its distinct whitelisted lemmas as a token set; every unordered
//! pair in a set is counted once per sentence. Pairs seen in at least
//! `min_cooccurrence` sentences become weighted edges, and the resulting
//! graph is laid out with a seeded spring layout and saved as
//! `network_<file stem>.svg`.
//!
//! ## Example
//! ```
//! use cooccurrence_network::{
//!     HeuristicAnalyzer, LinguisticAnalyzer, PosTag, StemMode, build_graph, count_pairs,
//!     token_sets,
//! };
//!
//! let analyzer = HeuristicAnalyzer::new(StemMode::Off);
//! let sentences = analyzer.analyze("Cats chase mice. Mice fear cats. Cats and mice!");
//! let sets = token_sets(&sentences, &PosTag::default_whitelist());
//! let counts = count_pairs(&sets);
//! assert_eq!(counts.get("cats", "mice"), 3);
//!
//! let graph = build_graph(&counts, 3).unwrap();
//! assert_eq!(graph.node_count(), 2);
//! ```

#![forbid(unsafe_code)]

pub mod analyzer;
pub mod config;
pub mod cooccurrence;
pub mod error;
pub mod export;
pub mod graph;
pub mod layout;
pub mod loader;
mod office;
pub mod pipeline;
pub mod render;

pub use analyzer::{
    HeuristicAnalyzer, LinguisticAnalyzer, PosTag, Sentence, StemLang, StemMode, TaggedAnalyzer,
    Token,
};
pub use config::NetworkConfig;
pub use cooccurrence::{PairCounts, TokenSet, WordPair, count_pairs, token_sets};
pub use error::{NetworkError, Result};
pub use export::{ExportFormat, csv_safe_cell, export_edges};
pub use graph::{CooccurrenceGraph, EdgeRecord, VisualAttributes, build_graph};
pub use layout::{LayoutParams, spring_layout};
pub use loader::{LoaderStrategy, RawTable, load_table, strategies_for};
pub use office::extract_rows_from_xlsx;
pub use pipeline::{
    DocumentOutcome, NetworkSummary, RunReport, SkipReason, Stage, collect_files,
    output_image_path, print_failed_files, process_document, run,
};
pub use render::{RenderOptions, render_network};
