//! Run parameters for the network pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::analyzer::PosTag;
use crate::error::{NetworkError, Result};
use crate::export::ExportFormat;
use crate::layout::LayoutParams;
use crate::loader::encoding_for_label;

/// Everything a run needs. `Default` reproduces the classic setup: first
/// column, nouns/proper nouns/verbs/adjectives, pairs seen in at least three
/// sentences, layout seed 42.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Directory scanned for `.csv` and `.xlsx` files
    pub source_dir: PathBuf,
    /// Zero-based position of the text column
    pub column_index: usize,
    /// Where images (and edge tables) are written; created if absent
    pub output_dir: PathBuf,
    pub pos_whitelist: Vec<PosTag>,
    /// Minimum number of sentences a pair must share to become an edge
    pub min_cooccurrence: u32,
    pub layout: LayoutParams,
    /// Node size per unit of weighted degree
    pub node_size_scale: f64,
    /// Edge width per unit of weight
    pub edge_width_scale: f64,
    /// Square canvas size in pixels
    pub image_size: u32,
    /// CSV decodings tried in order
    pub encodings: Vec<String>,
    pub export_format: Option<ExportFormat>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            column_index: 0,
            output_dir: PathBuf::from("output_networks"),
            pos_whitelist: PosTag::default_whitelist(),
            min_cooccurrence: 3,
            layout: LayoutParams::default(),
            node_size_scale: 100.0,
            edge_width_scale: 0.5,
            image_size: 1200,
            encodings: vec!["utf-8".into(), "cp932".into(), "shift_jis".into()],
            export_format: None,
        }
    }
}

impl NetworkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_cooccurrence == 0 {
            return Err(NetworkError::Config(
                "minimum co-occurrence must be at least 1".into(),
            ));
        }
        if self.pos_whitelist.is_empty() {
            return Err(NetworkError::Config(
                "part-of-speech whitelist is empty".into(),
            ));
        }
        if !(self.node_size_scale > 0.0 && self.edge_width_scale > 0.0) {
            return Err(NetworkError::Config("scale factors must be positive".into()));
        }
        if !(self.layout.k > 0.0) {
            return Err(NetworkError::Config("layout k must be positive".into()));
        }
        if self.image_size < 200 {
            return Err(NetworkError::Config(
                "image size must be at least 200 pixels".into(),
            ));
        }
        if self.encodings.is_empty() {
            return Err(NetworkError::Config("no encodings configured".into()));
        }
        if let Some(bad) = self
            .encodings
            .iter()
            .find(|e| encoding_for_label(e).is_none())
        {
            return Err(NetworkError::Config(format!("unknown encoding '{bad}'")));
        }
        Ok(())
    }
}
