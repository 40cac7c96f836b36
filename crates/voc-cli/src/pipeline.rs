//! Enrichment pipeline: raw CSV bytes → normalized table → enriched table.

use std::io::Read;
use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use arrow::record_batch::RecordBatch;
use tracing::info;
use voc_ai::{EnrichmentEngine, SentimentScorer};
use voc_core::Normalizer;

/// Path argument that means stdin (for input) or stdout (for output).
pub const STDIO: &str = "-";

#[derive(Debug)]
pub struct PipelineOutput {
    pub enriched: RecordBatch,
    /// Rows in the parsed input, before empty-text rows were dropped.
    pub input_rows: usize,
    pub dropped_rows: usize,
    pub elapsed_secs: f64,
}

/// Read the raw input, from stdin when `path` is `-`.
pub fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    if path == Path::new(STDIO) {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("reading reviews from stdin")?;
        return Ok(buf);
    }
    if !path.exists() {
        return Err(voc_store::StoreError::FileNotFound(path.to_path_buf()).into());
    }
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

/// Run parse → normalize → enrich over one CSV payload.
///
/// Fails with [`voc_store::StoreError::MalformedInput`] when the bytes are not
/// a rectangular table and with [`voc_core::NormalizeError::MissingRequiredColumn`]
/// when no column supplies review text. Both stay reachable via `downcast_ref`.
pub fn run_pipeline<S: SentimentScorer>(
    bytes: &[u8],
    normalizer: &Normalizer,
    engine: &EnrichmentEngine<S>,
) -> anyhow::Result<PipelineOutput> {
    let start = Instant::now();

    // 1. Parse.
    let raw = voc_store::parse_csv(bytes).context("parsing review table")?;
    let input_rows = raw.num_rows();

    // 2. Normalize columns and drop rows without text.
    let table = normalizer
        .normalize(&raw)
        .context("normalizing review columns")?;
    let dropped_rows = table.dropped_rows();

    // 3. Score, label, tag.
    let enriched = engine.enrich(&table).context("enriching reviews")?;

    let elapsed_secs = start.elapsed().as_secs_f64();
    info!(
        input_rows,
        dropped_rows,
        output_rows = enriched.num_rows(),
        elapsed_secs,
        "pipeline finished"
    );

    Ok(PipelineOutput {
        enriched,
        input_rows,
        dropped_rows,
        elapsed_secs,
    })
}
