mod error;
mod fonts;
mod i18n;
mod model;

pub mod exchange;
pub mod matrix;
pub mod pdf;
pub mod store;

pub use error::Error;
pub use fonts::substitute_diacritics;
pub use i18n::{Language, t};
pub use matrix::MatrixDefinition;
pub use model::{
    Comment, CommentMap, ImageAttachment, MAX_RATING, ReportContext, SOURCE_PRIMARY_ID,
    SOURCE_SUB_CELLS, Source, cell_id, has_content, parse_source_cell, source_cell_id, source_id,
};
pub use pdf::{BlockKind, PlacedBlock, RenderedReport, render_report};

use std::path::{Path, PathBuf};
use std::time::Instant;

/// Render the report for `ctx` and save it into `out_dir`. Returns the written path.
pub fn generate_report(ctx: &ReportContext, matrix: &MatrixDefinition, out_dir: &Path) -> Result<PathBuf, Error> {
    let t0 = Instant::now();

    let report = pdf::render_report(ctx, matrix)?;
    let t_render = t0.elapsed();

    let path = report.save(out_dir)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: render={:.1}ms, write={:.1}ms, total={:.1}ms ({} pages, {} bytes)",
        t_render.as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        report.page_count,
        report.bytes.len(),
    );

    Ok(path)
}

/// PNG radar chart of one primary element. Fails unless every secondary element
/// of it is rated.
pub fn chart_png(matrix: &MatrixDefinition, comments: &CommentMap, primary_id: &str, size: u32) -> Result<Vec<u8>, Error> {
    let (layer, primary) = matrix
        .primary(primary_id)
        .ok_or_else(|| Error::UnknownCell(primary_id.to_string()))?;
    let values = matrix::complete_ratings(layer, primary, comments).ok_or_else(|| {
        Error::Pdf(format!(
            "primary element {primary_id} is not fully rated, no chart available"
        ))
    })?;
    pdf::rasterize_png(&values, size)
}
