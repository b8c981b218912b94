#![allow(dead_code)]

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Local, TimeZone, Utc};
use credibility_report::pdf::{PRINTABLE_BOTTOM, RenderedReport};
use credibility_report::{
    Comment, CommentMap, ImageAttachment, ReportContext, Source, source_id,
};

pub fn generated_at() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 5, 17, 14, 30, 0).unwrap()
}

pub fn created_at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap()
}

/// English report context with a fixed generation time.
pub fn context(comments: CommentMap, sources: Vec<Source>) -> ReportContext {
    let mut ctx = ReportContext::new(comments, sources);
    ctx.language = "en".to_string();
    ctx.generated_at = generated_at();
    ctx
}

pub fn titled(title: &str) -> Comment {
    Comment {
        title: title.to_string(),
        ..Default::default()
    }
}

pub fn rated(rating: u8) -> Comment {
    Comment {
        rating: Some(rating),
        ..Default::default()
    }
}

pub fn source(ordinal: usize, title: &str) -> Source {
    Source {
        id: source_id(ordinal),
        title: title.to_string(),
        created_at: created_at(ordinal as u32),
    }
}

/// Rate every `L1-{primary}.1..=count` cell.
pub fn rate_all(comments: &mut CommentMap, primary: &str, count: usize, rating: u8) {
    for i in 1..=count {
        comments.insert(format!("L1-{primary}.{i}"), rated(rating));
    }
}

pub fn png_base64(width: u32, height: u32) -> String {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    STANDARD.encode(out.into_inner())
}

pub fn png_attachment(name: &str, width: u32, height: u32) -> ImageAttachment {
    ImageAttachment {
        data: format!("data:image/png;base64,{}", png_base64(width, height)),
        name: name.to_string(),
    }
}

pub fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

/// Every body block must end above the printable bottom of its page.
pub fn assert_within_printable_area(report: &RenderedReport) {
    for block in report.blocks.iter().filter(|b| b.kind.is_body()) {
        assert!(
            block.top + block.height <= PRINTABLE_BOTTOM + 1e-3,
            "{:?} {:?} on page {} ends at {:.2}, past {:.2}",
            block.kind,
            block.text,
            block.page,
            block.top + block.height,
            PRINTABLE_BOTTOM
        );
        assert!(block.page < report.page_count);
    }
}

pub fn texts(report: &RenderedReport, kind: credibility_report::BlockKind) -> Vec<String> {
    report.blocks_of(kind).map(|b| b.text.clone()).collect()
}
