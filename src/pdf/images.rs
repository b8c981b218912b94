use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use pdf_writer::{Filter, Pdf, Ref};

use crate::model::ImageAttachment;

/// Points per pixel at 96 dpi.
const PT_PER_PX: f32 = 0.75;

#[derive(Debug)]
pub(super) enum EmbedError {
    Base64(base64::DecodeError),
    Decode(image::ImageError),
    Empty,
}

impl fmt::Display for EmbedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbedError::Base64(e) => write!(f, "invalid base64 payload: {e}"),
            EmbedError::Decode(e) => write!(f, "cannot decode image: {e}"),
            EmbedError::Empty => write!(f, "image has no pixels"),
        }
    }
}

pub(super) enum PreparedImage {
    /// Baseline RGB JPEG, embedded as-is.
    Jpeg { data: Vec<u8>, width: u32, height: u32 },
    /// Zlib-compressed RGB samples plus an optional compressed alpha channel.
    Raw {
        rgb: Vec<u8>,
        alpha: Option<Vec<u8>>,
        width: u32,
        height: u32,
    },
}

impl PreparedImage {
    pub(super) fn dimensions(&self) -> (u32, u32) {
        match self {
            PreparedImage::Jpeg { width, height, .. } | PreparedImage::Raw { width, height, .. } => {
                (*width, *height)
            }
        }
    }

    pub(super) fn has_alpha(&self) -> bool {
        matches!(self, PreparedImage::Raw { alpha: Some(_), .. })
    }
}

/// Strip an optional `data:<mime>;base64,` header and decode the payload.
fn decode_base64(data: &str) -> Result<Vec<u8>, EmbedError> {
    let payload = match data.trim().split_once("base64,") {
        Some((header, rest)) if header.starts_with("data:") => rest,
        _ => data.trim(),
    };
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(EmbedError::Base64)
}

pub(super) fn prepare(attachment: &ImageAttachment) -> Result<PreparedImage, EmbedError> {
    let bytes = decode_base64(&attachment.data)?;
    let format = image::guess_format(&bytes).map_err(EmbedError::Decode)?;
    let decoded = image::load_from_memory_with_format(&bytes, format).map_err(EmbedError::Decode)?;
    let (w, h) = (decoded.width(), decoded.height());
    if w == 0 || h == 0 {
        return Err(EmbedError::Empty);
    }

    if format == image::ImageFormat::Jpeg && decoded.color() == image::ColorType::Rgb8 {
        return Ok(PreparedImage::Jpeg {
            data: bytes,
            width: w,
            height: h,
        });
    }

    let rgba: image::RgbaImage = decoded.to_rgba8();
    let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);
    let rgb_data: Vec<u8> = rgba
        .pixels()
        .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
        .collect();
    let alpha = has_alpha.then(|| {
        let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
        miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6)
    });
    Ok(PreparedImage::Raw {
        rgb: miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6),
        alpha,
        width: w,
        height: h,
    })
}

/// Write the image XObject (and its soft mask when `mask_ref` is given).
pub(super) fn write_xobject(pdf: &mut Pdf, xobj_ref: Ref, mask_ref: Option<Ref>, img: &PreparedImage) {
    match img {
        PreparedImage::Jpeg {
            data,
            width,
            height,
        } => {
            let mut xobj = pdf.image_xobject(xobj_ref, data);
            xobj.filter(Filter::DctDecode);
            xobj.width(*width as i32);
            xobj.height(*height as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
        }
        PreparedImage::Raw {
            rgb,
            alpha,
            width,
            height,
        } => {
            let smask_ref = match (alpha, mask_ref) {
                (Some(alpha), Some(mask_ref)) => {
                    let mut mask = pdf.image_xobject(mask_ref, alpha);
                    mask.filter(Filter::FlateDecode);
                    mask.width(*width as i32);
                    mask.height(*height as i32);
                    mask.color_space().device_gray();
                    mask.bits_per_component(8);
                    Some(mask_ref)
                }
                _ => None,
            };

            let mut xobj = pdf.image_xobject(xobj_ref, rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(*width as i32);
            xobj.height(*height as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
    }
}

/// Display size in points: fits `max_width` × `max_height`, keeps the aspect
/// ratio, never enlarges past the natural 96 dpi size.
pub(super) fn fit(pixel_width: u32, pixel_height: u32, max_width: f32, max_height: f32) -> (f32, f32) {
    let natural_w = pixel_width as f32 * PT_PER_PX;
    let natural_h = pixel_height as f32 * PT_PER_PX;
    let scale = (max_width / natural_w).min(max_height / natural_h).min(1.0);
    (natural_w * scale, natural_h * scale)
}
