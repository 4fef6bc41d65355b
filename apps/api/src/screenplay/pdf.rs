//! PDF serialization of laid-out screenplay pages.
//!
//! Fonts are the base-14 Courier faces in WinAnsiEncoding, so every text run must
//! be single-byte Latin-1. A character above U+00FF aborts the whole document;
//! nothing is transliterated. Output carries no timestamps or random IDs, so the
//! same pages always serialize to the same bytes.

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};
use tracing::trace;

use crate::screenplay::layout::{DrawOp, LaidOutPage};
use crate::screenplay::page_setup::{FontStyle, PageSetup, PT_PER_MM};
use crate::screenplay::staging::JpegData;
use crate::screenplay::FormatError;

const IMAGE_RESOURCE: &str = "Im1";
const FLATE_LEVEL: u8 = 6;

/// Encodes text as Latin-1 bytes, failing on the first character outside U+0000..=U+00FF.
pub fn encode_latin1(text: &str) -> Result<Vec<u8>, FormatError> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).map_err(|_| FormatError::Encoding { character: c }))
        .collect()
}

/// Serializes pages (and the optional embedded JPEG) into a complete PDF.
pub fn render(
    pages: &[LaidOutPage],
    image: Option<&JpegData>,
    setup: &PageSetup,
) -> Result<Vec<u8>, FormatError> {
    // Build every content stream first so an encoding failure leaves nothing behind.
    let contents = pages
        .iter()
        .map(|page| page_content(page, setup))
        .collect::<Result<Vec<_>, _>>()?;

    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let fonts: Vec<(FontStyle, Ref)> = [FontStyle::Regular, FontStyle::Bold]
        .into_iter()
        .map(|style| (style, alloc()))
        .collect();
    let image_id = image.map(|_| alloc());
    let page_ids: Vec<Ref> = pages.iter().map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = pages.iter().map(|_| alloc()).collect();

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);

    for (style, font_ref) in &fonts {
        pdf.type1_font(*font_ref)
            .base_font(Name(style.base_font().as_bytes()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    if let (Some(jpeg), Some(xobj_ref)) = (image, image_id) {
        let mut xobj = pdf.image_xobject(xobj_ref, &jpeg.bytes);
        xobj.filter(Filter::DctDecode);
        xobj.width(jpeg.width_px as i32);
        xobj.height(jpeg.height_px as i32);
        xobj.color_space().device_rgb();
        xobj.bits_per_component(8);
    }

    let media_box = Rect::new(
        0.0,
        0.0,
        setup.page_width_mm * PT_PER_MM,
        setup.page_height_mm * PT_PER_MM,
    );

    for (i, raw) in contents.into_iter().enumerate() {
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&raw, FLATE_LEVEL);
        pdf.stream(content_ids[i], &compressed)
            .filter(Filter::FlateDecode);

        let mut page = pdf.page(page_ids[i]);
        page.media_box(media_box)
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        {
            let mut font_dict = resources.fonts();
            for (style, font_ref) in &fonts {
                font_dict.pair(Name(style.resource_name().as_bytes()), *font_ref);
            }
        }
        if let Some(xobj_ref) = image_id {
            resources
                .x_objects()
                .pair(Name(IMAGE_RESOURCE.as_bytes()), xobj_ref);
        }
    }

    Ok(pdf.finish())
}

/// Builds the uncompressed content stream for one page.
fn page_content(page: &LaidOutPage, setup: &PageSetup) -> Result<Vec<u8>, FormatError> {
    let page_height_pt = setup.page_height_mm * PT_PER_MM;
    let mut content = Content::new();

    for op in &page.ops {
        match op {
            DrawOp::Text {
                x_mm,
                baseline_mm,
                font,
                text,
            } => {
                let bytes = encode_latin1(text)?;
                content
                    .begin_text()
                    .set_font(Name(font.style.resource_name().as_bytes()), font.size_pt)
                    .next_line(x_mm * PT_PER_MM, page_height_pt - baseline_mm * PT_PER_MM)
                    .show(Str(&bytes))
                    .end_text();
            }
            DrawOp::Image {
                x_mm,
                y_mm,
                width_mm,
                height_mm,
            } => {
                let width_pt = width_mm * PT_PER_MM;
                let height_pt = height_mm * PT_PER_MM;
                let bottom_pt = page_height_pt - (y_mm + height_mm) * PT_PER_MM;
                content.save_state();
                content.transform([width_pt, 0.0, 0.0, height_pt, x_mm * PT_PER_MM, bottom_pt]);
                content.x_object(Name(IMAGE_RESOURCE.as_bytes()));
                content.restore_state();
            }
        }
    }

    let raw = content.finish();
    trace!(page = page.number, ops = page.ops.len(), bytes = raw.len(), "Page content built");
    Ok(raw)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
