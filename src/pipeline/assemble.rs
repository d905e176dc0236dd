//! Image → PDF: one page per image, each page exactly the size of its image.
//!
//! Page size comes from [`PageGeometry::from_dimensions`], so a 1000 × 500 px
//! image becomes a 264.58 × 132.29 mm landscape page. The image is drawn at
//! the origin at 96 DPI, which makes it span the page edge to edge. No margins
//! and no scaling.
//!
//! Pixels are embedded as raw RGB with printpdf's image optimisation turned
//! off, so nothing is re-compressed lossily.

use crate::error::{ConvertError, ImagePageError};
use crate::input::{file_stem, SourceFile};
use crate::output::OutputDocument;
use crate::pipeline::decode::{self, DecodedImage};
use crate::pipeline::guard;
use crate::pipeline::units::{PageGeometry, REFERENCE_DPI};
use chrono::{NaiveDate, Utc};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info};

/// Name of an assembled multi-image PDF created on `date`.
pub fn assembled_filename_on(date: NaiveDate) -> String {
    format!("converted_images_{}.pdf", date.format("%Y-%m-%d"))
}

/// Name of an assembled multi-image PDF created today (UTC date).
pub fn assembled_filename() -> String {
    assembled_filename_on(Utc::now().date_naive())
}

/// Convert a single image into a one-page PDF named `{stem}.pdf`.
pub fn image_to_pdf(
    name: &str,
    bytes: &[u8],
    canvas_limit: u32,
) -> Result<OutputDocument, ConvertError> {
    let decoded = decode_within(bytes, 1, canvas_limit).map_err(|e| match e {
        ImagePageError::Decode(source) => ConvertError::Decode {
            name: name.to_string(),
            source,
        },
        ImagePageError::TooLarge(source) => ConvertError::Render {
            name: name.to_string(),
            source,
        },
    })?;

    let stem = file_stem(name);
    let mut doc = PdfDocument::new(stem);
    let (page, geometry) = place(&mut doc, decoded);

    debug!(
        "'{}' → {:.2}x{:.2} mm {:?}",
        name, geometry.width_mm, geometry.height_mm, geometry.orientation
    );

    Ok(OutputDocument {
        filename: format!("{}.pdf", stem),
        pages: vec![geometry],
        bytes: save(doc, vec![page]),
    })
}

/// Combine `images` into one PDF, one page per image, in input order.
///
/// `on_progress(placed, total)` runs after each page is placed. The first
/// image that fails aborts the whole assembly with its index and name.
pub fn assemble(
    images: &[SourceFile],
    canvas_limit: u32,
    filename: String,
    on_progress: &mut dyn FnMut(usize, usize),
) -> Result<OutputDocument, ConvertError> {
    if images.is_empty() {
        return Err(ConvertError::NoInput);
    }

    let total = images.len();
    info!("Assembling {} images into {}", total, filename);

    let mut doc = PdfDocument::new(file_stem(&filename));
    let mut pages = Vec::with_capacity(total);
    let mut geometries = Vec::with_capacity(total);

    for (index, image) in images.iter().enumerate() {
        let decoded = decode_within(&image.bytes, index + 1, canvas_limit).map_err(|source| {
            ConvertError::Assembly {
                index,
                name: image.name.clone(),
                source,
            }
        })?;
        let (page, geometry) = place(&mut doc, decoded);
        pages.push(page);
        geometries.push(geometry);
        on_progress(index + 1, total);
    }

    Ok(OutputDocument {
        filename,
        pages: geometries,
        bytes: save(doc, pages),
    })
}

/// Check the header size against the canvas limit, then decode the pixels.
fn decode_within(
    bytes: &[u8],
    number: usize,
    canvas_limit: u32,
) -> Result<DecodedImage, ImagePageError> {
    let dims = decode::dimensions(bytes)?;
    guard::check(
        number,
        u64::from(dims.width_px),
        u64::from(dims.height_px),
        canvas_limit,
    )?;
    Ok(decode::decode(bytes)?)
}

/// Register the image with `doc` and build a page that it fills exactly.
fn place(doc: &mut PdfDocument, decoded: DecodedImage) -> (PdfPage, PageGeometry) {
    let dims = decoded.dimensions;
    let geometry = PageGeometry::from_dimensions(dims);

    let raw = RawImage {
        pixels: RawImageData::U8(decoded.pixels.into_raw()),
        width: dims.width_px as usize,
        height: dims.height_px as usize,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    };
    let id = doc.add_image(&raw);

    let ops = vec![Op::UseXobject {
        id,
        transform: XObjectTransform {
            translate_x: Some(Pt(0.0)),
            translate_y: Some(Pt(0.0)),
            scale_x: Some(1.0),
            scale_y: Some(1.0),
            dpi: Some(REFERENCE_DPI as f32),
            rotate: None,
        },
    }];

    let page = PdfPage::new(
        Mm(geometry.width_mm as f32),
        Mm(geometry.height_mm as f32),
        ops,
    );
    (page, geometry)
}

fn save(mut doc: PdfDocument, pages: Vec<PdfPage>) -> Vec<u8> {
    doc.with_pages(pages);
    let options = PdfSaveOptions {
        image_optimization: None,
        ..Default::default()
    };
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let bytes = doc.save(&options, &mut warnings);
    if !warnings.is_empty() {
        debug!("printpdf reported {} warnings", warnings.len());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PageError;
    use crate::pipeline::decode::DecodeError;
    use crate::pipeline::units::Orientation;
    use image::{DynamicImage, RgbImage};
    use lopdf::Object;
    use std::io::Cursor;

    fn png(w: u32, h: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(w, h))
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    /// MediaBox width/height in points for every page, in page order.
    fn media_boxes(bytes: &[u8]) -> Vec<(f32, f32)> {
        let doc = lopdf::Document::load_mem(bytes).expect("output must parse");
        doc.get_pages()
            .values()
            .map(|id| {
                let page = doc.get_object(*id).unwrap().as_dict().unwrap();
                let mb = page.get(b"MediaBox").unwrap().as_array().unwrap();
                let n: Vec<f32> = mb.iter().map(|o| o.as_float().unwrap()).collect();
                (n[2] - n[0], n[3] - n[1])
            })
            .collect()
    }

    /// The `cm` matrix in effect for each page's drawing, and whether the page
    /// paints an XObject.
    fn placements(bytes: &[u8]) -> Vec<(Vec<f32>, bool)> {
        let doc = lopdf::Document::load_mem(bytes).expect("output must parse");
        doc.get_pages()
            .values()
            .map(|id| {
                let content = doc.get_and_decode_page_content(*id).unwrap();
                let matrix: Vec<f32> = content
                    .operations
                    .iter()
                    .find(|op| op.operator == "cm")
                    .map(|op| op.operands.iter().map(|o| o.as_float().unwrap()).collect())
                    .unwrap_or_default();
                let draws = content.operations.iter().any(|op| op.operator == "Do");
                (matrix, draws)
            })
            .collect()
    }

    /// `(width, height, filters)` of every embedded image, sorted.
    fn embedded_images(bytes: &[u8]) -> Vec<(i64, i64, Vec<Vec<u8>>)> {
        let doc = lopdf::Document::load_mem(bytes).expect("output must parse");
        let mut images: Vec<_> = doc
            .objects
            .values()
            .filter_map(|obj| obj.as_stream().ok())
            .filter(|s| matches!(s.dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Image"))
            .map(|s| {
                let w = s.dict.get(b"Width").unwrap().as_i64().unwrap();
                let h = s.dict.get(b"Height").unwrap().as_i64().unwrap();
                let filters = match s.dict.get(b"Filter") {
                    Ok(Object::Name(n)) => vec![n.clone()],
                    Ok(Object::Array(a)) => a
                        .iter()
                        .filter_map(|o| match o {
                            Object::Name(n) => Some(n.clone()),
                            _ => None,
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                (w, h, filters)
            })
            .collect();
        images.sort();
        images
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.05
    }

    /// Image drawn at the origin, scaled to exactly `w × h` points.
    fn assert_fills_page(matrix: &[f32], w: f32, h: f32) {
        assert_eq!(matrix.len(), 6, "no cm operator: {:?}", matrix);
        let expected = [w, 0.0, 0.0, h, 0.0, 0.0];
        for (got, want) in matrix.iter().zip(expected) {
            assert!(close(*got, want), "cm {:?}, expected {:?}", matrix, expected);
        }
    }

    fn assert_lossless(images: &[(i64, i64, Vec<Vec<u8>>)]) {
        for (_, _, filters) in images {
            for f in filters {
                assert!(
                    f.as_slice() != b"DCTDecode" && f.as_slice() != b"JPXDecode",
                    "lossy filter {:?}",
                    String::from_utf8_lossy(f)
                );
            }
        }
    }

    #[test]
    fn single_image_page_matches_pixels() {
        // 96 px = 1 inch = 72 pt.
        let doc = image_to_pdf("photo.png", &png(96, 192), 32767).unwrap();
        assert_eq!(doc.filename, "photo.pdf");
        assert_eq!(doc.page_count(), 1);
        let boxes = media_boxes(&doc.bytes);
        assert_eq!(boxes.len(), 1);
        assert!(close(boxes[0].0, 72.0) && close(boxes[0].1, 144.0), "{:?}", boxes);

        let placed = placements(&doc.bytes);
        assert!(placed[0].1, "page does not draw the image");
        assert_fills_page(&placed[0].0, 72.0, 144.0);

        let images = embedded_images(&doc.bytes);
        assert_eq!(images.len(), 1);
        assert_eq!((images[0].0, images[0].1), (96, 192));
        assert_lossless(&images);
    }

    #[test]
    fn wide_image_is_landscape() {
        let doc = image_to_pdf("wide.jpg", &png(1000, 500), 32767).unwrap();
        let g = doc.pages[0];
        assert_eq!(g.orientation, Orientation::Landscape);
        assert!((g.width_mm - 264.583).abs() < 1e-3);
        assert!((g.height_mm - 132.292).abs() < 1e-3);
    }

    #[test]
    fn undecodable_image_is_decode_error() {
        let err = image_to_pdf("broken.png", b"nope", 32767).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Decode { ref name, source: DecodeError::Image(_) } if name == "broken.png"
        ));
    }

    #[test]
    fn oversized_image_is_rejected_as_dimension_exceeded() {
        let err = image_to_pdf("tall.png", &png(4, 40), 32).unwrap_err();
        match err {
            ConvertError::Render { name, source } => {
                assert_eq!(name, "tall.png");
                assert_eq!(
                    source,
                    PageError::DimensionExceeded {
                        page: 1,
                        requested_px: 40,
                        limit: 32
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn oversized_header_is_rejected_without_decoding_pixels() {
        // Header intact, pixel data cut off: the size check must fire first.
        let mut bytes = png(4, 40);
        let idat = bytes.windows(4).position(|w| w == b"IDAT").unwrap();
        bytes.truncate(idat + 6);
        let err = image_to_pdf("cut.png", &bytes, 32).unwrap_err();
        assert!(
            matches!(err, ConvertError::Render { source: PageError::DimensionExceeded { .. }, .. }),
            "got: {err}"
        );

        let err = image_to_pdf("cut.png", &bytes, 32767).unwrap_err();
        assert!(matches!(err, ConvertError::Decode { .. }), "got: {err}");
    }

    #[test]
    fn assembly_sizes_each_page_independently() {
        let images = vec![
            SourceFile::new("a.png", "image/png", png(100, 200)),
            SourceFile::new("b.png", "image/png", png(300, 100)),
        ];
        let mut calls = Vec::new();
        let doc = assemble(&images, 32767, "out.pdf".into(), &mut |p, t| calls.push((p, t))).unwrap();

        assert_eq!(calls, vec![(1, 2), (2, 2)]);
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages[0].orientation, Orientation::Portrait);
        assert_eq!(doc.pages[1].orientation, Orientation::Landscape);

        let boxes = media_boxes(&doc.bytes);
        assert_eq!(boxes.len(), 2);
        assert!(close(boxes[0].0, 75.0) && close(boxes[0].1, 150.0), "{:?}", boxes);
        assert!(close(boxes[1].0, 225.0) && close(boxes[1].1, 75.0), "{:?}", boxes);

        let placed = placements(&doc.bytes);
        assert_eq!(placed.len(), 2);
        assert!(placed.iter().all(|(_, draws)| *draws));
        assert_fills_page(&placed[0].0, 75.0, 150.0);
        assert_fills_page(&placed[1].0, 225.0, 75.0);

        let images = embedded_images(&doc.bytes);
        let sizes: Vec<_> = images.iter().map(|(w, h, _)| (*w, *h)).collect();
        assert_eq!(sizes, vec![(100, 200), (300, 100)]);
        assert_lossless(&images);
    }

    #[test]
    fn assembly_reports_failing_index() {
        let images = vec![
            SourceFile::new("ok.png", "image/png", png(10, 10)),
            SourceFile::new("bad.png", "image/png", b"garbage".to_vec()),
            SourceFile::new("never.png", "image/png", png(10, 10)),
        ];
        let mut placed = 0;
        let err = assemble(&images, 32767, "out.pdf".into(), &mut |p, _| placed = p).unwrap_err();
        match err {
            ConvertError::Assembly { index, name, source } => {
                assert_eq!(index, 1);
                assert_eq!(name, "bad.png");
                assert!(matches!(source, ImagePageError::Decode(_)), "got: {source}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(placed, 1);
    }

    #[test]
    fn assembly_reports_oversized_image_as_dimension_exceeded() {
        let images = vec![
            SourceFile::new("ok.png", "image/png", png(10, 10)),
            SourceFile::new("wide.png", "image/png", png(50, 5)),
        ];
        let err = assemble(&images, 32, "out.pdf".into(), &mut |_, _| {}).unwrap_err();
        assert!(
            matches!(
                err,
                ConvertError::Assembly {
                    index: 1,
                    source: ImagePageError::TooLarge(PageError::DimensionExceeded {
                        page: 2,
                        requested_px: 50,
                        limit: 32
                    }),
                    ..
                }
            ),
            "got: {err}"
        );
    }

    #[test]
    fn empty_assembly_is_no_input() {
        let err = assemble(&[], 32767, "out.pdf".into(), &mut |_, _| {}).unwrap_err();
        assert!(matches!(err, ConvertError::NoInput));
    }

    #[test]
    fn assembled_name_carries_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(assembled_filename_on(date), "converted_images_2024-03-07.pdf");
        assert!(assembled_filename().starts_with("converted_images_"));
    }

    #[test]
    fn assembled_name_uses_utc_date() {
        let before = assembled_filename_on(Utc::now().date_naive());
        let name = assembled_filename();
        let after = assembled_filename_on(Utc::now().date_naive());
        assert!(name == before || name == after, "{name} vs {before}/{after}");
    }
}
