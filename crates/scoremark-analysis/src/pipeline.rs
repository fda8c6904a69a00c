// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline entry — runs the seven analysis stages over one document page:
// rasterize, extract panel, detect marks, cluster rows, match labels,
// classify fills, aggregate deficits. Strictly forward, once per call.

use std::path::Path;

use image::DynamicImage;
use scoremark_core::config::DetectionParams;
use scoremark_core::error::ScoremarkError;
use scoremark_core::types::{Domain, DomainResult, Section, WeaknessReport};
use tracing::{debug, info, instrument, warn};

use crate::ocr::labels::assign_rows;
use crate::ocr::recognize::{OcrToken, TextRecognizer};
use crate::pdf::render::{DEFAULT_DPI, DEFAULT_PAGE_INDEX, PdfRasterizer};
use crate::vision::detect::{detect_boxes, to_canonical};
use crate::vision::fill::count_filled;
use crate::vision::region::{extract_panel, split_halves};
use crate::vision::rows::group_rows;

/// One-shot analyzer for score-report documents.
///
/// Holds the immutable detection parameters and an optional text
/// recognizer. Each `analyze_*` call is a complete, synchronous run of the
/// pipeline; separate calls share no state, so distinct documents may be
/// analyzed from distinct threads without synchronization.
///
/// Only rendering problems surface as errors. Recognition failures degrade
/// to declared-order row assignment and degenerate geometry degrades to
/// empty (full-deficit) results.
pub struct ReportAnalyzer {
    params: DetectionParams,
    recognizer: Option<Box<dyn TextRecognizer>>,
}

impl ReportAnalyzer {
    pub fn new(params: DetectionParams) -> Self {
        Self {
            params,
            recognizer: None,
        }
    }

    /// Attach a text recognizer for label-anchored row assignment.
    ///
    /// Without one, the label matcher runs in pure declared-order fallback.
    pub fn with_recognizer(mut self, recognizer: Box<dyn TextRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Attach the default `ocrs` engine if its models are cached locally.
    ///
    /// A missing or unloadable engine is not an error — the analyzer simply
    /// proceeds without recognition.
    #[cfg(feature = "ocr")]
    pub fn with_default_ocr(self) -> Self {
        match crate::ocr::engine::OcrsRecognizer::with_defaults() {
            Ok(recognizer) => self.with_recognizer(Box::new(recognizer)),
            Err(err) => {
                warn!(%err, "OCR models unavailable; continuing without recognition");
                self
            }
        }
    }

    /// Analyze page 0 of a PDF file at the default resolution.
    pub fn analyze_file(&self, path: impl AsRef<Path>) -> Result<WeaknessReport, ScoremarkError> {
        self.analyze_file_at(path, DEFAULT_PAGE_INDEX, DEFAULT_DPI)
    }

    /// Analyze a specific page of a PDF file at an explicit resolution.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display(), page_index, dpi))]
    pub fn analyze_file_at(
        &self,
        path: impl AsRef<Path>,
        page_index: u16,
        dpi: u32,
    ) -> Result<WeaknessReport, ScoremarkError> {
        let page = PdfRasterizer::new()?.render_file(path, page_index, dpi)?;
        Ok(self.analyze_page(&page.image))
    }

    /// Analyze page 0 of in-memory PDF bytes at the default resolution.
    pub fn analyze_bytes(&self, data: &[u8]) -> Result<WeaknessReport, ScoremarkError> {
        self.analyze_bytes_at(data, DEFAULT_PAGE_INDEX, DEFAULT_DPI)
    }

    /// Analyze a specific page of in-memory PDF bytes.
    #[instrument(skip(self, data), fields(bytes_len = data.len(), page_index, dpi))]
    pub fn analyze_bytes_at(
        &self,
        data: &[u8],
        page_index: u16,
        dpi: u32,
    ) -> Result<WeaknessReport, ScoremarkError> {
        let page = PdfRasterizer::new()?.render_bytes(data, page_index, dpi)?;
        Ok(self.analyze_page(&page.image))
    }

    /// Run the vision stages over an already-rendered page.
    ///
    /// Never fails: every non-render condition degrades to a valid
    /// (possibly all-deficit) report.
    #[instrument(skip(self, page), fields(width = page.width(), height = page.height()))]
    pub fn analyze_page(&self, page: &DynamicImage) -> WeaknessReport {
        let panel = extract_panel(page, self.params.crop);
        let halves = split_halves(&panel);

        let mut results = Vec::with_capacity(Domain::ALL.len());
        results.extend(self.analyze_half(Section::ReadingWriting, &halves.left));
        results.extend(self.analyze_half(Section::Math, &halves.right));

        let report = WeaknessReport::new(results);
        info!(
            weak_domains = report.ranked_deficits().len(),
            "Analysis complete"
        );
        report
    }

    /// Stages three through six for one section half.
    fn analyze_half(&self, section: Section, half: &DynamicImage) -> Vec<DomainResult> {
        let canonical = to_canonical(half);
        let gray = canonical.to_luma8();

        let boxes = detect_boxes(&gray, &self.params);
        let rows = group_rows(&boxes);
        debug!(
            section = section.name(),
            boxes = boxes.len(),
            rows = rows.len(),
            "Marks clustered"
        );

        let tokens = self.recognize_tokens(&canonical);
        let assignments = assign_rows(&section.domains(), &tokens, rows);

        assignments
            .into_iter()
            .map(|(domain, boxes)| DomainResult::new(domain, count_filled(&gray, &boxes)))
            .collect()
    }

    /// Best-effort recognition: a missing or failing engine reads as an
    /// empty token stream.
    fn recognize_tokens(&self, canonical: &DynamicImage) -> Vec<OcrToken> {
        let Some(recognizer) = self.recognizer.as_deref() else {
            return Vec::new();
        };
        match recognizer.recognize(canonical) {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!(%err, "Recognition unavailable; falling back to declared-order assignment");
                Vec::new()
            }
        }
    }
}

impl Default for ReportAnalyzer {
    fn default() -> Self {
        Self::new(DetectionParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use scoremark_core::config::{CropFractions, ThresholdMode};

    /// Params that treat the whole page as the indicator panel, so test
    /// pages can lay marks out in plain coordinates.
    fn full_page_params() -> DetectionParams {
        DetectionParams {
            crop: CropFractions {
                x1: 0.0,
                x2: 1.0,
                y1: 0.0,
                y2: 1.0,
            },
            ..DetectionParams::default()
        }
    }

    /// A 1800x1000 white page whose left half is exactly canonical width.
    fn white_page() -> GrayImage {
        GrayImage::from_pixel(1800, 1000, Luma([255u8]))
    }

    fn draw_mark(page: &mut GrayImage, x: u32, y: u32, intensity: u8) {
        for py in y..y + 12 {
            for px in x..x + 20 {
                page.put_pixel(px, py, Luma([intensity]));
            }
        }
    }

    /// Draw a strip of 14 marks with the given per-mark intensities.
    fn draw_strip(page: &mut GrayImage, x0: u32, y: u32, intensities: &[u8; 14]) {
        for (i, intensity) in intensities.iter().enumerate() {
            draw_mark(page, x0 + i as u32 * 30, y, *intensity);
        }
    }

    struct FailingRecognizer;

    impl TextRecognizer for FailingRecognizer {
        fn recognize(&self, _image: &DynamicImage) -> Result<Vec<OcrToken>, ScoremarkError> {
            Err(ScoremarkError::Recognition("engine not installed".into()))
        }
    }

    struct StubRecognizer {
        tokens: Vec<OcrToken>,
    }

    impl TextRecognizer for StubRecognizer {
        fn recognize(&self, _image: &DynamicImage) -> Result<Vec<OcrToken>, ScoremarkError> {
            Ok(self.tokens.clone())
        }
    }

    #[test]
    fn blank_page_reports_full_deficit_in_declared_order() {
        let page = DynamicImage::ImageLuma8(white_page());
        let report = ReportAnalyzer::new(full_page_params()).analyze_page(&page);

        let ranked = report.ranked_deficits();
        assert_eq!(ranked.len(), 8);
        for (entry, domain) in ranked.iter().zip(Domain::ALL) {
            assert_eq!(*entry, (domain, 14));
        }
    }

    #[test]
    fn filled_reading_strips_leave_only_math_deficits() {
        let mut page = white_page();
        // Four complete strips in the left (Reading & Writing) half.
        for y in [100u32, 300, 500, 700] {
            draw_strip(&mut page, 60, y, &[40u8; 14]);
        }

        let page = DynamicImage::ImageLuma8(page);
        let report = ReportAnalyzer::new(full_page_params()).analyze_page(&page);

        for domain in Section::ReadingWriting.domains() {
            let result = report.result(domain).expect("result present");
            assert_eq!(result.filled, 14, "{domain} should be fully filled");
        }

        let ranked = report.ranked_deficits();
        let expected: Vec<(Domain, u32)> = Section::Math
            .domains()
            .into_iter()
            .map(|domain| (domain, 14))
            .collect();
        assert_eq!(ranked, expected);
        assert_eq!(
            report.focus_domains(2),
            vec![Domain::Algebra, Domain::AdvancedMath]
        );
    }

    #[test]
    fn analysis_is_deterministic() {
        let mut page = white_page();
        draw_strip(&mut page, 60, 200, &[40u8; 14]);
        draw_strip(&mut page, 960, 400, &[40u8; 14]);
        let page = DynamicImage::ImageLuma8(page);

        let analyzer = ReportAnalyzer::new(full_page_params());
        let first = analyzer.analyze_page(&page);
        let second = analyzer.analyze_page(&page);
        assert_eq!(first.ranked_deficits(), second.ranked_deficits());
        assert_eq!(first.results(), second.results());
    }

    /// A strip with seven dark and seven light marks: a fixed threshold of
    /// 230 detects all fourteen outlines, and the fill classifier then
    /// counts only the dark seven.
    #[test]
    fn mixed_fill_strip_reports_half_deficit() {
        let mut page = white_page();
        let mut intensities = [200u8; 14];
        for slot in intensities.iter_mut().take(7) {
            *slot = 50;
        }
        draw_strip(&mut page, 60, 300, &intensities);

        let params = DetectionParams {
            threshold: ThresholdMode::Fixed(230),
            ..full_page_params()
        };
        let page = DynamicImage::ImageLuma8(page);
        let report = ReportAnalyzer::new(params).analyze_page(&page);

        // The single detected row falls back to the first declared domain.
        let result = report
            .result(Domain::InformationAndIdeas)
            .expect("result present");
        assert_eq!(result.filled, 7);
        assert_eq!(result.deficit(), 7);

        // Every other domain is unassigned and ranks ahead with deficit 14.
        let ranked = report.ranked_deficits();
        assert_eq!(ranked.len(), 8);
        assert_eq!(ranked.last(), Some(&(Domain::InformationAndIdeas, 7)));
    }

    #[test]
    fn failing_recognizer_degrades_to_fallback_assignment() {
        let mut page = white_page();
        draw_strip(&mut page, 60, 200, &[40u8; 14]);
        let page = DynamicImage::ImageLuma8(page);

        let without = ReportAnalyzer::new(full_page_params()).analyze_page(&page);
        let with_failing = ReportAnalyzer::new(full_page_params())
            .with_recognizer(Box::new(FailingRecognizer))
            .analyze_page(&page);

        assert_eq!(without.results(), with_failing.results());
    }

    /// A recognized label re-anchors its row even when declared order would
    /// have picked a different domain.
    #[test]
    fn recognized_labels_override_declared_order() {
        let mut page = white_page();
        draw_strip(&mut page, 60, 200, &[40u8; 14]); // row center ~206
        draw_strip(&mut page, 60, 600, &[40u8; 14]); // row center ~606

        let label = |text: &str, y: f32| OcrToken {
            text: text.to_string(),
            confidence: 0.9,
            x: 20.0,
            y,
            width: 60.0,
            height: 14.0,
        };
        let tokens = vec![
            label("craft", 600.0),
            label("and", 600.0),
            label("structure", 600.0),
        ];

        let page = DynamicImage::ImageLuma8(page);
        let report = ReportAnalyzer::new(full_page_params())
            .with_recognizer(Box::new(StubRecognizer { tokens }))
            .analyze_page(&page);

        // Craft and Structure takes the bottom strip; the top strip falls
        // back to Information and Ideas. Both are complete.
        assert_eq!(report.result(Domain::CraftAndStructure).unwrap().filled, 14);
        assert_eq!(
            report.result(Domain::InformationAndIdeas).unwrap().filled,
            14
        );
        assert_eq!(
            report.result(Domain::ExpressionOfIdeas).unwrap().filled,
            0
        );
    }

    #[test]
    fn degenerate_page_degrades_to_full_deficit() {
        let page = DynamicImage::ImageLuma8(GrayImage::from_pixel(1, 1, Luma([255u8])));
        let report = ReportAnalyzer::default().analyze_page(&page);
        assert_eq!(report.ranked_deficits().len(), 8);
    }
}
