//! Screenplay formatter: turns generated text into a paginated screenplay PDF.
//!
//! # Document order
//! 1. `LOGLINE:` heading and the logline, wrapped full width
//! 2. Storyboard image (optional), 140mm wide at the left margin
//! 3. `SCENE SCRIPT:` heading, then every script line laid out by class
//! 4. `APPENDIX: SHOT LIST` on a fresh page (optional), at 10pt
//!
//! Formatting is synchronous and owns all of its state; HTTP handlers run it
//! inside `spawn_blocking`.

use std::path::PathBuf;

use image::DynamicImage;
use tracing::debug;

use crate::screenplay::classifier::{Classifier, LineClass};
use crate::screenplay::layout::{LaidOutPage, LayoutEngine};
use crate::screenplay::page_setup::{FontStyle, PageSetup};
use crate::screenplay::staging::{JpegData, StagedImage};
use crate::screenplay::{pdf, FormatError};

const LOGLINE_HEADING: &str = "LOGLINE:";
const SCRIPT_HEADING: &str = "SCENE SCRIPT:";
const APPENDIX_HEADING: &str = "APPENDIX: SHOT LIST";

// ────────────────────────────────────────────────────────────────────────────
// Input / output types
// ────────────────────────────────────────────────────────────────────────────

/// Everything the formatter needs from its collaborators.
#[derive(Debug, Clone, Default)]
pub struct ScreenplayInput {
    /// Free-form generated screenplay text, newline separated.
    pub script_text: String,
    /// Literal logline body; may be empty.
    pub logline: String,
    pub image: Option<DynamicImage>,
    /// Raw pipe-delimited shot table.
    pub shot_list: Option<String>,
}

/// A finished document.
#[derive(Debug, Clone)]
pub struct FormattedScreenplay {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Pages plus the image they reference, before serialization.
#[derive(Debug, Clone)]
pub struct LaidOutDocument {
    pub pages: Vec<LaidOutPage>,
    pub image: Option<JpegData>,
}

// ────────────────────────────────────────────────────────────────────────────
// Formatter
// ────────────────────────────────────────────────────────────────────────────

/// Lays out and serializes screenplays with a fixed page setup.
#[derive(Debug, Clone)]
pub struct ScreenplayFormatter {
    setup: PageSetup,
    staging_dir: Option<PathBuf>,
}

impl ScreenplayFormatter {
    pub fn new(setup: PageSetup) -> Self {
        Self {
            setup,
            staging_dir: None,
        }
    }

    /// Stages storyboard images inside `dir` instead of the system temp directory.
    pub fn with_staging_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.staging_dir = dir;
        self
    }

    /// Formats the input into PDF bytes.
    pub fn format(&self, input: &ScreenplayInput) -> Result<FormattedScreenplay, FormatError> {
        let document = self.layout(input)?;
        let bytes = pdf::render(&document.pages, document.image.as_ref(), &self.setup)?;
        let page_count = document.pages.len();
        debug!(page_count, bytes = bytes.len(), "Screenplay serialized");
        Ok(FormattedScreenplay { bytes, page_count })
    }

    /// Lays out the document without serializing it.
    ///
    /// The staged image file is removed before this returns, whether or not layout
    /// succeeded; only its bytes travel on in the result.
    pub fn layout(&self, input: &ScreenplayInput) -> Result<LaidOutDocument, FormatError> {
        let setup = &self.setup;
        let line_h = setup.line_height_mm;
        let mut engine = LayoutEngine::new(setup);
        engine.add_page();

        engine.set_font(setup.body_font(FontStyle::Bold));
        engine.cell(line_h, LOGLINE_HEADING);
        engine.set_font(setup.body_font(FontStyle::Regular));
        engine.multi_cell(0.0, line_h, &input.logline);
        engine.ln(line_h);

        let image = match &input.image {
            Some(raster) => {
                let staged = StagedImage::stage(raster, self.staging_dir.as_deref())?;
                let jpeg = staged.load()?;
                engine.image(setup.margin_left_mm, setup.image_width_mm, jpeg.aspect());
                engine.ln(line_h);
                Some(jpeg)
            }
            None => None,
        };

        engine.set_font(setup.body_font(FontStyle::Bold));
        engine.cell(line_h, SCRIPT_HEADING);
        engine.set_font(setup.body_font(FontStyle::Regular));
        engine.ln(line_h);

        let mut classifier = Classifier::new();
        for raw in input.script_text.lines() {
            let line = raw.trim();
            let class = classifier.classify(line);
            render_line(&mut engine, setup, class, line);
        }

        if let Some(shot_list) = &input.shot_list {
            engine.add_page();
            engine.set_font(setup.body_font(FontStyle::Bold));
            engine.cell(line_h, APPENDIX_HEADING);
            engine.set_font(setup.appendix_font());
            engine.multi_cell(0.0, line_h, &sanitize_shot_list(shot_list));
        }

        let pages = engine.finish();
        debug!(pages = pages.len(), has_image = image.is_some(), "Screenplay laid out");
        Ok(LaidOutDocument { pages, image })
    }
}

/// Renders one classified line at its screenplay position.
fn render_line(engine: &mut LayoutEngine<'_>, setup: &PageSetup, class: LineClass, line: &str) {
    let line_h = setup.line_height_mm;
    match class {
        LineClass::Blank => engine.ln(line_h),
        LineClass::SceneHeading => {
            engine.set_font(setup.body_font(FontStyle::Bold));
            engine.set_x(setup.margin_left_mm);
            engine.cell(line_h, &line.to_uppercase());
            engine.set_font(setup.body_font(FontStyle::Regular));
        }
        LineClass::CharacterName => {
            engine.set_x(setup.character_x_mm);
            engine.cell(line_h, line);
        }
        LineClass::Parenthetical => {
            engine.set_x(setup.parenthetical_x_mm);
            engine.cell(line_h, line);
        }
        LineClass::Dialogue => {
            engine.set_x(setup.dialogue_x_mm);
            engine.multi_cell(setup.dialogue_width_mm, line_h, line);
        }
        LineClass::Transition => {
            engine.set_x(setup.transition_x_mm);
            engine.cell(line_h, line);
        }
        LineClass::Action => {
            engine.set_x(setup.margin_left_mm);
            engine.multi_cell(0.0, line_h, line);
        }
    }
}

/// Blanks out markdown table punctuation: every `|` and `---` becomes a space.
pub fn sanitize_shot_list(text: &str) -> String {
    text.replace('|', " ").replace("---", " ")
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screenplay::layout::DrawOp;
    use crate::screenplay::page_setup::{default_page_setup, Font};
    use crate::screenplay::test_support::{contains_bytes, files_in, page_streams, sample_image};

    fn formatter() -> ScreenplayFormatter {
        ScreenplayFormatter::new(default_page_setup())
    }

    fn input(script: &str) -> ScreenplayInput {
        ScreenplayInput {
            script_text: script.to_string(),
            logline: "A courier races a storm to deliver one last letter.".to_string(),
            ..Default::default()
        }
    }

    /// (x, font, text) for every text op on the page, skipping the page number.
    fn body(page: &LaidOutPage) -> Vec<(f32, Font, String)> {
        page.ops
            .iter()
            .skip(1)
            .filter_map(|op| match op {
                DrawOp::Text { x_mm, font, text, .. } => Some((*x_mm, *font, text.clone())),
                DrawOp::Image { .. } => None,
            })
            .collect()
    }

    fn find<'a>(ops: &'a [(f32, Font, String)], text: &str) -> &'a (f32, Font, String) {
        ops.iter()
            .find(|(_, _, t)| t == text)
            .unwrap_or_else(|| panic!("text {text:?} not laid out"))
    }

    #[test]
    fn test_headings_and_logline_come_first() {
        let doc = formatter().layout(&input("")).unwrap();
        let ops = body(&doc.pages[0]);
        let texts: Vec<&str> = ops.iter().map(|(_, _, t)| t.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "LOGLINE:",
                "A courier races a storm to deliver one last letter.",
                "SCENE SCRIPT:"
            ]
        );
        assert_eq!(ops[0].1.style, FontStyle::Bold);
        assert_eq!(ops[1].1.style, FontStyle::Regular);
        assert_eq!(ops[2].1.style, FontStyle::Bold);
    }

    #[test]
    fn test_each_class_lands_at_its_offset() {
        let setup = default_page_setup();
        let pad = setup.cell_padding_mm;
        let script = "int. lighthouse - night\n\
                      Waves pound the rocks.\n\
                      \n\
                      KEEPER\n\
                      (hoarse)\n\
                      Who's out there?\n\
                      \n\
                      SMASH CUT TO:";
        let doc = formatter().layout(&input(script)).unwrap();
        let ops = body(&doc.pages[0]);

        // Lower-case prefix is not a heading; it becomes action.
        let action = find(&ops, "int. lighthouse - night");
        assert!((action.0 - (setup.margin_left_mm + pad)).abs() < 1e-4);

        let cue = find(&ops, "KEEPER");
        assert!((cue.0 - (setup.character_x_mm + pad)).abs() < 1e-4);
        let paren = find(&ops, "(hoarse)");
        assert!((paren.0 - (setup.parenthetical_x_mm + pad)).abs() < 1e-4);
        let line = find(&ops, "Who's out there?");
        assert!((line.0 - (setup.dialogue_x_mm + pad)).abs() < 1e-4);
        let transition = find(&ops, "SMASH CUT TO:");
        assert!((transition.0 - (setup.transition_x_mm + pad)).abs() < 1e-4);
    }

    #[test]
    fn test_scene_heading_is_bold_uppercase_at_margin() {
        let setup = default_page_setup();
        let doc = formatter()
            .layout(&input("INT. Abandoned mill - day\nDust hangs in the air."))
            .unwrap();
        let ops = body(&doc.pages[0]);
        let heading = find(&ops, "INT. ABANDONED MILL - DAY");
        assert_eq!(heading.1.style, FontStyle::Bold);
        assert!((heading.0 - (setup.margin_left_mm + setup.cell_padding_mm)).abs() < 1e-4);
        // Font returns to regular for the next line.
        assert_eq!(find(&ops, "Dust hangs in the air.").1.style, FontStyle::Regular);
    }

    #[test]
    fn test_long_dialogue_wraps_inside_column() {
        let setup = default_page_setup();
        let speech = "I crossed three rivers and a mountain pass to bring you this, \
                      and you will not even open the envelope?";
        let doc = formatter()
            .layout(&input(&format!("NADIA\n{speech}")))
            .unwrap();
        let ops = body(&doc.pages[0]);
        let dialogue: Vec<_> = ops
            .iter()
            .filter(|(x, _, _)| (x - (setup.dialogue_x_mm + setup.cell_padding_mm)).abs() < 1e-4)
            .collect();
        assert!(dialogue.len() >= 3);
        for (_, _, text) in dialogue {
            assert!(text.chars().count() <= 34);
        }
    }

    #[test]
    fn test_long_script_paginates_with_numbers() {
        let script = "A hallway stretches on.\n".repeat(120);
        let doc = formatter().layout(&input(&script)).unwrap();
        assert!(doc.pages.len() >= 3);
        for page in &doc.pages {
            assert_eq!(page.texts().next(), Some(format!("{}.", page.number).as_str()));
        }
    }

    #[test]
    fn test_shot_list_is_sanitized_on_new_page() {
        let mut with_shots = input("INT. ROOM - DAY\nJOHN\nHello there.\n");
        with_shots.shot_list = Some("| Shot 1 | Wide |\n---\n".to_string());
        let doc = formatter().layout(&with_shots).unwrap();

        assert_eq!(doc.pages.len(), 2, "appendix forces a second page");
        assert!(!doc.pages[0].texts().any(|t| t.contains("APPENDIX")));

        let ops = body(&doc.pages[1]);
        assert_eq!(ops[0].2, "APPENDIX: SHOT LIST");
        assert_eq!(ops[0].1.style, FontStyle::Bold);
        let row = find(&ops, "  Shot 1   Wide  ");
        assert!((row.1.size_pt - 10.0).abs() < 1e-6);
        assert!(ops.iter().all(|(_, _, t)| !t.contains('|') && !t.contains("---")));
    }

    #[test]
    fn test_sanitize_shot_list() {
        assert_eq!(sanitize_shot_list("| Shot 1 | Wide |\n---\n"), "  Shot 1   Wide  \n \n");
        assert_eq!(sanitize_shot_list("|---|---|"), "     ");
    }

    #[test]
    fn test_image_is_drawn_between_logline_and_script() {
        let setup = default_page_setup();
        let dir = tempfile::tempdir().unwrap();
        let mut with_image = input("EXT. FIELD - DAY");
        with_image.image = Some(sample_image(40, 20));
        let doc = formatter()
            .with_staging_dir(Some(dir.path().to_path_buf()))
            .layout(&with_image)
            .unwrap();

        assert!(doc.image.is_some());
        let ops = &doc.pages[0].ops;
        let image_idx = ops
            .iter()
            .position(|op| matches!(op, DrawOp::Image { .. }))
            .unwrap();
        match &ops[image_idx] {
            DrawOp::Image {
                x_mm,
                width_mm,
                height_mm,
                ..
            } => {
                assert!((x_mm - setup.margin_left_mm).abs() < 1e-4);
                assert!((width_mm - 140.0).abs() < 1e-4);
                assert!((height_mm - 70.0).abs() < 1e-4);
            }
            DrawOp::Text { .. } => unreachable!(),
        }
        let script_idx = ops
            .iter()
            .position(|op| matches!(op, DrawOp::Text { text, .. } if text == "SCENE SCRIPT:"))
            .unwrap();
        assert!(image_idx < script_idx);
        assert!(files_in(dir.path()).is_empty(), "staged file must be removed");
    }

    #[test]
    fn test_parallel_exports_share_staging_dir() {
        let dir = tempfile::tempdir().unwrap();
        let formatter = formatter().with_staging_dir(Some(dir.path().to_path_buf()));
        let mut with_image = input("EXT. PIER - NIGHT\nFog rolls in.");
        with_image.image = Some(sample_image(30, 15));

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| formatter.format(&with_image)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let first = results[0].as_ref().unwrap();
        for result in &results {
            assert_eq!(result.as_ref().unwrap().bytes, first.bytes);
        }
        assert!(files_in(dir.path()).is_empty());
    }

    #[test]
    fn test_image_failure_aborts_without_leaving_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        let mut with_image = input("EXT. FIELD - DAY");
        with_image.image = Some(sample_image(8, 8));
        let err = formatter()
            .with_staging_dir(Some(missing))
            .format(&with_image)
            .unwrap_err();
        assert!(matches!(err, FormatError::ImageIo(_)));
        assert!(files_in(dir.path()).is_empty());
    }

    #[test]
    fn test_encoding_failure_cleans_up_staged_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut bad = input("MARIE\nÇa va? Oui — très bien.");
        bad.image = Some(sample_image(8, 8));
        let err = formatter()
            .with_staging_dir(Some(dir.path().to_path_buf()))
            .format(&bad)
            .unwrap_err();
        assert!(matches!(err, FormatError::Encoding { character: '—' }));
        assert!(files_in(dir.path()).is_empty());
    }

    #[test]
    fn test_format_is_byte_identical_for_same_input() {
        let mut full = input("INT. ROOM - DAY\nJOHN\n(quietly)\nHello there.\n\nCUT TO:");
        full.image = Some(sample_image(24, 18));
        full.shot_list = Some("| 1 | Wide | Room |".to_string());
        let a = formatter().format(&full).unwrap();
        let b = formatter().format(&full).unwrap();
        assert_eq!(a.bytes, b.bytes);
        assert_eq!(a.page_count, 2);
    }

    #[test]
    fn test_formatted_pdf_carries_script_text() {
        let mut with_shots = input("INT. ROOM - DAY\nJOHN\nHello there.\n");
        with_shots.shot_list = Some("| Shot 1 | Wide |\n---\n".to_string());
        let out = formatter().format(&with_shots).unwrap();
        assert!(out.bytes.starts_with(b"%PDF-"));
        assert_eq!(out.page_count, 2);

        let streams = page_streams(&out.bytes);
        assert_eq!(streams.len(), 2);
        assert!(contains_bytes(&streams[0], b"(INT. ROOM - DAY) Tj"));
        assert!(contains_bytes(&streams[0], b"(Hello there.) Tj"));
        assert!(contains_bytes(&streams[1], b"(  Shot 1   Wide  ) Tj"));
    }
}
