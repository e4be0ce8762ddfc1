//! Integration tests for the reflow engine.

use std::sync::Arc;

use pagereflow::model::{Document, Edit, FlowPos, FlowUnit, Layout, Page, PageGeometry};
use pagereflow::reflow::{
    EstimatingMeasurer, Measurer, Paginator, ReflowEngine, ReflowOptions, TraceKind,
    TraceRecorder, UnitMetrics,
};
use pagereflow::Error;

/// Each paragraph character is one 10pt line; other units are estimated.
struct CharLines;

impl Measurer for CharLines {
    fn measure(&self, unit: &FlowUnit, geometry: &PageGeometry) -> UnitMetrics {
        match unit {
            FlowUnit::Paragraph { text } => {
                UnitMetrics::lines(text.chars().count() as u32, 10.0, geometry.content_width())
            }
            other => EstimatingMeasurer::new().measure(other, geometry),
        }
    }
}

/// 100 x 100pt content frame, 10 lines per page.
fn small_engine() -> ReflowEngine {
    ReflowEngine::new(PageGeometry::new(100.0, 100.0))
        .unwrap()
        .with_measurer(Arc::new(CharLines))
}

fn para(lines: usize) -> FlowUnit {
    FlowUnit::paragraph("x".repeat(lines))
}

fn long_document(units: usize) -> Document {
    let mut doc = Document::new();
    for i in 0..units {
        if i % 12 == 0 {
            doc.push(FlowUnit::heading(format!("Section {}", i / 12 + 1), 2));
        }
        doc.push(FlowUnit::paragraph(
            "The quick brown fox jumps over the lazy dog. ".repeat(3 + i % 9),
        ));
        if i % 17 == 5 {
            doc.push(FlowUnit::table(120.0 + (i % 4) as f64 * 40.0));
        }
    }
    doc
}

fn assert_partition(layout: &Layout, doc: &Document) {
    if let Err(e) = layout.validate(FlowPos::before(doc.len())) {
        panic!("layout does not partition the flow: {e}; {layout:?}");
    }
}

/// Deterministic edit stream over a document.
struct EditStream {
    state: u64,
}

impl EditStream {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.state >> 33) as u32
    }

    fn next_edit(&mut self, doc: &Document) -> Edit {
        let len = doc.len().max(1);
        let index = self.next_u32() as usize % len;
        match self.next_u32() % 7 {
            0 => Edit::Insert {
                index,
                unit: FlowUnit::paragraph("inserted text ".repeat(1 + self.next_u32() as usize % 30)),
            },
            1 if doc.len() > 1 => Edit::Remove { index },
            2 => Edit::Insert {
                index,
                unit: FlowUnit::blank(),
            },
            3 if self.next_u32() % 4 == 0 => Edit::Insert {
                index,
                unit: FlowUnit::page_break(),
            },
            4 if self.next_u32() % 3 == 0 => Edit::Insert {
                index,
                unit: FlowUnit::table(PageGeometry::letter().content_height() * 1.1),
            },
            _ => match doc.get(index) {
                Some(unit) if unit.text().is_some() => Edit::AppendText {
                    index,
                    text: " typed".repeat(1 + self.next_u32() as usize % 20),
                },
                _ => Edit::Replace {
                    index,
                    unit: FlowUnit::paragraph("replacement ".repeat(5)),
                },
            },
        }
    }
}

#[test]
fn test_partition_holds_across_edits() {
    let mut doc = long_document(60);
    let mut engine = ReflowEngine::new(PageGeometry::letter()).unwrap();
    let mut recorder = TraceRecorder::new();
    engine.reflow(&doc, &mut recorder).unwrap();
    assert_partition(engine.layout(), &doc);

    let mut edits = EditStream::new(7);
    for _ in 0..200 {
        let edit = edits.next_edit(&doc);
        doc.apply(&edit).unwrap();
        engine.notify_edit(&edit);
        engine.reflow(&doc, &mut recorder).unwrap();
        assert_partition(engine.layout(), &doc);
    }
}

#[test]
fn test_random_edits_with_oversized_blocks_settle() {
    for seed in 0..25 {
        let mut doc = long_document(30);
        let mut engine = ReflowEngine::new(PageGeometry::letter()).unwrap();
        let mut recorder = TraceRecorder::new();
        engine.reflow(&doc, &mut recorder).unwrap();

        let mut edits = EditStream::new(seed);
        for step in 0..60 {
            let edit = edits.next_edit(&doc);
            doc.apply(&edit).unwrap();
            engine.notify_edit(&edit);
            if let Err(e) = engine.reflow(&doc, &mut recorder) {
                panic!("seed {seed} step {step} after {edit:?}: {e}");
            }
            assert_partition(engine.layout(), &doc);

            let again = engine.reflow(&doc, &mut recorder).unwrap();
            assert_eq!(
                again.operations, 0,
                "seed {seed} step {step} after {edit:?}"
            );
        }
    }
}

#[test]
fn test_oversized_table_keeps_trailing_blank() {
    let doc = Document::from_units(vec![
        FlowUnit::table(105.0),
        FlowUnit::Whitespace { lines: 3 },
    ]);
    let mut engine = small_engine();
    let mut recorder = TraceRecorder::new();
    let summary = engine.reflow(&doc, &mut recorder).unwrap();

    assert_eq!(summary.page_count, 1);
    assert_eq!(summary.overflow_pages, 1);
    assert!(recorder.is_empty());

    let again = engine.reflow(&doc, &mut recorder).unwrap();
    assert_eq!(again.operations, 0);
}

#[test]
fn test_oversized_table_before_blank_paginates() {
    let doc = Document::from_units(vec![
        FlowUnit::paragraph("intro"),
        FlowUnit::table(700.0),
        FlowUnit::blank(),
    ]);
    let layout = pagereflow::paginate(&doc, PageGeometry::letter()).unwrap();
    assert_eq!(
        layout.pages,
        vec![
            Page::new(FlowPos::START, FlowPos::before(1)),
            Page::new(FlowPos::before(1), FlowPos::before(3)),
        ]
    );

    let mut engine = ReflowEngine::new(PageGeometry::letter()).unwrap();
    let mut recorder = TraceRecorder::new();
    let summary = engine.reflow(&doc, &mut recorder).unwrap();
    assert_eq!(summary.overflow_pages, 1);
    assert_eq!(engine.reflow(&doc, &mut recorder).unwrap().operations, 0);
}

#[test]
fn test_pages_fit_their_frame() {
    let doc = long_document(80);
    let mut engine = ReflowEngine::new(PageGeometry::a4()).unwrap();
    let summary = engine.reflow(&doc, &mut TraceRecorder::new()).unwrap();

    assert_eq!(summary.overflow_pages, 0);
    assert!(summary.page_count >= summary.estimated_pages());
    assert_partition(engine.layout(), &doc);
}

#[test]
fn test_second_pass_is_idempotent() {
    let doc = long_document(60);
    let mut engine = ReflowEngine::new(PageGeometry::letter()).unwrap();
    let mut recorder = TraceRecorder::new();
    engine.reflow(&doc, &mut recorder).unwrap();
    let layout = engine.layout().clone();
    let events = recorder.len();

    let summary = engine.reflow(&doc, &mut recorder).unwrap();
    assert_eq!(summary.operations, 0);
    assert_eq!(recorder.len(), events);
    assert_eq!(engine.layout(), &layout);
}

#[test]
fn test_explicit_page_break() {
    let doc = Document::from_units(vec![para(2), FlowUnit::page_break(), para(2)]);
    let mut engine = small_engine();
    let mut recorder = TraceRecorder::new();
    engine.reflow(&doc, &mut recorder).unwrap();

    assert_eq!(engine.layout().page_count(), 2);
    assert_eq!(engine.layout().pages[1].start, FlowPos::before(2));
    assert_eq!(recorder.events()[0].event, TraceKind::Split);
}

#[test]
fn test_widow_control() {
    let doc = Document::from_units(vec![para(12)]);
    let mut engine = small_engine();
    engine.reflow(&doc, &mut TraceRecorder::new()).unwrap();
    assert_eq!(engine.layout().pages[0].end, FlowPos::new(0, 10));

    // Eleven lines: ten would fit but would strand one line.
    let doc = Document::from_units(vec![para(11)]);
    let mut engine = small_engine();
    engine.reflow(&doc, &mut TraceRecorder::new()).unwrap();
    assert_eq!(engine.layout().pages[0].end, FlowPos::new(0, 9));

    let mut engine = small_engine().with_options(ReflowOptions::new().without_widow_control());
    engine.reflow(&doc, &mut TraceRecorder::new()).unwrap();
    assert_eq!(engine.layout().pages[0].end, FlowPos::new(0, 10));
}

#[test]
fn test_heading_kept_with_next() {
    let doc = Document::from_units(vec![para(8), FlowUnit::heading("H", 6), para(5)]);
    let mut engine = small_engine();
    engine.reflow(&doc, &mut TraceRecorder::new()).unwrap();
    assert_eq!(engine.layout().pages[0].end, FlowPos::before(1));

    let mut engine = small_engine().with_options(ReflowOptions::new().with_keep_headings(false));
    engine.reflow(&doc, &mut TraceRecorder::new()).unwrap();
    assert_eq!(engine.layout().pages[0].end, FlowPos::before(2));
}

#[test]
fn test_oversized_block_overflows_alone() {
    let doc = Document::from_units(vec![para(3), FlowUnit::image(80.0, 400.0), para(3)]);
    let mut engine = small_engine();
    let summary = engine.reflow(&doc, &mut TraceRecorder::new()).unwrap();

    assert_eq!(summary.overflow_pages, 1);
    assert_eq!(
        engine.layout().pages,
        vec![
            Page::new(FlowPos::START, FlowPos::before(1)),
            Page::new(FlowPos::before(1), FlowPos::before(2)),
            Page::new(FlowPos::before(2), FlowPos::before(3)),
        ]
    );
}

#[test]
fn test_deleting_content_joins_pages() {
    let mut doc = Document::from_units(vec![para(6), para(6), para(6)]);
    let mut engine = small_engine();
    let mut recorder = TraceRecorder::new();
    engine.reflow(&doc, &mut recorder).unwrap();
    assert_eq!(engine.layout().page_count(), 2);

    let edit = Edit::Remove { index: 1 };
    doc.apply(&edit).unwrap();
    engine.notify_edit(&edit);
    engine.reflow(&doc, &mut recorder).unwrap();

    assert_eq!(engine.layout().page_count(), 2);
    assert_partition(engine.layout(), &doc);

    let edit = Edit::Replace {
        index: 1,
        unit: para(2),
    };
    doc.apply(&edit).unwrap();
    engine.notify_edit(&edit);
    let summary = engine.reflow(&doc, &mut recorder).unwrap();

    assert_eq!(summary.page_count, 1);
    assert!(recorder
        .events()
        .iter()
        .any(|e| matches!(e.event, TraceKind::Join | TraceKind::MergeContinuation)));
}

#[test]
fn test_inserted_content_splits_forward() {
    let mut doc = Document::from_units(vec![para(4), para(4), para(4), para(4)]);
    let mut engine = small_engine();
    let mut recorder = TraceRecorder::new();
    engine.reflow(&doc, &mut recorder).unwrap();
    let before = engine.layout().page_count();

    let edit = Edit::Insert {
        index: 0,
        unit: para(9),
    };
    doc.apply(&edit).unwrap();
    engine.notify_edit(&edit);
    engine.reflow(&doc, &mut recorder).unwrap();

    assert!(engine.layout().page_count() > before);
    assert_partition(engine.layout(), &doc);
}

#[test]
fn test_removing_everything_leaves_one_empty_page() {
    let mut doc = Document::from_units(vec![para(8), para(8), para(8)]);
    let mut engine = small_engine();
    let mut recorder = TraceRecorder::new();
    engine.reflow(&doc, &mut recorder).unwrap();

    for _ in 0..3 {
        let edit = Edit::Remove { index: 0 };
        doc.apply(&edit).unwrap();
        engine.notify_edit(&edit);
        engine.reflow(&doc, &mut recorder).unwrap();
    }

    assert!(doc.is_empty());
    assert_eq!(engine.layout(), &Layout::new());
}

#[test]
fn test_divergence_keeps_previous_layout() {
    let doc = Document::from_units((0..10).map(|_| para(8)).collect());
    let mut engine = small_engine().with_options(ReflowOptions::new().with_max_operations(3));
    let mut recorder = TraceRecorder::new();

    let err = engine.reflow(&doc, &mut recorder).unwrap_err();
    assert!(matches!(
        err,
        Error::ReflowDiverged {
            operations: 3,
            limit: 3
        }
    ));
    assert_eq!(engine.layout(), &Layout::new());
    assert_eq!(recorder.len(), 3);

    let mut engine = engine.with_options(ReflowOptions::default());
    engine.reflow(&doc, &mut recorder).unwrap();
    assert_partition(engine.layout(), &doc);
}

#[test]
fn test_no_split_join_alternation() {
    let mut doc = long_document(40);
    let mut engine = ReflowEngine::new(PageGeometry::letter()).unwrap();
    let mut recorder = TraceRecorder::new();
    engine.reflow(&doc, &mut recorder).unwrap();

    // Typing into one paragraph, one character at a time.
    for _ in 0..300 {
        let edit = Edit::AppendText {
            index: 10,
            text: "a".into(),
        };
        doc.apply(&edit).unwrap();
        engine.notify_edit(&edit);
        engine.reflow(&doc, &mut recorder).unwrap();
    }

    let loops = recorder
        .events()
        .windows(2)
        .filter(|w| {
            w[0].event == TraceKind::Split
                && w[1].event == TraceKind::Join
                && (w[0].pos.unwrap() - w[1].pos.unwrap()).abs() <= 20.0
        })
        .count();
    assert_eq!(loops, 0);
    assert_partition(engine.layout(), &doc);
}

#[test]
fn test_geometry_change_reflows() {
    let doc = long_document(40);
    let mut engine = ReflowEngine::new(PageGeometry::letter()).unwrap();
    let mut recorder = TraceRecorder::new();
    let portrait = engine.reflow(&doc, &mut recorder).unwrap();

    engine
        .set_geometry(PageGeometry::letter().with_header_footer(36.0, 36.0))
        .unwrap();
    let shorter = engine.reflow(&doc, &mut recorder).unwrap();
    assert!(shorter.page_count >= portrait.page_count);
    assert_partition(engine.layout(), &doc);

    assert!(matches!(
        engine.set_geometry(PageGeometry::new(100.0, 50.0).with_margins(30.0)),
        Err(Error::InvalidGeometry(_))
    ));
}
