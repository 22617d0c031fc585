use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use sdlooper::codec::PersistenceCodec;
use sdlooper::display::{Display, Screen};
use sdlooper::engine::{self, LoopEngine, Mode, TransportStatus};
use sdlooper::feedback::{Feedback, Indicator};
use sdlooper::menu::{Level, MenuHost, MenuStateMachine};
use sdlooper::session::Session;
use sdlooper::storage::DirStorage;

const CAPACITY: usize = 100;

#[derive(Default)]
struct Messages(Vec<String>);

impl Feedback for Messages {
    fn message(&mut self, text: &str, _hold: Duration) {
        self.0.push(text.to_string());
    }
    fn transport(&mut self, _status: &TransportStatus) {}
    fn reset_flash(&mut self) {}
}

/// Rows of text drawn since the last clear.
#[derive(Default, Clone)]
struct Rows(Rc<RefCell<Vec<String>>>);

impl Display for Rows {
    fn clear(&mut self) {
        self.0.borrow_mut().clear();
    }
    fn draw_rect(&mut self, _: i32, _: i32, _: i32, _: i32, _: bool) {}
    fn draw_pixel(&mut self, _: i32, _: i32, _: bool) {}
    fn write_text(&mut self, _: i32, _: i32, text: &str, _: bool) {
        self.0.borrow_mut().push(text.to_string());
    }
    fn refresh(&mut self) {}
}

struct Dark;

impl Indicator for Dark {
    fn set(&mut self, _: bool, _: bool) {}
}

fn alternating(count: usize) -> Vec<f32> {
    (0..count)
        .map(|i| if i % 2 == 0 { 0.5 } else { -0.5 })
        .collect()
}

fn capture(engine: &mut LoopEngine, samples: &[f32]) {
    engine.toggle_record();
    for s in samples {
        engine.process(*s);
    }
    engine.toggle_record();
}

#[test]
fn capture_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let storage = DirStorage::mount(dir.path()).unwrap();
    let mut codec = PersistenceCodec::new();
    let mut feedback = Messages::default();
    let mut engine = LoopEngine::new(CAPACITY);

    let take = alternating(40);
    capture(&mut engine, &take);
    assert_eq!(engine.len(), 40);

    let name = codec.export_raw(&engine, &storage, &mut feedback).unwrap();
    assert_eq!(name, "LOOP1.BIN");
    assert_eq!(std::fs::metadata(dir.path().join(&name)).unwrap().len(), 80);

    let mut fresh = LoopEngine::new(CAPACITY);
    let report = codec
        .import_raw(&name, &mut fresh, &storage, &mut feedback)
        .unwrap();
    assert_eq!(report.samples, 40);
    assert!(!report.truncated);
    assert_eq!(fresh.len(), 40);
    assert_eq!(fresh.mode(), Mode::Looping);
    assert!(fresh.is_playing());
    for (i, expected) in take.iter().enumerate() {
        let got = fresh.buffer().get(i);
        assert!((got - expected).abs() <= 1.0 / 32767.0, "sample {i}: {got}");
    }
    assert!(feedback.0.iter().any(|m| m == "Loaded 40 smp"));
}

#[test]
fn eleventh_save_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let storage = DirStorage::mount(dir.path()).unwrap();
    let mut codec = PersistenceCodec::new();
    let mut feedback = Messages::default();
    let mut engine = LoopEngine::new(CAPACITY);
    capture(&mut engine, &alternating(8));

    for _ in 0..10 {
        codec.export_raw(&engine, &storage, &mut feedback).unwrap();
    }
    assert!(codec.export_raw(&engine, &storage, &mut feedback).is_err());
    assert_eq!(codec.next_raw_index(), 11);
    assert_eq!(feedback.0.last().map(String::as_str), Some("Max files (10)"));
    assert!(!dir.path().join("LOOP11.BIN").exists());
}

#[test]
fn recall_lists_two_files_from_the_top() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("A.BIN"), [0u8; 4]).unwrap();
    std::fs::write(dir.path().join("b.bin"), [0u8; 6]).unwrap();
    std::fs::write(dir.path().join("LOOP1.WAV"), [0u8; 44]).unwrap();

    let rows = Rows::default();
    let shared = engine::shared(LoopEngine::new(CAPACITY));
    let mut session = Session::new(
        shared.clone(),
        Box::new(DirStorage::mount(dir.path()).unwrap()),
        Screen::new(Box::new(rows.clone()), 0.0),
        Box::new(Dark),
        0.0,
    );
    let mut menu = MenuStateMachine::new();

    // Save/Recall, then Recall
    menu.handle(0, true, &mut session);
    menu.handle(1, false, &mut session);
    menu.handle(0, true, &mut session);

    assert_eq!(menu.level(), Level::FileSelect);
    assert_eq!(menu.catalog().len(), 2);
    let view = menu.view();
    assert_eq!(view.first, 0);
    assert_eq!(view.rows(), 0..2);
    assert!(rows.0.borrow().iter().any(|r| r == "A.BIN" || r == "b.bin"));

    // the selection wraps within the two files
    menu.handle(2, false, &mut session);
    assert_eq!(menu.selected(), 0);

    let name = menu.catalog().get(0).unwrap().to_string();
    let expected = if name == "A.BIN" { 2 } else { 3 };
    menu.handle(0, true, &mut session);
    assert_eq!(menu.level(), Level::Main);
    assert_eq!(engine::lock(&shared).len(), expected);
}

#[test]
fn saving_through_the_menu_writes_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let shared = engine::shared(LoopEngine::new(CAPACITY));
    capture(&mut engine::lock(&shared), &alternating(30));

    let mut session = Session::new(
        shared,
        Box::new(DirStorage::mount(dir.path()).unwrap()),
        Screen::new(Box::new(Rows::default()), 0.0),
        Box::new(Dark),
        0.0,
    );
    session.save();

    assert!(dir.path().join("LOOP1.WAV").exists());
    assert_eq!(std::fs::metadata(dir.path().join("LOOP1.BIN")).unwrap().len(), 60);

    let reader = hound::WavReader::open(dir.path().join("LOOP1.WAV")).unwrap();
    assert_eq!(reader.spec().sample_rate, 48_000);
    assert_eq!(reader.len(), 30);
}
