use std::time::Duration;

use crate::catalog::FileCatalog;
use crate::config::{RAW_SUFFIX, VISIBLE_FILES};
use crate::feedback::{hold, ms};

pub const MAIN_ENTRIES: [&str; 3] = ["Save/Recall", "Loop/Playback", "Settings"];
pub const SUB_ENTRIES: [&str; 3] = ["Save", "Recall", "Exit"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    #[default]
    Main,
    Submenu,
    FileSelect,
}

/// What the menu drives. Implemented by the session on the device and by
/// fakes in tests.
pub trait MenuHost {
    /// Write the loop in both formats.
    fn save(&mut self);
    /// Refill `catalog` from storage.
    fn rescan(&mut self, catalog: &mut FileCatalog, suffix: &str);
    /// Replace the loop with the named raw file.
    fn load(&mut self, name: &str);
    fn message(&mut self, text: &str, hold: Duration);
    fn render(&mut self, view: &MenuView<'_>);
}

#[derive(Debug, Clone, Copy)]
pub enum Items<'a> {
    Labels(&'static [&'static str]),
    Files(&'a [String]),
}

impl Items<'_> {
    pub fn len(&self) -> usize {
        match self {
            Items::Labels(labels) => labels.len(),
            Items::Files(files) => files.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn label(&self, index: usize) -> &str {
        match self {
            Items::Labels(labels) => labels.get(index).copied().unwrap_or(""),
            Items::Files(files) => files.get(index).map(String::as_str).unwrap_or(""),
        }
    }
}

/// One frame of the menu: the rows to draw and which one is highlighted.
#[derive(Debug, Clone, Copy)]
pub struct MenuView<'a> {
    pub level: Level,
    pub items: Items<'a>,
    pub selected: usize,
    /// First row inside the visible window.
    pub first: usize,
    /// Rows in the visible window.
    pub visible: usize,
}

impl MenuView<'_> {
    /// Indices of the rows to draw, top to bottom.
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.first..(self.first + self.visible).min(self.items.len())
    }
}

/// Three-level navigator: main menu, Save/Recall submenu, file list.
#[derive(Debug, Default)]
pub struct MenuStateMachine {
    level: Level,
    main_index: usize,
    sub_index: usize,
    file_index: usize,
    catalog: FileCatalog,
}

impl MenuStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn selected(&self) -> usize {
        match self.level {
            Level::Main => self.main_index,
            Level::Submenu => self.sub_index,
            Level::FileSelect => self.file_index,
        }
    }

    pub fn catalog(&self) -> &FileCatalog {
        &self.catalog
    }

    /// Draw the current level unconditionally.
    pub fn render(&self, host: &mut dyn MenuHost) {
        host.render(&self.view());
    }

    /// Apply one poll's worth of input. Renders once if anything changed or
    /// a message was shown.
    pub fn handle(&mut self, delta: i32, pressed: bool, host: &mut dyn MenuHost) {
        let changed = match self.level {
            Level::Main => self.handle_main(delta, pressed),
            Level::Submenu => self.handle_submenu(delta, pressed, host),
            Level::FileSelect => self.handle_file_select(delta, pressed, host),
        };
        if changed {
            host.render(&self.view());
        }
    }

    pub fn view(&self) -> MenuView<'_> {
        match self.level {
            Level::Main => MenuView {
                level: self.level,
                items: Items::Labels(&MAIN_ENTRIES),
                selected: self.main_index,
                first: 0,
                visible: MAIN_ENTRIES.len(),
            },
            Level::Submenu => MenuView {
                level: self.level,
                items: Items::Labels(&SUB_ENTRIES),
                selected: self.sub_index,
                first: 0,
                visible: SUB_ENTRIES.len(),
            },
            Level::FileSelect => MenuView {
                level: self.level,
                items: Items::Files(self.catalog.names()),
                selected: self.file_index,
                first: window_start(self.file_index, self.catalog.len(), VISIBLE_FILES),
                visible: VISIBLE_FILES,
            },
        }
    }

    fn handle_main(&mut self, delta: i32, pressed: bool) -> bool {
        let mut changed = false;
        if delta != 0 {
            self.main_index = rotate(self.main_index, delta, MAIN_ENTRIES.len());
            changed = true;
        }
        // Loop/Playback and Settings are reserved.
        if pressed && self.main_index == 0 {
            self.level = Level::Submenu;
            self.sub_index = 0;
            changed = true;
        }
        changed
    }

    fn handle_submenu(&mut self, delta: i32, pressed: bool, host: &mut dyn MenuHost) -> bool {
        let mut changed = false;
        if delta != 0 {
            self.sub_index = rotate(self.sub_index, delta, SUB_ENTRIES.len());
            changed = true;
        }
        if !pressed {
            return changed;
        }

        match self.sub_index {
            0 => {
                host.message("Saving...", ms(hold::NORMAL));
                host.save();
                host.message("Save Complete", ms(hold::LONG));
                self.level = Level::Main;
            }
            1 => {
                host.rescan(&mut self.catalog, RAW_SUFFIX);
                if self.catalog.is_empty() {
                    host.message("No Binary Files Found", ms(hold::LONG));
                    self.level = Level::Main;
                } else {
                    self.level = Level::FileSelect;
                    self.file_index = 0;
                }
            }
            _ => {
                host.message("Exiting Menu", ms(hold::NORMAL));
                self.level = Level::Main;
            }
        }
        true
    }

    fn handle_file_select(&mut self, delta: i32, pressed: bool, host: &mut dyn MenuHost) -> bool {
        if self.catalog.is_empty() {
            self.level = Level::Main;
            return true;
        }

        let mut changed = false;
        if delta != 0 {
            self.file_index = rotate(self.file_index, delta, self.catalog.len());
            changed = true;
        }
        if pressed {
            host.message("Loading...", ms(hold::NORMAL));
            if let Some(name) = self.catalog.get(self.file_index) {
                host.load(name);
            }
            host.message("Loaded!", ms(hold::NORMAL));
            self.level = Level::Main;
            changed = true;
        }
        changed
    }
}

/// Move `index` by `delta`, wrapping in both directions.
pub fn rotate(index: usize, delta: i32, count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    (index as i64 + delta as i64).rem_euclid(count as i64) as usize
}

/// First row of a `visible`-row window centered on `selected` and kept
/// inside `0..count`.
pub fn window_start(selected: usize, count: usize, visible: usize) -> usize {
    if count < visible {
        return 0;
    }
    selected.saturating_sub(visible / 2).min(count - visible)
}
