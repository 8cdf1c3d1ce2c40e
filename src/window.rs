use crate::Status;
use log::{debug, info, warn};
use opencv::core::{self, Point, Rect, Scalar, Size};
use opencv::prelude::*;
use opencv::{highgui, imgproc};
use rfd::{MessageButtons, MessageDialog, MessageLevel};

pub const WINDOW_TITLE: &str = "Face Recognition App";
pub const WINDOW_SIZE: (i32, i32) = (800, 600);
pub const CANVAS_SIZE: (i32, i32) = (640, 480);

const CANVAS_TOP: i32 = 116;
const KEY_ESCAPE: i32 = 27;
const KEY_BACKSPACE: i32 = 8;
const KEY_DELETE: i32 = 127;
// keysyms reported by `wait_key_ex`
const KEYSYM_BACKSPACE: i32 = 0xFF08;
const KEYSYM_DELETE: i32 = 0xFFFF;
// modifier state sits above the keysym
const KEYSYM_MASK: i32 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// The UI the capture loop talks to.
pub trait Frontend {
    fn show_frame(&mut self, frame: &Mat) -> anyhow::Result<()>;

    fn set_status(&mut self, status: Status) -> anyhow::Result<()>;

    /// Repaint frame and status now, before a blocking dialog.
    fn refresh(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Current contents of the name entry.
    fn name(&self) -> String;

    /// Blocking warning dialog.
    fn warn(&mut self, title: &str, message: &str);

    /// Blocking information dialog.
    fn inform(&mut self, title: &str, message: &str);

    /// Pump events, waiting at most the poll timeout for a key.
    fn poll(&mut self) -> anyhow::Result<Control>;

    fn close(&mut self) -> anyhow::Result<()>;
}

/// Result of feeding one key code to the name entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Edited,
    Ignored,
}

/// Text entry driven by raw `wait_key_ex` codes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NameEntry {
    text: String,
}

impl NameEntry {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn apply_key(&mut self, key: i32) -> KeyAction {
        if key < 0 {
            return KeyAction::Ignored;
        }
        match key & KEYSYM_MASK {
            KEY_ESCAPE => KeyAction::Quit,
            KEY_BACKSPACE | KEY_DELETE | KEYSYM_BACKSPACE | KEYSYM_DELETE => {
                if self.text.pop().is_some() {
                    KeyAction::Edited
                } else {
                    KeyAction::Ignored
                }
            }
            code @ 32..=126 => {
                self.text.push(code as u8 as char);
                KeyAction::Edited
            }
            _ => KeyAction::Ignored,
        }
    }
}

/// OpenCV window laid out like a small form: header, name entry, status
/// label and the live feed below.
pub struct AppWindow {
    entry: NameEntry,
    status: Option<Status>,
    feed: Mat,
    poll_ms: i32,
    quit_pending: bool,
    open: bool,
}

impl AppWindow {
    pub fn new(poll_ms: i32) -> anyhow::Result<Self> {
        highgui::named_window(WINDOW_TITLE, highgui::WINDOW_AUTOSIZE)?;
        let feed = Mat::new_rows_cols_with_default(
            CANVAS_SIZE.1,
            CANVAS_SIZE.0,
            core::CV_8UC3,
            Scalar::all(0.0),
        )?;
        info!("Opened window {:?}", WINDOW_TITLE);
        Ok(Self {
            entry: NameEntry::default(),
            status: None,
            feed,
            poll_ms,
            quit_pending: false,
            open: true,
        })
    }

    fn render(&self) -> anyhow::Result<Mat> {
        let side = (WINDOW_SIZE.0 - CANVAS_SIZE.0) / 2;
        let bottom = WINDOW_SIZE.1 - CANVAS_SIZE.1 - CANVAS_TOP;
        let mut screen = Mat::default();
        core::copy_make_border(
            &self.feed,
            &mut screen,
            CANVAS_TOP,
            bottom,
            side,
            side,
            core::BORDER_CONSTANT,
            Scalar::all(0.0),
        )?;

        let white = Scalar::all(255.0);
        imgproc::rectangle(
            &mut screen,
            Rect::new(side - 2, CANVAS_TOP - 2, CANVAS_SIZE.0 + 4, CANVAS_SIZE.1 + 4),
            white,
            2,
            imgproc::LINE_8,
            0,
        )?;

        centered_text(&mut screen, WINDOW_TITLE, 32, 1.0, white)?;
        centered_text(&mut screen, "Enter your name:", 56, 0.55, white)?;

        let entry_box = Rect::new(WINDOW_SIZE.0 / 2 - 120, 62, 240, 24);
        imgproc::rectangle(&mut screen, entry_box, white, imgproc::FILLED, imgproc::LINE_8, 0)?;
        imgproc::put_text(
            &mut screen,
            &format!("{}_", self.entry.text()),
            Point::new(entry_box.x + 4, entry_box.y + 18),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.55,
            Scalar::all(0.0),
            1,
            imgproc::LINE_AA,
            false,
        )?;

        if let Some(status) = self.status {
            centered_text(&mut screen, status.message(), 106, 0.6, status.style().color())?;
        }
        Ok(screen)
    }

    /// Feed one key to the name entry, true when it asks to quit.
    fn handle_key(&mut self, key: i32) -> bool {
        match self.entry.apply_key(key) {
            KeyAction::Quit => {
                info!("Quit key pressed");
                true
            }
            KeyAction::Edited => {
                debug!("Name entry now {:?}", self.entry.text());
                false
            }
            KeyAction::Ignored => false,
        }
    }

    fn window_closed(&self) -> anyhow::Result<bool> {
        let visible = highgui::get_window_property(WINDOW_TITLE, highgui::WND_PROP_VISIBLE)?;
        Ok(visible < 1.0)
    }
}

fn centered_text(image: &mut Mat, text: &str, baseline: i32, scale: f64, color: Scalar) -> anyhow::Result<()> {
    let mut base = 0;
    let size = imgproc::get_text_size(text, imgproc::FONT_HERSHEY_SIMPLEX, scale, 1, &mut base)?;
    imgproc::put_text(
        image,
        text,
        Point::new((WINDOW_SIZE.0 - size.width) / 2, baseline),
        imgproc::FONT_HERSHEY_SIMPLEX,
        scale,
        color,
        1,
        imgproc::LINE_AA,
        false,
    )?;
    Ok(())
}

impl Frontend for AppWindow {
    fn show_frame(&mut self, frame: &Mat) -> anyhow::Result<()> {
        let mut feed = Mat::default();
        imgproc::resize(
            frame,
            &mut feed,
            Size::new(CANVAS_SIZE.0, CANVAS_SIZE.1),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )?;
        self.feed = feed;
        Ok(())
    }

    fn set_status(&mut self, status: Status) -> anyhow::Result<()> {
        self.status = Some(status);
        Ok(())
    }

    fn refresh(&mut self) -> anyhow::Result<()> {
        let screen = self.render()?;
        highgui::imshow(WINDOW_TITLE, &screen)?;
        // highgui only paints while pumping events; keep whatever key it read
        let key = highgui::wait_key_ex(1)?;
        if self.handle_key(key) {
            self.quit_pending = true;
        }
        Ok(())
    }

    fn name(&self) -> String {
        self.entry.text().to_owned()
    }

    fn warn(&mut self, title: &str, message: &str) {
        let _ = MessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title(title)
            .set_description(message)
            .set_buttons(MessageButtons::Ok)
            .show();
    }

    fn inform(&mut self, title: &str, message: &str) {
        let _ = MessageDialog::new()
            .set_level(MessageLevel::Info)
            .set_title(title)
            .set_description(message)
            .set_buttons(MessageButtons::Ok)
            .show();
    }

    fn poll(&mut self) -> anyhow::Result<Control> {
        let screen = self.render()?;
        highgui::imshow(WINDOW_TITLE, &screen)?;
        let key = highgui::wait_key_ex(self.poll_ms)?;
        if self.handle_key(key) || self.quit_pending {
            return Ok(Control::Quit);
        }
        if self.window_closed()? {
            info!("Window closed");
            return Ok(Control::Quit);
        }
        Ok(Control::Continue)
    }

    fn close(&mut self) -> anyhow::Result<()> {
        if !self.open {
            return Ok(());
        }
        highgui::destroy_all_windows()?;
        self.open = false;
        info!("Destroyed windows");
        Ok(())
    }
}

impl Drop for AppWindow {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!("Failed to destroy windows: {}", err);
        }
    }
}
