//! Event loop: routes terminal input to the voice manager and draws the
//! keyboard. All the musical behavior lives in the library; this file is
//! wiring.

use std::collections::HashMap;
use std::io::stdout;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
        KeyboardEnhancementFlags, MouseButton, MouseEventKind, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::supports_keyboard_enhancement,
};
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Style},
    text::Line,
    widgets::Paragraph,
};
use rtrb::{Consumer, RingBuffer};

use keybed::{
    engine::AudioEngine,
    notes::Note,
    synth::{KeyEvent, VoiceManager},
};

use crate::{keymap, ui::Keyboard};

/// Feedback queue capacity; far more than one screen's worth of key events.
const FEEDBACK_QUEUE_SIZE: usize = 256;
/// Without real key-release events, a held key is released this long after
/// its last press/repeat. Must sit above the terminal's key-repeat delay or
/// held notes drop out before the first repeat arrives.
const HOLD_TIMEOUT: Duration = Duration::from_millis(600);
const TICK: Duration = Duration::from_millis(33);

pub struct App {
    manager: Arc<Mutex<VoiceManager>>,
    engine: AudioEngine,
    feedback: Consumer<KeyEvent>,
    keyboard: Keyboard,
    /// Keys currently held, with the time of their last press event. Only
    /// used on terminals without release reporting.
    held: HashMap<char, (&'static str, Instant)>,
    /// Note currently held by the mouse button.
    mouse_note: Option<Note>,
    /// Whether the terminal reports key release events (kitty protocol).
    release_events: bool,
    /// Engine failure already shown in the status line.
    degraded: bool,
}

impl App {
    pub fn new() -> Self {
        let (feedback_tx, feedback_rx) = RingBuffer::<KeyEvent>::new(FEEDBACK_QUEUE_SIZE);

        let sample_rate = AudioEngine::probe_sample_rate();
        let manager = Arc::new(Mutex::new(
            VoiceManager::new(sample_rate).with_feedback(feedback_tx),
        ));
        let engine = AudioEngine::new(Arc::clone(&manager), sample_rate);

        Self {
            manager,
            engine,
            feedback: feedback_rx,
            keyboard: Keyboard::new(),
            held: HashMap::new(),
            mouse_note: None,
            release_events: false,
            degraded: false,
        }
    }

    pub fn run(mut self) -> EyreResult<()> {
        self.release_events = supports_keyboard_enhancement().unwrap_or(false);

        let mut terminal = ratatui::init();
        execute!(stdout(), EnableMouseCapture).wrap_err("failed to enable mouse capture")?;
        if self.release_events {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )
            .wrap_err("failed to enable key release reporting")?;
        }

        let result = self.event_loop(&mut terminal);

        // Teardown in reverse, releasing anything still sounding
        self.stop_all();
        if self.release_events {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = execute!(stdout(), DisableMouseCapture);
        ratatui::restore();

        result
    }

    fn event_loop(&mut self, terminal: &mut ratatui::DefaultTerminal) -> EyreResult<()> {
        loop {
            if event::poll(TICK)? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_key(key) {
                            return Ok(());
                        }
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    // The original keyboard silenced itself on window blur
                    Event::FocusLost => self.stop_all(),
                    _ => {}
                }
            }

            if !self.release_events {
                self.sweep_held_keys();
            }

            while let Ok(event) = self.feedback.pop() {
                self.keyboard.apply(event);
            }

            let status = self.status_line();
            let keyboard = &mut self.keyboard;
            terminal.draw(|frame| {
                let [kb_area, status_area] =
                    Layout::vertical([Constraint::Length(9), Constraint::Length(2)])
                        .areas(frame.area());
                keyboard.render(frame.buffer_mut(), kb_area);
                frame.render_widget(Paragraph::new(status), status_area);
            })?;
        }
    }

    /// Returns true when the app should quit.
    fn handle_key(&mut self, key: crossterm::event::KeyEvent) -> bool {
        if key.code == KeyCode::Esc
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
        {
            return true;
        }

        // Chorded shortcuts are not notes
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
        {
            return false;
        }

        match (key.code, key.kind) {
            (KeyCode::Char(' '), KeyEventKind::Press) => self.stop_all(),
            (KeyCode::Char(ch), KeyEventKind::Press | KeyEventKind::Repeat) => {
                if let Some(name) = keymap::note_for_key(ch) {
                    self.press(name);
                    self.held.insert(ch, (name, Instant::now()));
                }
            }
            (KeyCode::Char(ch), KeyEventKind::Release) => {
                if let Some(name) = keymap::note_for_key(ch) {
                    self.release(name);
                    self.held.remove(&ch);
                }
            }
            _ => {}
        }
        false
    }

    fn handle_mouse(&mut self, mouse: crossterm::event::MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(note) = self.keyboard.hit(mouse.column, mouse.row) {
                    self.press(note.name());
                    self.mouse_note = Some(note);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(note) = self.mouse_note.take() {
                    self.release(note.name());
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                // Dragging off one key onto another re-presses, like sliding
                // a finger across the keys
                let target = self.keyboard.hit(mouse.column, mouse.row);
                if target != self.mouse_note {
                    if let Some(old) = self.mouse_note.take() {
                        self.release(old.name());
                    }
                    if let Some(note) = target {
                        self.press(note.name());
                        self.mouse_note = Some(note);
                    }
                }
            }
            _ => {}
        }
    }

    /// Every press is also the user gesture that may bootstrap (or resume)
    /// the audio engine. A failed engine degrades to silent operation; the
    /// status line shows it and the keyboard keeps highlighting.
    fn press(&mut self, name: &str) {
        if self.engine.ensure_ready().is_err() {
            self.degraded = true;
        }
        if let Ok(mut manager) = self.manager.lock() {
            manager.note_on(name);
        }
    }

    fn release(&mut self, name: &str) {
        if let Ok(mut manager) = self.manager.lock() {
            manager.note_off(name);
        }
    }

    fn stop_all(&mut self) {
        self.held.clear();
        self.mouse_note = None;
        if let Ok(mut manager) = self.manager.lock() {
            manager.stop_all();
        }
    }

    /// Release keys whose repeat stream has gone quiet (terminals without
    /// release reporting never tell us the key went up).
    fn sweep_held_keys(&mut self) {
        let now = Instant::now();
        let expired: Vec<char> = self
            .held
            .iter()
            .filter(|(_, (_, last))| now.duration_since(*last) > HOLD_TIMEOUT)
            .map(|(ch, _)| *ch)
            .collect();

        for ch in expired {
            if let Some((name, _)) = self.held.remove(&ch) {
                self.release(name);
            }
        }
    }

    fn status_line(&self) -> Vec<Line<'static>> {
        let audio = if self.degraded {
            Line::styled(
                "audio unavailable - keys still light up, but there is no sound",
                Style::default().fg(Color::Red),
            )
        } else {
            Line::raw("z-row: octave 4   q-row: octave 5/6   click or drag the keys")
        };
        let help = Line::styled(
            "space: release all    esc: quit",
            Style::default().fg(Color::DarkGray),
        );
        vec![audio, help]
    }
}
