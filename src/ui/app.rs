use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::{Frame, Terminal};
use std::cell::{Cell, RefCell};
use std::io::{self, Stdout};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::ChatError;
use crate::services::dispatcher;
use crate::services::{CompletionBackend, ConversationStore, RequestDispatcher};
use crate::ui::input::{InputAction, InputController};
use crate::ui::render::render_message;
use crate::ui::scroll::ScrollController;

const TITLE: &str = "Career Pal";
const EMPTY_HINT: &str = "No messages yet. Ask me anything about cybersecurity!";
const PLACEHOLDER_IDLE: &str =
    "Type your message here... (Enter to send, Shift + Enter for new line)";
const PLACEHOLDER_SENDING: &str = "Career Pal is thinking...";
const KEY_HINTS: &str =
    "Enter send · Shift+Enter newline · PgUp/PgDn scroll · Ctrl+L clear · Esc quit";

const FRAME_INTERVAL: Duration = Duration::from_millis(30);

/// Lines moved per PageUp/PageDown press.
const SCROLL_STEP: usize = 5;

type ReplyOutcome = Result<Option<String>, ChatError>;

pub fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

pub fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

/// The single conversation view: header, transcript, input, send affordance.
///
/// Everything runs on one event loop; the only suspension point is the
/// outbound call, which is spawned off and reports back over a channel so the
/// interface stays responsive while a request is in flight.
pub struct App {
    store: ConversationStore,
    dispatcher: RequestDispatcher,
    input: InputController,
    scroll: Rc<RefCell<ScrollController>>,
    dirty: Rc<Cell<bool>>,
    running: bool,
}

impl App {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        let mut store = ConversationStore::new();
        let scroll = Rc::new(RefCell::new(ScrollController::new()));
        let dirty = Rc::new(Cell::new(true));

        // Re-render and follow-to-latest are driven by store notifications,
        // not by polling the transcript.
        {
            let scroll = Rc::clone(&scroll);
            let dirty = Rc::clone(&dirty);
            store.subscribe(Box::new(move |_event| {
                scroll.borrow_mut().on_mutation();
                dirty.set(true);
            }));
        }

        Self {
            store,
            dispatcher: RequestDispatcher::new(backend),
            input: InputController::new(),
            scroll,
            dirty,
            running: true,
        }
    }

    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> Result<(), ChatError> {
        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<ReplyOutcome>();
        let mut events = EventStream::new();
        let mut ticker = tokio::time::interval(FRAME_INTERVAL);

        while self.running {
            if self.dirty.get() {
                terminal.draw(|frame| self.draw(frame))?;
                self.dirty.set(false);
            }

            tokio::select! {
                maybe_event = events.next() => match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key, &reply_tx);
                    }
                    Some(Ok(Event::Resize(..))) => self.dirty.set(true),
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => self.running = false,
                },
                Some(outcome) = reply_rx.recv() => {
                    // Runs for every settled request, success or failure; this
                    // is where the dispatcher goes back to Idle.
                    self.dispatcher.finish(&mut self.store, outcome);
                }
                _ = ticker.tick() => {
                    if self.scroll.borrow_mut().tick() {
                        self.dirty.set(true);
                    }
                }
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent, reply_tx: &mpsc::UnboundedSender<ReplyOutcome>) {
        match key.code {
            KeyCode::Esc => self.running = false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
            }
            KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                // Clears the transcript only; an in-flight request keeps going.
                self.store.reset();
            }
            KeyCode::PageUp => {
                self.scroll.borrow_mut().scroll_up(SCROLL_STEP);
                self.dirty.set(true);
            }
            KeyCode::PageDown => {
                self.scroll.borrow_mut().scroll_down(SCROLL_STEP);
                self.dirty.set(true);
            }
            _ if self.dispatcher.is_sending() => {
                // Input surface is disabled while a request is in flight.
            }
            _ => match self.input.handle_key(key) {
                InputAction::Submitted => self.try_submit(reply_tx),
                InputAction::Edited => self.dirty.set(true),
                InputAction::Ignored => {}
            },
        }
    }

    fn try_submit(&mut self, reply_tx: &mpsc::UnboundedSender<ReplyOutcome>) {
        if let Some(call) = self.dispatcher.submit(&mut self.store, self.input.text()) {
            self.input.clear();
            self.dirty.set(true);
            let tx = reply_tx.clone();
            tokio::spawn(async move {
                // settle turns a panicked call into an error outcome, so the
                // loop always gets something to finish with.
                let _ = tx.send(dispatcher::settle(call).await);
            });
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let [header, transcript, input_area] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(5),
        ])
        .areas(frame.area());

        self.draw_header(frame, header);
        self.draw_transcript(frame, transcript);
        self.draw_input(frame, input_area);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(Span::styled(
                TITLE,
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                KEY_HINTS,
                Style::default().add_modifier(Modifier::DIM),
            )),
        ];
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn draw_transcript(&self, frame: &mut Frame, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();

        if self.store.is_empty() {
            lines.push(Line::default());
            lines.push(
                Line::from(Span::styled(
                    EMPTY_HINT,
                    Style::default().add_modifier(Modifier::DIM),
                ))
                .alignment(Alignment::Center),
            );
        } else {
            for message in self.store.messages() {
                lines.extend(render_message(message, area.width));
                lines.push(Line::default());
            }
        }

        let mut scroll = self.scroll.borrow_mut();
        scroll.sync(lines.len(), area.height as usize);
        let offset = scroll.offset();

        frame.render_widget(Paragraph::new(lines).scroll((offset, 0)), area);
    }

    fn draw_input(&self, frame: &mut Frame, area: Rect) {
        let [box_area, button_area] =
            Layout::horizontal([Constraint::Min(10), Constraint::Length(14)]).areas(area);

        let sending = self.dispatcher.is_sending();
        let dim = Style::default().add_modifier(Modifier::DIM);

        let block = Block::bordered();
        let inner = block.inner(box_area);
        frame.render_widget(block, box_area);

        if sending {
            frame.render_widget(Paragraph::new(Span::styled(PLACEHOLDER_SENDING, dim)), inner);
        } else if self.input.text().is_empty() {
            frame.render_widget(Paragraph::new(Span::styled(PLACEHOLDER_IDLE, dim)), inner);
        } else {
            frame.render_widget(Paragraph::new(self.input.text()), inner);
        }

        if !sending {
            let (row, col) = self.input.cursor_position();
            frame.set_cursor_position((
                inner.x + col.min(inner.width.saturating_sub(1)),
                inner.y + row.min(inner.height.saturating_sub(1)),
            ));
        }

        let (label, style) = if sending {
            ("Loading...", dim)
        } else if self.input.send_enabled(true) {
            (
                "[ Send ]",
                Style::default()
                    .fg(Color::LightBlue)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            ("[ Send ]", dim)
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(label, style)).alignment(Alignment::Center))
                .block(Block::bordered()),
            button_area,
        );
    }
}
