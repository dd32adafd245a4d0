use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::action::{Action, ListId};
use crate::config::Config;
use crate::event::Event;
use crate::listing::{ListLoader, LoadError, Settled};
use crate::source::PageSource;
use crate::types::{Branch, LabTest, Record};
use crate::viewport::ListView;

/// Rows the branch dropdown shows at once
pub const DROPDOWN_ROWS: usize = 6;

/// Rows taken by header, status bar and list borders
const CHROME_ROWS: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Tests,   // Test catalogue
    Pricing, // Pricing modal over the catalogue
}

/// Pricing modal for one test
#[derive(Debug, Clone)]
pub struct Pricing {
    pub test: LabTest,
    pub dropdown_open: bool,
    pub dropdown: ListView,
    pub branch: Option<Branch>,
}

impl Pricing {
    fn new(test: LabTest) -> Self {
        Self {
            test,
            dropdown_open: false,
            dropdown: ListView::new(DROPDOWN_ROWS),
            branch: None,
        }
    }
}

pub struct App {
    pub screen: Screen,
    pub tests: ListLoader<LabTest>,
    pub tests_view: ListView,
    pub branches: ListLoader<Branch>,
    pub pricing: Option<Pricing>,
    pub error: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        config: &Config,
        tests_source: Arc<dyn PageSource>,
        branches_source: Arc<dyn PageSource>,
        terminal_height: u16,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        let mut tests = ListLoader::new(
            ListId::Tests,
            tests_source,
            config.tests.page_size,
            action_tx.clone(),
        );
        tests.attach_continuation_trigger(config.tests.trigger);

        let mut branches = ListLoader::new(
            ListId::Branches,
            branches_source,
            config.branches.page_size,
            action_tx,
        );
        branches.attach_continuation_trigger(config.branches.trigger);

        Self {
            screen: Screen::Tests,
            tests,
            tests_view: ListView::new(list_height(terminal_height)),
            branches,
            pricing: None,
            error: None,
            should_quit: false,
        }
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Init => Action::LoadTests,
            Event::Key(key) => self.handle_key(key),
            Event::Wheel(delta) => Action::Wheel(delta),
            Event::Resize(height) => Action::Resize(height),
            _ => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                if self.screen == Screen::Tests {
                    Action::Quit
                } else {
                    Action::Back
                }
            }
            KeyCode::Char('d') if ctrl => Action::PageDown,
            KeyCode::Char('u') if ctrl => Action::PageUp,
            KeyCode::PageDown => Action::PageDown,
            KeyCode::PageUp => Action::PageUp,
            KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
            KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
            KeyCode::Char('g') | KeyCode::Home => Action::GoToTop,
            KeyCode::Char('G') | KeyCode::End => Action::GoToBottom,
            KeyCode::Enter => Action::Select,
            KeyCode::Char('r') => Action::Refresh,
            KeyCode::Char('b') | KeyCode::Tab => {
                if self.screen == Screen::Pricing {
                    Action::ToggleBranchDropdown
                } else {
                    Action::None
                }
            }
            _ => Action::None,
        }
    }

    pub fn update(&mut self, action: Action) {
        // Notices stay up until the user does something
        let keeps_error = matches!(
            action,
            Action::PageFetched { .. }
                | Action::Resize(..)
                | Action::Quit
                | Action::Back
                | Action::None
        );
        if !keeps_error {
            self.error = None;
        }

        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::Back => {
                if let Some(pricing) = self.pricing.as_mut().filter(|p| p.dropdown_open) {
                    pricing.dropdown_open = false;
                } else if self.screen == Screen::Pricing {
                    self.close_pricing();
                } else {
                    self.should_quit = true;
                }
            }
            Action::ScrollUp => self.move_selection(|view, len| view.up(1, len)),
            Action::ScrollDown => self.move_selection(|view, len| view.down(1, len)),
            Action::PageUp => self.move_selection(|view, len| {
                let by = view.height.max(1);
                view.up(by, len)
            }),
            Action::PageDown => self.move_selection(|view, len| {
                let by = view.height.max(1);
                view.down(by, len)
            }),
            Action::GoToTop => self.move_selection(|view, len| view.top(len)),
            Action::GoToBottom => self.move_selection(|view, len| view.bottom(len)),
            Action::Wheel(delta) => self.move_selection(|view, len| view.scroll(delta, len)),
            Action::Select => match self.screen {
                Screen::Tests => self.open_pricing(),
                Screen::Pricing => {
                    if let Some(pricing) = self.pricing.as_mut().filter(|p| p.dropdown_open) {
                        pricing.branch = self
                            .branches
                            .items()
                            .get(pricing.dropdown.selected)
                            .cloned();
                        pricing.dropdown_open = false;
                    }
                }
            },

            Action::Resize(height) => {
                let len = self.tests.items().len();
                self.tests_view.set_height(list_height(height), len);
                self.observe_tests();
            }

            // Test list
            Action::LoadTests => {
                self.tests_view.reset();
                self.tests.load_first();
            }
            // Retries a failed page in place, otherwise reloads from page 1
            Action::Refresh => match self.screen {
                Screen::Tests => {
                    if !self.tests.retry_continuation() {
                        self.tests_view.reset();
                        self.tests.load_first();
                    }
                }
                Screen::Pricing => {
                    if !self.branches.retry_continuation() {
                        if let Some(pricing) = self.pricing.as_mut() {
                            pricing.dropdown.reset();
                        }
                        self.branches.load_first();
                    }
                }
            },

            // Pricing modal
            Action::ToggleBranchDropdown => {
                if let Some(pricing) = self.pricing.as_mut() {
                    pricing.dropdown_open = !pricing.dropdown_open;
                }
                self.observe_branches();
            }

            Action::PageFetched {
                list,
                ticket,
                result,
            } => {
                let outcome = match list {
                    ListId::Tests => self.tests.apply(ticket, result),
                    ListId::Branches => self.branches.apply(ticket, result),
                };
                self.page_settled(list, outcome);
            }
            Action::None => {}
        }
    }

    fn page_settled(&mut self, list: ListId, outcome: Result<Settled, LoadError>) {
        match outcome {
            Ok(Settled::Applied { .. }) => match list {
                ListId::Tests => {
                    let len = self.tests.items().len();
                    let height = self.tests_view.height;
                    self.tests_view.set_height(height, len);
                    self.observe_tests();
                }
                ListId::Branches => self.observe_branches(),
            },
            Ok(Settled::Discarded) => {}
            Err(err) => {
                let label = match list {
                    ListId::Tests => "Loading tests",
                    ListId::Branches => "Loading branches",
                };
                self.error = Some(format!("{} failed: {}", label, err));
            }
        }
    }

    /// Apply a navigation to whichever list has focus, then let its trigger look.
    fn move_selection(&mut self, f: impl FnOnce(&mut ListView, usize)) {
        match self.pricing.as_mut() {
            Some(pricing) if self.screen == Screen::Pricing => {
                if pricing.dropdown_open {
                    f(&mut pricing.dropdown, self.branches.items().len());
                    self.observe_branches();
                }
            }
            _ => {
                f(&mut self.tests_view, self.tests.items().len());
                self.observe_tests();
            }
        }
    }

    fn observe_tests(&mut self) {
        if self.screen != Screen::Tests {
            return;
        }
        let metrics = self.tests_view.metrics(self.tests.items().len());
        self.tests.observe(metrics);
    }

    fn observe_branches(&mut self) {
        let Some(pricing) = self.pricing.as_ref().filter(|p| p.dropdown_open) else {
            return;
        };
        let metrics = pricing.dropdown.metrics(self.branches.items().len());
        self.branches.observe(metrics);
    }

    fn open_pricing(&mut self) {
        let Some(test) = self.tests.items().get(self.tests_view.selected).cloned() else {
            return;
        };
        self.branches.set_scope(test.id());
        self.pricing = Some(Pricing::new(test));
        self.screen = Screen::Pricing;
    }

    fn close_pricing(&mut self) {
        self.pricing = None;
        self.branches.discard();
        self.screen = Screen::Tests;
        self.observe_tests();
    }
}

fn list_height(terminal_height: u16) -> usize {
    usize::from(terminal_height.saturating_sub(CHROME_ROWS))
}
