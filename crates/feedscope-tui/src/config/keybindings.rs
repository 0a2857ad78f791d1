use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::Action;

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    FeedViewer,
    FilterInput,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::new(KeyCode::Esc), Action::Back);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        bindings.insert(KeyContext::Global, global);

        // Feed viewer bindings - newest row is at the top
        let mut feed = HashMap::new();
        feed.insert(KeyBinding::new(KeyCode::Char('j')), Action::ScrollDown(1));
        feed.insert(KeyBinding::new(KeyCode::Down), Action::ScrollDown(1));
        feed.insert(KeyBinding::new(KeyCode::Char('k')), Action::ScrollUp(1));
        feed.insert(KeyBinding::new(KeyCode::Up), Action::ScrollUp(1));
        feed.insert(KeyBinding::ctrl(KeyCode::Char('f')), Action::PageDown);
        feed.insert(KeyBinding::ctrl(KeyCode::Char('b')), Action::PageUp);
        feed.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        feed.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        feed.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        feed.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        feed.insert(KeyBinding::new(KeyCode::Char('g')), Action::ScrollToTop);
        feed.insert(KeyBinding::shift(KeyCode::Char('G')), Action::ScrollToBottom);
        feed.insert(KeyBinding::new(KeyCode::Home), Action::ScrollToTop);
        feed.insert(KeyBinding::new(KeyCode::End), Action::ScrollToBottom);
        feed.insert(KeyBinding::new(KeyCode::Char('f')), Action::ToggleFollow);
        feed.insert(KeyBinding::new(KeyCode::Char('/')), Action::OpenSearch);
        feed.insert(KeyBinding::new(KeyCode::Char('n')), Action::ClearFilter);
        feed.insert(KeyBinding::new(KeyCode::Char('h')), Action::ToggleHideInternal);
        feed.insert(KeyBinding::new(KeyCode::Char('c')), Action::ClearMessages);
        feed.insert(KeyBinding::new(KeyCode::Char('e')), Action::ExportMessages);
        bindings.insert(KeyContext::FeedViewer, feed);

        // Filter input bindings (when filter bar is focused)
        let mut filter_input = HashMap::new();
        filter_input.insert(KeyBinding::new(KeyCode::Enter), Action::ApplyFilter);
        filter_input.insert(KeyBinding::new(KeyCode::Esc), Action::CloseSearch);
        filter_input.insert(KeyBinding::new(KeyCode::Backspace), Action::SearchBackspace);
        filter_input.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::SearchClear);
        filter_input.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::CloseSearch);
        bindings.insert(KeyContext::FilterInput, filter_input);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        // First check context-specific bindings
        if let Some(action) = self
            .bindings
            .get(&context)
            .and_then(|bindings| bindings.get(&binding))
        {
            return Some(action.clone());
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }

    /// Handle key event in filter input mode
    /// Returns Some(Action) for special keys and typed characters
    pub fn get_filter_input_action(&self, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        if let Some(action) = self
            .bindings
            .get(&KeyContext::FilterInput)
            .and_then(|bindings| bindings.get(&binding))
        {
            return Some(action.clone());
        }

        // For regular characters, return SearchInput action
        if let KeyCode::Char(c) = key.code {
            if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                return Some(Action::SearchInput(c));
            }
        }

        None
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}
