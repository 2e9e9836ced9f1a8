//! Keyboard shortcuts for navigation and labelling.
//!
//! Bindings are stored as key names (`"B"`, `"ArrowRight"`, ...) so the
//! config file stays readable; they are resolved to [`egui::Key`] once.

use eframe::egui;
use serde::{Deserialize, Serialize};

/// What a shortcut does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Previous,
    Next,
    MarkCorrect,
    MarkIncorrect,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::Previous,
        Action::Next,
        Action::MarkCorrect,
        Action::MarkIncorrect,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Action::Previous => "Previous",
            Action::Next => "Next",
            Action::MarkCorrect => "True",
            Action::MarkIncorrect => "False",
        }
    }
}

/// Key names as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub previous: String,
    pub next: String,
    pub correct: String,
    pub incorrect: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            previous: "B".into(),
            next: "N".into(),
            correct: "T".into(),
            incorrect: "F".into(),
        }
    }
}

impl KeyBindings {
    fn name_for(&self, action: Action) -> &str {
        match action {
            Action::Previous => &self.previous,
            Action::Next => &self.next,
            Action::MarkCorrect => &self.correct,
            Action::MarkIncorrect => &self.incorrect,
        }
    }
}

/// Resolved bindings, checked in [`Action::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap {
    entries: Vec<(egui::Key, Action)>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::from_bindings(&KeyBindings::default())
    }
}

impl KeyMap {
    /// Unknown key names fall back to the default binding for that action.
    pub fn from_bindings(bindings: &KeyBindings) -> Self {
        let defaults = KeyBindings::default();
        let entries = Action::ALL
            .into_iter()
            .filter_map(|action| {
                let name = bindings.name_for(action);
                let key = parse_key(name).or_else(|| {
                    tracing::warn!("Unknown key \"{name}\" for {action:?}; using default");
                    parse_key(defaults.name_for(action))
                })?;
                Some((key, action))
            })
            .collect();
        Self { entries }
    }

    /// Action for a key press. Chords with Ctrl, Alt, Shift or Cmd never
    /// trigger a shortcut.
    pub fn action_for(&self, key: egui::Key, modifiers: egui::Modifiers) -> Option<Action> {
        if !modifiers.is_none() {
            return None;
        }
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, a)| *a)
    }

    pub fn key_for(&self, action: Action) -> Option<egui::Key> {
        self.entries
            .iter()
            .find(|(_, a)| *a == action)
            .map(|(k, _)| *k)
    }

    /// First bound action whose key went down this frame.
    pub fn pressed(&self, input: &egui::InputState) -> Option<Action> {
        self.entries
            .iter()
            .map(|(k, _)| *k)
            .filter(|k| input.key_pressed(*k))
            .find_map(|k| self.action_for(k, input.modifiers))
    }

    /// Button caption such as `Next(n)`.
    pub fn caption(&self, action: Action) -> String {
        match self.key_for(action) {
            Some(key) => format!("{}({})", action.label(), key.name().to_lowercase()),
            None => action.label().to_string(),
        }
    }
}

fn parse_key(name: &str) -> Option<egui::Key> {
    egui::Key::from_name(name).or_else(|| egui::Key::from_name(&name.to_uppercase()))
}
