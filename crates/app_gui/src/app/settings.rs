//! Settings panel: shortcuts, start-up behaviour and version info.

use super::{Panel, UiApp};
use crate::config::AppConfig;
use crate::keys::Action;
use eframe::egui;

impl UiApp {
    /// Renders the settings screen.
    pub(super) fn render_settings_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Settings");
        ui.add_space(8.0);

        ui.label("Keyboard shortcuts");
        egui::Grid::new("shortcuts").striped(true).show(ui, |ui| {
            for action in Action::ALL {
                ui.label(action.label());
                let key = self
                    .keymap
                    .key_for(action)
                    .map(|k| k.name())
                    .unwrap_or("-");
                ui.monospace(key);
                ui.end_row();
            }
        });
        ui.label("Shortcuts can be changed in the config file.");

        ui.add_space(12.0);
        let reopen = ui.checkbox(
            &mut self.config.reopen_last_directory,
            "Reopen the last directory on start",
        );
        if reopen.changed() {
            self.persist_config();
            self.status = "Settings saved.".to_string();
        }

        ui.add_space(12.0);
        ui.separator();
        ui.add_space(6.0);
        match AppConfig::config_path() {
            Some(path) => ui.label(format!("Config file: {}", path.display())),
            None => ui.label("Config file: unavailable"),
        };
        if let Some(dir) = &self.config.last_directory {
            ui.label(format!("Last directory: {}", dir.display()));
        }
        ui.label(format!("Version: {}", self.app_version));

        ui.add_space(12.0);
        if ui.button("Back").clicked() {
            self.panel = Panel::Review;
        }
    }
}
