//! Main window: controls, file list and image view.

mod settings;

use crate::config::AppConfig;
use crate::keys::{Action, KeyMap};
use anyhow::{Context, Result};
use eframe::{App, Frame, egui};
use review_core::{Navigator, SessionOrigin, Status};
use rfd::FileDialog;
use std::path::{Path, PathBuf};

/// Largest texture side uploaded; bigger images are downscaled first.
const MAX_TEXTURE_SIDE: u32 = 4096;
const FILE_LIST_MAX_WIDTH: f32 = 600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Panel {
    #[default]
    Review,
    Settings,
}

struct LoadedImage {
    path: PathBuf,
    texture: Option<egui::TextureHandle>,
    error: Option<String>,
}

pub struct UiApp {
    config: AppConfig,
    keymap: KeyMap,
    navigator: Option<Navigator>,
    status: String,
    panel: Panel,
    image: Option<LoadedImage>,
    scroll_to_current: bool,
    app_version: &'static str,
}

impl UiApp {
    pub fn new(config: AppConfig, app_version: &'static str) -> Self {
        let keymap = KeyMap::from_bindings(&config.keys);
        let reopen = config
            .reopen_last_directory
            .then(|| config.last_directory.clone())
            .flatten();
        let mut app = Self {
            config,
            keymap,
            navigator: None,
            status: String::new(),
            panel: Panel::default(),
            image: None,
            scroll_to_current: false,
            app_version,
        };
        if let Some(dir) = reopen {
            app.open_directory(dir);
        }
        app
    }

    fn open_directory(&mut self, dir: PathBuf) {
        match Navigator::open(&dir) {
            Ok(nav) => {
                let session = nav.session();
                let origin = match session.origin() {
                    SessionOrigin::Scanned => "scanned",
                    SessionOrigin::Loaded => "loaded",
                };
                let missing = session.missing_files().len();
                self.status = format!("{} images {origin} from {}", session.len(), dir.display());
                if missing > 0 {
                    self.status.push_str(&format!(" ({missing} missing on disk)"));
                }
                self.navigator = Some(nav);
                self.image = None;
                self.scroll_to_current = true;
                self.config.last_directory = Some(dir);
                self.persist_config();
            }
            Err(e) => self.report("Could not open directory", &e),
        }
    }

    fn apply(&mut self, action: Action) {
        let Some(nav) = self.navigator.as_mut() else {
            return;
        };
        match dispatch(nav, action) {
            Ok(_) => self.scroll_to_current = true,
            Err(e) => self.report("Could not save label", &e),
        }
    }

    fn jump_to(&mut self, file_name: &str) {
        let Some(nav) = self.navigator.as_mut() else {
            return;
        };
        if let Err(e) = nav.jump_to(file_name) {
            self.report("Could not select image", &e);
        }
    }

    fn choose_directory(&mut self) {
        let start = self
            .config
            .last_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        if let Some(dir) = FileDialog::new()
            .set_title("Select Directory")
            .set_directory(start)
            .pick_folder()
        {
            self.open_directory(dir);
        }
    }

    fn report(&mut self, what: &str, err: &dyn std::fmt::Display) {
        tracing::error!("{what}: {err}");
        self.status = format!("{what}: {err}");
    }

    fn persist_config(&mut self) {
        if let Err(e) = self.config.save() {
            tracing::warn!("Could not save settings: {e:#}");
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() || self.panel != Panel::Review {
            return;
        }
        if let Some(action) = ctx.input(|i| self.keymap.pressed(i)) {
            self.apply(action);
        }
    }

    /// Keep the texture in sync with the cursor.
    fn sync_image(&mut self, ctx: &egui::Context) {
        let wanted = self.navigator.as_ref().and_then(|n| n.current_path());
        let Some(path) = wanted else {
            self.image = None;
            return;
        };
        if self.image.as_ref().is_some_and(|img| img.path == path) {
            return;
        }
        self.image = Some(match load_texture(ctx, &path) {
            Ok(texture) => LoadedImage {
                path,
                texture: Some(texture),
                error: None,
            },
            Err(e) => {
                tracing::warn!("{e:#}");
                LoadedImage {
                    path,
                    texture: None,
                    error: Some(format!("{e:#}")),
                }
            }
        });
    }

    fn render_controls(&mut self, ui: &mut egui::Ui) {
        let has_images = self
            .navigator
            .as_ref()
            .is_some_and(|n| n.current().is_some());
        ui.horizontal(|ui| {
            for action in Action::ALL {
                let caption = self.keymap.caption(action);
                if ui
                    .add_enabled(has_images, egui::Button::new(caption))
                    .clicked()
                {
                    self.apply(action);
                }
            }
        });
        ui.horizontal(|ui| {
            if ui.button("Load Directory").clicked() {
                self.choose_directory();
            }
            if ui.button("Settings").clicked() {
                self.panel = Panel::Settings;
            }
            if let Some(nav) = &self.navigator {
                let tally = nav.session().tally();
                ui.label(format!(
                    "{}  |  correct {}  incorrect {}  unmarked {}",
                    nav.position_label(),
                    tally.correct,
                    tally.incorrect,
                    tally.unmarked + tally.other
                ));
            }
        });
        if !self.status.is_empty() {
            ui.label(&self.status);
        }
    }

    fn render_file_list(&mut self, ui: &mut egui::Ui) {
        let Some(nav) = &self.navigator else {
            ui.label("No directory loaded");
            return;
        };
        let cursor = nav.cursor();
        let mut clicked: Option<String> = None;
        let scroll = std::mem::take(&mut self.scroll_to_current);
        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                for (idx, (name, status)) in nav.entries().into_iter().enumerate() {
                    let selected = cursor == Some(idx);
                    let resp = ui.selectable_label(selected, format!("{name} - {status}"));
                    if selected && scroll {
                        resp.scroll_to_me(Some(egui::Align::Center));
                    }
                    if resp.clicked() {
                        clicked = Some(name.to_string());
                    }
                }
            });
        if let Some(name) = clicked {
            self.jump_to(&name);
        }
    }

    fn render_image(&self, ui: &mut egui::Ui) {
        let Some(nav) = &self.navigator else {
            ui.centered_and_justified(|ui| {
                ui.heading("Load a directory to start reviewing");
            });
            return;
        };
        if nav.current().is_none() {
            ui.centered_and_justified(|ui| {
                ui.heading("No images found");
            });
            return;
        }
        match &self.image {
            Some(LoadedImage {
                texture: Some(tex), ..
            }) => {
                let size = ui.available_size();
                ui.centered_and_justified(|ui| {
                    ui.add(
                        egui::Image::from_texture(egui::load::SizedTexture::from_handle(tex))
                            .fit_to_exact_size(size),
                    );
                });
            }
            Some(LoadedImage {
                error: Some(err), ..
            }) => {
                ui.centered_and_justified(|ui| {
                    ui.label(err);
                });
            }
            _ => {}
        }
    }
}

impl App for UiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.handle_keys(ctx);
        self.sync_image(ctx);

        if self.panel == Panel::Settings {
            egui::CentralPanel::default().show(ctx, |ui| self.render_settings_panel(ui));
            return;
        }

        egui::SidePanel::right("files")
            .resizable(true)
            .max_width(FILE_LIST_MAX_WIDTH)
            .show(ctx, |ui| self.render_file_list(ui));

        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| self.render_controls(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.render_image(ui));
    }
}

/// Run one shortcut/button action against the navigator.
fn dispatch(nav: &mut Navigator, action: Action) -> review_core::Result<Option<usize>> {
    match action {
        Action::Previous => Ok(nav.previous()),
        Action::Next => Ok(nav.next()),
        Action::MarkCorrect => nav.mark_current_and_advance(Status::Correct),
        Action::MarkIncorrect => nav.mark_current_and_advance(Status::Incorrect),
    }
}

fn load_texture(ctx: &egui::Context, path: &Path) -> Result<egui::TextureHandle> {
    let img = image::open(path)
        .with_context(|| format!("Cannot open image {}", path.display()))?;
    let img = if img.width() > MAX_TEXTURE_SIDE || img.height() > MAX_TEXTURE_SIDE {
        img.thumbnail(MAX_TEXTURE_SIDE, MAX_TEXTURE_SIDE)
    } else {
        img
    };
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let color = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
    let name = format!("image:{}", path.display());
    Ok(ctx.load_texture(name, color, egui::TextureOptions::LINEAR))
}
