//! eframe window: controls, progress, preview pane and message dialog.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use eframe::{App, Frame, egui};
use egui::{ColorImage, TextureHandle, TextureOptions};
use rfd::FileDialog;

use tubeconvert::AppContext;
use tubeconvert::events::{AppEvent, EventKind};
use tubeconvert::format;
use tubeconvert::model::{DownloadOutcome, VideoPreview, format_duration};
use tubeconvert::state::StateUpdate;

use crate::thumbnail::decode_thumbnail;

/// Blocking acknowledgment window
struct Dialog {
    title: &'static str,
    message: String,
}

/// Everything the background results change, written by bus subscribers.
#[derive(Default)]
struct UiModel {
    preview: Option<VideoPreview>,
    pending_thumbnail: Option<ColorImage>,
    thumbnail: Option<TextureHandle>,
    progress: u8,
    status: String,
    downloading: bool,
    dialog: Option<Dialog>,
}

/// User intents collected while drawing, applied once drawing is done.
enum UiAction {
    SetUrl(String),
    SetFormat(String),
    SetPath(PathBuf),
    Preview,
    Download,
    Cancel,
    CloseDialog,
}

pub struct TubeApp {
    ctx: Option<AppContext>,
    model: Rc<RefCell<UiModel>>,
    url_input: String,
}

impl TubeApp {
    pub fn new(egui_ctx: &egui::Context, mut ctx: AppContext) -> Self {
        let model = Rc::new(RefCell::new(UiModel::default()));

        let repaint_ctx = egui_ctx.clone();
        ctx.set_repaint(Arc::new(move || repaint_ctx.request_repaint()));

        let m = Rc::clone(&model);
        ctx.on_state_change(move |state| m.borrow_mut().downloading = state.is_downloading);

        let m = Rc::clone(&model);
        ctx.subscribe(EventKind::PreviewReady, move |event| {
            if let AppEvent::PreviewReady(preview) = event {
                let mut model = m.borrow_mut();
                model.pending_thumbnail = decode_thumbnail(&preview.thumbnail);
                model.thumbnail = None;
                model.preview = Some(preview.clone());
            }
        });
        let m = Rc::clone(&model);
        ctx.subscribe(EventKind::PreviewFailed, move |event| {
            if let AppEvent::PreviewFailed(message) = event {
                m.borrow_mut().dialog = Some(Dialog { title: "Preview Error", message: message.clone() });
            }
        });
        let m = Rc::clone(&model);
        ctx.subscribe(EventKind::DownloadProgress, move |event| {
            if let AppEvent::DownloadProgress(pct) = event {
                m.borrow_mut().progress = *pct;
            }
        });
        let m = Rc::clone(&model);
        ctx.subscribe(EventKind::DownloadStatus, move |event| {
            if let AppEvent::DownloadStatus(status) = event {
                m.borrow_mut().status = status.clone();
            }
        });
        let m = Rc::clone(&model);
        ctx.subscribe(EventKind::DownloadFinished, move |event| {
            if let AppEvent::DownloadFinished(outcome) = event {
                let title = match outcome {
                    DownloadOutcome::Success { .. } => "Success",
                    DownloadOutcome::Failed(_) => "Download Error",
                };
                m.borrow_mut().dialog = Some(Dialog { title, message: outcome.message() });
            }
        });
        let m = Rc::clone(&model);
        ctx.subscribe(EventKind::DownloadRejected, move |event| {
            if let AppEvent::DownloadRejected(message) = event {
                m.borrow_mut().dialog = Some(Dialog { title: "Download Error", message: message.clone() });
            }
        });

        let url_input = ctx.state().url.clone();
        Self { ctx: Some(ctx), model, url_input }
    }

    fn apply(&mut self, actions: Vec<UiAction>) {
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };
        for action in actions {
            let result = match action {
                UiAction::SetUrl(url) => {
                    ctx.update_state(StateUpdate::default().url(url));
                    Ok(())
                }
                UiAction::SetFormat(format) => {
                    ctx.update_state(StateUpdate::default().format(format));
                    Ok(())
                }
                UiAction::SetPath(path) => {
                    ctx.update_state(StateUpdate::default().path(path));
                    Ok(())
                }
                UiAction::Preview => ctx.submit_preview(),
                UiAction::Download => ctx.submit_download(),
                UiAction::Cancel => {
                    ctx.cancel_download();
                    Ok(())
                }
                UiAction::CloseDialog => {
                    self.model.borrow_mut().dialog = None;
                    Ok(())
                }
            };
            if let Err(err) = result {
                tracing::warn!(error = %err, "request not started");
                self.model.borrow_mut().dialog = Some(Dialog { title: "Error", message: err.to_string() });
            }
        }
    }
}

impl App for TubeApp {
    fn update(&mut self, egui_ctx: &egui::Context, _frame: &mut Frame) {
        // 1️⃣ Apply background results on this thread
        if let Some(ctx) = self.ctx.as_mut() {
            ctx.pump();
        }
        let Some(ctx) = self.ctx.as_ref() else {
            return;
        };
        let state = ctx.state().clone();
        let preview_busy = ctx.is_preview_in_flight();
        let mut actions = Vec::new();

        {
            let mut model = self.model.borrow_mut();

            // 2️⃣ Upload a freshly decoded thumbnail
            if let Some(img) = model.pending_thumbnail.take() {
                model.thumbnail = Some(egui_ctx.load_texture("thumbnail", img, TextureOptions::default()));
            }

            let modal = model.dialog.is_some();
            let controls_enabled = !model.downloading && !modal;

            // 3️⃣ Main panel: controls, progress and preview
            egui::CentralPanel::default().show(egui_ctx, |ui| {
                ui.heading("YouTube Downloader");

                ui.add_enabled_ui(controls_enabled, |ui| {
                    ui.horizontal(|ui| {
                        ui.label("URL:");
                        let edit = egui::TextEdit::singleline(&mut self.url_input)
                            .hint_text("Enter YouTube video URL")
                            .desired_width(f32::INFINITY);
                        if ui.add(edit).changed() {
                            actions.push(UiAction::SetUrl(self.url_input.trim().to_string()));
                        }
                    });

                    ui.horizontal(|ui| {
                        if ui
                            .add_enabled(!preview_busy, egui::Button::new("Preview"))
                            .on_hover_text("Preview the video information before downloading")
                            .clicked()
                        {
                            actions.push(UiAction::Preview);
                        }
                        if ui.button("Download").on_hover_text("Download the video").clicked() {
                            actions.push(UiAction::Download);
                        }
                        if ui
                            .button("Choose Directory")
                            .on_hover_text("Choose the directory where you want to save the video")
                            .clicked()
                        {
                            if let Some(folder) = FileDialog::new().set_directory(&state.path).pick_folder() {
                                actions.push(UiAction::SetPath(folder));
                            }
                        }

                        let mut selected = state.format.clone();
                        egui::ComboBox::from_id_source("format")
                            .selected_text(selected.as_str())
                            .show_ui(ui, |ui| {
                                for id in format::identifiers() {
                                    ui.selectable_value(&mut selected, id.to_string(), id);
                                }
                            });
                        if selected != state.format {
                            actions.push(UiAction::SetFormat(selected));
                        }
                    });

                    ui.label(format!("Saving to: {}", state.path.display()));
                });

                // Progress is only shown while a download runs
                if model.downloading {
                    ui.separator();
                    ui.label(model.status.as_str());
                    ui.add(egui::ProgressBar::new(f32::from(model.progress) / 100.0).show_percentage());
                    if ui.add_enabled(!modal, egui::Button::new("Cancel")).clicked() {
                        actions.push(UiAction::Cancel);
                    }
                }

                ui.separator();
                ui.horizontal_top(|ui| {
                    ui.vertical(|ui| {
                        ui.set_max_width(ui.available_width() - thumbnail_width());
                        let (title, duration, description) = match &model.preview {
                            Some(p) => (p.title.as_str(), format_duration(p.duration), p.description.as_str()),
                            None => ("", String::new(), ""),
                        };
                        ui.strong("Title:");
                        ui.label(title);
                        ui.strong("Duration:");
                        ui.label(duration);
                        ui.strong("Description:");
                        egui::ScrollArea::vertical()
                            .max_height(200.0)
                            .auto_shrink([false, true])
                            .show(ui, |ui| {
                                ui.label(description);
                            });
                    });
                    ui.vertical(|ui| {
                        ui.strong("Thumbnail:");
                        if let Some(tex) = &model.thumbnail {
                            ui.image(tex);
                        }
                    });
                });
            });

            // 4️⃣ Message dialog blocks the controls until acknowledged
            if let Some(dialog) = &model.dialog {
                egui::Window::new(dialog.title)
                    .collapsible(false)
                    .resizable(false)
                    .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                    .show(egui_ctx, |ui| {
                        ui.label(dialog.message.as_str());
                        ui.vertical_centered(|ui| {
                            if ui.button("OK").clicked() {
                                actions.push(UiAction::CloseDialog);
                            }
                        });
                    });
            }
        }

        self.apply(actions);
    }
}

fn thumbnail_width() -> f32 {
    crate::thumbnail::THUMBNAIL_WIDTH as f32 + 20.0
}

impl Drop for TubeApp {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            ctx.shutdown();
        }
    }
}
