//! HUD overlay: Reset button, point count and asset status.

use depthview::engine::BindingStatus;
use depthview::{AssetKind, EngineState, RenderEngine};

/// What the user asked for through the HUD this frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HudResponse {
    pub reset: bool,
}

/// A decoded asset the GPU refused; a placeholder is drawn instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    pub kind: AssetKind,
    pub message: String,
}

/// One line per notable condition, most important first.
pub fn status_lines(engine: &RenderEngine, uploads: &[UploadFailure]) -> Vec<String> {
    let mut lines = Vec::new();

    match engine.state() {
        EngineState::Uninitialized | EngineState::AssetsLoading => {
            lines.push("Loading image...".to_string())
        }
        EngineState::Disposed => lines.push("Viewer closed".to_string()),
        EngineState::Ready | EngineState::Rendering => {}
    }

    if engine.state() == EngineState::Rendering && engine.depth().status() == BindingStatus::Pending
    {
        lines.push("Depth pending (flat)".to_string());
    }

    for (kind, err) in engine.failures() {
        lines.push(format!("Failed to load {kind} asset: {err}"));
    }

    for failure in uploads {
        lines.push(format!(
            "Failed to upload {} texture: {}",
            failure.kind, failure.message
        ));
    }

    lines
}

pub fn draw_hud(
    ctx: &egui::Context,
    engine: &RenderEngine,
    uploads: &[UploadFailure],
    gpu_points: u32,
) -> HudResponse {
    let mut response = HudResponse::default();

    egui::Window::new("Depth Viewer")
        .anchor(egui::Align2::LEFT_TOP, [10.0, 10.0])
        .resizable(false)
        .collapsible(false)
        .show(ctx, |ui| {
            if ui.button("Reset").clicked() {
                response.reset = true;
            }
            ui.label(format!("Points: {gpu_points}"));

            for line in status_lines(engine, uploads) {
                let color = if line.starts_with("Failed") {
                    egui::Color32::from_rgb(200, 40, 40)
                } else {
                    ui.visuals().text_color()
                };
                ui.colored_label(color, line);
            }
        });

    response
}
