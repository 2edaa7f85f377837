use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

use janconnect_shared::{
    CameraTarget, Easing, HighlightMarker, LatLng, MapSurface, MarkerId, RegionView, Transition,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::animation::{CameraFlight, pulse_phase};
use crate::heat::{blob_alpha, blob_radius, rgba};
use crate::render_loop::{FrameScheduler, now_ms};
use crate::viewport::{MapViewport, format_distance};

const PULSE_PERIOD_MS: f64 = 1_500.0;
const ZOOM_STEP_MS: u32 = 250;
const SCALE_BAR_MAX_PX: f64 = 110.0;

/// Canvas palette choice; persisted with the other page settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapStyle {
    #[default]
    Standard,
    Dark,
    Satellite,
}

impl MapStyle {
    pub const ALL: [MapStyle; 3] = [MapStyle::Standard, MapStyle::Dark, MapStyle::Satellite];

    pub fn label(self) -> &'static str {
        match self {
            MapStyle::Standard => "Standard",
            MapStyle::Dark => "Dark",
            MapStyle::Satellite => "Satellite",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            MapStyle::Standard => Palette {
                background: "#f2efe9",
                grid: "rgba(120,110,95,0.18)",
                label: "#6b6458",
                overlay: "rgba(255,255,255,0.85)",
                overlay_text: "#2d2a26",
            },
            MapStyle::Dark => Palette {
                background: "#0c0e17",
                grid: "rgba(140,150,190,0.12)",
                label: "#5a5f78",
                overlay: "rgba(19,22,31,0.85)",
                overlay_text: "#e2e0d8",
            },
            MapStyle::Satellite => Palette {
                background: "#1f2a1c",
                grid: "rgba(200,220,190,0.10)",
                label: "#8fa386",
                overlay: "rgba(12,16,10,0.8)",
                overlay_text: "#e8efe4",
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub grid: &'static str,
    pub label: &'static str,
    pub overlay: &'static str,
    pub overlay_text: &'static str,
}

/// Everything the canvas paints: camera, heat layer and highlight markers.
#[derive(Debug, Default)]
pub struct MapScene {
    camera: MapViewport,
    flight: Option<CameraFlight>,
    heat: Option<RegionView>,
    markers: Vec<(MarkerId, HighlightMarker)>,
    next_marker: MarkerId,
}

impl MapScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera at `now`, following any flight in progress.
    pub fn camera_at(&self, now: f64) -> MapViewport {
        match &self.flight {
            Some(flight) => flight.viewport_at(now),
            None => self.camera,
        }
    }

    /// Start a flight from wherever the camera is at `now`, replacing any
    /// flight still running.
    pub fn fly_to(&mut self, target: CameraTarget, transition: Transition, now: f64) {
        let from = self.camera_at(now);
        self.camera = from;
        self.flight = Some(CameraFlight::new(from, target, transition, now));
    }

    pub fn zoom_by(&mut self, delta: f64, now: f64) {
        let current = self.camera_at(now);
        let target = CameraTarget {
            center: current.center,
            zoom: current.zoom.round() + delta,
        };
        let transition = Transition {
            duration_ms: ZOOM_STEP_MS,
            easing: Easing::EaseOutCubic,
        };
        self.fly_to(target, transition, now);
    }

    /// Settle finished flights and return the camera to draw with.
    pub fn advance(&mut self, now: f64) -> MapViewport {
        let camera = self.camera_at(now);
        if self.flight.as_ref().is_some_and(|f| f.is_finished(now)) {
            self.flight = None;
            self.camera = camera;
        }
        camera
    }

    pub fn is_flying(&self) -> bool {
        self.flight.is_some()
    }

    /// Markers pulse continuously, so a scene with one keeps the frame loop alive.
    pub fn is_animating(&self) -> bool {
        self.is_flying() || !self.markers.is_empty()
    }

    pub fn set_heat(&mut self, view: RegionView) {
        self.heat = Some(view);
    }

    pub fn heat(&self) -> Option<&RegionView> {
        self.heat.as_ref()
    }

    pub fn add_marker(&mut self, marker: HighlightMarker) -> MarkerId {
        self.next_marker += 1;
        self.markers.push((self.next_marker, marker));
        self.next_marker
    }

    pub fn remove_marker(&mut self, id: MarkerId) {
        self.markers.retain(|(marker_id, _)| *marker_id != id);
    }

    pub fn markers(&self) -> impl Iterator<Item = &HighlightMarker> {
        self.markers.iter().map(|(_, marker)| marker)
    }
}

/// [`MapSurface`] backed by a [`MapScene`] and repainted through the frame scheduler.
pub struct CanvasSurface {
    scene: Rc<RefCell<MapScene>>,
    scheduler: Rc<FrameScheduler>,
}

impl CanvasSurface {
    pub fn new(scene: Rc<RefCell<MapScene>>, scheduler: Rc<FrameScheduler>) -> Self {
        Self { scene, scheduler }
    }
}

impl MapSurface for CanvasSurface {
    fn fly_to(&mut self, target: CameraTarget, transition: Transition) {
        self.scene.borrow_mut().fly_to(target, transition, now_ms());
        self.scheduler.mark_dirty();
    }

    fn set_heat(&mut self, view: &RegionView) {
        self.scene.borrow_mut().set_heat(view.clone());
        self.scheduler.mark_dirty();
    }

    fn add_marker(&mut self, marker: &HighlightMarker) -> MarkerId {
        let id = self.scene.borrow_mut().add_marker(marker.clone());
        self.scheduler.mark_dirty();
        id
    }

    fn remove_marker(&mut self, id: MarkerId) {
        self.scene.borrow_mut().remove_marker(id);
        self.scheduler.mark_dirty();
    }
}

/// Resize `canvas` to its container at device pixel ratio and paint one frame.
/// Returns `true` while another frame is needed, or `None` when the canvas
/// has no usable size or context yet.
pub fn render_frame(
    canvas: &HtmlCanvasElement,
    scene: &mut MapScene,
    style: MapStyle,
    now: f64,
) -> Option<bool> {
    let parent = canvas.parent_element()?;
    let w = parent.client_width() as f64;
    let h = parent.client_height() as f64;
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    let dpr = web_sys::window()
        .map(|win| win.device_pixel_ratio())
        .unwrap_or(1.0)
        .max(1.0);
    let pw = (w * dpr).round() as u32;
    let ph = (h * dpr).round() as u32;
    if canvas.width() != pw || canvas.height() != ph {
        canvas.set_width(pw);
        canvas.set_height(ph);
    }

    let ctx = canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())?;
    ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0).ok();

    let vp = scene.advance(now);
    let palette = style.palette();

    ctx.set_fill_style_str(palette.background);
    ctx.fill_rect(0.0, 0.0, w, h);
    draw_graticule(&ctx, &vp, w, h, &palette);
    if let Some(view) = scene.heat() {
        draw_heat(&ctx, &vp, view, w, h);
    }
    for marker in scene.markers() {
        draw_marker(&ctx, &vp, marker, w, h, now, &palette);
    }
    draw_scale_bar(&ctx, &vp, h, &palette);
    draw_watermark(&ctx, w, &palette);

    Some(scene.is_animating())
}

fn graticule_step(zoom: f64) -> f64 {
    if zoom < 8.0 {
        1.0
    } else if zoom < 10.0 {
        0.5
    } else if zoom < 12.0 {
        0.1
    } else {
        0.05
    }
}

fn draw_graticule(ctx: &CanvasRenderingContext2d, vp: &MapViewport, w: f64, h: f64, palette: &Palette) {
    let step = graticule_step(vp.zoom);
    let (sw, ne) = vp.visible_bounds(w, h);

    ctx.set_stroke_style_str(palette.grid);
    ctx.set_line_width(1.0);
    ctx.set_fill_style_str(palette.label);
    ctx.set_font("10px 'JetBrains Mono', monospace");

    let mut lng = (sw.lng / step).floor() * step;
    while lng <= ne.lng {
        let (x, _) = vp.to_screen(vp.center.lat, lng, w, h);
        ctx.begin_path();
        ctx.move_to(x, 0.0);
        ctx.line_to(x, h);
        ctx.stroke();
        ctx.fill_text(&format!("{lng:.2}°E"), x + 3.0, 12.0).ok();
        lng += step;
    }

    let mut lat = (sw.lat / step).floor() * step;
    while lat <= ne.lat {
        let (_, y) = vp.to_screen(lat, vp.center.lng, w, h);
        ctx.begin_path();
        ctx.move_to(0.0, y);
        ctx.line_to(w, y);
        ctx.stroke();
        ctx.fill_text(&format!("{lat:.2}°N"), 3.0, y - 3.0).ok();
        lat += step;
    }
}

fn draw_heat(ctx: &CanvasRenderingContext2d, vp: &MapViewport, view: &RegionView, w: f64, h: f64) {
    let radius = blob_radius(&view.style);
    let max_value = view.max_value();

    for point in &view.points {
        let (x, y) = vp.to_screen(point.lat, point.lng, w, h);
        if x < -radius || y < -radius || x > w + radius || y > h + radius {
            continue;
        }
        let intensity = janconnect_shared::heat::intensity(point.value, max_value);
        let color = view.style.color_at(intensity);
        let alpha = blob_alpha(point.value, max_value);

        let Ok(gradient) = ctx.create_radial_gradient(x, y, 0.0, x, y, radius) else {
            continue;
        };
        let solid = (view.style.radius / radius).clamp(0.0, 1.0) as f32 * 0.5;
        gradient.add_color_stop(0.0, &rgba(color, alpha)).ok();
        gradient.add_color_stop(solid, &rgba(color, alpha * 0.8)).ok();
        gradient.add_color_stop(1.0, &rgba(color, 0.0)).ok();
        ctx.set_fill_style_canvas_gradient(&gradient);
        ctx.begin_path();
        ctx.arc(x, y, radius, 0.0, TAU).ok();
        ctx.fill();
    }
}

fn draw_marker(
    ctx: &CanvasRenderingContext2d,
    vp: &MapViewport,
    marker: &HighlightMarker,
    w: f64,
    h: f64,
    now: f64,
    palette: &Palette,
) {
    let LatLng { lat, lng } = marker.position;
    let (x, y) = vp.to_screen(lat, lng, w, h);
    let phase = pulse_phase(now, PULSE_PERIOD_MS);

    // Expanding ring
    ctx.begin_path();
    ctx.arc(x, y, 8.0 + 22.0 * phase, 0.0, TAU).ok();
    ctx.set_stroke_style_str(&rgba((255, 59, 48), 1.0 - phase));
    ctx.set_line_width(2.0);
    ctx.stroke();

    ctx.begin_path();
    ctx.arc(x, y, 7.0, 0.0, TAU).ok();
    ctx.set_fill_style_str("#FF3B30");
    ctx.fill();
    ctx.set_stroke_style_str("#ffffff");
    ctx.set_line_width(2.0);
    ctx.stroke();

    ctx.set_font("600 12px 'Inter', sans-serif");
    let text_w = ctx
        .measure_text(&marker.title)
        .map(|m| m.width())
        .unwrap_or(0.0);
    let (bx, by) = (x - text_w / 2.0 - 6.0, y - 34.0);
    ctx.set_fill_style_str(palette.overlay);
    ctx.fill_rect(bx, by, text_w + 12.0, 18.0);
    ctx.set_fill_style_str(palette.overlay_text);
    ctx.fill_text(&marker.title, bx + 6.0, by + 13.0).ok();
}

fn draw_scale_bar(ctx: &CanvasRenderingContext2d, vp: &MapViewport, h: f64, palette: &Palette) {
    let (meters, px) = vp.scale_bar(SCALE_BAR_MAX_PX);
    if px <= 0.0 {
        return;
    }
    let (x, y) = (12.0, h - 16.0);
    ctx.set_stroke_style_str(palette.overlay_text);
    ctx.set_line_width(2.0);
    ctx.begin_path();
    ctx.move_to(x, y - 6.0);
    ctx.line_to(x, y);
    ctx.line_to(x + px, y);
    ctx.line_to(x + px, y - 6.0);
    ctx.stroke();
    ctx.set_fill_style_str(palette.overlay_text);
    ctx.set_font("10px 'JetBrains Mono', monospace");
    ctx.fill_text(&format_distance(meters), x + 4.0, y - 8.0).ok();
}

fn draw_watermark(ctx: &CanvasRenderingContext2d, w: f64, palette: &Palette) {
    ctx.set_font("600 11px 'Inter', sans-serif");
    ctx.set_fill_style_str(palette.label);
    let text = "Heatmap Visualization";
    let text_w = ctx.measure_text(text).map(|m| m.width()).unwrap_or(0.0);
    ctx.fill_text(text, w - text_w - 12.0, 20.0).ok();
}

/// Owns the frame loop for one canvas.
pub fn start_renderer(
    canvas: HtmlCanvasElement,
    scene: Rc<RefCell<MapScene>>,
    style: impl Fn() -> MapStyle + 'static,
    on_first_paint: impl Fn() + 'static,
) -> Rc<FrameScheduler> {
    let painted = std::cell::Cell::new(false);
    Rc::new(FrameScheduler::new(move |now| {
        let Some(more) = render_frame(&canvas, &mut scene.borrow_mut(), style(), now) else {
            return false;
        };
        if !painted.replace(true) {
            on_first_paint();
        }
        more
    }))
}
