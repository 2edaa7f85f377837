use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use gloo_storage::Storage;
use janconnect_shared::{
    HeatDataset, IntersectionTracker, MapSyncConfig, MapSynchronizer, PriorityTier, Region,
    Subscription, active_region_cell,
};
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, HtmlCanvasElement};

use crate::heat::{DataSource, load_heatmap};
use crate::map_canvas::{CanvasSurface, MapScene, MapStyle, start_renderer};
use crate::render_loop::{FrameScheduler, now_ms};
use crate::scroll::SectionObserver;

const SETTINGS_KEY: &str = "janconnect_heatmap_settings";

#[derive(serde::Serialize, serde::Deserialize, Default)]
#[serde(default)]
struct Settings {
    map_style: MapStyle,
}

/// Dataset and sync settings the page was started with.
#[derive(Clone)]
pub(crate) struct LoadedHeatmap {
    pub dataset: Arc<HeatDataset>,
    pub config: MapSyncConfig,
    pub source: DataSource,
}

#[derive(Clone, Copy)]
pub(crate) struct ActiveId(pub RwSignal<Option<String>>);
#[derive(Clone, Copy)]
pub(crate) struct SelectedStyle(pub RwSignal<MapStyle>);
#[derive(Clone, Copy)]
pub(crate) struct MapReady(pub RwSignal<bool>);

/// Browser resources tying the scroll column to the canvas map.
///
/// Field order matters on drop: the observer goes first so no late
/// visibility report reaches a half-torn-down synchronizer.
struct HeatmapBinding {
    observer: SectionObserver,
    _subscription: Subscription,
    scene: Rc<RefCell<MapScene>>,
    scheduler: Rc<FrameScheduler>,
}

thread_local! {
    static HEATMAP_BINDING: RefCell<Option<HeatmapBinding>> = const { RefCell::new(None) };
}

fn with_binding(f: impl FnOnce(&HeatmapBinding)) {
    HEATMAP_BINDING.with(|slot| {
        if let Some(binding) = slot.borrow().as_ref() {
            f(binding);
        }
    });
}

fn release_binding() {
    let old = HEATMAP_BINDING.with(|slot| slot.borrow_mut().take());
    drop(old);
}

impl HeatmapBinding {
    fn bind(
        scroller: &Element,
        canvas: HtmlCanvasElement,
        loaded: &LoadedHeatmap,
        active: RwSignal<Option<String>>,
        map_style: RwSignal<MapStyle>,
        map_ready: RwSignal<bool>,
    ) -> Result<Self, String> {
        let scene = Rc::new(RefCell::new(MapScene::new()));
        let scheduler = start_renderer(
            canvas,
            scene.clone(),
            move || map_style.get_untracked(),
            move || map_ready.set(true),
        );

        let surface = CanvasSurface::new(scene.clone(), scheduler.clone());
        let mut synchronizer = MapSynchronizer::new(surface, loaded.dataset.clone(), &loaded.config);
        synchronizer.show_all();
        let synchronizer = Rc::new(RefCell::new(synchronizer));

        let (writer, reader) = active_region_cell();
        let subscription = reader.subscribe(move |id| {
            active.set(id.map(str::to_string));
            if let Ok(mut synchronizer) = synchronizer.try_borrow_mut() {
                synchronizer.apply(id);
            }
        });

        let tracker = IntersectionTracker::new(writer, loaded.config.threshold());
        let observer = SectionObserver::attach(scroller, tracker)?;
        web_sys::console::info_1(
            &format!(
                "heatmap_sections={} threshold={:.2} source={:?}",
                observer.section_count(),
                loaded.config.threshold(),
                loaded.source
            )
            .into(),
        );
        scheduler.mark_dirty();

        Ok(Self {
            observer,
            _subscription: subscription,
            scene,
            scheduler,
        })
    }

    fn repaint(&self) {
        self.scheduler.mark_dirty();
    }

    fn zoom_by(&self, delta: f64) {
        if let Ok(mut scene) = self.scene.try_borrow_mut() {
            scene.zoom_by(delta, now_ms());
        }
        self.scheduler.mark_dirty();
    }
}

/// Root component: loads the heatmap, then hands over to [`ScrollHeatmap`].
#[component]
pub fn App() -> impl IntoView {
    let heatmap: RwSignal<Option<LoadedHeatmap>> = RwSignal::new(None);
    let load_error: RwSignal<Option<String>> = RwSignal::new(None);
    let active: RwSignal<Option<String>> = RwSignal::new(None);
    let saved: Settings = gloo_storage::LocalStorage::get(SETTINGS_KEY).unwrap_or_default();
    let map_style: RwSignal<MapStyle> = RwSignal::new(saved.map_style);
    let map_ready: RwSignal<bool> = RwSignal::new(false);

    provide_context(ActiveId(active));
    provide_context(SelectedStyle(map_style));
    provide_context(MapReady(map_ready));

    Effect::new(move || {
        let settings = Settings {
            map_style: map_style.get(),
        };
        let _ = gloo_storage::LocalStorage::set(SETTINGS_KEY, &settings);
    });

    spawn_local(async move {
        match load_heatmap().await {
            Ok((dataset, config, source)) => heatmap.set(Some(LoadedHeatmap {
                dataset: Arc::new(dataset),
                config,
                source,
            })),
            Err(e) => {
                web_sys::console::error_1(&format!("Heatmap unavailable: {e}").into());
                load_error.set(Some(e));
            }
        }
    });

    view! {
        <div style="position: relative; width: 100%; height: 100%; background: #0c0e17; color: #e2e0d8; font-family: 'Inter', sans-serif;">
            {move || match (heatmap.get(), load_error.get()) {
                (Some(loaded), _) => view! { <ScrollHeatmap loaded=loaded /> }.into_any(),
                (None, Some(err)) => view! {
                    <div style="padding: 2rem; color: #ff6b60;">
                        {format!("Heatmap unavailable: {err}")}
                    </div>
                }.into_any(),
                (None, None) => view! { <LoadingIndicator label="Loading heatmap data..." /> }.into_any(),
            }}
        </div>
    }
}

/// Two-column page: narrative sections on the left drive the map on the right.
#[component]
fn ScrollHeatmap(loaded: LoadedHeatmap) -> impl IntoView {
    let ActiveId(active) = expect_context();
    let SelectedStyle(map_style) = expect_context();
    let MapReady(map_ready) = expect_context();

    let scroller_ref = NodeRef::<leptos::html::Div>::new();
    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let regions: Vec<Region> = loaded.dataset.regions.clone();
    let dots = regions.clone();

    Effect::new(move || {
        let (Some(scroller), Some(canvas)) = (scroller_ref.get(), canvas_ref.get()) else {
            return;
        };
        release_binding();
        map_ready.set(false);
        match HeatmapBinding::bind(&scroller, canvas, &loaded, active, map_style, map_ready) {
            Ok(binding) => HEATMAP_BINDING.with(|slot| *slot.borrow_mut() = Some(binding)),
            Err(e) => web_sys::console::warn_1(&format!("Heatmap binding failed: {e}").into()),
        }
    });
    on_cleanup(release_binding);

    Effect::new(move || {
        map_style.track();
        with_binding(HeatmapBinding::repaint);
    });

    view! {
        <div style="display: flex; width: 100%; height: 100%;">
            <div
                node_ref=scroller_ref
                class="scroll-col"
                style="flex: 0 0 38%; max-width: 520px; height: 100%; overflow-y: auto; padding: 0 1.5rem; box-sizing: border-box;"
            >
                {regions
                    .into_iter()
                    .map(|region| view! { <RegionSection region=region /> })
                    .collect_view()}
                <div style="height: 40vh;" />
            </div>
            <div class="map-col" style="position: relative; flex: 1 1 auto; height: 100%; overflow: hidden;">
                <canvas node_ref=canvas_ref style="display: block; width: 100%; height: 100%;" />
                <StyleSelector />
                <ZoomControls />
                <IntensityLegend />
                <PriorityLegend />
                <Timeline regions=dots />
                {move || {
                    if map_ready.get() {
                        ().into_any()
                    } else {
                        view! { <LoadingIndicator label="Loading map..." /> }.into_any()
                    }
                }}
            </div>
        </div>
    }
}

#[component]
fn RegionSection(region: Region) -> impl IntoView {
    let ActiveId(active) = expect_context();
    let id = region.id.clone();
    let is_active = Memo::new(move |_| active.with(|a| a.as_deref() == Some(id.as_str())));

    view! {
        <section
            class="scrollpoint"
            id=region.id.clone()
            data-id=region.id.clone()
            style="min-height: 80vh; margin: 1.5rem 0; padding: 1.5rem; border-radius: 8px; background: #13161f; box-sizing: border-box; display: flex; flex-direction: column; justify-content: center; transition: border-color 0.2s;"
            style:border=move || if is_active.get() { "1px solid rgba(255,255,255,0.3)" } else { "1px solid transparent" }
        >
            <h2 style="margin: 0 0 0.75rem; font-size: 1.4rem;">{region.title.clone()}</h2>
            <p style="margin: 0; line-height: 1.6; color: #b8b6ae;">{region.narrative.clone()}</p>
            <div style="margin-top: 1rem; opacity: 0.85;">
                <small>{region.center_label()}</small>
            </div>
        </section>
    }
}

#[component]
fn StyleSelector() -> impl IntoView {
    let SelectedStyle(map_style) = expect_context();

    view! {
        <div style="position: absolute; top: 12px; left: 12px; z-index: 5; display: flex; gap: 4px; background: rgba(19,22,31,0.85); padding: 4px; border-radius: 6px; border: 1px solid #282c3e;">
            {MapStyle::ALL
                .into_iter()
                .map(|style| {
                    view! {
                        <button
                            title=format!("{} Map", style.label())
                            style="border: none; border-radius: 4px; padding: 4px 10px; cursor: pointer; font-size: 0.75rem;"
                            style:background=move || if map_style.get() == style { "#f5c542" } else { "transparent" }
                            style:color=move || if map_style.get() == style { "#13161f" } else { "#e2e0d8" }
                            on:click=move |_| map_style.set(style)
                        >
                            {style.label()}
                        </button>
                    }
                })
                .collect_view()}
        </div>
    }
}

#[component]
fn ZoomControls() -> impl IntoView {
    let button_style = "width: 30px; height: 30px; border: 1px solid #282c3e; background: #13161f; color: #e2e0d8; cursor: pointer; font-size: 1rem; line-height: 1;";
    view! {
        <div style="position: absolute; right: 12px; bottom: 12px; z-index: 5; display: flex; flex-direction: column; gap: 2px;">
            <button title="Zoom in" style=button_style on:click=move |_| with_binding(|b| b.zoom_by(1.0))>"+"</button>
            <button title="Zoom out" style=button_style on:click=move |_| with_binding(|b| b.zoom_by(-1.0))>"\u{2212}"</button>
        </div>
    }
}

#[component]
fn IntensityLegend() -> impl IntoView {
    let bar = format!(
        "height: 10px; border-radius: 5px; margin-top: 6px; background: linear-gradient(to right, {}, {}, {});",
        PriorityTier::Low.color_hex(),
        PriorityTier::Medium.color_hex(),
        PriorityTier::High.color_hex()
    );
    view! {
        <div class="legend" style="position: absolute; left: 12px; bottom: 44px; z-index: 5; width: 160px; background: rgba(19,22,31,0.85); padding: 8px 10px; border-radius: 6px;">
            <div style="font-size: 13px; font-weight: 600;">"Activity Intensity"</div>
            <div style=bar />
            <div style="display: flex; justify-content: space-between; margin-top: 6px;">
                <span style="font-size: 11px;">"Low"</span>
                <span style="font-size: 11px;">"High"</span>
            </div>
        </div>
    }
}

#[component]
fn PriorityLegend() -> impl IntoView {
    view! {
        <div class="priority-legend" style="position: absolute; right: 12px; top: 12px; z-index: 5; background: rgba(19,22,31,0.85); padding: 8px 10px; border-radius: 6px;">
            <div style="font-size: 13px; font-weight: 600; margin-bottom: 8px;">"Priority"</div>
            {PriorityTier::ALL
                .into_iter()
                .map(|tier| {
                    view! {
                        <div style="display: flex; align-items: center; gap: 6px; font-size: 12px; margin-top: 4px;">
                            <div style=format!("width: 10px; height: 10px; border-radius: 50%; background-color: {};", tier.color_hex()) />
                            <span>{tier.legend_label()}</span>
                        </div>
                    }
                })
                .collect_view()}
        </div>
    }
}

/// Center a region's section inside the scroll column.
fn scroll_to_section(id: &str) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let Ok(Some(scroll_el)) = document.query_selector(".scroll-col") else {
        return;
    };
    let Some(section) = document.get_element_by_id(id) else {
        return;
    };
    let scroll_rect = scroll_el.get_bounding_client_rect();
    let rect = section.get_bounding_client_rect();
    let delta = (rect.top() + rect.height() / 2.0) - (scroll_rect.top() + scroll_rect.height() / 2.0);
    scroll_el.set_scroll_top(scroll_el.scroll_top() + delta.round() as i32);
}

/// One dot per region; the active region's dot is highlighted.
#[component]
fn Timeline(regions: Vec<Region>) -> impl IntoView {
    let ActiveId(active) = expect_context();

    view! {
        <div class="timeline" style="position: absolute; left: 50%; bottom: 14px; transform: translateX(-50%); z-index: 5; display: flex; gap: 8px;">
            {regions
                .into_iter()
                .map(|region| {
                    let id = region.id.clone();
                    let is_active = Memo::new(move |_| active.with(|a| a.as_deref() == Some(id.as_str())));
                    let target = region.id.clone();
                    view! {
                        <div
                            class="dot"
                            title=region.title.clone()
                            style="width: 10px; height: 10px; border-radius: 50%; cursor: pointer; transition: transform 0.2s, background 0.2s;"
                            style:background=move || if is_active.get() { "#ffffff" } else { "rgba(255,255,255,0.35)" }
                            style:transform=move || if is_active.get() { "scale(1.4)" } else { "scale(1)" }
                            on:click=move |_| scroll_to_section(&target)
                        />
                    }
                })
                .collect_view()}
        </div>
    }
}

#[component]
fn LoadingIndicator(#[prop(into)] label: String) -> impl IntoView {
    view! {
        <div class="map-loading" style="position: absolute; inset: 0; z-index: 20; display: flex; flex-direction: column; align-items: center; justify-content: center; gap: 10px; background: rgba(12,14,23,0.7); font-size: 0.85rem;">
            <div class="loading-spinner" style="width: 28px; height: 28px; border: 3px solid rgba(255,255,255,0.2); border-top-color: #f5c542; border-radius: 50%;" />
            <span>{label}</span>
        </div>
    }
}
