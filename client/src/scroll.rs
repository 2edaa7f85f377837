use std::cell::RefCell;
use std::rc::Rc;

use janconnect_shared::{IntersectionSample, IntersectionTracker};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{
    Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit,
};

pub const SECTION_SELECTOR: &str = ".scrollpoint";
pub const SECTION_ID_ATTR: &str = "data-id";

/// Browser `IntersectionObserver` feeding an [`IntersectionTracker`].
///
/// Dropping the binding disconnects the observer and the tracker, so no
/// visibility report arriving afterwards can change the active region.
pub struct SectionObserver {
    observer: IntersectionObserver,
    tracker: Rc<RefCell<IntersectionTracker>>,
    _callback: Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>,
}

impl SectionObserver {
    /// Observe every section under `scroller`, using the scroller as the
    /// intersection root.
    pub fn attach(scroller: &Element, tracker: IntersectionTracker) -> Result<Self, String> {
        let threshold = tracker.threshold();
        let tracker = Rc::new(RefCell::new(tracker));

        let tracker_cb = tracker.clone();
        let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
            move |entries: js_sys::Array, _observer: IntersectionObserver| {
                let samples: Vec<IntersectionSample> = entries
                    .iter()
                    .filter_map(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
                    .filter_map(|entry| {
                        let id = entry.target().get_attribute(SECTION_ID_ATTR)?;
                        Some(IntersectionSample::new(
                            id,
                            entry.intersection_ratio(),
                            entry.is_intersecting(),
                        ))
                    })
                    .collect();
                if samples.is_empty() {
                    return;
                }
                // A listener that re-enters the tracker would find it borrowed; skip
                // the batch rather than panic.
                let Ok(mut tracker) = tracker_cb.try_borrow_mut() else {
                    return;
                };
                tracker.observe(&samples);
            },
        );

        let init = IntersectionObserverInit::new();
        init.set_root(Some(scroller));
        init.set_threshold(&threshold.into());
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)
                .map_err(|e| format!("IntersectionObserver unavailable: {e:?}"))?;

        let sections = scroller
            .query_selector_all(SECTION_SELECTOR)
            .map_err(|e| format!("section query failed: {e:?}"))?;
        for i in 0..sections.length() {
            let Some(section) = sections
                .get(i)
                .and_then(|node| node.dyn_into::<Element>().ok())
            else {
                continue;
            };
            let Some(id) = section.get_attribute(SECTION_ID_ATTR) else {
                continue;
            };
            if tracker.borrow_mut().register(id) {
                observer.observe(&section);
            }
        }

        Ok(Self {
            observer,
            tracker,
            _callback: callback,
        })
    }

    pub fn section_count(&self) -> usize {
        self.tracker.borrow().registered_count()
    }
}

impl Drop for SectionObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
        if let Ok(mut tracker) = self.tracker.try_borrow_mut() {
            tracker.disconnect();
        }
    }
}
