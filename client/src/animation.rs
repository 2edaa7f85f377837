use std::f64::consts::PI;

use janconnect_shared::{CameraTarget, Easing, LatLng, Transition};

use crate::viewport::MapViewport;

/// An animated camera move between two viewports.
#[derive(Debug, Clone)]
pub struct CameraFlight {
    pub from: MapViewport,
    pub to: MapViewport,
    pub start_time: f64,
    pub duration: f64, // milliseconds
    pub easing: Easing,
}

impl CameraFlight {
    pub fn new(from: MapViewport, target: CameraTarget, transition: Transition, now: f64) -> Self {
        Self {
            from,
            to: MapViewport::new(target.center, target.zoom),
            start_time: now,
            duration: f64::from(transition.duration_ms),
            easing: transition.easing,
        }
    }

    pub fn is_finished(&self, now: f64) -> bool {
        now - self.start_time >= self.duration
    }

    /// Camera position at `now`. Long moves pull the zoom out mid-flight so the
    /// pan stays readable, then settle on the target zoom.
    pub fn viewport_at(&self, now: f64) -> MapViewport {
        if self.duration <= 0.0 || self.is_finished(now) {
            return self.to;
        }
        let t = ((now - self.start_time) / self.duration).clamp(0.0, 1.0);
        let e = self.easing.apply(t);

        let lat = self.from.center.lat + (self.to.center.lat - self.from.center.lat) * e;
        let lng = self.from.center.lng + (self.to.center.lng - self.from.center.lng) * e;

        let span_deg = (self.to.center.lat - self.from.center.lat)
            .hypot(self.to.center.lng - self.from.center.lng);
        let dip = (span_deg / 2.0).min(1.5);
        let zoom = self.from.zoom + (self.to.zoom - self.from.zoom) * e - dip * (PI * e).sin();

        MapViewport::new(LatLng::new(lat, lng), zoom)
    }
}

/// Pulse phase for the highlight marker, `0.0..1.0`, repeating every `period` ms.
pub fn pulse_phase(now: f64, period: f64) -> f64 {
    if period <= 0.0 {
        return 0.0;
    }
    (now.rem_euclid(period)) / period
}
