use serde::{Deserialize, Serialize};

/// Kilometres per degree of latitude used by the equirectangular approximation.
pub const KM_PER_DEGREE: f64 = 111.0;

/// A (latitude, longitude) pair in degrees.
///
/// Serialized as a two-element `[lat, lng]` array, the shape the dataset uses
/// for region centers and bounding-box corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    pub fn in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

impl From<[f64; 2]> for LatLng {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<LatLng> for [f64; 2] {
    fn from(value: LatLng) -> Self {
        [value.lat, value.lng]
    }
}

/// Axis-aligned latitude/longitude rectangle, `[south_west, north_east]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[LatLng; 2]", into = "[LatLng; 2]")]
pub struct BoundingBox {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl BoundingBox {
    pub const fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.south_west.lat
            && lat <= self.north_east.lat
            && lng >= self.south_west.lng
            && lng <= self.north_east.lng
    }

    /// False when the south-west corner lies north or east of the north-east corner.
    pub fn is_ordered(&self) -> bool {
        self.south_west.lat <= self.north_east.lat && self.south_west.lng <= self.north_east.lng
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }
}

impl From<[LatLng; 2]> for BoundingBox {
    fn from(value: [LatLng; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<BoundingBox> for [LatLng; 2] {
    fn from(value: BoundingBox) -> Self {
        [value.south_west, value.north_east]
    }
}

/// Approximate ground distance in kilometres using an equirectangular
/// projection centred on `origin`'s latitude.
///
/// Good to a few percent over the few-hundred-kilometre radii the region
/// filter uses; not a substitute for a great-circle formula over long spans.
pub fn approx_distance_km(origin: LatLng, lat: f64, lng: f64) -> f64 {
    let d_lat = (lat - origin.lat) * KM_PER_DEGREE;
    let d_lng = (lng - origin.lng) * (KM_PER_DEGREE * origin.lat.to_radians().cos());
    (d_lat * d_lat + d_lng * d_lng).sqrt()
}
