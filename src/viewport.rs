//! Static map presentation config and the live viewport
//!
//! Everything here is configuration handed to the rendering surface; none of
//! it depends on the dataset.

use serde::Serialize;

use crate::models::Coordinates;

/// Southwest / northeast corners of the pan box
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub south_west: Coordinates,
    pub north_east: Coordinates,
}

impl Bounds {
    pub fn contains(&self, point: Coordinates) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lon >= self.south_west.lon
            && point.lon <= self.north_east.lon
    }

    /// Nearest point inside the box
    pub fn clamp(&self, point: Coordinates) -> Coordinates {
        Coordinates::new(
            point.lat.clamp(self.south_west.lat, self.north_east.lat),
            point.lon.clamp(self.south_west.lon, self.north_east.lon),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TileLayer {
    pub url_template: &'static str,
    pub attribution: &'static str,
}

/// Pixel geometry of a marker pin image
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkerIcon {
    pub icon: &'static str,
    pub size: [i32; 2],
    pub anchor: [i32; 2],
    pub popup_anchor: [i32; 2],
}

const PIN_SIZE: [i32; 2] = [25, 41];
const PIN_ANCHOR: [i32; 2] = [12, 41];
const PIN_POPUP_ANCHOR: [i32; 2] = [1, -34];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapOptions {
    pub center: Coordinates,
    pub zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub max_bounds: Bounds,
    pub max_bounds_viscosity: f64,
    pub tiles: TileLayer,
    pub capital_icon: MarkerIcon,
    pub selected_icon: MarkerIcon,
}

/// New England framing; the pan box spans Connecticut to the top of Maine.
pub static NEW_ENGLAND: MapOptions = MapOptions {
    center: Coordinates::new(43.7, -70.5),
    zoom: 7,
    min_zoom: 6,
    max_zoom: 10,
    max_bounds: Bounds {
        south_west: Coordinates::new(40.9, -75.5),
        north_east: Coordinates::new(47.5, -66.8),
    },
    max_bounds_viscosity: 1.0,
    tiles: TileLayer {
        url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
        attribution: "&copy; OpenStreetMap contributors",
    },
    capital_icon: MarkerIcon {
        icon: "capital",
        size: PIN_SIZE,
        anchor: PIN_ANCHOR,
        popup_anchor: PIN_POPUP_ANCHOR,
    },
    selected_icon: MarkerIcon {
        icon: "selected",
        size: PIN_SIZE,
        anchor: PIN_ANCHOR,
        popup_anchor: PIN_POPUP_ANCHOR,
    },
};

/// Center and zoom currently shown by the surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub center: Coordinates,
    pub zoom: u8,
}

impl Viewport {
    pub fn initial(options: &MapOptions) -> Self {
        Self {
            center: options.center,
            zoom: options.zoom,
        }
    }

    /// Viewport the surface asked for, held inside the configured limits.
    /// Non-finite centers keep the current one.
    pub fn constrained(&self, options: &MapOptions, center: Coordinates, zoom: u8) -> Self {
        let center = if center.is_finite() {
            options.max_bounds.clamp(center)
        } else {
            self.center
        };
        Self {
            center,
            zoom: zoom.clamp(options.min_zoom, options.max_zoom),
        }
    }
}
