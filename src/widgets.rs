use crate::models::Listing;

pub const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub url: String,
    pub background_size: &'static str,
    pub class: &'static str,
}

/// Image carousel configuration handed to the client-side slider
#[derive(Debug, Clone, PartialEq)]
pub struct Carousel {
    pub slides: Vec<Slide>,
    pub slides_per_view: u32,
    pub space_between: u32,
    pub navigation: bool,
    pub clickable_pagination: bool,
    pub draggable_scrollbar: bool,
}

impl Carousel {
    /// Active slides are letterboxed ("contain"), inactive ones cropped ("cover")
    pub fn for_listing(listing: &Listing, slider_active: bool) -> Self {
        let (background_size, class) = if slider_active {
            ("contain", "swiperSlideDivActive")
        } else {
            ("cover", "swiperSlideDiv")
        };

        let slides = listing
            .img_urls
            .iter()
            .map(|url| Slide {
                url: url.clone(),
                background_size,
                class,
            })
            .collect();

        Self {
            slides,
            slides_per_view: 1,
            space_between: 50,
            navigation: true,
            clickable_pagination: true,
            draggable_scrollbar: true,
        }
    }
}

/// Map pin for the listing location
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub center: (f64, f64),
    pub zoom: u8,
    pub scroll_wheel_zoom: bool,
    pub marker_label: String,
    pub tile_url: &'static str,
    pub attribution: &'static str,
}

impl MapView {
    pub fn for_listing(listing: &Listing, zoom: u8) -> Self {
        Self {
            center: (listing.geolocation.lat, listing.geolocation.lng),
            zoom,
            scroll_wheel_zoom: false,
            marker_label: listing.location.clone(),
            tile_url: TILE_URL,
            attribution: TILE_ATTRIBUTION,
        }
    }
}
