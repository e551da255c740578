use crate::context::{contact_link, AuthSnapshot};
use crate::display;
use crate::models::Listing;
use crate::view::{LoadPhase, ViewState};
use crate::widgets::{Carousel, MapView};
use maud::{html, Markup, DOCTYPE};

const SHARE_ICON: &str = "/assets/svg/shareIcon.svg";

/// Renders the page body for the current load phase
pub fn render_page(state: &ViewState, auth: &AuthSnapshot, map_zoom: u8) -> Markup {
    match &state.phase {
        LoadPhase::Loading => spinner(),
        LoadPhase::NotFound => notice(
            "Listing not found",
            &format!("No listing exists with id {}.", state.route.listing_id),
        ),
        LoadPhase::Error(reason) => notice("Could not load listing", reason),
        LoadPhase::Found(listing) => listing_page(state, listing, auth, map_zoom),
    }
}

/// Wraps the page in a full HTML document
pub fn render_document(state: &ViewState, auth: &AuthSnapshot, map_zoom: u8) -> Markup {
    let title = state
        .phase
        .listing()
        .map(|listing| listing.name.clone())
        .unwrap_or_else(|| "Listing".to_string());

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
            }
            body {
                (render_page(state, auth, map_zoom))
            }
        }
    }
}

fn spinner() -> Markup {
    html! {
        div class="loadingSpinnerContainer" {
            div class="loadingSpinner" {}
        }
    }
}

fn notice(heading: &str, message: &str) -> Markup {
    html! {
        main class="pageNotice" {
            h2 { (heading) }
            p { (message) }
        }
    }
}

fn render_carousel(carousel: &Carousel) -> Markup {
    html! {
        div class="swiper"
            data-slides-per-view=(carousel.slides_per_view)
            data-space-between=(carousel.space_between)
            data-navigation=(carousel.navigation.to_string())
            data-pagination-clickable=(carousel.clickable_pagination.to_string())
            data-scrollbar-draggable=(carousel.draggable_scrollbar.to_string()) {
            div class="swiper-wrapper" {
                @for (index, slide) in carousel.slides.iter().enumerate() {
                    div class="swiper-slide" data-index=(index) {
                        div class=(slide.class)
                            data-action="toggle-slider"
                            style=(format!(
                                "background: url(\"{}\") center no-repeat; background-size: {};",
                                css_string(&slide.url), slide.background_size
                            )) {}
                    }
                }
            }
        }
    }
}

/// Escapes a value for a double-quoted CSS string
fn css_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' | '\r' | '\u{c}' => {}
            _ => escaped.push(c),
        }
    }
    escaped
}

fn render_map(map: &MapView) -> Markup {
    let (lat, lng) = map.center;
    html! {
        div class="map-container"
            data-lat=(lat)
            data-lng=(lng)
            data-zoom=(map.zoom)
            data-scroll-wheel-zoom=(map.scroll_wheel_zoom.to_string())
            data-tile-url=(map.tile_url)
            data-attribution=(map.attribution) {
            div class="map-marker" data-lat=(lat) data-lng=(lng) {
                div class="map-popup" { (map.marker_label) }
            }
        }
    }
}

fn listing_page(state: &ViewState, listing: &Listing, auth: &AuthSnapshot, map_zoom: u8) -> Markup {
    html! {
        main {
            (render_carousel(&Carousel::for_listing(listing, state.slider_active)))

            div class="shareIconDiv" data-action="copy-share-link" data-share-url=(state.route.page_url) {
                img src=(SHARE_ICON) alt="share icon";
            }

            @if state.share_link_copied {
                p class="linkCopied" { "Link Copied!" }
            }

            div class="listingDetails" {
                p class="listingName" { (display::price_heading(listing)) }
                p class="listingLocation" { (listing.location) }
                p class="listingType" { (display::type_label(listing)) }
                @if let Some(discount) = display::discount_label(listing) {
                    p class="discountPrice" { (discount) }
                }
                ul class="listingDetailsList" {
                    li { (display::bedroom_label(listing)) }
                    li { (display::bathroom_label(listing)) }
                    @for amenity in display::amenities(listing) {
                        li { (amenity) }
                    }
                }

                p class="listingLocationTitle" { "Location" }
                (render_map(&MapView::for_listing(listing, map_zoom)))

                @if auth.can_contact_owner(listing) {
                    a class="primaryButton" href=(contact_link(listing)) { "Contact Landlord" }
                }
            }
        }
    }
}
