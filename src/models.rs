use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::errors::ListingError;

/// Collection that holds listing documents in every store backend
pub const LISTINGS_COLLECTION: &str = "listings";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Rent,
    Sale,
}

impl ListingType {
    pub fn label(&self) -> &'static str {
        match self {
            ListingType::Rent => "Rent",
            ListingType::Sale => "Sale",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Geolocation {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub name: String,
    pub img_urls: Vec<String>,
    pub offer: bool,
    pub regular_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discounted_price: Option<f64>, // Only meaningful when `offer` is set
    pub location: String,
    #[serde(rename = "type")]
    pub listing_type: ListingType,
    pub bedrooms: f64,
    pub bathrooms: f64,
    pub parking: bool,
    pub furnished: bool,
    pub geolocation: Geolocation,
    pub user_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Listing {
    /// Decode a raw store document and check it is fit for display
    pub fn from_document(document: serde_json::Value) -> Result<Self, ListingError> {
        let listing: Listing = serde_json::from_value(document)
            .map_err(|e| ListingError::InvalidListingData(e.to_string()))?;
        listing.validate()?;
        Ok(listing)
    }

    /// Rejects records that would otherwise display NaN, negative or inverted prices
    pub fn validate(&self) -> Result<(), ListingError> {
        let invalid = |reason: String| Err(ListingError::InvalidListingData(reason));

        if self.img_urls.is_empty() {
            return invalid("imgUrls must contain at least one image".to_string());
        }

        if !self.regular_price.is_finite() || self.regular_price < 0.0 {
            return invalid(format!("regularPrice {} is not a non-negative number", self.regular_price));
        }

        if self.offer {
            match self.discounted_price {
                None => return invalid("discountedPrice is required when offer is set".to_string()),
                Some(price) if !price.is_finite() || price < 0.0 => {
                    return invalid(format!("discountedPrice {} is not a non-negative number", price));
                }
                Some(price) if price >= self.regular_price => {
                    return invalid(format!(
                        "discountedPrice {} must be lower than regularPrice {}",
                        price, self.regular_price
                    ));
                }
                Some(_) => {}
            }
        }

        if !self.bedrooms.is_finite() || !self.bathrooms.is_finite() {
            return invalid("bedrooms and bathrooms must be numbers".to_string());
        }

        let Geolocation { lat, lng } = self.geolocation;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return invalid(format!("geolocation ({}, {}) is out of range", lat, lng));
        }

        Ok(())
    }

    /// Price shown in the heading: the discounted one while an offer runs
    pub fn display_price(&self) -> f64 {
        match (self.offer, self.discounted_price) {
            (true, Some(price)) => price,
            _ => self.regular_price,
        }
    }

    pub fn discount_amount(&self) -> Option<f64> {
        if !self.offer {
            return None;
        }
        self.discounted_price.map(|price| self.regular_price - price)
    }

    pub fn is_owned_by(&self, uid: Option<&str>) -> bool {
        uid == Some(self.user_ref.as_str())
    }
}
