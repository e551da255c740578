use crate::models::Listing;

/// Identity of the signed-in user at the time the page was built
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub uid: Option<String>,
}

impl AuthSnapshot {
    pub fn anonymous() -> Self {
        Self { uid: None }
    }

    pub fn signed_in(uid: &str) -> Self {
        Self { uid: Some(uid.to_string()) }
    }

    /// The contact link is hidden only from the listing's own owner
    pub fn can_contact_owner(&self, listing: &Listing) -> bool {
        !listing.is_owned_by(self.uid.as_deref())
    }
}

/// Route parameters and page address for one listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRoute {
    pub listing_id: String,
    pub page_url: String,
}

impl ListingRoute {
    pub fn new(base_url: &str, category: &str, listing_id: &str) -> Self {
        let page_url = format!(
            "{}/category/{}/{}",
            base_url.trim_end_matches('/'),
            category,
            urlencoding::encode(listing_id),
        );

        Self {
            listing_id: listing_id.to_string(),
            page_url,
        }
    }
}

/// Outbound link to the contact form for a listing's owner
pub fn contact_link(listing: &Listing) -> String {
    format!(
        "/contact/{}?listingName={}",
        urlencoding::encode(&listing.user_ref),
        urlencoding::encode(&listing.name),
    )
}
