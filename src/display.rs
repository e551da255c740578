use crate::models::Listing;

/// Shortest form of a number: integers without a fractional part
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Avoids printing "-0"
        return "0".to_string();
    }
    format!("{}", value)
}

/// Inserts a comma every three digits of the integer part
pub fn group_thousands(value: f64) -> String {
    let raw = format_number(value);
    let (sign, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw.as_str()),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

pub fn formatted_price(listing: &Listing) -> String {
    group_thousands(listing.display_price())
}

/// Heading line, e.g. "Beachfront Condo - $1,500"
pub fn price_heading(listing: &Listing) -> String {
    format!("{} - ${}", listing.name, formatted_price(listing))
}

pub fn discount_label(listing: &Listing) -> Option<String> {
    listing
        .discount_amount()
        .map(|amount| format!("${} discount", format_number(amount)))
}

fn room_label(count: f64, singular: &str) -> String {
    if count > 1.0 {
        format!("{} {}s", format_number(count), singular)
    } else {
        format!("1 {}", singular)
    }
}

pub fn bedroom_label(listing: &Listing) -> String {
    room_label(listing.bedrooms, "Bedroom")
}

pub fn bathroom_label(listing: &Listing) -> String {
    room_label(listing.bathrooms, "Bathroom")
}

pub fn type_label(listing: &Listing) -> String {
    format!("For {}", listing.listing_type.label())
}

pub fn amenities(listing: &Listing) -> Vec<&'static str> {
    let mut items = Vec::new();
    if listing.parking {
        items.push("Parking Spot");
    }
    if listing.furnished {
        items.push("Furnished");
    }
    items
}
