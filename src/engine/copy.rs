//! Human-readable copy per status transition, with distinct wording for the
//! customer-facing and owner-facing audiences. Unknown statuses fall back to
//! a generic template so new states degrade gracefully.

use crate::models::notification::NotificationType;

/// Customer-facing (also shown to the bound delivery partner) copy for a
/// status label.
pub fn customer_copy(order_id: u64, status: &str) -> (String, String) {
    match status {
        "rejected" => (
            "Order Rejected".to_string(),
            "Sorry, the restaurant cannot fulfill your order right now.".to_string(),
        ),
        "accepted" => (
            "Order Confirmed! 🎉".to_string(),
            format!("Restaurant has accepted your order #{order_id}."),
        ),
        "preparing" => (
            "Chef is preparing your food 👨‍🍳".to_string(),
            "Your delicious meal is being cooked with care.".to_string(),
        ),
        "ready" => (
            "Food is ready! 🛍️".to_string(),
            "Your order is packed and waiting for the delivery partner.".to_string(),
        ),
        "picked_up" => (
            "Partner is on the way! 🛵".to_string(),
            "Your delivery partner has picked up your order and is coming to you.".to_string(),
        ),
        "delivered" => (
            "Order Delivered! 🍽️".to_string(),
            "Enjoy your meal! Don't forget to rate your experience.".to_string(),
        ),
        other => (
            "Order Update".to_string(),
            format!("Your order #{order_id} is now {}.", other.replace('_', " ")),
        ),
    }
}

/// Owner-facing copy. A brand-new order gets its own announcement; every
/// later change is a plain status line.
pub fn owner_copy(order_id: u64, status: &str) -> (String, String, NotificationType) {
    if status == "new" {
        (
            "New Order Received! 🛍️".to_string(),
            format!("You have a new order #{order_id}."),
            NotificationType::NewOrder,
        )
    } else {
        (
            format!("Order #{order_id} Update"),
            format!("Order status changed to {status}"),
            NotificationType::OrderUpdate,
        )
    }
}

/// Copy for the dispatch round to each matched partner.
pub fn available_order_copy(order_id: u64) -> (String, String) {
    (
        format!("New Order #{order_id} Available!"),
        "A new order is available nearby. Tap to see details.".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::{available_order_copy, customer_copy, owner_copy};
    use crate::models::notification::NotificationType;

    #[test]
    fn known_statuses_have_distinct_copy() {
        let (accepted_title, accepted_message) = customer_copy(62, "accepted");
        assert!(accepted_title.contains("Confirmed"));
        assert!(accepted_message.contains("#62"));

        let (delivered_title, _) = customer_copy(62, "delivered");
        assert_ne!(accepted_title, delivered_title);
    }

    #[test]
    fn unknown_status_falls_back_to_generic_template() {
        let (title, message) = customer_copy(62, "reached_restaurant");
        assert_eq!(title, "Order Update");
        assert_eq!(message, "Your order #62 is now reached restaurant.");
    }

    #[test]
    fn owner_copy_distinguishes_new_orders() {
        let (_, _, new_type) = owner_copy(62, "new");
        assert_eq!(new_type, NotificationType::NewOrder);

        let (title, message, update_type) = owner_copy(62, "ready");
        assert_eq!(update_type, NotificationType::OrderUpdate);
        assert!(title.contains("#62"));
        assert!(message.contains("ready"));
    }

    #[test]
    fn available_copy_names_the_order() {
        let (title, _) = available_order_copy(62);
        assert!(title.contains("#62"));
    }
}
