//! Price aggregation
//!
//! Composes the selection stores and a base price into one breakdown. The
//! product page passes `include_consultation = false` so an un-booked
//! consultation never shows up there; cart and checkout pass `true`.

use crate::domain::selection::{ConsultationStore, CustomizationStore, DeliveryStore};
use crate::domain::value_objects::Naira;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub base_price: Naira,
    pub customization_total: Naira,
    pub delivery_total: Naira,
    pub consultation_price: Naira,
    pub total_price: Naira,
    pub has_customization: bool,
}

pub fn compute_breakdown(
    base_price: Naira,
    customization_total: Naira,
    delivery_total: Naira,
    consultation_price: Naira,
    include_consultation: bool,
) -> PriceBreakdown {
    let consultation_price = if include_consultation { consultation_price } else { Naira::ZERO };
    PriceBreakdown {
        base_price,
        customization_total,
        delivery_total,
        consultation_price,
        total_price: base_price + customization_total + delivery_total + consultation_price,
        has_customization: !customization_total.is_zero(),
    }
}

/// Breakdown of whatever the stores currently hold. The base price comes from
/// the customization parent.
pub fn breakdown_for_selections(
    customization: &CustomizationStore,
    delivery: &DeliveryStore,
    consultation: &ConsultationStore,
    include_consultation: bool,
) -> PriceBreakdown {
    compute_breakdown(
        customization.base_price(),
        customization.customization_total(),
        delivery.total_price(),
        consultation.price(),
        include_consultation,
    )
}
