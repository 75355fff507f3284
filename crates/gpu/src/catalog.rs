//! Capacity catalog: a numbered snapshot of what can be launched right now.
//!
//! Selection indices are handed out in listing order, starting at 1, and only
//! to instance types with at least one region holding capacity. They are not
//! stable between two snapshots: if the provider reorders or adds entries, the
//! same number can point at a different type.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::providers::{GpuProvider, GpuProviderError, InstanceSpecs, InstanceTypeListing};

/// One instance type as currently listed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceTypeOffer {
    /// Provider type identifier.
    pub type_id: String,
    /// Human-friendly name derived from the type identifier.
    pub display_name: String,
    /// Provider description, if any.
    pub description: Option<String>,
    /// Hourly price in USD.
    pub hourly_price: Option<f64>,
    /// Regions holding capacity, in provider order. Empty means unavailable.
    pub available_regions: Vec<String>,
    /// Hardware specifications.
    pub specs: Option<InstanceSpecs>,
}

impl InstanceTypeOffer {
    /// Region a launch targets: the first one listed.
    pub fn region(&self) -> Option<&str> {
        self.available_regions.first().map(String::as_str)
    }

    /// Whether any region holds capacity.
    pub fn is_available(&self) -> bool {
        !self.available_regions.is_empty()
    }
}

/// An offer with no capacity, tagged with its 1-based position in the listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnavailableOffer {
    /// 1-based position in the provider listing.
    pub position: usize,
    /// The offer itself, with an empty region list.
    pub offer: InstanceTypeOffer,
}

impl UnavailableOffer {
    /// Label shown to users, e.g. `2. Gpu 8x A100`.
    pub fn label(&self) -> String {
        format!("{}. {}", self.position, self.offer.display_name)
    }
}

/// The full catalog at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CapacitySnapshot {
    available: BTreeMap<usize, InstanceTypeOffer>,
    unavailable: Vec<UnavailableOffer>,
}

impl CapacitySnapshot {
    /// Launchable offers keyed by selection index.
    pub fn available(&self) -> &BTreeMap<usize, InstanceTypeOffer> {
        &self.available
    }

    /// Offers without capacity, in listing order.
    pub fn unavailable(&self) -> &[UnavailableOffer] {
        &self.unavailable
    }

    /// Display labels for the unavailable offers.
    pub fn unavailable_labels(&self) -> Vec<String> {
        self.unavailable.iter().map(UnavailableOffer::label).collect()
    }

    /// Offer behind a selection index.
    pub fn get(&self, index: usize) -> Option<&InstanceTypeOffer> {
        self.available.get(&index)
    }

    /// First available offer with the given type.
    pub fn find_available(&self, type_id: &str) -> Option<(usize, &InstanceTypeOffer)> {
        self.available
            .iter()
            .find(|(_, offer)| offer.type_id == type_id)
            .map(|(index, offer)| (*index, offer))
    }

    /// Whether the type appears at all, available or not.
    pub fn contains_type(&self, type_id: &str) -> bool {
        self.find_available(type_id).is_some()
            || self.unavailable.iter().any(|u| u.offer.type_id == type_id)
    }

    /// Number of launchable offers.
    pub fn len(&self) -> usize {
        self.available.len()
    }

    /// True when nothing can be launched. Not an error.
    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }
}

/// Derive a display name: drop `prefix`, then capitalise each `_`-separated word.
pub fn display_name(type_id: &str, prefix: Option<&str>) -> String {
    let stripped = prefix
        .and_then(|p| type_id.strip_prefix(p))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(type_id);

    stripped
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Number a listing. Pure; [`build_snapshot`] wraps it around a provider call.
pub fn snapshot_from_listing(
    listings: Vec<InstanceTypeListing>,
    prefix: Option<&str>,
) -> CapacitySnapshot {
    let mut snapshot = CapacitySnapshot::default();
    let mut next_index = 1;

    for (position, listing) in listings.into_iter().enumerate() {
        let offer = InstanceTypeOffer {
            display_name: display_name(&listing.type_id, prefix),
            type_id: listing.type_id,
            description: listing.description,
            hourly_price: listing.hourly_price,
            available_regions: listing.regions,
            specs: listing.specs,
        };

        if offer.is_available() {
            snapshot.available.insert(next_index, offer);
            next_index += 1;
        } else {
            snapshot.unavailable.push(UnavailableOffer {
                position: position + 1,
                offer,
            });
        }
    }

    snapshot
}

/// Fetch the current listing and number it.
///
/// # Errors
/// Propagates transport and decoding failures. An empty catalog is not an error.
pub async fn build_snapshot<P>(provider: &P) -> Result<CapacitySnapshot, GpuProviderError>
where
    P: GpuProvider + ?Sized,
{
    let listings = provider.list_instance_types().await?;
    let snapshot = snapshot_from_listing(listings, provider.type_prefix());

    debug!(
        available = snapshot.len(),
        unavailable = snapshot.unavailable.len(),
        "Built capacity snapshot"
    );
    Ok(snapshot)
}
