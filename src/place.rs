//! Canonicalizes heterogeneous place records into [`NormalizedPlace`],
//! extracts the lodging anchor, and assigns per-category visit durations.
//!
//! Grounded on `original_source/travelplan_back/travelplan/services/clustering.py`'s
//! `preprocess_places` and `PlaceConstraints` for category priority, visit
//! duration ranges, and the two accepted location shapes.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::PlannerError;
use crate::geo::Coordinates;

/// A raw place record as received from upstream place-discovery. Both the
/// nested (`geometry.location.lat/lng`) and flat (`location.lat/lng`) shapes
/// are accepted; the struct carries both as optional fields and resolution
/// happens in [`Place::coordinates`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_ratings_total: Option<u64>,
    #[serde(default)]
    pub price_level: Option<i64>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub location: Option<LocationField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationField {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl Place {
    /// Probes the nested shape first, then the flat shape, per spec section 3.
    pub fn coordinates(&self) -> Option<Coordinates> {
        if let Some(geometry) = &self.geometry {
            return Some(Coordinates::new(geometry.location.lat, geometry.location.lng));
        }
        if let Some(location) = &self.location {
            return Some(Coordinates::new(location.lat, location.lng));
        }
        None
    }

    pub fn is_lodging(&self) -> bool {
        self.types
            .iter()
            .any(|t| t == "lodging" || t == "hotel")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Lodging,
    Restaurant,
    Museum,
    Park,
    ShoppingMall,
    TouristAttraction,
    Default,
}

impl Category {
    fn duration_range_minutes(self) -> (i64, i64) {
        match self {
            Category::Lodging => (0, 0),
            Category::Restaurant => (60, 90),
            Category::TouristAttraction => (60, 180),
            Category::Museum => (120, 240),
            Category::Park => (60, 120),
            Category::ShoppingMall => (60, 180),
            Category::Default => (60, 180),
        }
    }

    fn resolve(types: &[String]) -> Category {
        let has = |needle: &str| types.iter().any(|t| t == needle);
        if has("restaurant") || has("food") {
            Category::Restaurant
        } else if has("museum") {
            Category::Museum
        } else if has("park") {
            Category::Park
        } else if has("shopping_mall") {
            Category::ShoppingMall
        } else if has("tourist_attraction") || has("point_of_interest") {
            Category::TouristAttraction
        } else {
            Category::Default
        }
    }
}

/// Tagged restaurant variant, per spec section 9's polymorphism note —
/// downstream components branch on this tag, never on a display-name
/// sentinel like "Lunch Break".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestaurantKind {
    Real,
    VirtualLunch,
    VirtualDinner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedPlace {
    pub id: String,
    pub name: String,
    pub coordinates: Coordinates,
    pub category: Category,
    pub visit_duration_minutes: i64,
    pub is_lodging: bool,
    pub restaurant_kind: Option<RestaurantKind>,
    pub rating: Option<f64>,
    pub original: Option<Place>,
}

impl NormalizedPlace {
    pub fn is_restaurant(&self) -> bool {
        self.restaurant_kind.is_some()
    }

    pub fn is_virtual(&self) -> bool {
        matches!(
            self.restaurant_kind,
            Some(RestaurantKind::VirtualLunch) | Some(RestaurantKind::VirtualDinner)
        )
    }

    pub fn meal_type(&self) -> Option<RestaurantKind> {
        self.restaurant_kind
    }

    pub fn virtual_lunch(coordinates: Coordinates, duration: i64) -> Self {
        NormalizedPlace {
            id: format!("virtual-lunch-{}-{}", coordinates.lat, coordinates.lng),
            name: "Lunch Break".to_string(),
            coordinates,
            category: Category::Restaurant,
            visit_duration_minutes: duration,
            is_lodging: false,
            restaurant_kind: Some(RestaurantKind::VirtualLunch),
            rating: None,
            original: None,
        }
    }

    pub fn virtual_dinner(coordinates: Coordinates, duration: i64) -> Self {
        NormalizedPlace {
            id: format!("virtual-dinner-{}-{}", coordinates.lat, coordinates.lng),
            name: "Dinner Break".to_string(),
            coordinates,
            category: Category::Restaurant,
            visit_duration_minutes: duration,
            is_lodging: false,
            restaurant_kind: Some(RestaurantKind::VirtualDinner),
            rating: None,
            original: None,
        }
    }
}

/// Normalizes raw places, extracting the first lodging-tagged place as the
/// anchor. Fails with [`PlannerError::InputInvalid`] if no places survive
/// normalization, and with [`PlannerError::NoLodging`] if none carry a
/// lodging/hotel tag.
pub fn normalize(
    places: &[Place],
    rng: &mut impl Rng,
) -> Result<(Vec<NormalizedPlace>, NormalizedPlace), PlannerError> {
    if places.is_empty() {
        return Err(PlannerError::InputInvalid("no places were provided".to_string()));
    }

    let mut lodging: Option<NormalizedPlace> = None;
    let mut normalized = Vec::with_capacity(places.len());

    for place in places {
        let coordinates = match place.coordinates() {
            Some(c) => c,
            None => {
                log::warn!(
                    "skipping place {:?}: no usable location field",
                    place.name
                );
                continue;
            }
        };
        let name = match &place.name {
            Some(n) if !n.is_empty() => n.clone(),
            _ => {
                log::warn!("skipping place at {:?}: missing name", coordinates);
                continue;
            }
        };
        if place.types.is_empty() {
            log::warn!("skipping place {name}: missing category tags");
            continue;
        }

        if place.is_lodging() && lodging.is_none() {
            lodging = Some(NormalizedPlace {
                id: place.place_id.clone().unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                name,
                coordinates,
                category: Category::Lodging,
                visit_duration_minutes: 0,
                is_lodging: true,
                restaurant_kind: None,
                rating: place.rating,
                original: Some(place.clone()),
            });
            continue;
        }
        if place.is_lodging() {
            // extra lodging beyond the first anchor: discarded per spec.
            continue;
        }

        let category = Category::resolve(&place.types);
        let (min, max) = category.duration_range_minutes();
        let duration = if min == max { min } else { rng.gen_range(min..=max) };
        let restaurant_kind = if category == Category::Restaurant {
            Some(RestaurantKind::Real)
        } else {
            None
        };

        normalized.push(NormalizedPlace {
            id: place.place_id.clone().unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            name,
            coordinates,
            category,
            visit_duration_minutes: duration,
            is_lodging: false,
            restaurant_kind,
            rating: place.rating,
            original: Some(place.clone()),
        });
    }

    if normalized.is_empty() {
        return Err(PlannerError::InputInvalid(
            "no valid places found after processing".to_string(),
        ));
    }

    let lodging = lodging.ok_or(PlannerError::NoLodging)?;
    Ok((normalized, lodging))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn hotel() -> Place {
        Place {
            place_id: Some("hotel-1".to_string()),
            name: Some("Hotel Lutetia".to_string()),
            types: vec!["lodging".to_string(), "hotel".to_string()],
            rating: Some(4.5),
            user_ratings_total: Some(1000),
            price_level: Some(3),
            geometry: Some(Geometry {
                location: LatLng { lat: 48.85, lng: 2.35 },
            }),
            location: None,
        }
    }

    fn attraction(name: &str) -> Place {
        Place {
            place_id: Some(name.to_string()),
            name: Some(name.to_string()),
            types: vec!["tourist_attraction".to_string(), "point_of_interest".to_string()],
            rating: Some(4.2),
            user_ratings_total: Some(500),
            price_level: None,
            geometry: None,
            location: Some(LocationField { lat: 48.86, lng: 2.33 }),
        }
    }

    #[test]
    fn normalize_extracts_lodging_and_classifies_attraction() {
        let mut rng = StdRng::seed_from_u64(1);
        let places = vec![hotel(), attraction("Louvre")];
        let (normalized, lodging) = normalize(&places, &mut rng).unwrap();
        assert!(lodging.is_lodging);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].category, Category::TouristAttraction);
    }

    #[test]
    fn normalize_fails_without_lodging() {
        let mut rng = StdRng::seed_from_u64(1);
        let places = vec![attraction("Louvre")];
        let err = normalize(&places, &mut rng).unwrap_err();
        assert!(matches!(err, PlannerError::NoLodging));
    }

    #[test]
    fn normalize_fails_on_empty_input() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = normalize(&[], &mut rng).unwrap_err();
        assert!(matches!(err, PlannerError::InputInvalid(_)));
    }

    #[test]
    fn flat_location_shape_is_accepted() {
        let mut rng = StdRng::seed_from_u64(1);
        let places = vec![hotel(), attraction("Park")];
        let (normalized, _) = normalize(&places, &mut rng).unwrap();
        assert_eq!(normalized[0].coordinates, Coordinates::new(48.86, 2.33));
    }

    #[test]
    fn only_first_lodging_is_kept() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut second_hotel = hotel();
        second_hotel.place_id = Some("hotel-2".to_string());
        let places = vec![hotel(), second_hotel, attraction("Park")];
        let (normalized, lodging) = normalize(&places, &mut rng).unwrap();
        assert_eq!(lodging.id, "hotel-1");
        assert_eq!(normalized.len(), 1);
    }

    #[test]
    fn normalize_fails_when_only_lodging_survives() {
        let mut rng = StdRng::seed_from_u64(1);
        let places = vec![hotel()];
        let err = normalize(&places, &mut rng).unwrap_err();
        assert!(matches!(err, PlannerError::InputInvalid(_)));
    }
}
