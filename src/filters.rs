use crate::models::{Stay, Vehicle};
use crate::stats::is_active;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleFilter {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub tipo: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Active,
    Finished,
}

impl StatusFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "ativo" => Some(StatusFilter::Active),
            "finalizado" => Some(StatusFilter::Finished),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StayFilter {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl StayFilter {
    pub fn status(&self) -> Option<StatusFilter> {
        self.status.as_deref().and_then(StatusFilter::parse)
    }
}

fn needle(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase)
}

fn matches_text(vehicle: &Vehicle, needle: &str) -> bool {
    [&vehicle.plate, &vehicle.owner, &vehicle.model, &vehicle.make]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

pub fn filter_vehicles<'a>(vehicles: &'a [Vehicle], filter: &VehicleFilter) -> Vec<&'a Vehicle> {
    let text = needle(&filter.q);
    let kind = filter
        .tipo
        .as_deref()
        .map(str::trim)
        .filter(|kind| !kind.is_empty());

    vehicles
        .iter()
        .filter(|vehicle| text.as_deref().is_none_or(|text| matches_text(vehicle, text)))
        .filter(|vehicle| kind.is_none_or(|kind| vehicle.kind == kind))
        .collect()
}

pub fn filter_stays<'a>(
    stays: &'a [Stay],
    vehicles: &[Vehicle],
    filter: &StayFilter,
    now: DateTime<Utc>,
) -> Vec<&'a Stay> {
    let text = needle(&filter.q);
    let status = filter.status();

    stays
        .iter()
        .filter(|stay| {
            text.as_deref().is_none_or(|text| {
                stay.plate.to_lowercase().contains(text)
                    || vehicles
                        .iter()
                        .filter(|vehicle| vehicle.plate == stay.plate)
                        .any(|vehicle| matches_text(vehicle, text))
            })
        })
        .filter(|stay| match status {
            None => true,
            Some(StatusFilter::Active) => is_active(stay, now),
            Some(StatusFilter::Finished) => !is_active(stay, now),
        })
        .collect()
}

pub fn vehicle_kinds(vehicles: &[Vehicle]) -> Vec<String> {
    let mut kinds: Vec<String> = Vec::new();
    for vehicle in vehicles {
        if !vehicle.kind.is_empty() && !kinds.contains(&vehicle.kind) {
            kinds.push(vehicle.kind.clone());
        }
    }
    kinds
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn vehicle(plate: &str, owner: &str, make: &str, model: &str, kind: &str) -> Vehicle {
        Vehicle {
            plate: plate.to_string(),
            owner: owner.to_string(),
            make: make.to_string(),
            model: model.to_string(),
            kind: kind.to_string(),
            ..Vehicle::default()
        }
    }

    fn fleet() -> Vec<Vehicle> {
        vec![
            vehicle("ABC1D23", "Ana Souza", "Fiat", "Uno", "carro"),
            vehicle("MOT0001", "Bruno Lima", "Honda", "CG 160", "moto"),
            vehicle("XYZ9876", "Carla Dias", "Volkswagen", "Gol", "carro"),
        ]
    }

    #[test]
    fn text_matches_any_searchable_field_ignoring_case() {
        let vehicles = fleet();
        let by = |q: &str| {
            let filter = VehicleFilter {
                q: Some(q.to_string()),
                tipo: None,
            };
            filter_vehicles(&vehicles, &filter)
                .iter()
                .map(|v| v.plate.clone())
                .collect::<Vec<_>>()
        };

        assert_eq!(by("abc"), vec!["ABC1D23"]);
        assert_eq!(by("lima"), vec!["MOT0001"]);
        assert_eq!(by("gol"), vec!["XYZ9876"]);
        assert_eq!(by("HONDA"), vec!["MOT0001"]);
        assert_eq!(by("   ").len(), 3);
    }

    #[test]
    fn unmatched_text_yields_nothing() {
        let vehicles = fleet();
        let filter = VehicleFilter {
            q: Some("zzzz".to_string()),
            tipo: None,
        };
        assert!(filter_vehicles(&vehicles, &filter).is_empty());
    }

    #[test]
    fn type_and_text_combine() {
        let vehicles = fleet();
        let filter = VehicleFilter {
            q: Some("a".to_string()),
            tipo: Some("carro".to_string()),
        };
        let plates: Vec<_> = filter_vehicles(&vehicles, &filter)
            .iter()
            .map(|v| v.plate.as_str())
            .collect();
        assert_eq!(plates, vec!["ABC1D23", "XYZ9876"]);
    }

    #[test]
    fn stays_filter_by_owner_and_status() {
        let vehicles = fleet();
        let now = Utc::now();
        let stays = vec![
            Stay {
                id: 1,
                plate: "ABC1D23".to_string(),
                hourly_rate: Some(5.0),
                entry: Some(now - Duration::hours(2)),
                exit: None,
                total: None,
            },
            Stay {
                id: 2,
                plate: "MOT0001".to_string(),
                hourly_rate: Some(3.0),
                entry: Some(now - Duration::hours(5)),
                exit: Some(now - Duration::hours(1)),
                total: Some(12.0),
            },
        ];

        let by_owner = StayFilter {
            q: Some("bruno".to_string()),
            status: None,
        };
        let found = filter_stays(&stays, &vehicles, &by_owner, now);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 2);

        let active = StayFilter {
            q: None,
            status: Some("ativo".to_string()),
        };
        let found = filter_stays(&stays, &vehicles, &active, now);
        assert_eq!(found.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1]);

        let finished = StayFilter {
            q: None,
            status: Some("finalizado".to_string()),
        };
        let found = filter_stays(&stays, &vehicles, &finished, now);
        assert_eq!(found.iter().map(|s| s.id).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn kinds_are_distinct_in_order() {
        assert_eq!(vehicle_kinds(&fleet()), vec!["carro", "moto"]);
    }
}
