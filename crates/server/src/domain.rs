//! Closed vocabularies and pure rules shared by the services.
//!
//! Every status, severity and priority the store holds as text is parsed into
//! one of the enums below before any decision is made on it, so a `match` over
//! them is exhaustive at compile time. Unknown strings are rejected as
//! [`OpsError::Validation`].

use crate::error::OpsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Evacuation progress (percent) at which a zone counts as evacuated.
pub const COMPLETION_THRESHOLD_PERCENT: i64 = 95;

/// Maximum number of vehicle resources reserved per escalated zone.
pub const VEHICLE_RESOURCES_PER_ZONE: u64 = 3;

/// Units reserved from each selected vehicle resource.
pub const VEHICLE_UNITS_PER_RESOURCE: i32 = 2;

/// Resource type that is pre-allocated as emergency transport.
pub const VEHICLE_RESOURCE_TYPE: &str = "vehicles";

/// Alert category that escalates evacuation zones when critical.
pub const FLOOD_CATEGORY: &str = "flood";

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = OpsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(OpsError::Validation(format!(
                        "invalid {}: '{}' (expected one of: {})",
                        stringify!($name),
                        other,
                        [$($text),+].join(", ")
                    ))),
                }
            }
        }
    };
}

closed_enum! {
    /// Alert severity, ordered from least to most severe.
    Severity { Low => "low", Medium => "medium", High => "high", Critical => "critical" }
}

closed_enum! {
    /// Alert lifecycle status. Ordering follows the lifecycle.
    AlertStatus { Active => "active", Monitoring => "monitoring", Resolved => "resolved" }
}

closed_enum! {
    /// Evacuation zone status. Ordering follows the state machine.
    ZoneStatus { Safe => "safe", Warning => "warning", Evacuating => "evacuating", Evacuated => "evacuated" }
}

closed_enum! {
    /// Priority shared by zones and allocations.
    Priority { Low => "low", Medium => "medium", High => "high", Critical => "critical" }
}

closed_enum! {
    AllocationStatus { Pending => "pending", Approved => "approved", Delivered => "delivered" }
}

closed_enum! {
    /// Broadcast channel a message goes out on.
    Channel { Mobile => "mobile", Radio => "radio", Tv => "tv", Sms => "sms", Email => "email", Social => "social" }
}

closed_enum! {
    RouteStatus { Open => "open", Congested => "congested", Closed => "closed" }
}

closed_enum! {
    /// How an inventory adjustment is applied.
    InventoryOperation { Add => "add", Set => "set" }
}

/// Channels every automatic broadcast goes out on.
pub const EMERGENCY_CHANNELS: [Channel; 3] = [Channel::Mobile, Channel::Radio, Channel::Tv];

impl Severity {
    /// High and critical alerts start the automatic response.
    pub fn triggers_response(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

impl AlertStatus {
    /// Lifecycle is monotonic: `active -> monitoring -> resolved`, skipping
    /// `monitoring` is allowed.
    pub fn can_transition_to(&self, next: AlertStatus) -> bool {
        next > *self
    }
}

impl ZoneStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ZoneStatus::Evacuated)
    }

    /// Status a zone takes after a progress report of `evacuated` out of
    /// `population` people.
    pub fn after_progress(evacuated: i64, population: i64) -> ZoneStatus {
        if population <= 0 || evacuated * 100 >= population * COMPLETION_THRESHOLD_PERCENT {
            ZoneStatus::Evacuated
        } else {
            ZoneStatus::Evacuating
        }
    }
}

/// Whether the alert category is a flood. Categories are free-form tags.
pub fn is_flood(category: &str) -> bool {
    category.trim().eq_ignore_ascii_case(FLOOD_CATEGORY)
}

/// Case-insensitive substring match of an alert location against a zone
/// location. A blank alert location matches nothing.
pub fn location_matches(zone_location: &str, alert_location: &str) -> bool {
    let needle = alert_location.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    zone_location.to_lowercase().contains(&needle)
}

/// Share of the population evacuated, in percent. Zones without population
/// count as fully evacuated.
pub fn evacuation_percentage(evacuated: i64, population: i64) -> f64 {
    if population <= 0 {
        return 100.0;
    }
    evacuated as f64 * 100.0 / population as f64
}

/// Units to take from a vehicle resource with `available` units left.
pub fn vehicle_reservation_quantity(available: i32) -> i32 {
    available.clamp(0, VEHICLE_UNITS_PER_RESOURCE)
}

/// Stored form of a channel list: lowercase names separated by single spaces.
pub fn join_channels(channels: &[Channel]) -> String {
    channels
        .iter()
        .map(Channel::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn parse_channels(stored: &str) -> Result<Vec<Channel>, OpsError> {
    stored.split_whitespace().map(Channel::from_str).collect()
}

/// Title and body of the evacuation order broadcast to a zone.
pub fn evacuation_notice(
    zone_name: &str,
    priority: Priority,
    reason: &str,
    estimated_duration: &str,
) -> (String, String) {
    let title = format!("EVACUATION ORDER - {zone_name}");
    let content = format!(
        "EVACUATION ORDER - {zone_name}\n\n\
         Priority: {priority}\n\
         Reason: {reason}\n\
         Estimated Duration: {estimated_duration}\n\n\
         Please evacuate immediately using designated routes.\n\
         Proceed to nearest emergency shelter.",
        priority = priority.as_str().to_uppercase(),
    );
    (title, content)
}

/// Audience tag addressing everyone inside a zone.
pub fn zone_audience(zone_code: &str) -> String {
    format!("zone_{zone_code}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_parses_case_insensitively_and_orders() {
        assert_eq!("Critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert_eq!(" low ".parse::<Severity>().unwrap(), Severity::Low);
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Medium > Severity::Low);
        assert!("severe".parse::<Severity>().is_err());
    }

    #[test]
    fn only_high_and_critical_trigger_response() {
        assert!(!Severity::Low.triggers_response());
        assert!(!Severity::Medium.triggers_response());
        assert!(Severity::High.triggers_response());
        assert!(Severity::Critical.triggers_response());
    }

    #[test]
    fn alert_status_is_monotonic() {
        assert!(AlertStatus::Active.can_transition_to(AlertStatus::Monitoring));
        assert!(AlertStatus::Active.can_transition_to(AlertStatus::Resolved));
        assert!(AlertStatus::Monitoring.can_transition_to(AlertStatus::Resolved));
        assert!(!AlertStatus::Resolved.can_transition_to(AlertStatus::Active));
        assert!(!AlertStatus::Monitoring.can_transition_to(AlertStatus::Monitoring));
    }

    #[test]
    fn progress_threshold_is_ninety_five_percent() {
        assert_eq!(ZoneStatus::after_progress(950, 1000), ZoneStatus::Evacuated);
        assert_eq!(ZoneStatus::after_progress(949, 1000), ZoneStatus::Evacuating);
        assert_eq!(ZoneStatus::after_progress(800, 1000), ZoneStatus::Evacuating);
        assert_eq!(ZoneStatus::after_progress(1000, 1000), ZoneStatus::Evacuated);
        assert_eq!(ZoneStatus::after_progress(0, 0), ZoneStatus::Evacuated);
    }

    #[test]
    fn percentage_is_exact_for_round_numbers() {
        assert_eq!(evacuation_percentage(950, 1000), 95.0);
        assert_eq!(evacuation_percentage(800, 1000), 80.0);
        assert_eq!(evacuation_percentage(5, 0), 100.0);
    }

    #[test]
    fn location_match_is_case_insensitive_substring() {
        assert!(location_matches("Downtown District", "downtown"));
        assert!(location_matches("North Downtown", "DOWNTOWN"));
        assert!(!location_matches("Riverside", "Downtown"));
        assert!(!location_matches("Downtown", "   "));
    }

    #[test]
    fn flood_category_match() {
        assert!(is_flood("flood"));
        assert!(is_flood("Flood"));
        assert!(!is_flood("flash-flood"));
        assert!(!is_flood("earthquake"));
    }

    #[test]
    fn vehicle_reservation_takes_at_most_two() {
        assert_eq!(vehicle_reservation_quantity(10), 2);
        assert_eq!(vehicle_reservation_quantity(2), 2);
        assert_eq!(vehicle_reservation_quantity(1), 1);
        assert_eq!(vehicle_reservation_quantity(0), 0);
    }

    #[test]
    fn channels_round_trip_through_storage_format() {
        let stored = join_channels(&EMERGENCY_CHANNELS);
        assert_eq!(stored, "mobile radio tv");
        assert_eq!(parse_channels(&stored).unwrap(), EMERGENCY_CHANNELS.to_vec());
        assert!(parse_channels("mobile pigeon").is_err());
    }

    #[test]
    fn evacuation_notice_uses_uppercase_priority() {
        let (title, content) = evacuation_notice("Harbor", Priority::High, "Storm surge", "6 hours");
        assert_eq!(title, "EVACUATION ORDER - Harbor");
        assert!(content.contains("Priority: HIGH"));
        assert!(content.contains("Reason: Storm surge"));
        assert!(content.contains("Estimated Duration: 6 hours"));
        assert_eq!(zone_audience("Z-01"), "zone_Z-01");
    }
}
