use crate::{
    core::{constants::POPUP_OFFSET_Y, geo::Point},
    incidents::Incident,
    ui::format::{format_coordinates, format_time, time_ago},
};
use chrono::{DateTime, Local, Utc};

/// What the detail popup should currently show.
///
/// `position` is the active marker's container point; the popup's bottom
/// edge sits [`POPUP_OFFSET_Y`] pixels above it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IncidentPopup {
    pub incident: Option<Incident>,
    pub loading: bool,
    pub position: Option<Point>,
}

impl IncidentPopup {
    /// The popup renders only once a marker is active
    pub fn is_visible(&self) -> bool {
        self.position.is_some() && (self.loading || self.incident.is_some())
    }

    /// Bottom-center point of the popup in container pixels
    pub fn anchor(&self) -> Option<Point> {
        self.position
            .map(|position| Point::new(position.x, position.y - POPUP_OFFSET_Y))
    }

    pub fn title(&self) -> Option<&str> {
        self.incident.as_ref().map(|incident| incident.title.as_str())
    }

    /// `"at <place>"`, falling back to the raw coordinates
    pub fn location_line(&self) -> Option<String> {
        let incident = self.incident.as_ref()?;
        let place = match &incident.address {
            Some(address) if !address.label().is_empty() => address.label().to_string(),
            _ => format_coordinates(incident.lat, incident.lng),
        };
        Some(format!("at {place}"))
    }

    /// `"around 3:04 PM · 5m ago"` in the local timezone
    pub fn time_line(&self, now: DateTime<Utc>) -> Option<String> {
        let created_at = self.incident.as_ref()?.created_at;
        Some(format!(
            "around {} \u{b7} {}",
            format_time(&created_at.with_timezone(&Local)),
            time_ago(created_at, now)
        ))
    }

    /// Description, omitted when empty
    pub fn body(&self) -> Option<&str> {
        self.incident
            .as_ref()
            .map(|incident| incident.content.as_str())
            .filter(|content| !content.trim().is_empty())
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.incident
            .as_ref()
            .map(|incident| incident.is_owned_by(user_id))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incidents::{Address, IncidentStatus};
    use chrono::{Duration, TimeZone};

    fn popup(address: Option<Address>) -> IncidentPopup {
        IncidentPopup {
            incident: Some(Incident {
                id: 1,
                owner_id: "user-1".to_string(),
                lat: 40.71,
                lng: -74.0,
                status: IncidentStatus::Active,
                title: "Fire on 5th".to_string(),
                content: "  ".to_string(),
                created_at: Utc.with_ymd_and_hms(2024, 3, 1, 15, 4, 0).unwrap(),
                address,
            }),
            loading: false,
            position: Some(Point::new(400.0, 300.0)),
        }
    }

    #[test]
    fn test_location_line_prefers_name_then_display_then_coordinates() {
        let named = popup(Some(Address {
            name: Some("Joe's Pizza".to_string()),
            display_line: "7 Carmine St".to_string(),
        }));
        assert_eq!(named.location_line().unwrap(), "at Joe's Pizza");

        let street = popup(Some(Address {
            name: None,
            display_line: "7 Carmine St".to_string(),
        }));
        assert_eq!(street.location_line().unwrap(), "at 7 Carmine St");

        assert_eq!(popup(None).location_line().unwrap(), "at 40.7100, -74.0000");
    }

    #[test]
    fn test_time_line_and_anchor() {
        let popup = popup(None);
        let created = popup.incident.as_ref().unwrap().created_at;
        let line = popup.time_line(created + Duration::minutes(5)).unwrap();
        assert!(line.starts_with("around "));
        assert!(line.ends_with("\u{b7} 5m ago"));

        assert_eq!(popup.anchor(), Some(Point::new(400.0, 275.0)));
        assert!(popup.body().is_none());
        assert!(popup.is_owned_by("user-1"));
    }

    #[test]
    fn test_hidden_without_position() {
        let hidden = IncidentPopup::default();
        assert!(!hidden.is_visible());
        assert!(hidden.location_line().is_none());

        let loading = IncidentPopup {
            loading: true,
            position: Some(Point::new(1.0, 1.0)),
            ..IncidentPopup::default()
        };
        assert!(loading.is_visible());
    }
}
