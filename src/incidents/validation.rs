use crate::{core::constants::MIN_TITLE_LEN, incidents::NewIncident, IncidentMapError, Result};

/// Checks a report before it is sent to the store.
pub fn validate_new_incident(incident: &NewIncident) -> Result<()> {
    let title_len = incident.title.trim().chars().count();
    if title_len < MIN_TITLE_LEN {
        return Err(IncidentMapError::Validation(format!(
            "title must be at least {MIN_TITLE_LEN} characters (got {title_len})"
        )));
    }

    if !incident.position().is_valid() || !incident.lat.is_finite() || !incident.lng.is_finite()
    {
        return Err(IncidentMapError::Validation(format!(
            "location ({}, {}) is outside valid coordinates",
            incident.lat, incident.lng
        )));
    }

    if incident.owner_id.trim().is_empty() {
        return Err(IncidentMapError::Validation(
            "an owner is required to report an incident".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_reasonable_report() {
        let incident = NewIncident::new("Fire on 5th", "", 40.71, -74.0, "user-1");
        assert!(validate_new_incident(&incident).is_ok());
    }

    #[test]
    fn test_rejects_short_title() {
        let incident = NewIncident::new("  Fire   ", "smoke", 40.71, -74.0, "user-1");
        assert!(matches!(
            validate_new_incident(&incident),
            Err(IncidentMapError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_bad_location_and_missing_owner() {
        let off_map = NewIncident::new("Fire on 5th avenue", "", 95.0, -74.0, "user-1");
        assert!(validate_new_incident(&off_map).is_err());

        let nan = NewIncident::new("Fire on 5th avenue", "", f64::NAN, -74.0, "user-1");
        assert!(validate_new_incident(&nan).is_err());

        let anonymous = NewIncident::new("Fire on 5th avenue", "", 40.71, -74.0, " ");
        assert!(validate_new_incident(&anonymous).is_err());
    }
}
