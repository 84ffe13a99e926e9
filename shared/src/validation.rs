//! Validation utilities for request inputs

use rust_decimal::Decimal;

/// Maximum forecast horizon the weather source provides
pub const MAX_FORECAST_DAYS: u32 = 5;

/// Validate latitude/longitude are on the globe
pub fn validate_coordinates(latitude: Decimal, longitude: Decimal) -> Result<(), &'static str> {
    if latitude < Decimal::from(-90) || latitude > Decimal::from(90) {
        return Err("Latitude must be between -90 and 90");
    }
    if longitude < Decimal::from(-180) || longitude > Decimal::from(180) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}

/// Validate a requested forecast horizon in days
pub fn validate_forecast_days(days: u32) -> Result<(), &'static str> {
    if days == 0 || days > MAX_FORECAST_DAYS {
        return Err("Forecast days must be between 1 and 5");
    }
    Ok(())
}

/// Validate an uploaded image file name by extension
pub fn validate_image_filename(filename: &str) -> Result<(), &'static str> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_else(|| "jpg".to_string());
    match extension.as_str() {
        "jpg" | "jpeg" | "png" | "webp" => Ok(()),
        _ => Err("Image must be a JPEG, PNG or WebP file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates() {
        assert!(validate_coordinates(Decimal::new(26449, 3), Decimal::new(80331, 3)).is_ok());
        assert!(validate_coordinates(Decimal::from(91), Decimal::ZERO).is_err());
        assert!(validate_coordinates(Decimal::ZERO, Decimal::from(-181)).is_err());
    }

    #[test]
    fn test_forecast_days() {
        assert!(validate_forecast_days(5).is_ok());
        assert!(validate_forecast_days(0).is_err());
        assert!(validate_forecast_days(6).is_err());
    }

    #[test]
    fn test_image_filename() {
        assert!(validate_image_filename("leaf.JPG").is_ok());
        // No extension defaults to jpg
        assert!(validate_image_filename("leaf").is_ok());
        assert!(validate_image_filename("leaf.pdf").is_err());
    }
}
