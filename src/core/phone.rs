use crate::core::{AppError, Result};

/// Kenyan country code prefix for canonical MSISDNs.
pub const COUNTRY_CODE: &str = "254";

/// Leading digit of Kenyan mobile-network numbers.
const MOBILE_LEADING_DIGIT: char = '7';

/// Normalize a subscriber phone number to the canonical 12-digit MSISDN
/// form used on the Daraja wire (e.g. `254722123456`).
///
/// Non-digit characters are stripped first, so `+254 722 123-456` and
/// `254722123456` are equivalent inputs. Three shapes are accepted:
///
/// - `0722123456` — leading zero replaced with the country code
/// - `722123456` — bare mobile number, country code prepended
/// - `254722123456` — already canonical, passed through
///
/// Every other shape is rejected. This is the single normalizer for the
/// whole service: validation before submission and storage/display both go
/// through here.
pub fn normalize(raw: &str) -> Result<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    // The mobile leading digit is required in every accepted shape.
    match digits.len() {
        10 if digits.starts_with('0') && digits[1..].starts_with(MOBILE_LEADING_DIGIT) => {
            Ok(format!("{}{}", COUNTRY_CODE, &digits[1..]))
        }
        9 if digits.starts_with(MOBILE_LEADING_DIGIT) => {
            Ok(format!("{}{}", COUNTRY_CODE, digits))
        }
        12 if digits.starts_with(COUNTRY_CODE)
            && digits[COUNTRY_CODE.len()..].starts_with(MOBILE_LEADING_DIGIT) =>
        {
            Ok(digits)
        }
        _ => Err(AppError::validation(format!(
            "Unrecognized phone number format: {}",
            raw
        ))),
    }
}
