use base64::{engine::general_purpose::STANDARD as base64, Engine as _};
use chrono::{TimeZone, Utc};
use pesabridge::daraja::DarajaClient;

const SANDBOX_SHORT_CODE: &str = "174379";
const SANDBOX_PASSKEY: &str = "bfb279f9aa9bdbcf158e97dd71a467cd2e0c893059b10f78e6b72ada1ed2c919";

#[test]
fn test_password_is_base64_of_shortcode_passkey_timestamp() {
    let timestamp = "20191219102115";
    let password = DarajaClient::password(SANDBOX_SHORT_CODE, SANDBOX_PASSKEY, timestamp);

    let decoded = base64.decode(&password).unwrap();
    assert_eq!(
        String::from_utf8(decoded).unwrap(),
        format!("{}{}{}", SANDBOX_SHORT_CODE, SANDBOX_PASSKEY, timestamp)
    );
}

#[test]
fn test_password_known_vector() {
    // base64("123") == "MTIz"
    assert_eq!(DarajaClient::password("1", "2", "3"), "MTIz");
}

#[test]
fn test_password_is_deterministic() {
    let a = DarajaClient::password(SANDBOX_SHORT_CODE, SANDBOX_PASSKEY, "20240101120000");
    let b = DarajaClient::password(SANDBOX_SHORT_CODE, SANDBOX_PASSKEY, "20240101120000");
    assert_eq!(a, b);

    let c = DarajaClient::password(SANDBOX_SHORT_CODE, SANDBOX_PASSKEY, "20240101120001");
    assert_ne!(a, c);
}

#[test]
fn test_timestamp_format() {
    let at = Utc.with_ymd_and_hms(2019, 12, 19, 10, 21, 15).unwrap();
    assert_eq!(DarajaClient::timestamp(at), "20191219102115");

    let midnight = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    assert_eq!(DarajaClient::timestamp(midnight), "20240102000000");
}
