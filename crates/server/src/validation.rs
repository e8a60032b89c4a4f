//! Field-by-field validation of request bodies.
//!
//! Bodies are taken as raw JSON so that every offending field can be
//! reported at once instead of failing on the first serde error.

use api_types::{PaymentMethod, error::FieldError};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::ValidateUrl;

/// A validated create-deposit request.
#[derive(Debug, PartialEq, Eq)]
pub struct DepositRequest {
    pub booking_id: Uuid,
    pub payment_method: PaymentMethod,
    pub promo_code: Option<String>,
    pub return_url: Option<String>,
}

impl DepositRequest {
    pub fn from_json(body: &Value) -> Result<Self, Vec<FieldError>> {
        let Some(object) = body.as_object() else {
            return Err(vec![field_error("body", "request body must be a JSON object")]);
        };
        let mut errors = Vec::new();

        let booking_id = match required_str(object, "bookingId") {
            Ok(raw) => Uuid::parse_str(raw)
                .map_err(|_| errors.push(field_error("bookingId", "bookingId must be a valid UUID")))
                .ok(),
            Err(err) => {
                errors.push(err);
                None
            }
        };

        let payment_method = match required_str(object, "paymentMethod") {
            Ok(raw) => parse_payment_method(raw)
                .ok_or_else(|| {
                    errors.push(field_error(
                        "paymentMethod",
                        "paymentMethod must be one of STRIPE_ONLINE, CASH_ON_SERVICE",
                    ))
                })
                .ok(),
            Err(err) => {
                errors.push(err);
                None
            }
        };

        let promo_code = optional_str(object, "promoCode")
            .map_err(|err| errors.push(err))
            .ok()
            .flatten()
            .map(ToString::to_string);

        let return_url = match optional_str(object, "returnUrl") {
            Ok(Some(raw)) if is_absolute_http_url(raw) => Some(raw.to_string()),
            Ok(Some(_)) => {
                errors.push(field_error("returnUrl", "returnUrl must be a valid URL"));
                None
            }
            Ok(None) => None,
            Err(err) => {
                errors.push(err);
                None
            }
        };

        match (booking_id, payment_method) {
            (Some(booking_id), Some(payment_method)) if errors.is_empty() => Ok(Self {
                booking_id,
                payment_method,
                promo_code,
                return_url,
            }),
            _ => Err(errors),
        }
    }
}

fn field_error(field: &str, message: &str) -> FieldError {
    FieldError {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn required_str<'a>(object: &'a Map<String, Value>, field: &str) -> Result<&'a str, FieldError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(field_error(field, &format!("{field} is required"))),
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(field_error(field, &format!("{field} must be a string"))),
    }
}

/// `null` is treated like an absent field.
fn optional_str<'a>(
    object: &'a Map<String, Value>,
    field: &str,
) -> Result<Option<&'a str>, FieldError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(_) => Err(field_error(field, &format!("{field} must be a string"))),
    }
}

fn parse_payment_method(raw: &str) -> Option<PaymentMethod> {
    [PaymentMethod::StripeOnline, PaymentMethod::CashOnService]
        .into_iter()
        .find(|method| method.as_str() == raw)
}

/// Only `http` and `https` redirects are accepted; both schemes require a host
/// to parse.
fn is_absolute_http_url(raw: &str) -> bool {
    let scheme = raw.split_once("://").map(|(scheme, _)| scheme.to_ascii_lowercase());
    matches!(scheme.as_deref(), Some("http" | "https")) && raw.validate_url()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|err| err.field.as_str()).collect()
    }

    #[test]
    fn accepts_minimal_body() {
        let id = Uuid::new_v4();
        let request = DepositRequest::from_json(&json!({
            "bookingId": id.to_string(),
            "paymentMethod": "CASH_ON_SERVICE",
        }))
        .unwrap();
        assert_eq!(
            request,
            DepositRequest {
                booking_id: id,
                payment_method: PaymentMethod::CashOnService,
                promo_code: None,
                return_url: None,
            }
        );
    }

    #[test]
    fn accepts_optional_fields() {
        let request = DepositRequest::from_json(&json!({
            "bookingId": Uuid::nil().to_string(),
            "paymentMethod": "STRIPE_ONLINE",
            "promoCode": "welcome",
            "returnUrl": "https://book.example.com/done?x=1",
        }))
        .unwrap();
        assert_eq!(request.promo_code.as_deref(), Some("welcome"));
        assert_eq!(
            request.return_url.as_deref(),
            Some("https://book.example.com/done?x=1")
        );
    }

    #[test]
    fn null_optionals_count_as_absent() {
        let request = DepositRequest::from_json(&json!({
            "bookingId": Uuid::nil().to_string(),
            "paymentMethod": "STRIPE_ONLINE",
            "promoCode": null,
            "returnUrl": null,
        }))
        .unwrap();
        assert_eq!(request.promo_code, None);
        assert_eq!(request.return_url, None);
    }

    #[test]
    fn reports_every_bad_field() {
        let errors = DepositRequest::from_json(&json!({
            "bookingId": "not-a-uuid",
            "paymentMethod": "PAYPAL",
            "promoCode": 42,
            "returnUrl": "/relative/path",
        }))
        .unwrap_err();
        assert_eq!(
            fields(&errors),
            vec!["bookingId", "paymentMethod", "promoCode", "returnUrl"]
        );
    }

    #[test]
    fn reports_missing_required_fields() {
        let errors = DepositRequest::from_json(&json!({})).unwrap_err();
        assert_eq!(fields(&errors), vec!["bookingId", "paymentMethod"]);
        assert_eq!(errors[0].message, "bookingId is required");
    }

    #[test]
    fn rejects_non_object_body() {
        let errors = DepositRequest::from_json(&json!(["bookingId"])).unwrap_err();
        assert_eq!(fields(&errors), vec!["body"]);
    }

    #[test]
    fn rejects_non_http_return_urls() {
        assert!(!is_absolute_http_url("javascript:alert(1)"));
        assert!(!is_absolute_http_url("mailto:a@b.co"));
        assert!(!is_absolute_http_url("https://"));
        assert!(!is_absolute_http_url("ftp://files.example.com/x"));
        assert!(is_absolute_http_url("http://localhost:3000/booking"));
        assert!(is_absolute_http_url("HTTPS://Book.Example.com"));
    }
}
