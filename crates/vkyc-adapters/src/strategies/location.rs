use async_trait::async_trait;
use serde_json::json;
use vkyc_core::{CaptureInput, CaptureRequirement, Challenge, Outcome, StrategyError, VerificationStrategy};

/// Acepta un fix del dispositivo o una dirección manual completa. No valida
/// plausibilidad de la posición.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationStrategy;

#[async_trait]
impl VerificationStrategy for LocationStrategy {
    fn requirement(&self) -> CaptureRequirement {
        CaptureRequirement::LocationOrManual
    }

    async fn verify(&self, input: &CaptureInput, _challenge: &Challenge) -> Result<Outcome, StrategyError> {
        match input {
            CaptureInput::Location(fix) => {
                let data = json!({
                    "source": "device",
                    "latitude": fix.latitude,
                    "longitude": fix.longitude,
                    "accuracy_m": fix.accuracy,
                });
                Ok(Outcome::success().with_extracted_data(data))
            }
            CaptureInput::ManualAddress(address) => {
                let missing = address.missing_fields();
                if !missing.is_empty() {
                    return Err(StrategyError::InvalidInput(format!("missing {}", missing.join(", "))));
                }
                let mut data = serde_json::to_value(address).map_err(|e| StrategyError::Backend(e.to_string()))?;
                data["source"] = json!("manual");
                Ok(Outcome::success().with_extracted_data(data))
            }
            _ => Err(StrategyError::InvalidInput("location expects a fix or an address".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use vkyc_core::{GeoFix, ManualAddress};

    use super::*;

    #[tokio::test]
    async fn device_fix_succeeds_with_coordinates() {
        let fix = GeoFix { latitude: 12.97,
                           longitude: 77.59,
                           accuracy: 10.0 };
        let out = LocationStrategy.verify(&CaptureInput::Location(fix), &Challenge::None)
                                  .await
                                  .expect("verify");
        assert!(out.is_success());
        assert_eq!(out.extracted_data().expect("data")["source"], "device");
    }

    #[tokio::test]
    async fn manual_address_must_be_complete() {
        let ok = CaptureInput::ManualAddress(ManualAddress::new("12 MG Road", "Bengaluru", "India"));
        let out = LocationStrategy.verify(&ok, &Challenge::None).await.expect("verify");
        assert_eq!(out.extracted_data().expect("data")["city"], "Bengaluru");

        let partial = CaptureInput::ManualAddress(ManualAddress::new("12 MG Road", "", "India"));
        assert!(matches!(LocationStrategy.verify(&partial, &Challenge::None).await,
                         Err(StrategyError::InvalidInput(msg)) if msg == "missing city"));
    }
}
