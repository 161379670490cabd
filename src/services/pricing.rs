use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use crate::config::PricingConfig;
use crate::errors::ServiceError;
use crate::money::round_mru;

/// Quote produced for a prospective order before intake.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceQuote {
    pub product_price: Decimal,
    pub commission: Decimal,
    pub shipping_cost: Decimal,
    pub grand_total: Decimal,
}

/// Up-front price estimate for staff quoting a client at the counter.
///
/// All rates come from the injected settings; the calculator reads no
/// ambient state, so quotes are reproducible in isolation.
#[derive(Clone, Debug)]
pub struct QuickPriceCalculator {
    settings: PricingConfig,
}

impl QuickPriceCalculator {
    pub fn new(settings: PricingConfig) -> Self {
        Self { settings }
    }

    /// Quotes a product already priced in MRU: commission on the product
    /// price plus zone-rated international shipping by weight. The zone
    /// must exist in the configured table.
    #[instrument(skip(self), fields(zone = %zone))]
    pub fn quote(
        &self,
        product_price_mru: Decimal,
        weight_kg: Decimal,
        zone: &str,
    ) -> Result<PriceQuote, ServiceError> {
        let rate = self
            .settings
            .shipping_zones
            .iter()
            .find(|z| z.zone.eq_ignore_ascii_case(zone))
            .ok_or_else(|| {
                ServiceError::NotFound(format!("shipping zone {} not configured", zone))
            })?;

        let product_price = round_mru(product_price_mru);
        let commission = round_mru(product_price_mru * self.settings.commission_rate);
        let shipping_cost = round_mru(weight_kg * rate.rate_per_kg);

        Ok(PriceQuote {
            product_price,
            commission,
            shipping_cost,
            grand_total: product_price + commission + shipping_cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShippingZoneRate;
    use rust_decimal_macros::dec;

    fn settings() -> PricingConfig {
        PricingConfig {
            commission_rate: dec!(0.10),
            shipping_zones: vec![
                ShippingZoneRate {
                    zone: "Europe".to_string(),
                    rate_per_kg: dec!(800),
                },
                ShippingZoneRate {
                    zone: "Asia".to_string(),
                    rate_per_kg: dec!(1100),
                },
            ],
        }
    }

    #[test]
    fn test_quote_sums_rounded_components() {
        let calculator = QuickPriceCalculator::new(settings());
        let quote = calculator.quote(dec!(10000), dec!(2.5), "Europe").unwrap();
        assert_eq!(quote.product_price, dec!(10000));
        assert_eq!(quote.commission, dec!(1000));
        assert_eq!(quote.shipping_cost, dec!(2000));
        assert_eq!(quote.grand_total, dec!(13000));
    }

    #[test]
    fn test_zone_lookup_is_case_insensitive() {
        let calculator = QuickPriceCalculator::new(settings());
        assert!(calculator.quote(dec!(100), dec!(1), "asia").is_ok());
    }

    #[test]
    fn test_unknown_zone_is_an_error() {
        let calculator = QuickPriceCalculator::new(settings());
        let err = calculator.quote(dec!(100), dec!(1), "Atlantis");
        assert!(matches!(err, Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn test_fractional_commission_rounds_to_whole_mru() {
        let calculator = QuickPriceCalculator::new(settings());
        let quote = calculator.quote(dec!(105), dec!(0.3), "Europe").unwrap();
        // commission 10.5 -> 11, shipping 240
        assert_eq!(quote.commission, dec!(11));
        assert_eq!(quote.shipping_cost, dec!(240));
        assert_eq!(quote.grand_total, dec!(356));
    }
}
