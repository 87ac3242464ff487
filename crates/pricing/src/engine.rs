use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use motorlot_core::{DomainError, DomainResult, Money};

/// Externally supplied pricing configuration.
///
/// Both values are percentages and validated into `[0, 100]` at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    tax_rate: Decimal,
    minimum_margin: Decimal,
}

impl PricingConfig {
    pub fn new(tax_rate: Decimal, minimum_margin: Decimal) -> DomainResult<Self> {
        ensure_percentage(tax_rate, "tax rate")?;
        ensure_percentage(minimum_margin, "minimum margin")?;
        Ok(Self {
            tax_rate,
            minimum_margin,
        })
    }

    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    pub fn minimum_margin(&self) -> Decimal {
        self.minimum_margin
    }
}

/// Result of a final-price computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub discounted: Money,
    pub tax: Money,
    pub total: Money,
}

/// One chargeable order line, in engine-neutral terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineCharge {
    pub unit_price: Money,
    pub quantity: u32,
    pub discount: Option<Money>,
}

/// Computes taxed/discounted totals and validates price floors.
///
/// All computation is deterministic and free of IO; monetary results are
/// rounded to two decimal places.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// `price × (1 − pct/100)`; rejects percentages outside `[0, 100]`.
    pub fn apply_discount(&self, price: &Money, discount_percentage: Decimal) -> DomainResult<Money> {
        ensure_percentage(discount_percentage, "discount percentage")?;
        let factor = Decimal::ONE - discount_percentage / Decimal::ONE_HUNDRED;
        Ok(price.multiply(factor)?.round_dp(2))
    }

    /// Tax on `price` at the configured rate.
    pub fn calculate_tax(&self, price: &Money) -> DomainResult<Money> {
        Ok(price
            .multiply(self.config.tax_rate / Decimal::ONE_HUNDRED)?
            .round_dp(2))
    }

    /// Discounted base plus tax.
    pub fn calculate_final_price(
        &self,
        base_price: &Money,
        discount_percentage: Decimal,
    ) -> DomainResult<PriceBreakdown> {
        if base_price.is_negative() {
            return Err(DomainError::validation("base price cannot be negative"));
        }

        let discounted = if discount_percentage > Decimal::ZERO {
            self.apply_discount(base_price, discount_percentage)?
        } else {
            ensure_percentage(discount_percentage, "discount percentage")?;
            base_price.clone()
        };
        let tax = self.calculate_tax(&discounted)?;
        let total = discounted.add(&tax)?;

        Ok(PriceBreakdown {
            discounted,
            tax,
            total,
        })
    }

    /// Enforce the price floor: the final price must not fall below
    /// `model_base_price × (1 + minimum_margin/100)`.
    pub fn ensure_price_floor(
        &self,
        final_price: &Money,
        model_base_price: &Money,
    ) -> DomainResult<()> {
        let floor = model_base_price
            .multiply(Decimal::ONE + self.config.minimum_margin / Decimal::ONE_HUNDRED)?
            .round_dp(2);
        if final_price.lt(&floor)? {
            return Err(DomainError::below_floor(format!(
                "final price {final_price} is below floor {floor}"
            )));
        }
        Ok(())
    }

    /// Σ `(unit_price × quantity) − discount`, each line validated
    /// independently before summation.
    pub fn calculate_order_total(&self, lines: &[LineCharge]) -> DomainResult<Money> {
        let first = lines
            .first()
            .ok_or_else(|| DomainError::validation("order has no lines"))?;

        let mut total = Money::zero(first.unit_price.currency().clone());
        for line in lines {
            total = total.add(&self.line_total(line)?)?;
        }
        Ok(total)
    }

    fn line_total(&self, line: &LineCharge) -> DomainResult<Money> {
        if line.quantity == 0 {
            return Err(DomainError::validation("line quantity must be positive"));
        }
        if line.unit_price.is_negative() {
            return Err(DomainError::validation("line unit price cannot be negative"));
        }

        let subtotal = line.unit_price.multiply(Decimal::from(line.quantity))?;
        match &line.discount {
            None => Ok(subtotal),
            Some(discount) => {
                if discount.is_negative() {
                    return Err(DomainError::validation("line discount cannot be negative"));
                }
                if discount.gt(&subtotal)? {
                    return Err(DomainError::validation(
                        "line discount cannot exceed the line subtotal",
                    ));
                }
                subtotal.subtract(discount)
            }
        }
    }
}

fn ensure_percentage(value: Decimal, what: &str) -> DomainResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(DomainError::validation(format!(
            "{what} must be between 0 and 100, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use motorlot_core::Currency;
    use rust_decimal_macros::dec;

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::usd())
    }

    fn engine() -> PricingEngine {
        PricingEngine::new(PricingConfig::new(dec!(8.5), dec!(5)).unwrap())
    }

    #[test]
    fn final_price_applies_discount_then_tax() {
        // base 10000, discount 10% -> 9000, tax 8.5% -> 765, final 9765
        let breakdown = engine()
            .calculate_final_price(&usd(dec!(10000)), dec!(10))
            .unwrap();

        assert_eq!(breakdown.discounted, usd(dec!(9000)));
        assert_eq!(breakdown.tax, usd(dec!(765.00)));
        assert_eq!(breakdown.total, usd(dec!(9765.00)));
    }

    #[test]
    fn zero_discount_taxes_the_base_price() {
        let breakdown = engine()
            .calculate_final_price(&usd(dec!(10000)), Decimal::ZERO)
            .unwrap();
        assert_eq!(breakdown.discounted, usd(dec!(10000)));
        assert_eq!(breakdown.total, usd(dec!(10850.00)));
    }

    #[test]
    fn discount_outside_range_is_rejected() {
        let e = engine();
        assert!(e.apply_discount(&usd(dec!(100)), dec!(-1)).is_err());
        assert!(e.apply_discount(&usd(dec!(100)), dec!(100.5)).is_err());
        assert!(e.calculate_final_price(&usd(dec!(100)), dec!(101)).is_err());
        assert!(e.apply_discount(&usd(dec!(100)), dec!(100)).is_ok());
    }

    #[test]
    fn price_floor_violation_is_reported() {
        let e = engine();
        // floor = 18000 * 1.05 = 18900
        let model_base = usd(dec!(18000));
        assert!(e.ensure_price_floor(&usd(dec!(18900)), &model_base).is_ok());

        let err = e
            .ensure_price_floor(&usd(dec!(18899.99)), &model_base)
            .unwrap_err();
        assert!(matches!(err, DomainError::PriceBelowFloor(_)));
    }

    #[test]
    fn order_total_sums_validated_lines() {
        let e = engine();
        let lines = vec![
            LineCharge {
                unit_price: usd(dec!(20000)),
                quantity: 3,
                discount: None,
            },
            LineCharge {
                unit_price: usd(dec!(500)),
                quantity: 2,
                discount: Some(usd(dec!(100))),
            },
        ];

        assert_eq!(e.calculate_order_total(&lines).unwrap(), usd(dec!(60900)));
    }

    #[test]
    fn order_total_rejects_invalid_lines() {
        let e = engine();

        let zero_quantity = vec![LineCharge {
            unit_price: usd(dec!(100)),
            quantity: 0,
            discount: None,
        }];
        assert!(e.calculate_order_total(&zero_quantity).is_err());

        let oversized_discount = vec![LineCharge {
            unit_price: usd(dec!(100)),
            quantity: 1,
            discount: Some(usd(dec!(101))),
        }];
        assert!(e.calculate_order_total(&oversized_discount).is_err());

        assert!(e.calculate_order_total(&[]).is_err());
    }

    #[test]
    fn config_percentages_are_validated() {
        assert!(PricingConfig::new(dec!(8.5), dec!(5)).is_ok());
        assert!(PricingConfig::new(dec!(-0.1), dec!(5)).is_err());
        assert!(PricingConfig::new(dec!(8.5), dec!(100.1)).is_err());
    }
}
