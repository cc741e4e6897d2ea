use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use invoicer_core::{Amount, DomainError, DomainResult, ValueObject};

/// One line item exactly as the intake boundary received it.
///
/// Quantity and rate are kept as text; `None` means the field was absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLineItem {
    pub description: String,
    pub hsn_code: String,
    pub quantity: Option<String>,
    pub rate: Option<String>,
}

impl RawLineItem {
    pub fn new(
        description: impl Into<String>,
        hsn_code: impl Into<String>,
        quantity: impl Into<String>,
        rate: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            hsn_code: hsn_code.into(),
            quantity: Some(quantity.into()),
            rate: Some(rate.into()),
        }
    }
}

/// Numeric field of a raw line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericField {
    Quantity,
    Rate,
}

impl core::fmt::Display for NumericField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NumericField::Quantity => f.write_str("quantity"),
            NumericField::Rate => f.write_str("rate"),
        }
    }
}

/// A numeric field that could not be used and was coerced to zero.
///
/// Recovered locally: this is recorded for logging, never returned as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidNumericField {
    pub field: NumericField,
    /// Offending input; `None` when the field was missing or blank.
    pub raw: Option<String>,
}

/// A normalized line item. `amount` is always `quantity * unit_rate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    description: String,
    hsn_code: String,
    quantity: Amount,
    unit_rate: Amount,
    amount: Amount,
}

impl ValueObject for LineItem {}

impl LineItem {
    /// Build a line item, deriving its amount.
    ///
    /// Fails only if the product does not fit the decimal range.
    pub fn new(
        description: impl Into<String>,
        hsn_code: impl Into<String>,
        quantity: Amount,
        unit_rate: Amount,
    ) -> DomainResult<Self> {
        let amount = quantity.checked_mul(unit_rate).ok_or_else(|| {
            DomainError::out_of_range(format!("{quantity} x {unit_rate} overflows"))
        })?;
        Ok(Self {
            description: description.into(),
            hsn_code: hsn_code.into(),
            quantity,
            unit_rate,
            amount,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn hsn_code(&self) -> &str {
        &self.hsn_code
    }

    pub fn quantity(&self) -> Amount {
        self.quantity
    }

    pub fn unit_rate(&self) -> Amount {
        self.unit_rate
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// Invariant: only items with a strictly positive quantity are invoiced.
    pub fn is_retained(&self) -> bool {
        self.quantity > Decimal::ZERO
    }
}

/// Output of [`validate_line_item`]: the item plus any coercions applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLineItem {
    pub item: LineItem,
    pub coerced: Vec<InvalidNumericField>,
}

/// Normalize one raw line item. Never fails.
///
/// Fail-soft rule: a quantity or rate that is missing, blank or not a decimal
/// number becomes `0` for that field alone. If the product of the two
/// overflows, both become `0`, which drops the line.
pub fn validate_line_item(raw: &RawLineItem) -> ValidatedLineItem {
    let mut coerced = Vec::new();

    let quantity = coerce(NumericField::Quantity, raw.quantity.as_deref(), &mut coerced);
    let unit_rate = coerce(NumericField::Rate, raw.rate.as_deref(), &mut coerced);

    let item = match LineItem::new(&raw.description, &raw.hsn_code, quantity, unit_rate) {
        Ok(item) => item,
        Err(_) => {
            coerced.push(InvalidNumericField {
                field: NumericField::Quantity,
                raw: raw.quantity.clone(),
            });
            coerced.push(InvalidNumericField {
                field: NumericField::Rate,
                raw: raw.rate.clone(),
            });
            LineItem {
                description: raw.description.clone(),
                hsn_code: raw.hsn_code.clone(),
                quantity: Decimal::ZERO,
                unit_rate: Decimal::ZERO,
                amount: Decimal::ZERO,
            }
        }
    };

    ValidatedLineItem { item, coerced }
}

fn coerce(
    field: NumericField,
    text: Option<&str>,
    coerced: &mut Vec<InvalidNumericField>,
) -> Amount {
    match text.and_then(parse_decimal) {
        Some(value) => value,
        None => {
            coerced.push(InvalidNumericField {
                field,
                raw: text.map(str::to_string),
            });
            Decimal::ZERO
        }
    }
}

/// Plain notation first (`"50.00"`, `"-1"`), then scientific (`"1e3"`).
fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn computes_amount_from_quantity_and_rate() {
        let v = validate_line_item(&RawLineItem::new("Widget", "1234", "2", "50.00"));
        assert!(v.coerced.is_empty());
        assert_eq!(v.item.quantity(), d("2"));
        assert_eq!(v.item.unit_rate(), d("50"));
        assert_eq!(v.item.amount(), d("100"));
        assert_eq!(v.item.description(), "Widget");
        assert_eq!(v.item.hsn_code(), "1234");
        assert!(v.item.is_retained());
    }

    #[test]
    fn unparsable_rate_coerces_only_the_rate() {
        let v = validate_line_item(&RawLineItem::new("A", "", "3", "bad"));
        assert_eq!(v.item.quantity(), d("3"));
        assert_eq!(v.item.unit_rate(), Decimal::ZERO);
        assert_eq!(v.item.amount(), Decimal::ZERO);
        assert!(v.item.is_retained());
        assert_eq!(
            v.coerced,
            vec![InvalidNumericField {
                field: NumericField::Rate,
                raw: Some("bad".to_string()),
            }]
        );
    }

    #[test]
    fn missing_and_blank_fields_become_zero() {
        let raw = RawLineItem {
            description: "Bolt".to_string(),
            hsn_code: String::new(),
            quantity: None,
            rate: Some("   ".to_string()),
        };
        let v = validate_line_item(&raw);
        assert_eq!(v.item.quantity(), Decimal::ZERO);
        assert_eq!(v.item.unit_rate(), Decimal::ZERO);
        assert!(!v.item.is_retained());
        assert_eq!(v.coerced.len(), 2);
        assert_eq!(v.coerced[0].field, NumericField::Quantity);
        assert_eq!(v.coerced[0].raw, None);
        assert_eq!(v.coerced[1].raw.as_deref(), Some("   "));
    }

    #[test]
    fn negative_quantity_is_kept_numerically_but_not_retained() {
        let v = validate_line_item(&RawLineItem::new("Bolt", "", "-1", "10"));
        assert!(v.coerced.is_empty());
        assert_eq!(v.item.quantity(), d("-1"));
        assert!(!v.item.is_retained());
    }

    #[test]
    fn accepts_whitespace_and_scientific_notation() {
        let v = validate_line_item(&RawLineItem::new("Sheet", "", " 1e3 ", "0.5"));
        assert!(v.coerced.is_empty());
        assert_eq!(v.item.quantity(), d("1000"));
        assert_eq!(v.item.amount(), d("500"));
    }

    #[test]
    fn negative_rate_is_allowed() {
        let v = validate_line_item(&RawLineItem::new("Discount", "", "1", "-25.50"));
        assert!(v.item.is_retained());
        assert_eq!(v.item.amount(), d("-25.50"));
    }

    #[test]
    fn overflowing_product_drops_the_line() {
        let huge = "79228162514264337593543950335";
        let v = validate_line_item(&RawLineItem::new("Huge", "", huge, huge));
        assert_eq!(v.item.quantity(), Decimal::ZERO);
        assert_eq!(v.item.amount(), Decimal::ZERO);
        assert!(!v.item.is_retained());
        assert_eq!(v.coerced.len(), 2);
    }
}
