//! [`Amount`]-related definitions.

use std::{fmt, str::FromStr};

use derive_more::Into;
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::{prelude::ToPrimitive as _, Decimal};

/// Non-negative decimal quantity, such as a price or an area.
///
/// Unit (currency, square feet, acres) is implied by the field holding it.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, Into, Ord, PartialEq, PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Amount(Decimal);

impl Amount {
    /// Zero [`Amount`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new [`Amount`] if the provided `value` is not negative.
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        (!value.is_sign_negative() || value.is_zero())
            .then(|| Self(value.normalize()))
    }

    /// Returns the underlying [`Decimal`] of this [`Amount`].
    #[must_use]
    pub const fn decimal(self) -> Decimal {
        self.0
    }

    /// Indicates whether this [`Amount`] is zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_integer() {
            if let Some(int) = self.0.to_i128() {
                return write!(f, "{int}");
            }
        }
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for Amount {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_| "invalid number")?;
        Self::new(value).ok_or("negative amount")
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = &'static str;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value).ok_or("negative amount")
    }
}

impl From<u32> for Amount {
    fn from(value: u32) -> Self {
        Self(value.into())
    }
}

#[cfg(feature = "serde")]
mod serde {
    //! Module providing integration with [`serde`] crate.

    use std::str::FromStr as _;

    use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

    use super::Amount;

    impl Serialize for Amount {
        fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
            ser.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for Amount {
        fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
            let raw = String::deserialize(de)?;
            Self::from_str(&raw).map_err(D::Error::custom)
        }
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Non-negative decimal number, serialized as a string to keep its
    /// precision (e.g. `"900000"`, `"1200.5"`).
    #[graphql_scalar(with = Self, parse_token(String))]
    type Amount = super::Amount;

    impl Amount {
        fn to_output<S: ScalarValue>(a: &Amount) -> Value<S> {
            Value::scalar(a.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Amount` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Amount` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Amount;

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn rejects_negative() {
        assert!(Amount::new(decimal("-0.01")).is_none());
        assert!(Amount::from_str("-5").is_err());
        assert_eq!(Amount::new(Decimal::ZERO), Some(Amount::ZERO));
        assert!(Amount::from_str("12.5").is_ok());
        assert!(Amount::from_str("twelve").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(Amount::from_str("900000").unwrap().to_string(), "900000");
        assert_eq!(Amount::from_str("1200.00").unwrap().to_string(), "1200");
        assert_eq!(Amount::from_str("1200.50").unwrap().to_string(), "1200.5");
    }

    #[test]
    fn orders_numerically() {
        let small = Amount::from_str("999.99").unwrap();
        let big = Amount::from_str("1000").unwrap();

        assert!(small < big);
        assert_eq!(small.max(big), big);
        assert_eq!(Amount::ZERO.max(small), small);
    }
}
