//! Venue identity and fee schedules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A closed set of supported external venues.
///
/// Adding a venue means adding a variant here, a static fee schedule below,
/// and an [`crate::exchange::VenueAdapter`] implementation; nothing else in
/// the core assumes a fixed venue count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Polymarket,
    Kalshi,
}

/// Static, per-venue fee schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeSchedule {
    taker_fee: Decimal,
    maker_fee: Decimal,
    win_fee: Decimal,
    withdrawal_fee: Decimal,
}

impl FeeSchedule {
    #[must_use]
    pub const fn new(
        taker_fee: Decimal,
        maker_fee: Decimal,
        win_fee: Decimal,
        withdrawal_fee: Decimal,
    ) -> Self {
        Self {
            taker_fee,
            maker_fee,
            win_fee,
            withdrawal_fee,
        }
    }

    #[must_use]
    pub const fn taker_fee(&self) -> Decimal {
        self.taker_fee
    }

    #[must_use]
    pub const fn maker_fee(&self) -> Decimal {
        self.maker_fee
    }

    #[must_use]
    pub const fn win_fee(&self) -> Decimal {
        self.win_fee
    }

    #[must_use]
    pub const fn withdrawal_fee(&self) -> Decimal {
        self.withdrawal_fee
    }
}

impl Venue {
    /// Display name for logging/UX.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Polymarket => "Polymarket",
            Self::Kalshi => "Kalshi",
        }
    }

    /// Lowercase tag used in cache keys, config env vars, and persisted rows.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Polymarket => "polymarket",
            Self::Kalshi => "kalshi",
        }
    }

    /// Static fee schedule for this venue.
    #[must_use]
    pub fn fee_schedule(self) -> FeeSchedule {
        match self {
            Self::Polymarket => FeeSchedule::new(
                Decimal::new(0, 0),
                Decimal::new(0, 0),
                Decimal::new(0, 0),
                Decimal::new(0, 0),
            ),
            Self::Kalshi => FeeSchedule::new(
                Decimal::new(1, 2),
                Decimal::new(0, 0),
                Decimal::new(0, 0),
                Decimal::new(0, 0),
            ),
        }
    }

    /// The effective taker fee rate for this venue, used by the detector.
    #[must_use]
    pub fn taker_fee(self) -> Decimal {
        self.fee_schedule().taker_fee()
    }

    /// All known venues, in a stable order.
    #[must_use]
    pub const fn all() -> &'static [Venue] {
        &[Venue::Polymarket, Venue::Kalshi]
    }
}

impl std::fmt::Display for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for Venue {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "polymarket" => Ok(Self::Polymarket),
            "kalshi" => Ok(Self::Kalshi),
            other => Err(crate::error::Error::Other(format!("unknown venue: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trips_through_from_str() {
        for venue in Venue::all() {
            let parsed: Venue = venue.tag().parse().unwrap();
            assert_eq!(parsed, *venue);
        }
    }

    #[test]
    fn unknown_venue_is_rejected() {
        assert!("deribit".parse::<Venue>().is_err());
    }

    #[test]
    fn polymarket_charges_no_taker_fee() {
        assert_eq!(Venue::Polymarket.taker_fee(), Decimal::ZERO);
    }

    #[test]
    fn kalshi_charges_one_percent_taker_fee() {
        assert_eq!(Venue::Kalshi.taker_fee(), Decimal::new(1, 2));
    }
}
