use std::ops::Index;

use serde::{Deserialize, Serialize};

/// Filing (marital) status, the MARS code of a filing unit.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum FilingStatus {
    #[default]
    Single,
    Joint,
    Separate,
    HeadOfHousehold,
    Widow,
}

impl FilingStatus {
    pub const ALL: [FilingStatus; 5] = [
        FilingStatus::Single,
        FilingStatus::Joint,
        FilingStatus::Separate,
        FilingStatus::HeadOfHousehold,
        FilingStatus::Widow,
    ];

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(FilingStatus::Single),
            2 => Some(FilingStatus::Joint),
            3 => Some(FilingStatus::Separate),
            4 => Some(FilingStatus::HeadOfHousehold),
            5 => Some(FilingStatus::Widow),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        self.index() as i64 + 1
    }

    pub fn index(self) -> usize {
        match self {
            FilingStatus::Single => 0,
            FilingStatus::Joint => 1,
            FilingStatus::Separate => 2,
            FilingStatus::HeadOfHousehold => 3,
            FilingStatus::Widow => 4,
        }
    }
}

impl TryFrom<i64> for FilingStatus {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        FilingStatus::from_code(code).ok_or_else(|| format!("MARS must be 1..=5, got {code}"))
    }
}

impl From<FilingStatus> for i64 {
    fn from(value: FilingStatus) -> Self {
        value.code()
    }
}

/// A parameter with one value per filing status.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ByStatus(pub [f64; 5]);

impl ByStatus {
    pub fn uniform(value: f64) -> Self {
        Self([value; 5])
    }
}

impl Index<FilingStatus> for ByStatus {
    type Output = f64;

    fn index(&self, status: FilingStatus) -> &f64 {
        &self.0[status.index()]
    }
}

/// Itemized-deduction categories selected by a benefit surtax or benefit cap.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ItemizedSwitches {
    pub medical: bool,
    pub state_local: bool,
    pub real_estate: bool,
    pub casualty: bool,
    pub misc: bool,
    pub interest: bool,
    pub charity: bool,
}

impl ItemizedSwitches {
    pub const LEN: usize = 7;

    pub fn all() -> Self {
        Self::from_array([true; Self::LEN])
    }

    pub fn from_array(flags: [bool; Self::LEN]) -> Self {
        let [medical, state_local, real_estate, casualty, misc, interest, charity] = flags;
        Self {
            medical,
            state_local,
            real_estate,
            casualty,
            misc,
            interest,
            charity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filing_status_codes_round_trip_through_index() {
        for status in FilingStatus::ALL {
            assert_eq!(FilingStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(FilingStatus::from_code(0), None);
        assert_eq!(FilingStatus::from_code(6), None);
    }

    #[test]
    fn by_status_indexes_by_filing_status() {
        let thresholds = ByStatus([1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(thresholds[FilingStatus::Joint], 2.0);
        assert_eq!(thresholds[FilingStatus::Widow], 5.0);
    }

    #[test]
    fn filing_status_rejects_bad_json_code() {
        let parsed = serde_json::from_str::<FilingStatus>("7");
        assert!(parsed.is_err());
        let parsed = serde_json::from_str::<FilingStatus>("4").expect("valid code");
        assert_eq!(parsed, FilingStatus::HeadOfHousehold);
    }
}
