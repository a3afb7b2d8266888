//! Membership levels and legacy program badges.
//!
//! Legacy members carry up to three program-completion markers (SSC, LMD,
//! SPECTRA), each holding the cohort number. The markers form a strict ladder:
//! LMD only counts on top of SSC, SPECTRA only on top of both.

use serde::{Deserialize, Serialize};

/// Eligibility level stored on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipLevel {
    /// Base level, no program completed
    Jamaah,
    /// Completed SSC
    Aktivis,
    /// Completed SSC and LMD
    Kader,
    /// Completed SSC, LMD and SPECTRA
    KaderLanjut,
}

impl MembershipLevel {
    /// Numeric rank compared against an activity's minimum level.
    pub fn value(&self) -> i32 {
        match self {
            MembershipLevel::Jamaah => 0,
            MembershipLevel::Aktivis => 3,
            MembershipLevel::Kader => 6,
            MembershipLevel::KaderLanjut => 10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipLevel::Jamaah => "jamaah",
            MembershipLevel::Aktivis => "aktivis",
            MembershipLevel::Kader => "kader",
            MembershipLevel::KaderLanjut => "kader_lanjut",
        }
    }
}

/// Legacy program-completion markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgramMarkers {
    pub ssc: Option<i64>,
    pub lmd: Option<i64>,
    pub spectra: Option<i64>,
}

impl ProgramMarkers {
    pub fn new(ssc: Option<i64>, lmd: Option<i64>, spectra: Option<i64>) -> Self {
        Self { ssc, lmd, spectra }
    }

    /// Derived membership level.
    pub fn level(&self) -> MembershipLevel {
        match (self.ssc, self.lmd, self.spectra) {
            (Some(_), Some(_), Some(_)) => MembershipLevel::KaderLanjut,
            (Some(_), Some(_), None) => MembershipLevel::Kader,
            (Some(_), _, _) => MembershipLevel::Aktivis,
            (None, _, _) => MembershipLevel::Jamaah,
        }
    }

    /// One `PROGRAM-cohort` badge per present marker, in program order.
    pub fn badges(&self) -> Vec<String> {
        [("SSC", self.ssc), ("LMD", self.lmd), ("SPECTRA", self.spectra)]
            .into_iter()
            .filter_map(|(program, cohort)| cohort.map(|c| format!("{program}-{c}")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ladder() {
        assert_eq!(
            ProgramMarkers::new(None, None, None).level(),
            MembershipLevel::Jamaah
        );
        assert_eq!(
            ProgramMarkers::new(Some(12), None, None).level(),
            MembershipLevel::Aktivis
        );
        assert_eq!(
            ProgramMarkers::new(Some(12), Some(4), None).level(),
            MembershipLevel::Kader
        );
        assert_eq!(
            ProgramMarkers::new(Some(12), Some(4), Some(2)).level(),
            MembershipLevel::KaderLanjut
        );
    }

    #[test]
    fn test_markers_without_ssc_stay_base() {
        assert_eq!(
            ProgramMarkers::new(None, Some(4), Some(2)).level(),
            MembershipLevel::Jamaah
        );
        assert_eq!(
            ProgramMarkers::new(Some(1), None, Some(2)).level(),
            MembershipLevel::Aktivis
        );
    }

    #[test]
    fn test_level_values_are_ordered() {
        assert!(MembershipLevel::Jamaah.value() < MembershipLevel::Aktivis.value());
        assert!(MembershipLevel::Aktivis.value() < MembershipLevel::Kader.value());
        assert!(MembershipLevel::Kader.value() < MembershipLevel::KaderLanjut.value());
        assert_eq!(MembershipLevel::KaderLanjut.value(), 10);
    }

    #[test]
    fn test_badges() {
        assert!(ProgramMarkers::default().badges().is_empty());
        assert_eq!(
            ProgramMarkers::new(Some(12), None, Some(3)).badges(),
            vec!["SSC-12".to_string(), "SPECTRA-3".to_string()]
        );
        assert_eq!(
            ProgramMarkers::new(Some(1), Some(2), Some(3)).badges(),
            vec!["SSC-1", "LMD-2", "SPECTRA-3"]
        );
    }
}
