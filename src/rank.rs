use serde::{Deserialize, Serialize};

/// Ordinal authorization level. Variant order defines the ladder:
/// crew < captain < commodore < admiral.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "rank", rename_all = "lowercase")]
pub enum Rank {
    Crew,
    Captain,
    Commodore,
    Admiral,
}

impl Rank {
    /// Ordinal check against a minimum required rank. This is the entire
    /// authorization model: no attribute rules, no delegation.
    pub fn meets(self, min: Rank) -> bool {
        self >= min
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rank::Crew => "crew",
            Rank::Captain => "captain",
            Rank::Commodore => "commodore",
            Rank::Admiral => "admiral",
        }
    }
}

impl Default for Rank {
    fn default() -> Self {
        Rank::Crew
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Rank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crew" => Ok(Rank::Crew),
            "captain" => Ok(Rank::Captain),
            "commodore" => Ok(Rank::Commodore),
            "admiral" => Ok(Rank::Admiral),
            other => Err(format!("unknown rank: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "subscription_status", rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Expired,
    Lifetime,
    Cancelled,
}

/// Onboarding state. Once complete it never regresses, including across
/// repeated session mints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "setup_status", rename_all = "lowercase")]
pub enum SetupStatus {
    Pending,
    Complete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_is_a_strict_total_order() {
        assert!(Rank::Crew < Rank::Captain);
        assert!(Rank::Captain < Rank::Commodore);
        assert!(Rank::Commodore < Rank::Admiral);
    }

    #[test]
    fn captain_meets_captain_and_below() {
        assert!(Rank::Captain.meets(Rank::Crew));
        assert!(Rank::Captain.meets(Rank::Captain));
    }

    #[test]
    fn captain_rejected_by_admiral_gate() {
        assert!(!Rank::Captain.meets(Rank::Admiral));
        assert!(!Rank::Captain.meets(Rank::Commodore));
    }

    #[test]
    fn parses_and_displays_round_trip() {
        for rank in [Rank::Crew, Rank::Captain, Rank::Commodore, Rank::Admiral] {
            assert_eq!(rank.to_string().parse::<Rank>().unwrap(), rank);
        }
        assert!("pirate".parse::<Rank>().is_err());
    }

    #[test]
    fn default_rank_is_crew() {
        assert_eq!(Rank::default(), Rank::Crew);
    }
}
