use lectio_cache::CacheStats;
use lectio_canon::VerseReference;
use lectio_distribute::DistributionStats;
use lectio_fallback::FallbackTier;
use std::fmt;

/// Where the text of a [`BatchVerse`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerseSource {
    /// Resolved through the cache; carries the upstream label.
    Resolved(String),
    /// Supplied by a fallback tier.
    Fallback(FallbackTier),
}

impl VerseSource {
    pub fn label(&self) -> &str {
        match self {
            Self::Resolved(source) => source,
            Self::Fallback(tier) => tier.label(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// One verse of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchVerse {
    pub reference: VerseReference,
    pub text: String,
    pub source: VerseSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceStats {
    pub cache: CacheStats,
    pub distribution: DistributionStats,
}

/// Outcome of [`VerseService::health`](crate::VerseService::health).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    /// The provider answered a test fetch.
    pub online: bool,
    /// The store answered a read.
    pub store_reachable: bool,
    /// The persisted cache is absent or parses.
    pub cache_readable: bool,
    pub offline_verses: bool,
    pub hardcoded_verses: bool,
    pub recommendations: Vec<String>,
}

impl HealthReport {
    pub(crate) fn new(
        online: bool,
        store_reachable: bool,
        cache_readable: bool,
        offline_verses: bool,
        hardcoded_verses: bool,
    ) -> Self {
        let mut recommendations = Vec::new();
        if !online {
            recommendations.push("No connection to any text provider; serving offline verses".to_string());
        }
        if !store_reachable {
            recommendations.push("Persisted store unreachable; progress will not survive a restart".to_string());
        }
        if !cache_readable {
            recommendations.push("Verse cache is corrupted; run `repair` to rebuild it".to_string());
        }
        if !offline_verses {
            recommendations.push("Offline verses unavailable; fallback options are limited".to_string());
        }
        if !hardcoded_verses {
            recommendations.push("Hardcoded verses unavailable; only the failsafe verse remains".to_string());
        }
        let mut report = Self {
            online,
            store_reachable,
            cache_readable,
            offline_verses,
            hardcoded_verses,
            recommendations,
        };
        if report.is_healthy() {
            report.recommendations.push("All systems working normally".to_string());
        }
        report
    }

    pub fn is_healthy(&self) -> bool {
        self.online && self.store_reachable && self.cache_readable && self.offline_verses && self.hardcoded_verses
    }
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |ok: bool| if ok { "ok" } else { "FAILED" };
        writeln!(f, "online:           {}", mark(self.online))?;
        writeln!(f, "store reachable:  {}", mark(self.store_reachable))?;
        writeln!(f, "cache readable:   {}", mark(self.cache_readable))?;
        writeln!(f, "offline verses:   {}", mark(self.offline_verses))?;
        writeln!(f, "hardcoded verses: {}", mark(self.hardcoded_verses))?;
        for recommendation in &self.recommendations {
            writeln!(f, "- {recommendation}")?;
        }
        Ok(())
    }
}

/// Outcome of [`VerseService::repair`](crate::VerseService::repair).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairReport {
    pub cache_cleared: bool,
    /// Popular verses resolved into the fresh cache.
    pub preloaded: usize,
    pub requested: usize,
}

impl fmt::Display for RepairReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cache_cleared {
            true => writeln!(f, "Cache cleared")?,
            false => writeln!(f, "Cache could not be cleared")?,
        }
        writeln!(f, "Popular verses preloaded: {}/{}", self.preloaded, self.requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_report() {
        let report = HealthReport::new(true, true, true, true, true);
        assert!(report.is_healthy());
        assert_eq!(report.recommendations, ["All systems working normally"]);
    }

    #[test]
    fn test_unhealthy_report() {
        let report = HealthReport::new(false, true, false, true, true);
        assert!(!report.is_healthy());
        assert_eq!(report.recommendations.len(), 2);
        assert!(report.to_string().contains("online:           FAILED"));
    }

    #[test]
    fn test_source_labels() {
        assert_eq!(VerseSource::Resolved("bible-api".to_string()).label(), "bible-api");
        assert_eq!(VerseSource::Fallback(FallbackTier::Failsafe).label(), "ultimate_failsafe");
        assert!(VerseSource::Fallback(FallbackTier::Hardcoded).is_fallback());
    }
}
