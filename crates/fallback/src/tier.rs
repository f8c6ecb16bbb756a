use derive_more::Display;

/// Fallback strategies, most preferred first.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FallbackTier {
    /// Well-known verses, still resolved through the cache and provider.
    #[display("popular")]
    Popular,
    /// Bundled table; needs no network.
    #[display("offline")]
    OfflineStatic,
    /// Smaller bundled table.
    #[display("hardcoded")]
    Hardcoded,
    /// One constant verse, repeated as often as needed. Cannot fail.
    #[display("failsafe")]
    Failsafe,
}

impl FallbackTier {
    pub const ALL: [FallbackTier; 4] = [Self::Popular, Self::OfflineStatic, Self::Hardcoded, Self::Failsafe];

    /// Source label recorded alongside verses served by this tier.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Popular => "popular_verses_fallback",
            Self::OfflineStatic => "offline_emergency",
            Self::Hardcoded => "hardcoded_emergency",
            Self::Failsafe => "ultimate_failsafe",
        }
    }

    /// Whether this tier works without the network.
    pub fn is_offline(&self) -> bool {
        !matches!(self, Self::Popular)
    }
}
