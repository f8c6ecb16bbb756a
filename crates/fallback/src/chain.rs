use crate::error::{ErrorKind, Result};
use crate::table::{StaticVerseTable, failsafe, popular_references};
use crate::tier::FallbackTier;
use lectio_cache::TextResolutionCache;
use lectio_canon::VerseReference;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::sync::Arc;

/// A verse served by the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmergencyVerse {
    pub reference: VerseReference,
    pub text: String,
    pub tier: FallbackTier,
}

/// Produces verses when the normal path cannot.
///
/// Tiers are consulted in [`FallbackTier::ALL`] order, each only for the
/// shortfall left by the tiers before it. Verses from earlier tiers are kept.
/// A reference is never served twice by the table tiers; only the failsafe
/// verse repeats.
pub struct FallbackChain {
    cache: Arc<TextResolutionCache>,
    version: String,
    offline: StaticVerseTable,
    hardcoded: StaticVerseTable,
}

impl FallbackChain {
    /// Chain over the bundled tables; popular verses resolve in `version`.
    pub fn new(cache: Arc<TextResolutionCache>, version: impl Into<String>) -> Self {
        Self {
            cache,
            version: version.into(),
            offline: StaticVerseTable::offline().clone(),
            hardcoded: StaticVerseTable::hardcoded().clone(),
        }
    }

    /// Replace the bundled offline and hardcoded tables.
    pub fn with_tables(self, offline: StaticVerseTable, hardcoded: StaticVerseTable) -> Self {
        Self {
            offline,
            hardcoded,
            ..self
        }
    }

    pub fn offline_table(&self) -> &StaticVerseTable {
        &self.offline
    }

    pub fn hardcoded_table(&self) -> &StaticVerseTable {
        &self.hardcoded
    }

    /// Exactly `count` verses. Never fails.
    pub async fn get_emergency_verses(&self, count: usize) -> Vec<EmergencyVerse> {
        self.get_emergency_verses_excluding(count, &HashSet::new()).await
    }

    /// Exactly `count` verses, none of them in `exclude` unless only the
    /// failsafe is left. Never fails.
    #[tracing::instrument(level = "debug", skip(self, exclude), fields(excluded = exclude.len()))]
    pub async fn get_emergency_verses_excluding(
        &self,
        count: usize,
        exclude: &HashSet<VerseReference>,
    ) -> Vec<EmergencyVerse> {
        let mut verses: Vec<EmergencyVerse> = Vec::with_capacity(count);
        for tier in FallbackTier::ALL {
            let shortfall = count - verses.len();
            if shortfall == 0 {
                break;
            }
            let mut served = exclude.clone();
            served.extend(verses.iter().map(|verse| verse.reference));
            let outcome = match tier {
                FallbackTier::Popular => self.popular(shortfall, &served).await,
                FallbackTier::OfflineStatic => Self::from_table(&self.offline, tier, shortfall, &served),
                FallbackTier::Hardcoded => Self::from_table(&self.hardcoded, tier, shortfall, &served),
                FallbackTier::Failsafe => Ok(Self::failsafe(shortfall)),
            };
            match outcome {
                Ok(found) => {
                    if found.len() < shortfall {
                        tracing::debug!(%tier, found = found.len(), shortfall, "Fallback tier partially served");
                    }
                    verses.extend(found);
                },
                Err(err) => tracing::warn!(%tier, error = ?err, "Fallback tier unavailable"),
            }
        }
        verses
    }

    async fn popular(&self, amount: usize, exclude: &HashSet<VerseReference>) -> Result<Vec<EmergencyVerse>> {
        let candidates: Vec<VerseReference> =
            popular_references().iter().filter(|reference| !exclude.contains(reference)).copied().collect();
        let picks: Vec<VerseReference> =
            candidates.choose_multiple(&mut rand::thread_rng(), amount).copied().collect();
        let mut verses = Vec::with_capacity(picks.len());
        let mut last_error = None;
        for reference in picks {
            match self.cache.resolve(&reference, &self.version).await {
                Ok(passage) => verses.push(EmergencyVerse {
                    reference,
                    text: passage.text,
                    tier: FallbackTier::Popular,
                }),
                Err(err) => last_error = Some(err),
            }
        }
        match (verses.is_empty(), last_error) {
            (true, Some(err)) => Err(err.raise(ErrorKind::TierExhausted(FallbackTier::Popular))),
            (true, None) => exn::bail!(ErrorKind::TierExhausted(FallbackTier::Popular)),
            (false, _) => Ok(verses),
        }
    }

    fn from_table(
        table: &StaticVerseTable,
        tier: FallbackTier,
        amount: usize,
        exclude: &HashSet<VerseReference>,
    ) -> Result<Vec<EmergencyVerse>> {
        let verses: Vec<EmergencyVerse> = table
            .sample(amount, exclude, &mut rand::thread_rng())
            .into_iter()
            .map(|(reference, text)| EmergencyVerse {
                reference,
                text: text.to_string(),
                tier,
            })
            .collect();
        if verses.is_empty() {
            exn::bail!(ErrorKind::TierExhausted(tier));
        }
        Ok(verses)
    }

    fn failsafe(amount: usize) -> Vec<EmergencyVerse> {
        let (reference, text) = failsafe();
        let verse = EmergencyVerse {
            reference,
            text: text.to_string(),
            tier: FallbackTier::Failsafe,
        };
        vec![verse; amount]
    }
}
