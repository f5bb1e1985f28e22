// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Default corpus for a vehicle service center.

use pitwall_core::{KnowledgeEntry, KnowledgeType, PitwallError};
use tracing::info;

use crate::index::KnowledgeIndex;

/// The built-in service, vehicle, FAQ, skill and policy entries.
pub fn default_corpus() -> Vec<KnowledgeEntry> {
    vec![
        KnowledgeEntry::new(
            KnowledgeType::Service,
            "oil-change",
            "Oil Change Service",
            "Full synthetic oil change service includes: drain old oil, replace oil filter, \
             refill with premium synthetic oil (5W-30 or 5W-40 depending on vehicle), check fluid \
             levels. Price: AED 280-350. Duration: 30-45 minutes. Recommended every 10,000 km or \
             6 months in UAE climate.",
            ["oil", "change", "synthetic", "filter", "maintenance", "service"],
        )
        .with_metadata("price", "280-350 AED")
        .with_metadata("duration", "30-45 min")
        .with_metadata("frequency", "10,000 km"),
        KnowledgeEntry::new(
            KnowledgeType::Service,
            "ac-repair",
            "AC Repair & Service",
            "Complete AC service including: gas recharge, compressor check, condenser cleaning, \
             leak detection, blower motor inspection. Critical in UAE summer heat. Price: AED \
             350-800 depending on issue. Can reduce fuel consumption by up to 20% when working \
             efficiently.",
            ["ac", "air", "conditioning", "cooling", "compressor", "gas", "recharge"],
        )
        .with_metadata("price", "350-800 AED")
        .with_metadata("critical", "UAE summer"),
        KnowledgeEntry::new(
            KnowledgeType::Service,
            "full-service",
            "Full Service Package",
            "Comprehensive service including: oil change, all fluid checks, brake inspection, \
             tire rotation, AC service, battery test, suspension check, engine diagnostics. \
             Price: AED 899-1,299. Duration: 2-3 hours. Recommended every 20,000 km or annually.",
            ["full", "service", "complete", "comprehensive", "package", "maintenance"],
        )
        .with_metadata("price", "899-1,299 AED")
        .with_metadata("duration", "2-3 hours"),
        KnowledgeEntry::new(
            KnowledgeType::Vehicle,
            "mercedes-g-wagon",
            "Mercedes G-Wagon Specialist Care",
            "G-Wagon requires 5W-40 fully synthetic oil. AC system critical due to high UAE \
             temperatures. Recommended service: every 10,000 km. Common issues: AC compressor, \
             suspension bushings. We specialize in Mercedes diagnostics with factory-grade \
             equipment.",
            ["mercedes", "g-wagon", "g-class", "luxury", "suv"],
        )
        .with_metadata("oil_type", "5W-40 synthetic")
        .with_metadata("brand", "Mercedes"),
        KnowledgeEntry::new(
            KnowledgeType::Faq,
            "oil-change-frequency",
            "How often should I change my oil in UAE?",
            "In UAE climate with extreme heat (45°C+), we recommend every 10,000 km or 6 months, \
             whichever comes first. Synthetic oil lasts longer than conventional. High \
             temperatures degrade oil 30% faster than cooler climates.",
            ["oil", "change", "frequency", "how", "often", "uae", "climate"],
        ),
        KnowledgeEntry::new(
            KnowledgeType::Skill,
            "diagnose-engine-noise",
            "How to discuss engine noises",
            "When customer mentions engine noise: (1) Ask when it occurs (startup, acceleration, \
             idle), (2) Ask for description (clicking, knocking, whining), (3) Recommend bringing \
             car for inspection, (4) Mention our free diagnostic service, (5) DO NOT diagnose over \
             text - safety first.",
            ["engine", "noise", "sound", "knocking", "clicking", "diagnose"],
        ),
        KnowledgeEntry::new(
            KnowledgeType::Policy,
            "warranty-policy",
            "Warranty & Guarantee",
            "All services come with 30-day or 1,000 km warranty, whichever comes first. Parts \
             have manufacturer warranty (typically 1 year). If issue returns within warranty \
             period, we fix it free of charge. Labor warranty does not cover new issues.",
            ["warranty", "guarantee", "policy", "return", "defect"],
        ),
        KnowledgeEntry::new(
            KnowledgeType::Policy,
            "payment-methods",
            "Accepted Payment Methods",
            "We accept: Cash (AED), Credit/Debit cards (Visa, MasterCard), Tabby \
             (buy-now-pay-later, 4 interest-free installments), Bank transfer. No checks \
             accepted. Payment due upon service completion.",
            ["payment", "pay", "tabby", "card", "cash", "installment"],
        ),
    ]
}

/// Adds every entry of [`default_corpus`]. Re-seeding overwrites by id.
pub async fn seed(index: &KnowledgeIndex) -> Result<usize, PitwallError> {
    let corpus = default_corpus();
    let count = corpus.len();
    for entry in corpus {
        index.add(entry).await?;
    }
    info!(entries = count, "knowledge corpus seeded");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn corpus_ids_are_unique_per_type() {
        let corpus = default_corpus();
        let keys: HashSet<_> = corpus.iter().map(|e| (e.kind, e.id.clone())).collect();
        assert_eq!(keys.len(), corpus.len());
        assert_eq!(corpus.len(), 8);
    }

    #[test]
    fn corpus_keywords_are_lowercase() {
        for entry in default_corpus() {
            assert!(!entry.keywords.is_empty(), "{} has no keywords", entry.id);
            for k in &entry.keywords {
                assert_eq!(k, &k.to_lowercase());
            }
        }
    }
}
