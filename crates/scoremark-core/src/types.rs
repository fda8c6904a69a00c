// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Scoremark analysis engine: the fixed scoring
// domains, per-domain results, and the ranked weakness report handed to
// calling code.

use serde::{Deserialize, Serialize};

/// The two major sections of a score report.
///
/// Each section owns one half of the knowledge & skills panel: Reading &
/// Writing domains on the left, Math domains on the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    ReadingWriting,
    Math,
}

impl Section {
    /// Display name as printed on the report.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReadingWriting => "Reading and Writing",
            Self::Math => "Math",
        }
    }

    /// The section's four domains in declared report order.
    pub fn domains(&self) -> [Domain; 4] {
        match self {
            Self::ReadingWriting => [
                Domain::InformationAndIdeas,
                Domain::CraftAndStructure,
                Domain::ExpressionOfIdeas,
                Domain::StandardEnglishConventions,
            ],
            Self::Math => [
                Domain::Algebra,
                Domain::AdvancedMath,
                Domain::ProblemSolvingAndDataAnalysis,
                Domain::GeometryAndTrigonometry,
            ],
        }
    }
}

/// One of the eight fixed scoring domains.
///
/// The declared order (Reading & Writing domains first, then Math) is load
/// bearing: fallback row assignment and tie-breaking in the ranked output
/// both follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    #[serde(rename = "Information and Ideas")]
    InformationAndIdeas,
    #[serde(rename = "Craft and Structure")]
    CraftAndStructure,
    #[serde(rename = "Expression of Ideas")]
    ExpressionOfIdeas,
    #[serde(rename = "Standard English Conventions")]
    StandardEnglishConventions,
    #[serde(rename = "Algebra")]
    Algebra,
    #[serde(rename = "Advanced Math")]
    AdvancedMath,
    #[serde(rename = "Problem-Solving and Data Analysis")]
    ProblemSolvingAndDataAnalysis,
    #[serde(rename = "Geometry and Trigonometry")]
    GeometryAndTrigonometry,
}

impl Domain {
    /// All eight domains in declared report order.
    pub const ALL: [Domain; 8] = [
        Domain::InformationAndIdeas,
        Domain::CraftAndStructure,
        Domain::ExpressionOfIdeas,
        Domain::StandardEnglishConventions,
        Domain::Algebra,
        Domain::AdvancedMath,
        Domain::ProblemSolvingAndDataAnalysis,
        Domain::GeometryAndTrigonometry,
    ];

    /// Number of indicator marks printed in every domain's strip.
    pub const EXPECTED_MARKS: u32 = 14;

    /// Display name as printed on the report.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InformationAndIdeas => "Information and Ideas",
            Self::CraftAndStructure => "Craft and Structure",
            Self::ExpressionOfIdeas => "Expression of Ideas",
            Self::StandardEnglishConventions => "Standard English Conventions",
            Self::Algebra => "Algebra",
            Self::AdvancedMath => "Advanced Math",
            Self::ProblemSolvingAndDataAnalysis => "Problem-Solving and Data Analysis",
            Self::GeometryAndTrigonometry => "Geometry and Trigonometry",
        }
    }

    /// Which section this domain belongs to.
    pub fn section(&self) -> Section {
        match self {
            Self::InformationAndIdeas
            | Self::CraftAndStructure
            | Self::ExpressionOfIdeas
            | Self::StandardEnglishConventions => Section::ReadingWriting,
            Self::Algebra
            | Self::AdvancedMath
            | Self::ProblemSolvingAndDataAnalysis
            | Self::GeometryAndTrigonometry => Section::Math,
        }
    }

    /// The label phrase as lower-cased words, in print order.
    ///
    /// Recognized tokens are matched against these words exactly (after
    /// lower-casing), so the phrases must mirror the report's typography.
    pub fn label_words(&self) -> &'static [&'static str] {
        match self {
            Self::InformationAndIdeas => &["information", "and", "ideas"],
            Self::CraftAndStructure => &["craft", "and", "structure"],
            Self::ExpressionOfIdeas => &["expression", "of", "ideas"],
            Self::StandardEnglishConventions => &["standard", "english", "conventions"],
            Self::Algebra => &["algebra"],
            Self::AdvancedMath => &["advanced", "math"],
            Self::ProblemSolvingAndDataAnalysis => {
                &["problem-solving", "and", "data", "analysis"]
            }
            Self::GeometryAndTrigonometry => &["geometry", "and", "trigonometry"],
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Fill-count outcome for a single domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DomainResult {
    pub domain: Domain,
    /// Marks classified as filled in the domain's assigned row (0 if no row
    /// was assigned).
    pub filled: u32,
    /// Marks expected in a complete strip.
    pub expected: u32,
}

impl DomainResult {
    pub fn new(domain: Domain, filled: u32) -> Self {
        Self {
            domain,
            filled,
            expected: Domain::EXPECTED_MARKS,
        }
    }

    /// Expected minus filled, floored at zero; the domain's weakness proxy.
    pub fn deficit(&self) -> u32 {
        self.expected.saturating_sub(self.filled)
    }
}

/// Ranked weak-domain output of one analysis call.
///
/// Holds one [`DomainResult`] per domain in declared order; the ranked
/// domain → deficit view is the sole contract with calling code.
#[derive(Debug, Clone, Serialize)]
pub struct WeaknessReport {
    results: Vec<DomainResult>,
}

impl WeaknessReport {
    pub fn new(results: Vec<DomainResult>) -> Self {
        Self { results }
    }

    /// All per-domain results in declared order.
    pub fn results(&self) -> &[DomainResult] {
        &self.results
    }

    /// The result for one domain, if present.
    pub fn result(&self, domain: Domain) -> Option<&DomainResult> {
        self.results.iter().find(|r| r.domain == domain)
    }

    /// Domain → deficit, filtered to positive deficits and sorted by deficit
    /// descending. The sort is stable, so equal deficits keep the declared
    /// domain order.
    pub fn ranked_deficits(&self) -> Vec<(Domain, u32)> {
        let mut ranked: Vec<(Domain, u32)> = self
            .results
            .iter()
            .map(|r| (r.domain, r.deficit()))
            .filter(|(_, deficit)| *deficit > 0)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// The first `n` ranked domains — the caller's priority focus areas.
    pub fn focus_domains(&self, n: usize) -> Vec<Domain> {
        self.ranked_deficits()
            .into_iter()
            .take(n)
            .map(|(domain, _)| domain)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_order_covers_both_sections() {
        assert_eq!(Domain::ALL.len(), 8);
        assert_eq!(&Domain::ALL[..4], &Section::ReadingWriting.domains());
        assert_eq!(&Domain::ALL[4..], &Section::Math.domains());
        for domain in Section::ReadingWriting.domains() {
            assert_eq!(domain.section(), Section::ReadingWriting);
        }
        for domain in Section::Math.domains() {
            assert_eq!(domain.section(), Section::Math);
        }
    }

    #[test]
    fn label_words_are_lower_cased() {
        for domain in Domain::ALL {
            for word in domain.label_words() {
                assert_eq!(*word, word.to_lowercase(), "{domain} has a non-lowercase label word");
            }
        }
    }

    #[test]
    fn deficit_floors_at_zero() {
        let result = DomainResult::new(Domain::Algebra, 20);
        assert_eq!(result.deficit(), 0);

        let result = DomainResult::new(Domain::Algebra, 5);
        assert_eq!(result.deficit(), 9);
    }

    #[test]
    fn unassigned_domain_reports_full_deficit() {
        let result = DomainResult::new(Domain::GeometryAndTrigonometry, 0);
        assert_eq!(result.deficit(), Domain::EXPECTED_MARKS);
    }

    #[test]
    fn ranking_is_deficit_descending_with_stable_ties() {
        let report = WeaknessReport::new(vec![
            DomainResult::new(Domain::InformationAndIdeas, 14),
            DomainResult::new(Domain::CraftAndStructure, 7),
            DomainResult::new(Domain::ExpressionOfIdeas, 0),
            DomainResult::new(Domain::StandardEnglishConventions, 7),
            DomainResult::new(Domain::Algebra, 0),
        ]);

        let ranked = report.ranked_deficits();
        assert_eq!(
            ranked,
            vec![
                (Domain::ExpressionOfIdeas, 14),
                (Domain::Algebra, 14),
                (Domain::CraftAndStructure, 7),
                (Domain::StandardEnglishConventions, 7),
            ]
        );
    }

    #[test]
    fn zero_deficit_domains_are_filtered() {
        let report = WeaknessReport::new(
            Domain::ALL
                .into_iter()
                .map(|domain| DomainResult::new(domain, 14))
                .collect(),
        );
        assert!(report.ranked_deficits().is_empty());
        assert!(report.focus_domains(2).is_empty());
    }

    #[test]
    fn all_blank_ranking_preserves_declared_order() {
        let report = WeaknessReport::new(
            Domain::ALL
                .into_iter()
                .map(|domain| DomainResult::new(domain, 0))
                .collect(),
        );

        let ranked = report.ranked_deficits();
        assert_eq!(ranked.len(), 8);
        for (entry, domain) in ranked.iter().zip(Domain::ALL) {
            assert_eq!(*entry, (domain, 14));
        }
        assert_eq!(
            report.focus_domains(2),
            vec![Domain::InformationAndIdeas, Domain::CraftAndStructure]
        );
    }
}
