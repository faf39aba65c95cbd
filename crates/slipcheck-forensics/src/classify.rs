// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Verdict rules over edge density and recognized text.
//
// Rules are evaluated in a fixed order:
//   1. any suspicious term in the text, or density above the fake threshold -> Fake
//   2. success marker in the text and density below the real ceiling -> Real
//   3. otherwise the policy's ambiguous verdict (Fake by default)
//
// The recompression map and metadata are collected for the report only and
// never feed the decision.

use std::fmt;

use slipcheck_core::config::ClassificationPolicy;
use slipcheck_core::types::Verdict;
use tracing::debug;

/// Which rule produced a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionRule {
    /// Recognized text contains this suspicious term.
    SuspiciousTerm(String),
    /// Edge density is above the fake threshold.
    EdgeDensityExceeded,
    /// Success marker present and edge density below the real ceiling.
    SuccessMarker,
    /// No rule matched.
    Ambiguous,
}

impl DecisionRule {
    /// Stable label written to logs and the ledger.
    pub fn label(&self) -> String {
        match self {
            Self::SuspiciousTerm(term) => format!("suspicious-term:{term}"),
            Self::EdgeDensityExceeded => "edge-density-exceeded".to_owned(),
            Self::SuccessMarker => "success-marker".to_owned(),
            Self::Ambiguous => "ambiguous".to_owned(),
        }
    }
}

impl fmt::Display for DecisionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub verdict: Verdict,
    pub rule: DecisionRule,
}

/// Applies a [`ClassificationPolicy`].
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    policy: ClassificationPolicy,
}

impl Classifier {
    pub fn new(policy: ClassificationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ClassificationPolicy {
        &self.policy
    }

    /// Decide a verdict and report the rule that fired.
    pub fn decide(&self, edge_density: u64, recognized_text: &str) -> Decision {
        let policy = &self.policy;

        let term = policy
            .suspicious_terms
            .iter()
            .find(|term| recognized_text.contains(term.as_str()));
        let decision = if let Some(term) = term {
            Decision {
                verdict: Verdict::Fake,
                rule: DecisionRule::SuspiciousTerm(term.clone()),
            }
        } else if edge_density > policy.fake_edge_density {
            Decision {
                verdict: Verdict::Fake,
                rule: DecisionRule::EdgeDensityExceeded,
            }
        } else if recognized_text.contains(policy.success_marker.as_str())
            && edge_density < policy.real_edge_density_ceiling
        {
            Decision {
                verdict: Verdict::Real,
                rule: DecisionRule::SuccessMarker,
            }
        } else {
            Decision {
                verdict: policy.ambiguous_verdict,
                rule: DecisionRule::Ambiguous,
            }
        };

        debug!(
            edge_density,
            verdict = %decision.verdict,
            rule = %decision.rule,
            "Classified"
        );
        decision
    }

    pub fn classify(&self, edge_density: u64, recognized_text: &str) -> Verdict {
        self.decide(edge_density, recognized_text).verdict
    }
}

/// Classify with the default policy.
pub fn classify(edge_density: u64, recognized_text: &str) -> Verdict {
    Classifier::default().classify(edge_density, recognized_text)
}
