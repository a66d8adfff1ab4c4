//! Metric extraction: one run's population table to its statistics.
//!
//! Two kinds of metric:
//!   1. Canonical metrics: a fixed, ordered key set (`Metric::ALL`).
//!      Every one is always present, even when its aggregate is zero.
//!   2. Breakdowns: "number of people with <v> <feature>" keys, one per
//!      distinct value observed in the data. The key set is open-ended.
//!
//! Both are written to the per-run artifact. Only canonical metrics feed
//! the comparison table.

use crate::{
    cohort_store::InitialCohortSummary,
    error::{PostsimError, PostsimResult},
    population::{DeathReason, PopulationTable},
    stats_file,
    types::NA,
};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

// ── Values ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Count(i64),
    Real(f64),
    /// Mean over zero values.
    NoData,
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Real(x) if x.is_finite() => write!(f, "{x}"),
            _ => f.write_str(NA),
        }
    }
}

// ── Canonical metrics ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    TreatmentInitiations,
    SvrCases,
    EotCases,
    NonToxicityWithdrawals,
    ToxicityCases,
    AvgLifeSpanYears,
    CirrhoticPeople,
    LiverRelatedDeaths,
    InitialInfections,
    IncidentInfections,
    TotalInfections,
    InitialIdentifications,
    IncidentIdentifications,
    TotalIdentifications,
    AcuteClearances,
    TotalAbScreenings,
    TotalRnaScreenings,
    TotalLinkages,
    AvgCost,
    AvgDiscountedCost,
    AvgQalyMinimal,
    AvgDiscountedQalyMinimal,
    AvgQalyMultiplicative,
    AvgDiscountedQalyMultiplicative,
}

impl Metric {
    /// Emission order in the per-run artifact.
    pub const ALL: [Metric; 24] = [
        Metric::TreatmentInitiations,
        Metric::SvrCases,
        Metric::EotCases,
        Metric::NonToxicityWithdrawals,
        Metric::ToxicityCases,
        Metric::AvgLifeSpanYears,
        Metric::CirrhoticPeople,
        Metric::LiverRelatedDeaths,
        Metric::InitialInfections,
        Metric::IncidentInfections,
        Metric::TotalInfections,
        Metric::InitialIdentifications,
        Metric::IncidentIdentifications,
        Metric::TotalIdentifications,
        Metric::AcuteClearances,
        Metric::TotalAbScreenings,
        Metric::TotalRnaScreenings,
        Metric::TotalLinkages,
        Metric::AvgCost,
        Metric::AvgDiscountedCost,
        Metric::AvgQalyMinimal,
        Metric::AvgDiscountedQalyMinimal,
        Metric::AvgQalyMultiplicative,
        Metric::AvgDiscountedQalyMultiplicative,
    ];

    /// Breakdown keys are written right after this metric.
    const BREAKDOWNS_AFTER: Metric = Metric::ToxicityCases;

    pub fn name(self) -> &'static str {
        match self {
            Self::TreatmentInitiations => "number of treatment initiations",
            Self::SvrCases => "number of SVR cases",
            Self::EotCases => "number of EOT cases (including SVRs)",
            Self::NonToxicityWithdrawals => "number of non-toxicity treatment withdrawal cases",
            Self::ToxicityCases => "number of toxicity cases",
            Self::AvgLifeSpanYears => "Avg Life Span per person in Years",
            Self::CirrhoticPeople => "number of cirrhotic people",
            Self::LiverRelatedDeaths => "number of liver related deaths",
            Self::InitialInfections => "number of initial HCV infections",
            Self::IncidentInfections => "number of incident HCV infections",
            Self::TotalInfections => "number of total HCV infections",
            Self::InitialIdentifications => "number of initial HCV identifications",
            Self::IncidentIdentifications => "number of incident HCV identifications",
            Self::TotalIdentifications => "number of total HCV identifications",
            Self::AcuteClearances => "number of acute infection clearance",
            Self::TotalAbScreenings => "total number of ab screenings",
            Self::TotalRnaScreenings => "total number of rna screenings",
            Self::TotalLinkages => "total number of linkages",
            Self::AvgCost => "Avg Cost per person in USD",
            Self::AvgDiscountedCost => "Avg Discounted Cost per person in USD",
            Self::AvgQalyMinimal => "Avg QALY per person minimal method",
            Self::AvgDiscountedQalyMinimal => "Avg Discounted QALY per person minimal method",
            Self::AvgQalyMultiplicative => "Avg QALY per person multiplicative method",
            Self::AvgDiscountedQalyMultiplicative => {
                "Avg Discounted QALY per person multiplicative method"
            }
        }
    }
}

// ── Breakdowns ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Breakdown {
    /// Withdrawals plus completed treatments.
    TreatmentInitializations,
    AntibodyTests,
    RnaTests,
    Linkage,
}

impl Breakdown {
    fn feature(self) -> &'static str {
        match self {
            Self::TreatmentInitializations => "treatment initializations",
            Self::AntibodyTests => "antibody tests",
            Self::RnaTests => "RNA tests",
            Self::Linkage => "linkage",
        }
    }

    pub fn key(self, value: i64) -> String {
        format!("number of people with {value} {}", self.feature())
    }
}

/// Number of rows holding each distinct value, ascending by value.
fn value_counts(values: impl IntoIterator<Item = i64>) -> BTreeMap<i64, i64> {
    let mut counts = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts
}

// ── RunStatistics ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct RunStatistics {
    canonical: BTreeMap<Metric, MetricValue>,
    breakdowns: BTreeMap<Breakdown, BTreeMap<i64, i64>>,
}

impl RunStatistics {
    pub fn get(&self, metric: Metric) -> MetricValue {
        self.canonical
            .get(&metric)
            .copied()
            .unwrap_or(MetricValue::NoData)
    }

    /// Count of people with `value` for a breakdown, `None` if unobserved.
    pub fn breakdown(&self, breakdown: Breakdown, value: i64) -> Option<i64> {
        self.breakdowns
            .get(&breakdown)
            .and_then(|counts| counts.get(&value))
            .copied()
    }

    pub fn breakdown_keys(&self) -> Vec<String> {
        self.breakdown_entries().into_iter().map(|(k, _)| k).collect()
    }

    fn breakdown_entries(&self) -> Vec<(String, MetricValue)> {
        self.breakdowns
            .iter()
            .flat_map(|(b, counts)| {
                counts
                    .iter()
                    .map(move |(v, n)| (b.key(*v), MetricValue::Count(*n)))
            })
            .collect()
    }

    /// All (name, value) pairs in artifact order.
    pub fn entries(&self) -> Vec<(String, MetricValue)> {
        let mut out = Vec::with_capacity(self.canonical.len() + 16);
        for metric in Metric::ALL {
            out.push((metric.name().to_string(), self.get(metric)));
            if metric == Metric::BREAKDOWNS_AFTER {
                out.extend(self.breakdown_entries());
            }
        }
        out
    }

    /// Write the two-column per-run artifact, replacing any previous one.
    pub fn write(&self, path: &Path) -> PostsimResult<()> {
        stats_file::write_stats(path, &self.entries())
    }
}

// ── Extraction ───────────────────────────────────────────────────────────────

fn overflow(metric: Metric) -> PostsimError {
    PostsimError::Overflow {
        metric: metric.name().to_string(),
    }
}

fn add(a: i64, b: i64, metric: Metric) -> PostsimResult<i64> {
    a.checked_add(b).ok_or_else(|| overflow(metric))
}

fn sum(column: &[i64], metric: Metric) -> PostsimResult<i64> {
    column.iter().try_fold(0i64, |acc, v| add(acc, *v, metric))
}

/// Arithmetic mean of the non-NaN values, or `NoData` when there are none.
fn mean(values: impl Iterator<Item = f64>) -> MetricValue {
    let (total, n) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(total, n), v| (total + v, n + 1));
    if n == 0 {
        return MetricValue::NoData;
    }
    MetricValue::Real(total / n as f64)
}

/// Mean of a monthly utility column, in years.
fn mean_qaly(column: &[f64]) -> MetricValue {
    mean(column.iter().map(|u| u / 12.0))
}

/// Compute every metric for one run.
pub fn extract(
    table: &PopulationTable,
    cohort: InitialCohortSummary,
) -> PostsimResult<RunStatistics> {
    use Metric::*;
    use MetricValue::{Count, Real};

    let mut canonical = BTreeMap::new();

    let completed = sum(&table.completed_treatments, EotCases)?;
    let withdrawals = sum(&table.treatment_withdrawals, NonToxicityWithdrawals)?;
    canonical.insert(
        TreatmentInitiations,
        Count(add(completed, withdrawals, TreatmentInitiations)?),
    );
    canonical.insert(SvrCases, Count(sum(&table.svrs, SvrCases)?));
    canonical.insert(EotCases, Count(completed));
    canonical.insert(NonToxicityWithdrawals, Count(withdrawals));
    canonical.insert(
        ToxicityCases,
        Count(sum(&table.toxic_reactions, ToxicityCases)?),
    );

    let life_span = match mean(table.life_span.iter().copied()) {
        Real(months) => Real(months / 12.0),
        other => other,
    };
    canonical.insert(AvgLifeSpanYears, life_span);

    let cirrhotic = table
        .fibrosis_states
        .iter()
        .filter(|s| s.is_cirrhotic())
        .count() as i64;
    canonical.insert(CirrhoticPeople, Count(cirrhotic));
    let liver_deaths = table
        .death_reasons
        .iter()
        .filter(|r| **r == DeathReason::Liver)
        .count() as i64;
    canonical.insert(LiverRelatedDeaths, Count(liver_deaths));

    let incident_infections = sum(&table.times_infected, IncidentInfections)?;
    canonical.insert(InitialInfections, Count(cohort.initial_infections));
    canonical.insert(IncidentInfections, Count(incident_infections));
    canonical.insert(
        TotalInfections,
        Count(add(
            cohort.initial_infections,
            incident_infections,
            TotalInfections,
        )?),
    );

    // Active infections nobody has identified yet. The difference can go
    // negative on inconsistent input and is reported as-is.
    let unidentified_active = table
        .identified
        .iter()
        .zip(&table.hcv)
        .filter(|(identified, stage)| !**identified && stage.is_active())
        .count() as i64;
    let incident_identified = incident_infections
        .checked_sub(unidentified_active)
        .ok_or_else(|| overflow(IncidentIdentifications))?;
    canonical.insert(InitialIdentifications, Count(cohort.initial_identified));
    canonical.insert(IncidentIdentifications, Count(incident_identified));
    canonical.insert(
        TotalIdentifications,
        Count(add(
            cohort.initial_identified,
            incident_identified,
            TotalIdentifications,
        )?),
    );

    canonical.insert(
        AcuteClearances,
        Count(sum(&table.times_acute_cleared, AcuteClearances)?),
    );
    canonical.insert(
        TotalAbScreenings,
        Count(sum(&table.ab_tests, TotalAbScreenings)?),
    );
    canonical.insert(
        TotalRnaScreenings,
        Count(sum(&table.rna_tests, TotalRnaScreenings)?),
    );
    canonical.insert(
        TotalLinkages,
        Count(sum(&table.link_counts, TotalLinkages)?),
    );

    canonical.insert(AvgCost, mean(table.cost.iter().copied()));
    canonical.insert(AvgDiscountedCost, mean(table.discount_cost.iter().copied()));

    let minimal = mean_qaly(&table.min_utility);
    let discounted_minimal = mean_qaly(&table.discounted_min_utility);
    canonical.insert(AvgQalyMinimal, minimal);
    canonical.insert(AvgDiscountedQalyMinimal, discounted_minimal);

    let (multiplicative, discounted_multiplicative) =
        match (&table.mult_utility, &table.discounted_mult_utility) {
            (Some(mult), Some(discounted)) => (mean_qaly(mult), mean_qaly(discounted)),
            _ => {
                log::debug!(
                    "metrics: no multiplicative utility columns; reusing minimal-method QALYs"
                );
                (minimal, discounted_minimal)
            }
        };
    canonical.insert(AvgQalyMultiplicative, multiplicative);
    canonical.insert(AvgDiscountedQalyMultiplicative, discounted_multiplicative);

    let initializations = table
        .treatment_withdrawals
        .iter()
        .zip(&table.completed_treatments)
        .map(|(w, c)| add(*w, *c, TreatmentInitiations))
        .collect::<PostsimResult<Vec<_>>>()?;
    let mut breakdowns = BTreeMap::new();
    breakdowns.insert(
        Breakdown::TreatmentInitializations,
        value_counts(initializations),
    );
    breakdowns.insert(
        Breakdown::AntibodyTests,
        value_counts(table.ab_tests.iter().copied()),
    );
    breakdowns.insert(
        Breakdown::RnaTests,
        value_counts(table.rna_tests.iter().copied()),
    );
    breakdowns.insert(
        Breakdown::Linkage,
        value_counts(table.link_counts.iter().copied()),
    );

    Ok(RunStatistics {
        canonical,
        breakdowns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_are_distinct() {
        let names: std::collections::HashSet<&str> =
            Metric::ALL.iter().map(|m| m.name()).collect();
        assert_eq!(names.len(), Metric::ALL.len());
    }

    #[test]
    fn sum_reports_overflow_instead_of_wrapping() {
        assert_eq!(sum(&[2, 3], Metric::SvrCases).unwrap(), 5);
        assert!(matches!(
            sum(&[i64::MAX, 1], Metric::SvrCases),
            Err(PostsimError::Overflow { ref metric }) if metric == "number of SVR cases"
        ));
    }

    #[test]
    fn mean_skips_nan_values() {
        assert_eq!(mean([2.0, f64::NAN, 4.0].into_iter()), MetricValue::Real(3.0));
        assert_eq!(mean([f64::NAN].into_iter()), MetricValue::NoData);
    }

    #[test]
    fn value_counts_are_ordered_by_value() {
        let counts = value_counts([3, 0, 3, 1, 0, 3]);
        let pairs: Vec<_> = counts.into_iter().collect();
        assert_eq!(pairs, vec![(0, 2), (1, 1), (3, 3)]);
    }

    #[test]
    fn non_finite_reals_render_as_na() {
        assert_eq!(MetricValue::Real(f64::NAN).to_string(), "NA");
        assert_eq!(MetricValue::NoData.to_string(), "NA");
        assert_eq!(MetricValue::Real(10.0).to_string(), "10");
        assert_eq!(MetricValue::Count(-2).to_string(), "-2");
    }
}
