//! Per-individual outcome table: one row per simulated person.
//!
//! The table is held column-wise: every metric is a fold over one or two
//! columns, so each column lives in its own Vec. All Vecs have `len()`
//! entries.

use crate::error::{PostsimError, PostsimResult};
use std::io::Read;
use std::path::Path;

// ── Closed enumerations ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FibrosisState {
    None,
    F0,
    F1,
    F2,
    F3,
    F4,
    Decomp,
}

impl FibrosisState {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "f0" => Some(Self::F0),
            "f1" => Some(Self::F1),
            "f2" => Some(Self::F2),
            "f3" => Some(Self::F3),
            "f4" => Some(Self::F4),
            "decomp" => Some(Self::Decomp),
            _ => None,
        }
    }

    /// f4 and decompensated cirrhosis.
    pub fn is_cirrhotic(self) -> bool {
        matches!(self, Self::F4 | Self::Decomp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeathReason {
    /// Alive, or no reason recorded.
    Na,
    Background,
    Liver,
    Infection,
    Age,
    Overdose,
}

impl DeathReason {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" | "na" | "NA" | "nan" | "NaN" => Some(Self::Na),
            "background" => Some(Self::Background),
            "liver" => Some(Self::Liver),
            "infection" => Some(Self::Infection),
            "age" => Some(Self::Age),
            "overdose" => Some(Self::Overdose),
            _ => None,
        }
    }
}

/// Current HCV infection stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HcvStage {
    None,
    Acute,
    Chronic,
}

impl HcvStage {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "acute" => Some(Self::Acute),
            "chronic" => Some(Self::Chronic),
            _ => None,
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Acute | Self::Chronic)
    }
}

// ── Column names ──────────────────────────────────────────────────────────────

pub mod columns {
    pub const COMPLETED_TREATMENTS: &str = "num_completed_hcv_treatments";
    pub const TREATMENT_WITHDRAWALS: &str = "num_hcv_treatment_withdrawals";
    pub const TOXIC_REACTIONS: &str = "num_hcv_treatment_toxic_reactions";
    pub const SVRS: &str = "svrs";
    pub const AB_TESTS: &str = "num_hcv_ab_tests";
    pub const RNA_TESTS: &str = "num_hcv_rna_tests";
    pub const LINK_COUNT: &str = "hcv_link_count";
    pub const LIFE_SPAN: &str = "life_span";
    pub const FIBROSIS_STATE: &str = "fibrosis_state";
    pub const DEATH_REASON: &str = "death_reason";
    pub const TIMES_INFECTED: &str = "times_hcv_infected";
    pub const TIMES_ACUTE_CLEARED: &str = "times_acute_cleared";
    pub const IDENTIFIED: &str = "hcv_identified";
    pub const HCV: &str = "hcv";
    pub const COST: &str = "cost";
    pub const DISCOUNT_COST: &str = "discount_cost";
    pub const MIN_UTILITY: &str = "min_utility";
    pub const DISCOUNTED_MIN_UTILITY: &str = "discounted_min_utility";
    pub const MULT_UTILITY: &str = "mult_utility";
    pub const DISCOUNTED_MULT_UTILITY: &str = "discounted_mult_utility";
}

// ── Table ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationTable {
    pub completed_treatments: Vec<i64>,
    pub treatment_withdrawals: Vec<i64>,
    pub toxic_reactions: Vec<i64>,
    pub svrs: Vec<i64>,
    pub ab_tests: Vec<i64>,
    pub rna_tests: Vec<i64>,
    pub link_counts: Vec<i64>,
    /// Months.
    pub life_span: Vec<f64>,
    pub fibrosis_states: Vec<FibrosisState>,
    pub death_reasons: Vec<DeathReason>,
    pub times_infected: Vec<i64>,
    pub times_acute_cleared: Vec<i64>,
    pub identified: Vec<bool>,
    pub hcv: Vec<HcvStage>,
    pub cost: Vec<f64>,
    pub discount_cost: Vec<f64>,
    pub min_utility: Vec<f64>,
    pub discounted_min_utility: Vec<f64>,
    /// Only present when the simulation wrote both multiplicative columns.
    pub mult_utility: Option<Vec<f64>>,
    pub discounted_mult_utility: Option<Vec<f64>>,
}

/// Header positions of every column the extractor reads.
struct ColumnIndex {
    completed_treatments: usize,
    treatment_withdrawals: usize,
    toxic_reactions: usize,
    svrs: usize,
    ab_tests: usize,
    rna_tests: usize,
    link_counts: usize,
    life_span: usize,
    fibrosis_state: usize,
    death_reason: usize,
    times_infected: usize,
    times_acute_cleared: usize,
    identified: usize,
    hcv: usize,
    cost: usize,
    discount_cost: usize,
    min_utility: usize,
    discounted_min_utility: usize,
    mult: Option<(usize, usize)>,
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord, source: &Path) -> PostsimResult<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| PostsimError::Schema {
                column: name.to_string(),
                path: source.to_path_buf(),
            })
        };
        let mult = match (
            find(columns::MULT_UTILITY),
            find(columns::DISCOUNTED_MULT_UTILITY),
        ) {
            (Some(m), Some(d)) => Some((m, d)),
            _ => None,
        };
        Ok(Self {
            completed_treatments: require(columns::COMPLETED_TREATMENTS)?,
            treatment_withdrawals: require(columns::TREATMENT_WITHDRAWALS)?,
            toxic_reactions: require(columns::TOXIC_REACTIONS)?,
            svrs: require(columns::SVRS)?,
            ab_tests: require(columns::AB_TESTS)?,
            rna_tests: require(columns::RNA_TESTS)?,
            link_counts: require(columns::LINK_COUNT)?,
            life_span: require(columns::LIFE_SPAN)?,
            fibrosis_state: require(columns::FIBROSIS_STATE)?,
            death_reason: require(columns::DEATH_REASON)?,
            times_infected: require(columns::TIMES_INFECTED)?,
            times_acute_cleared: require(columns::TIMES_ACUTE_CLEARED)?,
            identified: require(columns::IDENTIFIED)?,
            hcv: require(columns::HCV)?,
            cost: require(columns::COST)?,
            discount_cost: require(columns::DISCOUNT_COST)?,
            min_utility: require(columns::MIN_UTILITY)?,
            discounted_min_utility: require(columns::DISCOUNTED_MIN_UTILITY)?,
            mult,
        })
    }
}

/// 2^63: the first float past `i64::MAX`.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Cells in real-valued columns that mean "no value".
const MISSING_REAL: [&str; 5] = ["", "NA", "N/A", "null", "NULL"];

/// One record plus its 1-based data row number, for error reporting.
struct Row<'a> {
    record: &'a csv::StringRecord,
    row: usize,
}

impl Row<'_> {
    fn raw(&self, idx: usize) -> &str {
        self.record.get(idx).unwrap_or("")
    }

    fn invalid(&self, column: &str, idx: usize) -> PostsimError {
        PostsimError::InvalidValue {
            column: column.to_string(),
            row: self.row,
            value: self.raw(idx).to_string(),
        }
    }

    /// Non-negative count. Integral floats ("2.0") are accepted when they
    /// fit in an `i64`.
    fn count(&self, idx: usize, column: &str) -> PostsimResult<i64> {
        let raw = self.raw(idx);
        let value = match raw.parse::<i64>() {
            Ok(v) => Some(v),
            Err(_) => raw
                .parse::<f64>()
                .ok()
                .filter(|f| f.fract() == 0.0 && (0.0..I64_LIMIT).contains(f))
                .map(|f| f as i64),
        };
        match value {
            Some(v) if v >= 0 => Ok(v),
            _ => Err(self.invalid(column, idx)),
        }
    }

    /// Real value. Empty and NA-style cells read as NaN and are left out
    /// of means.
    fn real(&self, idx: usize, column: &str) -> PostsimResult<f64> {
        let raw = self.raw(idx);
        if MISSING_REAL.contains(&raw) {
            return Ok(f64::NAN);
        }
        raw.parse::<f64>().map_err(|_| self.invalid(column, idx))
    }

    fn flag(&self, idx: usize, column: &str) -> PostsimResult<bool> {
        match self.raw(idx).to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(self.invalid(column, idx)),
        }
    }

    fn category<T>(
        &self,
        idx: usize,
        column: &str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> PostsimResult<T> {
        parse(self.raw(idx)).ok_or_else(|| self.invalid(column, idx))
    }
}

impl PopulationTable {
    /// Load `population.csv` (or any file with the same header).
    pub fn load(path: &Path) -> PostsimResult<Self> {
        if !path.is_file() {
            return Err(PostsimError::MissingInput {
                path: path.to_path_buf(),
            });
        }
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, path)
    }

    /// Parse from any reader. `source` only labels errors.
    pub fn from_reader<R: Read>(reader: R, source: &Path) -> PostsimResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader.headers()?.clone();
        let idx = ColumnIndex::resolve(&headers, source)?;

        let mut table = PopulationTable {
            mult_utility: idx.mult.map(|_| Vec::new()),
            discounted_mult_utility: idx.mult.map(|_| Vec::new()),
            ..Default::default()
        };

        let mut record = csv::StringRecord::new();
        let mut row = 0usize;
        while reader.read_record(&mut record)? {
            row += 1;
            table.push(&Row { record: &record, row }, &idx)?;
        }
        Ok(table)
    }

    fn push(&mut self, r: &Row<'_>, idx: &ColumnIndex) -> PostsimResult<()> {
        use columns::*;
        self.completed_treatments
            .push(r.count(idx.completed_treatments, COMPLETED_TREATMENTS)?);
        self.treatment_withdrawals
            .push(r.count(idx.treatment_withdrawals, TREATMENT_WITHDRAWALS)?);
        self.toxic_reactions
            .push(r.count(idx.toxic_reactions, TOXIC_REACTIONS)?);
        self.svrs.push(r.count(idx.svrs, SVRS)?);
        self.ab_tests.push(r.count(idx.ab_tests, AB_TESTS)?);
        self.rna_tests.push(r.count(idx.rna_tests, RNA_TESTS)?);
        self.link_counts.push(r.count(idx.link_counts, LINK_COUNT)?);
        self.life_span.push(r.real(idx.life_span, LIFE_SPAN)?);
        self.fibrosis_states
            .push(r.category(idx.fibrosis_state, FIBROSIS_STATE, FibrosisState::parse)?);
        self.death_reasons
            .push(r.category(idx.death_reason, DEATH_REASON, DeathReason::parse)?);
        self.times_infected
            .push(r.count(idx.times_infected, TIMES_INFECTED)?);
        self.times_acute_cleared
            .push(r.count(idx.times_acute_cleared, TIMES_ACUTE_CLEARED)?);
        self.identified.push(r.flag(idx.identified, IDENTIFIED)?);
        self.hcv.push(r.category(idx.hcv, HCV, HcvStage::parse)?);
        self.cost.push(r.real(idx.cost, COST)?);
        self.discount_cost
            .push(r.real(idx.discount_cost, DISCOUNT_COST)?);
        self.min_utility.push(r.real(idx.min_utility, MIN_UTILITY)?);
        self.discounted_min_utility
            .push(r.real(idx.discounted_min_utility, DISCOUNTED_MIN_UTILITY)?);
        if let Some((m, d)) = idx.mult {
            let mult = r.real(m, MULT_UTILITY)?;
            let discounted = r.real(d, DISCOUNTED_MULT_UTILITY)?;
            if let Some(col) = self.mult_utility.as_mut() {
                col.push(mult);
            }
            if let Some(col) = self.discounted_mult_utility.as_mut() {
                col.push(discounted);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.completed_treatments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_multiplicative_utility(&self) -> bool {
        self.mult_utility.is_some() && self.discounted_mult_utility.is_some()
    }
}
