//! Fixture builders shared by the integration tests.

#![allow(dead_code)]

use rusqlite::{params, Connection};
use std::fs;
use std::path::Path;

pub const POPULATION_HEADER: &str = "id,num_completed_hcv_treatments,num_hcv_treatment_withdrawals,\
num_hcv_treatment_toxic_reactions,svrs,num_hcv_ab_tests,num_hcv_rna_tests,hcv_link_count,\
life_span,fibrosis_state,death_reason,times_hcv_infected,times_acute_cleared,hcv_identified,\
hcv,cost,discount_cost,min_utility,discounted_min_utility";

/// One simulated person. Defaults describe a healthy, untreated person.
#[derive(Debug, Clone)]
pub struct Person {
    pub completed: i64,
    pub withdrawals: i64,
    pub toxic: i64,
    pub svrs: i64,
    pub ab_tests: i64,
    pub rna_tests: i64,
    pub links: i64,
    pub life_span: f64,
    pub fibrosis: &'static str,
    pub death_reason: &'static str,
    pub times_infected: i64,
    pub times_cleared: i64,
    pub identified: &'static str,
    pub hcv: &'static str,
    pub cost: f64,
    pub discount_cost: f64,
    pub min_utility: f64,
    pub discounted_min_utility: f64,
}

impl Default for Person {
    fn default() -> Self {
        Self {
            completed: 0,
            withdrawals: 0,
            toxic: 0,
            svrs: 0,
            ab_tests: 0,
            rna_tests: 0,
            links: 0,
            life_span: 0.0,
            fibrosis: "f0",
            death_reason: "",
            times_infected: 0,
            times_cleared: 0,
            identified: "false",
            hcv: "none",
            cost: 0.0,
            discount_cost: 0.0,
            min_utility: 0.0,
            discounted_min_utility: 0.0,
        }
    }
}

impl Person {
    fn row(&self, id: usize) -> String {
        format!(
            "{id},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            self.completed,
            self.withdrawals,
            self.toxic,
            self.svrs,
            self.ab_tests,
            self.rna_tests,
            self.links,
            self.life_span,
            self.fibrosis,
            self.death_reason,
            self.times_infected,
            self.times_cleared,
            self.identified,
            self.hcv,
            self.cost,
            self.discount_cost,
            self.min_utility,
            self.discounted_min_utility,
        )
    }
}

/// The person from the single-individual reference scenario.
pub fn treated_cirrhotic() -> Person {
    Person {
        completed: 1,
        svrs: 1,
        life_span: 120.0,
        fibrosis: "f4",
        cost: 1000.0,
        discount_cost: 900.0,
        min_utility: 60.0,
        discounted_min_utility: 54.0,
        ..Default::default()
    }
}

pub fn population_csv(people: &[Person]) -> String {
    let mut out = String::from(POPULATION_HEADER);
    out.push('\n');
    for (i, p) in people.iter().enumerate() {
        out.push_str(&p.row(i + 1));
        out.push('\n');
    }
    out
}

pub fn write_population(path: &Path, people: &[Person]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create population dir");
    }
    fs::write(path, population_csv(people)).expect("write population.csv");
}

/// `rows` are (hcv_status, identified_as_hcv_positive). `None` stores NULL.
pub fn write_store(path: &Path, rows: &[(i64, Option<i64>)]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create store dir");
    }
    let conn = Connection::open(path).expect("open fixture store");
    conn.execute_batch(
        "CREATE TABLE init_cohort (
            age_months INTEGER,
            hcv_status INTEGER,
            identified_as_hcv_positive INTEGER
        );",
    )
    .expect("create init_cohort");
    for (status, identified) in rows {
        conn.execute(
            "INSERT INTO init_cohort (age_months, hcv_status, identified_as_hcv_positive)
             VALUES (?1, ?2, ?3)",
            params![300i64, status, identified],
        )
        .expect("insert cohort row");
    }
}

/// Lay out `output<ID>/population.csv` and `input<ID>/inputs.db` under root.
pub fn write_run(root: &Path, id: &str, people: &[Person], cohort: Option<&[(i64, Option<i64>)]>) {
    write_population(&root.join(format!("output{id}")).join("population.csv"), people);
    if let Some(rows) = cohort {
        write_store(&root.join(format!("input{id}")).join("inputs.db"), rows);
    }
}
