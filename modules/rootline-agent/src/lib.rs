//! Autonomous genealogy discovery engine.
//!
//! Three long-running loops share one Postgres-backed graph:
//!
//! - [`scheduler::ResearchScheduler`] drains the work queue, researching one
//!   person per tick against Wikidata, DBpedia, and Wikipedia, and writes
//!   merged parent/child evidence into the graph.
//! - [`enrichment::EnrichmentScheduler`] slowly backfills birth/death years,
//!   gender, era, and Wikipedia slugs. It never touches relationships.
//! - [`repair::RepairScheduler`] assigns missing categories and clears
//!   genesis flags on persons that turn out to have a father.

pub mod adapters;
pub mod categories;
pub mod enrichment;
pub mod merge;
pub mod repair;
pub mod scheduler;
pub mod seeds;
pub mod wikitext;
pub mod writer;
