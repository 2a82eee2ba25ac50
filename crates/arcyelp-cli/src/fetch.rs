//! Fetch pipeline: searches Yelp for each term, enriches the results and
//! writes them to a document store.

use std::collections::BTreeSet;
use std::time::Instant;

use anyhow::Context;
use arcyelp_core::{EnrichOptions, RawBusinessRecord, ToDocument, enrich};
use arcyelp_fusion::{FusionClient, SearchParams};
use arcyelp_store::DocumentStore;
use futures::future::join_all;

#[derive(Debug)]
pub struct FetchStats {
    pub fetched: usize,
    pub unique: usize,
    pub stored: usize,
    pub skipped: usize,
    pub elapsed_secs: f64,
}

/// Run one search per term around the same point, then enrich and store the
/// union of the results. Businesses returned by several terms are kept once.
pub async fn run_fetch_pipeline(
    client: &FusionClient,
    store: &dyn DocumentStore,
    base: &SearchParams,
    terms: &[String],
    options: &EnrichOptions,
) -> anyhow::Result<FetchStats> {
    let start = Instant::now();

    let searches: Vec<SearchParams> = if terms.is_empty() {
        vec![base.clone()]
    } else {
        terms.iter().map(|t| base.clone().term(t.as_str())).collect()
    };

    let results = join_all(searches.iter().map(|p| client.search(p))).await;

    let mut seen = BTreeSet::new();
    let mut records: Vec<RawBusinessRecord> = Vec::new();
    let mut fetched = 0usize;
    for (params, result) in searches.iter().zip(results) {
        let found = result.with_context(|| format!("searching for {:?}", params.term))?;
        eprintln!("  {:<24} {} businesses", params.term, found.len());
        fetched += found.len();
        records.extend(found.into_iter().filter(|r| seen.insert(r.id.clone())));
    }

    if records.is_empty() {
        return Ok(FetchStats {
            fetched,
            unique: 0,
            stored: 0,
            skipped: 0,
            elapsed_secs: start.elapsed().as_secs_f64(),
        });
    }

    let outcome = enrich(&records, options).context("enriching businesses")?;
    for id in outcome.failed_ids() {
        eprintln!("  Skipped {id}: no coordinates");
    }

    let documents = outcome
        .records
        .iter()
        .map(|r| r.to_document())
        .collect::<Result<Vec<_>, _>>()
        .context("building documents")?;

    eprintln!("  Writing {} documents...", documents.len());
    let stored = store.upsert(&documents).await.context("writing to store")?;

    Ok(FetchStats {
        fetched,
        unique: records.len(),
        stored,
        skipped: outcome.failures.len(),
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}
