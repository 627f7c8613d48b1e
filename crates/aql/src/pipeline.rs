use std::io::Write;
use std::pin::pin;
use std::sync::Arc;

use aql_cdx::{CdxClient, MatchScope};
use aql_fetch::{HostLimiter, ReqwestClient, Session};
use aql_memento::CaptureLoader;
use aql_store::{ContainerBackend, RecordLocation, RecordStore};
use aql_warc::WarcRecord;
use anyhow::{Context, Result, bail};
use futures_util::TryStreamExt;
use indicatif::MultiProgress;
use serde_json::{Value, json};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::cli::{CapturesArg, ReadArg};
use crate::config::{self, Config, ErrorPolicy, SourceConfig};
use crate::progress;
use crate::store::AnyStore;

/// `aql captures`: discovery only, one JSON object per capture.
pub async fn captures(config: &Config, arg: CapturesArg) -> Result<()> {
    let query = config::query(&arg.url, arg.scope, arg.from.as_deref(), arg.to.as_deref())?;
    let session = Session::new(ReqwestClient::new(&config.session)?, config.session.clone());
    let bar = progress::page_bar(&arg.url);
    let cdx = CdxClient::new(
        session,
        config.discovery.options().on_progress(progress::tracker(bar.clone())),
    )?;

    let captures = cdx.iter_captures(&query)?;
    let mut captures = pin!(captures);
    let mut stdout = std::io::stdout().lock();
    let mut count = 0u64;
    while let Some(capture) = captures.try_next().await? {
        serde_json::to_writer(&mut stdout, &capture)?;
        writeln!(stdout)?;
        count += 1;
    }
    stdout.flush()?;
    bar.finish_and_clear();

    info!(url = %arg.url, scope = %arg.scope.unwrap_or(MatchScope::Exact), captures = count, "discovery finished");
    Ok(())
}

/// `aql read`: print one stored record.
pub async fn read(config: &Config, arg: ReadArg) -> Result<()> {
    let location = RecordLocation::new(arg.key, arg.offset, arg.length);
    let record = AnyStore::open(config)
        .await?
        .read(&location)
        .await
        .with_context(|| format!("failed to read {location}"))?;

    let mut stdout = std::io::stdout().lock();
    if arg.raw {
        stdout.write_all(&record.to_bytes())?;
    } else {
        stdout.write_all(record.block())?;
    }
    stdout.flush()?;
    Ok(())
}

/// `aql archive`: run every source concurrently into one store.
///
/// Sources share one per-host limiter, so together they never exceed
/// `session.max_connections_per_host` against an archive.
pub async fn archive<B: ContainerBackend + 'static>(config: &Config, store: RecordStore<B>) -> Result<()> {
    if config.sources.is_empty() {
        bail!("no [[sources]] configured");
    }

    let store = Arc::new(store);
    let client = ReqwestClient::new(&config.session)?;
    let limiter = Arc::new(HostLimiter::new(config.session.max_connections_per_host));
    let multi = MultiProgress::new();
    let mut tasks = JoinSet::new();

    for source in &config.sources {
        let session = Session::with_limiter(client.clone(), config.session.clone(), Arc::clone(&limiter));
        let bar = multi.add(progress::page_bar(&source.name));
        let job = SourceJob {
            source:     source.clone(),
            cdx:        CdxClient::new(
                session.clone(),
                config.discovery.options().on_progress(progress::tracker(bar.clone())),
            )?,
            loader:     CaptureLoader::new(session, config.memento.options()),
            store:      Arc::clone(&store),
            batch_size: config.archive.batch_size.max(1),
        };
        tasks.spawn(async move {
            let name = job.source.name.clone();
            let result = job.run().await;
            bar.finish_and_clear();
            (name, result)
        });
    }

    let mut skipped = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (name, result) = joined.context("source task panicked")?;
        match result {
            Ok(summary) => info!(
                source = %name,
                captures = summary.captures,
                records = summary.records,
                "source archived"
            ),
            Err(e) => {
                error!(source = %name, error = %format!("{e:#}"), "source failed");
                if config.archive.on_error == ErrorPolicy::Abort {
                    tasks.abort_all();
                    return Err(e.context(format!("source '{name}' failed, aborting run")));
                }
                skipped.push(name);
            }
        }
    }

    if !skipped.is_empty() {
        warn!(skipped = ?skipped, "finished with failed sources");
    }
    Ok(())
}

#[derive(Debug, Default, Clone, Copy)]
struct Summary {
    captures: u64,
    records:  u64,
}

/// One source's discovery, load and store pipeline.
struct SourceJob<B: ContainerBackend> {
    source:     SourceConfig,
    cdx:        CdxClient<ReqwestClient>,
    loader:     CaptureLoader<ReqwestClient>,
    store:      Arc<RecordStore<B>>,
    batch_size: usize,
}

impl<B: ContainerBackend + 'static> SourceJob<B> {
    async fn run(self) -> Result<Summary> {
        let mut summary = Summary::default();
        let mut batch = Vec::new();

        // Whatever was loaded before a failure is still stored.
        let outcome = self.collect(&mut batch, &mut summary).await;
        let flushed = self.flush(&mut batch, &mut summary).await;
        outcome.and(flushed)?;
        Ok(summary)
    }

    async fn collect(&self, batch: &mut Vec<(String, WarcRecord)>, summary: &mut Summary) -> Result<()> {
        let query = self.source.query()?;
        let captures = self.cdx.iter_captures(&query)?;
        let mut captures = pin!(captures);

        while let Some(capture) = captures.try_next().await? {
            let records = self
                .loader
                .load_as_records(&capture, None)
                .await
                .with_context(|| format!("failed to load {} at {}", capture.url, capture.timestamp_string()))?;
            summary.captures += 1;
            batch.extend(records.into_iter().map(|record| (capture.url.clone(), record)));
            if batch.len() >= self.batch_size {
                self.flush(batch, summary).await?;
            }
        }
        Ok(())
    }

    async fn flush(&self, batch: &mut Vec<(String, WarcRecord)>, summary: &mut Summary) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let (urls, records): (Vec<_>, Vec<_>) = batch.drain(..).unzip();
        match self.store.write(records).await {
            Ok(written) => self.emit(&urls, &written, summary),
            // Containers finalized before the failure are listed all the same.
            Err(aql_store::Error::Interrupted { written, source }) => {
                self.emit(&urls, &written, summary)?;
                Err(anyhow::Error::new(*source).context(format!(
                    "store failed after {} of {} records",
                    written.len(),
                    urls.len()
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn emit(&self, urls: &[String], written: &[(WarcRecord, RecordLocation)], summary: &mut Summary) -> Result<()> {
        summary.records += written.len() as u64;
        let mut stdout = std::io::stdout().lock();
        for line in location_lines(&self.source.name, urls, written) {
            writeln!(stdout, "{line}")?;
        }
        Ok(())
    }
}

/// One output line per stored record. `written` is in input order, so it
/// lines up with the front of `urls` even when a write stopped early.
fn location_lines(source: &str, urls: &[String], written: &[(WarcRecord, RecordLocation)]) -> Vec<Value> {
    urls.iter()
        .zip(written)
        .map(|(url, (record, location))| {
            json!({
                "source": source,
                "url": url,
                "record_type": record.record_type().map(|t| t.to_string()),
                "location": location,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_writes_list_only_stored_records() {
        let urls: Vec<String> = (0..3).map(|i| format!("https://example.com/{i}")).collect();
        let written = vec![(
            WarcRecord::request(&urls[0], "GET / HTTP/1.1\r\n\r\n"),
            RecordLocation::new("abc", 120, 300),
        )];

        let lines = location_lines("example", &urls, &written);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["source"], "example");
        assert_eq!(lines[0]["url"], "https://example.com/0");
        assert_eq!(lines[0]["record_type"], "request");
        assert_eq!(lines[0]["location"]["key"], "abc");
        assert_eq!(lines[0]["location"]["offset"], 120);
    }
}
