//! A simulated crawl that survives being killed.
//!
//! Each second the crawl "fetches" one page, appends it to `items.jsonl` and
//! records the next page in `next_page`. Every ten seconds the controller
//! pauses it and snapshots the job directory. Kill the process with Ctrl-C
//! and run it again: it resumes from the last snapshot instead of page 1.
//!
//! ```text
//! RUST_LOG=debug cargo run --example checkpointed_job
//! ```

use async_trait::async_trait;
use dircheckpoint::controller::{
    CompletionHandle, Controller, ControllerConfig, SuspendToken, WorkUnit, WorkUnitError,
    JOB_DIR_SETTING,
};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{error, info};

const LAST_PAGE: u32 = 25;

struct SimulatedCrawl {
    dir: PathBuf,
    stop: Option<oneshot::Sender<SuspendToken>>,
}

fn next_page(dir: &Path) -> u32 {
    fs::read_to_string(dir.join("next_page"))
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(1)
}

fn fetch(dir: &Path, page: u32) -> std::io::Result<()> {
    let mut items = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("items.jsonl"))?;
    writeln!(items, r#"{{"page":{page},"quote":"quote from page {page}"}}"#)?;
    fs::write(dir.join("next_page"), (page + 1).to_string())
}

async fn crawl(
    dir: PathBuf,
    mut page: u32,
    done: CompletionHandle,
    mut stop: oneshot::Receiver<SuspendToken>,
) {
    loop {
        tokio::select! {
            token = &mut stop => {
                if let Ok(token) = token {
                    info!(page, "Crawl paused");
                    done.suspended(token);
                }
                return;
            }
            () = tokio::time::sleep(Duration::from_secs(1)) => {
                if let Err(e) = fetch(&dir, page) {
                    error!(page, error = %e, "Fetch failed; stopping crawl");
                    done.finished();
                    return;
                }
                info!(page, "Fetched page");
                if page == LAST_PAGE {
                    done.finished();
                    return;
                }
                page += 1;
            }
        }
    }
}

#[async_trait]
impl WorkUnit for SimulatedCrawl {
    async fn begin(&mut self, name: &str, done: CompletionHandle) -> Result<(), WorkUnitError> {
        let page = next_page(&self.dir);
        info!(%name, page, cycle = done.cycle(), "Starting crawl");

        let (tx, rx) = oneshot::channel();
        self.stop = Some(tx);
        tokio::spawn(crawl(self.dir.clone(), page, done, rx));
        Ok(())
    }

    async fn suspend(&mut self, token: SuspendToken) -> Result<(), WorkUnitError> {
        if let Some(stop) = self.stop.take() {
            // The crawl may have finished already; its completion is then in flight.
            let _ = stop.send(token);
        }
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> dircheckpoint::Result<()> {
    dircheckpoint::init_logging("info")?;

    let config = ControllerConfig {
        name: Some("quotes".to_string()),
        interval_secs: Some(10),
        ..Default::default()
    }
    .with_setting("LOG_FILE", "logs.txt")
    .with_setting(JOB_DIR_SETTING, "ds");

    let work = SimulatedCrawl {
        dir: config.job_dir().unwrap_or_else(|| PathBuf::from("ds")),
        stop: None,
    };

    let report = Controller::new(&config, work)?.run().await?;
    info!(
        name = %report.name,
        cycles = report.cycles,
        checkpoints = report.checkpoints,
        "Crawl finished"
    );
    Ok(())
}
