//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `apptareas_core` linkage.
//! - Walk one sign-up, create, list and delete pass against an in-memory
//!   database with deterministic output.
//! - Write file logs only when `APPTAREAS_LOG_DIR` is set.

use apptareas_core::db::open_db_in_memory;
use apptareas_core::{
    init_logging, AppConfig, AuthStateHolder, DetailStateHolder, ListStateHolder,
    SessionContext, SqliteRepository,
};
use std::error::Error;
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    println!("apptareas_core ping={}", apptareas_core::ping());
    println!("apptareas_core version={}", apptareas_core::core_version());

    let config = AppConfig::from_env()?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, &log_dir.to_string_lossy())?;
    }

    let repo = SqliteRepository::new(open_db_in_memory()?)?;
    let session = SessionContext::start(Arc::new(repo));
    let auth = AuthStateHolder::new(session.clone());
    let list = ListStateHolder::new(session.clone());
    let detail = DetailStateHolder::new(session.clone());

    auth.set_sign_up_fields("smoke@example.com", "smoke-pass", "smoke-pass");
    auth.sign_up().await?;
    println!("signed_in={}", session.has_user());

    detail.load_for_edit("").await?;
    detail.set_subject("Smoke");
    detail.set_description("Linkage check");
    let examen_id = detail.submit_create().await?;
    if let Some(event) = detail.try_next_event() {
        println!("detail_event={event:?}");
    }
    detail.reset_completion_flags();

    list.load_records().await?;
    println!("records={}", record_count(&list));

    list.delete_record(&examen_id).await?;
    println!("records_after_delete={}", record_count(&list));

    auth.sign_out().await?;
    println!("signed_in={}", session.has_user());
    Ok(())
}

fn record_count(list: &ListStateHolder) -> usize {
    list.state().data().map_or(0, Vec::len)
}
