use std::process::ExitCode;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::oneshot;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

use taskbox_core::{
    AppBuilder, ClientId, Config, CreateTask, FetchCallback, FileStructure, StoreStats,
    TaskRepository, TaskView, UpdateTask,
};

#[derive(Debug, Serialize)]
struct Report {
    alice: Vec<TaskView>,
    bob: Vec<TaskView>,
    stats: StoreStats,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "demo failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // (A) config を読み、store / scheduler を組み立てる
    let config = Config::from_env()?;
    let completion_max = config.completion_delay.max;
    let app = AppBuilder::new().config(config).build()?;

    let alice = ClientId::new("alice");
    let bob = ClientId::new("bob");

    // (B) タスク投入（完了ジョブは submit が積む）
    let question = app
        .submit(
            &alice,
            CreateTask::new("What is in this file?")
                .with_attachment(FileStructure::new("notes.txt", "text/plain"), "aGVsbG8gd29ybGQ="),
        )
        .await?;
    let scratch = app.submit(&alice, CreateTask::new("never mind")).await?;
    let other = app.submit(&bob, CreateTask::new("hello from bob")).await?;
    tracing::info!(alice = %question.id, bob = %other.id, "tasks submitted");

    // (C) 遅延 fetch: 完了ジョブより先に読むので done=false のはず
    let (tx, rx) = oneshot::channel();
    let callback: FetchCallback = Box::new(move |task| {
        let _ = tx.send(task);
        Ok(())
    });
    app.scheduler()
        .schedule_fetch(&alice, &question.id, Some(callback), Some(Duration::from_millis(500)))?;
    if let Ok(Some(early)) = rx.await {
        tracing::info!(task_id = %early.id, done = early.done, "fetched before completion");
    }

    // 削除済みタスクの完了ジョブは後で no-op になる
    let repo = app.repository(&alice);
    repo.delete(&scratch.id).await;
    repo.update(&question.id, UpdateTask::message("What is in notes.txt?"))
        .await?;
    let attachment = repo.get_attachment(&question.id, 0).await?;
    tracing::info!(
        filename = %attachment.descriptor.filename,
        bytes = attachment.decode()?.len(),
        "attachment retrieved"
    );

    // (D) 完了をポーリングで待つ
    let deadline = tokio::time::Instant::now() + completion_max + Duration::from_secs(1);
    loop {
        let pending = app.scheduler().pending_jobs();
        if pending == 0 || tokio::time::Instant::now() >= deadline {
            break;
        }
        sleep(Duration::from_millis(250)).await;
    }

    let report = Report {
        alice: app.repository(&alice).get_all().await,
        bob: app.repository(&bob).get_all().await,
        stats: app.stats().await,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    app.shutdown().await;
    Ok(())
}
