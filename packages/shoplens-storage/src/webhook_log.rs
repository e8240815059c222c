use std::{
	io,
	path::{Path, PathBuf},
};

use serde::Serialize;
use tokio::{
	fs::{self, OpenOptions},
	io::AsyncWriteExt,
	sync::{mpsc, oneshot},
};

use crate::{Error, Result};

struct AppendJob {
	line: String,
	done: oneshot::Sender<io::Result<()>>,
}

/// Append-only newline-delimited JSON log with a single writer task.
///
/// Callers enqueue lines and await the write result, so concurrent requests never interleave
/// partial lines in the file.
#[derive(Clone)]
pub struct WebhookLog {
	path: PathBuf,
	tx: mpsc::Sender<AppendJob>,
}
impl WebhookLog {
	/// Starts the writer task. Must be called inside a tokio runtime.
	pub fn spawn(cfg: &shoplens_config::WebhookLog) -> Self {
		let (tx, rx) = mpsc::channel(cfg.queue_capacity);

		tokio::spawn(run_writer(cfg.path.clone(), rx));

		Self { path: cfg.path.clone(), tx }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub async fn append<T>(&self, entry: &T) -> Result<()>
	where
		T: Serialize,
	{
		let mut line = serde_json::to_string(entry)?;

		line.push('\n');

		let (done, result) = oneshot::channel();

		self.tx.send(AppendJob { line, done }).await.map_err(|_| Error::WriterClosed)?;

		result.await.map_err(|_| Error::WriterClosed)?.map_err(Error::from)
	}
}

async fn run_writer(path: PathBuf, mut rx: mpsc::Receiver<AppendJob>) {
	while let Some(job) = rx.recv().await {
		let result = write_line(&path, job.line.as_bytes()).await;

		if let Err(err) = &result {
			tracing::debug!(error = %err, path = %path.display(), "Webhook log append failed.");
		}

		let _ = job.done.send(result);
	}

	tracing::debug!(path = %path.display(), "Webhook log writer stopped.");
}

// Opened per line so a rotated or deleted log is recreated at `path`.
async fn write_line(path: &Path, bytes: &[u8]) -> io::Result<()> {
	if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
		fs::create_dir_all(parent).await?;
	}

	let mut file = OpenOptions::new().create(true).append(true).open(path).await?;

	file.write_all(bytes).await?;
	file.flush().await
}
