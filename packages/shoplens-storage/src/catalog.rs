use std::{
	io,
	path::{Path, PathBuf},
};

use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};
use tokio::fs::{self, OpenOptions};
use uuid::Uuid;

use crate::{Error, Result, models::CatalogRow};

const MAX_NAME_ATTEMPTS: u32 = 1_000;
const SNAPSHOT_STAMP: &[BorrowedFormatItem<'static>] =
	format_description!("[year][month][day]_[hour][minute][second]");

/// Paths written by one snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotFiles {
	pub file_name: String,
	pub snapshot_path: PathBuf,
	pub latest_path: PathBuf,
}

/// Writes catalog snapshots as CSV under one directory.
///
/// Each file is written to a unique temp file and renamed into place, so concurrent writers
/// never interleave bytes; for the latest snapshot the last rename wins.
#[derive(Debug, Clone)]
pub struct CatalogStore {
	dir: PathBuf,
	file_prefix: String,
}
impl CatalogStore {
	pub fn new(cfg: &shoplens_config::Catalog) -> Self {
		Self { dir: cfg.dir.clone(), file_prefix: cfg.file_prefix.clone() }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// Name for a snapshot taken at `at`. Repeats within one second get `_<n>` appended.
	pub fn snapshot_file_name(&self, at: OffsetDateTime, attempt: u32) -> Result<String> {
		let stamp = at
			.format(SNAPSHOT_STAMP)
			.map_err(|err| Error::InvalidArgument(format!("Unformattable timestamp: {err}.")))?;

		match attempt {
			0 => Ok(format!("{}_{stamp}.csv", self.file_prefix)),
			n => Ok(format!("{}_{stamp}_{n}.csv", self.file_prefix)),
		}
	}

	pub fn latest_file_name(&self) -> String {
		format!("{}_latest.csv", self.file_prefix)
	}

	pub async fn write_snapshot(
		&self,
		rows: &[CatalogRow],
		at: OffsetDateTime,
	) -> Result<SnapshotFiles> {
		let bytes = encode_csv(rows)?;
		let latest_path = self.dir.join(self.latest_file_name());

		fs::create_dir_all(&self.dir).await?;

		let (file_name, snapshot_path) = self.reserve_snapshot(at).await?;

		if let Err(err) = replace_atomically(&snapshot_path, &bytes).await {
			let _ = fs::remove_file(&snapshot_path).await;

			return Err(err);
		}

		replace_atomically(&latest_path, &bytes).await?;

		tracing::info!(
			rows = rows.len(),
			snapshot = %snapshot_path.display(),
			latest = %latest_path.display(),
			"Catalog snapshot written."
		);

		Ok(SnapshotFiles { file_name, snapshot_path, latest_path })
	}

	// `create_new` claims the name, so concurrent writers in the same second never share it.
	async fn reserve_snapshot(&self, at: OffsetDateTime) -> Result<(String, PathBuf)> {
		for attempt in 0..MAX_NAME_ATTEMPTS {
			let file_name = self.snapshot_file_name(at, attempt)?;
			let path = self.dir.join(&file_name);

			match OpenOptions::new().write(true).create_new(true).open(&path).await {
				Ok(_) => return Ok((file_name, path)),
				Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
				Err(err) => return Err(err.into()),
			}
		}

		Err(Error::Io(io::Error::new(
			io::ErrorKind::AlreadyExists,
			format!("No free snapshot name after {MAX_NAME_ATTEMPTS} attempts."),
		)))
	}
}

fn encode_csv(rows: &[CatalogRow]) -> Result<Vec<u8>> {
	let mut writer = csv::Writer::from_writer(Vec::new());

	if rows.is_empty() {
		writer.write_record(["product_handle", "title", "description", "price", "images"])?;
	}
	for row in rows {
		writer.serialize(row)?;
	}

	writer.into_inner().map_err(|err| Error::Io(err.into_error()))
}

async fn replace_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
	let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or("snapshot");
	let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));

	if let Err(err) = fs::write(&tmp, bytes).await {
		let _ = fs::remove_file(&tmp).await;

		return Err(err.into());
	}
	if let Err(err) = fs::rename(&tmp, path).await {
		let _ = fs::remove_file(&tmp).await;

		return Err(err.into());
	}

	Ok(())
}
