use super::naming::{date_folder_name, photo_file_name, photo_stem, PhotoTimezone};
use crate::config::StorageConfig;
use crate::error::{CaptureError, StorageError};
use chrono::{DateTime, FixedOffset};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const BY_DATE_DIR: &str = "by_date";
pub const ALL_PHOTOS_DIR: &str = "all_photos";
pub const INCOMING_DIR: &str = ".incoming";
const PARTIAL_SUFFIX: &str = "partial";
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// A photo that reached both of its final locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPhoto {
    /// `<root>/by_date/<date>/<name>`
    pub path: PathBuf,
    /// `<root>/all_photos/<name>`
    pub all_photos_path: PathBuf,
    pub date_folder: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub total_photos: usize,
    pub today_photos: usize,
    pub date_folders: usize,
    pub free_bytes: Option<u64>,
}

/// The shared photo tree.
///
/// Files are staged under `.incoming/` and renamed into `by_date/`, so a
/// share client listing the tree only ever sees complete photos.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    root: PathBuf,
    by_date: PathBuf,
    all_photos: PathBuf,
    incoming: PathBuf,
    prefix: String,
    extension: String,
    min_free_bytes: u64,
    timezone: PhotoTimezone,
}

impl PhotoStore {
    /// Open the tree under an existing root, creating the fixed subdirectories
    pub fn open(config: &StorageConfig, device_id: Option<&str>) -> Result<Self, StorageError> {
        let root = config.root_path();
        if !root.is_dir() {
            return Err(StorageError::MissingRoot {
                path: root.display().to_string(),
            });
        }

        let store = Self {
            by_date: root.join(BY_DATE_DIR),
            all_photos: root.join(ALL_PHOTOS_DIR),
            incoming: root.join(INCOMING_DIR),
            root,
            prefix: config.filename_prefix.clone(),
            extension: config.extension.clone(),
            min_free_bytes: config.min_free_bytes,
            timezone: PhotoTimezone::from_config(config.timezone.as_deref()),
        };

        for dir in [&store.by_date, &store.all_photos, &store.incoming] {
            fs::create_dir_all(dir).map_err(|e| StorageError::DirectoryCreation {
                path: dir.display().to_string(),
                source: e,
            })?;
        }

        store.remove_stale_partials();

        if config.write_readme {
            store.write_readme(device_id)?;
        }

        info!("Photo store ready at {}", store.root.display());
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn timezone(&self) -> PhotoTimezone {
        self.timezone
    }

    /// Bytes available to unprivileged writers on the root filesystem
    pub fn free_bytes(&self) -> Result<u64, StorageError> {
        available_bytes(&self.root).map_err(|e| StorageError::FreeSpace {
            path: self.root.display().to_string(),
            details: e.to_string(),
        })
    }

    /// Refuse captures once free space drops below the configured floor
    pub fn check_free_space(&self) -> Result<(), CaptureError> {
        match self.free_bytes() {
            Ok(free) if free < self.min_free_bytes => Err(CaptureError::StorageFull {
                path: self.root.display().to_string(),
            }),
            Ok(_) => Ok(()),
            Err(e) => {
                // Unknown free space is not a reason to refuse a photo
                warn!("{}", e);
                Ok(())
            }
        }
    }

    /// Store already-encoded bytes
    pub fn store(
        &self,
        captured_at: &DateTime<FixedOffset>,
        bytes: &[u8],
    ) -> Result<StoredPhoto, CaptureError> {
        self.store_with(captured_at, |file| file.write_all(bytes))
    }

    /// Store a photo whose contents `write` streams into the staging file.
    ///
    /// On any error nothing stays under `by_date/` or `all_photos/`. Free
    /// space is not checked here; callers use [`PhotoStore::check_free_space`]
    /// before producing the photo.
    pub fn store_with<F>(
        &self,
        captured_at: &DateTime<FixedOffset>,
        write: F,
    ) -> Result<StoredPhoto, CaptureError>
    where
        F: FnOnce(&mut File) -> io::Result<()>,
    {
        let date_folder = date_folder_name(captured_at);
        let date_dir = self.by_date.join(&date_folder);
        fs::create_dir_all(&date_dir).map_err(|e| write_error(&date_dir, e))?;

        let name = self.unique_name(&date_dir, captured_at)?;
        let partial = self.incoming.join(format!("{}.{}", name, PARTIAL_SUFFIX));
        let final_path = date_dir.join(&name);
        let all_photos_path = self.all_photos.join(&name);

        let size_bytes = match write_partial(&partial, write) {
            Ok(size) => size,
            Err(e) => {
                let _ = fs::remove_file(&partial);
                return Err(write_error(&final_path, e));
            }
        };

        if let Err(e) = fs::rename(&partial, &final_path) {
            let _ = fs::remove_file(&partial);
            return Err(write_error(&final_path, e));
        }

        if let Err(e) = self.link_into_all_photos(&final_path, &all_photos_path, &name) {
            // A photo only counts once it is in both trees
            if let Err(remove) = fs::remove_file(&final_path) {
                warn!("Failed to roll back {}: {}", final_path.display(), remove);
            }
            return Err(e);
        }

        debug!(
            "Stored {} ({} bytes) in {}",
            name,
            size_bytes,
            date_dir.display()
        );

        Ok(StoredPhoto {
            path: final_path,
            all_photos_path,
            date_folder,
            size_bytes,
        })
    }

    pub fn stats(&self) -> StorageStats {
        let today = date_folder_name(&self.timezone.now());
        StorageStats {
            total_photos: count_files(&self.all_photos),
            today_photos: count_files(&self.by_date.join(today)),
            date_folders: fs::read_dir(&self.by_date)
                .map(|entries| {
                    entries
                        .filter_map(|e| e.ok())
                        .filter(|e| e.path().is_dir())
                        .count()
                })
                .unwrap_or(0),
            free_bytes: self.free_bytes().ok(),
        }
    }

    fn unique_name(
        &self,
        date_dir: &Path,
        captured_at: &DateTime<FixedOffset>,
    ) -> Result<String, CaptureError> {
        let stem = photo_stem(&self.prefix, captured_at);
        (0..MAX_NAME_ATTEMPTS)
            .map(|attempt| photo_file_name(&stem, &self.extension, attempt))
            .find(|name| {
                !date_dir.join(name).exists()
                    && !self.all_photos.join(name).exists()
                    && !self
                        .incoming
                        .join(format!("{}.{}", name, PARTIAL_SUFFIX))
                        .exists()
            })
            .ok_or_else(|| CaptureError::StorageWriteFailed {
                path: date_dir.join(&stem).display().to_string(),
                details: "no free file name".to_string(),
            })
    }

    fn link_into_all_photos(
        &self,
        final_path: &Path,
        all_photos_path: &Path,
        name: &str,
    ) -> Result<(), CaptureError> {
        match fs::hard_link(final_path, all_photos_path) {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!("Hard link failed ({}), copying into {}", e, ALL_PHOTOS_DIR);
                let staged = self.incoming.join(format!("{}.copy.{}", name, PARTIAL_SUFFIX));
                let result = fs::copy(final_path, &staged)
                    .and_then(|_| File::open(&staged).and_then(|f| f.sync_all()))
                    .and_then(|_| fs::rename(&staged, all_photos_path));
                if let Err(e) = result {
                    let _ = fs::remove_file(&staged);
                    return Err(write_error(all_photos_path, e));
                }
                Ok(())
            }
        }
    }

    fn remove_stale_partials(&self) {
        let Ok(entries) = fs::read_dir(&self.incoming) else {
            return;
        };
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(PARTIAL_SUFFIX) {
                match fs::remove_file(&path) {
                    Ok(()) => info!("Removed stale partial photo {}", path.display()),
                    Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
                }
            }
        }
    }

    fn write_readme(&self, device_id: Option<&str>) -> Result<(), StorageError> {
        let readme = self.root.join("README.txt");
        let mut text = String::from(
            "Camera photos\n\
             =============\n\n\
             by_date/     photos grouped in one folder per day (YYYY-MM-DD)\n\
             all_photos/  every photo in one folder, oldest first by name\n\n\
             Files appear only once they are completely written.\n",
        );
        if let Some(id) = device_id {
            text.push_str(&format!("\nDevice: {}\n", id));
        }

        if fs::read_to_string(&readme).ok().as_deref() == Some(text.as_str()) {
            return Ok(());
        }
        fs::write(&readme, text).map_err(|e| StorageError::NotWritable {
            path: self.root.display().to_string(),
            source: e,
        })
    }
}

fn write_partial<F>(partial: &Path, write: F) -> io::Result<u64>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let mut file = File::create(partial)?;
    write(&mut file)?;
    file.flush()?;
    file.sync_all()?;
    Ok(file.metadata()?.len())
}

fn write_error(path: &Path, e: io::Error) -> CaptureError {
    let path = path.display().to_string();
    if is_out_of_space(&e) {
        CaptureError::StorageFull { path }
    } else {
        CaptureError::StorageWriteFailed {
            path,
            details: e.to_string(),
        }
    }
}

fn is_out_of_space(e: &io::Error) -> bool {
    #[cfg(target_os = "linux")]
    {
        matches!(e.raw_os_error(), Some(libc::ENOSPC) | Some(libc::EDQUOT))
    }
    #[cfg(not(target_os = "linux"))]
    {
        e.raw_os_error() == Some(libc::ENOSPC)
    }
}

fn count_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .count()
        })
        .unwrap_or(0)
}

#[cfg(unix)]
fn available_bytes(path: &Path) -> io::Result<u64> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())?;
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    if unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(stat.f_bavail as u64 * stat.f_frsize as u64)
}

#[cfg(not(unix))]
fn available_bytes(_path: &Path) -> io::Result<u64> {
    Ok(u64::MAX)
}
