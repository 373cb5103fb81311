mod naming;
mod photo_store;
mod state;
#[cfg(test)]
mod tests;

pub use naming::{date_folder_name, photo_file_name, photo_stem, PhotoTimezone};
pub use photo_store::{
    PhotoStore, StorageStats, StoredPhoto, ALL_PHOTOS_DIR, BY_DATE_DIR, INCOMING_DIR,
};
pub use state::{PersistedState, STATE_FILE};
