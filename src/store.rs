// store.rs
use crate::engine::models::ListingRecord;
use crate::errors::ScraperError;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::info;

/// Where finished listing records go.
pub trait OutputStore {
    fn exists(&self, listing_key: &str) -> Result<bool, ScraperError>;
    fn write(&self, listing_key: &str, record: &ListingRecord) -> Result<(), ScraperError>;
}

/// Where discovered listing URLs are kept between runs.
pub trait LinkStore {
    fn load(&self) -> Result<Vec<String>, ScraperError>;
    fn save(&self, links: &[String]) -> Result<(), ScraperError>;
}

/// Last path segment of a listing URL, ignoring trailing slashes.
pub fn listing_key(url: &str) -> &str {
    url.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

/// One pretty-printed JSON file per listing: `<dir>/<prefix>_<key>.json`.
pub struct JsonDirStore {
    dir: PathBuf,
    prefix: String,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn path_for(&self, listing_key: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}.json", self.prefix, listing_key))
    }

    pub fn read(&self, listing_key: &str) -> Result<ListingRecord, ScraperError> {
        let file = File::open(self.path_for(listing_key))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

impl OutputStore for JsonDirStore {
    fn exists(&self, listing_key: &str) -> Result<bool, ScraperError> {
        Ok(self.path_for(listing_key).exists())
    }

    fn write(&self, listing_key: &str, record: &ListingRecord) -> Result<(), ScraperError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(listing_key);
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, record)?;
        info!(path = %path.display(), "listing saved");
        Ok(())
    }
}

/// A JSON array of URLs in a single file.
pub struct JsonLinkStore {
    path: PathBuf,
}

impl JsonLinkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// First candidate path that exists on disk.
    pub fn locate<P: AsRef<Path>>(candidates: &[P]) -> Option<Self> {
        candidates
            .iter()
            .map(AsRef::<Path>::as_ref)
            .find(|p| p.exists())
            .map(|p| {
                info!(path = %p.display(), "link file found");
                Self::new(p)
            })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LinkStore for JsonLinkStore {
    fn load(&self) -> Result<Vec<String>, ScraperError> {
        let file = File::open(&self.path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    fn save(&self, links: &[String]) -> Result<(), ScraperError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(writer, links)?;
        info!(path = %self.path.display(), count = links.len(), "links saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "{name}_{}",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[test]
    fn listing_key_is_last_segment() {
        assert_eq!(
            listing_key("https://www.pulte.com/homes/nv/lv/lv/monument-211219/"),
            "monument-211219"
        );
        assert_eq!(listing_key("monument-211219"), "monument-211219");
    }

    #[test]
    fn json_store_round_trip_and_exists() {
        let store = JsonDirStore::new(temp_dir("json_store"), "pulte");
        let record = ListingRecord::new(
            "https://www.pulte.com/homes/x-1",
            Local::now().naive_local(),
        );

        assert!(!store.exists("x-1").unwrap());
        store.write("x-1", &record).unwrap();
        assert!(store.exists("x-1").unwrap());
        assert!(store.path_for("x-1").ends_with("pulte_x-1.json"));
        assert_eq!(store.read("x-1").unwrap(), record);
    }

    #[test]
    fn link_store_locates_first_existing_file() {
        let dir = temp_dir("link_store");
        let path = dir.join("pulte_links.json");
        let store = JsonLinkStore::new(&path);
        let links = vec!["https://www.pulte.com/homes/a-1".to_string()];
        store.save(&links).unwrap();

        let found = JsonLinkStore::locate(&[dir.join("missing.json"), path.clone()]).unwrap();
        assert_eq!(found.path(), path.as_path());
        assert_eq!(found.load().unwrap(), links);
        assert!(JsonLinkStore::locate(&[dir.join("nope.json")]).is_none());
    }
}
