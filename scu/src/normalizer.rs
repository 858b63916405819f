use scu_core::DependencyRecord;
use std::collections::{HashMap, HashSet};

/// Name-keyed set of canonical dependencies.
///
/// The first non-local record seen for a name is kept; later records with the
/// same name are dropped without merging any of their fields. Insertion order
/// is preserved.
#[derive(Debug, Clone, Default)]
pub struct DependencyIndex {
    records: Vec<DependencyRecord>,
    positions: HashMap<String, usize>,
}

impl DependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a record; returns `true` if it became the canonical entry
    pub fn insert(&mut self, record: DependencyRecord) -> bool {
        if record.is_local || self.positions.contains_key(&record.name) {
            return false;
        }
        self.positions
            .insert(record.name.clone(), self.records.len());
        self.records.push(record);
        true
    }

    pub fn get(&self, name: &str) -> Option<&DependencyRecord> {
        self.positions.get(name).map(|&idx| &self.records[idx])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DependencyRecord> {
        self.records.iter()
    }
}

impl Extend<DependencyRecord> for DependencyIndex {
    fn extend<T: IntoIterator<Item = DependencyRecord>>(&mut self, iter: T) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl FromIterator<DependencyRecord> for DependencyIndex {
    fn from_iter<T: IntoIterator<Item = DependencyRecord>>(iter: T) -> Self {
        let mut index = Self::new();
        index.extend(iter);
        index
    }
}

#[derive(Hash, PartialEq, Eq)]
enum DedupKey {
    Url(String),
    Name(String),
}

/// Keep the first record per URL (per name for records without one)
pub fn dedup_by_url<I>(records: I) -> Vec<DependencyRecord>
where
    I: IntoIterator<Item = DependencyRecord>,
{
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| {
            let key = match &record.url {
                Some(url) => DedupKey::Url(url.clone()),
                None => DedupKey::Name(record.name.clone()),
            };
            seen.insert(key)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scu_core::SourceKind;

    fn manifest(url: &str, version: &str, module: &str) -> DependencyRecord {
        DependencyRecord::remote(url, Some(version.to_string()), SourceKind::Manifest)
            .with_module(module)
    }

    #[test]
    fn test_first_seen_wins_without_merging() {
        let index: DependencyIndex = [
            manifest("https://github.com/a/Shared.git", "1.0.0", "A"),
            manifest("https://github.com/b/Other.git", "2.0.0", "A"),
            manifest("https://gitlab.com/c/Shared.git", "1.5.0", "B"),
        ]
        .into_iter()
        .collect();

        assert_eq!(index.len(), 2);
        let shared = index.get("Shared").expect("canonical Shared");
        assert_eq!(shared.url.as_deref(), Some("https://github.com/a/Shared.git"));
        assert_eq!(shared.version_spec.as_deref(), Some("1.0.0"));
        assert_eq!(shared.owning_module.as_deref(), Some("A"));

        let names: Vec<&str> = index.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Shared", "Other"]);
    }

    #[test]
    fn test_local_records_never_enter_index() {
        let mut index = DependencyIndex::new();
        assert!(!index.insert(DependencyRecord::local("CoreKit", SourceKind::Manifest)));
        assert!(index.is_empty());

        // A later remote record with the same name is still accepted
        assert!(index.insert(manifest("https://github.com/x/CoreKit.git", "1.0.0", "A")));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_dedup_by_url_across_sources() {
        let records = vec![
            DependencyRecord::remote(
                "https://github.com/Alamofire/Alamofire.git",
                Some("~> 5.8.0".into()),
                SourceKind::ProjectFile,
            ),
            DependencyRecord::remote(
                "https://github.com/Alamofire/Alamofire.git",
                Some("5.9.1".into()),
                SourceKind::Lockfile,
            ),
            DependencyRecord::remote(
                "https://github.com/onevcat/Kingfisher.git",
                Some("7.10.2".into()),
                SourceKind::Lockfile,
            ),
            DependencyRecord::local("Feature", SourceKind::Manifest),
            DependencyRecord::local("Feature", SourceKind::Manifest),
        ];

        let deduped = dedup_by_url(records);
        assert_eq!(deduped.len(), 3);
        assert_eq!(deduped[0].source_kind, SourceKind::ProjectFile);
        assert_eq!(deduped[0].version_spec.as_deref(), Some("~> 5.8.0"));
        assert_eq!(deduped[2].name, "Feature");
    }
}
