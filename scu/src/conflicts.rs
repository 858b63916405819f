use scu_core::{ConflictOccurrence, ConflictRecord, DependencyRecord};

/// Find packages declared with different version specs by different modules.
///
/// Only non-local records tagged with an owning module take part. Version
/// specs are compared as rendered strings, so `5.8.0` and `~> 5.8.0` differ.
/// Results follow the order in which each package was first seen.
pub fn detect_conflicts<'a, I>(records: I) -> Vec<ConflictRecord>
where
    I: IntoIterator<Item = &'a DependencyRecord>,
{
    let mut grouped: Vec<ConflictRecord> = Vec::new();

    for record in records {
        if record.is_local {
            continue;
        }
        let Some(module) = &record.owning_module else {
            continue;
        };

        let occurrence = ConflictOccurrence {
            version_spec: record.version_or_sentinel().to_string(),
            module_name: module.clone(),
        };

        match grouped.iter_mut().find(|c| c.package_name == record.name) {
            Some(existing) => existing.occurrences.push(occurrence),
            None => grouped.push(ConflictRecord {
                package_name: record.name.clone(),
                occurrences: vec![occurrence],
            }),
        }
    }

    grouped.retain(|conflict| conflict.distinct_versions().len() > 1);
    for conflict in &grouped {
        tracing::debug!(
            package = %conflict.package_name,
            versions = ?conflict.distinct_versions(),
            "version conflict"
        );
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use scu_core::SourceKind;

    fn declared(name: &str, version: &str, module: &str) -> DependencyRecord {
        DependencyRecord::remote(
            &format!("https://github.com/acme/{name}.git"),
            Some(version.to_string()),
            SourceKind::Manifest,
        )
        .with_module(module)
    }

    #[test]
    fn test_detects_differing_versions() {
        let records = vec![
            declared("pkg", "1.0.0", "A"),
            declared("pkg", "1.1.0", "B"),
            declared("other", "2.0.0", "A"),
        ];
        let conflicts = detect_conflicts(&records);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].package_name, "pkg");
        assert_eq!(
            conflicts[0].occurrences,
            vec![
                ConflictOccurrence {
                    version_spec: "1.0.0".into(),
                    module_name: "A".into(),
                },
                ConflictOccurrence {
                    version_spec: "1.1.0".into(),
                    module_name: "B".into(),
                },
            ]
        );
    }

    #[test]
    fn test_same_version_is_not_a_conflict() {
        let records = vec![declared("pkg", "1.0.0", "A"), declared("pkg", "1.0.0", "B")];
        assert!(detect_conflicts(&records).is_empty());
    }

    #[test]
    fn test_comparison_is_verbatim() {
        let records = vec![
            declared("pkg", "5.8.0", "A"),
            declared("pkg", "~> 5.8.0", "B"),
        ];
        assert_eq!(detect_conflicts(&records).len(), 1);

        // A leading `v` is not normalized away
        let records = vec![declared("tagged", "1.2.0", "A"), declared("tagged", "v1.2.0", "B")];
        let conflicts = detect_conflicts(&records);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].distinct_versions(), vec!["1.2.0", "v1.2.0"]);
    }

    #[test]
    fn test_all_occurrences_kept_when_conflicting() {
        let records = vec![
            declared("pkg", "1.0.0", "A"),
            declared("pkg", "1.0.0", "B"),
            declared("pkg", "2.0.0", "C"),
        ];
        let conflicts = detect_conflicts(&records);
        assert_eq!(conflicts[0].occurrences.len(), 3);
        assert_eq!(conflicts[0].distinct_versions(), vec!["1.0.0", "2.0.0"]);
    }

    #[test]
    fn test_local_and_unowned_records_ignored() {
        let records = vec![
            DependencyRecord::local("pkg", SourceKind::Manifest).with_module("A"),
            declared("pkg", "1.0.0", "B"),
            DependencyRecord::remote(
                "https://github.com/acme/pkg.git",
                Some("9.9.9".into()),
                SourceKind::Lockfile,
            ),
        ];
        assert!(detect_conflicts(&records).is_empty());
    }
}
