//! Adapter layer: Convert MusicBrainz DTOs to domain models
//!
//! This is the ONLY place where MusicBrainz DTO types are interpreted.
//! Wikidata QIDs and usable image URLs are extracted from url relations
//! here, so the rest of the crate never sees relation records.

use super::dto;
use crate::sources::domain::GenreTag;

/// Width requested for Commons file redirects.
const COMMONS_IMAGE_WIDTH: u32 = 2048;

/// Normalize a tag/genre vote list into weighted domain tags.
pub(super) fn normalize_tags(entries: &[dto::TagEntry]) -> Vec<GenreTag> {
    entries
        .iter()
        .filter_map(|entry| GenreTag::normalized(entry.name.as_deref()?, entry.weight()))
        .collect()
}

/// Extract the Wikidata QID from an artist's url relations.
pub(super) fn wikidata_qid(relations: &[dto::RelationEntry]) -> Option<String> {
    relations
        .iter()
        .filter(|relation| relation.relation_type.as_deref() == Some("wikidata"))
        .find_map(|relation| {
            let resource = relation.resource()?;
            resource.rsplit('/').next().map(|qid| qid.to_string())
        })
}

/// Collect usable image URLs from an artist's url relations, preserving
/// relation order and dropping duplicates.
pub(super) fn image_relation_urls(relations: &[dto::RelationEntry]) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for relation in relations {
        if relation.relation_type.as_deref() != Some("image") {
            continue;
        }
        let Some(candidate) = relation.resource().and_then(normalize_image_resource) else {
            continue;
        };
        if !urls.contains(&candidate) {
            urls.push(candidate);
        }
    }
    urls
}

/// Turn an image relation resource into a directly fetchable URL.
///
/// Commons wiki pages become FilePath redirects, FilePath links get a
/// width pinned, upload.wikimedia.org and plain image-file URLs pass
/// through, everything else is unusable.
pub fn normalize_image_resource(resource: &str) -> Option<String> {
    if resource.is_empty() {
        return None;
    }
    let lowered = resource.to_lowercase();
    if lowered.starts_with("https://commons.wikimedia.org/wiki/file:") {
        let filename = resource.split("/File:").nth(1)?;
        return Some(commons_file_url(filename, COMMONS_IMAGE_WIDTH));
    }
    if lowered.starts_with("https://commons.wikimedia.org/wiki/special:filepath/") {
        if !lowered.contains("width=") {
            return Some(format!("{resource}?width=1200"));
        }
        return Some(resource.to_string());
    }
    if lowered.contains("upload.wikimedia.org") {
        return Some(resource.to_string());
    }
    if [".jpg", ".jpeg", ".png", ".webp", ".gif"]
        .iter()
        .any(|extension| lowered.ends_with(extension))
    {
        return Some(resource.to_string());
    }
    None
}

/// Build a Commons FilePath URL for a bare filename at the default width.
pub(crate) fn commons_image_url(filename: &str) -> String {
    commons_file_url(filename, COMMONS_IMAGE_WIDTH)
}

/// Build a Commons FilePath URL for a bare filename.
fn commons_file_url(filename: &str, width: u32) -> String {
    let safe_name = urlencoding::encode(&filename.replace(' ', "_")).into_owned();
    format!("https://commons.wikimedia.org/wiki/Special:FilePath/{safe_name}?width={width}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation(relation_type: &str, resource: &str) -> dto::RelationEntry {
        dto::RelationEntry {
            relation_type: Some(relation_type.to_string()),
            url: Some(dto::RelationUrl {
                resource: Some(resource.to_string()),
            }),
        }
    }

    #[test]
    fn test_wikidata_qid_extraction() {
        let relations = vec![
            relation("official homepage", "https://radiohead.com"),
            relation("wikidata", "https://www.wikidata.org/wiki/Q10811"),
        ];
        assert_eq!(wikidata_qid(&relations).as_deref(), Some("Q10811"));
    }

    #[test]
    fn test_wikidata_qid_absent() {
        let relations = vec![relation("image", "https://example.com/a.jpg")];
        assert_eq!(wikidata_qid(&relations), None);
    }

    #[test]
    fn test_image_relations_normalized_and_deduped() {
        let relations = vec![
            relation("image", "https://example.com/photo.jpg"),
            relation("image", "https://example.com/photo.jpg"),
            relation("image", "https://example.com/not-an-image"),
            relation("wikidata", "https://www.wikidata.org/wiki/Q1"),
        ];
        let urls = image_relation_urls(&relations);
        assert_eq!(urls, vec!["https://example.com/photo.jpg".to_string()]);
    }

    #[test]
    fn test_normalize_commons_wiki_page() {
        let url =
            normalize_image_resource("https://commons.wikimedia.org/wiki/File:Thom Yorke.jpg")
                .unwrap();
        assert!(url.starts_with("https://commons.wikimedia.org/wiki/Special:FilePath/"));
        assert!(url.contains("Thom_Yorke.jpg"));
        assert!(url.ends_with("?width=2048"));
    }

    #[test]
    fn test_normalize_filepath_gets_width() {
        let url = normalize_image_resource(
            "https://commons.wikimedia.org/wiki/Special:FilePath/Band.jpg",
        )
        .unwrap();
        assert!(url.ends_with("?width=1200"));

        let with_width = normalize_image_resource(
            "https://commons.wikimedia.org/wiki/Special:FilePath/Band.jpg?width=800",
        )
        .unwrap();
        assert!(with_width.ends_with("width=800"));
    }

    #[test]
    fn test_normalize_passthrough_and_rejection() {
        assert!(
            normalize_image_resource("https://upload.wikimedia.org/wikipedia/commons/a/ab/X.jpg")
                .is_some()
        );
        assert!(normalize_image_resource("https://example.com/cover.webp").is_some());
        assert!(normalize_image_resource("https://example.com/page.html").is_none());
        assert!(normalize_image_resource("").is_none());
    }

    #[test]
    fn test_normalize_tags_drops_blank_names() {
        let entries = vec![
            dto::TagEntry {
                name: Some("Indie Rock".to_string()),
                count: Some(4),
            },
            dto::TagEntry {
                name: Some("  ".to_string()),
                count: Some(9),
            },
            dto::TagEntry {
                name: None,
                count: Some(2),
            },
        ];
        let tags = normalize_tags(&entries);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "indie rock");
        assert_eq!(tags[0].weight, 4);
    }
}
