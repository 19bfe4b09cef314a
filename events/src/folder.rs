use once_cell::sync::Lazy;
use regex::Regex;

static FOLDER_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"/folders/([a-zA-Z0-9_-]+)").expect("valid folders regex"),
        Regex::new(r"id=([a-zA-Z0-9_-]+)").expect("valid id regex"),
    ]
});

/// Pull the folder id out of a shared Drive link, trying the
/// `.../folders/{id}` shape before `...?id={id}`.
pub fn extract_folder_id(link: &str) -> Option<String> {
    FOLDER_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(link)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::extract_folder_id;

    #[test]
    fn test_folder_path_link() {
        assert_eq!(
            extract_folder_id("https://drive.google.com/drive/folders/1ABn_HMg9B3OzunBGxlNu19W96L_jAbe0?usp=sharing")
                .as_deref(),
            Some("1ABn_HMg9B3OzunBGxlNu19W96L_jAbe0")
        );
    }

    #[test]
    fn test_open_id_link() {
        assert_eq!(
            extract_folder_id("https://drive.google.com/open?id=abc-123").as_deref(),
            Some("abc-123")
        );
    }

    #[test]
    fn test_folders_shape_wins() {
        assert_eq!(
            extract_folder_id("https://drive.google.com/drive/folders/first?id=second").as_deref(),
            Some("first")
        );
    }

    #[test]
    fn test_unrecognized_link() {
        assert_eq!(extract_folder_id("https://example.com/album/"), None);
        assert_eq!(extract_folder_id(""), None);
    }
}
