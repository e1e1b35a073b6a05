use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Last path component of a submission id or file name.
pub fn short_name(id: &str) -> &str {
    id.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(id)
}

pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

pub fn percent(ratio: f32) -> String {
    format!("{:.1}%", ratio.clamp(0.0, 1.0) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::{percent, short_name, stable_pair};

    #[test]
    fn short_names_drop_directories() {
        assert_eq!(short_name("submissions/alice/main.py"), "main.py");
        assert_eq!(short_name("C:\\work\\bob.zip"), "bob.zip");
        assert_eq!(short_name("carol/"), "carol");
        assert_eq!(short_name("plain"), "plain");
    }

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let (x, y) = stable_pair("alice");
        assert_eq!((x, y), stable_pair("alice"));
        assert!((-1.0..=1.0).contains(&x));
        assert!((-1.0..=1.0).contains(&y));
    }

    #[test]
    fn percent_formats_ratios() {
        assert_eq!(percent(0.5), "50.0%");
        assert_eq!(percent(2.0), "100.0%");
    }
}
