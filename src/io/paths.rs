use std::path::{Path, PathBuf};

/// Environment override for the data directory
pub const DATA_DIR_ENV: &str = "TMINUS_DIR";

/// Resolve the data directory: explicit flag, then `TMINUS_DIR`, then
/// `$XDG_DATA_HOME/tminus`, then `~/.local/share/tminus`.
pub fn resolve_data_dir(flag: Option<&Path>) -> PathBuf {
    if let Some(dir) = flag {
        return dir.to_path_buf();
    }
    data_dir_from(
        std::env::var(DATA_DIR_ENV).ok(),
        std::env::var("XDG_DATA_HOME").ok(),
        std::env::var("HOME").ok(),
    )
}

fn data_dir_from(explicit: Option<String>, xdg: Option<String>, home: Option<String>) -> PathBuf {
    if let Some(dir) = explicit.filter(|s| !s.is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(xdg) = xdg.filter(|s| !s.is_empty()) {
        return PathBuf::from(xdg).join("tminus");
    }
    let home = home
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/"));
    home.join(".local").join("share").join("tminus")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins() {
        let dir = resolve_data_dir(Some(Path::new("/tmp/x")));
        assert_eq!(dir, PathBuf::from("/tmp/x"));
    }

    #[test]
    fn explicit_env_before_xdg() {
        let dir = data_dir_from(Some("/data".into()), Some("/xdg".into()), Some("/home/u".into()));
        assert_eq!(dir, PathBuf::from("/data"));
    }

    #[test]
    fn xdg_before_home() {
        let dir = data_dir_from(None, Some("/xdg".into()), Some("/home/u".into()));
        assert_eq!(dir, PathBuf::from("/xdg/tminus"));
    }

    #[test]
    fn empty_values_are_ignored() {
        let dir = data_dir_from(Some(String::new()), Some(String::new()), Some("/home/u".into()));
        assert_eq!(dir, PathBuf::from("/home/u/.local/share/tminus"));
    }
}
