use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use swiss_core::config::ConfigError;
use swiss_core::{SwissTournament, TournamentConfig};

const APP_DIR: &str = "swiss-tui";

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

pub fn save_path() -> PathBuf {
    data_dir().join("tournament.json")
}

pub fn log_path() -> PathBuf {
    data_dir().join("swiss-tui.log")
}

#[derive(serde::Serialize, serde::Deserialize)]
struct SaveFile {
    version: u32,
    tournament: SwissTournament,
}

const SAVE_VERSION: u32 = 1;

/// Settings from `path`; a missing file means defaults.
pub fn load_config(path: &Path) -> Result<TournamentConfig, ConfigError> {
    if !path.exists() {
        return Ok(TournamentConfig::default());
    }
    TournamentConfig::load(path)
}

pub fn save_tournament(path: &Path, tournament: &SwissTournament) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = SaveFile {
        version: SAVE_VERSION,
        tournament: tournament.clone(),
    };
    let json = serde_json::to_string_pretty(&file)?;
    // Write then rename so a crash never leaves half a save behind.
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)
}

/// The saved tournament, if there is a readable one.
pub fn load_tournament(path: &Path) -> Option<SwissTournament> {
    let data = fs::read_to_string(path).ok()?;
    let file: SaveFile = serde_json::from_str(&data).ok()?;
    if file.version != SAVE_VERSION {
        return None;
    }
    Some(file.tournament)
}

pub fn clear_saved(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swiss_core::Outcome;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("swiss-tui-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn save_and_load_keep_results() {
        let path = scratch("progress.json");
        let mut t = SwissTournament::from_names(["A", "B", "C"]).unwrap();
        t.generate_schedule().unwrap();
        t.record_result(0, 0, Outcome::LeftWin).unwrap();

        save_tournament(&path, &t).unwrap();
        let loaded = load_tournament(&path).unwrap();
        assert_eq!(loaded.rounds(), t.rounds());
        assert_eq!(loaded.standings(), t.standings());

        clear_saved(&path).unwrap();
        assert!(load_tournament(&path).is_none());
        // Clearing twice is fine.
        clear_saved(&path).unwrap();
    }

    #[test]
    fn unreadable_save_is_ignored() {
        let path = scratch("garbage.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();
        assert!(load_tournament(&path).is_none());
    }

    #[test]
    fn missing_config_uses_defaults() {
        let config = load_config(&scratch("nope.toml")).unwrap();
        assert_eq!(config, TournamentConfig::default());
    }

    #[test]
    fn config_file_overrides_defaults() {
        let path = scratch("config.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "k_factor = 16.0\nbye_name = \"Rest\"\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.k_factor, 16.0);
        assert_eq!(config.bye_name, "Rest");
        assert_eq!(config.initial_rating, 1500.0);
    }
}
