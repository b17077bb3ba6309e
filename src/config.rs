use crate::error::{ReportError, ReportResult};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_ROSTER: &str = "deanDailyCsar.csv";
pub const DEFAULT_CONTACT_HOURS: &str = "contact_hours.xlsx";
pub const DEFAULT_TIERS: &str = "tiers.xlsx";
pub const DEFAULT_OUT_DIR: &str = ".";

/// Section roster reports: enrollment, FTE by division, instructor and course.
#[derive(Parser, Debug)]
#[command(name = "deans-report", version, long_about = None)]
pub struct Cli {
    /// Section roster (CSV or spreadsheet).
    #[arg(long, global = true)]
    pub roster: Option<PathBuf>,

    /// Reference table with `Sec Name`, `FTE Count` and `Contact Hours`.
    #[arg(long, global = true)]
    pub contact_hours: Option<PathBuf>,

    /// Reference table with `Prefix/Course ID` and `New Sector`.
    #[arg(long, global = true)]
    pub tiers: Option<PathBuf>,

    /// Directory the workbooks are written to.
    #[arg(long, global = true)]
    pub out_dir: Option<PathBuf>,

    /// JSON file naming the inputs and output directory. Flags win over it.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// If set, a JSON summary of the run is written here.
    #[arg(long, global = true)]
    pub summary: Option<PathBuf>,

    /// Rows shown in the console preview.
    #[arg(long, global = true, default_value_t = 10)]
    pub preview_rows: usize,

    /// Debug logging unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Copy the roster rows of each division into its own workbook.
    Divisions {
        /// Comma-separated divisions, or `all`.
        selection: String,
    },
    /// Enrollment percentage of every section of a course.
    Enrollment {
        /// Course code such as ENG-101, or `all`.
        course: String,
    },
    /// Generated FTE of a division, ranked by course.
    FteDivision {
        /// Comma-separated divisions, or `all`.
        division: String,
    },
    /// Generated FTE of every section an instructor teaches.
    FteInstructor {
        /// Any part of `Sec Faculty Info`, case-insensitive.
        name: String,
    },
    /// Generated FTE of the sections of a course.
    FteCourse {
        /// Course code such as ENG-101, or `all`.
        course: String,
    },
    /// Print the values a filter accepts.
    List {
        #[arg(value_enum)]
        what: ListTarget,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListTarget {
    Divisions,
    Courses,
    Instructors,
}

/// Optional overrides read from `--config`.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    pub roster: Option<PathBuf>,
    pub contact_hours: Option<PathBuf>,
    pub tiers: Option<PathBuf>,
    pub output_directory: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &Path) -> ReportResult<FileConfig> {
        let text = fs::read_to_string(path).map_err(|e| ReportError::configuration(path, e))?;
        serde_json::from_str(&text).map_err(|e| ReportError::configuration(path, e))
    }
}

/// Input and output locations for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub roster: PathBuf,
    pub contact_hours: PathBuf,
    pub tiers: PathBuf,
    pub out_dir: PathBuf,
}

impl Settings {
    /// Flags, then the config file, then the built-in defaults.
    pub fn resolve(cli: &Cli) -> ReportResult<Settings> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Ok(Settings {
            roster: pick(&cli.roster, file.roster, DEFAULT_ROSTER),
            contact_hours: pick(&cli.contact_hours, file.contact_hours, DEFAULT_CONTACT_HOURS),
            tiers: pick(&cli.tiers, file.tiers, DEFAULT_TIERS),
            out_dir: pick(&cli.out_dir, file.output_directory, DEFAULT_OUT_DIR),
        })
    }
}

fn pick(flag: &Option<PathBuf>, file: Option<PathBuf>, default: &str) -> PathBuf {
    flag.clone().or(file).unwrap_or_else(|| PathBuf::from(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn defaults_apply_without_flags_or_file() {
        let cli = parse(&["deans-report", "fte-course", "ENG-101"]);
        assert_eq!(cli.command, Command::FteCourse { course: "ENG-101".into() });
        assert_eq!(cli.preview_rows, 10);
        let settings = Settings::resolve(&cli).unwrap();
        assert_eq!(settings.roster, PathBuf::from("deanDailyCsar.csv"));
        assert_eq!(settings.contact_hours, PathBuf::from("contact_hours.xlsx"));
        assert_eq!(settings.tiers, PathBuf::from("tiers.xlsx"));
        assert_eq!(settings.out_dir, PathBuf::from("."));
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("report.json");
        fs::write(
            &config,
            r#"{ "roster": "fall.csv", "tiers": "tiers-2024.xlsx", "outputDirectory": "out" }"#,
        )
        .unwrap();
        let config_arg = config.to_string_lossy().to_string();
        let cli = parse(&[
            "deans-report",
            "--config",
            &config_arg,
            "fte-division",
            "all",
            "--roster",
            "spring.csv",
        ]);
        let settings = Settings::resolve(&cli).unwrap();
        assert_eq!(settings.roster, PathBuf::from("spring.csv"));
        assert_eq!(settings.tiers, PathBuf::from("tiers-2024.xlsx"));
        assert_eq!(settings.contact_hours, PathBuf::from("contact_hours.xlsx"));
        assert_eq!(settings.out_dir, PathBuf::from("out"));
    }

    #[test]
    fn missing_or_malformed_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        let cli = parse(&["deans-report", "--config", missing.to_str().unwrap(), "list", "courses"]);
        assert!(matches!(Settings::resolve(&cli), Err(ReportError::Configuration { .. })));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ roster: ").unwrap();
        let cli = parse(&["deans-report", "--config", broken.to_str().unwrap(), "list", "courses"]);
        assert!(matches!(Settings::resolve(&cli), Err(ReportError::Configuration { .. })));
    }

    #[test]
    fn subcommands_use_kebab_case() {
        let cli = parse(&["deans-report", "-v", "fte-instructor", "Jane Smith"]);
        assert!(cli.verbose);
        assert_eq!(cli.command, Command::FteInstructor { name: "Jane Smith".into() });
        let cli = parse(&["deans-report", "list", "instructors"]);
        assert_eq!(cli.command, Command::List { what: ListTarget::Instructors });
        assert!(Cli::try_parse_from(["deans-report", "list", "rooms"]).is_err());
    }
}
