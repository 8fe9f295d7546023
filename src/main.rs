//! Command-line driver for [`rankset::RankSet`].
//!
//! ```text
//! rankset <t> <keystoinsert.txt> <keystodelete.txt> <commands.txt>
//! ```
//!
//! Builds a tree of minimum degree `t`, inserts the keys from the first
//! file, deletes the keys from the second, then answers the queries in the
//! third, writing exactly one line per query to `output.txt`. Absent
//! results (and malformed query lines) render as `-1`.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rankset::RankSet;

/// Everything the driver needs, parsed from the command line.
#[derive(Debug)]
struct DriverConfig {
    min_degree: usize,
    insert_path: PathBuf,
    delete_path: PathBuf,
    commands_path: PathBuf,
}

impl DriverConfig {
    fn from_args(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let degree_arg = args.next().context("missing minimum degree argument")?;
        let min_degree: usize = degree_arg
            .parse()
            .with_context(|| format!("minimum degree `{degree_arg}` is not an integer"))?;
        if min_degree < 2 {
            bail!("minimum degree must be at least 2, got {min_degree}");
        }

        let insert_path = PathBuf::from(args.next().context("missing insert file argument")?);
        let delete_path = PathBuf::from(args.next().context("missing delete file argument")?);
        let commands_path = PathBuf::from(args.next().context("missing commands file argument")?);
        if args.next().is_some() {
            bail!("usage: rankset <t> <keystoinsert.txt> <keystodelete.txt> <commands.txt>");
        }

        Ok(Self {
            min_degree,
            insert_path,
            delete_path,
            commands_path,
        })
    }
}

/// One query line from the commands file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Select(i128),
    Rank(i128),
    KeysInRange(i128, i128),
    PrimesInRange(i128, i128),
}

impl Command {
    /// Parses a command line; `None` marks a malformed line, which the
    /// driver renders as `-1` rather than aborting the run. Extra trailing
    /// tokens are ignored.
    fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let name = parts.next()?;
        let command = match name {
            "select" => Self::Select(parse_int(parts.next()?)?),
            "rank" => Self::Rank(parse_int(parts.next()?)?),
            "keysInRange" => Self::KeysInRange(parse_int(parts.next()?)?, parse_int(parts.next()?)?),
            "primesInRange" => {
                Self::PrimesInRange(parse_int(parts.next()?)?, parse_int(parts.next()?)?)
            }
            _ => return None,
        };
        Some(command)
    }
}

fn parse_int(token: &str) -> Option<i128> {
    token.parse().ok()
}

/// Clamps a parsed range endpoint into the supported key domain. Endpoints
/// below zero clamp to 0 (which no stored key can match) and endpoints
/// above `u64::MAX` clamp to `u64::MAX`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_bound(value: i128) -> u64 {
    value.clamp(0, i128::from(u64::MAX)) as u64
}

/// Reads one integer per line, skipping blank lines.
fn read_keys(path: &Path) -> Result<Vec<i128>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read key file {}", path.display()))?;
    let mut keys = Vec::new();
    for (number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let key: i128 = line.parse().with_context(|| {
            format!("{}:{}: `{line}` is not an integer", path.display(), number + 1)
        })?;
        keys.push(key);
    }
    Ok(keys)
}

/// Builds the tree from the insert and delete files, then renders one
/// output line per command.
fn run(config: &DriverConfig) -> Result<String> {
    let mut set = RankSet::new(config.min_degree);

    let insert_keys = read_keys(&config.insert_path)?;
    let mut inserted = 0usize;
    for key in insert_keys {
        match u64::try_from(key) {
            Ok(key) if key >= 1 => {
                if set.insert(key) {
                    inserted += 1;
                }
            }
            _ => tracing::warn!(key = %key, "skipped key outside the supported range"),
        }
    }
    tracing::info!(inserted, len = set.len(), "insert phase complete");

    let delete_keys = read_keys(&config.delete_path)?;
    for key in delete_keys {
        // Keys outside the domain cannot be present, so they are the same
        // silent no-op as deleting any other absent key.
        if let Ok(key) = u64::try_from(key) {
            if key >= 1 {
                set.remove(key);
            }
        }
    }
    tracing::info!(len = set.len(), "delete phase complete");

    let commands = fs::read_to_string(&config.commands_path)
        .with_context(|| format!("failed to read commands file {}", config.commands_path.display()))?;

    let mut output = String::new();
    for line in commands.lines() {
        if line.trim().is_empty() {
            continue;
        }
        writeln!(output, "{}", answer(&set, Command::parse(line)))
            .expect("writing to a String cannot fail");
    }
    Ok(output)
}

/// Renders a single command's answer; absence and malformed lines are `-1`.
fn answer(set: &RankSet, command: Option<Command>) -> String {
    match command {
        Some(Command::Select(k)) => match usize::try_from(k).ok().and_then(|k| set.select(k)) {
            Some(key) => key.to_string(),
            None => "-1".to_string(),
        },
        Some(Command::Rank(key)) => match u64::try_from(key).ok().and_then(|key| set.rank(key)) {
            Some(rank) => rank.to_string(),
            None => "-1".to_string(),
        },
        Some(Command::KeysInRange(lo, hi)) => {
            render_keys(&set.keys_in_range(clamp_bound(lo), clamp_bound(hi)))
        }
        Some(Command::PrimesInRange(lo, hi)) => {
            render_keys(&set.primes_in_range(clamp_bound(lo), clamp_bound(hi)))
        }
        None => "-1".to_string(),
    }
}

/// Space-separates a non-empty key list; an empty result renders as `-1`.
fn render_keys(keys: &[u64]) -> String {
    if keys.is_empty() {
        return "-1".to_string();
    }
    let mut rendered = String::new();
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            rendered.push(' ');
        }
        let _ = write!(rendered, "{key}");
    }
    rendered
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rankset=info".into()),
        )
        .init();

    let config = DriverConfig::from_args(std::env::args().skip(1))?;
    tracing::info!(?config, "starting");

    let output = run(&config)?;
    fs::write("output.txt", output).context("failed to write output.txt")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir, t: usize, inserts: &str, deletes: &str, commands: &str) -> DriverConfig {
        let insert_path = dir.path().join("keystoinsert.txt");
        let delete_path = dir.path().join("keystodelete.txt");
        let commands_path = dir.path().join("commands.txt");
        fs::write(&insert_path, inserts).unwrap();
        fs::write(&delete_path, deletes).unwrap();
        fs::write(&commands_path, commands).unwrap();
        DriverConfig {
            min_degree: t,
            insert_path,
            delete_path,
            commands_path,
        }
    }

    #[test]
    fn select_and_rank_commands() {
        let dir = TempDir::new().unwrap();
        let commands = "select 1\nselect 5\nselect 8\nselect 9\nrank 12\nrank 99\n";
        let config = config_in(&dir, 2, "10\n20\n5\n6\n12\n30\n7\n17\n", "", commands);

        let output = run(&config).unwrap();
        assert_eq!(output, "5\n12\n30\n-1\n5\n-1\n");
    }

    #[test]
    fn range_commands_after_deletions() {
        let dir = TempDir::new().unwrap();
        let inserts: String = (1..=20).map(|k| format!("{k}\n")).collect();
        let commands = "keysInRange 5 10\nprimesInRange 1 20\nselect 3\n";
        let config = config_in(&dir, 2, &inserts, "9\n", commands);

        let output = run(&config).unwrap();
        assert_eq!(output, "5 6 7 8 10\n2 3 5 7 11 13 17 19\n3\n");
    }

    #[test]
    fn empty_results_and_malformed_lines_render_minus_one() {
        let dir = TempDir::new().unwrap();
        let commands = "keysInRange 0 0\nkeysInRange 28 100\nselect 0\nselect -3\nfrobnicate 1\nrank\nrank x\n";
        let inserts: String = (1..=30).map(|k| format!("{k}\n")).collect();
        let config = config_in(&dir, 3, &inserts, "", commands);

        let output = run(&config).unwrap();
        assert_eq!(output, "-1\n28 29 30\n-1\n-1\n-1\n-1\n-1\n");
    }

    #[test]
    fn trailing_tokens_are_ignored() {
        let dir = TempDir::new().unwrap();
        let commands =
            "select 1 2\nrank 12 extra\nkeysInRange 5 10 15\nprimesInRange 1 10 99\n";
        let inserts: String = (1..=30).map(|k| format!("{k}\n")).collect();
        let config = config_in(&dir, 3, &inserts, "", commands);

        let output = run(&config).unwrap();
        assert_eq!(output, "1\n12\n5 6 7 8 9 10\n2 3 5 7\n");
    }

    #[test]
    fn prime_range_commands() {
        let dir = TempDir::new().unwrap();
        let config = config_in(
            &dir,
            2,
            "97\n100\n101\n103\n104\n",
            "",
            "primesInRange 95 105\nprimesInRange 104 104\n",
        );

        let output = run(&config).unwrap();
        assert_eq!(output, "97 101 103\n-1\n");
    }

    #[test]
    fn duplicate_inserts_and_invalid_keys_are_skipped() {
        let dir = TempDir::new().unwrap();
        let config = config_in(
            &dir,
            2,
            "7\n7\n7\n-4\n0\n",
            "7\n7\n",
            "select 1\nrank 7\n",
        );

        let output = run(&config).unwrap();
        assert_eq!(output, "-1\n-1\n");
    }

    #[test]
    fn blank_lines_are_ignored() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir, 2, "3\n\n1\n\n2\n", "\n2\n", "select 2\n\nrank 3\n");

        let output = run(&config).unwrap();
        assert_eq!(output, "3\n2\n");
    }

    #[test]
    fn negative_range_endpoints_clamp_into_the_domain() {
        let dir = TempDir::new().unwrap();
        let config = config_in(
            &dir,
            2,
            "1\n2\n3\n",
            "",
            "keysInRange -5 2\nkeysInRange -5 -1\nkeysInRange 2 99999999999999999999\n",
        );

        let output = run(&config).unwrap();
        assert_eq!(output, "1 2\n-1\n2 3\n");
    }

    #[test]
    fn config_rejects_bad_arguments() {
        fn args<'a>(list: &'a [&'a str]) -> impl Iterator<Item = String> + 'a {
            list.iter().map(|s| (*s).to_string())
        }

        assert!(DriverConfig::from_args(args(&[])).is_err());
        assert!(DriverConfig::from_args(args(&["1", "a", "b", "c"])).is_err());
        assert!(DriverConfig::from_args(args(&["x", "a", "b", "c"])).is_err());
        assert!(DriverConfig::from_args(args(&["2", "a", "b"])).is_err());
        assert!(DriverConfig::from_args(args(&["2", "a", "b", "c", "d"])).is_err());
        assert!(DriverConfig::from_args(args(&["2", "a", "b", "c"])).is_ok());
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config = DriverConfig {
            min_degree: 2,
            insert_path: dir.path().join("nope.txt"),
            delete_path: dir.path().join("nope.txt"),
            commands_path: dir.path().join("nope.txt"),
        };
        assert!(run(&config).is_err());
    }

    #[test]
    fn unparsable_key_line_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir, 2, "1\ntwo\n3\n", "", "select 1\n");
        assert!(run(&config).is_err());
    }
}
