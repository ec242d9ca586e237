//! Command-line argument definitions.

use clap::{Parser, Subcommand, ValueEnum};

use crate::changelog::Bump;

/// Top-level CLI entry point for the integration package tool.
#[derive(Parser, Debug)]
#[command(
    name = "intpkg",
    about = "Format and maintain integration packages",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Package root, or a directory inside it (defaults to the current directory)
    #[arg(long, global = true)]
    pub root: Option<std::path::PathBuf>,

    /// Format files one at a time (parallel is enabled by default)
    #[arg(long = "no-parallel", global = true, action = clap::ArgAction::SetFalse)]
    pub parallel: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Format the YAML and JSON files of the package
    Format(FormatOpts),
    /// Work with the package changelog
    #[command(subcommand)]
    Changelog(ChangelogCommand),
    /// Print version information
    Version,
}

/// Options for the `format` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct FormatOpts {
    /// Only report files that are not formatted; fail if there are any
    #[arg(long, alias = "fail-fast")]
    pub check: bool,
}

/// `changelog` subcommands.
#[derive(Subcommand, Debug)]
pub enum ChangelogCommand {
    /// Add an entry to the changelog and update the manifest version
    Add(ChangelogAddOpts),
}

/// Options for `changelog add`.
#[derive(Parser, Debug, Clone)]
pub struct ChangelogAddOpts {
    /// Description of the change
    #[arg(long)]
    pub description: String,

    /// Type of change (e.g. bugfix, enhancement, breaking-change)
    #[arg(long = "type")]
    pub change_type: String,

    /// Link to the pull request or issue
    #[arg(long)]
    pub link: String,

    /// Add the change to this version
    #[arg(long, conflicts_with = "next")]
    pub version: Option<String>,

    /// Add the change to the next major, minor or patch version
    #[arg(long, value_enum)]
    pub next: Option<NextVersion>,
}

/// Values of `changelog add --next`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextVersion {
    /// Next major version
    Major,
    /// Next minor version
    Minor,
    /// Next patch version
    Patch,
}

impl From<NextVersion> for Bump {
    fn from(next: NextVersion) -> Self {
        match next {
            NextVersion::Major => Self::Major,
            NextVersion::Minor => Self::Minor,
            NextVersion::Patch => Self::Patch,
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const ADD: [&str; 9] = [
        "intpkg",
        "changelog",
        "add",
        "--description",
        "Fix bug",
        "--type",
        "bugfix",
        "--link",
        "https://github.com/elastic/integrations/pull/1",
    ];

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_format() {
        let cli = Cli::parse_from(["intpkg", "format"]);
        assert!(matches!(cli.command, Command::Format(FormatOpts { check: false })));
    }

    #[test]
    fn parse_format_check() {
        let cli = Cli::parse_from(["intpkg", "format", "--check"]);
        assert!(matches!(cli.command, Command::Format(FormatOpts { check: true })));
    }

    #[test]
    fn parse_format_fail_fast_alias() {
        let cli = Cli::parse_from(["intpkg", "format", "--fail-fast"]);
        assert!(matches!(cli.command, Command::Format(FormatOpts { check: true })));
    }

    #[test]
    fn parse_changelog_add() {
        let cli = Cli::parse_from(ADD);
        let Command::Changelog(ChangelogCommand::Add(opts)) = cli.command else {
            panic!("expected changelog add");
        };
        assert_eq!(opts.description, "Fix bug");
        assert_eq!(opts.change_type, "bugfix");
        assert_eq!(opts.version, None);
        assert_eq!(opts.next, None);
    }

    #[test]
    fn parse_changelog_add_next() {
        let mut args = ADD.to_vec();
        args.extend(["--next", "minor"]);
        let cli = Cli::parse_from(args);
        let Command::Changelog(ChangelogCommand::Add(opts)) = cli.command else {
            panic!("expected changelog add");
        };
        assert_eq!(opts.next, Some(NextVersion::Minor));
        assert_eq!(Bump::from(NextVersion::Minor), Bump::Minor);
    }

    #[test]
    fn version_and_next_conflict() {
        let mut args = ADD.to_vec();
        args.extend(["--version", "1.0.0", "--next", "patch"]);
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn changelog_add_requires_fields() {
        assert!(Cli::try_parse_from(["intpkg", "changelog", "add", "--type", "bugfix"]).is_err());
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["intpkg", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::parse_from(["intpkg", "-v", "format"]);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_root_override() {
        let cli = Cli::parse_from(["intpkg", "--root", "/tmp/packages/apache", "format"]);
        assert_eq!(
            cli.global.root,
            Some(std::path::PathBuf::from("/tmp/packages/apache"))
        );
    }

    #[test]
    fn parallel_is_enabled_by_default() {
        let cli = Cli::parse_from(["intpkg", "format"]);
        assert!(cli.global.parallel, "parallel should be true by default");
    }

    #[test]
    fn no_parallel_disables_parallel() {
        let cli = Cli::parse_from(["intpkg", "--no-parallel", "format"]);
        assert!(
            !cli.global.parallel,
            "--no-parallel should set parallel to false"
        );
    }
}
