//! Command line interface definition using clap.

use clap::Parser;

/// An error-tolerant YAML checker and auto-fixer oriented toward human
/// intent.
#[derive(Debug, Parser)]
#[command(name = "yaml-doctor", author, version, about)]
pub struct Cli {
    /// Files, directories, or glob patterns to check.
    ///
    /// Directories are searched recursively for `*.yaml`, `*.yml`, and
    /// `*.md` files; files named explicitly are checked whatever their
    /// extension.
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<String>,

    /// Rewrite each file in place with as many issues as possible repaired.
    #[arg(long)]
    pub fix: bool,

    /// Enable verbose diagnostic logging.
    #[arg(long)]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse() {
        let cli = Cli::try_parse_from(["yaml-doctor", "--fix", "a.yaml", "b.yml"])
            .expect("valid invocation");
        assert!(cli.fix);
        assert!(!cli.debug);
        assert_eq!(cli.paths, vec!["a.yaml".to_owned(), "b.yml".to_owned()]);
    }

    #[test]
    fn at_least_one_path_is_required() {
        assert!(Cli::try_parse_from(["yaml-doctor"]).is_err());
        assert!(Cli::try_parse_from(["yaml-doctor", "--fix"]).is_err());
    }
}
