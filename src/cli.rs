use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliOptions {
    /// ZIP archives to extract, processed in order
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Output directory the tree is rebuilt under
    #[arg(short, long, default_value = "./output")]
    pub output: PathBuf,

    /// Optional path to config file (YAML)
    #[arg(long)]
    pub config_path: Option<PathBuf>,

    /// Maximum path segment length (overrides config when set)
    #[arg(long)]
    pub max_segment_len: Option<usize>,

    /// Maximum total destination path length (overrides config when set)
    #[arg(long)]
    pub max_path_len: Option<usize>,
}

pub fn parse() -> CliOptions {
    CliOptions::parse()
}

#[cfg(test)]
mod tests {
    use super::CliOptions;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn parses_multiple_inputs() {
        let opts = CliOptions::try_parse_from([
            "ziprestore",
            "--input",
            "a.zip",
            "b.zip",
            "--output",
            "restored",
        ])
        .expect("parse");
        assert_eq!(opts.input, vec![PathBuf::from("a.zip"), PathBuf::from("b.zip")]);
        assert_eq!(opts.output, PathBuf::from("restored"));
    }

    #[test]
    fn requires_at_least_one_input() {
        assert!(CliOptions::try_parse_from(["ziprestore"]).is_err());
    }

    #[test]
    fn parses_length_overrides() {
        let opts = CliOptions::try_parse_from([
            "ziprestore",
            "--input",
            "a.zip",
            "--max-segment-len",
            "40",
            "--max-path-len",
            "200",
        ])
        .expect("parse");
        assert_eq!(opts.max_segment_len, Some(40));
        assert_eq!(opts.max_path_len, Some(200));
    }
}
