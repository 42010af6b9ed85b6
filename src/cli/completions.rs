//! Completions command implementation

use crate::cli::{Cli, CompletionsArgs};
use clap::CommandFactory;
use clap_complete::generate;
use std::io::{self, Write};

/// Write completions for `args.shell` to `out`.
pub fn write_completions(args: &CompletionsArgs, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(args.shell, &mut cmd, bin_name, out);
}

/// Handle `faqsync completions`
pub fn handle_completions(args: &CompletionsArgs) {
    write_completions(args, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap_complete::Shell;

    #[test]
    fn test_completions_bash() {
        let mut buf = Vec::new();
        write_completions(&CompletionsArgs { shell: Shell::Bash }, &mut buf);
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("faqsync"));
        assert!(script.contains("probe-all"));
    }

    #[test]
    fn test_completions_zsh() {
        let mut buf = Vec::new();
        write_completions(&CompletionsArgs { shell: Shell::Zsh }, &mut buf);
        assert!(!buf.is_empty());
    }
}
