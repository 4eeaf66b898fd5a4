use colored::*;

/// Turns well-known compiler and linker diagnostics into a one-paragraph hint.
pub struct FeedbackAnalyzer;

impl FeedbackAnalyzer {
    pub fn analyze(output: &str) -> Option<String> {
        if output.contains("undefined reference to `main'")
            || output.contains("undefined reference to 'main'")
            || output.contains("Undefined symbols for architecture") && output.contains("_main")
        {
            return Some(format!(
                "None of the objects defines {}.\nAdd a source file with an entry point to {}, or build a {} instead.",
                "main()".bold().yellow(),
                "--cfiles".bold().green(),
                "static-lib".bold().green()
            ));
        }

        if output.contains("undefined reference to") || output.contains("Undefined symbols") {
            return Some(format!(
                "It looks like a {} error.\nA library may be missing from {} or {}.",
                "Linker".bold().red(),
                "--lib-paths".bold().yellow(),
                "--ldflags".bold().yellow()
            ));
        }

        if output.contains("fatal error: ") && output.contains("No such file or directory")
            || output.contains("file not found")
        {
            return Some(format!(
                "It looks like a {} error.\nYou might be missing an include path; pass it with {}.",
                "Missing Header".bold().red(),
                "--cflags \"-I<dir>\"".bold().yellow()
            ));
        }

        None
    }
}
