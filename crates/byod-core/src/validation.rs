//! Upload filename checks against a plugin's declared inputs
//!
//! Runs before a submission is streamed so obvious mismatches fail fast.
//! The server applies the same rules.

use glob::{MatchOptions, Pattern};

use crate::api::PluginInput;

const CASE_INSENSITIVE: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Return one message per rejected filename; empty means all accepted
pub fn validate_files_for_plugin(filenames: &[String], inputs: &[PluginInput]) -> Vec<String> {
    let constraints: Vec<&PluginInput> = inputs.iter().filter(|i| i.is_file()).collect();
    if constraints.is_empty() {
        return Vec::new();
    }

    filenames
        .iter()
        .filter(|name| !constraints.iter().any(|c| accepts(c, name)))
        .map(|name| {
            format!(
                "'{}' is not an accepted file type. Expected: {}",
                name,
                describe_accepted(&constraints)
            )
        })
        .collect()
}

fn accepts(input: &PluginInput, filename: &str) -> bool {
    if !input.formats.is_empty() {
        return matches_formats(filename, &input.formats);
    }
    match declared_pattern(input) {
        Some(pattern) => matches_pattern(filename, pattern),
        // Unconstrained file input
        None => true,
    }
}

/// Last extension or last two (`sample.fastq.gz` -> `gz`, `fastq.gz`)
fn matches_formats(filename: &str, formats: &[String]) -> bool {
    let lower = filename.to_lowercase();
    // Leading dot is a hidden-file marker, not an extension
    let stem_start = usize::from(lower.starts_with('.'));
    let suffixes: Vec<&str> = lower[stem_start..].split('.').skip(1).collect();

    let allowed = |ext: &str| formats.iter().any(|f| f.eq_ignore_ascii_case(ext));
    match suffixes.as_slice() {
        [] => false,
        [.., last] if allowed(last) => true,
        [.., second, last] => allowed(&format!("{}.{}", second, last)),
        _ => false,
    }
}

/// Empty patterns declare nothing
fn declared_pattern(input: &PluginInput) -> Option<&str> {
    input.pattern.as_deref().filter(|p| !p.is_empty())
}

fn matches_pattern(filename: &str, pattern: &str) -> bool {
    match Pattern::new(pattern) {
        Ok(pattern) => pattern.matches_with(filename, CASE_INSENSITIVE),
        // An unparseable pattern can only match itself
        Err(_) => filename.eq_ignore_ascii_case(pattern),
    }
}

fn describe_accepted(constraints: &[&PluginInput]) -> String {
    let parts: Vec<String> = constraints
        .iter()
        .filter_map(|c| {
            if !c.formats.is_empty() {
                Some(
                    c.formats
                        .iter()
                        .map(|f| format!(".{}", f))
                        .collect::<Vec<_>>()
                        .join(", "),
                )
            } else {
                declared_pattern(c).map(|p| format!("files matching {}", p))
            }
        })
        .collect();

    if parts.is_empty() {
        "any file".to_string()
    } else {
        parts.join(" or ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_input(formats: &[&str], pattern: Option<&str>) -> PluginInput {
        PluginInput {
            kind: Some("file".to_string()),
            formats: formats.iter().map(|f| f.to_string()).collect(),
            pattern: pattern.map(str::to_string),
            ..Default::default()
        }
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_formats_single_and_double_extension() {
        let inputs = vec![file_input(&["csv", "fastq.gz"], None)];
        assert!(validate_files_for_plugin(
            &names(&["data.CSV", "sample.fastq.gz", "a.b.csv"]),
            &inputs
        )
        .is_empty());

        let errors = validate_files_for_plugin(&names(&["notes.txt", "csv"]), &inputs);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0],
            "'notes.txt' is not an accepted file type. Expected: .csv, .fastq.gz"
        );
    }

    #[test]
    fn test_pattern_is_case_insensitive_glob() {
        let inputs = vec![file_input(&[], Some("*.fastq*"))];
        assert!(validate_files_for_plugin(&names(&["R1.FASTQ.gz", "r2.fastq"]), &inputs).is_empty());

        let errors = validate_files_for_plugin(&names(&["reads.bam"]), &inputs);
        assert_eq!(
            errors,
            vec!["'reads.bam' is not an accepted file type. Expected: files matching *.fastq*"]
        );
    }

    #[test]
    fn test_unconstrained_or_non_file_inputs_accept_all() {
        let unconstrained = vec![file_input(&[], None)];
        assert!(validate_files_for_plugin(&names(&["anything.bin"]), &unconstrained).is_empty());

        let param_only = vec![PluginInput {
            kind: Some("string".to_string()),
            formats: vec!["csv".to_string()],
            ..Default::default()
        }];
        assert!(validate_files_for_plugin(&names(&["x.txt"]), &param_only).is_empty());
        assert!(validate_files_for_plugin(&names(&["x.txt"]), &[]).is_empty());
    }

    #[test]
    fn test_empty_pattern_is_unconstrained() {
        let inputs = vec![file_input(&[], Some(""))];
        assert!(validate_files_for_plugin(&names(&["reads.fastq"]), &inputs).is_empty());

        let inputs = vec![file_input(&["csv"], None), file_input(&[], Some(""))];
        assert!(validate_files_for_plugin(&names(&["reads.fastq"]), &inputs).is_empty());
    }

    #[test]
    fn test_empty_pattern_left_out_of_description() {
        let csv = file_input(&["csv"], None);
        let empty = file_input(&[], Some(""));
        assert_eq!(describe_accepted(&[&csv, &empty]), ".csv");
        assert_eq!(describe_accepted(&[&empty]), "any file");
    }

    #[test]
    fn test_any_matching_constraint_is_enough() {
        let inputs = vec![file_input(&["csv"], None), file_input(&[], Some("*.tsv"))];
        assert!(validate_files_for_plugin(&names(&["a.csv", "b.tsv"]), &inputs).is_empty());

        let errors = validate_files_for_plugin(&names(&["c.json"]), &inputs);
        assert!(errors[0].ends_with("Expected: .csv or files matching *.tsv"));
    }
}
