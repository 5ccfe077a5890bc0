//! Declaration catalogs: the list of tunable flags supplied at startup.

use super::configuration::Configuration;
use super::setting::Setting;
use crate::error::{Result, TuneError};
use std::fs;
use std::path::Path;

/// Default catalog: a subset of LLVM `opt` transformation passes.
///
/// Some of these passes may conflict with each other; the tuner only ever
/// observes their combined effect on runtime.
pub const BUILTIN_DECLARATIONS: &[&str] = &[
    "dce = false (bool)",
    "adce = false (bool)",
    "argpromotion = false (bool)",
    "simplifycfg = false (bool)",
    "deadargelim = false (bool)",
    "die = false (bool)",
    "dse = false (bool)",
    "globaldce = false (bool)",
    "inline = false (bool)",
    "gvn = false (bool)",
    "indvars = false (bool)",
    "loop-rotate = false (bool)",
    "loop-unroll = false (bool)",
    "loop-unswitch = false (bool)",
    "memcpyopt = false (bool)",
    "consthoist = false (bool)",
    "constprop = false (bool)",
    "flattencfg = false (bool)",
    "early-cse = false (bool)",
    "reassociate = false (bool)",
    "scalarrepl = false (bool)",
    "instcombine = false (bool)",
    "ipsccp = false (bool)",
    "licm = false (bool)",
    "loop-instsimplify = false (bool)",
    "loop-reduce = false (bool)",
    "mem2reg = false (bool)",
    "sccp = false (bool)",
];

/// A parsed declaration list.
///
/// Parsing happens once; [`fresh`](Catalog::fresh) hands out independent
/// copies of the catalog defaults.
#[derive(Debug, Clone)]
pub struct Catalog {
    declarations: Vec<String>,
    template: Configuration,
}

impl Catalog {
    pub fn new<S: AsRef<str>>(declarations: &[S]) -> Result<Self> {
        let declarations: Vec<String> = declarations
            .iter()
            .map(|d| d.as_ref().to_string())
            .collect();
        let template = Configuration::load(&declarations)?;
        Ok(Self {
            declarations,
            template,
        })
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_DECLARATIONS).expect("built-in catalog is well formed")
    }

    /// Reads one declaration per line; blank lines and `#` comments are
    /// skipped. Parse errors report the line number within the file.
    ///
    /// A `#` starts a comment at the beginning of a line or after the
    /// `(type)` group; elsewhere it belongs to the value.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut declarations = Vec::new();
        for (index, raw) in content.lines().enumerate() {
            let line = strip_comment(raw.trim());
            if line.is_empty() {
                continue;
            }
            Setting::parse(line, index + 1)?;
            declarations.push(line.to_string());
        }
        Self::new(&declarations)
    }

    pub fn declarations(&self) -> &[String] {
        &self.declarations
    }

    /// The parsed defaults.
    pub fn template(&self) -> &Configuration {
        &self.template
    }

    /// A new configuration holding the catalog defaults, not yet measured.
    pub fn fresh(&self) -> Configuration {
        self.template.clone()
    }

    pub fn len(&self) -> usize {
        self.template.len()
    }

    pub fn is_empty(&self) -> bool {
        self.template.is_empty()
    }

    /// Fails if any declared type has no mutation rule.
    pub fn check_mutable(&self) -> Result<()> {
        match self.template.unsupported_types().next() {
            Some(setting) => Err(TuneError::UnsupportedType {
                key: setting.key().to_string(),
                ttype: setting.ttype().to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn strip_comment(line: &str) -> &str {
    if line.starts_with('#') {
        return "";
    }
    line.match_indices('#')
        .map(|(at, _)| &line[..at])
        .find(|head| head.ends_with(char::is_whitespace) && head.trim_end().ends_with(')'))
        .map_or(line, str::trim_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_is_all_false_booleans() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), BUILTIN_DECLARATIONS.len());
        assert!(catalog.fresh().to_argument_list().is_empty());
        assert!(catalog.check_mutable().is_ok());
    }

    #[test]
    fn test_fresh_copies_are_independent() {
        let catalog = Catalog::new(&["a = false (bool)"]).unwrap();
        let mut first = catalog.fresh();
        first.fitness = 1.0;
        assert_eq!(catalog.fresh().fitness, f64::INFINITY);
    }

    #[test]
    fn test_from_path_skips_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# opt passes").unwrap();
        writeln!(file, "dce = false (bool)  # dead code").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "inline = true (bool)").unwrap();
        let catalog = Catalog::from_path(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.fresh().to_argument_list(), ["--inline"]);
    }

    #[test]
    fn test_from_path_keeps_hash_inside_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fmt = a#b (string)").unwrap();
        writeln!(file, "tag = x #y (string) # trailing").unwrap();
        let catalog = Catalog::from_path(file.path()).unwrap();
        let settings = catalog.template().settings();
        assert_eq!(settings[0].value(), "a#b");
        assert_eq!(settings[1].value(), "x #y");
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("# header"), "");
        assert_eq!(strip_comment("dce = false (bool)  # dead code"), "dce = false (bool)");
        assert_eq!(strip_comment("dce = false (bool)#x"), "dce = false (bool)#x");
        assert_eq!(strip_comment("fmt = a#b (string)"), "fmt = a#b (string)");
    }

    #[test]
    fn test_from_path_reports_file_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "dce = false (bool)").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "broken").unwrap();
        match Catalog::from_path(file.path()) {
            Err(TuneError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_check_mutable_rejects_unknown_type() {
        let catalog = Catalog::new(&["a = false (bool)", "w = 1 (float)"]).unwrap();
        match catalog.check_mutable() {
            Err(TuneError::UnsupportedType { key, ttype }) => {
                assert_eq!(key, "w");
                assert_eq!(ttype, "(float)");
            }
            other => panic!("expected unsupported type, got {other:?}"),
        }
    }
}
