//! Ordered classpath assembly. Earlier fragments shadow later ones when the JVM
//! resolves a class, so fragments are never reordered or deduplicated.

use std::path::Path;

pub const SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };

pub fn assemble<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for fragment in fragments {
        let fragment = fragment.as_ref();
        if fragment.is_empty() {
            continue;
        }
        if !joined.is_empty() {
            joined.push_str(SEPARATOR);
        }
        joined.push_str(fragment);
    }
    joined
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classpath {
    fragments: Vec<String>,
}

impl Classpath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, fragment: impl Into<String>) -> Self {
        self.fragments.push(fragment.into());
        self
    }

    pub fn with_path(self, path: &Path) -> Self {
        self.with(path.display().to_string())
    }

    pub fn with_all<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fragments.extend(fragments.into_iter().map(Into::into));
        self
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn assemble(&self) -> String {
        assemble(&self.fragments)
    }

    pub fn into_fragments(self) -> Vec<String> {
        self.fragments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_order() {
        assert_eq!(
            assemble(["A", "B", "C"]),
            format!("A{SEPARATOR}B{SEPARATOR}C")
        );
    }

    #[test]
    fn drops_empty_fragments() {
        assert_eq!(assemble(["A", "", "B"]), format!("A{SEPARATOR}B"));
        assert_eq!(assemble(["", ""]), "");
    }

    #[test]
    fn keeps_duplicates_in_place() {
        assert_eq!(
            assemble(["B", "A", "B"]),
            format!("B{SEPARATOR}A{SEPARATOR}B")
        );
    }

    #[test]
    fn builder_matches_free_function() {
        let classpath = Classpath::new()
            .with("first")
            .with_path(Path::new("second.jar"))
            .with_all(["", "third"]);
        assert_eq!(classpath.fragments().len(), 4);
        assert_eq!(classpath.assemble(), assemble(["first", "second.jar", "third"]));
    }
}
